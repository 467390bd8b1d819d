// Password Vault - Store Module
//
// Durable key-value table for password entries, keyed by (owner, entry id).
// Payloads arrive already encrypted by the client and are stored verbatim.

mod db;
mod error;
mod memory;
mod models;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use memory::MemoryEntryStore;
pub use models::{
    format_timestamp, parse_timestamp, EntryId, EntryUpdate, ItemKey, OpaqueBlob, VaultItem,
    ENTRY_PREFIX,
};
pub use repository::{EntryStore, SqliteEntryStore};
