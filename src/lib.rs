// Password Vault - Library root
//
// Re-exports the vault service, item store, gateway, CLI and config modules.

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod store;
pub mod vault;

pub use error::{PasswordVaultError, Result};
