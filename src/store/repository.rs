// Password Vault - Item Store Repository
//
// The single logical "put/get/update/delete item by composite key" interface
// the vault service talks to, and its SQLite implementation. Creation is a
// conditional write: it fails if the key exists or was ever deleted, so an
// entry id is never reused and never silently overwritten.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::db::Database;
use super::models::{
    format_timestamp, parse_timestamp, EntryId, EntryUpdate, ItemKey, OpaqueBlob, VaultItem,
    ENTRY_PREFIX,
};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the backing key-value table.
pub trait EntryStore: Send + Sync {
    /// Insert an item only if its key is absent and was never retired.
    /// Returns `StoreError::Conflict` otherwise.
    fn put_if_absent(&self, item: &VaultItem) -> Result<(), StoreError>;

    /// Fetch an item by composite key.
    fn get(&self, key: &ItemKey) -> Result<Option<VaultItem>, StoreError>;

    /// Replace the ciphertext of an existing item. Returns the stored item,
    /// or `None` if the key does not exist. `created_at` is preserved and
    /// `updated_at` never moves backwards.
    fn update(&self, key: &ItemKey, update: EntryUpdate) -> Result<Option<VaultItem>, StoreError>;

    /// Delete an item and retire its key as of `retired_at`. Returns true
    /// if it existed.
    fn delete(&self, key: &ItemKey, retired_at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// All password entries in one partition, ordered by entry id.
    fn query_entries(&self, owner_id: &str) -> Result<Vec<VaultItem>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteEntryStore {
    db: Database,
}

impl SqliteEntryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT userId, itemTypeId, encryptedData, iv, label, createdAt, updatedAt
             FROM {}",
            self.db.table().quoted()
        )
    }

    /// Parse an item row from the database.
    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<VaultItem> {
        let owner_id: String = row.get(0)?;
        let entry_id_str: String = row.get(1)?;
        let encrypted_data: String = row.get(2)?;
        let iv: String = row.get(3)?;
        let label: Option<String> = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        let entry_id = EntryId::parse(&entry_id_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("not a password entry id: {}", entry_id_str).into(),
            )
        })?;

        let created_at = parse_timestamp(&created_at_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let updated_at = parse_timestamp(&updated_at_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(VaultItem {
            owner_id,
            entry_id,
            encrypted_data: OpaqueBlob::new(encrypted_data),
            iv: OpaqueBlob::new(iv),
            label,
            created_at,
            updated_at,
        })
    }
}

impl EntryStore for SqliteEntryStore {
    fn put_if_absent(&self, item: &VaultItem) -> Result<(), StoreError> {
        let items = self.db.table().quoted();
        let retired = self.db.table().retired_quoted();
        let created_at = format_timestamp(&item.created_at);
        let updated_at = format_timestamp(&item.updated_at);

        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;

            let was_retired: bool = tx.query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE userId = ?1 AND itemTypeId = ?2)",
                    retired
                ),
                params![item.owner_id, item.entry_id.as_str()],
                |row| row.get(0),
            )?;
            if was_retired {
                return Err(StoreError::Conflict(item.key().to_string()));
            }

            let inserted = tx.execute(
                &format!(
                    "INSERT INTO {}
                        (userId, itemTypeId, encryptedData, iv, label, createdAt, updatedAt)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (userId, itemTypeId) DO NOTHING",
                    items
                ),
                params![
                    item.owner_id,
                    item.entry_id.as_str(),
                    item.encrypted_data.as_str(),
                    item.iv.as_str(),
                    item.label,
                    created_at,
                    updated_at,
                ],
            )?;
            if inserted == 0 {
                return Err(StoreError::Conflict(item.key().to_string()));
            }

            tx.commit()?;
            Ok(())
        })?;

        tracing::debug!(owner_id = %item.owner_id, entry_id = %item.entry_id, "Item written");
        Ok(())
    }

    fn get(&self, key: &ItemKey) -> Result<Option<VaultItem>, StoreError> {
        let sql = format!("{} WHERE userId = ?1 AND itemTypeId = ?2", self.select_sql());

        self.db.with_conn(|conn| {
            let item = conn
                .query_row(
                    &sql,
                    params![key.owner_id, key.entry_id.as_str()],
                    Self::row_to_item,
                )
                .optional()?;
            Ok(item)
        })
    }

    fn update(&self, key: &ItemKey, update: EntryUpdate) -> Result<Option<VaultItem>, StoreError> {
        let update_sql = format!(
            "UPDATE {}
             SET encryptedData = ?3,
                 iv = ?4,
                 label = COALESCE(?5, label),
                 updatedAt = CASE WHEN ?6 > updatedAt THEN ?6 ELSE updatedAt END
             WHERE userId = ?1 AND itemTypeId = ?2",
            self.db.table().quoted()
        );
        let select_sql = format!("{} WHERE userId = ?1 AND itemTypeId = ?2", self.select_sql());
        let updated_at = format_timestamp(&update.updated_at);

        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;

            let affected = tx.execute(
                &update_sql,
                params![
                    key.owner_id,
                    key.entry_id.as_str(),
                    update.encrypted_data.as_str(),
                    update.iv.as_str(),
                    update.label,
                    updated_at,
                ],
            )?;
            if affected == 0 {
                return Ok(None);
            }

            let item = tx.query_row(
                &select_sql,
                params![key.owner_id, key.entry_id.as_str()],
                Self::row_to_item,
            )?;
            tx.commit()?;

            Ok(Some(item))
        })
    }

    fn delete(&self, key: &ItemKey, retired_at: DateTime<Utc>) -> Result<bool, StoreError> {
        let items = self.db.table().quoted();
        let retired = self.db.table().retired_quoted();
        let now = format_timestamp(&retired_at);

        let deleted = self.db.with_conn(|conn| {
            let tx = conn.transaction()?;

            let affected = tx.execute(
                &format!("DELETE FROM {} WHERE userId = ?1 AND itemTypeId = ?2", items),
                params![key.owner_id, key.entry_id.as_str()],
            )?;

            if affected > 0 {
                tx.execute(
                    &format!(
                        "INSERT INTO {} (userId, itemTypeId, retiredAt) VALUES (?1, ?2, ?3)
                         ON CONFLICT (userId, itemTypeId) DO NOTHING",
                        retired
                    ),
                    params![key.owner_id, key.entry_id.as_str(), now],
                )?;
            }

            tx.commit()?;
            Ok(affected > 0)
        })?;

        if deleted {
            tracing::debug!(owner_id = %key.owner_id, entry_id = %key.entry_id, "Item deleted and key retired");
        }

        Ok(deleted)
    }

    fn query_entries(&self, owner_id: &str) -> Result<Vec<VaultItem>, StoreError> {
        // Range scan equivalent of begins_with(itemTypeId, "ENTRY#"): '$' follows '#'.
        let sql = format!(
            "{} WHERE userId = ?1 AND itemTypeId >= ?2 AND itemTypeId < ?3
             ORDER BY itemTypeId ASC",
            self.select_sql()
        );
        let upper_bound = format!("{}$", &ENTRY_PREFIX[..ENTRY_PREFIX.len() - 1]);

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![owner_id, ENTRY_PREFIX, upper_bound],
                Self::row_to_item,
            )?;

            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }

            Ok(items)
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
