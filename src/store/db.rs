// Password Vault - SQLite Database Management
//
// Opens the SQLite file backing the item table and creates the table named by
// configuration. The connection sits behind a mutex so one database handle
// can be shared by concurrent gateway tasks.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;

use super::StoreError;
use crate::config::TableName;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around a SQLite connection holding one vault table.
pub struct Database {
    conn: Mutex<Connection>,
    table: TableName,
}

impl Database {
    /// Open (or create) the database at the given path and ensure the table exists.
    pub fn open(path: &Path, table: TableName) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn, table)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory(table: TableName) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, table)
    }

    fn init(conn: Connection, table: TableName) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self {
            conn: Mutex::new(conn),
            table,
        };
        db.run_migrations()?;

        Ok(db)
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }

    /// Create the item table and its retired-key companion.
    ///
    /// Column names follow the persisted record layout: partition key
    /// `userId`, sort key `itemTypeId`.
    fn run_migrations(&self) -> Result<(), StoreError> {
        let items = self.table.quoted();
        let retired = self.table.retired_quoted();

        self.with_conn(|conn| {
            conn.execute_batch(&format!(
                "
                CREATE TABLE IF NOT EXISTS {items} (
                    userId          TEXT NOT NULL,
                    itemTypeId      TEXT NOT NULL,
                    encryptedData   TEXT NOT NULL,
                    iv              TEXT NOT NULL,
                    label           TEXT,
                    createdAt       TEXT NOT NULL,
                    updatedAt       TEXT NOT NULL,
                    PRIMARY KEY (userId, itemTypeId)
                ) WITHOUT ROWID;

                CREATE TABLE IF NOT EXISTS {retired} (
                    userId          TEXT NOT NULL,
                    itemTypeId      TEXT NOT NULL,
                    retiredAt       TEXT NOT NULL,
                    PRIMARY KEY (userId, itemTypeId)
                ) WITHOUT ROWID;
                "
            ))?;
            Ok(())
        })?;

        tracing::debug!(table = %self.table, "Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(db: &Database, name: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn test_open_in_memory_succeeds() {
        let db = Database::open_in_memory(TableName::default());
        assert!(db.is_ok(), "Should be able to open an in-memory database");
    }

    #[test]
    fn test_schema_migration_creates_tables() {
        let db = Database::open_in_memory(TableName::default()).unwrap();
        assert_eq!(table_count(&db, "dev-PasswordVault"), 1, "item table should exist");
        assert_eq!(
            table_count(&db, "dev-PasswordVault_retired"),
            1,
            "retired-key table should exist"
        );
    }

    #[test]
    fn test_schema_migration_is_idempotent() {
        let db = Database::open_in_memory(TableName::default()).unwrap();
        assert!(db.run_migrations().is_ok(), "Migrations should be idempotent");
    }

    #[test]
    fn test_configured_table_name_is_used() {
        let table = TableName::new("prod-PasswordVault").unwrap();
        let db = Database::open_in_memory(table).unwrap();
        assert_eq!(db.table().as_str(), "prod-PasswordVault");
        assert_eq!(table_count(&db, "prod-PasswordVault"), 1);
        assert_eq!(table_count(&db, "dev-PasswordVault"), 0);
    }

    #[test]
    fn test_open_file_database_twice() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("vault.db");

        {
            let _db = Database::open(&db_path, TableName::default()).unwrap();
        }

        let reopened = Database::open(&db_path, TableName::default());
        assert!(reopened.is_ok(), "Reopening an existing database must succeed");
    }

    #[test]
    fn test_item_table_enforces_composite_key() {
        let db = Database::open_in_memory(TableName::default()).unwrap();
        let insert = "INSERT INTO \"dev-PasswordVault\"
                (userId, itemTypeId, encryptedData, iv, label, createdAt, updatedAt)
             VALUES (?1, ?2, 'blob', 'iv', NULL, '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')";

        db.with_conn(|conn| {
            conn.execute(insert, ["user-a", "ENTRY#1"])?;
            conn.execute(insert, ["user-b", "ENTRY#1"])?;
            Ok(())
        })
        .unwrap();

        let duplicate = db.with_conn(|conn| Ok(conn.execute(insert, ["user-a", "ENTRY#1"])?));
        assert!(duplicate.is_err(), "Same owner and entry id must not be stored twice");
    }
}
