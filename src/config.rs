// Password Vault - Configuration
//
// The only externally supplied setting the service needs is the name of the
// backing table. The CLI reads it from `--table-name` or `TABLE_NAME` and
// falls back to the development table. The database file location is a
// property of the local SQLite backend and follows the same pattern.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Table used when `TABLE_NAME` is not set (local/development use).
pub const DEFAULT_TABLE_NAME: &str = "dev-PasswordVault";

/// Environment variable naming the backing table.
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";

/// Environment variable naming the SQLite database file.
pub const DATABASE_ENV: &str = "VAULT_DATABASE";

const TABLE_NAME_MIN_LEN: usize = 3;
const TABLE_NAME_MAX_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Invalid table name '{0}': expected 3-255 characters from [A-Za-z0-9_.-]"
    )]
    InvalidTableName(String),
}

/// A validated table name.
///
/// Names follow the key-value table naming rules (`[A-Za-z0-9_.-]{3,255}`),
/// which also makes them safe to splice into SQL as quoted identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        let valid_len = (TABLE_NAME_MIN_LEN..=TABLE_NAME_MAX_LEN).contains(&raw.len());
        let valid_chars = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

        if valid_len && valid_chars {
            Ok(Self(raw.to_string()))
        } else {
            Err(ConfigError::InvalidTableName(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The item table as a quoted SQL identifier.
    pub(crate) fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Companion table holding keys of deleted items.
    pub(crate) fn retired_quoted(&self) -> String {
        format!("\"{}_retired\"", self.0)
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved settings for one service instance.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub table_name: TableName,
    pub database_path: PathBuf,
}

impl VaultConfig {
    /// Build a config from raw values, applying the database fallback.
    pub fn new(table_name: &str, database_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            table_name: TableName::new(table_name)?,
            database_path: database_path.unwrap_or_else(default_database_path),
        })
    }
}

/// `<platform data dir>/password-vault/vault.db`, or `./password-vault/vault.db`
/// when the platform has no data directory.
pub fn default_database_path() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("password-vault")
        .join("vault.db")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
