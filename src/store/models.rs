// Password Vault - Item data models
//
// SECURITY: encrypted payloads, initialization vectors and labels are never
// included in Debug output or log messages. The service stores them as opaque
// text and returns them unchanged; it never inspects or decrypts them.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sort-key prefix for password entries. Other item types sharing the
/// partition must use a different prefix (`NOTE#`, `CARD#`, ...).
pub const ENTRY_PREFIX: &str = "ENTRY#";

/// Ciphertext or IV produced by the client. Opaque to the service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueBlob(String);

impl OpaqueBlob {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Custom Debug implementation that NEVER reveals the blob.
impl fmt::Debug for OpaqueBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED; {} bytes]", self.0.len())
    }
}

/// Sort key of a password entry: `ENTRY#<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// A fresh identifier from a random (v4) UUID.
    pub fn generate() -> Self {
        Self(format!("{}{}", ENTRY_PREFIX, Uuid::new_v4()))
    }

    /// Accept a caller-supplied id only if it names a password entry.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.strip_prefix(ENTRY_PREFIX) {
            Some(rest) if !rest.is_empty() => Some(Self(raw.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key: partition (`owner_id`) plus sort key (`entry_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub owner_id: String,
    pub entry_id: EntryId,
}

impl ItemKey {
    pub fn new(owner_id: impl Into<String>, entry_id: EntryId) -> Self {
        Self {
            owner_id: owner_id.into(),
            entry_id,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.entry_id)
    }
}

/// One stored password entry.
#[derive(Clone, PartialEq, Eq)]
pub struct VaultItem {
    pub owner_id: String,
    pub entry_id: EntryId,
    pub encrypted_data: OpaqueBlob,
    pub iv: OpaqueBlob,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VaultItem {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.owner_id.clone(), self.entry_id.clone())
    }
}

impl fmt::Debug for VaultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultItem")
            .field("owner_id", &self.owner_id)
            .field("entry_id", &self.entry_id)
            .field("encrypted_data", &self.encrypted_data)
            .field("iv", &self.iv)
            .field("label", &self.label.as_ref().map(|_| "[REDACTED]"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// New ciphertext for an existing entry.
///
/// `label: None` keeps the stored label.
#[derive(Debug, Clone)]
pub struct EntryUpdate {
    pub encrypted_data: OpaqueBlob,
    pub iv: OpaqueBlob,
    pub label: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// ISO-8601 in UTC with microseconds and a literal `Z`, e.g.
/// `2024-05-01T12:00:00.123456Z`. Fixed width, so strings sort by time.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_item() -> VaultItem {
        let now = Utc::now();
        VaultItem {
            owner_id: "user-123-abc".to_string(),
            entry_id: EntryId::generate(),
            encrypted_data: OpaqueBlob::new("super-secret-encrypted-blob"),
            iv: OpaqueBlob::new("unique-initialization-vector"),
            label: Some("Bank login".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_item_debug_redacts_payload() {
        let debug_output = format!("{:?}", sample_item());
        assert!(debug_output.contains("[REDACTED"));
        assert!(!debug_output.contains("super-secret-encrypted-blob"));
        assert!(!debug_output.contains("unique-initialization-vector"));
        assert!(!debug_output.contains("Bank login"));
        assert!(debug_output.contains("user-123-abc"));
    }

    #[test]
    fn test_generated_entry_id_has_prefix_and_uuid() {
        let id = EntryId::generate();
        let uuid_part = id.as_str().strip_prefix(ENTRY_PREFIX).expect("prefix");
        let uuid = Uuid::parse_str(uuid_part).expect("valid uuid");
        assert_eq!(uuid.get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn test_entry_id_parse() {
        assert!(EntryId::parse("ENTRY#abc").is_some());
        assert!(EntryId::parse("ENTRY#").is_none());
        assert!(EntryId::parse("NOTE#abc").is_none());
        assert!(EntryId::parse("").is_none());
    }

    #[test]
    fn test_opaque_blob_serializes_as_plain_string() {
        let blob = OpaqueBlob::new("abc123");
        assert_eq!(serde_json::to_string(&blob).unwrap(), "\"abc123\"");
        assert_eq!(format!("{:?}", blob), "[REDACTED; 6 bytes]");
    }

    #[test]
    fn test_timestamp_format_has_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let formatted = format_timestamp(&ts);
        assert_eq!(formatted, "2024-05-01T12:00:00.000000Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), ts);
    }

    #[test]
    fn test_timestamp_strings_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 9, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }
}
