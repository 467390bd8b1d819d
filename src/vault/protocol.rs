// Password Vault - Request/Response Types
//
// Inbound requests as delivered by the gateway, and the HTTP-style response
// envelope returned for every request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{format_timestamp, OpaqueBlob, VaultItem};

pub const CONTENT_TYPE: &str = "application/json";

/// Actions understood by the vault service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreatePassword,
    GetPassword,
    UpdatePassword,
    DeletePassword,
    ListPasswords,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createPassword" => Some(Self::CreatePassword),
            "getPassword" => Some(Self::GetPassword),
            "updatePassword" => Some(Self::UpdatePassword),
            "deletePassword" => Some(Self::DeletePassword),
            "listPasswords" => Some(Self::ListPasswords),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatePassword => "createPassword",
            Self::GetPassword => "getPassword",
            Self::UpdatePassword => "updatePassword",
            Self::DeletePassword => "deletePassword",
            Self::ListPasswords => "listPasswords",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action-specific fields. Every field is optional on the wire; each action
/// validates what it needs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_data: Option<OpaqueBlob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<OpaqueBlob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl fmt::Debug for RequestPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPayload")
            .field("entry_id", &self.entry_id)
            .field("encrypted_data", &self.encrypted_data)
            .field("iv", &self.iv)
            .field("label", &self.label.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A request whose caller has already been authenticated by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRequest {
    #[serde(default)]
    pub authenticated_caller_id: String,
    pub action: String,
    #[serde(default)]
    pub payload: RequestPayload,
}

impl VaultRequest {
    pub fn new(
        caller_id: impl Into<String>,
        action: impl Into<String>,
        payload: RequestPayload,
    ) -> Self {
        Self {
            authenticated_caller_id: caller_id.into(),
            action: action.into(),
            payload,
        }
    }
}

/// HTTP-style response envelope. `body` holds serialized JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl VaultResponse {
    pub fn json(status_code: u16, body: &ResponseBody) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize response body");
            r#"{"message":"An error occurred"}"#.to_string()
        });

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), CONTENT_TYPE.to_string());

        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Parse the body back into JSON (for callers and tests).
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Entry as returned to its owner.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub entry_id: String,
    pub encrypted_data: OpaqueBlob,
    pub iv: OpaqueBlob,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl fmt::Debug for EntryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryView")
            .field("entry_id", &self.entry_id)
            .field("encrypted_data", &self.encrypted_data)
            .field("iv", &self.iv)
            .field("label", &self.label.as_ref().map(|_| "[REDACTED]"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl From<&VaultItem> for EntryView {
    fn from(item: &VaultItem) -> Self {
        Self {
            entry_id: item.entry_id.to_string(),
            encrypted_data: item.encrypted_data.clone(),
            iv: item.iv.clone(),
            label: item.label.clone(),
            created_at: format_timestamp(&item.created_at),
            updated_at: format_timestamp(&item.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_at: String,
    pub updated_at: String,
}

impl From<&VaultItem> for Timestamps {
    fn from(item: &VaultItem) -> Self {
        Self {
            created_at: format_timestamp(&item.created_at),
            updated_at: format_timestamp(&item.updated_at),
        }
    }
}

/// JSON body of every response. Only `message` is always present.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub entry: Option<EntryView>,
    #[serde(flatten)]
    pub timestamps: Option<Timestamps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryView>>,
}

impl ResponseBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// The entry's fields, including `entryId`, at the top level of the body.
    pub fn with_entry(mut self, entry: EntryView) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_timestamps(mut self, timestamps: Timestamps) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn with_entries(mut self, entries: Vec<EntryView>) -> Self {
        self.entries = Some(entries);
        self
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
