// Password Vault - Vault Service
//
// Single entry point for all vault actions. Takes an authenticated caller,
// an action name and a payload; always answers with a well-formed response.
// Ownership is enforced by keying every store access on (caller, entryId),
// so another caller's entry is indistinguishable from a missing one.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use super::error::VaultError;
use super::protocol::{
    Action, EntryView, RequestPayload, ResponseBody, Timestamps, VaultRequest, VaultResponse,
};
use crate::store::{EntryId, EntryStore, EntryUpdate, ItemKey, OpaqueBlob, VaultItem};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of write timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct VaultService<S> {
    store: S,
    clock: Box<dyn Clock>,
}

impl<S: EntryStore> VaultService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }

    pub fn with_clock(store: S, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one request. Never fails: every error becomes a response.
    pub fn handle(&self, request: VaultRequest) -> VaultResponse {
        tracing::info!(
            action = %request.action,
            caller = %request.authenticated_caller_id,
            "Vault request received"
        );

        match self.dispatch(&request) {
            Ok(response) => {
                tracing::info!(
                    action = %request.action,
                    caller = %request.authenticated_caller_id,
                    status = response.status_code,
                    "Vault request succeeded"
                );
                response
            }
            Err(err) => {
                match &err {
                    VaultError::Store(cause) => tracing::error!(
                        action = %request.action,
                        caller = %request.authenticated_caller_id,
                        error_kind = err.kind(),
                        cause = %cause,
                        "Vault request failed"
                    ),
                    _ => tracing::warn!(
                        action = %request.action,
                        caller = %request.authenticated_caller_id,
                        error_kind = err.kind(),
                        status = err.status_code(),
                        "Vault request rejected"
                    ),
                }
                err.to_response()
            }
        }
    }

    fn dispatch(&self, request: &VaultRequest) -> Result<VaultResponse, VaultError> {
        let action = Action::parse(&request.action)
            .ok_or_else(|| VaultError::UnrecognizedAction(request.action.clone()))?;

        let caller = request.authenticated_caller_id.as_str();
        if caller.is_empty() {
            return Err(VaultError::Validation(vec!["authenticatedCallerId"]));
        }

        let payload = &request.payload;
        match action {
            Action::CreatePassword => self.create(caller, payload),
            Action::GetPassword => self.get(caller, payload),
            Action::UpdatePassword => self.update(caller, payload),
            Action::DeletePassword => self.delete(caller, payload),
            Action::ListPasswords => self.list(caller),
        }
    }

    // ─── Actions ─────────────────────────────────────────────────────────────

    fn create(&self, caller: &str, payload: &RequestPayload) -> Result<VaultResponse, VaultError> {
        let (encrypted_data, iv) = require_ciphertext(payload, Vec::new())?;

        let now = self.now();
        let item = VaultItem {
            owner_id: caller.to_string(),
            entry_id: EntryId::generate(),
            encrypted_data,
            iv,
            label: label(payload),
            created_at: now,
            updated_at: now,
        };

        self.store.put_if_absent(&item)?;
        tracing::info!(caller = %caller, entry_id = %item.entry_id, "Password entry created");

        Ok(VaultResponse::json(
            STATUS_CREATED,
            &ResponseBody::new("Password entry created successfully")
                .with_entry_id(item.entry_id.as_str()),
        ))
    }

    fn get(&self, caller: &str, payload: &RequestPayload) -> Result<VaultResponse, VaultError> {
        let key = entry_key(caller, payload)?.ok_or(VaultError::NotFound)?;
        let item = self.store.get(&key)?.ok_or(VaultError::NotFound)?;

        Ok(VaultResponse::json(
            STATUS_OK,
            &ResponseBody::new("Password entry retrieved").with_entry(EntryView::from(&item)),
        ))
    }

    fn update(&self, caller: &str, payload: &RequestPayload) -> Result<VaultResponse, VaultError> {
        let key = entry_key(caller, payload);
        let missing = match key {
            Err(VaultError::Validation(ref fields)) => fields.clone(),
            _ => Vec::new(),
        };
        let (encrypted_data, iv) = require_ciphertext(payload, missing)?;
        let key = key?.ok_or(VaultError::NotFound)?;

        let update = EntryUpdate {
            encrypted_data,
            iv,
            label: label(payload),
            updated_at: self.now(),
        };
        let item = self.store.update(&key, update)?.ok_or(VaultError::NotFound)?;
        tracing::info!(caller = %caller, entry_id = %item.entry_id, "Password entry updated");

        Ok(VaultResponse::json(
            STATUS_OK,
            &ResponseBody::new("Password entry updated successfully")
                .with_entry_id(item.entry_id.as_str())
                .with_timestamps(Timestamps::from(&item)),
        ))
    }

    fn delete(&self, caller: &str, payload: &RequestPayload) -> Result<VaultResponse, VaultError> {
        let key = entry_key(caller, payload)?.ok_or(VaultError::NotFound)?;

        if !self.store.delete(&key, self.now())? {
            return Err(VaultError::NotFound);
        }
        tracing::info!(caller = %caller, entry_id = %key.entry_id, "Password entry deleted");

        Ok(VaultResponse::json(
            STATUS_OK,
            &ResponseBody::new("Password entry deleted successfully")
                .with_entry_id(key.entry_id.as_str()),
        ))
    }

    fn list(&self, caller: &str) -> Result<VaultResponse, VaultError> {
        let entries: Vec<EntryView> = self
            .store
            .query_entries(caller)?
            .iter()
            .map(EntryView::from)
            .collect();

        Ok(VaultResponse::json(
            STATUS_OK,
            &ResponseBody::new(format!("{} password entries retrieved", entries.len()))
                .with_entries(entries),
        ))
    }

    /// Stored timestamps carry microseconds; truncate so the in-memory value
    /// equals what a round trip through the table yields.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Resolve the composite key. `Ok(None)` means the id cannot name a
/// password entry (wrong prefix), which callers treat as not found.
fn entry_key(caller: &str, payload: &RequestPayload) -> Result<Option<ItemKey>, VaultError> {
    match payload.entry_id.as_deref() {
        None | Some("") => Err(VaultError::Validation(vec!["entryId"])),
        Some(raw) => Ok(EntryId::parse(raw).map(|id| ItemKey::new(caller, id))),
    }
}

/// Both `encryptedData` and `iv` must be present and non-empty. `missing`
/// carries fields already found missing so one response lists them all.
fn require_ciphertext(
    payload: &RequestPayload,
    mut missing: Vec<&'static str>,
) -> Result<(OpaqueBlob, OpaqueBlob), VaultError> {
    let encrypted_data = payload.encrypted_data.clone().filter(|b| !b.is_empty());
    let iv = payload.iv.clone().filter(|b| !b.is_empty());

    if encrypted_data.is_none() {
        missing.push("encryptedData");
    }
    if iv.is_none() {
        missing.push("iv");
    }

    match (encrypted_data, iv) {
        (Some(encrypted_data), Some(iv)) if missing.is_empty() => Ok((encrypted_data, iv)),
        _ => Err(VaultError::Validation(missing)),
    }
}

fn label(payload: &RequestPayload) -> Option<String> {
    payload.label.clone().filter(|l| !l.is_empty())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
