// Password Vault - In-memory Item Store
//
// Test double for the backing table. Same contract as the SQLite store:
// conditional creation, retired keys, monotonic `updated_at`.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::models::{EntryUpdate, ItemKey, VaultItem};
use super::repository::EntryStore;
use super::StoreError;

#[derive(Default)]
struct Table {
    items: BTreeMap<ItemKey, VaultItem>,
    retired: HashSet<ItemKey>,
}

#[derive(Default)]
pub struct MemoryEntryStore {
    table: Mutex<Table>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live items across all owners. Reads through a poisoned
    /// lock rather than reporting an empty table.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        self.table.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl EntryStore for MemoryEntryStore {
    fn put_if_absent(&self, item: &VaultItem) -> Result<(), StoreError> {
        let mut table = self.lock()?;
        let key = item.key();

        if table.retired.contains(&key) || table.items.contains_key(&key) {
            return Err(StoreError::Conflict(key.to_string()));
        }

        table.items.insert(key, item.clone());
        Ok(())
    }

    fn get(&self, key: &ItemKey) -> Result<Option<VaultItem>, StoreError> {
        Ok(self.lock()?.items.get(key).cloned())
    }

    fn update(&self, key: &ItemKey, update: EntryUpdate) -> Result<Option<VaultItem>, StoreError> {
        let mut table = self.lock()?;

        let Some(item) = table.items.get_mut(key) else {
            return Ok(None);
        };

        item.encrypted_data = update.encrypted_data;
        item.iv = update.iv;
        if let Some(label) = update.label {
            item.label = Some(label);
        }
        item.updated_at = item.updated_at.max(update.updated_at);

        Ok(Some(item.clone()))
    }

    fn delete(&self, key: &ItemKey, _retired_at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut table = self.lock()?;

        if table.items.remove(key).is_some() {
            table.retired.insert(key.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn query_entries(&self, owner_id: &str) -> Result<Vec<VaultItem>, StoreError> {
        Ok(self
            .lock()?
            .items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{EntryId, OpaqueBlob};
    use chrono::Duration;

    fn new_item(owner: &str) -> VaultItem {
        let now = Utc::now();
        VaultItem {
            owner_id: owner.to_string(),
            entry_id: EntryId::generate(),
            encrypted_data: OpaqueBlob::new("blob"),
            iv: OpaqueBlob::new("iv"),
            label: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_conditional_put_and_retirement() {
        let store = MemoryEntryStore::new();
        let item = new_item("user-a");

        store.put_if_absent(&item).unwrap();
        assert!(matches!(store.put_if_absent(&item), Err(StoreError::Conflict(_))));

        assert!(store.delete(&item.key(), Utc::now()).unwrap());
        assert!(store.is_empty());
        assert!(matches!(store.put_if_absent(&item), Err(StoreError::Conflict(_))));
        assert!(!store.delete(&item.key(), Utc::now()).unwrap());
    }

    #[test]
    fn test_update_is_monotonic() {
        let store = MemoryEntryStore::new();
        let item = new_item("user-a");
        store.put_if_absent(&item).unwrap();

        let stale = EntryUpdate {
            encrypted_data: OpaqueBlob::new("new"),
            iv: OpaqueBlob::new("new-iv"),
            label: None,
            updated_at: item.updated_at - Duration::seconds(10),
        };
        let updated = store.update(&item.key(), stale).unwrap().unwrap();
        assert_eq!(updated.updated_at, item.updated_at);
        assert_eq!(updated.created_at, item.created_at);
        assert_eq!(updated.encrypted_data.as_str(), "new");
    }

    #[test]
    fn test_query_entries_filters_by_owner() {
        let store = MemoryEntryStore::new();
        store.put_if_absent(&new_item("user-a")).unwrap();
        store.put_if_absent(&new_item("user-a")).unwrap();
        store.put_if_absent(&new_item("user-b")).unwrap();

        assert_eq!(store.query_entries("user-a").unwrap().len(), 2);
        assert_eq!(store.query_entries("user-b").unwrap().len(), 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_len_counts_items_behind_poisoned_lock() {
        let store = MemoryEntryStore::new();
        store.put_if_absent(&new_item("user-a")).unwrap();

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.table.lock().unwrap();
            panic!("poison the table lock");
        }));
        assert!(poisoned.is_err());
        assert!(store.table.is_poisoned());

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(matches!(
            store.put_if_absent(&new_item("user-a")),
            Err(StoreError::LockPoisoned)
        ));
    }
}
