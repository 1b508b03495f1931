//! Draft store: the last validated values of every step, kept in one blob.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::form::FieldMap;
use crate::storage::KeyValueStore;

/// Storage key holding every step's draft
pub const DRAFTS_KEY: &str = "listing.drafts";

/// Step key -> field map, as persisted
pub type DraftMap = BTreeMap<String, FieldMap>;

#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").finish_non_exhaustive()
    }
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every stored draft. Unreadable or corrupt storage reads as empty.
    pub fn all(&self) -> DraftMap {
        let blob = match self.store.get_item(DRAFTS_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return DraftMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read drafts, treating as empty");
                return DraftMap::new();
            }
        };

        match serde_json::from_str(&blob) {
            Ok(drafts) => drafts,
            Err(e) => {
                tracing::warn!(error = %e, "Stored drafts are corrupt, treating as empty");
                DraftMap::new()
            }
        }
    }

    /// Draft for one step; empty when the step was never submitted
    pub fn get(&self, step: &str) -> FieldMap {
        self.all().remove(step).unwrap_or_default()
    }

    pub fn contains(&self, step: &str) -> bool {
        self.all().contains_key(step)
    }

    /// Replace a step's draft. The whole blob is rewritten in one store write.
    pub fn set(&self, step: &str, fields: FieldMap) -> Result<(), StorageError> {
        let mut drafts = self.all();
        drafts.insert(step.to_string(), fields);
        self.write(&drafts)?;
        tracing::debug!(step, "Draft saved");
        Ok(())
    }

    pub fn clear(&self, step: &str) -> Result<(), StorageError> {
        let mut drafts = self.all();
        if drafts.remove(step).is_some() {
            self.write(&drafts)?;
            tracing::debug!(step, "Draft cleared");
        }
        Ok(())
    }

    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.store.remove_item(DRAFTS_KEY)?;
        tracing::debug!("All drafts cleared");
        Ok(())
    }

    fn write(&self, drafts: &DraftMap) -> Result<(), StorageError> {
        let blob = serde_json::to_string(drafts)?;
        self.store.set_item(DRAFTS_KEY, &blob)
    }
}
