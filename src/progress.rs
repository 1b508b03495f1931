//! Completion tracking: which steps of the wizard have been submitted.
//!
//! `WizardState` is an explicit value with a `load`/`reset` lifecycle. It is
//! built once per session from the store and handed to whoever needs it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{StorageError, WizardError};
use crate::notice::{Notice, NoticeIcon};
use crate::storage::KeyValueStore;

/// Storage key holding the completion map
pub const COMPLETION_KEY: &str = "listing.completion";

/// Result of asking whether every step is complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub complete: bool,
    /// Incomplete step keys, in wizard order
    pub incomplete: Vec<String>,
}

/// Whether the user may open a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationCheck {
    Allowed,
    /// An earlier step is still open; send the user there instead
    Redirect { to: String, notice: Notice },
}

/// Persisted completion flags for every known step
#[derive(Clone)]
pub struct WizardState {
    store: Arc<dyn KeyValueStore>,
    order: Vec<String>,
    flags: BTreeMap<String, bool>,
}

impl std::fmt::Debug for WizardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardState")
            .field("order", &self.order)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl WizardState {
    /// Load the completion map for `step_keys`.
    ///
    /// Every known key ends up present. Unknown keys are dropped and a
    /// missing or corrupt blob is reinitialized to all-false. Never fails.
    pub fn load(store: Arc<dyn KeyValueStore>, step_keys: &[String]) -> Self {
        let mut state = Self {
            store,
            order: step_keys.to_vec(),
            flags: step_keys.iter().map(|k| (k.clone(), false)).collect(),
        };

        match state.read_stored() {
            Some(stored) => {
                for (key, done) in stored {
                    if let Some(flag) = state.flags.get_mut(&key) {
                        *flag = done;
                    }
                }
            }
            None => {
                if let Err(e) = state.persist() {
                    tracing::warn!(error = %e, "Failed to initialize completion state");
                }
            }
        }

        tracing::debug!(
            completed = state.completed_count(),
            total = state.order.len(),
            "Completion state loaded"
        );
        state
    }

    fn read_stored(&self) -> Option<BTreeMap<String, bool>> {
        let blob = match self.store.get_item(COMPLETION_KEY) {
            Ok(blob) => blob?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read completion state, reinitializing");
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!(error = %e, "Completion state is corrupt, reinitializing");
                None
            }
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let blob = serde_json::to_string(&self.flags)?;
        self.store.set_item(COMPLETION_KEY, &blob)
    }

    /// Mark a step as submitted. The in-memory flag is rolled back when the
    /// write fails.
    pub fn mark_complete(&mut self, step: &str) -> Result<(), WizardError> {
        let flag = self
            .flags
            .get_mut(step)
            .ok_or_else(|| WizardError::UnknownStep(step.to_string()))?;
        if *flag {
            return Ok(());
        }
        *flag = true;

        if let Err(e) = self.persist() {
            self.flags.insert(step.to_string(), false);
            return Err(e.into());
        }
        tracing::info!(step, "Step marked complete");
        Ok(())
    }

    pub fn is_complete(&self, step: &str) -> bool {
        self.flags.get(step).copied().unwrap_or(false)
    }

    pub fn all_complete(&self) -> CompletionReport {
        let incomplete: Vec<String> = self
            .order
            .iter()
            .filter(|k| !self.is_complete(k))
            .cloned()
            .collect();
        CompletionReport {
            complete: incomplete.is_empty(),
            incomplete,
        }
    }

    /// Set every step back to incomplete. Calling it twice is the same as once.
    /// The in-memory flags are left untouched when the write fails.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        let previous = self.flags.clone();
        self.flags.values_mut().for_each(|f| *f = false);

        if let Err(e) = self.persist() {
            self.flags = previous;
            return Err(e);
        }
        tracing::info!("Completion state reset");
        Ok(())
    }

    /// Step keys in wizard order
    pub fn step_keys(&self) -> &[String] {
        &self.order
    }

    /// (step, complete) pairs in wizard order
    pub fn flags(&self) -> impl Iterator<Item = (&str, bool)> {
        self.order
            .iter()
            .map(|k| (k.as_str(), self.is_complete(k)))
    }

    pub fn completed_count(&self) -> usize {
        self.flags.values().filter(|f| **f).count()
    }

    pub fn first_incomplete(&self) -> Option<&str> {
        self.order
            .iter()
            .find(|k| !self.is_complete(k))
            .map(String::as_str)
    }

    /// Forward-navigation guard: a step can be opened once every earlier
    /// step is complete.
    pub fn check_navigation(&self, target: &str) -> Result<NavigationCheck, WizardError> {
        let index = self
            .order
            .iter()
            .position(|k| k == target)
            .ok_or_else(|| WizardError::UnknownStep(target.to_string()))?;

        let blocking = self.order[..index]
            .iter()
            .position(|k| !self.is_complete(k));

        Ok(match blocking {
            None => NavigationCheck::Allowed,
            Some(i) => NavigationCheck::Redirect {
                to: self.order[i].clone(),
                notice: Notice::new(
                    "Step not completed",
                    &format!(
                        "You cannot move to the next step because you haven't completed step {}",
                        i + 1
                    ),
                    NoticeIcon::Warning,
                ),
            },
        })
    }
}
