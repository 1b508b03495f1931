//! One wizard session: a definition bound to an origin's stored state.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::drafts::DraftStore;
use crate::error::{StorageError, WizardError};
use crate::gate::ReviewGate;
use crate::orchestrator::{ElementLookup, StepOrchestrator};
use crate::progress::WizardState;
use crate::storage::{FileStore, KeyValueStore};
use crate::submit::{HttpSubmitter, Submitter, UnconfiguredSubmitter};
use crate::wizard::WizardDefinition;

#[derive(Debug)]
pub struct WizardSession {
    pub definition: WizardDefinition,
    pub drafts: DraftStore,
    pub progress: WizardState,
    origin: String,
}

impl WizardSession {
    /// Open the configured definition against the configured origin store
    pub fn open(config: &Config) -> Result<Self> {
        let definition_path = config.definition_path();
        let definition = WizardDefinition::load(definition_path.as_deref())?;
        let store = FileStore::open(&config.state_path(), &config.storage.origin)
            .context("Failed to open state store")?;

        tracing::info!(
            origin = %config.storage.origin,
            root = %store.root().display(),
            wizard = %definition.name,
            "Wizard session opened"
        );
        Ok(Self::with_store(
            definition,
            Arc::new(store),
            &config.storage.origin,
        ))
    }

    pub fn with_store(
        definition: WizardDefinition,
        store: Arc<dyn KeyValueStore>,
        origin: &str,
    ) -> Self {
        let progress = WizardState::load(store.clone(), &definition.step_keys());
        Self {
            definition,
            drafts: DraftStore::new(store),
            progress,
            origin: origin.to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Bind an orchestrator for `step` to a page
    pub fn orchestrator(
        &self,
        step: &str,
        lookup: &dyn ElementLookup,
    ) -> Result<StepOrchestrator, WizardError> {
        let definition = self
            .definition
            .step(step)
            .ok_or_else(|| WizardError::UnknownStep(step.to_string()))?;
        StepOrchestrator::new(definition.clone(), lookup, self.drafts.clone())
    }

    pub fn gate(&self) -> ReviewGate {
        ReviewGate::new(self.origin.clone())
    }

    /// Drop every draft and completion flag
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.drafts.clear_all()?;
        self.progress.reset()
    }
}

/// Submitter for the configured endpoint
pub fn submitter_from_config(config: &Config) -> Result<Box<dyn Submitter>> {
    match &config.submission.endpoint {
        Some(endpoint) => {
            let submitter = HttpSubmitter::new(endpoint.clone(), config.submit_timeout())
                .context("Failed to build HTTP client")?
                .with_token_from_env(&config.submission.token_env);
            tracing::debug!(endpoint = submitter.endpoint(), "Listings go to HTTP endpoint");
            Ok(Box::new(submitter))
        }
        None => {
            tracing::warn!("No submission endpoint configured");
            Ok(Box::new(UnconfiguredSubmitter))
        }
    }
}
