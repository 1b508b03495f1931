//! Wizard definitions: the ordered steps of the item-creation flow

pub mod schema;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::WizardError;

pub use schema::{
    CustomValue, FieldDescriptor, FieldKind, FieldOption, GroupMapping, InputFormat,
    LengthBounds, NumericRange, StepDefinition,
};

/// Built-in "add new product" flow
const ADD_PRODUCT_JSON: &str = include_str!("add_product.json");

/// An ordered list of steps, validated on load
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WizardDefinition {
    /// Display name for the whole flow
    pub name: String,
    pub steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    /// Parse and validate a definition from JSON
    pub fn from_json(json: &str) -> Result<Self, WizardError> {
        let definition: WizardDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// The built-in product listing flow
    pub fn builtin() -> Result<Self, WizardError> {
        Self::from_json(ADD_PRODUCT_JSON)
    }

    /// Load from a file if one is configured, otherwise the built-in flow
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let json = fs::read_to_string(path).with_context(|| {
                    format!("Failed to read wizard definition {}", path.display())
                })?;
                let definition = Self::from_json(&json).with_context(|| {
                    format!("Invalid wizard definition {}", path.display())
                })?;
                tracing::info!(
                    path = %path.display(),
                    steps = definition.steps.len(),
                    "Loaded wizard definition"
                );
                Ok(definition)
            }
            None => Ok(Self::builtin()?),
        }
    }

    fn validate(&self) -> Result<(), WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::EmptyDefinition);
        }

        for (i, step) in self.steps.iter().enumerate() {
            if self.steps[..i].iter().any(|s| s.key == step.key) {
                return Err(WizardError::DuplicateStep(step.key.clone()));
            }
            if let Err(errors) = step.validate() {
                return Err(WizardError::MalformedStep {
                    step: step.key.clone(),
                    reason: errors.join("; "),
                });
            }
        }
        Ok(())
    }

    /// Step keys in wizard order
    pub fn step_keys(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.key.clone()).collect()
    }

    pub fn step(&self, key: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.key == key)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.key == key)
    }

    /// 1-indexed ordinal of a step, as shown to users
    pub fn ordinal(&self, key: &str) -> Option<usize> {
        self.index_of(key).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
