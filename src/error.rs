//! Error types shared across the wizard core

use thiserror::Error;

/// Configuration errors: the wizard cannot run with this setup.
///
/// These are raised while a definition is loaded or a step page is wired up
/// and are never recovered from locally.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("required page element '{element}' is missing from step '{step}'")]
    MissingElement { step: String, element: String },

    #[error("step '{step}': {reason}")]
    MalformedStep { step: String, reason: String },

    #[error("wizard definition has no steps")]
    EmptyDefinition,

    #[error("duplicate step key '{0}'")]
    DuplicateStep(String),

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("failed to parse wizard definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised by a persistent key/value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while handing a finished listing to the submission endpoint.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no submission endpoint configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("endpoint rejected the listing ({status}): {message}")]
    Rejected { status: u16, message: String },
}
