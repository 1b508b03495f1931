//! Listing wizard - multi-step product listing with persisted drafts
//!
//! The library holds the wizard core (definitions, validation, drafts,
//! completion tracking, step submission and the review gate). The binary
//! adds the terminal UI and CLI on top.

pub mod config;
pub mod drafts;
pub mod error;
pub mod form;
pub mod gate;
pub mod logging;
pub mod notice;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod storage;
pub mod submit;
pub mod validation;
pub mod wizard;

pub use drafts::DraftStore;
pub use error::{StorageError, SubmitError, WizardError};
pub use form::{FieldMap, FieldValue, RawForm};
pub use gate::{Decision, GateCheck, GateOutcome, ReviewGate};
pub use orchestrator::{ElementLookup, Phase, StepOrchestrator, SubmitOutcome};
pub use progress::WizardState;
pub use session::WizardSession;
pub use wizard::WizardDefinition;
