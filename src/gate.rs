//! Terminal review gate: the last step before a listing leaves the machine.
//!
//! `check` is synchronous and only reads completion state. `resolve` acts on
//! the user's save/discard answer and is the only place drafts and
//! completion are wiped.

use crate::drafts::{DraftMap, DraftStore};
use crate::notice::{Notice, NoticeIcon, Notifier};
use crate::progress::WizardState;
use crate::submit::{ListingSubmission, SubmissionReceipt, Submitter};

/// Answer from the save/discard prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Save,
    Discard,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateCheck {
    /// Every step is complete; ask the user to confirm
    Ready,
    /// 1-indexed ordinals of the steps still open, ascending
    Incomplete { missing: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Submitted(SubmissionReceipt),
    /// Accepted by the endpoint, but the local drafts or completion could
    /// not be wiped afterwards
    NotCleared {
        receipt: SubmissionReceipt,
        error: String,
    },
    Incomplete { missing: Vec<usize> },
    Discarded,
    Cancelled,
    Failed { error: String },
}

/// Body of the notice listing incomplete steps
pub fn incomplete_message(missing: &[usize]) -> String {
    let list = missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if missing.len() == 1 {
        format!("Complete step {list} before submitting")
    } else {
        format!("Complete steps {list} before submitting")
    }
}

#[derive(Debug, Clone)]
pub struct ReviewGate {
    origin: String,
}

impl ReviewGate {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    fn missing_ordinals(progress: &WizardState) -> Vec<usize> {
        progress
            .step_keys()
            .iter()
            .enumerate()
            .filter(|(_, key)| !progress.is_complete(key))
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Check completion. Incomplete steps raise one blocking notice.
    pub fn check(&self, progress: &WizardState, notifier: &mut dyn Notifier) -> GateCheck {
        let missing = Self::missing_ordinals(progress);
        if missing.is_empty() {
            return GateCheck::Ready;
        }

        tracing::debug!(?missing, "Review gate blocked");
        notifier.notify(Notice::new(
            "Incomplete steps",
            &incomplete_message(&missing),
            NoticeIcon::Error,
        ));
        GateCheck::Incomplete { missing }
    }

    /// Act on the user's answer to the save/discard prompt.
    ///
    /// `Save` re-checks completion, submits, and only after the endpoint
    /// accepts does it reset completion and clear every draft. Drafts are
    /// kept when the reset cannot be written.
    pub async fn resolve(
        &self,
        decision: Decision,
        progress: &mut WizardState,
        drafts: &DraftStore,
        submitter: &dyn Submitter,
        notifier: &mut dyn Notifier,
    ) -> GateOutcome {
        match decision {
            Decision::Cancel => GateOutcome::Cancelled,
            Decision::Discard => {
                notifier.notify(Notice::new(
                    "Not saved",
                    "Changes are not saved",
                    NoticeIcon::Info,
                ));
                GateOutcome::Discarded
            }
            Decision::Save => {
                if let GateCheck::Incomplete { missing } = self.check(progress, notifier) {
                    return GateOutcome::Incomplete { missing };
                }

                let listing =
                    ListingSubmission::new(&self.origin, Self::collect(progress, drafts));
                tracing::info!(
                    id = %listing.id,
                    submitter = submitter.name(),
                    "Submitting listing"
                );

                match submitter.submit(&listing).await {
                    Ok(receipt) => {
                        // Drafts go only once completion is durably reset
                        let wiped = progress
                            .reset()
                            .and_then(|()| drafts.clear_all());
                        match wiped {
                            Ok(()) => {
                                notifier.notify(Notice::new(
                                    "Saved",
                                    "Your listing has been submitted",
                                    NoticeIcon::Success,
                                ));
                                GateOutcome::Submitted(receipt)
                            }
                            Err(e) => {
                                tracing::warn!(
                                    id = %receipt.id,
                                    error = %e,
                                    "Listing submitted but local state was not cleared"
                                );
                                notifier.notify(Notice::new(
                                    "Submitted, not cleared",
                                    &format!("Listing submitted, saved steps were kept: {e}"),
                                    NoticeIcon::Error,
                                ));
                                GateOutcome::NotCleared {
                                    receipt,
                                    error: e.to_string(),
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Listing submission failed");
                        notifier.notify(Notice::new(
                            "Submission failed",
                            &e.to_string(),
                            NoticeIcon::Error,
                        ));
                        GateOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
        }
    }

    /// Drafts of the known steps, in a single map
    fn collect(progress: &WizardState, drafts: &DraftStore) -> DraftMap {
        let mut all = drafts.all();
        all.retain(|key, _| progress.step_keys().contains(key));
        all
    }
}
