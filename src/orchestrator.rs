//! Step submission: validate, assemble, persist, mark complete, advance.
//!
//! One `StepOrchestrator` is built per step page. `submit` runs the whole
//! synchronous sequence and leaves the orchestrator either back in
//! `Editing` (invalid or not saved) or in `Advanced`.

use crate::drafts::DraftStore;
use crate::error::WizardError;
use crate::form::{title_case, FieldMap, FieldValue, RawForm};
use crate::notice::{Notice, NoticeIcon, Notifier};
use crate::progress::WizardState;
use crate::validation::{validate_step, ErrorIndicators, ValidationReport};
use crate::wizard::{FieldKind, StepDefinition};

/// Lifecycle of one step submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Validating,
    Invalid,
    Valid,
    Persisted,
    Advanced,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Editing => "editing",
            Phase::Validating => "validating",
            Phase::Invalid => "invalid",
            Phase::Valid => "valid",
            Phase::Persisted => "persisted",
            Phase::Advanced => "advanced",
        }
    }
}

/// Source of page elements an orchestrator binds to
pub trait ElementLookup {
    fn has_element(&self, name: &str) -> bool;
}

/// Fail fast when a page lacks an element the step needs
pub fn require_element(
    lookup: &dyn ElementLookup,
    step: &str,
    element: &str,
) -> Result<(), WizardError> {
    if lookup.has_element(element) {
        Ok(())
    } else {
        Err(WizardError::MissingElement {
            step: step.to_string(),
            element: element.to_string(),
        })
    }
}

/// What a submit attempt ended in
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// At least one rule failed; nothing was written
    Invalid(ValidationReport),
    /// Validated but the draft or completion write failed
    NotSaved { error: String },
    /// Persisted and marked complete; the page may move on
    Advanced { record: FieldMap },
}

impl SubmitOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, SubmitOutcome::Advanced { .. })
    }
}

/// Build the canonical record for a validated form.
///
/// Checkbox groups collapse into their `record_key` as a list of title-cased
/// values and the raw group key never appears. Companion fields are kept only
/// while their sentinel is selected. Live formats are applied.
pub fn assemble_record(step: &StepDefinition, form: &RawForm) -> FieldMap {
    let mut record = FieldMap::new();

    for field in &step.fields {
        if let Some(group) = &field.group {
            let checked: Vec<String> = form
                .get_all(&field.name)
                .into_iter()
                .filter(|v| !v.trim().is_empty())
                .map(title_case)
                .collect();
            record.insert(group.record_key.clone(), FieldValue::List(checked));
            continue;
        }

        if let Some(owner) = step.sentinel_owner(&field.name) {
            let selected = form.get(&owner.name).unwrap_or("");
            if !owner.is_sentinel(selected) {
                continue;
            }
        }

        let value = form.get(&field.name).unwrap_or("");
        record.insert(field.name.clone(), FieldValue::Text(field.formatted(value)));
    }

    record
}

/// Turn a stored draft back into form entries.
///
/// Values come back verbatim, except that a select holding its sentinel is
/// reset to the empty selection. The companion keeps its restored text.
pub fn restore_form(step: &StepDefinition, draft: &FieldMap) -> RawForm {
    let mut form = RawForm::new();

    for field in &step.fields {
        let Some(value) = draft.get(field.record_key()) else {
            continue;
        };

        match field.kind {
            FieldKind::CheckboxGroup => {
                for item in value.items() {
                    let raw = field
                        .options
                        .iter()
                        .find(|o| {
                            o.value.eq_ignore_ascii_case(item) || title_case(&o.value) == item
                        })
                        .map_or(item, |o| o.value.as_str());
                    form.append(&field.name, raw);
                }
            }
            _ => {
                let text = value.as_text().unwrap_or_default();
                if field.is_sentinel(text) {
                    form.append(&field.name, "");
                } else {
                    form.append(&field.name, text);
                }
            }
        }
    }

    form
}

/// Per-step submission state machine
#[derive(Debug)]
pub struct StepOrchestrator {
    step: StepDefinition,
    phase: Phase,
    indicators: ErrorIndicators,
    drafts: DraftStore,
}

impl StepOrchestrator {
    /// Bind to a step page. Every field must have an element on the page.
    pub fn new(
        step: StepDefinition,
        lookup: &dyn ElementLookup,
        drafts: DraftStore,
    ) -> Result<Self, WizardError> {
        step.validate()
            .map_err(|errors| WizardError::MalformedStep {
                step: step.key.clone(),
                reason: errors.join("; "),
            })?;
        for field in &step.fields {
            require_element(lookup, &step.key, &field.name)?;
        }

        Ok(Self {
            indicators: ErrorIndicators::new(&step),
            step,
            phase: Phase::Editing,
            drafts,
        })
    }

    pub fn step(&self) -> &StepDefinition {
        &self.step
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn indicators(&self) -> &ErrorIndicators {
        &self.indicators
    }

    /// Values to prefill the page with; empty when the step was never saved
    pub fn restore(&self) -> RawForm {
        restore_form(&self.step, &self.drafts.get(&self.step.key))
    }

    /// Run one submit attempt.
    pub fn submit(
        &mut self,
        form: &RawForm,
        progress: &mut WizardState,
        notifier: &mut dyn Notifier,
    ) -> SubmitOutcome {
        self.phase = Phase::Validating;
        let report = validate_step(&self.step, form);
        self.indicators.apply(&report);

        if !report.valid {
            self.phase = Phase::Invalid;
            tracing::debug!(
                step = %self.step.key,
                fields = ?report.failed_fields(),
                "Step submission invalid"
            );
            for notice in report.notices() {
                notifier.notify(notice);
            }
            self.phase = Phase::Editing;
            return SubmitOutcome::Invalid(report);
        }

        self.phase = Phase::Valid;
        let record = assemble_record(&self.step, form);

        let previous = self.drafts.all().remove(&self.step.key);
        if let Err(e) = self.drafts.set(&self.step.key, record.clone()) {
            return self.not_saved(notifier, &e.to_string());
        }
        self.phase = Phase::Persisted;

        if let Err(e) = progress.mark_complete(&self.step.key) {
            self.restore_previous(previous);
            return self.not_saved(notifier, &e.to_string());
        }

        self.phase = Phase::Advanced;
        tracing::info!(step = %self.step.key, fields = record.len(), "Step submitted");
        SubmitOutcome::Advanced { record }
    }

    /// Put back the draft that was stored before this attempt
    fn restore_previous(&self, previous: Option<FieldMap>) {
        let rolled_back = match previous {
            Some(fields) => self.drafts.set(&self.step.key, fields),
            None => self.drafts.clear(&self.step.key),
        };
        if let Err(e) = rolled_back {
            tracing::warn!(step = %self.step.key, error = %e, "Failed to roll back draft");
        }
    }

    fn not_saved(&mut self, notifier: &mut dyn Notifier, error: &str) -> SubmitOutcome {
        tracing::warn!(
            step = %self.step.key,
            phase = self.phase.label(),
            error,
            "Failed to save step"
        );
        notifier.notify(Notice::new(
            "Not saved",
            &format!("This step could not be saved: {error}"),
            NoticeIcon::Error,
        ));
        self.phase = Phase::Editing;
        SubmitOutcome::NotSaved {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::notice::NoticeQueue;
    use crate::progress::COMPLETION_KEY;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::wizard::WizardDefinition;
    use std::sync::Arc;

    struct AllElements;

    impl ElementLookup for AllElements {
        fn has_element(&self, _name: &str) -> bool {
            true
        }
    }

    struct Without(&'static str);

    impl ElementLookup for Without {
        fn has_element(&self, name: &str) -> bool {
            name != self.0
        }
    }

    /// Reads work, writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn definition() -> WizardDefinition {
        WizardDefinition::builtin().unwrap()
    }

    fn setup(step: &str) -> (StepOrchestrator, WizardState, DraftStore) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let definition = definition();
        let drafts = DraftStore::new(store.clone());
        let progress = WizardState::load(store, &definition.step_keys());
        let orchestrator = StepOrchestrator::new(
            definition.step(step).unwrap().clone(),
            &AllElements,
            drafts.clone(),
        )
        .unwrap();
        (orchestrator, progress, drafts)
    }

    fn detail_form() -> RawForm {
        RawForm::new()
            .with("description", &"d".repeat(60))
            .with("color", "red")
            .with("color", "purple")
            .with("size", "large")
            .with("length", "10")
            .with("width", "5")
            .with("height", "3")
            .with("weight", "0.5")
    }

    #[test]
    fn test_missing_element_fails_fast() {
        let store = Arc::new(MemoryStore::new());
        let step = definition().step("step1").unwrap().clone();
        let result = StepOrchestrator::new(step, &Without("brand"), DraftStore::new(store));
        assert!(matches!(
            result,
            Err(WizardError::MissingElement { element, .. }) if element == "brand"
        ));
    }

    #[test]
    fn test_valid_submit_persists_and_advances() {
        let (mut orchestrator, mut progress, drafts) = setup("step2");
        let mut notices = NoticeQueue::new();

        let outcome = orchestrator.submit(&detail_form(), &mut progress, &mut notices);

        assert!(outcome.is_advanced());
        assert_eq!(orchestrator.phase(), Phase::Advanced);
        assert!(progress.is_complete("step2"));
        assert!(notices.is_empty());

        let draft = drafts.get("step2");
        assert_eq!(
            draft.get("colors"),
            Some(&FieldValue::List(vec!["Red".into(), "Purple".into()]))
        );
        assert_eq!(draft.get("sizes"), Some(&FieldValue::List(vec!["Large".into()])));
        assert!(!draft.contains_key("color"));
        assert!(!draft.contains_key("size"));
    }

    #[test]
    fn test_invalid_submit_writes_nothing() {
        let (mut orchestrator, mut progress, drafts) = setup("step2");
        let mut notices = NoticeQueue::new();
        let mut form = detail_form();
        form.remove("color");
        form.remove("size");

        let outcome = orchestrator.submit(&form, &mut progress, &mut notices);

        let SubmitOutcome::Invalid(report) = outcome else {
            panic!("expected invalid outcome");
        };
        assert_eq!(report.failed_fields(), vec!["color", "size"]);
        assert_eq!(notices.len(), 2);
        assert_eq!(orchestrator.phase(), Phase::Editing);
        assert!(orchestrator.indicators().is_visible("color"));
        assert!(!progress.is_complete("step2"));
        assert!(!drafts.contains("step2"));
    }

    #[test]
    fn test_failed_write_leaves_step_incomplete() {
        let store: Arc<dyn KeyValueStore> = Arc::new(ReadOnlyStore);
        let definition = definition();
        let mut progress = WizardState::load(store.clone(), &definition.step_keys());
        let mut orchestrator = StepOrchestrator::new(
            definition.step("step2").unwrap().clone(),
            &AllElements,
            DraftStore::new(store),
        )
        .unwrap();
        let mut notices = NoticeQueue::new();

        let outcome = orchestrator.submit(&detail_form(), &mut progress, &mut notices);

        assert!(matches!(outcome, SubmitOutcome::NotSaved { .. }));
        assert_eq!(orchestrator.phase(), Phase::Editing);
        assert!(!progress.is_complete("step2"));
        assert_eq!(notices.current().unwrap().icon, NoticeIcon::Error);
    }

    /// Memory store that refuses completion writes
    #[derive(Default)]
    struct NoCompletionStore(MemoryStore);

    impl KeyValueStore for NoCompletionStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get_item(key)
        }
        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == COMPLETION_KEY {
                return Err(StorageError::Io(std::io::Error::other("quota exceeded")));
            }
            self.0.set_item(key, value)
        }
        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove_item(key)
        }
    }

    fn warranty_form(manufacturer: &str) -> RawForm {
        RawForm::new()
            .with("manufacturer", manufacturer)
            .with("manufacturer_phone", "5551234")
            .with("warranty_description", &"w".repeat(60))
    }

    #[test]
    fn test_failed_completion_write_drops_new_draft() {
        let store: Arc<dyn KeyValueStore> = Arc::new(NoCompletionStore::default());
        let definition = definition();
        let drafts = DraftStore::new(store.clone());
        let mut progress = WizardState::load(store, &definition.step_keys());
        let mut orchestrator = StepOrchestrator::new(
            definition.step("step8").unwrap().clone(),
            &AllElements,
            drafts.clone(),
        )
        .unwrap();

        let outcome = orchestrator.submit(
            &warranty_form("Acme"),
            &mut progress,
            &mut NoticeQueue::new(),
        );

        assert!(matches!(outcome, SubmitOutcome::NotSaved { .. }));
        assert!(!progress.is_complete("step8"));
        assert!(!drafts.contains("step8"));
    }

    #[test]
    fn test_failed_completion_write_keeps_earlier_draft() {
        let store: Arc<dyn KeyValueStore> = Arc::new(NoCompletionStore::default());
        let definition = definition();
        let drafts = DraftStore::new(store.clone());
        let mut earlier = FieldMap::new();
        earlier.insert("manufacturer".to_string(), FieldValue::from("Earlier Co"));
        drafts.set("step8", earlier.clone()).unwrap();

        let mut progress = WizardState::load(store, &definition.step_keys());
        let mut orchestrator = StepOrchestrator::new(
            definition.step("step8").unwrap().clone(),
            &AllElements,
            drafts.clone(),
        )
        .unwrap();

        let outcome = orchestrator.submit(
            &warranty_form("Later Co"),
            &mut progress,
            &mut NoticeQueue::new(),
        );

        assert!(matches!(outcome, SubmitOutcome::NotSaved { .. }));
        assert_eq!(drafts.get("step8"), earlier);
    }

    #[test]
    fn test_restored_phone_resubmits_unchanged() {
        let (mut orchestrator, mut progress, drafts) = setup("step8");
        let mut form = warranty_form("Acme");
        form.set("manufacturer_phone", "0123 4567 8901 2345");

        let SubmitOutcome::Advanced { record } =
            orchestrator.submit(&form, &mut progress, &mut NoticeQueue::new())
        else {
            panic!("first submit should advance");
        };
        assert_eq!(
            record.get("manufacturer_phone"),
            Some(&FieldValue::from("0123-4567-8901-2345"))
        );

        let restored = orchestrator.restore();
        let outcome = orchestrator.submit(&restored, &mut progress, &mut NoticeQueue::new());
        assert_eq!(outcome, SubmitOutcome::Advanced { record: record.clone() });
        assert_eq!(drafts.get("step8"), record);
    }

    #[test]
    fn test_restore_round_trips_groups() {
        let (mut orchestrator, mut progress, _) = setup("step2");
        orchestrator.submit(&detail_form(), &mut progress, &mut NoticeQueue::new());

        let restored = orchestrator.restore();
        assert_eq!(restored.get_all("color"), vec!["red", "purple"]);
        assert_eq!(restored.get_all("size"), vec!["large"]);
        assert_eq!(restored.get("weight"), Some("0.5"));
    }

    #[test]
    fn test_restore_resets_sentinel_but_keeps_companion() {
        let (mut orchestrator, mut progress, _) = setup("step1");
        let form = RawForm::new()
            .with("name", "Blood orange")
            .with("category", "new")
            .with("new_category", "Citrus hybrids")
            .with("is_featured_item", "y")
            .with("brand", "Sicilia")
            .with("sku", "BO-7")
            .with("upc", "0001112223334")
            .with("short_description", &"s".repeat(80));

        assert!(orchestrator
            .submit(&form, &mut progress, &mut NoticeQueue::new())
            .is_advanced());

        let restored = orchestrator.restore();
        assert_eq!(restored.get("category"), Some(""));
        assert_eq!(restored.get("new_category"), Some("Citrus hybrids"));
        assert_eq!(restored.get("name"), Some("Blood orange"));
    }

    #[test]
    fn test_inactive_companion_not_recorded() {
        let step = definition().step("step3").unwrap().clone();
        let form = RawForm::new()
            .with("select_discount", "no")
            .with("add_discount", "15");
        let record = assemble_record(&step, &form);
        assert!(!record.contains_key("add_discount"));

        let form = RawForm::new()
            .with("select_discount", "yes")
            .with("add_discount", "15");
        let record = assemble_record(&step, &form);
        assert_eq!(record.get("add_discount"), Some(&FieldValue::from("15")));
    }

    #[test]
    fn test_phone_is_formatted_in_record() {
        let step = definition().step("step8").unwrap().clone();
        let form = RawForm::new().with("manufacturer_phone", "012 345 678 901");
        let record = assemble_record(&step, &form);
        assert_eq!(
            record.get("manufacturer_phone"),
            Some(&FieldValue::from("0123-4567-8901"))
        );
    }
}
