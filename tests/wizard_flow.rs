//! End-to-end wizard flows against the public library API
//!
//! Covers step submission, persistence across reloads, the review gate, and
//! the field rules of the built-in product flow.

use async_trait::async_trait;
use listing_wizard::error::SubmitError;
use listing_wizard::form::{FieldMap, FieldValue, RawForm};
use listing_wizard::gate::{Decision, GateCheck, GateOutcome};
use listing_wizard::notice::NoticeQueue;
use listing_wizard::orchestrator::{ElementLookup, SubmitOutcome};
use listing_wizard::storage::{FileStore, KeyValueStore, MemoryStore};
use listing_wizard::submit::{ListingSubmission, SubmissionReceipt, Submitter};
use listing_wizard::validation::FailureReason;
use listing_wizard::wizard::WizardDefinition;
use listing_wizard::{DraftStore, WizardSession, WizardState};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Page double that has an element for every field
struct FullPage;

impl ElementLookup for FullPage {
    fn has_element(&self, _name: &str) -> bool {
        true
    }
}

#[derive(Default)]
struct RecordingSubmitter {
    sent: Mutex<Vec<ListingSubmission>>,
}

#[async_trait]
impl Submitter for RecordingSubmitter {
    fn name(&self) -> &str {
        "recording"
    }

    async fn submit(&self, listing: &ListingSubmission) -> Result<SubmissionReceipt, SubmitError> {
        self.sent.lock().unwrap().push(listing.clone());
        Ok(SubmissionReceipt {
            id: listing.id,
            status: 201,
        })
    }
}

/// Three single-field steps
fn three_step_definition() -> WizardDefinition {
    WizardDefinition::from_json(
        r#"{
        "name": "Mini listing",
        "steps": [
            {"key": "step1", "title": "Name", "fields": [
                {"name": "name", "label": "Name", "kind": "text"}]},
            {"key": "step2", "title": "Price", "fields": [
                {"name": "price", "label": "Price", "kind": "number", "range": {"min": 1}}]},
            {"key": "step3", "title": "Brand", "fields": [
                {"name": "brand", "label": "Brand", "kind": "text"}]}
        ]
    }"#,
    )
    .unwrap()
}

fn memory_session(definition: WizardDefinition) -> WizardSession {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    WizardSession::with_store(definition, store, "http://localhost:8000")
}

fn submit(session: &mut WizardSession, step: &str, form: &RawForm) -> SubmitOutcome {
    let mut orchestrator = session.orchestrator(step, &FullPage).unwrap();
    orchestrator.submit(form, &mut session.progress, &mut NoticeQueue::new())
}

fn complete_mini_steps(session: &mut WizardSession, steps: &[&str]) {
    for step in steps {
        let form = match *step {
            "step1" => RawForm::new().with("name", "Plum"),
            "step2" => RawForm::new().with("price", "4.5"),
            _ => RawForm::new().with("brand", "Orchard"),
        };
        assert!(submit(session, step, &form).is_advanced(), "{step} should pass");
    }
}

fn detail_form_without_groups() -> RawForm {
    RawForm::new()
        .with("description", &"A firm, sweet plum with dark skin. ".repeat(3))
        .with("length", "5")
        .with("width", "5")
        .with("height", "5")
        .with("weight", "0.1")
}

// ─── Completion tracking ─────────────────────────────────────────────────────

#[test]
fn test_mark_complete_survives_reload_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let keys = three_step_definition().step_keys();

    {
        let store = Arc::new(FileStore::open(temp_dir.path(), "http://localhost:8000").unwrap());
        let mut state = WizardState::load(store, &keys);
        for key in &keys {
            state.mark_complete(key).unwrap();
            assert!(state.is_complete(key));
        }
    }

    let store = Arc::new(FileStore::open(temp_dir.path(), "http://localhost:8000").unwrap());
    let state = WizardState::load(store, &keys);
    assert!(keys.iter().all(|k| state.is_complete(k)));
    assert!(state.all_complete().complete);
}

#[test]
fn test_origins_do_not_share_state() {
    let temp_dir = TempDir::new().unwrap();
    let keys = three_step_definition().step_keys();

    let shop = Arc::new(FileStore::open(temp_dir.path(), "https://shop.example.com").unwrap());
    WizardState::load(shop, &keys).mark_complete("step1").unwrap();

    let other = Arc::new(FileStore::open(temp_dir.path(), "https://other.example.com").unwrap());
    assert!(!WizardState::load(other, &keys).is_complete("step1"));
}

#[test]
fn test_n_minus_one_complete_reports_the_last() {
    let definition = WizardDefinition::builtin().unwrap();
    let keys = definition.step_keys();
    let store = Arc::new(MemoryStore::new());
    let mut state = WizardState::load(store, &keys);

    for key in &keys {
        if key != "step6" {
            state.mark_complete(key).unwrap();
        }
    }

    let report = state.all_complete();
    assert!(!report.complete);
    assert_eq!(report.incomplete, vec!["step6".to_string()]);
}

#[test]
fn test_reset_twice_equals_once() {
    let mut session = memory_session(three_step_definition());
    complete_mini_steps(&mut session, &["step1", "step2"]);

    session.progress.reset().unwrap();
    let once: Vec<_> = session
        .progress
        .flags()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    session.progress.reset().unwrap();
    let twice: Vec<_> = session
        .progress
        .flags()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    assert_eq!(once, twice);
    assert!(once.iter().all(|(_, done)| !done));
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

#[test]
fn test_draft_round_trip_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::open(temp_dir.path(), "o").unwrap());
    let drafts = DraftStore::new(store);

    let mut map = FieldMap::new();
    map.insert("name".to_string(), FieldValue::from("Ünïcödé «plum»"));
    map.insert("notes".to_string(), FieldValue::from("line one\nline two"));
    map.insert(
        "colors".to_string(),
        FieldValue::from(vec!["Red".to_string(), "Light Blue".to_string()]),
    );
    map.insert("sizes".to_string(), FieldValue::List(vec![]));

    drafts.set("step2", map.clone()).unwrap();
    assert_eq!(drafts.get("step2"), map);
    assert!(drafts.get("step5").is_empty());
}

#[test]
fn test_invalid_resubmit_keeps_previous_draft() {
    let mut session = memory_session(three_step_definition());
    complete_mini_steps(&mut session, &["step1"]);

    let outcome = submit(&mut session, "step1", &RawForm::new().with("name", "  "));
    assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
    assert_eq!(
        session.drafts.get("step1").get("name"),
        Some(&FieldValue::from("Plum"))
    );
    assert!(session.progress.is_complete("step1"));
}

// ─── Field rules (built-in product flow) ─────────────────────────────────────

#[test]
fn test_detail_step_without_colors_or_sizes_is_rejected() {
    let mut session = memory_session(WizardDefinition::builtin().unwrap());
    let mut orchestrator = session.orchestrator("step2", &FullPage).unwrap();
    let mut notices = NoticeQueue::new();

    let outcome = orchestrator.submit(
        &detail_form_without_groups(),
        &mut session.progress,
        &mut notices,
    );

    let SubmitOutcome::Invalid(report) = outcome else {
        panic!("detail step should be invalid");
    };
    let group_failures: Vec<_> = report
        .failures
        .iter()
        .filter(|f| matches!(f.reason, FailureReason::TooFewChecked { .. }))
        .map(|f| f.field.as_str())
        .collect();
    assert_eq!(group_failures, vec!["color", "size"]);

    let bodies: Vec<_> = notices.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(
        bodies,
        vec!["Select at least one color", "Select at least one size"]
    );
    assert!(session.drafts.get("step2").is_empty());
    assert!(!session.progress.is_complete("step2"));
}

#[test]
fn test_short_description_length_bounds() {
    let definition = WizardDefinition::builtin().unwrap();
    let step = definition.step("step1").unwrap();
    let base = RawForm::new()
        .with("name", "Plum")
        .with("category", "fresh_fruits")
        .with("is_featured_item", "n")
        .with("brand", "Orchard")
        .with("sku", "PL-1")
        .with("upc", "0000");

    let with_description = |length: usize| {
        let mut form = base.clone();
        form.set("short_description", &"p".repeat(length));
        listing_wizard::validation::validate_step(step, &form)
    };

    let report = with_description(49);
    assert!(!report.valid);
    assert!(matches!(
        report.failures_for("short_description").next().unwrap().reason,
        FailureReason::TooShort { min: 50, actual: 49 }
    ));

    for length in [50, 120, 255] {
        let report = with_description(length);
        assert!(
            !report.has_failure("short_description"),
            "{length} characters should pass"
        );
    }

    assert!(matches!(
        with_description(256)
            .failures_for("short_description")
            .next()
            .unwrap()
            .reason,
        FailureReason::TooLong { max: 255, .. }
    ));
}

#[test]
fn test_detail_step_records_title_cased_arrays() {
    let mut session = memory_session(WizardDefinition::builtin().unwrap());
    let form = detail_form_without_groups()
        .with("color", "green")
        .with("color", "yellow")
        .with("size", "medium");

    assert!(submit(&mut session, "step2", &form).is_advanced());

    let draft = session.drafts.get("step2");
    assert_eq!(
        draft.get("colors"),
        Some(&FieldValue::List(vec!["Green".into(), "Yellow".into()]))
    );
    assert_eq!(
        draft.get("sizes"),
        Some(&FieldValue::List(vec!["Medium".into()]))
    );
    assert!(!draft.contains_key("color"));
    assert!(!draft.contains_key("size"));
}

// ─── Review gate ─────────────────────────────────────────────────────────────

#[test]
fn test_gate_rejects_with_step_three_missing() {
    let mut session = memory_session(three_step_definition());
    complete_mini_steps(&mut session, &["step1", "step2"]);
    let mut notices = NoticeQueue::new();

    let check = session.gate().check(&session.progress, &mut notices);

    assert_eq!(check, GateCheck::Incomplete { missing: vec![3] });
    assert_eq!(
        notices.current().unwrap().body,
        "Complete step 3 before submitting"
    );
}

#[tokio::test]
async fn test_gate_accepts_and_wipes_everything() {
    let mut session = memory_session(three_step_definition());
    complete_mini_steps(&mut session, &["step1", "step2", "step3"]);
    let submitter = RecordingSubmitter::default();
    let mut notices = NoticeQueue::new();
    let gate = session.gate();

    assert_eq!(gate.check(&session.progress, &mut notices), GateCheck::Ready);
    let outcome = gate
        .resolve(
            Decision::Save,
            &mut session.progress,
            &session.drafts,
            &submitter,
            &mut notices,
        )
        .await;

    assert!(matches!(outcome, GateOutcome::Submitted(_)));
    assert!(!session.progress.is_complete("step1"));
    assert!(session.drafts.get("step1").is_empty());

    let sent = submitter.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].origin, "http://localhost:8000");
    assert_eq!(
        sent[0].steps["step2"].get("price"),
        Some(&FieldValue::from("4.5"))
    );
}

#[tokio::test]
async fn test_gate_discard_keeps_work() {
    let mut session = memory_session(three_step_definition());
    complete_mini_steps(&mut session, &["step1", "step2", "step3"]);
    let submitter = RecordingSubmitter::default();

    let outcome = session
        .gate()
        .resolve(
            Decision::Discard,
            &mut session.progress,
            &session.drafts,
            &submitter,
            &mut NoticeQueue::new(),
        )
        .await;

    assert_eq!(outcome, GateOutcome::Discarded);
    assert!(session.progress.all_complete().complete);
    assert_eq!(session.drafts.all().len(), 3);
    assert!(submitter.sent.lock().unwrap().is_empty());
}
