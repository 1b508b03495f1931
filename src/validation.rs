//! Field validation: native constraints plus the step rules.
//!
//! Every applicable rule is evaluated; nothing short-circuits, so a single
//! submit surfaces every problem at once. Validation never touches drafts.

use std::collections::BTreeMap;
use std::fmt;

use crate::form::RawForm;
use crate::notice::Notice;
use crate::wizard::{FieldDescriptor, FieldKind, StepDefinition};

/// Why a field failed
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Empty after trimming
    Required,
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    /// Checkbox group below its minimum; carries the notice body
    TooFewChecked { min: usize, notice: String },
    NotANumber,
    BelowMinimum { min: f64 },
    AboveMaximum { max: f64 },
    /// Select value that is not among the declared options
    UnknownOption(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Required => write!(f, "This field is required"),
            FailureReason::TooShort { min, actual } => write!(
                f,
                "Use at least {min} characters ({} more needed)",
                min.saturating_sub(*actual)
            ),
            FailureReason::TooLong { max, actual } => write!(
                f,
                "Use at most {max} characters ({} too many)",
                actual.saturating_sub(*max)
            ),
            FailureReason::TooFewChecked { notice, .. } => write!(f, "{notice}"),
            FailureReason::NotANumber => write!(f, "Enter a number"),
            FailureReason::BelowMinimum { min } => write!(f, "Must be at least {min}"),
            FailureReason::AboveMaximum { max } => write!(f, "Must be at most {max}"),
            FailureReason::UnknownOption(value) => write!(f, "'{value}' is not a valid choice"),
        }
    }
}

/// One failed rule for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFailure {
    pub field: String,
    pub reason: FailureReason,
}

impl FieldFailure {
    fn new(field: &str, reason: FailureReason) -> Self {
        Self {
            field: field.to_string(),
            reason,
        }
    }
}

/// Outcome of validating one submitted form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub failures: Vec<FieldFailure>,
}

impl ValidationReport {
    fn from_failures(failures: Vec<FieldFailure>) -> Self {
        Self {
            valid: failures.is_empty(),
            failures,
        }
    }

    /// Fold another set of failures into this report
    pub fn merge(&mut self, mut other: Vec<FieldFailure>) {
        self.failures.append(&mut other);
        self.valid = self.failures.is_empty();
    }

    pub fn failures_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldFailure> {
        self.failures.iter().filter(move |f| f.field == field)
    }

    pub fn has_failure(&self, field: &str) -> bool {
        self.failures.iter().any(|f| f.field == field)
    }

    /// Distinct failing fields, in the order they failed
    pub fn failed_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for failure in &self.failures {
            if !fields.contains(&failure.field.as_str()) {
                fields.push(&failure.field);
            }
        }
        fields
    }

    /// Modal notices owed to the user (one per under-filled checkbox group)
    pub fn notices(&self) -> Vec<Notice> {
        self.failures
            .iter()
            .filter_map(|f| match &f.reason {
                FailureReason::TooFewChecked { notice, .. } => Some(Notice::missing_value(notice)),
                _ => None,
            })
            .collect()
    }
}

/// Live counters for a length-bounded text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterCounter {
    pub min: usize,
    pub max: usize,
}

/// Snapshot of a counter for the current text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterReading {
    pub length: usize,
    /// Characters still needed to reach the minimum
    pub remaining_to_min: usize,
    /// Characters left before the maximum
    pub remaining_before_max: usize,
    /// Characters past the maximum
    pub excess: usize,
}

impl CounterReading {
    pub fn within_bounds(&self) -> bool {
        self.remaining_to_min == 0 && self.excess == 0
    }

    pub fn min_message(&self) -> String {
        format!("Minimum characters to use: {}", self.remaining_to_min)
    }

    pub fn max_message(&self) -> String {
        format!("Number of characters remaining: {}", self.remaining_before_max)
    }
}

impl CharacterCounter {
    pub fn for_field(field: &FieldDescriptor) -> Option<Self> {
        field.length.map(|l| Self {
            min: l.min,
            max: l.max,
        })
    }

    pub fn read(&self, text: &str) -> CounterReading {
        self.read_count(text.chars().count())
    }

    /// Reading for a text of `length` characters
    pub fn read_count(&self, length: usize) -> CounterReading {
        CounterReading {
            length,
            remaining_to_min: self.min.saturating_sub(length),
            remaining_before_max: self.max.saturating_sub(length),
            excess: length.saturating_sub(self.max),
        }
    }
}

/// Whether a companion field is currently active (its sentinel is selected).
/// Fields that are nobody's companion are always active.
fn is_active(step: &StepDefinition, field: &FieldDescriptor, form: &RawForm) -> bool {
    match step.sentinel_owner(&field.name) {
        Some(owner) => form
            .get(&owner.name)
            .is_some_and(|value| owner.is_sentinel(value)),
        None => true,
    }
}

fn is_required(step: &StepDefinition, field: &FieldDescriptor) -> bool {
    // A companion field is mandatory whenever it is active
    field.required || step.sentinel_owner(&field.name).is_some()
}

/// Constraints an input enforces on its own: numeric parsing and ranges,
/// and select values restricted to the declared options.
pub fn check_native_constraints(step: &StepDefinition, form: &RawForm) -> Vec<FieldFailure> {
    let mut failures = Vec::new();

    for field in &step.fields {
        if !is_active(step, field, form) {
            continue;
        }
        let formatted = field.formatted(form.get(&field.name).unwrap_or(""));
        let value = formatted.trim();
        if value.is_empty() {
            continue;
        }

        match field.kind {
            FieldKind::Number => match value.parse::<f64>() {
                Ok(number) if number.is_finite() => {
                    if let Some(range) = field.range {
                        if let Some(min) = range.min.filter(|min| number < *min) {
                            failures.push(FieldFailure::new(
                                &field.name,
                                FailureReason::BelowMinimum { min },
                            ));
                        }
                        if let Some(max) = range.max.filter(|max| number > *max) {
                            failures.push(FieldFailure::new(
                                &field.name,
                                FailureReason::AboveMaximum { max },
                            ));
                        }
                    }
                }
                _ => failures.push(FieldFailure::new(&field.name, FailureReason::NotANumber)),
            },
            FieldKind::Select if !field.has_option(value) => {
                failures.push(FieldFailure::new(
                    &field.name,
                    FailureReason::UnknownOption(value.to_string()),
                ));
            }
            FieldKind::CheckboxGroup => {
                for checked in form.get_all(&field.name) {
                    if !field.has_option(checked) {
                        failures.push(FieldFailure::new(
                            &field.name,
                            FailureReason::UnknownOption(checked.to_string()),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    failures
}

/// Step rules: required fields, checkbox-group minimums and text length bounds.
pub fn validate_fields(step: &StepDefinition, form: &RawForm) -> ValidationReport {
    let mut failures = Vec::new();

    for field in &step.fields {
        if !is_active(step, field, form) {
            continue;
        }

        if field.kind == FieldKind::CheckboxGroup {
            if let Some(group) = &field.group {
                let checked = form
                    .get_all(&field.name)
                    .iter()
                    .filter(|v| !v.trim().is_empty())
                    .count();
                // An optional group may stay empty, but not be under-filled
                let enforced = field.required || checked > 0;
                if enforced && checked < group.min_checked {
                    failures.push(FieldFailure::new(
                        &field.name,
                        FailureReason::TooFewChecked {
                            min: group.min_checked,
                            notice: group.notice.clone(),
                        },
                    ));
                }
            }
            continue;
        }

        // Rules see the value as it will be recorded
        let value = field.formatted(form.get(&field.name).unwrap_or(""));
        if value.trim().is_empty() {
            if is_required(step, field) {
                failures.push(FieldFailure::new(&field.name, FailureReason::Required));
            }
            // Length bounds only apply to something that was entered
            continue;
        }

        if let Some(counter) = CharacterCounter::for_field(field) {
            let reading = counter.read(&value);
            if reading.length < counter.min {
                failures.push(FieldFailure::new(
                    &field.name,
                    FailureReason::TooShort {
                        min: counter.min,
                        actual: reading.length,
                    },
                ));
            } else if reading.length > counter.max {
                failures.push(FieldFailure::new(
                    &field.name,
                    FailureReason::TooLong {
                        max: counter.max,
                        actual: reading.length,
                    },
                ));
            }
        }
    }

    ValidationReport::from_failures(failures)
}

/// Native constraints first, then the step rules, all collected together.
pub fn validate_step(step: &StepDefinition, form: &RawForm) -> ValidationReport {
    let mut report = ValidationReport::from_failures(check_native_constraints(step, form));
    report.merge(validate_fields(step, form).failures);
    report
}

/// Per-field error indicator visibility
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorIndicators {
    visible: BTreeMap<String, bool>,
}

impl ErrorIndicators {
    pub fn new(step: &StepDefinition) -> Self {
        Self {
            visible: step
                .fields
                .iter()
                .map(|f| (f.name.clone(), false))
                .collect(),
        }
    }

    /// Show indicators for failing fields and hide the rest
    pub fn apply(&mut self, report: &ValidationReport) {
        for (field, visible) in &mut self.visible {
            *visible = report.has_failure(field);
        }
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.visible.get(field).copied().unwrap_or(false)
    }

    pub fn visible_fields(&self) -> Vec<&str> {
        self.visible
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardDefinition;

    fn detail_step() -> StepDefinition {
        WizardDefinition::builtin()
            .unwrap()
            .step("step2")
            .unwrap()
            .clone()
    }

    fn basic_step() -> StepDefinition {
        WizardDefinition::builtin()
            .unwrap()
            .step("step1")
            .unwrap()
            .clone()
    }

    fn valid_basic_form() -> RawForm {
        RawForm::new()
            .with("name", "Granny Smith")
            .with("category", "fresh_fruits")
            .with("new_category", "")
            .with("is_featured_item", "n")
            .with("brand", "Orchard")
            .with("sku", "GS-001")
            .with("upc", "012345678905")
            .with("short_description", &"a".repeat(50))
    }

    #[test]
    fn test_counter_readings() {
        let counter = CharacterCounter { min: 50, max: 255 };
        let reading = counter.read(&"x".repeat(10));
        assert_eq!(reading.remaining_to_min, 40);
        assert_eq!(reading.remaining_before_max, 245);
        assert_eq!(reading.min_message(), "Minimum characters to use: 40");
        assert_eq!(reading.max_message(), "Number of characters remaining: 245");
        assert!(!reading.within_bounds());

        let reading = counter.read(&"x".repeat(255));
        assert_eq!(reading.remaining_to_min, 0);
        assert_eq!(reading.remaining_before_max, 0);
        assert!(reading.within_bounds());
        assert!(!counter.read(&"x".repeat(256)).within_bounds());
    }

    #[test]
    fn test_counter_counts_characters_not_bytes() {
        let counter = CharacterCounter { min: 1, max: 5 };
        assert_eq!(counter.read("épée").length, 4);
    }

    #[test]
    fn test_valid_basic_form_passes() {
        let report = validate_step(&basic_step(), &valid_basic_form());
        assert!(report.valid, "{:?}", report.failures);
    }

    #[test]
    fn test_every_failure_is_reported() {
        let form = RawForm::new().with("category", "").with("short_description", "too short");
        let report = validate_step(&basic_step(), &form);

        assert!(!report.valid);
        let failed = report.failed_fields();
        for field in ["name", "category", "brand", "sku", "upc", "short_description"] {
            assert!(failed.contains(&field), "missing failure for {field}");
        }
        assert!(report
            .failures_for("short_description")
            .any(|f| matches!(f.reason, FailureReason::TooShort { min: 50, actual: 9 })));
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let mut form = valid_basic_form();
        form.set("brand", "   ");
        let report = validate_step(&basic_step(), &form);
        assert_eq!(report.failed_fields(), vec!["brand"]);
        assert_eq!(report.failures[0].reason, FailureReason::Required);
    }

    #[test]
    fn test_companion_only_required_with_sentinel() {
        let mut form = valid_basic_form();
        form.set("category", "new");
        let report = validate_step(&basic_step(), &form);
        assert_eq!(report.failed_fields(), vec!["new_category"]);

        form.set("new_category", "Heirloom apples");
        assert!(validate_step(&basic_step(), &form).valid);
    }

    #[test]
    fn test_unknown_select_value() {
        let mut form = valid_basic_form();
        form.set("category", "plutonium");
        let report = validate_step(&basic_step(), &form);
        assert_eq!(
            report.failures[0].reason,
            FailureReason::UnknownOption("plutonium".to_string())
        );
    }

    #[test]
    fn test_group_minimum_yields_notices() {
        let form = RawForm::new()
            .with("description", &"d".repeat(60))
            .with("length", "1")
            .with("width", "1")
            .with("height", "1")
            .with("weight", "1");
        let report = validate_step(&detail_step(), &form);

        assert_eq!(report.failed_fields(), vec!["color", "size"]);
        let notices: Vec<String> = report.notices().into_iter().map(|n| n.body).collect();
        assert_eq!(
            notices,
            vec!["Select at least one color", "Select at least one size"]
        );
    }

    #[test]
    fn test_number_constraints() {
        let form = RawForm::new()
            .with("description", &"d".repeat(60))
            .with("color", "red")
            .with("size", "small")
            .with("length", "abc")
            .with("width", "0")
            .with("height", "2")
            .with("weight", "2");
        let report = validate_step(&detail_step(), &form);

        assert_eq!(report.failed_fields(), vec!["length", "width"]);
        assert_eq!(
            report.failures_for("length").next().unwrap().reason,
            FailureReason::NotANumber
        );
        assert_eq!(
            report.failures_for("width").next().unwrap().reason,
            FailureReason::BelowMinimum { min: 0.1 }
        );
    }

    #[test]
    fn test_error_indicators_follow_report() {
        let step = basic_step();
        let mut indicators = ErrorIndicators::new(&step);
        assert!(indicators.visible_fields().is_empty());

        let mut form = valid_basic_form();
        form.set("brand", "");
        indicators.apply(&validate_step(&step, &form));
        assert_eq!(indicators.visible_fields(), vec!["brand"]);

        form.set("brand", "Orchard");
        indicators.apply(&validate_step(&step, &form));
        assert!(!indicators.is_visible("brand"));
    }

    fn warranty_step() -> StepDefinition {
        WizardDefinition::builtin()
            .unwrap()
            .step("step8")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_phone_length_counts_formatted_value() {
        let form = |phone: &str| {
            RawForm::new()
                .with("manufacturer", "Acme")
                .with("manufacturer_phone", phone)
                .with("warranty_description", &"w".repeat(60))
        };

        // 16 digits format to 19 characters
        assert!(validate_step(&warranty_step(), &form("0123456789012345")).valid);

        // 20 digits fit raw but format to 24 characters
        let report = validate_step(&warranty_step(), &form("01234567890123456789"));
        assert_eq!(
            report.failures_for("manufacturer_phone").next().unwrap().reason,
            FailureReason::TooLong { max: 20, actual: 24 }
        );

        // Nothing left after formatting counts as empty
        let report = validate_step(&warranty_step(), &form("call us"));
        assert_eq!(
            report.failures_for("manufacturer_phone").next().unwrap().reason,
            FailureReason::Required
        );
    }

    #[test]
    fn test_optional_group_may_stay_empty() {
        let step: StepDefinition = serde_json::from_str(
            r#"{
            "key": "extras",
            "title": "Extras",
            "fields": [{
                "name": "tag",
                "label": "Tags",
                "kind": "checkbox_group",
                "required": false,
                "options": [
                    {"value": "vegan", "label": "Vegan"},
                    {"value": "local", "label": "Local"},
                    {"value": "organic", "label": "Organic"}
                ],
                "group": {"record_key": "tags", "min_checked": 2, "notice": "Pick two tags"}
            }]
        }"#,
        )
        .unwrap();

        assert!(validate_step(&step, &RawForm::new()).valid);

        let report = validate_step(&step, &RawForm::new().with("tag", "vegan"));
        assert_eq!(report.failed_fields(), vec!["tag"]);

        let form = RawForm::new().with("tag", "vegan").with("tag", "local");
        assert!(validate_step(&step, &form).valid);
    }

    #[test]
    fn test_reason_messages_never_underflow() {
        assert_eq!(
            FailureReason::TooShort { min: 1, actual: 5 }.to_string(),
            "Use at least 1 characters (0 more needed)"
        );
        assert_eq!(
            FailureReason::TooLong { max: 9, actual: 2 }.to_string(),
            "Use at most 9 characters (0 too many)"
        );
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(
            FailureReason::TooShort { min: 50, actual: 49 }.to_string(),
            "Use at least 50 characters (1 more needed)"
        );
        assert_eq!(
            FailureReason::TooLong { max: 255, actual: 256 }.to_string(),
            "Use at most 255 characters (1 too many)"
        );
    }
}
