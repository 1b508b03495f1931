//! Schema definitions for wizard steps and their fields

use serde::{Deserialize, Serialize};

/// Schema definition for one wizard step (one page, one form)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    /// Stable step key used for drafts and completion (e.g., "step3")
    pub key: String,
    /// Title shown at the top of the step page
    pub title: String,
    /// Short help text under the title
    #[serde(default)]
    pub description: Option<String>,
    /// Field descriptors, in display order
    pub fields: Vec<FieldDescriptor>,
}

/// Schema definition for a single field in a step form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    /// Field identifier, unique within its step
    pub name: String,
    /// Label shown next to the input
    pub label: String,
    /// Input kind
    pub kind: FieldKind,
    /// Whether the value must be non-empty after trimming
    #[serde(default = "default_true")]
    pub required: bool,
    /// Placeholder text shown while the field is empty
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Character-count bounds for text and textarea fields
    #[serde(default)]
    pub length: Option<LengthBounds>,
    /// Numeric bounds for number fields
    #[serde(default)]
    pub range: Option<NumericRange>,
    /// Options for select and checkbox-group fields
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// "Enter your own" sentinel for select fields
    #[serde(default)]
    pub custom_value: Option<CustomValue>,
    /// Canonical-record mapping for checkbox groups
    #[serde(default)]
    pub group: Option<GroupMapping>,
    /// Live formatting transform applied while typing
    #[serde(default)]
    pub format: Option<InputFormat>,
}

fn default_true() -> bool {
    true
}

/// Input kinds supported by step forms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text input
    Text,
    /// Multi-line text input
    Textarea,
    /// Numeric input
    Number,
    /// Dropdown selection
    Select,
    /// Group of checkboxes submitted under one name
    CheckboxGroup,
}

impl FieldKind {
    pub fn is_textual(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Textarea)
    }
}

/// Character-count bounds with live counters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthBounds {
    #[serde(default)]
    pub min: usize,
    pub max: usize,
    /// Whether pasting into the field is allowed
    #[serde(default = "default_true")]
    pub allow_paste: bool,
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// One selectable option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Select option that reveals a companion text field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomValue {
    /// Option value meaning "enter your own"
    pub sentinel: String,
    /// Name of the companion text field
    pub field: String,
}

/// How a checkbox group lands in the canonical record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMapping {
    /// Key of the array field in the canonical record
    pub record_key: String,
    /// Minimum number of boxes that must be checked
    #[serde(default = "default_min_checked")]
    pub min_checked: usize,
    /// Body of the modal notice shown when too few boxes are checked
    pub notice: String,
}

fn default_min_checked() -> usize {
    1
}

/// Live formatting transforms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Digits grouped with dashes
    Phone,
}

impl InputFormat {
    /// Apply the transform to the current input
    pub fn apply(self, value: &str) -> String {
        match self {
            InputFormat::Phone => crate::form::format_phone_number(value),
        }
    }
}

impl FieldDescriptor {
    /// Whether pasting is allowed into this field
    pub fn allows_paste(&self) -> bool {
        self.length.map_or(true, |l| l.allow_paste)
    }

    /// Key this field occupies in the canonical record
    pub fn record_key(&self) -> &str {
        self.group
            .as_ref()
            .map_or(self.name.as_str(), |g| g.record_key.as_str())
    }

    /// Whether `value` is one of the declared options
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Value with this field's live formatting applied, if it has any
    pub fn formatted(&self, value: &str) -> String {
        self.format
            .map_or_else(|| value.to_string(), |format| format.apply(value))
    }

    /// Whether `value` is this select's custom-value sentinel
    pub fn is_sentinel(&self, value: &str) -> bool {
        self.custom_value
            .as_ref()
            .is_some_and(|c| c.sentinel == value)
    }
}

impl StepDefinition {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The select that owns `companion` as its custom-value field, if any
    pub fn sentinel_owner(&self, companion: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| {
            f.custom_value
                .as_ref()
                .is_some_and(|c| c.field == companion)
        })
    }

    /// Check the descriptor list for consistency
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.key.trim().is_empty() {
            errors.push("step key must not be empty".to_string());
        }
        if self.fields.is_empty() {
            errors.push("step must declare at least one field".to_string());
        }

        for (i, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                errors.push(format!("field #{} has an empty name", i + 1));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                errors.push(format!("duplicate field name '{}'", field.name));
            }

            if let Some(length) = field.length {
                if !field.kind.is_textual() {
                    errors.push(format!(
                        "'{}': length bounds only apply to text fields",
                        field.name
                    ));
                }
                if length.min > length.max {
                    errors.push(format!(
                        "'{}': minimum length {} exceeds maximum {}",
                        field.name, length.min, length.max
                    ));
                }
            }

            if let Some(range) = field.range {
                if let (Some(min), Some(max)) = (range.min, range.max) {
                    if min > max {
                        errors.push(format!(
                            "'{}': minimum {min} exceeds maximum {max}",
                            field.name
                        ));
                    }
                }
            }

            match field.kind {
                FieldKind::Select | FieldKind::CheckboxGroup if field.options.is_empty() => {
                    errors.push(format!("'{}': no options declared", field.name));
                }
                _ => {}
            }

            if field.kind == FieldKind::CheckboxGroup {
                match &field.group {
                    None => errors.push(format!(
                        "'{}': checkbox group needs a record mapping",
                        field.name
                    )),
                    Some(group) if group.min_checked > field.options.len() => {
                        errors.push(format!(
                            "'{}': requires {} checked but only {} options exist",
                            field.name,
                            group.min_checked,
                            field.options.len()
                        ));
                    }
                    Some(_) => {}
                }
            } else if field.group.is_some() {
                errors.push(format!(
                    "'{}': only checkbox groups can declare a record mapping",
                    field.name
                ));
            }

            if let Some(custom) = &field.custom_value {
                if field.kind != FieldKind::Select {
                    errors.push(format!(
                        "'{}': custom values only apply to select fields",
                        field.name
                    ));
                }
                if !field.has_option(&custom.sentinel) {
                    errors.push(format!(
                        "'{}': sentinel '{}' is not one of its options",
                        field.name, custom.sentinel
                    ));
                }
                match self.field(&custom.field) {
                    Some(companion)
                        if companion.kind.is_textual() || companion.kind == FieldKind::Number => {}
                    Some(_) => errors.push(format!(
                        "'{}': companion field '{}' must be a text or number field",
                        field.name, custom.field
                    )),
                    None => errors.push(format!(
                        "'{}': companion field '{}' does not exist",
                        field.name, custom.field
                    )),
                }
            }
        }

        // Record keys must not collide once groups are collapsed
        for (i, field) in self.fields.iter().enumerate() {
            let key = field.record_key();
            if self.fields[..i].iter().any(|f| f.record_key() == key) {
                errors.push(format!("record key '{key}' is produced by more than one field"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
