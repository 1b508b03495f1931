//! Raw form entries and canonical field values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A persisted field value: plain text or a list of selected values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Text content, or `None` for list values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// List items; a text value is treated as a single item
    pub fn items(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// Flat field name -> value map, the shape of one step's draft.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Entries collected from a submitted form, in submission order.
///
/// Mirrors form-data semantics: a checkbox group contributes one entry per
/// checked box, all under the group's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawForm {
    entries: Vec<(String, String)>,
}

impl RawForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append, handy for tests and headless callers
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.append(name, value);
        self
    }

    pub fn append(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// Replace every entry for `name` with a single value
    pub fn set(&mut self, name: &str, value: &str) {
        self.remove(name);
        self.append(name, value);
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    /// First value submitted under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `name`
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Live phone-number formatting: keep digits only and group them with dashes.
///
/// A dash goes in front of every digit whose index is a multiple of four
/// (index > 2), so `012345678901` becomes `0123-4567-8901`.
pub fn format_phone_number(input: &str) -> String {
    let mut formatted = String::with_capacity(input.len() + input.len() / 4);
    for (i, digit) in input.chars().filter(char::is_ascii_digit).enumerate() {
        if i > 2 && i % 4 == 0 {
            formatted.push('-');
        }
        formatted.push(digit);
    }
    formatted
}

/// Title-case each word the way checked values are stored ("light blue" -> "Light Blue").
pub fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
