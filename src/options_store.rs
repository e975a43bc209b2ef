//! OptionsStore - canonical `{text, value}` records for pick lists.
//!
//! Accepts the loose shapes option lists tend to arrive in:
//!
//! - scalars: `"red"` or `3` become `{text: "red", value: "red"}` / `{text: "3", value: 3}`
//! - `{text, value}` objects, with `value` defaulting to `text`
//! - `{value}` objects, with `text` taken from the string form of `value`

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// The entry at `index` could not be normalized.
    InvalidOption { index: usize, reason: String },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::InvalidOption { index, reason } => {
                write!(f, "invalid option at index {}: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for OptionsError {}

/// One normalized option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub text: String,
    pub value: Value,
}

impl OptionRecord {
    pub fn new(text: impl Into<String>, value: impl Into<Value>) -> Self {
        OptionRecord {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// An ordered list of normalized options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionsStore {
    records: Vec<OptionRecord>,
}

impl OptionsStore {
    pub fn new(options: Vec<Value>) -> Result<Self, OptionsError> {
        let records = options
            .into_iter()
            .enumerate()
            .map(|(index, option)| normalize(index, option))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OptionsStore { records })
    }

    pub fn from_records(records: Vec<OptionRecord>) -> Self {
        OptionsStore { records }
    }

    pub fn options(&self) -> &[OptionRecord] {
        &self.records
    }

    /// First option whose value equals `value`.
    pub fn find_by_value(&self, value: &Value) -> Option<&OptionRecord> {
        self.records.iter().find(|r| &r.value == value)
    }

    pub fn find_by_text(&self, text: &str) -> Option<&OptionRecord> {
        self.records.iter().find(|r| r.text == text)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionRecord> {
        self.records.iter()
    }
}

impl<'de> Deserialize<'de> for OptionsStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let options = Vec::<Value>::deserialize(deserializer)?;
        OptionsStore::new(options).map_err(serde::de::Error::custom)
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize(index: usize, option: Value) -> Result<OptionRecord, OptionsError> {
    let invalid = |reason: &str| OptionsError::InvalidOption {
        index,
        reason: reason.to_string(),
    };

    match option {
        Value::Object(mut map) => match map.remove("text") {
            Some(text) => {
                let text = text_of(&text).ok_or_else(|| invalid("'text' must be a scalar"))?;
                let value = match map.remove("value") {
                    None | Some(Value::Null) => Value::String(text.clone()),
                    Some(value) => value,
                };
                Ok(OptionRecord { text, value })
            }
            None => {
                let value = map
                    .remove("value")
                    .ok_or_else(|| invalid("object has neither 'text' nor 'value'"))?;
                let text = text_of(&value).ok_or_else(|| invalid("'value' must be a scalar"))?;
                Ok(OptionRecord { text, value })
            }
        },
        Value::Null | Value::Array(_) => Err(invalid("expected a scalar or an object")),
        scalar => {
            let text = text_of(&scalar).ok_or_else(|| invalid("expected a scalar"))?;
            Ok(OptionRecord {
                text,
                value: scalar,
            })
        }
    }
}
