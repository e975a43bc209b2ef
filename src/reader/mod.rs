//! Readers turn transport payloads into `ResultSet`s.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::result_set::{ResultSet, ResultSetConfig};

/// Error type for payload reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    /// The raw payload is not valid JSON.
    Parse(String),
    /// A configured property is missing from the payload.
    MissingProperty(String),
    /// A property exists but has the wrong shape.
    InvalidProperty { property: String, expected: &'static str },
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Parse(msg) => write!(f, "payload parse error: {}", msg),
            ReaderError::MissingProperty(property) => {
                write!(f, "payload has no property '{}'", property)
            }
            ReaderError::InvalidProperty { property, expected } => {
                write!(f, "payload property '{}' is not {}", property, expected)
            }
        }
    }
}

impl std::error::Error for ReaderError {}

/// Reads a decoded payload into a `ResultSet`.
pub trait Reader: Send + Sync {
    fn read(&self, data: &Value) -> Result<ResultSet, ReaderError>;

    /// Parse a raw JSON payload, then `read` it.
    fn read_raw(&self, raw: &str) -> Result<ResultSet, ReaderError> {
        let data: Value = serde_json::from_str(raw).map_err(|e| ReaderError::Parse(e.to_string()))?;
        self.read(&data)
    }
}

/// Reader for JSON payloads.
///
/// Without a `data_property` the whole payload is the record data. With one,
/// the payload must be an object: records come from `data_property`, and the
/// total count and message from `total_property` / `message_property` when
/// present. Property names may be dotted paths (`"response.items"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonReader {
    pub data_property: Option<String>,
    pub total_property: String,
    pub message_property: String,
}

impl Default for JsonReader {
    fn default() -> Self {
        JsonReader {
            data_property: None,
            total_property: "total".to_string(),
            message_property: "message".to_string(),
        }
    }
}

impl JsonReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_property(mut self, property: impl Into<String>) -> Self {
        self.data_property = Some(property.into());
        self
    }

    pub fn total_property(mut self, property: impl Into<String>) -> Self {
        self.total_property = property.into();
        self
    }

    pub fn message_property(mut self, property: impl Into<String>) -> Self {
        self.message_property = property.into();
        self
    }

    fn total_count(&self, root: &Value) -> Result<Option<u64>, ReaderError> {
        let invalid = || ReaderError::InvalidProperty {
            property: self.total_property.clone(),
            expected: "a non-negative integer",
        };
        match find_property(root, &self.total_property) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    fn message(&self, root: &Value) -> Result<Option<String>, ReaderError> {
        match find_property(root, &self.message_property) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ReaderError::InvalidProperty {
                property: self.message_property.clone(),
                expected: "a string",
            }),
        }
    }
}

impl Reader for JsonReader {
    fn read(&self, data: &Value) -> Result<ResultSet, ReaderError> {
        let Some(data_property) = &self.data_property else {
            return Ok(ResultSet::new(data.clone()));
        };

        if !data.is_object() {
            return Err(ReaderError::InvalidProperty {
                property: "<root>".to_string(),
                expected: "an object",
            });
        }
        let records = find_property(data, data_property)
            .ok_or_else(|| ReaderError::MissingProperty(data_property.clone()))?;

        Ok(ResultSet::from_config(ResultSetConfig {
            records: Some(records.clone()),
            total_count: self.total_count(data)?,
            message: self.message(data)?,
        }))
    }
}

/// Walk a dotted property path.
fn find_property<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |value, key| value.as_object()?.get(key))
}
