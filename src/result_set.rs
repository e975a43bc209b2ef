//! ResultSet - records returned by a persistence operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration accepted by `ResultSet::from_config` (and by deserialization).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultSetConfig {
    /// A single record, an array of records, or nothing.
    pub records: Option<Value>,
    pub total_count: Option<u64>,
    pub message: Option<String>,
}

/// Zero or more result records plus pagination metadata and a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ResultSetConfig")]
pub struct ResultSet {
    records: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<u64>,
    message: String,
}

impl ResultSet {
    /// Build from a single record or an array of records. `Value::Null` yields
    /// an empty set.
    pub fn new(records: impl Into<Value>) -> Self {
        ResultSet {
            records: normalize_records(Some(records.into())),
            total_count: None,
            message: String::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_config(config: ResultSetConfig) -> Self {
        ResultSet {
            records: normalize_records(config.records),
            total_count: config.total_count,
            message: config.message.unwrap_or_default(),
        }
    }

    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Value> {
        self.records
    }

    /// Total number of records available server-side, for paged reads.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<ResultSetConfig> for ResultSet {
    fn from(config: ResultSetConfig) -> Self {
        ResultSet::from_config(config)
    }
}

fn normalize_records(records: Option<Value>) -> Vec<Value> {
    match records {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(records)) => records,
        Some(record) => vec![record],
    }
}
