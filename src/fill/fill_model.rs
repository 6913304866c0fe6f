use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::field_model::FieldType;
use crate::dom::DomError;
use crate::error::EngineError;

// ============================================================================
// Value bag
// ============================================================================

/// A value to write: text, a flag, or several choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    /// `true`, `"true"`, `"1"` and `"yes"` (any case) are on; all else is off.
    pub fn as_bool(&self) -> bool {
        fn truthy(s: &str) -> bool {
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => truthy(s),
            FieldValue::List(items) => items.iter().any(|s| truthy(s)),
        }
    }

    /// Requested choices; a single string is split on commas.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::Flag(b) => vec![b.to_string()],
            FieldValue::Text(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            FieldValue::List(items) => items.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Externally supplied mapping from field name to value. Read-only input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueBag(BTreeMap<String, FieldValue>);

impl ValueBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::ValueBag(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for ValueBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Failures and states
// ============================================================================

/// Why a single field was not filled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldFailure {
    #[error("no value provided")]
    ValueMissing,

    #[error("{0}")]
    WriteRejected(String),

    #[error("file inputs cannot be filled")]
    UnsupportedType,

    #[error("element is no longer on the page")]
    ElementGone,
}

impl FieldFailure {
    /// Only write failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FieldFailure::WriteRejected(_) | FieldFailure::ElementGone)
    }
}

impl From<DomError> for FieldFailure {
    fn from(err: DomError) -> Self {
        match err {
            DomError::Detached(_) | DomError::NotAnElement(_) => FieldFailure::ElementGone,
            DomError::Rejected(_) => {
                FieldFailure::WriteRejected("the page refused the value".to_string())
            }
        }
    }
}

/// Per-field fill lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillState {
    Pending,
    Attempting,
    Retrying,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub state: FillState,
    pub attempts: u32,
    pub error: Option<String>,
}

/// Result of one fill batch. `success` is true when at least one field was
/// filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    pub success: bool,
    pub filled: usize,
    pub errors: Vec<String>,
    #[serde(default)]
    pub reports: Vec<FieldReport>,
}

impl FillOutcome {
    pub fn from_reports(reports: Vec<FieldReport>) -> Self {
        let filled = reports
            .iter()
            .filter(|r| r.state == FillState::Done)
            .count();
        let errors = reports.iter().filter_map(|r| r.error.clone()).collect();

        Self {
            success: filled > 0,
            filled,
            errors,
            reports,
        }
    }

    pub fn nothing_to_fill() -> Self {
        Self {
            success: false,
            filled: 0,
            errors: vec!["no fields to fill".to_string()],
            reports: vec![],
        }
    }
}
