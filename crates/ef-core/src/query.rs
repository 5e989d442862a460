//! # Query Document
//!
//! The EQL search body sent with every submission. Its contents are never
//! interpreted here beyond requiring a top-level mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::literal;

/// An immutable, already-parsed search body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryDocument(Value);

impl QueryDocument {
    /// Parse the text of a query file.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        Self::from_value(literal::parse(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(_) => Ok(Self(value)),
            Value::Null => Err(CoreError::QueryNotMapping("null")),
            Value::Bool(_) => Err(CoreError::QueryNotMapping("a boolean")),
            Value::Number(_) => Err(CoreError::QueryNotMapping("a number")),
            Value::String(_) => Err(CoreError::QueryNotMapping("a string")),
            Value::Array(_) => Err(CoreError::QueryNotMapping("a sequence")),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
