//! Caller-supplied run parameters

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque mapping of caller inputs (topic, budget, patient profile, ...).
///
/// Read-only once a deliberation starts: [`DeliberationState`](crate::DeliberationState)
/// only hands out shared references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String view of a parameter.
    ///
    /// Numbers and booleans are rendered; objects, arrays and missing keys
    /// yield an empty string.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).and_then(scalar_text).unwrap_or_default()
    }

    /// Look up a scalar field nested inside an object parameter.
    ///
    /// Rendered the same way as [`text`](Self::text); `None` when the field
    /// is missing, null or not a scalar.
    pub fn nested_text(&self, key: &str, field: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(|v| v.get(field))
            .and_then(scalar_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
