//! Parsed tool-call arguments with typed accessors.

use serde_json::Value;

use crate::error::{Result, TychoError};

/// Arguments delivered to a tool invocation, decoded from the model's
/// raw JSON payload into an object map.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: serde_json::Map<String, Value>,
}

impl ToolArguments {
    /// Wrap an already-decoded object map.
    pub fn new(values: serde_json::Map<String, Value>) -> Self {
        Self { values }
    }

    /// Decode the raw argument payload sent by the model.
    ///
    /// A blank payload decodes to an empty map; anything that is not a
    /// JSON object is rejected.
    pub fn from_raw(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(TychoError::InvalidArgument(format!(
                "tool arguments must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Raw value lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Required string argument.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(TychoError::InvalidArgument(format!(
                "argument '{name}' must be a string"
            ))),
            None => Err(TychoError::InvalidArgument(format!(
                "missing required argument '{name}'"
            ))),
        }
    }

    /// Optional string argument.
    pub fn get_str_opt(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Optional numeric argument.
    pub fn get_f64_opt(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    /// Optional boolean argument.
    pub fn get_bool_opt(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
