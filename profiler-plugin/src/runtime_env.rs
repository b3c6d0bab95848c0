use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Per-job runtime environment request, keyed by plugin name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeEnvSpec {
    fields: Map<String, Value>,
}

impl RuntimeEnvSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the entry for `key` unless it is absent or empty-ish (`null`,
    /// `false`, `0`, `""`, `[]`, `{}`), which all mean "plugin not requested".
    pub fn requested(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|value| is_set(value))
    }
}

impl From<Map<String, Value>> for RuntimeEnvSpec {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// The part of a worker launch that plugins are allowed to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeEnvContext {
    /// Command used to start the worker interpreter, e.g. `python` or
    /// `nsys profile -o ... python`.
    pub py_executable: String,
}

impl RuntimeEnvContext {
    pub fn new(py_executable: impl Into<String>) -> Self {
        Self {
            py_executable: py_executable.into(),
        }
    }
}
