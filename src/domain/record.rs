//! Field-level view of node payloads.
//!
//! Export operations and the list builder never look inside a payload
//! directly. They go through [`Record`], which exposes the payload as a flat
//! JSON object. Any `Serialize` type gets it for free; payloads that do not
//! serialize to an object expose no fields.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// A JSON object holding (a projection of) a payload.
pub type Fields = Map<String, Value>;

pub trait Record {
    /// Shallow copy of all top-level fields.
    fn fields(&self) -> Fields;

    fn field(&self, key: &str) -> Option<Value> {
        self.fields().remove(key)
    }

    /// Fields restricted to `keys`. Keys the payload does not have are left
    /// out of the result. `None` returns every field.
    fn project(&self, keys: Option<&[&str]>) -> Fields {
        let mut fields = self.fields();
        match keys {
            None => fields,
            Some(keys) => keys
                .iter()
                .filter_map(|key| fields.remove(*key).map(|value| (key.to_string(), value)))
                .collect(),
        }
    }
}

impl<T: Serialize + ?Sized> Record for T {
    fn fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Fields::new(),
            Err(e) => {
                warn!("payload is not representable as JSON: {}", e);
                Fields::new()
            }
        }
    }
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
