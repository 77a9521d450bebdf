//! Node identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a tree node: either numeric or textual.
///
/// `Num(1)` and `Str("1")` are different identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Num(i64),
    Str(String),
}

impl NodeId {
    /// Read an identifier out of a JSON value.
    ///
    /// Integers and strings qualify; floats with a fractional part, booleans,
    /// null, arrays and objects do not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(NodeId::Num),
            Value::String(s) => Some(NodeId::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            NodeId::Num(n) => Value::from(*n),
            NodeId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Num(n) => write!(f, "{}", n),
            NodeId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(n: i64) -> Self {
        NodeId::Num(n)
    }
}

impl From<i32> for NodeId {
    fn from(n: i32) -> Self {
        NodeId::Num(n.into())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::Str(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::Str(s)
    }
}
