//! Scalar value encoding.

use serde_json::Value;

/// Converts a scalar value into its XML text representation.
pub trait XmlEncoder {
    fn encode(&self, value: &Value) -> String;
}

/// Encoder used when no custom encoder is installed.
///
/// Strings are written verbatim, booleans as `true`/`false`, numbers in
/// their JSON form and `null` as the empty string. Arrays and objects are
/// not scalars and fall back to compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEncoder;

impl XmlEncoder for DefaultEncoder {
    fn encode(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::Bool(b) => bool_to_string(*b).to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Converts a Rust boolean to its string representation for XML.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}
