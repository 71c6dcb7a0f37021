//! Canonical JSON form of a condition tree.
//!
//! Keys are written in declaration order: `version, mode, rules, groups` at the
//! root, `mode, rules, groups` in nested groups and
//! `factor, operator, value, type, nullable` in rules. Reading is lenient:
//! omitted or `null` fields take their defaults, scalar rule values are
//! accepted as text and unknown keys are ignored.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::condition::{ConditionTree, default_version};
use crate::domain::error::ConditionError;

/// Pretty-printed canonical document.
pub fn encode(tree: &ConditionTree) -> Result<String, ConditionError> {
    Ok(serde_json::to_string_pretty(tree)?)
}

/// Single-line canonical document, same key order as [`encode`].
pub fn encode_compact(tree: &ConditionTree) -> Result<String, ConditionError> {
    Ok(serde_json::to_string(tree)?)
}

/// Parse a stored document. Nesting depth is unbounded; deep documents grow
/// the stack on demand instead of hitting the parser's recursion limit.
pub fn decode(text: &str) -> Result<ConditionTree, ConditionError> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    if !value.is_object() {
        return Err(ConditionError::MalformedDocument {
            reason: format!("expected a JSON object at the top level, found {}", kind(&value)),
        });
    }
    Ok(ConditionTree::deserialize(serde_stacker::Deserializer::new(value))?)
}

/// Decode a stored document, starting from the default tree when there is
/// nothing stored.
pub fn decode_or_default(text: Option<&str>) -> Result<ConditionTree, ConditionError> {
    match text {
        Some(t) if !t.trim().is_empty() => decode(t),
        _ => {
            tracing::warn!("no stored condition document, starting from default");
            Ok(ConditionTree::default())
        }
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn version_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_version))
}

pub(crate) fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "rule value must be a scalar, found {}",
            kind(&other)
        ))),
    }
}
