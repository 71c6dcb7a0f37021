//! Entry and exit conditions of a strategy, as carried in its parameter
//! payload. The strategy collaborator stores each document as an opaque
//! string under `entryCondition` / `exitCondition`.

use serde_json::{Map, Value};

use crate::domain::codec::{decode_or_default, encode_compact, kind};
use crate::domain::condition::ConditionTree;
use crate::domain::error::ConditionError;

pub const ENTRY_CONDITION_FIELD: &str = "entryCondition";
pub const EXIT_CONDITION_FIELD: &str = "exitCondition";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyConditions {
    pub entry: ConditionTree,
    pub exit: ConditionTree,
}

impl StrategyConditions {
    pub fn to_payload_fields(&self) -> Result<Map<String, Value>, ConditionError> {
        let mut fields = Map::new();
        fields.insert(
            ENTRY_CONDITION_FIELD.to_string(),
            Value::String(encode_compact(&self.entry)?),
        );
        fields.insert(
            EXIT_CONDITION_FIELD.to_string(),
            Value::String(encode_compact(&self.exit)?),
        );
        Ok(fields)
    }

    pub fn from_payload_fields(
        entry: Option<&str>,
        exit: Option<&str>,
    ) -> Result<Self, ConditionError> {
        Ok(Self {
            entry: decode_or_default(entry)?,
            exit: decode_or_default(exit)?,
        })
    }

    /// Read both documents out of a payload object. A missing or `null`
    /// field starts from the default tree; any other non-string value is
    /// rejected rather than dropped.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ConditionError> {
        Self::from_payload_fields(
            document_field(payload, ENTRY_CONDITION_FIELD)?,
            document_field(payload, EXIT_CONDITION_FIELD)?,
        )
    }
}

fn document_field<'a>(
    payload: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, ConditionError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(ConditionError::MalformedDocument {
            reason: format!(
                "`{field}` must hold the condition document as a JSON string, found {}",
                kind(other)
            ),
        }),
    }
}
