//! Factor catalog and rule defaults, injected through configuration.
//!
//! The condition model treats factor keys as opaque strings. The catalog only
//! supplies the key a freshly added rule starts with, plus display labels
//! for whoever renders the tree.

use crate::domain::condition::{Operator, ValueType};
use crate::domain::error::ConditionError;
use crate::ports::config_port::ConfigPort;

const REFERENCE_FACTORS: [(&str, &str); 14] = [
    ("SIGNAL.DIRECTION", "Signal direction"),
    ("SIGNAL.INTENT_ID", "Signal intent"),
    ("IND.RSI_14", "RSI (14)"),
    ("IND.MACD", "MACD"),
    ("IND.MACD.SIGNAL", "MACD signal"),
    ("BAR.OPEN", "Bar open"),
    ("BAR.HIGH", "Bar high"),
    ("BAR.LOW", "Bar low"),
    ("BAR.CLOSE", "Bar close"),
    ("BAR.VOLUME", "Bar volume"),
    ("PRICE.LAST", "Last price"),
    ("STATE.POSITION_SIDE", "Position side"),
    ("STATE.POSITION_QTY", "Position quantity"),
    ("STATE.STOP_LOSS_PRICE", "Stop-loss price"),
];

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorEntry {
    pub key: String,
    pub label: String,
}

/// Ordered, non-empty set of factor keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorCatalog {
    entries: Vec<FactorEntry>,
}

impl FactorCatalog {
    pub fn new(entries: Vec<FactorEntry>) -> Result<Self, ConditionError> {
        if entries.is_empty() {
            return Err(ConditionError::config_invalid(
                "catalog",
                "factors",
                "factor list must not be empty",
            ));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.key.trim().is_empty() {
                return Err(ConditionError::config_invalid(
                    "catalog",
                    "factors",
                    "factor keys must not be blank",
                ));
            }
            if entries[..i].iter().any(|e| e.key == entry.key) {
                return Err(ConditionError::config_invalid(
                    "catalog",
                    "factors",
                    format!("duplicate factor '{}'", entry.key),
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Signal, indicator, bar, price and position-state factors.
    pub fn reference() -> Self {
        Self {
            entries: REFERENCE_FACTORS
                .iter()
                .map(|(key, label)| FactorEntry {
                    key: key.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    /// The factor a new rule starts with: the first catalog entry.
    pub fn default_factor(&self) -> &str {
        &self.entries[0].key
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.label.as_str())
    }

    pub fn entries(&self) -> &[FactorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FactorCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

/// Field values for a rule added without caller-supplied content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDefaults {
    pub operator: Operator,
    pub value_type: ValueType,
    pub nullable: bool,
}

impl Default for RuleDefaults {
    fn default() -> Self {
        Self {
            operator: Operator::Lt,
            value_type: ValueType::Number,
            nullable: false,
        }
    }
}

/// Read `[catalog] factors` (comma separated, ordered) and optional
/// `[labels]`. Falls back to the reference catalog when no list is configured.
pub fn load_catalog(config: &dyn ConfigPort) -> Result<FactorCatalog, ConditionError> {
    let Some(list) = config.get_string("catalog", "factors") else {
        return Ok(FactorCatalog::reference());
    };
    let entries = list
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| FactorEntry {
            key: key.to_string(),
            label: config
                .get_string("labels", key)
                .unwrap_or_else(|| key.to_string()),
        })
        .collect();
    FactorCatalog::new(entries)
}

pub fn load_rule_defaults(config: &dyn ConfigPort) -> Result<RuleDefaults, ConditionError> {
    let defaults = RuleDefaults::default();
    let operator = match config.get_string("builder", "default_operator") {
        Some(s) => s.parse::<Operator>().map_err(|e| {
            ConditionError::config_invalid("builder", "default_operator", e.to_string())
        })?,
        None => defaults.operator,
    };
    let value_type = match config.get_string("builder", "default_type") {
        Some(s) => s.parse::<ValueType>().map_err(|e| {
            ConditionError::config_invalid("builder", "default_type", e.to_string())
        })?,
        None => defaults.value_type,
    };
    let nullable = config.get_bool("builder", "default_nullable", defaults.nullable);
    Ok(RuleDefaults {
        operator,
        value_type,
        nullable,
    })
}

/// `[session] history_limit`, a whole number of at least 1. Absent means
/// [`DEFAULT_HISTORY_LIMIT`].
pub fn load_history_limit(config: &dyn ConfigPort) -> Result<usize, ConditionError> {
    let Some(raw) = config.get_string("session", "history_limit") else {
        return Ok(DEFAULT_HISTORY_LIMIT);
    };
    let value: i64 = raw.trim().parse().map_err(|_| {
        ConditionError::config_invalid(
            "session",
            "history_limit",
            format!("'{}' is not a whole number", raw.trim()),
        )
    })?;
    if value < 1 {
        return Err(ConditionError::config_invalid(
            "session",
            "history_limit",
            "history_limit must be at least 1",
        ));
    }
    usize::try_from(value).map_err(|_| {
        ConditionError::config_invalid("session", "history_limit", "history_limit is too large")
    })
}
