//! Domain error types.

/// Every failure the condition model can report.
///
/// All variants are recoverable: an operation that returns one of these has
/// not modified any tree the caller holds.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("path {path:?} does not resolve to a group")]
    PathNotFound { path: Vec<usize> },

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid mode '{value}', expected ALL or ANY")]
    InvalidMode { value: String },

    #[error("invalid operator '{value}'")]
    InvalidOperator { value: String },

    #[error("invalid value type '{value}', expected NUMBER, STRING or BOOLEAN")]
    InvalidValueType { value: String },

    #[error("invalid rule field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("malformed condition document: {reason}")]
    MalformedDocument { reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConditionError {
    pub(crate) fn path_not_found(path: &[usize]) -> Self {
        ConditionError::PathNotFound {
            path: path.to_vec(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ConditionError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ConditionError {
    fn from(err: serde_json::Error) -> Self {
        ConditionError::MalformedDocument {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_not_found_message() {
        let err = ConditionError::path_not_found(&[0, 2]);
        assert_eq!(err.to_string(), "path [0, 2] does not resolve to a group");
    }

    #[test]
    fn index_out_of_range_message() {
        let err = ConditionError::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(err.to_string(), "index 5 out of range (len 2)");
    }

    #[test]
    fn json_error_maps_to_malformed_document() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConditionError = json_err.into();
        assert!(matches!(err, ConditionError::MalformedDocument { .. }));
    }

    #[test]
    fn config_invalid_message() {
        let err = ConditionError::config_invalid("catalog", "factors", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid config value [catalog] factors: must not be empty"
        );
    }
}
