//! Errors raised while turning an item document into a registry item.

use thiserror::Error;

/// A single item document could not be parsed or validated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    #[error("{kind} must be a mapping")]
    NotAMapping { kind: &'static str },

    #[error("{kind} must have a non-empty {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Invalid {field} in {kind}: {reason}")]
    InvalidField {
        kind: &'static str,
        field: String,
        reason: String,
    },

    #[error("Malformed {kind} definition: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

impl ItemError {
    pub(crate) fn invalid(kind: &'static str, field: impl Into<String>, reason: impl Into<String>) -> Self {
        ItemError::InvalidField {
            kind,
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(kind: &'static str, error: serde_json::Error) -> Self {
        ItemError::Malformed {
            kind,
            reason: error.to_string(),
        }
    }
}
