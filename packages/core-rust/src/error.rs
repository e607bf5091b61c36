//! Store error taxonomy shared by the query engine, the repositories, and the
//! HTTP layer.

use uuid::Uuid;

/// Errors raised while talking to the backing store.
///
/// Configuration faults (see [`StoreError::is_fatal`]) are never downgraded to
/// an absent result. Everything else may be logged and surfaced as
/// [`crate::Lookup::Unavailable`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// No usable database connection is available.
    #[error("no usable database connection")]
    NoConnection,

    /// A logical stored-procedure key has no configured function name.
    #[error("no function mapping configured for logical key {key:?}")]
    MissingProcedure { key: String },

    /// A map configuration exists but has no map view.
    #[error("map configuration {config_id} has no map view")]
    MissingMapView { config_id: Uuid },

    /// A table identifier failed catalog validation.
    #[error("invalid table identifier: {value:?}")]
    InvalidIdentifier { value: String },

    /// The operation exists in the API but is not implemented yet.
    #[error("{operation} is not supported")]
    Unsupported { operation: &'static str },

    /// A row came back in a shape that could not be decoded.
    #[error("failed to decode result of {operation}: {message}")]
    Decode { operation: String, message: String },

    /// The query itself failed.
    #[error("{operation} failed: {message}")]
    Query { operation: String, message: String },
}

impl StoreError {
    /// Returns `true` for configuration faults that must propagate unchanged.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoConnection | Self::MissingProcedure { .. } | Self::MissingMapView { .. }
        )
    }

    /// Returns `true` when the error may be logged and downgraded to an
    /// unavailable result.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Query { .. })
    }

    /// Shorthand for a [`StoreError::Query`] tagged with the failing operation.
    pub fn query(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Shorthand for a [`StoreError::Decode`] tagged with the failing operation.
    pub fn decode(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}
