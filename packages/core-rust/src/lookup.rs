//! Three-way lookup outcome.

use tracing::error;

use crate::error::StoreError;

/// Result of a read that may legitimately find nothing.
///
/// Keeps "does not exist" apart from "the store could not answer", which a
/// bare `Option` would collapse into the same shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The value was found.
    Found(T),
    /// The store answered and there is nothing to return.
    NotFound,
    /// The store failed to answer; carries the logged error detail.
    Unavailable(String),
}

impl<T> Lookup<T> {
    /// Converts a raw store result into a lookup outcome.
    ///
    /// Fatal configuration faults and invalid identifiers are returned as
    /// `Err`. Transient failures are logged under `operation` and become
    /// [`Lookup::Unavailable`].
    ///
    /// # Errors
    ///
    /// Returns the original error when it is not transient.
    pub fn from_store(
        operation: &str,
        result: Result<Option<T>, StoreError>,
    ) -> Result<Self, StoreError> {
        match result {
            Ok(Some(value)) => Ok(Self::Found(value)),
            Ok(None) => Ok(Self::NotFound),
            Err(e) if e.is_transient() => {
                error!(operation, error = %e, "store call failed");
                Ok(Self::Unavailable(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Drops the distinction between not-found and unavailable.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::Unavailable(detail) => Lookup::Unavailable(detail),
        }
    }
}

impl<T> Lookup<Vec<T>> {
    /// Builds a list outcome where an empty list counts as not found.
    #[must_use]
    pub fn from_list(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::NotFound
        } else {
            Self::Found(items)
        }
    }

    /// Returns the list, or an empty one for not-found and unavailable.
    pub fn unwrap_or_empty(self) -> Vec<T> {
        self.into_option().unwrap_or_default()
    }
}
