//! Catalog allow-listing of table identifiers before they reach SQL text.

use std::sync::Arc;

use asset_features_core::StoreError;
use tracing::warn;

use crate::traits::TableCatalog;

/// Confirms that a candidate table exists before it is interpolated into a
/// query. Both inputs are treated as untrusted.
#[derive(Clone)]
pub struct TableIdentifierValidator {
    catalog: Arc<dyn TableCatalog>,
}

impl TableIdentifierValidator {
    #[must_use]
    pub fn new(catalog: Arc<dyn TableCatalog>) -> Self {
        Self { catalog }
    }

    /// Returns `true` iff exactly one table named `candidate` (case-sensitive)
    /// exists in `schema`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoConnection`] when the catalog cannot be reached at
    /// all, which is distinct from a `false` answer. Other catalog failures are
    /// passed through.
    pub async fn exists(&self, schema: &str, candidate: &str) -> Result<bool, StoreError> {
        if schema.is_empty() || candidate.is_empty() {
            return Ok(false);
        }
        let count = self.catalog.count_tables(schema, candidate).await?;
        Ok(count == 1)
    }

    /// Like [`exists`](Self::exists) but turns a miss into
    /// [`StoreError::InvalidIdentifier`] carrying the rejected value.
    ///
    /// # Errors
    ///
    /// See [`exists`](Self::exists); additionally `InvalidIdentifier`.
    pub async fn ensure(&self, schema: &str, candidate: &str) -> Result<(), StoreError> {
        if self.exists(schema, candidate).await? {
            Ok(())
        } else {
            warn!(schema, candidate, "rejected unknown table identifier");
            Err(StoreError::InvalidIdentifier {
                value: candidate.to_string(),
            })
        }
    }
}
