//! Advisory cache of geometry table names per schema.
//!
//! The cache never replaces catalog validation; it only lets handlers avoid
//! a catalog round trip when deciding which links to advertise.

use std::collections::HashMap;
use std::sync::Arc;

use asset_features_core::StoreError;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::traits::TableCatalog;

/// Schema name to table names, behind one coarse lock.
///
/// Schema keys are case-insensitive. Readers always receive their own copy.
#[derive(Debug, Default)]
pub struct TableNameCache {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl TableNameCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached tables for `schema`.
    #[must_use]
    pub fn get(&self, schema: &str) -> Option<Vec<String>> {
        self.entries.lock().get(&schema.to_lowercase()).cloned()
    }

    pub fn insert(&self, schema: &str, tables: Vec<String>) {
        self.entries.lock().insert(schema.to_lowercase(), tables);
    }

    /// Replaces the whole cache in one step.
    pub fn replace_all(&self, entries: HashMap<String, Vec<String>>) {
        let normalized = entries
            .into_iter()
            .map(|(schema, tables)| (schema.to_lowercase(), tables))
            .collect();
        *self.entries.lock() = normalized;
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Table listing backed by the catalog and the advisory cache.
#[derive(Clone)]
pub struct TableInformation {
    catalog: Arc<dyn TableCatalog>,
    cache: Arc<TableNameCache>,
}

impl TableInformation {
    #[must_use]
    pub fn new(catalog: Arc<dyn TableCatalog>) -> Self {
        Self {
            catalog,
            cache: Arc::new(TableNameCache::new()),
        }
    }

    #[must_use]
    pub fn cache(&self) -> Arc<TableNameCache> {
        Arc::clone(&self.cache)
    }

    /// Geometry tables of `schema`, from the cache when present.
    ///
    /// An empty schema name yields an empty list.
    ///
    /// # Errors
    ///
    /// Only fatal store faults; transient failures are logged and yield an
    /// empty list without populating the cache.
    pub async fn get_all_tables(&self, schema: &str) -> Result<Vec<String>, StoreError> {
        if schema.is_empty() {
            error!("table listing requested for an empty schema name");
            return Ok(Vec::new());
        }
        if let Some(tables) = self.cache.get(schema) {
            return Ok(tables);
        }

        debug!(schema, "loading geometry tables from catalog");
        match self.catalog.geometry_tables(schema).await {
            Ok(tables) => {
                self.cache.insert(schema, tables.clone());
                Ok(tables)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!(schema, error = %e, "failed to list geometry tables");
                Ok(Vec::new())
            }
        }
    }
}
