use std::collections::BTreeMap;

use async_trait::async_trait;
use asset_features_core::{Row, StoreError};
use uuid::Uuid;

use crate::features::FeatureQuery;

/// Argument passed positionally to a stored function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProcArg {
    Uuid(Uuid),
}

impl From<Uuid> for ProcArg {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

/// Narrow interface to the map configuration stored functions.
/// Implementations: `PostgreSQL`, memory (tests and local runs).
#[async_trait]
pub trait ProcedureStore: Send + Sync {
    /// Calls the set-returning function `schema.function(args...)` and returns
    /// every result row as a column-keyed object.
    async fn call(
        &self,
        schema: &str,
        function: &str,
        args: &[ProcArg],
    ) -> Result<Vec<Row>, StoreError>;
}

/// Read access to the database catalog.
#[async_trait]
pub trait TableCatalog: Send + Sync {
    /// Number of tables named exactly `name` (case-sensitive) in `schema`.
    async fn count_tables(&self, schema: &str, name: &str) -> Result<i64, StoreError>;

    /// Names of the geometry-bearing tables registered in `schema`.
    async fn geometry_tables(&self, schema: &str) -> Result<Vec<String>, StoreError>;

    /// Column name to SQL data type for one table.
    async fn column_types(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<BTreeMap<String, String>, StoreError>;
}

/// Executes feature queries against geometry-bearing tables.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Runs `query` and returns the raw rows, geometry still encoded in
    /// [`asset_features_core::GEOMETRY_JSON_COLUMN`].
    async fn fetch(&self, query: &FeatureQuery) -> Result<Vec<Row>, StoreError>;
}
