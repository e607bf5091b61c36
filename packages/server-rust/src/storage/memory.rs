//! In-memory store backed by [`DashMap`].
//!
//! Implements every store trait without a database. Stored-function results
//! are registered per function name and argument list; feature tables are
//! evaluated structurally. The bbox filter uses envelope overlap like PostGIS
//! `&&`, but geometries are returned unclipped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use asset_features_core::{Geometry, Row, StoreError, GEOMETRY_JSON_COLUMN};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::features::{FeatureFilter, FeatureQuery};
use crate::traits::{FeatureSource, ProcArg, ProcedureStore, TableCatalog};

struct MemoryTable {
    /// Column name to data type, in declaration order.
    columns: Vec<(String, String)>,
    rows: Vec<(Row, Option<Geometry>)>,
}

/// Store for tests and local runs.
pub struct MemoryStore {
    connected: AtomicBool,
    results: DashMap<(String, Vec<ProcArg>), Vec<Row>>,
    failing_functions: DashMap<String, String>,
    tables: DashMap<(String, String), MemoryTable>,
    feature_failure: RwLock<Option<String>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            results: DashMap::new(),
            failing_functions: DashMap::new(),
            tables: DashMap::new(),
            feature_failure: RwLock::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent call fail with [`StoreError::NoConnection`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    /// Registers the rows `function(args...)` returns. Unregistered calls
    /// return no rows.
    pub fn set_rows(&self, function: &str, args: &[ProcArg], rows: Vec<Row>) {
        self.results
            .insert((function.to_string(), args.to_vec()), rows);
    }

    /// Makes every call of `function` fail with a query error.
    pub fn fail_function(&self, function: &str, message: &str) {
        self.failing_functions
            .insert(function.to_string(), message.to_string());
    }

    /// Makes every feature query fail with a query error.
    pub fn fail_feature_queries(&self, message: &str) {
        *self.feature_failure.write() = Some(message.to_string());
    }

    /// Declares a geometry-bearing table.
    pub fn create_table(&self, schema: &str, table: &str, columns: &[(&str, &str)]) {
        self.tables.insert(
            (schema.to_string(), table.to_string()),
            MemoryTable {
                columns: columns
                    .iter()
                    .map(|(n, t)| ((*n).to_string(), (*t).to_string()))
                    .collect(),
                rows: Vec::new(),
            },
        );
    }

    /// Appends a feature row to a table declared with [`create_table`](Self::create_table).
    /// Rows for unknown tables are ignored.
    pub fn insert_feature(
        &self,
        schema: &str,
        table: &str,
        attributes: Row,
        geometry: Option<Geometry>,
    ) {
        if let Some(mut t) = self.tables.get_mut(&(schema.to_string(), table.to_string())) {
            t.rows.push((attributes, geometry));
        }
    }

    /// Number of feature queries executed so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn check_connected(&self) -> Result<(), StoreError> {
        if self.connected.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::NoConnection)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Text form of a cell, as `column::text` would render it.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl ProcedureStore for MemoryStore {
    async fn call(
        &self,
        _schema: &str,
        function: &str,
        args: &[ProcArg],
    ) -> Result<Vec<Row>, StoreError> {
        self.check_connected()?;
        if let Some(message) = self.failing_functions.get(function) {
            return Err(StoreError::query(function, message.value()));
        }
        Ok(self
            .results
            .get(&(function.to_string(), args.to_vec()))
            .map(|rows| rows.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TableCatalog for MemoryStore {
    async fn count_tables(&self, schema: &str, name: &str) -> Result<i64, StoreError> {
        self.check_connected()?;
        let found = self
            .tables
            .contains_key(&(schema.to_string(), name.to_string()));
        Ok(i64::from(found))
    }

    async fn geometry_tables(&self, schema: &str) -> Result<Vec<String>, StoreError> {
        self.check_connected()?;
        let mut names: Vec<String> = self
            .tables
            .iter()
            .filter(|entry| entry.key().0 == schema)
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn column_types(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        self.check_connected()?;
        Ok(self
            .tables
            .get(&(schema.to_string(), table.to_string()))
            .map(|t| t.columns.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl FeatureSource for MemoryStore {
    async fn fetch(&self, query: &FeatureQuery) -> Result<Vec<Row>, StoreError> {
        self.check_connected()?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let operation = format!("{}.{}", query.schema, query.table);

        if let Some(message) = self.feature_failure.read().clone() {
            return Err(StoreError::query(operation, message));
        }

        let table = self
            .tables
            .get(&(query.schema.clone(), query.table.clone()))
            .ok_or_else(|| StoreError::query(&operation, "relation does not exist"))?;

        for column in &query.columns {
            if !table.columns.iter().any(|(name, _)| name == column) {
                return Err(StoreError::query(
                    &operation,
                    format!("column {column:?} does not exist"),
                ));
            }
        }

        let mut out = Vec::new();
        for (attributes, geometry) in &table.rows {
            let keep = match &query.filter {
                FeatureFilter::ById { column, value } => {
                    attributes.get(column).and_then(cell_text).as_deref() == Some(value.as_str())
                }
                FeatureFilter::Within { bbox, extra } => {
                    if extra.is_some() {
                        return Err(StoreError::query(
                            &operation,
                            "extra SQL filters are not evaluated in memory",
                        ));
                    }
                    geometry
                        .as_ref()
                        .and_then(Geometry::envelope)
                        .is_some_and(|envelope| envelope.intersects(bbox))
                }
            };
            if !keep {
                continue;
            }

            let mut row = Row::new();
            for column in &query.columns {
                row.insert(
                    column.clone(),
                    attributes.get(column).cloned().unwrap_or(Value::Null),
                );
            }
            let encoded = geometry
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| StoreError::decode(&operation, e))?
                .map_or(Value::Null, Value::String);
            row.insert(GEOMETRY_JSON_COLUMN.to_string(), encoded);
            out.push(row);
        }
        Ok(out)
    }
}
