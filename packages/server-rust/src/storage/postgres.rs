//! `PostgreSQL`/PostGIS store built on a `sqlx` connection pool.
//!
//! Rows are returned as JSON objects via `to_jsonb`, so decoding does not
//! depend on column order. Every call runs under a fixed 900 second command
//! timeout.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use asset_features_core::{Row, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::{debug, info, info_span, Instrument};

use crate::features::{FeatureQuery, SqlParam};
use crate::traits::{FeatureSource, ProcArg, ProcedureStore, TableCatalog};

/// Applied to every store call.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(900);

/// Connection settings for [`PgStore::connect`].
#[derive(Debug, Clone)]
pub struct PgStoreOptions {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PgStoreOptions {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Store backed by a shared `PgPool`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens the pool and verifies one connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error when the database cannot be reached.
    pub async fn connect(options: &PgStoreOptions) -> Result<Self, sqlx::Error> {
        info!(
            max_connections = options.max_connections,
            "connecting to PostgreSQL"
        );
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(&options.database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Closes the pool; later calls fail with [`StoreError::NoConnection`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn pool(&self) -> Result<&PgPool, StoreError> {
        if self.pool.is_closed() {
            Err(StoreError::NoConnection)
        } else {
            Ok(&self.pool)
        }
    }
}

/// Runs one store call with the command timeout, tracing and error mapping.
async fn timed<T>(
    operation: &str,
    call: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, StoreError> {
    let started = Instant::now();
    let span = info_span!("store_call", operation);
    let outcome = tokio::time::timeout(COMMAND_TIMEOUT, call)
        .instrument(span)
        .await;
    debug!(
        operation,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "store call finished"
    );

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(map_sqlx_error(operation, e)),
        Err(_) => Err(StoreError::query(
            operation,
            format!("command timed out after {}s", COMMAND_TIMEOUT.as_secs()),
        )),
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => StoreError::NoConnection,
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
            StoreError::decode(operation, e)
        }
        other => StoreError::query(operation, other),
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl ProcedureStore for PgStore {
    async fn call(
        &self,
        schema: &str,
        function: &str,
        args: &[ProcArg],
    ) -> Result<Vec<Row>, StoreError> {
        let pool = self.pool()?;
        // Schema and function come from trusted configuration.
        let sql = format!(
            "SELECT to_jsonb(r) FROM {schema}.{function}({}) AS r",
            placeholders(args.len())
        );

        let mut query = sqlx::query_scalar::<_, Json<Row>>(&sql);
        for arg in args {
            query = match arg {
                ProcArg::Uuid(id) => query.bind(*id),
            };
        }

        let rows = timed(function, query.fetch_all(pool)).await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }
}

#[async_trait]
impl TableCatalog for PgStore {
    async fn count_tables(&self, schema: &str, name: &str) -> Result<i64, StoreError> {
        let pool = self.pool()?;
        let query = sqlx::query_scalar::<_, i64>(
            "SELECT count(1) FROM information_schema.tables \
             WHERE table_name = $1 AND table_schema = $2",
        )
        .bind(name)
        .bind(schema);
        timed("count_tables", query.fetch_one(pool)).await
    }

    async fn geometry_tables(&self, schema: &str) -> Result<Vec<String>, StoreError> {
        let pool = self.pool()?;
        let query = sqlx::query_scalar::<_, String>(
            "SELECT f_table_name::text FROM public.geometry_columns \
             WHERE f_table_schema = $1 ORDER BY 1",
        )
        .bind(schema);
        timed("geometry_tables", query.fetch_all(pool)).await
    }

    async fn column_types(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        let pool = self.pool()?;
        let query = sqlx::query_as::<_, (String, String)>(
            "SELECT column_name::text, data_type::text FROM information_schema.columns \
             WHERE table_name = $1 AND table_schema = $2",
        )
        .bind(table)
        .bind(schema);
        let rows = timed("column_types", query.fetch_all(pool)).await?;
        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl FeatureSource for PgStore {
    async fn fetch(&self, query: &FeatureQuery) -> Result<Vec<Row>, StoreError> {
        let pool = self.pool()?;
        let (inner, params) = query.to_sql();
        let sql = format!("SELECT to_jsonb(q) FROM ({inner}) AS q");

        let mut statement = sqlx::query_scalar::<_, Json<Row>>(&sql);
        for param in params {
            statement = match param {
                SqlParam::Text(text) => statement.bind(text),
                SqlParam::Float(value) => statement.bind(value),
            };
        }

        let rows = timed(&query.table, statement.fetch_all(pool)).await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }
}
