//! Store implementations and the configuration they resolve calls through.
//!
//! - [`MemoryStore`]: `DashMap`-backed store for tests and local runs
//! - [`PgStore`]: `PostgreSQL`/PostGIS via `sqlx` (feature `postgres`)
//! - [`FunctionMap`]: logical key to stored-function name resolution
//! - [`TableInformation`]: geometry table listing with an advisory cache

pub mod functions;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod table_cache;

pub use functions::FunctionMap;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PgStoreOptions, COMMAND_TIMEOUT};
pub use table_cache::{TableInformation, TableNameCache};
