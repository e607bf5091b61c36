//! Asset features server: PostGIS feature queries by bounding box and map
//! configuration assembly behind an OGC API Features style HTTP surface.

pub mod config;
pub mod features;
pub mod network;
pub mod repository;
pub mod service;
pub mod storage;
pub mod traits;

pub use features::{FeatureConfig, SpatialFeatureQueryEngine};
pub use repository::ProcedureCaller;
pub use service::MapConfigurationAssembler;
pub use storage::{MemoryStore, TableInformation};
pub use traits::{FeatureSource, ProcArg, ProcedureStore, TableCatalog};
