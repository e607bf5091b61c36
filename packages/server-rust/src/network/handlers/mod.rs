//! HTTP handler definitions.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for building the router.

pub mod capabilities;
pub mod features;
pub mod health;
pub mod map_config;

pub use capabilities::{
    collection_handler, collections_handler, conformance_handler, landing_handler,
    queryables_handler,
};
pub use features::{feature_handler, items_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use map_config::{configuration_handler, configurations_handler};

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::{NetworkConfig, ShutdownController};
use crate::features::SpatialFeatureQueryEngine;
use crate::service::MapConfigurationAssembler;
use crate::storage::TableInformation;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Every field is an `Arc` or a cheaply cloneable handle.
#[derive(Clone)]
pub struct AppState {
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
    pub engine: SpatialFeatureQueryEngine,
    pub assembler: MapConfigurationAssembler,
    /// Advisory listing of the feature tables that exist.
    pub tables: TableInformation,
}

/// Parses a path segment as a UUID, naming the segment on failure.
pub(crate) fn parse_id(name: &str, value: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        ApiError::bad_request("Invalid Identifier", format!("{name} {value:?} is not a UUID"))
    })
}
