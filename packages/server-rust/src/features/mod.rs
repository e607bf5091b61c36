//! Spatial feature retrieval: identifier validation, query rendering and the
//! query engine.

pub mod engine;
pub mod query;
pub mod validator;

pub use engine::SpatialFeatureQueryEngine;
pub use query::{quote_ident, FeatureFilter, FeatureQuery, SqlParam};
pub use validator::TableIdentifierValidator;

/// Where feature tables live and which of their columns carry the geometry
/// and the feature id.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Schema holding one table per layer.
    pub schema: String,
    pub geometry_column: String,
    pub feature_id_column: String,
}

impl FeatureConfig {
    /// Config for `schema` with the default `geometry` and `id` columns.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            geometry_column: "geometry".to_string(),
            feature_id_column: "id".to_string(),
        }
    }
}
