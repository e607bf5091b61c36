//! Bounding-box and by-id feature retrieval.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use asset_features_core::{
    split_row, BoundingBox, Feature, FeatureCollection, Lookup, Row, StoreError,
};
use tracing::debug;

use super::query::{FeatureFilter, FeatureQuery};
use super::validator::TableIdentifierValidator;
use super::FeatureConfig;
use crate::traits::{FeatureSource, TableCatalog};

/// Builds, validates and runs feature queries, then reshapes the rows.
///
/// Every table name is checked against the catalog before any SQL is built
/// from it. All coordinates are British National Grid; nothing is
/// reprojected.
#[derive(Clone)]
pub struct SpatialFeatureQueryEngine {
    validator: TableIdentifierValidator,
    catalog: Arc<dyn TableCatalog>,
    source: Arc<dyn FeatureSource>,
    config: FeatureConfig,
}

impl SpatialFeatureQueryEngine {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn TableCatalog>,
        source: Arc<dyn FeatureSource>,
        config: FeatureConfig,
    ) -> Self {
        Self {
            validator: TableIdentifierValidator::new(Arc::clone(&catalog)),
            catalog,
            source,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Fetches one feature by id from the `collection_id` table.
    ///
    /// Only the feature-id column and the geometry are selected.
    ///
    /// # Errors
    ///
    /// Fatal store faults and [`StoreError::InvalidIdentifier`]. Zero rows is
    /// [`Lookup::NotFound`]; transient failures are [`Lookup::Unavailable`].
    pub async fn get_feature(
        &self,
        collection_id: &str,
        feature_id: &str,
    ) -> Result<Lookup<Feature>, StoreError> {
        let result = async {
            self.validator
                .ensure(&self.config.schema, collection_id)
                .await?;

            let query = FeatureQuery {
                schema: self.config.schema.clone(),
                table: collection_id.to_string(),
                geometry_column: self.config.geometry_column.clone(),
                columns: vec![self.config.feature_id_column.clone()],
                filter: FeatureFilter::ById {
                    column: self.config.feature_id_column.clone(),
                    value: feature_id.to_string(),
                },
            };

            let rows = self.source.fetch(&query).await?;
            match rows.into_iter().next() {
                Some(row) => to_feature("get_feature", row).map(Some),
                None => Ok::<_, StoreError>(None),
            }
        }
        .await;

        Lookup::from_store("get_feature", result)
    }

    /// Fetches the features of `collection_id` whose envelope overlaps `bbox`,
    /// with each geometry clipped to `bbox`.
    ///
    /// `columns` are the attribute columns to project; the geometry column is
    /// removed from them if present. A non-empty `extra_filter` is ANDed onto
    /// the spatial predicate and must come from trusted configuration, never
    /// from a request.
    ///
    /// # Errors
    ///
    /// Fatal store faults and [`StoreError::InvalidIdentifier`]. An empty
    /// result is [`Lookup::NotFound`], never an empty collection.
    pub async fn get_feature_collection(
        &self,
        collection_id: &str,
        columns: &[String],
        bbox: BoundingBox,
        extra_filter: &str,
    ) -> Result<Lookup<FeatureCollection>, StoreError> {
        let started = Instant::now();
        let result = async {
            self.validator
                .ensure(&self.config.schema, collection_id)
                .await?;

            let query = FeatureQuery {
                schema: self.config.schema.clone(),
                table: collection_id.to_string(),
                geometry_column: self.config.geometry_column.clone(),
                columns: columns
                    .iter()
                    .filter(|c| **c != self.config.geometry_column)
                    .cloned()
                    .collect(),
                filter: FeatureFilter::Within {
                    bbox,
                    extra: Some(extra_filter.to_string()).filter(|f| !f.trim().is_empty()),
                },
            };

            let rows = self.source.fetch(&query).await?;
            let features = rows
                .into_iter()
                .map(|row| to_feature("get_feature_collection", row))
                .collect::<Result<Vec<_>, _>>()?;

            debug!(
                collection_id,
                %bbox,
                features = features.len(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "feature collection query finished"
            );
            Ok::<_, StoreError>(FeatureCollection::from_query(features, bbox))
        }
        .await;

        Lookup::from_store("get_feature_collection", result)
    }

    /// Paged retrieval is not implemented.
    ///
    /// # Errors
    ///
    /// Always [`StoreError::Unsupported`].
    #[allow(clippy::unused_async)]
    pub async fn get_feature_collection_page(
        &self,
        _collection_id: &str,
        _bbox: Option<BoundingBox>,
        _page: u32,
        _page_size: u32,
    ) -> Result<Lookup<FeatureCollection>, StoreError> {
        Err(StoreError::Unsupported {
            operation: "paged feature collection",
        })
    }

    /// Column name to SQL data type for the `collection_id` table.
    ///
    /// # Errors
    ///
    /// Fatal store faults and [`StoreError::InvalidIdentifier`].
    pub async fn feature_data_types(
        &self,
        collection_id: &str,
    ) -> Result<Lookup<BTreeMap<String, String>>, StoreError> {
        let result = async {
            self.validator
                .ensure(&self.config.schema, collection_id)
                .await?;
            let types = self
                .catalog
                .column_types(&self.config.schema, collection_id)
                .await?;
            Ok::<_, StoreError>(Some(types).filter(|t| !t.is_empty()))
        }
        .await;

        Lookup::from_store("feature_data_types", result)
    }
}

fn to_feature(operation: &str, row: Row) -> Result<Feature, StoreError> {
    split_row(row).map_err(|e| StoreError::decode(operation, e))
}
