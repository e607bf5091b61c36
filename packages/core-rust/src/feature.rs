//! Features and the row reshaping that produces them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{BoundingBox, Geometry};

/// One result row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Column alias carrying the `ST_AsGeoJSON` encoding of the geometry.
pub const GEOMETRY_JSON_COLUMN: &str = "geom_geojson";

/// A single geometry plus its non-geometry attributes (GeoJSON `Feature`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(rename = "properties")]
    pub attributes: Row,
    #[serde(rename = "bbox", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Ordered features plus the rectangle they were selected with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    #[serde(rename = "bbox", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl FeatureCollection {
    /// Wraps a query result. An empty result is absent rather than an empty
    /// collection, so a bounding box is only ever attached to real features.
    #[must_use]
    pub fn from_query(features: Vec<Feature>, queried: BoundingBox) -> Option<Self> {
        if features.is_empty() {
            return None;
        }
        Some(Self {
            features,
            bounding_box: Some(queried),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowSplitError {
    #[error("row has no geom_geojson column")]
    MissingGeometryColumn,
    #[error("row geometry is not valid GeoJSON: {0}")]
    InvalidGeometry(String),
}

/// Splits a row into geometry and attributes.
///
/// The [`GEOMETRY_JSON_COLUMN`] entry is removed and parsed; every other entry
/// becomes an attribute unchanged. A SQL `NULL` geometry yields `None`.
///
/// # Errors
///
/// Fails when the geometry column is missing or does not decode.
pub fn split_row(mut row: Row) -> Result<Feature, RowSplitError> {
    let raw = row
        .remove(GEOMETRY_JSON_COLUMN)
        .ok_or(RowSplitError::MissingGeometryColumn)?;

    let geometry = match raw {
        Value::Null => None,
        Value::String(text) => Some(
            serde_json::from_str(&text).map_err(|e| RowSplitError::InvalidGeometry(e.to_string()))?,
        ),
        other => Some(
            serde_json::from_value(other)
                .map_err(|e| RowSplitError::InvalidGeometry(e.to_string()))?,
        ),
    };

    Ok(Feature {
        geometry,
        attributes: row,
        bounding_box: None,
    })
}

impl Feature {
    /// Re-merges the feature into a row, encoding the geometry as text.
    #[must_use]
    pub fn into_row(self) -> Row {
        let mut row = self.attributes;
        let geometry = self
            .geometry
            .and_then(|g| serde_json::to_string(&g).ok())
            .map_or(Value::Null, Value::String);
        row.insert(GEOMETRY_JSON_COLUMN.to_string(), geometry);
        row
    }
}
