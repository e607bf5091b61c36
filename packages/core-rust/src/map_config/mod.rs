//! Map configuration document model.
//!
//! Every type here is a read-only projection rebuilt per request from the
//! store. Field names serialize in camelCase for the presentation clients.

mod attributes;
mod layers;
mod styles;

pub use attributes::{AttributeGroup, LayerAttribute};
pub use layers::{Layer, LayerGroup};
pub use styles::{
    parse_match_values, Style, StyleFill, StyleMarker, StyleRule, StyleRuleCondition, StyleStroke,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::geometry::BoundingBox;

/// English display text with an optional Welsh translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisplayName {
    pub en: String,
    pub cy: Option<String>,
}

impl DisplayName {
    pub fn new(en: impl Into<String>, cy: Option<String>) -> Self {
        Self { en: en.into(), cy }
    }
}

/// Initial viewport of a map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub id: Uuid,
    pub map_config_id: Option<Uuid>,
    pub projection: Option<String>,
    #[schema(value_type = Vec<f64>)]
    pub center: [f64; 2],
    pub zoom: i32,
    pub minimum_zoom: Option<i32>,
    pub maximum_zoom: i32,
    #[schema(value_type = Vec<f64>)]
    pub extent: BoundingBox,
}

/// Identity columns of a map configuration, before assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfigurationHeader {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

/// A fully assembled map configuration document.
///
/// `layers` and `base_maps` never share a layer. Every `base_maps` entry
/// belongs to a base-map group of `layer_groups`; a `layers` entry may name a
/// group that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapConfiguration {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub map_view: MapView,
    pub layer_groups: Vec<LayerGroup>,
    pub layers: Vec<Layer>,
    pub base_maps: Option<Vec<Layer>>,
    pub styles: Option<Vec<Style>>,
    pub attribute_groups: Option<Vec<AttributeGroup>>,
}

impl MapConfiguration {
    /// Starts a document with only the mandatory parts filled in.
    #[must_use]
    pub fn new(header: MapConfigurationHeader, map_view: MapView) -> Self {
        Self {
            id: header.id,
            name: header.name,
            description: header.description,
            is_active: header.is_active,
            map_view,
            layer_groups: Vec::new(),
            layers: Vec::new(),
            base_maps: None,
            styles: None,
            attribute_groups: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view() -> MapView {
        MapView {
            id: Uuid::nil(),
            map_config_id: None,
            projection: Some("EPSG:27700".to_string()),
            center: [400_000.0, 300_000.0],
            zoom: 7,
            minimum_zoom: Some(0),
            maximum_zoom: 23,
            extent: BoundingBox::new(0.0, 0.0, 700_000.0, 1_300_000.0),
        }
    }

    #[test]
    fn map_view_serializes_center_and_extent_as_arrays() {
        let value = serde_json::to_value(view()).unwrap();
        assert_eq!(value["center"], json!([400_000.0, 300_000.0]));
        assert_eq!(value["extent"], json!([0.0, 0.0, 700_000.0, 1_300_000.0]));
        assert_eq!(value["maximumZoom"], 23);
    }

    #[test]
    fn new_configuration_has_empty_collections() {
        let header = MapConfigurationHeader {
            id: Uuid::new_v4(),
            name: Some("Water".to_string()),
            description: None,
            is_active: true,
        };
        let config = MapConfiguration::new(header.clone(), view());

        assert_eq!(config.id, header.id);
        assert!(config.layers.is_empty());
        assert!(config.base_maps.is_none());
        assert!(config.styles.is_none());
    }

    #[test]
    fn display_name_keeps_missing_welsh_as_null() {
        let value = serde_json::to_value(DisplayName::new("Valve", None)).unwrap();
        assert_eq!(value, json!({"en": "Valve", "cy": null}));
    }
}
