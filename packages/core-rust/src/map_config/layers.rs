use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{DisplayName, LayerAttribute, StyleRule};

/// A node in the shallow layer-group hierarchy of one map configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayerGroup {
    pub id: Uuid,
    pub display_name: DisplayName,
    pub display_order: i32,
    pub map_config_id: Uuid,
    pub parent_layer_group_id: Option<Uuid>,
    pub is_checked_by_default: bool,
    pub has_children: bool,
    pub is_child: bool,
    pub is_base_map: bool,
}

/// A displayable layer. `name` is the physical table backing its features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: Uuid,
    pub layer_group_id: Uuid,
    pub name: String,
    pub display_name: DisplayName,
    pub description: Option<String>,
    pub display_order: i32,
    pub source_type: String,
    pub source_properties: BTreeMap<String, String>,
    pub minimum_scale: i32,
    pub maximum_scale: i32,
    pub is_checked_by_default: bool,
    pub attributes: Vec<LayerAttribute>,
    pub style_rules: Vec<StyleRule>,
}

impl Layer {
    /// Attribute column names to select for this layer's features.
    ///
    /// Duplicates are dropped keeping first occurrence, as are the synthetic
    /// `RowComponent#` and `NUARACTOR:` entries that have no backing column.
    #[must_use]
    pub fn feature_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            let name = attribute.attribute_name.as_str();
            if name.contains("RowComponent#") || name.contains("NUARACTOR:") {
                continue;
            }
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
        columns
    }
}
