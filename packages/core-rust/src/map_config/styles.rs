use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DisplayName;

/// Fill portion of a style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleFill {
    pub fill_color: Option<String>,
    pub image_source: Option<String>,
}

/// Stroke portion of a style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleStroke {
    pub color: Option<String>,
    pub line_dash: Option<String>,
    pub width: Option<f64>,
}

/// Point marker portion of a style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleMarker {
    pub symbol_name: Option<String>,
    pub image_source: Option<String>,
    pub fill: StyleFill,
    pub points: Option<i32>,
    pub radius: Option<f64>,
    pub angle: Option<f64>,
    pub stroke: StyleStroke,
    #[schema(value_type = Option<Vec<f64>>)]
    pub displacement: Option<[f64; 2]>,
    pub rotate_with_view: Option<bool>,
    pub scale: Option<f64>,
    pub rotation: Option<f64>,
}

/// A reusable style. The fill, stroke and marker parts are always present;
/// unset members are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub primary_geometry_type: Option<String>,
    pub symbol_name: Option<String>,
    pub image_source: Option<String>,
    pub fill: StyleFill,
    pub stroke: StyleStroke,
    pub marker: StyleMarker,
}

/// Selects a style for a layer's features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    pub id: Uuid,
    pub layer_id: Uuid,
    pub map_mode: String,
    pub evaluation_priority: Option<i32>,
    pub legend_display_name: DisplayName,
    pub legend_geometry_type: Option<String>,
    pub legend_display_order: Option<i32>,
    pub attribute: Option<String>,
    pub attribute_values_to_match: Vec<String>,
    pub style_id: Uuid,
    pub style_selected_id: Option<Uuid>,
    pub rotation_property_name: Option<String>,
    pub rotation_units_property_name: Option<String>,
    pub conditions: Vec<StyleRuleCondition>,
}

/// One node of a style rule's condition forest.
///
/// A root carries the nil UUID as `parent_condition_id`. `conditions` stays
/// `None` until the first child is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StyleRuleCondition {
    pub id: Uuid,
    pub style_rule_id: Uuid,
    pub parent_condition_id: Uuid,
    pub field: Option<String>,
    pub operator: Option<String>,
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub conditions: Option<Vec<StyleRuleCondition>>,
}

impl StyleRuleCondition {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_condition_id.is_nil()
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .conditions
            .iter()
            .flatten()
            .map(StyleRuleCondition::node_count)
            .sum::<usize>()
    }
}

/// Parses the comma-encoded attribute match list of a style rule.
///
/// Entries are trimmed and empty entries dropped.
#[must_use]
pub fn parse_match_values(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
