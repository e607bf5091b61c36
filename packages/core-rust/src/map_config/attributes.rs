use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DisplayName;

/// A layer column exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayerAttribute {
    pub id: Uuid,
    /// Physical column name in the layer's table.
    pub attribute_name: String,
    pub display_name: DisplayName,
    pub attribute_suffix: Option<String>,
    pub default_value: Option<String>,
    pub is_visible: bool,
    pub is_queryable: bool,
    pub display_order: i32,
    pub layer_id: Option<Uuid>,
    pub attribute_group_id: Uuid,
}

/// A named section that attributes are grouped under for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeGroup {
    pub id: Uuid,
    pub display_name: DisplayName,
    pub display_section: Option<String>,
    pub display_order: i32,
    pub is_visible: bool,
    pub description: Option<String>,
}
