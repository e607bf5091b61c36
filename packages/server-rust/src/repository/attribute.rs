use asset_features_core::{LayerAttribute, Lookup, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::{display_name, keys, non_empty, ProcedureCaller};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct AttributeRow {
    id: Uuid,
    attribute_name: String,
    display_name_eng: Option<String>,
    display_name_cym: Option<String>,
    attribute_suffix: Option<String>,
    default_value: Option<String>,
    is_visible: Option<bool>,
    is_queryable: Option<bool>,
    display_order: Option<i32>,
    layer_id: Option<Uuid>,
    attribute_group_id: Option<Uuid>,
}

impl From<AttributeRow> for LayerAttribute {
    fn from(row: AttributeRow) -> Self {
        let display_name = display_name(row.display_name_eng, row.display_name_cym, &row.attribute_name);
        Self {
            id: row.id,
            attribute_name: row.attribute_name,
            display_name,
            attribute_suffix: non_empty(row.attribute_suffix),
            default_value: row.default_value,
            is_visible: row.is_visible.unwrap_or(true),
            is_queryable: row.is_queryable.unwrap_or(false),
            display_order: row.display_order.unwrap_or_default(),
            layer_id: row.layer_id,
            attribute_group_id: row.attribute_group_id.unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct AttributeRepository {
    caller: ProcedureCaller,
}

impl AttributeRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_all(&self) -> Result<Lookup<Vec<LayerAttribute>>, StoreError> {
        self.caller
            .list::<AttributeRow, LayerAttribute>(keys::GET_ALL_ATTRIBUTES, &[])
            .await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_layer_id(
        &self,
        layer_id: Uuid,
    ) -> Result<Lookup<Vec<LayerAttribute>>, StoreError> {
        self.caller
            .list::<AttributeRow, LayerAttribute>(
                keys::GET_ATTRIBUTES_BY_LAYER_ID,
                &[ProcArg::Uuid(layer_id)],
            )
            .await
    }

    /// Attributes of a layer that clients may filter on.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_queryable_by_layer_id(
        &self,
        layer_id: Uuid,
    ) -> Result<Lookup<Vec<LayerAttribute>>, StoreError> {
        self.caller
            .list::<AttributeRow, LayerAttribute>(
                keys::GET_QUERYABLE_ATTRIBUTES_BY_LAYER_ID,
                &[ProcArg::Uuid(layer_id)],
            )
            .await
    }
}
