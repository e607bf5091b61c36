use asset_features_core::{AttributeGroup, Lookup, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::{display_name, keys, ProcedureCaller};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct AttributeGroupRow {
    id: Uuid,
    display_name_eng: Option<String>,
    display_name_cym: Option<String>,
    display_section: Option<String>,
    display_order: Option<i32>,
    is_visible: Option<bool>,
    description: Option<String>,
}

impl From<AttributeGroupRow> for AttributeGroup {
    fn from(row: AttributeGroupRow) -> Self {
        Self {
            id: row.id,
            display_name: display_name(row.display_name_eng, row.display_name_cym, ""),
            display_section: row.display_section,
            display_order: row.display_order.unwrap_or_default(),
            is_visible: row.is_visible.unwrap_or(true),
            description: row.description,
        }
    }
}

#[derive(Clone)]
pub struct AttributeGroupRepository {
    caller: ProcedureCaller,
}

impl AttributeGroupRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_all(&self) -> Result<Lookup<Vec<AttributeGroup>>, StoreError> {
        self.caller
            .list::<AttributeGroupRow, AttributeGroup>(keys::GET_ALL_ATTRIBUTE_GROUPS, &[])
            .await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_config_id(
        &self,
        config_id: Uuid,
    ) -> Result<Lookup<Vec<AttributeGroup>>, StoreError> {
        self.caller
            .list::<AttributeGroupRow, AttributeGroup>(
                keys::GET_ATTRIBUTE_GROUPS_BY_MAP_CONFIGURATION_ID,
                &[ProcArg::Uuid(config_id)],
            )
            .await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Lookup<AttributeGroup>, StoreError> {
        self.caller
            .single::<AttributeGroupRow, AttributeGroup>(
                keys::GET_ATTRIBUTE_GROUP_BY_ID,
                &[ProcArg::Uuid(id)],
            )
            .await
    }
}
