use asset_features_core::{LayerGroup, Lookup, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::{display_name, keys, ProcedureCaller};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct LayerGroupRow {
    id: Uuid,
    display_name_eng: Option<String>,
    display_name_cym: Option<String>,
    display_order: Option<i32>,
    map_config_id: Uuid,
    parent_layer_group_id: Option<Uuid>,
    is_checked_by_default: Option<bool>,
    has_children: Option<bool>,
    is_child: Option<bool>,
    is_base_map: Option<bool>,
}

impl From<LayerGroupRow> for LayerGroup {
    fn from(row: LayerGroupRow) -> Self {
        Self {
            id: row.id,
            display_name: display_name(row.display_name_eng, row.display_name_cym, ""),
            display_order: row.display_order.unwrap_or_default(),
            map_config_id: row.map_config_id,
            parent_layer_group_id: row.parent_layer_group_id.filter(|id| !id.is_nil()),
            is_checked_by_default: row.is_checked_by_default.unwrap_or(false),
            has_children: row.has_children.unwrap_or(false),
            is_child: row.is_child.unwrap_or(false),
            is_base_map: row.is_base_map.unwrap_or(false),
        }
    }
}

#[derive(Clone)]
pub struct LayerGroupRepository {
    caller: ProcedureCaller,
}

impl LayerGroupRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// Every group owned by a map configuration, in store order.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_config_id(
        &self,
        config_id: Uuid,
    ) -> Result<Lookup<Vec<LayerGroup>>, StoreError> {
        self.caller
            .list::<LayerGroupRow, LayerGroup>(
                keys::GET_LAYER_GROUPS_BY_CONFIG_ID,
                &[ProcArg::Uuid(config_id)],
            )
            .await
    }

    /// One group, provided it belongs to `config_id`.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_id(
        &self,
        config_id: Uuid,
        group_id: Uuid,
    ) -> Result<Lookup<LayerGroup>, StoreError> {
        let outcome = self
            .caller
            .single::<LayerGroupRow, LayerGroup>(
                keys::GET_LAYER_GROUP_BY_ID,
                &[ProcArg::Uuid(group_id)],
            )
            .await?;
        Ok(match outcome {
            Lookup::Found(group) if group.map_config_id != config_id => Lookup::NotFound,
            other => other,
        })
    }

    /// Direct children of `parent_id`.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_children(&self, parent_id: Uuid) -> Result<Lookup<Vec<LayerGroup>>, StoreError> {
        self.caller
            .list::<LayerGroupRow, LayerGroup>(
                keys::GET_CHILD_LAYER_GROUPS_BY_PARENT_ID,
                &[ProcArg::Uuid(parent_id)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::repository::test_support::{caller, function_name, row};
    use crate::storage::MemoryStore;

    fn group_row(id: Uuid, config_id: Uuid, parent: Option<Uuid>) -> Value {
        json!({
            "id": id,
            "display_name_eng": "Water",
            "display_name_cym": "",
            "display_order": 2,
            "map_config_id": config_id,
            "parent_layer_group_id": parent,
            "is_checked_by_default": true,
            "has_children": false,
            "is_child": parent.is_some(),
            "is_base_map": null,
        })
    }

    #[tokio::test]
    async fn decodes_group_flags_and_names() {
        let store = Arc::new(MemoryStore::new());
        let (config_id, group_id) = (Uuid::new_v4(), Uuid::new_v4());
        store.set_rows(
            &function_name(keys::GET_LAYER_GROUPS_BY_CONFIG_ID),
            &[ProcArg::Uuid(config_id)],
            vec![row(group_row(group_id, config_id, None))],
        );

        let repo = LayerGroupRepository::new(caller(&store));
        let Lookup::Found(groups) = repo.get_by_config_id(config_id).await.unwrap() else {
            panic!("expected groups");
        };
        let group = &groups[0];
        assert_eq!(group.display_name.en, "Water");
        assert_eq!(group.display_name.cy, None);
        assert_eq!(group.display_order, 2);
        assert!(group.is_checked_by_default);
        assert!(!group.is_base_map);
    }

    #[tokio::test]
    async fn group_of_another_configuration_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let (config_id, group_id) = (Uuid::new_v4(), Uuid::new_v4());
        store.set_rows(
            &function_name(keys::GET_LAYER_GROUP_BY_ID),
            &[ProcArg::Uuid(group_id)],
            vec![row(group_row(group_id, config_id, None))],
        );

        let repo = LayerGroupRepository::new(caller(&store));
        assert!(repo.get_by_id(config_id, group_id).await.unwrap().is_found());
        assert_eq!(
            repo.get_by_id(Uuid::new_v4(), group_id).await.unwrap(),
            Lookup::NotFound
        );
    }

    #[tokio::test]
    async fn children_are_listed_by_parent() {
        let store = Arc::new(MemoryStore::new());
        let (config_id, parent, child) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.set_rows(
            &function_name(keys::GET_CHILD_LAYER_GROUPS_BY_PARENT_ID),
            &[ProcArg::Uuid(parent)],
            vec![row(group_row(child, config_id, Some(parent)))],
        );

        let repo = LayerGroupRepository::new(caller(&store));
        let children = repo.get_children(parent).await.unwrap().unwrap_or_empty();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].parent_layer_group_id, Some(parent));
        assert!(children[0].is_child);

        assert_eq!(
            repo.get_children(child).await.unwrap(),
            Lookup::NotFound
        );
    }
}
