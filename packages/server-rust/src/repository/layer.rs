use std::collections::BTreeMap;

use asset_features_core::{Layer, Lookup, Row, StoreError};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{display_name, keys, AttributeRepository, ProcedureCaller, StyleRuleRepository};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct LayerRow {
    id: Uuid,
    layer_group_id: Uuid,
    name: String,
    display_name_eng: Option<String>,
    display_name_cym: Option<String>,
    description: Option<String>,
    display_order: Option<i32>,
    source_type: Option<String>,
    minimum_scale: Option<i32>,
    maximum_scale: Option<i32>,
    is_checked_by_default: Option<bool>,
}

impl From<LayerRow> for Layer {
    fn from(row: LayerRow) -> Self {
        let display_name = display_name(row.display_name_eng, row.display_name_cym, &row.name);
        Self {
            id: row.id,
            layer_group_id: row.layer_group_id,
            name: row.name,
            display_name,
            description: row.description,
            display_order: row.display_order.unwrap_or_default(),
            source_type: row.source_type.unwrap_or_default(),
            source_properties: BTreeMap::new(),
            minimum_scale: row.minimum_scale.unwrap_or_default(),
            maximum_scale: row.maximum_scale.unwrap_or_default(),
            is_checked_by_default: row.is_checked_by_default.unwrap_or(false),
            attributes: Vec::new(),
            style_rules: Vec::new(),
        }
    }
}

/// Key/value rows into a property map. Rows without a key are skipped and
/// non-string values keep their JSON text.
fn source_properties(rows: Vec<Row>) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    for row in rows {
        let key = match row.get("key") {
            Some(Value::String(key)) if !key.is_empty() => key.clone(),
            _ => continue,
        };
        let value = match row.get("value") {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        properties.insert(key, value);
    }
    properties
}

/// Layers hydrated with source properties, attributes and style rules.
#[derive(Clone)]
pub struct LayerRepository {
    caller: ProcedureCaller,
    attributes: AttributeRepository,
    style_rules: StyleRuleRepository,
}

impl LayerRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self {
            attributes: AttributeRepository::new(caller.clone()),
            style_rules: StyleRuleRepository::new(caller.clone()),
            caller,
        }
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_group_id(&self, group_id: Uuid) -> Result<Lookup<Vec<Layer>>, StoreError> {
        let layers = self
            .caller
            .list::<LayerRow, Layer>(keys::GET_LAYERS_BY_GROUP_ID, &[ProcArg::Uuid(group_id)])
            .await?;
        self.hydrate_all(layers).await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_config_id(&self, config_id: Uuid) -> Result<Lookup<Vec<Layer>>, StoreError> {
        let layers = self
            .caller
            .list::<LayerRow, Layer>(
                keys::GET_LAYERS_BY_MAP_CONFIG_ID,
                &[ProcArg::Uuid(config_id)],
            )
            .await?;
        self.hydrate_all(layers).await
    }

    /// One layer of one map configuration.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_config_and_layer_id(
        &self,
        config_id: Uuid,
        layer_id: Uuid,
    ) -> Result<Lookup<Layer>, StoreError> {
        let layer = self
            .caller
            .single::<LayerRow, Layer>(
                keys::GET_LAYER_BY_MAP_CONFIG_ID_AND_LAYER_ID,
                &[ProcArg::Uuid(layer_id), ProcArg::Uuid(config_id)],
            )
            .await?;
        match layer {
            Lookup::Found(mut layer) => {
                self.hydrate(&mut layer).await?;
                Ok(Lookup::Found(layer))
            }
            other => Ok(other),
        }
    }

    /// Source properties of a layer; empty when there are none or the store
    /// could not answer.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn source_properties(
        &self,
        layer_id: Uuid,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        let rows = self
            .caller
            .raw(keys::GET_SOURCE_PROPERTIES_BY_LAYER_ID, &[ProcArg::Uuid(layer_id)])
            .await
            .map(Some);
        Ok(Lookup::from_store(keys::GET_SOURCE_PROPERTIES_BY_LAYER_ID, rows)?
            .into_option()
            .map(source_properties)
            .unwrap_or_default())
    }

    async fn hydrate(&self, layer: &mut Layer) -> Result<(), StoreError> {
        layer.source_properties = self.source_properties(layer.id).await?;
        layer.attributes = self
            .attributes
            .get_by_layer_id(layer.id)
            .await?
            .unwrap_or_empty();
        layer.style_rules = self
            .style_rules
            .get_by_layer_id(layer.id)
            .await?
            .unwrap_or_empty();
        Ok(())
    }

    async fn hydrate_all(&self, layers: Lookup<Vec<Layer>>) -> Result<Lookup<Vec<Layer>>, StoreError> {
        let Lookup::Found(mut layers) = layers else {
            return Ok(layers);
        };
        for layer in &mut layers {
            self.hydrate(layer).await?;
        }
        Ok(Lookup::Found(layers))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::repository::test_support::{caller, function_name, row};
    use crate::storage::MemoryStore;

    fn layer_row(id: Uuid, group_id: Uuid, name: &str) -> Row {
        row(json!({
            "id": id,
            "layer_group_id": group_id,
            "name": name,
            "display_name_eng": null,
            "display_order": 1,
            "source_type": "vector",
            "minimum_scale": 0,
            "maximum_scale": 5000,
            "is_checked_by_default": true,
        }))
    }

    #[tokio::test]
    async fn layers_are_hydrated() {
        let store = Arc::new(MemoryStore::new());
        let (config_id, group_id, layer_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.set_rows(
            &function_name(keys::GET_LAYERS_BY_MAP_CONFIG_ID),
            &[ProcArg::Uuid(config_id)],
            vec![layer_row(layer_id, group_id, "water_valve")],
        );
        store.set_rows(
            &function_name(keys::GET_SOURCE_PROPERTIES_BY_LAYER_ID),
            &[ProcArg::Uuid(layer_id)],
            vec![
                row(json!({"key": "url", "value": "https://tiles.example/{z}/{x}/{y}"})),
                row(json!({"key": "maxZoom", "value": 18})),
                row(json!({"key": "", "value": "ignored"})),
            ],
        );
        store.set_rows(
            &function_name(keys::GET_ATTRIBUTES_BY_LAYER_ID),
            &[ProcArg::Uuid(layer_id)],
            vec![row(json!({"id": Uuid::new_v4(), "attribute_name": "material"}))],
        );

        let repo = LayerRepository::new(caller(&store));
        let layers = repo.get_by_config_id(config_id).await.unwrap().unwrap_or_empty();
        let layer = &layers[0];

        assert_eq!(layer.display_name.en, "water_valve");
        assert_eq!(layer.maximum_scale, 5000);
        assert_eq!(layer.source_properties.len(), 2);
        assert_eq!(layer.source_properties["maxZoom"], "18");
        assert_eq!(layer.attributes.len(), 1);
        assert!(layer.style_rules.is_empty());
    }

    #[tokio::test]
    async fn single_layer_passes_layer_then_config_id() {
        let store = Arc::new(MemoryStore::new());
        let (config_id, group_id, layer_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.set_rows(
            &function_name(keys::GET_LAYER_BY_MAP_CONFIG_ID_AND_LAYER_ID),
            &[ProcArg::Uuid(layer_id), ProcArg::Uuid(config_id)],
            vec![layer_row(layer_id, group_id, "gas_pipe")],
        );

        let repo = LayerRepository::new(caller(&store));
        let Lookup::Found(layer) = repo
            .get_by_config_and_layer_id(config_id, layer_id)
            .await
            .unwrap()
        else {
            panic!("expected a layer");
        };
        assert_eq!(layer.name, "gas_pipe");
        assert!(layer.source_properties.is_empty());
    }

    #[tokio::test]
    async fn failing_source_properties_yield_empty_map() {
        let store = Arc::new(MemoryStore::new());
        store.fail_function(&function_name(keys::GET_SOURCE_PROPERTIES_BY_LAYER_ID), "boom");
        let repo = LayerRepository::new(caller(&store));
        assert!(repo.source_properties(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_without_layers_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let repo = LayerRepository::new(caller(&store));
        assert_eq!(
            repo.get_by_group_id(Uuid::new_v4()).await.unwrap(),
            Lookup::NotFound
        );
    }
}
