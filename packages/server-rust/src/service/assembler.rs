//! Builds complete map configuration documents.
//!
//! The map view is mandatory: without it assembly fails with
//! [`StoreError::MissingMapView`]. Every other part degrades to an empty
//! collection when the store cannot supply it.
//!
//! Sub-fetches run concurrently and each sees its own snapshot of the store;
//! a configuration edited mid-assembly can produce a document whose parts
//! reflect different points in time.

use std::collections::HashSet;

use asset_features_core::{
    Layer, LayerGroup, Lookup, MapConfiguration, MapConfigurationHeader, StoreError,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::repository::{
    AttributeGroupRepository, AttributeRepository, LayerGroupRepository, LayerRepository,
    MapConfigRepository, MapViewRepository, ProcedureCaller, StyleRepository,
};

/// Orchestrates the per-entity repositories for one configuration at a time.
#[derive(Clone)]
pub struct MapConfigurationAssembler {
    configs: MapConfigRepository,
    views: MapViewRepository,
    groups: LayerGroupRepository,
    layers: LayerRepository,
    attributes: AttributeRepository,
    attribute_groups: AttributeGroupRepository,
    styles: StyleRepository,
}

impl MapConfigurationAssembler {
    #[must_use]
    pub fn new(caller: &ProcedureCaller) -> Self {
        Self {
            configs: MapConfigRepository::new(caller.clone()),
            views: MapViewRepository::new(caller.clone()),
            groups: LayerGroupRepository::new(caller.clone()),
            layers: LayerRepository::new(caller.clone()),
            attributes: AttributeRepository::new(caller.clone()),
            attribute_groups: AttributeGroupRepository::new(caller.clone()),
            styles: StyleRepository::new(caller.clone()),
        }
    }

    #[must_use]
    pub fn configs(&self) -> &MapConfigRepository {
        &self.configs
    }

    #[must_use]
    pub fn groups(&self) -> &LayerGroupRepository {
        &self.groups
    }

    #[must_use]
    pub fn layers(&self) -> &LayerRepository {
        &self.layers
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeRepository {
        &self.attributes
    }

    /// One assembled configuration.
    ///
    /// # Errors
    ///
    /// Fatal store faults, including a configuration without a map view.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Lookup<MapConfiguration>, StoreError> {
        match self.configs.get_by_id(id).await? {
            Lookup::Found(header) => Ok(Lookup::Found(self.assemble(header).await?)),
            Lookup::NotFound => Ok(Lookup::NotFound),
            Lookup::Unavailable(detail) => Ok(Lookup::Unavailable(detail)),
        }
    }

    /// Every configuration, assembled in store order.
    ///
    /// # Errors
    ///
    /// Fatal store faults, including any configuration without a map view.
    pub async fn get_all(&self) -> Result<Lookup<Vec<MapConfiguration>>, StoreError> {
        let headers = match self.configs.get_all().await? {
            Lookup::Found(headers) => headers,
            Lookup::NotFound => return Ok(Lookup::NotFound),
            Lookup::Unavailable(detail) => return Ok(Lookup::Unavailable(detail)),
        };

        let mut configs = Vec::with_capacity(headers.len());
        for header in headers {
            configs.push(self.assemble(header).await?);
        }
        Ok(Lookup::Found(configs))
    }

    /// Builds the full document for `header`.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingMapView`] when the view is absent or cannot be
    /// read, plus any other fatal fault from the sub-fetches.
    pub async fn assemble(
        &self,
        header: MapConfigurationHeader,
    ) -> Result<MapConfiguration, StoreError> {
        let config_id = header.id;
        let map_view = match self.views.get_by_config_id(config_id).await? {
            Lookup::Found(view) => view,
            Lookup::NotFound => {
                error!(%config_id, "map configuration has no map view");
                return Err(StoreError::MissingMapView { config_id });
            }
            Lookup::Unavailable(detail) => {
                error!(%config_id, %detail, "map view could not be read");
                return Err(StoreError::MissingMapView { config_id });
            }
        };

        let (groups, layers, attribute_groups, styles) = tokio::join!(
            self.groups.get_by_config_id(config_id),
            self.layers.get_by_config_id(config_id),
            self.attribute_groups.get_by_config_id(config_id),
            self.styles.get_by_config_id(config_id),
        );
        let groups = groups?.unwrap_or_empty();
        let layers = layers?.unwrap_or_empty();

        let mut config = MapConfiguration::new(header, map_view);
        let (layers, base_maps) = partition_base_maps(config_id, &groups, layers);
        config.layer_groups = groups;
        config.layers = layers;
        config.base_maps = base_maps;
        config.attribute_groups = Some(attribute_groups?.unwrap_or_empty());
        config.styles = Some(styles?.unwrap_or_empty());

        debug!(
            %config_id,
            layer_groups = config.layer_groups.len(),
            layers = config.layers.len(),
            base_maps = config.base_maps.as_ref().map_or(0, Vec::len),
            "map configuration assembled"
        );
        Ok(config)
    }
}

/// Splits base-map layers out of `layers`.
///
/// Only layers of a listed base-map group move; a layer whose group is not
/// among `groups` stays in `layers`. The base-map list is present only when
/// at least one group is flagged as a base map.
fn partition_base_maps(
    config_id: Uuid,
    groups: &[LayerGroup],
    layers: Vec<Layer>,
) -> (Vec<Layer>, Option<Vec<Layer>>) {
    let known: HashSet<Uuid> = groups.iter().map(|g| g.id).collect();
    let base_groups: HashSet<Uuid> = groups
        .iter()
        .filter(|g| g.is_base_map)
        .map(|g| g.id)
        .collect();

    let mut overlays = Vec::with_capacity(layers.len());
    let mut base_maps = Vec::new();
    for layer in layers {
        if base_groups.contains(&layer.layer_group_id) {
            base_maps.push(layer);
            continue;
        }
        if !known.contains(&layer.layer_group_id) {
            warn!(
                %config_id,
                layer_id = %layer.id,
                layer_group_id = %layer.layer_group_id,
                "layer group is not part of the configuration"
            );
        }
        overlays.push(layer);
    }

    let base_maps = (!base_groups.is_empty()).then_some(base_maps);
    (overlays, base_maps)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use asset_features_core::{DisplayName, Row};
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::repository::keys;
    use crate::repository::test_support::{caller, function_name, row};
    use crate::storage::MemoryStore;
    use crate::traits::ProcArg;

    fn header_row(id: Uuid) -> Row {
        row(json!({"id": id, "name": "Water network", "description": null, "is_active": true}))
    }

    fn view_row(config_id: Uuid) -> Row {
        row(json!({
            "map_view_id": Uuid::new_v4(),
            "map_config_id": config_id,
            "projection": "EPSG:27700",
            "center_x": 400_000,
            "center_y": 300_000,
            "initial_zoom": 7,
            "extent_bottom_left_x": 0,
            "extent_bottom_left_y": 0,
            "extent_top_right_x": 700_000,
            "extent_top_right_y": 1_300_000,
        }))
    }

    fn group_row(id: Uuid, config_id: Uuid, base_map: bool) -> Row {
        let name = if base_map { "Base maps" } else { "Water" };
        row(json!({
            "id": id,
            "display_name_eng": name,
            "map_config_id": config_id,
            "is_base_map": base_map,
        }))
    }

    fn layer_row(id: Uuid, group_id: Uuid) -> Row {
        row(json!({"id": id, "layer_group_id": group_id, "name": format!("layer_{id}")}))
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        config_id: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let config_id = Uuid::new_v4();
            let arg = [ProcArg::Uuid(config_id)];
            store.set_rows(
                &function_name(keys::GET_MAP_CONFIG_BY_ID),
                &arg,
                vec![header_row(config_id)],
            );
            store.set_rows(
                &function_name(keys::GET_MAP_CONFIGS),
                &[],
                vec![header_row(config_id)],
            );
            store.set_rows(
                &function_name(keys::GET_MAP_VIEW_BY_CONFIG_ID),
                &arg,
                vec![view_row(config_id)],
            );
            Self { store, config_id }
        }

        fn set(&self, key: &str, rows: Vec<Row>) {
            self.store
                .set_rows(&function_name(key), &[ProcArg::Uuid(self.config_id)], rows);
        }

        fn assembler(&self) -> MapConfigurationAssembler {
            MapConfigurationAssembler::new(&caller(&self.store))
        }
    }

    #[tokio::test]
    async fn base_map_layers_are_moved_out_of_layers() {
        let fixture = Fixture::new();
        let (overlay_group, base_group) = (Uuid::new_v4(), Uuid::new_v4());
        let (pipe, road, aerial) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        fixture.set(
            keys::GET_LAYER_GROUPS_BY_CONFIG_ID,
            vec![
                group_row(overlay_group, fixture.config_id, false),
                group_row(base_group, fixture.config_id, true),
            ],
        );
        fixture.set(
            keys::GET_LAYERS_BY_MAP_CONFIG_ID,
            vec![
                layer_row(pipe, overlay_group),
                layer_row(road, base_group),
                layer_row(aerial, base_group),
            ],
        );

        let Lookup::Found(config) = fixture
            .assembler()
            .get_by_id(fixture.config_id)
            .await
            .unwrap()
        else {
            panic!("expected a configuration");
        };

        let base_maps = config.base_maps.unwrap();
        assert_eq!(
            base_maps.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![road, aerial]
        );
        assert_eq!(config.layers.iter().map(|l| l.id).collect::<Vec<_>>(), vec![pipe]);
        assert_eq!(config.layer_groups.len(), 2);
    }

    #[tokio::test]
    async fn missing_map_view_is_fatal() {
        let fixture = Fixture::new();
        fixture.set(keys::GET_MAP_VIEW_BY_CONFIG_ID, Vec::new());

        let result = fixture.assembler().get_by_id(fixture.config_id).await;
        assert_eq!(
            result,
            Err(StoreError::MissingMapView {
                config_id: fixture.config_id
            })
        );
    }

    #[tokio::test]
    async fn unreadable_map_view_is_fatal() {
        let fixture = Fixture::new();
        fixture
            .store
            .fail_function(&function_name(keys::GET_MAP_VIEW_BY_CONFIG_ID), "timeout");

        assert!(matches!(
            fixture.assembler().get_by_id(fixture.config_id).await,
            Err(StoreError::MissingMapView { .. })
        ));
    }

    #[tokio::test]
    async fn failed_sub_fetches_become_empty_collections() {
        let fixture = Fixture::new();
        for key in [
            keys::GET_LAYER_GROUPS_BY_CONFIG_ID,
            keys::GET_LAYERS_BY_MAP_CONFIG_ID,
            keys::GET_STYLES_BY_MAP_CONFIG_ID,
            keys::GET_ATTRIBUTE_GROUPS_BY_MAP_CONFIGURATION_ID,
        ] {
            fixture.store.fail_function(&function_name(key), "connection reset");
        }

        let config = fixture
            .assembler()
            .get_by_id(fixture.config_id)
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert!(config.layer_groups.is_empty());
        assert!(config.layers.is_empty());
        assert!(config.base_maps.is_none());
        assert_eq!(config.styles, Some(Vec::new()));
        assert_eq!(config.attribute_groups, Some(Vec::new()));
    }

    #[tokio::test]
    async fn failed_group_fetch_keeps_layers() {
        let fixture = Fixture::new();
        let group = Uuid::new_v4();
        fixture
            .store
            .fail_function(&function_name(keys::GET_LAYER_GROUPS_BY_CONFIG_ID), "connection reset");
        fixture.set(
            keys::GET_LAYERS_BY_MAP_CONFIG_ID,
            vec![layer_row(Uuid::new_v4(), group), layer_row(Uuid::new_v4(), group)],
        );

        let config = fixture
            .assembler()
            .get_by_id(fixture.config_id)
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert!(config.layer_groups.is_empty());
        assert_eq!(config.layers.len(), 2);
        assert!(config.base_maps.is_none());
    }

    #[tokio::test]
    async fn layers_of_unknown_groups_are_kept() {
        let fixture = Fixture::new();
        let group = Uuid::new_v4();
        fixture.set(
            keys::GET_LAYER_GROUPS_BY_CONFIG_ID,
            vec![group_row(group, fixture.config_id, false)],
        );
        fixture.set(
            keys::GET_LAYERS_BY_MAP_CONFIG_ID,
            vec![layer_row(Uuid::new_v4(), group), layer_row(Uuid::new_v4(), Uuid::new_v4())],
        );

        let config = fixture
            .assembler()
            .get_by_id(fixture.config_id)
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(config.layers.len(), 2);
        assert!(config.layers.iter().any(|l| l.layer_group_id == group));
    }

    #[tokio::test]
    async fn unknown_configuration_is_not_found() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture.assembler().get_by_id(Uuid::new_v4()).await.unwrap(),
            Lookup::NotFound
        );
    }

    #[tokio::test]
    async fn get_all_assembles_every_configuration() {
        let fixture = Fixture::new();
        let Lookup::Found(configs) = fixture.assembler().get_all().await.unwrap() else {
            panic!("expected configurations");
        };
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].map_view.zoom, 7);
    }

    #[tokio::test]
    async fn disconnected_store_propagates() {
        let fixture = Fixture::new();
        fixture.store.disconnect();
        assert_eq!(
            fixture.assembler().get_all().await,
            Err(StoreError::NoConnection)
        );
    }

    fn group(id: Uuid, base_map: bool) -> LayerGroup {
        LayerGroup {
            id,
            display_name: DisplayName::new("g", None),
            display_order: 0,
            map_config_id: Uuid::nil(),
            parent_layer_group_id: None,
            is_checked_by_default: false,
            has_children: false,
            is_child: false,
            is_base_map: base_map,
        }
    }

    fn layer(group_id: Uuid) -> Layer {
        Layer {
            id: Uuid::new_v4(),
            layer_group_id: group_id,
            name: "l".to_string(),
            display_name: DisplayName::new("l", None),
            description: None,
            display_order: 0,
            source_type: String::new(),
            source_properties: std::collections::BTreeMap::new(),
            minimum_scale: 0,
            maximum_scale: 0,
            is_checked_by_default: false,
            attributes: Vec::new(),
            style_rules: Vec::new(),
        }
    }

    proptest! {
        #[test]
        fn partition_is_disjoint_and_loses_nothing(
            flags in prop::collection::vec(any::<bool>(), 1..6),
            picks in prop::collection::vec(0usize..8, 0..30),
        ) {
            let groups: Vec<LayerGroup> = flags.iter().map(|&b| group(Uuid::new_v4(), b)).collect();
            // Indices past the group list point at groups outside the configuration.
            let layers: Vec<Layer> = picks
                .iter()
                .map(|&i| layer(groups.get(i).map_or_else(Uuid::new_v4, |g| g.id)))
                .collect();

            let total = layers.len();
            let (overlays, base_maps) = partition_base_maps(Uuid::nil(), &groups, layers);
            let base_maps = base_maps.unwrap_or_default();

            prop_assert_eq!(overlays.len() + base_maps.len(), total);
            for l in &overlays {
                let g = groups.iter().find(|g| g.id == l.layer_group_id);
                prop_assert!(g.is_none_or(|g| !g.is_base_map));
            }
            for l in &base_maps {
                let g = groups.iter().find(|g| g.id == l.layer_group_id);
                prop_assert!(g.is_some_and(|g| g.is_base_map));
            }
            prop_assert!(overlays.iter().all(|o| base_maps.iter().all(|b| b.id != o.id)));
        }
    }
}
