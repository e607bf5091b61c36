use asset_features_core::{BoundingBox, Lookup, MapView, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::{keys, ProcedureCaller};
use crate::traits::ProcArg;

const DEFAULT_MAXIMUM_ZOOM: i32 = 23;

#[derive(Debug, Deserialize)]
struct MapViewRow {
    map_view_id: Uuid,
    map_config_id: Option<Uuid>,
    projection: Option<String>,
    center_x: f64,
    center_y: f64,
    initial_zoom: Option<i32>,
    minimum_zoom: Option<i32>,
    maximum_zoom: Option<i32>,
    extent_bottom_left_x: f64,
    extent_bottom_left_y: f64,
    extent_top_right_x: f64,
    extent_top_right_y: f64,
}

impl From<MapViewRow> for MapView {
    fn from(row: MapViewRow) -> Self {
        Self {
            id: row.map_view_id,
            map_config_id: row.map_config_id,
            projection: row.projection,
            center: [row.center_x, row.center_y],
            zoom: row.initial_zoom.unwrap_or_default(),
            minimum_zoom: row.minimum_zoom,
            maximum_zoom: row.maximum_zoom.unwrap_or(DEFAULT_MAXIMUM_ZOOM),
            extent: BoundingBox::new(
                row.extent_bottom_left_x,
                row.extent_bottom_left_y,
                row.extent_top_right_x,
                row.extent_top_right_y,
            ),
        }
    }
}

#[derive(Clone)]
pub struct MapViewRepository {
    caller: ProcedureCaller,
}

impl MapViewRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// The map view owned by a map configuration.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_config_id(&self, config_id: Uuid) -> Result<Lookup<MapView>, StoreError> {
        self.caller
            .single::<MapViewRow, MapView>(keys::GET_MAP_VIEW_BY_CONFIG_ID, &[ProcArg::Uuid(config_id)])
            .await
    }
}
