//! Assembled map configuration documents.

use asset_features_core::MapConfiguration;
use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use super::{parse_id, AppState};
use crate::network::error::{require, ApiResult, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/v1/configurations",
    tag = "configurations",
    responses(
        (status = 200, description = "Every map configuration", body = Vec<MapConfiguration>),
        (status = 404, description = "No map configurations", body = ErrorResponse),
        (status = 500, description = "A configuration has no map view", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn configurations_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<MapConfiguration>>> {
    let configs = require(
        state.assembler.get_all().await?,
        "No Map Configurations",
        || "no map configurations are defined".to_string(),
    )?;
    info!(count = configs.len(), "assembled map configurations");
    Ok(Json(configs))
}

#[utoipa::path(
    get,
    path = "/api/v1/configurations/{mapConfigId}",
    tag = "configurations",
    params(("mapConfigId" = String, Path, description = "Map configuration id")),
    responses(
        (status = 200, description = "The map configuration", body = MapConfiguration),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Unknown map configuration", body = ErrorResponse),
        (status = 500, description = "The configuration has no map view", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn configuration_handler(
    State(state): State<AppState>,
    Path(map_config_id): Path<String>,
) -> ApiResult<Json<MapConfiguration>> {
    let config_id = parse_id("mapConfigId", &map_config_id)?;
    let config = require(
        state.assembler.get_by_id(config_id).await?,
        "Map Configuration Not Found",
        || format!("could not find map configuration {config_id}"),
    )?;
    Ok(Json(config))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::network::handlers::test_support::{status_of, test_state};
    use crate::repository::keys;
    use crate::repository::test_support::{function_name, row};
    use crate::storage::MemoryStore;
    use crate::traits::ProcArg;

    fn seed_configuration(store: &MemoryStore, with_view: bool) -> Uuid {
        let config_id = Uuid::new_v4();
        let header = row(json!({"id": config_id, "name": "Water network", "is_active": true}));
        store.set_rows(
            &function_name(keys::GET_MAP_CONFIG_BY_ID),
            &[ProcArg::Uuid(config_id)],
            vec![header.clone()],
        );
        store.set_rows(&function_name(keys::GET_MAP_CONFIGS), &[], vec![header]);
        if with_view {
            store.set_rows(
                &function_name(keys::GET_MAP_VIEW_BY_CONFIG_ID),
                &[ProcArg::Uuid(config_id)],
                vec![row(json!({
                    "map_view_id": Uuid::new_v4(),
                    "map_config_id": config_id,
                    "center_x": 400_000,
                    "center_y": 300_000,
                    "initial_zoom": 7,
                    "extent_bottom_left_x": 0,
                    "extent_bottom_left_y": 0,
                    "extent_top_right_x": 700_000,
                    "extent_top_right_y": 1_300_000,
                }))],
            );
        }
        config_id
    }

    #[tokio::test]
    async fn configuration_is_assembled() {
        let store = Arc::new(MemoryStore::new());
        let config_id = seed_configuration(&store, true);

        let config = configuration_handler(State(test_state(&store)), Path(config_id.to_string()))
            .await
            .unwrap()
            .0;
        assert_eq!(config.id, config_id);
        assert_eq!(config.map_view.zoom, 7);
        assert!(config.layers.is_empty());
    }

    #[tokio::test]
    async fn configuration_errors_map_to_statuses() {
        let store = Arc::new(MemoryStore::new());
        let without_view = seed_configuration(&store, false);
        let state = test_state(&store);

        let malformed = configuration_handler(State(state.clone()), Path("x".to_string())).await;
        assert_eq!(status_of(malformed), StatusCode::BAD_REQUEST);

        let unknown =
            configuration_handler(State(state.clone()), Path(Uuid::new_v4().to_string())).await;
        assert_eq!(status_of(unknown), StatusCode::NOT_FOUND);

        let broken = configuration_handler(State(state), Path(without_view.to_string())).await;
        assert_eq!(status_of(broken), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn configurations_list_every_document() {
        let store = Arc::new(MemoryStore::new());
        seed_configuration(&store, true);

        let configs = configurations_handler(State(test_state(&store))).await.unwrap().0;
        assert_eq!(configs.len(), 1);
    }

    #[tokio::test]
    async fn no_configurations_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let result = configurations_handler(State(test_state(&store))).await;
        assert_eq!(status_of(result), StatusCode::NOT_FOUND);
    }
}
