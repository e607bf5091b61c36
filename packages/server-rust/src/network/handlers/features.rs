//! Feature retrieval by bounding box and by id.

use asset_features_core::{BoundingBox, Feature, FeatureCollection, Layer};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::IntoParams;
use uuid::Uuid;

use super::{parse_id, AppState};
use crate::network::error::{require, ApiError, ApiResult, ErrorResponse};

const GEO_JSON: &str = "application/geo+json";

/// A JSON body served as `application/geo+json`.
#[derive(Debug)]
pub struct GeoJson<T>(pub T);

impl<T: Serialize> IntoResponse for GeoJson<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        if response.status().is_success() {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(GEO_JSON));
        }
        response
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemsQuery {
    /// `minX,minY,maxX,maxY` in EPSG:27700.
    pub bbox: Option<String>,
}

async fn find_layer(state: &AppState, config_id: Uuid, layer_id: Uuid) -> ApiResult<Layer> {
    require(
        state
            .assembler
            .layers()
            .get_by_config_and_layer_id(config_id, layer_id)
            .await?,
        "Could Not Find Layer",
        || format!("could not find layer {layer_id} in map configuration {config_id}"),
    )
}

/// Features of one layer intersecting `bbox`, clipped to it.
#[utoipa::path(
    get,
    path = "/api/v1/configurations/{mapConfigId}/groups/{groupId}/collections/{collectionId}/items",
    tag = "features",
    params(
        ("mapConfigId" = String, Path, description = "Map configuration id"),
        ("groupId" = String, Path, description = "Layer group id"),
        ("collectionId" = String, Path, description = "Layer id"),
        ItemsQuery
    ),
    responses(
        (status = 200, description = "GeoJSON feature collection", content_type = "application/geo+json", body = serde_json::Value),
        (status = 400, description = "Malformed id or bbox", body = ErrorResponse),
        (status = 404, description = "Unknown layer or no features", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn items_handler(
    State(state): State<AppState>,
    Path((map_config_id, group_id, collection_id)): Path<(String, String, String)>,
    Query(query): Query<ItemsQuery>,
) -> ApiResult<GeoJson<FeatureCollection>> {
    let config_id = parse_id("mapConfigId", &map_config_id)?;
    let group_id = parse_id("groupId", &group_id)?;
    let layer_id = parse_id("collectionId", &collection_id)?;

    let raw_bbox = query
        .bbox
        .ok_or_else(|| ApiError::bad_request("Missing Bounding Box", "the bbox parameter is required"))?;
    let bbox = raw_bbox
        .parse::<BoundingBox>()
        .map_err(|e| ApiError::bad_request("Invalid Bounding Box", e.to_string()))?;

    debug!(%config_id, %group_id, %layer_id, %bbox, "fetching features");

    let layer = find_layer(&state, config_id, layer_id).await?;
    if layer.layer_group_id != group_id {
        return Err(ApiError::not_found(
            "Could Not Find Layer",
            format!("layer {layer_id} is not in group {group_id}"),
        ));
    }

    let outcome = state
        .engine
        .get_feature_collection(&layer.name, &layer.feature_columns(), bbox, "")
        .await?;
    let collection = require(outcome, "Could Not Find Features", || {
        format!("no features of collection {layer_id} intersect {bbox}")
    })?;

    debug!(%layer_id, features = collection.len(), "features found");
    Ok(GeoJson(collection))
}

/// One feature of a layer, by the value of its feature-id column.
#[utoipa::path(
    get,
    path = "/api/v1/configurations/{mapConfigId}/collections/{collectionId}/items/{featureId}",
    tag = "features",
    params(
        ("mapConfigId" = String, Path, description = "Map configuration id"),
        ("collectionId" = String, Path, description = "Layer id"),
        ("featureId" = String, Path, description = "Feature id")
    ),
    responses(
        (status = 200, description = "GeoJSON feature", content_type = "application/geo+json", body = serde_json::Value),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Unknown layer or feature", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn feature_handler(
    State(state): State<AppState>,
    Path((map_config_id, collection_id, feature_id)): Path<(String, String, String)>,
) -> ApiResult<GeoJson<Feature>> {
    let config_id = parse_id("mapConfigId", &map_config_id)?;
    let layer_id = parse_id("collectionId", &collection_id)?;

    let layer = find_layer(&state, config_id, layer_id).await?;
    let outcome = state.engine.get_feature(&layer.name, &feature_id).await?;
    let feature = require(outcome, "Feature Not Found", || {
        format!("could not find feature {feature_id:?} in collection {layer_id}")
    })?;

    Ok(GeoJson(feature))
}
