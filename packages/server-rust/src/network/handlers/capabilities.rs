//! Landing page, conformance and collection discovery.
//!
//! A collection is either a layer group (a container of further
//! collections) or a layer (a feature table). Collection ids are the
//! group or layer UUIDs.

use std::collections::BTreeMap;

use asset_features_core::{Layer, LayerGroup, Lookup, BRITISH_NATIONAL_GRID_URI};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{parse_id, AppState};
use crate::network::error::{require, ApiError, ApiResult, ErrorResponse};

const JSON: &str = "application/json";
const GEO_JSON: &str = "application/geo+json";
const OPENAPI_JSON: &str = "application/vnd.oai.openapi+json;version=3.0";

/// Conformance classes this API implements.
pub const CONFORMANCE_CLASSES: [&str; 3] = [
    "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core",
    "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson",
    "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/oas30",
];

/// Extent advertised for every feature collection: the whole national grid.
const NATIONAL_GRID_EXTENT: [f64; 4] = [0.0, 0.0, 700_000.0, 1_300_000.0];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub title: String,
}

impl Link {
    fn new(
        href: impl Into<String>,
        rel: &str,
        media_type: &str,
        title: impl Into<String>,
    ) -> Self {
        Self {
            href: href.into(),
            rel: rel.to_string(),
            media_type: media_type.to_string(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LandingPage {
    pub title: String,
    pub description: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conformance {
    pub conforms_to: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<f64>>)]
    pub spatial_extent: Option<[f64; 4]>,
    #[serde(rename = "crs", skip_serializing_if = "Option::is_none")]
    pub coordinate_reference_systems: Option<Vec<String>>,
    /// `feature` for layers, `collection` for layer groups.
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_templates: Option<Vec<Link>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Collections {
    pub links: Vec<Link>,
    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Queryable {
    pub title: String,
    /// SQL data type of the backing column, when the table reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Queryable properties of one layer, keyed by column name.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Queryables {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub title: String,
    pub properties: BTreeMap<String, Queryable>,
}

fn collections_href(config_id: Uuid) -> String {
    format!("/api/v1/{config_id}/collections")
}

fn collection_href(config_id: Uuid, collection_id: Uuid) -> String {
    format!("/api/v1/{config_id}/collections/{collection_id}")
}

fn items_href(config_id: Uuid, layer: &Layer) -> String {
    format!(
        "/api/v1/configurations/{config_id}/groups/{}/collections/{}/items",
        layer.layer_group_id, layer.id
    )
}

fn group_collection(config_id: Uuid, group: &LayerGroup) -> Collection {
    Collection {
        id: group.id,
        title: group.display_name.en.clone(),
        description: group.display_name.en.clone(),
        links: vec![Link::new(
            collection_href(config_id, group.id),
            "self",
            JSON,
            "this document",
        )],
        spatial_extent: None,
        coordinate_reference_systems: None,
        item_type: "collection".to_string(),
        link_templates: None,
    }
}

fn layer_collection(config_id: Uuid, layer: &Layer, has_table: bool) -> Collection {
    let self_href = collection_href(config_id, layer.id);
    let mut links = vec![
        Link::new(self_href.clone(), "self", JSON, "this document"),
        Link::new(
            format!("{self_href}/queryables"),
            "ogc-rel:queryables",
            JSON,
            "queryable properties",
        ),
    ];
    let mut link_templates = None;
    if has_table {
        links.push(Link::new(
            items_href(config_id, layer),
            "items",
            GEO_JSON,
            layer.display_name.en.clone(),
        ));
        link_templates = Some(vec![Link::new(
            format!(
                "/api/v1/configurations/{config_id}/collections/{}/items/{{featureId}}",
                layer.id
            ),
            "item",
            GEO_JSON,
            layer.display_name.en.clone(),
        )]);
    }

    Collection {
        id: layer.id,
        title: layer.display_name.en.clone(),
        description: layer.description.clone().unwrap_or_else(|| layer.display_name.en.clone()),
        links,
        spatial_extent: Some(NATIONAL_GRID_EXTENT),
        coordinate_reference_systems: Some(vec![BRITISH_NATIONAL_GRID_URI.to_string()]),
        item_type: "feature".to_string(),
        link_templates,
    }
}

/// Tables that exist in the feature schema, or `None` when the listing is
/// empty and therefore says nothing.
async fn known_tables(state: &AppState) -> ApiResult<Option<Vec<String>>> {
    let tables = state
        .tables
        .get_all_tables(&state.engine.config().schema)
        .await?;
    Ok(Some(tables).filter(|t| !t.is_empty()))
}

fn has_table(known: Option<&Vec<String>>, layer: &Layer) -> bool {
    known.is_none_or(|tables| tables.iter().any(|t| *t == layer.name))
}

/// Landing page with links to the API definition, conformance and every map
/// configuration's collections.
#[utoipa::path(
    get,
    path = "/api/v1",
    tag = "capabilities",
    responses(
        (status = 200, description = "Landing page", body = LandingPage),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
pub async fn landing_handler(State(state): State<AppState>) -> ApiResult<Json<LandingPage>> {
    let mut links = vec![
        Link::new("/api/v1", "self", JSON, "This document"),
        Link::new("/openapi/v1.json", "service-desc", OPENAPI_JSON, "The API Definition"),
        Link::new(
            "/api/v1/conformance",
            "conformance",
            JSON,
            "OGC API conformance classes implemented by this server",
        ),
    ];

    let configs = state.assembler.configs().get_all().await?;
    if let Lookup::Unavailable(detail) = &configs {
        warn!(%detail, "landing page built without map configurations");
    }
    links.extend(configs.unwrap_or_empty().into_iter().map(|config| {
        Link::new(
            collections_href(config.id),
            "data",
            JSON,
            config.name.unwrap_or_default(),
        )
    }));

    Ok(Json(LandingPage {
        title: "Asset Feature Service".to_string(),
        description: "OGC API Features style access to asset data and map configurations."
            .to_string(),
        links,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/conformance",
    tag = "capabilities",
    responses((status = 200, description = "Implemented conformance classes", body = Conformance))
)]
pub async fn conformance_handler() -> Json<Conformance> {
    Json(Conformance {
        conforms_to: CONFORMANCE_CLASSES.iter().map(ToString::to_string).collect(),
    })
}

/// Every layer group of a map configuration, as collections.
#[utoipa::path(
    get,
    path = "/api/v1/{mapConfigId}/collections",
    tag = "capabilities",
    params(("mapConfigId" = String, Path, description = "Map configuration id")),
    responses(
        (status = 200, description = "Collections", body = Collections),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No layer groups", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn collections_handler(
    State(state): State<AppState>,
    Path(map_config_id): Path<String>,
) -> ApiResult<Json<Collections>> {
    let config_id = parse_id("mapConfigId", &map_config_id)?;
    info!(%config_id, "listing layer groups as collections");

    let mut groups = require(
        state.assembler.groups().get_by_config_id(config_id).await?,
        "No Collections Found",
        || format!("could not find collections for map configuration {config_id}"),
    )?;
    groups.sort_by_key(|g| g.display_order);

    Ok(Json(Collections {
        links: vec![Link::new(
            collections_href(config_id),
            "self",
            JSON,
            "this document",
        )],
        collections: groups
            .iter()
            .map(|group| group_collection(config_id, group))
            .collect(),
    }))
}

/// One collection: a layer when the id names one, otherwise a layer group.
#[utoipa::path(
    get,
    path = "/api/v1/{mapConfigId}/collections/{collectionId}",
    tag = "capabilities",
    params(
        ("mapConfigId" = String, Path, description = "Map configuration id"),
        ("collectionId" = String, Path, description = "Layer or layer group id")
    ),
    responses(
        (status = 200, description = "Collection", body = Collection),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Neither a layer nor a layer group", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn collection_handler(
    State(state): State<AppState>,
    Path((map_config_id, collection_id)): Path<(String, String)>,
) -> ApiResult<Json<Collection>> {
    let config_id = parse_id("mapConfigId", &map_config_id)?;
    let collection_id = parse_id("collectionId", &collection_id)?;
    debug!(%config_id, %collection_id, "resolving collection");

    let layer = state
        .assembler
        .layers()
        .get_by_config_and_layer_id(config_id, collection_id)
        .await?;
    if let Lookup::Found(layer) = &layer {
        let known = known_tables(&state).await?;
        return Ok(Json(layer_collection(
            config_id,
            layer,
            has_table(known.as_ref(), layer),
        )));
    }

    let group = match state.assembler.groups().get_by_id(config_id, collection_id).await? {
        Lookup::Found(group) => group,
        Lookup::Unavailable(detail) => return Err(ApiError::Unavailable(detail)),
        Lookup::NotFound => {
            if let Lookup::Unavailable(detail) = layer {
                return Err(ApiError::Unavailable(detail));
            }
            return Err(ApiError::not_found(
                "No Collection Found",
                format!(
                    "could not find collection {collection_id} in map configuration {config_id}"
                ),
            ));
        }
    };

    let mut collection = group_collection(config_id, &group);
    if group.has_children {
        let children = state.assembler.groups().get_children(group.id).await?;
        collection.links.extend(children.unwrap_or_empty().iter().map(|child| {
            Link::new(
                collection_href(config_id, child.id),
                "data",
                JSON,
                child.display_name.en.clone(),
            )
        }));
    }

    let layers = state
        .assembler
        .layers()
        .get_by_group_id(group.id)
        .await?
        .unwrap_or_empty();
    if !layers.is_empty() {
        let known = known_tables(&state).await?;
        collection.links.extend(
            layers
                .iter()
                .filter(|layer| has_table(known.as_ref(), layer))
                .map(|layer| {
                    Link::new(
                        items_href(config_id, layer),
                        "items",
                        GEO_JSON,
                        layer.display_name.en.clone(),
                    )
                }),
        );
    }

    Ok(Json(collection))
}

/// Queryable attributes of a layer with their column data types.
#[utoipa::path(
    get,
    path = "/api/v1/{mapConfigId}/collections/{collectionId}/queryables",
    tag = "capabilities",
    params(
        ("mapConfigId" = String, Path, description = "Map configuration id"),
        ("collectionId" = String, Path, description = "Layer id")
    ),
    responses(
        (status = 200, description = "Queryable properties", body = Queryables),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Unknown layer", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    )
)]
pub async fn queryables_handler(
    State(state): State<AppState>,
    Path((map_config_id, collection_id)): Path<(String, String)>,
) -> ApiResult<Json<Queryables>> {
    let config_id = parse_id("mapConfigId", &map_config_id)?;
    let layer_id = parse_id("collectionId", &collection_id)?;

    let layer = require(
        state
            .assembler
            .layers()
            .get_by_config_and_layer_id(config_id, layer_id)
            .await?,
        "Could Not Find Layer",
        || format!("could not find layer {layer_id} in map configuration {config_id}"),
    )?;

    let attributes = state
        .assembler
        .attributes()
        .get_queryable_by_layer_id(layer.id)
        .await?
        .unwrap_or_empty();
    let types = state
        .engine
        .feature_data_types(&layer.name)
        .await?
        .into_option()
        .unwrap_or_default();

    let properties = attributes
        .into_iter()
        .map(|attribute| {
            let data_type = types.get(&attribute.attribute_name).cloned();
            (
                attribute.attribute_name,
                Queryable {
                    title: attribute.display_name.en,
                    data_type,
                },
            )
        })
        .collect();

    Ok(Json(Queryables {
        schema_type: "object".to_string(),
        title: layer.display_name.en,
        properties,
    }))
}
