//! Styles arrive as one flat row per style. The store pads missing fill,
//! stroke and marker parts with empty strings, which are read back as absent.

use asset_features_core::{Lookup, Style, StyleFill, StyleMarker, StyleStroke, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::{keys, non_empty, ProcedureCaller};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct StyleRow {
    id: Uuid,
    name: Option<String>,
    description: Option<String>,
    primary_geometry_type: Option<String>,
    symbol_name: Option<String>,
    fill_color: Option<String>,
    fill_image_source: Option<String>,
    stroke_color: Option<String>,
    stroke_line_dash: Option<String>,
    stroke_width: Option<f64>,
    marker_symbol_name: Option<String>,
    #[serde(alias = "marker_image _source")]
    marker_image_source: Option<String>,
    marker_fill_color: Option<String>,
    marker_points: Option<i32>,
    marker_radius: Option<f64>,
    marker_angle: Option<f64>,
    marker_stroke_color: Option<String>,
    marker_stroke_width: Option<f64>,
    marker_displacement_x: Option<f64>,
    marker_displacement_y: Option<f64>,
    marker_rotate_with_view: Option<bool>,
    marker_scale: Option<f64>,
    marker_rotation: Option<f64>,
}

impl From<StyleRow> for Style {
    fn from(row: StyleRow) -> Self {
        let image_source = non_empty(row.fill_image_source);
        let displacement = match (row.marker_displacement_x, row.marker_displacement_y) {
            (Some(x), Some(y)) => Some([x, y]),
            _ => None,
        };
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            primary_geometry_type: non_empty(row.primary_geometry_type),
            symbol_name: non_empty(row.symbol_name),
            image_source: image_source.clone(),
            fill: StyleFill {
                fill_color: non_empty(row.fill_color),
                image_source,
            },
            stroke: StyleStroke {
                color: non_empty(row.stroke_color),
                line_dash: non_empty(row.stroke_line_dash),
                width: row.stroke_width,
            },
            marker: StyleMarker {
                symbol_name: non_empty(row.marker_symbol_name),
                image_source: non_empty(row.marker_image_source),
                fill: StyleFill {
                    fill_color: non_empty(row.marker_fill_color),
                    image_source: None,
                },
                points: row.marker_points,
                radius: row.marker_radius,
                angle: row.marker_angle,
                stroke: StyleStroke {
                    color: non_empty(row.marker_stroke_color),
                    line_dash: None,
                    width: row.marker_stroke_width,
                },
                displacement,
                rotate_with_view: row.marker_rotate_with_view,
                scale: row.marker_scale,
                rotation: row.marker_rotation,
            },
        }
    }
}

#[derive(Clone)]
pub struct StyleRepository {
    caller: ProcedureCaller,
}

impl StyleRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_all(&self) -> Result<Lookup<Vec<Style>>, StoreError> {
        self.caller
            .list::<StyleRow, Style>(keys::GET_ALL_STYLES, &[])
            .await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Lookup<Style>, StoreError> {
        self.caller
            .single::<StyleRow, Style>(keys::GET_STYLE_BY_ID, &[ProcArg::Uuid(id)])
            .await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_config_id(&self, config_id: Uuid) -> Result<Lookup<Vec<Style>>, StoreError> {
        self.caller
            .list::<StyleRow, Style>(keys::GET_STYLES_BY_MAP_CONFIG_ID, &[ProcArg::Uuid(config_id)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::repository::test_support::{caller, function_name, row};
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn blank_placeholders_become_absent() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store.set_rows(
            &function_name(keys::GET_STYLE_BY_ID),
            &[ProcArg::Uuid(id)],
            vec![row(json!({
                "id": id,
                "name": "valve",
                "primary_geometry_type": "Point",
                "fill_color": "",
                "stroke_color": "",
                "stroke_width": 2.5,
                "marker_image_source": "",
                "marker_radius": 6,
            }))],
        );

        let repo = StyleRepository::new(caller(&store));
        let Lookup::Found(style) = repo.get_by_id(id).await.unwrap() else {
            panic!("expected a style");
        };

        assert_eq!(style.fill.fill_color, None);
        assert_eq!(style.stroke.color, None);
        assert_eq!(style.stroke.width, Some(2.5));
        assert_eq!(style.marker.image_source, None);
        assert_eq!(style.marker.radius, Some(6.0));
        assert_eq!(style.marker.displacement, None);
    }

    #[tokio::test]
    async fn marker_parts_are_nested() {
        let store = Arc::new(MemoryStore::new());
        let config_id = Uuid::new_v4();
        store.set_rows(
            &function_name(keys::GET_STYLES_BY_MAP_CONFIG_ID),
            &[ProcArg::Uuid(config_id)],
            vec![row(json!({
                "id": Uuid::new_v4(),
                "fill_color": "#00ff00",
                "fill_image_source": "hatch.png",
                "marker_symbol_name": "circle",
                "marker_image _source": "valve.svg",
                "marker_fill_color": "#0000ff",
                "marker_stroke_color": "#000000",
                "marker_stroke_width": 1,
                "marker_displacement_x": 0,
                "marker_displacement_y": 4,
                "marker_rotate_with_view": true,
            }))],
        );

        let repo = StyleRepository::new(caller(&store));
        let styles = repo.get_by_config_id(config_id).await.unwrap().unwrap_or_empty();
        let style = &styles[0];

        assert_eq!(style.fill.fill_color.as_deref(), Some("#00ff00"));
        assert_eq!(style.image_source.as_deref(), Some("hatch.png"));
        assert_eq!(style.marker.image_source.as_deref(), Some("valve.svg"));
        assert_eq!(style.marker.fill.fill_color.as_deref(), Some("#0000ff"));
        assert_eq!(style.marker.stroke.width, Some(1.0));
        assert_eq!(style.marker.displacement, Some([0.0, 4.0]));
        assert_eq!(style.marker.rotate_with_view, Some(true));
    }
}
