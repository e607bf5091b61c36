//! GeoJSON geometry values and the bounding-box filter type.
//!
//! All coordinates are planar British National Grid (EPSG:27700). Nothing in
//! this crate reprojects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// EPSG code of the only coordinate reference system the service speaks.
pub const BRITISH_NATIONAL_GRID: i32 = 27700;

/// OGC URI for [`BRITISH_NATIONAL_GRID`].
pub const BRITISH_NATIONAL_GRID_URI: &str = "http://www.opengis.net/def/crs/EPSG/0/27700";

/// A GeoJSON position: `[x, y]` with an optional trailing `z`.
pub type Position = Vec<f64>;

/// GeoJSON geometry object.
///
/// Only the seven RFC 7946 geometry types are accepted. Foreign members such
/// as the `crs` object PostGIS adds for non-WGS84 output are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPoint { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Returns the geometry's envelope, or `None` for an empty geometry.
    #[must_use]
    pub fn envelope(&self) -> Option<BoundingBox> {
        let mut envelope: Option<BoundingBox> = None;
        self.visit_positions(&mut |p| {
            if let [x, y, ..] = *p {
                envelope = Some(match envelope {
                    Some(b) => b.expand_to(x, y),
                    None => BoundingBox::point(x, y),
                });
            }
        });
        envelope
    }

    fn visit_positions(&self, f: &mut impl FnMut(&[f64])) {
        match self {
            Self::Point { coordinates } => f(coordinates),
            Self::LineString { coordinates } | Self::MultiPoint { coordinates } => {
                coordinates.iter().for_each(|p| f(p));
            }
            Self::Polygon { coordinates } | Self::MultiLineString { coordinates } => {
                coordinates.iter().flatten().for_each(|p| f(p));
            }
            Self::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(|p| f(p));
            }
            Self::GeometryCollection { geometries } => {
                for g in geometries {
                    g.visit_positions(f);
                }
            }
        }
    }
}

/// Axis-aligned rectangle `(min_x, min_y, max_x, max_y)`.
///
/// Serializes as the GeoJSON `bbox` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", from = "[f64; 4]")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    fn expand_to(self, x: f64, y: f64) -> Self {
        Self::new(
            self.min_x.min(x),
            self.min_y.min(y),
            self.max_x.max(x),
            self.max_y.max(y),
        )
    }

    /// Envelope overlap test, boundaries inclusive (PostGIS `&&`).
    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Returns `true` when `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Errors from parsing a `minX,minY,maxX,maxY` filter literal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxParseError {
    #[error("bbox must have exactly 4 comma-separated values, found {found}")]
    WrongArity { found: usize },
    #[error("bbox value {value:?} is not a finite number")]
    InvalidNumber { value: String },
    #[error("bbox minimum exceeds maximum")]
    Inverted,
}

impl FromStr for BoundingBox {
    type Err = BboxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::WrongArity { found: parts.len() });
        }

        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| BboxParseError::InvalidNumber {
                    value: (*part).to_string(),
                })?;
        }

        let bbox = BoundingBox::from(values);
        if bbox.min_x > bbox.max_x || bbox.min_y > bbox.max_y {
            return Err(BboxParseError::Inverted);
        }
        Ok(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bbox_with_whitespace() {
        let bbox: BoundingBox = " 0, 0 ,100,  100.5".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 100.0, 100.5));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert_eq!(
            "1,2,3".parse::<BoundingBox>(),
            Err(BboxParseError::WrongArity { found: 3 })
        );
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_eq!(
            "1,2,x,4".parse::<BoundingBox>(),
            Err(BboxParseError::InvalidNumber {
                value: "x".to_string()
            })
        );
        assert!("1,2,NaN,4".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn rejects_inverted_box() {
        assert_eq!(
            "10,0,0,10".parse::<BoundingBox>(),
            Err(BboxParseError::Inverted)
        );
    }

    #[test]
    fn bbox_serializes_as_array() {
        let bbox = BoundingBox::new(0.0, 1.0, 2.0, 3.0);
        assert_eq!(serde_json::to_value(bbox).unwrap(), json!([0.0, 1.0, 2.0, 3.0]));
    }

    #[test]
    fn intersects_is_boundary_inclusive() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&BoundingBox::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!a.intersects(&BoundingBox::new(10.1, 0.0, 20.0, 5.0)));
    }

    #[test]
    fn parses_postgis_geojson_with_crs_member() {
        let raw = r#"{"type":"Point","crs":{"type":"name","properties":{"name":"EPSG:27700"}},"coordinates":[50,50]}"#;
        let geom: Geometry = serde_json::from_str(raw).unwrap();
        assert_eq!(
            geom,
            Geometry::Point {
                coordinates: vec![50.0, 50.0]
            }
        );
    }

    #[test]
    fn rejects_unknown_geometry_type() {
        let raw = r#"{"type":"CircularString","coordinates":[[0,0],[1,1]]}"#;
        assert!(serde_json::from_str::<Geometry>(raw).is_err());
    }

    #[test]
    fn envelope_of_polygon() {
        let geom = Geometry::Polygon {
            coordinates: vec![vec![
                vec![0.0, 0.0],
                vec![4.0, 0.0],
                vec![4.0, 3.0],
                vec![0.0, 0.0],
            ]],
        };
        assert_eq!(geom.envelope(), Some(BoundingBox::new(0.0, 0.0, 4.0, 3.0)));
    }

    #[test]
    fn envelope_of_empty_collection_is_none() {
        let geom = Geometry::GeometryCollection { geometries: vec![] };
        assert_eq!(geom.envelope(), None);
    }
}
