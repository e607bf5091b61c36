//! Asset features core: map configuration model, style-rule condition forests,
//! GeoJSON features and the store error taxonomy.

pub mod conditions;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod lookup;
pub mod map_config;

pub use conditions::build_forest;
pub use error::StoreError;
pub use feature::{split_row, Feature, FeatureCollection, Row, RowSplitError, GEOMETRY_JSON_COLUMN};
pub use geometry::{
    BboxParseError, BoundingBox, Geometry, Position, BRITISH_NATIONAL_GRID,
    BRITISH_NATIONAL_GRID_URI,
};
pub use lookup::Lookup;
pub use map_config::{
    parse_match_values, AttributeGroup, DisplayName, Layer, LayerAttribute, LayerGroup, MapConfiguration,
    MapConfigurationHeader, MapView, Style, StyleFill, StyleMarker, StyleRule, StyleRuleCondition,
    StyleStroke,
};

