//! Feature query description and its SQL rendering.
//!
//! Identifiers are interpolated (after catalog validation by the caller) and
//! quoted one at a time; values are always bound as parameters.

use std::fmt::Write as _;

use asset_features_core::{BoundingBox, BRITISH_NATIONAL_GRID, GEOMETRY_JSON_COLUMN};

/// Row filter of a [`FeatureQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureFilter {
    /// Equality on the feature-id column, compared as text.
    ById { column: String, value: String },
    /// Envelope overlap with `bbox`, geometry clipped to it. `extra` is a
    /// trusted SQL predicate ANDed onto the filter.
    Within {
        bbox: BoundingBox,
        extra: Option<String>,
    },
}

/// A bound parameter of a rendered query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Float(f64),
}

/// A query against one geometry-bearing table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    pub schema: String,
    pub table: String,
    pub geometry_column: String,
    /// Attribute columns to project, unquoted. Never contains the geometry
    /// column.
    pub columns: Vec<String>,
    pub filter: FeatureFilter,
}

impl FeatureQuery {
    /// Renders the query as PostGIS SQL plus its positional parameters.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlParam>) {
        let geometry = quote_ident(&self.geometry_column);
        let from = format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table));

        let mut sql = String::from("SELECT ");
        for column in &self.columns {
            let _ = write!(sql, "{}, ", quote_ident(column));
        }

        match &self.filter {
            FeatureFilter::ById { column, value } => {
                let _ = write!(
                    sql,
                    "ST_AsGeoJSON({geometry}) AS {GEOMETRY_JSON_COLUMN} FROM {from} WHERE {}::text = $1",
                    quote_ident(column),
                );
                (sql, vec![SqlParam::Text(value.clone())])
            }
            FeatureFilter::Within { bbox, extra } => {
                let envelope = format!("ST_MakeEnvelope($1, $2, $3, $4, {BRITISH_NATIONAL_GRID})");
                let _ = write!(
                    sql,
                    "ST_AsGeoJSON(ST_Intersection({geometry}, {envelope})) AS {GEOMETRY_JSON_COLUMN} \
                     FROM {from} WHERE {geometry} && {envelope}",
                );
                if let Some(extra) = extra.as_deref().filter(|e| !e.trim().is_empty()) {
                    let _ = write!(sql, " AND ({extra})");
                }
                let params = [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
                    .into_iter()
                    .map(SqlParam::Float)
                    .collect();
                (sql, params)
            }
        }
    }
}

/// Quotes a single SQL identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
