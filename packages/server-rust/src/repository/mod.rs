//! Per-entity repositories over configured stored functions.
//!
//! Every repository resolves a logical key through the [`FunctionMap`],
//! calls the [`ProcedureStore`], and decodes the JSON rows into typed row
//! structs before converting them into the domain model.
//!
//! Lookups by id return [`Lookup<T>`]; list lookups return
//! [`Lookup<Vec<T>>`] where an empty list counts as not found.
//!
//! [`FunctionMap`]: crate::storage::FunctionMap

pub mod attribute;
pub mod attribute_group;
pub mod layer;
pub mod layer_group;
pub mod map_config;
pub mod map_view;
pub mod style;
pub mod style_rule;

use std::sync::Arc;

use asset_features_core::{DisplayName, Lookup, Row, StoreError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, Instrument};

use crate::config::DatabaseConfig;
use crate::traits::{ProcArg, ProcedureStore};

pub use attribute::AttributeRepository;
pub use attribute_group::AttributeGroupRepository;
pub use layer::LayerRepository;
pub use layer_group::LayerGroupRepository;
pub use map_config::MapConfigRepository;
pub use map_view::MapViewRepository;
pub use style::StyleRepository;
pub use style_rule::StyleRuleRepository;

/// Logical stored-function keys.
pub mod keys {
    pub const GET_MAP_CONFIGS: &str = "GetMapConfigs";
    pub const GET_MAP_CONFIG_BY_ID: &str = "GetMapConfigById";
    pub const GET_MAP_VIEW_BY_CONFIG_ID: &str = "GetMapViewByConfigId";
    pub const GET_LAYER_GROUPS_BY_CONFIG_ID: &str = "GetLayerGroupsByConfigId";
    pub const GET_LAYER_GROUP_BY_ID: &str = "GetLayerGroupById";
    pub const GET_CHILD_LAYER_GROUPS_BY_PARENT_ID: &str = "GetChildLayerGroupsByParentId";
    pub const GET_LAYERS_BY_GROUP_ID: &str = "GetLayersByGroupId";
    pub const GET_LAYERS_BY_MAP_CONFIG_ID: &str = "GetLayersByMapConfigId";
    pub const GET_LAYER_BY_MAP_CONFIG_ID_AND_LAYER_ID: &str = "GetLayerByMapConfigIdAndLayerId";
    pub const GET_SOURCE_PROPERTIES_BY_LAYER_ID: &str = "GetSourcePropertiesByLayerId";
    pub const GET_ALL_ATTRIBUTES: &str = "GetAllAttributes";
    pub const GET_ATTRIBUTES_BY_LAYER_ID: &str = "GetAttributesByLayerId";
    pub const GET_QUERYABLE_ATTRIBUTES_BY_LAYER_ID: &str = "GetQueryableAttributesByLayerId";
    pub const GET_ALL_ATTRIBUTE_GROUPS: &str = "GetAllAttributeGroups";
    pub const GET_ATTRIBUTE_GROUPS_BY_MAP_CONFIGURATION_ID: &str =
        "GetAttributeGroupsByMapConfigurationId";
    pub const GET_ATTRIBUTE_GROUP_BY_ID: &str = "GetAttributeGroupById";
    pub const GET_ALL_STYLES: &str = "GetAllStyles";
    pub const GET_STYLE_BY_ID: &str = "GetStyleById";
    pub const GET_STYLES_BY_MAP_CONFIG_ID: &str = "GetStylesByMapConfigId";
    pub const GET_ALL_STYLE_RULES: &str = "GetAllStyleRules";
    pub const GET_STYLE_RULES_BY_LAYER_ID: &str = "GetStyleRulesByLayerId";
    pub const GET_STYLE_RULE_BY_ID: &str = "GetStyleRuleById";
    pub const GET_STYLE_RULE_CONDITIONS_BY_RULE_ID: &str = "GetStyleRuleConditionsByRuleId";
}

/// Shared call path for every repository: key resolution, the store call,
/// and row decoding.
#[derive(Clone)]
pub struct ProcedureCaller {
    store: Arc<dyn ProcedureStore>,
    config: DatabaseConfig,
}

impl ProcedureCaller {
    #[must_use]
    pub fn new(store: Arc<dyn ProcedureStore>, config: DatabaseConfig) -> Self {
        Self { store, config }
    }

    /// Calls the function configured for `key` and returns its raw rows.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingProcedure`] when `key` is unmapped, otherwise
    /// whatever the store reports.
    pub async fn raw(&self, key: &str, args: &[ProcArg]) -> Result<Vec<Row>, StoreError> {
        let function = self.config.functions.resolve(key)?;
        let span = tracing::debug_span!("procedure", operation = key, function);
        let rows = self
            .store
            .call(&self.config.schema, function, args)
            .instrument(span)
            .await?;
        debug!(operation = key, rows = rows.len(), "procedure returned");
        Ok(rows)
    }

    /// Calls `key` and decodes every row into `R`.
    ///
    /// # Errors
    ///
    /// As [`raw`](Self::raw), plus [`StoreError::Decode`] for rows that do
    /// not fit `R`.
    pub async fn rows<R: DeserializeOwned>(
        &self,
        key: &str,
        args: &[ProcArg],
    ) -> Result<Vec<R>, StoreError> {
        self.raw(key, args)
            .await?
            .into_iter()
            .map(|row| decode_row(key, row))
            .collect()
    }

    /// Calls `key` and decodes only the first row.
    ///
    /// # Errors
    ///
    /// As [`rows`](Self::rows).
    pub async fn first<R: DeserializeOwned>(
        &self,
        key: &str,
        args: &[ProcArg],
    ) -> Result<Option<R>, StoreError> {
        self.raw(key, args)
            .await?
            .into_iter()
            .next()
            .map(|row| decode_row(key, row))
            .transpose()
    }

    /// List lookup: decodes rows into `R`, converts each into `T`, and maps
    /// an empty result to [`Lookup::NotFound`].
    ///
    /// # Errors
    ///
    /// Only non-transient faults; see [`Lookup::from_store`].
    pub async fn list<R, T>(&self, key: &str, args: &[ProcArg]) -> Result<Lookup<Vec<T>>, StoreError>
    where
        R: DeserializeOwned + Into<T>,
    {
        let result = self
            .rows::<R>(key, args)
            .await
            .map(|rows| Some(rows.into_iter().map(Into::into).collect::<Vec<T>>()));
        Ok(collapse_empty(Lookup::from_store(key, result)?))
    }

    /// Single lookup: decodes the first row into `R` and converts it.
    ///
    /// # Errors
    ///
    /// Only non-transient faults; see [`Lookup::from_store`].
    pub async fn single<R, T>(&self, key: &str, args: &[ProcArg]) -> Result<Lookup<T>, StoreError>
    where
        R: DeserializeOwned + Into<T>,
    {
        let result = self.first::<R>(key, args).await.map(|row| row.map(Into::into));
        Lookup::from_store(key, result)
    }
}

fn decode_row<R: DeserializeOwned>(operation: &str, row: Row) -> Result<R, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::decode(operation, e))
}

/// Collapses a found-but-empty list into not found.
fn collapse_empty<T>(lookup: Lookup<Vec<T>>) -> Lookup<Vec<T>> {
    match lookup {
        Lookup::Found(items) => Lookup::from_list(items),
        other => other,
    }
}

/// Treats empty strings as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Builds a bilingual name, using `fallback` when the English name is null.
pub(crate) fn display_name(eng: Option<String>, cym: Option<String>, fallback: &str) -> DisplayName {
    DisplayName::new(
        eng.unwrap_or_else(|| fallback.to_string()),
        non_empty(cym),
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::{caller, function_name, row};
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::{FunctionMap, MemoryStore};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct NameRow {
        name: String,
    }

    impl From<NameRow> for String {
        fn from(row: NameRow) -> Self {
            row.name
        }
    }

    #[tokio::test]
    async fn list_of_nothing_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let outcome = caller(&store)
            .list::<NameRow, String>(keys::GET_ALL_STYLES, &[])
            .await
            .unwrap();
        assert_eq!(outcome, Lookup::NotFound);
    }

    #[tokio::test]
    async fn list_decodes_rows_in_order() {
        let store = Arc::new(MemoryStore::new());
        store.set_rows(
            &function_name(keys::GET_ALL_STYLES),
            &[],
            vec![row(json!({"name": "a"})), row(json!({"name": "b"}))],
        );
        let outcome = caller(&store)
            .list::<NameRow, String>(keys::GET_ALL_STYLES, &[])
            .await
            .unwrap();
        assert_eq!(outcome, Lookup::Found(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test]
    async fn undecodable_row_is_unavailable() {
        let store = Arc::new(MemoryStore::new());
        store.set_rows(
            &function_name(keys::GET_ALL_STYLES),
            &[],
            vec![row(json!({"name": 42}))],
        );
        let outcome = caller(&store)
            .single::<NameRow, String>(keys::GET_ALL_STYLES, &[])
            .await
            .unwrap();
        assert!(matches!(outcome, Lookup::Unavailable(_)));
    }

    #[tokio::test]
    async fn unmapped_key_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let bare = ProcedureCaller::new(
            store,
            DatabaseConfig {
                schema: "map_config".to_string(),
                functions: FunctionMap::new(),
            },
        );
        let err = bare
            .list::<NameRow, String>(keys::GET_ALL_STYLES, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingProcedure { .. }));
    }

    #[test]
    fn non_empty_drops_blank_placeholders() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("#fff".into())), Some("#fff".into()));
        assert_eq!(non_empty(None), None);
    }
}
