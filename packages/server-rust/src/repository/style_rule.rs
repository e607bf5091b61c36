use asset_features_core::{
    build_forest, parse_match_values, Lookup, StoreError, StyleRule, StyleRuleCondition,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{display_name, keys, non_empty, ProcedureCaller};
use crate::traits::ProcArg;

#[derive(Debug, Deserialize)]
struct StyleRuleRow {
    id: Uuid,
    layer_id: Uuid,
    map_mode: Option<String>,
    evaluation_priority: Option<i32>,
    legend_display_name_en: Option<String>,
    legend_display_name_cy: Option<String>,
    legend_geometry_type: Option<String>,
    legend_display_order: Option<i32>,
    attribute: Option<String>,
    attribute_values_to_match: Option<String>,
    style_id: Uuid,
    style_selected_id: Option<Uuid>,
    rotation_property_name: Option<String>,
    rotation_units_property_name: Option<String>,
}

impl From<StyleRuleRow> for StyleRule {
    fn from(row: StyleRuleRow) -> Self {
        Self {
            id: row.id,
            layer_id: row.layer_id,
            map_mode: row.map_mode.unwrap_or_default(),
            evaluation_priority: row.evaluation_priority,
            legend_display_name: display_name(
                row.legend_display_name_en,
                row.legend_display_name_cy,
                "",
            ),
            legend_geometry_type: non_empty(row.legend_geometry_type),
            legend_display_order: row.legend_display_order,
            attribute: non_empty(row.attribute),
            attribute_values_to_match: parse_match_values(row.attribute_values_to_match.as_deref()),
            style_id: row.style_id,
            style_selected_id: row.style_selected_id,
            rotation_property_name: non_empty(row.rotation_property_name),
            rotation_units_property_name: non_empty(row.rotation_units_property_name),
            conditions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConditionRow {
    id: Uuid,
    style_rule_id: Uuid,
    parent_condition_id: Option<Uuid>,
    field: Option<String>,
    operator: Option<String>,
    value: Option<String>,
}

impl From<ConditionRow> for StyleRuleCondition {
    fn from(row: ConditionRow) -> Self {
        Self {
            id: row.id,
            style_rule_id: row.style_rule_id,
            // A null parent marks a root, same as the nil sentinel.
            parent_condition_id: row.parent_condition_id.unwrap_or_default(),
            field: row.field,
            operator: row.operator,
            value: row.value,
            conditions: None,
        }
    }
}

/// Style rules, each hydrated with its condition forest.
#[derive(Clone)]
pub struct StyleRuleRepository {
    caller: ProcedureCaller,
}

impl StyleRuleRepository {
    #[must_use]
    pub fn new(caller: ProcedureCaller) -> Self {
        Self { caller }
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_all(&self) -> Result<Lookup<Vec<StyleRule>>, StoreError> {
        let rules = self
            .caller
            .list::<StyleRuleRow, StyleRule>(keys::GET_ALL_STYLE_RULES, &[])
            .await?;
        self.hydrate_all(rules).await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_layer_id(&self, layer_id: Uuid) -> Result<Lookup<Vec<StyleRule>>, StoreError> {
        let rules = self
            .caller
            .list::<StyleRuleRow, StyleRule>(
                keys::GET_STYLE_RULES_BY_LAYER_ID,
                &[ProcArg::Uuid(layer_id)],
            )
            .await?;
        self.hydrate_all(rules).await
    }

    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Lookup<StyleRule>, StoreError> {
        match self
            .caller
            .single::<StyleRuleRow, StyleRule>(keys::GET_STYLE_RULE_BY_ID, &[ProcArg::Uuid(id)])
            .await?
        {
            Lookup::Found(mut rule) => {
                rule.conditions = self.conditions(rule.id).await?;
                Ok(Lookup::Found(rule))
            }
            other => Ok(other),
        }
    }

    /// The condition forest of one rule. Unavailable conditions yield an
    /// empty forest.
    ///
    /// # Errors
    ///
    /// Fatal store faults only.
    pub async fn conditions(&self, rule_id: Uuid) -> Result<Vec<StyleRuleCondition>, StoreError> {
        let flat = self
            .caller
            .list::<ConditionRow, StyleRuleCondition>(
                keys::GET_STYLE_RULE_CONDITIONS_BY_RULE_ID,
                &[ProcArg::Uuid(rule_id)],
            )
            .await?
            .unwrap_or_empty();
        Ok(build_forest(flat))
    }

    async fn hydrate_all(
        &self,
        rules: Lookup<Vec<StyleRule>>,
    ) -> Result<Lookup<Vec<StyleRule>>, StoreError> {
        let Lookup::Found(mut rules) = rules else {
            return Ok(rules);
        };
        for rule in &mut rules {
            rule.conditions = self.conditions(rule.id).await?;
        }
        Ok(Lookup::Found(rules))
    }
}
