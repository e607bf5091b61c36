//! Rebuilds style-rule condition forests from flat adjacency rows.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::map_config::StyleRuleCondition;

/// Builds the condition forest for one style rule.
///
/// A condition whose `parent_condition_id` is nil is a root. Every other
/// condition is attached to the first condition in `flat` with that id.
/// Children keep their relative input order. A condition whose parent is not
/// in `flat` is dropped together with its own descendants.
///
/// Runs in O(n) using an id index over the input.
#[must_use]
pub fn build_forest(flat: Vec<StyleRuleCondition>) -> Vec<StyleRuleCondition> {
    let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(flat.len());
    for (i, condition) in flat.iter().enumerate() {
        index.entry(condition.id).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots: Vec<usize> = Vec::new();
    let mut orphans = 0_usize;

    for (i, condition) in flat.iter().enumerate() {
        if condition.is_root() {
            roots.push(i);
        } else if let Some(&parent) = index.get(&condition.parent_condition_id) {
            children[parent].push(i);
        } else {
            orphans += 1;
        }
    }

    if orphans > 0 {
        debug!(orphans, "dropping style rule conditions with unknown parents");
    }

    let mut arena: Vec<Option<StyleRuleCondition>> = flat.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|root| take_subtree(root, &mut arena, &children))
        .collect()
}

fn take_subtree(
    at: usize,
    arena: &mut [Option<StyleRuleCondition>],
    children: &[Vec<usize>],
) -> Option<StyleRuleCondition> {
    let mut node = arena[at].take()?;
    for &child in &children[at] {
        if let Some(subtree) = take_subtree(child, arena, children) {
            node.conditions.get_or_insert_with(Vec::new).push(subtree);
        }
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn condition(id: Uuid, parent: Uuid) -> StyleRuleCondition {
        StyleRuleCondition {
            id,
            style_rule_id: Uuid::nil(),
            parent_condition_id: parent,
            field: None,
            operator: None,
            value: None,
            conditions: None,
        }
    }

    fn ids(nodes: &[StyleRuleCondition]) -> Vec<Uuid> {
        nodes.iter().map(|c| c.id).collect()
    }

    fn children_of(node: &StyleRuleCondition) -> &[StyleRuleCondition] {
        node.conditions.as_deref().unwrap_or_default()
    }

    #[test]
    fn builds_nested_forest() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let forest = build_forest(vec![
            condition(a, Uuid::nil()),
            condition(b, a),
            condition(c, a),
            condition(d, b),
        ]);

        assert_eq!(ids(&forest), vec![a]);
        let root = &forest[0];
        assert_eq!(ids(children_of(root)), vec![b, c]);
        assert_eq!(ids(children_of(&children_of(root)[0])), vec![d]);
        assert!(children_of(root)[1].conditions.is_none());
    }

    #[test]
    fn child_listed_before_parent_is_still_attached() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let forest = build_forest(vec![condition(b, a), condition(a, Uuid::nil())]);

        assert_eq!(ids(&forest), vec![a]);
        assert_eq!(ids(children_of(&forest[0])), vec![b]);
    }

    #[test]
    fn orphan_and_its_descendants_are_dropped() {
        let (a, orphan, grandchild) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let forest = build_forest(vec![
            condition(a, Uuid::nil()),
            condition(orphan, Uuid::new_v4()),
            condition(grandchild, orphan),
        ]);

        assert_eq!(ids(&forest), vec![a]);
        assert!(forest[0].conditions.is_none());
    }

    #[test]
    fn leaf_children_collection_stays_uninitialized() {
        let a = Uuid::new_v4();
        let forest = build_forest(vec![condition(a, Uuid::nil())]);
        assert!(forest[0].conditions.is_none());
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        assert!(build_forest(Vec::new()).is_empty());
    }

    #[test]
    fn self_parented_condition_is_unreachable() {
        let a = Uuid::new_v4();
        assert!(build_forest(vec![condition(a, a)]).is_empty());
    }

    /// Generates a valid flat list: each node's parent is nil or an earlier
    /// node, then appends leaf orphans that reference unknown ids.
    fn flat_list() -> impl Strategy<Value = (Vec<StyleRuleCondition>, usize, usize)> {
        (1usize..40, 0usize..5).prop_flat_map(|(n, orphans)| {
            (
                proptest::collection::vec(proptest::option::of(any::<prop::sample::Index>()), n),
                Just(orphans),
            )
                .prop_map(move |(parents, orphans)| {
                    let ids: Vec<Uuid> = (0..parents.len()).map(|_| Uuid::new_v4()).collect();
                    let mut roots = 0;
                    let mut flat = Vec::with_capacity(parents.len() + orphans);
                    for (i, parent) in parents.iter().enumerate() {
                        let parent_id = match parent {
                            Some(idx) if i > 0 => ids[idx.index(i)],
                            _ => {
                                roots += 1;
                                Uuid::nil()
                            }
                        };
                        flat.push(condition(ids[i], parent_id));
                    }
                    for _ in 0..orphans {
                        flat.push(condition(Uuid::new_v4(), Uuid::new_v4()));
                    }
                    (flat, roots, orphans)
                })
        })
    }

    proptest! {
        #[test]
        fn forest_preserves_every_reachable_condition((flat, roots, orphans) in flat_list()) {
            let total = flat.len();
            let forest = build_forest(flat);

            prop_assert_eq!(forest.len(), roots);
            let counted: usize = forest.iter().map(StyleRuleCondition::node_count).sum();
            prop_assert_eq!(counted, total - orphans);
            prop_assert_eq!(counted - forest.len(), total - orphans - roots);
        }
    }
}
