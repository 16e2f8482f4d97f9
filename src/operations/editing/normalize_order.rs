use std::collections::VecDeque;

use super::namespace::OrderNamespace;
use crate::error::Result;
use crate::model::{PolygonId, RuleId, RuleKind, RuleStore};

/// Renumbers polygon orders so every namespace of a rule reads 1..=N.
///
/// Cubic trees are walked breadth-first from the root; at each interior node
/// the children are sorted by their current order, renumbered, and their
/// levels re-derived from the parent. Wedges and overlay groups are renumbered
/// the same way. Multi-step edits such as a merge may leave gaps behind, which
/// this pass closes.
pub struct NormalizeOrder {
    rule: RuleId,
}

impl NormalizeOrder {
    /// Creates a new `NormalizeOrder` operation.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// Executes the renumbering.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        let kind = store.rule(self.rule)?.kind.clone();
        match kind {
            RuleKind::Bayfill => return Ok(()),
            RuleKind::NonCubic { .. } => {
                OrderNamespace::Wedges(self.rule).renumber(store)?;
            }
            RuleKind::Cubic { root, .. } => normalize_tree(store, root)?,
        }
        for group in store.overlay_groups(self.rule)? {
            OrderNamespace::OverlayGroup(self.rule, group).renumber(store)?;
        }
        Ok(())
    }
}

fn normalize_tree(store: &mut RuleStore, root: PolygonId) -> Result<()> {
    if let Some(cubic) = store.polygon_mut(root)?.as_cubic_mut() {
        cubic.order = 1;
        cubic.level = 0;
    }

    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        let children = store.cubic_children(node)?;
        let level = store.polygon(node)?.as_cubic().map_or(0, |c| c.level) + 1;
        for (order, child) in (1..).zip(&children) {
            if let Some(cubic) = store.polygon_mut(*child)?.as_cubic_mut() {
                cubic.order = order;
                cubic.level = level;
                cubic.parent = Some(node);
            }
            queue.push_back(*child);
        }
        if let Some(cubic) = store.polygon_mut(node)?.as_cubic_mut() {
            cubic.children = children;
        }
    }
    Ok(())
}
