use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{FaciesGroupId, PolygonId, RuleId, RuleStore};
use crate::registry::FaciesId;

/// What a [`CompactGroups`] pass removed or shrank.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompactionReport {
    pub removed_groups: Vec<FaciesGroupId>,
    pub shrunk_groups: Vec<FaciesGroupId>,
    pub removed_polygons: Vec<PolygonId>,
}

impl CompactionReport {
    /// Returns `true` if the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed_groups.is_empty()
            && self.shrunk_groups.is_empty()
            && self.removed_polygons.is_empty()
    }
}

/// Post-edit pass that keeps the facies groups of a rule's zone/region tidy.
///
/// - A group keeps only the facies still carried by a background polygon.
/// - A group left without such facies loses its overlay polygons and is removed.
///
/// Groups without overlay polygons are left alone, so a group resolved ahead
/// of its first overlay polygon survives unrelated edits.
pub struct CompactGroups {
    rule: RuleId,
}

impl CompactGroups {
    /// Creates a new `CompactGroups` operation.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// Executes the pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn execute(&self, store: &mut RuleStore) -> Result<CompactionReport> {
        let parent = store.rule(self.rule)?.parent;
        let background: BTreeSet<FaciesId> = store
            .background_polygons(self.rule)?
            .iter()
            .filter_map(|(_, p)| p.facies)
            .collect();

        let groups: Vec<(FaciesGroupId, BTreeSet<FaciesId>)> = store
            .groups_in(&parent)
            .map(|(id, g)| (id, g.facies.clone()))
            .collect();

        let mut report = CompactionReport::default();
        for (group, facies) in groups {
            let members: Vec<PolygonId> = store
                .overlay_polygons_in_group(self.rule, group)?
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            let remaining: BTreeSet<FaciesId> = facies.intersection(&background).copied().collect();

            if remaining.is_empty() {
                for polygon in members {
                    store.remove_polygon(polygon)?;
                    report.removed_polygons.push(polygon);
                }
                store.remove_group(group)?;
                tracing::debug!(?group, "removed facies group");
                report.removed_groups.push(group);
            } else if remaining != facies {
                store.group_mut(group)?.facies = remaining;
                tracing::debug!(?group, "shrank facies group");
                report.shrunk_groups.push(group);
            }
        }
        Ok(report)
    }
}
