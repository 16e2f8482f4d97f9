use crate::error::Result;
use crate::model::{PolygonId, RuleData, RuleId, RuleStore};
use crate::registry::{FaciesId, Parent};

/// Unassigns a facies that was deselected for a zone/region.
///
/// Polygons of the zone/region's rule that carried it lose their facies, then
/// groups are compacted and fractions renormalized.
pub struct RemoveFacies {
    parent: Parent,
    facies: FaciesId,
}

impl RemoveFacies {
    #[must_use]
    pub fn new(parent: Parent, facies: FaciesId) -> Self {
        Self { parent, facies }
    }

    /// Executes the removal, returning the polygons that lost their facies.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule refers to a missing polygon.
    pub fn execute(&self, store: &mut RuleStore) -> Result<Vec<PolygonId>> {
        let Some(rule) = store.rule_for(&self.parent) else {
            return Ok(Vec::new());
        };
        let carriers: Vec<PolygonId> = store
            .polygons_of(rule)?
            .into_iter()
            .filter(|(_, p)| p.facies == Some(self.facies))
            .map(|(id, _)| id)
            .collect();
        for polygon in &carriers {
            store.polygon_mut(*polygon)?.facies = None;
        }
        super::settle(store, rule)?;
        tracing::debug!(parent = %self.parent, facies = ?self.facies, polygons = carriers.len(), "removed facies");
        Ok(carriers)
    }
}

/// Deletes a rule with all its polygons and the facies groups of its zone/region.
pub struct RemoveRule {
    rule: RuleId,
}

impl RemoveRule {
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// Executes the removal, returning the removed rule's data.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule does not exist.
    pub fn execute(&self, store: &mut RuleStore) -> Result<RuleData> {
        let data = store.remove_rule(self.rule)?;
        tracing::debug!(rule = ?self.rule, parent = %data.parent, "removed rule");
        Ok(data)
    }
}
