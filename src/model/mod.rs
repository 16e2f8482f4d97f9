pub mod group;
pub mod polygon;
pub mod rule;

pub use group::{FaciesGroupData, FaciesGroupId};
pub use polygon::{
    BayfillName, BayfillPolygon, CubicPolygon, NonCubicPolygon, OverlayPolygon, PolygonData,
    PolygonId, PolygonKind,
};
pub use rule::{Direction, OverlaySettings, RuleData, RuleId, RuleKind};

use std::collections::{BTreeSet, HashMap};

use slotmap::SlotMap;

use crate::config::EngineConfig;
use crate::error::ModelError;
use crate::registry::{FaciesId, Parent};

/// Central arena that owns all rules, polygons and facies groups.
///
/// Entities reference each other via typed IDs (generational indices), so the
/// cubic tree stores parent and children as IDs instead of pointers.
#[derive(Debug, Default)]
pub struct RuleStore {
    config: EngineConfig,
    rules: SlotMap<RuleId, RuleData>,
    polygons: SlotMap<PolygonId, PolygonData>,
    groups: SlotMap<FaciesGroupId, FaciesGroupData>,
    rule_by_parent: HashMap<Parent, RuleId>,
}

impl RuleStore {
    /// Creates a new, empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Rule operations ---

    /// Inserts a rule and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone/region already has a rule.
    pub fn add_rule(&mut self, data: RuleData) -> Result<RuleId, ModelError> {
        if self.rule_by_parent.contains_key(&data.parent) {
            return Err(ModelError::RuleExists(data.parent.to_string()));
        }
        let parent = data.parent;
        let id = self.rules.insert(data);
        self.rule_by_parent.insert(parent, id);
        Ok(id)
    }

    /// Returns a reference to the rule data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn rule(&self, id: RuleId) -> Result<&RuleData, ModelError> {
        self.rules
            .get(id)
            .ok_or(ModelError::EntityNotFound("truncation rule"))
    }

    /// Returns a mutable reference to the rule data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn rule_mut(&mut self, id: RuleId) -> Result<&mut RuleData, ModelError> {
        self.rules
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("truncation rule"))
    }

    /// The rule of a zone/region, if one exists.
    #[must_use]
    pub fn rule_for(&self, parent: &Parent) -> Option<RuleId> {
        self.rule_by_parent.get(parent).copied()
    }

    /// Iterates over all rules.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &RuleData)> {
        self.rules.iter()
    }

    /// Removes a rule together with its polygons and the groups of its zone/region.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn remove_rule(&mut self, id: RuleId) -> Result<RuleData, ModelError> {
        let data = self
            .rules
            .remove(id)
            .ok_or(ModelError::EntityNotFound("truncation rule"))?;
        for polygon in &data.polygons {
            self.polygons.remove(*polygon);
        }
        self.groups.retain(|_, group| group.parent != data.parent);
        self.rule_by_parent.remove(&data.parent);
        Ok(data)
    }

    // --- Polygon operations ---

    /// Inserts a polygon, registers it with its rule, and returns its ID.
    ///
    /// Tree links of cubic polygons are the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning rule is not found in the store.
    pub fn add_polygon(&mut self, data: PolygonData) -> Result<PolygonId, ModelError> {
        let rule = data.rule;
        if !self.rules.contains_key(rule) {
            return Err(ModelError::EntityNotFound("truncation rule"));
        }
        let id = self.polygons.insert(data);
        self.rule_mut(rule)?.polygons.push(id);
        Ok(id)
    }

    /// Returns a reference to the polygon data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn polygon(&self, id: PolygonId) -> Result<&PolygonData, ModelError> {
        self.polygons
            .get(id)
            .ok_or(ModelError::EntityNotFound("polygon"))
    }

    /// Returns a mutable reference to the polygon data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn polygon_mut(&mut self, id: PolygonId) -> Result<&mut PolygonData, ModelError> {
        self.polygons
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("polygon"))
    }

    /// Removes a polygon from the arena and from its rule's polygon list.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn remove_polygon(&mut self, id: PolygonId) -> Result<PolygonData, ModelError> {
        let data = self
            .polygons
            .remove(id)
            .ok_or(ModelError::EntityNotFound("polygon"))?;
        if let Some(rule) = self.rules.get_mut(data.rule) {
            rule.polygons.retain(|p| *p != id);
        }
        Ok(data)
    }

    /// Inserts a new cubic leaf under `parent` and links it into the tree.
    ///
    /// Depth limits and sibling orders are the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is missing or not cubic.
    pub fn add_cubic_child(&mut self, parent: PolygonId, order: u32) -> Result<PolygonId, ModelError> {
        let parent_data = self.polygon(parent)?;
        let rule = parent_data.rule;
        let level = parent_data
            .as_cubic()
            .ok_or_else(|| ModelError::InvalidStructure("polygon is not part of a cubic tree".into()))?
            .level;
        let id = self.add_polygon(PolygonData::new(
            rule,
            PolygonKind::Cubic(CubicPolygon {
                order,
                parent: Some(parent),
                children: Vec::new(),
                level: level + 1,
            }),
        ))?;
        if let Some(cubic) = self.polygon_mut(parent)?.as_cubic_mut() {
            cubic.children.push(id);
        }
        Ok(id)
    }

    /// Removes a cubic polygon and all of its descendants, unlinking it from its parent.
    ///
    /// Returns the removed IDs, the given polygon first.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is missing or not cubic.
    pub fn remove_cubic_subtree(&mut self, id: PolygonId) -> Result<Vec<PolygonId>, ModelError> {
        let parent = self
            .polygon(id)?
            .as_cubic()
            .ok_or_else(|| ModelError::InvalidStructure("polygon is not part of a cubic tree".into()))?
            .parent;
        if let Some(parent) = parent {
            if let Some(cubic) = self.polygon_mut(parent)?.as_cubic_mut() {
                cubic.children.retain(|c| *c != id);
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let data = self.remove_polygon(next)?;
            if let PolygonKind::Cubic(cubic) = data.kind {
                stack.extend(cubic.children.iter().rev());
            }
            removed.push(next);
        }
        Ok(removed)
    }

    // --- Facies group operations ---

    /// Inserts a group and returns its ID.
    pub fn add_group(&mut self, data: FaciesGroupData) -> FaciesGroupId {
        self.groups.insert(data)
    }

    /// Returns a reference to the group data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn group(&self, id: FaciesGroupId) -> Result<&FaciesGroupData, ModelError> {
        self.groups
            .get(id)
            .ok_or(ModelError::EntityNotFound("facies group"))
    }

    /// Returns a mutable reference to the group data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn group_mut(&mut self, id: FaciesGroupId) -> Result<&mut FaciesGroupData, ModelError> {
        self.groups
            .get_mut(id)
            .ok_or(ModelError::EntityNotFound("facies group"))
    }

    /// Removes a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn remove_group(&mut self, id: FaciesGroupId) -> Result<FaciesGroupData, ModelError> {
        self.groups
            .remove(id)
            .ok_or(ModelError::EntityNotFound("facies group"))
    }

    /// Returns `true` if the group is registered.
    #[must_use]
    pub fn has_group(&self, id: FaciesGroupId) -> bool {
        self.groups.contains_key(id)
    }

    /// Groups registered for a zone/region.
    pub fn groups_in<'a>(
        &'a self,
        parent: &'a Parent,
    ) -> impl Iterator<Item = (FaciesGroupId, &'a FaciesGroupData)> + 'a {
        self.groups.iter().filter(move |(_, g)| g.parent == *parent)
    }

    /// The group of a zone/region with exactly this facies set.
    #[must_use]
    pub fn find_group(&self, parent: &Parent, facies: &BTreeSet<FaciesId>) -> Option<FaciesGroupId> {
        self.groups_in(parent)
            .find(|(_, g)| g.facies == *facies)
            .map(|(id, _)| id)
    }

    /// The group of a zone/region that contains this facies.
    #[must_use]
    pub fn group_containing(&self, parent: &Parent, facies: FaciesId) -> Option<FaciesGroupId> {
        self.groups_in(parent)
            .find(|(_, g)| g.contains(facies))
            .map(|(id, _)| id)
    }

    // --- Rule-scoped queries ---

    /// All polygons of a rule, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn polygons_of(&self, rule: RuleId) -> Result<Vec<(PolygonId, &PolygonData)>, ModelError> {
        self.rule(rule)?
            .polygons
            .iter()
            .map(|id| Ok((*id, self.polygon(*id)?)))
            .collect()
    }

    /// Polygons expected to carry a facies: every non-interior polygon.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn leaf_polygons(&self, rule: RuleId) -> Result<Vec<(PolygonId, &PolygonData)>, ModelError> {
        let mut polygons = self.polygons_of(rule)?;
        polygons.retain(|(_, p)| p.is_leaf());
        Ok(polygons)
    }

    /// Leaf polygons that take part in the truncation: overlay polygons only
    /// count while the rule has overlay switched on.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn active_polygons(&self, rule: RuleId) -> Result<Vec<(PolygonId, &PolygonData)>, ModelError> {
        let uses_overlay = self.rule(rule)?.uses_overlay();
        let mut polygons = self.leaf_polygons(rule)?;
        if !uses_overlay {
            polygons.retain(|(_, p)| !p.is_overlay());
        }
        Ok(polygons)
    }

    /// Leaf polygons that are not overlay polygons.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn background_polygons(
        &self,
        rule: RuleId,
    ) -> Result<Vec<(PolygonId, &PolygonData)>, ModelError> {
        let mut polygons = self.leaf_polygons(rule)?;
        polygons.retain(|(_, p)| !p.is_overlay());
        Ok(polygons)
    }

    /// Overlay polygons of a rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn overlay_polygons(
        &self,
        rule: RuleId,
    ) -> Result<Vec<(PolygonId, &PolygonData)>, ModelError> {
        let mut polygons = self.polygons_of(rule)?;
        polygons.retain(|(_, p)| p.is_overlay());
        Ok(polygons)
    }

    /// Overlay polygons anchored to one group, sorted by order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn overlay_polygons_in_group(
        &self,
        rule: RuleId,
        group: FaciesGroupId,
    ) -> Result<Vec<(PolygonId, &PolygonData)>, ModelError> {
        let mut polygons = self.overlay_polygons(rule)?;
        polygons.retain(|(_, p)| p.as_overlay().is_some_and(|o| o.group == group));
        polygons.sort_by_key(|(_, p)| p.order());
        Ok(polygons)
    }

    /// Distinct groups referenced by a rule's overlay polygons, in first-use order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn overlay_groups(&self, rule: RuleId) -> Result<Vec<FaciesGroupId>, ModelError> {
        let mut groups = Vec::new();
        for (_, polygon) in self.overlay_polygons(rule)? {
            if let Some(overlay) = polygon.as_overlay() {
                if !groups.contains(&overlay.group) {
                    groups.push(overlay.group);
                }
            }
        }
        Ok(groups)
    }

    /// Children of a cubic polygon, sorted by order.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is missing or not cubic.
    pub fn cubic_children(&self, id: PolygonId) -> Result<Vec<PolygonId>, ModelError> {
        let cubic = self.polygon(id)?.as_cubic().ok_or_else(|| {
            ModelError::InvalidStructure("polygon is not part of a cubic tree".into())
        })?;
        let mut children = Vec::with_capacity(cubic.children.len());
        for child in &cubic.children {
            children.push((*child, self.polygon(*child)?.order()));
        }
        children.sort_by_key(|(_, order)| *order);
        Ok(children.into_iter().map(|(id, _)| id).collect())
    }
}
