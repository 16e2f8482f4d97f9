use crate::error::{EditError, Result};
use crate::model::{FaciesGroupId, PolygonId, RuleId, RuleStore};
use crate::registry::{FieldId, FieldRegistry};

use super::NormalizeOrder;

/// Makes sure the zone/region has a field for every background slot plus one
/// alpha field per overlay group, counting `group` as in use.
///
/// With `group == None` at least one group is assumed. Creates at most one
/// field per call and returns it.
pub(crate) fn provision_overlay_field<F>(
    store: &RuleStore,
    rule: RuleId,
    fields: &mut F,
    group: Option<FaciesGroupId>,
) -> Result<Option<FieldId>>
where
    F: FieldRegistry + ?Sized,
{
    let data = store.rule(rule)?;
    let groups = store.overlay_groups(rule)?;
    let group_count = match group {
        Some(g) if !groups.contains(&g) => groups.len() + 1,
        Some(_) => groups.len(),
        None => groups.len().max(1),
    };
    let required = data.background_fields.len() + group_count;
    let available = fields.list_available(&data.parent).len();
    if available >= required {
        return Ok(None);
    }

    let field = fields.create_empty(&data.parent)?;
    tracing::info!(
        parent = %data.parent,
        available,
        required,
        field = ?field,
        "created gaussian field for overlay"
    );
    Ok(Some(field))
}

/// First field of the zone/region that is neither a background field of
/// `rule` nor the alpha field of one of its overlay polygons.
pub(crate) fn unused_overlay_field<F>(
    store: &RuleStore,
    rule: RuleId,
    fields: &F,
) -> Result<Option<FieldId>>
where
    F: FieldRegistry + ?Sized,
{
    let data = store.rule(rule)?;
    let mut taken: Vec<FieldId> = data.assigned_background_fields().collect();
    taken.extend(
        store
            .overlay_polygons(rule)?
            .iter()
            .filter_map(|(_, p)| p.as_overlay().and_then(|o| o.field)),
    );
    Ok(fields
        .list_available(&data.parent)
        .into_iter()
        .find(|field| !taken.contains(field)))
}

/// Switches overlay on or off for a non-cubic or cubic rule.
///
/// Switching on provisions an alpha field up front if the zone/region does
/// not have enough fields. The next overlay polygon added picks it up.
/// Overlay polygons are kept while overlay is off.
pub struct ToggleOverlay {
    rule: RuleId,
    enabled: bool,
}

impl ToggleOverlay {
    /// Creates a new `ToggleOverlay` operation.
    #[must_use]
    pub fn new(rule: RuleId, enabled: bool) -> Self {
        Self { rule, enabled }
    }

    /// Executes the toggle, returning the field created for it, if any.
    ///
    /// # Errors
    ///
    /// Returns an error for bayfill rules, or if field provisioning fails.
    pub fn execute<F>(&self, store: &mut RuleStore, fields: &mut F) -> Result<Option<FieldId>>
    where
        F: FieldRegistry + ?Sized,
    {
        if store.rule(self.rule)?.overlay().is_none() {
            return Err(EditError::Unsupported {
                rule: "bayfill",
                operation: "overlay",
            }
            .into());
        }
        let created = if self.enabled {
            provision_overlay_field(store, self.rule, fields, None)?
        } else {
            None
        };
        if let Some(overlay) = store.rule_mut(self.rule)?.overlay_mut() {
            overlay.use_overlay = self.enabled;
        }
        tracing::debug!(rule = ?self.rule, enabled = self.enabled, "toggled overlay");
        Ok(created)
    }
}

/// Removes a facies group together with every overlay polygon anchored to it.
pub struct RemoveFaciesGroup {
    rule: RuleId,
    group: FaciesGroupId,
}

impl RemoveFaciesGroup {
    /// Creates a new `RemoveFaciesGroup` operation.
    #[must_use]
    pub fn new(rule: RuleId, group: FaciesGroupId) -> Self {
        Self { rule, group }
    }

    /// Executes the removal, returning the overlay polygons that went with the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist.
    pub fn execute(&self, store: &mut RuleStore) -> Result<Vec<PolygonId>> {
        if !store.has_group(self.group) {
            return Err(EditError::GroupNotFound.into());
        }
        let polygons: Vec<PolygonId> = store
            .overlay_polygons_in_group(self.rule, self.group)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        for polygon in &polygons {
            store.remove_polygon(*polygon)?;
        }
        store.remove_group(self.group)?;
        NormalizeOrder::new(self.rule).execute(store)?;
        super::settle(store, self.rule)?;
        tracing::debug!(group = ?self.group, polygons = polygons.len(), "removed facies group");
        Ok(polygons)
    }
}
