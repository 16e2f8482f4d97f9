use crate::error::{EditError, Result};
use crate::model::{RuleId, RuleStore};
use crate::registry::FieldId;

/// Assigns or clears one of a rule's background field slots.
pub struct SetBackgroundField {
    rule: RuleId,
    index: usize,
    field: Option<FieldId>,
}

impl SetBackgroundField {
    #[must_use]
    pub fn new(rule: RuleId, index: usize, field: Option<FieldId>) -> Self {
        Self { rule, index, field }
    }

    /// # Errors
    ///
    /// Returns [`EditError::FieldIndexOutOfRange`] if the rule has no slot at `index`.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        let slots = &mut store.rule_mut(self.rule)?.background_fields;
        let len = slots.len();
        let slot = slots.get_mut(self.index).ok_or(EditError::FieldIndexOutOfRange {
            index: self.index,
            len,
        })?;
        *slot = self.field;
        tracing::debug!(rule = ?self.rule, index = self.index, field = ?self.field, "set background field");
        Ok(())
    }
}

/// Drops every reference to a field that is leaving the registry.
///
/// Background slots referring to it are emptied and overlay polygons lose
/// their alpha field. Removing the field from the registry itself is up to
/// the caller.
pub struct RemoveField {
    field: FieldId,
}

impl RemoveField {
    #[must_use]
    pub fn new(field: FieldId) -> Self {
        Self { field }
    }

    /// Executes the removal, returning how many references were cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule refers to a missing polygon.
    pub fn execute(&self, store: &mut RuleStore) -> Result<usize> {
        let rules: Vec<RuleId> = store.rules().map(|(id, _)| id).collect();
        let mut cleared = 0;
        for rule in rules {
            for slot in &mut store.rule_mut(rule)?.background_fields {
                if *slot == Some(self.field) {
                    *slot = None;
                    cleared += 1;
                }
            }
            let overlays: Vec<_> = store
                .overlay_polygons(rule)?
                .into_iter()
                .map(|(id, _)| id)
                .collect();
            for polygon in overlays {
                if let Some(overlay) = store.polygon_mut(polygon)?.as_overlay_mut() {
                    if overlay.field == Some(self.field) {
                        overlay.field = None;
                        cleared += 1;
                    }
                }
            }
        }
        tracing::debug!(field = ?self.field, cleared, "removed field references");
        Ok(cleared)
    }
}
