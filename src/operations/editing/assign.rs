use crate::error::{EditError, Result};
use crate::math::in_unit_interval;
use crate::model::{PolygonId, RuleStore};
use crate::registry::FaciesId;

/// Assigns a facies to a leaf polygon, or clears it with `None`.
///
/// Fractions are renormalized and facies groups compacted afterwards, so
/// clearing the last background carrier of a group facies can remove
/// overlay polygons.
pub struct AssignFacies {
    polygon: PolygonId,
    facies: Option<FaciesId>,
}

impl AssignFacies {
    /// Creates a new `AssignFacies` operation.
    #[must_use]
    pub fn new(polygon: PolygonId, facies: Option<FaciesId>) -> Self {
        Self { polygon, facies }
    }

    /// Executes the assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is interior, or if an overlay polygon
    /// would carry a facies of its own background group.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        let data = store.polygon(self.polygon)?;
        let rule = data.rule;
        if !data.is_leaf() {
            return Err(EditError::InvalidInput("interior polygons carry no facies".into()).into());
        }
        if let (Some(overlay), Some(facies)) = (data.as_overlay(), self.facies) {
            if store.group(overlay.group)?.contains(facies) {
                return Err(EditError::InvalidInput(
                    "an overlay polygon cannot carry a facies of its own background group".into(),
                )
                .into());
            }
        }

        store.polygon_mut(self.polygon)?.facies = self.facies;
        super::settle(store, rule)?;
        tracing::debug!(polygon = ?self.polygon, facies = ?self.facies, "assigned facies");
        Ok(())
    }
}

/// Sets a polygon's share of its facies' probability mass.
///
/// No renormalization runs; validation reports fractions that do not add up.
pub struct SetFraction {
    polygon: PolygonId,
    fraction: f64,
}

impl SetFraction {
    #[must_use]
    pub fn new(polygon: PolygonId, fraction: f64) -> Self {
        Self { polygon, fraction }
    }

    /// # Errors
    ///
    /// Returns an error if the fraction lies outside [0, 1] or the polygon is interior.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        if !in_unit_interval(self.fraction) {
            return Err(EditError::InvalidInput(format!(
                "fraction {} is outside [0, 1]",
                self.fraction
            ))
            .into());
        }
        let polygon = store.polygon_mut(self.polygon)?;
        if !polygon.is_leaf() {
            return Err(EditError::InvalidInput("interior polygons carry no fraction".into()).into());
        }
        polygon.fraction = self.fraction;
        Ok(())
    }
}
