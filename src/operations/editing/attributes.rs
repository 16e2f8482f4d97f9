//! Variant-specific scalar attributes of polygons and rules.

use crate::error::{EditError, Result, TruncationError};
use crate::math::in_unit_interval;
use crate::model::{Direction, PolygonId, PolygonKind, RuleId, RuleKind, RuleStore};
use crate::registry::FieldId;

fn wrong_polygon(operation: &'static str, expected: &str) -> TruncationError {
    EditError::InvalidInput(format!("{operation} applies to {expected} polygons only")).into()
}

/// Sets the slant factor of a bayfill polygon. Lagoon has none.
pub struct SetSlantFactor {
    polygon: PolygonId,
    value: f64,
}

impl SetSlantFactor {
    #[must_use]
    pub fn new(polygon: PolygonId, value: f64) -> Self {
        Self { polygon, value }
    }

    /// # Errors
    ///
    /// Returns an error for non-bayfill polygons, for Lagoon, or for a
    /// non-finite value.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        if !self.value.is_finite() {
            return Err(EditError::InvalidInput("slant factor must be finite".into()).into());
        }
        let PolygonKind::Bayfill(bayfill) = &mut store.polygon_mut(self.polygon)?.kind else {
            return Err(wrong_polygon("slant factor", "bayfill"));
        };
        if !bayfill.name.has_slant_factor() {
            return Err(EditError::InvalidInput(format!(
                "{} has no slant factor",
                bayfill.name.as_str()
            ))
            .into());
        }
        bayfill.slant_factor = Some(self.value);
        Ok(())
    }
}

/// Sets the wedge angle of a non-cubic polygon, in degrees.
pub struct SetAngle {
    polygon: PolygonId,
    angle: f64,
}

impl SetAngle {
    #[must_use]
    pub fn new(polygon: PolygonId, angle: f64) -> Self {
        Self { polygon, angle }
    }

    /// # Errors
    ///
    /// Returns an error for other polygon variants or a non-finite angle.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        if !self.angle.is_finite() {
            return Err(EditError::InvalidInput("angle must be finite".into()).into());
        }
        let PolygonKind::NonCubic(wedge) = &mut store.polygon_mut(self.polygon)?.kind else {
            return Err(wrong_polygon("angle", "non-cubic"));
        };
        wedge.angle = self.angle;
        Ok(())
    }
}

/// Sets the truncation-interval center of an overlay polygon.
pub struct SetCenter {
    polygon: PolygonId,
    center: f64,
}

impl SetCenter {
    #[must_use]
    pub fn new(polygon: PolygonId, center: f64) -> Self {
        Self { polygon, center }
    }

    /// # Errors
    ///
    /// Returns an error for non-overlay polygons or a center outside [0, 1].
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        if !in_unit_interval(self.center) {
            return Err(EditError::InvalidInput(format!(
                "center {} is outside [0, 1]",
                self.center
            ))
            .into());
        }
        let overlay = store
            .polygon_mut(self.polygon)?
            .as_overlay_mut()
            .ok_or_else(|| wrong_polygon("center", "overlay"))?;
        overlay.center = self.center;
        Ok(())
    }
}

/// Sets or clears the alpha field of an overlay polygon.
pub struct SetOverlayField {
    polygon: PolygonId,
    field: Option<FieldId>,
}

impl SetOverlayField {
    #[must_use]
    pub fn new(polygon: PolygonId, field: Option<FieldId>) -> Self {
        Self { polygon, field }
    }

    /// # Errors
    ///
    /// Returns an error for non-overlay polygons.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        let overlay = store
            .polygon_mut(self.polygon)?
            .as_overlay_mut()
            .ok_or_else(|| wrong_polygon("alpha field", "overlay"))?;
        overlay.field = self.field;
        Ok(())
    }
}

/// Sets the stacking axis of a cubic rule's first split.
pub struct SetDirection {
    rule: RuleId,
    direction: Direction,
}

impl SetDirection {
    #[must_use]
    pub fn new(rule: RuleId, direction: Direction) -> Self {
        Self { rule, direction }
    }

    /// # Errors
    ///
    /// Returns an error for non-cubic rules.
    pub fn execute(&self, store: &mut RuleStore) -> Result<()> {
        let rule = store.rule_mut(self.rule)?;
        let name = rule.kind_name();
        let RuleKind::Cubic { direction, .. } = &mut rule.kind else {
            return Err(EditError::Unsupported {
                rule: name,
                operation: "direction",
            }
            .into());
        };
        *direction = self.direction;
        tracing::debug!(rule = ?self.rule, direction = self.direction.as_str(), "set direction");
        Ok(())
    }
}
