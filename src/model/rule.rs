use nalgebra::DMatrix;
use serde::Serialize;

use crate::registry::{FieldId, Parent};

use super::polygon::PolygonId;

slotmap::new_key_type! {
    /// Unique identifier for a truncation rule in the rule store.
    pub struct RuleId;
}

/// Stacking axis of the first split of a cubic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    #[serde(rename = "H")]
    #[default]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "H",
            Self::Vertical => "V",
        }
    }
}

/// Overlay capability shared by non-cubic and cubic rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlaySettings {
    pub use_overlay: bool,
}

/// Variant-specific rule data.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Exactly five named polygons on three background fields.
    Bayfill,
    NonCubic {
        overlay: OverlaySettings,
    },
    Cubic {
        overlay: OverlaySettings,
        direction: Direction,
        root: PolygonId,
    },
}

/// A facies truncation rule for one zone/region.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleData {
    pub name: String,
    pub parent: Parent,
    /// Fixed-arity background field slots.
    pub background_fields: Vec<Option<FieldId>>,
    /// Every polygon of the rule, including interior cubic nodes and overlay polygons.
    pub polygons: Vec<PolygonId>,
    /// Facies codes of the last simulation.
    pub realization: Option<DMatrix<i32>>,
    pub kind: RuleKind,
}

impl RuleData {
    /// Human-readable variant name.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            RuleKind::Bayfill => "bayfill",
            RuleKind::NonCubic { .. } => "non-cubic",
            RuleKind::Cubic { .. } => "cubic",
        }
    }

    /// Overlay settings, if the variant supports overlay.
    #[must_use]
    pub fn overlay(&self) -> Option<&OverlaySettings> {
        match &self.kind {
            RuleKind::Bayfill => None,
            RuleKind::NonCubic { overlay } | RuleKind::Cubic { overlay, .. } => Some(overlay),
        }
    }

    pub fn overlay_mut(&mut self) -> Option<&mut OverlaySettings> {
        match &mut self.kind {
            RuleKind::Bayfill => None,
            RuleKind::NonCubic { overlay } | RuleKind::Cubic { overlay, .. } => Some(overlay),
        }
    }

    /// Returns `true` if overlay is supported and switched on.
    #[must_use]
    pub fn uses_overlay(&self) -> bool {
        self.overlay().is_some_and(|o| o.use_overlay)
    }

    /// Root of the cubic tree.
    #[must_use]
    pub fn cubic_root(&self) -> Option<PolygonId> {
        match self.kind {
            RuleKind::Cubic { root, .. } => Some(root),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_cubic(&self) -> bool {
        matches!(self.kind, RuleKind::Cubic { .. })
    }

    #[must_use]
    pub fn is_bayfill(&self) -> bool {
        matches!(self.kind, RuleKind::Bayfill)
    }

    /// Background fields currently assigned, skipping empty slots.
    pub fn assigned_background_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.background_fields.iter().filter_map(|f| *f)
    }
}
