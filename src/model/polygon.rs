use crate::registry::{FaciesId, FieldId};

use super::group::FaciesGroupId;
use super::rule::RuleId;

slotmap::new_key_type! {
    /// Unique identifier for a polygon in the rule store.
    pub struct PolygonId;
}

/// The fixed set of bayfill polygon names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BayfillName {
    Floodplain,
    Subbay,
    WaveInfluencedBayfill,
    BayheadDelta,
    Lagoon,
}

impl BayfillName {
    /// All names, in their canonical order.
    pub const ALL: [Self; 5] = [
        Self::Floodplain,
        Self::Subbay,
        Self::WaveInfluencedBayfill,
        Self::BayheadDelta,
        Self::Lagoon,
    ];

    /// Display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Floodplain => "Floodplain",
            Self::Subbay => "Subbay",
            Self::WaveInfluencedBayfill => "Wave influenced Bayfill",
            Self::BayheadDelta => "Bayhead Delta",
            Self::Lagoon => "Lagoon",
        }
    }

    /// Lagoon is derived from the other four and has no slant factor.
    #[must_use]
    pub fn has_slant_factor(self) -> bool {
        self != Self::Lagoon
    }

    /// One-based position in [`BayfillName::ALL`].
    #[must_use]
    pub fn order(self) -> u32 {
        match self {
            Self::Floodplain => 1,
            Self::Subbay => 2,
            Self::WaveInfluencedBayfill => 3,
            Self::BayheadDelta => 4,
            Self::Lagoon => 5,
        }
    }
}

/// One of the five named bayfill regions.
#[derive(Debug, Clone, PartialEq)]
pub struct BayfillPolygon {
    pub name: BayfillName,
    pub slant_factor: Option<f64>,
}

/// A node of a cubic truncation tree.
///
/// A node with children is interior and never carries facies; a node
/// without children is a leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicPolygon {
    /// Position among the siblings under `parent`, starting at 1.
    pub order: u32,
    /// `None` only for the root.
    pub parent: Option<PolygonId>,
    /// Children in no particular storage order; `order` decides the layout.
    pub children: Vec<PolygonId>,
    /// Depth below the root (the root is level 0).
    pub level: u32,
}

/// A wedge of a non-cubic truncation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct NonCubicPolygon {
    /// Position among the background polygons of the rule, starting at 1.
    pub order: u32,
    /// Direction of the wedge boundary, in degrees.
    pub angle: f64,
}

/// A secondary facies carved into the background facies of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPolygon {
    /// Position among the overlay polygons of the same group, starting at 1.
    pub order: u32,
    pub group: FaciesGroupId,
    /// The alpha field the overlay is truncated on.
    pub field: Option<FieldId>,
    /// Center of the truncation interval along `field`, in [0, 1].
    pub center: f64,
}

/// Variant-specific polygon data.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonKind {
    Bayfill(BayfillPolygon),
    Cubic(CubicPolygon),
    NonCubic(NonCubicPolygon),
    Overlay(OverlayPolygon),
}

/// Data associated with a polygon of a truncation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonData {
    /// Owning rule.
    pub rule: RuleId,
    pub facies: Option<FaciesId>,
    /// Share of the facies' probability mass carried by this polygon.
    pub fraction: f64,
    pub kind: PolygonKind,
}

impl PolygonData {
    /// Creates polygon data with no facies and a full fraction.
    #[must_use]
    pub fn new(rule: RuleId, kind: PolygonKind) -> Self {
        Self {
            rule,
            facies: None,
            fraction: 1.0,
            kind,
        }
    }

    /// Order within the polygon's own namespace.
    #[must_use]
    pub fn order(&self) -> u32 {
        match &self.kind {
            PolygonKind::Bayfill(p) => p.name.order(),
            PolygonKind::Cubic(p) => p.order,
            PolygonKind::NonCubic(p) => p.order,
            PolygonKind::Overlay(p) => p.order,
        }
    }

    /// Sets the order. Bayfill orders are fixed by name and are left alone.
    pub fn set_order(&mut self, order: u32) {
        match &mut self.kind {
            PolygonKind::Bayfill(_) => {}
            PolygonKind::Cubic(p) => p.order = order,
            PolygonKind::NonCubic(p) => p.order = order,
            PolygonKind::Overlay(p) => p.order = order,
        }
    }

    /// Returns `true` for overlay polygons.
    #[must_use]
    pub fn is_overlay(&self) -> bool {
        matches!(self.kind, PolygonKind::Overlay(_))
    }

    /// Returns `true` if the polygon is expected to carry a facies.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        match &self.kind {
            PolygonKind::Cubic(p) => p.children.is_empty(),
            _ => true,
        }
    }

    #[must_use]
    pub fn as_cubic(&self) -> Option<&CubicPolygon> {
        match &self.kind {
            PolygonKind::Cubic(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_cubic_mut(&mut self) -> Option<&mut CubicPolygon> {
        match &mut self.kind {
            PolygonKind::Cubic(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_overlay(&self) -> Option<&OverlayPolygon> {
        match &self.kind {
            PolygonKind::Overlay(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_overlay_mut(&mut self) -> Option<&mut OverlayPolygon> {
        match &mut self.kind {
            PolygonKind::Overlay(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bayfill(&self) -> Option<&BayfillPolygon> {
        match &self.kind {
            PolygonKind::Bayfill(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_non_cubic(&self) -> Option<&NonCubicPolygon> {
        match &self.kind {
            PolygonKind::NonCubic(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn bayfill_names() {
        assert_eq!(BayfillName::ALL.len(), 5);
        assert_eq!(BayfillName::WaveInfluencedBayfill.as_str(), "Wave influenced Bayfill");
        assert!(!BayfillName::Lagoon.has_slant_factor());
        assert!(BayfillName::ALL
            .iter()
            .enumerate()
            .all(|(i, name)| name.order() as usize == i + 1));
    }

    #[test]
    fn bayfill_order_is_fixed() {
        let mut rules: SlotMap<RuleId, ()> = SlotMap::with_key();
        let rule = rules.insert(());
        let mut data = PolygonData::new(
            rule,
            PolygonKind::Bayfill(BayfillPolygon {
                name: BayfillName::Subbay,
                slant_factor: Some(0.5),
            }),
        );
        data.set_order(4);
        assert_eq!(data.order(), 2);
    }

    #[test]
    fn cubic_leaf_depends_on_children() {
        let mut rules: SlotMap<RuleId, ()> = SlotMap::with_key();
        let mut polygons: SlotMap<PolygonId, ()> = SlotMap::with_key();
        let rule = rules.insert(());
        let child = polygons.insert(());
        let mut data = PolygonData::new(
            rule,
            PolygonKind::Cubic(CubicPolygon {
                order: 1,
                parent: None,
                children: Vec::new(),
                level: 0,
            }),
        );
        assert!(data.is_leaf());
        if let Some(cubic) = data.as_cubic_mut() {
            cubic.children.push(child);
        }
        assert!(!data.is_leaf());
    }
}
