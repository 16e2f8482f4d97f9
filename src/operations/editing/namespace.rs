use crate::error::Result;
use crate::model::{FaciesGroupId, PolygonId, PolygonKind, RuleId, RuleStore};

/// The set of polygons a polygon's `order` is counted among.
///
/// Cubic siblings, non-cubic wedges and the overlay polygons of each group
/// are ordered independently of one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrderNamespace {
    /// Children of a cubic node.
    Siblings(PolygonId),
    /// Wedges of a non-cubic rule.
    Wedges(RuleId),
    /// Overlay polygons anchored to one group.
    OverlayGroup(RuleId, FaciesGroupId),
    /// Bayfill polygons and cubic roots, whose order never changes.
    Fixed,
}

impl OrderNamespace {
    /// Namespace the given polygon belongs to.
    pub(crate) fn of(store: &RuleStore, polygon: PolygonId) -> Result<Self> {
        let data = store.polygon(polygon)?;
        Ok(match &data.kind {
            PolygonKind::Bayfill(_) => Self::Fixed,
            PolygonKind::Cubic(cubic) => cubic.parent.map_or(Self::Fixed, Self::Siblings),
            PolygonKind::NonCubic(_) => Self::Wedges(data.rule),
            PolygonKind::Overlay(overlay) => Self::OverlayGroup(data.rule, overlay.group),
        })
    }

    /// Members sorted by order.
    pub(crate) fn members(self, store: &RuleStore) -> Result<Vec<PolygonId>> {
        let members = match self {
            Self::Siblings(parent) => store.cubic_children(parent)?,
            Self::Wedges(rule) => {
                let mut wedges: Vec<_> = store
                    .polygons_of(rule)?
                    .into_iter()
                    .filter(|(_, p)| p.as_non_cubic().is_some())
                    .map(|(id, p)| (id, p.order()))
                    .collect();
                wedges.sort_by_key(|(_, order)| *order);
                wedges.into_iter().map(|(id, _)| id).collect()
            }
            Self::OverlayGroup(rule, group) => store
                .overlay_polygons_in_group(rule, group)?
                .into_iter()
                .map(|(id, _)| id)
                .collect(),
            Self::Fixed => Vec::new(),
        };
        Ok(members)
    }

    /// One past the highest order in use.
    pub(crate) fn next_order(self, store: &RuleStore) -> Result<u32> {
        let mut max = 0;
        for id in self.members(store)? {
            max = max.max(store.polygon(id)?.order());
        }
        Ok(max + 1)
    }

    /// Shifts every member at or after `order` one step later.
    pub(crate) fn open_gap(self, store: &mut RuleStore, order: u32) -> Result<()> {
        for id in self.members(store)? {
            let polygon = store.polygon_mut(id)?;
            let current = polygon.order();
            if current >= order {
                polygon.set_order(current + 1);
            }
        }
        Ok(())
    }

    /// Shifts every member after `order` one step earlier.
    pub(crate) fn close_gap(self, store: &mut RuleStore, order: u32) -> Result<()> {
        for id in self.members(store)? {
            let polygon = store.polygon_mut(id)?;
            let current = polygon.order();
            if current > order {
                polygon.set_order(current - 1);
            }
        }
        Ok(())
    }

    /// Renumbers the members 1..=N, keeping their relative order.
    pub(crate) fn renumber(self, store: &mut RuleStore) -> Result<()> {
        for (order, id) in (1..).zip(self.members(store)?) {
            store.polygon_mut(id)?.set_order(order);
        }
        Ok(())
    }
}
