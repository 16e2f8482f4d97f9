use super::namespace::OrderNamespace;
use super::NormalizeOrder;
use crate::error::{EditError, Result};
use crate::model::{PolygonId, PolygonKind, RuleStore};

/// Removes a polygon from a non-cubic or cubic rule.
///
/// Cubic polygons take their whole subtree with them. Later siblings move one
/// step earlier, facies groups no longer backed by a background polygon are
/// shrunk or dropped (with their overlay polygons), and fractions are
/// renormalized. Removing the last overlay polygon of a group removes the
/// group.
pub struct RemovePolygon {
    polygon: PolygonId,
}

impl RemovePolygon {
    /// Creates a new `RemovePolygon` operation.
    #[must_use]
    pub fn new(polygon: PolygonId) -> Self {
        Self { polygon }
    }

    /// Executes the removal, returning every polygon removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is missing, belongs to a bayfill rule,
    /// is the root of a cubic tree, or is the root's only child.
    pub fn execute(&self, store: &mut RuleStore) -> Result<Vec<PolygonId>> {
        let data = store.polygon(self.polygon)?;
        let rule = data.rule;
        let order = data.order();
        match &data.kind {
            PolygonKind::Bayfill(_) => {
                return Err(EditError::Unsupported {
                    rule: "bayfill",
                    operation: "remove polygon (bayfill rules have exactly 5 polygons)",
                }
                .into());
            }
            PolygonKind::Cubic(cubic) => match cubic.parent {
                None => {
                    return Err(EditError::InvalidInput(
                        "the root of a cubic tree cannot be removed".into(),
                    )
                    .into());
                }
                Some(parent) if store.rule(rule)?.cubic_root() == Some(parent) => {
                    if store.cubic_children(parent)?.len() == 1 {
                        return Err(EditError::InvalidInput(
                            "the root of a cubic tree must keep at least one child".into(),
                        )
                        .into());
                    }
                }
                Some(_) => {}
            },
            _ => {}
        }
        let namespace = OrderNamespace::of(store, self.polygon)?;
        let group = data.as_overlay().map(|o| o.group);

        let removed = if data.as_cubic().is_some() {
            store.remove_cubic_subtree(self.polygon)?
        } else {
            store.remove_polygon(self.polygon)?;
            vec![self.polygon]
        };
        namespace.close_gap(store, order)?;
        if let Some(group) = group {
            if store.has_group(group) && store.overlay_polygons_in_group(rule, group)?.is_empty() {
                store.remove_group(group)?;
                tracing::debug!(?group, "removed facies group with its last overlay polygon");
            }
        }
        NormalizeOrder::new(rule).execute(store)?;
        super::settle(store, rule)?;

        tracing::debug!(rule = ?rule, polygon = ?self.polygon, removed = removed.len(), "removed polygon");
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::TruncationError;
    use crate::operations::creation::{CreateBayfillRule, CubicLayout, GetFaciesGroup};
    use crate::operations::editing::{AddPolygon, AssignFacies};
    use crate::operations::fixtures::Fixture;

    #[test]
    fn later_wedges_move_up() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(3);
        let ids = fx.store.rule(rule).unwrap().polygons.clone();

        RemovePolygon::new(ids[0]).execute(&mut fx.store).unwrap();

        assert_eq!(fx.store.polygon(ids[1]).unwrap().order(), 1);
        assert_eq!(fx.store.polygon(ids[2]).unwrap().order(), 2);
    }

    #[test]
    fn remaining_carrier_gets_full_fraction() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let ids = fx.store.rule(rule).unwrap().polygons.clone();
        for id in &ids {
            AssignFacies::new(*id, Some(fx.codes[0]))
                .execute(&mut fx.store)
                .unwrap();
        }
        assert_relative_eq!(fx.store.polygon(ids[1]).unwrap().fraction, 0.5, epsilon = 1e-12);

        RemovePolygon::new(ids[0]).execute(&mut fx.store).unwrap();
        assert_relative_eq!(fx.store.polygon(ids[1]).unwrap().fraction, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_subtree_goes_too() {
        let mut fx = Fixture::new(1);
        let rule = fx.cubic(CubicLayout::Split(vec![
            CubicLayout::leaves(2),
            CubicLayout::Leaf,
        ]));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        let top = fx.store.cubic_children(root).unwrap();

        let removed = RemovePolygon::new(top[0]).execute(&mut fx.store).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(fx.store.cubic_children(root).unwrap(), vec![top[1]]);
        assert_eq!(fx.store.polygon(top[1]).unwrap().order(), 1);
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut fx = Fixture::new(1);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        assert!(RemovePolygon::new(root).execute(&mut fx.store).is_err());
    }

    #[test]
    fn root_keeps_one_child() {
        let mut fx = Fixture::new(1);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        let children = fx.store.cubic_children(root).unwrap();
        RemovePolygon::new(children[0]).execute(&mut fx.store).unwrap();
        assert!(RemovePolygon::new(children[1]).execute(&mut fx.store).is_err());
        assert_eq!(fx.store.cubic_children(root).unwrap(), vec![children[1]]);
    }

    #[test]
    fn bayfill_polygons_are_fixed() {
        let mut fx = Fixture::new(5);
        let rule = CreateBayfillRule::new(fx.parent, "bayfill")
            .execute(&mut fx.store)
            .unwrap();
        let first = fx.store.rule(rule).unwrap().polygons[0];
        let result = RemovePolygon::new(first).execute(&mut fx.store);
        assert!(matches!(
            result,
            Err(TruncationError::Edit(EditError::Unsupported { .. }))
        ));
    }

    #[test]
    fn removing_last_background_carrier_drops_group() {
        let mut fx = Fixture::new(3);
        let rule = fx.non_cubic(2);
        let ids = fx.store.rule(rule).unwrap().polygons.clone();
        AssignFacies::new(ids[0], Some(fx.codes[0]))
            .execute(&mut fx.store)
            .unwrap();
        AssignFacies::new(ids[1], Some(fx.codes[1]))
            .execute(&mut fx.store)
            .unwrap();
        let group = GetFaciesGroup::new(fx.parent, [fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        let overlay = AddPolygon::new(rule)
            .overlay(group)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();

        RemovePolygon::new(ids[0]).execute(&mut fx.store).unwrap();

        assert!(!fx.store.has_group(group));
        assert!(fx.store.polygon(overlay).is_err());
        assert_eq!(fx.store.rule(rule).unwrap().polygons, vec![ids[1]]);
    }

    #[test]
    fn removing_last_overlay_polygon_drops_group() {
        let mut fx = Fixture::new(3);
        let rule = fx.non_cubic(2);
        let ids = fx.store.rule(rule).unwrap().polygons.clone();
        AssignFacies::new(ids[0], Some(fx.codes[0]))
            .execute(&mut fx.store)
            .unwrap();
        let group = GetFaciesGroup::new(fx.parent, [fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        let overlay = AddPolygon::new(rule)
            .overlay(group)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();

        RemovePolygon::new(overlay).execute(&mut fx.store).unwrap();
        assert!(!fx.store.has_group(group));
        assert_eq!(fx.store.rule(rule).unwrap().polygons.len(), 2);
    }
}
