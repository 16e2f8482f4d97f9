use super::namespace::OrderNamespace;
use super::overlay::{provision_overlay_field, unused_overlay_field};
use super::NormalizeOrder;
use crate::error::{EditError, ModelError, Result, TruncationError};
use crate::model::{
    FaciesGroupId, NonCubicPolygon, OverlayPolygon, PolygonData, PolygonId, PolygonKind, RuleKind,
    RuleId, RuleStore,
};
use crate::registry::FieldRegistry;

/// Center given to new overlay polygons.
const DEFAULT_CENTER: f64 = 0.5;

/// Adds a polygon to a non-cubic or cubic rule.
///
/// Without an explicit order the polygon goes last among its siblings;
/// siblings at or after the new order move one step later. Overlay polygons
/// are ordered within their group.
pub struct AddPolygon {
    rule: RuleId,
    group: Option<FaciesGroupId>,
    order: Option<u32>,
    parent: Option<PolygonId>,
    at_level: Option<u32>,
}

/// Where the new polygon goes, resolved before anything is mutated.
#[derive(Clone, Copy)]
enum Placement {
    Wedge,
    Overlay(FaciesGroupId),
    Cubic(PolygonId),
}

impl AddPolygon {
    /// Creates a new `AddPolygon` operation for a background polygon.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self {
            rule,
            group: None,
            order: None,
            parent: None,
            at_level: None,
        }
    }

    /// Makes the new polygon an overlay polygon anchored to `group`.
    #[must_use]
    pub fn overlay(mut self, group: FaciesGroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Inserts at this one-based order instead of last.
    #[must_use]
    pub fn order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// Cubic parent to insert under. Defaults to the root.
    #[must_use]
    pub fn parent(mut self, parent: PolygonId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Expected level of the new cubic polygon.
    #[must_use]
    pub fn at_level(mut self, level: u32) -> Self {
        self.at_level = Some(level);
        self
    }

    /// Executes the operation, returning the new polygon.
    ///
    /// # Errors
    ///
    /// Returns an error for bayfill rules, unknown or foreign groups and
    /// parents, a zero order, a leaf parent, a level mismatch, a level past
    /// the configured maximum, or a failing field provisioning.
    pub fn execute<F>(&self, store: &mut RuleStore, fields: &mut F) -> Result<PolygonId>
    where
        F: FieldRegistry + ?Sized,
    {
        if self.order == Some(0) {
            return Err(EditError::InvalidInput("polygon orders start at 1".into()).into());
        }
        let placement = self.placement(store)?;

        let namespace = match placement {
            Placement::Wedge => OrderNamespace::Wedges(self.rule),
            Placement::Overlay(group) => OrderNamespace::OverlayGroup(self.rule, group),
            Placement::Cubic(parent) => OrderNamespace::Siblings(parent),
        };
        let order = match self.order {
            Some(order) => order,
            None => namespace.next_order(store)?,
        };

        let field = match placement {
            Placement::Overlay(group) => {
                match provision_overlay_field(store, self.rule, fields, Some(group))? {
                    Some(created) => Some(created),
                    None => unused_overlay_field(store, self.rule, &*fields)?,
                }
            }
            _ => None,
        };

        namespace.open_gap(store, order)?;
        let id = match placement {
            Placement::Wedge => store.add_polygon(PolygonData::new(
                self.rule,
                PolygonKind::NonCubic(NonCubicPolygon { order, angle: 0.0 }),
            ))?,
            Placement::Overlay(group) => store.add_polygon(PolygonData::new(
                self.rule,
                PolygonKind::Overlay(OverlayPolygon {
                    order,
                    group,
                    field,
                    center: DEFAULT_CENTER,
                }),
            ))?,
            Placement::Cubic(parent) => store.add_cubic_child(parent, order)?,
        };
        NormalizeOrder::new(self.rule).execute(store)?;

        tracing::debug!(rule = ?self.rule, polygon = ?id, order, "added polygon");
        Ok(id)
    }

    fn placement(&self, store: &RuleStore) -> Result<Placement> {
        let rule = store.rule(self.rule)?;
        let tree_position = self.parent.is_some() || self.at_level.is_some();
        if let Some(group) = self.group {
            if rule.is_bayfill() {
                return Err(bayfill_fixed());
            }
            if tree_position {
                return Err(not_in_tree("overlay polygons"));
            }
            let data = store.group(group).map_err(|_| EditError::GroupNotFound)?;
            if data.parent != rule.parent {
                return Err(EditError::InvalidInput(
                    "facies group belongs to another zone/region".into(),
                )
                .into());
            }
            return Ok(Placement::Overlay(group));
        }

        match &rule.kind {
            RuleKind::Bayfill => Err(bayfill_fixed()),
            RuleKind::NonCubic { .. } if tree_position => Err(not_in_tree("non-cubic polygons")),
            RuleKind::NonCubic { .. } => Ok(Placement::Wedge),
            RuleKind::Cubic { root, .. } => {
                let root = *root;
                let parent = self.parent.unwrap_or(root);
                let data = store.polygon(parent)?;
                let cubic = data.as_cubic().filter(|_| data.rule == self.rule).ok_or_else(|| {
                    ModelError::InvalidStructure("parent is not a polygon of this cubic rule".into())
                })?;
                if cubic.children.is_empty() && parent != root {
                    return Err(EditError::InvalidInput(
                        "cannot add a child to a leaf polygon, split it instead".into(),
                    )
                    .into());
                }
                let level = cubic.level + 1;
                if self.at_level.is_some_and(|l| l != level) {
                    return Err(EditError::InvalidInput(format!(
                        "a child of this parent sits at level {level}"
                    ))
                    .into());
                }
                let max = store.config().max_cubic_level;
                if level > max {
                    return Err(EditError::TooDeep { level, max }.into());
                }
                Ok(Placement::Cubic(parent))
            }
        }
    }
}

fn not_in_tree(what: &str) -> TruncationError {
    EditError::InvalidInput(format!("{what} have no cubic parent or level")).into()
}

fn bayfill_fixed() -> TruncationError {
    EditError::Unsupported {
        rule: "bayfill",
        operation: "add polygon (bayfill rules have exactly 5 polygons)",
    }
    .into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{
        CreateBayfillRule, CreateNonCubicRule, CubicLayout, GetFaciesGroup,
    };
    use crate::operations::fixtures::Fixture;
    use crate::registry::Parent;

    fn sibling_orders(store: &RuleStore, parent: PolygonId) -> Vec<u32> {
        store
            .cubic_children(parent)
            .unwrap()
            .iter()
            .map(|id| store.polygon(*id).unwrap().order())
            .collect()
    }

    #[test]
    fn wedge_appended_last() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let id = AddPolygon::new(rule)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        assert_eq!(fx.store.polygon(id).unwrap().order(), 3);
    }

    #[test]
    fn wedge_inserted_shifts_siblings() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let before = fx.store.rule(rule).unwrap().polygons.clone();
        let id = AddPolygon::new(rule)
            .order(1)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        assert_eq!(fx.store.polygon(id).unwrap().order(), 1);
        assert_eq!(fx.store.polygon(before[0]).unwrap().order(), 2);
        assert_eq!(fx.store.polygon(before[1]).unwrap().order(), 3);
    }

    #[test]
    fn cubic_insert_renumbers() {
        let mut fx = Fixture::new(1);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        let id = AddPolygon::new(rule)
            .order(9)
            .at_level(1)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        assert_eq!(sibling_orders(&fx.store, root), vec![1, 2, 3]);
        assert_eq!(fx.store.polygon(id).unwrap().order(), 3);
    }

    #[test]
    fn cubic_leaf_parent_rejected() {
        let mut fx = Fixture::new(1);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        let leaf = fx.store.cubic_children(root).unwrap()[0];
        let result = AddPolygon::new(rule)
            .parent(leaf)
            .execute(&mut fx.store, &mut fx.fields);
        assert!(result.is_err());
    }

    #[test]
    fn cubic_level_mismatch_rejected() {
        let mut fx = Fixture::new(1);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let result = AddPolygon::new(rule)
            .at_level(2)
            .execute(&mut fx.store, &mut fx.fields);
        assert!(matches!(result, Err(TruncationError::Edit(EditError::InvalidInput(_)))));
    }

    #[test]
    fn tree_position_rejected_outside_cubic_tree() {
        let mut fx = Fixture::new(1);
        let cubic = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(cubic).unwrap().cubic_root().unwrap();
        let rule = CreateNonCubicRule::new(Parent::zone(2), "wedges", vec![0.0, 0.0])
            .execute(&mut fx.store)
            .unwrap();

        let with_level = AddPolygon::new(rule)
            .at_level(1)
            .execute(&mut fx.store, &mut fx.fields);
        assert!(matches!(with_level, Err(TruncationError::Edit(EditError::InvalidInput(_)))));
        let with_parent = AddPolygon::new(rule)
            .parent(root)
            .execute(&mut fx.store, &mut fx.fields);
        assert!(matches!(with_parent, Err(TruncationError::Edit(EditError::InvalidInput(_)))));
        assert_eq!(fx.store.rule(rule).unwrap().polygons.len(), 2);
    }

    #[test]
    fn bayfill_rejects_sixth_polygon() {
        let mut fx = Fixture::new(5);
        let rule = CreateBayfillRule::new(fx.parent, "bayfill")
            .execute(&mut fx.store)
            .unwrap();
        let result = AddPolygon::new(rule).execute(&mut fx.store, &mut fx.fields);
        assert!(matches!(
            result,
            Err(TruncationError::Edit(EditError::Unsupported { .. }))
        ));
        assert_eq!(fx.store.rule(rule).unwrap().polygons.len(), 5);
    }

    #[test]
    fn first_overlay_in_group_provisions_one_field() {
        let mut fx = Fixture::new(3);
        let rule = fx.non_cubic(2);
        let group = GetFaciesGroup::new(fx.parent, [fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        assert_eq!(fx.fields.list_available(&fx.parent).len(), 2);

        let first = AddPolygon::new(rule)
            .overlay(group)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        assert_eq!(fx.fields.list_available(&fx.parent).len(), 3);
        let field = fx.store.polygon(first).unwrap().as_overlay().unwrap().field;
        assert!(field.is_some());

        let second = AddPolygon::new(rule)
            .overlay(group)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        assert_eq!(fx.fields.list_available(&fx.parent).len(), 3);
        assert_eq!(fx.store.polygon(second).unwrap().order(), 2);
        assert!(fx.store.polygon(second).unwrap().as_overlay().unwrap().field.is_none());
    }

    #[test]
    fn second_group_provisions_another_field() {
        let mut fx = Fixture::new(3);
        let rule = fx.non_cubic(2);
        let a = GetFaciesGroup::new(fx.parent, [fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        let b = GetFaciesGroup::new(fx.parent, [fx.codes[1]])
            .execute(&mut fx.store)
            .unwrap();
        let pa = AddPolygon::new(rule)
            .overlay(a)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        let pb = AddPolygon::new(rule)
            .overlay(b)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        assert_eq!(fx.fields.list_available(&fx.parent).len(), 4);
        assert_eq!(fx.store.polygon(pa).unwrap().order(), 1);
        assert_eq!(fx.store.polygon(pb).unwrap().order(), 1);
    }

    #[test]
    fn foreign_group_rejected() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let group = GetFaciesGroup::new(Parent::zone(2), [fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        let result = AddPolygon::new(rule)
            .overlay(group)
            .execute(&mut fx.store, &mut fx.fields);
        assert!(result.is_err());
        assert_eq!(fx.fields.len(), 2);
    }
}
