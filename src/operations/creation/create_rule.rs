use crate::error::{EditError, Result};
use crate::model::{
    BayfillName, BayfillPolygon, CubicPolygon, Direction, NonCubicPolygon, OverlaySettings,
    PolygonData, PolygonId, PolygonKind, RuleData, RuleId, RuleKind, RuleStore,
};
use crate::registry::{FieldId, Parent};

/// Number of background fields a bayfill rule truncates on.
pub const BAYFILL_FIELDS: usize = 3;

/// Default slant factor given to new bayfill polygons.
const DEFAULT_SLANT_FACTOR: f64 = 0.5;

/// Creates a bayfill rule with its five named polygons.
pub struct CreateBayfillRule {
    parent: Parent,
    name: String,
    background_fields: Vec<Option<FieldId>>,
}

impl CreateBayfillRule {
    /// Creates a new `CreateBayfillRule` operation with empty field slots.
    #[must_use]
    pub fn new(parent: Parent, name: impl Into<String>) -> Self {
        Self {
            parent,
            name: name.into(),
            background_fields: vec![None; BAYFILL_FIELDS],
        }
    }

    /// Sets the initial background fields.
    #[must_use]
    pub fn background_fields(mut self, fields: [Option<FieldId>; BAYFILL_FIELDS]) -> Self {
        self.background_fields = fields.to_vec();
        self
    }

    /// Executes the operation, creating the rule in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone/region already has a rule.
    pub fn execute(&self, store: &mut RuleStore) -> Result<RuleId> {
        let rule = store.add_rule(RuleData {
            name: self.name.clone(),
            parent: self.parent,
            background_fields: self.background_fields.clone(),
            polygons: Vec::new(),
            realization: None,
            kind: RuleKind::Bayfill,
        })?;
        for name in BayfillName::ALL {
            store.add_polygon(PolygonData::new(
                rule,
                PolygonKind::Bayfill(BayfillPolygon {
                    name,
                    slant_factor: name.has_slant_factor().then_some(DEFAULT_SLANT_FACTOR),
                }),
            ))?;
        }
        tracing::debug!(rule = ?rule, parent = %self.parent, "created bayfill rule");
        Ok(rule)
    }
}

/// Resolves the background field slots for an overlay-capable rule.
fn background_slots(
    store: &RuleStore,
    requested: Option<&Vec<Option<FieldId>>>,
) -> Result<Vec<Option<FieldId>>> {
    let min = store.config().min_background_fields;
    match requested {
        None => Ok(vec![None; min]),
        Some(fields) if fields.len() >= min => Ok(fields.clone()),
        Some(fields) => Err(EditError::InvalidInput(format!(
            "rule needs at least {min} background field slots, got {}",
            fields.len()
        ))
        .into()),
    }
}

/// Creates a non-cubic rule with one polygon per given angle.
pub struct CreateNonCubicRule {
    parent: Parent,
    name: String,
    angles: Vec<f64>,
    background_fields: Option<Vec<Option<FieldId>>>,
}

impl CreateNonCubicRule {
    /// Creates a new `CreateNonCubicRule` operation.
    #[must_use]
    pub fn new(parent: Parent, name: impl Into<String>, angles: Vec<f64>) -> Self {
        Self {
            parent,
            name: name.into(),
            angles,
            background_fields: None,
        }
    }

    /// Sets the background field slots. Defaults to the configured minimum, all empty.
    #[must_use]
    pub fn background_fields(mut self, fields: Vec<Option<FieldId>>) -> Self {
        self.background_fields = Some(fields);
        self
    }

    /// Executes the operation, creating the rule in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if an angle is not finite, too few field slots are
    /// given, or the zone/region already has a rule.
    pub fn execute(&self, store: &mut RuleStore) -> Result<RuleId> {
        if self.angles.iter().any(|a| !a.is_finite()) {
            return Err(EditError::InvalidInput("polygon angles must be finite".into()).into());
        }
        let background_fields = background_slots(store, self.background_fields.as_ref())?;
        let rule = store.add_rule(RuleData {
            name: self.name.clone(),
            parent: self.parent,
            background_fields,
            polygons: Vec::new(),
            realization: None,
            kind: RuleKind::NonCubic {
                overlay: OverlaySettings::default(),
            },
        })?;
        for (order, angle) in (1..).zip(&self.angles) {
            store.add_polygon(PolygonData::new(
                rule,
                PolygonKind::NonCubic(NonCubicPolygon {
                    order,
                    angle: *angle,
                }),
            ))?;
        }
        tracing::debug!(rule = ?rule, parent = %self.parent, polygons = self.angles.len(), "created non-cubic rule");
        Ok(rule)
    }
}

/// Nested description of a cubic tree used when instantiating templates.
#[derive(Debug, Clone, PartialEq)]
pub enum CubicLayout {
    Leaf,
    /// Children in order.
    Split(Vec<CubicLayout>),
}

impl CubicLayout {
    /// A split into `n` leaves.
    #[must_use]
    pub fn leaves(n: usize) -> Self {
        Self::Split(vec![Self::Leaf; n])
    }

    /// Depth of the deepest leaf below this node.
    #[must_use]
    pub fn depth(&self) -> u32 {
        match self {
            Self::Leaf => 0,
            Self::Split(children) => 1 + children.iter().map(Self::depth).max().unwrap_or(0),
        }
    }

    fn has_empty_split(&self) -> bool {
        match self {
            Self::Leaf => false,
            Self::Split(children) => children.is_empty() || children.iter().any(Self::has_empty_split),
        }
    }
}

/// Creates a cubic rule from a layout whose top level splits the root.
pub struct CreateCubicRule {
    parent: Parent,
    name: String,
    direction: Direction,
    layout: CubicLayout,
    background_fields: Option<Vec<Option<FieldId>>>,
}

impl CreateCubicRule {
    /// Creates a new `CreateCubicRule` operation.
    #[must_use]
    pub fn new(
        parent: Parent,
        name: impl Into<String>,
        direction: Direction,
        layout: CubicLayout,
    ) -> Self {
        Self {
            parent,
            name: name.into(),
            direction,
            layout,
            background_fields: None,
        }
    }

    /// Sets the background field slots. Defaults to the configured minimum, all empty.
    #[must_use]
    pub fn background_fields(mut self, fields: Vec<Option<FieldId>>) -> Self {
        self.background_fields = Some(fields);
        self
    }

    /// Executes the operation, creating the rule and its tree in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not split the root, contains an
    /// empty split, is deeper than the configured maximum, too few field
    /// slots are given, or the zone/region already has a rule.
    pub fn execute(&self, store: &mut RuleStore) -> Result<RuleId> {
        let CubicLayout::Split(top) = &self.layout else {
            return Err(EditError::InvalidInput("the root of a cubic rule must be split".into()).into());
        };
        if self.layout.has_empty_split() {
            return Err(EditError::InvalidInput("a split needs at least one child".into()).into());
        }
        let max = store.config().max_cubic_level;
        let depth = self.layout.depth();
        if depth > max {
            return Err(EditError::TooDeep { level: depth, max }.into());
        }
        let background_fields = background_slots(store, self.background_fields.as_ref())?;

        let rule = store.add_rule(RuleData {
            name: self.name.clone(),
            parent: self.parent,
            background_fields,
            polygons: Vec::new(),
            realization: None,
            kind: RuleKind::Cubic {
                overlay: OverlaySettings::default(),
                direction: self.direction,
                root: PolygonId::default(),
            },
        })?;
        let root = store.add_polygon(PolygonData::new(
            rule,
            PolygonKind::Cubic(CubicPolygon {
                order: 1,
                parent: None,
                children: Vec::new(),
                level: 0,
            }),
        ))?;
        if let RuleKind::Cubic { root: slot, .. } = &mut store.rule_mut(rule)?.kind {
            *slot = root;
        }

        let mut pending: Vec<(PolygonId, &[CubicLayout])> = vec![(root, top.as_slice())];
        while let Some((node, children)) = pending.pop() {
            for (order, child) in (1..).zip(children) {
                let id = store.add_cubic_child(node, order)?;
                if let CubicLayout::Split(grandchildren) = child {
                    pending.push((id, grandchildren.as_slice()));
                }
            }
        }
        tracing::debug!(rule = ?rule, parent = %self.parent, depth, "created cubic rule");
        Ok(rule)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::TruncationError;

    #[test]
    fn bayfill_has_five_named_polygons() {
        let mut store = RuleStore::new();
        let rule = CreateBayfillRule::new(Parent::zone(1), "bayfill")
            .execute(&mut store)
            .unwrap();
        let polygons = store.polygons_of(rule).unwrap();
        assert_eq!(polygons.len(), 5);
        let lagoon = polygons
            .iter()
            .find_map(|(_, p)| p.as_bayfill().filter(|b| b.name == BayfillName::Lagoon))
            .unwrap();
        assert!(lagoon.slant_factor.is_none());
        assert_eq!(store.rule(rule).unwrap().background_fields.len(), 3);
    }

    #[test]
    fn non_cubic_orders_follow_angles() {
        let mut store = RuleStore::new();
        let rule = CreateNonCubicRule::new(Parent::zone(1), "nc", vec![0.0, 45.0, 90.0])
            .execute(&mut store)
            .unwrap();
        let orders: Vec<_> = store
            .polygons_of(rule)
            .unwrap()
            .iter()
            .map(|(_, p)| (p.order(), p.as_non_cubic().unwrap().angle))
            .collect();
        assert_eq!(orders, vec![(1, 0.0), (2, 45.0), (3, 90.0)]);
        assert_eq!(store.rule(rule).unwrap().background_fields, vec![None, None]);
    }

    #[test]
    fn too_few_background_slots_rejected() {
        let mut store = RuleStore::new();
        let result = CreateNonCubicRule::new(Parent::zone(1), "nc", vec![0.0])
            .background_fields(vec![None])
            .execute(&mut store);
        assert!(matches!(result, Err(TruncationError::Edit(EditError::InvalidInput(_)))));
    }

    #[test]
    fn cubic_tree_from_layout() {
        let mut store = RuleStore::new();
        let layout = CubicLayout::Split(vec![CubicLayout::leaves(2), CubicLayout::Leaf]);
        let rule = CreateCubicRule::new(Parent::zone(1), "cubic", Direction::Vertical, layout)
            .execute(&mut store)
            .unwrap();

        let root = store.rule(rule).unwrap().cubic_root().unwrap();
        let children = store.cubic_children(root).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(store.cubic_children(children[0]).unwrap().len(), 2);
        assert!(store.polygon(children[1]).unwrap().is_leaf());
        assert_eq!(store.leaf_polygons(rule).unwrap().len(), 3);
        assert_eq!(store.polygons_of(rule).unwrap().len(), 5);
    }

    #[test]
    fn cubic_layout_depth_is_bounded() {
        let mut store = RuleStore::with_config(EngineConfig {
            max_cubic_level: 1,
            ..EngineConfig::default()
        });
        let layout = CubicLayout::Split(vec![CubicLayout::leaves(2)]);
        let result = CreateCubicRule::new(Parent::zone(1), "cubic", Direction::Horizontal, layout)
            .execute(&mut store);
        assert!(matches!(
            result,
            Err(TruncationError::Edit(EditError::TooDeep { level: 2, max: 1 }))
        ));
        assert!(store.rule_for(&Parent::zone(1)).is_none());
    }

    #[test]
    fn cubic_root_must_split() {
        let mut store = RuleStore::new();
        let result = CreateCubicRule::new(Parent::zone(1), "cubic", Direction::Horizontal, CubicLayout::Leaf)
            .execute(&mut store);
        assert!(result.is_err());
    }
}
