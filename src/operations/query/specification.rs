use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{ModelError, RegistryError, Result};
use crate::model::{Direction, PolygonData, PolygonId, RuleData, RuleId, RuleKind, RuleStore};
use crate::registry::{FaciesId, FaciesRegistry, FieldId, FieldRegistry, Parent};

/// Read-only projection of a rule, handed to the simulator and to exporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSpecification {
    pub name: String,
    pub parent: Parent,
    /// Names of the background fields, in slot order.
    pub background_fields: Vec<String>,
    /// Facies in use, in first-use order.
    pub facies: Vec<FaciesSpecification>,
    pub geometry: GeometrySpecification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaciesSpecification {
    pub code: i32,
    pub name: String,
    pub probability: f64,
}

/// Variant-specific part of a [`RuleSpecification`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometrySpecification {
    /// Only polygons with a slant factor, in canonical name order; Lagoon is
    /// implied by the rest.
    Bayfill { polygons: Vec<BayfillSpecification> },
    NonCubic {
        polygons: Vec<WedgeSpecification>,
        overlay: Option<OverlaySpecification>,
    },
    Cubic {
        direction: Direction,
        polygons: Vec<CubicSpecification>,
        overlay: Option<OverlaySpecification>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BayfillSpecification {
    pub name: &'static str,
    pub facies: i32,
    pub slant_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WedgeSpecification {
    pub order: u32,
    pub facies: i32,
    pub fraction: f64,
    pub angle: f64,
}

/// A cubic leaf, located by the orders along its path from the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubicSpecification {
    pub path: Vec<u32>,
    pub facies: i32,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySpecification {
    pub groups: Vec<OverlayGroupSpecification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayGroupSpecification {
    /// Codes of the background facies the group is carved into.
    pub background_facies: Vec<i32>,
    pub polygons: Vec<OverlayPolygonSpecification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPolygonSpecification {
    /// Position after every background polygon, counted across groups.
    pub order: u32,
    pub field: String,
    pub facies: i32,
    pub fraction: f64,
    pub center: f64,
}

/// Builds the [`RuleSpecification`] of a rule.
///
/// The rule should pass [`Validate`](super::Validate) first; missing facies
/// or fields are reported as errors here.
pub struct Specification {
    rule: RuleId,
}

/// Registries and rule a projection reads from.
struct Lookup<'a> {
    rule: &'a RuleData,
    facies: &'a dyn FaciesRegistry,
    fields: &'a dyn FieldRegistry,
}

impl Lookup<'_> {
    fn facies_code(&self, polygon: &PolygonData) -> Result<i32> {
        let id = polygon
            .facies
            .ok_or_else(|| ModelError::Incomplete("a polygon has no facies".into()))?;
        Ok(self.facies.by_id(id).ok_or(RegistryError::FaciesNotFound)?.code)
    }

    fn field_name(&self, id: Option<FieldId>) -> Result<String> {
        let id = id.ok_or_else(|| ModelError::Incomplete("a field slot is empty".into()))?;
        Ok(self
            .fields
            .by_id(id)
            .ok_or(RegistryError::FieldNotFound)?
            .name
            .clone())
    }
}

impl Specification {
    /// Creates a new `Specification` query.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// Executes the projection.
    ///
    /// # Errors
    ///
    /// Returns an error if a polygon taking part has no facies, a field slot
    /// is empty, or a facies or field is unknown to its registry.
    pub fn execute(
        &self,
        store: &RuleStore,
        facies: &dyn FaciesRegistry,
        fields: &dyn FieldRegistry,
    ) -> Result<RuleSpecification> {
        let rule = store.rule(self.rule)?;
        let lookup = Lookup {
            rule,
            facies,
            fields,
        };

        let background_fields = rule
            .background_fields
            .iter()
            .map(|slot| lookup.field_name(*slot))
            .collect::<Result<Vec<_>>>()?;

        let geometry = match &rule.kind {
            RuleKind::Bayfill => self.bayfill(store, &lookup)?,
            RuleKind::NonCubic { .. } => GeometrySpecification::NonCubic {
                polygons: self.wedges(store, &lookup)?,
                overlay: self.overlay(store, &lookup)?,
            },
            RuleKind::Cubic {
                direction, root, ..
            } => GeometrySpecification::Cubic {
                direction: *direction,
                polygons: Self::cubic_leaves(store, &lookup, *root)?,
                overlay: self.overlay(store, &lookup)?,
            },
        };

        Ok(RuleSpecification {
            name: rule.name.clone(),
            parent: rule.parent,
            background_fields,
            facies: self.facies_in_use(store, &lookup)?,
            geometry,
        })
    }

    fn facies_in_use(&self, store: &RuleStore, lookup: &Lookup<'_>) -> Result<Vec<FaciesSpecification>> {
        let mut seen: BTreeSet<FaciesId> = BTreeSet::new();
        let mut out = Vec::new();
        for (_, polygon) in store.active_polygons(self.rule)? {
            let Some(id) = polygon.facies else { continue };
            if !seen.insert(id) {
                continue;
            }
            let facies = lookup.facies.by_id(id).ok_or(RegistryError::FaciesNotFound)?;
            out.push(FaciesSpecification {
                code: facies.code,
                name: facies.name.clone(),
                probability: lookup
                    .facies
                    .preview_probability(&lookup.rule.parent, id)
                    .unwrap_or(0.0),
            });
        }
        Ok(out)
    }

    fn bayfill(&self, store: &RuleStore, lookup: &Lookup<'_>) -> Result<GeometrySpecification> {
        let mut polygons = Vec::new();
        for (_, polygon) in store.polygons_of(self.rule)? {
            let Some(bayfill) = polygon.as_bayfill() else { continue };
            let Some(slant_factor) = bayfill.slant_factor.filter(|_| bayfill.name.has_slant_factor()) else {
                continue;
            };
            polygons.push(BayfillSpecification {
                name: bayfill.name.as_str(),
                facies: lookup.facies_code(polygon)?,
                slant_factor,
            });
        }
        Ok(GeometrySpecification::Bayfill { polygons })
    }

    fn wedges(&self, store: &RuleStore, lookup: &Lookup<'_>) -> Result<Vec<WedgeSpecification>> {
        let mut wedges = Vec::new();
        for (_, polygon) in store.background_polygons(self.rule)? {
            let Some(wedge) = polygon.as_non_cubic() else { continue };
            wedges.push(WedgeSpecification {
                order: wedge.order,
                facies: lookup.facies_code(polygon)?,
                fraction: polygon.fraction,
                angle: wedge.angle,
            });
        }
        wedges.sort_by_key(|w| w.order);
        Ok(wedges)
    }

    /// Leaves in depth-first order, children visited by order.
    fn cubic_leaves(
        store: &RuleStore,
        lookup: &Lookup<'_>,
        root: PolygonId,
    ) -> Result<Vec<CubicSpecification>> {
        let mut leaves = Vec::new();
        let mut stack: Vec<(PolygonId, Vec<u32>)> = vec![(root, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            let children = store.cubic_children(node)?;
            if children.is_empty() {
                let polygon = store.polygon(node)?;
                leaves.push(CubicSpecification {
                    facies: lookup.facies_code(polygon)?,
                    fraction: polygon.fraction,
                    path,
                });
                continue;
            }
            for child in children.into_iter().rev() {
                let mut child_path = path.clone();
                child_path.push(store.polygon(child)?.order());
                stack.push((child, child_path));
            }
        }
        Ok(leaves)
    }

    fn overlay(&self, store: &RuleStore, lookup: &Lookup<'_>) -> Result<Option<OverlaySpecification>> {
        if !lookup.rule.uses_overlay() {
            return Ok(None);
        }
        let offset = store.background_polygons(self.rule)?.len();
        let mut order = u32::try_from(offset)
            .map_err(|_| ModelError::InvalidStructure("too many polygons".into()))?;

        let mut groups = Vec::new();
        for group in store.overlay_groups(self.rule)? {
            let mut background_facies = Vec::new();
            for facies in &store.group(group)?.facies {
                background_facies.push(lookup.facies.by_id(*facies).ok_or(RegistryError::FaciesNotFound)?.code);
            }
            let mut polygons = Vec::new();
            for (_, polygon) in store.overlay_polygons_in_group(self.rule, group)? {
                let Some(overlay) = polygon.as_overlay() else { continue };
                order += 1;
                polygons.push(OverlayPolygonSpecification {
                    order,
                    field: lookup.field_name(overlay.field)?,
                    facies: lookup.facies_code(polygon)?,
                    fraction: polygon.fraction,
                    center: overlay.center,
                });
            }
            groups.push(OverlayGroupSpecification {
                background_facies,
                polygons,
            });
        }
        Ok(Some(OverlaySpecification { groups }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TruncationError;
    use crate::operations::creation::{CreateBayfillRule, CubicLayout, GetFaciesGroup};
    use crate::operations::editing::{
        AddPolygon, AssignFacies, SetOverlayField, Split, ToggleOverlay,
    };
    use crate::operations::fixtures::Fixture;
    use crate::registry::Variogram;

    fn assign_all(fx: &mut Fixture, polygons: &[PolygonId], facies: &[FaciesId]) {
        for (polygon, facies) in polygons.iter().zip(facies) {
            AssignFacies::new(*polygon, Some(*facies))
                .execute(&mut fx.store)
                .unwrap();
        }
    }

    #[test]
    fn bayfill_omits_lagoon() {
        let mut fx = Fixture::new(5);
        let third = fx.fields.add(fx.parent, "GRF03", Variogram::default());
        let rule = CreateBayfillRule::new(fx.parent, "bayfill")
            .background_fields([Some(fx.background[0]), Some(fx.background[1]), Some(third)])
            .execute(&mut fx.store)
            .unwrap();
        let ids = fx.store.rule(rule).unwrap().polygons.clone();
        let codes = fx.codes.clone();
        assign_all(&mut fx, &ids, &codes);

        let spec = Specification::new(rule)
            .execute(&fx.store, &fx.facies, &fx.fields)
            .unwrap();

        assert_eq!(spec.background_fields, vec!["GRF01", "GRF02", "GRF03"]);
        assert_eq!(spec.facies.len(), 5);
        let GeometrySpecification::Bayfill { polygons } = spec.geometry else {
            panic!("expected bayfill geometry");
        };
        assert_eq!(polygons.len(), 4);
        assert!(polygons.iter().all(|p| p.name != "Lagoon"));
    }

    #[test]
    fn cubic_paths_follow_orders() {
        let mut fx = Fixture::new(3);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        let top = fx.store.cubic_children(root).unwrap();
        let nested = Split::new(top[1], 2).execute(&mut fx.store).unwrap();
        let codes = fx.codes.clone();
        assign_all(&mut fx, &[top[0], nested[0], nested[1]], &codes);

        let spec = Specification::new(rule)
            .execute(&fx.store, &fx.facies, &fx.fields)
            .unwrap();

        let GeometrySpecification::Cubic {
            direction,
            polygons,
            overlay,
        } = spec.geometry
        else {
            panic!("expected cubic geometry");
        };
        assert_eq!(direction, Direction::Horizontal);
        let paths: Vec<_> = polygons.iter().map(|p| p.path.clone()).collect();
        assert_eq!(paths, vec![vec![1], vec![2, 1], vec![2, 2]]);
        assert_eq!(polygons[1].facies, 2);
        assert!(overlay.is_none());
    }

    #[test]
    fn serializes_with_geometry_tag() {
        let mut fx = Fixture::new(2);
        let rule = fx.cubic(CubicLayout::leaves(2));
        let root = fx.store.rule(rule).unwrap().cubic_root().unwrap();
        let leaves = fx.store.cubic_children(root).unwrap();
        let codes = fx.codes.clone();
        assign_all(&mut fx, &leaves, &codes);

        let spec = Specification::new(rule)
            .execute(&fx.store, &fx.facies, &fx.fields)
            .unwrap();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["geometry"]["type"], "cubic");
        assert_eq!(json["geometry"]["direction"], "H");
        assert_eq!(json["geometry"]["polygons"][1]["path"], serde_json::json!([2]));
        assert_eq!(json["background_fields"][0], "GRF01");
    }

    #[test]
    fn overlay_orders_follow_background() {
        let mut fx = Fixture::new(3);
        let rule = fx.non_cubic(2);
        let wedges = fx.store.rule(rule).unwrap().polygons.clone();
        let codes = fx.codes.clone();
        assign_all(&mut fx, &wedges, &codes[..2]);
        ToggleOverlay::new(rule, true)
            .execute(&mut fx.store, &mut fx.fields)
            .unwrap();
        let group = GetFaciesGroup::new(fx.parent, [fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        let overlays = [
            AddPolygon::new(rule)
                .overlay(group)
                .execute(&mut fx.store, &mut fx.fields)
                .unwrap(),
            AddPolygon::new(rule)
                .overlay(group)
                .execute(&mut fx.store, &mut fx.fields)
                .unwrap(),
        ];
        let alpha = fx.fields.add(fx.parent, "ALPHA", Variogram::default());
        for overlay in overlays {
            SetOverlayField::new(overlay, Some(alpha))
                .execute(&mut fx.store)
                .unwrap();
        }
        let secondary = [fx.codes[2]; 2];
        assign_all(&mut fx, &overlays, &secondary);

        let spec = Specification::new(rule)
            .execute(&fx.store, &fx.facies, &fx.fields)
            .unwrap();

        let GeometrySpecification::NonCubic { polygons, overlay } = spec.geometry else {
            panic!("expected non-cubic geometry");
        };
        assert_eq!(polygons.len(), 2);
        let overlay = overlay.unwrap();
        assert_eq!(overlay.groups.len(), 1);
        assert_eq!(overlay.groups[0].background_facies, vec![1]);
        let orders: Vec<_> = overlay.groups[0].polygons.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![3, 4]);
        assert_eq!(overlay.groups[0].polygons[0].field, "ALPHA");
    }

    #[test]
    fn missing_facies_is_an_error() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let result = Specification::new(rule).execute(&fx.store, &fx.facies, &fx.fields);
        assert!(matches!(
            result,
            Err(TruncationError::Model(ModelError::Incomplete(_)))
        ));
    }
}
