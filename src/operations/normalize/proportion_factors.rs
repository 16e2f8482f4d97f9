use std::collections::BTreeMap;

use crate::error::Result;
use crate::math::{approx_eq, uniform_share};
use crate::model::{PolygonId, RuleId, RuleStore};
use crate::registry::FaciesId;

/// Makes the fractions of polygons sharing a facies sum to one.
///
/// Facies whose fractions already sum to one are left untouched. Otherwise the
/// fractions are reset to a uniform split, or rescaled proportionally when
/// [`EngineConfig::proportional_fractions`](crate::config::EngineConfig) is on
/// and every fraction is positive. A facies with a single carrier always ends
/// up with fraction 1.
pub struct NormalizeProportionFactors {
    rule: RuleId,
}

impl NormalizeProportionFactors {
    /// Creates a new `NormalizeProportionFactors` operation.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// Executes the normalization, returning how many polygons changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn execute(&self, store: &mut RuleStore) -> Result<usize> {
        let tol = store.config().tolerance;
        let proportional = store.config().proportional_fractions;

        let mut by_facies: BTreeMap<FaciesId, Vec<(PolygonId, f64)>> = BTreeMap::new();
        for (id, polygon) in store.active_polygons(self.rule)? {
            if let Some(facies) = polygon.facies {
                by_facies
                    .entry(facies)
                    .or_default()
                    .push((id, polygon.fraction));
            }
        }

        let mut updates: Vec<(PolygonId, f64)> = Vec::new();
        for members in by_facies.values() {
            if let [(id, fraction)] = members.as_slice() {
                if !approx_eq(*fraction, 1.0, f64::EPSILON) {
                    updates.push((*id, 1.0));
                }
                continue;
            }

            let sum: f64 = members.iter().map(|(_, f)| f).sum();
            if approx_eq(sum, 1.0, tol) {
                continue;
            }

            if proportional && members.iter().all(|(_, f)| *f > 0.0) {
                updates.extend(members.iter().map(|(id, f)| (*id, f / sum)));
            } else {
                tracing::warn!(
                    polygons = members.len(),
                    sum,
                    "fractions do not sum to 1, resetting to a uniform split"
                );
                let share = uniform_share(members.len());
                updates.extend(members.iter().map(|(id, _)| (*id, share)));
            }
        }

        for (id, fraction) in &updates {
            store.polygon_mut(*id)?.fraction = *fraction;
        }
        Ok(updates.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::EngineConfig;
    use crate::operations::fixtures::Fixture;

    fn assign(fx: &mut Fixture, rule: RuleId, facies: &[usize], fractions: &[f64]) -> Vec<PolygonId> {
        let ids = fx.store.rule(rule).unwrap().polygons.clone();
        for ((id, f), fraction) in ids.iter().zip(facies).zip(fractions) {
            let polygon = fx.store.polygon_mut(*id).unwrap();
            polygon.facies = Some(fx.codes[*f]);
            polygon.fraction = *fraction;
        }
        ids
    }

    #[test]
    fn uniform_reset_not_proportional() {
        let mut fx = Fixture::new(2);
        let rule = fx.non_cubic(3);
        let ids = assign(&mut fx, rule, &[0, 0, 1], &[0.3, 0.3, 1.0]);

        NormalizeProportionFactors::new(rule)
            .execute(&mut fx.store)
            .unwrap();

        assert_relative_eq!(fx.store.polygon(ids[0]).unwrap().fraction, 0.5, epsilon = 1e-12);
        assert_relative_eq!(fx.store.polygon(ids[1]).unwrap().fraction, 0.5, epsilon = 1e-12);
        assert_relative_eq!(fx.store.polygon(ids[2]).unwrap().fraction, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn uniform_reset_discards_skewed_fractions() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let ids = assign(&mut fx, rule, &[0, 0], &[0.2, 0.6]);

        NormalizeProportionFactors::new(rule)
            .execute(&mut fx.store)
            .unwrap();

        assert_relative_eq!(fx.store.polygon(ids[0]).unwrap().fraction, 0.5, epsilon = 1e-12);
        assert_relative_eq!(fx.store.polygon(ids[1]).unwrap().fraction, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn proportional_rescale_when_enabled() {
        let mut fx = Fixture::new(1);
        fx.store = RuleStore::with_config(EngineConfig {
            proportional_fractions: true,
            ..EngineConfig::default()
        });
        let rule = fx.non_cubic(2);
        let ids = assign(&mut fx, rule, &[0, 0], &[0.2, 0.6]);

        NormalizeProportionFactors::new(rule)
            .execute(&mut fx.store)
            .unwrap();

        assert_relative_eq!(fx.store.polygon(ids[0]).unwrap().fraction, 0.25, epsilon = 1e-12);
        assert_relative_eq!(fx.store.polygon(ids[1]).unwrap().fraction, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn normalized_groups_untouched() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(3);
        let ids = assign(&mut fx, rule, &[0, 0, 0], &[0.2, 0.3, 0.5]);

        let changed = NormalizeProportionFactors::new(rule)
            .execute(&mut fx.store)
            .unwrap();

        assert_eq!(changed, 0);
        assert_relative_eq!(fx.store.polygon(ids[0]).unwrap().fraction, 0.2, epsilon = 1e-12);
        assert_relative_eq!(fx.store.polygon(ids[2]).unwrap().fraction, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn single_carrier_forced_to_one() {
        let mut fx = Fixture::new(2);
        let rule = fx.non_cubic(2);
        let ids = assign(&mut fx, rule, &[0, 1], &[0.4, 1.0]);

        NormalizeProportionFactors::new(rule)
            .execute(&mut fx.store)
            .unwrap();

        assert_relative_eq!(fx.store.polygon(ids[0]).unwrap().fraction, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn polygons_without_facies_are_ignored() {
        let mut fx = Fixture::new(1);
        let rule = fx.non_cubic(2);
        let ids = fx.store.rule(rule).unwrap().polygons.clone();
        fx.store.polygon_mut(ids[0]).unwrap().fraction = 0.3;

        let changed = NormalizeProportionFactors::new(rule)
            .execute(&mut fx.store)
            .unwrap();

        assert_eq!(changed, 0);
        assert_relative_eq!(fx.store.polygon(ids[0]).unwrap().fraction, 0.3, epsilon = 1e-12);
    }
}
