use std::collections::BTreeSet;

use crate::error::{EditError, Result};
use crate::model::{FaciesGroupData, FaciesGroupId, RuleStore};
use crate::registry::{FaciesId, Parent};

/// Resolves the facies group of a zone/region for a set of facies.
///
/// Returns the registered group if one exists for exactly this set,
/// otherwise creates it.
pub struct GetFaciesGroup {
    parent: Parent,
    facies: BTreeSet<FaciesId>,
}

impl GetFaciesGroup {
    /// Creates a new `GetFaciesGroup` operation.
    #[must_use]
    pub fn new(parent: Parent, facies: impl IntoIterator<Item = FaciesId>) -> Self {
        Self {
            parent,
            facies: facies.into_iter().collect(),
        }
    }

    /// Executes the lookup, creating the group if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the facies set is empty, or if one of the facies
    /// already belongs to a different group in the same zone/region.
    pub fn execute(&self, store: &mut RuleStore) -> Result<FaciesGroupId> {
        if self.facies.is_empty() {
            return Err(EditError::InvalidInput("a facies group needs at least one facies".into()).into());
        }
        if let Some(existing) = store.find_group(&self.parent, &self.facies) {
            return Ok(existing);
        }
        if self
            .facies
            .iter()
            .any(|f| store.group_containing(&self.parent, *f).is_some())
        {
            return Err(EditError::InvalidInput(format!(
                "a facies is already used by another group in {}",
                self.parent
            ))
            .into());
        }

        let id = store.add_group(FaciesGroupData {
            parent: self.parent,
            facies: self.facies.clone(),
        });
        tracing::debug!(group = ?id, parent = %self.parent, size = self.facies.len(), "created facies group");
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::fixtures::Fixture;

    #[test]
    fn get_or_create_is_idempotent() {
        let mut fx = Fixture::new(3);
        let a = GetFaciesGroup::new(fx.parent, [fx.codes[0], fx.codes[1]])
            .execute(&mut fx.store)
            .unwrap();
        let b = GetFaciesGroup::new(fx.parent, [fx.codes[1], fx.codes[0]])
            .execute(&mut fx.store)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(fx.store.groups_in(&fx.parent).count(), 1);
    }

    #[test]
    fn empty_set_rejected() {
        let mut fx = Fixture::new(1);
        let result = GetFaciesGroup::new(fx.parent, Vec::<FaciesId>::new()).execute(&mut fx.store);
        assert!(result.is_err());
    }

    #[test]
    fn facies_belongs_to_one_group_per_parent() {
        let mut fx = Fixture::new(3);
        GetFaciesGroup::new(fx.parent, [fx.codes[0], fx.codes[1]])
            .execute(&mut fx.store)
            .unwrap();
        let overlapping = GetFaciesGroup::new(fx.parent, [fx.codes[1], fx.codes[2]])
            .execute(&mut fx.store);
        assert!(overlapping.is_err());

        let elsewhere = GetFaciesGroup::new(Parent::zone(2), [fx.codes[1]])
            .execute(&mut fx.store);
        assert!(elsewhere.is_ok());
    }
}
