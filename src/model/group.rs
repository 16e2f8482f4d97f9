use std::collections::BTreeSet;

use crate::registry::{FaciesId, Parent};

slotmap::new_key_type! {
    /// Unique identifier for a facies group in the rule store.
    pub struct FaciesGroupId;
}

/// A deduplicated set of background facies that overlay polygons are anchored to.
///
/// Groups are identified by `(parent, facies)`; see
/// [`GetFaciesGroup`](crate::operations::creation::GetFaciesGroup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaciesGroupData {
    pub parent: Parent,
    /// Never empty while the group is registered.
    pub facies: BTreeSet<FaciesId>,
}

impl FaciesGroupData {
    /// Returns `true` if the facies is a member of this group.
    #[must_use]
    pub fn contains(&self, facies: FaciesId) -> bool {
        self.facies.contains(&facies)
    }
}
