use super::{NormalizeOrder, RemovePolygon};
use crate::error::{EditError, Result};
use crate::model::{PolygonId, RuleStore};

/// Merges cubic siblings back into their parent.
///
/// All polygons must share the same parent; this is checked before anything
/// is removed. A non-root parent left without children becomes a leaf again.
/// The root never becomes a leaf: it gets one fresh child instead.
pub struct Merge {
    polygons: Vec<PolygonId>,
}

impl Merge {
    /// Creates a new `Merge` operation.
    #[must_use]
    pub fn new(polygons: impl IntoIterator<Item = PolygonId>) -> Self {
        let mut unique = Vec::new();
        for polygon in polygons {
            if !unique.contains(&polygon) {
                unique.push(polygon);
            }
        }
        Self { polygons: unique }
    }

    /// Executes the merge, returning the leaf that took the merged polygons' place,
    /// if the parent was emptied.
    ///
    /// # Errors
    ///
    /// Returns an error if no polygons are given, the rule is not cubic, or the
    /// polygons do not all share one parent.
    pub fn execute(&self, store: &mut RuleStore) -> Result<Option<PolygonId>> {
        let Some(first) = self.polygons.first() else {
            return Err(EditError::InvalidInput("nothing to merge".into()).into());
        };
        let rule = store.polygon(*first)?.rule;
        if !store.rule(rule)?.is_cubic() {
            return Err(EditError::Unsupported {
                rule: store.rule(rule)?.kind_name(),
                operation: "merge",
            }
            .into());
        }

        let mut parents = Vec::with_capacity(self.polygons.len());
        for polygon in &self.polygons {
            let data = store.polygon(*polygon)?;
            parents.push(data.as_cubic().and_then(|c| c.parent).filter(|_| data.rule == rule));
        }
        let Some(parent) = parents[0] else {
            return Err(EditError::ParentMismatch.into());
        };
        if parents.iter().any(|p| *p != Some(parent)) {
            return Err(EditError::ParentMismatch.into());
        }

        let siblings = store.cubic_children(parent)?.len();
        let emptied = siblings == self.polygons.len();
        let is_root = store.rule(rule)?.cubic_root() == Some(parent);

        // The root never goes without children, so its new leaf comes first.
        let replacement = match (emptied, is_root) {
            (true, true) => {
                let order = u32::try_from(siblings + 1)
                    .map_err(|_| EditError::InvalidInput("too many siblings".into()))?;
                Some(store.add_cubic_child(parent, order)?)
            }
            (true, false) => Some(parent),
            (false, _) => None,
        };
        for polygon in &self.polygons {
            RemovePolygon::new(*polygon).execute(store)?;
        }
        NormalizeOrder::new(rule).execute(store)?;
        super::settle(store, rule)?;

        tracing::debug!(rule = ?rule, parent = ?parent, merged = self.polygons.len(), "merged polygons");
        Ok(replacement)
    }
}
