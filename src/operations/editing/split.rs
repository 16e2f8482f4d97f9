use super::NormalizeOrder;
use crate::error::{EditError, Result};
use crate::model::{PolygonId, RuleStore};

/// Splits a cubic leaf into `parts` new leaves, turning it into an interior node.
///
/// The leaf keeps its place among its siblings. Its facies and fraction are
/// dropped unless [`Split::keep_facies`] asks for them to move to the first
/// new child.
pub struct Split {
    polygon: PolygonId,
    parts: usize,
    keep_facies: bool,
}

impl Split {
    /// Creates a new `Split` operation.
    #[must_use]
    pub fn new(polygon: PolygonId, parts: usize) -> Self {
        Self {
            polygon,
            parts,
            keep_facies: false,
        }
    }

    /// Moves the leaf's facies and fraction to the first new child.
    #[must_use]
    pub fn keep_facies(mut self, keep: bool) -> Self {
        self.keep_facies = keep;
        self
    }

    /// Executes the split, returning the new children in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule is not cubic, the polygon is not a leaf,
    /// fewer than two parts are requested, or the children would sit deeper
    /// than the configured maximum.
    pub fn execute(&self, store: &mut RuleStore) -> Result<Vec<PolygonId>> {
        let data = store.polygon(self.polygon)?;
        let rule = data.rule;
        let Some(cubic) = data.as_cubic() else {
            return Err(EditError::Unsupported {
                rule: store.rule(rule)?.kind_name(),
                operation: "split",
            }
            .into());
        };
        if !cubic.children.is_empty() {
            return Err(EditError::InvalidInput("only leaf polygons can be split".into()).into());
        }
        if self.parts < 2 {
            return Err(EditError::InvalidInput("a split needs at least two parts".into()).into());
        }
        let level = cubic.level + 1;
        let max = store.config().max_cubic_level;
        if level > max {
            return Err(EditError::TooDeep { level, max }.into());
        }
        let (facies, fraction) = (data.facies, data.fraction);

        {
            let leaf = store.polygon_mut(self.polygon)?;
            leaf.facies = None;
            leaf.fraction = 1.0;
        }
        let mut children = Vec::with_capacity(self.parts);
        for order in (1..).take(self.parts) {
            children.push(store.add_cubic_child(self.polygon, order)?);
        }
        if self.keep_facies {
            let first = store.polygon_mut(children[0])?;
            first.facies = facies;
            first.fraction = fraction;
        }

        NormalizeOrder::new(rule).execute(store)?;
        super::settle(store, rule)?;
        tracing::debug!(rule = ?rule, polygon = ?self.polygon, parts = self.parts, "split polygon");
        Ok(children)
    }
}
