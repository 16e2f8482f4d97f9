use super::namespace::OrderNamespace;
use crate::error::{EditError, Result};
use crate::model::{PolygonId, RuleStore};

/// Moves a polygon one step earlier (`-1`) or later (`+1`) among its siblings
/// by swapping orders with the neighbour, if there is one.
pub struct ChangeOrder {
    polygon: PolygonId,
    delta: i32,
}

impl ChangeOrder {
    /// Creates a new `ChangeOrder` operation.
    #[must_use]
    pub fn new(polygon: PolygonId, delta: i32) -> Self {
        Self { polygon, delta }
    }

    /// Executes the swap. Returns `false` when there is no neighbour to swap with.
    ///
    /// # Errors
    ///
    /// Returns an error if `delta` is not `±1` or the polygon belongs to a
    /// bayfill rule.
    pub fn execute(&self, store: &mut RuleStore) -> Result<bool> {
        if self.delta.abs() != 1 {
            return Err(EditError::InvalidInput("order can only change by +1 or -1".into()).into());
        }
        let data = store.polygon(self.polygon)?;
        if data.as_bayfill().is_some() {
            return Err(EditError::Unsupported {
                rule: "bayfill",
                operation: "change order",
            }
            .into());
        }
        let order = data.order();
        let Some(target) = order.checked_add_signed(self.delta).filter(|o| *o > 0) else {
            return Ok(false);
        };

        let namespace = OrderNamespace::of(store, self.polygon)?;
        let mut neighbour = None;
        for id in namespace.members(store)? {
            if id != self.polygon && store.polygon(id)?.order() == target {
                neighbour = Some(id);
                break;
            }
        }
        let Some(neighbour) = neighbour else {
            return Ok(false);
        };

        store.polygon_mut(neighbour)?.set_order(order);
        store.polygon_mut(self.polygon)?.set_order(target);
        tracing::debug!(polygon = ?self.polygon, from = order, to = target, "changed polygon order");
        Ok(true)
    }
}
