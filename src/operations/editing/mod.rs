mod add_polygon;
mod assign;
mod attributes;
mod change_order;
mod fields;
mod merge;
mod namespace;
mod normalize_order;
mod overlay;
mod removal;
mod remove_polygon;
mod split;

pub use add_polygon::AddPolygon;
pub use assign::{AssignFacies, SetFraction};
pub use attributes::{SetAngle, SetCenter, SetDirection, SetOverlayField, SetSlantFactor};
pub use change_order::ChangeOrder;
pub use fields::{RemoveField, SetBackgroundField};
pub use merge::Merge;
pub use normalize_order::NormalizeOrder;
pub use overlay::{RemoveFaciesGroup, ToggleOverlay};
pub use removal::{RemoveFacies, RemoveRule};
pub use remove_polygon::RemovePolygon;
pub use split::Split;

use crate::error::Result;
use crate::model::{RuleId, RuleStore};
use crate::operations::normalize::{CompactGroups, NormalizeProportionFactors};

/// Runs the passes every facies-changing edit ends with.
fn settle(store: &mut RuleStore, rule: RuleId) -> Result<()> {
    CompactGroups::new(rule).execute(store)?;
    NormalizeProportionFactors::new(rule).execute(store)?;
    Ok(())
}
