mod create_rule;
mod facies_group;

pub use create_rule::{CreateBayfillRule, CreateCubicRule, CreateNonCubicRule, CubicLayout};
pub use facies_group::GetFaciesGroup;
