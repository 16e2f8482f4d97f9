mod compact_groups;
mod proportion_factors;

pub use compact_groups::{CompactGroups, CompactionReport};
pub use proportion_factors::NormalizeProportionFactors;
