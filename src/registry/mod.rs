//! External collaborators consumed by the engine.
//!
//! The engine only talks to facies and fields through the [`FaciesRegistry`]
//! and [`FieldRegistry`] traits. The in-memory implementations are what tests
//! and simple embedders use.

pub mod facies;
pub mod field;

pub use facies::{Facies, FaciesId, FaciesRegistry, InMemoryFaciesRegistry, SelectedFacies};
pub use field::{
    FieldId, FieldRegistry, FieldSpecification, GaussianField, InMemoryFieldRegistry, Variogram,
    VariogramKind,
};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zone/region scoping key shared by rules, groups and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Parent {
    /// Zone code.
    pub zone: u32,
    /// Region code, if the zone is split into regions.
    pub region: Option<u32>,
}

impl Parent {
    /// A zone without regions.
    #[must_use]
    pub fn zone(zone: u32) -> Self {
        Self { zone, region: None }
    }

    /// A region inside a zone.
    #[must_use]
    pub fn region(zone: u32, region: u32) -> Self {
        Self {
            zone,
            region: Some(region),
        }
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.region {
            Some(region) => write!(f, "zone {}, region {region}", self.zone),
            None => write!(f, "zone {}", self.zone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Parent::zone(1).to_string(), "zone 1");
        assert_eq!(Parent::region(1, 4).to_string(), "zone 1, region 4");
    }
}
