mod specification;
mod validate;

pub use specification::{
    BayfillSpecification, CubicSpecification, FaciesSpecification, GeometrySpecification,
    OverlayGroupSpecification, OverlayPolygonSpecification, OverlaySpecification,
    RuleSpecification, Specification, WedgeSpecification,
};
pub use validate::{Validate, ValidationError};
