use thiserror::Error;

use crate::operations::query::ValidationError;

/// Top-level error type for the truncation rule engine.
#[derive(Debug, Error)]
pub enum TruncationError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Errors related to entities held by the rule store.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("a truncation rule already exists for {0}")]
    RuleExists(String),

    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    #[error("rule is incomplete: {0}")]
    Incomplete(String),
}

/// Precondition violations: the requested edit cannot be interpreted.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("operation not supported by {rule} rules: {operation}")]
    Unsupported {
        rule: &'static str,
        operation: &'static str,
    },

    #[error("Polygons need to all have the same parent in order to be merged")]
    ParentMismatch,

    #[error("background field index {index} is out of range (rule has {len} slots)")]
    FieldIndexOutOfRange { index: usize, len: usize },

    #[error("facies group does not exist")]
    GroupNotFound,

    #[error("level {level} exceeds the maximum depth {max}")]
    TooDeep { level: u32, max: u32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised by the facies or field registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("facies not found in registry")]
    FaciesNotFound,

    #[error("gaussian field not found in registry")]
    FieldNotFound,

    #[error("registry failure: {0}")]
    Failed(String),
}

/// Errors raised by the external numeric simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("simulation failed: {0}")]
    Failed(String),

    #[error("simulator returned data for unknown field '{0}'")]
    UnknownField(String),

    #[error("more than one referenced field is named '{0}'")]
    DuplicateFieldName(String),

    #[error("rule is not ready for simulation: {0}")]
    NotReady(#[from] ValidationError),
}

/// Convenience type alias for results using [`TruncationError`].
pub type Result<T> = std::result::Result<T, TruncationError>;
