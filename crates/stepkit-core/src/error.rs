//! Error types shared by every stepkit crate

use thiserror::Error;

use crate::spinner::SpinTimeout;

pub type Result<T> = std::result::Result<T, StepKitError>;

#[derive(Error, Debug)]
pub enum StepKitError {
    #[error("Invalid parallel worker configuration: {reason}")]
    InvalidWorkerConfig { reason: String },

    #[error("Invalid injection hook: {reason}")]
    InvalidHook { reason: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Entry not found in store: '{key}'")]
    ThingNotFound { key: String },

    #[error("'{entity}' does not have a '{property}' property")]
    PropertyNotFound { entity: String, property: String },

    #[error("'{entity}' is {kind}, not an object, so its '{property}' cannot be read")]
    NotAnObject {
        entity: String,
        kind: String,
        property: String,
    },

    #[error("Expected '{key}' to be {expected}, but it was {actual}")]
    ThingMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("No table found with name '{name}'")]
    TableNotFound { name: String },

    #[error("Table '{name}' is not visible")]
    TableNotVisible { name: String },

    #[error("Table '{table}' header not found: {reason}")]
    HeaderNotFound { table: String, reason: String },

    #[error("Table '{table}' is malformed: {reason}")]
    MalformedTable { table: String, reason: String },

    #[error("{dimension} {requested} is out of bounds, the table only has {bound} {dimension}s")]
    OutOfBounds {
        dimension: Dimension,
        requested: usize,
        bound: usize,
    },

    #[error("Assertion failed: {reason}")]
    AssertionFailed { reason: String },

    #[error(transparent)]
    SpinTimeout(#[from] SpinTimeout),

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Which axis of a table an out-of-bounds index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Row,
    Column,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Row => f.write_str("row"),
            Dimension::Column => f.write_str("column"),
        }
    }
}

impl StepKitError {
    /// Shorthand for an assertion failure carrying a formatted reason.
    pub fn assertion(reason: impl Into<String>) -> Self {
        StepKitError::AssertionFailed {
            reason: reason.into(),
        }
    }

    /// True for errors that mean the thing being looked for does not exist,
    /// as opposed to existing with the wrong value.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StepKitError::ThingNotFound { .. }
                | StepKitError::PropertyNotFound { .. }
                | StepKitError::TableNotFound { .. }
                | StepKitError::HeaderNotFound { .. }
        )
    }
}
