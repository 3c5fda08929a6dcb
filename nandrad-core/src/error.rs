use thiserror::Error;

use crate::{ReferenceType, ValueRef};

/// Invalid user configuration, detected while setting up a model.
///
/// These errors abort the simulation run before any time integration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("missing 'ZoneObjectList' parameter")]
    MissingObjectList,

    #[error("invalid/undefined object list '{0}'")]
    UndefinedObjectList(String),

    #[error("invalid reference type in object list '{name}', expected type '{expected}', got '{found}'")]
    WrongReferenceType {
        name: String,
        expected: ReferenceType,
        found: ReferenceType,
    },

    #[error("invalid/undefined zone ID #{0}")]
    UndefinedZone(u32),

    #[error("zone ID #{0} is defined more than once")]
    DuplicateZone(u32),

    #[error("missing parameter '{parameter}' in {context}")]
    MissingParameter {
        context: String,
        parameter: &'static str,
    },

    #[error("invalid parameter '{parameter}' = {value}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid/undefined schedule '{0}'")]
    UndefinedSchedule(String),

    #[error("invalid schedule '{name}': {reason}")]
    InvalidSchedule { name: String, reason: String },

    #[error("malformed variable '{0}' in FMI definitions")]
    MalformedFmiVariable(String),

    #[error("mismatching variable '{0}' in FMI definitions")]
    MismatchingFmiVariable(String),
}

/// A wiring bug between the framework and a model.
///
/// Unlike [`ConfigurationError`], these faults indicate a programming error
/// in the caller rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyFault {
    #[error("expected {expected} input value references, got {found}")]
    ValueRefCount { expected: usize, found: usize },

    #[error("no value available for reference {0}")]
    MissingValue(ValueRef),

    #[error("state buffer has {found} bytes, expected {expected}")]
    BufferSize { expected: usize, found: usize },

    #[error("object list #{index} no longer matches '{name}'")]
    StaleObjectList { index: usize, name: String },

    #[error("results have not been initialized")]
    ResultsNotInitialized,
}

/// Errors a model may return from the framework calling convention.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),
}
