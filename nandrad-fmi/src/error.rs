use nandrad_core::ConsistencyFault;
use thiserror::Error;

/// Errors raised when exchanging values through FMI value references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FmiError {
    #[error("unknown FMI value reference {0}")]
    UnknownValueReference(u32),

    #[error("FMI value reference {0} is not an input variable")]
    NotAnInput(u32),

    #[error("FMI value reference {0} is not an output variable")]
    NotAnOutput(u32),

    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),
}
