use nandrad_core::{ConfigurationError, ConsistencyFault};
use nandrad_solve::equation::newton;
use thiserror::Error;

use crate::state::StateError;

use super::InstanceStatus;

/// A sub-step of the time integration did not converge.
///
/// The error is fatal for the current step only: the instance keeps its last
/// committed state and the master may retry after restoring a checkpoint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("integration failed for zone #{zone_id} at t = {time} s")]
pub struct ConvergenceError {
    pub zone_id: u32,
    /// End of the sub-step that failed.
    pub time: f64,
    /// Residuals of the failed sub-step, one per Newton update.
    pub residuals: Vec<f64>,
    #[source]
    pub source: newton::Error,
}

/// Errors returned by [`FmuInstance`](super::FmuInstance) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstanceError {
    #[error("'{operation}' is not allowed while the instance is {status:?}")]
    InvalidCallingOrder {
        operation: &'static str,
        status: InstanceStatus,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),

    #[error(transparent)]
    Convergence(#[from] ConvergenceError),

    #[error("unknown value reference {0}")]
    UnknownValueReference(u32),

    #[error("invalid step from t = {t} s with size {h} s, instance is at t = {current} s")]
    InvalidStep { t: f64, h: f64, current: f64 },

    #[error(transparent)]
    State(#[from] StateError),
}
