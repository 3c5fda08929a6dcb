use thiserror::Error;

/// Errors that can occur during Newton iteration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("starting point is not finite: {x}")]
    NonFiniteStart { x: f64 },

    #[error("non-finite residual {residual} at x = {x}")]
    NonFiniteResidual { x: f64, residual: f64 },

    #[error("derivative {derivative} at x = {x} cannot be inverted")]
    SingularDerivative { x: f64, derivative: f64 },

    #[error("no convergence after {iters} iterations: x = {x}, last step = {step}")]
    NotConverged { iters: usize, x: f64, step: f64 },
}
