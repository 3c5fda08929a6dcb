mod config;
mod error;
mod solution;

pub use config::Config;
pub use error::Error;
pub use solution::{Solution, Status};

use tracing::trace;

use crate::equation::Observer;

/// Residual value and derivative of a scalar equation at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    pub value: f64,
    pub derivative: f64,
}

impl Residual {
    #[must_use]
    pub fn new(value: f64, derivative: f64) -> Self {
        Self { value, derivative }
    }
}

/// Control actions supported by the Newton solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver early and return the current estimate.
    StopEarly,
}

/// Iteration event emitted by the Newton solver after each update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Iteration counter (1-based).
    pub iter: usize,
    /// Estimate after the update.
    pub x: f64,
    /// Applied update.
    pub step: f64,
    /// Residual evaluated before the update.
    pub residual: f64,
}

/// Finds a root of a scalar equation with Newton's method.
///
/// Each iteration evaluates the equation at the current estimate and applies
/// `x -= residual / derivative`. The solver converges when the residual
/// magnitude is within `residual_tol` or when the update is within
/// `x_abs_tol + x_rel_tol * |x|`.
///
/// # Errors
///
/// Returns [`Error::NotConverged`] if the iteration cap is reached, and other
/// [`Error`] variants for an invalid config, non-finite values or a zero
/// derivative.
pub fn solve<F, Obs>(
    mut equation: F,
    x0: f64,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    F: FnMut(f64) -> Residual,
    Obs: Observer<Event, Action>,
{
    config
        .validate()
        .map_err(|reason| Error::InvalidConfig { reason })?;

    if !x0.is_finite() {
        return Err(Error::NonFiniteStart { x: x0 });
    }

    let mut x = x0;
    let mut step = f64::INFINITY;

    for iter in 1..=config.max_iters {
        let Residual { value, derivative } = equation(x);

        if !value.is_finite() {
            return Err(Error::NonFiniteResidual { x, residual: value });
        }
        if value.abs() <= config.residual_tol {
            return Ok(Solution {
                status: Status::Converged,
                x,
                residual: value,
                iters: iter - 1,
            });
        }
        #[allow(clippy::float_cmp)]
        if derivative == 0.0 || !derivative.is_finite() {
            return Err(Error::SingularDerivative { x, derivative });
        }

        step = -value / derivative;
        x += step;
        trace!(iter, x, step, residual = value, "newton update");

        let event = Event {
            iter,
            x,
            step,
            residual: value,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(Solution {
                status: Status::StoppedByObserver,
                x,
                residual: value,
                iters: iter,
            });
        }

        if step.abs() <= config.x_abs_tol + config.x_rel_tol * x.abs() {
            return Ok(Solution {
                status: Status::Converged,
                x,
                residual: value,
                iters: iter,
            });
        }
    }

    Err(Error::NotConverged {
        iters: config.max_iters,
        x,
        step,
    })
}

/// Runs Newton iteration without observation.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_unobserved<F>(equation: F, x0: f64, config: &Config) -> Result<Solution, Error>
where
    F: FnMut(f64) -> Residual,
{
    solve(equation, x0, config, ())
}
