/// Indicates how the solver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerances.
    Converged,
    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a Newton solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,
    /// Estimate of the root.
    pub x: f64,
    /// Residual at the last evaluated point.
    pub residual: f64,
    /// Number of Newton updates applied.
    pub iters: usize,
}
