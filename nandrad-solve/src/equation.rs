//! Solvers for equation problems, i.e. finding roots of residual functions.
//!
//! # Solvers
//!
//! - [`newton`]: bounded Newton iteration for scalar equations with an
//!   analytic derivative

mod observe;

pub use observe::Observer;

pub mod newton;
