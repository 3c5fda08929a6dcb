//! Numerical solvers used by the NANDRAD models.
//!
//! Solvers report progress through an [`Observer`](equation::Observer), which
//! may stop an iteration early. Failure to converge is an error value so that
//! callers can reject a time step and retry from a checkpoint.

pub mod equation;
