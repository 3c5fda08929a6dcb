use ndarray::Array1;
use ninterp::{
    error::ValidateError,
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use serde::{Deserialize, Serialize};

/// A CO2 source schedule as sampled data.
///
/// `values` are CO2 mass fluxes per zone floor area in kg/(m²·s) at the
/// simulation times in `time` (seconds, strictly increasing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSchedule {
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl SourceSchedule {
    #[must_use]
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> Self {
        Self { time, values }
    }

    /// Creates a schedule that holds one value at all times.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![0.0], vec![value])
    }
}

/// Reasons a [`SourceSchedule`] cannot be turned into a spline.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SplineError {
    #[error("schedule has no values")]
    Empty,
    #[error("schedule has {time} time points but {values} values")]
    LengthMismatch { time: usize, values: usize },
    #[error(transparent)]
    Validation(#[from] ValidateError),
}

/// Piecewise linear interpolation of a source schedule.
///
/// Outside the sampled range the first or last value is held.
#[derive(Debug, Clone)]
pub(crate) enum SourceSpline {
    Constant(f64),
    Linear(Interp1DOwned<f64, Linear>),
}

impl SourceSpline {
    pub(crate) fn new(schedule: &SourceSchedule) -> Result<Self, SplineError> {
        let SourceSchedule { time, values } = schedule;
        if time.len() != values.len() {
            return Err(SplineError::LengthMismatch {
                time: time.len(),
                values: values.len(),
            });
        }
        match values.as_slice() {
            [] => Err(SplineError::Empty),
            [value] => Ok(Self::Constant(*value)),
            _ => Ok(Self::Linear(Interp1DOwned::new(
                Array1::from(time.clone()),
                Array1::from(values.clone()),
                Linear,
                Extrapolate::Clamp,
            )?)),
        }
    }

    /// Returns the source at time `t`.
    ///
    /// A failed evaluation yields NaN, which the mass balance reports as a
    /// non-finite residual.
    pub(crate) fn at(&self, t: f64) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Linear(interp) => interp.interpolate(&[t]).unwrap_or(f64::NAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn interpolates_linearly_and_clamps() {
        let schedule = SourceSchedule::new(vec![0.0, 3600.0, 7200.0], vec![0.0, 2e-6, 1e-6]);
        let spline = SourceSpline::new(&schedule).unwrap();

        assert_relative_eq!(spline.at(1800.0), 1e-6);
        assert_relative_eq!(spline.at(5400.0), 1.5e-6);
        assert_relative_eq!(spline.at(-100.0), 0.0);
        assert_relative_eq!(spline.at(1e6), 1e-6);
    }

    #[test]
    fn single_value_is_constant() {
        let spline = SourceSpline::new(&SourceSchedule::constant(3e-7)).unwrap();
        assert_eq!(spline.at(0.0), 3e-7);
        assert_eq!(spline.at(86_400.0), 3e-7);
    }

    #[test]
    fn malformed_schedules_are_rejected() {
        let empty = SourceSchedule::new(Vec::new(), Vec::new());
        assert!(matches!(SourceSpline::new(&empty), Err(SplineError::Empty)));

        let mismatched = SourceSchedule::new(vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(
            SourceSpline::new(&mismatched),
            Err(SplineError::LengthMismatch { time: 2, values: 1 })
        ));

        let unsorted = SourceSchedule::new(vec![1.0, 0.0], vec![1.0, 2.0]);
        assert!(matches!(
            SourceSpline::new(&unsorted),
            Err(SplineError::Validation(_))
        ));
    }
}
