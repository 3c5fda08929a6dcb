/// State shared by all controller variants.
///
/// Every variant calls [`pre_update`](Self::pre_update) before applying its own
/// control law and [`advance`](Self::advance) when a step is accepted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerBase {
    control_value: f64,
    error_value: f64,
    error_value_integral: f64,
    last_step_time: f64,
}

impl ControllerBase {
    /// Returns the control value visible to other models.
    #[must_use]
    pub fn control_value(&self) -> f64 {
        self.control_value
    }

    /// Returns the most recent error value.
    #[must_use]
    pub fn error_value(&self) -> f64 {
        self.error_value
    }

    /// Returns the error integral accumulated over all accepted steps.
    #[must_use]
    pub fn error_value_integral(&self) -> f64 {
        self.error_value_integral
    }

    /// Returns the end time of the last accepted step.
    #[must_use]
    pub fn last_step_time(&self) -> f64 {
        self.last_step_time
    }

    /// Records the error value of the current evaluation.
    pub(crate) fn pre_update(&mut self, error_value: f64) {
        self.error_value = error_value;
    }

    pub(crate) fn set_control_value(&mut self, control_value: f64) {
        self.control_value = control_value;
    }

    /// Integrates the last error value over `[last_step_time, t]`.
    ///
    /// The error is held constant over the step (rectangle rule). Steps that
    /// do not move time forward add nothing.
    pub(crate) fn advance(&mut self, t: f64) {
        let dt = t - self.last_step_time;
        if dt > 0.0 {
            self.error_value_integral += self.error_value * dt;
            self.last_step_time = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn integral_holds_last_error_over_step() {
        let mut base = ControllerBase::default();

        base.pre_update(2.0);
        base.advance(10.0);
        assert_relative_eq!(base.error_value_integral(), 20.0);

        base.pre_update(-1.0);
        base.advance(15.0);
        assert_relative_eq!(base.error_value_integral(), 15.0);
        assert_relative_eq!(base.last_step_time(), 15.0);
    }

    #[test]
    fn repeated_time_point_adds_nothing() {
        let mut base = ControllerBase::default();
        base.pre_update(3.0);
        base.advance(5.0);
        base.advance(5.0);
        base.advance(4.0);
        assert_relative_eq!(base.error_value_integral(), 15.0);
        assert_relative_eq!(base.last_step_time(), 5.0);
    }
}
