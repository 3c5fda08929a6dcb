use super::ControllerBase;

/// An on/off controller with a hysteresis band.
///
/// [`update`](Self::update) only computes a tentative next value:
/// - error `> +band` → `1.0`
/// - error `< -band` → `0.0`
/// - otherwise the tentative value is left unchanged
///
/// The comparisons are strict, so an error exactly on the band edge counts as
/// inside the band. The tentative value becomes the control value in
/// [`step_completed`](Self::step_completed).
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalHysteresisController {
    base: ControllerBase,
    hysteresis_band: f64,
    next_control_value: f64,
}

impl DigitalHysteresisController {
    /// Creates a controller that starts switched off.
    #[must_use]
    pub fn new(hysteresis_band: f64) -> Self {
        Self {
            base: ControllerBase::default(),
            hysteresis_band,
            next_control_value: 0.0,
        }
    }

    #[must_use]
    pub fn hysteresis_band(&self) -> f64 {
        self.hysteresis_band
    }

    /// Returns the value that the next [`step_completed`](Self::step_completed) commits.
    #[must_use]
    pub fn next_control_value(&self) -> f64 {
        self.next_control_value
    }

    pub fn update(&mut self, error_value: f64) {
        self.base.pre_update(error_value);

        if error_value > self.hysteresis_band {
            self.next_control_value = 1.0;
        } else if error_value < -self.hysteresis_band {
            self.next_control_value = 0.0;
        }
    }

    pub fn step_completed(&mut self, t: f64) {
        self.base.advance(t);
        self.base.set_control_value(self.next_control_value);
    }

    /// Overwrites committed and tentative values, e.g. when restoring a saved state.
    pub fn restore(&mut self, control_value: f64, next_control_value: f64) {
        self.base.set_control_value(control_value);
        self.next_control_value = next_control_value;
    }

    #[must_use]
    pub fn base(&self) -> &ControllerBase {
        &self.base
    }
}
