use super::ControllerBase;

/// A proportional-integral controller.
///
/// `value = kP * error + kI * integral`, where the integral is accumulated by
/// [`ControllerBase`] when a step is accepted. The integral contribution of
/// the current step therefore appears after [`step_completed`](Self::step_completed)
/// and the next [`update`](Self::update).
#[derive(Debug, Clone, PartialEq)]
pub struct PIController {
    base: ControllerBase,
    k_p: f64,
    k_i: f64,
}

impl PIController {
    #[must_use]
    pub fn new(k_p: f64, k_i: f64) -> Self {
        Self {
            base: ControllerBase::default(),
            k_p,
            k_i,
        }
    }

    #[must_use]
    pub fn k_p(&self) -> f64 {
        self.k_p
    }

    #[must_use]
    pub fn k_i(&self) -> f64 {
        self.k_i
    }

    pub fn update(&mut self, error_value: f64) {
        self.base.pre_update(error_value);
        let value = self.k_p * error_value + self.k_i * self.base.error_value_integral();
        self.base.set_control_value(value);
    }

    pub fn step_completed(&mut self, t: f64) {
        self.base.advance(t);
    }

    #[must_use]
    pub fn base(&self) -> &ControllerBase {
        &self.base
    }
}
