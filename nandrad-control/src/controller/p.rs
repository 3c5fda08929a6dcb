use super::ControllerBase;

/// A proportional controller: `value = kP * error`.
#[derive(Debug, Clone, PartialEq)]
pub struct PController {
    base: ControllerBase,
    k_p: f64,
}

impl PController {
    #[must_use]
    pub fn new(k_p: f64) -> Self {
        Self {
            base: ControllerBase::default(),
            k_p,
        }
    }

    #[must_use]
    pub fn k_p(&self) -> f64 {
        self.k_p
    }

    pub fn update(&mut self, error_value: f64) {
        self.base.pre_update(error_value);
        self.base.set_control_value(self.k_p * error_value);
    }

    pub fn step_completed(&mut self, t: f64) {
        self.base.advance(t);
    }

    #[must_use]
    pub fn base(&self) -> &ControllerBase {
        &self.base
    }
}
