use super::ControllerBase;

/// An on/off controller without memory.
///
/// Returns `1.0` for a positive error and `0.0` otherwise, immediately on
/// [`update`](Self::update).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DigitalDirectController {
    base: ControllerBase,
}

impl DigitalDirectController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, error_value: f64) {
        self.base.pre_update(error_value);
        // Below setpoint (positive error) switches on.
        let value = if error_value > 0.0 { 1.0 } else { 0.0 };
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
