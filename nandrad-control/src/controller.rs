mod base;
mod digital_direct;
mod digital_hysteresis;
mod p;
mod pi;

pub use base::ControllerBase;
pub use digital_direct::DigitalDirectController;
pub use digital_hysteresis::DigitalHysteresisController;
pub use p::PController;
pub use pi::PIController;

/// A control law that maps an error value to a control value.
///
/// All variants follow the same two-phase protocol:
///
/// 1. [`update`] may be called any number of times within a step, for example
///    during nonlinear iteration. It always records the error in the shared
///    [`ControllerBase`] first and then applies the variant's control law.
/// 2. [`step_completed`] is called exactly once when the step is accepted.
///    It advances the error integral and, for the hysteresis variant, commits
///    the tentative control value.
///
/// Only [`Controller::DigitalHysteresis`] separates a tentative from a
/// committed value. The other variants update their control value directly in
/// [`update`].
///
/// # Example
///
/// ```
/// use nandrad_control::controller::Controller;
///
/// let mut controller = Controller::digital_hysteresis(1.0);
///
/// controller.update(2.0);
/// assert_eq!(controller.control_value(), 0.0);
///
/// controller.step_completed(60.0);
/// assert_eq!(controller.control_value(), 1.0);
/// ```
///
/// [`update`]: Controller::update
/// [`step_completed`]: Controller::step_completed
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    DigitalDirect(DigitalDirectController),
    DigitalHysteresis(DigitalHysteresisController),
    P(PController),
    PI(PIController),
}

impl Controller {
    /// Creates an on/off controller without memory.
    #[must_use]
    pub fn digital_direct() -> Self {
        Self::DigitalDirect(DigitalDirectController::new())
    }

    /// Creates an on/off controller with a hysteresis half-band.
    #[must_use]
    pub fn digital_hysteresis(hysteresis_band: f64) -> Self {
        Self::DigitalHysteresis(DigitalHysteresisController::new(hysteresis_band))
    }

    /// Creates a proportional controller.
    #[must_use]
    pub fn p(k_p: f64) -> Self {
        Self::P(PController::new(k_p))
    }

    /// Creates a proportional-integral controller.
    #[must_use]
    pub fn pi(k_p: f64, k_i: f64) -> Self {
        Self::PI(PIController::new(k_p, k_i))
    }

    /// Evaluates the control law for `error_value`.
    pub fn update(&mut self, error_value: f64) {
        match self {
            Self::DigitalDirect(c) => c.update(error_value),
            Self::DigitalHysteresis(c) => c.update(error_value),
            Self::P(c) => c.update(error_value),
            Self::PI(c) => c.update(error_value),
        }
    }

    /// Accepts the current step, which ends at time `t` in seconds.
    pub fn step_completed(&mut self, t: f64) {
        match self {
            Self::DigitalDirect(c) => c.step_completed(t),
            Self::DigitalHysteresis(c) => c.step_completed(t),
            Self::P(c) => c.step_completed(t),
            Self::PI(c) => c.step_completed(t),
        }
    }

    /// Returns the control value visible to other models.
    #[must_use]
    pub fn control_value(&self) -> f64 {
        self.base().control_value()
    }

    /// Returns the error value passed to the most recent [`update`](Self::update).
    #[must_use]
    pub fn error_value(&self) -> f64 {
        self.base().error_value()
    }

    /// Returns the shared state of the controller.
    #[must_use]
    pub fn base(&self) -> &ControllerBase {
        match self {
            Self::DigitalDirect(c) => c.base(),
            Self::DigitalHysteresis(c) => c.base(),
            Self::P(c) => c.base(),
            Self::PI(c) => c.base(),
        }
    }
}
