//! The FMU instance boundary.
//!
//! [`FmuInstance`] owns the calling-order state machine of a co-simulation
//! slave and delegates the physics to an [`InstanceModel`]:
//!
//! ```text
//! Uninitialized -> Initialized -> Integrating -> StepAccepted -> Integrating -> ...
//!                                      |
//!                                      +-> StepRejected -- set_fmu_state --> StepAccepted
//! ```
//!
//! Any state except `Uninitialized` can move to `Terminated`, after which
//! every operation fails.

mod error;

pub use error::{ConvergenceError, InstanceError};

use nandrad_core::{ConfigurationError, ConsistencyFault};
use tracing::{debug, info, warn};

use crate::state::{FmuState, StateError};

/// Relative tolerance when matching a step start against the instance time.
const TIME_TOLERANCE: f64 = 1e-10;

/// A model that can be driven by an [`FmuInstance`].
pub trait InstanceModel {
    /// Validates the configuration and allocates all per-object state.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for invalid or incomplete configuration.
    fn init(&mut self) -> Result<(), ConfigurationError>;

    /// Returns the storage of a master-to-model real variable.
    fn real_input_mut(&mut self, value_ref: u32) -> Option<&mut f64>;

    /// Returns the current value of any real variable.
    fn real_value(&self, value_ref: u32) -> Option<f64>;

    /// Recomputes dependent state if the inputs changed since the last call.
    ///
    /// Returns `true` if anything was recomputed.
    fn update_if_modified(&mut self) -> bool;

    /// Returns the time point of the last committed state.
    fn committed_time(&self) -> f64;

    /// Integrates from the last committed state to `t_end`.
    ///
    /// The committed state is left untouched, so the call may be repeated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConvergenceError`] if a sub-step fails.
    fn integrate_to(&mut self, t_end: f64) -> Result<(), ConvergenceError>;

    /// Commits the integrated state as the new restart point.
    fn step_completed(&mut self);

    /// Returns the exact byte length of a serialized state.
    fn fmu_state_size(&self) -> usize;

    /// Writes the full state into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsistencyFault::BufferSize`] unless `buffer` is exactly
    /// [`fmu_state_size`](Self::fmu_state_size) bytes long.
    fn serialize_fmu_state(&self, buffer: &mut [u8]) -> Result<(), ConsistencyFault>;

    /// Replaces the full state with the one in `buffer`.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the buffer does not hold a valid state of
    /// this model. The current state is unchanged in that case.
    fn deserialize_fmu_state(&mut self, buffer: &[u8]) -> Result<(), StateError>;
}

/// Calling-order state of an [`FmuInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Uninitialized,
    Initialized,
    Integrating,
    StepAccepted,
    StepRejected,
    Terminated,
}

/// A co-simulation slave around an [`InstanceModel`].
#[derive(Debug)]
pub struct FmuInstance<M> {
    name: String,
    model: M,
    status: InstanceStatus,
}

impl<M: InstanceModel> FmuInstance<M> {
    /// States in which values and snapshots may be exchanged.
    const READY: [InstanceStatus; 3] = [
        InstanceStatus::Initialized,
        InstanceStatus::StepAccepted,
        InstanceStatus::StepRejected,
    ];

    #[must_use]
    pub fn new(name: impl Into<String>, model: M) -> Self {
        Self {
            name: name.into(),
            model,
            status: InstanceStatus::Uninitialized,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Initializes the model.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::InvalidCallingOrder`] unless the instance is
    /// uninitialized, or the model's [`ConfigurationError`].
    pub fn initialize(&mut self) -> Result<(), InstanceError> {
        self.expect_status("initialize", &[InstanceStatus::Uninitialized])?;
        self.model.init()?;
        self.status = InstanceStatus::Initialized;
        info!(
            instance = %self.name,
            state_size = self.model.fmu_state_size(),
            "instance initialized"
        );
        Ok(())
    }

    /// Sets a master-to-model real variable.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::UnknownValueReference`] if the model has no
    /// such input, or [`InstanceError::InvalidCallingOrder`].
    pub fn set_real(&mut self, value_ref: u32, value: f64) -> Result<(), InstanceError> {
        self.expect_status("set_real", &Self::READY)?;
        let slot = self
            .model
            .real_input_mut(value_ref)
            .ok_or(InstanceError::UnknownValueReference(value_ref))?;
        *slot = value;
        Ok(())
    }

    /// Reads a real variable, refreshing dependent state first.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::UnknownValueReference`] if the model has no
    /// such variable, or [`InstanceError::InvalidCallingOrder`].
    pub fn get_real(&mut self, value_ref: u32) -> Result<f64, InstanceError> {
        self.expect_status("get_real", &Self::READY)?;
        self.model.update_if_modified();
        self.model
            .real_value(value_ref)
            .ok_or(InstanceError::UnknownValueReference(value_ref))
    }

    /// Advances the model from `t` by `h` and commits the result.
    ///
    /// On a [`ConvergenceError`] the instance moves to
    /// [`InstanceStatus::StepRejected`] and only accepts a state restore
    /// before the next step.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::InvalidStep`] if `h` is not positive or `t`
    /// is not the instance time, [`InstanceError::Convergence`] if the
    /// integration fails, or [`InstanceError::InvalidCallingOrder`].
    pub fn do_step(&mut self, t: f64, h: f64) -> Result<(), InstanceError> {
        self.expect_status(
            "do_step",
            &[InstanceStatus::Initialized, InstanceStatus::StepAccepted],
        )?;

        let current = self.model.committed_time();
        let off_time = !((t - current).abs() <= TIME_TOLERANCE * current.abs().max(1.0));
        if !(h.is_finite() && h > 0.0) || off_time {
            return Err(InstanceError::InvalidStep { t, h, current });
        }

        self.status = InstanceStatus::Integrating;
        self.model.update_if_modified();

        match self.model.integrate_to(t + h) {
            Ok(()) => {
                self.model.step_completed();
                self.status = InstanceStatus::StepAccepted;
                debug!(instance = %self.name, t = t + h, "step accepted");
                Ok(())
            }
            Err(error) => {
                self.status = InstanceStatus::StepRejected;
                warn!(instance = %self.name, t, h, %error, "step rejected");
                Err(error.into())
            }
        }
    }

    /// Takes a snapshot of the committed state.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::InvalidCallingOrder`] unless the instance is
    /// initialized or has just accepted a step.
    pub fn get_fmu_state(&self) -> Result<FmuState, InstanceError> {
        self.expect_status(
            "get_fmu_state",
            &[InstanceStatus::Initialized, InstanceStatus::StepAccepted],
        )?;
        let mut buffer = vec![0; self.model.fmu_state_size()];
        self.model.serialize_fmu_state(&mut buffer)?;
        Ok(FmuState::from_bytes(buffer))
    }

    /// Restores a snapshot taken by [`get_fmu_state`](Self::get_fmu_state).
    ///
    /// A rejected blob leaves both the model and the instance status unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::State`] for an invalid blob, or
    /// [`InstanceError::InvalidCallingOrder`].
    pub fn set_fmu_state(&mut self, state: &FmuState) -> Result<(), InstanceError> {
        self.expect_status("set_fmu_state", &Self::READY)?;
        if let Err(error) = self.model.deserialize_fmu_state(state.as_bytes()) {
            warn!(instance = %self.name, %error, "state blob rejected");
            return Err(error.into());
        }
        self.status = InstanceStatus::StepAccepted;
        debug!(
            instance = %self.name,
            t = self.model.committed_time(),
            "state restored"
        );
        Ok(())
    }

    /// Ends the simulation; no further operations are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::InvalidCallingOrder`] if the instance was
    /// never initialized or is already terminated.
    pub fn terminate(&mut self) -> Result<(), InstanceError> {
        self.expect_status("terminate", &Self::READY)?;
        self.status = InstanceStatus::Terminated;
        info!(
            instance = %self.name,
            t = self.model.committed_time(),
            "instance terminated"
        );
        Ok(())
    }

    fn expect_status(
        &self,
        operation: &'static str,
        allowed: &[InstanceStatus],
    ) -> Result<(), InstanceError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(InstanceError::InvalidCallingOrder {
                operation,
                status: self.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use nandrad_solve::equation::newton;

    use super::*;
    use crate::state::{StateReader, StateWriter, state_size};

    /// Exponential decay `dx/dt = -k x` with an explicit Euler step per call.
    #[derive(Debug, Default)]
    struct Decay {
        rate: f64,
        x: f64,
        last_x: f64,
        t: f64,
        last_t: f64,
        updates: usize,
        cached_rate: Option<f64>,
        fail: bool,
    }

    impl InstanceModel for Decay {
        fn init(&mut self) -> Result<(), ConfigurationError> {
            if self.rate < 0.0 {
                return Err(ConfigurationError::InvalidParameter {
                    parameter: "rate",
                    value: self.rate,
                    reason: "must be non-negative",
                });
            }
            self.x = 1.0;
            self.last_x = 1.0;
            Ok(())
        }

        fn real_input_mut(&mut self, value_ref: u32) -> Option<&mut f64> {
            (value_ref == 0).then_some(&mut self.rate)
        }

        fn real_value(&self, value_ref: u32) -> Option<f64> {
            match value_ref {
                0 => Some(self.rate),
                1 => Some(self.x),
                _ => None,
            }
        }

        fn update_if_modified(&mut self) -> bool {
            if self.cached_rate == Some(self.rate) {
                return false;
            }
            self.cached_rate = Some(self.rate);
            self.updates += 1;
            true
        }

        fn committed_time(&self) -> f64 {
            self.last_t
        }

        fn integrate_to(&mut self, t_end: f64) -> Result<(), ConvergenceError> {
            if self.fail {
                return Err(ConvergenceError {
                    zone_id: 1,
                    time: t_end,
                    residuals: Vec::new(),
                    source: newton::Error::NotConverged {
                        iters: 1,
                        x: self.last_x,
                        step: 1.0,
                    },
                });
            }
            self.x = self.last_x * (1.0 - self.rate * (t_end - self.last_t));
            self.t = t_end;
            Ok(())
        }

        fn step_completed(&mut self) {
            self.last_x = self.x;
            self.last_t = self.t;
        }

        fn fmu_state_size(&self) -> usize {
            state_size(2)
        }

        fn serialize_fmu_state(&self, buffer: &mut [u8]) -> Result<(), ConsistencyFault> {
            let mut writer = StateWriter::new(buffer, self.fmu_state_size())?;
            writer.write_f64(self.last_t);
            writer.write_f64(self.last_x);
            writer.finish()
        }

        fn deserialize_fmu_state(&mut self, buffer: &[u8]) -> Result<(), StateError> {
            let mut reader = StateReader::new(buffer, self.fmu_state_size())?;
            let t = reader.read_finite("time")?;
            let x = reader.read_finite("x")?;
            reader.finish()?;
            (self.t, self.last_t, self.x, self.last_x) = (t, t, x, x);
            Ok(())
        }
    }

    fn instance(rate: f64) -> FmuInstance<Decay> {
        let mut instance = FmuInstance::new(
            "decay",
            Decay {
                rate,
                ..Decay::default()
            },
        );
        instance.initialize().unwrap();
        instance
    }

    #[test]
    fn operations_before_initialization_are_rejected() {
        let mut instance = FmuInstance::new("decay", Decay::default());
        assert_eq!(instance.status(), InstanceStatus::Uninitialized);
        assert_eq!(
            instance.do_step(0.0, 1.0),
            Err(InstanceError::InvalidCallingOrder {
                operation: "do_step",
                status: InstanceStatus::Uninitialized
            })
        );
        assert!(instance.get_real(1).is_err());
        assert!(instance.terminate().is_err());
    }

    #[test]
    fn configuration_errors_keep_instance_uninitialized() {
        let mut instance = FmuInstance::new(
            "decay",
            Decay {
                rate: -1.0,
                ..Decay::default()
            },
        );
        assert!(matches!(
            instance.initialize(),
            Err(InstanceError::Configuration(_))
        ));
        assert_eq!(instance.status(), InstanceStatus::Uninitialized);
    }

    #[test]
    fn steps_advance_committed_time() {
        let mut instance = instance(0.1);
        instance.do_step(0.0, 1.0).unwrap();
        instance.do_step(1.0, 1.0).unwrap();

        assert_eq!(instance.status(), InstanceStatus::StepAccepted);
        assert_eq!(instance.model().committed_time(), 2.0);
        assert!((instance.get_real(1).unwrap() - 0.81).abs() < 1e-12);
    }

    #[test]
    fn invalid_steps_are_rejected_without_integration() {
        let mut instance = instance(0.1);
        assert!(matches!(
            instance.do_step(5.0, 1.0),
            Err(InstanceError::InvalidStep { current, .. }) if current == 0.0
        ));
        assert!(matches!(
            instance.do_step(0.0, 0.0),
            Err(InstanceError::InvalidStep { .. })
        ));
        assert!(matches!(
            instance.do_step(0.0, f64::NAN),
            Err(InstanceError::InvalidStep { .. })
        ));
        assert_eq!(instance.status(), InstanceStatus::Initialized);
    }

    #[test]
    fn get_real_refreshes_only_after_input_changes() {
        let mut instance = instance(0.1);
        instance.get_real(1).unwrap();
        instance.get_real(1).unwrap();
        assert_eq!(instance.model().updates, 1);

        instance.set_real(0, 0.2).unwrap();
        instance.get_real(1).unwrap();
        assert_eq!(instance.model().updates, 2);

        assert_eq!(
            instance.set_real(1, 0.0),
            Err(InstanceError::UnknownValueReference(1))
        );
        assert_eq!(
            instance.get_real(7),
            Err(InstanceError::UnknownValueReference(7))
        );
    }

    #[test]
    fn rejected_step_requires_restore() {
        let mut instance = instance(0.1);
        instance.do_step(0.0, 1.0).unwrap();
        let checkpoint = instance.get_fmu_state().unwrap();
        assert_eq!(checkpoint.len(), 24);

        instance.model.fail = true;
        assert!(matches!(
            instance.do_step(1.0, 1.0),
            Err(InstanceError::Convergence(_))
        ));
        assert_eq!(instance.status(), InstanceStatus::StepRejected);
        assert!(matches!(
            instance.do_step(1.0, 1.0),
            Err(InstanceError::InvalidCallingOrder { .. })
        ));
        assert!(instance.get_fmu_state().is_err());

        instance.model.fail = false;
        instance.set_fmu_state(&checkpoint).unwrap();
        assert_eq!(instance.status(), InstanceStatus::StepAccepted);
        instance.do_step(1.0, 0.5).unwrap();
        assert_eq!(instance.model().committed_time(), 1.5);
    }

    #[test]
    fn corrupt_state_leaves_model_unchanged() {
        let mut instance = instance(0.1);
        instance.do_step(0.0, 1.0).unwrap();

        let mut bytes = instance.get_fmu_state().unwrap().into_bytes();
        bytes.pop();
        let result = instance.set_fmu_state(&FmuState::from_bytes(bytes));

        assert!(matches!(result, Err(InstanceError::State(_))));
        assert_eq!(instance.model().committed_time(), 1.0);
        assert_eq!(instance.status(), InstanceStatus::StepAccepted);
    }

    #[test]
    fn terminated_instance_rejects_everything() {
        let mut instance = instance(0.1);
        instance.terminate().unwrap();
        assert_eq!(instance.status(), InstanceStatus::Terminated);
        assert!(instance.do_step(0.0, 1.0).is_err());
        assert!(instance.set_real(0, 1.0).is_err());
        assert!(instance.get_fmu_state().is_err());
        assert!(instance.terminate().is_err());
    }
}
