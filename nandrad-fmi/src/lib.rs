//! FMI co-simulation support for NANDRAD models.
//!
//! - [`variable`]: the FMI variable table and its "same model variable" rule
//! - [`input_output`]: maps FMI inputs onto model results and model results
//!   onto FMI outputs
//! - [`state`]: the length-prefixed FMU state blob
//! - [`instance`]: the FMU instance state machine around an [`InstanceModel`]
//! - [`co2_ventilation`]: a multi-zone CO2 balance with hysteresis-controlled
//!   ventilation, usable as an FMU instance model

pub mod co2_ventilation;
pub mod input_output;
pub mod instance;
pub mod state;
pub mod variable;

mod error;

pub use error::FmiError;
pub use instance::{ConvergenceError, FmuInstance, InstanceError, InstanceModel, InstanceStatus};
pub use state::FmuState;
