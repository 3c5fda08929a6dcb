//! Controllers and the zone thermostat model.
//!
//! - [`controller`]: digital direct, digital hysteresis, P and PI control laws
//!   with a tentative `update` / committing `step_completed` protocol
//! - [`thermostat`]: per-zone heating and cooling setpoints and control values
//!   driven by the controllers

pub mod controller;
pub mod thermostat;
