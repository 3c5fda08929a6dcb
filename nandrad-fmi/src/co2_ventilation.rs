//! Demand-controlled ventilation of building zones by CO2 concentration.
//!
//! Every zone carries a CO2 mass balance driven by outdoor air exchange and an
//! occupancy source schedule. The air change rate of each zone switches
//! between a minimum and a maximum value, controlled by a
//! [`VentilationController`]. The model runs as an FMU instance: zone air
//! temperatures and the ambient temperature are inputs, CO2 concentrations and
//! air change rates are outputs.

mod config;
mod controller;
mod spline;
mod zone;

pub use config::{Co2VentilationConfig, ZoneConfig};
pub use controller::{VentilationController, VentilationLimits};
pub use spline::SourceSchedule;

use std::collections::BTreeMap;

use nandrad_core::{ConfigurationError, ConsistencyFault};
use nandrad_solve::equation::newton;
use tracing::{debug, info};

use crate::{
    instance::{ConvergenceError, InstanceModel},
    state::{StateError, StateReader, StateWriter, state_size},
};

use self::{
    config::Parameters,
    spline::SourceSpline,
    zone::{Boundary, ZoneState},
};

/// Ideal gas constant in J/(mol·K).
pub const R_IDEAL_GAS: f64 = 8.314_459_8;
/// Molar mass of CO2 in kg/mol.
pub const MOLAR_MASS_CO2: f64 = 0.044_009_5;
/// Air pressure in Pa used for the molar density of zone air.
pub const REFERENCE_PRESSURE: f64 = 101_325.0;
/// Number of implicit Euler sub-steps per communication interval.
pub const SUB_STEPS: usize = 10;

const MAX_ITER: usize = 20;
const EPS: f64 = 1e-10;

/// Fields per zone in the state blob: mass, last mass and the controller.
const ZONE_STATE_FIELDS: usize = 2 + controller::STATE_FIELDS;

/// The multi-zone CO2 ventilation model.
///
/// Zones are kept in ascending ID order, which is also their order in the
/// FMU state blob.
#[derive(Debug, Clone)]
pub struct Co2Ventilation {
    config: Co2VentilationConfig,
    newton: newton::Config,
    parameters: Option<Parameters>,
    splines: Vec<SourceSpline>,
    zones: Vec<ZoneState>,
    /// Real inputs: the ambient temperature first, then one air temperature
    /// per zone.
    inputs: Vec<f64>,
    input_index: BTreeMap<u32, usize>,
    /// Inputs as seen by the last controller update.
    cached_inputs: Option<Vec<f64>>,
    current_time: f64,
    last_time: f64,
    state_size: usize,
}

impl Co2Ventilation {
    /// Creates an uninitialized model; [`InstanceModel::init`] validates the configuration.
    #[must_use]
    pub fn new(config: Co2VentilationConfig) -> Self {
        Self {
            config,
            newton: newton::Config {
                max_iters: MAX_ITER,
                x_abs_tol: 0.0,
                x_rel_tol: EPS,
                residual_tol: 0.0,
            },
            parameters: None,
            splines: Vec::new(),
            zones: Vec::new(),
            inputs: Vec::new(),
            input_index: BTreeMap::new(),
            cached_inputs: None,
            current_time: 0.0,
            last_time: 0.0,
            state_size: state_size(2),
        }
    }

    /// Returns `self` with the given Newton settings, keeping other fields unchanged.
    #[must_use]
    pub fn with_newton_config(self, newton: newton::Config) -> Self {
        Self { newton, ..self }
    }

    #[must_use]
    pub fn config(&self) -> &Co2VentilationConfig {
        &self.config
    }

    /// Returns the time point integrated to, which may be ahead of the committed one.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Returns the zone IDs in ascending order.
    pub fn zone_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.zones.iter().map(|zone| zone.id)
    }

    /// Returns the current CO2 mass of a zone in kg.
    #[must_use]
    pub fn co2_mass(&self, zone_id: u32) -> Option<f64> {
        self.zone(zone_id).map(|zone| zone.mass)
    }

    /// Returns the current CO2 concentration of a zone in mol/mol.
    #[must_use]
    pub fn co2_concentration(&self, zone_id: u32) -> Option<f64> {
        let zone = self.zone(zone_id)?;
        Some(zone.concentration(zone.mass, self.inputs[zone.air_temperature_input]))
    }

    /// Returns the air change rate of a zone in 1/s for the upcoming step.
    #[must_use]
    pub fn air_change_rate(&self, zone_id: u32) -> Option<f64> {
        let limits = self.parameters?.limits;
        Some(self.zone(zone_id)?.ventilation.air_change_rate(&limits))
    }

    fn zone(&self, zone_id: u32) -> Option<&ZoneState> {
        self.zones
            .binary_search_by_key(&zone_id, |zone| zone.id)
            .ok()
            .map(|position| &self.zones[position])
    }

    fn ambient_temperature(&self) -> f64 {
        self.inputs[0]
    }
}

impl InstanceModel for Co2Ventilation {
    fn init(&mut self) -> Result<(), ConfigurationError> {
        let parameters = self.config.validate()?;

        let mut schedule_names = Vec::with_capacity(self.config.schedules.len());
        let mut splines = Vec::with_capacity(self.config.schedules.len());
        for (name, schedule) in &self.config.schedules {
            let spline =
                SourceSpline::new(schedule).map_err(|error| ConfigurationError::InvalidSchedule {
                    name: name.clone(),
                    reason: error.to_string(),
                })?;
            schedule_names.push(name.as_str());
            splines.push(spline);
        }

        let mut zone_configs: Vec<_> = self.config.zones.iter().collect();
        zone_configs.sort_by_key(|zone| zone.id);

        let mut inputs = vec![parameters.start_air_temperature];
        let mut input_index = BTreeMap::from([(self.config.ambient_temperature_value_ref, 0)]);
        let mut zones = Vec::with_capacity(zone_configs.len());

        for config in zone_configs {
            let schedule = schedule_names
                .iter()
                .position(|name| *name == config.schedule_name)
                .ok_or_else(|| ConfigurationError::UndefinedSchedule(config.schedule_name.clone()))?;

            input_index.insert(config.air_temperature_value_ref, inputs.len());
            let mut zone = ZoneState::new(
                config,
                schedule,
                inputs.len(),
                VentilationController::new(
                    parameters.co2_tolerance_band,
                    parameters.temperature_tolerance_band,
                ),
            );
            inputs.push(parameters.start_air_temperature);

            zone.seed(
                parameters.start_co2_concentration,
                parameters.start_air_temperature,
            );
            zones.push(zone);
        }

        self.state_size = state_size(2 + inputs.len() + zones.len() * ZONE_STATE_FIELDS);
        self.parameters = Some(parameters);
        self.splines = splines;
        self.zones = zones;
        self.inputs = inputs;
        self.input_index = input_index;
        self.cached_inputs = None;
        self.current_time = 0.0;
        self.last_time = 0.0;

        info!(
            zones = self.zones.len(),
            schedules = self.splines.len(),
            state_size = self.state_size,
            "CO2 ventilation model initialized"
        );
        Ok(())
    }

    fn real_input_mut(&mut self, value_ref: u32) -> Option<&mut f64> {
        let index = *self.input_index.get(&value_ref)?;
        self.inputs.get_mut(index)
    }

    fn real_value(&self, value_ref: u32) -> Option<f64> {
        if let Some(&index) = self.input_index.get(&value_ref) {
            return self.inputs.get(index).copied();
        }
        let limits = self.parameters?.limits;
        self.zones.iter().find_map(|zone| {
            if zone.co2_concentration_value_ref == value_ref {
                Some(zone.concentration(zone.mass, self.inputs[zone.air_temperature_input]))
            } else if zone.air_change_rate_value_ref == value_ref {
                Some(zone.ventilation.air_change_rate(&limits))
            } else {
                None
            }
        })
    }

    /// Updates the ventilation controllers from the committed CO2 masses and
    /// the current inputs.
    fn update_if_modified(&mut self) -> bool {
        let Some(parameters) = self.parameters else {
            return false;
        };
        if self.cached_inputs.as_ref() == Some(&self.inputs) {
            return false;
        }

        let ambient = self.ambient_temperature();
        for zone in &mut self.zones {
            let air_temperature = self.inputs[zone.air_temperature_input];
            let co2 = zone.concentration(zone.last_mass, air_temperature);
            zone.ventilation
                .update(&parameters.limits, air_temperature, ambient, co2);
        }
        self.cached_inputs = Some(self.inputs.clone());
        true
    }

    fn committed_time(&self) -> f64 {
        self.last_time
    }

    fn integrate_to(&mut self, t_end: f64) -> Result<(), ConvergenceError> {
        let Some(parameters) = self.parameters else {
            return Ok(());
        };

        for zone in &mut self.zones {
            let boundary = Boundary {
                air_change_rate: zone.ventilation.air_change_rate(&parameters.limits),
                air_temperature: self.inputs[zone.air_temperature_input],
                ambient_co2_concentration: parameters.ambient_co2_concentration,
            };
            zone.integrate(
                self.last_time,
                t_end,
                &boundary,
                &self.splines[zone.schedule],
                &self.newton,
            )?;
        }

        self.current_time = t_end;
        Ok(())
    }

    fn step_completed(&mut self) {
        for zone in &mut self.zones {
            zone.last_mass = zone.mass;
            zone.ventilation.step_completed(self.current_time);
        }
        self.last_time = self.current_time;
        // The committed masses changed, so the controllers must see them.
        self.cached_inputs = None;
        debug!(
            t = self.last_time,
            ventilating = self
                .zones
                .iter()
                .filter(|zone| zone.ventilation.is_ventilating())
                .count(),
            "CO2 ventilation step completed"
        );
    }

    fn fmu_state_size(&self) -> usize {
        self.state_size
    }

    /// Layout after the length prefix: current time, last time, the input
    /// table, then per zone in ID order the current mass, the committed mass
    /// and the committed and tentative values of the CO2, cooling and heating
    /// controllers.
    fn serialize_fmu_state(&self, buffer: &mut [u8]) -> Result<(), ConsistencyFault> {
        let mut writer = StateWriter::new(buffer, self.state_size)?;
        writer.write_f64(self.current_time);
        writer.write_f64(self.last_time);
        for &input in &self.inputs {
            writer.write_f64(input);
        }
        for zone in &self.zones {
            writer.write_f64(zone.mass);
            writer.write_f64(zone.last_mass);
            zone.ventilation.write_state(&mut writer);
        }
        writer.finish()
    }

    fn deserialize_fmu_state(&mut self, buffer: &[u8]) -> Result<(), StateError> {
        let mut reader = StateReader::new(buffer, self.state_size)?;

        let current_time = reader.read_finite("current time")?;
        let last_time = reader.read_finite("last time")?;
        let inputs = self
            .inputs
            .iter()
            .map(|_| reader.read_f64())
            .collect::<Result<Vec<_>, _>>()?;

        let mut zone_states = Vec::with_capacity(self.zones.len());
        for _ in &self.zones {
            let mass = reader.read_finite("CO2 mass")?;
            let last_mass = reader.read_finite("CO2 mass")?;
            let controller = VentilationController::read_state(&mut reader)?;
            zone_states.push((mass, last_mass, controller));
        }
        reader.finish()?;

        self.current_time = current_time;
        self.last_time = last_time;
        self.inputs = inputs;
        for (zone, (mass, last_mass, controller)) in self.zones.iter_mut().zip(zone_states) {
            zone.mass = mass;
            zone.last_mass = last_mass;
            zone.ventilation.restore(controller);
        }
        self.cached_inputs = None;
        Ok(())
    }
}
