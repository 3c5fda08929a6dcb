use nandrad_core::ConfigurationError;
use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{TemperatureInterval, ThermodynamicTemperature},
    temperature_interval, thermodynamic_temperature,
};

use crate::controller::Controller;

/// Where the setpoints of a thermostat come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThermostatModelType {
    /// Constant heating and cooling setpoints from the configuration.
    #[default]
    Constant,
    /// Per-zone `HeatingSetpointSchedule` and `CoolingSetpointSchedule` inputs.
    Scheduled,
}

/// The zone temperature a thermostat senses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureType {
    #[default]
    AirTemperature,
    OperativeTemperature,
}

impl TemperatureType {
    /// Returns the name of the zone quantity that carries this temperature.
    #[must_use]
    pub fn quantity_name(self) -> &'static str {
        match self {
            Self::AirTemperature => "AirTemperature",
            Self::OperativeTemperature => "OperativeTemperature",
        }
    }
}

/// The control law used by a thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerType {
    PController,
    PIController,
    DigitalController,
}

/// Configuration of a zone thermostat.
///
/// Temperatures are stored in SI base units, so a JSON configuration lists
/// setpoints in kelvin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatConfig {
    pub id: u32,
    #[serde(default)]
    pub display_name: String,
    /// Name of the zone object list the thermostat applies to.
    pub zone_object_list: String,
    /// Optional zone whose sensor feeds all controlled zones.
    #[serde(default)]
    pub reference_zone_id: Option<u32>,
    #[serde(default)]
    pub model_type: ThermostatModelType,
    #[serde(default)]
    pub temperature_type: Option<TemperatureType>,
    #[serde(default)]
    pub controller_type: Option<ControllerType>,
    #[serde(default)]
    pub heating_setpoint: Option<ThermodynamicTemperature>,
    #[serde(default)]
    pub cooling_setpoint: Option<ThermodynamicTemperature>,
    /// Proportional gain of a P or PI controller; its value in K is used as
    /// `kP` in 1/K.
    #[serde(default)]
    pub temperature_tolerance: Option<TemperatureInterval>,
    /// Hysteresis half-band of a digital controller, zero when unset.
    #[serde(default)]
    pub temperature_band: Option<TemperatureInterval>,
    /// Integral gain of a PI controller, in 1/(K·s).
    #[serde(default)]
    pub integral_gain: Option<f64>,
}

impl ThermostatConfig {
    /// Creates a constant-setpoint configuration with no parameters set.
    pub fn new(id: u32, zone_object_list: impl Into<String>) -> Self {
        Self {
            id,
            display_name: String::new(),
            zone_object_list: zone_object_list.into(),
            reference_zone_id: None,
            model_type: ThermostatModelType::Constant,
            temperature_type: None,
            controller_type: None,
            heating_setpoint: None,
            cooling_setpoint: None,
            temperature_tolerance: None,
            temperature_band: None,
            integral_gain: None,
        }
    }

    /// Returns `self` with the given reference zone, keeping other fields unchanged.
    #[must_use]
    pub fn with_reference_zone(self, zone_id: u32) -> Self {
        Self {
            reference_zone_id: Some(zone_id),
            ..self
        }
    }

    /// Returns `self` with the given model type, keeping other fields unchanged.
    #[must_use]
    pub fn with_model_type(self, model_type: ThermostatModelType) -> Self {
        Self { model_type, ..self }
    }

    /// Returns `self` with the given temperature type, keeping other fields unchanged.
    #[must_use]
    pub fn with_temperature_type(self, temperature_type: TemperatureType) -> Self {
        Self {
            temperature_type: Some(temperature_type),
            ..self
        }
    }

    /// Returns `self` with the given controller type, keeping other fields unchanged.
    #[must_use]
    pub fn with_controller_type(self, controller_type: ControllerType) -> Self {
        Self {
            controller_type: Some(controller_type),
            ..self
        }
    }

    /// Returns `self` with the given setpoints, keeping other fields unchanged.
    #[must_use]
    pub fn with_setpoints(
        self,
        heating: ThermodynamicTemperature,
        cooling: ThermodynamicTemperature,
    ) -> Self {
        Self {
            heating_setpoint: Some(heating),
            cooling_setpoint: Some(cooling),
            ..self
        }
    }

    /// Returns `self` with the given tolerance, keeping other fields unchanged.
    #[must_use]
    pub fn with_temperature_tolerance(self, tolerance: TemperatureInterval) -> Self {
        Self {
            temperature_tolerance: Some(tolerance),
            ..self
        }
    }

    /// Returns `self` with the given hysteresis band, keeping other fields unchanged.
    #[must_use]
    pub fn with_temperature_band(self, band: TemperatureInterval) -> Self {
        Self {
            temperature_band: Some(band),
            ..self
        }
    }

    /// Returns `self` with the given integral gain, keeping other fields unchanged.
    #[must_use]
    pub fn with_integral_gain(self, integral_gain: f64) -> Self {
        Self {
            integral_gain: Some(integral_gain),
            ..self
        }
    }

    /// Returns the sensed temperature, defaulting to air temperature.
    #[must_use]
    pub fn temperature_type(&self) -> TemperatureType {
        self.temperature_type.unwrap_or_default()
    }

    /// Builds the controller described by this configuration.
    ///
    /// - unset or `PController`: P with `kP = TemperatureTolerance`
    /// - `PIController`: PI with the same `kP` and `kI = IntegralGain`
    /// - `DigitalController`: hysteresis with half-band `TemperatureBand`
    ///   (zero if not given)
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if a required parameter is missing or
    /// out of range.
    pub fn build_controller(&self) -> Result<Controller, ConfigurationError> {
        match self.controller_type.unwrap_or(ControllerType::PController) {
            ControllerType::PController => Ok(Controller::p(self.proportional_gain()?)),
            ControllerType::PIController => {
                let k_p = self.proportional_gain()?;
                let k_i = self.integral_gain.ok_or_else(|| self.missing("IntegralGain"))?;
                if !k_i.is_finite() || k_i < 0.0 {
                    return Err(ConfigurationError::InvalidParameter {
                        parameter: "IntegralGain",
                        value: k_i,
                        reason: "must be finite and non-negative",
                    });
                }
                Ok(Controller::pi(k_p, k_i))
            }
            ControllerType::DigitalController => {
                let band = self
                    .temperature_band
                    .map_or(0.0, |band| band.get::<temperature_interval::kelvin>());
                if !band.is_finite() || band < 0.0 {
                    return Err(ConfigurationError::InvalidParameter {
                        parameter: "TemperatureBand",
                        value: band,
                        reason: "must be finite and non-negative",
                    });
                }
                Ok(Controller::digital_hysteresis(band))
            }
        }
    }

    /// Returns the constant `(heating, cooling)` setpoints in kelvin.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if a setpoint is missing or heating
    /// exceeds cooling.
    pub fn constant_setpoints(&self) -> Result<(f64, f64), ConfigurationError> {
        let heating = self
            .heating_setpoint
            .ok_or_else(|| self.missing("HeatingSetpoint"))?
            .get::<thermodynamic_temperature::kelvin>();
        let cooling = self
            .cooling_setpoint
            .ok_or_else(|| self.missing("CoolingSetpoint"))?
            .get::<thermodynamic_temperature::kelvin>();
        if heating > cooling {
            return Err(ConfigurationError::InvalidParameter {
                parameter: "HeatingSetpoint",
                value: heating,
                reason: "must not exceed the cooling setpoint",
            });
        }
        Ok((heating, cooling))
    }

    fn proportional_gain(&self) -> Result<f64, ConfigurationError> {
        let tolerance = self
            .temperature_tolerance
            .ok_or_else(|| self.missing("TemperatureTolerance"))?
            .get::<temperature_interval::kelvin>();
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                parameter: "TemperatureTolerance",
                value: tolerance,
                reason: "must be finite and positive",
            });
        }
        Ok(tolerance)
    }

    fn missing(&self, parameter: &'static str) -> ConfigurationError {
        ConfigurationError::MissingParameter {
            context: format!("thermostat #{}", self.id),
            parameter,
        }
    }
}
