use std::collections::{BTreeMap, BTreeSet};

use nandrad_core::ConfigurationError;
use serde::{Deserialize, Serialize};
use uom::si::{
    area::square_meter,
    f64::{Area, Frequency, Ratio, TemperatureInterval, ThermodynamicTemperature, Volume},
    frequency::hertz,
    ratio::ratio,
    temperature_interval, thermodynamic_temperature,
    volume::cubic_meter,
};

use super::{controller::VentilationLimits, spline::SourceSchedule};

/// One ventilated zone and the FMI variables attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: u32,
    pub volume: Volume,
    pub floor_area: Area,
    /// Name of the CO2 source schedule in [`Co2VentilationConfig::schedules`].
    pub schedule_name: String,
    /// Input: zone air temperature.
    pub air_temperature_value_ref: u32,
    /// Output: zone air CO2 concentration.
    pub co2_concentration_value_ref: u32,
    /// Output: zone air change rate.
    pub air_change_rate_value_ref: u32,
}

impl ZoneConfig {
    /// Creates a zone whose value references are `first_value_ref` and the two following numbers.
    pub fn new(
        id: u32,
        volume: Volume,
        floor_area: Area,
        schedule_name: impl Into<String>,
        first_value_ref: u32,
    ) -> Self {
        Self {
            id,
            volume,
            floor_area,
            schedule_name: schedule_name.into(),
            air_temperature_value_ref: first_value_ref,
            co2_concentration_value_ref: first_value_ref + 1,
            air_change_rate_value_ref: first_value_ref + 2,
        }
    }
}

/// Configuration of the CO2 ventilation model.
///
/// Quantities are stored in SI base units, so in JSON concentrations are in
/// mol/mol, temperatures in K and air change rates in 1/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2VentilationConfig {
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub schedules: BTreeMap<String, SourceSchedule>,
    pub ambient_co2_concentration: Ratio,
    pub start_co2_concentration: Ratio,
    /// Concentration above which ventilation is switched to the maximum rate.
    pub maximum_co2_concentration: Ratio,
    /// Full width of the CO2 hysteresis band.
    #[serde(default = "zero_ratio")]
    pub co2_tolerance_band: Ratio,
    /// Below this air temperature warmer ambient air is used for heating.
    pub minimum_air_temperature: ThermodynamicTemperature,
    /// Above this air temperature cooler ambient air is used for cooling.
    pub maximum_air_temperature: ThermodynamicTemperature,
    /// Start value of all temperature inputs, ambient included.
    pub start_air_temperature: ThermodynamicTemperature,
    /// Full width of the temperature hysteresis band.
    #[serde(default = "zero_interval")]
    pub temperature_tolerance_band: TemperatureInterval,
    pub minimum_air_change_rate: Frequency,
    pub maximum_air_change_rate: Frequency,
    /// Input: ambient air temperature.
    pub ambient_temperature_value_ref: u32,
}

fn zero_ratio() -> Ratio {
    Ratio::new::<ratio>(0.0)
}

fn zero_interval() -> TemperatureInterval {
    TemperatureInterval::new::<temperature_interval::kelvin>(0.0)
}

/// Validated parameters in plain SI numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Parameters {
    pub ambient_co2_concentration: f64,
    pub start_co2_concentration: f64,
    pub start_air_temperature: f64,
    pub co2_tolerance_band: f64,
    pub temperature_tolerance_band: f64,
    pub limits: VentilationLimits,
}

impl Co2VentilationConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns `self` with the given zones, keeping other fields unchanged.
    #[must_use]
    pub fn with_zones(self, zones: Vec<ZoneConfig>) -> Self {
        Self { zones, ..self }
    }

    /// Returns `self` with a schedule added under `name`.
    #[must_use]
    pub fn with_schedule(mut self, name: impl Into<String>, schedule: SourceSchedule) -> Self {
        self.schedules.insert(name.into(), schedule);
        self
    }

    /// Returns `self` with the given tolerance bands, keeping other fields unchanged.
    #[must_use]
    pub fn with_tolerance_bands(self, co2: Ratio, temperature: TemperatureInterval) -> Self {
        Self {
            co2_tolerance_band: co2,
            temperature_tolerance_band: temperature,
            ..self
        }
    }

    /// Returns `self` with the given air change rates, keeping other fields unchanged.
    #[must_use]
    pub fn with_air_change_rates(self, minimum: Frequency, maximum: Frequency) -> Self {
        Self {
            minimum_air_change_rate: minimum,
            maximum_air_change_rate: maximum,
            ..self
        }
    }

    /// Checks the configuration and converts it to plain SI numbers.
    pub(crate) fn validate(&self) -> Result<Parameters, ConfigurationError> {
        let ambient = concentration("AmbientCO2Concentration", self.ambient_co2_concentration)?;
        let start = concentration("StartCO2Concentration", self.start_co2_concentration)?;
        let maximum = concentration("MaximumCO2Concentration", self.maximum_co2_concentration)?;
        let co2_band = non_negative("CO2ToleranceBand", self.co2_tolerance_band.get::<ratio>())?;

        let t_min = temperature("MinimumAirTemperature", self.minimum_air_temperature)?;
        let t_max = temperature("MaximumAirTemperature", self.maximum_air_temperature)?;
        let t_start = temperature("StartAirTemperature", self.start_air_temperature)?;
        if t_min > t_max {
            return Err(invalid(
                "MinimumAirTemperature",
                t_min,
                "must not exceed the maximum air temperature",
            ));
        }
        let t_band = non_negative(
            "TemperatureToleranceBand",
            self.temperature_tolerance_band
                .get::<temperature_interval::kelvin>(),
        )?;

        let n_min = non_negative("MinimumAirChangeRate", self.minimum_air_change_rate.get::<hertz>())?;
        let n_max = non_negative("MaximumAirChangeRate", self.maximum_air_change_rate.get::<hertz>())?;
        if n_min > n_max {
            return Err(invalid(
                "MinimumAirChangeRate",
                n_min,
                "must not exceed the maximum air change rate",
            ));
        }

        self.validate_zones()?;

        Ok(Parameters {
            ambient_co2_concentration: ambient,
            start_co2_concentration: start,
            start_air_temperature: t_start,
            co2_tolerance_band: co2_band,
            temperature_tolerance_band: t_band,
            limits: VentilationLimits {
                maximum_co2_concentration: maximum,
                minimum_air_temperature: t_min,
                maximum_air_temperature: t_max,
                minimum_air_change_rate: n_min,
                maximum_air_change_rate: n_max,
            },
        })
    }

    fn validate_zones(&self) -> Result<(), ConfigurationError> {
        let mut ids = BTreeSet::new();
        let mut value_refs = BTreeSet::from([self.ambient_temperature_value_ref]);

        for zone in &self.zones {
            if !ids.insert(zone.id) {
                return Err(ConfigurationError::DuplicateZone(zone.id));
            }

            let volume = zone.volume.get::<cubic_meter>();
            if !(volume.is_finite() && volume > 0.0) {
                return Err(invalid("Volume", volume, "must be finite and positive"));
            }
            non_negative("FloorArea", zone.floor_area.get::<square_meter>())?;

            if !self.schedules.contains_key(&zone.schedule_name) {
                return Err(ConfigurationError::UndefinedSchedule(
                    zone.schedule_name.clone(),
                ));
            }

            for value_ref in [
                zone.air_temperature_value_ref,
                zone.co2_concentration_value_ref,
                zone.air_change_rate_value_ref,
            ] {
                if !value_refs.insert(value_ref) {
                    return Err(ConfigurationError::MalformedFmiVariable(format!(
                        "value reference {value_ref} of zone #{} is used more than once",
                        zone.id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        parameter,
        value,
        reason,
    }
}

fn non_negative(parameter: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(parameter, value, "must be finite and non-negative"))
    }
}

fn concentration(parameter: &'static str, value: Ratio) -> Result<f64, ConfigurationError> {
    let value = value.get::<ratio>();
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(parameter, value, "must be a mole fraction in [0, 1]"))
    }
}

fn temperature(
    parameter: &'static str,
    value: ThermodynamicTemperature,
) -> Result<f64, ConfigurationError> {
    let value = value.get::<thermodynamic_temperature::kelvin>();
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(parameter, value, "must be a finite absolute temperature"))
    }
}
