use nandrad_control::controller::DigitalHysteresisController;

use crate::state::{StateError, StateReader, StateWriter};

/// Switching thresholds and the two air change rates a zone toggles between.
///
/// Concentrations are in mol/mol, temperatures in K, rates in 1/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VentilationLimits {
    pub maximum_co2_concentration: f64,
    pub minimum_air_temperature: f64,
    pub maximum_air_temperature: f64,
    pub minimum_air_change_rate: f64,
    pub maximum_air_change_rate: f64,
}

/// Hysteresis control of the air change rate of one zone.
///
/// Three on/off controllers request maximum ventilation:
/// - CO2: the concentration exceeds the maximum
/// - cooling: the zone is warmer than the maximum and the ambient air is cooler
///   than the zone
/// - heating: the zone is colder than the minimum and the ambient air is warmer
///   than the zone
///
/// Each controller switches with half its tolerance band above and below the
/// threshold. With zero bands they switch exactly at the thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct VentilationController {
    co2: DigitalHysteresisController,
    cooling: DigitalHysteresisController,
    heating: DigitalHysteresisController,
}

/// Number of `f64` fields in a serialized controller.
pub(crate) const STATE_FIELDS: usize = 6;

impl VentilationController {
    /// Creates a controller from the full CO2 (mol/mol) and temperature (K) tolerance bands.
    #[must_use]
    pub fn new(co2_tolerance_band: f64, temperature_tolerance_band: f64) -> Self {
        Self {
            co2: DigitalHysteresisController::new(0.5 * co2_tolerance_band),
            cooling: DigitalHysteresisController::new(0.5 * temperature_tolerance_band),
            heating: DigitalHysteresisController::new(0.5 * temperature_tolerance_band),
        }
    }

    /// Updates the controllers and returns the resulting air change rate.
    pub fn calculate_air_change_rate(
        &mut self,
        limits: &VentilationLimits,
        air_temperature: f64,
        ambient_temperature: f64,
        co2_concentration: f64,
    ) -> f64 {
        self.update(limits, air_temperature, ambient_temperature, co2_concentration);
        self.air_change_rate(limits)
    }

    /// Feeds the current zone conditions to the three controllers.
    pub fn update(
        &mut self,
        limits: &VentilationLimits,
        air_temperature: f64,
        ambient_temperature: f64,
        co2_concentration: f64,
    ) {
        self.co2
            .update(co2_concentration - limits.maximum_co2_concentration);

        // Ventilating only helps if the ambient air pulls the zone in the
        // right direction; otherwise the request is switched off.
        let cooling_error = if ambient_temperature < air_temperature {
            air_temperature - limits.maximum_air_temperature
        } else {
            f64::NEG_INFINITY
        };
        self.cooling.update(cooling_error);

        let heating_error = if ambient_temperature > air_temperature {
            limits.minimum_air_temperature - air_temperature
        } else {
            f64::NEG_INFINITY
        };
        self.heating.update(heating_error);
    }

    /// Returns the rate requested by the latest update.
    #[must_use]
    pub fn air_change_rate(&self, limits: &VentilationLimits) -> f64 {
        let requested = [&self.co2, &self.cooling, &self.heating]
            .iter()
            .any(|c| c.next_control_value() > 0.5);
        if requested {
            limits.maximum_air_change_rate
        } else {
            limits.minimum_air_change_rate
        }
    }

    /// Returns `true` if any controller has committed to maximum ventilation.
    pub(crate) fn is_ventilating(&self) -> bool {
        [&self.co2, &self.cooling, &self.heating]
            .iter()
            .any(|c| c.base().control_value() > 0.5)
    }

    pub fn step_completed(&mut self, t: f64) {
        self.co2.step_completed(t);
        self.cooling.step_completed(t);
        self.heating.step_completed(t);
    }

    pub(crate) fn write_state(&self, writer: &mut StateWriter<'_>) {
        for controller in [&self.co2, &self.cooling, &self.heating] {
            writer.write_f64(controller.base().control_value());
            writer.write_f64(controller.next_control_value());
        }
    }

    /// Reads committed and tentative values of all three controllers.
    pub(crate) fn read_state(
        reader: &mut StateReader<'_>,
    ) -> Result<[f64; STATE_FIELDS], StateError> {
        let mut values = [0.0; STATE_FIELDS];
        for value in &mut values {
            let v = reader.read_f64()?;
            if v != 0.0 && v != 1.0 {
                return Err(StateError::InvalidValue {
                    field: "control value",
                    value: v,
                });
            }
            *value = v;
        }
        Ok(values)
    }

    pub(crate) fn restore(&mut self, values: [f64; STATE_FIELDS]) {
        let [co2, co2_next, cooling, cooling_next, heating, heating_next] = values;
        self.co2.restore(co2, co2_next);
        self.cooling.restore(cooling, cooling_next);
        self.heating.restore(heating, heating_next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: VentilationLimits = VentilationLimits {
        maximum_co2_concentration: 1000e-6,
        minimum_air_temperature: 293.15,
        maximum_air_temperature: 299.15,
        minimum_air_change_rate: 0.1,
        maximum_air_change_rate: 2.0,
    };

    /// Updates `controller` with the given air, ambient and CO2 values and
    /// returns the requested air change rate.
    fn rate(controller: &mut VentilationController, air: f64, ambient: f64, co2: f64) -> f64 {
        controller.calculate_air_change_rate(&LIMITS, air, ambient, co2)
    }

    #[test]
    fn co2_hysteresis() {
        let mut controller = VentilationController::new(200e-6, 0.0);

        // Above the maximum but within the half band.
        assert_eq!(rate(&mut controller, 295.0, 290.0, 1050e-6), 0.1);
        assert_eq!(rate(&mut controller, 295.0, 290.0, 1150e-6), 2.0);
        controller.step_completed(60.0);
        assert!(controller.is_ventilating());

        // Still on below the maximum until the lower band edge.
        assert_eq!(rate(&mut controller, 295.0, 290.0, 950e-6), 2.0);
        assert_eq!(rate(&mut controller, 295.0, 290.0, 850e-6), 0.1);
    }

    #[test]
    fn cooling_requires_cooler_ambient_air() {
        let mut controller = VentilationController::new(0.0, 1.0);
        assert_eq!(rate(&mut controller, 301.0, 305.0, 400e-6), 0.1);
        assert_eq!(rate(&mut controller, 301.0, 295.0, 400e-6), 2.0);
        // Warmer ambient air switches cooling off regardless of the band.
        assert_eq!(rate(&mut controller, 299.5, 305.0, 400e-6), 0.1);
    }

    #[test]
    fn heating_requires_warmer_ambient_air() {
        let mut controller = VentilationController::new(0.0, 1.0);
        assert_eq!(rate(&mut controller, 290.0, 285.0, 400e-6), 0.1);
        assert_eq!(rate(&mut controller, 290.0, 296.0, 400e-6), 2.0);
        assert_eq!(rate(&mut controller, 292.9, 296.0, 400e-6), 2.0);
        assert_eq!(rate(&mut controller, 294.0, 296.0, 400e-6), 0.1);
    }

    #[test]
    fn zero_bands_act_as_digital_controller() {
        let mut controller = VentilationController::new(0.0, 0.0);
        assert_eq!(rate(&mut controller, 295.0, 290.0, 1001e-6), 2.0);
        assert_eq!(rate(&mut controller, 295.0, 290.0, 999e-6), 0.1);
        assert_eq!(rate(&mut controller, 295.0, 290.0, 1001e-6), 2.0);
    }

    #[test]
    fn commit_follows_latest_update() {
        let mut controller = VentilationController::new(0.0, 0.0);
        rate(&mut controller, 295.0, 290.0, 2000e-6);
        assert!(!controller.is_ventilating());
        controller.step_completed(60.0);
        assert!(controller.is_ventilating());
    }
}
