use nandrad_solve::equation::newton::{self, Residual};
use uom::si::{area::square_meter, volume::cubic_meter};

use crate::instance::ConvergenceError;

use super::{
    MOLAR_MASS_CO2, R_IDEAL_GAS, REFERENCE_PRESSURE, SUB_STEPS, config::ZoneConfig,
    controller::VentilationController, spline::SourceSpline,
};

/// Conditions held constant over one integration interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Boundary {
    /// Air change rate in 1/s.
    pub air_change_rate: f64,
    /// Zone air temperature in K.
    pub air_temperature: f64,
    /// Ambient CO2 concentration in mol/mol.
    pub ambient_co2_concentration: f64,
}

/// Per-zone state of the CO2 balance.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ZoneState {
    pub id: u32,
    volume: f64,
    floor_area: f64,
    /// Index into the model's splines.
    pub schedule: usize,
    /// Position of the air temperature in the model's input table.
    pub air_temperature_input: usize,
    pub co2_concentration_value_ref: u32,
    pub air_change_rate_value_ref: u32,
    /// CO2 mass in kg at the current time point.
    pub mass: f64,
    /// CO2 mass in kg at the last committed time point.
    pub last_mass: f64,
    pub ventilation: VentilationController,
}

/// Molar density of air in mol/m³ at the reference pressure.
fn molar_density(air_temperature: f64) -> f64 {
    REFERENCE_PRESSURE / (R_IDEAL_GAS * air_temperature)
}

impl ZoneState {
    pub(crate) fn new(
        config: &ZoneConfig,
        schedule: usize,
        air_temperature_input: usize,
        ventilation: VentilationController,
    ) -> Self {
        Self {
            id: config.id,
            volume: config.volume.get::<cubic_meter>(),
            floor_area: config.floor_area.get::<square_meter>(),
            schedule,
            air_temperature_input,
            co2_concentration_value_ref: config.co2_concentration_value_ref,
            air_change_rate_value_ref: config.air_change_rate_value_ref,
            mass: 0.0,
            last_mass: 0.0,
            ventilation,
        }
    }

    /// Sets current and committed mass from a concentration.
    pub(crate) fn seed(&mut self, co2_concentration: f64, air_temperature: f64) {
        self.mass = self.mass_for(co2_concentration, air_temperature);
        self.last_mass = self.mass;
    }

    /// Returns the CO2 mole fraction of `mass` in the zone air.
    pub(crate) fn concentration(&self, mass: f64, air_temperature: f64) -> f64 {
        mass / (MOLAR_MASS_CO2 * molar_density(air_temperature) * self.volume)
    }

    fn mass_for(&self, co2_concentration: f64, air_temperature: f64) -> f64 {
        co2_concentration * MOLAR_MASS_CO2 * molar_density(air_temperature) * self.volume
    }

    /// Integrates the CO2 balance from the committed mass over `[t_start, t_end]`.
    ///
    /// ```text
    /// dm/dt = n V ρ M (c_amb - c) + s(t) A,    c = m / (M ρ V)
    /// ```
    ///
    /// Each of the fixed sub-steps is an implicit Euler step solved by Newton
    /// iteration on the mass.
    pub(crate) fn integrate(
        &mut self,
        t_start: f64,
        t_end: f64,
        boundary: &Boundary,
        source: &SourceSpline,
        config: &newton::Config,
    ) -> Result<(), ConvergenceError> {
        let n = boundary.air_change_rate;
        let inflow = n * self.mass_for(boundary.ambient_co2_concentration, boundary.air_temperature);
        let h = (t_end - t_start) / SUB_STEPS as f64;

        let mut mass = self.last_mass;
        for step in 1..=SUB_STEPS {
            let t = t_start + (t_end - t_start) * step as f64 / SUB_STEPS as f64;
            let emission = source.at(t) * self.floor_area;
            let old_mass = mass;

            let mut history: Vec<newton::Event> = Vec::new();
            let solution = newton::solve(
                |m| {
                    let flux = inflow - n * m + emission;
                    Residual::new(m - old_mass - h * flux, 1.0 + h * n)
                },
                old_mass,
                config,
                &mut history,
            )
            .map_err(|source| ConvergenceError {
                zone_id: self.id,
                time: t,
                residuals: history.iter().map(|event| event.residual).collect(),
                source,
            })?;
            mass = solution.x;
        }

        self.mass = mass;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use uom::si::f64::{Area, Volume};

    use super::*;
    use crate::co2_ventilation::spline::SourceSchedule;

    fn zone() -> ZoneState {
        let config = ZoneConfig::new(
            4,
            Volume::new::<cubic_meter>(50.0),
            Area::new::<square_meter>(20.0),
            "S",
            1,
        );
        ZoneState::new(&config, 0, 1, VentilationController::new(0.0, 0.0))
    }

    fn constant(value: f64) -> SourceSpline {
        SourceSpline::new(&SourceSchedule::constant(value)).unwrap()
    }

    #[test]
    fn concentration_round_trips_through_mass() {
        let mut zone = zone();
        zone.seed(800e-6, 295.0);
        assert_relative_eq!(zone.concentration(zone.mass, 295.0), 800e-6, max_relative = 1e-14);
        // 50 m³ at 295 K hold about 2066 mol of air.
        assert_relative_eq!(zone.mass, 800e-6 * 0.0440095 * 2065.5, max_relative = 1e-3);
    }

    #[test]
    fn closed_zone_accumulates_source() {
        let mut zone = zone();
        zone.seed(400e-6, 295.0);
        let start = zone.mass;
        let boundary = Boundary {
            air_change_rate: 0.0,
            air_temperature: 295.0,
            ambient_co2_concentration: 400e-6,
        };

        zone.integrate(0.0, 600.0, &boundary, &constant(1e-7), &newton::Config::default())
            .unwrap();

        assert_relative_eq!(zone.mass - start, 1e-7 * 20.0 * 600.0, max_relative = 1e-9);
        assert_eq!(zone.last_mass, start);
    }

    #[test]
    fn ventilation_decays_towards_ambient() {
        let mut zone = zone();
        zone.seed(1400e-6, 295.0);
        let n = 2.0 / 3600.0;
        let boundary = Boundary {
            air_change_rate: n,
            air_temperature: 295.0,
            ambient_co2_concentration: 400e-6,
        };
        let dt = 1800.0;

        zone.integrate(0.0, dt, &boundary, &constant(0.0), &newton::Config::default())
            .unwrap();

        let sub = 1.0 + n * dt / SUB_STEPS as f64;
        let expected = 400e-6 + 1000e-6 / sub.powi(SUB_STEPS as i32);
        assert_relative_eq!(
            zone.concentration(zone.mass, 295.0),
            expected,
            max_relative = 1e-9
        );
    }

    #[test]
    fn repeated_integration_restarts_from_committed_mass() {
        let mut zone = zone();
        zone.seed(1000e-6, 295.0);
        let boundary = Boundary {
            air_change_rate: 1e-3,
            air_temperature: 295.0,
            ambient_co2_concentration: 400e-6,
        };
        let config = newton::Config::default();

        zone.integrate(0.0, 300.0, &boundary, &constant(0.0), &config).unwrap();
        let first = zone.mass;
        zone.integrate(0.0, 300.0, &boundary, &constant(0.0), &config).unwrap();
        assert_eq!(zone.mass.to_bits(), first.to_bits());
    }

    #[test]
    fn iteration_cap_is_a_convergence_error() {
        let mut zone = zone();
        zone.seed(1000e-6, 295.0);
        let boundary = Boundary {
            air_change_rate: 1e-3,
            air_temperature: 295.0,
            ambient_co2_concentration: 400e-6,
        };
        let config = newton::Config {
            max_iters: 1,
            ..newton::Config::default()
        };

        let error = zone
            .integrate(0.0, 300.0, &boundary, &constant(0.0), &config)
            .unwrap_err();
        assert_eq!(error.zone_id, 4);
        assert_relative_eq!(error.time, 30.0);
        assert_eq!(error.residuals.len(), 1);
        assert!(error.residuals[0].abs() > 0.0);
        assert!(matches!(error.source, newton::Error::NotConverged { .. }));
    }
}
