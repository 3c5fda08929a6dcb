/// Configuration for the Newton solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub max_iters: usize,
    pub x_abs_tol: f64,
    pub x_rel_tol: f64,
    pub residual_tol: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 50,
            x_abs_tol: 1e-12,
            x_rel_tol: 1e-10,
            residual_tol: 0.0,
        }
    }
}

impl Config {
    /// Validates the iteration cap and that all tolerances are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero or any tolerance is negative or non-finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_iters == 0 {
            return Err("max_iters must be at least 1");
        }
        if !self.x_abs_tol.is_finite() || self.x_abs_tol < 0.0 {
            return Err("x_abs_tol must be finite and non-negative");
        }
        if !self.x_rel_tol.is_finite() || self.x_rel_tol < 0.0 {
            return Err("x_rel_tol must be finite and non-negative");
        }
        if !self.residual_tol.is_finite() || self.residual_tol < 0.0 {
            return Err("residual_tol must be finite and non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let zero_iters = Config {
            max_iters: 0,
            ..Config::default()
        };
        assert!(zero_iters.validate().is_err());

        let negative_tol = Config {
            x_rel_tol: -1.0,
            ..Config::default()
        };
        assert!(negative_tol.validate().is_err());

        let nan_tol = Config {
            residual_tol: f64::NAN,
            ..Config::default()
        };
        assert!(nan_tol.validate().is_err());
    }
}
