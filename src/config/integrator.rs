use serde::Deserialize;

use super::null_as_default;
use crate::error::ConfigError;

/// `numericalIntegrator` / `dsstIntegrator` block
///
/// A non-zero `fixedStep` selects classical Runge-Kutta; anything else is
/// the adaptive Dormand-Prince 8(5,3) with the three other keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegratorConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub min_step: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_step: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub fixed_step: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub position_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegratorSettings {
    Fixed {
        step: f64,
    },
    Adaptive {
        min_step: f64,
        max_step: f64,
        position_error: f64,
    },
}

fn positive(field: &'static str, key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(field, format!("{} = {} must be positive", key, value)))
    }
}

impl IntegratorConfiguration {
    /// `field` names the block in error messages
    pub fn settings(&self, field: &'static str) -> Result<IntegratorSettings, ConfigError> {
        if self.fixed_step != 0.0 {
            let step = positive(field, "fixedStep", self.fixed_step)?;
            return Ok(IntegratorSettings::Fixed { step });
        }

        let min_step = positive(field, "minStep", self.min_step)?;
        let max_step = positive(field, "maxStep", self.max_step)?;
        let position_error = positive(field, "positionError", self.position_error)?;
        if min_step > max_step {
            return Err(ConfigError::invalid(
                field,
                format!("minStep {} exceeds maxStep {}", min_step, max_step),
            ));
        }
        Ok(IntegratorSettings::Adaptive {
            min_step,
            max_step,
            position_error,
        })
    }
}
