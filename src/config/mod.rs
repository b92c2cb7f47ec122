//! YAML input model
//!
//! The raw model mirrors the input file: camelCase keys, unknown keys
//! ignored, and missing or null numbers read as 0.0, the "unset" sentinel
//! of the format. [`OrbitComparatorInputs::validate`] turns it into typed
//! [`ComparisonSettings`] that the builders consume.

mod body;
mod forces;
mod integrator;
mod orbit;

pub use body::{BodySettings, CentralBodyConfiguration};
pub use forces::{
    DragConfiguration, DragSettings, ForceModelConfiguration, ForceSettings, GravityConfiguration,
    OceanTidesConfiguration, PolynomialAccelerationConfiguration, PolynomialSettings,
    RelativityConfiguration, SolarRadiationPressureConfiguration, SrpSettings, ThirdBodyConfiguration,
    ThirdBodySettings,
};
pub use integrator::{IntegratorConfiguration, IntegratorSettings};
pub use orbit::{
    CartesianOrbitConfiguration, CircularOrbitConfiguration, EquinoctialOrbitConfiguration,
    KeplerianOrbitConfiguration, OrbitConfiguration, OrbitInput, OrbitSettings, OrbitTypeConfiguration,
    TleConfiguration,
};

use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use satkit::Instant;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::propagation::bodies::EphemerisSource;
use crate::propagation::dsst::DEFAULT_INTERPOLATION_GAP;
use crate::propagation::state::{DEFAULT_MASS, JULIAN_DAY};

/// Read a YAML null as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse an ISO-8601 date as UTC
///
/// Accepts an explicit offset (`2023-01-01T00:00:00Z`) or none, with or
/// without fractional seconds, and a space instead of the `T`.
pub fn parse_date(text: &str) -> Result<Instant, ConfigError> {
    let trimmed = text.trim();
    let naive = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| ConfigError::Date {
            date: text.to_string(),
            reason: e.to_string(),
        })?;

    let seconds = naive.second() as f64 + naive.nanosecond() as f64 * 1e-9;
    Instant::from_datetime(
        naive.year(),
        naive.month() as i32,
        naive.day() as i32,
        naive.hour() as i32,
        naive.minute() as i32,
        seconds,
    )
    .map_err(|e| ConfigError::Date {
        date: text.to_string(),
        reason: e.to_string(),
    })
}

/// Root of the input file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitComparatorInputs {
    pub orbit: Option<OrbitConfiguration>,
    pub body: Option<CentralBodyConfiguration>,
    pub numerical_integrator: Option<IntegratorConfiguration>,
    pub dsst_integrator: Option<IntegratorConfiguration>,
    pub force_models: Option<ForceModelConfiguration>,
    /// Days
    #[serde(deserialize_with = "null_as_default")]
    pub propagation_duration: f64,
    /// Seconds
    pub dsst_interpolation_gap: Option<f64>,
    pub ephemeris: Option<String>,
    /// Kilograms
    pub spacecraft_mass: Option<f64>,
}

/// Everything a comparison run needs, validated
#[derive(Debug, Clone)]
pub struct ComparisonSettings {
    /// Seconds
    pub duration: f64,
    pub body: BodySettings,
    pub orbit: OrbitSettings,
    pub numerical_integrator: IntegratorSettings,
    pub dsst_integrator: IntegratorSettings,
    pub forces: ForceSettings,
    pub dsst_interpolation_gap: f64,
    pub ephemeris: EphemerisSource,
    pub mass: f64,
}

/// Name of the numerical propagator in diagnostics
pub const NUMERICAL_PROPAGATOR: &str = "Numerical propagator";

/// Name of the DSST propagator in diagnostics
pub const DSST_PROPAGATOR: &str = "DSST propagator";

impl OrbitComparatorInputs {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check the inputs and resolve names, units and defaults
    pub fn validate(&self) -> Result<ComparisonSettings, ConfigError> {
        let body = self.body.clone().unwrap_or_default().settings()?;
        let orbit = self.orbit.as_ref().ok_or(ConfigError::MissingOrbit)?.settings()?;

        let numerical_integrator = self
            .numerical_integrator
            .as_ref()
            .ok_or_else(|| ConfigError::MissingIntegrator(NUMERICAL_PROPAGATOR.to_string()))?
            .settings("numericalIntegrator")?;
        let dsst_integrator = self
            .dsst_integrator
            .as_ref()
            .ok_or_else(|| ConfigError::MissingIntegrator(DSST_PROPAGATOR.to_string()))?
            .settings("dsstIntegrator")?;

        let forces = self.force_models.clone().unwrap_or_default().settings()?;

        if !self.propagation_duration.is_finite() || self.propagation_duration < 0.0 {
            return Err(ConfigError::invalid(
                "propagationDuration",
                format!("{} days is not a forward duration", self.propagation_duration),
            ));
        }

        let dsst_interpolation_gap = self.dsst_interpolation_gap.unwrap_or(DEFAULT_INTERPOLATION_GAP);
        if !dsst_interpolation_gap.is_finite() || dsst_interpolation_gap <= 0.0 {
            return Err(ConfigError::invalid(
                "dsstInterpolationGap",
                format!("{} s must be positive", dsst_interpolation_gap),
            ));
        }

        let ephemeris = match &self.ephemeris {
            Some(name) => name.parse()?,
            None => EphemerisSource::LowPrecision,
        };

        let mass = self.spacecraft_mass.unwrap_or(DEFAULT_MASS);
        if !mass.is_finite() || mass <= 0.0 {
            return Err(ConfigError::invalid("spacecraftMass", format!("{} kg must be positive", mass)));
        }

        Ok(ComparisonSettings {
            duration: self.propagation_duration * JULIAN_DAY,
            body,
            orbit,
            numerical_integrator,
            dsst_integrator,
            forces,
            dsst_interpolation_gap,
            ephemeris,
            mass,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Two-body LEO run used across the test suite
    pub const TWO_BODY: &str = "
propagationDuration: 1.0
body:
  iersConventionYear: 2010
  frameName: CIO/2010-based ITRF simple EOP
  equatorialRadius: 6378137.0
  inverseFlattening: 298.257223563
orbit:
  date: '2023-01-01T00:00:00'
  frameName: EME2000
  orbitType:
    name: KEPLERIAN
    keplerian:
      a: 7000000.0
      e: 0.001
      i: 51.6
      pa: 0.0
      raan: 0.0
      v: 0.0
      positionAngle: MEAN
numericalIntegrator:
  minStep: 0.001
  maxStep: 300.0
  positionError: 0.001
dsstIntegrator:
  minStep: 0.001
  maxStep: 300.0
  positionError: 0.001
forceModels:
  gravity:
    degree: 0
    order: 0
";
}

#[cfg(test)]
mod tests {
    use super::fixtures::TWO_BODY;
    use super::*;
    use crate::propagation::frames::Frame;

    #[test]
    fn test_two_body_inputs() {
        let inputs = OrbitComparatorInputs::from_yaml_str(TWO_BODY).unwrap();
        let settings = inputs.validate().unwrap();
        assert_eq!(settings.duration, 86_400.0);
        assert_eq!(settings.orbit.frame, Frame::Eme2000);
        assert!(settings.forces.third_bodies.is_empty());
        assert_eq!(settings.forces.gravity_degree, 0);
        assert_eq!(settings.dsst_interpolation_gap, 86_400.0);
        assert_eq!(settings.ephemeris, EphemerisSource::LowPrecision);
        assert_eq!(settings.mass, DEFAULT_MASS);
        assert!(matches!(
            settings.numerical_integrator,
            IntegratorSettings::Adaptive { max_step, .. } if max_step == 300.0
        ));
    }

    #[test]
    fn test_missing_orbit() {
        let text = TWO_BODY.replace("orbit:", "notAnOrbit:");
        let inputs = OrbitComparatorInputs::from_yaml_str(&text).unwrap();
        let error = inputs.validate().unwrap_err();
        assert!(matches!(error, ConfigError::MissingOrbit));
        assert!(error.to_string().contains("Orbit must be defined"));
    }

    #[test]
    fn test_body_frame_must_be_earth_fixed() {
        let text = TWO_BODY.replace("frameName: CIO/2010-based ITRF simple EOP", "frameName: EME2000");
        let error = OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().unwrap_err();
        assert!(error.to_string().contains("No Earth frame"), "{}", error);
    }

    #[test]
    fn test_orbit_frame_must_be_inertial() {
        let text = TWO_BODY.replace(
            "frameName: EME2000",
            "frameName: ITRF-CIO/2010-based accurate EOP",
        );
        let error = OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().unwrap_err();
        assert!(error.to_string().contains("non pseudo-inertial frame"), "{}", error);
    }

    #[test]
    fn test_missing_integrator() {
        let text = TWO_BODY.replace("dsstIntegrator:", "otherIntegrator:");
        let error = OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().unwrap_err();
        assert_eq!(error.to_string(), "Integrator shall be defined for: DSST propagator");
    }

    #[test]
    fn test_null_fixed_step_means_adaptive() {
        let text = TWO_BODY.replace("  minStep: 0.001\n  maxStep: 300.0\n  positionError: 0.001\ndsst", "  fixedStep: ~\n  minStep: 0.001\n  maxStep: 300.0\n  positionError: 0.001\ndsst");
        let settings = OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().unwrap();
        assert!(matches!(settings.numerical_integrator, IntegratorSettings::Adaptive { .. }));
    }

    #[test]
    fn test_supplementary_keys() {
        let text = format!(
            "{}dsstInterpolationGap: 3600.0\nephemeris: JPL\nspacecraftMass: 250.0\n",
            TWO_BODY
        );
        let settings = OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().unwrap();
        assert_eq!(settings.dsst_interpolation_gap, 3_600.0);
        assert_eq!(settings.ephemeris, EphemerisSource::Jpl);
        assert_eq!(settings.mass, 250.0);

        let text = format!("{}dsstInterpolationGap: 0.0\n", TWO_BODY);
        assert!(OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().is_err());
    }

    #[test]
    fn test_parse_dates() {
        let reference = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        for text in ["2023-01-01T00:00:00", "2023-01-01T00:00:00Z", "2023-01-01T00:00:00.000", "2023-01-01 00:00:00"] {
            let date = parse_date(text).unwrap();
            assert!((date - reference).as_seconds().abs() < 1e-6, "{}", text);
        }
        let date = parse_date("2023-01-01T01:00:00+01:00").unwrap();
        assert!((date - reference).as_seconds().abs() < 1e-6);
        assert!(matches!(parse_date("yesterday"), Err(ConfigError::Date { .. })));
    }
}
