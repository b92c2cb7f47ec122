use serde::Deserialize;

use super::null_as_default;
use crate::error::ConfigError;
use crate::propagation::frames::{Frame, IersConventions};
use crate::propagation::state::{WGS84_EARTH_EQUATORIAL_RADIUS, WGS84_EARTH_FLATTENING};

/// `body` block
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CentralBodyConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub iers_convention_year: u32,
    pub frame_name: Option<String>,
    /// Meters; 0 means WGS84
    #[serde(deserialize_with = "null_as_default")]
    pub equatorial_radius: f64,
    /// 0 means WGS84
    #[serde(deserialize_with = "null_as_default")]
    pub inverse_flattening: f64,
}

/// Validated central body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySettings {
    pub frame: Frame,
    pub conventions: IersConventions,
    pub equatorial_radius: f64,
    pub flattening: f64,
}

impl CentralBodyConfiguration {
    /// Earth-fixed frame of the body, ITRF of the configured conventions when unnamed
    pub fn earth_frame(&self) -> Result<Frame, ConfigError> {
        match &self.frame_name {
            Some(name) => Frame::earth_frame(name),
            None => Ok(Frame::itrf(IersConventions::from_year(self.iers_convention_year)?)),
        }
    }

    pub fn settings(&self) -> Result<BodySettings, ConfigError> {
        let conventions = IersConventions::from_year(self.iers_convention_year)?;
        let frame = self.earth_frame()?;

        let equatorial_radius = if self.equatorial_radius != 0.0 {
            self.equatorial_radius
        } else {
            WGS84_EARTH_EQUATORIAL_RADIUS
        };
        if !equatorial_radius.is_finite() || equatorial_radius <= 0.0 {
            return Err(ConfigError::invalid(
                "body.equatorialRadius",
                format!("{} m must be positive", equatorial_radius),
            ));
        }

        let flattening = if self.inverse_flattening != 0.0 {
            1.0 / self.inverse_flattening
        } else {
            WGS84_EARTH_FLATTENING
        };
        if !(0.0..1.0).contains(&flattening) {
            return Err(ConfigError::invalid(
                "body.inverseFlattening",
                format!("{} gives a flattening outside [0, 1)", self.inverse_flattening),
            ));
        }

        Ok(BodySettings {
            frame,
            conventions,
            equatorial_radius,
            flattening,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_wgs84_itrf() {
        let settings = CentralBodyConfiguration::default().settings().unwrap();
        assert_eq!(settings.frame, Frame::itrf(IersConventions::Iers2010));
        assert_eq!(settings.equatorial_radius, WGS84_EARTH_EQUATORIAL_RADIUS);
        assert_eq!(settings.flattening, WGS84_EARTH_FLATTENING);
    }

    #[test]
    fn test_frame_names() {
        let body = CentralBodyConfiguration {
            frame_name: Some("GTOD without EOP corrections".to_string()),
            ..Default::default()
        };
        assert_eq!(body.earth_frame().unwrap(), Frame::Gtod { conventions: None });

        let body = CentralBodyConfiguration {
            frame_name: Some("Earth-fixed, probably".to_string()),
            ..Default::default()
        };
        assert!(matches!(body.earth_frame(), Err(ConfigError::UnknownFrame(_))));

        let body = CentralBodyConfiguration {
            iers_convention_year: 2003,
            ..Default::default()
        };
        assert_eq!(body.settings().unwrap().conventions, IersConventions::Iers2003);
    }

    #[test]
    fn test_bad_flattening() {
        let body = CentralBodyConfiguration {
            inverse_flattening: 0.5,
            ..Default::default()
        };
        assert!(body.settings().is_err());
    }
}
