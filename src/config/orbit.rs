use nalgebra::Vector3;
use satkit::Instant;
use serde::Deserialize;

use super::{null_as_default, parse_date};
use crate::error::ConfigError;
use crate::propagation::frames::Frame;
use crate::propagation::orbit::PositionAngle;

/// Length of each TLE line
pub const TLE_LINE_LENGTH: usize = 69;

/// `orbit` block
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitConfiguration {
    /// ISO-8601, UTC
    pub date: Option<String>,
    pub frame_name: Option<String>,
    pub orbit_type: Option<OrbitTypeConfiguration>,
}

/// `orbit.orbitType`: a name and one populated parameterization
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitTypeConfiguration {
    pub name: Option<String>,
    pub cartesian: Option<CartesianOrbitConfiguration>,
    pub keplerian: Option<KeplerianOrbitConfiguration>,
    pub equinoctial: Option<EquinoctialOrbitConfiguration>,
    pub circular: Option<CircularOrbitConfiguration>,
    pub tle: Option<TleConfiguration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartesianOrbitConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub z: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub vx: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub vy: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub vz: f64,
}

/// Angles in degrees
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeplerianOrbitConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub a: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub e: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub i: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pa: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub raan: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub v: f64,
    pub position_angle: Option<String>,
}

/// `lv` in degrees
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquinoctialOrbitConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub a: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ex: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ey: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hx: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hy: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub lv: f64,
    pub position_angle: Option<String>,
}

/// Angles in degrees
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircularOrbitConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub a: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ex: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ey: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub i: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub raan: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub alpha_v: f64,
    pub position_angle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TleConfiguration {
    pub line1: String,
    pub line2: String,
}

/// Initial orbit parameterization, angles in radians
#[derive(Debug, Clone, PartialEq)]
pub enum OrbitInput {
    Cartesian {
        position: Vector3<f64>,
        velocity: Vector3<f64>,
    },
    Keplerian {
        a: f64,
        e: f64,
        i: f64,
        pa: f64,
        raan: f64,
        anomaly: f64,
        angle: PositionAngle,
    },
    Equinoctial {
        a: f64,
        ex: f64,
        ey: f64,
        hx: f64,
        hy: f64,
        l: f64,
        angle: PositionAngle,
    },
    Circular {
        a: f64,
        ex: f64,
        ey: f64,
        i: f64,
        raan: f64,
        alpha: f64,
        angle: PositionAngle,
    },
    Tle {
        line1: String,
        line2: String,
    },
}

impl OrbitInput {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cartesian { .. } => "CARTESIAN",
            Self::Keplerian { .. } => "KEPLERIAN",
            Self::Equinoctial { .. } => "EQUINOCTIAL",
            Self::Circular { .. } => "CIRCULAR",
            Self::Tle { .. } => "TLE",
        }
    }
}

/// Validated initial orbit
#[derive(Debug, Clone)]
pub struct OrbitSettings {
    /// Absent only for TLE input, which carries its own epoch
    pub date: Option<Instant>,
    pub frame: Frame,
    pub input: OrbitInput,
}

fn position_angle(value: &Option<String>) -> Result<PositionAngle, ConfigError> {
    match value {
        Some(name) => name.parse(),
        None => Ok(PositionAngle::True),
    }
}

impl OrbitTypeConfiguration {
    /// First populated block, in the order Keplerian, Equinoctial, Circular, TLE, Cartesian
    pub fn input(&self) -> Result<OrbitInput, ConfigError> {
        if let Some(k) = &self.keplerian {
            return Ok(OrbitInput::Keplerian {
                a: k.a,
                e: k.e,
                i: k.i.to_radians(),
                pa: k.pa.to_radians(),
                raan: k.raan.to_radians(),
                anomaly: k.v.to_radians(),
                angle: position_angle(&k.position_angle)?,
            });
        }
        if let Some(q) = &self.equinoctial {
            return Ok(OrbitInput::Equinoctial {
                a: q.a,
                ex: q.ex,
                ey: q.ey,
                hx: q.hx,
                hy: q.hy,
                l: q.lv.to_radians(),
                angle: position_angle(&q.position_angle)?,
            });
        }
        if let Some(c) = &self.circular {
            return Ok(OrbitInput::Circular {
                a: c.a,
                ex: c.ex,
                ey: c.ey,
                i: c.i.to_radians(),
                raan: c.raan.to_radians(),
                alpha: c.alpha_v.to_radians(),
                angle: position_angle(&c.position_angle)?,
            });
        }
        if let Some(tle) = &self.tle {
            let line1 = tle.line1.trim_end().to_string();
            let line2 = tle.line2.trim_end().to_string();
            for (key, line) in [("line1", &line1), ("line2", &line2)] {
                if line.chars().count() != TLE_LINE_LENGTH {
                    return Err(ConfigError::invalid(
                        "orbit.orbitType.tle",
                        format!("{} has {} characters, expected {}", key, line.chars().count(), TLE_LINE_LENGTH),
                    ));
                }
            }
            return Ok(OrbitInput::Tle { line1, line2 });
        }
        if let Some(c) = &self.cartesian {
            return Ok(OrbitInput::Cartesian {
                position: Vector3::new(c.x, c.y, c.z),
                velocity: Vector3::new(c.vx, c.vy, c.vz),
            });
        }
        Err(ConfigError::invalid(
            "orbit.orbitType",
            "one of keplerian, equinoctial, circular, tle, cartesian must be given",
        ))
    }
}

impl OrbitConfiguration {
    pub fn settings(&self) -> Result<OrbitSettings, ConfigError> {
        let frame = match &self.frame_name {
            Some(name) => Frame::inertial_frame(name)?,
            None => Frame::Eme2000,
        };
        let orbit_type = self.orbit_type.as_ref().ok_or(ConfigError::MissingOrbit)?;
        let input = orbit_type.input()?;

        if let Some(name) = &orbit_type.name {
            if !name.eq_ignore_ascii_case(input.name()) {
                log::warn!("Orbit type named {} but {} parameters were given", name, input.name());
            }
        }

        let date = match (&self.date, &input) {
            (Some(text), _) => Some(parse_date(text)?),
            (None, OrbitInput::Tle { .. }) => None,
            (None, _) => return Err(ConfigError::invalid("orbit.date", "required for this orbit type")),
        };

        Ok(OrbitSettings { date, frame, input })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_LINE1: &str = "1 25544U 98067A   23001.00000000  .00016717  00000-0  10270-3 0  9003";
    const ISS_LINE2: &str = "2 25544  51.6416 339.1024 0005172  84.3830 275.7766 15.49910152376348";

    fn parse(text: &str) -> Result<OrbitSettings, ConfigError> {
        serde_yaml::from_str::<OrbitConfiguration>(text).unwrap().settings()
    }

    #[test]
    fn test_keplerian_degrees_to_radians() {
        let settings = parse(
            "date: '2023-01-01T00:00:00'\norbitType:\n  keplerian:\n    a: 7000000.0\n    e: 0.001\n    i: 90.0\n    raan: 180.0\n    v: 45.0\n",
        )
        .unwrap();
        assert_eq!(settings.frame, Frame::Eme2000);
        match settings.input {
            OrbitInput::Keplerian { i, raan, anomaly, angle, .. } => {
                approx::assert_relative_eq!(i, std::f64::consts::FRAC_PI_2);
                approx::assert_relative_eq!(raan, std::f64::consts::PI);
                approx::assert_relative_eq!(anomaly, std::f64::consts::FRAC_PI_4);
                assert_eq!(angle, PositionAngle::True);
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_order() {
        // Circular is picked before Cartesian
        let settings = parse(
            "date: '2023-01-01T00:00:00'\norbitType:\n  cartesian:\n    x: 7000000.0\n    vy: 7500.0\n  circular:\n    a: 7000000.0\n    positionAngle: MEAN\n",
        )
        .unwrap();
        assert!(matches!(settings.input, OrbitInput::Circular { angle: PositionAngle::Mean, .. }));

        let settings = parse("date: '2023-01-01T00:00:00'\norbitType:\n  cartesian:\n    x: 7000000.0\n    vy: 7500.0\n").unwrap();
        assert!(matches!(settings.input, OrbitInput::Cartesian { .. }));
    }

    #[test]
    fn test_tle_needs_no_date() {
        let text = format!("orbitType:\n  name: TLE\n  tle:\n    line1: '{}'\n    line2: '{}'\n", ISS_LINE1, ISS_LINE2);
        let settings = parse(&text).unwrap();
        assert!(settings.date.is_none());
        assert_eq!(settings.input.name(), "TLE");

        let short = format!("orbitType:\n  tle:\n    line1: '{}'\n    line2: '2 25544'\n", ISS_LINE1);
        assert!(parse(&short).is_err());
    }

    #[test]
    fn test_missing_date_and_bad_angle() {
        assert!(parse("orbitType:\n  keplerian:\n    a: 7000000.0\n").is_err());
        let error = parse(
            "date: '2023-01-01T00:00:00'\norbitType:\n  equinoctial:\n    a: 7000000.0\n    positionAngle: SIDEREAL\n",
        )
        .unwrap_err();
        assert!(error.to_string().contains("positionAngle"));
    }
}
