//! Central body shape and perturbing celestial bodies
//!
//! - [`OneAxisEllipsoid`]: the Earth as a flattened ellipsoid attached to an
//!   Earth-fixed frame, with Cartesian → geodetic conversion
//! - [`CelestialBody`]: Sun, Moon and planets with their gravitational
//!   parameters and geocentric positions
//!
//! # Ephemeris Options
//!
//! - **LowPrecision (lpephem)**: analytical Sun and Moon, no external data needed
//! - **Jpl (jplephem)**: JPL DE440, required for the planets

use crate::error::{ConfigError, DataError};
use crate::propagation::frames::Frame;
use nalgebra::Vector3;
use parking_lot::Mutex;
use satkit::{jplephem, lpephem, Instant, SolarSystem};
use std::str::FromStr;

/// Geodetic coordinates (radians, meters)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Oblate Earth attached to an Earth-fixed frame
#[derive(Debug, Clone, Copy)]
pub struct OneAxisEllipsoid {
    pub equatorial_radius: f64,
    pub flattening: f64,
    pub frame: Frame,
}

impl OneAxisEllipsoid {
    pub fn new(equatorial_radius: f64, flattening: f64, frame: Frame) -> Self {
        Self {
            equatorial_radius,
            flattening,
            frame,
        }
    }

    /// Geodetic point of a position given in `frame` at `date`
    pub fn geodetic(&self, position: &Vector3<f64>, frame: &Frame, date: &Instant) -> GeodeticPoint {
        let body = frame.rotation_to(&self.frame, date) * position;
        self.geodetic_from_body(&body)
    }

    /// Geodetic point of a position already expressed in the body frame
    pub fn geodetic_from_body(&self, p: &Vector3<f64>) -> GeodeticPoint {
        let a = self.equatorial_radius;
        let e2 = self.flattening * (2.0 - self.flattening);
        let rho = (p.x * p.x + p.y * p.y).sqrt();
        let longitude = p.y.atan2(p.x);

        let mut latitude = p.z.atan2(rho * (1.0 - e2));
        for _ in 0..10 {
            let sin_lat = latitude.sin();
            let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (p.z + e2 * n * sin_lat).atan2(rho);
            let converged = (next - latitude).abs() < 1e-14;
            latitude = next;
            if converged {
                break;
            }
        }

        let (sin_lat, cos_lat) = latitude.sin_cos();
        let altitude =
            rho * cos_lat + p.z * sin_lat - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();

        GeodeticPoint {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Ephemeris source for body positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EphemerisSource {
    /// Low-precision analytical ephemeris (Sun and Moon only)
    #[default]
    LowPrecision,

    /// JPL DE440 ephemeris
    Jpl,
}

impl EphemerisSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LowPrecision => "Low-Precision (lpephem)",
            Self::Jpl => "High-Precision (jplephem/DE440)",
        }
    }
}

impl FromStr for EphemerisSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "LOW_PRECISION" | "LOWPRECISION" | "LPEPHEM" => Ok(Self::LowPrecision),
            "JPL" | "DE440" | "HIGH_PRECISION" => Ok(Self::Jpl),
            other => Err(ConfigError::invalid(
                "ephemeris",
                format!("'{}' is not one of LOW_PRECISION, JPL", other),
            )),
        }
    }
}

/// Perturbing celestial body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

const ALL_BODIES: [CelestialBody; 10] = [
    CelestialBody::Sun,
    CelestialBody::Moon,
    CelestialBody::Mercury,
    CelestialBody::Venus,
    CelestialBody::Mars,
    CelestialBody::Jupiter,
    CelestialBody::Saturn,
    CelestialBody::Uranus,
    CelestialBody::Neptune,
    CelestialBody::Pluto,
];

impl CelestialBody {
    /// Resolve a body from its case-insensitive name
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let wanted = name.trim();
        ALL_BODIES
            .iter()
            .copied()
            .find(|body| body.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownBody(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Pluto => "Pluto",
        }
    }

    /// Gravitational parameter in m³/s² (DE440 header values for planetary systems)
    pub fn gm(&self) -> f64 {
        match self {
            Self::Sun => 1.327_124_400_18e20,
            Self::Moon => 4.902_800_066e12,
            Self::Mercury => 2.203_186_855_1e13,
            Self::Venus => 3.248_585_92e14,
            Self::Mars => 4.282_837_362e13,
            Self::Jupiter => 1.267_127_64e17,
            Self::Saturn => 3.794_058_5e16,
            Self::Uranus => 5.794_556e15,
            Self::Neptune => 6.836_527e15,
            Self::Pluto => 9.755_01e11,
        }
    }

    fn solar_system(&self) -> SolarSystem {
        match self {
            Self::Sun => SolarSystem::Sun,
            Self::Moon => SolarSystem::Moon,
            Self::Mercury => SolarSystem::Mercury,
            Self::Venus => SolarSystem::Venus,
            Self::Mars => SolarSystem::Mars,
            Self::Jupiter => SolarSystem::Jupiter,
            Self::Saturn => SolarSystem::Saturn,
            Self::Uranus => SolarSystem::Uranus,
            Self::Neptune => SolarSystem::Neptune,
            Self::Pluto => SolarSystem::Pluto,
        }
    }
}

/// Geocentric positions of one body from one ephemeris source
///
/// Remembers the last evaluated instant, since several force models ask for
/// the same body at the same date within one derivative evaluation.
#[derive(Debug)]
pub struct BodyEphemeris {
    body: CelestialBody,
    source: EphemerisSource,
    last: Mutex<Option<(u64, Vector3<f64>)>>,
}

impl Clone for BodyEphemeris {
    fn clone(&self) -> Self {
        Self::new(self.body, self.source)
    }
}

impl BodyEphemeris {
    pub fn new(body: CelestialBody, source: EphemerisSource) -> Self {
        Self {
            body,
            source,
            last: Mutex::new(None),
        }
    }

    /// Check the source can serve this body
    pub fn validate(&self) -> Result<(), DataError> {
        match (self.source, self.body) {
            (EphemerisSource::LowPrecision, CelestialBody::Sun | CelestialBody::Moon) => Ok(()),
            (EphemerisSource::LowPrecision, _) => Err(self.unsupported()),
            (EphemerisSource::Jpl, _) => Ok(()),
        }
    }

    fn unsupported(&self) -> DataError {
        DataError::Ephemeris {
            body: self.body.name().to_string(),
            reason: "planetary positions require the JPL ephemeris".to_string(),
        }
    }

    pub fn body(&self) -> CelestialBody {
        self.body
    }

    pub fn gm(&self) -> f64 {
        self.body.gm()
    }

    /// Geocentric position in GCRF, meters
    pub fn position_gcrf(&self, epoch: &Instant) -> Result<Vector3<f64>, DataError> {
        let key = epoch.as_unixtime().to_bits();
        if let Some((cached_key, position)) = *self.last.lock() {
            if cached_key == key {
                return Ok(position);
            }
        }

        let position = match self.source {
            EphemerisSource::LowPrecision => {
                let pos = match self.body {
                    CelestialBody::Sun => lpephem::sun::pos_gcrf(epoch),
                    CelestialBody::Moon => lpephem::moon::pos_gcrf(epoch),
                    _ => return Err(self.unsupported()),
                };
                Vector3::new(pos[0], pos[1], pos[2])
            }
            EphemerisSource::Jpl => {
                let pos = jplephem::geocentric_pos(self.body.solar_system(), epoch).map_err(|e| {
                    DataError::Ephemeris {
                        body: self.body.name().to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Vector3::new(pos[0], pos[1], pos[2])
            }
        };

        *self.last.lock() = Some((key, position));
        Ok(position)
    }

    /// Geocentric position in `frame`, meters
    pub fn position(&self, epoch: &Instant, frame: &Frame) -> Result<Vector3<f64>, DataError> {
        let gcrf = self.position_gcrf(epoch)?;
        Ok(Frame::Gcrf.rotation_to(frame, epoch) * gcrf)
    }
}
