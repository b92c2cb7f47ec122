//! NRLMSISE-00 atmospheric density model
//!
//! Wraps satkit's NRLMSISE-00 module. Solar flux and geomagnetic indices
//! come from the toolkit's space weather tables; the toolkit derives the
//! local solar time from the date and longitude.

use super::AtmosphereModel;
use crate::error::DataError;
use crate::propagation::bodies::OneAxisEllipsoid;
use crate::propagation::frames::Frame;
use nalgebra::Vector3;
use satkit::Instant;

/// NRLMSISE-00 atmospheric model
///
/// # Space Weather Dependency
///
/// For best accuracy, this model requires:
/// - F10.7: Solar radio flux at 10.7 cm (solar activity proxy)
/// - F10.7a: 81-day average of F10.7
/// - Ap: Geomagnetic activity index
///
/// With space weather disabled the toolkit's nominal indices are used.
#[derive(Debug, Clone)]
pub struct Nrlmsise00 {
    body: OneAxisEllipsoid,

    /// Whether to use actual space weather data
    use_space_weather: bool,
}

impl Nrlmsise00 {
    pub fn new(body: OneAxisEllipsoid) -> Self {
        Self {
            body,
            use_space_weather: true,
        }
    }

    /// Model with nominal space weather (no data files needed)
    pub fn nominal(body: OneAxisEllipsoid) -> Self {
        Self {
            body,
            use_space_weather: false,
        }
    }
}

impl AtmosphereModel for Nrlmsise00 {
    fn density(&self, date: &Instant, position: &Vector3<f64>, frame: &Frame) -> Result<f64, DataError> {
        let point = self.body.geodetic(position, frame, date);
        if point.altitude > self.max_altitude() {
            return Ok(0.0);
        }

        let (rho, _temperature) = satkit::nrlmsise::nrlmsise(
            point.altitude.max(0.0) / 1000.0,
            Some(point.latitude.to_degrees()),
            Some(point.longitude.to_degrees()),
            Some(date),
            self.use_space_weather,
        );

        if rho.is_finite() {
            Ok(rho)
        } else {
            Err(DataError::Ephemeris {
                body: "atmosphere".to_string(),
                reason: format!("NRLMSISE-00 returned {} at {:.0} m", rho, point.altitude),
            })
        }
    }

    fn name(&self) -> &'static str {
        "NRLMSISE-00"
    }
}
