//! Exponential atmospheric density model
//!
//! ρ(h) = ρ₀ × exp(−(h − h₀) / H) over the geodetic altitude h. Fast, no
//! space weather, no diurnal bulge.

use super::AtmosphereModel;
use crate::error::DataError;
use crate::propagation::bodies::OneAxisEllipsoid;
use crate::propagation::frames::Frame;
use nalgebra::Vector3;
use satkit::Instant;

/// Exponential atmosphere model
#[derive(Debug, Clone)]
pub struct Exponential {
    body: OneAxisEllipsoid,

    /// Reference density at `h0` (kg/m³)
    pub rho0: f64,

    /// Reference altitude (meters)
    pub h0: f64,

    /// Scale height (meters)
    pub scale_height: f64,
}

impl Exponential {
    pub fn new(body: OneAxisEllipsoid, rho0: f64, h0: f64, scale_height: f64) -> Self {
        Self {
            body,
            rho0,
            h0,
            scale_height,
        }
    }

    /// Mean thermosphere around 400 km (Vallado, table 8-4)
    pub fn thermosphere(body: OneAxisEllipsoid) -> Self {
        Self::new(body, 3.725e-12, 400_000.0, 58_515.0)
    }
}

impl AtmosphereModel for Exponential {
    fn density(&self, date: &Instant, position: &Vector3<f64>, frame: &Frame) -> Result<f64, DataError> {
        let altitude = self.body.geodetic(position, frame, date).altitude;
        if altitude > self.max_altitude() {
            return Ok(0.0);
        }
        Ok(self.rho0 * (-(altitude - self.h0) / self.scale_height).exp())
    }

    fn name(&self) -> &'static str {
        "Exponential"
    }
}
