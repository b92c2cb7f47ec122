//! Solar radiation pressure force model
//!
//! Models the acceleration due to photon momentum from sunlight on a
//! spherical spacecraft:
//!
//! a = ν × P_ref × (D_ref / d)² × Cr × A / m × û
//!
//! where û points from the Sun to the spacecraft, d is their distance and
//! ν is the lit fraction of the solar disk seen past the Earth.

use super::ForceModel;
use crate::error::Result;
use crate::propagation::bodies::BodyEphemeris;
use crate::propagation::state::{
    SpacecraftState, SRP_REFERENCE_DISTANCE, SRP_REFERENCE_PRESSURE, SUN_RADIUS,
};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Isotropic solar radiation pressure with a conical Earth shadow
#[derive(Debug, Clone)]
pub struct SolarRadiationPressure {
    sun: BodyEphemeris,

    /// Radius of the occulting Earth, the gravity field reference radius (m)
    occulting_radius: f64,

    /// Cross-section (m²)
    area: f64,

    /// Reflection coefficient
    cr: f64,
}

impl SolarRadiationPressure {
    pub fn new(sun: BodyEphemeris, occulting_radius: f64, area: f64, cr: f64) -> Self {
        Self {
            sun,
            occulting_radius,
            area,
            cr,
        }
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn cr(&self) -> f64 {
        self.cr
    }

    pub fn occulting_radius(&self) -> f64 {
        self.occulting_radius
    }
}

/// Fraction of the solar disk visible from `position` (0 = umbra, 1 = full sunlight)
///
/// Both bodies are treated as disks of angular radius asin(R/d); the
/// penumbra value is the uncovered share of the solar disk area.
pub fn lighting_ratio(position: &Vector3<f64>, sun: &Vector3<f64>, occulting_radius: f64) -> f64 {
    let to_sun = sun - position;
    let d_sun = to_sun.norm();
    let r = position.norm();
    if r <= occulting_radius {
        return 0.0;
    }

    let sun_radius = (SUN_RADIUS / d_sun).asin();
    let earth_radius = (occulting_radius / r).asin();
    let separation = (-position.dot(&to_sun) / (r * d_sun)).clamp(-1.0, 1.0).acos();

    if separation >= sun_radius + earth_radius {
        1.0
    } else if separation <= earth_radius - sun_radius {
        0.0
    } else if separation <= sun_radius - earth_radius {
        // Annular: the Earth disk sits inside the solar disk
        1.0 - (earth_radius * earth_radius) / (sun_radius * sun_radius)
    } else {
        let (a, b, c) = (sun_radius, earth_radius, separation);
        let x = (c * c + a * a - b * b) / (2.0 * c);
        let y = (a * a - x * x).max(0.0).sqrt();
        let overlap = a * a * (x / a).clamp(-1.0, 1.0).acos()
            + b * b * ((c - x) / b).clamp(-1.0, 1.0).acos()
            - c * y;
        (1.0 - overlap / (PI * a * a)).clamp(0.0, 1.0)
    }
}

impl ForceModel for SolarRadiationPressure {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        _velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let sun = self.sun.position(&state.date(), &state.orbit.frame())?;
        let ratio = lighting_ratio(position, &sun, self.occulting_radius);
        if ratio == 0.0 {
            return Ok(Vector3::zeros());
        }

        let from_sun = position - sun;
        let d = from_sun.norm();
        let pressure = SRP_REFERENCE_PRESSURE * (SRP_REFERENCE_DISTANCE / d).powi(2);
        let magnitude = ratio * pressure * self.cr * self.area / state.mass;
        Ok(magnitude / d * from_sun)
    }

    fn name(&self) -> &'static str {
        "Solar radiation pressure"
    }

    fn description(&self) -> String {
        format!(
            "Solar radiation pressure (area = {} m², cr = {}, occulting radius = {} m)",
            self.area, self.cr, self.occulting_radius
        )
    }
}
