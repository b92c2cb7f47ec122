//! Third-body gravitational perturbations
//!
//! The perturbing acceleration is the difference between the body's pull on
//! the spacecraft and its pull on the Earth:
//!
//! a = μ_b × ((s − r)/|s − r|³ − s/|s|³)

use super::ForceModel;
use crate::error::Result;
use crate::propagation::bodies::BodyEphemeris;
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector3;

/// Point-mass attraction of one celestial body
#[derive(Debug, Clone)]
pub struct ThirdBodyAttraction {
    body: BodyEphemeris,
}

impl ThirdBodyAttraction {
    pub fn new(body: BodyEphemeris) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &BodyEphemeris {
        &self.body
    }
}

/// Differential point-mass acceleration of a body at `s` on a spacecraft at `r`
pub fn third_body_acceleration(gm: f64, s: &Vector3<f64>, r: &Vector3<f64>) -> Vector3<f64> {
    let d = s - r;
    let d3 = d.norm().powi(3);
    let s3 = s.norm().powi(3);
    gm * (d / d3 - s / s3)
}

impl ForceModel for ThirdBodyAttraction {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        _velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let s = self.body.position(&state.date(), &state.orbit.frame())?;
        Ok(third_body_acceleration(self.body.gm(), &s, position))
    }

    fn name(&self) -> &'static str {
        "Third body attraction"
    }

    fn description(&self) -> String {
        format!("Third body attraction ({})", self.body.body().name())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::propagation::bodies::{CelestialBody, EphemerisSource};

    #[test]
    fn test_moon_perturbation_magnitude() {
        let model = ThirdBodyAttraction::new(BodyEphemeris::new(
            CelestialBody::Moon,
            EphemerisSource::LowPrecision,
        ));
        let state = leo_state();
        let (p, v) = state.orbit.pv();
        let acc = model.acceleration(&state, &p, &v).unwrap();

        // Lunar tidal acceleration in LEO is of order 1e-6 m/s²
        assert!(acc.norm() > 1e-7 && acc.norm() < 1e-5, "acc {}", acc.norm());
    }

    #[test]
    fn test_tidal_stretch_along_body_direction() {
        let s = Vector3::new(1.5e11, 0.0, 0.0);
        let gm = 1.327_124_400_18e20;
        let toward = third_body_acceleration(gm, &s, &Vector3::new(7.0e6, 0.0, 0.0));
        let away = third_body_acceleration(gm, &s, &Vector3::new(-7.0e6, 0.0, 0.0));
        assert!(toward.x > 0.0);
        assert!(away.x < 0.0);
        // Both ends stretch by about 2·gm·r/s³
        let expected = 2.0 * gm * 7.0e6 / 1.5e11_f64.powi(3);
        assert!((toward.x - expected).abs() / expected < 1e-3);
    }
}
