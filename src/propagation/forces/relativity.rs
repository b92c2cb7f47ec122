//! Post-Newtonian correction of the central attraction
//!
//! Schwarzschild term for a spherical, non-rotating central body (IERS 2010,
//! eq. 10.12 without Lense-Thirring and de Sitter parts):
//!
//! a = μ/(c² r³) × [(4μ/r − v²) r + 4 (r·v) v]

use super::ForceModel;
use crate::error::Result;
use crate::propagation::state::{SpacecraftState, SPEED_OF_LIGHT};
use nalgebra::Vector3;

#[derive(Debug, Clone)]
pub struct Relativity {
    mu: f64,
}

impl Relativity {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }
}

impl ForceModel for Relativity {
    fn acceleration(
        &self,
        _state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let r = position.norm();
        let factor = self.mu / (SPEED_OF_LIGHT * SPEED_OF_LIGHT * r * r * r);
        let radial = 4.0 * self.mu / r - velocity.norm_squared();
        Ok(factor * (radial * position + 4.0 * position.dot(velocity) * velocity))
    }

    fn name(&self) -> &'static str {
        "Relativity"
    }

    fn mu(&self) -> Option<f64> {
        Some(self.mu)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_circular_orbit_correction() {
        let state = leo_state();
        let r = 7.0e6;
        let p = Vector3::new(r, 0.0, 0.0);
        let v = Vector3::new(0.0, (MU / r).sqrt(), 0.0);
        let acc = Relativity::new(MU).acceleration(&state, &p, &v).unwrap();

        // On a circular orbit v² = μ/r, so a = 3μ²/(c² r³) outward
        let expected = 3.0 * MU * MU / (SPEED_OF_LIGHT * SPEED_OF_LIGHT * r.powi(3));
        assert!((acc.x - expected).abs() < 1e-12 * expected);
        assert!(acc.y.abs() < 1e-20);
    }
}
