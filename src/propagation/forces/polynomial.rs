//! Empirical acceleration along a fixed inertial direction
//!
//! a(t) = (Σ c_k (t − t₀)^k) û, with t₀ the reference date and û a unit
//! vector of the orbit frame.

use super::ForceModel;
use crate::error::Result;
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector3;
use satkit::Instant;

#[derive(Debug, Clone)]
pub struct PolynomialAcceleration {
    label: String,
    direction: Vector3<f64>,
    coefficients: Vec<f64>,
    reference: Instant,
}

impl PolynomialAcceleration {
    /// `direction` is normalized; a zero direction disables the model
    pub fn new(label: impl Into<String>, direction: Vector3<f64>, coefficients: Vec<f64>, reference: Instant) -> Self {
        let direction = direction.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
        Self {
            label: label.into(),
            direction,
            coefficients,
            reference,
        }
    }

    /// Polynomial value at `dt` seconds from the reference date (Horner)
    fn value(&self, dt: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * dt + c)
    }
}

impl ForceModel for PolynomialAcceleration {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        _position: &Vector3<f64>,
        _velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let dt = (state.date() - self.reference).as_seconds();
        Ok(self.value(dt) * self.direction)
    }

    fn name(&self) -> &'static str {
        "Polynomial acceleration"
    }

    fn description(&self) -> String {
        format!(
            "Polynomial acceleration '{}' along [{:.6}, {:.6}, {:.6}], coefficients {:?}",
            self.label, self.direction.x, self.direction.y, self.direction.z, self.coefficients
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use satkit::Duration;

    #[test]
    fn test_quadratic_profile() {
        let reference = epoch() - Duration::from_seconds(10.0);
        let model = PolynomialAcceleration::new(
            "empirical",
            Vector3::new(0.0, 3.0, 4.0),
            vec![1e-9, 2e-10, 3e-11],
            reference,
        );
        let state = leo_state();
        let (p, v) = state.orbit.pv();
        let acc = model.acceleration(&state, &p, &v).unwrap();

        let expected = 1e-9 + 2e-10 * 10.0 + 3e-11 * 100.0;
        assert!((acc.norm() - expected).abs() < 1e-21);
        assert!((acc.y / acc.z - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_direction_is_inert() {
        let model = PolynomialAcceleration::new("none", Vector3::zeros(), vec![1.0], epoch());
        let state = leo_state();
        let (p, v) = state.orbit.pv();
        assert_eq!(model.acceleration(&state, &p, &v).unwrap(), Vector3::zeros());
    }
}
