//! Central point-mass attraction

use super::ForceModel;
use crate::error::Result;
use crate::propagation::gauss;
use crate::propagation::orbit::PositionAngle;
use crate::propagation::state::SpacecraftState;
use nalgebra::{Vector3, Vector6};

/// Keplerian attraction of the central body
///
/// Contributes the Keplerian longitude rate of the orbit's own μ. When the
/// model's μ differs from the orbit's, the difference acts as a radial
/// perturbation through the Gauss equations.
#[derive(Debug, Clone)]
pub struct NewtonianAttraction {
    mu: f64,
}

impl NewtonianAttraction {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }
}

impl ForceModel for NewtonianAttraction {
    fn acceleration(
        &self,
        _state: &SpacecraftState,
        position: &Vector3<f64>,
        _velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let r = position.norm();
        Ok(-self.mu / (r * r * r) * position)
    }

    fn add_contribution(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        angle: PositionAngle,
        rates: &mut Vector6<f64>,
    ) -> Result<()> {
        rates[5] += gauss::keplerian_rate(&state.orbit, angle);

        let delta_mu = self.mu - state.orbit.mu();
        if delta_mu != 0.0 {
            let r = position.norm();
            let residual = -delta_mu / (r * r * r) * position;
            *rates += gauss::element_rates(&state.orbit, position, velocity, &residual, angle);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Newtonian attraction"
    }

    fn description(&self) -> String {
        format!("Newtonian attraction (mu = {:e} m³/s²)", self.mu)
    }

    fn mu(&self) -> Option<f64> {
        Some(self.mu)
    }
}
