use super::DsstForceModel;
use crate::error::Result;
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector6;

/// Keplerian motion of the mean longitude
#[derive(Debug, Clone, Copy)]
pub struct DsstNewtonian {
    mu: f64,
}

impl DsstNewtonian {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }
}

impl DsstForceModel for DsstNewtonian {
    fn name(&self) -> &'static str {
        "DSST Newtonian attraction"
    }

    fn description(&self) -> String {
        format!("DSST Newtonian attraction (mu = {:.6e} m³/s²)", self.mu)
    }

    fn mu(&self) -> Option<f64> {
        Some(self.mu)
    }

    fn mean_rates(&self, mean: &SpacecraftState) -> Result<Vector6<f64>> {
        let a = mean.orbit.a();
        let mut rates = Vector6::zeros();
        rates[5] = (self.mu / (a * a * a)).sqrt();
        Ok(rates)
    }
}
