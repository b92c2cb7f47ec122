//! Non-spherical Earth gravity
//!
//! The field is evaluated in the central body frame, where the coefficients
//! are constant, then rotated back into the orbit frame.

use super::ForceModel;
use crate::error::Result;
use crate::propagation::frames::Frame;
use crate::propagation::gravity::{HarmonicsEvaluator, Normalization, SphericalHarmonicsProvider};
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector3;

/// Holmes-Featherstone attraction over a fully-normalized field
#[derive(Debug, Clone)]
pub struct HolmesFeatherstoneAttraction {
    body_frame: Frame,
    evaluator: HarmonicsEvaluator,
    degree: usize,
    order: usize,
}

impl HolmesFeatherstoneAttraction {
    pub fn new(body_frame: Frame, provider: &SphericalHarmonicsProvider) -> Self {
        let normalized = provider.with_normalization(Normalization::Normalized);
        Self {
            body_frame,
            evaluator: HarmonicsEvaluator::new(&normalized),
            degree: provider.degree(),
            order: provider.order(),
        }
    }

    pub fn body_frame(&self) -> Frame {
        self.body_frame
    }
}

impl ForceModel for HolmesFeatherstoneAttraction {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        _velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let date = state.date();
        let to_body = state.orbit.frame().rotation_to(&self.body_frame, &date);
        let gradient = self.evaluator.gradient(&(to_body * position));
        Ok(to_body.inverse() * gradient)
    }

    fn name(&self) -> &'static str {
        "Holmes-Featherstone attraction"
    }

    fn description(&self) -> String {
        format!(
            "Holmes-Featherstone attraction {}x{} in {}",
            self.degree, self.order, self.body_frame
        )
    }

    fn mu(&self) -> Option<f64> {
        Some(self.evaluator.mu())
    }
}
