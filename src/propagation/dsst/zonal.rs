//! Zonal harmonics contribution
//!
//! The zonal field only depends on the body pole, so at a fixed date it is
//! a function of the mean longitude alone and averages like any Gaussian
//! perturbation. Harmonics of λM up to degree + 4 are kept, enough for the
//! eccentricity coupling of the highest degree.

use super::gaussian::sample_rates;
use super::short_periodics::{FourierSeries, FourierTerm};
use super::DsstForceModel;
use crate::error::Result;
use crate::propagation::frames::Frame;
use crate::propagation::gravity::{HarmonicsEvaluator, Normalization, SphericalHarmonicsProvider};
use crate::propagation::state::SpacecraftState;
use nalgebra::{Vector3, Vector6};

/// Zonal terms (m = 0) of an unnormalized field
#[derive(Debug, Clone)]
pub struct DsstZonal {
    body_frame: Frame,
    evaluator: HarmonicsEvaluator,
    mu: f64,
    degree: usize,
}

impl DsstZonal {
    pub fn new(body_frame: Frame, provider: &SphericalHarmonicsProvider) -> Self {
        let unnormalized = provider.with_normalization(Normalization::Unnormalized);
        Self {
            body_frame,
            evaluator: HarmonicsEvaluator::new(&unnormalized).with_orders(0, 0),
            mu: provider.mu,
            degree: provider.degree(),
        }
    }

    fn max_harmonic(&self) -> usize {
        self.degree + 4
    }

    fn series(&self, mean: &SpacecraftState) -> Result<Option<FourierSeries>> {
        if self.degree < 2 {
            return Ok(None);
        }
        let to_body = mean.orbit.frame().rotation_to(&self.body_frame, &mean.date());
        let from_body = to_body.inverse();
        let samples = sample_rates(mean, 2 * self.max_harmonic() + 1, |_, p, _| {
            let g: Vector3<f64> = self.evaluator.gradient(&(to_body * p));
            Ok(from_body * g)
        })?;
        Ok(Some(FourierSeries::from_samples(&samples, self.max_harmonic())))
    }
}

impl DsstForceModel for DsstZonal {
    fn name(&self) -> &'static str {
        "DSST zonal"
    }

    fn description(&self) -> String {
        format!("DSST zonal (degree {}, {})", self.degree, self.body_frame)
    }

    fn mu(&self) -> Option<f64> {
        Some(self.mu)
    }

    fn mean_rates(&self, mean: &SpacecraftState) -> Result<Vector6<f64>> {
        Ok(self
            .series(mean)?
            .map(|series| series.mean)
            .unwrap_or_else(Vector6::zeros))
    }

    fn short_periodic_terms(&self, mean: &SpacecraftState) -> Result<Vec<FourierTerm>> {
        let a = mean.orbit.a();
        let n = (self.mu / (a * a * a)).sqrt();
        Ok(self
            .series(mean)?
            .map(|series| series.integrate(a, n))
            .unwrap_or_default())
    }
}
