//! Averaging of Gauss equations over the mean longitude
//!
//! The generic DSST treatment of a perturbation: sample the perturbing
//! acceleration on the mean orbit at equally spaced mean longitudes, map it
//! to element rates with the Gauss equations, and split the result into its
//! average (the mean rates) and its harmonics (the short-periodic terms).
//! The date, hence every body position, is held fixed over the average.

use super::short_periodics::{FourierSeries, FourierTerm};
use super::DsstForceModel;
use crate::error::Result;
use crate::propagation::forces::{ForceModel, IsotropicDrag, SolarRadiationPressure, ThirdBodyAttraction};
use crate::propagation::gauss;
use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
use crate::propagation::state::SpacecraftState;
use nalgebra::{Vector3, Vector6};
use std::f64::consts::PI;
use std::sync::Arc;

/// Mean orbit moved to mean longitude `lambda`, same date and shape
pub(crate) fn at_mean_longitude(mean: &SpacecraftState, lambda: f64) -> Result<SpacecraftState> {
    let orbit = &mean.orbit;
    let moved = EquinoctialOrbit::new(
        orbit.a(),
        orbit.ex(),
        orbit.ey(),
        orbit.hx(),
        orbit.hy(),
        lambda,
        PositionAngle::Mean,
        orbit.frame(),
        orbit.date(),
        orbit.mu(),
    )?;
    Ok(SpacecraftState::new(moved, mean.mass))
}

/// Element rates (mean longitude) at `count` equally spaced mean longitudes
pub(crate) fn sample_rates<F>(mean: &SpacecraftState, count: usize, mut acceleration: F) -> Result<Vec<Vector6<f64>>>
where
    F: FnMut(&SpacecraftState, &Vector3<f64>, &Vector3<f64>) -> Result<Vector3<f64>>,
{
    (0..count)
        .map(|k| {
            let lambda = 2.0 * PI * k as f64 / count as f64;
            let state = at_mean_longitude(mean, lambda)?;
            let (p, v) = state.orbit.pv();
            let acc = acceleration(&state, &p, &v)?;
            Ok(gauss::element_rates(&state.orbit, &p, &v, &acc, PositionAngle::Mean))
        })
        .collect()
}

/// Quadrature points over one revolution for each perturbation
const THIRD_BODY_POINTS: usize = 64;
const DRAG_POINTS: usize = 48;
const SRP_POINTS: usize = 144;

/// Highest short-periodic harmonic of the mean longitude kept
const MAX_HARMONIC: usize = 12;

/// Perigee altitude above which drag is neglected (m)
const DRAG_CUTOFF_ALTITUDE: f64 = 1_000_000.0;

/// Gaussian averaging of a numerical force model
pub struct GaussianContribution {
    label: &'static str,
    force: Arc<dyn ForceModel>,
    mu: f64,
    samples: usize,
    max_harmonic: usize,
    /// (body radius, altitude) above which a perigee makes the force vanish
    perigee_cutoff: Option<(f64, f64)>,
}

impl GaussianContribution {
    pub fn new(
        label: &'static str,
        force: Arc<dyn ForceModel>,
        mu: f64,
        samples: usize,
        max_harmonic: usize,
    ) -> Self {
        Self {
            label,
            force,
            mu,
            samples,
            max_harmonic,
            perigee_cutoff: None,
        }
    }

    /// Skip the average when the perigee is above `altitude` over a body of `radius`
    pub fn with_perigee_cutoff(mut self, radius: f64, altitude: f64) -> Self {
        self.perigee_cutoff = Some((radius, altitude));
        self
    }

    /// Point-mass attraction of a third body
    pub fn third_body(attraction: ThirdBodyAttraction, mu: f64) -> Self {
        Self::new("DSST third body", Arc::new(attraction), mu, THIRD_BODY_POINTS, MAX_HARMONIC)
    }

    /// Atmospheric drag, neglected while the perigee is above the atmosphere
    pub fn drag(drag: IsotropicDrag, body_radius: f64, mu: f64) -> Self {
        Self::new("DSST atmospheric drag", Arc::new(drag), mu, DRAG_POINTS, MAX_HARMONIC)
            .with_perigee_cutoff(body_radius, DRAG_CUTOFF_ALTITUDE)
    }

    /// Solar radiation pressure; the dense sampling resolves the shadow boundaries
    pub fn solar_radiation_pressure(srp: SolarRadiationPressure, mu: f64) -> Self {
        Self::new("DSST solar radiation pressure", Arc::new(srp), mu, SRP_POINTS, MAX_HARMONIC)
    }

    pub fn force(&self) -> &Arc<dyn ForceModel> {
        &self.force
    }

    fn is_inactive(&self, mean: &SpacecraftState) -> bool {
        match self.perigee_cutoff {
            Some((radius, altitude)) => {
                mean.orbit.a() * (1.0 - mean.orbit.e()) - radius > altitude
            }
            None => false,
        }
    }

    fn series(&self, mean: &SpacecraftState) -> Result<Option<FourierSeries>> {
        if self.is_inactive(mean) {
            return Ok(None);
        }
        let force = &self.force;
        let samples = sample_rates(mean, self.samples, |state, p, v| force.acceleration(state, p, v))?;
        Ok(Some(FourierSeries::from_samples(&samples, self.max_harmonic)))
    }
}

impl DsstForceModel for GaussianContribution {
    fn name(&self) -> &'static str {
        self.label
    }

    fn description(&self) -> String {
        format!("{} ({} points, {})", self.label, self.samples, self.force.description())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::forces::PolynomialAcceleration;
    use crate::propagation::frames::Frame;
    use satkit::Instant;

    const MU: f64 = 3.986_004_415e14;

    fn mean_state() -> SpacecraftState {
        let epoch = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let orbit = EquinoctialOrbit::from_keplerian(
            7.0e6, 0.0, 0.3, 0.0, 0.0, 0.0, PositionAngle::Mean, Frame::Gcrf, epoch, MU,
        )
        .unwrap();
        SpacecraftState::with_default_mass(orbit)
    }

    #[test]
    fn test_constant_push_averages_out() {
        // A constant inertial push averages to nothing on a circular orbit
        let state = mean_state();
        let force: Arc<dyn ForceModel> = Arc::new(PolynomialAcceleration::new(
            "push",
            Vector3::new(1.0, 0.0, 0.0),
            vec![1e-7],
            state.date(),
        ));
        let contribution = GaussianContribution::new("push", force, MU, 32, 8);
        let rates = contribution.mean_rates(&state).unwrap();
        assert!(rates[0].abs() < 1e-12, "da/dt {}", rates[0]);

        // but it drives a first-harmonic oscillation of a
        let terms = contribution.short_periodic_terms(&state).unwrap();
        assert_eq!(terms.len(), 8);
        let first = &terms[0];
        assert!(first.cos[0].abs() + first.sin[0].abs() > 1e-3);
    }

    #[test]
    fn test_perigee_cutoff() {
        let state = mean_state();
        let force: Arc<dyn ForceModel> = Arc::new(PolynomialAcceleration::new(
            "push",
            Vector3::new(0.0, 0.0, 1.0),
            vec![1e-7],
            state.date(),
        ));
        let contribution =
            GaussianContribution::new("drag", force, MU, 16, 4).with_perigee_cutoff(6_378_137.0, 500_000.0);
        assert_eq!(contribution.mean_rates(&state).unwrap(), Vector6::zeros());
        assert!(contribution.short_periodic_terms(&state).unwrap().is_empty());
    }
}
