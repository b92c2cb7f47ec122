//! Semi-analytical (DSST) propagator
//!
//! Integrates mean equinoctial elements (mean longitude argument) whose
//! rates are the averaged contributions of every [`DsstForceModel`]. The
//! osculating state is rebuilt by adding the short-periodic variations η:
//!
//! osculating = mean + η(mean, λM, Θ)
//!
//! The initial mean state is the fixed point of mean = osculating − η(mean).
//! At the output date the short-periodic coefficients are computed on the
//! interpolation grid of the last integration step and Lagrange-interpolated.
//!
//! # Contributions
//!
//! - **DsstNewtonian**: Keplerian mean motion
//! - **DsstZonal**: zonal harmonics averaged over λM
//! - **DsstTesseral**: resonant tesseral terms and short periodics in (λM, Θ)
//! - **GaussianContribution**: third bodies, drag and SRP by Gauss quadrature

mod gaussian;
mod newtonian;
mod short_periodics;
mod tesseral;
mod zonal;

pub use gaussian::GaussianContribution;
pub use newtonian::DsstNewtonian;
pub use short_periodics::{lagrange, sum_terms, FourierSeries, FourierTerm, InterpolationGrid};
pub use tesseral::{DsstTesseral, MIN_RESONANT_PERIOD};
pub use zonal::DsstZonal;

use crate::error::{PropagationError, Result};
use crate::propagation::integrator::{Integrator, StepInterval};
use crate::propagation::orbit::{normalize_angle, EquinoctialOrbit, PositionAngle};
use crate::propagation::state::{SpacecraftState, JULIAN_DAY, WGS84_EARTH_ANGULAR_VELOCITY};
use nalgebra::Vector6;
use satkit::{Duration, Instant};
use std::f64::consts::PI;
use std::fmt;

/// Angle type of the integrated longitude
const ANGLE: PositionAngle = PositionAngle::Mean;

/// Default maximum gap of the interpolation grid (s)
pub const DEFAULT_INTERPOLATION_GAP: f64 = JULIAN_DAY;

/// Convergence threshold of the osculating → mean conversion
const MEAN_CONVERGENCE: f64 = 1e-12;

/// Iteration limit of the osculating → mean conversion
const MEAN_MAX_ITERATIONS: usize = 200;

/// Earth rotation angle Θ used in the tesseral phases (rad)
pub fn earth_angle(date: &Instant) -> f64 {
    (WGS84_EARTH_ANGULAR_VELOCITY * date.as_unixtime()).rem_euclid(2.0 * PI)
}

/// Contribution of a perturbation to the mean-element theory
pub trait DsstForceModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> String {
        self.name().to_string()
    }

    /// Central attraction coefficient the contribution was built with
    fn mu(&self) -> Option<f64> {
        None
    }

    /// Rates of the mean elements (a, ex, ey, hx, hy, λM)
    fn mean_rates(&self, mean: &SpacecraftState) -> Result<Vector6<f64>>;

    /// Short-periodic variations around `mean`, at its date
    fn short_periodic_terms(&self, _mean: &SpacecraftState) -> Result<Vec<FourierTerm>> {
        Ok(Vec::new())
    }
}

/// Whether a state holds mean or osculating elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationType {
    Mean,
    Osculating,
}

impl fmt::Display for PropagationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "MEAN"),
            Self::Osculating => write!(f, "OSCULATING"),
        }
    }
}

/// Mean-element propagator
pub struct DsstPropagator {
    integrator: Box<dyn Integrator>,
    forces: Vec<Box<dyn DsstForceModel>>,
    initial: Option<(SpacecraftState, PropagationType)>,
    output: PropagationType,
    max_gap: f64,
}

impl DsstPropagator {
    pub fn new(integrator: Box<dyn Integrator>, output: PropagationType) -> Self {
        Self {
            integrator,
            forces: Vec::new(),
            initial: None,
            output,
            max_gap: DEFAULT_INTERPOLATION_GAP,
        }
    }

    pub fn add_force_model(&mut self, model: Box<dyn DsstForceModel>) {
        log::debug!("DSST force model: {}", model.description());
        self.forces.push(model);
    }

    pub fn force_models(&self) -> impl Iterator<Item = &dyn DsstForceModel> {
        self.forces.iter().map(|f| f.as_ref())
    }

    pub fn model_names(&self) -> Vec<&'static str> {
        self.forces.iter().map(|f| f.name()).collect()
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    pub fn set_initial_state(&mut self, state: SpacecraftState, kind: PropagationType) {
        self.initial = Some((state, kind));
    }

    pub fn output_type(&self) -> PropagationType {
        self.output
    }

    /// Largest spacing of the short-periodic interpolation grid (s)
    pub fn set_interpolation_gap(&mut self, max_gap: f64) {
        self.max_gap = max_gap;
    }

    pub fn interpolation_gap(&self) -> f64 {
        self.max_gap
    }

    fn mean_rates(&self, mean: &SpacecraftState) -> Result<Vector6<f64>> {
        let mut rates = Vector6::zeros();
        for force in &self.forces {
            rates += force.mean_rates(mean)?;
        }
        Ok(rates)
    }

    fn short_periodic_terms(&self, mean: &SpacecraftState) -> Result<Vec<FourierTerm>> {
        let mut terms = Vec::new();
        for force in &self.forces {
            terms.extend(force.short_periodic_terms(mean)?);
        }
        Ok(terms)
    }

    /// η at the date and mean longitude of `mean`
    fn short_periodic(&self, mean: &SpacecraftState) -> Result<Vector6<f64>> {
        let terms = self.short_periodic_terms(mean)?;
        Ok(sum_terms(&terms, mean.orbit.lm(), earth_angle(&mean.date())))
    }

    fn with_elements(state: &SpacecraftState, elements: &Vector6<f64>) -> Result<SpacecraftState> {
        let orbit = EquinoctialOrbit::from_elements(elements, ANGLE, state.orbit.frame(), state.date(), state.orbit.mu())?;
        Ok(SpacecraftState::new(orbit, state.mass))
    }

    /// Mean state whose osculating counterpart is `osculating`
    pub fn compute_mean_state(&self, osculating: &SpacecraftState) -> Result<SpacecraftState> {
        let target = osculating.orbit.elements(ANGLE);
        let mut mean = osculating.clone();
        for iteration in 1..=MEAN_MAX_ITERATIONS {
            let current = mean.orbit.elements(ANGLE);
            let mut next = target - self.short_periodic(&mean)?;
            next[5] = normalize_angle(next[5], current[5]);

            let delta = next - current;
            let error = (delta[0] / current[0])
                .abs()
                .max(delta.fixed_rows::<5>(1).amax());
            mean = Self::with_elements(&mean, &next)?;
            if error < MEAN_CONVERGENCE * (1.0 + current.fixed_rows::<5>(1).amax()) {
                log::debug!("Mean elements converged after {} iterations", iteration);
                return Ok(mean);
            }
        }
        Err(PropagationError::MeanElementsNotConverged(MEAN_MAX_ITERATIONS).into())
    }

    /// Osculating state of a mean state, with η evaluated directly
    pub fn compute_osculating_state(&self, mean: &SpacecraftState) -> Result<SpacecraftState> {
        let eta = self.short_periodic(mean)?;
        Self::with_elements(mean, &(mean.orbit.elements(ANGLE) + eta))
    }

    /// η at `t` from the coefficients on the grid of the last step
    fn interpolated_short_periodic(
        &self,
        initial: &SpacecraftState,
        step: &StepInterval,
        final_mean: &SpacecraftState,
        t: f64,
    ) -> Result<Vector6<f64>> {
        let grid = InterpolationGrid::new(step.t0, step.t1, self.max_gap);
        let window = grid.window(t);
        let lambda = final_mean.orbit.lm();
        let theta = earth_angle(&final_mean.date());

        let values = window
            .iter()
            .map(|&node| -> Result<Vector6<f64>> {
                let date = initial.date() + Duration::from_seconds(node);
                let orbit = EquinoctialOrbit::from_elements(
                    &step.interpolate(node),
                    ANGLE,
                    initial.orbit.frame(),
                    date,
                    initial.orbit.mu(),
                )?;
                let node_mean = SpacecraftState::new(orbit, initial.mass);
                Ok(sum_terms(&self.short_periodic_terms(&node_mean)?, lambda, theta))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(lagrange(window, &values, t))
    }

    /// Propagate from the initial state to `target`
    pub fn propagate(&self, target: &Instant) -> Result<SpacecraftState> {
        let (given, kind) = self.initial.as_ref().ok_or_else(|| {
            PropagationError::ImpossibleOrbit("initial state not set".to_string())
        })?;
        let start = given.date();
        let duration = (*target - start).as_seconds();
        if duration < 0.0 {
            return Err(PropagationError::BackwardPropagation(duration).into());
        }

        let initial = match kind {
            PropagationType::Mean => given.clone(),
            PropagationType::Osculating => self.compute_mean_state(given)?,
        };
        log::debug!("Initial mean state:\n{}", initial);

        let frame = initial.orbit.frame();
        let mu = initial.orbit.mu();
        let mass = initial.mass;
        let mut equations = |t: f64, y: &Vector6<f64>| -> Result<Vector6<f64>> {
            let date = start + Duration::from_seconds(t);
            let orbit = EquinoctialOrbit::from_elements(y, ANGLE, frame, date, mu)?;
            self.mean_rates(&SpacecraftState::new(orbit, mass))
        };

        let mut last_step: Option<StepInterval> = None;
        let mut steps = 0usize;
        let y = {
            let mut observer = |interval: &StepInterval| -> Result<()> {
                steps += 1;
                log::trace!("DSST step {} → t = {:.3} s", steps, interval.t1);
                last_step = Some(interval.clone());
                Ok(())
            };

            log::debug!(
                "DSST propagation over {:.1} s with {} ({} force models, gap {} s)",
                duration,
                self.integrator.name(),
                self.forces.len(),
                self.max_gap
            );

            let y0 = initial.orbit.elements(ANGLE);
            self.integrator
                .integrate(&mut equations, 0.0, &y0, duration, &mut observer)?
        };

        let date = start + Duration::from_seconds(duration);
        let orbit = EquinoctialOrbit::from_elements(&y, ANGLE, frame, date, mu)?;
        let final_mean = SpacecraftState::new(orbit, mass);
        if self.output == PropagationType::Mean {
            return Ok(final_mean);
        }

        let eta = match &last_step {
            Some(step) if step.t1 > step.t0 => {
                self.interpolated_short_periodic(&initial, step, &final_mean, duration)?
            }
            _ => self.short_periodic(&final_mean)?,
        };
        Self::with_elements(&final_mean, &(y + eta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::forces::{HolmesFeatherstoneAttraction, NewtonianAttraction};
    use crate::propagation::frames::Frame;
    use crate::propagation::gravity::SphericalHarmonicsProvider;
    use crate::propagation::integrator::{tolerances, DormandPrince853};
    use crate::propagation::numerical::NumericalPropagator;

    const MU: f64 = 3.986_004_415e14;

    fn initial(e: f64) -> SpacecraftState {
        let epoch = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let orbit = EquinoctialOrbit::from_keplerian(
            7_000_000.0,
            e,
            51.6_f64.to_radians(),
            0.3,
            0.2,
            0.0,
            PositionAngle::Mean,
            Frame::Eme2000,
            epoch,
            MU,
        )
        .unwrap();
        SpacecraftState::with_default_mass(orbit)
    }

    fn dop853(state: &SpacecraftState, dp: f64, angle: PositionAngle) -> Box<dyn Integrator> {
        let (abs_tol, rel_tol) = tolerances(dp, &state.orbit, angle).unwrap();
        Box::new(DormandPrince853::new(0.001, 86_400.0, abs_tol, rel_tol))
    }

    fn j2_field() -> SphericalHarmonicsProvider {
        SphericalHarmonicsProvider::builtin_eigen5c().truncated(2, 0).unwrap()
    }

    fn j2_dsst(state: &SpacecraftState) -> DsstPropagator {
        let mut dsst = DsstPropagator::new(dop853(state, 1.0, ANGLE), PropagationType::Osculating);
        dsst.add_force_model(Box::new(DsstZonal::new(Frame::Gcrf, &j2_field())));
        dsst.add_force_model(Box::new(DsstNewtonian::new(MU)));
        dsst.set_initial_state(state.clone(), PropagationType::Osculating);
        dsst
    }

    #[test]
    fn test_two_body_matches_kepler() {
        let state = initial(0.0);
        let mut dsst = DsstPropagator::new(dop853(&state, 1e-3, ANGLE), PropagationType::Osculating);
        dsst.add_force_model(Box::new(DsstNewtonian::new(MU)));
        dsst.set_initial_state(state.clone(), PropagationType::Osculating);

        let target = state.date() + Duration::from_seconds(86_400.0);
        let final_state = dsst.propagate(&target).unwrap();
        let expected = state.orbit.shifted_by(86_400.0);
        let error = (final_state.orbit.position() - expected.position()).norm();
        assert!(error < 1.0, "position error {} m", error);
    }

    #[test]
    fn test_zero_duration_returns_initial_state() {
        let state = initial(1e-3);
        let dsst = j2_dsst(&state);
        let final_state = dsst.propagate(&state.date()).unwrap();
        let error = (final_state.orbit.position() - state.orbit.position()).norm();
        assert!(error < 1e-3, "position error {} m", error);
    }

    #[test]
    fn test_mean_state_removes_short_periodics() {
        let state = initial(1e-3);
        let dsst = j2_dsst(&state);
        let mean = dsst.compute_mean_state(&state).unwrap();

        // J2 moves the mean semi-major axis by kilometres at most
        let da = (mean.orbit.a() - state.orbit.a()).abs();
        assert!(da > 1.0 && da < 20_000.0, "da {} m", da);

        let back = dsst.compute_osculating_state(&mean).unwrap();
        assert!((back.orbit.position() - state.orbit.position()).norm() < 1e-3);
    }

    #[test]
    fn test_mean_output() {
        let state = initial(1e-3);
        let mut dsst = DsstPropagator::new(dop853(&state, 1.0, ANGLE), PropagationType::Mean);
        dsst.add_force_model(Box::new(DsstNewtonian::new(MU)));
        dsst.set_initial_state(state.clone(), PropagationType::Mean);
        assert_eq!(dsst.output_type(), PropagationType::Mean);

        let target = state.date() + Duration::from_seconds(3_600.0);
        let final_state = dsst.propagate(&target).unwrap();
        assert!((final_state.orbit.a() - state.orbit.a()).abs() < 1e-6);
    }

    #[test]
    fn test_backward_propagation_rejected() {
        let state = initial(0.0);
        let dsst = j2_dsst(&state);
        let target = state.date() - Duration::from_seconds(60.0);
        assert!(dsst.propagate(&target).is_err());
    }

    #[test]
    fn test_j2_agrees_with_numerical() {
        let state = initial(1e-3);
        let target = state.date() + Duration::from_seconds(6.0 * 3_600.0);

        let mut numerical = NumericalPropagator::new(dop853(&state, 1e-3, PositionAngle::True));
        numerical.add_force_model(Box::new(HolmesFeatherstoneAttraction::new(Frame::Gcrf, &j2_field())));
        numerical.add_force_model(Box::new(NewtonianAttraction::new(MU)));
        numerical.set_initial_state(state.clone());
        let reference = numerical.propagate(&target).unwrap();

        let dsst = j2_dsst(&state);
        let semi_analytical = dsst.propagate(&target).unwrap();

        let error = (semi_analytical.orbit.position() - reference.orbit.position()).norm();
        assert!(error < 1_000.0, "DSST vs numerical {} m", error);

        // Much better than ignoring J2 altogether
        let kepler = state.orbit.shifted_by(6.0 * 3_600.0);
        let kepler_error = (kepler.position() - reference.orbit.position()).norm();
        assert!(error < 0.1 * kepler_error, "{} m vs Kepler {} m", error, kepler_error);
    }

    #[test]
    fn test_earth_angle_rate() {
        let t0 = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let t1 = t0 + Duration::from_seconds(100.0);
        let d = normalize_angle(earth_angle(&t1) - earth_angle(&t0), 0.0);
        assert!((d - 100.0 * WGS84_EARTH_ANGULAR_VELOCITY).abs() < 1e-9);
    }
}
