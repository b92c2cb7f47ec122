//! Numerical (Cowell-type) propagator
//!
//! Integrates osculating equinoctial elements with the true longitude
//! argument. Every force model contributes through
//! [`ForceModel::add_contribution`], the Newtonian attraction supplying the
//! Keplerian motion.

use crate::error::{PropagationError, Result};
use crate::propagation::forces::{ForceModel, ForceModels};
use crate::propagation::integrator::{Integrator, StepInterval};
use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector6;
use satkit::{Duration, Instant};

/// Angle type of the integrated longitude
const ANGLE: PositionAngle = PositionAngle::True;

/// Osculating-element propagator
///
/// One-shot: built around an integrator, given an initial state and a set
/// of force models, then propagated to a target date.
pub struct NumericalPropagator {
    /// Numerical integrator (swappable at runtime)
    integrator: Box<dyn Integrator>,

    forces: ForceModels,

    initial: Option<SpacecraftState>,
}

impl NumericalPropagator {
    pub fn new(integrator: Box<dyn Integrator>) -> Self {
        Self {
            integrator,
            forces: ForceModels::new(),
            initial: None,
        }
    }

    pub fn add_force_model(&mut self, model: Box<dyn ForceModel>) {
        self.forces.add(model);
    }

    pub fn force_models(&self) -> &ForceModels {
        &self.forces
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    pub fn set_initial_state(&mut self, state: SpacecraftState) {
        self.initial = Some(state);
    }

    pub fn initial_state(&self) -> Option<&SpacecraftState> {
        self.initial.as_ref()
    }

    /// Propagate from the initial state to `target`
    pub fn propagate(&self, target: &Instant) -> Result<SpacecraftState> {
        let initial = self.initial.as_ref().ok_or_else(|| {
            PropagationError::ImpossibleOrbit("initial state not set".to_string())
        })?;
        let start = initial.date();
        let duration = (*target - start).as_seconds();
        if duration < 0.0 {
            return Err(PropagationError::BackwardPropagation(duration).into());
        }

        let frame = initial.orbit.frame();
        let mu = initial.orbit.mu();
        let mass = initial.mass;
        let state_at = |t: f64, y: &Vector6<f64>| -> Result<SpacecraftState> {
            let date = start + Duration::from_seconds(t);
            let orbit = EquinoctialOrbit::from_elements(y, ANGLE, frame, date, mu)?;
            Ok(SpacecraftState::new(orbit, mass))
        };

        let mut equations = |t: f64, y: &Vector6<f64>| -> Result<Vector6<f64>> {
            let state = state_at(t, y)?;
            self.forces.rates(&state, ANGLE)
        };

        let mut steps = 0usize;
        let mut observer = |interval: &StepInterval| -> Result<()> {
            steps += 1;
            log::trace!("Numerical step {} → t = {:.3} s", steps, interval.t1);
            Ok(())
        };

        log::debug!(
            "Numerical propagation over {:.1} s with {} ({} force models)",
            duration,
            self.integrator.name(),
            self.forces.len()
        );

        let y0 = initial.orbit.elements(ANGLE);
        let y = self
            .integrator
            .integrate(&mut equations, 0.0, &y0, duration, &mut observer)?;

        let date = start + Duration::from_seconds(duration);
        let orbit = EquinoctialOrbit::from_elements(&y, ANGLE, frame, date, mu)?;
        Ok(SpacecraftState::new(orbit, mass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::forces::{NewtonianAttraction, ThirdBodyAttraction};
    use crate::propagation::bodies::{BodyEphemeris, CelestialBody, EphemerisSource};
    use crate::propagation::frames::Frame;
    use crate::propagation::integrator::{tolerances, ClassicalRungeKutta, DormandPrince853};
    use approx::assert_relative_eq;

    const MU: f64 = 3.986_004_415e14;

    fn initial() -> SpacecraftState {
        let epoch = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let orbit = EquinoctialOrbit::from_keplerian(
            7_000_000.0,
            1e-3,
            51.6_f64.to_radians(),
            0.0,
            0.0,
            0.0,
            PositionAngle::Mean,
            Frame::Eme2000,
            epoch,
            MU,
        )
        .unwrap();
        SpacecraftState::with_default_mass(orbit)
    }

    fn dop853(state: &SpacecraftState, dp: f64) -> Box<dyn Integrator> {
        let (abs_tol, rel_tol) = tolerances(dp, &state.orbit, PositionAngle::True).unwrap();
        Box::new(DormandPrince853::new(0.001, 300.0, abs_tol, rel_tol))
    }

    #[test]
    fn test_two_body_matches_kepler() {
        let state = initial();
        let mut propagator = NumericalPropagator::new(dop853(&state, 1e-3));
        propagator.add_force_model(Box::new(NewtonianAttraction::new(MU)));
        propagator.set_initial_state(state.clone());

        let target = state.date() + Duration::from_seconds(86_400.0);
        let final_state = propagator.propagate(&target).unwrap();

        let expected = state.orbit.shifted_by(86_400.0);
        let error = (final_state.orbit.position() - expected.position()).norm();
        assert!(error < 1.0, "position error {} m", error);
        assert_relative_eq!(final_state.orbit.a(), 7_000_000.0, max_relative = 1e-12);
        assert!((final_state.orbit.e() - 1e-3).abs() < 1e-9);
    }

    #[test]
    fn test_two_body_conserves_energy_and_momentum() {
        let state = initial();
        let mut propagator = NumericalPropagator::new(Box::new(ClassicalRungeKutta::new(60.0)));
        propagator.add_force_model(Box::new(NewtonianAttraction::new(MU)));
        propagator.set_initial_state(state.clone());

        let target = state.date() + Duration::from_seconds(86_400.0);
        let final_state = propagator.propagate(&target).unwrap();

        let invariants = |s: &SpacecraftState| {
            let (p, v) = s.orbit.pv();
            (0.5 * v.norm_squared() - MU / p.norm(), p.cross(&v).norm())
        };
        let (e0, h0) = invariants(&state);
        let (e1, h1) = invariants(&final_state);
        assert!(((e1 - e0) / e0).abs() < 1e-8);
        assert!(((h1 - h0) / h0).abs() < 1e-8);
    }

    #[test]
    fn test_backward_propagation_rejected() {
        let state = initial();
        let mut propagator = NumericalPropagator::new(Box::new(ClassicalRungeKutta::new(60.0)));
        propagator.add_force_model(Box::new(NewtonianAttraction::new(MU)));
        propagator.set_initial_state(state.clone());
        let target = state.date() - Duration::from_seconds(60.0);
        assert!(propagator.propagate(&target).is_err());
    }

    #[test]
    fn test_third_body_moves_plane() {
        let state = initial();
        let mut propagator = NumericalPropagator::new(dop853(&state, 1e-2));
        propagator.add_force_model(Box::new(ThirdBodyAttraction::new(BodyEphemeris::new(
            CelestialBody::Moon,
            EphemerisSource::LowPrecision,
        ))));
        propagator.add_force_model(Box::new(NewtonianAttraction::new(MU)));
        propagator.set_initial_state(state.clone());

        let target = state.date() + Duration::from_seconds(6.0 * 3600.0);
        let final_state = propagator.propagate(&target).unwrap();
        let dh = (final_state.orbit.hx() - state.orbit.hx()).abs()
            + (final_state.orbit.hy() - state.orbit.hy()).abs();
        assert!(dh > 0.0 && dh < 1e-5, "dh {}", dh);
    }
}
