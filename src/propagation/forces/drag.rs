//! Atmospheric drag force model
//!
//! Computes acceleration due to atmospheric drag on a spherical spacecraft:
//!
//! a = ½ ρ |v_rel| v_rel (Cd × A / m)
//!
//! where:
//! - ρ is atmospheric density from the configured atmosphere model
//! - v_rel = ω × r − v is the velocity of the co-rotating air relative to the spacecraft
//! - Cd × A is the drag coefficient times cross-sectional area
//! - m is spacecraft mass

use super::ForceModel;
use crate::error::Result;
use crate::propagation::atmosphere::AtmosphereModel;
use crate::propagation::frames::Frame;
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector3;
use std::sync::Arc;

/// Isotropic drag on a spherical spacecraft
#[derive(Clone)]
pub struct IsotropicDrag {
    /// Atmosphere density model
    atmosphere: Arc<dyn AtmosphereModel>,

    /// Frame the atmosphere co-rotates with
    body_frame: Frame,

    /// Cross-section (m²)
    area: f64,

    /// Drag coefficient
    cd: f64,
}

impl IsotropicDrag {
    pub fn new(atmosphere: Arc<dyn AtmosphereModel>, body_frame: Frame, area: f64, cd: f64) -> Self {
        Self {
            atmosphere,
            body_frame,
            area,
            cd,
        }
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn cd(&self) -> f64 {
        self.cd
    }

    /// Velocity of the air relative to the spacecraft, in the orbit frame
    fn relative_velocity(&self, state: &SpacecraftState, position: &Vector3<f64>, velocity: &Vector3<f64>) -> Vector3<f64> {
        let omega = self.body_frame.rotation_to(&state.orbit.frame(), &state.date())
            * self.body_frame.angular_velocity();
        omega.cross(position) - velocity
    }
}

impl ForceModel for IsotropicDrag {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let rho = self
            .atmosphere
            .density(&state.date(), position, &state.orbit.frame())?;
        if rho <= 0.0 {
            return Ok(Vector3::zeros());
        }

        let v_rel = self.relative_velocity(state, position, velocity);
        Ok(0.5 * rho * v_rel.norm() * self.cd * self.area / state.mass * v_rel)
    }

    fn name(&self) -> &'static str {
        "Atmospheric drag"
    }

    fn description(&self) -> String {
        format!(
            "Atmospheric drag ({}, area = {} m², cd = {})",
            self.atmosphere.name(),
            self.area,
            self.cd
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::propagation::atmosphere::Exponential;
    use crate::propagation::bodies::OneAxisEllipsoid;
    use crate::propagation::state::{WGS84_EARTH_EQUATORIAL_RADIUS, WGS84_EARTH_FLATTENING};

    fn drag() -> IsotropicDrag {
        let frame = Frame::Gtod { conventions: None };
        let body = OneAxisEllipsoid::new(WGS84_EARTH_EQUATORIAL_RADIUS, WGS84_EARTH_FLATTENING, frame);
        IsotropicDrag::new(Arc::new(Exponential::thermosphere(body)), frame, 1.0, 2.2)
    }

    #[test]
    fn test_drag_opposes_motion() {
        let state = leo_state();
        let (p, v) = state.orbit.pv();
        let acc = drag().acceleration(&state, &p, &v).unwrap();

        assert!(acc.dot(&v) < 0.0, "Drag should oppose velocity");

        // LEO drag with Cd·A/m = 2.2e-3 m²/kg is 1e-8 to 1e-6 m/s²
        assert!(acc.norm() > 1e-9 && acc.norm() < 1e-5, "acc {}", acc.norm());
    }

    #[test]
    fn test_drag_decays_semi_major_axis() {
        let state = leo_state();
        let (p, v) = state.orbit.pv();
        let mut rates = nalgebra::Vector6::zeros();
        drag()
            .add_contribution(&state, &p, &v, crate::propagation::orbit::PositionAngle::True, &mut rates)
            .unwrap();
        assert!(rates[0] < 0.0);
    }
}
