//! Force models for the numerical propagator
//!
//! Each force model computes its acceleration at the current osculating
//! state. The propagator maps accelerations onto element rates through the
//! Gauss equations, so a model only has to know Cartesian physics.
//!
//! # Available Models
//!
//! - **NewtonianAttraction**: central point mass, the single source of Keplerian motion
//! - **HolmesFeatherstoneAttraction**: non-spherical Earth gravity (normalized field)
//! - **ThirdBodyAttraction**: Sun, Moon and planets as point masses
//! - **SolidTides**: Earth deformation by tide-raising bodies (IERS 2010)
//! - **IsotropicDrag**: atmospheric drag on a spherical spacecraft
//! - **SolarRadiationPressure**: isotropic SRP with conical Earth shadow
//! - **Relativity**: Schwarzschild post-Newtonian correction
//! - **PolynomialAcceleration**: empirical acceleration along a fixed direction

mod drag;
mod holmes_featherstone;
mod newtonian;
mod polynomial;
mod relativity;
mod solid_tides;
mod srp;
mod third_body;

pub use drag::IsotropicDrag;
pub use holmes_featherstone::HolmesFeatherstoneAttraction;
pub use newtonian::NewtonianAttraction;
pub use polynomial::PolynomialAcceleration;
pub use relativity::Relativity;
pub use solid_tides::SolidTides;
pub use srp::{lighting_ratio, SolarRadiationPressure};
pub use third_body::ThirdBodyAttraction;

use crate::error::Result;
use crate::propagation::gauss;
use crate::propagation::orbit::PositionAngle;
use crate::propagation::state::SpacecraftState;
use nalgebra::{Vector3, Vector6};

/// Trait for force model contributions
///
/// Models are shared between the numerical and DSST stacks, so they must be
/// thread-safe and must not keep per-evaluation state.
pub trait ForceModel: Send + Sync {
    /// Acceleration in the orbit frame (m/s²)
    ///
    /// `position` and `velocity` are the Cartesian coordinates of
    /// `state.orbit`, passed in so they are computed once per evaluation.
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>>;

    /// Add this model's contribution to the element rates
    ///
    /// `angle` selects the longitude argument of the sixth rate.
    fn add_contribution(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        angle: PositionAngle,
        rates: &mut Vector6<f64>,
    ) -> Result<()> {
        let acceleration = self.acceleration(state, position, velocity)?;
        *rates += gauss::element_rates(&state.orbit, position, velocity, &acceleration, angle);
        Ok(())
    }

    /// Force model name for debugging and logging
    fn name(&self) -> &'static str;

    /// One-line description with the model parameters
    fn description(&self) -> String {
        self.name().to_string()
    }

    /// Gravitational parameter the model was built with, if any
    fn mu(&self) -> Option<f64> {
        None
    }
}

/// A model shared with the DSST contributions
impl<T: ForceModel + ?Sized> ForceModel for std::sync::Arc<T> {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        (**self).acceleration(state, position, velocity)
    }

    fn add_contribution(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        angle: PositionAngle,
        rates: &mut Vector6<f64>,
    ) -> Result<()> {
        (**self).add_contribution(state, position, velocity, angle, rates)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn mu(&self) -> Option<f64> {
        (**self).mu()
    }
}

/// Ordered list of force models, summed in insertion order
#[derive(Default)]
pub struct ForceModels {
    models: Vec<Box<dyn ForceModel>>,
}

impl ForceModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, model: Box<dyn ForceModel>) {
        log::debug!("Adding force model: {}", model.description());
        self.models.push(model);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ForceModel> {
        self.models.iter().map(|m| m.as_ref())
    }

    pub fn model_names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    /// Element rates of the osculating state, longitude argument per `angle`
    pub fn rates(&self, state: &SpacecraftState, angle: PositionAngle) -> Result<Vector6<f64>> {
        let (position, velocity) = state.orbit.pv();
        let mut rates = Vector6::zeros();
        for model in &self.models {
            model.add_contribution(state, &position, &velocity, angle, &mut rates)?;
        }
        Ok(rates)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::propagation::frames::Frame;
    use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
    use crate::propagation::state::SpacecraftState;
    use satkit::Instant;

    pub const MU: f64 = 3.986_004_415e14;

    pub fn epoch() -> Instant {
        Instant::from_datetime(2026, 1, 29, 12, 0, 0.0).unwrap()
    }

    pub fn leo_state() -> SpacecraftState {
        let orbit = EquinoctialOrbit::from_keplerian(
            6_878_000.0,
            1e-3,
            51.6_f64.to_radians(),
            0.3,
            1.2,
            0.7,
            PositionAngle::True,
            Frame::Gcrf,
            epoch(),
            MU,
        )
        .unwrap();
        SpacecraftState::with_default_mass(orbit)
    }
}
