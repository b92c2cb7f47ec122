//! Propagator construction

use crate::config::{ComparisonSettings, DSST_PROPAGATOR, NUMERICAL_PROPAGATOR};
use crate::error::Result;
use crate::propagation::dsst::{DsstPropagator, PropagationType};
use crate::propagation::numerical::NumericalPropagator;
use crate::propagation::state::SpacecraftState;

use super::catalog::ForceCatalog;
use super::environment::Environment;
use super::integrator::build_integrator;

fn initial_state(settings: &ComparisonSettings, environment: &Environment) -> SpacecraftState {
    SpacecraftState::new(environment.initial_orbit.clone(), settings.mass)
}

/// Osculating Cowell propagator over the catalog's numerical models
pub fn build_numerical(settings: &ComparisonSettings, environment: &Environment) -> Result<NumericalPropagator> {
    let integrator = build_integrator(
        NUMERICAL_PROPAGATOR,
        &settings.numerical_integrator,
        &environment.initial_orbit,
    )?;
    let mut propagator = NumericalPropagator::new(integrator);

    for model in ForceCatalog::build(settings, environment)?.as_numerical() {
        log::info!("{}: adding {}", NUMERICAL_PROPAGATOR, model.description());
        propagator.add_force_model(model);
    }

    propagator.set_initial_state(initial_state(settings, environment));
    Ok(propagator)
}

/// Semi-analytical propagator with osculating output
pub fn build_dsst(settings: &ComparisonSettings, environment: &Environment) -> Result<DsstPropagator> {
    let integrator = build_integrator(
        DSST_PROPAGATOR,
        &settings.dsst_integrator,
        &environment.initial_orbit,
    )?;
    let mut propagator = DsstPropagator::new(integrator, PropagationType::Osculating);

    for model in ForceCatalog::build(settings, environment)?.as_dsst()? {
        log::info!("{}: adding {}", DSST_PROPAGATOR, model.description());
        propagator.add_force_model(model);
    }

    propagator.set_initial_state(initial_state(settings, environment), PropagationType::Osculating);
    propagator.set_interpolation_gap(settings.dsst_interpolation_gap);
    Ok(propagator)
}
