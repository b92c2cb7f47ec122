//! Integrator selection

use crate::config::IntegratorSettings;
use crate::error::Result;
use crate::propagation::integrator::{tolerances, ClassicalRungeKutta, DormandPrince853, Integrator};
use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
use nalgebra::Vector6;

/// Position error mapped onto the equinoctial elements of `orbit`
///
/// Both propagators get the same tolerances, taken with the true longitude
/// argument, even though DSST integrates mean elements.
fn adaptive_tolerances(position_error: f64, orbit: &EquinoctialOrbit) -> Result<(Vector6<f64>, Vector6<f64>)> {
    Ok(tolerances(position_error, orbit, PositionAngle::True)?)
}

/// Fixed step ⇒ classical Runge-Kutta, otherwise Dormand-Prince 8(5,3)
pub fn build_integrator(
    propagator: &str,
    settings: &IntegratorSettings,
    orbit: &EquinoctialOrbit,
) -> Result<Box<dyn Integrator>> {
    match *settings {
        IntegratorSettings::Fixed { step } => {
            log::info!("{}: classical Runge-Kutta, step {} s", propagator, step);
            Ok(Box::new(ClassicalRungeKutta::new(step)))
        }
        IntegratorSettings::Adaptive {
            min_step,
            max_step,
            position_error,
        } => {
            let (abs_tol, rel_tol) = adaptive_tolerances(position_error, orbit)?;
            log::info!(
                "{}: Dormand-Prince 8(5,3), steps [{}, {}] s, position error {} m",
                propagator,
                min_step,
                max_step,
                position_error
            );
            log::debug!("{} tolerances: abs {:?}, rel {:e}", propagator, abs_tol.as_slice(), rel_tol[0]);
            Ok(Box::new(DormandPrince853::new(min_step, max_step, abs_tol, rel_tol)))
        }
    }
}
