//! Orbital propagation
//!
//! Two propagators share the same orbit, frame and force model types:
//!
//! ## Numerical (Cowell)
//!
//! [`numerical::NumericalPropagator`] integrates osculating equinoctial
//! elements through the Gauss equations, with one [`forces::ForceModel`]
//! per perturbation.
//!
//! ## Semi-analytical (DSST)
//!
//! [`dsst::DsstPropagator`] integrates mean equinoctial elements with
//! averaged rates and adds the short-periodic terms back when an
//! osculating state is requested.
//!
//! # Example
//!
//! ```ignore
//! use orbit_comparator::propagation::forces::NewtonianAttraction;
//! use orbit_comparator::propagation::integrator::DormandPrince853;
//! use orbit_comparator::propagation::numerical::NumericalPropagator;
//!
//! let mut propagator = NumericalPropagator::new(Box::new(integrator));
//! propagator.add_force_model(Box::new(NewtonianAttraction::new(mu)));
//! propagator.set_initial_state(state);
//! let final_state = propagator.propagate(&target)?;
//! ```

pub mod atmosphere;
pub mod bodies;
pub mod dsst;
pub mod forces;
pub mod frames;
pub mod gauss;
pub mod gravity;
pub mod integrator;
pub mod numerical;
pub mod orbit;
pub mod state;
