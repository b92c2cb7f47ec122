//! Turns validated settings into ready-to-run propagators
//!
//! Both propagators are built from one [`Environment`], so they share the
//! central body, the gravity field truncation and the initial orbit (with
//! the field's μ).

mod catalog;
mod environment;
mod integrator;
mod propagators;

pub use catalog::ForceCatalog;
pub use environment::{central_body, gravity_fields, initial_orbit, tle_state, toolkit_files, Environment};
pub use integrator::build_integrator;
pub use propagators::{build_dsst, build_numerical};
