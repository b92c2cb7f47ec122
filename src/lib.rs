//! Orbit propagator comparator
//!
//! Propagates one initial orbit with a numerical Cowell propagator and with
//! a DSST semi-analytical propagator under the same force environment, then
//! reports both final states and the wall-clock time each run took.
//!
//! The pipeline is configuration ([`config`]) → physical environment and
//! propagators ([`builder`]) → driver ([`comparator`]).

pub mod builder;
pub mod comparator;
pub mod config;
pub mod data;
pub mod error;
pub mod propagation;

pub use comparator::{ComparisonReport, OrbitComparator, PropagationRun};
pub use config::{ComparisonSettings, OrbitComparatorInputs};
pub use data::DataContext;
pub use error::{Error, Result};
