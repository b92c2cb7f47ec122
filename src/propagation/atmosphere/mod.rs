//! Atmospheric density models for drag calculations
//!
//! Models are hot-swappable behind the [`AtmosphereModel`] trait and locate
//! the spacecraft through the central body ellipsoid, so the geodetic
//! altitude follows the configured Earth shape and Earth-fixed frame.
//!
//! # Implemented Models
//!
//! - **NRLMSISE-00**: empirical model driven by space weather data (via satkit)
//! - **Exponential**: single scale-height decay, no external data

mod exponential;
mod nrlmsise00;

pub use exponential::Exponential;
pub use nrlmsise00::Nrlmsise00;

use crate::error::DataError;
use crate::propagation::frames::Frame;
use nalgebra::Vector3;
use satkit::Instant;

/// Trait for atmospheric density models
///
/// Implementations must be thread-safe (Send + Sync) so a force catalog can
/// be shared between the numerical and DSST stacks.
pub trait AtmosphereModel: Send + Sync {
    /// Mass density in kg/m³ at `position` (meters, expressed in `frame`)
    fn density(&self, date: &Instant, position: &Vector3<f64>, frame: &Frame) -> Result<f64, DataError>;

    /// Model name for logging and display
    fn name(&self) -> &'static str;

    /// Altitude above which the density is treated as zero (meters)
    fn max_altitude(&self) -> f64 {
        1_000_000.0
    }
}
