//! Central body, gravity field and initial orbit

use std::sync::Arc;

use nalgebra::Vector3;
use satkit::Instant;

use crate::config::{BodySettings, ComparisonSettings, OrbitInput, OrbitSettings};
use crate::data::{DataContext, IERS_TABLES, JPL_EPHEMERIS_FILE, SPACE_WEATHER_FILE};
use crate::error::{ConfigError, DataError, Result};
use crate::propagation::bodies::{EphemerisSource, OneAxisEllipsoid};
use crate::propagation::frames::Frame;
use crate::propagation::gravity::{Normalization, SphericalHarmonicsProvider};
use crate::propagation::orbit::EquinoctialOrbit;

/// Physical context shared by both propagators
#[derive(Debug, Clone)]
pub struct Environment {
    pub body: OneAxisEllipsoid,
    pub body_frame: Frame,
    pub normalized: SphericalHarmonicsProvider,
    pub unnormalized: SphericalHarmonicsProvider,
    /// Carries the field's μ
    pub initial_orbit: EquinoctialOrbit,
}

impl Environment {
    /// Check the toolkit data, then load the gravity field and the initial orbit
    pub fn build(settings: &ComparisonSettings, data: &DataContext) -> Result<Self> {
        data.configure_toolkit()?;
        data.require_toolkit_files(&toolkit_files(settings))?;

        let body = central_body(&settings.body);
        let (normalized, unnormalized) = gravity_fields(
            data,
            settings.forces.gravity_degree,
            settings.forces.gravity_order,
        )?;
        let initial_orbit = initial_orbit(&settings.orbit, normalized.mu)?;
        log::info!("Initial orbit: {}", initial_orbit);

        Ok(Self {
            body,
            body_frame: settings.body.frame,
            normalized,
            unnormalized,
            initial_orbit,
        })
    }

    pub fn mu(&self) -> f64 {
        self.normalized.mu
    }
}

/// satkit data files the configured run reads
///
/// Rotations of an ITRF body frame are needed by non-spherical gravity,
/// drag and solid tides; drag reads the space weather; the JPL source
/// serves every third body and the SRP Sun.
pub fn toolkit_files(settings: &ComparisonSettings) -> Vec<&'static str> {
    let forces = &settings.forces;
    let mut files = Vec::new();
    let body_rotation = forces.gravity_degree > 0 || forces.drag.is_some() || forces.solid_tides();
    if body_rotation && settings.body.frame.needs_iers_tables() {
        files.extend(IERS_TABLES);
    }
    if forces.drag.is_some() {
        files.push(SPACE_WEATHER_FILE);
    }
    let uses_ephemeris = !forces.third_bodies.is_empty() || forces.srp.is_some();
    if uses_ephemeris && settings.ephemeris == EphemerisSource::Jpl {
        files.push(JPL_EPHEMERIS_FILE);
    }
    files
}

pub fn central_body(settings: &BodySettings) -> OneAxisEllipsoid {
    log::info!(
        "Central body: equatorial radius {} m, flattening {:.9}, frame {}",
        settings.equatorial_radius,
        settings.flattening,
        settings.frame
    );
    OneAxisEllipsoid::new(settings.equatorial_radius, settings.flattening, settings.frame)
}

/// Normalized and unnormalized truncations of the field at (degree, order)
pub fn gravity_fields(
    data: &DataContext,
    degree: usize,
    order: usize,
) -> std::result::Result<(SphericalHarmonicsProvider, SphericalHarmonicsProvider), DataError> {
    let field: Arc<SphericalHarmonicsProvider> = data.gravity_field(degree)?;
    let normalized = field
        .with_normalization(Normalization::Normalized)
        .truncated(degree, order)?;
    let unnormalized = field
        .with_normalization(Normalization::Unnormalized)
        .truncated(degree, order)?;
    log::info!(
        "Gravity field: degree {}, order {}, mu {:e} m³/s², ae {} m, {}",
        degree,
        order,
        normalized.mu,
        normalized.ae,
        normalized.tide_system
    );
    Ok((normalized, unnormalized))
}

/// Build the initial orbit with the gravity field's μ
pub fn initial_orbit(settings: &OrbitSettings, mu: f64) -> Result<EquinoctialOrbit> {
    let frame = settings.frame;
    let date = || {
        settings
            .date
            .ok_or_else(|| ConfigError::invalid("orbit.date", "required for this orbit type"))
    };
    let orbit = match &settings.input {
        OrbitInput::Tle { line1, line2 } => {
            let (epoch, position, velocity) = tle_state(line1, line2, frame)?;
            EquinoctialOrbit::from_pv(&position, &velocity, frame, epoch, mu)?
        }
        &OrbitInput::Keplerian { a, e, i, pa, raan, anomaly, angle } => {
            EquinoctialOrbit::from_keplerian(a, e, i, pa, raan, anomaly, angle, frame, date()?, mu)?
        }
        &OrbitInput::Equinoctial { a, ex, ey, hx, hy, l, angle } => {
            EquinoctialOrbit::new(a, ex, ey, hx, hy, l, angle, frame, date()?, mu)?
        }
        &OrbitInput::Circular { a, ex, ey, i, raan, alpha, angle } => {
            EquinoctialOrbit::from_circular(a, ex, ey, i, raan, alpha, angle, frame, date()?, mu)?
        }
        OrbitInput::Cartesian { position, velocity } => {
            EquinoctialOrbit::from_pv(position, velocity, frame, date()?, mu)?
        }
    };
    Ok(orbit)
}

/// SGP4 state at the TLE epoch, expressed in `frame`
pub fn tle_state(line1: &str, line2: &str, frame: Frame) -> Result<(Instant, Vector3<f64>, Vector3<f64>)> {
    let mut tle = satkit::TLE::load_2line(line1, line2).map_err(|e| DataError::Tle(e.to_string()))?;
    let epoch = tle.epoch;
    let result = satkit::sgp4::sgp4(&mut tle, &[epoch])
        .map_err(|_| DataError::Tle("SGP4 failed at the TLE epoch".to_string()))?;

    let pos = result.pos.column(0);
    let vel = result.vel.column(0);
    let pos_teme = Vector3::new(pos[0], pos[1], pos[2]);
    let vel_teme = Vector3::new(vel[0], vel[1], vel[2]);

    let (position, velocity) = Frame::Teme.transform_pv(&frame, &epoch, &pos_teme, &vel_teme);
    log::debug!("TLE seed at {:?}: |r| = {:.1} m in {}", epoch, position.norm(), frame);
    Ok((epoch, position, velocity))
}
