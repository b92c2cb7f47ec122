//! Spacecraft state and physical constants
//!
//! A [`SpacecraftState`] couples an osculating [`EquinoctialOrbit`] with the
//! spacecraft mass. Both propagators produce it as their final output.

use crate::propagation::orbit::EquinoctialOrbit;
use satkit::Instant;
use std::fmt;

// Physical constants
/// WGS84 equatorial radius in meters
pub const WGS84_EARTH_EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// WGS84 Earth rotation rate in rad/s
pub const WGS84_EARTH_ANGULAR_VELOCITY: f64 = 7.292_115e-5;

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Solar radiation pressure at the reference distance in N/m²
pub const SRP_REFERENCE_PRESSURE: f64 = 4.56e-6;

/// Reference distance for [`SRP_REFERENCE_PRESSURE`] in meters (≈ 1 AU)
pub const SRP_REFERENCE_DISTANCE: f64 = 149_597_870_000.0;

/// Mean solar radius in meters
pub const SUN_RADIUS: f64 = 6.96e8;

/// Seconds per day
pub const JULIAN_DAY: f64 = 86_400.0;

/// Mass assumed when the configuration gives none, in kilograms
pub const DEFAULT_MASS: f64 = 1000.0;

/// Orbit plus mass at one instant
#[derive(Debug, Clone)]
pub struct SpacecraftState {
    pub orbit: EquinoctialOrbit,

    /// Spacecraft mass in kilograms
    pub mass: f64,
}

impl SpacecraftState {
    pub fn new(orbit: EquinoctialOrbit, mass: f64) -> Self {
        Self { orbit, mass }
    }

    /// State with [`DEFAULT_MASS`]
    pub fn with_default_mass(orbit: EquinoctialOrbit) -> Self {
        Self::new(orbit, DEFAULT_MASS)
    }

    pub fn date(&self) -> Instant {
        self.orbit.date()
    }
}

/// ISO-8601 UTC timestamp with millisecond resolution, e.g. `2023-01-02T00:00:00.000Z`
pub fn format_date(date: &Instant) -> String {
    let (year, month, day, hour, min, sec) = date.as_datetime();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:06.3}Z",
        year,
        month,
        day,
        hour,
        min,
        sec.clamp(0.0, 59.999)
    )
}

impl fmt::Display for EquinoctialOrbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "equinoctial parameters: {{a: {}; ex: {}; ey: {}; hx: {}; hy: {}; lv: {};}}",
            self.a(),
            self.ex(),
            self.ey(),
            self.hx(),
            self.hy(),
            self.lv().to_degrees()
        )
    }
}

impl fmt::Display for SpacecraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpacecraftState{{orbit={}, date={}, mass={:.1}}}",
            self.orbit,
            format_date(&self.orbit.date()),
            self.mass
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::frames::Frame;
    use crate::propagation::orbit::PositionAngle;

    #[test]
    fn test_display_layout() {
        let epoch = Instant::from_datetime(2023, 1, 2, 3, 4, 5.25).unwrap();
        let orbit = EquinoctialOrbit::new(
            7.0e6, 0.001, 0.0, 0.0, 0.0, 0.5, PositionAngle::True, Frame::Eme2000, epoch, 3.986004415e14,
        )
        .unwrap();
        let text = SpacecraftState::with_default_mass(orbit).to_string();

        assert!(text.starts_with("SpacecraftState{orbit=equinoctial parameters: {a: 7000000; ex: 0.001;"));
        assert!(text.contains("date=2023-01-02T03:04:05.250Z"), "{}", text);
        assert!(text.ends_with("mass=1000.0}"), "{}", text);
    }

    #[test]
    fn test_wgs84_constants() {
        let polar = WGS84_EARTH_EQUATORIAL_RADIUS * (1.0 - WGS84_EARTH_FLATTENING);
        assert!((polar - 6_356_752.314).abs() < 1e-3);
    }
}
