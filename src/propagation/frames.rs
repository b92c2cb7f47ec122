//! Reference frames
//!
//! A catalog of predefined frames addressed by name, split into two kinds:
//!
//! - **Pseudo-inertial** frames (GCRF, ICRF, EME2000, TEME) that carry orbit states
//! - **Earth-fixed** frames (the ITRF and GTOD families) that carry the body shape
//!   and the gravity field
//!
//! Every frame knows its rotation to GCRF at a given instant. The rotations
//! themselves come from satkit (IAU-2006/2000 GCRF↔ITRF, IAU-76/FK5 TEME↔GCRF);
//! GTOD is TEME spun by Greenwich mean sidereal time.

use crate::error::ConfigError;
use crate::propagation::state::WGS84_EARTH_ANGULAR_VELOCITY;
use nalgebra::{UnitQuaternion, Vector3};
use parking_lot::RwLock;
use satkit::Instant;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::OnceLock;

/// IERS conventions used by the Earth-fixed frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IersConventions {
    Iers1996,
    Iers2003,
    Iers2010,
}

impl IersConventions {
    /// Resolve a conventions year; 0 (unset) maps to IERS 2010
    pub fn from_year(year: u32) -> Result<Self, ConfigError> {
        match year {
            0 | 2010 => Ok(Self::Iers2010),
            2003 => Ok(Self::Iers2003),
            1996 => Ok(Self::Iers1996),
            other => Err(ConfigError::invalid(
                "body.iersConventionYear",
                format!("{} is not one of 1996, 2003, 2010", other),
            )),
        }
    }

    pub fn year(&self) -> u32 {
        match self {
            Self::Iers1996 => 1996,
            Self::Iers2003 => 2003,
            Self::Iers2010 => 2010,
        }
    }
}

/// Predefined frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    Gcrf,
    Icrf,
    Eme2000,
    Teme,
    Itrf {
        conventions: IersConventions,
        simple_eop: bool,
        equinox_based: bool,
    },
    Gtod {
        conventions: Option<IersConventions>,
    },
}

struct Predefined {
    /// Enum-style identifier, also accepted as a name
    id: &'static str,
    name: &'static str,
    frame: Frame,
}

const fn itrf(conventions: IersConventions, simple_eop: bool, equinox_based: bool) -> Frame {
    Frame::Itrf {
        conventions,
        simple_eop,
        equinox_based,
    }
}

const fn gtod(conventions: Option<IersConventions>) -> Frame {
    Frame::Gtod { conventions }
}

use IersConventions::{Iers1996, Iers2003, Iers2010};

const PREDEFINED: &[Predefined] = &[
    Predefined { id: "GCRF", name: "GCRF", frame: Frame::Gcrf },
    Predefined { id: "ICRF", name: "ICRF", frame: Frame::Icrf },
    Predefined { id: "EME2000", name: "EME2000", frame: Frame::Eme2000 },
    Predefined { id: "TEME", name: "TEME", frame: Frame::Teme },
    Predefined { id: "ITRF_CIO_CONV_2010_ACCURATE_EOP", name: "CIO/2010-based ITRF accurate EOP", frame: itrf(Iers2010, false, false) },
    Predefined { id: "ITRF_CIO_CONV_2010_SIMPLE_EOP", name: "CIO/2010-based ITRF simple EOP", frame: itrf(Iers2010, true, false) },
    Predefined { id: "ITRF_CIO_CONV_2003_ACCURATE_EOP", name: "CIO/2003-based ITRF accurate EOP", frame: itrf(Iers2003, false, false) },
    Predefined { id: "ITRF_CIO_CONV_2003_SIMPLE_EOP", name: "CIO/2003-based ITRF simple EOP", frame: itrf(Iers2003, true, false) },
    Predefined { id: "ITRF_CIO_CONV_1996_ACCURATE_EOP", name: "CIO/1996-based ITRF accurate EOP", frame: itrf(Iers1996, false, false) },
    Predefined { id: "ITRF_CIO_CONV_1996_SIMPLE_EOP", name: "CIO/1996-based ITRF simple EOP", frame: itrf(Iers1996, true, false) },
    Predefined { id: "ITRF_EQUINOX_CONV_2010_ACCURATE_EOP", name: "Equinox/2010-based ITRF accurate EOP", frame: itrf(Iers2010, false, true) },
    Predefined { id: "ITRF_EQUINOX_CONV_2010_SIMPLE_EOP", name: "Equinox/2010-based ITRF simple EOP", frame: itrf(Iers2010, true, true) },
    Predefined { id: "ITRF_EQUINOX_CONV_2003_ACCURATE_EOP", name: "Equinox/2003-based ITRF accurate EOP", frame: itrf(Iers2003, false, true) },
    Predefined { id: "ITRF_EQUINOX_CONV_2003_SIMPLE_EOP", name: "Equinox/2003-based ITRF simple EOP", frame: itrf(Iers2003, true, true) },
    Predefined { id: "ITRF_EQUINOX_CONV_1996_ACCURATE_EOP", name: "Equinox/1996-based ITRF accurate EOP", frame: itrf(Iers1996, false, true) },
    Predefined { id: "ITRF_EQUINOX_CONV_1996_SIMPLE_EOP", name: "Equinox/1996-based ITRF simple EOP", frame: itrf(Iers1996, true, true) },
    Predefined { id: "GTOD_WITHOUT_EOP_CORRECTIONS", name: "GTOD without EOP corrections", frame: gtod(None) },
    Predefined { id: "GTOD_CONVENTIONS_2010_ACCURATE_EOP", name: "GTOD/2010 accurate EOP", frame: gtod(Some(Iers2010)) },
    Predefined { id: "GTOD_CONVENTIONS_2003_ACCURATE_EOP", name: "GTOD/2003 accurate EOP", frame: gtod(Some(Iers2003)) },
    Predefined { id: "GTOD_CONVENTIONS_1996_ACCURATE_EOP", name: "GTOD/1996 accurate EOP", frame: gtod(Some(Iers1996)) },
];

/// Alternative spellings seen in configuration files
const ALIASES: &[(&str, &str)] = &[
    ("ITRF", "ITRF_CIO_CONV_2010_ACCURATE_EOP"),
    ("ITRF-CIO/2010-based accurate EOP", "ITRF_CIO_CONV_2010_ACCURATE_EOP"),
    ("ITRF-CIO/2010-based simple EOP", "ITRF_CIO_CONV_2010_SIMPLE_EOP"),
    ("GTOD", "GTOD_WITHOUT_EOP_CORRECTIONS"),
];

impl Frame {
    /// Look up a predefined frame by display name or identifier
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::predefined(name)
            .map(|p| p.frame)
            .ok_or_else(|| ConfigError::UnknownFrame(name.to_string()))
    }

    /// Look up a frame that may carry a central body
    ///
    /// Only the ITRF and GTOD families qualify.
    pub fn earth_frame(name: &str) -> Result<Self, ConfigError> {
        let predefined =
            Self::predefined(name).ok_or_else(|| ConfigError::UnknownFrame(name.to_string()))?;
        if predefined.id.starts_with("ITRF") || predefined.id.starts_with("GTOD") {
            Ok(predefined.frame)
        } else {
            Err(ConfigError::NoEarthFrame(name.to_string()))
        }
    }

    /// Look up a frame that may carry an orbit
    pub fn inertial_frame(name: &str) -> Result<Self, ConfigError> {
        let frame = Self::from_name(name)?;
        if frame.is_pseudo_inertial() {
            Ok(frame)
        } else {
            Err(ConfigError::NonPseudoInertialFrame(name.to_string()))
        }
    }

    /// Default terrestrial frame for a set of IERS conventions
    pub fn itrf(conventions: IersConventions) -> Self {
        itrf(conventions, false, false)
    }

    fn predefined(name: &str) -> Option<&'static Predefined> {
        let name = name.trim();
        let id = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, id)| *id)
            .unwrap_or(name);
        PREDEFINED.iter().find(|p| p.name == id || p.id == id)
    }

    pub fn name(&self) -> &'static str {
        PREDEFINED
            .iter()
            .find(|p| p.frame == *self)
            .map(|p| p.name)
            .unwrap_or("unnamed")
    }

    pub fn is_pseudo_inertial(&self) -> bool {
        matches!(self, Self::Gcrf | Self::Icrf | Self::Eme2000 | Self::Teme)
    }

    pub fn is_earth_fixed(&self) -> bool {
        !self.is_pseudo_inertial()
    }

    /// Rotations of this frame read the toolkit's IERS 2010 tables
    pub fn needs_iers_tables(&self) -> bool {
        matches!(self, Self::Itrf { .. })
    }

    /// Rotation rate of this frame with respect to inertial space, in its own axes
    pub fn angular_velocity(&self) -> Vector3<f64> {
        if self.is_earth_fixed() {
            Vector3::new(0.0, 0.0, WGS84_EARTH_ANGULAR_VELOCITY)
        } else {
            Vector3::zeros()
        }
    }

    /// Rotation taking vectors expressed in this frame to GCRF
    pub fn rotation_to_gcrf(&self, epoch: &Instant) -> UnitQuaternion<f64> {
        match self {
            Self::Gcrf | Self::Icrf => UnitQuaternion::identity(),
            Self::Eme2000 => frame_bias().inverse(),
            _ => rotation_cache().get_or_insert(*self, epoch, || self.compute_rotation(epoch)),
        }
    }

    fn compute_rotation(&self, epoch: &Instant) -> UnitQuaternion<f64> {
        match self {
            Self::Gcrf | Self::Icrf => UnitQuaternion::identity(),
            Self::Eme2000 => frame_bias().inverse(),
            Self::Teme => satkit::frametransform::qteme2gcrf(epoch),
            Self::Itrf { .. } => satkit::frametransform::qgcrf2itrf(epoch).inverse(),
            Self::Gtod { .. } => {
                let spin = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), gmst(epoch));
                satkit::frametransform::qteme2gcrf(epoch) * spin
            }
        }
    }

    /// Rotation taking vectors expressed in this frame to `target`
    pub fn rotation_to(&self, target: &Frame, epoch: &Instant) -> UnitQuaternion<f64> {
        if self == target {
            return UnitQuaternion::identity();
        }
        target.rotation_to_gcrf(epoch).inverse() * self.rotation_to_gcrf(epoch)
    }

    /// Transform position and velocity to `target`, including frame rotation rates
    pub fn transform_pv(
        &self,
        target: &Frame,
        epoch: &Instant,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        if self == target {
            return (*position, *velocity);
        }
        let rotation = self.rotation_to(target, epoch);
        let inertial_velocity = velocity + self.angular_velocity().cross(position);
        let p = rotation * position;
        let v = rotation * inertial_velocity - target.angular_velocity().cross(&p);
        (p, v)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// GCRF → EME2000 frame bias (IERS 2003, eq. 28 of Chapter 5)
fn frame_bias() -> UnitQuaternion<f64> {
    const MAS: f64 = PI / (180.0 * 3600.0 * 1000.0);
    let d_alpha0 = -14.6 * MAS;
    let xi0 = -16.6170 * MAS;
    let eta0 = -6.8192 * MAS;
    // B = R1(-η0) R2(ξ0) R3(dα0) as coordinate rotations
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), eta0)
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -xi0)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -d_alpha0)
}

/// Greenwich mean sidereal time (IAU-82), radians in [0, 2π)
///
/// UT1 is approximated by the toolkit's Julian date.
pub fn gmst(epoch: &Instant) -> f64 {
    let jd = epoch.as_jd();
    let t = (jd - 2_451_545.0) / 36_525.0;
    let seconds = 67_310.548_41
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * t
        + 0.093_104 * t * t
        - 6.2e-6 * t * t * t;
    (seconds * 2.0 * PI / 86_400.0).rem_euclid(2.0 * PI)
}

/// Memo of recent frame rotations, keyed by frame and instant
struct RotationCache {
    entries: RwLock<HashMap<(Frame, u64), UnitQuaternion<f64>>>,
}

const ROTATION_CACHE_CAPACITY: usize = 4096;

impl RotationCache {
    fn get_or_insert(
        &self,
        frame: Frame,
        epoch: &Instant,
        compute: impl FnOnce() -> UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let key = (frame, epoch.as_unixtime().to_bits());
        if let Some(rotation) = self.entries.read().get(&key).copied() {
            return rotation;
        }

        let rotation = compute();
        let mut entries = self.entries.write();
        if entries.len() >= ROTATION_CACHE_CAPACITY {
            entries.clear();
        }
        entries.insert(key, rotation);
        rotation
    }
}

fn rotation_cache() -> &'static RotationCache {
    static CACHE: OnceLock<RotationCache> = OnceLock::new();
    CACHE.get_or_init(|| RotationCache {
        entries: RwLock::new(HashMap::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_identifier() {
        assert_eq!(Frame::from_name("EME2000").unwrap(), Frame::Eme2000);
        assert_eq!(
            Frame::from_name("CIO/2010-based ITRF accurate EOP").unwrap(),
            Frame::itrf(IersConventions::Iers2010)
        );
        assert_eq!(
            Frame::from_name("ITRF_CIO_CONV_2010_ACCURATE_EOP").unwrap(),
            Frame::itrf(IersConventions::Iers2010)
        );
        assert!(matches!(
            Frame::from_name("Mars-centered"),
            Err(ConfigError::UnknownFrame(_))
        ));
    }

    #[test]
    fn test_earth_frame_policy() {
        let err = Frame::earth_frame("EME2000").unwrap_err();
        assert!(err.to_string().contains("No Earth frame"));

        let gtod = Frame::earth_frame("GTOD without EOP corrections").unwrap();
        assert!(gtod.is_earth_fixed());
    }

    #[test]
    fn test_inertial_frame_policy() {
        let err = Frame::inertial_frame("ITRF-CIO/2010-based accurate EOP").unwrap_err();
        assert!(matches!(err, ConfigError::NonPseudoInertialFrame(_)));
        assert!(err.to_string().contains("non pseudo-inertial frame"));

        assert!(Frame::inertial_frame("TEME").unwrap().is_pseudo_inertial());
    }

    #[test]
    fn test_iers_tables_only_for_itrf() {
        for year in [1996, 2003, 2010] {
            let conventions = IersConventions::from_year(year).unwrap();
            assert_eq!(conventions.year(), year);
            assert!(Frame::itrf(conventions).needs_iers_tables());
        }
        assert!(!Frame::Gtod { conventions: None }.needs_iers_tables());
        assert!(!Frame::Teme.needs_iers_tables());
        assert!(!Frame::Eme2000.needs_iers_tables());
    }

    #[test]
    fn test_frame_bias_is_tiny() {
        let q = Frame::Eme2000.rotation_to_gcrf(&Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap());
        let angle = q.angle();
        assert!(angle > 1e-8 && angle < 1e-6, "frame bias angle {}", angle);
    }

    #[test]
    fn test_gmst_rate() {
        let t0 = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let t1 = t0 + satkit::Duration::from_seconds(3600.0);
        let mut delta = gmst(&t1) - gmst(&t0);
        if delta < 0.0 {
            delta += 2.0 * PI;
        }
        // Sidereal rate ω = 7.2921158553e-5 rad/s
        assert!((delta - 7.292_115_855_3e-5 * 3600.0).abs() < 1e-6, "delta {}", delta);
    }

    #[test]
    fn test_gtod_spins_teme_about_pole() {
        let epoch = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let gtod = Frame::Gtod { conventions: None };
        let pole = gtod.rotation_to(&Frame::Teme, &epoch) * Vector3::z();
        assert!((pole - Vector3::z()).norm() < 1e-12);

        let x = gtod.rotation_to(&Frame::Teme, &epoch) * Vector3::x();
        let angle = x.y.atan2(x.x).rem_euclid(2.0 * PI);
        assert!((angle - gmst(&epoch)).abs() < 1e-12);
    }

    #[test]
    fn test_transform_pv_round_trip() {
        let epoch = Instant::from_datetime(2023, 6, 1, 6, 0, 0.0).unwrap();
        let gtod = Frame::Gtod { conventions: None };
        let p = Vector3::new(7.0e6, -1.2e6, 3.0e5);
        let v = Vector3::new(100.0, 7400.0, 1200.0);

        let (pb, vb) = Frame::Eme2000.transform_pv(&gtod, &epoch, &p, &v);
        // Earth-fixed velocity loses the ω × r term
        assert!((vb.norm() - v.norm()).abs() > 1.0);

        let (pi, vi) = gtod.transform_pv(&Frame::Eme2000, &epoch, &pb, &vb);
        assert!((pi - p).norm() < 1e-6);
        assert!((vi - v).norm() < 1e-9);
    }
}
