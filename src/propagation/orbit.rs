//! Orbit parameterizations
//!
//! Everything is propagated on [`EquinoctialOrbit`], the non-singular set
//! (a, ex, ey, hx, hy, λv):
//!
//! - ex = e·cos(ω+Ω), ey = e·sin(ω+Ω)
//! - hx = tan(i/2)·cos Ω, hy = tan(i/2)·sin Ω
//! - λv = v + ω + Ω (true longitude argument)
//!
//! Keplerian, circular and Cartesian inputs are converted on construction.
//! Eccentric and mean longitude arguments (λE, λM) are derived on demand.

use crate::error::{ConfigError, PropagationError};
use crate::propagation::frames::Frame;
use nalgebra::{Vector3, Vector6};
use satkit::{Duration, Instant};
use std::f64::consts::PI;
use std::str::FromStr;

/// Which anomaly an angular orbital element refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionAngle {
    True,
    Eccentric,
    Mean,
}

impl PositionAngle {
    pub fn name(&self) -> &'static str {
        match self {
            Self::True => "TRUE",
            Self::Eccentric => "ECCENTRIC",
            Self::Mean => "MEAN",
        }
    }
}

impl FromStr for PositionAngle {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "TRUE" => Ok(Self::True),
            "ECCENTRIC" => Ok(Self::Eccentric),
            "MEAN" => Ok(Self::Mean),
            other => Err(ConfigError::invalid(
                "positionAngle",
                format!("'{}' is not one of TRUE, ECCENTRIC, MEAN", other),
            )),
        }
    }
}

/// Normalize an angle into [center - π, center + π)
pub fn normalize_angle(angle: f64, center: f64) -> f64 {
    angle - 2.0 * PI * ((angle + PI - center) / (2.0 * PI)).floor()
}

/// λE from λv
pub fn true_to_eccentric(ex: f64, ey: f64, lv: f64) -> f64 {
    let epsilon = (1.0 - ex * ex - ey * ey).sqrt();
    let (sin_lv, cos_lv) = lv.sin_cos();
    let num = ey * cos_lv - ex * sin_lv;
    let den = epsilon + 1.0 + ex * cos_lv + ey * sin_lv;
    lv + 2.0 * (num / den).atan()
}

/// λv from λE
pub fn eccentric_to_true(ex: f64, ey: f64, le: f64) -> f64 {
    let epsilon = (1.0 - ex * ex - ey * ey).sqrt();
    let (sin_le, cos_le) = le.sin_cos();
    let num = ex * sin_le - ey * cos_le;
    let den = epsilon + 1.0 - ex * cos_le - ey * sin_le;
    le + 2.0 * (num / den).atan()
}

/// λM from λE (equinoctial Kepler equation)
pub fn eccentric_to_mean(ex: f64, ey: f64, le: f64) -> f64 {
    le - ex * le.sin() + ey * le.cos()
}

/// λE from λM by Newton iteration on the equinoctial Kepler equation
pub fn mean_to_eccentric(ex: f64, ey: f64, lm: f64) -> f64 {
    let mut le = lm;
    for _ in 0..50 {
        let (sin_le, cos_le) = le.sin_cos();
        let f = le - ex * sin_le + ey * cos_le - lm;
        let f_prime = 1.0 - ex * cos_le - ey * sin_le;
        let delta = f / f_prime;
        le -= delta;
        if delta.abs() <= 1e-15 * le.abs().max(1.0) {
            break;
        }
    }
    le
}

/// Osculating orbit in equinoctial elements
#[derive(Debug, Clone)]
pub struct EquinoctialOrbit {
    a: f64,
    ex: f64,
    ey: f64,
    hx: f64,
    hy: f64,
    lv: f64,
    frame: Frame,
    date: Instant,
    mu: f64,
}

impl EquinoctialOrbit {
    /// Build from equinoctial elements; `l` is interpreted according to `angle`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: f64,
        ex: f64,
        ey: f64,
        hx: f64,
        hy: f64,
        l: f64,
        angle: PositionAngle,
        frame: Frame,
        date: Instant,
        mu: f64,
    ) -> Result<Self, PropagationError> {
        if ![a, ex, ey, hx, hy, l, mu].iter().all(|x| x.is_finite()) {
            return Err(PropagationError::ImpossibleOrbit(
                "non-finite orbital elements".to_string(),
            ));
        }
        if ex * ex + ey * ey >= 1.0 {
            return Err(PropagationError::ImpossibleOrbit(format!(
                "hyperbolic orbits cannot be handled as equinoctial (e = {})",
                (ex * ex + ey * ey).sqrt()
            )));
        }
        if a <= 0.0 {
            return Err(PropagationError::ImpossibleOrbit(format!(
                "semi-major axis must be positive (a = {})",
                a
            )));
        }

        let lv = match angle {
            PositionAngle::True => l,
            PositionAngle::Eccentric => eccentric_to_true(ex, ey, l),
            PositionAngle::Mean => eccentric_to_true(ex, ey, mean_to_eccentric(ex, ey, l)),
        };

        Ok(Self {
            a,
            ex,
            ey,
            hx,
            hy,
            lv: normalize_angle(lv, 0.0),
            frame,
            date,
            mu,
        })
    }

    /// Build from a [a, ex, ey, hx, hy, l] vector
    pub fn from_elements(
        elements: &Vector6<f64>,
        angle: PositionAngle,
        frame: Frame,
        date: Instant,
        mu: f64,
    ) -> Result<Self, PropagationError> {
        Self::new(
            elements[0],
            elements[1],
            elements[2],
            elements[3],
            elements[4],
            elements[5],
            angle,
            frame,
            date,
            mu,
        )
    }

    /// Build from Keplerian elements (angles in radians)
    #[allow(clippy::too_many_arguments)]
    pub fn from_keplerian(
        a: f64,
        e: f64,
        i: f64,
        pa: f64,
        raan: f64,
        anomaly: f64,
        angle: PositionAngle,
        frame: Frame,
        date: Instant,
        mu: f64,
    ) -> Result<Self, PropagationError> {
        if !(0.0..1.0).contains(&e) {
            return Err(PropagationError::ImpossibleOrbit(format!(
                "eccentricity must lie in [0, 1) (e = {})",
                e
            )));
        }
        if !(0.0..PI).contains(&i) {
            return Err(PropagationError::ImpossibleOrbit(format!(
                "inclination must lie in [0, π) for equinoctial elements (i = {})",
                i
            )));
        }
        let tan_half_i = (0.5 * i).tan();
        let (sin_raan, cos_raan) = raan.sin_cos();
        let (sin_pom, cos_pom) = (pa + raan).sin_cos();
        Self::new(
            a,
            e * cos_pom,
            e * sin_pom,
            tan_half_i * cos_raan,
            tan_half_i * sin_raan,
            anomaly + pa + raan,
            angle,
            frame,
            date,
            mu,
        )
    }

    /// Build from circular elements (ex, ey relative to the ascending node; angles in radians)
    #[allow(clippy::too_many_arguments)]
    pub fn from_circular(
        a: f64,
        ex: f64,
        ey: f64,
        i: f64,
        raan: f64,
        alpha: f64,
        angle: PositionAngle,
        frame: Frame,
        date: Instant,
        mu: f64,
    ) -> Result<Self, PropagationError> {
        if !(0.0..PI).contains(&i) {
            return Err(PropagationError::ImpossibleOrbit(format!(
                "inclination must lie in [0, π) for equinoctial elements (i = {})",
                i
            )));
        }
        let tan_half_i = (0.5 * i).tan();
        let (sin_raan, cos_raan) = raan.sin_cos();
        Self::new(
            a,
            ex * cos_raan - ey * sin_raan,
            ey * cos_raan + ex * sin_raan,
            tan_half_i * cos_raan,
            tan_half_i * sin_raan,
            alpha + raan,
            angle,
            frame,
            date,
            mu,
        )
    }

    /// Build from Cartesian position (m) and velocity (m/s)
    pub fn from_pv(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        frame: Frame,
        date: Instant,
        mu: f64,
    ) -> Result<Self, PropagationError> {
        let r2 = position.norm_squared();
        let r = r2.sqrt();
        let v2 = velocity.norm_squared();
        let r_v2_on_mu = r * v2 / mu;

        if r_v2_on_mu >= 2.0 {
            return Err(PropagationError::ImpossibleOrbit(
                "hyperbolic orbits cannot be handled as equinoctial".to_string(),
            ));
        }
        let a = r / (2.0 - r_v2_on_mu);

        let momentum = position.cross(velocity);
        let w = momentum.normalize();
        if !w.iter().all(|x| x.is_finite()) || (1.0 + w.z).abs() < 1e-14 {
            return Err(PropagationError::ImpossibleOrbit(
                "degenerate or retrograde equatorial orbit".to_string(),
            ));
        }
        let d = 1.0 / (1.0 + w.z);
        let hx = -d * w.y;
        let hy = d * w.x;

        let cos_lv = (position.x - d * position.z * w.x) / r;
        let sin_lv = (position.y - d * position.z * w.y) / r;
        let lv = sin_lv.atan2(cos_lv);

        let e_se = position.dot(velocity) / (mu * a).sqrt();
        let e_ce = r_v2_on_mu - 1.0;
        let e2 = e_ce * e_ce + e_se * e_se;
        let f = e_ce - e2;
        let g = (1.0 - e2).sqrt() * e_se;
        let ex = a * (f * cos_lv + g * sin_lv) / r;
        let ey = a * (f * sin_lv - g * cos_lv) / r;

        Self::new(a, ex, ey, hx, hy, lv, PositionAngle::True, frame, date, mu)
    }

    /// Same physical orbit expressed in another pseudo-inertial frame
    pub fn in_frame(&self, target: Frame) -> Result<Self, PropagationError> {
        if target == self.frame {
            return Ok(self.clone());
        }
        let (p, v) = self.pv();
        let (pt, vt) = self.frame.transform_pv(&target, &self.date, &p, &v);
        Self::from_pv(&pt, &vt, target, self.date, self.mu)
    }

    /// Elements vector with the longitude argument of the requested kind
    pub fn elements(&self, angle: PositionAngle) -> Vector6<f64> {
        Vector6::new(
            self.a,
            self.ex,
            self.ey,
            self.hx,
            self.hy,
            self.l(angle),
        )
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn ex(&self) -> f64 {
        self.ex
    }

    pub fn ey(&self) -> f64 {
        self.ey
    }

    pub fn hx(&self) -> f64 {
        self.hx
    }

    pub fn hy(&self) -> f64 {
        self.hy
    }

    pub fn lv(&self) -> f64 {
        self.lv
    }

    pub fn le(&self) -> f64 {
        true_to_eccentric(self.ex, self.ey, self.lv)
    }

    pub fn lm(&self) -> f64 {
        eccentric_to_mean(self.ex, self.ey, self.le())
    }

    pub fn l(&self, angle: PositionAngle) -> f64 {
        match angle {
            PositionAngle::True => self.lv,
            PositionAngle::Eccentric => self.le(),
            PositionAngle::Mean => self.lm(),
        }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn date(&self) -> Instant {
        self.date
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn e(&self) -> f64 {
        (self.ex * self.ex + self.ey * self.ey).sqrt()
    }

    pub fn i(&self) -> f64 {
        2.0 * (self.hx * self.hx + self.hy * self.hy).sqrt().atan()
    }

    /// Right ascension of the ascending node
    pub fn raan(&self) -> f64 {
        self.hy.atan2(self.hx)
    }

    pub fn perigee_argument(&self) -> f64 {
        self.ey.atan2(self.ex) - self.raan()
    }

    /// Anomaly of the requested kind
    pub fn anomaly(&self, angle: PositionAngle) -> f64 {
        normalize_angle(self.l(angle) - self.ey.atan2(self.ex), 0.0)
    }

    pub fn keplerian_mean_motion(&self) -> f64 {
        (self.mu / (self.a * self.a * self.a)).sqrt()
    }

    pub fn keplerian_period(&self) -> f64 {
        2.0 * PI / self.keplerian_mean_motion()
    }

    /// Cartesian position (m) and velocity (m/s) in the orbit frame
    pub fn pv(&self) -> (Vector3<f64>, Vector3<f64>) {
        let hx2 = self.hx * self.hx;
        let hy2 = self.hy * self.hy;
        let fact_h = 1.0 / (1.0 + hx2 + hy2);

        // Equinoctial reference frame axes
        let u = Vector3::new(
            (1.0 + hx2 - hy2) * fact_h,
            2.0 * self.hx * self.hy * fact_h,
            -2.0 * self.hy * fact_h,
        );
        let v = Vector3::new(
            2.0 * self.hx * self.hy * fact_h,
            (1.0 - hx2 + hy2) * fact_h,
            2.0 * self.hx * fact_h,
        );

        let le = self.le();
        let (ex, ey) = (self.ex, self.ey);
        let ex2 = ex * ex;
        let ey2 = ey * ey;
        let exey = ex * ey;
        let beta = 1.0 / (1.0 + (1.0 - ex2 - ey2).sqrt());
        let (sin_le, cos_le) = le.sin_cos();
        let ex_ce_ey_se = ex * cos_le + ey * sin_le;

        let x = self.a * ((1.0 - beta * ey2) * cos_le + beta * exey * sin_le - ex);
        let y = self.a * ((1.0 - beta * ex2) * sin_le + beta * exey * cos_le - ey);

        let factor = (self.mu / self.a).sqrt() / (1.0 - ex_ce_ey_se);
        let x_dot = factor * (-sin_le + beta * ey * ex_ce_ey_se);
        let y_dot = factor * (cos_le - beta * ex * ex_ce_ey_se);

        (x * u + y * v, x_dot * u + y_dot * v)
    }

    pub fn position(&self) -> Vector3<f64> {
        self.pv().0
    }

    /// Keplerian extrapolation by `dt` seconds
    pub fn shifted_by(&self, dt: f64) -> Self {
        let lm = self.lm() + self.keplerian_mean_motion() * dt;
        let le = mean_to_eccentric(self.ex, self.ey, lm);
        Self {
            lv: normalize_angle(eccentric_to_true(self.ex, self.ey, le), 0.0),
            date: self.date + Duration::from_seconds(dt),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MU: f64 = 3.986004415e14;

    fn epoch() -> Instant {
        Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap()
    }

    #[test]
    fn test_keplerian_round_trip_all_angle_types() {
        for angle in [PositionAngle::True, PositionAngle::Eccentric, PositionAngle::Mean] {
            let (a, e, i, pa, raan, anomaly) = (7.2e6, 0.05, 0.9, 1.1, 2.3, -0.7);
            let orbit =
                EquinoctialOrbit::from_keplerian(a, e, i, pa, raan, anomaly, angle, Frame::Eme2000, epoch(), MU)
                    .unwrap();

            assert_relative_eq!(orbit.a(), a, max_relative = 1e-12);
            assert_relative_eq!(orbit.e(), e, max_relative = 1e-12);
            assert_relative_eq!(orbit.i(), i, max_relative = 1e-12);
            assert_relative_eq!(orbit.raan(), raan, epsilon = 1e-12);
            assert_relative_eq!(normalize_angle(orbit.perigee_argument(), pa), pa, epsilon = 1e-12);
            assert_relative_eq!(orbit.anomaly(angle), anomaly, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_equinoctial_mean_longitude_round_trip() {
        let lm = 2.5;
        let orbit = EquinoctialOrbit::new(
            6.9e6, 0.01, -0.02, 0.3, -0.1, lm, PositionAngle::Mean, Frame::Gcrf, epoch(), MU,
        )
        .unwrap();
        assert_relative_eq!(orbit.lm(), lm, epsilon = 1e-12);
        assert_relative_eq!(orbit.ex(), 0.01, max_relative = 1e-12);
        assert_relative_eq!(orbit.hy(), -0.1, max_relative = 1e-12);
    }

    #[test]
    fn test_circular_elements_round_trip() {
        let (ex_c, ey_c, i, raan, alpha) = (1e-3, -2e-3, 1.2, 0.4, 3.0);
        let orbit = EquinoctialOrbit::from_circular(
            7.0e6, ex_c, ey_c, i, raan, alpha, PositionAngle::True, Frame::Eme2000, epoch(), MU,
        )
        .unwrap();

        let e = orbit.e();
        let pa = orbit.perigee_argument();
        assert_relative_eq!(e * pa.cos(), ex_c, max_relative = 1e-12);
        assert_relative_eq!(e * pa.sin(), ey_c, max_relative = 1e-12);
        assert_relative_eq!(orbit.i(), i, max_relative = 1e-12);
        assert_relative_eq!(normalize_angle(orbit.lv() - raan, alpha), alpha, epsilon = 1e-12);
    }

    #[test]
    fn test_cartesian_round_trip() {
        let p = Vector3::new(-2.5e6, 5.9e6, 2.7e6);
        let v = Vector3::new(-6200.0, -1700.0, 3300.0);
        let orbit = EquinoctialOrbit::from_pv(&p, &v, Frame::Gcrf, epoch(), MU).unwrap();
        let (p2, v2) = orbit.pv();
        assert!((p2 - p).norm() < 1e-6, "position error {}", (p2 - p).norm());
        assert!((v2 - v).norm() < 1e-9, "velocity error {}", (v2 - v).norm());
    }

    #[test]
    fn test_hyperbolic_rejected() {
        let result = EquinoctialOrbit::from_keplerian(
            7.0e6, 1.2, 0.5, 0.0, 0.0, 0.0, PositionAngle::True, Frame::Gcrf, epoch(), MU,
        );
        assert!(matches!(result, Err(PropagationError::ImpossibleOrbit(_))));

        let p = Vector3::new(7.0e6, 0.0, 0.0);
        let v = Vector3::new(0.0, 12_000.0, 0.0);
        assert!(EquinoctialOrbit::from_pv(&p, &v, Frame::Gcrf, epoch(), MU).is_err());
    }

    #[test]
    fn test_shift_by_one_period() {
        let orbit = EquinoctialOrbit::from_keplerian(
            8.0e6, 0.1, 0.5, 0.3, 0.2, 0.1, PositionAngle::True, Frame::Gcrf, epoch(), MU,
        )
        .unwrap();
        let shifted = orbit.shifted_by(orbit.keplerian_period());
        assert!((shifted.position() - orbit.position()).norm() < 1e-4);
        assert_relative_eq!(
            (shifted.date() - orbit.date()).as_seconds(),
            orbit.keplerian_period(),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_position_angle_parsing() {
        assert_eq!("MEAN".parse::<PositionAngle>().unwrap(), PositionAngle::Mean);
        assert_eq!("true".parse::<PositionAngle>().unwrap(), PositionAngle::True);
        assert!("PARABOLIC".parse::<PositionAngle>().is_err());
    }
}
