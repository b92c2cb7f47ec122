//! Gauss variational equations in equinoctial elements
//!
//! Rates of (a, ex, ey, hx, hy, λ) under a perturbing acceleration, split
//! along the radial (R), transverse (S) and normal (W) directions. The
//! longitude row may be expressed for any [`PositionAngle`]; the Keplerian
//! motion itself is added separately with [`keplerian_rate`].

use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
use nalgebra::{Vector3, Vector6};

/// Rate of the longitude argument due to the central attraction alone
pub fn keplerian_rate(orbit: &EquinoctialOrbit, angle: PositionAngle) -> f64 {
    let n = orbit.keplerian_mean_motion();
    match angle {
        PositionAngle::Mean => n,
        PositionAngle::Eccentric => {
            let le = orbit.le();
            n / (1.0 - orbit.ex() * le.cos() - orbit.ey() * le.sin())
        }
        PositionAngle::True => {
            let (sin_lv, cos_lv) = orbit.lv().sin_cos();
            let one_minus_e2 = 1.0 - orbit.ex() * orbit.ex() - orbit.ey() * orbit.ey();
            let ksi = 1.0 + orbit.ex() * cos_lv + orbit.ey() * sin_lv;
            n * ksi * ksi / (one_minus_e2 * one_minus_e2.sqrt())
        }
    }
}

/// Perturbation rates of the six elements for an acceleration in the orbit frame
pub fn element_rates(
    orbit: &EquinoctialOrbit,
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    acceleration: &Vector3<f64>,
    angle: PositionAngle,
) -> Vector6<f64> {
    let mu = orbit.mu();
    let (a, ex, ey, hx, hy) = (orbit.a(), orbit.ex(), orbit.ey(), orbit.hx(), orbit.hy());

    // Local orbital frame
    let radial = position.normalize();
    let normal = position.cross(velocity).normalize();
    let transverse = normal.cross(&radial);
    let fr = acceleration.dot(&radial);
    let ft = acceleration.dot(&transverse);
    let fn_ = acceleration.dot(&normal);

    let e2 = ex * ex + ey * ey;
    let sq = (a * (1.0 - e2) / mu).sqrt();
    let (sin_l, cos_l) = orbit.lv().sin_cos();
    let w = 1.0 + ex * cos_l + ey * sin_l;
    let s2 = 1.0 + hx * hx + hy * hy;
    let h_term = hx * sin_l - hy * cos_l;

    let da = 2.0 * a * a * velocity.dot(acceleration) / mu;
    let dex = sq * (fr * sin_l + ((w + 1.0) * cos_l + ex) * ft / w - h_term * ey * fn_ / w);
    let dey = sq * (-fr * cos_l + ((w + 1.0) * sin_l + ey) * ft / w + h_term * ex * fn_ / w);
    let dhx = sq * s2 * cos_l / (2.0 * w) * fn_;
    let dhy = sq * s2 * sin_l / (2.0 * w) * fn_;
    let dlv = sq * h_term * fn_ / w;

    let dl = match angle {
        PositionAngle::True => dlv,
        PositionAngle::Eccentric | PositionAngle::Mean => {
            let partials = LongitudePartials::new(ex, ey, orbit.le());
            match angle {
                PositionAngle::Eccentric => {
                    partials.de_dlv * dlv + partials.de_dex * dex + partials.de_dey * dey
                }
                _ => partials.dm_dlv * dlv + partials.dm_dex * dex + partials.dm_dey * dey,
            }
        }
    };

    Vector6::new(da, dex, dey, dhx, dhy, dl)
}

/// Partial derivatives of λE and λM with respect to (ex, ey, λv)
struct LongitudePartials {
    de_dex: f64,
    de_dey: f64,
    de_dlv: f64,
    dm_dex: f64,
    dm_dey: f64,
    dm_dlv: f64,
}

impl LongitudePartials {
    fn new(ex: f64, ey: f64, le: f64) -> Self {
        let (s_e, c_e) = le.sin_cos();
        let beta0 = (1.0 - ex * ex - ey * ey).sqrt();
        let beta = 1.0 / (1.0 + beta0);
        let bx = beta * beta * ex / beta0;
        let by = beta * beta * ey / beta0;
        let d = 1.0 - ex * c_e - ey * s_e;

        // In-plane coordinates over a and their derivatives at fixed λE
        let x1 = (1.0 - beta * ey * ey) * c_e + beta * ex * ey * s_e - ex;
        let y1 = (1.0 - beta * ex * ex) * s_e + beta * ex * ey * c_e - ey;
        let x1x = -bx * ey * ey * c_e + (bx * ex * ey + beta * ey) * s_e - 1.0;
        let y1x = -(bx * ex * ex + 2.0 * beta * ex) * s_e + (bx * ex * ey + beta * ey) * c_e;
        let x1y = -(by * ey * ey + 2.0 * beta * ey) * c_e + (by * ex * ey + beta * ex) * s_e;
        let y1y = -by * ex * ex * s_e + (by * ex * ey + beta * ex) * c_e - 1.0;

        // λv is the polar angle of (x1, y1), held fixed
        let de_dex = -(x1 * y1x - y1 * x1x) / (d * beta0);
        let de_dey = -(x1 * y1y - y1 * x1y) / (d * beta0);

        Self {
            de_dex,
            de_dey,
            de_dlv: d / beta0,
            dm_dex: -s_e + d * de_dex,
            dm_dey: c_e + d * de_dey,
            dm_dlv: d * d / beta0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::frames::Frame;
    use satkit::Instant;

    const MU: f64 = 3.986004415e14;

    fn orbit() -> EquinoctialOrbit {
        let epoch = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        EquinoctialOrbit::from_keplerian(
            7.1e6, 0.08, 0.9, 0.4, 1.3, 0.8, PositionAngle::True, Frame::Eme2000, epoch, MU,
        )
        .unwrap()
    }

    /// Central difference of the elements under a velocity impulse `acc * dt`
    fn finite_difference(orbit: &EquinoctialOrbit, acc: &Vector3<f64>, angle: PositionAngle) -> Vector6<f64> {
        let (p, v) = orbit.pv();
        let dt = 1e-2;
        let plus = EquinoctialOrbit::from_pv(&p, &(v + acc * dt), orbit.frame(), orbit.date(), MU).unwrap();
        let minus = EquinoctialOrbit::from_pv(&p, &(v - acc * dt), orbit.frame(), orbit.date(), MU).unwrap();
        (plus.elements(angle) - minus.elements(angle)) / (2.0 * dt)
    }

    #[test]
    fn test_rates_match_finite_differences() {
        let orbit = orbit();
        let (p, v) = orbit.pv();
        let acc = Vector3::new(0.3, -0.5, 0.2);

        for angle in [PositionAngle::True, PositionAngle::Eccentric, PositionAngle::Mean] {
            let analytic = element_rates(&orbit, &p, &v, &acc, angle);
            let numeric = finite_difference(&orbit, &acc, angle);

            assert!(
                (analytic[0] - numeric[0]).abs() < 1e-6 * numeric[0].abs(),
                "da/dt {} vs {}",
                analytic[0],
                numeric[0]
            );
            for i in 1..6 {
                assert!(
                    (analytic[i] - numeric[i]).abs() < 1e-10,
                    "{:?} element {}: {} vs {}",
                    angle,
                    i,
                    analytic[i],
                    numeric[i]
                );
            }
        }
    }

    #[test]
    fn test_keplerian_rates_consistent() {
        // dλM/dt = n and dλv/dt · ∂λM/∂λv = n
        let orbit = orbit();
        let partials = LongitudePartials::new(orbit.ex(), orbit.ey(), orbit.le());
        let n = orbit.keplerian_mean_motion();
        let lv_rate = keplerian_rate(&orbit, PositionAngle::True);
        assert!((lv_rate * partials.dm_dlv - n).abs() < 1e-15);
        let le_rate = keplerian_rate(&orbit, PositionAngle::Eccentric);
        assert!((lv_rate * partials.de_dlv - le_rate).abs() < 1e-15);
    }
}
