//! Tesseral harmonics contribution
//!
//! Tesseral terms depend on both the mean longitude λM and the Earth
//! rotation angle Θ through the phases j·λM − m·Θ. Pairs whose period
//! 2π/|j·n − m·ω_E| exceeds [`MIN_RESONANT_PERIOD`] are resonant and feed
//! the mean rates; every other pair is a short-periodic term.
//!
//! Resonant pairs are grouped by primitive direction (j₀, m₀). Averaging
//! the rates along the line (λ̄ + m₀·s, Θ + j₀·s) keeps exactly the terms
//! that are multiples of that direction. Short periodics come from a 2D
//! discrete Fourier transform over a grid of (λM, Θ).

use super::gaussian::at_mean_longitude;
use super::short_periodics::FourierTerm;
use super::{earth_angle, DsstForceModel};
use crate::error::Result;
use crate::propagation::frames::Frame;
use crate::propagation::gauss;
use crate::propagation::gravity::{HarmonicsEvaluator, Normalization, SphericalHarmonicsProvider};
use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
use crate::propagation::state::{SpacecraftState, JULIAN_DAY};
use nalgebra::{Rotation3, UnitQuaternion, Vector3, Vector6};
use std::f64::consts::PI;

/// Shortest period of a resonant term (s)
pub const MIN_RESONANT_PERIOD: f64 = 10.0 * JULIAN_DAY;

/// Highest |j| of the short-periodic expansion
const MAX_SP_HARMONIC: usize = 12;

/// Highest order m of the short-periodic expansion
const MAX_SP_ORDER: usize = 8;

/// Tesseral terms (m ≥ 1) of a gravity field
#[derive(Debug, Clone)]
pub struct DsstTesseral {
    body_frame: Frame,
    rotation_rate: f64,
    mu: f64,
    degree: usize,
    order: usize,
    /// All orders, for the resonant averages
    evaluator: HarmonicsEvaluator,
    /// Orders up to MAX_SP_ORDER, for the short periodics
    short_evaluator: HarmonicsEvaluator,
    resonant: Vec<(i32, i32)>,
    families: Vec<(i32, i32)>,
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

fn is_resonant_frequency(omega: f64) -> bool {
    omega.abs() < 2.0 * PI / MIN_RESONANT_PERIOD
}

impl DsstTesseral {
    /// Resonances are selected once, from the mean motion of `reference`
    pub fn new(
        body_frame: Frame,
        rotation_rate: f64,
        provider: &SphericalHarmonicsProvider,
        reference: &EquinoctialOrbit,
    ) -> Result<Self> {
        let degree = provider.degree();
        let order = provider.order();
        let normalized = provider.with_normalization(Normalization::Normalized);
        let short_order = order.min(MAX_SP_ORDER);
        let short_field = normalized.truncated(degree, short_order)?;

        let n = reference.keplerian_mean_motion();
        let max_j = degree as i32 + 2;
        let mut resonant = Vec::new();
        for m in 1..=order as i32 {
            for j in 1..=max_j {
                if is_resonant_frequency(j as f64 * n - m as f64 * rotation_rate) {
                    resonant.push((j, m));
                }
            }
        }
        let mut families: Vec<(i32, i32)> = resonant
            .iter()
            .map(|&(j, m)| {
                let g = gcd(j, m);
                (j / g, m / g)
            })
            .collect();
        families.sort_unstable();
        families.dedup();

        if !resonant.is_empty() {
            log::debug!(
                "Tesseral resonances {:?} grouped in directions {:?}",
                resonant,
                families
            );
        }

        Ok(Self {
            body_frame,
            rotation_rate,
            mu: provider.mu,
            degree,
            order,
            evaluator: HarmonicsEvaluator::new(&normalized).with_orders(1, order),
            short_evaluator: HarmonicsEvaluator::new(&short_field).with_orders(1, short_order),
            resonant,
            families,
        })
    }

    pub fn resonant_pairs(&self) -> &[(i32, i32)] {
        &self.resonant
    }

    pub fn resonant_families(&self) -> &[(i32, i32)] {
        &self.families
    }

    /// Gradient at a body-frame position with the body turned `delta` further
    fn rotated_gradient(evaluator: &HarmonicsEvaluator, body_position: &Vector3<f64>, delta: f64) -> Vector3<f64> {
        let turn = Rotation3::from_axis_angle(&Vector3::z_axis(), delta);
        let g = evaluator.gradient(&(turn.inverse() * body_position));
        turn * g
    }

    fn rotations(&self, mean: &SpacecraftState) -> (UnitQuaternion<f64>, UnitQuaternion<f64>) {
        let to_body = mean.orbit.frame().rotation_to(&self.body_frame, &mean.date());
        (to_body, to_body.inverse())
    }

    fn max_sp_harmonic(&self) -> usize {
        (self.degree + 2).min(MAX_SP_HARMONIC)
    }

    fn short_order(&self) -> usize {
        self.order.min(MAX_SP_ORDER)
    }
}

impl DsstForceModel for DsstTesseral {
    fn name(&self) -> &'static str {
        "DSST tesseral"
    }

    fn description(&self) -> String {
        format!(
            "DSST tesseral (degree {}, order {}, {}, {} resonant directions)",
            self.degree,
            self.order,
            self.body_frame,
            self.families.len()
        )
    }

    fn mu(&self) -> Option<f64> {
        Some(self.mu)
    }

    fn mean_rates(&self, mean: &SpacecraftState) -> Result<Vector6<f64>> {
        let mut rates = Vector6::zeros();
        if self.families.is_empty() || self.degree < 2 {
            return Ok(rates);
        }
        let (to_body, from_body) = self.rotations(mean);
        let lambda = mean.orbit.lm();
        let max_j = self.degree as i32 + 2;

        for &(j0, m0) in &self.families {
            let count = (2 * (max_j * m0 + self.order as i32 * j0) + 1) as usize;
            let mut sum = Vector6::zeros();
            for k in 0..count {
                let s = 2.0 * PI * k as f64 / count as f64;
                let state = at_mean_longitude(mean, lambda + m0 as f64 * s)?;
                let (p, v) = state.orbit.pv();
                let g = Self::rotated_gradient(&self.evaluator, &(to_body * p), j0 as f64 * s);
                sum += gauss::element_rates(&state.orbit, &p, &v, &(from_body * g), PositionAngle::Mean);
            }
            rates += sum / count as f64;
        }
        Ok(rates)
    }

    fn short_periodic_terms(&self, mean: &SpacecraftState) -> Result<Vec<FourierTerm>> {
        let short_order = self.short_order();
        if short_order == 0 || self.degree < 2 {
            return Ok(Vec::new());
        }
        let (to_body, from_body) = self.rotations(mean);
        let theta = earth_angle(&mean.date());
        let max_j = self.max_sp_harmonic();
        let n_lambda = 2 * max_j + 1;
        let n_theta = 2 * short_order + 1;

        // rates[p][q] at λ_p = 2πp/Nλ and Θ_q = Θ + 2πq/Nθ
        let mut rates = Vec::with_capacity(n_lambda);
        for p in 0..n_lambda {
            let state = at_mean_longitude(mean, 2.0 * PI * p as f64 / n_lambda as f64)?;
            let (position, velocity) = state.orbit.pv();
            let body = to_body * position;
            let row: Vec<Vector6<f64>> = (0..n_theta)
                .map(|q| {
                    let delta = 2.0 * PI * q as f64 / n_theta as f64;
                    let g = from_body * Self::rotated_gradient(&self.short_evaluator, &body, delta);
                    gauss::element_rates(&state.orbit, &position, &velocity, &g, PositionAngle::Mean)
                })
                .collect();
            rates.push(row);
        }

        let a = mean.orbit.a();
        let n = (self.mu / (a * a * a)).sqrt();
        let scale = 2.0 / (n_lambda * n_theta) as f64;
        let mut terms = Vec::new();
        for m in 1..=short_order as i32 {
            for j in -(max_j as i32)..=(max_j as i32) {
                let omega = j as f64 * n - m as f64 * self.rotation_rate;
                if self.resonant.contains(&(j, m)) || is_resonant_frequency(omega) {
                    continue;
                }
                let mut c = Vector6::zeros();
                let mut s = Vector6::zeros();
                for (p, row) in rates.iter().enumerate() {
                    let lambda = 2.0 * PI * p as f64 / n_lambda as f64;
                    for (q, rate) in row.iter().enumerate() {
                        let angle = theta + 2.0 * PI * q as f64 / n_theta as f64;
                        let (sin, cos) = (j as f64 * lambda - m as f64 * angle).sin_cos();
                        c += rate * cos;
                        s += rate * sin;
                    }
                }
                terms.push(FourierTerm::from_rate(j, m, &(c * scale), &(s * scale), omega, a, n));
            }
        }
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::gravity::{HarmonicCoefficients, TideSystem, EIGEN5C_AE, EIGEN5C_MU};
    use crate::propagation::state::WGS84_EARTH_ANGULAR_VELOCITY;
    use satkit::Instant;

    /// J2 plus the sectorial C22/S22 pair (normalized)
    fn c22_field() -> SphericalHarmonicsProvider {
        let mut coefficients = HarmonicCoefficients::zeros(2, 2);
        coefficients.set(0, 0, 1.0, 0.0);
        coefficients.set(2, 0, -4.841_65e-4, 0.0);
        coefficients.set(2, 2, 2.439_38e-6, -1.400_27e-6);
        SphericalHarmonicsProvider {
            mu: EIGEN5C_MU,
            ae: EIGEN5C_AE,
            tide_system: TideSystem::TideFree,
            normalization: Normalization::Normalized,
            coefficients,
        }
    }

    fn state(a: f64) -> SpacecraftState {
        let epoch = Instant::from_datetime(2023, 1, 1, 0, 0, 0.0).unwrap();
        let orbit = EquinoctialOrbit::from_keplerian(
            a,
            1e-4,
            0.1_f64.to_radians(),
            0.0,
            0.0,
            1.0,
            PositionAngle::Mean,
            Frame::Gcrf,
            epoch,
            EIGEN5C_MU,
        )
        .unwrap();
        SpacecraftState::with_default_mass(orbit)
    }

    fn tesseral(state: &SpacecraftState) -> DsstTesseral {
        DsstTesseral::new(
            Frame::Gtod { conventions: None },
            WGS84_EARTH_ANGULAR_VELOCITY,
            &c22_field(),
            &state.orbit,
        )
        .unwrap()
    }

    #[test]
    fn test_geostationary_resonance() {
        let geo = state(42_164_170.0);
        let model = tesseral(&geo);
        assert_eq!(model.resonant_pairs(), &[(1, 1), (2, 2)]);
        assert_eq!(model.resonant_families(), &[(1, 1)]);

        // The sectorial term pulls on a geostationary orbit
        let rates = model.mean_rates(&geo).unwrap();
        assert!(rates[0].abs() > 1e-9, "da/dt {}", rates[0]);
        assert!(rates.iter().all(|x| x.is_finite()));

        // and the resonant pair is not a short periodic
        let terms = model.short_periodic_terms(&geo).unwrap();
        assert!(terms.iter().all(|t| (t.j, t.m) != (1, 1) && (t.j, t.m) != (2, 2)));
    }

    #[test]
    fn test_low_orbit_has_no_resonance() {
        let leo = state(7_000_000.0);
        let model = tesseral(&leo);
        assert!(model.resonant_families().is_empty());
        assert_eq!(model.mean_rates(&leo).unwrap(), Vector6::zeros());

        let terms = model.short_periodic_terms(&leo).unwrap();
        assert_eq!(terms.len(), 2 * (2 * 4 + 1));
        let largest = terms
            .iter()
            .map(|t| (t.cos[0].powi(2) + t.sin[0].powi(2)).sqrt())
            .fold(0.0, f64::max);
        assert!(largest > 1.0 && largest < 1_000.0, "largest a amplitude {} m", largest);
    }

    #[test]
    fn test_zonal_only_field_is_inert() {
        let leo = state(7_000_000.0);
        let field = SphericalHarmonicsProvider::builtin_eigen5c();
        let model = DsstTesseral::new(Frame::Gcrf, WGS84_EARTH_ANGULAR_VELOCITY, &field, &leo.orbit).unwrap();
        assert_eq!(model.mean_rates(&leo).unwrap(), Vector6::zeros());
        assert!(model.short_periodic_terms(&leo).unwrap().is_empty());
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(4, 6), 2);
        assert_eq!(gcd(1, 15), 1);
        assert_eq!(gcd(7, 7), 7);
    }
}
