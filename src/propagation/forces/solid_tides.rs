//! Solid Earth tides
//!
//! Frequency-independent step of the IERS 2010 conventions (section 6.2.1):
//! each tide-raising body perturbs the degree 2 and 3 coefficients through
//! the nominal Love numbers, and degree 2 leaks into degree 4 through k⁽⁺⁾.
//! The perturbed coefficients are evaluated as a small normalized field in
//! the central body frame.
//!
//! The Love numbers are the IERS 2010 ones whatever conventions the body
//! frame was built with. The frequency-dependent corrections (step 2) and
//! the pole tide are not modelled.

use super::ForceModel;
use crate::error::Result;
use crate::propagation::bodies::BodyEphemeris;
use crate::propagation::frames::Frame;
use crate::propagation::gravity::{
    HarmonicCoefficients, HarmonicsEvaluator, LegendreRecursion, Normalization, TideSystem,
};
use crate::propagation::state::SpacecraftState;
use nalgebra::Vector3;

/// Nominal degree 2 Love numbers (real, imaginary) for m = 0, 1, 2
const K2: [(f64, f64); 3] = [(0.301_90, 0.0), (0.298_30, -0.001_44), (0.301_02, -0.001_30)];

/// Nominal degree 3 Love numbers for m = 0..3
const K3: [f64; 4] = [0.093, 0.093, 0.093, 0.094];

/// Degree 2 → 4 coupling Love numbers for m = 0, 1, 2
const K2_PLUS: [f64; 3] = [-0.000_89, -0.000_80, -0.000_57];

/// Permanent tide amplitude A0·H0 removed from ΔC20 for zero-tide fields
const PERMANENT_TIDE: f64 = 4.4228e-8 * -0.314_60;

/// Solid tides raised by a set of bodies
#[derive(Debug, Clone)]
pub struct SolidTides {
    body_frame: Frame,
    bodies: Vec<BodyEphemeris>,
    mu: f64,
    ae: f64,
    tide_system: TideSystem,
    evaluator: HarmonicsEvaluator,
    legendre: LegendreRecursion,
}

impl SolidTides {
    pub fn new(
        body_frame: Frame,
        ae: f64,
        mu: f64,
        tide_system: TideSystem,
        bodies: Vec<BodyEphemeris>,
    ) -> Self {
        if tide_system == TideSystem::Unknown {
            log::warn!("Gravity field tide system is unknown, assuming {}", TideSystem::TideFree);
        }
        Self {
            body_frame,
            bodies,
            mu,
            ae,
            tide_system,
            evaluator: HarmonicsEvaluator::from_coefficients(
                mu,
                ae,
                HarmonicCoefficients::zeros(4, 3),
                Normalization::Normalized,
            ),
            legendre: LegendreRecursion::new(3, 3, Normalization::Normalized),
        }
    }

    pub fn bodies(&self) -> &[BodyEphemeris] {
        &self.bodies
    }

    /// Normalized coefficient corrections at `date`
    pub fn coefficient_corrections(&self, date: &satkit::Instant) -> Result<HarmonicCoefficients> {
        let mut delta = HarmonicCoefficients::zeros(4, 3);

        for body in &self.bodies {
            let s = body.position(date, &self.body_frame)?;
            let r = s.norm();
            let ratio = body.gm() / self.mu;
            let rho = self.ae / r;
            let table = self.legendre.evaluate(s.z / r);

            // ((x + iy)/r)^m carries the cos^m φ factor missing from the table
            let (qx, qy) = (s.x / r, s.y / r);
            let mut powers = [(1.0, 0.0); 4];
            for m in 1..4 {
                let (re, im) = powers[m - 1];
                powers[m] = (re * qx - im * qy, re * qy + im * qx);
            }

            for n in 2..=3 {
                let amplitude = ratio * rho.powi(n as i32 + 1) / (2 * n + 1) as f64;
                for m in 0..=n {
                    let (kr, ki) = if n == 2 { K2[m] } else { (K3[m], 0.0) };
                    let value = table.value(n, m);
                    let x = amplitude * value * powers[m].0;
                    let y = amplitude * value * powers[m].1;
                    delta.add(n, m, kr * x + ki * y, kr * y - ki * x);

                    // Same 1/5 factor as degree 2
                    if n == 2 {
                        delta.add(4, m, K2_PLUS[m] * x, K2_PLUS[m] * y);
                    }
                }
            }
        }

        if self.tide_system == TideSystem::ZeroTide {
            delta.add(2, 0, -PERMANENT_TIDE * K2[0].0, 0.0);
        }

        Ok(delta)
    }
}

impl ForceModel for SolidTides {
    fn acceleration(
        &self,
        state: &SpacecraftState,
        position: &Vector3<f64>,
        _velocity: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        let date = state.date();
        let delta = self.coefficient_corrections(&date)?;
        let to_body = state.orbit.frame().rotation_to(&self.body_frame, &date);
        let gradient = self.evaluator.gradient_with(&delta, &(to_body * position));
        Ok(to_body.inverse() * gradient)
    }

    fn name(&self) -> &'static str {
        "Solid tides"
    }

    fn description(&self) -> String {
        let names: Vec<&str> = self.bodies.iter().map(|b| b.body().name()).collect();
        format!(
            "Solid tides from [{}] (IERS 2010 Love numbers, {} field, ae = {} m)",
            names.join(", "),
            self.tide_system,
            self.ae
        )
    }

    fn mu(&self) -> Option<f64> {
        Some(self.mu)
    }
}
