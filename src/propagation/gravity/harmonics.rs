//! Gradient of the non-central geopotential
//!
//! Sums degrees n ≥ 2 in the body frame using the u^m-scaled Legendre
//! tables, written in terms of ρ = a_e/r and q/r = (x + iy)/r so that no
//! power of r overflows at high degree:
//!
//! U_nm = (μ/r)·ρⁿ·S_nm(t)·Re[(C_nm − i·S_nm)·(q/r)^m]
//!
//! The central μ/r term is left to the Newtonian attraction.

use super::{HarmonicCoefficients, LegendreRecursion, SphericalHarmonicsProvider};
use nalgebra::Vector3;

/// Evaluates the acceleration of a truncated field
#[derive(Debug, Clone)]
pub struct HarmonicsEvaluator {
    mu: f64,
    ae: f64,
    coefficients: HarmonicCoefficients,
    recursion: LegendreRecursion,
    min_order: usize,
    max_order: usize,
}

impl HarmonicsEvaluator {
    pub fn new(provider: &SphericalHarmonicsProvider) -> Self {
        Self::from_coefficients(
            provider.mu,
            provider.ae,
            provider.coefficients.clone(),
            provider.normalization,
        )
    }

    pub fn from_coefficients(
        mu: f64,
        ae: f64,
        coefficients: HarmonicCoefficients,
        normalization: super::Normalization,
    ) -> Self {
        let recursion = LegendreRecursion::new(coefficients.degree(), coefficients.order(), normalization);
        Self {
            mu,
            ae,
            max_order: coefficients.order(),
            min_order: 0,
            coefficients,
            recursion,
        }
    }

    /// Restrict the sum to orders in [min_order, max_order]
    pub fn with_orders(mut self, min_order: usize, max_order: usize) -> Self {
        self.min_order = min_order;
        self.max_order = max_order.min(self.coefficients.order());
        self
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Acceleration (m/s²) at a body-frame position
    pub fn gradient(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.gradient_with(&self.coefficients, position)
    }

    /// Acceleration using another coefficient table of the same shape
    pub fn gradient_with(&self, coefficients: &HarmonicCoefficients, position: &Vector3<f64>) -> Vector3<f64> {
        let degree = self.recursion.degree();
        if degree < 2 || self.min_order > self.max_order {
            return Vector3::zeros();
        }

        let (x, y, z) = (position.x, position.y, position.z);
        let r2 = position.norm_squared();
        let r = r2.sqrt();
        let t = z / r;
        let rho = self.ae / r;
        let table = self.recursion.evaluate(t);

        // (q/r)^m as (re, im)
        let (qx, qy) = (x / r, y / r);
        let mut q_powers = Vec::with_capacity(self.max_order + 1);
        q_powers.push((1.0, 0.0));
        for m in 1..=self.max_order {
            let (re, im) = q_powers[m - 1];
            q_powers.push((re * qx - im * qy, re * qy + im * qx));
        }

        let mut g = Vector3::zeros();
        let mut rho_n = rho;
        for n in 2..=degree {
            rho_n *= rho;
            let factor = self.mu / r * rho_n;
            let mut gx = 0.0;
            let mut gy = 0.0;
            let mut gz = 0.0;

            for m in self.min_order..=self.max_order.min(n) {
                let c = coefficients.c(n, m);
                let s = coefficients.s(n, m);
                if c == 0.0 && s == 0.0 {
                    continue;
                }
                let value = table.value(n, m);
                let derivative = table.derivative(n, m);

                let (re, im) = q_powers[m];
                let a = c * re + s * im;
                let (b_re, b_im) = if m > 0 {
                    let (re1, im1) = q_powers[m - 1];
                    let scale = m as f64 / r;
                    (scale * (c * re1 + s * im1), scale * (c * im1 - s * re1))
                } else {
                    (0.0, 0.0)
                };

                let k = (n + m + 1) as f64;
                let radial = -(k * value + t * derivative) * a / r2;
                gx += radial * x + value * b_re;
                gy += radial * y - value * b_im;
                gz += radial * z + derivative * a / r;
            }

            g += Vector3::new(gx, gy, gz) * factor;
        }

        g
    }

    /// Non-central potential (m²/s²), used by the tests as a gradient reference
    #[cfg(test)]
    fn potential(&self, position: &Vector3<f64>) -> f64 {
        let r = position.norm();
        let t = position.z / r;
        let rho = self.ae / r;
        let table = self.recursion.evaluate(t);
        let (qx, qy) = (position.x / r, position.y / r);
        let mut u = 0.0;
        for n in 2..=self.recursion.degree() {
            for m in self.min_order..=self.max_order.min(n) {
                let (mut re, mut im) = (1.0, 0.0);
                for _ in 0..m {
                    let next = (re * qx - im * qy, re * qy + im * qx);
                    re = next.0;
                    im = next.1;
                }
                let a = self.coefficients.c(n, m) * re + self.coefficients.s(n, m) * im;
                u += self.mu / r * rho.powi(n as i32) * table.value(n, m) * a;
            }
        }
        u
    }
}
