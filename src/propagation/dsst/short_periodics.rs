//! Short-periodic terms and their interpolation
//!
//! A contribution describes the oscillation of the osculating elements
//! around the mean ones as a sum of [`FourierTerm`]s in the phase
//! φ = j·λM − m·Θ, with Θ the Earth rotation angle. Coefficients come from
//! integrating the Fourier expansion of the element rates over φ:
//!
//! η = ∫ (C cos φ + S sin φ) dt = (C sin φ − S cos φ) / ω,   ω = dφ/dt
//!
//! The semi-major axis oscillation also feeds the mean longitude through
//! the Keplerian mean motion n(a), giving the extra term
//! (3n / 2a)·(C_a cos φ + S_a sin φ) / ω².

use nalgebra::Vector6;
use std::f64::consts::PI;

/// One harmonic of the short-periodic variations
#[derive(Debug, Clone, PartialEq)]
pub struct FourierTerm {
    pub j: i32,
    pub m: i32,
    pub cos: Vector6<f64>,
    pub sin: Vector6<f64>,
}

impl FourierTerm {
    /// Integrate a rate harmonic C cos φ + S sin φ of frequency `omega`
    ///
    /// `a` and `n` are the mean semi-major axis and mean motion.
    pub fn from_rate(j: i32, m: i32, c: &Vector6<f64>, s: &Vector6<f64>, omega: f64, a: f64, n: f64) -> Self {
        let mut cos = -s / omega;
        let mut sin = c / omega;
        let coupling = 1.5 * n / (a * omega * omega);
        cos[5] += coupling * c[0];
        sin[5] += coupling * s[0];
        Self { j, m, cos, sin }
    }

    pub fn phase(&self, lambda: f64, theta: f64) -> f64 {
        self.j as f64 * lambda - self.m as f64 * theta
    }

    pub fn value(&self, lambda: f64, theta: f64) -> Vector6<f64> {
        let (s, c) = self.phase(lambda, theta).sin_cos();
        self.cos * c + self.sin * s
    }
}

/// Sum of a set of terms at mean longitude `lambda` and Earth angle `theta`
pub fn sum_terms(terms: &[FourierTerm], lambda: f64, theta: f64) -> Vector6<f64> {
    terms
        .iter()
        .fold(Vector6::zeros(), |acc, term| acc + term.value(lambda, theta))
}

/// Truncated real Fourier series of equally spaced samples over one period
#[derive(Debug, Clone)]
pub struct FourierSeries {
    pub mean: Vector6<f64>,
    /// (C_j, S_j) for j = 1..=max_harmonic
    pub harmonics: Vec<(Vector6<f64>, Vector6<f64>)>,
}

impl FourierSeries {
    /// Samples are taken at angles 2πk/N, k = 0..N
    pub fn from_samples(samples: &[Vector6<f64>], max_harmonic: usize) -> Self {
        let count = samples.len();
        if count == 0 {
            return Self {
                mean: Vector6::zeros(),
                harmonics: Vec::new(),
            };
        }
        let n = count as f64;
        let mean = samples.iter().fold(Vector6::zeros(), |acc, s| acc + s) / n;

        // Keep below the Nyquist limit
        let max_harmonic = max_harmonic.min((count - 1) / 2);
        let harmonics = (1..=max_harmonic)
            .map(|j| {
                let mut c = Vector6::zeros();
                let mut s = Vector6::zeros();
                for (k, sample) in samples.iter().enumerate() {
                    let (sin, cos) = (2.0 * PI * (j * k) as f64 / n).sin_cos();
                    c += sample * cos;
                    s += sample * sin;
                }
                (c * (2.0 / n), s * (2.0 / n))
            })
            .collect();

        Self { mean, harmonics }
    }

    /// Short-periodic terms of a rate series in the mean longitude alone
    pub fn integrate(&self, a: f64, n: f64) -> Vec<FourierTerm> {
        self.harmonics
            .iter()
            .enumerate()
            .map(|(index, (c, s))| {
                let j = index as i32 + 1;
                FourierTerm::from_rate(j, 0, c, s, j as f64 * n, a, n)
            })
            .collect()
    }
}

/// Interpolation grid over one integration step
///
/// Nodes are equally spaced with at most `max_gap` seconds between them,
/// and never fewer than three.
#[derive(Debug, Clone)]
pub struct InterpolationGrid {
    nodes: Vec<f64>,
}

/// Nodes used by each Lagrange interpolation
const WINDOW: usize = 3;

impl InterpolationGrid {
    pub fn new(t0: f64, t1: f64, max_gap: f64) -> Self {
        let span = t1 - t0;
        let points = if max_gap > 0.0 {
            ((span.abs() / max_gap).ceil() as usize + 1).max(WINDOW)
        } else {
            WINDOW
        };
        let nodes = (0..points)
            .map(|k| t0 + span * k as f64 / (points - 1) as f64)
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// The three consecutive nodes closest to `t`
    pub fn window(&self, t: f64) -> &[f64] {
        let last_start = self.nodes.len().saturating_sub(WINDOW);
        let nearest = self
            .nodes
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - t).abs().total_cmp(&(b.1 - t).abs()))
            .map(|(k, _)| k)
            .unwrap_or(0);
        let start = nearest.saturating_sub(1).min(last_start);
        &self.nodes[start..(start + WINDOW).min(self.nodes.len())]
    }
}

/// Lagrange polynomial through (nodes[k], values[k]) evaluated at `t`
pub fn lagrange(nodes: &[f64], values: &[Vector6<f64>], t: f64) -> Vector6<f64> {
    let mut result = Vector6::zeros();
    for (k, value) in values.iter().enumerate() {
        let weight = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != k)
            .fold(1.0, |w, (_, ti)| w * (t - ti) / (nodes[k] - ti));
        result += value * weight;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourier_series_recovers_harmonics() {
        let n = 32;
        let samples: Vec<Vector6<f64>> = (0..n)
            .map(|k| {
                let x = 2.0 * PI * k as f64 / n as f64;
                Vector6::repeat(0.5 + 2.0 * (3.0 * x).cos() - 0.25 * x.sin())
            })
            .collect();
        let series = FourierSeries::from_samples(&samples, 8);

        assert!((series.mean[0] - 0.5).abs() < 1e-14);
        assert!((series.harmonics[2].0[0] - 2.0).abs() < 1e-13);
        assert!((series.harmonics[0].1[0] + 0.25).abs() < 1e-13);
        assert!(series.harmonics[1].0[0].abs() < 1e-13);
    }

    #[test]
    fn test_integrated_term_differentiates_back() {
        let c = Vector6::new(2.0, 1e-6, -3e-6, 0.0, 1e-7, 4e-6);
        let s = Vector6::new(-1.0, 0.0, 2e-6, 5e-8, 0.0, -1e-6);
        let (a, n, omega) = (7.0e6, 1.08e-3, 2.0 * 1.08e-3);
        let term = FourierTerm::from_rate(2, 0, &c, &s, omega, a, n);

        // dη/dt = rate, with the longitude also driven by −3n/(2a)·η_a
        let phi = 0.37;
        let h = 1e-4;
        let eta = |phi: f64| term.value(phi / 2.0, 0.0);
        let d_eta = (eta(phi + h) - eta(phi - h)) / (2.0 * h) * omega;
        let (sin, cos) = phi.sin_cos();
        let rate = c * cos + s * sin;
        for k in 0..5 {
            assert!((d_eta[k] - rate[k]).abs() < 1e-8 * rate[k].abs().max(1e-6), "k = {}", k);
        }
        let expected_lambda = rate[5] - 1.5 * n / a * eta(phi)[0];
        assert!((d_eta[5] - expected_lambda).abs() < 1e-12);
    }

    #[test]
    fn test_grid_spacing() {
        let grid = InterpolationGrid::new(0.0, 300.0, 86_400.0);
        assert_eq!(grid.nodes(), &[0.0, 150.0, 300.0]);

        let grid = InterpolationGrid::new(0.0, 200_000.0, 86_400.0);
        assert_eq!(grid.nodes().len(), 4);
        assert_eq!(grid.window(199_000.0).len(), 3);
        assert_eq!(*grid.window(199_000.0).last().unwrap(), 200_000.0);
        assert_eq!(grid.window(0.0)[0], 0.0);
    }

    #[test]
    fn test_lagrange_is_exact_on_quadratics() {
        let nodes = [0.0, 1.0, 3.0];
        let f = |t: f64| Vector6::repeat(2.0 - t + 0.5 * t * t);
        let values: Vec<_> = nodes.iter().map(|t| f(*t)).collect();
        let v = lagrange(&nodes, &values, 2.2);
        assert!((v - f(2.2)).amax() < 1e-12);
    }
}
