//! Spherical-harmonics gravity field
//!
//! A [`SphericalHarmonicsProvider`] carries μ, the reference radius, the tide
//! system and a triangular table of (C, S) coefficients, either fully
//! normalized or unnormalized. One source field yields both flavours:
//!
//! - **Normalized**: consumed by the Holmes-Featherstone numerical attraction
//! - **Unnormalized**: consumed by the DSST zonal and tesseral contributions
//!
//! Conversion uses C_nm = N_nm·C̄_nm with
//! N_nm = sqrt((2 − δ_0m)(2n + 1)(n − m)! / (n + m)!).

mod harmonics;
mod legendre;

pub use harmonics::HarmonicsEvaluator;
pub use legendre::{LegendreRecursion, LegendreTable};

use crate::error::DataError;
use std::fmt;

/// Position of (n, m) in a lower-triangular table
pub fn triangular_index(n: usize, m: usize) -> usize {
    n * (n + 1) / 2 + m
}

/// Coefficient normalization convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    Normalized,
    Unnormalized,
}

/// Permanent tide convention of the C20 coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TideSystem {
    TideFree,
    ZeroTide,
    Unknown,
}

impl TideSystem {
    pub fn from_icgem(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tide_free" => Self::TideFree,
            "zero_tide" => Self::ZeroTide,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TideSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TideFree => "TIDE_FREE",
            Self::ZeroTide => "ZERO_TIDE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Lower-triangular (C, S) table, column m ≤ order
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicCoefficients {
    degree: usize,
    order: usize,
    c: Vec<f64>,
    s: Vec<f64>,
}

impl HarmonicCoefficients {
    pub fn zeros(degree: usize, order: usize) -> Self {
        let size = triangular_index(degree, degree) + 1;
        Self {
            degree,
            order: order.min(degree),
            c: vec![0.0; size],
            s: vec![0.0; size],
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn c(&self, n: usize, m: usize) -> f64 {
        if n > self.degree || m > self.order.min(n) {
            return 0.0;
        }
        self.c[triangular_index(n, m)]
    }

    pub fn s(&self, n: usize, m: usize) -> f64 {
        if n > self.degree || m > self.order.min(n) {
            return 0.0;
        }
        self.s[triangular_index(n, m)]
    }

    /// Store a coefficient pair; entries beyond degree or order are dropped
    pub fn set(&mut self, n: usize, m: usize, c: f64, s: f64) {
        if n <= self.degree && m <= self.order.min(n) {
            let index = triangular_index(n, m);
            self.c[index] = c;
            self.s[index] = s;
        }
    }

    pub fn add(&mut self, n: usize, m: usize, dc: f64, ds: f64) {
        if n <= self.degree && m <= self.order.min(n) {
            let index = triangular_index(n, m);
            self.c[index] += dc;
            self.s[index] += ds;
        }
    }
}

/// Gravity field model
#[derive(Debug, Clone)]
pub struct SphericalHarmonicsProvider {
    pub mu: f64,
    pub ae: f64,
    pub tide_system: TideSystem,
    pub normalization: Normalization,
    pub coefficients: HarmonicCoefficients,
}

/// EIGEN-5C central attraction coefficient (m³/s²)
pub const EIGEN5C_MU: f64 = 3.986_004_415e14;

/// EIGEN-5C reference radius (m)
pub const EIGEN5C_AE: f64 = 6_378_136.46;

/// EIGEN-5C unnormalized zonal coefficients C20..C60 (tide free)
const EIGEN5C_ZONALS: [f64; 5] = [
    -1.082_626_683_553_15e-3,
    2.532_656_485_332_24e-6,
    1.619_621_591_367e-6,
    2.272_960_828_686_98e-7,
    -5.406_812_391_070_85e-7,
];

impl SphericalHarmonicsProvider {
    /// Low-degree zonal field available without data files
    pub fn builtin_eigen5c() -> Self {
        let mut coefficients = HarmonicCoefficients::zeros(6, 0);
        coefficients.set(0, 0, 1.0, 0.0);
        for (k, c) in EIGEN5C_ZONALS.iter().enumerate() {
            let n = k + 2;
            coefficients.set(n, 0, c / ((2 * n + 1) as f64).sqrt(), 0.0);
        }
        Self {
            mu: EIGEN5C_MU,
            ae: EIGEN5C_AE,
            tide_system: TideSystem::TideFree,
            normalization: Normalization::Normalized,
            coefficients,
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.degree()
    }

    pub fn order(&self) -> usize {
        self.coefficients.order()
    }

    /// Restrict to (degree, order), failing when the source is too small
    pub fn truncated(&self, degree: usize, order: usize) -> Result<Self, DataError> {
        if degree > self.degree() {
            return Err(DataError::TooLargeDegree {
                requested: degree,
                available: self.degree(),
            });
        }
        if order > self.order() {
            return Err(DataError::TooLargeOrder {
                requested: order,
                available: self.order(),
            });
        }

        let mut coefficients = HarmonicCoefficients::zeros(degree, order);
        for n in 0..=degree {
            for m in 0..=order.min(n) {
                coefficients.set(n, m, self.coefficients.c(n, m), self.coefficients.s(n, m));
            }
        }
        Ok(Self {
            coefficients,
            ..self.clone()
        })
    }

    /// Same field in the requested normalization
    pub fn with_normalization(&self, normalization: Normalization) -> Self {
        if normalization == self.normalization {
            return self.clone();
        }
        let mut coefficients = HarmonicCoefficients::zeros(self.degree(), self.order());
        for n in 0..=self.degree() {
            for m in 0..=self.order().min(n) {
                let factor = match normalization {
                    Normalization::Unnormalized => normalization_factor(n, m),
                    Normalization::Normalized => 1.0 / normalization_factor(n, m),
                };
                coefficients.set(
                    n,
                    m,
                    self.coefficients.c(n, m) * factor,
                    self.coefficients.s(n, m) * factor,
                );
            }
        }
        Self {
            normalization,
            coefficients,
            ..self.clone()
        }
    }

    /// Unnormalized J2 = −C20
    pub fn j2(&self) -> f64 {
        let c20 = self.coefficients.c(2, 0);
        match self.normalization {
            Normalization::Normalized => -c20 * normalization_factor(2, 0),
            Normalization::Unnormalized => -c20,
        }
    }
}

/// N_nm = sqrt((2 − δ_0m)(2n + 1)(n − m)! / (n + m)!)
pub fn normalization_factor(n: usize, m: usize) -> f64 {
    let delta = if m == 0 { 1.0 } else { 2.0 };
    let log_ratio = ln_factorial(n - m) - ln_factorial(n + m);
    (delta * (2 * n + 1) as f64 * log_ratio.exp()).sqrt()
}

fn ln_factorial(k: usize) -> f64 {
    (2..=k).map(|i| (i as f64).ln()).sum()
}
