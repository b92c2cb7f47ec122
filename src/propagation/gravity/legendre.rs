//! Associated Legendre functions scaled by u^m
//!
//! With t = sin φ and u = cos φ, the tables hold S_nm(t) = P_nm(t) / u^m and
//! dS_nm/dt. Dividing out u^m keeps the recursion polynomial in t, free of
//! the pole singularity, and lets the caller fold u^m into (x + iy)^m.
//!
//! Both the fully-normalized and the unnormalized families share one
//! three-term recursion, only the seed and coefficients differ:
//!
//! S_nm = α_nm·t·S_{n-1,m} − β_nm·S_{n-2,m}

use super::{triangular_index, Normalization};

/// Precomputed recursion coefficients up to a given degree and order
#[derive(Debug, Clone)]
pub struct LegendreRecursion {
    degree: usize,
    order: usize,
    alpha: Vec<f64>,
    beta: Vec<f64>,
    diagonal: Vec<f64>,
}

/// Values and t-derivatives of S_nm, in triangular (n, m) layout
#[derive(Debug, Clone)]
pub struct LegendreTable {
    pub values: Vec<f64>,
    pub derivatives: Vec<f64>,
}

impl LegendreTable {
    pub fn value(&self, n: usize, m: usize) -> f64 {
        self.values[triangular_index(n, m)]
    }

    pub fn derivative(&self, n: usize, m: usize) -> f64 {
        self.derivatives[triangular_index(n, m)]
    }
}

impl LegendreRecursion {
    pub fn new(degree: usize, order: usize, normalization: Normalization) -> Self {
        let order = order.min(degree);
        let size = triangular_index(degree, degree) + 1;
        let mut alpha = vec![0.0; size];
        let mut beta = vec![0.0; size];
        let mut diagonal = vec![0.0; order + 1];

        for m in 0..=order {
            diagonal[m] = match (normalization, m) {
                (_, 0) => 1.0,
                (Normalization::Normalized, 1) => 3.0_f64.sqrt(),
                (Normalization::Normalized, _) => {
                    ((2 * m + 1) as f64 / (2 * m) as f64).sqrt() * diagonal[m - 1]
                }
                // (2m - 1)!!
                (Normalization::Unnormalized, _) => (2 * m - 1) as f64 * diagonal[m - 1],
            };

            for n in (m + 1)..=degree {
                let (nf, mf) = (n as f64, m as f64);
                let index = triangular_index(n, m);
                match normalization {
                    Normalization::Normalized => {
                        alpha[index] =
                            ((2.0 * nf - 1.0) * (2.0 * nf + 1.0) / ((nf - mf) * (nf + mf))).sqrt();
                        if n >= m + 2 {
                            beta[index] = ((2.0 * nf + 1.0) * (nf + mf - 1.0) * (nf - mf - 1.0)
                                / ((nf - mf) * (nf + mf) * (2.0 * nf - 3.0)))
                                .sqrt();
                        }
                    }
                    Normalization::Unnormalized => {
                        alpha[index] = (2.0 * nf - 1.0) / (nf - mf);
                        if n >= m + 2 {
                            beta[index] = (nf + mf - 1.0) / (nf - mf);
                        }
                    }
                }
            }
        }

        Self {
            degree,
            order,
            alpha,
            beta,
            diagonal,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Evaluate the table at t = sin(latitude)
    pub fn evaluate(&self, t: f64) -> LegendreTable {
        let size = triangular_index(self.degree, self.degree) + 1;
        let mut values = vec![0.0; size];
        let mut derivatives = vec![0.0; size];

        for m in 0..=self.order {
            values[triangular_index(m, m)] = self.diagonal[m];
            for n in (m + 1)..=self.degree {
                let index = triangular_index(n, m);
                let previous = triangular_index(n - 1, m);
                let (before_value, before_derivative) = if n >= m + 2 {
                    let before = triangular_index(n - 2, m);
                    (values[before], derivatives[before])
                } else {
                    (0.0, 0.0)
                };
                values[index] = self.alpha[index] * t * values[previous] - self.beta[index] * before_value;
                derivatives[index] = self.alpha[index] * (values[previous] + t * derivatives[previous])
                    - self.beta[index] * before_derivative;
            }
        }

        LegendreTable {
            values,
            derivatives,
        }
    }
}
