//! Numerical integrators for orbit propagation
//!
//! Both propagators integrate a six-component element vector over elapsed
//! seconds from the initial date. Integrators are hot-swappable behind the
//! [`Integrator`] trait.
//!
//! # Available Integrators
//!
//! - **ClassicalRungeKutta**: fixed-step RK4
//! - **DormandPrince853**: adaptive embedded RK 8(5,3) with per-component tolerances
//!
//! Each accepted step is reported to an observer as a [`StepInterval`]
//! carrying both ends and their derivatives, enough for cubic Hermite
//! interpolation inside the step.

use crate::error::{PropagationError, Result};
use crate::propagation::orbit::{EquinoctialOrbit, PositionAngle};
use nalgebra::{Vector3, Vector6};

/// State derivative callback: (elapsed seconds, state) → rates
pub type Equations<'a> = dyn FnMut(f64, &Vector6<f64>) -> Result<Vector6<f64>> + 'a;

/// Accepted-step callback
pub type StepObserver<'a> = dyn FnMut(&StepInterval) -> Result<()> + 'a;

/// Largest number of accepted steps before giving up
const MAX_STEPS: usize = 5_000_000;

/// One accepted integration step
#[derive(Debug, Clone)]
pub struct StepInterval {
    pub t0: f64,
    pub y0: Vector6<f64>,
    pub f0: Vector6<f64>,
    pub t1: f64,
    pub y1: Vector6<f64>,
    pub f1: Vector6<f64>,
}

impl StepInterval {
    /// Cubic Hermite interpolation at `t` within the step
    pub fn interpolate(&self, t: f64) -> Vector6<f64> {
        let h = self.t1 - self.t0;
        if h == 0.0 {
            return self.y1;
        }
        let theta = (t - self.t0) / h;
        let theta2 = theta * theta;
        let theta3 = theta2 * theta;
        let h00 = 2.0 * theta3 - 3.0 * theta2 + 1.0;
        let h10 = theta3 - 2.0 * theta2 + theta;
        let h01 = -2.0 * theta3 + 3.0 * theta2;
        let h11 = theta3 - theta2;
        self.y0 * h00 + self.f0 * (h10 * h) + self.y1 * h01 + self.f1 * (h11 * h)
    }
}

/// Trait for numerical integrators
///
/// Implementations must be `Send + Sync` so a configured propagator can be
/// shared across threads.
pub trait Integrator: Send + Sync {
    /// Integrate from `t0` to `t_end` (forward only), returning the final state
    fn integrate(
        &self,
        equations: &mut Equations<'_>,
        t0: f64,
        y0: &Vector6<f64>,
        t_end: f64,
        observer: &mut StepObserver<'_>,
    ) -> Result<Vector6<f64>>;

    /// Integrator name
    fn name(&self) -> &'static str;

    /// Integrator order
    fn order(&self) -> u8;

    /// Number of function evaluations per step
    fn stages(&self) -> usize;
}

fn check_finite(t: f64, y: &Vector6<f64>) -> Result<()> {
    if y.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PropagationError::NonFinite { t }.into())
    }
}

/// Classical fourth-order Runge-Kutta with a fixed step
#[derive(Debug, Clone)]
pub struct ClassicalRungeKutta {
    /// Step size (seconds)
    pub step: f64,
}

impl ClassicalRungeKutta {
    pub fn new(step: f64) -> Self {
        Self { step }
    }
}

impl Integrator for ClassicalRungeKutta {
    fn integrate(
        &self,
        equations: &mut Equations<'_>,
        t0: f64,
        y0: &Vector6<f64>,
        t_end: f64,
        observer: &mut StepObserver<'_>,
    ) -> Result<Vector6<f64>> {
        if t_end < t0 {
            return Err(PropagationError::BackwardPropagation(t_end - t0).into());
        }

        let mut t = t0;
        let mut y = *y0;
        let mut f = equations(t, &y)?;
        let mut steps = 0;

        while t < t_end {
            // Last step lands exactly on the target
            let last = t + self.step >= t_end;
            let h = if last { t_end - t } else { self.step };

            let k1 = f;
            let k2 = equations(t + 0.5 * h, &(y + k1 * (0.5 * h)))?;
            let k3 = equations(t + 0.5 * h, &(y + k2 * (0.5 * h)))?;
            let k4 = equations(t + h, &(y + k3 * h))?;
            let y_new = y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
            let t_new = if last { t_end } else { t + h };
            check_finite(t_new, &y_new)?;

            let f_new = equations(t_new, &y_new)?;
            observer(&StepInterval {
                t0: t,
                y0: y,
                f0: f,
                t1: t_new,
                y1: y_new,
                f1: f_new,
            })?;

            t = t_new;
            y = y_new;
            f = f_new;

            steps += 1;
            if steps > MAX_STEPS {
                return Err(PropagationError::TooManySteps(MAX_STEPS).into());
            }
        }

        Ok(y)
    }

    fn name(&self) -> &'static str {
        "Classical Runge-Kutta (fixed step)"
    }

    fn order(&self) -> u8 {
        4
    }

    fn stages(&self) -> usize {
        4
    }
}

/// Dormand-Prince 8(5,3) with adaptive step size control
#[derive(Debug, Clone)]
pub struct DormandPrince853 {
    /// Minimum allowed step size (seconds)
    pub min_step: f64,

    /// Maximum allowed step size (seconds)
    pub max_step: f64,

    /// Absolute tolerance per component
    pub abs_tol: Vector6<f64>,

    /// Relative tolerance per component
    pub rel_tol: Vector6<f64>,

    /// Safety factor for step size adjustment
    pub safety: f64,

    /// Minimum step reduction factor
    pub min_reduction: f64,

    /// Maximum step growth factor
    pub max_growth: f64,
}

const C: [f64; 12] = [
    0.0,
    0.052_600_151_958_767_731_878_558_754_448_8,
    0.078_900_227_938_151_597_817_838_131_673_2,
    0.118_350_341_907_227_396_726_757_197_510,
    0.281_649_658_092_772_603_273_242_802_490,
    1.0 / 3.0,
    0.25,
    0.307_692_307_692_307_692_307_692_307_692,
    0.651_282_051_282_051_282_051_282_051_282,
    0.6,
    0.857_142_857_142_857_142_857_142_857_142,
    1.0,
];

#[rustfmt::skip]
const A: [[f64; 11]; 12] = [
    [0.0; 11],
    [5.260_015_195_876_773_187_855_875_444_88e-2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.972_505_698_453_789_945_445_953_291_83e-2, 5.917_517_095_361_369_836_337_859_875_49e-2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [2.958_758_547_680_684_918_168_929_937_75e-2, 0.0, 8.876_275_643_042_054_754_506_789_813_24e-2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [2.413_651_341_592_666_855_023_697_986_65e-1, 0.0, -8.845_494_793_282_860_853_448_649_627_17e-1, 9.248_340_032_617_920_031_157_379_665_43e-1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.703_703_703_703_703_703_703_703_703_7e-2, 0.0, 0.0, 1.708_286_087_294_738_712_796_044_821_73e-1, 1.254_676_875_668_224_250_166_918_141_23e-1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.710_937_5e-2, 0.0, 0.0, 1.702_522_110_195_440_393_149_780_602_72e-1, 6.021_653_898_045_596_068_502_193_972_83e-2, -1.757_812_5e-2, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.709_200_011_850_479_271_087_793_198_36e-2, 0.0, 0.0, 1.703_839_257_122_399_938_102_140_547_05e-1, 1.072_620_304_463_732_846_518_091_991_68e-1, -1.531_943_774_862_440_175_279_361_582_36e-2, 8.273_789_163_814_022_887_584_737_660_02e-3, 0.0, 0.0, 0.0, 0.0],
    [6.241_109_587_160_757_171_144_295_778_12e-1, 0.0, 0.0, -3.360_892_629_446_941_294_068_571_098_25, -8.682_193_468_417_260_068_181_898_914_53e-1, 2.759_209_969_944_670_830_494_156_007_97e1, 2.015_406_755_047_789_340_861_867_889_79e1, -4.348_988_418_106_995_884_773_662_551_44e1, 0.0, 0.0, 0.0],
    [4.776_625_364_382_643_658_904_339_085_27e-1, 0.0, 0.0, -2.488_114_619_971_667_641_926_425_864_68, -5.902_908_268_368_429_963_714_464_757_43e-1, 2.123_005_144_818_119_423_472_889_498_97e1, 1.527_923_363_288_242_358_325_969_229_38e1, -3.328_821_096_898_486_291_944_532_655_87e1, -2.033_120_170_850_862_613_582_229_285_93e-2, 0.0, 0.0],
    [-9.371_424_300_859_873_257_170_402_165_8e-1, 0.0, 0.0, 5.186_372_428_844_063_708_300_238_532_09, 1.091_437_348_996_729_578_185_002_546_54, -8.149_787_010_746_926_125_139_972_673_57, -1.852_006_565_999_695_986_415_661_807_01e1, 2.273_948_709_935_050_428_189_700_567_34e1, 2.493_605_552_679_652_389_870_893_967_62, -3.046_764_471_898_219_500_382_366_902_2, 0.0],
    [2.273_310_147_516_538_207_923_597_684_49, 0.0, 0.0, -1.053_449_546_673_725_019_840_666_898_79e1, -2.000_872_058_224_862_499_096_757_184_44, -1.795_893_186_311_879_891_727_659_505_34e1, 2.794_888_452_941_996_005_084_998_088_37e1, -2.858_998_277_135_023_694_740_655_086_74, -8.872_856_933_530_629_544_335_492_892_58, 1.236_056_717_579_430_306_472_662_015_28e1, 6.433_927_460_157_635_303_559_704_840_46e-1],
];

const B: [f64; 12] = [
    5.429_373_411_656_876_223_805_357_663_63e-2,
    0.0,
    0.0,
    0.0,
    0.0,
    4.450_312_892_752_408_881_441_139_505_66,
    1.891_517_899_314_500_383_042_815_990_44,
    -5.801_203_960_010_584_781_467_211_422_7,
    3.111_643_669_578_198_944_089_160_623_7e-1,
    -1.521_609_496_625_160_785_561_788_068_05e-1,
    2.013_654_008_040_303_483_747_765_375_01e-1,
    4.471_061_572_777_259_051_768_855_690_43e-2,
];

/// Fifth-order error coefficients
const E1: [f64; 12] = [
    0.131_200_449_941_948_807_325_010_299_6e-1,
    0.0,
    0.0,
    0.0,
    0.0,
    -0.122_515_644_637_620_444_072_056_975_3e1,
    -0.495_758_949_657_250_191_521_407_995_2,
    0.166_437_718_245_498_653_696_153_041_5e1,
    -0.350_328_848_749_973_681_688_648_729_0,
    0.334_179_118_713_017_479_029_731_884_1,
    0.819_232_064_851_157_124_657_074_261_3e-1,
    -0.223_553_078_638_862_952_588_442_784_5e-1,
];

/// Third-order error coefficients (b minus the embedded weights)
const E2: [f64; 12] = [
    B[0] - 0.244_094_488_188_976_377_952_755_905_512,
    0.0,
    0.0,
    0.0,
    0.0,
    B[5],
    B[6],
    B[7],
    B[8] - 0.733_846_688_281_611_857_341_361_741_547,
    B[9],
    B[10],
    B[11] - 0.022_058_823_529_411_764_705_882_352_941_2,
];

impl DormandPrince853 {
    pub fn new(min_step: f64, max_step: f64, abs_tol: Vector6<f64>, rel_tol: Vector6<f64>) -> Self {
        Self {
            min_step,
            max_step,
            abs_tol,
            rel_tol,
            safety: 0.9,
            min_reduction: 0.2,
            max_growth: 10.0,
        }
    }

    /// Scaled error norm of a trial step (≤ 1 means accept)
    fn estimate_error(&self, k: &[Vector6<f64>; 12], y0: &Vector6<f64>, y1: &Vector6<f64>, h: f64) -> f64 {
        let mut error1 = 0.0;
        let mut error2 = 0.0;
        for j in 0..6 {
            let tol = self.abs_tol[j] + self.rel_tol[j] * y0[j].abs().max(y1[j].abs());
            let mut err1 = 0.0;
            let mut err2 = 0.0;
            for s in 0..12 {
                err1 += E1[s] * k[s][j];
                err2 += E2[s] * k[s][j];
            }
            error1 += (err1 / tol).powi(2);
            error2 += (err2 / tol).powi(2);
        }

        let mut den = error1 + 0.01 * error2;
        if den <= 0.0 {
            den = 1.0;
        }
        h.abs() * error1 / (6.0 * den).sqrt()
    }

    /// Hairer's starting step heuristic
    fn initial_step(
        &self,
        equations: &mut Equations<'_>,
        t0: f64,
        y0: &Vector6<f64>,
        f0: &Vector6<f64>,
    ) -> Result<f64> {
        let scale = self.abs_tol + self.rel_tol.component_mul(&y0.abs());
        let y_on_scale2: f64 = y0.component_div(&scale).norm_squared();
        let ydot_on_scale2: f64 = f0.component_div(&scale).norm_squared();

        let mut h = if y_on_scale2 < 1e-10 || ydot_on_scale2 < 1e-10 {
            1e-6
        } else {
            0.01 * (y_on_scale2 / ydot_on_scale2).sqrt()
        };

        let y1 = y0 + f0 * h;
        let f1 = equations(t0 + h, &y1)?;
        let yddot_on_scale = (f1 - f0).component_div(&scale).norm() / h;

        let max_inv2 = ydot_on_scale2.sqrt().max(yddot_on_scale);
        let h1 = if max_inv2 < 1e-15 {
            (0.001 * h).max(1e-6)
        } else {
            (0.01 / max_inv2).powf(1.0 / 8.0)
        };
        h = (100.0 * h).min(h1);
        h = h.max(1e-12 * t0.abs());

        Ok(h.clamp(self.min_step, self.max_step))
    }
}

impl Integrator for DormandPrince853 {
    fn integrate(
        &self,
        equations: &mut Equations<'_>,
        t0: f64,
        y0: &Vector6<f64>,
        t_end: f64,
        observer: &mut StepObserver<'_>,
    ) -> Result<Vector6<f64>> {
        if t_end < t0 {
            return Err(PropagationError::BackwardPropagation(t_end - t0).into());
        }
        if t_end == t0 {
            return Ok(*y0);
        }

        let mut t = t0;
        let mut y = *y0;
        let mut f = equations(t, &y)?;
        let mut h = self.initial_step(equations, t, &y, &f)?;
        let mut k = [Vector6::zeros(); 12];
        let mut steps = 0;

        loop {
            let last = t + h >= t_end;
            let h_step = if last { t_end - t } else { h };

            k[0] = f;
            for s in 1..12 {
                let mut ys = y;
                for j in 0..s {
                    if A[s][j] != 0.0 {
                        ys += k[j] * (h_step * A[s][j]);
                    }
                }
                k[s] = equations(t + C[s] * h_step, &ys)?;
            }

            let mut y_new = y;
            for s in 0..12 {
                if B[s] != 0.0 {
                    y_new += k[s] * (h_step * B[s]);
                }
            }

            let error = self.estimate_error(&k, &y, &y_new, h_step);

            if error <= 1.0 {
                let t_new = if last { t_end } else { t + h_step };
                check_finite(t_new, &y_new)?;
                let f_new = equations(t_new, &y_new)?;
                observer(&StepInterval {
                    t0: t,
                    y0: y,
                    f0: f,
                    t1: t_new,
                    y1: y_new,
                    f1: f_new,
                })?;

                if last {
                    log::debug!("{}: {} steps", self.name(), steps + 1);
                    return Ok(y_new);
                }

                t = t_new;
                y = y_new;
                f = f_new;

                let factor = if error == 0.0 {
                    self.max_growth
                } else {
                    (self.safety * error.powf(-1.0 / 8.0)).clamp(self.min_reduction, self.max_growth)
                };
                h = (h_step * factor).clamp(self.min_step, self.max_step);

                steps += 1;
                if steps > MAX_STEPS {
                    return Err(PropagationError::TooManySteps(MAX_STEPS).into());
                }
            } else {
                let factor =
                    (self.safety * error.powf(-1.0 / 8.0)).clamp(self.min_reduction, 1.0);
                let needed = h_step * factor;
                if needed < self.min_step {
                    return Err(PropagationError::StepSizeUnderflow {
                        t,
                        min_step: self.min_step,
                        needed,
                    }
                    .into());
                }
                h = needed;
            }
        }
    }

    fn name(&self) -> &'static str {
        "Dormand-Prince 8(5,3)"
    }

    fn order(&self) -> u8 {
        8
    }

    fn stages(&self) -> usize {
        12
    }
}

/// Absolute and relative tolerances for a given position error
///
/// The position error `dp` (m) is mapped through the Jacobian of the
/// equinoctial elements with respect to Cartesian coordinates, with a
/// velocity error `dv = μ·dp / (v·r²)`. The relative tolerance is `dp / r`
/// for every component.
pub fn tolerances(
    dp: f64,
    orbit: &EquinoctialOrbit,
    angle: PositionAngle,
) -> std::result::Result<(Vector6<f64>, Vector6<f64>), PropagationError> {
    let (p, v) = orbit.pv();
    let r = p.norm();
    let dv = orbit.mu() * dp / (v.norm() * r * r);

    let mut abs_tol = Vector6::zeros();
    for j in 0..6 {
        let column = cartesian_partial(orbit, &p, &v, j, angle)?;
        let error = if j < 3 { dp } else { dv };
        abs_tol += column.abs() * error;
    }

    Ok((abs_tol, Vector6::repeat(dp / r)))
}

/// Central difference of the elements with respect to Cartesian component `j`
fn cartesian_partial(
    orbit: &EquinoctialOrbit,
    p: &Vector3<f64>,
    v: &Vector3<f64>,
    j: usize,
    angle: PositionAngle,
) -> std::result::Result<Vector6<f64>, PropagationError> {
    let delta = if j < 3 { 1e-6 * p.norm() } else { 1e-6 * v.norm() };
    let shifted = |sign: f64| {
        let mut p = *p;
        let mut v = *v;
        if j < 3 {
            p[j] += sign * delta;
        } else {
            v[j - 3] += sign * delta;
        }
        EquinoctialOrbit::from_pv(&p, &v, orbit.frame(), orbit.date(), orbit.mu())
    };

    let plus = shifted(1.0)?.elements(angle);
    let minus = shifted(-1.0)?.elements(angle);
    let mut column = (plus - minus) / (2.0 * delta);
    // Keep the longitude difference on the same branch
    let dl = crate::propagation::orbit::normalize_angle(plus[5] - minus[5], 0.0);
    column[5] = dl / (2.0 * delta);
    Ok(column)
}
