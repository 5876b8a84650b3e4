//! Adaptive Gauss–Kronrod quadrature.
//!
//! Each subinterval is integrated with the 15-point Kronrod rule; the embedded
//! 7-point Gauss rule provides the error estimate `|K15 - G7|`. The interval
//! with the largest error is bisected until the summed error meets
//! `max(epsabs, epsrel * |result|)` or the subinterval budget is exhausted.
//!
//! Nodes are only ever placed strictly inside `[a, b]` or at its midpoint, so an
//! integrand with a removable singularity at an endpoint is never sampled there.

use crate::error::AppError;

/// Kronrod abscissae on `[-1, 1]` (positive half, descending; last is the centre).
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

/// Kronrod weights matching `XGK`.
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for the nodes `XGK[1]`, `XGK[3]`, `XGK[5]` and the centre.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Tolerances and subdivision budget.
#[derive(Debug, Clone, Copy)]
pub struct QuadratureOptions {
    pub epsabs: f64,
    pub epsrel: f64,
    /// Maximum number of subintervals.
    pub limit: usize,
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        Self {
            epsabs: 1.49e-8,
            epsrel: 1.49e-8,
            limit: 50,
        }
    }
}

/// Integral value with its estimated absolute error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub value: f64,
    pub abs_error: f64,
    /// Number of subintervals in the final partition.
    pub intervals: usize,
}

impl Quadrature {
    pub fn zero() -> Self {
        Self {
            value: 0.0,
            abs_error: 0.0,
            intervals: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

fn kronrod_segment<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> Segment {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f(center);
    let mut res_k = fc * WGK[7];
    let mut res_g = fc * WG[3];
    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(center - dx) + f(center + dx);
        res_k += WGK[j] * pair;
        if j % 2 == 1 {
            res_g += WG[j / 2] * pair;
        }
    }

    Segment {
        a,
        b,
        value: res_k * half,
        error: ((res_k - res_g) * half).abs(),
    }
}

/// Integrate `f` over `[a, b]`.
///
/// Fails with `AppError::Numerical` for non-finite bounds, a non-finite
/// integrand sum, or when `opts.limit` subintervals do not reach the tolerance.
pub fn integrate<F>(f: F, a: f64, b: f64, opts: &QuadratureOptions) -> Result<Quadrature, AppError>
where
    F: Fn(f64) -> f64,
{
    if !(a.is_finite() && b.is_finite()) {
        return Err(AppError::Numerical(format!(
            "integration bounds must be finite, got [{a}, {b}]"
        )));
    }
    if a == b {
        return Ok(Quadrature::zero());
    }

    let limit = opts.limit.max(1);
    let mut segments = Vec::with_capacity(limit + 1);
    segments.push(kronrod_segment(&f, a, b));

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();

        if !(value.is_finite() && error.is_finite()) {
            return Err(AppError::Numerical(format!(
                "integrand produced a non-finite sum on [{a}, {b}]"
            )));
        }

        let tolerance = opts.epsabs.max(opts.epsrel * value.abs());
        if error <= tolerance {
            return Ok(Quadrature {
                value,
                abs_error: error,
                intervals: segments.len(),
            });
        }
        if segments.len() >= limit {
            return Err(AppError::Numerical(format!(
                "quadrature on [{a}, {b}] did not converge within {limit} subintervals \
                 (value={value:.6e}, error={error:.3e}, tolerance={tolerance:.3e})"
            )));
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.error.total_cmp(&y.1.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.a + seg.b);
        segments.push(kronrod_segment(&f, seg.a, mid));
        segments.push(kronrod_segment(&f, mid, seg.b));
    }
}
