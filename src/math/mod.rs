//! Numerical primitives shared across the crate: standard normal
//! distribution helpers and the scalar abstraction that lets model and
//! payoff code run over plain `f64` or tape-recorded [`aad::Number`]s.

pub mod aad;
pub mod scalar;

pub use scalar::Scalar;

/// Standard normal density.
#[inline]
pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution.
#[inline]
pub fn normal_cdf(x: f64) -> f64 {
    // Abramowitz & Stegun 7.1.26
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * z);
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782
                + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let approx = 1.0 - normal_pdf(z) * poly;
    if x >= 0.0 { approx } else { 1.0 - approx }
}

/// Inverse standard normal CDF (Acklam's rational approximation).
///
/// Max absolute error around 1.15e-9, adequate for mapping low-discrepancy
/// and pseudo-random uniforms to Gaussian draws.
pub fn normal_inv_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        C[0].mul_add(q, C[1])
            .mul_add(q, C[2])
            .mul_add(q, C[3])
            .mul_add(q, C[4])
            .mul_add(q, C[5])
            / D[0].mul_add(q, D[1]).mul_add(q, D[2]).mul_add(q, D[3]).mul_add(q, 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        A[0].mul_add(r, A[1])
            .mul_add(r, A[2])
            .mul_add(r, A[3])
            .mul_add(r, A[4])
            .mul_add(r, A[5])
            * q
            / B[0].mul_add(r, B[1]).mul_add(r, B[2]).mul_add(r, B[3]).mul_add(r, B[4]).mul_add(r, 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(C[0].mul_add(q, C[1])
            .mul_add(q, C[2])
            .mul_add(q, C[3])
            .mul_add(q, C[4])
            .mul_add(q, C[5])
            / D[0].mul_add(q, D[1]).mul_add(q, D[2]).mul_add(q, D[3]).mul_add(q, 1.0))
    }
}
