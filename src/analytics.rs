//! Closed-form reference prices: Bachelier, Black–Scholes, Merton.
//!
//! Zero-rate conventions throughout, matching the models in
//! [`crate::models`]. Generic over [`Scalar`] so the formulas can also be
//! evaluated onto the tape when cross-checking recorded derivatives against
//! their analytic counterparts.

use crate::math::{normal_pdf, Scalar};

const EPS: f64 = 1.0e-12;

/// Bachelier (normal model) call price, undiscounted.
pub fn bachelier<T: Scalar>(spot: T, strike: f64, vol: T, mat: f64) -> T {
    let std = vol * mat.sqrt();
    if std.value() < EPS {
        return (spot - strike).positive_part();
    }
    let d = (spot - strike) / std;
    (spot - strike) * d.normal_cdf() + std * d.normal_pdf()
}

/// Bachelier vega.
pub fn bachelier_vega(spot: f64, strike: f64, vol: f64, mat: f64) -> f64 {
    let std = vol * mat.sqrt();
    if std < EPS {
        return 0.0;
    }
    let d = (spot - strike) / std;
    mat.sqrt() * normal_pdf(d)
}

/// Black–Scholes call price, undiscounted, zero rates.
pub fn black_scholes<T: Scalar>(spot: T, strike: f64, vol: T, mat: f64) -> T {
    let std = vol * mat.sqrt();
    if std.value() <= EPS {
        return (spot - strike).positive_part();
    }
    let d2 = (spot / strike).ln() / std - std * 0.5;
    let d1 = d2 + std;
    spot * d1.normal_cdf() - d2.normal_cdf() * strike
}

/// Black–Scholes vega.
pub fn black_scholes_vega(spot: f64, strike: f64, vol: f64, mat: f64) -> f64 {
    let smat = mat.sqrt();
    let std = vol * smat;
    if std < EPS {
        return 0.0;
    }
    let d2 = (spot / strike).ln() / std - 0.5 * std;
    strike * smat * normal_pdf(d2)
}

/// Black–Scholes implied volatility by bisection.
pub fn black_scholes_ivol(spot: f64, strike: f64, premium: f64, mat: f64) -> f64 {
    if premium <= (spot - strike).max(0.0) + EPS {
        return 0.0;
    }

    let mut upper = 0.5;
    while black_scholes(spot, strike, upper, mat) < premium {
        upper *= 2.0;
    }
    let mut lower = 0.05;
    while black_scholes(spot, strike, lower, mat) > premium {
        lower /= 2.0;
    }

    let mut price_upper = black_scholes(spot, strike, upper, mat);
    let mut price_lower = black_scholes(spot, strike, lower, mat);
    while upper - lower > 1.0e-12 {
        let mid = 0.5 * (upper + lower);
        let price = black_scholes(spot, strike, mid, mat);
        if price > premium {
            upper = mid;
            price_upper = price;
        } else {
            lower = mid;
            price_lower = price;
        }
    }

    lower + (premium - price_lower) / (price_upper - price_lower) * (upper - lower)
}

/// Merton jump-diffusion call price: Poisson-weighted Black–Scholes series,
/// truncated at ten jumps.
pub fn merton<T: Scalar>(
    spot: T,
    strike: f64,
    vol: T,
    mat: f64,
    intensity: f64,
    mean_jump: f64,
    std_jump: f64,
) -> T {
    let var_jump = std_jump * std_jump;
    let mv2 = mean_jump + 0.5 * var_jump;
    let compensator = intensity * (mv2.exp() - 1.0);
    let intensity_t = intensity * mat;

    let mut factorial = 1.0;
    let mut intensity_pow = 1.0;
    let mut result = T::constant(0.0);
    for n in 0..10 {
        let shifted_spot = spot * ((n as f64) * mv2 - compensator * mat).exp();
        let effective_vol = (vol * vol + var_jump * (n as f64) / mat).sqrt();
        let prob = (-intensity_t).exp() * intensity_pow / factorial;
        result += black_scholes(shifted_spot, strike, effective_vol, mat) * prob;
        factorial *= (n + 1) as f64;
        intensity_pow *= intensity_t;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::aad::{tape, Number};
    use approx::assert_relative_eq;

    #[test]
    fn black_scholes_atm_reference_value() {
        let price = black_scholes(100.0, 100.0, 0.2, 1.0);
        assert_relative_eq!(price, 7.9656, epsilon = 1e-3);
    }

    #[test]
    fn black_scholes_degenerate_vol_is_intrinsic() {
        assert_eq!(black_scholes(110.0, 100.0, 0.0, 1.0), 10.0);
        assert_eq!(black_scholes(90.0, 100.0, 0.2, 0.0), 0.0);
    }

    #[test]
    fn vega_matches_central_difference() {
        let h = 1e-6;
        let bump = (black_scholes(100.0, 110.0, 0.25 + h, 2.0)
            - black_scholes(100.0, 110.0, 0.25 - h, 2.0))
            / (2.0 * h);
        assert_relative_eq!(
            black_scholes_vega(100.0, 110.0, 0.25, 2.0),
            bump,
            epsilon = 1e-5
        );
    }

    #[test]
    fn implied_vol_round_trips() {
        for &vol in &[0.08, 0.2, 0.45] {
            let premium = black_scholes(100.0, 105.0, vol, 1.5);
            let ivol = black_scholes_ivol(100.0, 105.0, premium, 1.5);
            assert_relative_eq!(ivol, vol, epsilon = 1e-8);
        }
    }

    #[test]
    fn bachelier_deep_in_the_money_tends_to_intrinsic() {
        let price = bachelier(150.0, 100.0, 5.0, 1.0);
        assert_relative_eq!(price, 50.0, epsilon = 1e-6);
        assert_eq!(bachelier(90.0, 100.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn bachelier_vega_matches_central_difference() {
        let h = 1e-6;
        let bump =
            (bachelier(100.0, 103.0, 8.0 + h, 2.0) - bachelier(100.0, 103.0, 8.0 - h, 2.0))
                / (2.0 * h);
        assert_relative_eq!(bachelier_vega(100.0, 103.0, 8.0, 2.0), bump, epsilon = 1e-5);
    }

    #[test]
    fn merton_without_jumps_reduces_to_black_scholes() {
        let plain = black_scholes(100.0, 95.0, 0.2, 1.0);
        let no_jumps = merton(100.0, 95.0, 0.2, 1.0, 0.0, -0.1, 0.1);
        assert_relative_eq!(plain, no_jumps, epsilon = 1e-12);
    }

    #[test]
    fn merton_jump_risk_raises_the_option_value() {
        let plain = black_scholes(100.0, 100.0, 0.2, 1.0);
        let jumpy = merton(100.0, 100.0, 0.2, 1.0, 0.5, -0.1, 0.2);
        assert!(jumpy > plain);
    }

    #[test]
    fn taped_formula_reproduces_the_analytic_vega() {
        tape::rewind();
        let spot = Number::new(100.0);
        let vol = Number::new(0.2);
        tape::mark();

        let price = black_scholes(spot, 100.0, vol, 1.0);
        price.propagate_to_mark(false);
        Number::propagate_mark_to_start();

        assert_relative_eq!(price.value(), 7.9656, epsilon = 1e-3);
        assert_relative_eq!(
            vol.adjoint(),
            black_scholes_vega(100.0, 100.0, 0.2, 1.0),
            epsilon = 1e-7
        );
    }
}
