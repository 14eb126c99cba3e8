//! Merton jump-diffusion.

use crate::core::Time;
use crate::math::{normal_cdf, Scalar};
use crate::mc::{Model, Scenario};

/// Jump-diffusion with lognormal jumps and compensated drift, so the spot
/// stays a martingale:
///
/// `log S_{i+1} = log S_i - (σ²/2 + comp)Δt + σ√Δt·Z₁ + N·μ_J + σ_J√N·Z₃`
///
/// where `N ~ Poisson(λΔt)` is sampled by inverse transform of `Φ(Z₂)` and
/// `comp = λ(e^{μ_J + σ_J²/2} - 1)`. Three Gaussians per step: diffusion
/// shock, jump count, jump-size shock.
///
/// Differentiated parameters: spot, vol, mean jump, jump vol. The intensity
/// is plain configuration: a path's jump count is piecewise constant in λ,
/// so its pathwise derivative is identically zero and recording it would
/// report a spurious flat sensitivity.
#[derive(Debug, Clone)]
pub struct MertonJump<T: Scalar> {
    spot: T,
    vol: T,
    mean_jump: T,
    std_jump: T,
    intensity: f64,
    drifts: Vec<T>,
    stds: Vec<T>,
    jump_loads: Vec<f64>,
}

impl<T: Scalar> MertonJump<T> {
    pub fn new(spot: f64, vol: f64, intensity: f64, mean_jump: f64, std_jump: f64) -> Self {
        Self {
            spot: T::constant(spot),
            vol: T::constant(vol),
            mean_jump: T::constant(mean_jump),
            std_jump: T::constant(std_jump),
            intensity,
            drifts: Vec::new(),
            stds: Vec::new(),
            jump_loads: Vec::new(),
        }
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }
}

impl<T: Scalar> Model<T> for MertonJump<T> {
    fn init(&mut self, product_timeline: &[Time]) {
        self.drifts.clear();
        self.stds.clear();
        self.jump_loads.clear();

        // Compensator of the jump part, on tape under AAD since it depends
        // on the jump parameters.
        let compensator =
            ((self.mean_jump + self.std_jump * self.std_jump * 0.5).exp() - 1.0) * self.intensity;

        let mut prev: Time = 0.0;
        for &t in product_timeline {
            let dt = t - prev;
            self.drifts
                .push(-(self.vol * self.vol * 0.5 + compensator) * dt);
            self.stds.push(self.vol * dt.sqrt());
            self.jump_loads.push(self.intensity * dt);
            prev = t;
        }
    }

    fn sim_dim(&self) -> usize {
        3 * self.stds.len()
    }

    fn generate_path(&self, gauss: &[f64], path: &mut [Scenario<T>]) {
        debug_assert_eq!(gauss.len(), self.sim_dim());
        debug_assert_eq!(path.len(), self.stds.len());

        let mut spot = self.spot;
        for (i, scenario) in path.iter_mut().enumerate() {
            let z_diffusion = gauss[3 * i];
            let z_count = gauss[3 * i + 1];
            let z_jump = gauss[3 * i + 2];

            let jumps = poisson_inv_cdf(self.jump_loads[i], normal_cdf(z_count)) as f64;

            let mut log_increment = self.drifts[i] + self.stds[i] * z_diffusion;
            if jumps > 0.0 {
                log_increment = log_increment
                    + self.mean_jump * jumps
                    + self.std_jump * (jumps.sqrt() * z_jump);
            }
            spot = spot * log_increment.exp();
            scenario.spot = spot;
        }
    }

    fn parameters(&self) -> Vec<T> {
        vec![self.spot, self.vol, self.mean_jump, self.std_jump]
    }

    fn put_on_tape(&mut self) {
        self.spot.put_on_tape();
        self.vol.put_on_tape();
        self.mean_jump.put_on_tape();
        self.std_jump.put_on_tape();
    }

    fn clone_box(&self) -> Box<dyn Model<T>> {
        Box::new(self.clone())
    }
}

/// Smallest `k` with `P(N ≤ k) ≥ u` for `N ~ Poisson(mean)`.
fn poisson_inv_cdf(mean: f64, u: f64) -> u32 {
    let mut k = 0_u32;
    let mut pmf = (-mean).exp();
    let mut cdf = pmf;
    while u > cdf && k < 128 {
        k += 1;
        pmf *= mean / k as f64;
        cdf += pmf;
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn poisson_inverse_transform_brackets_the_cdf() {
        // P(0) = e^-1 ~ 0.3679, P(N<=1) ~ 0.7358 at mean 1.
        assert_eq!(poisson_inv_cdf(1.0, 0.2), 0);
        assert_eq!(poisson_inv_cdf(1.0, 0.5), 1);
        assert_eq!(poisson_inv_cdf(1.0, 0.9), 2);
        assert_eq!(poisson_inv_cdf(0.0, 0.99), 0);
    }

    #[test]
    fn no_jump_path_reduces_to_compensated_black_scholes() {
        let mut model = MertonJump::<f64>::new(100.0, 0.2, 0.5, -0.1, 0.15);
        model.init(&[1.0]);
        assert_eq!(model.sim_dim(), 3);

        // z_count deep in the left tail forces a zero jump count.
        let mut path = vec![Scenario { spot: 0.0 }];
        model.generate_path(&[0.3, -6.0, 1.0], &mut path);

        let compensator = 0.5 * ((-0.1_f64 + 0.5 * 0.15 * 0.15).exp() - 1.0);
        let expected = 100.0 * (-(0.5 * 0.04 + compensator) + 0.2 * 0.3_f64).exp();
        assert_relative_eq!(path[0].spot, expected, epsilon = 1e-12);
    }

    #[test]
    fn jumps_move_the_path_by_the_jump_size() {
        let mut with_jumps = MertonJump::<f64>::new(100.0, 0.2, 2.0, -0.1, 0.0);
        with_jumps.init(&[1.0]);

        // Same diffusion shock, jump count forced via the count shock; zero
        // jump vol makes the jump deterministic.
        let mut base = vec![Scenario { spot: 0.0 }];
        let mut jumped = vec![Scenario { spot: 0.0 }];
        with_jumps.generate_path(&[0.0, -6.0, 0.0], &mut base);
        with_jumps.generate_path(&[0.0, -0.8, 0.0], &mut jumped);

        // Phi(-0.8) ~ 0.212: one jump at mean 2 (P(N=0) ~ 0.135).
        assert_relative_eq!(jumped[0].spot, base[0].spot * (-0.1_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn monte_carlo_mean_is_martingale() {
        use crate::mc::mc_simul;
        use crate::products::Forward;
        use crate::rng::XoshiroNormal;

        let product = Forward::new(0.0, 1.0);
        let model = MertonJump::<f64>::new(100.0, 0.15, 1.0, -0.08, 0.1);
        let rng = XoshiroNormal::new(99);

        let payoffs = mc_simul(&product, &model, &rng, 200_000, true).unwrap();
        let mean = payoffs.iter().sum::<f64>() / payoffs.len() as f64;
        assert!((mean - 100.0).abs() < 0.2, "mean={mean}");
    }
}
