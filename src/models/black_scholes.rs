//! Lognormal diffusion with zero rates and dividends.

use crate::core::Time;
use crate::math::Scalar;
use crate::mc::{Model, Scenario};

/// Black–Scholes model under the zero-rate convention: the spot is a
/// martingale and `S_{i+1} = S_i · exp(-σ²Δt/2 + σ√Δt · G_i)`.
///
/// Differentiated parameters: spot, vol.
#[derive(Debug, Clone)]
pub struct BlackScholes<T: Scalar> {
    spot: T,
    vol: T,
    // Per-step log-drift and standard deviation, cached by `init` so the
    // path loop only multiplies. Under AAD these are recorded before the
    // tape mark and depend on the parameter leaves.
    drifts: Vec<T>,
    stds: Vec<T>,
}

impl<T: Scalar> BlackScholes<T> {
    pub fn new(spot: f64, vol: f64) -> Self {
        Self {
            spot: T::constant(spot),
            vol: T::constant(vol),
            drifts: Vec::new(),
            stds: Vec::new(),
        }
    }

    pub fn spot(&self) -> T {
        self.spot
    }

    pub fn vol(&self) -> T {
        self.vol
    }
}

impl<T: Scalar> Model<T> for BlackScholes<T> {
    fn init(&mut self, product_timeline: &[Time]) {
        self.drifts.clear();
        self.stds.clear();
        let mut prev: Time = 0.0;
        for &t in product_timeline {
            let dt = t - prev;
            self.drifts.push(self.vol * self.vol * (-0.5 * dt));
            self.stds.push(self.vol * dt.sqrt());
            prev = t;
        }
    }

    fn sim_dim(&self) -> usize {
        self.stds.len()
    }

    fn generate_path(&self, gauss: &[f64], path: &mut [Scenario<T>]) {
        debug_assert_eq!(gauss.len(), self.sim_dim());
        debug_assert_eq!(path.len(), self.sim_dim());

        let mut spot = self.spot;
        for (i, scenario) in path.iter_mut().enumerate() {
            spot = spot * (self.drifts[i] + self.stds[i] * gauss[i]).exp();
            scenario.spot = spot;
        }
    }

    fn parameters(&self) -> Vec<T> {
        vec![self.spot, self.vol]
    }

    fn put_on_tape(&mut self) {
        self.spot.put_on_tape();
        self.vol.put_on_tape();
    }

    fn clone_box(&self) -> Box<dyn Model<T>> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_step_path_reproduces_the_closed_form_map() {
        let mut model = BlackScholes::<f64>::new(100.0, 0.2);
        model.init(&[1.0]);
        assert_eq!(model.sim_dim(), 1);

        let mut path = vec![Scenario { spot: 0.0 }];
        model.generate_path(&[0.5], &mut path);
        assert_relative_eq!(
            path[0].spot,
            100.0 * (-0.02 + 0.2 * 0.5_f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn multi_step_path_composes_increments() {
        let mut model = BlackScholes::<f64>::new(50.0, 0.3);
        model.init(&[0.25, 1.0]);
        assert_eq!(model.sim_dim(), 2);

        let gauss = [1.0, -0.5];
        let mut path = vec![Scenario { spot: 0.0 }; 2];
        model.generate_path(&gauss, &mut path);

        let s1 = 50.0 * (-0.5 * 0.09 * 0.25 + 0.3 * 0.25_f64.sqrt() * 1.0).exp();
        let s2 = s1 * (-0.5 * 0.09 * 0.75 + 0.3 * 0.75_f64.sqrt() * -0.5).exp();
        assert_relative_eq!(path[0].spot, s1, epsilon = 1e-12);
        assert_relative_eq!(path[1].spot, s2, epsilon = 1e-12);
    }

    #[test]
    fn reinit_replaces_cached_coefficients() {
        let mut model = BlackScholes::<f64>::new(100.0, 0.2);
        model.init(&[0.5, 1.0, 1.5]);
        assert_eq!(model.sim_dim(), 3);
        model.init(&[2.0]);
        assert_eq!(model.sim_dim(), 1);
    }

    #[test]
    fn parameters_report_spot_then_vol() {
        let model = BlackScholes::<f64>::new(95.0, 0.25);
        assert_eq!(model.parameters(), vec![95.0, 0.25]);
    }
}
