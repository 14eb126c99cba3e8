//! Arithmetic Brownian motion (normal model).

use crate::core::Time;
use crate::math::Scalar;
use crate::mc::{Model, Scenario};

/// Bachelier model: `S_{i+1} = S_i + σ√Δt · G_i`, driftless so the spot is
/// a martingale. The terminal spot is linear in the Gaussian shocks, which
/// makes antithetic pairs cancel exactly for linear payoffs.
///
/// Differentiated parameters: spot, vol (absolute, in price units).
#[derive(Debug, Clone)]
pub struct Bachelier<T: Scalar> {
    spot: T,
    vol: T,
    stds: Vec<T>,
}

impl<T: Scalar> Bachelier<T> {
    pub fn new(spot: f64, vol: f64) -> Self {
        Self {
            spot: T::constant(spot),
            vol: T::constant(vol),
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

impl<T: Scalar> Model<T> for Bachelier<T> {
    fn init(&mut self, product_timeline: &[Time]) {
        self.stds.clear();
        let mut prev: Time = 0.0;
        for &t in product_timeline {
            self.stds.push(self.vol * (t - prev).sqrt());
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
            spot = spot + self.stds[i] * gauss[i];
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
