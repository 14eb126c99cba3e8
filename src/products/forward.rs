//! Forward contract.

use crate::core::Time;
use crate::math::Scalar;
use crate::mc::{Product, Scenario};

/// Linear payoff `S_T - K` at maturity. Useful as a variance-reduction
/// control: under a model whose terminal spot is linear in the shocks,
/// antithetic pairs reproduce the forward exactly.
#[derive(Debug, Clone)]
pub struct Forward {
    strike: f64,
    timeline: Vec<Time>,
}

impl Forward {
    pub fn new(strike: f64, maturity: Time) -> Self {
        Self {
            strike,
            timeline: vec![maturity],
        }
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }
}

impl<T: Scalar> Product<T> for Forward {
    fn timeline(&self) -> &[Time] {
        &self.timeline
    }

    fn payoff(&self, path: &[Scenario<T>]) -> T {
        debug_assert_eq!(path.len(), self.timeline.len());
        path[path.len() - 1].spot - self.strike
    }

    fn clone_box(&self) -> Box<dyn Product<T>> {
        Box::new(self.clone())
    }
}
