//! European call.

use crate::core::Time;
use crate::math::Scalar;
use crate::mc::{Product, Scenario};

/// `(S_T - K)⁺` paid at maturity; the timeline is the single maturity date.
#[derive(Debug, Clone)]
pub struct EuropeanCall {
    strike: f64,
    timeline: Vec<Time>,
}

impl EuropeanCall {
    pub fn new(strike: f64, maturity: Time) -> Self {
        Self {
            strike,
            timeline: vec![maturity],
        }
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn maturity(&self) -> Time {
        self.timeline[0]
    }
}

impl<T: Scalar> Product<T> for EuropeanCall {
    fn timeline(&self) -> &[Time] {
        &self.timeline
    }

    fn payoff(&self, path: &[Scenario<T>]) -> T {
        debug_assert_eq!(path.len(), self.timeline.len());
        (path[path.len() - 1].spot - self.strike).positive_part()
    }

    fn clone_box(&self) -> Box<dyn Product<T>> {
        Box::new(self.clone())
    }
}
