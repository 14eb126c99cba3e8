//! Common domain types and library-wide result/error structures.

/// Instant on a product timeline, in year fractions from the pricing date.
pub type Time = f64;

/// Errors surfaced by the simulation entry points.
///
/// These report caller-contract violations detected before any path is run.
/// Invariants internal to a running simulation (buffer sizes, propagation
/// bounds) are debug assertions instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Input validation error (path count, flags).
    InvalidInput(String),
    /// Product timeline is empty, unsorted, or not finite.
    InvalidTimeline(String),
    /// Model reported an unusable configuration (e.g. zero simulation dimension).
    InvalidModel(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::InvalidTimeline(msg) => write!(f, "invalid timeline: {msg}"),
            Self::InvalidModel(msg) => write!(f, "invalid model: {msg}"),
        }
    }
}

impl std::error::Error for SimulationError {}

/// Sample statistics of a pathwise payoff vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McEstimate {
    /// Monte-Carlo mean.
    pub mean: f64,
    /// Unbiased sample variance of the pathwise payoffs.
    pub variance: f64,
    /// Standard error of the mean.
    pub std_err: f64,
}

impl McEstimate {
    /// Computes mean, sample variance, and standard error from payoffs.
    pub fn from_payoffs(payoffs: &[f64]) -> Self {
        if payoffs.is_empty() {
            return Self {
                mean: f64::NAN,
                variance: f64::NAN,
                std_err: f64::NAN,
            };
        }

        let n = payoffs.len() as f64;
        let sum: f64 = payoffs.iter().sum();
        let sum_sq: f64 = payoffs.iter().map(|x| x * x).sum();
        let mean = sum / n;
        let variance = if payoffs.len() > 1 {
            ((sum_sq - sum * sum / n) / (n - 1.0)).max(0.0)
        } else {
            0.0
        };

        Self {
            mean,
            variance,
            std_err: (variance / n).sqrt(),
        }
    }
}
