//! Monte-Carlo simulation contracts and drivers.
//!
//! A simulation is the composition of three caller-supplied collaborators:
//! a [`Product`] (timeline and payoff), a [`Model`] (path generation from a
//! Gaussian vector), and a [`GaussianRng`] (independent standard-normal
//! draws with deterministic skip-ahead). The free functions in
//! [`simulation`] and [`parallel`] drive them sequentially or over the
//! rayon pool, in plain or derivative-recording form.
//!
//! References: Savine (2018), *Modern Computational Finance*; Glasserman
//! (2004) for Monte Carlo estimators and antithetic variates.

pub mod parallel;
pub mod simulation;

pub use parallel::{mc_parallel_simul, mc_parallel_simul_aad, BATCH_SIZE};
pub use simulation::{mc_simul, mc_simul_aad, AadResults};

use crate::core::Time;
use crate::math::Scalar;

/// Model state at one event date. For a single-asset diffusion this is just
/// the spot level.
#[derive(Debug, Clone, Copy)]
pub struct Scenario<T> {
    pub spot: T,
}

/// Derivative contract: an event timeline and a payoff over the scenario
/// path along it.
pub trait Product<T: Scalar>: Send + Sync {
    /// Event dates, non-empty and strictly increasing.
    fn timeline(&self) -> &[Time];

    /// Payoff for a path with one scenario per timeline date. Must be pure
    /// over the path and the product's own state.
    fn payoff(&self, path: &[Scenario<T>]) -> T;

    /// Deep, independent copy.
    fn clone_box(&self) -> Box<dyn Product<T>>;
}

/// Stochastic model: turns a Gaussian vector into a scenario path on the
/// product timeline.
pub trait Model<T: Scalar>: Send + Sync {
    /// Precomputes per-step coefficients aligned to the product timeline.
    /// Under AAD the drivers call this after [`Model::put_on_tape`], so
    /// init-time arithmetic lands on tape and depends on the parameter
    /// leaves.
    fn init(&mut self, product_timeline: &[Time]);

    /// Number of independent standard normals consumed per path. Valid
    /// after [`Model::init`].
    fn sim_dim(&self) -> usize;

    /// Fills `path` (one scenario per timeline date) from a Gaussian vector
    /// of length [`Model::sim_dim`]. Deterministic; no state is carried
    /// between calls.
    fn generate_path(&self, gauss: &[f64], path: &mut [Scenario<T>]);

    /// Parameter set, in reporting order. Under AAD the returned numbers
    /// reference the adjoint slots sensitivities accumulate into.
    fn parameters(&self) -> Vec<T>;

    /// Registers the parameters as fresh input leaves on the calling
    /// thread's tape, resetting their adjoints. No-op for plain scalars.
    fn put_on_tape(&mut self) {}

    /// Deep, independent copy.
    fn clone_box(&self) -> Box<dyn Model<T>>;
}

/// Generator of independent standard-normal vectors with deterministic
/// skip-ahead.
pub trait GaussianRng: Send + Sync {
    /// Configures the draw dimension. May be called again to reconfigure;
    /// resets the stream position.
    fn init(&mut self, sim_dim: usize);

    /// Configured dimension.
    fn sim_dim(&self) -> usize;

    /// Fills `out` (length [`GaussianRng::sim_dim`]) with the next draw.
    fn next_g(&mut self, out: &mut [f64]);

    /// Positions the stream so the next [`GaussianRng::next_g`] returns
    /// draw number `pos` (0-based). Must be consistent with repeated
    /// `next_g`; sub-linear cost is desirable but not required.
    fn skip_to(&mut self, pos: usize);

    /// Independent copy at the same state.
    fn clone_box(&self) -> Box<dyn GaussianRng>;
}
