//! Pathwise is a Monte-Carlo pricing engine with path-wise reverse-mode
//! algorithmic differentiation: it values a derivative contract by
//! simulation and returns exact derivatives of the price with respect to
//! every model parameter at a cost proportional to one valuation,
//! regardless of how many parameters there are.
//!
//! The crate separates three caller-supplied collaborators — a product
//! (timeline and payoff), a model (path generation), and a Gaussian RNG
//! with deterministic skip-ahead — from the drivers that compose them:
//! sequential or rayon-parallel, plain or derivative-recording. Model and
//! payoff code is written once against the [`math::Scalar`] trait and runs
//! either over `f64` or over tape-recording [`math::aad::Number`]s.
//!
//! References used across modules include:
//! - Savine, *Modern Computational Finance* (2018), for the tape lifecycle
//!   and the simulation protocol.
//! - Glasserman (2004) for Monte Carlo estimators and antithetic variates.
//! - Giles and Glasserman (2006), smoking adjoints for Monte Carlo Greeks.
//! - Capriotti (2011), fast Greeks by algorithmic differentiation.
//!
//! Numerical considerations:
//! - Derivative recording costs tape nodes per arithmetic operation; the
//!   per-path tape segment is reclaimed by rewinding to the mark, so memory
//!   stays bounded by one path regardless of the path count.
//! - Parallel runs are bit-identical to sequential ones when the RNG skips
//!   exactly (Sobol); adjoint totals agree up to floating-point reduction
//!   order, which is fixed by thread index.
//!
//! # Quick Start
//! Price a European call by Monte Carlo:
//! ```rust
//! use pathwise::core::McEstimate;
//! use pathwise::mc::mc_simul;
//! use pathwise::models::BlackScholes;
//! use pathwise::products::EuropeanCall;
//! use pathwise::rng::XoshiroNormal;
//!
//! let product = EuropeanCall::new(100.0, 1.0);
//! let model = BlackScholes::<f64>::new(100.0, 0.2);
//! let rng = XoshiroNormal::new(42);
//!
//! let payoffs = mc_simul(&product, &model, &rng, 10_000, true).unwrap();
//! let estimate = McEstimate::from_payoffs(&payoffs);
//! assert!((estimate.mean - 7.97).abs() < 0.5);
//! ```
//!
//! Same valuation with sensitivities to every model parameter:
//! ```rust
//! use pathwise::math::aad::Number;
//! use pathwise::mc::mc_simul_aad;
//! use pathwise::models::BlackScholes;
//! use pathwise::products::EuropeanCall;
//! use pathwise::rng::XoshiroNormal;
//!
//! let product = EuropeanCall::new(100.0, 1.0);
//! let model = BlackScholes::<Number>::new(100.0, 0.2);
//! let rng = XoshiroNormal::new(42);
//!
//! let results = mc_simul_aad(&product, &model, &rng, 10_000, true).unwrap();
//! let risks = results.sensitivities(); // [d/d spot, d/d vol]
//! assert!(risks[0] > 0.3 && risks[0] < 0.8);
//! assert!(risks[1] > 30.0 && risks[1] < 50.0);
//! ```

pub mod analytics;
pub mod core;
pub mod math;
pub mod mc;
pub mod models;
pub mod products;
pub mod rng;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::{McEstimate, SimulationError, Time};
    pub use crate::math::aad::Number;
    pub use crate::math::Scalar;
    pub use crate::mc::{
        mc_parallel_simul, mc_parallel_simul_aad, mc_simul, mc_simul_aad, AadResults,
        GaussianRng, Model, Product, Scenario,
    };
    pub use crate::models::{Bachelier, BlackScholes, MertonJump};
    pub use crate::products::{EuropeanCall, Forward};
    pub use crate::rng::{SobolNormal, XoshiroNormal};
}
