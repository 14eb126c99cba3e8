//! Gaussian-vector generators for the simulation drivers.
//!
//! Both generators map uniforms through the inverse normal CDF so that one
//! draw consumes exactly `sim_dim` uniforms, which is what makes
//! [`crate::mc::GaussianRng::skip_to`] well-defined. [`XoshiroNormal`]
//! offers functional (replay-based) skip; [`SobolNormal`] skips in
//! sub-linear time and gives bit-identical sequential/parallel runs.

pub mod sobol;
pub mod xoshiro;

pub use sobol::SobolNormal;
pub use xoshiro::{Xoshiro256PlusPlus, XoshiroNormal};
