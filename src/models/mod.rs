//! Single-asset diffusion models, generic over the scalar type so the same
//! path generation runs plainly or onto the tape.

pub mod bachelier;
pub mod black_scholes;
pub mod merton;

pub use bachelier::Bachelier;
pub use black_scholes::BlackScholes;
pub use merton::MertonJump;
