//! Reverse-mode algorithmic differentiation on a per-thread tape.
//!
//! Every arithmetic operation on a [`Number`] records a node on the current
//! thread's [`Tape`]; a single backward sweep then yields derivatives of a
//! scalar result with respect to every recorded input at a cost proportional
//! to one forward evaluation.
//!
//! The tape supports a *mark* separating one-time work (parameter
//! registration, per-timeline pre-calculations) from repeatable per-path
//! work. Rewinding to the mark releases path nodes while preserving the
//! accumulated adjoints of everything recorded before it, which is what
//! makes pathwise Monte-Carlo risk one-sweep-per-path with O(1) memory in
//! the number of paths.
//!
//! References:
//! - Savine (2018), *Modern Computational Finance*.
//! - Giles & Glasserman (2006), smoking adjoints for Monte Carlo.
//! - Capriotti (2011), fast Greeks by algorithmic differentiation.

pub mod number;
pub mod tape;

pub use number::Number;
pub use tape::Tape;
