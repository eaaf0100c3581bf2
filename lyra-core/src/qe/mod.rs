//! Quantifier Elimination.
//!
//! Model-based projection plugins: given literals, a satisfying model, and
//! variables to eliminate, produce a quantifier-free residue that is still
//! true in the model and implies the existentially quantified original.

pub mod arith;

pub use arith::{ArithProjectStats, ArithProjector};
