//! Lyra Math - Model-Based Optimization for Linear Arithmetic
//!
//! This crate provides the numeric engine underneath Lyra's arithmetic
//! projection plugin:
//! - [`ModelBasedOpt`]: a store of linear rows over seeded variables that can
//!   eliminate variables (model-guided virtual substitution) and maximize a
//!   linear objective
//! - [`InfEps`]: optimum values that distinguish `+∞` and strict suprema via
//!   an infinitesimal offset
//!
//! # Examples
//!
//! ```
//! use lyra_math::mbo::{ModelBasedOpt, RowType, Var};
//! use num_bigint::BigInt;
//! use num_rational::BigRational;
//!
//! let mut mbo = ModelBasedOpt::new();
//! let x = mbo.add_var(BigRational::from_integer(BigInt::from(4)), true);
//!
//! // x - 5 <= 0 and 3 - x <= 0
//! let one = BigRational::from_integer(BigInt::from(1));
//! mbo.add_constraint(
//!     vec![Var::new(x, one.clone())],
//!     BigRational::from_integer(BigInt::from(-5)),
//!     RowType::Le,
//! );
//! mbo.add_constraint(
//!     vec![Var::new(x, -one)],
//!     BigRational::from_integer(BigInt::from(3)),
//!     RowType::Le,
//! );
//!
//! mbo.project(&[x]);
//! assert!(mbo.get_live_rows().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod inf_eps;
pub mod mbo;

pub use inf_eps::InfEps;
pub use mbo::{MboStats, ModelBasedOpt, Row, RowType, Var, VarId};
