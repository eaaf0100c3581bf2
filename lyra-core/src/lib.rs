//! Lyra Core - AST, Models, and Arithmetic Projection
//!
//! This crate provides the foundations of the Lyra projection engine:
//! - Hash-consed terms with efficient [`TermId`] references
//! - Bool/Int/Real sort system
//! - Models and a completing model evaluator
//! - Model-based projection and optimization for linear arithmetic
//!
//! # Examples
//!
//! ## Creating Terms
//!
//! ```
//! use lyra_core::ast::TermManager;
//! use num_bigint::BigInt;
//!
//! let mut tm = TermManager::new();
//!
//! let x = tm.mk_var("x", tm.sorts.int_sort);
//! let five = tm.mk_int(BigInt::from(5));
//! let le = tm.mk_le(x, five);
//! # let _ = le;
//! ```
//!
//! ## Projecting a Variable
//!
//! ```
//! use lyra_core::ast::TermManager;
//! use lyra_core::model::{Model, Value};
//! use lyra_core::qe::arith::ArithProjector;
//! use num_bigint::BigInt;
//! use num_rational::BigRational;
//!
//! let mut tm = TermManager::new();
//! let mut model = Model::new();
//!
//! let x = tm.mk_var("x", tm.sorts.int_sort);
//! model.assign(x, Value::Num(BigRational::from_integer(BigInt::from(4))));
//!
//! let five = tm.mk_int(BigInt::from(5));
//! let three = tm.mk_int(BigInt::from(3));
//! let mut fmls = vec![tm.mk_le(x, five), tm.mk_ge(x, three)];
//! let mut vars = vec![x];
//!
//! let mut projector = ArithProjector::new();
//! projector.project(&mut tm, &mut model, &mut vars, &mut fmls);
//! assert!(vars.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod model;
pub mod qe;
pub mod sort;

pub use ast::{Term, TermId, TermKind, TermManager};
pub use model::{EvalError, Model, ModelEvaluator, Value};
pub use qe::arith::{ArithProjectStats, ArithProjector};
pub use sort::{SortId, SortKind, Sorts};

// the optimum value type appears in the `maximize` signature
pub use lyra_math::InfEps;
