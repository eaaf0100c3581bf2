//! Models and model evaluation.
//!
//! A [`Model`] assigns concrete values to uninterpreted constants. The
//! [`ModelEvaluator`] computes the value of arbitrary terms under a model,
//! optionally *completing* the model on the fly: with completion enabled,
//! evaluating an unassigned constant assigns it a sort-appropriate default
//! instead of failing.
//!
//! ## References
//!
//! - Z3's `model/model_evaluator.cpp`

use crate::ast::{TermId, TermKind, TermManager};
use crate::sort::SortKind;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Numeric value (integer values have denominator one).
    Num(BigRational),
}

impl Value {
    /// The Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Num(_) => None,
        }
    }

    /// The numeric payload, if any.
    pub fn as_num(&self) -> Option<&BigRational> {
        match self {
            Value::Num(r) => Some(r),
            Value::Bool(_) => None,
        }
    }
}

/// Evaluation failure.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A constant has no interpretation and completion is disabled.
    #[error("unassigned constant `{0}`")]
    Unassigned(String),
    /// A term's arguments evaluated at the wrong kind of value.
    #[error("sort mismatch under `{0}`")]
    SortMismatch(&'static str),
    /// `mod` with a zero or non-integral operand.
    #[error("bad modulus")]
    BadModulus,
}

/// An interpretation of uninterpreted constants.
#[derive(Debug, Clone, Default)]
pub struct Model {
    entries: FxHashMap<TermId, Value>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpretation of a constant.
    pub fn assign(&mut self, var: TermId, value: Value) {
        self.entries.insert(var, value);
    }

    /// Interpretation of a constant, if any.
    pub fn get(&self, var: TermId) -> Option<&Value> {
        self.entries.get(&var)
    }
}

/// Euclidean remainder: result in `[0, |m|)`.
fn euclid_mod(a: &BigInt, m: &BigInt) -> BigInt {
    let m = m.abs();
    let r = a % &m;
    if r.is_negative() { r + m } else { r }
}

/// Term evaluator with a per-instance cache and optional model completion.
#[derive(Debug, Default)]
pub struct ModelEvaluator {
    completion: bool,
    cache: FxHashMap<TermId, Value>,
}

impl ModelEvaluator {
    /// Create an evaluator with completion disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable model completion.
    pub fn set_completion(&mut self, on: bool) {
        self.completion = on;
    }

    /// Drop cached values. Must be called after the model is reassigned
    /// externally.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    /// Evaluate a term under the model.
    pub fn eval(
        &mut self,
        tm: &TermManager,
        model: &mut Model,
        t: TermId,
    ) -> Result<Value, EvalError> {
        if let Some(v) = self.cache.get(&t) {
            return Ok(v.clone());
        }
        let value = match tm.kind(t).clone() {
            TermKind::True => Value::Bool(true),
            TermKind::False => Value::Bool(false),
            TermKind::Num(r) => Value::Num(r),
            TermKind::Var(name) => match model.get(t) {
                Some(v) => v.clone(),
                None if self.completion => {
                    let v = match tm.sort_kind(tm.sort(t)) {
                        SortKind::Bool => Value::Bool(false),
                        SortKind::Int | SortKind::Real => Value::Num(BigRational::zero()),
                    };
                    model.assign(t, v.clone());
                    v
                }
                None => {
                    return Err(EvalError::Unassigned(tm.resolve_str(name).to_owned()));
                }
            },
            TermKind::Add(args) => {
                let mut acc = BigRational::zero();
                for a in args {
                    acc += self.eval_num(tm, model, a)?;
                }
                Value::Num(acc)
            }
            TermKind::Mul(args) => {
                let mut acc = BigRational::from_integer(BigInt::from(1));
                for a in args {
                    acc *= self.eval_num(tm, model, a)?;
                }
                Value::Num(acc)
            }
            TermKind::Sub(a, b) => {
                Value::Num(self.eval_num(tm, model, a)? - self.eval_num(tm, model, b)?)
            }
            TermKind::Neg(a) => Value::Num(-self.eval_num(tm, model, a)?),
            TermKind::Mod(a, b) => {
                let va = self.eval_num(tm, model, a)?;
                let vb = self.eval_num(tm, model, b)?;
                if !va.is_integer() || !vb.is_integer() || vb.is_zero() {
                    return Err(EvalError::BadModulus);
                }
                Value::Num(BigRational::from_integer(euclid_mod(
                    &va.to_integer(),
                    &vb.to_integer(),
                )))
            }
            TermKind::Le(a, b) => {
                Value::Bool(self.eval_num(tm, model, a)? <= self.eval_num(tm, model, b)?)
            }
            TermKind::Lt(a, b) => {
                Value::Bool(self.eval_num(tm, model, a)? < self.eval_num(tm, model, b)?)
            }
            TermKind::Ge(a, b) => {
                Value::Bool(self.eval_num(tm, model, a)? >= self.eval_num(tm, model, b)?)
            }
            TermKind::Gt(a, b) => {
                Value::Bool(self.eval_num(tm, model, a)? > self.eval_num(tm, model, b)?)
            }
            TermKind::Eq(a, b) => {
                let va = self.eval(tm, model, a)?;
                let vb = self.eval(tm, model, b)?;
                match (&va, &vb) {
                    (Value::Bool(_), Value::Bool(_)) | (Value::Num(_), Value::Num(_)) => {
                        Value::Bool(va == vb)
                    }
                    _ => return Err(EvalError::SortMismatch("=")),
                }
            }
            TermKind::Distinct(args) => {
                let mut vals = Vec::with_capacity(args.len());
                for a in args {
                    vals.push(self.eval(tm, model, a)?);
                }
                let mut distinct = true;
                'outer: for i in 0..vals.len() {
                    for j in i + 1..vals.len() {
                        if vals[i] == vals[j] {
                            distinct = false;
                            break 'outer;
                        }
                    }
                }
                Value::Bool(distinct)
            }
            TermKind::Not(a) => Value::Bool(!self.eval_bool(tm, model, a)?),
            TermKind::And(args) => {
                let mut acc = true;
                for a in args {
                    acc &= self.eval_bool(tm, model, a)?;
                }
                Value::Bool(acc)
            }
            TermKind::Or(args) => {
                let mut acc = false;
                for a in args {
                    acc |= self.eval_bool(tm, model, a)?;
                }
                Value::Bool(acc)
            }
            TermKind::Ite(c, then_br, else_br) => {
                if self.eval_bool(tm, model, c)? {
                    self.eval(tm, model, then_br)?
                } else {
                    self.eval(tm, model, else_br)?
                }
            }
        };
        self.cache.insert(t, value.clone());
        Ok(value)
    }

    /// Evaluate a term expected to be numeric.
    pub fn eval_num(
        &mut self,
        tm: &TermManager,
        model: &mut Model,
        t: TermId,
    ) -> Result<BigRational, EvalError> {
        match self.eval(tm, model, t)? {
            Value::Num(r) => Ok(r),
            Value::Bool(_) => Err(EvalError::SortMismatch("numeric context")),
        }
    }

    /// Evaluate a term expected to be Boolean.
    pub fn eval_bool(
        &mut self,
        tm: &TermManager,
        model: &mut Model,
        t: TermId,
    ) -> Result<bool, EvalError> {
        match self.eval(tm, model, t)? {
            Value::Bool(b) => Ok(b),
            Value::Num(_) => Err(EvalError::SortMismatch("boolean context")),
        }
    }

    /// Whether a term evaluates to `true`.
    pub fn is_true(&mut self, tm: &TermManager, model: &mut Model, t: TermId) -> bool {
        matches!(self.eval_bool(tm, model, t), Ok(true))
    }
}
