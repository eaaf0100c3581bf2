//! Property-based tests for model-based projection soundness
//!
//! Random conjunctions of linear literals are generated so that they hold in
//! a random model by construction; projection must then keep the conjunction
//! true in that model (preservation), remove every trace of the eliminated
//! variable (scope), and leave residue literals untouched.

use lyra_core::ast::{TermId, TermKind, TermManager, traversal};
use lyra_core::model::{Model, ModelEvaluator, Value};
use lyra_core::qe::arith::ArithProjector;
use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;
use rustc_hash::FxHashSet;

/// One generated literal over three variables: coefficients, comparison
/// selector, and a non-negative slack keeping it true in the model.
type LitCase = ([i8; 3], u8, i64);

fn lit_strategy() -> impl Strategy<Value = Vec<LitCase>> {
    prop::collection::vec(
        (
            [(-3i8..=3), (-3i8..=3), (-3i8..=3)],
            0u8..5,
            0i64..5,
        ),
        1..8,
    )
}

fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// Build `c1·x + c2·y + c3·z` and its value under the model values.
fn combo(
    tm: &mut TermManager,
    vars: &[TermId; 3],
    values: &[i64; 3],
    coeffs: &[i8; 3],
) -> (TermId, i64) {
    let mut parts = Vec::new();
    let mut value = 0i64;
    for i in 0..3 {
        let c = coeffs[i] as i64;
        if c == 0 {
            continue;
        }
        value += c * values[i];
        if c == 1 {
            parts.push(vars[i]);
        } else {
            let k = tm.mk_int(BigInt::from(c));
            parts.push(tm.mk_mul(vec![k, vars[i]]));
        }
    }
    let t = if parts.is_empty() {
        tm.mk_int(BigInt::from(0))
    } else {
        tm.mk_add(parts)
    };
    (t, value)
}

/// Build a literal over `lhs` that holds in the model by construction.
fn make_lit(tm: &mut TermManager, lhs: TermId, value: i64, op: u8, slack: i64) -> TermId {
    match op {
        0 => {
            let rhs = tm.mk_int(BigInt::from(value + slack));
            tm.mk_le(lhs, rhs)
        }
        1 => {
            let rhs = tm.mk_int(BigInt::from(value + slack + 1));
            tm.mk_lt(lhs, rhs)
        }
        2 => {
            let rhs = tm.mk_int(BigInt::from(value - slack));
            tm.mk_ge(lhs, rhs)
        }
        3 => {
            let rhs = tm.mk_int(BigInt::from(value));
            tm.mk_eq(lhs, rhs)
        }
        _ => {
            // ¬(lhs ≤ value − slack − 1), true since lhs evaluates to value
            let rhs = tm.mk_int(BigInt::from(value - slack - 1));
            let le = tm.mk_le(lhs, rhs);
            tm.mk_not(le)
        }
    }
}

fn mentions(tm: &TermManager, lit: TermId, var: TermId) -> bool {
    let mut marked = FxHashSet::default();
    traversal::mark_subterms(lit, tm, &mut marked);
    marked.contains(&var)
}

proptest! {
    /// Preservation: the projected conjunction still holds in the model.
    #[test]
    fn projection_preserves_model(cases in lit_strategy(), mx in -10i64..10, my in -10i64..10, mz in -10i64..10) {
        let mut tm = TermManager::new();
        let mut model = Model::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let z = tm.mk_var("z", tm.sorts.int_sort);
        let vars3 = [x, y, z];
        let values = [mx, my, mz];
        for i in 0..3 {
            model.assign(vars3[i], Value::Num(rat(values[i])));
        }

        let mut fmls = Vec::new();
        for (coeffs, op, slack) in &cases {
            let (lhs, value) = combo(&mut tm, &vars3, &values, coeffs);
            fmls.push(make_lit(&mut tm, lhs, value, *op, *slack));
        }

        let mut eval = ModelEvaluator::new();
        for &f in &fmls {
            prop_assert!(eval.is_true(&tm, &mut model, f));
        }

        let mut vars = vec![x];
        ArithProjector::new().project(&mut tm, &mut model, &mut vars, &mut fmls);

        for &f in &fmls {
            prop_assert!(eval.is_true(&tm, &mut model, f), "literal falsified after projection");
        }
    }

    /// Scope: no output literal mentions the eliminated variable.
    #[test]
    fn projection_removes_variable(cases in lit_strategy(), mx in -10i64..10, my in -10i64..10, mz in -10i64..10) {
        let mut tm = TermManager::new();
        let mut model = Model::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let z = tm.mk_var("z", tm.sorts.int_sort);
        let vars3 = [x, y, z];
        let values = [mx, my, mz];
        for i in 0..3 {
            model.assign(vars3[i], Value::Num(rat(values[i])));
        }

        let mut fmls = Vec::new();
        for (coeffs, op, slack) in &cases {
            let (lhs, value) = combo(&mut tm, &vars3, &values, coeffs);
            fmls.push(make_lit(&mut tm, lhs, value, *op, *slack));
        }

        let mut vars = vec![x];
        ArithProjector::new().project(&mut tm, &mut model, &mut vars, &mut fmls);

        prop_assert!(vars.is_empty(), "all literals linearize, so x must go");
        for &f in &fmls {
            prop_assert!(!mentions(&tm, f, x));
        }
    }

    /// Residue safety: an opaque Boolean literal survives verbatim, and a
    /// variable trapped under it is kept.
    #[test]
    fn residue_left_untouched(cases in lit_strategy(), mx in -10i64..10, my in -10i64..10) {
        let mut tm = TermManager::new();
        let mut model = Model::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let z = tm.mk_var("z", tm.sorts.int_sort);
        let vars3 = [x, y, z];
        let values = [mx, my, 0];
        for i in 0..3 {
            model.assign(vars3[i], Value::Num(rat(values[i])));
        }
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        model.assign(p, Value::Bool(true));

        let mut fmls = vec![p];
        for (coeffs, op, slack) in &cases {
            let (lhs, value) = combo(&mut tm, &vars3, &values, coeffs);
            fmls.push(make_lit(&mut tm, lhs, value, *op, *slack));
        }

        let mut vars = vec![x];
        ArithProjector::new().project(&mut tm, &mut model, &mut vars, &mut fmls);

        prop_assert!(fmls.contains(&p));
        // the opaque literal has no arithmetic under it, so x still goes
        prop_assert!(vars.is_empty());
        let residue_kind = tm.kind(p).clone();
        prop_assert!(matches!(residue_kind, TermKind::Var(_)));
    }
}
