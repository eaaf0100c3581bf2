//! Model-based projection for linear arithmetic.
//!
//! Lowers literals into linear rows over a [`ModelBasedOpt`] engine, using
//! the model to pick a branch at every conditional or non-linear junction,
//! then eliminates the requested variables in the engine and lifts the
//! surviving rows back into literals. Literals the linearizer does not
//! understand stay behind verbatim as residue, and any variable they mention
//! is kept rather than eliminated.
//!
//! The same lowering drives [`ArithProjector::maximize`], which pushes a
//! linear objective to its optimum and reports witness bounds for an
//! optimization loop.
//!
//! ## Algorithm
//!
//! 1. Linearize each literal into engine rows; keep the rest as residue.
//! 2. Register the variables to eliminate with their model values.
//! 3. Keep every variable whose term occurs under a residue literal or
//!    under another engine term (it would reappear in the lifted rows).
//! 4. Project the remaining ones in the engine; lift surviving rows.
//!
//! ## References
//!
//! - Z3's `qe/qe_arith.cpp`
//! - Bjorner & Janota: "Playing with Quantified Satisfaction" (LPAR-20, 2015)

use crate::ast::{TermId, TermKind, TermManager, traversal};
use crate::model::{Model, ModelEvaluator, Value};
use lyra_math::mbo::{self, ModelBasedOpt, Row, RowType};
use lyra_math::InfEps;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// Projection statistics.
#[derive(Debug, Clone, Default)]
pub struct ArithProjectStats {
    /// Literals absorbed into engine rows.
    pub lits_consumed: u64,
    /// Literals kept as residue.
    pub residue_lits: u64,
    /// Variables eliminated.
    pub vars_eliminated: u64,
    /// Variables kept because their term escapes into residue.
    pub vars_kept: u64,
    /// Engine rows lifted back into literals.
    pub rows_lifted: u64,
}

/// Arithmetic projection plugin.
///
/// All per-call state (engine, evaluator, id maps) is created on entry and
/// dropped on exit; the plugin itself only accumulates statistics.
#[derive(Debug, Default)]
pub struct ArithProjector {
    stats: ArithProjectStats,
}

/// Recognize a statically constant term.
fn is_numeral(tm: &TermManager, t: TermId) -> Option<BigRational> {
    match tm.kind(t) {
        TermKind::Num(r) => Some(r.clone()),
        TermKind::Neg(a) => is_numeral(tm, *a).map(|r| -r),
        TermKind::Mul(args) => {
            let mut acc = BigRational::one();
            for &a in args {
                acc *= is_numeral(tm, a)?;
            }
            Some(acc)
        }
        TermKind::Add(args) => {
            let mut acc = BigRational::zero();
            for &a in args {
                acc += is_numeral(tm, a)?;
            }
            Some(acc)
        }
        TermKind::Sub(a, b) => Some(is_numeral(tm, *a)? - is_numeral(tm, *b)?),
        _ => None,
    }
}

fn insert_mul(ts: &mut FxHashMap<TermId, BigRational>, t: TermId, mul: BigRational) {
    *ts.entry(t).or_insert_with(BigRational::zero) += mul;
}

/// Per-call projection state.
struct ProjectCtx {
    mbo: ModelBasedOpt,
    eval: ModelEvaluator,
    tids: FxHashMap<TermId, mbo::VarId>,
    index2expr: Vec<TermId>,
}

impl ProjectCtx {
    fn new() -> Self {
        Self {
            mbo: ModelBasedOpt::new(),
            eval: ModelEvaluator::new(),
            tids: FxHashMap::default(),
            index2expr: Vec::new(),
        }
    }

    /// Engine variable for `t`, registering it with its (completed) model
    /// value on first sight.
    fn register(&mut self, tm: &TermManager, model: &mut Model, t: TermId) -> mbo::VarId {
        if let Some(&id) = self.tids.get(&t) {
            return id;
        }
        self.eval.set_completion(true);
        let value = self.eval.eval_num(tm, model, t).unwrap_or_else(|_| {
            debug_assert!(false, "engine variable seed failed to evaluate");
            BigRational::zero()
        });
        let id = self.mbo.add_var(value, tm.is_int(t));
        trace!(?t, id, "registering engine variable");
        self.tids.insert(t, id);
        debug_assert_eq!(self.index2expr.len(), id);
        self.index2expr.push(t);
        id
    }

    /// Materialize an accumulator as engine coefficients, registering
    /// engine variables on demand and dropping zero entries.
    fn extract_coeffs(
        &mut self,
        tm: &TermManager,
        model: &mut Model,
        ts: &FxHashMap<TermId, BigRational>,
    ) -> Vec<mbo::Var> {
        self.eval.set_completion(true);
        let mut coeffs = Vec::with_capacity(ts.len());
        for (&t, q) in ts {
            if q.is_zero() {
                trace!(?t, "dropping zero coefficient");
                continue;
            }
            let id = self.register(tm, model, t);
            coeffs.push(mbo::Var::new(id, q.clone()));
        }
        coeffs
    }

    /// Extract linear rows from `lit` into the engine. Returns `false` when
    /// the literal must stay behind as residue. The caller guarantees `lit`
    /// holds in the model.
    fn linearize_lit(
        &mut self,
        tm: &mut TermManager,
        model: &mut Model,
        lit: TermId,
        fmls: &mut Vec<TermId>,
    ) -> bool {
        debug_assert!(
            self.eval.is_true(tm, model, lit),
            "input literal must hold in the model"
        );
        let mut ts: FxHashMap<TermId, BigRational> = FxHashMap::default();
        let mut c = BigRational::zero();
        let (lit, negated) = match tm.kind(lit) {
            TermKind::Not(inner) => (*inner, true),
            _ => (lit, false),
        };
        let mut mul = BigRational::one();
        if negated {
            mul = -mul;
        }
        let ty = match tm.kind(lit).clone() {
            TermKind::Le(e1, e2) | TermKind::Ge(e2, e1) => {
                self.linearize_term(tm, model, mul.clone(), e1, &mut c, fmls, &mut ts);
                self.linearize_term(tm, model, -mul, e2, &mut c, fmls, &mut ts);
                if negated { RowType::Lt } else { RowType::Le }
            }
            TermKind::Lt(e1, e2) | TermKind::Gt(e2, e1) => {
                self.linearize_term(tm, model, mul.clone(), e1, &mut c, fmls, &mut ts);
                self.linearize_term(tm, model, -mul, e2, &mut c, fmls, &mut ts);
                if negated { RowType::Le } else { RowType::Lt }
            }
            TermKind::Eq(e1, e2) if !negated && tm.is_arith(e1) => {
                self.linearize_term(tm, model, mul.clone(), e1, &mut c, fmls, &mut ts);
                self.linearize_term(tm, model, -mul, e2, &mut c, fmls, &mut ts);
                RowType::Eq
            }
            TermKind::Eq(e1, e2) if negated && tm.is_arith(e1) => {
                let Ok(r1) = self.eval.eval_num(tm, model, e1) else {
                    return false;
                };
                let Ok(r2) = self.eval.eval_num(tm, model, e2) else {
                    return false;
                };
                debug_assert_ne!(r1, r2);
                // orient so the negated accumulation reads smaller < larger
                let (e1, e2) = if r1 < r2 { (e2, e1) } else { (e1, e2) };
                self.linearize_term(tm, model, mul.clone(), e1, &mut c, fmls, &mut ts);
                self.linearize_term(tm, model, -mul, e2, &mut c, fmls, &mut ts);
                RowType::Lt
            }
            TermKind::Distinct(args)
                if !negated && args.first().is_some_and(|&a| tm.is_arith(a)) =>
            {
                let mut nums: Vec<(TermId, BigRational)> = Vec::with_capacity(args.len());
                for &a in &args {
                    let Ok(r) = self.eval.eval_num(tm, model, a) else {
                        return false;
                    };
                    nums.push((a, r));
                }
                nums.sort_by(|a, b| a.1.cmp(&b.1));
                for w in nums.windows(2) {
                    debug_assert!(w[0].1 < w[1].1);
                    let pair = tm.mk_lt(w[0].0, w[1].0);
                    if !self.linearize_lit(tm, model, pair, fmls) {
                        return false;
                    }
                }
                return true;
            }
            TermKind::Distinct(args)
                if negated && args.first().is_some_and(|&a| tm.is_arith(a)) =>
            {
                // the model must equate some pair; take the first collision
                let mut values: FxHashMap<BigRational, TermId> = FxHashMap::default();
                let mut found = None;
                for &a in &args {
                    let Ok(r) = self.eval.eval_num(tm, model, a) else {
                        return false;
                    };
                    if let Some(&prev) = values.get(&r) {
                        found = Some((a, prev));
                        break;
                    }
                    values.insert(r, a);
                }
                let Some((a1, a2)) = found else {
                    debug_assert!(false, "negated distinct without a colliding pair");
                    return false;
                };
                self.linearize_term(tm, model, mul.clone(), a1, &mut c, fmls, &mut ts);
                self.linearize_term(tm, model, -mul, a2, &mut c, fmls, &mut ts);
                RowType::Eq
            }
            _ => {
                trace!(?lit, "skipping unrecognized literal");
                return false;
            }
        };
        let coeffs = self.extract_coeffs(tm, model, &ts);
        self.mbo.add_constraint(coeffs, c, ty);
        true
    }

    /// Accumulate `mul · t` into `(ts, c)`, committing to the model's branch
    /// at conditionals and reducing constant-modulus terms to a residue plus
    /// a divisibility row.
    fn linearize_term(
        &mut self,
        tm: &mut TermManager,
        model: &mut Model,
        mul: BigRational,
        t: TermId,
        c: &mut BigRational,
        fmls: &mut Vec<TermId>,
        ts: &mut FxHashMap<TermId, BigRational>,
    ) {
        match tm.kind(t).clone() {
            TermKind::Mul(args) => {
                let mut k = BigRational::one();
                let mut rest = Vec::new();
                for a in args {
                    match is_numeral(tm, a) {
                        Some(r) => k *= r,
                        None => rest.push(a),
                    }
                }
                match rest.len() {
                    0 => *c += &mul * &k,
                    1 => self.linearize_term(tm, model, &mul * &k, rest[0], c, fmls, ts),
                    // products of two or more variables are not linear
                    _ => insert_mul(ts, t, mul),
                }
            }
            TermKind::Add(args) => {
                for a in args {
                    self.linearize_term(tm, model, mul.clone(), a, c, fmls, ts);
                }
            }
            TermKind::Sub(a, b) => {
                self.linearize_term(tm, model, mul.clone(), a, c, fmls, ts);
                self.linearize_term(tm, model, -mul, b, c, fmls, ts);
            }
            TermKind::Neg(a) => self.linearize_term(tm, model, -mul, a, c, fmls, ts),
            TermKind::Num(r) => *c += &mul * &r,
            TermKind::Ite(guard, then_br, else_br) => {
                match self.eval.eval_bool(tm, model, guard) {
                    Ok(true) => {
                        // record the branch taken as a new conjunct
                        fmls.push(guard);
                        self.linearize_term(tm, model, mul, then_br, c, fmls, ts);
                    }
                    Ok(false) => {
                        let neg = tm.mk_not(guard);
                        fmls.push(neg);
                        self.linearize_term(tm, model, mul, else_br, c, fmls, ts);
                    }
                    Err(_) => {
                        debug_assert!(false, "conditional guard failed to evaluate");
                        insert_mul(ts, t, mul);
                    }
                }
            }
            TermKind::Mod(u, k) => {
                let modulus =
                    is_numeral(tm, k).filter(|m| m.is_integer() && m.is_positive());
                match (modulus, self.eval.eval_num(tm, model, t)) {
                    (Some(m), Ok(r)) => {
                        *c += &mul * &r;
                        // the model forces u ≡ r (mod m); add it as a side row
                        let mut ts0: FxHashMap<TermId, BigRational> = FxHashMap::default();
                        let mut c0 = -r;
                        self.linearize_term(
                            tm,
                            model,
                            BigRational::one(),
                            u,
                            &mut c0,
                            fmls,
                            &mut ts0,
                        );
                        let coeffs = self.extract_coeffs(tm, model, &ts0);
                        self.mbo.add_divides(coeffs, c0, m.to_integer());
                    }
                    _ => insert_mul(ts, t, mul),
                }
            }
            _ => insert_mul(ts, t, mul),
        }
    }

    /// Lift a surviving engine row back into a literal.
    fn lift_row(&self, tm: &mut TermManager, row: &Row) -> TermId {
        // a lone negative coefficient reads better as a lower bound
        if row.vars.len() == 1
            && row.vars[0].coeff.is_negative()
            && !matches!(row.ty, RowType::Mod(_))
        {
            let v = &row.vars[0];
            let x = self.index2expr[v.id];
            let is_int = tm.is_int(x);
            let t = if v.coeff == -BigRational::one() {
                x
            } else {
                let k = tm.mk_numeral(-v.coeff.clone(), is_int);
                tm.mk_mul(vec![k, x])
            };
            let s = tm.mk_numeral(row.coeff.clone(), is_int);
            return match row.ty {
                RowType::Lt => tm.mk_gt(t, s),
                RowType::Le => tm.mk_ge(t, s),
                RowType::Eq => tm.mk_eq(t, s),
                RowType::Mod(_) => unreachable!(),
            };
        }
        let mut parts = Vec::with_capacity(row.vars.len());
        let mut is_int = false;
        for v in &row.vars {
            let x = self.index2expr[v.id];
            is_int = tm.is_int(x);
            if v.coeff.is_one() {
                parts.push(x);
            } else {
                let k = tm.mk_numeral(v.coeff.clone(), is_int);
                parts.push(tm.mk_mul(vec![k, x]));
            }
        }
        let t = tm.mk_add(parts);
        let s = tm.mk_numeral(-row.coeff.clone(), is_int);
        match &row.ty {
            RowType::Lt => tm.mk_lt(t, s),
            RowType::Le => tm.mk_le(t, s),
            RowType::Eq => tm.mk_eq(t, s),
            RowType::Mod(m) => {
                let t = if row.coeff.is_zero() {
                    t
                } else {
                    tm.mk_sub(t, s)
                };
                let md = tm.mk_int(m.clone());
                let zero = tm.mk_int(BigInt::zero());
                let inner = tm.mk_mod(t, md);
                tm.mk_eq(inner, zero)
            }
        }
    }

    /// Check that every literal of `fmls` holds in the model.
    fn validate_model(&mut self, tm: &TermManager, model: &mut Model, fmls: &[TermId]) -> bool {
        let mut valid = true;
        for &f in fmls {
            if !self.eval.is_true(tm, model, f) {
                trace!(?f, "literal not satisfied");
                valid = false;
            }
        }
        valid
    }
}

impl ArithProjector {
    /// Create a projector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection statistics.
    pub fn stats(&self) -> &ArithProjectStats {
        &self.stats
    }

    /// Eliminate the arithmetic members of `vars` from the conjunction
    /// `fmls`, which must hold in `model`.
    ///
    /// On return `fmls` still holds in `model` and mentions none of the
    /// eliminated variables; `vars` is shrunk to the ones that were kept
    /// (non-arithmetic, or escaping into residue literals).
    pub fn project(
        &mut self,
        tm: &mut TermManager,
        model: &mut Model,
        vars: &mut Vec<TermId>,
        fmls: &mut Vec<TermId>,
    ) {
        if !vars.iter().any(|&v| tm.is_arith(v)) {
            return;
        }
        let mut ctx = ProjectCtx::new();

        // consume literals into rows; compact residue in place (the list may
        // grow behind the cursor as conditionals record their guards)
        let mut i = 0;
        let mut kept = 0;
        while i < fmls.len() {
            let f = fmls[i];
            if ctx.linearize_lit(tm, model, f, fmls) {
                self.stats.lits_consumed += 1;
            } else {
                fmls[kept] = f;
                kept += 1;
                self.stats.residue_lits += 1;
            }
            i += 1;
        }
        fmls.truncate(kept);

        ctx.eval.set_completion(true);
        let mut var_mark: FxHashSet<TermId> = FxHashSet::default();
        for &v in vars.iter() {
            var_mark.insert(v);
            if tm.is_arith(v) && !ctx.tids.contains_key(&v) {
                ctx.register(tm, model, v);
            }
        }

        // a variable occurring under a residue literal, or under another
        // engine term (which reappears in lifted rows), escapes the scope
        let mut fmls_mark: FxHashSet<TermId> = FxHashSet::default();
        for &f in fmls.iter() {
            traversal::mark_subterms(f, tm, &mut fmls_mark);
        }
        for &t in ctx.tids.keys() {
            if !var_mark.contains(&t) {
                traversal::mark_subterms(t, tm, &mut fmls_mark);
            }
        }

        let mut eliminable = Vec::new();
        vars.retain(|&v| {
            if tm.is_arith(v) && !fmls_mark.contains(&v) {
                eliminable.push(ctx.tids[&v]);
                false
            } else {
                true
            }
        });
        self.stats.vars_eliminated += eliminable.len() as u64;
        self.stats.vars_kept += vars.len() as u64;
        debug!(
            eliminated = eliminable.len(),
            kept = vars.len(),
            residue = fmls.len(),
            "projecting arithmetic variables"
        );
        trace!(engine = %ctx.mbo, "before projection");
        ctx.mbo.project(&eliminable);
        trace!(engine = %ctx.mbo, "after projection");

        for row in ctx.mbo.get_live_rows() {
            if row.vars.is_empty() {
                continue;
            }
            let lit = ctx.lift_row(tm, &row);
            debug_assert!(
                ctx.eval.is_true(tm, model, lit),
                "lifted row must hold in the model"
            );
            fmls.push(lit);
            self.stats.rows_lifted += 1;
        }
    }

    /// Eliminate a single variable; returns `true` on success.
    pub fn project_one(
        &mut self,
        tm: &mut TermManager,
        model: &mut Model,
        var: TermId,
        fmls: &mut Vec<TermId>,
    ) -> bool {
        let mut vars = vec![var];
        self.project(tm, model, &mut vars, fmls);
        vars.is_empty()
    }

    /// Maximize the real objective `objective` subject to `fmls`, which must
    /// hold in `model`.
    ///
    /// Returns the optimum together with witness bounds `(ge, gt)`: `ge` is
    /// the non-strict witness of attainability, `gt` the strict push an
    /// optimization loop asserts to demand a better value, `false` once the
    /// objective is unbounded. `model` is updated to an optimizing
    /// assignment for the registered uninterpreted constants.
    pub fn maximize(
        &mut self,
        tm: &mut TermManager,
        model: &mut Model,
        fmls0: &[TermId],
        objective: TermId,
    ) -> (InfEps, TermId, TermId) {
        debug_assert!(tm.is_real(objective));
        let mut ctx = ProjectCtx::new();
        let mut fmls: Vec<TermId> = fmls0.to_vec();

        let mut ts: FxHashMap<TermId, BigRational> = FxHashMap::default();
        let mut c = BigRational::zero();
        ctx.linearize_term(tm, model, BigRational::one(), objective, &mut c, &mut fmls, &mut ts);
        let coeffs = ctx.extract_coeffs(tm, model, &ts);
        ctx.mbo.set_objective(coeffs, c);
        debug_assert!(ctx.validate_model(tm, model, fmls0));

        // residue is irrelevant for the optimum; consume what linearizes
        let mut i = 0;
        while i < fmls.len() {
            let f = fmls[i];
            let _ = ctx.linearize_lit(tm, model, f, &mut fmls);
            i += 1;
        }

        let value = ctx.mbo.maximize();
        debug!(value = %value, "maximized objective");

        // move the optimizing assignment into the model
        for (&t, &id) in &ctx.tids {
            if matches!(tm.kind(t), TermKind::Var(_)) {
                model.assign(t, Value::Num(ctx.mbo.get_value(id)));
            } else {
                trace!(?t, "omitting model update for compound term");
            }
        }
        ctx.eval.invalidate_cache();
        let tval = ctx.eval.eval_num(tm, model, objective).unwrap_or_else(|_| {
            debug_assert!(false, "objective failed to evaluate after model update");
            BigRational::zero()
        });
        let tval_term = tm.mk_real(tval);
        let val_term = tm.mk_real(value.rational().clone());

        let (ge, gt) = if !value.is_finite() {
            (tm.mk_ge(objective, tval_term), tm.mk_false())
        } else if value.infinitesimal().is_negative() {
            // supremum is not attained: push toward it, witness what we have
            (
                tm.mk_ge(objective, tval_term),
                tm.mk_ge(objective, val_term),
            )
        } else {
            (
                tm.mk_ge(objective, val_term),
                tm.mk_gt(objective, val_term),
            )
        };
        debug_assert!(ctx.validate_model(tm, model, fmls0));
        (value, ge, gt)
    }

    /// Reserved for an equational solver; currently always `false`.
    pub fn solve(
        &mut self,
        _tm: &mut TermManager,
        _model: &mut Model,
        _vars: &mut Vec<TermId>,
        _fmls: &mut Vec<TermId>,
    ) -> bool {
        false
    }
}
