//! Model-Based Optimization engine for linear arithmetic.
//!
//! Stores linear rows `Σ cᵢ·xᵢ + c  R  0` over variables seeded with concrete
//! rational values, and supports two operations guided by those seeds:
//!
//! - [`ModelBasedOpt::project`]: eliminate variables while keeping the
//!   remaining rows true under the seeded values. Instead of full
//!   Fourier-Motzkin (all lower/upper pairs), the seed picks the single
//!   tightest bound and every other row is resolved against it, so each
//!   elimination produces at most one residue per row.
//! - [`ModelBasedOpt::maximize`]: push a linear objective to its optimum by
//!   repeatedly substituting the binding bound row, distinguishing attained
//!   maxima, strict suprema, and `+∞` via [`InfEps`].
//!
//! Divisibility rows `Σ cᵢ·xᵢ + c ≡ 0 (mod m)` are carried alongside the
//! inequalities and handled by the `x := u·y + z` substitution over the lcm
//! of the moduli.
//!
//! ## References
//!
//! - Z3's `math/opt/model_based_opt.cpp`
//! - Loos & Weispfenning: "Applying Linear Quantifier Elimination" (1993)
//! - Dantzig & Eaves: "Fourier-Motzkin Elimination and Its Dual" (1973)

use crate::inf_eps::InfEps;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use tracing::trace;

/// Engine variable identifier.
pub type VarId = usize;

/// Row comparison against zero, with the modulus attached for divisibility
/// rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowType {
    /// `Σ cᵢ·xᵢ + c ≤ 0`
    Le,
    /// `Σ cᵢ·xᵢ + c < 0`
    Lt,
    /// `Σ cᵢ·xᵢ + c = 0`
    Eq,
    /// `Σ cᵢ·xᵢ + c ≡ 0 (mod m)`
    Mod(BigInt),
}

impl RowType {
    fn is_strict(&self) -> bool {
        matches!(self, RowType::Lt)
    }
}

/// A coefficient entry `(id, coefficient)` of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    /// Engine variable the coefficient applies to.
    pub id: VarId,
    /// The coefficient.
    pub coeff: BigRational,
}

impl Var {
    /// Create a coefficient entry.
    pub fn new(id: VarId, coeff: BigRational) -> Self {
        Self { id, coeff }
    }
}

/// A linear row `Σ cᵢ·xᵢ + c  R  0`.
///
/// Coefficient entries are sorted by variable id and nonzero.
#[derive(Debug, Clone)]
pub struct Row {
    /// Coefficient entries, sorted by id.
    pub vars: Vec<Var>,
    /// Constant summand.
    pub coeff: BigRational,
    /// Comparison against zero.
    pub ty: RowType,
    /// Row value under the seeded variable values.
    value: BigRational,
    alive: bool,
}

impl Row {
    /// Coefficient of `x` in this row, if present.
    pub fn coeff_of(&self, x: VarId) -> Option<&BigRational> {
        self.vars
            .binary_search_by_key(&x, |v| v.id)
            .ok()
            .map(|i| &self.vars[i].coeff)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}*v{}", v.coeff, v.id)?;
        }
        if !self.coeff.is_zero() || self.vars.is_empty() {
            if !self.vars.is_empty() {
                write!(f, " + ")?;
            }
            write!(f, "{}", self.coeff)?;
        }
        match &self.ty {
            RowType::Le => write!(f, " <= 0"),
            RowType::Lt => write!(f, " < 0"),
            RowType::Eq => write!(f, " = 0"),
            RowType::Mod(m) => write!(f, " = 0 (mod {m})"),
        }
    }
}

#[derive(Debug, Clone)]
struct VarInfo {
    value: BigRational,
    is_int: bool,
}

#[derive(Debug, Clone)]
struct Objective {
    vars: Vec<Var>,
    coeff: BigRational,
}

/// Engine statistics.
#[derive(Debug, Clone, Default)]
pub struct MboStats {
    /// Rows added (constraints and divisibility rows).
    pub rows_added: u64,
    /// Variables eliminated by `project` (including internal fresh ones).
    pub vars_projected: u64,
    /// Bound resolutions performed.
    pub resolutions: u64,
    /// Objective substitution steps in `maximize`.
    pub maximize_steps: u64,
}

/// Model-based optimization engine.
#[derive(Debug, Default)]
pub struct ModelBasedOpt {
    vars: Vec<VarInfo>,
    rows: Vec<Row>,
    objective: Option<Objective>,
    retired: FxHashSet<VarId>,
    stats: MboStats,
}

fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let mut x = a.abs();
    let mut y = b.abs();
    while !y.is_zero() {
        let t = y.clone();
        y = &x % &y;
        x = t;
    }
    x
}

fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    (a / gcd(a, b) * b).abs()
}

/// Euclidean remainder: result in `[0, |m|)`.
fn mod_floor(a: &BigInt, m: &BigInt) -> BigInt {
    let m = m.abs();
    let r = a % &m;
    if r.is_negative() { r + m } else { r }
}

impl ModelBasedOpt {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine statistics.
    pub fn stats(&self) -> &MboStats {
        &self.stats
    }

    /// Register a variable with its seed value; returns a stable id.
    pub fn add_var(&mut self, value: BigRational, is_int: bool) -> VarId {
        debug_assert!(!is_int || value.is_integer());
        let id = self.vars.len();
        self.vars.push(VarInfo { value, is_int });
        id
    }

    /// Whether a variable is integer-sorted.
    pub fn is_int(&self, id: VarId) -> bool {
        self.vars[id].is_int
    }

    /// Current value of a variable. After [`maximize`](Self::maximize) this
    /// is the optimizing assignment.
    pub fn get_value(&self, id: VarId) -> BigRational {
        self.vars[id].value.clone()
    }

    /// Add a row `Σ cᵢ·xᵢ + c  R  0`. The row must be satisfied by the
    /// seeded values.
    pub fn add_constraint(&mut self, coeffs: Vec<Var>, c: BigRational, ty: RowType) {
        let row = self.normalize(coeffs, c, ty);
        debug_assert!(
            self.row_satisfied(&row),
            "row not satisfied under seed values: {row}"
        );
        trace!(row = %row, "adding row");
        self.stats.rows_added += 1;
        if !row.vars.is_empty() {
            self.rows.push(row);
        }
    }

    /// Add a divisibility row `Σ cᵢ·xᵢ + c ≡ 0 (mod m)` with `m > 0`.
    pub fn add_divides(&mut self, coeffs: Vec<Var>, c: BigRational, m: BigInt) {
        debug_assert!(m.is_positive());
        self.add_constraint(coeffs, c, RowType::Mod(m));
    }

    /// Record the objective `Σ cᵢ·xᵢ + c` to maximize. Unlike rows, the
    /// objective is never rescaled.
    pub fn set_objective(&mut self, coeffs: Vec<Var>, c: BigRational) {
        let vars = Self::merge_coeffs(coeffs);
        self.objective = Some(Objective { vars, coeff: c });
    }

    /// Rows still alive, for lifting back into the caller's representation.
    pub fn get_live_rows(&self) -> Vec<Row> {
        debug_assert!(self.rows.iter().all(|r| {
            !r.alive || r.vars.iter().all(|v| !self.retired.contains(&v.id))
        }));
        self.rows.iter().filter(|r| r.alive).cloned().collect()
    }

    fn eval_coeffs(&self, vars: &[Var], c: &BigRational) -> BigRational {
        vars.iter().fold(c.clone(), |acc, v| {
            acc + &v.coeff * &self.vars[v.id].value
        })
    }

    fn row_satisfied(&self, row: &Row) -> bool {
        match &row.ty {
            RowType::Le => !row.value.is_positive(),
            RowType::Lt => row.value.is_negative(),
            RowType::Eq => row.value.is_zero(),
            RowType::Mod(m) => {
                row.value.is_integer() && mod_floor(&row.value.to_integer(), m).is_zero()
            }
        }
    }

    /// Merge duplicate entries, drop zeros, sort by id.
    fn merge_coeffs(coeffs: Vec<Var>) -> Vec<Var> {
        let mut merged: FxHashMap<VarId, BigRational> = FxHashMap::default();
        for v in coeffs {
            *merged.entry(v.id).or_insert_with(BigRational::zero) += v.coeff;
        }
        let mut vars: Vec<Var> = merged
            .into_iter()
            .filter(|(_, q)| !q.is_zero())
            .map(|(id, q)| Var::new(id, q))
            .collect();
        vars.sort_by_key(|v| v.id);
        vars
    }

    /// Merge duplicate entries, drop zeros, scale all-integer rows to
    /// integral coefficients and reduce them by their common gcd when exact.
    fn normalize(&self, coeffs: Vec<Var>, c: BigRational, ty: RowType) -> Row {
        let mut vars = Self::merge_coeffs(coeffs);
        let mut c = c;
        let mut ty = ty;

        let all_int = !vars.is_empty() && vars.iter().all(|v| self.vars[v.id].is_int);
        if all_int {
            let mut scale = c.denom().clone();
            for v in &vars {
                scale = lcm(&scale, v.coeff.denom());
            }
            if !scale.is_one() {
                let s = BigRational::from_integer(scale.clone());
                for v in &mut vars {
                    v.coeff *= &s;
                }
                c *= &s;
                if let RowType::Mod(m) = &mut ty {
                    *m *= &scale;
                }
            }
            let mut g = c.numer().abs();
            for v in &vars {
                g = gcd(&g, v.coeff.numer());
            }
            if let RowType::Mod(m) = &ty {
                g = gcd(&g, m);
            }
            if g > BigInt::one() {
                let gr = BigRational::from_integer(g.clone());
                for v in &mut vars {
                    v.coeff /= &gr;
                }
                c /= &gr;
                if let RowType::Mod(m) = &mut ty {
                    *m /= &g;
                }
            }
        }
        // divisibility rows are sign-symmetric; present them positively
        if matches!(ty, RowType::Mod(_)) && vars.first().is_some_and(|v| v.coeff.is_negative()) {
            for v in &mut vars {
                v.coeff = -v.coeff.clone();
            }
            c = -c;
        }
        let value = self.eval_coeffs(&vars, &c);
        Row {
            vars,
            coeff: c,
            ty,
            value,
            alive: true,
        }
    }

    fn live_rows_with(&self, x: VarId) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive && r.coeff_of(x).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Eliminate the listed variables. Remaining live rows stay true under
    /// the seeded values and reference none of the eliminated ids.
    pub fn project(&mut self, ids: &[VarId]) {
        let mut pending: Vec<VarId> = ids.to_vec();
        while let Some(x) = pending.pop() {
            self.stats.vars_projected += 1;
            self.retired.insert(x);
            let live = self.live_rows_with(x);
            if live.is_empty() {
                continue;
            }
            trace!(x, rows = live.len(), "projecting variable");
            if live
                .iter()
                .any(|&i| matches!(self.rows[i].ty, RowType::Mod(_)))
            {
                let y = self.solve_mod(x, &live);
                pending.push(y);
                continue;
            }
            let eq = live
                .iter()
                .copied()
                .filter(|&i| self.rows[i].ty == RowType::Eq)
                .min_by(|&i, &j| {
                    let a = self.rows[i].coeff_of(x).unwrap().abs();
                    let b = self.rows[j].coeff_of(x).unwrap().abs();
                    a.cmp(&b)
                });
            if let Some(e) = eq {
                self.solve_for(e, x, &live);
                continue;
            }
            self.project_ineqs(x, &live);
        }
    }

    /// Substitute `x := u·y + z` where `u` is the lcm of the moduli of the
    /// divisibility rows on `x`, `z` the seeded residue, and `y` fresh.
    /// Divisibility rows lose `x` outright (`m | u`); the fresh `y` remains
    /// only in the other rows and is returned for elimination.
    fn solve_mod(&mut self, x: VarId, live: &[usize]) -> VarId {
        debug_assert!(self.vars[x].is_int);
        let mut u = BigInt::one();
        for &i in live {
            if let RowType::Mod(m) = &self.rows[i].ty {
                u = lcm(&u, m);
            }
        }
        let xi = self.vars[x].value.to_integer();
        let z = mod_floor(&xi, &u);
        let y_val = BigRational::from_integer((&xi - &z) / &u);
        let y = self.add_var(y_val, true);
        trace!(x, y, modulus = %u, residue = %z, "divisibility substitution");
        let ur = BigRational::from_integer(u);
        let zr = BigRational::from_integer(z);
        for &i in live {
            let mut row = self.rows[i].clone();
            let b = row.coeff_of(x).cloned().unwrap();
            row.vars.retain(|v| v.id != x);
            row.coeff += &b * &zr;
            if !matches!(row.ty, RowType::Mod(_)) {
                // y is the freshest id, so pushing keeps the sort order
                row.vars.push(Var::new(y, &b * &ur));
            }
            row.value = self.eval_coeffs(&row.vars, &row.coeff);
            debug_assert!(self.row_satisfied(&row));
            if row.vars.is_empty() {
                row.alive = false;
            }
            self.rows[i] = row;
        }
        y
    }

    /// Solve an equality row for `x` and substitute into the other rows.
    fn solve_for(&mut self, e_idx: usize, x: VarId, live: &[usize]) {
        let e = self.rows[e_idx].clone();
        let a = e.coeff_of(x).cloned().unwrap();
        trace!(x, row = %e, "solving equality");
        let all_int = e.vars.iter().all(|v| self.vars[v.id].is_int);
        if all_int && a.is_integer() && !a.abs().is_one() {
            // a·x = -(t + c) is solvable over the integers iff a | (t + c)
            let rest: Vec<Var> = e.vars.iter().filter(|v| v.id != x).cloned().collect();
            self.add_divides(rest, e.coeff.clone(), a.abs().to_integer());
        }
        for &i in live {
            if i == e_idx {
                continue;
            }
            let d = self.rows[i].clone();
            self.rows[i].alive = false;
            if let Some(r) = self.resolve(&e, &d, x) {
                self.rows.push(r);
            }
        }
        self.rows[e_idx].alive = false;
    }

    /// Eliminate `x` from pure-inequality rows by substituting the
    /// model-tightest lower bound (`glb`, or `glb + ε` when strict) into
    /// every other row. One-sided variables simply drop their rows.
    fn project_ineqs(&mut self, x: VarId, live: &[usize]) {
        let mut lower = Vec::new();
        let mut upper = Vec::new();
        for &i in live {
            if self.rows[i].coeff_of(x).unwrap().is_negative() {
                lower.push(i);
            } else {
                upper.push(i);
            }
        }
        if lower.is_empty() || upper.is_empty() {
            trace!(x, "one-sided variable; dropping its rows");
            for &i in live {
                self.rows[i].alive = false;
            }
            return;
        }
        let chosen = lower
            .iter()
            .copied()
            .max_by(|&i, &j| self.cmp_bound(i, j, x))
            .unwrap();
        let e = self.rows[chosen].clone();
        trace!(x, bound = %e, "substituting greatest lower bound");
        for &i in live {
            if i == chosen {
                continue;
            }
            let d = self.rows[i].clone();
            self.rows[i].alive = false;
            if let Some(r) = self.resolve(&e, &d, x) {
                self.rows.push(r);
            }
        }
        self.rows[chosen].alive = false;
    }

    /// The bound row `i` imposes on `x`, evaluated under the seeds.
    fn bound_value(&self, i: usize, x: VarId) -> BigRational {
        let r = &self.rows[i];
        let a = r.coeff_of(x).unwrap();
        &self.vars[x].value - &(&r.value / a)
    }

    /// Order two bound rows on `x` so the greatest lower bound compares
    /// greatest; ties prefer strict rows, then smaller coefficients. A
    /// strict row must win ties or the residue of the non-strict one would
    /// be falsified under the seeds.
    fn cmp_bound(&self, i: usize, j: usize, x: VarId) -> std::cmp::Ordering {
        self.bound_value(i, x)
            .cmp(&self.bound_value(j, x))
            .then_with(|| {
                self.rows[i]
                    .ty
                    .is_strict()
                    .cmp(&self.rows[j].ty.is_strict())
            })
            .then_with(|| {
                let a = self.rows[i].coeff_of(x).unwrap().abs();
                let b = self.rows[j].coeff_of(x).unwrap().abs();
                b.cmp(&a)
            })
    }

    /// Mirror of [`cmp_bound`](Self::cmp_bound) for the least upper bound:
    /// the tighter (smaller) bound compares greatest, strict rows still win
    /// ties.
    fn cmp_upper(&self, i: usize, j: usize, x: VarId) -> std::cmp::Ordering {
        self.bound_value(j, x)
            .cmp(&self.bound_value(i, x))
            .then_with(|| {
                self.rows[i]
                    .ty
                    .is_strict()
                    .cmp(&self.rows[j].ty.is_strict())
            })
            .then_with(|| {
                let a = self.rows[i].coeff_of(x).unwrap().abs();
                let b = self.rows[j].coeff_of(x).unwrap().abs();
                b.cmp(&a)
            })
    }

    /// Substitute the bound expressed by `e` for `x` into `d`:
    /// `new = |a|·d − sign(a)·b·e` with `a = e[x]`, `b = d[x]`.
    ///
    /// Returns `None` when the residue has no variables left (trivially
    /// true by construction).
    fn resolve(&mut self, e: &Row, d: &Row, x: VarId) -> Option<Row> {
        self.stats.resolutions += 1;
        let a = e.coeff_of(x).cloned().unwrap();
        let b = d.coeff_of(x).cloned().unwrap();
        let abs_a = a.abs();
        let k = if a.is_negative() { -b.clone() } else { b.clone() };
        let mut merged: FxHashMap<VarId, BigRational> = FxHashMap::default();
        for dv in &d.vars {
            *merged.entry(dv.id).or_insert_with(BigRational::zero) += &abs_a * &dv.coeff;
        }
        for ev in &e.vars {
            *merged.entry(ev.id).or_insert_with(BigRational::zero) -= &k * &ev.coeff;
        }
        let c = &abs_a * &d.coeff - &k * &e.coeff;
        let ty = match (&e.ty, &d.ty) {
            (RowType::Eq, RowType::Mod(m)) => {
                debug_assert!(abs_a.is_integer());
                RowType::Mod(m * abs_a.to_integer())
            }
            (RowType::Eq, t) => t.clone(),
            (_, RowType::Eq) | (_, RowType::Mod(_)) => {
                debug_assert!(false, "inequality bound resolved against {}", d);
                d.ty.clone()
            }
            (et, dt) => {
                let opposite = a.is_negative() != b.is_negative();
                let strict = if opposite {
                    et.is_strict() || dt.is_strict()
                } else {
                    dt.is_strict() && !et.is_strict()
                };
                if strict { RowType::Lt } else { RowType::Le }
            }
        };
        let coeffs: Vec<Var> = merged
            .into_iter()
            .map(|(id, q)| Var::new(id, q))
            .collect();
        let row = self.normalize(coeffs, c, ty);
        debug_assert!(self.row_satisfied(&row), "resolvent falsified: {row}");
        if row.vars.is_empty() {
            None
        } else {
            Some(row)
        }
    }

    /// Maximize the recorded objective. The returned value is `+∞`, an
    /// attained rational, or a strict supremum (negative infinitesimal).
    /// Variable values are moved to an optimizing assignment, readable via
    /// [`get_value`](Self::get_value).
    pub fn maximize(&mut self) -> InfEps {
        let Some(mut obj) = self.objective.clone() else {
            return InfEps::finite(BigRational::zero());
        };
        let mut strict_sup = false;
        // bound definitions x = Σ cᵢ·xᵢ + c, replayed in reverse at the end
        let mut defs: Vec<(VarId, Vec<Var>, BigRational)> = Vec::new();
        loop {
            let Some(v0) = obj.vars.first().cloned() else {
                break;
            };
            let x = v0.id;
            let c = v0.coeff;
            self.stats.maximize_steps += 1;
            let live = self.live_rows_with(x);
            if live
                .iter()
                .any(|&i| matches!(self.rows[i].ty, RowType::Mod(_)))
            {
                // movement is restricted to modulus steps; freeze at the seed
                obj.coeff += &c * &self.vars[x].value;
                obj.vars.retain(|v| v.id != x);
                continue;
            }
            let eq = live
                .iter()
                .copied()
                .filter(|&i| self.rows[i].ty == RowType::Eq)
                .min_by(|&i, &j| {
                    let a = self.rows[i].coeff_of(x).unwrap().abs();
                    let b = self.rows[j].coeff_of(x).unwrap().abs();
                    a.cmp(&b)
                });
            let chosen = match eq {
                Some(e) => e,
                None => {
                    let up = c.is_positive();
                    let bounds: Vec<usize> = live
                        .iter()
                        .copied()
                        .filter(|&i| {
                            self.rows[i].coeff_of(x).unwrap().is_positive() == up
                        })
                        .collect();
                    if bounds.is_empty() {
                        trace!(x, "objective unbounded");
                        return InfEps::infinite();
                    }
                    if up {
                        bounds
                            .iter()
                            .copied()
                            .max_by(|&i, &j| self.cmp_upper(i, j, x))
                            .unwrap()
                    } else {
                        bounds
                            .iter()
                            .copied()
                            .max_by(|&i, &j| self.cmp_bound(i, j, x))
                            .unwrap()
                    }
                }
            };
            let e = self.rows[chosen].clone();
            let a = e.coeff_of(x).cloned().unwrap();
            trace!(x, bound = %e, "objective bound substitution");
            // obj := obj − (c/a)·e eliminates x from the objective
            let f = &c / &a;
            let mut merged: FxHashMap<VarId, BigRational> = FxHashMap::default();
            for ov in &obj.vars {
                merged.insert(ov.id, ov.coeff.clone());
            }
            for ev in &e.vars {
                *merged.entry(ev.id).or_insert_with(BigRational::zero) -= &f * &ev.coeff;
            }
            obj.vars = merged
                .into_iter()
                .filter(|(_, q)| !q.is_zero())
                .map(|(id, q)| Var::new(id, q))
                .collect();
            obj.vars.sort_by_key(|v| v.id);
            obj.coeff -= &f * &e.coeff;
            let strict = e.ty.is_strict();
            if strict {
                strict_sup = true;
            }
            for &i in &live {
                if i == chosen {
                    continue;
                }
                let d = self.rows[i].clone();
                self.rows[i].alive = false;
                if let Some(r) = self.resolve(&e, &d, x) {
                    self.rows.push(r);
                }
            }
            self.rows[chosen].alive = false;
            self.retired.insert(x);
            if !strict {
                // x sits exactly on its bound: x = -(t + c)/a over e's rest
                let dvars: Vec<Var> = e
                    .vars
                    .iter()
                    .filter(|v| v.id != x)
                    .map(|v| Var::new(v.id, -(&v.coeff / &a)))
                    .collect();
                defs.push((x, dvars, -(&e.coeff / &a)));
            }
        }
        for (x, dvars, dc) in defs.iter().rev() {
            self.vars[*x].value = self.eval_coeffs(dvars, dc);
        }
        let value = obj.coeff.clone();
        self.objective = Some(obj);
        if strict_sup {
            InfEps::with_eps(value, -BigRational::one())
        } else {
            InfEps::finite(value)
        }
    }
}

impl fmt::Display for ModelBasedOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.vars.iter().enumerate() {
            writeln!(
                f,
                "v{} := {} {}",
                i,
                v.value,
                if v.is_int { "int" } else { "real" }
            )?;
        }
        for r in self.rows.iter().filter(|r| r.alive) {
            writeln!(f, "{r}")?;
        }
        if let Some(obj) = &self.objective {
            let as_row = Row {
                vars: obj.vars.clone(),
                coeff: obj.coeff.clone(),
                ty: RowType::Le,
                value: BigRational::zero(),
                alive: true,
            };
            writeln!(f, "maximize {as_row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn two_sided_bounds_collapse() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(4), true);
        // x - 5 <= 0, -x + 3 <= 0
        mbo.add_constraint(vec![Var::new(x, rat(1))], rat(-5), RowType::Le);
        mbo.add_constraint(vec![Var::new(x, rat(-1))], rat(3), RowType::Le);
        mbo.project(&[x]);
        assert!(mbo.get_live_rows().is_empty());
    }

    #[test]
    fn resolution_keeps_other_variable() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(3), true);
        let y = mbo.add_var(rat(2), true);
        // x + y - 10 <= 0, -x + y <= 0
        mbo.add_constraint(
            vec![Var::new(x, rat(1)), Var::new(y, rat(1))],
            rat(-10),
            RowType::Le,
        );
        mbo.add_constraint(
            vec![Var::new(x, rat(-1)), Var::new(y, rat(1))],
            rat(0),
            RowType::Le,
        );
        mbo.project(&[x]);
        let rows = mbo.get_live_rows();
        assert_eq!(rows.len(), 1);
        // 2y - 10 <= 0, gcd-reduced to y - 5 <= 0
        assert_eq!(rows[0].vars, vec![Var::new(y, rat(1))]);
        assert_eq!(rows[0].coeff, rat(-5));
        assert_eq!(rows[0].ty, RowType::Le);
    }

    #[test]
    fn equality_with_nonunit_coefficient_emits_divisibility() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(3), true);
        let y = mbo.add_var(rat(6), true);
        // 2x - y = 0, -x <= 0
        mbo.add_constraint(
            vec![Var::new(x, rat(2)), Var::new(y, rat(-1))],
            rat(0),
            RowType::Eq,
        );
        mbo.add_constraint(vec![Var::new(x, rat(-1))], rat(0), RowType::Le);
        mbo.project(&[x]);
        let rows = mbo.get_live_rows();
        assert_eq!(rows.len(), 2);
        let modrow = rows.iter().find(|r| matches!(r.ty, RowType::Mod(_))).unwrap();
        assert_eq!(modrow.ty, RowType::Mod(BigInt::from(2)));
        assert_eq!(modrow.vars, vec![Var::new(y, rat(1))]);
        let le = rows.iter().find(|r| r.ty == RowType::Le).unwrap();
        assert_eq!(le.vars, vec![Var::new(y, rat(-1))]);
    }

    #[test]
    fn divisibility_substitution_eliminates_variable() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(3), true);
        // x - 1 = 0 (mod 2), -x <= 0, x - 5 <= 0
        mbo.add_divides(vec![Var::new(x, rat(1))], rat(-1), BigInt::from(2));
        mbo.add_constraint(vec![Var::new(x, rat(-1))], rat(0), RowType::Le);
        mbo.add_constraint(vec![Var::new(x, rat(1))], rat(-5), RowType::Le);
        mbo.project(&[x]);
        assert!(mbo.get_live_rows().is_empty());
    }

    #[test]
    fn strict_bounds_stay_strict() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(1), false);
        let y = mbo.add_var(rat(2), false);
        let z = mbo.add_var(rat(3), false);
        // x - y < 0, y - z < 0
        mbo.add_constraint(
            vec![Var::new(x, rat(1)), Var::new(y, rat(-1))],
            rat(0),
            RowType::Lt,
        );
        mbo.add_constraint(
            vec![Var::new(y, rat(1)), Var::new(z, rat(-1))],
            rat(0),
            RowType::Lt,
        );
        mbo.project(&[x]);
        let rows = mbo.get_live_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ty, RowType::Lt);
        assert!(rows[0].coeff_of(y).is_some());
        assert!(rows[0].coeff_of(z).is_some());
    }

    #[test]
    fn maximize_bounded_moves_values() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(3), false);
        let y = mbo.add_var(rat(3), false);
        // x + y - 10 <= 0, -x <= 0, -y <= 0
        mbo.add_constraint(
            vec![Var::new(x, rat(1)), Var::new(y, rat(1))],
            rat(-10),
            RowType::Le,
        );
        mbo.add_constraint(vec![Var::new(x, rat(-1))], rat(0), RowType::Le);
        mbo.add_constraint(vec![Var::new(y, rat(-1))], rat(0), RowType::Le);
        mbo.set_objective(vec![Var::new(x, rat(1)), Var::new(y, rat(1))], rat(0));
        let v = mbo.maximize();
        assert!(v.is_finite());
        assert_eq!(*v.rational(), rat(10));
        assert!(v.infinitesimal().is_zero());
        assert_eq!(mbo.get_value(x) + mbo.get_value(y), rat(10));
    }

    #[test]
    fn maximize_unbounded() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(0), false);
        mbo.add_constraint(vec![Var::new(x, rat(-1))], rat(0), RowType::Le);
        mbo.set_objective(vec![Var::new(x, rat(1))], rat(0));
        let v = mbo.maximize();
        assert!(!v.is_finite());
    }

    #[test]
    fn maximize_strict_supremum() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(3), false);
        // x - 5 < 0
        mbo.add_constraint(vec![Var::new(x, rat(1))], rat(-5), RowType::Lt);
        mbo.set_objective(vec![Var::new(x, rat(1))], rat(0));
        let v = mbo.maximize();
        assert!(v.is_finite());
        assert_eq!(*v.rational(), rat(5));
        assert!(v.infinitesimal().is_negative());
        // the strict bound is never attained; the seed stays feasible
        assert_eq!(mbo.get_value(x), rat(3));
    }

    #[test]
    fn rational_bounds_survive() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(ratio(1, 2), false);
        let y = mbo.add_var(ratio(1, 3), false);
        // 2x - y - 1 <= 0, -x + y <= 0
        mbo.add_constraint(
            vec![Var::new(x, rat(2)), Var::new(y, rat(-1))],
            rat(-1),
            RowType::Le,
        );
        mbo.add_constraint(
            vec![Var::new(x, rat(-1)), Var::new(y, rat(1))],
            rat(0),
            RowType::Le,
        );
        mbo.project(&[x]);
        let rows = mbo.get_live_rows();
        assert_eq!(rows.len(), 1);
        // y <= 2x <= y + 1 under x >= y gives y - 1 <= 0
        assert!(rows[0].coeff_of(y).is_some());
    }

    #[test]
    fn display_is_readable() {
        let mut mbo = ModelBasedOpt::new();
        let x = mbo.add_var(rat(1), true);
        mbo.add_constraint(vec![Var::new(x, rat(1))], rat(-2), RowType::Le);
        let s = mbo.to_string();
        assert!(s.contains("v0 := 1 int"));
        assert!(s.contains("<= 0"));
    }
}
