//! Arena-allocated, hash-consed terms.
//!
//! [`TermManager`] owns every term and hands out [`TermId`] handles.
//! Building the same kind at the same sort twice returns the same id, so id
//! equality is structural equality and terms can key hash maps directly.

pub mod traversal;

use crate::sort::{SortId, SortKind, Sorts};
use lasso::{Rodeo, Spur};
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashMap;

/// Term identifier: an index into the manager's term store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

/// The shape of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Boolean constant `true`.
    True,
    /// Boolean constant `false`.
    False,
    /// Uninterpreted constant (nullary symbol).
    Var(Spur),
    /// Numeric literal; the term's sort separates `Int` from `Real`.
    Num(BigRational),
    /// N-ary sum.
    Add(Vec<TermId>),
    /// N-ary product.
    Mul(Vec<TermId>),
    /// Difference.
    Sub(TermId, TermId),
    /// Unary minus.
    Neg(TermId),
    /// Integer modulus.
    Mod(TermId, TermId),
    /// Less-or-equal.
    Le(TermId, TermId),
    /// Strictly-less.
    Lt(TermId, TermId),
    /// Greater-or-equal.
    Ge(TermId, TermId),
    /// Strictly-greater.
    Gt(TermId, TermId),
    /// Equality.
    Eq(TermId, TermId),
    /// Pairwise disequality.
    Distinct(Vec<TermId>),
    /// Negation.
    Not(TermId),
    /// N-ary conjunction.
    And(Vec<TermId>),
    /// N-ary disjunction.
    Or(Vec<TermId>),
    /// If-then-else.
    Ite(TermId, TermId, TermId),
}

/// A term: its kind plus its sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// Shape of the term.
    pub kind: TermKind,
    /// Sort of the term.
    pub sort: SortId,
}

/// Hash-consing term store.
pub struct TermManager {
    terms: Vec<Term>,
    cache: FxHashMap<Term, TermId>,
    names: Rodeo,
    sort_kinds: Vec<SortKind>,
    /// Well-known sorts.
    pub sorts: Sorts,
}

impl TermManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        let (sorts, sort_kinds) = Sorts::new();
        Self {
            terms: Vec::new(),
            cache: FxHashMap::default(),
            names: Rodeo::default(),
            sort_kinds,
            sorts,
        }
    }

    fn intern(&mut self, kind: TermKind, sort: SortId) -> TermId {
        let term = Term { kind, sort };
        if let Some(&id) = self.cache.get(&term) {
            return id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(term.clone());
        self.cache.insert(term, id);
        id
    }

    /// Look up a term by id.
    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.0 as usize)
    }

    /// Kind of a term.
    pub fn kind(&self, id: TermId) -> &TermKind {
        &self.terms[id.0 as usize].kind
    }

    /// Sort of a term.
    pub fn sort(&self, id: TermId) -> SortId {
        self.terms[id.0 as usize].sort
    }

    /// Kind of a sort.
    pub fn sort_kind(&self, sort: SortId) -> SortKind {
        self.sort_kinds[sort.0 as usize]
    }

    /// Whether the term has the integer sort.
    pub fn is_int(&self, id: TermId) -> bool {
        self.sort(id) == self.sorts.int_sort
    }

    /// Whether the term has the real sort.
    pub fn is_real(&self, id: TermId) -> bool {
        self.sort(id) == self.sorts.real_sort
    }

    /// Whether the term has an arithmetic sort.
    pub fn is_arith(&self, id: TermId) -> bool {
        self.is_int(id) || self.is_real(id)
    }

    /// Resolve an interned name.
    pub fn resolve_str(&self, name: Spur) -> &str {
        self.names.resolve(&name)
    }

    /// Number of distinct terms created.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    fn arith_sort(&self, args: &[TermId]) -> SortId {
        if args.iter().any(|&a| self.is_real(a)) {
            self.sorts.real_sort
        } else {
            self.sorts.int_sort
        }
    }

    /// `true`.
    pub fn mk_true(&mut self) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::True, sort)
    }

    /// `false`.
    pub fn mk_false(&mut self) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::False, sort)
    }

    /// Boolean constant.
    pub fn mk_bool(&mut self, b: bool) -> TermId {
        if b { self.mk_true() } else { self.mk_false() }
    }

    /// Uninterpreted constant of the given sort.
    pub fn mk_var(&mut self, name: &str, sort: SortId) -> TermId {
        let spur = self.names.get_or_intern(name);
        self.intern(TermKind::Var(spur), sort)
    }

    /// Integer literal.
    pub fn mk_int(&mut self, n: BigInt) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::Num(BigRational::from_integer(n)), sort)
    }

    /// Real literal.
    pub fn mk_real(&mut self, r: BigRational) -> TermId {
        let sort = self.sorts.real_sort;
        self.intern(TermKind::Num(r), sort)
    }

    /// Numeric literal at the sort suggested by `is_int`. A non-integral
    /// value is a real literal regardless.
    pub fn mk_numeral(&mut self, r: BigRational, is_int: bool) -> TermId {
        if is_int && r.is_integer() {
            self.mk_int(r.to_integer())
        } else {
            self.mk_real(r)
        }
    }

    /// N-ary sum. A singleton is returned as-is.
    pub fn mk_add(&mut self, args: Vec<TermId>) -> TermId {
        debug_assert!(!args.is_empty());
        if args.len() == 1 {
            return args[0];
        }
        let sort = self.arith_sort(&args);
        self.intern(TermKind::Add(args), sort)
    }

    /// N-ary product. A singleton is returned as-is.
    pub fn mk_mul(&mut self, args: Vec<TermId>) -> TermId {
        debug_assert!(!args.is_empty());
        if args.len() == 1 {
            return args[0];
        }
        let sort = self.arith_sort(&args);
        self.intern(TermKind::Mul(args), sort)
    }

    /// Difference.
    pub fn mk_sub(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.arith_sort(&[lhs, rhs]);
        self.intern(TermKind::Sub(lhs, rhs), sort)
    }

    /// Unary minus.
    pub fn mk_neg(&mut self, arg: TermId) -> TermId {
        let sort = self.sort(arg);
        self.intern(TermKind::Neg(arg), sort)
    }

    /// Integer modulus.
    pub fn mk_mod(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern(TermKind::Mod(lhs, rhs), sort)
    }

    /// `lhs <= rhs`.
    pub fn mk_le(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Le(lhs, rhs), sort)
    }

    /// `lhs < rhs`.
    pub fn mk_lt(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Lt(lhs, rhs), sort)
    }

    /// `lhs >= rhs`.
    pub fn mk_ge(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Ge(lhs, rhs), sort)
    }

    /// `lhs > rhs`.
    pub fn mk_gt(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Gt(lhs, rhs), sort)
    }

    /// Equality.
    pub fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Eq(lhs, rhs), sort)
    }

    /// Pairwise disequality.
    pub fn mk_distinct(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Distinct(args), sort)
    }

    /// Negation; collapses double negation and Boolean constants.
    pub fn mk_not(&mut self, arg: TermId) -> TermId {
        match self.kind(arg) {
            TermKind::Not(inner) => *inner,
            TermKind::True => self.mk_false(),
            TermKind::False => self.mk_true(),
            _ => {
                let sort = self.sorts.bool_sort;
                self.intern(TermKind::Not(arg), sort)
            }
        }
    }

    /// N-ary conjunction.
    pub fn mk_and(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::And(args), sort)
    }

    /// N-ary disjunction.
    pub fn mk_or(&mut self, args: Vec<TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern(TermKind::Or(args), sort)
    }

    /// If-then-else; sorted by the then-branch.
    pub fn mk_ite(&mut self, cond: TermId, then_br: TermId, else_br: TermId) -> TermId {
        let sort = self.sort(then_br);
        self.intern(TermKind::Ite(cond, then_br, else_br), sort)
    }
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_consing_reuses_ids() {
        let mut tm = TermManager::new();
        let x1 = tm.mk_var("x", tm.sorts.int_sort);
        let x2 = tm.mk_var("x", tm.sorts.int_sort);
        assert_eq!(x1, x2);

        let five1 = tm.mk_int(BigInt::from(5));
        let five2 = tm.mk_int(BigInt::from(5));
        assert_eq!(five1, five2);

        let a = tm.mk_le(x1, five1);
        let b = tm.mk_le(x2, five2);
        assert_eq!(a, b);
    }

    #[test]
    fn same_name_different_sort_differs() {
        let mut tm = TermManager::new();
        let xi = tm.mk_var("x", tm.sorts.int_sort);
        let xr = tm.mk_var("x", tm.sorts.real_sort);
        assert_ne!(xi, xr);
        assert!(tm.is_int(xi));
        assert!(tm.is_real(xr));
    }

    #[test]
    fn double_negation_collapses() {
        let mut tm = TermManager::new();
        let p = tm.mk_var("p", tm.sorts.bool_sort);
        let np = tm.mk_not(p);
        let nnp = tm.mk_not(np);
        assert_eq!(nnp, p);
    }

    #[test]
    fn numeral_sort_selection() {
        let mut tm = TermManager::new();
        let i = tm.mk_numeral(BigRational::from_integer(BigInt::from(3)), true);
        assert!(tm.is_int(i));
        let half = BigRational::new(BigInt::from(1), BigInt::from(2));
        // a fractional value cannot be an integer literal
        let r = tm.mk_numeral(half, true);
        assert!(tm.is_real(r));
    }

    #[test]
    fn mixed_sum_is_real() {
        let mut tm = TermManager::new();
        let xi = tm.mk_var("x", tm.sorts.int_sort);
        let yr = tm.mk_var("y", tm.sorts.real_sort);
        let s = tm.mk_add(vec![xi, yr]);
        assert!(tm.is_real(s));
    }

    #[test]
    fn singleton_add_returns_argument() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        assert_eq!(tm.mk_add(vec![x]), x);
        assert_eq!(tm.mk_mul(vec![x]), x);
    }
}
