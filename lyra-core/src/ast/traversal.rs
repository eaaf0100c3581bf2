//! Iterative term traversal helpers.

use super::{TermId, TermKind, TermManager};
use rustc_hash::FxHashSet;

fn push_children(kind: &TermKind, queue: &mut Vec<TermId>) {
    match kind {
        TermKind::True | TermKind::False | TermKind::Var(_) | TermKind::Num(_) => {}
        TermKind::Add(args)
        | TermKind::Mul(args)
        | TermKind::Distinct(args)
        | TermKind::And(args)
        | TermKind::Or(args) => queue.extend(args),
        TermKind::Neg(a) | TermKind::Not(a) => queue.push(*a),
        TermKind::Sub(a, b)
        | TermKind::Mod(a, b)
        | TermKind::Le(a, b)
        | TermKind::Lt(a, b)
        | TermKind::Ge(a, b)
        | TermKind::Gt(a, b)
        | TermKind::Eq(a, b) => {
            queue.push(*a);
            queue.push(*b);
        }
        TermKind::Ite(c, t, e) => {
            queue.push(*c);
            queue.push(*t);
            queue.push(*e);
        }
    }
}

/// Mark `root` and all its sub-terms into `marked`.
pub fn mark_subterms(root: TermId, tm: &TermManager, marked: &mut FxHashSet<TermId>) {
    let mut queue = vec![root];
    while let Some(t) = queue.pop() {
        if !marked.insert(t) {
            continue;
        }
        push_children(tm.kind(t), &mut queue);
    }
}

/// Collect the uninterpreted constants occurring in `root`.
pub fn collect_vars(root: TermId, tm: &TermManager) -> FxHashSet<TermId> {
    let mut subterms = FxHashSet::default();
    mark_subterms(root, tm, &mut subterms);
    subterms
        .into_iter()
        .filter(|&t| matches!(tm.kind(t), TermKind::Var(_)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn marks_transitively() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let y = tm.mk_var("y", tm.sorts.int_sort);
        let two = tm.mk_int(BigInt::from(2));
        let prod = tm.mk_mul(vec![two, x]);
        let sum = tm.mk_add(vec![prod, y]);
        let lit = tm.mk_le(sum, two);

        let mut marked = FxHashSet::default();
        mark_subterms(lit, &tm, &mut marked);
        for t in [lit, sum, prod, two, x, y] {
            assert!(marked.contains(&t));
        }
    }

    #[test]
    fn collects_only_vars() {
        let mut tm = TermManager::new();
        let x = tm.mk_var("x", tm.sorts.int_sort);
        let five = tm.mk_int(BigInt::from(5));
        let lit = tm.mk_lt(x, five);

        let vars = collect_vars(lit, &tm);
        assert!(vars.contains(&x));
        assert_eq!(vars.len(), 1);
    }
}
