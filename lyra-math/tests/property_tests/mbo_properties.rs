//! Property-based tests for the model-based optimization engine

use lyra_math::mbo::{ModelBasedOpt, RowType, Var, VarId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use proptest::prelude::*;

/// One generated row over three variables: coefficients and a slack that
/// keeps it satisfied under the seeds.
type RowCase = ([i8; 3], bool, i64);

fn row_strategy() -> impl Strategy<Value = Vec<RowCase>> {
    prop::collection::vec(
        ([(-3i8..=3), (-3i8..=3), (-3i8..=3)], any::<bool>(), 0i64..6),
        1..8,
    )
}

fn rat(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

fn seed_system(
    cases: &[RowCase],
    values: &[i64; 3],
) -> (ModelBasedOpt, [VarId; 3]) {
    let mut mbo = ModelBasedOpt::new();
    let ids = [
        mbo.add_var(rat(values[0]), true),
        mbo.add_var(rat(values[1]), true),
        mbo.add_var(rat(values[2]), true),
    ];
    for (coeffs, strict, slack) in cases {
        let mut row = Vec::new();
        let mut value = 0i64;
        for i in 0..3 {
            let c = coeffs[i] as i64;
            if c != 0 {
                row.push(Var::new(ids[i], rat(c)));
                value += c * values[i];
            }
        }
        // row value + constant must come out negative enough to satisfy
        let c = -value - slack - 1;
        let ty = if *strict { RowType::Lt } else { RowType::Le };
        mbo.add_constraint(row, rat(c), ty);
    }
    (mbo, ids)
}

proptest! {
    /// Projection removes the id and keeps every surviving row satisfied.
    #[test]
    fn project_removes_id(cases in row_strategy(), mx in -10i64..10, my in -10i64..10, mz in -10i64..10) {
        let values = [mx, my, mz];
        let (mut mbo, ids) = seed_system(&cases, &values);
        mbo.project(&[ids[0]]);
        for row in mbo.get_live_rows() {
            prop_assert!(row.coeff_of(ids[0]).is_none());
            // rows carry their seed value; re-check satisfaction externally
            let mut value = row.coeff.clone();
            for v in &row.vars {
                value += &v.coeff * mbo.get_value(v.id);
            }
            match row.ty {
                RowType::Le => prop_assert!(value <= BigRational::zero()),
                RowType::Lt => prop_assert!(value < BigRational::zero()),
                _ => prop_assert!(false, "unexpected row type from inequalities"),
            }
        }
    }

    /// The optimum is never below the seeded objective value.
    #[test]
    fn maximize_dominates_seed(cases in row_strategy(), mx in -10i64..10, my in -10i64..10, mz in -10i64..10, c1 in -3i64..=3, c2 in -3i64..=3) {
        let values = [mx, my, mz];
        let (mut mbo, ids) = seed_system(&cases, &values);
        let seeded = c1 * mx + c2 * my;
        mbo.set_objective(
            vec![Var::new(ids[0], rat(c1)), Var::new(ids[1], rat(c2))],
            BigRational::zero(),
        );
        let value = mbo.maximize();
        if value.is_finite() {
            prop_assert!(*value.rational() >= rat(seeded));
        }
    }
}
