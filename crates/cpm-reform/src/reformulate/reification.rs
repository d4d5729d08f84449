//! Rewriting of reified constraints into implications.

use tracing::{debug, trace};

use crate::{
	model::{
		expr::{CmpOp, Expr},
		var::VarStore,
	},
	reformulate::{flatten::flatten, TransformError},
};

/// Replace every reification `flat-bool == lit` in a list of flat constraints
/// by the two implications `lit -> flat-bool` and `!lit -> !flat-bool`.
///
/// The negated side is flattened again. Reifications of global constraints and
/// direct constraints are kept, since their negation cannot be expressed
/// without decomposing them.
pub fn only_implies(constraints: Vec<Expr>, store: &mut VarStore) -> Result<Vec<Expr>, TransformError> {
	let mut result = Vec::with_capacity(constraints.len());
	let mut rewritten = 0;
	for c in constraints {
		match &c {
			Expr::Cmp(cmp)
				if cmp.op == CmpOp::Eq
					&& cmp.lhs.is_bool()
					&& !cmp.lhs.is_literal()
					&& cmp.rhs.is_literal()
					&& !matches!(cmp.lhs, Expr::Global(_) | Expr::Direct(_)) =>
			{
				trace!(constraint = %c, "rewrite reification");
				let lit = &cmp.rhs;
				let implied = vec![lit.implies(cmp.lhs.clone()), lit.negated().implies(cmp.lhs.negated())];
				result.extend(flatten(implied, store)?);
				rewritten += 1;
			}
			_ => result.push(c),
		}
	}
	debug!(rewritten, constraints = result.len(), "rewrote reifications to implications");
	Ok(result)
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use tracing_test::traced_test;

	use crate::{
		all_different,
		model::expr::Expr,
		reformulate::{flatten::flatten, reification::only_implies},
		tests::assert_equivalent,
		Model,
	};

	#[test]
	#[traced_test]
	fn test_only_implies() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=3).unwrap();
		let y = prb.new_int_var(0..=3).unwrap();
		let b = prb.new_bool_vars(3);
		let cons = vec![
			Expr::from(b[0]).eq(x.lt(y)),
			Expr::from(b[1]).eq(Expr::from(b[0]) | Expr::from(b[2])),
			Expr::from(b[2]).eq(all_different([x, y])),
		];

		let flat = flatten(cons.clone(), prb.store_mut()).unwrap();
		let implied = only_implies(flat, prb.store_mut()).unwrap();
		expect![[r#"
    BV2 -> (IV0 < IV1)
    ~BV2 -> (IV0 >= IV1)
    BV3 -> or([BV2, BV4])
    ~BV3 -> and([~BV2, ~BV4])
    alldifferent(IV0, IV1) == BV4"#]]
		.assert_eq(&implied.iter().join("\n"));
		assert_equivalent(&cons, &implied, &[x, y, b[0], b[1], b[2]]);
	}
}
