//! Normalization of the list of top-level constraints.

use crate::model::expr::{Expr, Operator};

/// Split the top-level conjunctions in `constraints` into separate constraints.
///
/// Constraints that trivially hold are removed, whereas a trivially violated
/// constraint is kept so that the result remains unsatisfiable.
pub fn toplevel_list<I: IntoIterator<Item = Expr>>(constraints: I) -> Vec<Expr> {
	let mut result = Vec::new();
	for c in constraints {
		push_toplevel(c, &mut result);
	}
	result
}

/// Add `constraint` to `out`, splitting it if it is a conjunction.
fn push_toplevel(constraint: Expr, out: &mut Vec<Expr>) {
	match &constraint {
		Expr::Bool(true) => {}
		Expr::Op(op) => match op.as_ref() {
			Operator::And(args) => {
				for arg in args {
					push_toplevel(arg.clone(), out);
				}
			}
			_ => out.push(constraint),
		},
		_ => out.push(constraint),
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;

	use crate::{model::expr::Expr, reformulate::normalize::toplevel_list, Model};

	#[test]
	fn test_toplevel_list() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=3).unwrap();
		let b = prb.new_bool_vars(2);

		let cons = toplevel_list([
			Expr::all([x.leq(2), Expr::all([b[0].into(), Expr::Bool(true)]) & b[1].into()]),
			Expr::Bool(true),
			Expr::from(b[0]) | b[1].into(),
			Expr::Bool(false),
		]);
		expect![[r#"
    IV0 <= 2
    BV1
    BV2
    or([BV1, BV2])
    false"#]]
		.assert_eq(&cons.iter().join("\n"));
	}
}
