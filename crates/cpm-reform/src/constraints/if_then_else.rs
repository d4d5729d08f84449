//! Structures and decomposition for the `ite` constraint.

use crate::{
	constraints::{check_boolean_args, BoolGlobal, Decomposition},
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `ite` (if-then-else) constraint within a model.
pub struct IfThenElse {
	/// Condition that selects the branch to enforce.
	pub(crate) condition: Expr,
	/// Constraint enforced when the condition holds.
	pub(crate) if_true: Expr,
	/// Constraint enforced when the condition does not hold.
	pub(crate) if_false: Expr,
}

impl IfThenElse {
	/// Create a new if-then-else constraint.
	///
	/// Fails if any of the arguments is not Boolean.
	pub fn new(condition: Expr, if_true: Expr, if_false: Expr) -> Result<Self, ModelError> {
		let c = Self {
			condition,
			if_true,
			if_false,
		};
		check_boolean_args("ite", &c.args())?;
		Ok(c)
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			condition: f(&self.condition)?,
			if_true: f(&self.if_true)?,
			if_false: f(&self.if_false)?,
		})
	}
}

impl BoolGlobal for IfThenElse {
	fn name(&self) -> &'static str {
		"ite"
	}

	fn args(&self) -> Vec<Expr> {
		vec![
			self.condition.clone(),
			self.if_true.clone(),
			self.if_false.clone(),
		]
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		Decomposition::constraining(vec![
			self.condition.implies(self.if_true.clone()),
			self.condition.negated().implies(self.if_false.clone()),
		])
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		if self.condition.holds(sol)? {
			self.if_true.holds(sol)
		} else {
			self.if_false.holds(sol)
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;

	use crate::{
		constraints::BoolGlobal,
		if_then_else,
		model::{eval::Assignment, ModelError},
		tests::{expect_solutions, global},
		Model,
	};

	#[test]
	fn test_if_then_else() {
		let mut prb = Model::default();
		let b = prb.new_bool_var();
		let x = prb.new_int_var(0..=3).unwrap();
		let c = if_then_else(b, x.geq(2), x.eq(0)).unwrap();
		expect!["ite(BV0, IV1 >= 2, IV1 == 0)"].assert_eq(&c.to_string());

		// The unselected branch is not evaluated
		let sol = Assignment::default().with(b, 1).with(x, 3);
		assert_eq!(global(&c).value(&sol), Some(true));

		let dec = global(&c).decompose(prb.store_mut());
		expect![[r#"
    BV0 -> (IV1 >= 2)
    ~BV0 -> (IV1 == 0)"#]]
		.assert_eq(&dec.constraining.iter().join("\n"));
		expect_solutions(
			&dec.constraining,
			&[b, x],
			expect![[r#"
    0, 0
    1, 2
    1, 3"#]],
		);
	}

	#[test]
	fn test_if_then_else_arguments() {
		let mut prb = Model::default();
		let b = prb.new_bool_var();
		let x = prb.new_int_var(0..=3).unwrap();
		assert_eq!(
			if_then_else(b, x, x.eq(1)),
			Err(ModelError::NonBooleanArgument {
				name: "ite",
				arg: "IV1".to_owned()
			})
		);
	}
}
