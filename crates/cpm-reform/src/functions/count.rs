//! Structures and decomposition for the `count` function.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	constraints::{try_map_all, values_of, Decomposition},
	functions::NumGlobal,
	model::{
		eval::Assignment,
		expr::{CmpOp, Comparison, Expr},
		var::VarStore,
	},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `count` function within a model.
///
/// The function takes the number of expressions in `array` that are equal to
/// `value`.
pub struct Count {
	/// The expressions that are counted.
	pub(crate) array: Vec<Expr>,
	/// The value that is counted.
	pub(crate) value: Expr,
}

impl Count {
	/// Create a copy of the function with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			array: try_map_all(&self.array, f)?,
			value: f(&self.value)?,
		})
	}
}

impl NumGlobal for Count {
	fn name(&self) -> &'static str {
		"count"
	}

	fn args(&self) -> Vec<Expr> {
		let mut args = self.array.clone();
		args.push(self.value.clone());
		args
	}

	fn bounds(&self) -> (IntVal, IntVal) {
		(0, self.array.len() as IntVal)
	}

	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, _: &mut VarStore) -> Decomposition {
		let occurrences = Expr::sum(self.array.iter().map(|a| a.eq(self.value.clone())));
		Decomposition::constraining(vec![Comparison::new(op, occurrences, rhs).into()])
	}

	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		let val = self.value.value(sol)?;
		let vals = values_of(&self.array, sol)?;
		Some(vals.into_iter().filter(|&v| v == val).count() as IntVal)
	}
}

impl Display for Count {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}([{}], {})",
			self.name(),
			self.array.iter().format(", "),
			self.value
		)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use proptest::prelude::*;

	use crate::{
		count,
		functions::NumGlobal,
		model::{
			eval::Assignment,
			expr::{CmpOp, Expr},
		},
		tests::function,
		Model,
	};

	#[test]
	fn test_count_decomposition() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(3, 0..=2).unwrap();
		let c = count(x, 1);
		assert_eq!(c.bounds(), (0, 3));

		let dec = function(&c).decompose_comparison(CmpOp::Ge, Expr::Int(2), prb.store_mut());
		expect!["sum([IV0 == 1, IV1 == 1, IV2 == 1]) >= 2"]
			.assert_eq(&dec.constraining.iter().join(", "));
	}

	proptest! {
		#[test]
		fn prop_decomposition_agrees(vals in proptest::collection::vec(0..=2_i64, 4), rhs in 0..=4_i64) {
			let mut prb = Model::default();
			let x = prb.new_int_vars(3, 0..=2).unwrap();
			let v = prb.new_int_var(0..=2).unwrap();
			let sol: Assignment = x.iter().copied().chain([v]).zip_eq(vals.iter().copied()).collect();

			let c = count(x.clone(), v);
			let expected = vals[..3].iter().filter(|&&a| a == vals[3]).count() as i64;
			prop_assert_eq!(c.value(&sol), Some(expected));

			let dec = function(&c).decompose_comparison(CmpOp::Eq, Expr::Int(rhs), prb.store_mut());
			prop_assert_eq!(Some(expected == rhs), Expr::all(dec.constraining).holds(&sol));
		}
	}
}
