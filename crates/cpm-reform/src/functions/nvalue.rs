//! Structures and decomposition for the `nvalue` function.

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
/// Representation of the `nvalue` function within a model.
///
/// The function takes the number of distinct values among the expressions in
/// `array`.
pub struct NValue {
	/// The expressions of which the distinct values are counted.
	pub(crate) array: Vec<Expr>,
}

impl NValue {
	/// Create a copy of the function with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			array: try_map_all(&self.array, f)?,
		})
	}
}

impl NumGlobal for NValue {
	fn name(&self) -> &'static str {
		"nvalue"
	}

	fn args(&self) -> Vec<Expr> {
		self.array.clone()
	}

	fn bounds(&self) -> (IntVal, IntVal) {
		let n = self.array.len() as IntVal;
		(n.min(1), n)
	}

	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, _: &mut VarStore) -> Decomposition {
		let (lbs, ubs): (Vec<_>, Vec<_>) = self.array.iter().map(Expr::bounds).unzip();
		let lb = lbs.into_iter().min().unwrap_or(0);
		let ub = ubs.into_iter().max().unwrap_or(-1);
		// Every value in the combined domain contributes one when it is taken
		let taken = (lb..=ub).map(|v| Expr::any(self.array.iter().map(|a| a.eq(v))));
		Decomposition::constraining(vec![Comparison::new(op, Expr::sum(taken), rhs).into()])
	}

	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		Some(values_of(&self.array, sol)?.into_iter().unique().count() as IntVal)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use proptest::prelude::*;

	use crate::{
		functions::NumGlobal,
		model::{
			eval::Assignment,
			expr::{CmpOp, Expr},
		},
		nvalue,
		tests::function,
		Model,
	};

	#[test]
	fn test_nvalue_decomposition() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(2, 1..=2).unwrap();
		let c = nvalue(x);
		assert_eq!(c.bounds(), (1, 2));

		let dec = function(&c).decompose_comparison(CmpOp::Le, Expr::Int(1), prb.store_mut());
		expect!["sum([or([IV0 == 1, IV1 == 1]), or([IV0 == 2, IV1 == 2])]) <= 1"]
			.assert_eq(&dec.constraining.iter().join(", "));
	}

	#[test]
	fn test_nvalue_empty() {
		let mut prb = Model::default();
		let c = nvalue(Vec::<Expr>::new());
		assert_eq!(c.bounds(), (0, 0));
		assert_eq!(c.value(&Assignment::default()), Some(0));
		let dec = function(&c).decompose_comparison(CmpOp::Eq, Expr::Int(0), prb.store_mut());
		assert_eq!(Expr::all(dec.constraining).holds(&Assignment::default()), Some(true));
	}

	proptest! {
		#[test]
		fn prop_decomposition_agrees(vals in proptest::collection::vec(-1..=2_i64, 3), rhs in 0..=3_i64) {
			let mut prb = Model::default();
			let x = prb.new_int_vars(3, -1..=2).unwrap();
			let sol: Assignment = x.iter().copied().zip_eq(vals.iter().copied()).collect();

			let c = nvalue(x.clone());
			let expected = vals.iter().unique().count() as i64;
			prop_assert_eq!(c.value(&sol), Some(expected));

			for op in [CmpOp::Eq, CmpOp::Lt, CmpOp::Ge] {
				let dec = function(&c).decompose_comparison(op, Expr::Int(rhs), prb.store_mut());
				prop_assert_eq!(Some(op.holds(expected, rhs)), Expr::all(dec.constraining).holds(&sol));
			}
		}
	}
}
