//! Structures and decomposition for the constraints that order a list of
//! expressions: `increasing`, `decreasing`, and their strict variants.

use itertools::Itertools;

use crate::{
	constraints::{try_map_all, values_of, BoolGlobal, Decomposition},
	model::{
		eval::Assignment,
		expr::{CmpOp, Comparison, Expr},
		var::VarStore,
	},
	reformulate::TransformError,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the monotonicity constraints within a model.
///
/// This constraint enforces that every pair of consecutive expressions is
/// ordered according to `order`.
pub struct Monotonic {
	/// The ordered expressions.
	pub(crate) args: Vec<Expr>,
	/// The order between consecutive expressions.
	pub(crate) order: Monotonicity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The order enforced by a [`Monotonic`] constraint.
pub enum Monotonicity {
	/// Each expression is at most the next one.
	Increasing,
	/// Each expression is smaller than the next one.
	IncreasingStrict,
	/// Each expression is at least the next one.
	Decreasing,
	/// Each expression is larger than the next one.
	DecreasingStrict,
}

impl Monotonic {
	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			args: try_map_all(&self.args, f)?,
			order: self.order,
		})
	}
}

impl BoolGlobal for Monotonic {
	fn name(&self) -> &'static str {
		match self.order {
			Monotonicity::Increasing => "increasing",
			Monotonicity::IncreasingStrict => "strictly_increasing",
			Monotonicity::Decreasing => "decreasing",
			Monotonicity::DecreasingStrict => "strictly_decreasing",
		}
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		let op = self.order.relation();
		Decomposition::constraining(
			self.args
				.iter()
				.tuple_windows()
				.map(|(a, b)| Comparison::new(op, a.clone(), b.clone()).into())
				.collect(),
		)
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let op = self.order.relation();
		Some(
			values_of(&self.args, sol)?
				.into_iter()
				.tuple_windows()
				.all(|(a, b)| op.holds(a, b)),
		)
	}
}

impl Monotonicity {
	/// The relation that holds between consecutive expressions.
	pub fn relation(&self) -> CmpOp {
		match self {
			Monotonicity::Increasing => CmpOp::Le,
			Monotonicity::IncreasingStrict => CmpOp::Lt,
			Monotonicity::Decreasing => CmpOp::Ge,
			Monotonicity::DecreasingStrict => CmpOp::Gt,
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use proptest::prelude::*;

	use crate::{
		constraints::BoolGlobal,
		decreasing, decreasing_strict, increasing, increasing_strict,
		model::{eval::Assignment, expr::Expr},
		tests::global,
		Model,
	};

	#[test]
	fn test_monotonic_decomposition() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(3, 0..=3).unwrap();
		let c = increasing_strict(x.clone());
		expect!["strictly_increasing(IV0, IV1, IV2)"].assert_eq(&c.to_string());
		let dec = global(&c).decompose(prb.store_mut());
		expect![[r#"
    IV0 < IV1
    IV1 < IV2"#]]
		.assert_eq(&dec.constraining.iter().join("\n"));
	}

	proptest! {
		#[test]
		fn prop_monotonic_decompositions(vals in proptest::collection::vec(0..=3_i64, 4)) {
			let mut prb = Model::default();
			let x = prb.new_int_vars(4, 0..=3).unwrap();
			let sol: Assignment = x.iter().copied().zip_eq(vals).collect();

			for c in [
				increasing(x.clone()),
				increasing_strict(x.clone()),
				decreasing(x.clone()),
				decreasing_strict(x.clone()),
			] {
				let g = global(&c);
				let dec = g.decompose(prb.store_mut());
				prop_assert_eq!(g.value(&sol), Expr::all(dec.constraining).holds(&sol));
			}
		}
	}
}
