//! Structures and decompositions for the constraints that relate the values of
//! all expressions in a list: `alldifferent`, `alldifferent_except0`, and
//! `allequal`.

use itertools::Itertools;

use crate::{
	constraints::{try_map_all, values_of, BoolGlobal, Decomposition},
	model::{eval::Assignment, expr::Expr, var::VarStore},
	reformulate::TransformError,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `alldifferent` constraint within a model.
///
/// This constraint enforces that all given expressions take distinct values.
pub struct AllDifferent {
	/// List of expressions that must take different values.
	pub(crate) args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `alldifferent_except0` constraint within a model.
///
/// This constraint enforces that all given expressions that do not take the
/// value zero take distinct values.
pub struct AllDifferentExcept0 {
	/// List of expressions that must take different values when non-zero.
	pub(crate) args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `allequal` constraint within a model.
pub struct AllEqual {
	/// List of expressions that must take the same value.
	pub(crate) args: Vec<Expr>,
}

impl AllDifferent {
	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			args: try_map_all(&self.args, f)?,
		})
	}
}

impl BoolGlobal for AllDifferent {
	fn name(&self) -> &'static str {
		"alldifferent"
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		Decomposition::constraining(
			self.args
				.iter()
				.tuple_combinations()
				.map(|(a, b)| a.ne(b.clone()))
				.collect(),
		)
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		Some(values_of(&self.args, sol)?.into_iter().all_unique())
	}
}

impl AllDifferentExcept0 {
	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			args: try_map_all(&self.args, f)?,
		})
	}
}

impl BoolGlobal for AllDifferentExcept0 {
	fn name(&self) -> &'static str {
		"alldifferent_except0"
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		Decomposition::constraining(
			self.args
				.iter()
				.tuple_combinations()
				.map(|(a, b)| a.eq(b.clone()).implies(a.eq(0)))
				.collect(),
		)
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		Some(
			values_of(&self.args, sol)?
				.into_iter()
				.filter(|&v| v != 0)
				.all_unique(),
		)
	}
}

impl AllEqual {
	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			args: try_map_all(&self.args, f)?,
		})
	}
}

impl BoolGlobal for AllEqual {
	fn name(&self) -> &'static str {
		"allequal"
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		Decomposition::constraining(
			self.args
				.iter()
				.tuple_windows()
				.map(|(a, b)| a.eq(b.clone()))
				.collect(),
		)
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		Some(values_of(&self.args, sol)?.into_iter().all_equal())
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use proptest::prelude::*;

	use crate::{
		all_different, all_different_except0, all_equal,
		constraints::BoolGlobal,
		model::{eval::Assignment, expr::Expr},
		tests::global,
		Model,
	};

	#[test]
	fn test_all_different_constants() {
		let mut prb = Model::default();
		let c = all_different([Expr::Int(1), Expr::Int(1), Expr::Int(2)]);
		let g = global(&c);
		assert_eq!(g.value(&Assignment::default()), Some(false));

		let dec = g.decompose(prb.store_mut());
		assert!(dec.defining.is_empty());
		expect![[r#"
    1 != 1
    1 != 2
    1 != 2"#]]
		.assert_eq(&dec.constraining.iter().join("\n"));
	}

	#[test]
	fn test_all_equal_empty() {
		let mut prb = Model::default();
		let c = all_equal(Vec::<Expr>::new());
		let g = global(&c);
		assert_eq!(g.value(&Assignment::default()), Some(true));
		assert!(g.decompose(prb.store_mut()).constraining.is_empty());
	}

	proptest! {
		#[test]
		fn prop_decompositions_agree(vals in proptest::collection::vec(-1..=2_i64, 4)) {
			let mut prb = Model::default();
			let x = prb.new_int_vars(4, -1..=2).unwrap();
			let sol: Assignment = x.iter().copied().zip_eq(vals).collect();

			for c in [
				all_different(x.clone()),
				all_different_except0(x.clone()),
				all_equal(x.clone()),
			] {
				let g = global(&c);
				let dec = g.decompose(prb.store_mut());
				prop_assert!(dec.defining.is_empty());
				prop_assert_eq!(g.value(&sol), Expr::all(dec.constraining).holds(&sol));
			}
		}
	}
}
