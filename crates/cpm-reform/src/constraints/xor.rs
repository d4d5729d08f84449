//! Structures and decomposition for the `xor` constraint.

use crate::{
	constraints::{check_boolean_args, try_map_all, values_of, BoolGlobal, Decomposition},
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `xor` constraint within a model.
///
/// This constraint enforces that an odd number of the Boolean arguments hold.
pub struct Xor {
	/// The Boolean arguments.
	pub(crate) args: Vec<Expr>,
}

impl Xor {
	/// Create a new exclusive-or constraint.
	///
	/// Fails if any of the arguments is not Boolean.
	pub fn new(mut args: Vec<Expr>) -> Result<Self, ModelError> {
		check_boolean_args("xor", &args)?;
		// Constants are placed first in binary constraints
		if args.len() == 2 && args[1].as_constant().is_some() && args[0].as_constant().is_none() {
			args.swap(0, 1);
		}
		Ok(Self { args })
	}

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

impl BoolGlobal for Xor {
	fn name(&self) -> &'static str {
		"xor"
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		let mut args = self.args.iter().cloned();
		let mut acc = Expr::sum(args.by_ref().take(2)).eq(1);
		for a in args {
			acc = Expr::sum([acc, a]).eq(1);
		}
		Decomposition::constraining(vec![acc])
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		Some(values_of(&self.args, sol)?.into_iter().sum::<IntVal>() % 2 == 1)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use proptest::prelude::*;

	use crate::{
		constraints::BoolGlobal,
		model::{eval::Assignment, expr::Expr, ModelError},
		tests::global,
		xor, Model,
	};

	#[test]
	fn test_xor_decomposition() {
		let mut prb = Model::default();
		let b = prb.new_bool_vars(4);
		let c = xor(b.clone()).unwrap();
		let dec = global(&c).decompose(prb.store_mut());
		expect!["sum([sum([sum([BV0, BV1]) == 1, BV2]) == 1, BV3]) == 1"]
			.assert_eq(&dec.constraining.iter().join("\n"));

		// Constants are moved to the front
		let c = xor([Expr::from(b[0]), Expr::Bool(true)]).unwrap();
		expect!["xor(true, BV0)"].assert_eq(&c.to_string());

		let mut prb = Model::default();
		let x = prb.new_int_var(0..=1).unwrap();
		assert!(matches!(
			xor([x]),
			Err(ModelError::NonBooleanArgument { name: "xor", .. })
		));
	}

	proptest! {
		#[test]
		fn prop_xor_decomposition(vals in proptest::collection::vec(0..=1_i64, 5)) {
			let mut prb = Model::default();
			let b = prb.new_bool_vars(5);
			let sol: Assignment = b.iter().copied().zip_eq(vals).collect();
			let c = xor(b.clone()).unwrap();
			let g = global(&c);
			let dec = g.decompose(prb.store_mut());
			prop_assert_eq!(g.value(&sol), Expr::all(dec.constraining).holds(&sol));
		}
	}
}
