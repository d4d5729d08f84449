//! Structures and decomposition for the `inverse` (channeling) constraint.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	constraints::{
		check_integer_args, index_in_range, index_of, try_map_all, values_of, BoolGlobal,
		Decomposition,
	},
	element,
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `inverse` constraint within a model.
///
/// This constraint enforces that `fwd` and `rev` represent inverse functions,
/// i.e. `fwd[i] == j` if-and-only-if `rev[j] == i`.
pub struct Inverse {
	/// The forward function.
	pub(crate) fwd: Vec<Expr>,
	/// The reverse function.
	pub(crate) rev: Vec<Expr>,
}

impl Inverse {
	/// Create a new inverse constraint.
	///
	/// Fails if any of the expressions is Boolean, or if the two functions are
	/// not of the same length.
	pub fn new(fwd: Vec<Expr>, rev: Vec<Expr>) -> Result<Self, ModelError> {
		check_integer_args("inverse", &fwd)?;
		check_integer_args("inverse", &rev)?;
		if fwd.len() != rev.len() {
			return Err(ModelError::LengthMismatch {
				name: "inverse",
				expected: fwd.len(),
				found: rev.len(),
			});
		}
		Ok(Self { fwd, rev })
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			fwd: try_map_all(&self.fwd, f)?,
			rev: try_map_all(&self.rev, f)?,
		})
	}
}

impl BoolGlobal for Inverse {
	fn name(&self) -> &'static str {
		"inverse"
	}

	fn args(&self) -> Vec<Expr> {
		self.fwd.iter().chain(&self.rev).cloned().collect()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		let n = self.rev.len();
		let channel = self.fwd.iter().enumerate().map(|(i, x)| {
			if let Some(c) = x.as_constant() {
				return match index_of(c, n) {
					Some(j) => self.rev[j].eq(i as IntVal),
					None => Expr::Bool(false),
				};
			}
			// The range of `x` is required explicitly, so that the channeling
			// remains correct when negated
			let mut parts = index_in_range(x, n);
			parts.push(element(self.rev.clone(), x.clone()).eq(i as IntVal));
			Expr::all(parts)
		});
		Decomposition::constraining(vec![Expr::all(channel)])
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let fwd = values_of(&self.fwd, sol)?;
		let rev = values_of(&self.rev, sol)?;
		Some(fwd.iter().enumerate().all(|(i, &x)| {
			index_of(x, rev.len()).is_some_and(|j| rev[j] == i as IntVal)
		}))
	}
}

impl Display for Inverse {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}([{}], [{}])",
			self.name(),
			self.fwd.iter().format(", "),
			self.rev.iter().format(", ")
		)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use proptest::prelude::*;

	use crate::{
		constraints::BoolGlobal,
		inverse,
		model::{eval::Assignment, expr::Expr, ModelError},
		tests::global,
		Model,
	};

	#[test]
	fn test_inverse_constant_positions() {
		let mut prb = Model::default();
		let rev = prb.new_int_vars(3, 0..=2).unwrap();
		let fwd = prb.new_int_var(0..=2).unwrap();
		let c = inverse(
			vec![Expr::Int(2), fwd.into(), Expr::Int(0)],
			rev.iter().copied().map_into().collect(),
		)
		.unwrap();
		expect!["inverse([2, IV3, 0], [IV0, IV1, IV2])"].assert_eq(&c.to_string());

		let dec = global(&c).decompose(prb.store_mut());
		expect!["and([IV2 == 0, element([IV0, IV1, IV2], IV3) == 1, IV0 == 2])"]
			.assert_eq(&dec.constraining.iter().join("\n"));
	}

	#[test]
	fn test_inverse_arguments() {
		assert_eq!(
			inverse(vec![Expr::Int(0)], vec![Expr::Int(0), Expr::Int(1)]),
			Err(ModelError::LengthMismatch {
				name: "inverse",
				expected: 1,
				found: 2
			})
		);
		// Out of range values never form an inverse
		let c = inverse(vec![Expr::Int(-1)], vec![Expr::Int(0)]).unwrap();
		assert_eq!(global(&c).value(&Assignment::default()), Some(false));
	}

	proptest! {
		#[test]
		fn prop_inverse_decomposition(
			fwd_vals in proptest::collection::vec(-1..=3_i64, 3),
			rev_vals in proptest::collection::vec(-1..=3_i64, 3),
		) {
			let mut prb = Model::default();
			let fwd = prb.new_int_vars(3, -1..=3).unwrap();
			let rev = prb.new_int_vars(3, -1..=3).unwrap();
			let sol: Assignment = fwd
				.iter()
				.chain(&rev)
				.copied()
				.zip_eq(fwd_vals.into_iter().chain(rev_vals))
				.collect();

			let c = inverse(
				fwd.iter().copied().map_into().collect(),
				rev.iter().copied().map_into().collect(),
			)
			.unwrap();
			let g = global(&c);
			let dec = g.decompose(prb.store_mut());
			let holds = Expr::all(dec.constraining);
			prop_assert_eq!(g.value(&sol), holds.holds(&sol));
			prop_assert_eq!(g.value(&sol).map(|v| !v), holds.negated().holds(&sol));
		}
	}
}
