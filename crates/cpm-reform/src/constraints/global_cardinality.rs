//! Structures and decomposition for the `gcc` (global cardinality count)
//! constraint.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	constraints::{check_integer_args, try_map_all, values_of, BoolGlobal, Decomposition},
	count,
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `gcc` constraint within a model.
///
/// This constraint enforces that `vals[i]` occurs exactly `occ[i]` times in
/// `vars`.
pub struct GlobalCardinalityCount {
	/// The expressions whose values are counted.
	pub(crate) vars: Vec<Expr>,
	/// The counted values.
	pub(crate) vals: Vec<Expr>,
	/// The number of occurrences of each counted value.
	pub(crate) occ: Vec<Expr>,
}

impl GlobalCardinalityCount {
	/// Create a new global cardinality constraint.
	///
	/// Fails if any of the arguments is Boolean, or if `vals` and `occ` are of
	/// different lengths.
	pub fn new(vars: Vec<Expr>, vals: Vec<Expr>, occ: Vec<Expr>) -> Result<Self, ModelError> {
		for list in [&vars, &vals, &occ] {
			check_integer_args("gcc", list)?;
		}
		if vals.len() != occ.len() {
			return Err(ModelError::LengthMismatch {
				name: "gcc",
				expected: vals.len(),
				found: occ.len(),
			});
		}
		Ok(Self { vars, vals, occ })
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			vars: try_map_all(&self.vars, f)?,
			vals: try_map_all(&self.vals, f)?,
			occ: try_map_all(&self.occ, f)?,
		})
	}
}

impl BoolGlobal for GlobalCardinalityCount {
	fn name(&self) -> &'static str {
		"gcc"
	}

	fn args(&self) -> Vec<Expr> {
		self.vars
			.iter()
			.chain(&self.vals)
			.chain(&self.occ)
			.cloned()
			.collect()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		Decomposition::constraining(
			self.vals
				.iter()
				.zip_eq(&self.occ)
				.map(|(val, occ)| count(self.vars.clone(), val.clone()).eq(occ.clone()))
				.collect(),
		)
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let vars = values_of(&self.vars, sol)?;
		let vals = values_of(&self.vals, sol)?;
		let occ = values_of(&self.occ, sol)?;
		Some(vals.iter().zip_eq(&occ).all(|(val, &occ)| {
			vars.iter().filter(|&v| v == val).count() as IntVal == occ
		}))
	}
}

impl Display for GlobalCardinalityCount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}([{}], [{}], [{}])",
			self.name(),
			self.vars.iter().format(", "),
			self.vals.iter().format(", "),
			self.occ.iter().format(", ")
		)
	}
}
