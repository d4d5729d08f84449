//! Structures and decomposition for the `table` constraint.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	constraints::{try_map_all, values_of, BoolGlobal, Decomposition},
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `table` constraint within a model.
///
/// This constraint enforces that the given list of expressions takes the
/// values of one of the rows of the table.
pub struct Table {
	/// The expressions constrained by the table.
	pub(crate) vars: Vec<Expr>,
	/// The allowed combinations of values.
	pub(crate) rows: Vec<Vec<IntVal>>,
}

impl Table {
	/// Create a new table constraint.
	///
	/// Fails if the length of a row differs from the number of expressions.
	pub fn new(vars: Vec<Expr>, rows: Vec<Vec<IntVal>>) -> Result<Self, ModelError> {
		if let Some(row) = rows.iter().find(|r| r.len() != vars.len()) {
			return Err(ModelError::LengthMismatch {
				name: "table",
				expected: vars.len(),
				found: row.len(),
			});
		}
		Ok(Self { vars, rows })
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			vars: try_map_all(&self.vars, f)?,
			rows: self.rows.clone(),
		})
	}
}

impl BoolGlobal for Table {
	fn name(&self) -> &'static str {
		"table"
	}

	fn args(&self) -> Vec<Expr> {
		self.vars.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		let rows = self
			.rows
			.iter()
			.map(|row| Expr::all(self.vars.iter().zip_eq(row).map(|(v, &r)| v.eq(r))));
		Decomposition::constraining(vec![Expr::any(rows)])
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let vals = values_of(&self.vars, sol)?;
		Some(self.rows.contains(&vals))
	}
}

impl Display for Table {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}([{}], [{}])",
			self.name(),
			self.vars.iter().format(", "),
			self.rows
				.iter()
				.format_with(", ", |row, f| f(&format_args!("[{}]", row.iter().format(", "))))
		)
	}
}
