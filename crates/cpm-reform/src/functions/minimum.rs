//! Structures and decompositions for the `min` and `max` functions.

use crate::{
	constraints::{check_integer_args, try_map_all, values_of, Decomposition},
	functions::NumGlobal,
	model::{
		eval::Assignment,
		expr::{CmpOp, Comparison, Expr},
		var::VarStore,
		ModelError,
	},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `min` function within a model.
pub struct Minimum {
	/// Expressions of which the smallest value is taken.
	pub(crate) args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `max` function within a model.
pub struct Maximum {
	/// Expressions of which the largest value is taken.
	pub(crate) args: Vec<Expr>,
}

/// Check that the arguments of `name` form a non-empty list of integer
/// expressions.
fn check_args(name: &'static str, args: &[Expr]) -> Result<(), ModelError> {
	check_integer_args(name, args)?;
	if args.is_empty() {
		return Err(ModelError::TooFewArguments {
			name,
			min: 1,
			found: 0,
		});
	}
	Ok(())
}

/// Decompose `extreme <op> rhs`, where `extreme` is an auxiliary variable that
/// is at most (or at least, for `below == false`) every argument, and equal to
/// one of them.
fn decompose_extreme(
	args: &[Expr],
	bounds: (IntVal, IntVal),
	below: bool,
	op: CmpOp,
	rhs: Expr,
	store: &mut VarStore,
) -> Decomposition {
	let (lb, ub) = bounds;
	let extreme: Expr = store.new_aux_int(lb, ub).into();
	let bound_by = |a: &Expr| {
		if below {
			extreme.leq(a.clone())
		} else {
			extreme.geq(a.clone())
		}
	};
	Decomposition {
		constraining: vec![Comparison::new(op, extreme.clone(), rhs).into()],
		defining: vec![
			Expr::all(args.iter().map(bound_by)),
			Expr::any(args.iter().map(|a| extreme.eq(a.clone()))),
		],
	}
}

impl Minimum {
	/// Create a new `min` function over the given expressions.
	pub fn new(args: Vec<Expr>) -> Result<Self, ModelError> {
		check_args("min", &args)?;
		Ok(Self { args })
	}

	/// Create a copy of the function with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			args: try_map_all(&self.args, f)?,
		})
	}
}

impl NumGlobal for Minimum {
	fn name(&self) -> &'static str {
		"min"
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn bounds(&self) -> (IntVal, IntVal) {
		let (lbs, ubs): (Vec<_>, Vec<_>) = self.args.iter().map(Expr::bounds).unzip();
		(
			lbs.into_iter().min().unwrap_or_default(),
			ubs.into_iter().min().unwrap_or_default(),
		)
	}

	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, store: &mut VarStore) -> Decomposition {
		decompose_extreme(&self.args, self.bounds(), true, op, rhs, store)
	}

	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		values_of(&self.args, sol)?.into_iter().min()
	}
}

impl Maximum {
	/// Create a new `max` function over the given expressions.
	pub fn new(args: Vec<Expr>) -> Result<Self, ModelError> {
		check_args("max", &args)?;
		Ok(Self { args })
	}

	/// Create a copy of the function with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			args: try_map_all(&self.args, f)?,
		})
	}
}

impl NumGlobal for Maximum {
	fn name(&self) -> &'static str {
		"max"
	}

	fn args(&self) -> Vec<Expr> {
		self.args.clone()
	}

	fn bounds(&self) -> (IntVal, IntVal) {
		let (lbs, ubs): (Vec<_>, Vec<_>) = self.args.iter().map(Expr::bounds).unzip();
		(
			lbs.into_iter().max().unwrap_or_default(),
			ubs.into_iter().max().unwrap_or_default(),
		)
	}

	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, store: &mut VarStore) -> Decomposition {
		decompose_extreme(&self.args, self.bounds(), false, op, rhs, store)
	}

	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		values_of(&self.args, sol)?.into_iter().max()
	}
}
