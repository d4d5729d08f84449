//! Structures and decomposition for the `abs` function.

use crate::{
	constraints::Decomposition,
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
/// Representation of the `abs` function within a model.
pub struct Abs {
	/// Expression of which the absolute value is taken.
	pub(crate) arg: Expr,
}

impl Abs {
	/// Create a copy of the function with its argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			arg: f(&self.arg)?,
		})
	}
}

impl NumGlobal for Abs {
	fn name(&self) -> &'static str {
		"abs"
	}

	fn args(&self) -> Vec<Expr> {
		vec![self.arg.clone()]
	}

	fn bounds(&self) -> (IntVal, IntVal) {
		match self.arg.bounds() {
			(lb, ub) if lb >= 0 => (lb, ub),
			(lb, ub) if ub <= 0 => (-ub, -lb),
			(lb, ub) => (0, ub.max(-lb)),
		}
	}

	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, store: &mut VarStore) -> Decomposition {
		let x = &self.arg;
		match x.bounds() {
			(lb, _) if lb >= 0 => {
				Decomposition::constraining(vec![Comparison::new(op, x.clone(), rhs).into()])
			}
			(_, ub) if ub <= 0 => {
				Decomposition::constraining(vec![Comparison::new(op, -x.clone(), rhs).into()])
			}
			_ => {
				let (lb, ub) = self.bounds();
				let abs: Expr = store.new_aux_int(lb, ub).into();
				Decomposition {
					constraining: vec![Comparison::new(op, abs.clone(), rhs).into()],
					defining: vec![
						x.geq(0).implies(x.eq(abs.clone())),
						x.lt(0).implies((-x.clone()).eq(abs)),
					],
				}
			}
		}
	}

	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		self.arg.value(sol).map(IntVal::abs)
	}
}
