//! Numeric global functions: integer valued expressions whose meaning exceeds
//! what the arithmetic operators can express, such as `min`, `abs`, or
//! `element`.
//!
//! Instead of a decomposition of the function itself, each function provides a
//! decomposition of a comparison between the function and another expression.
//! This avoids introducing an auxiliary variable for the value of the function
//! when it directly occurs in a comparison.

pub mod abs;
pub mod count;
pub mod element;
pub mod minimum;
pub mod nvalue;

use std::fmt::{self, Display};

use delegate::delegate;

use crate::{
	constraints::{fmt_call, Decomposition},
	functions::{
		abs::Abs,
		count::Count,
		element::Element,
		minimum::{Maximum, Minimum},
		nvalue::NValue,
	},
	model::{eval::Assignment, expr::CmpOp, expr::Expr, var::VarStore},
	reformulate::TransformError,
	IntVal,
};

/// Capabilities of an integer valued global function.
pub trait NumGlobal {
	/// Returns the name under which a backend would know the function.
	fn name(&self) -> &'static str;

	/// Returns all expressions the function is defined over.
	fn args(&self) -> Vec<Expr>;

	/// Returns the inclusive bounds of the values the function can take.
	fn bounds(&self) -> (IntVal, IntVal);

	/// Returns whether the function is defined for every assignment of its
	/// arguments.
	fn is_total(&self) -> bool {
		true
	}

	/// Decompose the constraint `self <op> rhs` into simpler constraints.
	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, store: &mut VarStore) -> Decomposition;

	/// Evaluate the function under the given assignment.
	///
	/// Returns `None` if any of the arguments is unassigned, or if the function
	/// is undefined for the assigned values.
	fn value(&self, sol: &Assignment) -> Option<IntVal>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A disambiguation of the different global functions that can be used in an
/// [`Expr`].
pub enum GlobalFunction {
	/// Absolute value of an expression.
	Abs(Abs),
	/// Number of arguments equal to a value.
	Count(Count),
	/// Value at a variable position of an array.
	Element(Element),
	/// Largest value among the arguments.
	Maximum(Maximum),
	/// Smallest value among the arguments.
	Minimum(Minimum),
	/// Number of distinct values among the arguments.
	NValue(NValue),
}

impl GlobalFunction {
	/// Create a copy of the function in which every argument expression is
	/// replaced by the result of `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(match self {
			Self::Abs(g) => Self::Abs(g.try_map_args(f)?),
			Self::Count(g) => Self::Count(g.try_map_args(f)?),
			Self::Element(g) => Self::Element(g.try_map_args(f)?),
			Self::Maximum(g) => Self::Maximum(g.try_map_args(f)?),
			Self::Minimum(g) => Self::Minimum(g.try_map_args(f)?),
			Self::NValue(g) => Self::NValue(g.try_map_args(f)?),
		})
	}
}

impl NumGlobal for GlobalFunction {
	delegate! {
		to match self {
			GlobalFunction::Abs(g) => g,
			GlobalFunction::Count(g) => g,
			GlobalFunction::Element(g) => g,
			GlobalFunction::Maximum(g) => g,
			GlobalFunction::Minimum(g) => g,
			GlobalFunction::NValue(g) => g,
		} {
			fn name(&self) -> &'static str;
			fn args(&self) -> Vec<Expr>;
			fn bounds(&self) -> (IntVal, IntVal);
			fn is_total(&self) -> bool;
			fn decompose_comparison(&self, op: CmpOp, rhs: Expr, store: &mut VarStore) -> Decomposition;
			fn value(&self, sol: &Assignment) -> Option<IntVal>;
		}
	}
}

impl Display for GlobalFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GlobalFunction::Count(g) => g.fmt(f),
			GlobalFunction::Element(g) => g.fmt(f),
			_ => fmt_call(f, self.name(), &self.args()),
		}
	}
}
