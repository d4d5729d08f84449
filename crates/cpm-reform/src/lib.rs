//! # CPM Reform - Reformulating Constraint Models for Solver Backends
//!
//! This crate contains the front end of a constraint modelling system: users
//! build a [`Model`] from decision variables, arithmetic and logical operators,
//! and global constraints (e.g. circuits, cumulative scheduling, or table
//! constraints), and the crate rewrites the model into a form that a solver
//! backend can consume directly.
//!
//! Two output forms are provided:
//!
//! - a flat list of primitive constraints, in which all global constraints not
//!   supported by the backend have been decomposed
//!   ([`Model::to_primitive`]), and
//! - a linear normal form of (weighted) sums compared against constants,
//!   optionally guarded by a Boolean implication ([`Model::to_linear`]).
//!
//! The crate does not perform any search or propagation. The capabilities of
//! the targeted backend are described by a [`reformulate::Capabilities`]
//! object.

pub mod constraints;
pub mod functions;
pub(crate) mod helpers;
pub mod model;
pub mod reformulate;
#[cfg(test)]
pub(crate) mod tests;

use std::num::NonZeroI64;

use itertools::Itertools;
use rangelist::RangeList;

pub use crate::model::{
	eval::Assignment,
	expr::{CmpOp, Comparison, Expr, Operator},
	var::{VarStore, Variable},
	Model, ModelError,
};
use crate::{
	constraints::{
		all_different::{AllDifferent, AllDifferentExcept0, AllEqual},
		circuit::Circuit,
		cumulative::Cumulative,
		direct::{DirectArgument, DirectConstraint},
		global_cardinality::GlobalCardinalityCount,
		if_then_else::IfThenElse,
		in_domain::{InDomain, InDomainValues},
		inverse::Inverse,
		monotonic::{Monotonic, Monotonicity},
		subcircuit::{SubCircuit, SubCircuitWithStart},
		table::Table,
		xor::Xor,
		GlobalConstraint,
	},
	functions::{
		abs::Abs,
		count::Count,
		element::Element,
		minimum::{Maximum, Minimum},
		nvalue::NValue,
		GlobalFunction,
	},
};

/// Type alias for a set of integers parameter value.
pub type IntSetVal = RangeList<IntVal>;

/// Type alias for an parameter integer value.
pub type IntVal = i64;

/// Type alias for a non-zero paremeter integer value.
pub type NonZeroIntVal = NonZeroI64;

/// Create an expression that takes the absolute value of an integer
/// expression.
pub fn abs(expr: impl Into<Expr>) -> Expr {
	GlobalFunction::Abs(Abs { arg: expr.into() }).into()
}

/// Create a constraint that enforces that all the given integer expressions
/// take different values.
pub fn all_different<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::AllDifferent(AllDifferent {
		args: args.into_iter().map_into().collect(),
	})
	.into()
}

/// Create a constraint that enforces that all the given integer expressions
/// that do not take the value zero take different values.
pub fn all_different_except0<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::AllDifferentExcept0(AllDifferentExcept0 {
		args: args.into_iter().map_into().collect(),
	})
	.into()
}

/// Create a constraint that enforces that all the given integer expressions
/// take the same value.
pub fn all_equal<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::AllEqual(AllEqual {
		args: args.into_iter().map_into().collect(),
	})
	.into()
}

/// Create a constraint that enforces that the given successor expressions form
/// a single circuit visiting every position, where `succ[i] = j` means that
/// position `j` is visited directly after position `i`.
pub fn circuit<Iter>(succ: Iter) -> Result<Expr, ModelError>
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	Ok(GlobalConstraint::Circuit(Circuit::new(succ.into_iter().map_into().collect())?).into())
}

/// Create an expression that counts the number of expressions in `array` that
/// are equal to `value`.
pub fn count<Iter>(array: Iter, value: impl Into<Expr>) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalFunction::Count(Count {
		array: array.into_iter().map_into().collect(),
		value: value.into(),
	})
	.into()
}

/// Create a cumulative scheduling constraint.
///
/// For every task `i`, `start[i] + duration[i] == end[i]`, and at every point
/// in time the sum of the demands of the tasks running at that time does not
/// exceed `capacity`. When a single demand is given, it is used for all tasks.
pub fn cumulative(
	start: Vec<Expr>,
	duration: Vec<Expr>,
	end: Vec<Expr>,
	demand: Vec<Expr>,
	capacity: impl Into<Expr>,
) -> Result<Expr, ModelError> {
	Ok(GlobalConstraint::Cumulative(Cumulative::new(
		start,
		duration,
		end,
		demand,
		capacity.into(),
	)?)
	.into())
}

/// Create a constraint that enforces that the expressions are non-strictly
/// decreasing.
pub fn decreasing<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::Monotonic(Monotonic {
		args: args.into_iter().map_into().collect(),
		order: Monotonicity::Decreasing,
	})
	.into()
}

/// Create a constraint that enforces that the expressions are strictly
/// decreasing.
pub fn decreasing_strict<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::Monotonic(Monotonic {
		args: args.into_iter().map_into().collect(),
		order: Monotonicity::DecreasingStrict,
	})
	.into()
}

/// Create a constraint that is passed verbatim to the function `name` of a
/// solver backend.
///
/// Variables in the arguments are replaced by the backend's own variables,
/// except in the argument positions listed in `novar`.
pub fn direct(name: impl Into<String>, args: Vec<DirectArgument>, novar: Vec<usize>) -> Expr {
	DirectConstraint::new(name.into(), args, novar).into()
}

/// Create an expression that takes the value of `array[index]`.
///
/// The expression is undefined when `index` is outside the range of the
/// array.
pub fn element(array: Vec<Expr>, index: impl Into<Expr>) -> Expr {
	GlobalFunction::Element(Element {
		array,
		index: index.into(),
	})
	.into()
}

/// Create a constraint that enforces that `count(vars, vals[i]) == occ[i]` for
/// every `i`.
pub fn global_cardinality_count(
	vars: Vec<Expr>,
	vals: Vec<Expr>,
	occ: Vec<Expr>,
) -> Result<Expr, ModelError> {
	Ok(GlobalConstraint::GlobalCardinalityCount(GlobalCardinalityCount::new(vars, vals, occ)?).into())
}

/// Create a constraint that enforces `if_true` when `condition` holds, and
/// `if_false` otherwise.
pub fn if_then_else(
	condition: impl Into<Expr>,
	if_true: impl Into<Expr>,
	if_false: impl Into<Expr>,
) -> Result<Expr, ModelError> {
	Ok(GlobalConstraint::IfThenElse(IfThenElse::new(
		condition.into(),
		if_true.into(),
		if_false.into(),
	)?)
	.into())
}

/// Create a constraint that enforces that `expr` takes one of the values of
/// the given expressions.
pub fn in_domain(expr: impl Into<Expr>, values: Vec<Expr>) -> Expr {
	GlobalConstraint::InDomain(InDomain {
		expr: expr.into(),
		values: InDomainValues::from(values),
	})
	.into()
}

/// Create a constraint that enforces that `expr` takes a value in the given
/// set.
pub fn in_set(expr: impl Into<Expr>, set: IntSetVal) -> Expr {
	GlobalConstraint::InDomain(InDomain {
		expr: expr.into(),
		values: InDomainValues::Set(set),
	})
	.into()
}

/// Create a constraint that enforces that the expressions are non-strictly
/// increasing.
pub fn increasing<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::Monotonic(Monotonic {
		args: args.into_iter().map_into().collect(),
		order: Monotonicity::Increasing,
	})
	.into()
}

/// Create a constraint that enforces that the expressions are strictly
/// increasing.
pub fn increasing_strict<Iter>(args: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalConstraint::Monotonic(Monotonic {
		args: args.into_iter().map_into().collect(),
		order: Monotonicity::IncreasingStrict,
	})
	.into()
}

/// Create a constraint that enforces that `fwd` and `rev` are inverse
/// functions, i.e. `fwd[i] == j` if-and-only-if `rev[j] == i`.
pub fn inverse(fwd: Vec<Expr>, rev: Vec<Expr>) -> Result<Expr, ModelError> {
	Ok(GlobalConstraint::Inverse(Inverse::new(fwd, rev)?).into())
}

/// Create an expression that takes the maximum value of the given integer
/// expressions.
pub fn maximum<Iter>(args: Iter) -> Result<Expr, ModelError>
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	Ok(GlobalFunction::Maximum(Maximum::new(args.into_iter().map_into().collect())?).into())
}

/// Create an expression that takes the minimum value of the given integer
/// expressions.
pub fn minimum<Iter>(args: Iter) -> Result<Expr, ModelError>
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	Ok(GlobalFunction::Minimum(Minimum::new(args.into_iter().map_into().collect())?).into())
}

/// Create an expression that counts the number of distinct values taken by the
/// given expressions.
pub fn nvalue<Iter>(array: Iter) -> Expr
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	GlobalFunction::NValue(NValue {
		array: array.into_iter().map_into().collect(),
	})
	.into()
}

/// Create a constraint that enforces that the given successor expressions form
/// a circuit over a subset of the positions, where every position not in the
/// circuit points to itself.
pub fn subcircuit<Iter>(succ: Iter) -> Result<Expr, ModelError>
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	Ok(GlobalConstraint::SubCircuit(SubCircuit::new(succ.into_iter().map_into().collect())?).into())
}

/// Create a [`subcircuit`] constraint that additionally enforces that the
/// position `start` is part of the circuit.
pub fn subcircuit_with_start<Iter>(succ: Iter, start: usize) -> Result<Expr, ModelError>
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	Ok(GlobalConstraint::SubCircuitWithStart(SubCircuitWithStart::new(
		succ.into_iter().map_into().collect(),
		start,
	)?)
	.into())
}

/// Create a `table` constraint that enforces that given list of expressions
/// take their values according to one of the given rows of integer values.
pub fn table(vars: Vec<Expr>, rows: Vec<Vec<IntVal>>) -> Result<Expr, ModelError> {
	Ok(GlobalConstraint::Table(Table::new(vars, rows)?).into())
}

/// Create a constraint that enforces that an odd number of the given Boolean
/// expressions hold.
pub fn xor<Iter>(args: Iter) -> Result<Expr, ModelError>
where
	Iter: IntoIterator,
	Iter::Item: Into<Expr>,
{
	Ok(GlobalConstraint::Xor(Xor::new(args.into_iter().map_into().collect())?).into())
}
