//! Global constraints: Boolean valued constraints whose meaning exceeds what a
//! single primitive operator can express, each with a decomposition into
//! simpler constraints.

pub mod all_different;
pub mod circuit;
pub mod cumulative;
pub mod direct;
pub mod global_cardinality;
pub mod if_then_else;
pub mod in_domain;
pub mod inverse;
pub mod monotonic;
pub mod subcircuit;
pub mod table;
pub mod xor;

use std::fmt::{self, Display};

use delegate::delegate;
use itertools::Itertools;

use crate::{
	constraints::{
		all_different::{AllDifferent, AllDifferentExcept0, AllEqual},
		circuit::Circuit,
		cumulative::Cumulative,
		global_cardinality::GlobalCardinalityCount,
		if_then_else::IfThenElse,
		in_domain::InDomain,
		inverse::Inverse,
		monotonic::Monotonic,
		subcircuit::{SubCircuit, SubCircuitWithStart},
		table::Table,
		xor::Xor,
	},
	element,
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

/// Capabilities of a Boolean valued global constraint.
pub trait BoolGlobal {
	/// Returns the name under which a backend would know the constraint.
	fn name(&self) -> &'static str;

	/// Returns all expressions the constraint is defined over.
	fn args(&self) -> Vec<Expr>;

	/// Decompose the constraint into simpler constraints.
	///
	/// Auxiliary variables required by the decomposition are created in
	/// `store`, and are defined by the `defining` constraints of the result.
	fn decompose(&self, store: &mut VarStore) -> Decomposition;

	/// Check whether the constraint holds under the given assignment.
	///
	/// Returns `None` if any of the arguments is unassigned.
	fn value(&self, sol: &Assignment) -> Option<bool>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// The result of decomposing a global constraint or a comparison with a global
/// function.
pub struct Decomposition {
	/// Constraints that must hold for the decomposed constraint to hold.
	pub constraining: Vec<Expr>,
	/// Constraints that define the auxiliary variables introduced by the
	/// decomposition.
	///
	/// These constraints can always be enforced at the top level of a model,
	/// even when the decomposed constraint itself is reified.
	pub defining: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A disambiguation of the different global constraints that can be used in an
/// [`Expr`].
pub enum GlobalConstraint {
	/// All arguments take pairwise different values.
	AllDifferent(AllDifferent),
	/// All non-zero arguments take pairwise different values.
	AllDifferentExcept0(AllDifferentExcept0),
	/// All arguments take the same value.
	AllEqual(AllEqual),
	/// The successors form a single cycle over all positions.
	Circuit(Circuit),
	/// Tasks never exceed the resource capacity.
	Cumulative(Cumulative),
	/// Occurrences of given values are counted.
	GlobalCardinalityCount(GlobalCardinalityCount),
	/// Conditional choice between two constraints.
	IfThenElse(IfThenElse),
	/// An expression takes a value from a fixed set.
	InDomain(InDomain),
	/// Two arrays are inverse permutations of each other.
	Inverse(Inverse),
	/// The arguments are sorted.
	Monotonic(Monotonic),
	/// The successors form a single cycle over a subset of the positions.
	SubCircuit(SubCircuit),
	/// [`SubCircuit`] that must include a given position.
	SubCircuitWithStart(SubCircuitWithStart),
	/// The arguments match one of the rows of a table.
	Table(Table),
	/// An odd number of the arguments hold.
	Xor(Xor),
}

impl Decomposition {
	/// Create a decomposition without any auxiliary variables.
	pub fn constraining(constraining: Vec<Expr>) -> Self {
		Self {
			constraining,
			defining: Vec::new(),
		}
	}
}

impl GlobalConstraint {
	/// Create a copy of the constraint in which every argument expression is
	/// replaced by the result of `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(match self {
			Self::AllDifferent(c) => Self::AllDifferent(c.try_map_args(f)?),
			Self::AllDifferentExcept0(c) => Self::AllDifferentExcept0(c.try_map_args(f)?),
			Self::AllEqual(c) => Self::AllEqual(c.try_map_args(f)?),
			Self::Circuit(c) => Self::Circuit(c.try_map_args(f)?),
			Self::Cumulative(c) => Self::Cumulative(c.try_map_args(f)?),
			Self::GlobalCardinalityCount(c) => Self::GlobalCardinalityCount(c.try_map_args(f)?),
			Self::IfThenElse(c) => Self::IfThenElse(c.try_map_args(f)?),
			Self::InDomain(c) => Self::InDomain(c.try_map_args(f)?),
			Self::Inverse(c) => Self::Inverse(c.try_map_args(f)?),
			Self::Monotonic(c) => Self::Monotonic(c.try_map_args(f)?),
			Self::SubCircuit(c) => Self::SubCircuit(c.try_map_args(f)?),
			Self::SubCircuitWithStart(c) => Self::SubCircuitWithStart(c.try_map_args(f)?),
			Self::Table(c) => Self::Table(c.try_map_args(f)?),
			Self::Xor(c) => Self::Xor(c.try_map_args(f)?),
		})
	}
}

impl BoolGlobal for GlobalConstraint {
	delegate! {
		to match self {
			GlobalConstraint::AllDifferent(c) => c,
			GlobalConstraint::AllDifferentExcept0(c) => c,
			GlobalConstraint::AllEqual(c) => c,
			GlobalConstraint::Circuit(c) => c,
			GlobalConstraint::Cumulative(c) => c,
			GlobalConstraint::GlobalCardinalityCount(c) => c,
			GlobalConstraint::IfThenElse(c) => c,
			GlobalConstraint::InDomain(c) => c,
			GlobalConstraint::Inverse(c) => c,
			GlobalConstraint::Monotonic(c) => c,
			GlobalConstraint::SubCircuit(c) => c,
			GlobalConstraint::SubCircuitWithStart(c) => c,
			GlobalConstraint::Table(c) => c,
			GlobalConstraint::Xor(c) => c,
		} {
			fn name(&self) -> &'static str;
			fn args(&self) -> Vec<Expr>;
			fn decompose(&self, store: &mut VarStore) -> Decomposition;
			fn value(&self, sol: &Assignment) -> Option<bool>;
		}
	}
}

impl Display for GlobalConstraint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GlobalConstraint::Cumulative(c) => c.fmt(f),
			GlobalConstraint::GlobalCardinalityCount(c) => c.fmt(f),
			GlobalConstraint::InDomain(c) => c.fmt(f),
			GlobalConstraint::Inverse(c) => c.fmt(f),
			GlobalConstraint::SubCircuitWithStart(c) => c.fmt(f),
			GlobalConstraint::Table(c) => c.fmt(f),
			_ => fmt_call(f, self.name(), &self.args()),
		}
	}
}

/// Check that none of the arguments of the constraint `name` are Boolean.
pub(crate) fn check_integer_args(name: &'static str, args: &[Expr]) -> Result<(), ModelError> {
	match args.iter().find(|a| a.is_bool()) {
		Some(arg) => Err(ModelError::NonIntegerArgument {
			name,
			arg: arg.to_string(),
		}),
		None => Ok(()),
	}
}

/// Check that all arguments of the constraint `name` are Boolean.
pub(crate) fn check_boolean_args(name: &'static str, args: &[Expr]) -> Result<(), ModelError> {
	match args.iter().find(|a| !a.is_bool()) {
		Some(arg) => Err(ModelError::NonBooleanArgument {
			name,
			arg: arg.to_string(),
		}),
		None => Ok(()),
	}
}

/// Format a constraint in function call notation.
pub(crate) fn fmt_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
	write!(f, "{name}({})", args.iter().format(", "))
}

/// Returns the position in a collection of length `len` referred to by the
/// value `val`, if it refers to one.
pub(crate) fn index_of(val: IntVal, len: usize) -> Option<usize> {
	usize::try_from(val).ok().filter(|&i| i < len)
}

/// Returns the smallest interval containing the bounds of all expressions and
/// the values in `lb..=ub`.
pub(crate) fn bounds_hull(args: &[Expr], (lb, ub): (IntVal, IntVal)) -> (IntVal, IntVal) {
	args.iter().fold((lb, ub), |(lb, ub), a| {
		let (a_lb, a_ub) = a.bounds();
		(lb.min(a_lb), ub.max(a_ub))
	})
}

/// Returns the successor of `node` in a successor array, where every value in
/// `lb..=ub` that is not a position of `succ` is its own successor.
///
/// The element function in the result is total for every `node` within
/// `lb..=ub`.
pub(crate) fn successor(succ: &[Expr], node: Expr, (lb, ub): (IntVal, IntVal)) -> Expr {
	let array = (lb..=ub)
		.map(|p| match index_of(p, succ.len()) {
			Some(i) => succ[i].clone(),
			None => Expr::Int(p),
		})
		.collect();
	let index = if lb == 0 { node } else { node - lb };
	element(array, index)
}

/// Returns the constraints that restrict `x` to the positions of a collection
/// of length `len`, omitting those already implied by its bounds.
pub(crate) fn index_in_range(x: &Expr, len: usize) -> Vec<Expr> {
	let (lb, ub) = x.bounds();
	let n = len as IntVal;
	let lower = (lb < 0).then(|| x.geq(0));
	let upper = (ub >= n).then(|| x.lt(n));
	lower.into_iter().chain(upper).collect()
}

/// Returns the constraints that restrict the successors to the positions of
/// the array, omitting those already implied by their bounds.
pub(crate) fn successors_in_range(succ: &[Expr]) -> Vec<Expr> {
	succ.iter()
		.flat_map(|s| index_in_range(s, succ.len()))
		.collect()
}

/// Replace every expression in `args` by the result of `f`.
pub(crate) fn try_map_all<F>(args: &[Expr], f: &mut F) -> Result<Vec<Expr>, TransformError>
where
	F: FnMut(&Expr) -> Result<Expr, TransformError>,
{
	args.iter().map(|a| f(a)).try_collect()
}

/// Evaluate all expressions, returning `None` if any of them is undefined.
pub(crate) fn values_of(args: &[Expr], sol: &Assignment) -> Option<Vec<IntVal>> {
	args.iter().map(|a| a.value(sol)).collect()
}
