//! Decision variables and the store that allocates them.

use std::fmt::{self, Display};

use index_vec::{define_index_type, IndexVec};

use crate::{model::expr::Expr, IntVal};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Whether a [`Variable`] was created by the user or introduced while
/// reformulating a model.
pub enum VarOrigin {
	/// Variable introduced by a decomposition, flattening, or linearization
	/// step.
	Auxiliary,
	/// Variable created through [`crate::Model`].
	User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The kind of values a [`Variable`] takes.
pub enum VarKind {
	/// Boolean variable, with its values represented as `0` and `1`.
	Bool,
	/// Integer variable.
	Int,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Allocator for fresh decision variables.
///
/// Every reformulation borrows the store of the [`crate::Model`] it works on,
/// so that indices are never reused within a model and two models never share
/// their variable namespace.
pub struct VarStore {
	/// Definitions of all variables created so far.
	defs: IndexVec<VarIndex, VarDef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Definition of a variable as stored in a [`VarStore`].
struct VarDef {
	/// Inclusive lower bound.
	lb: IntVal,
	/// Inclusive upper bound.
	ub: IntVal,
	/// Kind of the variable.
	kind: VarKind,
	/// Origin of the variable.
	origin: VarOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Reference to a decision variable.
///
/// Variables are identified by their index in the [`VarStore`] that created
/// them. The bounds and kind are carried along so that expressions can be
/// inspected without access to the store.
pub struct Variable {
	/// Index of the variable in its [`VarStore`].
	pub(crate) idx: VarIndex,
	/// Inclusive lower bound.
	pub(crate) lb: IntVal,
	/// Inclusive upper bound.
	pub(crate) ub: IntVal,
	/// Kind of the variable.
	pub(crate) kind: VarKind,
}

impl VarStore {
	/// Returns whether the variable was introduced by a reformulation.
	///
	/// Variables that were not created by this store are never auxiliary.
	pub fn is_auxiliary(&self, var: Variable) -> bool {
		self.defs
			.get(var.idx)
			.is_some_and(|def| def.origin == VarOrigin::Auxiliary)
	}

	/// Returns whether no variables have been created yet.
	pub fn is_empty(&self) -> bool {
		self.defs.is_empty()
	}

	/// Returns the number of variables that have been created.
	pub fn len(&self) -> usize {
		self.defs.len()
	}

	/// Create a fresh auxiliary Boolean variable.
	pub(crate) fn new_aux_bool(&mut self) -> Variable {
		self.push(0, 1, VarKind::Bool, VarOrigin::Auxiliary)
	}

	/// Create `len` fresh auxiliary Boolean variables.
	pub(crate) fn new_aux_bools(&mut self, len: usize) -> Vec<Variable> {
		(0..len).map(|_| self.new_aux_bool()).collect()
	}

	/// Create a fresh auxiliary integer variable with the given (non-empty)
	/// bounds.
	pub(crate) fn new_aux_int(&mut self, lb: IntVal, ub: IntVal) -> Variable {
		debug_assert!(lb <= ub, "auxiliary variable with empty domain");
		self.push(lb, ub, VarKind::Int, VarOrigin::Auxiliary)
	}

	/// Create a fresh auxiliary variable that can take every value of the given
	/// expression.
	pub(crate) fn new_aux_for(&mut self, expr: &Expr) -> Variable {
		if expr.is_bool() {
			self.new_aux_bool()
		} else {
			let (lb, ub) = expr.bounds();
			self.new_aux_int(lb, ub)
		}
	}

	/// Create a new user variable.
	pub(crate) fn new_user_var(&mut self, lb: IntVal, ub: IntVal, kind: VarKind) -> Variable {
		self.push(lb, ub, kind, VarOrigin::User)
	}

	/// Store the definition of a new variable and return its reference.
	fn push(&mut self, lb: IntVal, ub: IntVal, kind: VarKind, origin: VarOrigin) -> Variable {
		let idx = self.defs.push(VarDef {
			lb,
			ub,
			kind,
			origin,
		});
		Variable { idx, lb, ub, kind }
	}
}

impl Variable {
	/// Returns the inclusive bounds of the variable.
	pub fn bounds(&self) -> (IntVal, IntVal) {
		(self.lb, self.ub)
	}

	/// Returns the index of the variable in the store that created it.
	pub fn index(&self) -> usize {
		self.idx.index()
	}

	/// Returns whether the variable is a Boolean variable.
	pub fn is_bool(&self) -> bool {
		self.kind == VarKind::Bool
	}

	/// Returns the kind of the variable.
	pub fn kind(&self) -> VarKind {
		self.kind
	}
}

impl Display for Variable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			VarKind::Bool => write!(f, "BV{}", self.idx.index()),
			VarKind::Int => write!(f, "IV{}", self.idx.index()),
		}
	}
}

define_index_type! {
	/// Identifies a variable in a [`VarStore`]
	pub(crate) struct VarIndex = u32;
}
