//! Symbolic expressions over decision variables.
//!
//! Expressions are immutable trees. Compound nodes are reference counted, so
//! rewriting an expression creates new nodes only along the rewritten path and
//! shares all other sub-trees with the original.

use std::{
	fmt::{self, Display},
	ops::{Add, BitAnd, BitOr, Mul, Neg, Not, Sub},
	rc::Rc,
};

use itertools::Itertools;

use crate::{
	constraints::{direct::DirectConstraint, try_map_all, BoolGlobal, GlobalConstraint},
	functions::{GlobalFunction, NumGlobal},
	helpers::linear_transform::LinearTransform,
	model::{var::Variable, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Relation used in a [`Comparison`].
pub enum CmpOp {
	/// Equal to (`==`).
	Eq,
	/// Not equal to (`!=`).
	Ne,
	/// Less than (`<`).
	Lt,
	/// Less than or equal to (`<=`).
	Le,
	/// Greater than (`>`).
	Gt,
	/// Greater than or equal to (`>=`).
	Ge,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Binary comparison between two integer valued expressions.
pub struct Comparison {
	/// The relation between the two sides.
	pub(crate) op: CmpOp,
	/// Left-hand side of the comparison.
	pub(crate) lhs: Expr,
	/// Right-hand side of the comparison.
	pub(crate) rhs: Expr,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A symbolic expression.
///
/// An expression is either Boolean valued (e.g. a [`Comparison`] or a
/// [`GlobalConstraint`]) or integer valued (e.g. a sum or a
/// [`GlobalFunction`]). Boolean values are interpreted as `0` and `1` in
/// arithmetic context.
pub enum Expr {
	/// Constant Boolean value.
	Bool(bool),
	/// Constant integer value.
	Int(IntVal),
	/// Decision variable.
	Var(Variable),
	/// Negated view of a Boolean decision variable.
	///
	/// The view takes the value `1 - x` and cannot be assigned independently of
	/// the underlying variable `x`.
	NegBool(Variable),
	/// Boolean or arithmetic operator.
	Op(Rc<Operator>),
	/// Comparison between two integer valued expressions.
	Cmp(Rc<Comparison>),
	/// Boolean valued global constraint.
	Global(Rc<GlobalConstraint>),
	/// Integer valued global function.
	Func(Rc<GlobalFunction>),
	/// Constraint passed verbatim to a solver backend.
	Direct(Rc<DirectConstraint>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Operators that can be used to combine expressions.
pub enum Operator {
	/// Conjunction of Boolean expressions.
	And(Vec<Expr>),
	/// Disjunction of Boolean expressions.
	Or(Vec<Expr>),
	/// Implication between two Boolean expressions.
	Implies(Expr, Expr),
	/// Negation of a Boolean expression.
	Not(Expr),
	/// Sum of integer expressions.
	Sum(Vec<Expr>),
	/// Weighted sum of integer expressions.
	///
	/// The weight list always has the same length as the argument list.
	WSum(Vec<IntVal>, Vec<Expr>),
	/// Subtraction of the second expression from the first.
	Sub(Expr, Expr),
	/// Product of two integer expressions.
	Mul(Expr, Expr),
	/// Arithmetic negation.
	Neg(Expr),
}

/// Helper to display a sub-expression, adding parentheses around operators
/// that would otherwise be ambiguous.
struct Wrapped<'a>(&'a Expr);

impl CmpOp {
	/// Returns whether the relation holds between the two given values.
	pub fn holds(&self, lhs: IntVal, rhs: IntVal) -> bool {
		match self {
			CmpOp::Eq => lhs == rhs,
			CmpOp::Ne => lhs != rhs,
			CmpOp::Lt => lhs < rhs,
			CmpOp::Le => lhs <= rhs,
			CmpOp::Gt => lhs > rhs,
			CmpOp::Ge => lhs >= rhs,
		}
	}

	/// Returns the relation that holds when the sides of the comparison are
	/// swapped.
	pub fn mirrored(&self) -> Self {
		match self {
			CmpOp::Eq => CmpOp::Eq,
			CmpOp::Ne => CmpOp::Ne,
			CmpOp::Lt => CmpOp::Gt,
			CmpOp::Le => CmpOp::Ge,
			CmpOp::Gt => CmpOp::Lt,
			CmpOp::Ge => CmpOp::Le,
		}
	}

	/// Returns the relation that holds exactly when this relation does not.
	pub fn negated(&self) -> Self {
		match self {
			CmpOp::Eq => CmpOp::Ne,
			CmpOp::Ne => CmpOp::Eq,
			CmpOp::Lt => CmpOp::Ge,
			CmpOp::Le => CmpOp::Gt,
			CmpOp::Gt => CmpOp::Le,
			CmpOp::Ge => CmpOp::Lt,
		}
	}

	/// Returns the textual symbol of the relation.
	pub fn symbol(&self) -> &'static str {
		match self {
			CmpOp::Eq => "==",
			CmpOp::Ne => "!=",
			CmpOp::Lt => "<",
			CmpOp::Le => "<=",
			CmpOp::Gt => ">",
			CmpOp::Ge => ">=",
		}
	}
}

impl Display for CmpOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.symbol())
	}
}

impl Comparison {
	/// Create a new comparison.
	pub fn new(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
		Self { op, lhs, rhs }
	}

	/// The left-hand side of the comparison.
	pub fn lhs(&self) -> &Expr {
		&self.lhs
	}

	/// The relation of the comparison.
	pub fn op(&self) -> CmpOp {
		self.op
	}

	/// The right-hand side of the comparison.
	pub fn rhs(&self) -> &Expr {
		&self.rhs
	}
}

impl Display for Comparison {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} {}", Wrapped(&self.lhs), self.op, Wrapped(&self.rhs))
	}
}

impl Expr {
	/// Returns the conjunction of the given Boolean expressions.
	///
	/// An empty conjunction is `true`, and a single expression is returned
	/// unchanged.
	pub fn all<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
		let mut exprs: Vec<Expr> = exprs.into_iter().collect();
		match exprs.len() {
			0 => Expr::Bool(true),
			1 => exprs.pop().unwrap_or(Expr::Bool(true)),
			_ => Operator::And(exprs).into(),
		}
	}

	/// Returns the disjunction of the given Boolean expressions.
	///
	/// An empty disjunction is `false`, and a single expression is returned
	/// unchanged.
	pub fn any<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
		let mut exprs: Vec<Expr> = exprs.into_iter().collect();
		match exprs.len() {
			0 => Expr::Bool(false),
			1 => exprs.pop().unwrap_or(Expr::Bool(false)),
			_ => Operator::Or(exprs).into(),
		}
	}

	/// Returns the direct sub-expressions of the expression.
	pub fn args(&self) -> Vec<Expr> {
		match self {
			Expr::Bool(_) | Expr::Int(_) | Expr::Var(_) | Expr::NegBool(_) => Vec::new(),
			Expr::Op(op) => op.args().into_iter().cloned().collect(),
			Expr::Cmp(c) => vec![c.lhs.clone(), c.rhs.clone()],
			Expr::Global(g) => g.args(),
			Expr::Func(g) => g.args(),
			Expr::Direct(d) => d.args(),
		}
	}

	/// Returns the constant value of the expression if it is a constant.
	pub fn as_constant(&self) -> Option<IntVal> {
		match self {
			Expr::Bool(b) => Some(IntVal::from(*b)),
			Expr::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the variable if the expression is a (non-negated) variable.
	pub fn as_var(&self) -> Option<Variable> {
		match self {
			Expr::Var(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the inclusive bounds of the values the expression can take.
	pub fn bounds(&self) -> (IntVal, IntVal) {
		match self {
			Expr::Bool(b) => (IntVal::from(*b), IntVal::from(*b)),
			Expr::Int(v) => (*v, *v),
			Expr::Var(v) => v.bounds(),
			Expr::NegBool(v) => {
				let (lb, ub) = v.bounds();
				LinearTransform::negated_view().transform_bounds(lb, ub)
			}
			Expr::Op(op) => op.bounds(),
			Expr::Cmp(_) | Expr::Global(_) | Expr::Direct(_) => (0, 1),
			Expr::Func(g) => g.bounds(),
		}
	}

	/// Create the constraint that the expression is equal to `rhs`.
	pub fn eq(&self, rhs: impl Into<Expr>) -> Expr {
		self.compare(CmpOp::Eq, rhs)
	}

	/// Create the constraint that the expression is greater than `rhs`.
	pub fn gt(&self, rhs: impl Into<Expr>) -> Expr {
		self.compare(CmpOp::Gt, rhs)
	}

	/// Create the constraint that the expression is greater than or equal to
	/// `rhs`.
	pub fn geq(&self, rhs: impl Into<Expr>) -> Expr {
		self.compare(CmpOp::Ge, rhs)
	}

	/// Returns whether any argument of the expression is itself a compound
	/// expression.
	pub fn has_subexpr(&self) -> bool {
		self.args().iter().any(|a| !a.is_var_or_const())
	}

	/// Create the implication from this expression to `rhs`.
	pub fn implies(&self, rhs: impl Into<Expr>) -> Expr {
		Operator::Implies(self.clone(), rhs.into()).into()
	}

	/// Returns whether the expression is Boolean valued.
	pub fn is_bool(&self) -> bool {
		match self {
			Expr::Bool(_) | Expr::NegBool(_) => true,
			Expr::Int(_) | Expr::Func(_) => false,
			Expr::Var(v) => v.is_bool(),
			Expr::Op(op) => matches!(
				op.as_ref(),
				Operator::And(_) | Operator::Or(_) | Operator::Implies(_, _) | Operator::Not(_)
			),
			Expr::Cmp(_) | Expr::Global(_) | Expr::Direct(_) => true,
		}
	}

	/// Returns whether the expression is a Boolean variable or a negated view
	/// of one.
	pub fn is_literal(&self) -> bool {
		match self {
			Expr::Var(v) => v.is_bool(),
			Expr::NegBool(_) => true,
			_ => false,
		}
	}

	/// Returns whether the expression is a variable, a negated view, or a
	/// constant.
	pub fn is_var_or_const(&self) -> bool {
		matches!(
			self,
			Expr::Bool(_) | Expr::Int(_) | Expr::Var(_) | Expr::NegBool(_)
		)
	}

	/// Create the constraint that the expression is less than or equal to
	/// `rhs`.
	pub fn leq(&self, rhs: impl Into<Expr>) -> Expr {
		self.compare(CmpOp::Le, rhs)
	}

	/// Create the constraint that the expression is less than `rhs`.
	pub fn lt(&self, rhs: impl Into<Expr>) -> Expr {
		self.compare(CmpOp::Lt, rhs)
	}

	/// Returns the name under which a backend would know the expression.
	pub fn name(&self) -> &str {
		match self {
			Expr::Bool(_) => "bool",
			Expr::Int(_) => "int",
			Expr::Var(v) if v.is_bool() => "boolvar",
			Expr::Var(_) => "intvar",
			Expr::NegBool(_) => "negboolview",
			Expr::Op(op) => op.name(),
			Expr::Cmp(c) => c.op.symbol(),
			Expr::Global(g) => g.name(),
			Expr::Func(g) => g.name(),
			Expr::Direct(d) => d.name(),
		}
	}

	/// Create the constraint that the expression is not equal to `rhs`.
	pub fn ne(&self, rhs: impl Into<Expr>) -> Expr {
		self.compare(CmpOp::Ne, rhs)
	}

	/// Returns the logical negation of a Boolean expression.
	///
	/// The negation is pushed into comparisons and logical connectives, and
	/// results in a negated view for Boolean variables.
	pub fn negated(&self) -> Expr {
		match self {
			Expr::Bool(b) => Expr::Bool(!b),
			Expr::Var(v) if v.is_bool() => Expr::NegBool(*v),
			Expr::NegBool(v) => Expr::Var(*v),
			Expr::Cmp(c) => Comparison::new(c.op.negated(), c.lhs.clone(), c.rhs.clone()).into(),
			Expr::Op(op) => match op.as_ref() {
				Operator::And(args) => Operator::Or(args.iter().map(Expr::negated).collect()).into(),
				Operator::Or(args) => Operator::And(args.iter().map(Expr::negated).collect()).into(),
				Operator::Implies(a, b) => Operator::And(vec![a.clone(), b.negated()]).into(),
				Operator::Not(a) => a.clone(),
				_ => Operator::Not(self.clone()).into(),
			},
			_ => Operator::Not(self.clone()).into(),
		}
	}

	/// Returns the sum of the given expressions.
	pub fn sum<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
		Operator::Sum(exprs.into_iter().collect()).into()
	}

	/// Create a copy of the expression in which every direct sub-expression is
	/// replaced by the result of `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Expr, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(match self {
			Expr::Bool(_) | Expr::Int(_) | Expr::Var(_) | Expr::NegBool(_) => self.clone(),
			Expr::Op(op) => op.try_map_args(f)?.into(),
			Expr::Cmp(c) => Comparison::new(c.op, f(&c.lhs)?, f(&c.rhs)?).into(),
			Expr::Global(g) => g.try_map_args(f)?.into(),
			Expr::Func(g) => g.try_map_args(f)?.into(),
			Expr::Direct(d) => d.try_map_args(f)?.into(),
		})
	}

	/// Returns all variables that occur in the expression, in order of their
	/// first occurrence.
	pub fn variables(&self) -> Vec<Variable> {
		let mut vars = Vec::new();
		self.collect_variables(&mut vars);
		vars
	}

	/// Returns the weighted sum of the given expressions.
	pub fn wsum(weights: Vec<IntVal>, exprs: Vec<Expr>) -> Result<Expr, ModelError> {
		if weights.len() != exprs.len() {
			return Err(ModelError::LengthMismatch {
				name: "wsum",
				expected: weights.len(),
				found: exprs.len(),
			});
		}
		Ok(Operator::WSum(weights, exprs).into())
	}

	/// Add all variables of the expression that are not yet in `vars`.
	fn collect_variables(&self, vars: &mut Vec<Variable>) {
		match self {
			Expr::Var(v) | Expr::NegBool(v) => {
				if !vars.contains(v) {
					vars.push(*v);
				}
			}
			Expr::Bool(_) | Expr::Int(_) => {}
			_ => {
				for arg in self.args() {
					arg.collect_variables(vars);
				}
			}
		}
	}

	/// Create a comparison between the expression and `rhs`.
	fn compare(&self, op: CmpOp, rhs: impl Into<Expr>) -> Expr {
		Comparison::new(op, self.clone(), rhs.into()).into()
	}
}

impl Add<Expr> for Expr {
	type Output = Expr;

	fn add(self, rhs: Expr) -> Self::Output {
		if let Expr::Op(op) = &self {
			if let Operator::Sum(args) = op.as_ref() {
				let mut args = args.clone();
				args.push(rhs);
				return Operator::Sum(args).into();
			}
		}
		Operator::Sum(vec![self, rhs]).into()
	}
}

impl Add<IntVal> for Expr {
	type Output = Expr;

	fn add(self, rhs: IntVal) -> Self::Output {
		self + Expr::Int(rhs)
	}
}

impl BitAnd<Expr> for Expr {
	type Output = Expr;

	fn bitand(self, rhs: Expr) -> Self::Output {
		Operator::And(vec![self, rhs]).into()
	}
}

impl BitOr<Expr> for Expr {
	type Output = Expr;

	fn bitor(self, rhs: Expr) -> Self::Output {
		Operator::Or(vec![self, rhs]).into()
	}
}

impl Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expr::Bool(b) => write!(f, "{b}"),
			Expr::Int(v) => write!(f, "{v}"),
			Expr::Var(v) => write!(f, "{v}"),
			Expr::NegBool(v) => write!(f, "~{v}"),
			Expr::Op(op) => write!(f, "{op}"),
			Expr::Cmp(c) => write!(f, "{c}"),
			Expr::Global(g) => write!(f, "{g}"),
			Expr::Func(g) => write!(f, "{g}"),
			Expr::Direct(d) => write!(f, "{d}"),
		}
	}
}

impl From<bool> for Expr {
	fn from(value: bool) -> Self {
		Expr::Bool(value)
	}
}

impl From<Comparison> for Expr {
	fn from(value: Comparison) -> Self {
		Expr::Cmp(Rc::new(value))
	}
}

impl From<DirectConstraint> for Expr {
	fn from(value: DirectConstraint) -> Self {
		Expr::Direct(Rc::new(value))
	}
}

impl From<GlobalConstraint> for Expr {
	fn from(value: GlobalConstraint) -> Self {
		Expr::Global(Rc::new(value))
	}
}

impl From<GlobalFunction> for Expr {
	fn from(value: GlobalFunction) -> Self {
		Expr::Func(Rc::new(value))
	}
}

impl From<IntVal> for Expr {
	fn from(value: IntVal) -> Self {
		Expr::Int(value)
	}
}

impl From<Operator> for Expr {
	fn from(value: Operator) -> Self {
		Expr::Op(Rc::new(value))
	}
}

impl From<Variable> for Expr {
	fn from(value: Variable) -> Self {
		Expr::Var(value)
	}
}

impl Mul<Expr> for Expr {
	type Output = Expr;

	fn mul(self, rhs: Expr) -> Self::Output {
		Operator::Mul(self, rhs).into()
	}
}

impl Mul<Expr> for IntVal {
	type Output = Expr;

	fn mul(self, rhs: Expr) -> Self::Output {
		Operator::Mul(Expr::Int(self), rhs).into()
	}
}

impl Neg for Expr {
	type Output = Expr;

	fn neg(self) -> Self::Output {
		match self {
			Expr::Int(v) => Expr::Int(-v),
			_ => Operator::Neg(self).into(),
		}
	}
}

impl Not for Expr {
	type Output = Expr;

	fn not(self) -> Self::Output {
		self.negated()
	}
}

impl Sub<Expr> for Expr {
	type Output = Expr;

	fn sub(self, rhs: Expr) -> Self::Output {
		Operator::Sub(self, rhs).into()
	}
}

impl Sub<IntVal> for Expr {
	type Output = Expr;

	fn sub(self, rhs: IntVal) -> Self::Output {
		Operator::Sub(self, Expr::Int(rhs)).into()
	}
}

impl Operator {
	/// Returns the direct sub-expressions of the operator.
	pub fn args(&self) -> Vec<&Expr> {
		match self {
			Operator::And(args) | Operator::Or(args) | Operator::Sum(args) => args.iter().collect(),
			Operator::WSum(_, args) => args.iter().collect(),
			Operator::Implies(a, b) | Operator::Sub(a, b) | Operator::Mul(a, b) => vec![a, b],
			Operator::Not(a) | Operator::Neg(a) => vec![a],
		}
	}

	/// Returns the inclusive bounds of the values the operator can take.
	pub fn bounds(&self) -> (IntVal, IntVal) {
		match self {
			Operator::And(_) | Operator::Or(_) | Operator::Implies(_, _) | Operator::Not(_) => (0, 1),
			Operator::Sum(args) => args.iter().fold((0, 0), |(lb, ub), a| {
				let (a_lb, a_ub) = a.bounds();
				(lb + a_lb, ub + a_ub)
			}),
			Operator::WSum(weights, args) => {
				weights
					.iter()
					.zip_eq(args)
					.fold((0, 0), |(lb, ub), (&w, a)| {
						let (a_lb, a_ub) = a.bounds();
						if w >= 0 {
							(lb + w * a_lb, ub + w * a_ub)
						} else {
							(lb + w * a_ub, ub + w * a_lb)
						}
					})
			}
			Operator::Sub(a, b) => {
				let (a_lb, a_ub) = a.bounds();
				let (b_lb, b_ub) = b.bounds();
				(a_lb - b_ub, a_ub - b_lb)
			}
			Operator::Mul(a, b) => {
				let (a_lb, a_ub) = a.bounds();
				let (b_lb, b_ub) = b.bounds();
				let products = [a_lb * b_lb, a_lb * b_ub, a_ub * b_lb, a_ub * b_ub];
				products
					.into_iter()
					.minmax()
					.into_option()
					.unwrap_or((0, 0))
			}
			Operator::Neg(a) => {
				let (lb, ub) = a.bounds();
				(-ub, -lb)
			}
		}
	}

	/// Returns the name under which a backend would know the operator.
	pub fn name(&self) -> &'static str {
		match self {
			Operator::And(_) => "and",
			Operator::Or(_) => "or",
			Operator::Implies(_, _) => "->",
			Operator::Not(_) => "not",
			Operator::Sum(_) => "sum",
			Operator::WSum(_, _) => "wsum",
			Operator::Sub(_, _) => "sub",
			Operator::Mul(_, _) => "mul",
			Operator::Neg(_) => "-",
		}
	}

	/// Create a copy of the operator with every argument mapped by `f`.
	fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(match self {
			Operator::And(args) => Operator::And(try_map_all(args, f)?),
			Operator::Or(args) => Operator::Or(try_map_all(args, f)?),
			Operator::Implies(a, b) => Operator::Implies(f(a)?, f(b)?),
			Operator::Not(a) => Operator::Not(f(a)?),
			Operator::Sum(args) => Operator::Sum(try_map_all(args, f)?),
			Operator::WSum(weights, args) => Operator::WSum(weights.clone(), try_map_all(args, f)?),
			Operator::Sub(a, b) => Operator::Sub(f(a)?, f(b)?),
			Operator::Mul(a, b) => Operator::Mul(f(a)?, f(b)?),
			Operator::Neg(a) => Operator::Neg(f(a)?),
		})
	}
}

impl Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Operator::And(args) => write!(f, "and([{}])", args.iter().format(", ")),
			Operator::Or(args) => write!(f, "or([{}])", args.iter().format(", ")),
			Operator::Implies(a, b) => write!(f, "{} -> {}", Wrapped(a), Wrapped(b)),
			Operator::Not(a) => write!(f, "not({a})"),
			Operator::Sum(args) => write!(f, "sum([{}])", args.iter().format(", ")),
			Operator::WSum(weights, args) => write!(
				f,
				"sum([{}] * [{}])",
				weights.iter().format(", "),
				args.iter().format(", ")
			),
			Operator::Sub(a, b) => write!(f, "{} - {}", Wrapped(a), Wrapped(b)),
			Operator::Mul(a, b) => write!(f, "{} * {}", Wrapped(a), Wrapped(b)),
			Operator::Neg(a) => write!(f, "-{}", Wrapped(a)),
		}
	}
}

impl Variable {
	/// Create the constraint that the variable is equal to `rhs`.
	pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).eq(rhs)
	}

	/// Create the constraint that the variable is greater than `rhs`.
	pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).gt(rhs)
	}

	/// Create the constraint that the variable is greater than or equal to
	/// `rhs`.
	pub fn geq(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).geq(rhs)
	}

	/// Create the implication from this (Boolean) variable to `rhs`.
	pub fn implies(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).implies(rhs)
	}

	/// Create the constraint that the variable is less than or equal to `rhs`.
	pub fn leq(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).leq(rhs)
	}

	/// Create the constraint that the variable is less than `rhs`.
	pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).lt(rhs)
	}

	/// Create the constraint that the variable is not equal to `rhs`.
	pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
		Expr::Var(self).ne(rhs)
	}
}

impl Add<Expr> for Variable {
	type Output = Expr;

	fn add(self, rhs: Expr) -> Self::Output {
		Expr::Var(self) + rhs
	}
}

impl Add<Variable> for Variable {
	type Output = Expr;

	fn add(self, rhs: Variable) -> Self::Output {
		Expr::Var(self) + Expr::Var(rhs)
	}
}

impl Add<IntVal> for Variable {
	type Output = Expr;

	fn add(self, rhs: IntVal) -> Self::Output {
		Expr::Var(self) + rhs
	}
}

impl Mul<Variable> for IntVal {
	type Output = Expr;

	fn mul(self, rhs: Variable) -> Self::Output {
		self * Expr::Var(rhs)
	}
}

impl Neg for Variable {
	type Output = Expr;

	fn neg(self) -> Self::Output {
		-Expr::Var(self)
	}
}

impl Not for Variable {
	type Output = Expr;

	fn not(self) -> Self::Output {
		!Expr::Var(self)
	}
}

impl Sub<Variable> for Variable {
	type Output = Expr;

	fn sub(self, rhs: Variable) -> Self::Output {
		Expr::Var(self) - Expr::Var(rhs)
	}
}

impl Wrapped<'_> {
	/// Whether the expression is printed in infix notation and thus needs
	/// parentheses when nested.
	fn needs_parens(&self) -> bool {
		match self.0 {
			Expr::Cmp(_) => true,
			Expr::Op(op) => matches!(
				op.as_ref(),
				Operator::Implies(_, _) | Operator::Sub(_, _) | Operator::Mul(_, _) | Operator::Neg(_)
			),
			_ => false,
		}
	}
}

impl Display for Wrapped<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.needs_parens() {
			write!(f, "({})", self.0)
		} else {
			write!(f, "{}", self.0)
		}
	}
}
