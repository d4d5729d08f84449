//! Evaluation of expressions under a concrete assignment, used to check
//! solutions.

use std::collections::HashMap;

use crate::{
	constraints::BoolGlobal,
	functions::NumGlobal,
	helpers::linear_transform::LinearTransform,
	model::{
		expr::{Expr, Operator},
		var::{VarIndex, Variable},
	},
	IntVal,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Concrete values for (a subset of) the variables of a model.
pub struct Assignment {
	/// The value assigned to each variable.
	values: HashMap<VarIndex, IntVal>,
}

impl Assignment {
	/// Assign a value to a variable, replacing any earlier value.
	pub fn assign(&mut self, var: Variable, val: IntVal) {
		let _ = self.values.insert(var.idx, val);
	}

	/// Returns the value assigned to the variable, if any.
	pub fn get(&self, var: Variable) -> Option<IntVal> {
		self.values.get(&var.idx).copied()
	}

	/// Remove the value assigned to the variable.
	pub fn unassign(&mut self, var: Variable) {
		let _ = self.values.remove(&var.idx);
	}

	/// Returns the assignment extended with the given value for a variable.
	pub fn with(mut self, var: Variable, val: IntVal) -> Self {
		self.assign(var, val);
		self
	}
}

impl FromIterator<(Variable, IntVal)> for Assignment {
	fn from_iter<T: IntoIterator<Item = (Variable, IntVal)>>(iter: T) -> Self {
		let mut sol = Assignment::default();
		for (var, val) in iter {
			sol.assign(var, val);
		}
		sol
	}
}

impl Expr {
	/// Returns whether the (Boolean) expression holds under the assignment, or
	/// `None` if its value is undefined.
	pub fn holds(&self, sol: &Assignment) -> Option<bool> {
		self.value(sol).map(|v| v != 0)
	}

	/// Evaluate the expression under the given assignment.
	///
	/// Boolean expressions evaluate to `0` or `1`. `None` is returned when a
	/// variable in the expression is unassigned, or when the value of a partial
	/// function is undefined. A comparison whose variables are all assigned but
	/// that involves an undefined value is `false`, so a constraint on such a
	/// value is never satisfied.
	pub fn value(&self, sol: &Assignment) -> Option<IntVal> {
		match self {
			Expr::Bool(b) => Some(IntVal::from(*b)),
			Expr::Int(v) => Some(*v),
			Expr::Var(v) => sol.get(*v),
			Expr::NegBool(v) => sol
				.get(*v)
				.map(|val| LinearTransform::negated_view().transform(val)),
			Expr::Op(op) => op.value(sol),
			Expr::Cmp(c) => match (c.lhs.value(sol), c.rhs.value(sol)) {
				(Some(lhs), Some(rhs)) => Some(IntVal::from(c.op.holds(lhs, rhs))),
				_ if self.variables().into_iter().all(|v| sol.get(v).is_some()) => Some(0),
				_ => None,
			},
			Expr::Global(g) => g.value(sol).map(IntVal::from),
			Expr::Func(g) => g.value(sol),
			Expr::Direct(_) => None,
		}
	}
}

impl Operator {
	/// Evaluate the operator under the given assignment.
	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		match self {
			Operator::And(args) => {
				let vals: Vec<_> = args.iter().map(|a| a.holds(sol)).collect();
				if vals.contains(&Some(false)) {
					Some(0)
				} else if vals.contains(&None) {
					None
				} else {
					Some(1)
				}
			}
			Operator::Or(args) => {
				let vals: Vec<_> = args.iter().map(|a| a.holds(sol)).collect();
				if vals.contains(&Some(true)) {
					Some(1)
				} else if vals.contains(&None) {
					None
				} else {
					Some(0)
				}
			}
			Operator::Implies(a, b) => match a.holds(sol)? {
				false => Some(1),
				true => b.holds(sol).map(IntVal::from),
			},
			Operator::Not(a) => a.holds(sol).map(|v| IntVal::from(!v)),
			Operator::Sum(args) => args.iter().map(|a| a.value(sol)).sum(),
			Operator::WSum(weights, args) => weights
				.iter()
				.zip(args)
				.map(|(w, a)| a.value(sol).map(|v| w * v))
				.sum(),
			Operator::Sub(a, b) => Some(a.value(sol)? - b.value(sol)?),
			Operator::Mul(a, b) => Some(a.value(sol)? * b.value(sol)?),
			Operator::Neg(a) => a.value(sol).map(|v| -v),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		element,
		model::{eval::Assignment, expr::Expr},
		Model,
	};

	#[test]
	fn test_evaluate_operators() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=5).unwrap();
		let y = prb.new_int_var(0..=5).unwrap();
		let b = prb.new_bool_var();
		let sol: Assignment = [(x, 2), (y, 4), (b, 0)].into_iter().collect();

		assert_eq!((x + y).value(&sol), Some(6));
		assert_eq!((x - y).value(&sol), Some(-2));
		assert_eq!((3 * x).value(&sol), Some(6));
		assert_eq!((!b).value(&sol), Some(1));
		assert_eq!(x.lt(y).holds(&sol), Some(true));
		assert_eq!(Expr::from(b).implies(x.gt(y)).holds(&sol), Some(true));
		assert_eq!((Expr::from(b) | x.eq(2)).holds(&sol), Some(true));
		assert_eq!((Expr::from(b) & x.eq(2)).holds(&sol), Some(false));
	}

	#[test]
	fn test_undefined_values() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=5).unwrap();
		let idx = prb.new_int_var(-1..=3).unwrap();
		let z = prb.new_int_var(0..=5).unwrap();
		let elem = element(vec![Expr::Int(1), Expr::Int(2)], idx);

		let sol = Assignment::default().with(idx, 3);
		assert_eq!(elem.value(&sol), None);
		assert_eq!(elem.eq(1).holds(&sol), Some(false));
		// The negation is pushed into the comparison, which is undefined as well
		assert_eq!((!elem.eq(1)).holds(&sol), Some(false));
		assert_eq!(elem.eq(1).implies(false).holds(&sol), Some(true));

		// Unassigned variables
		assert_eq!((x + z).value(&sol), None);
		assert_eq!(x.eq(1).holds(&sol), None);
		assert_eq!(elem.eq(x).holds(&sol), None);
		assert_eq!((x.eq(1) & Expr::Bool(false)).holds(&sol), Some(false));
		assert_eq!((x.eq(1) | Expr::Bool(false)).holds(&sol), None);
		assert_eq!((x.eq(1) | Expr::Bool(true)).holds(&sol), Some(true));
	}
}
