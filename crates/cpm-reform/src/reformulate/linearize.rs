//! Linearization of flat constraints, and the elimination of negated Boolean
//! views from linear constraints.
//!
//! A linear constraint compares a variable, a `sum`, or a weighted sum against
//! a constant (or, for expressions that the backend declares linear, against a
//! variable). A linear constraint may be guarded by a Boolean variable using an
//! implication, i.e. an indicator constraint.

use std::{collections::HashMap, iter::once};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
	constraints::{BoolGlobal, GlobalConstraint},
	functions::{element::Element, GlobalFunction, NumGlobal},
	helpers::linear_transform::LinearTransform,
	model::{
		expr::{CmpOp, Comparison, Expr, Operator},
		var::{VarStore, Variable},
	},
	reformulate::{
		flatten::flatten, reification::only_implies, Capabilities, TransformError,
	},
	IntVal,
};

/// Rewriting state of the linearization of a list of flat constraints.
struct Linearizer<'a> {
	/// Capabilities of the targeted backend.
	caps: &'a Capabilities,
	/// Allocator used to create auxiliary variables.
	store: &'a mut VarStore,
	/// Linear constraints defining auxiliary variables, which are posted at the
	/// top level even when created for a guarded constraint.
	defining: Vec<Expr>,
}

/// Rewriting state of the elimination of negated Boolean views.
struct PositiveViews<'a> {
	/// Allocator used to create auxiliary variables.
	store: &'a mut VarStore,
	/// Auxiliary variable taking the value `1 - x` for each variable `x` that
	/// was used as a negated view outside of a (weighted) sum.
	negations: HashMap<Variable, Variable>,
	/// Constraints defining the auxiliary variables in `negations`.
	defining: Vec<Expr>,
}

/// Rewrite a list of flat constraints, in which reifications have been
/// replaced by implications, into linear constraints and indicator
/// constraints.
pub fn linearize(
	constraints: Vec<Expr>,
	caps: &Capabilities,
	store: &mut VarStore,
) -> Result<Vec<Expr>, TransformError> {
	let num_vars = store.len();
	let mut linearizer = Linearizer {
		caps,
		store,
		defining: Vec::new(),
	};
	let mut result = Vec::with_capacity(constraints.len());
	for c in &constraints {
		trace!(constraint = %c, "linearize constraint");
		result.extend(linearizer.constraint(c, false)?);
		result.append(&mut linearizer.defining);
	}
	debug!(
		constraints = result.len(),
		aux = linearizer.store.len() - num_vars,
		"linearized constraints"
	);
	Ok(result)
}

/// Remove all negated Boolean views from a list of linear constraints.
///
/// Negated views in (weighted) sums are replaced by their variable with a
/// flipped sign, adjusting the right-hand side. Any other negated view is
/// replaced by an auxiliary variable `y` defined by `x + y == 1`.
pub fn only_positive_bv(constraints: Vec<Expr>, store: &mut VarStore) -> Result<Vec<Expr>, TransformError> {
	let mut pass = PositiveViews {
		store,
		negations: HashMap::new(),
		defining: Vec::new(),
	};
	let mut result = Vec::with_capacity(constraints.len());
	for c in &constraints {
		result.push(pass.constraint(c)?);
	}
	debug!(
		aux = pass.defining.len(),
		"removed negated views from linear constraints"
	);
	result.append(&mut pass.defining);
	Ok(result)
}

/// Returns the weights and arguments of a sum or weighted sum.
fn linear_terms(e: &Expr) -> Option<(Vec<IntVal>, Vec<Expr>)> {
	match e {
		Expr::Op(op) => match op.as_ref() {
			Operator::Sum(args) => Some((vec![1; args.len()], args.clone())),
			Operator::WSum(weights, args) => Some((weights.clone(), args.clone())),
			_ => None,
		},
		_ => None,
	}
}

/// Create the (weighted) sum of the given terms, using an unweighted sum when
/// all weights are one.
fn weighted_sum(weights: Vec<IntVal>, args: Vec<Expr>) -> Expr {
	if weights.iter().all(|&w| w == 1) {
		Operator::Sum(args).into()
	} else {
		Operator::WSum(weights, args).into()
	}
}

impl Linearizer<'_> {
	/// Linearize the flat constraint `e`.
	///
	/// When `reified` is set, the result is guarded by an implication, and the
	/// rewriting cannot rely on constraints being enforced unconditionally.
	fn constraint(&mut self, e: &Expr, reified: bool) -> Result<Vec<Expr>, TransformError> {
		match e {
			Expr::Bool(true) => Ok(Vec::new()),
			Expr::Bool(false) => Ok(vec![Expr::Bool(false)]),
			Expr::Var(v) if v.is_bool() => Ok(vec![Expr::sum([e.clone()]).geq(1)]),
			Expr::NegBool(v) => Ok(vec![Expr::sum([Expr::Var(*v)]).leq(0)]),
			Expr::Op(op) => match op.as_ref() {
				Operator::And(args) => self.comparison(
					CmpOp::Ge,
					Expr::sum(args.clone()),
					Expr::Int(args.len() as IntVal),
					reified,
				),
				Operator::Or(args) => {
					self.comparison(CmpOp::Ge, Expr::sum(args.clone()), Expr::Int(1), reified)
				}
				Operator::Implies(cond, sub) if !reified => self.implication(cond, sub),
				_ => Err(TransformError::UnsupportedExpression(e.to_string())),
			},
			Expr::Cmp(c) => self.comparison(c.op, c.lhs.clone(), c.rhs.clone(), reified),
			Expr::Global(g) if self.caps.is_linear(g.name()) => Ok(vec![e.clone()]),
			Expr::Global(g) => match g.as_ref() {
				GlobalConstraint::AllDifferent(c) if !reified => self.all_different(&c.args),
				_ => Err(TransformError::UnsupportedExpression(e.to_string())),
			},
			Expr::Direct(_) => Ok(vec![e.clone()]),
			_ => Err(TransformError::UnsupportedExpression(e.to_string())),
		}
	}

	/// Linearize the implication `cond -> sub`.
	fn implication(&mut self, cond: &Expr, sub: &Expr) -> Result<Vec<Expr>, TransformError> {
		if !cond.is_literal() {
			return Err(TransformError::UnsupportedExpression(
				cond.implies(sub.clone()).to_string(),
			));
		}
		if sub.is_literal() {
			return self.constraint(&Expr::any([cond.negated(), sub.clone()]), false);
		}
		// Comparisons with non-linear functions are decomposed under the condition
		if let Expr::Cmp(c) = sub {
			if let Expr::Func(f) = &c.lhs {
				if !self.caps.is_linear(f.name()) {
					let dec = f.decompose_comparison(c.op, c.rhs.clone(), self.store);
					let guarded = once(cond.implies(Expr::all(dec.constraining)))
						.chain(dec.defining)
						.collect();
					return self.reformulated(guarded);
				}
			}
		}

		let subs = self.constraint(sub, true)?;
		if subs.contains(&Expr::Bool(false)) {
			return self.constraint(&cond.negated(), false);
		}
		Ok(subs.into_iter().map(|c| cond.implies(c)).collect())
	}

	/// Linearize the comparison `lhs <op> rhs`.
	fn comparison(
		&mut self,
		op: CmpOp,
		lhs: Expr,
		rhs: Expr,
		reified: bool,
	) -> Result<Vec<Expr>, TransformError> {
		match (lhs.as_constant(), rhs.as_constant()) {
			(Some(l), Some(r)) => return Ok(constant_result(op.holds(l, r))),
			(Some(_), None) => return self.comparison(op.mirrored(), rhs, lhs, reified),
			_ => {}
		}
		if op == CmpOp::Ne && lhs.is_literal() && rhs.is_literal() {
			return Ok(vec![Expr::sum([lhs, rhs]).eq(1)]);
		}

		let lhs = match &lhs {
			Expr::Var(_) | Expr::NegBool(_) if rhs.as_constant().is_some() => lhs,
			Expr::Var(_) | Expr::NegBool(_) => Expr::sum([lhs]),
			Expr::Op(o) => match o.as_ref() {
				Operator::Sum(_) | Operator::WSum(_, _) => lhs,
				Operator::Sub(a, b) => Operator::WSum(vec![1, -1], vec![a.clone(), b.clone()]).into(),
				Operator::Neg(a) => Operator::WSum(vec![-1], vec![a.clone()]).into(),
				Operator::Mul(a, b) => match (a.as_constant(), b.as_constant()) {
					(Some(c), _) => Operator::WSum(vec![c], vec![b.clone()]).into(),
					(None, Some(c)) => Operator::WSum(vec![c], vec![a.clone()]).into(),
					(None, None) if self.caps.is_linear(o.name()) => lhs,
					(None, None) => {
						return Err(TransformError::UnsupportedExpression(
							Comparison::new(op, lhs, rhs).to_string(),
						))
					}
				},
				_ => {
					return Err(TransformError::UnsupportedExpression(
						Comparison::new(op, lhs, rhs).to_string(),
					))
				}
			},
			Expr::Func(f) if self.caps.is_linear(f.name()) => lhs,
			Expr::Func(f) => return self.function_comparison(f, op, rhs, reified),
			_ => {
				return Err(TransformError::UnsupportedExpression(
					Comparison::new(op, lhs, rhs).to_string(),
				))
			}
		};

		// Variables to the left, constants to the right
		if let Some((weights, args)) = linear_terms(&lhs) {
			let mut k = 0;
			let mut terms = Vec::with_capacity(args.len() + 1);
			for (w, a) in weights.into_iter().zip_eq(args) {
				match a.as_constant() {
					Some(v) => k -= w * v,
					None => terms.push((w, a)),
				}
			}
			match rhs.as_constant() {
				Some(v) => k += v,
				None => terms.push((-1, rhs)),
			}
			if terms.is_empty() {
				return Ok(constant_result(op.holds(0, k)));
			}
			let (weights, args) = terms.into_iter().unzip();
			return self.relation(op, weighted_sum(weights, args), Expr::Int(k), reified);
		}
		self.relation(op, lhs, rhs, reified)
	}

	/// Linearize the relation of a comparison of which the left-hand side is
	/// already linear.
	fn relation(
		&mut self,
		op: CmpOp,
		lhs: Expr,
		rhs: Expr,
		reified: bool,
	) -> Result<Vec<Expr>, TransformError> {
		match op {
			CmpOp::Lt | CmpOp::Gt => {
				let (op, delta) = if op == CmpOp::Lt {
					(CmpOp::Le, -1)
				} else {
					(CmpOp::Ge, 1)
				};
				match rhs.as_constant() {
					Some(k) => self.comparison(op, lhs, Expr::Int(k + delta), reified),
					None => {
						let (lb, ub) = rhs.bounds();
						let aux: Expr = self.store.new_aux_int(lb + delta, ub + delta).into();
						let shifted = Operator::WSum(vec![1, -1], vec![aux.clone(), rhs]).into();
						let defining = self.comparison(CmpOp::Eq, shifted, Expr::Int(delta), false)?;
						self.defining.extend(defining);
						self.comparison(op, lhs, aux, reified)
					}
				}
			}
			CmpOp::Ne if reified || (linear_terms(&lhs).is_none() && !lhs.is_var_or_const()) => {
				self.big_m(lhs, rhs)
			}
			CmpOp::Ne => {
				let z: Expr = self.store.new_aux_bool().into();
				let mut cons = self.implication(&z, &lhs.lt(rhs.clone()))?;
				cons.extend(self.implication(&z.negated(), &lhs.gt(rhs))?);
				Ok(cons)
			}
			_ => Ok(vec![Comparison::new(op, lhs, rhs).into()]),
		}
	}

	/// Linearize `lhs != rhs` using a Big-M encoding with an auxiliary Boolean
	/// variable `z`, where `z` selects whether `lhs` is greater than `rhs`.
	///
	/// A left-hand side that is not a (weighted) sum or variable is replaced by
	/// an auxiliary variable. Its definition is posted at the top level, unless
	/// the left-hand side is a partial function.
	fn big_m(&mut self, lhs: Expr, rhs: Expr) -> Result<Vec<Expr>, TransformError> {
		let mut cons = Vec::new();
		let (mut weights, mut args) = match linear_terms(&lhs) {
			Some(terms) => terms,
			None if lhs.is_var_or_const() => (vec![1], vec![lhs]),
			None => {
				let (lb, ub) = lhs.bounds();
				let aux: Expr = self.store.new_aux_int(lb, ub).into();
				let partial = matches!(&lhs, Expr::Func(f) if !f.is_total());
				let defining = self.comparison(CmpOp::Eq, lhs, aux.clone(), false)?;
				if partial {
					cons.extend(defining);
				} else {
					self.defining.extend(defining);
				}
				(vec![1], vec![aux])
			}
		};
		let k = match rhs.as_constant() {
			Some(k) => k,
			None => {
				weights.push(-1);
				args.push(rhs);
				0
			}
		};

		let (lb, ub) = Operator::WSum(weights.clone(), args.clone()).bounds();
		let m = (ub - k).max(k - lb) + 1;
		let z = self.store.new_aux_bool();
		trace!(big_m = m, %z, "introduce Big-M indicator");
		weights.push(-m);
		args.push(z.into());
		let l: Expr = Operator::WSum(weights, args).into();
		cons.push(l.leq(k - 1));
		cons.push(l.geq(k - m + 1));
		Ok(cons)
	}

	/// Linearize the comparison `f <op> rhs` for a function `f` that the
	/// backend does not consider linear.
	fn function_comparison(
		&mut self,
		f: &GlobalFunction,
		op: CmpOp,
		rhs: Expr,
		reified: bool,
	) -> Result<Vec<Expr>, TransformError> {
		match f {
			GlobalFunction::Element(elem) if !reified => self.element(elem, op, rhs),
			_ if reified => Err(TransformError::UnsupportedExpression(
				Comparison::new(op, f.clone().into(), rhs).to_string(),
			)),
			_ => {
				let dec = f.decompose_comparison(op, rhs, self.store);
				self.reformulated(dec.constraining.into_iter().chain(dec.defining).collect())
			}
		}
	}

	/// Linearize `array[index] <op> rhs` using a channeling vector `sigma`
	/// where `sigma[k]` holds if and only if `index == k`.
	fn element(&mut self, elem: &Element, op: CmpOp, rhs: Expr) -> Result<Vec<Expr>, TransformError> {
		let n = elem.array.len();
		let sigma = self
			.store
			.new_aux_bools(n)
			.into_iter()
			.map(Expr::from)
			.collect_vec();

		let mut cons = self.comparison(CmpOp::Eq, Expr::sum(sigma.clone()), Expr::Int(1), false)?;
		let positions = Operator::WSum((0..n as IntVal).collect(), sigma.clone()).into();
		cons.extend(self.comparison(CmpOp::Eq, positions, elem.index.clone(), false)?);
		for (s, a) in sigma.iter().zip_eq(&elem.array) {
			let holds = Comparison::new(op, a.clone(), rhs.clone()).into();
			cons.extend(self.implication(s, &holds)?);
		}
		Ok(cons)
	}

	/// Linearize `alldifferent(args)` using a bipartite assignment of the
	/// arguments to the values in their domains.
	///
	/// `sigma[i][k]` holds if and only if `args[i]` takes the `k`-th value.
	fn all_different(&mut self, args: &[Expr]) -> Result<Vec<Expr>, TransformError> {
		let (lbs, ubs): (Vec<_>, Vec<_>) = args.iter().map(Expr::bounds).unzip();
		let (Some(lb), Some(ub)) = (lbs.into_iter().min(), ubs.into_iter().max()) else {
			return Ok(Vec::new());
		};
		let values = (lb..=ub).collect_vec();
		let sigma = args
			.iter()
			.map(|_| {
				self.store
					.new_aux_bools(values.len())
					.into_iter()
					.map(Expr::from)
					.collect_vec()
			})
			.collect_vec();

		let mut cons = Vec::new();
		for (arg, row) in args.iter().zip_eq(&sigma) {
			cons.extend(self.comparison(CmpOp::Eq, Expr::sum(row.clone()), Expr::Int(1), false)?);
			let value = Operator::WSum(values.clone(), row.clone()).into();
			cons.extend(self.comparison(CmpOp::Eq, value, arg.clone(), false)?);
		}
		for k in 0..values.len() {
			let used = Expr::sum(sigma.iter().map(|row| row[k].clone()));
			cons.extend(self.comparison(CmpOp::Le, used, Expr::Int(1), false)?);
		}
		Ok(cons)
	}

	/// Flatten and linearize the constraints resulting from a decomposition.
	fn reformulated(&mut self, constraints: Vec<Expr>) -> Result<Vec<Expr>, TransformError> {
		let flat = flatten(constraints, self.store)?;
		let implied = only_implies(flat, self.store)?;
		let mut result = Vec::new();
		for c in &implied {
			result.extend(self.constraint(c, false)?);
		}
		Ok(result)
	}
}

/// Returns the linearization of a constraint known to be `holds`.
fn constant_result(holds: bool) -> Vec<Expr> {
	if holds {
		Vec::new()
	} else {
		vec![Expr::Bool(false)]
	}
}

impl PositiveViews<'_> {
	/// Remove the negated views from the linear constraint `e`.
	fn constraint(&mut self, e: &Expr) -> Result<Expr, TransformError> {
		match e {
			Expr::Bool(_) | Expr::Direct(_) => Ok(e.clone()),
			Expr::Cmp(c) => self.comparison(c),
			Expr::Op(op) => match op.as_ref() {
				Operator::Implies(cond, sub) => {
					let cond = self.positive(cond);
					Ok(cond.implies(self.constraint(sub)?))
				}
				_ => Err(TransformError::UnsupportedExpression(e.to_string())),
			},
			Expr::Global(_) => e.try_map_args(&mut |a| Ok(self.positive(a))),
			_ => Err(TransformError::UnsupportedExpression(e.to_string())),
		}
	}

	/// Remove the negated views from a linear comparison.
	fn comparison(&mut self, c: &Comparison) -> Result<Expr, TransformError> {
		match &c.lhs {
			Expr::NegBool(_) => Ok(self.weighted(c.op, vec![1], vec![c.lhs.clone()], &c.rhs)),
			Expr::Op(op) => match op.as_ref() {
				Operator::Sum(args) if args.iter().any(|a| matches!(a, Expr::NegBool(_))) => {
					Ok(self.weighted(c.op, vec![1; args.len()], args.clone(), &c.rhs))
				}
				Operator::WSum(weights, args) => {
					Ok(self.weighted(c.op, weights.clone(), args.clone(), &c.rhs))
				}
				_ => self.mapped_comparison(c),
			},
			_ => self.mapped_comparison(c),
		}
	}

	/// Replace the negated views in the arguments of a comparison by auxiliary
	/// variables.
	fn mapped_comparison(&mut self, c: &Comparison) -> Result<Expr, TransformError> {
		let lhs = c.lhs.try_map_args(&mut |a| Ok(self.positive(a)))?;
		let lhs = self.positive(&lhs);
		let rhs = self.positive(&c.rhs);
		Ok(Comparison::new(c.op, lhs, rhs).into())
	}

	/// Create the weighted sum comparison `sum(weights * args) <op> rhs` in
	/// which every negated view `~x` with weight `w` is replaced by `x` with
	/// weight `-w`, moving the constant `w` to the right-hand side.
	fn weighted(&mut self, op: CmpOp, weights: Vec<IntVal>, args: Vec<Expr>, rhs: &Expr) -> Expr {
		let view = LinearTransform::negated_view();
		let mut offset = 0;
		let (mut weights, mut args): (Vec<_>, Vec<_>) = weights
			.into_iter()
			.zip_eq(args)
			.map(|(w, a)| match a {
				Expr::NegBool(v) => {
					let (coef, k) = view.weighted(w);
					offset += k;
					(coef, Expr::Var(v))
				}
				a => (w, a),
			})
			.unzip();
		let rhs = match rhs.as_constant() {
			Some(k) => Expr::Int(k - offset),
			None => {
				weights.push(-1);
				args.push(self.positive(rhs));
				Expr::Int(-offset)
			}
		};
		Comparison::new(op, Operator::WSum(weights, args).into(), rhs).into()
	}

	/// Returns a positive literal (or other expression) taking the value of
	/// `e`, introducing an auxiliary variable for a negated view.
	fn positive(&mut self, e: &Expr) -> Expr {
		let Expr::NegBool(v) = e else {
			return e.clone();
		};
		if let Some(&aux) = self.negations.get(v) {
			return aux.into();
		}
		let aux = self.store.new_aux_bool();
		trace!(var = %v, %aux, "introduce positive negation");
		self.defining.push(Expr::sum([Expr::Var(*v), aux.into()]).eq(1));
		let _ = self.negations.insert(*v, aux);
		aux.into()
	}
}
