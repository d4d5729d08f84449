//! Flattening of constraints into flat normal form.
//!
//! A flat constraint is one of the following:
//!
//! - a Boolean literal, or the constant `false`,
//! - a disjunction of literals,
//! - an implication from a literal to a flat Boolean expression,
//! - a reification `flat-bool == literal`,
//! - a comparison `lhs <op> rhs` where `rhs` is a variable or constant, and
//!   `lhs` is a variable, a (weighted) sum, a subtraction, or a product over
//!   variables, or a global function over variables,
//! - a global constraint over variables and constants, or
//! - a direct constraint.
//!
//! Here, a flat Boolean expression is a literal, a conjunction or disjunction
//! of literals, a flat comparison, or a global constraint over variables and
//! constants. Any other sub-expression is replaced by an auxiliary variable
//! that is defined by a single (reified) equality.

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
	functions::NumGlobal,
	model::{
		expr::{CmpOp, Comparison, Expr, Operator},
		var::VarStore,
	},
	reformulate::{normalize::toplevel_list, TransformError},
	IntVal,
};

/// Rewriting state of the flattening of a list of constraints.
struct Flattener<'a> {
	/// Allocator used to create auxiliary variables.
	store: &'a mut VarStore,
	/// Constraints defining the auxiliary variables introduced for the
	/// constraint currently being flattened.
	defining: Vec<Expr>,
}

/// Rewrite the given constraints into flat normal form.
///
/// Every resulting constraint is directly followed by the constraints that
/// define the auxiliary variables introduced while flattening it.
pub fn flatten(constraints: Vec<Expr>, store: &mut VarStore) -> Result<Vec<Expr>, TransformError> {
	let num_vars = store.len();
	let mut flattener = Flattener {
		store,
		defining: Vec::new(),
	};
	let mut result = Vec::new();
	for c in toplevel_list(constraints) {
		trace!(constraint = %c, "flatten constraint");
		flattener.constraint(&c, &mut result)?;
		result.append(&mut flattener.defining);
	}
	debug!(
		constraints = result.len(),
		aux = flattener.store.len() - num_vars,
		"flattened constraints"
	);
	Ok(result)
}

/// Returns whether the expression is a negation that cannot be pushed any
/// further into its argument.
fn is_opaque_negation(e: &Expr) -> bool {
	matches!(e, Expr::Op(op) if matches!(op.as_ref(), Operator::Not(_)))
}

impl Flattener<'_> {
	/// Flatten the top-level constraint `e`, adding the result to `out`.
	fn constraint(&mut self, e: &Expr, out: &mut Vec<Expr>) -> Result<(), TransformError> {
		match e {
			Expr::Bool(true) => {}
			Expr::Bool(false) | Expr::NegBool(_) | Expr::Direct(_) => out.push(e.clone()),
			Expr::Var(v) if v.is_bool() => out.push(e.clone()),
			Expr::Op(op) => match op.as_ref() {
				Operator::And(args) => {
					for a in args {
						self.constraint(a, out)?;
					}
				}
				Operator::Or(args) => {
					if let Some(lits) = self.disjunction_literals(args)? {
						out.push(Expr::any(lits));
					}
				}
				Operator::Implies(a, b) => match self.literal(a)? {
					Expr::Bool(false) => {}
					Expr::Bool(true) => self.constraint(b, out)?,
					cond => match self.reified(b)? {
						Expr::Bool(true) => {}
						Expr::Bool(false) => out.push(cond.negated()),
						sub => out.push(cond.implies(sub)),
					},
				},
				Operator::Not(a) => {
					let neg = a.negated();
					if is_opaque_negation(&neg) {
						out.push(self.literal(a)?.negated());
					} else {
						self.constraint(&neg, out)?;
					}
				}
				_ => return Err(TransformError::UnsupportedExpression(e.to_string())),
			},
			Expr::Cmp(c) => {
				let flat = self.comparison(c, false)?;
				out.extend(toplevel_list([flat]));
			}
			Expr::Global(g) => out.push(g.try_map_args(&mut |a| self.var(a))?.into()),
			_ => return Err(TransformError::UnsupportedExpression(e.to_string())),
		}
		Ok(())
	}

	/// Returns the flat Boolean expression equivalent to the Boolean expression
	/// `e`.
	fn reified(&mut self, e: &Expr) -> Result<Expr, TransformError> {
		Ok(match e {
			Expr::Bool(_) | Expr::Var(_) | Expr::NegBool(_) | Expr::Direct(_) => e.clone(),
			Expr::Op(op) => match op.as_ref() {
				Operator::And(args) => match self.conjunction_literals(args)? {
					Some(lits) => Expr::all(lits),
					None => Expr::Bool(false),
				},
				Operator::Or(args) => match self.disjunction_literals(args)? {
					Some(lits) => Expr::any(lits),
					None => Expr::Bool(true),
				},
				Operator::Implies(a, b) => {
					self.reified(&Operator::Or(vec![a.negated(), b.clone()]).into())?
				}
				Operator::Not(a) => {
					let neg = a.negated();
					if is_opaque_negation(&neg) {
						self.literal(a)?.negated()
					} else {
						self.reified(&neg)?
					}
				}
				_ => return Err(TransformError::UnsupportedExpression(e.to_string())),
			},
			Expr::Cmp(c) => self.comparison(c, true)?,
			Expr::Global(g) => g.try_map_args(&mut |a| self.var(a))?.into(),
			Expr::Int(_) | Expr::Func(_) => {
				return Err(TransformError::UnsupportedExpression(e.to_string()))
			}
		})
	}

	/// Returns the literals of a conjunction, or `None` if any of them is
	/// `false`.
	fn conjunction_literals(&mut self, args: &[Expr]) -> Result<Option<Vec<Expr>>, TransformError> {
		if args.contains(&Expr::Bool(false)) {
			return Ok(None);
		}
		let mut lits = Vec::with_capacity(args.len());
		for a in args {
			match self.literal(a)? {
				Expr::Bool(true) => {}
				Expr::Bool(false) => return Ok(None),
				lit => lits.push(lit),
			}
		}
		Ok(Some(lits))
	}

	/// Returns the literals of a disjunction, or `None` if any of them is
	/// `true`.
	fn disjunction_literals(&mut self, args: &[Expr]) -> Result<Option<Vec<Expr>>, TransformError> {
		if args.contains(&Expr::Bool(true)) {
			return Ok(None);
		}
		let mut lits = Vec::with_capacity(args.len());
		for a in args {
			match self.literal(a)? {
				Expr::Bool(true) => return Ok(None),
				Expr::Bool(false) => {}
				lit => lits.push(lit),
			}
		}
		Ok(Some(lits))
	}

	/// Returns a literal or Boolean constant that takes the value of the
	/// Boolean expression `e`.
	fn literal(&mut self, e: &Expr) -> Result<Expr, TransformError> {
		Ok(match self.var(e)? {
			Expr::Int(v) => Expr::Bool(v != 0),
			lit => lit,
		})
	}

	/// Flatten a comparison.
	///
	/// When `reified` is set, the result is used as a Boolean value, and
	/// partial functions are kept in place so that they are not required to be
	/// defined when the comparison does not hold.
	fn comparison(&mut self, c: &Comparison, reified: bool) -> Result<Expr, TransformError> {
		if let (Some(l), Some(r)) = (c.lhs.as_constant(), c.rhs.as_constant()) {
			return Ok(Expr::Bool(c.op.holds(l, r)));
		}
		if matches!(c.op, CmpOp::Eq | CmpOp::Ne)
			&& c.lhs.is_bool()
			&& c.rhs.is_bool()
			&& !(c.lhs.is_var_or_const() && c.rhs.is_var_or_const())
		{
			return self.reification(c, reified);
		}

		let (op, lhs, rhs) = if c.lhs.as_constant().is_some()
			|| (c.lhs.is_var_or_const() && !c.rhs.is_var_or_const())
		{
			(c.op.mirrored(), &c.rhs, &c.lhs)
		} else {
			(c.op, &c.lhs, &c.rhs)
		};
		let lhs = match lhs {
			Expr::Func(g) if reified && g.is_total() => self.var(lhs)?,
			_ => self.num_lhs(lhs)?,
		};
		let rhs = match self.var(rhs)? {
			Expr::Bool(b) => Expr::Int(IntVal::from(b)),
			rhs => rhs,
		};

		Ok(match (lhs.as_constant(), rhs.as_constant()) {
			(Some(l), Some(r)) => Expr::Bool(op.holds(l, r)),
			(Some(_), None) => Comparison::new(op.mirrored(), rhs, lhs).into(),
			_ => Comparison::new(op, lhs, rhs).into(),
		})
	}

	/// Flatten an (in)equality between two Boolean expressions, at least one of
	/// which is not a literal.
	fn reification(&mut self, c: &Comparison, reified: bool) -> Result<Expr, TransformError> {
		let (expr, lit) = if c.lhs.is_var_or_const() {
			(&c.rhs, c.lhs.clone())
		} else if c.rhs.is_var_or_const() {
			(&c.lhs, c.rhs.clone())
		} else {
			(&c.lhs, self.literal(&c.rhs)?)
		};
		let lit = match lit {
			Expr::Int(v) => Expr::Bool(v != 0),
			lit => lit,
		};
		let lit = if c.op == CmpOp::Ne {
			lit.negated()
		} else {
			lit
		};

		match lit {
			Expr::Bool(true) => self.reified(expr),
			Expr::Bool(false) => self.reified(&expr.negated()),
			_ => {
				let flat = self.reified(expr)?;
				let flat = if reified { self.lift_bool(flat) } else { flat };
				Ok(match flat {
					Expr::Bool(true) => lit,
					Expr::Bool(false) => lit.negated(),
					flat => flat.eq(lit),
				})
			}
		}
	}

	/// Returns an expression that can be used as the left-hand side of a flat
	/// comparison, and that takes the value of the integer expression `e`.
	fn num_lhs(&mut self, e: &Expr) -> Result<Expr, TransformError> {
		match e {
			_ if e.is_var_or_const() => Ok(e.clone()),
			Expr::Op(op) => match op.as_ref() {
				Operator::Sum(_) | Operator::WSum(_, _) | Operator::Neg(_) => self.linear(e),
				Operator::Mul(a, b) if a.as_constant().is_some() || b.as_constant().is_some() => {
					self.linear(e)
				}
				Operator::Mul(a, b) => {
					let (a, b) = (self.var(a)?, self.var(b)?);
					let prod: Expr = Operator::Mul(a, b).into();
					if prod.args().iter().any(|a| a.as_constant().is_some()) {
						self.linear(&prod)
					} else {
						Ok(prod)
					}
				}
				Operator::Sub(a, b) => Ok(Operator::Sub(self.var(a)?, self.var(b)?).into()),
				_ => self.var(e),
			},
			Expr::Func(g) => Ok(g.try_map_args(&mut |a| self.var(a))?.into()),
			_ if e.is_bool() => self.var(e),
			_ => Err(TransformError::UnsupportedExpression(e.to_string())),
		}
	}

	/// Returns a constant, variable, sum, or weighted sum equivalent to the
	/// linear expression `e`, collecting the terms of nested sums, negations,
	/// and multiplications by constants.
	fn linear(&mut self, e: &Expr) -> Result<Expr, TransformError> {
		let mut terms = Vec::new();
		let mut constant = 0;
		self.collect_terms(1, e, &mut terms, &mut constant)?;

		Ok(if terms.is_empty() {
			Expr::Int(constant)
		} else if terms.iter().all(|&(w, _)| w == 1) {
			let mut args = terms.into_iter().map(|(_, t)| t).collect_vec();
			if constant != 0 {
				args.push(Expr::Int(constant));
			}
			if args.len() == 1 {
				args.swap_remove(0)
			} else {
				Operator::Sum(args).into()
			}
		} else {
			let (mut weights, mut args): (Vec<_>, Vec<_>) = terms.into_iter().unzip();
			if constant != 0 {
				weights.push(1);
				args.push(Expr::Int(constant));
			}
			Operator::WSum(weights, args).into()
		})
	}

	/// Add the terms of `weight * e` to `terms`, and its constant part to
	/// `constant`.
	fn collect_terms(
		&mut self,
		weight: IntVal,
		e: &Expr,
		terms: &mut Vec<(IntVal, Expr)>,
		constant: &mut IntVal,
	) -> Result<(), TransformError> {
		if let Some(v) = e.as_constant() {
			*constant += weight * v;
			return Ok(());
		}
		if let Expr::Op(op) = e {
			match op.as_ref() {
				Operator::Sum(args) => {
					for a in args {
						self.collect_terms(weight, a, terms, constant)?;
					}
					return Ok(());
				}
				Operator::WSum(weights, args) => {
					for (&w, a) in weights.iter().zip_eq(args) {
						self.collect_terms(weight * w, a, terms, constant)?;
					}
					return Ok(());
				}
				Operator::Neg(a) => return self.collect_terms(-weight, a, terms, constant),
				Operator::Mul(a, b) => {
					if let Some(c) = a.as_constant() {
						return self.collect_terms(weight * c, b, terms, constant);
					}
					if let Some(c) = b.as_constant() {
						return self.collect_terms(weight * c, a, terms, constant);
					}
				}
				_ => {}
			}
		}

		let term = self.var(e)?;
		match term.as_constant() {
			Some(v) => *constant += weight * v,
			None if weight != 0 => terms.push((weight, term)),
			None => {}
		}
		Ok(())
	}

	/// Returns a variable or constant that takes the value of `e`, introducing
	/// an auxiliary variable if `e` is a compound expression.
	fn var(&mut self, e: &Expr) -> Result<Expr, TransformError> {
		if e.is_var_or_const() {
			return Ok(e.clone());
		}
		if e.is_bool() {
			let flat = self.reified(e)?;
			return Ok(self.lift_bool(flat));
		}

		let lhs = self.num_lhs(e)?;
		if lhs.is_var_or_const() {
			return Ok(lhs);
		}
		let (lb, ub) = lhs.bounds();
		let aux = self.store.new_aux_int(lb, ub);
		trace!(%aux, expr = %lhs, "introduce integer auxiliary");
		self.defining.push(lhs.eq(aux));
		Ok(aux.into())
	}

	/// Returns a literal that takes the value of the flat Boolean expression
	/// `flat`, introducing an auxiliary variable if it is not a literal.
	fn lift_bool(&mut self, flat: Expr) -> Expr {
		if flat.is_var_or_const() {
			return flat;
		}
		let aux = self.store.new_aux_bool();
		trace!(%aux, expr = %flat, "introduce Boolean auxiliary");
		self.defining.push(flat.eq(aux));
		aux.into()
	}
}
