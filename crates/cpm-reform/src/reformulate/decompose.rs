//! Decomposition of the global constraints and global functions that are not
//! supported by a solver backend.
//!
//! Two strategies are provided. [`decompose_in_tree`] walks arbitrarily nested
//! expressions, and [`decompose_flat`] works on the output of
//! [`super::flatten::flatten`]. Both distinguish constraints at the top level
//! of a model from constraints nested in another expression (e.g. reified),
//! since a backend might only support the former.

use std::iter::once;

use tracing::{debug, trace};

use crate::{
	constraints::{BoolGlobal, Decomposition},
	functions::{GlobalFunction, NumGlobal},
	model::{
		expr::{CmpOp, Comparison, Expr, Operator},
		var::VarStore,
	},
	reformulate::{flatten::flatten, normalize::toplevel_list, Capabilities, TransformError},
};

/// Rewriting state of the tree-recursive decomposition.
struct TreeDecomposer<'a> {
	/// Capabilities of the targeted backend.
	caps: &'a Capabilities,
	/// Allocator used to create auxiliary variables.
	store: &'a mut VarStore,
}

/// Decompose all global constraints and functions in `constraints` that are not
/// supported by the backend in the context in which they occur.
///
/// Constraints that define auxiliary variables are posted at the top level,
/// and are decomposed in turn until no unsupported constraints remain.
pub fn decompose_in_tree(
	constraints: Vec<Expr>,
	caps: &Capabilities,
	store: &mut VarStore,
) -> Result<Vec<Expr>, TransformError> {
	let mut decomposer = TreeDecomposer { caps, store };
	let mut result = Vec::new();
	let mut todo = constraints;
	let mut round = 0;
	while !todo.is_empty() {
		let mut pending = Vec::new();
		for c in toplevel_list(todo) {
			let (c, defining) = decomposer.expr(&c, true)?;
			result.extend(toplevel_list([c]));
			pending.extend(defining);
		}
		debug!(
			round,
			constraints = result.len(),
			pending = pending.len(),
			"decomposed constraints in tree"
		);
		todo = pending;
		round += 1;
	}
	Ok(result)
}

/// Decompose the unsupported global constraints and functions in a list of
/// flat constraints.
///
/// A decomposed constraint is flattened again, and the result is decomposed in
/// turn, until every remaining constraint is supported by the backend.
pub fn decompose_flat(
	constraints: Vec<Expr>,
	caps: &Capabilities,
	store: &mut VarStore,
) -> Result<Vec<Expr>, TransformError> {
	let num_vars = store.len();
	let result = decompose_flat_list(constraints, caps, store)?;
	debug!(
		constraints = result.len(),
		aux = store.len() - num_vars,
		"decomposed flat constraints"
	);
	Ok(result)
}

/// Recursive step of [`decompose_flat`].
fn decompose_flat_list(
	constraints: Vec<Expr>,
	caps: &Capabilities,
	store: &mut VarStore,
) -> Result<Vec<Expr>, TransformError> {
	let mut result = Vec::with_capacity(constraints.len());
	for c in constraints {
		match decompose_unsupported(&c, caps, store)? {
			None => result.push(c),
			Some(replacement) => {
				trace!(constraint = %c, "decompose flat constraint");
				let flat = flatten(replacement, store)?;
				result.extend(decompose_flat_list(flat, caps, store)?);
			}
		}
	}
	Ok(result)
}

/// Returns the constraints replacing the flat constraint `c`, or `None` if `c`
/// is supported by the backend.
fn decompose_unsupported(
	c: &Expr,
	caps: &Capabilities,
	store: &mut VarStore,
) -> Result<Option<Vec<Expr>>, TransformError> {
	Ok(match c {
		Expr::Global(g) if !caps.is_supported(g.name()) => {
			let Decomposition {
				constraining,
				defining,
			} = g.decompose(store);
			Some(constraining.into_iter().chain(defining).collect())
		}
		// Reification of a Boolean expression
		Expr::Cmp(cmp) if cmp.op == CmpOp::Eq && cmp.lhs.is_bool() => {
			if is_supported(&cmp.lhs, true, caps) {
				None
			} else {
				let dec = decompose(&cmp.lhs, store)?;
				let reif = Expr::all(dec.constraining).eq(cmp.rhs.clone());
				Some(once(reif).chain(dec.defining).collect())
			}
		}
		Expr::Cmp(cmp) => match &cmp.lhs {
			Expr::Func(f) if !caps.is_supported(f.name()) => {
				let Decomposition {
					constraining,
					defining,
				} = f.decompose_comparison(cmp.op, cmp.rhs.clone(), store);
				Some(constraining.into_iter().chain(defining).collect())
			}
			_ => None,
		},
		Expr::Op(op) => match op.as_ref() {
			Operator::Implies(cond, sub) if !is_supported(sub, true, caps) => {
				let dec = decompose(sub, store)?;
				let imp = cond.implies(Expr::all(dec.constraining));
				Some(once(imp).chain(dec.defining).collect())
			}
			_ => None,
		},
		_ => None,
	})
}

/// Returns whether the backend supports the flat Boolean expression `e`, either
/// at the top level or, when `reified` is set, nested in another expression.
fn is_supported(e: &Expr, reified: bool, caps: &Capabilities) -> bool {
	let supports = |name: &str| {
		if reified {
			caps.is_supported_reified(name)
		} else {
			caps.is_supported(name)
		}
	};
	match e {
		Expr::Global(g) => supports(g.name()),
		Expr::Cmp(c) => match &c.lhs {
			Expr::Func(f) => supports(f.name()),
			_ => true,
		},
		Expr::Direct(d) => !reified || caps.is_supported_reified(d.name()),
		_ => true,
	}
}

/// Decompose the global constraint, or the comparison with a global function,
/// `e`.
fn decompose(e: &Expr, store: &mut VarStore) -> Result<Decomposition, TransformError> {
	match e {
		Expr::Global(g) => Ok(g.decompose(store)),
		Expr::Cmp(c) => match &c.lhs {
			Expr::Func(f) => Ok(f.decompose_comparison(c.op, c.rhs.clone(), store)),
			_ => Err(TransformError::UnimplementedDecomposition(e.to_string())),
		},
		_ => Err(TransformError::UnimplementedDecomposition(e.to_string())),
	}
}

impl TreeDecomposer<'_> {
	/// Decompose the unsupported constraints in `e`.
	///
	/// Returns the rewritten expression together with the constraints that
	/// have to be posted at the top level of the model.
	fn expr(&mut self, e: &Expr, top: bool) -> Result<(Expr, Vec<Expr>), TransformError> {
		match e {
			Expr::Bool(_) | Expr::Int(_) | Expr::Var(_) | Expr::NegBool(_) => Ok((e.clone(), Vec::new())),
			Expr::Op(_) => {
				let mut acc = Vec::new();
				let e = e.try_map_args(&mut |a| self.arg(a, top, &mut acc))?;
				Ok((e, acc))
			}
			Expr::Cmp(c) => self.comparison(c, top),
			Expr::Global(g) => {
				let mut acc = Vec::new();
				let g = g.try_map_args(&mut |a| self.arg(a, top, &mut acc))?;
				let supported = if top {
					self.caps.is_supported(g.name())
				} else {
					self.caps.is_supported_reified(g.name())
				};
				if supported {
					return Ok((g.into(), acc));
				}

				trace!(constraint = %g, top, "decompose global constraint");
				let dec = g.decompose(self.store);
				let (c, defining) = self.decomposition(dec, top)?;
				acc.extend(defining);
				Ok((c, acc))
			}
			Expr::Func(f) => {
				let mut acc = Vec::new();
				let f = f.try_map_args(&mut |a| self.arg(a, top, &mut acc))?;
				if self.is_supported_function(&f, top) {
					return Ok((f.into(), acc));
				}

				let (lb, ub) = f.bounds();
				let aux = self.store.new_aux_int(lb, ub);
				trace!(function = %f, %aux, "lift global function");
				let dec = f.decompose_comparison(CmpOp::Eq, aux.into(), self.store);
				acc.extend(dec.constraining);
				acc.extend(dec.defining);
				Ok((aux.into(), acc))
			}
			Expr::Direct(d) => {
				if top || self.caps.is_supported_reified(d.name()) {
					Ok((e.clone(), Vec::new()))
				} else {
					Err(TransformError::UnimplementedDecomposition(e.to_string()))
				}
			}
		}
	}

	/// Decompose the argument `a` of an expression in context `top`, adding
	/// the constraints to be posted at the top level to `acc`.
	///
	/// Boolean arguments are always nested.
	fn arg(&mut self, a: &Expr, top: bool, acc: &mut Vec<Expr>) -> Result<Expr, TransformError> {
		let (a_new, defining) = self.expr(a, top && !a.is_bool())?;
		acc.extend(defining);
		Ok(a_new)
	}

	/// Decompose a comparison, directly using the decomposition of a
	/// comparison with an unsupported global function on either side.
	fn comparison(&mut self, c: &Comparison, top: bool) -> Result<(Expr, Vec<Expr>), TransformError> {
		let (f, op, other) = match (
			self.unsupported_function(&c.lhs, top),
			self.unsupported_function(&c.rhs, top),
		) {
			(Some(f), _) => (f, c.op, &c.rhs),
			(None, Some(f)) => (f, c.op.mirrored(), &c.lhs),
			(None, None) => {
				let mut acc = Vec::new();
				let lhs = self.arg(&c.lhs, top, &mut acc)?;
				let rhs = self.arg(&c.rhs, top, &mut acc)?;
				return Ok((Comparison::new(c.op, lhs, rhs).into(), acc));
			}
		};

		let mut acc = Vec::new();
		let f = f.try_map_args(&mut |a| self.arg(a, top, &mut acc))?;
		let other = self.arg(other, top, &mut acc)?;
		trace!(function = %f, %op, rhs = %other, top, "decompose comparison");
		let dec = f.decompose_comparison(op, other, self.store);
		let (c, defining) = self.decomposition(dec, top)?;
		acc.extend(defining);
		Ok((c, acc))
	}

	/// Recursively decompose the constraining part of a decomposition in
	/// context `top`, returning their conjunction and all constraints to be
	/// posted at the top level.
	fn decomposition(&mut self, dec: Decomposition, top: bool) -> Result<(Expr, Vec<Expr>), TransformError> {
		let mut parts = Vec::with_capacity(dec.constraining.len());
		let mut acc = Vec::new();
		for c in &dec.constraining {
			let (c, defining) = self.expr(c, top)?;
			parts.push(c);
			acc.extend(defining);
		}
		acc.extend(dec.defining);
		Ok((Expr::all(parts), acc))
	}

	/// Returns whether the backend supports the global function `f` in context
	/// `top`.
	///
	/// Partial functions nested in another expression can only be kept when the
	/// backend supports them in reified form.
	fn is_supported_function(&self, f: &GlobalFunction, top: bool) -> bool {
		self.caps.is_supported(f.name())
			&& (top || f.is_total() || self.caps.is_supported_reified(f.name()))
	}

	/// Returns the global function `e` if it is not supported in context `top`.
	fn unsupported_function<'e>(&self, e: &'e Expr, top: bool) -> Option<&'e GlobalFunction> {
		match e {
			Expr::Func(f) if !self.is_supported_function(f, top) => Some(f.as_ref()),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use tracing_test::traced_test;

	use crate::{
		abs, all_different, circuit,
		constraints::{BoolGlobal, Decomposition},
		direct,
		functions::NumGlobal,
		in_set, minimum,
		model::expr::{CmpOp, Expr},
		reformulate::{
			decompose::{decompose_flat, decompose_in_tree},
			flatten::flatten,
			Capabilities, TransformError,
		},
		tests::{assert_equivalent, function, global},
		IntSetVal, Model,
	};

	#[test]
	#[traced_test]
	fn test_decompose_nested_global() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(3, 0..=2).unwrap();
		let b = prb.new_bool_var();
		let cons = vec![all_different(x.clone()), b.implies(all_different(x.clone()))];
		let caps = Capabilities::default().with_supported(["alldifferent"]);

		let dec = decompose_in_tree(cons.clone(), &caps, prb.store_mut()).unwrap();
		expect![[r#"
    alldifferent(IV0, IV1, IV2)
    BV3 -> and([IV0 != IV1, IV0 != IV2, IV1 != IV2])"#]]
		.assert_eq(&dec.iter().join("\n"));

		// Decomposing again does not change anything
		assert_eq!(decompose_in_tree(dec.clone(), &caps, prb.store_mut()).unwrap(), dec);
	}

	#[test]
	#[traced_test]
	fn test_decompose_comparison() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(2, 0..=2).unwrap();
		let c = Expr::Int(1).geq(minimum(x.clone()).unwrap());

		let dec = decompose_in_tree(vec![c.clone()], &Capabilities::default(), prb.store_mut()).unwrap();
		expect![[r#"
    IV2 <= 1
    IV2 <= IV0
    IV2 <= IV1
    or([IV2 == IV0, IV2 == IV1])"#]]
		.assert_eq(&dec.iter().join("\n"));
		assert_equivalent(&[c], &dec, &x);
	}

	#[test]
	#[traced_test]
	fn test_decompose_nested_function() {
		let mut prb = Model::default();
		let x = prb.new_int_var(-2..=2).unwrap();
		let y = prb.new_int_var(0..=3).unwrap();
		let c = (abs(x) + Expr::from(y)).leq(3);

		let dec = decompose_in_tree(vec![c.clone()], &Capabilities::default(), prb.store_mut()).unwrap();
		expect![[r#"
    sum([IV2, IV1]) <= 3
    IV3 == IV2
    (IV0 >= 0) -> (IV0 == IV3)
    (IV0 < 0) -> ((-IV0) == IV3)"#]]
		.assert_eq(&dec.iter().join("\n"));
		assert_equivalent(&[c.clone()], &dec, &[x, y]);

		// Supported functions are kept
		let caps = Capabilities::default().with_supported(["abs"]);
		let dec = decompose_in_tree(vec![c.clone()], &caps, prb.store_mut()).unwrap();
		assert_eq!(dec, vec![c]);
	}

	#[test]
	fn test_definitions_use_fresh_variables() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=2).unwrap();
		let x = prb.new_int_var(-2..=2).unwrap();
		let y = prb.new_int_var(0..=4).unwrap();
		let args = [succ.as_slice(), &[x, y]].concat();

		// A defining constraint only refers to the arguments and to variables that
		// did not exist before the decomposition, so it cannot depend on itself.
		let check = |dec: Decomposition, first_aux: usize| {
			for d in &dec.defining {
				let vars = d.variables();
				assert!(vars.iter().any(|v| v.index() >= first_aux), "{d}");
				assert!(vars.iter().all(|v| v.index() >= first_aux || args.contains(v)));
			}
		};

		let first_aux = prb.store().len();
		let c = circuit(succ.clone()).unwrap();
		check(global(&c).decompose(prb.store_mut()), first_aux);

		let first_aux = prb.store().len();
		let c = in_set(x + y, IntSetVal::from_iter([0..=1, 3..=3]));
		check(global(&c).decompose(prb.store_mut()), first_aux);

		for f in [minimum([x, y]).unwrap(), abs(x)] {
			let first_aux = prb.store().len();
			let dec = function(&f).decompose_comparison(CmpOp::Le, y.into(), prb.store_mut());
			check(dec, first_aux);
		}
	}

	#[test]
	#[traced_test]
	fn test_decompose_flat_reified() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(3, 0..=2).unwrap();
		let b = prb.new_bool_var();
		let cons = vec![
			Expr::from(b).eq(all_different(x.clone())),
			b.implies(minimum(x.clone()).unwrap().geq(1)),
		];
		let caps = Capabilities::default().with_supported(["alldifferent", "min"]);

		let flat = flatten(cons.clone(), prb.store_mut()).unwrap();
		let dec = decompose_flat(flat, &caps, prb.store_mut()).unwrap();
		expect![[r#"
    and([BV5, BV6, BV7]) == BV3
    (IV0 != IV1) == BV5
    (IV0 != IV2) == BV6
    (IV1 != IV2) == BV7
    BV3 -> (IV4 >= 1)
    min(IV0, IV1, IV2) == IV4"#]]
		.assert_eq(&dec.iter().join("\n"));
		assert_equivalent(&cons, &dec, &[x.as_slice(), &[b]].concat());
	}

	#[test]
	#[traced_test]
	fn test_tree_and_flat_agree() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(4, 0..=3).unwrap();
		let b = prb.new_bool_var();
		let cons = vec![b.implies(circuit(succ.clone()).unwrap()), succ[0].ne(0)];
		let caps = Capabilities::default().with_supported(["alldifferent"]);

		let mut tree_prb = prb.clone();
		let tree = decompose_in_tree(cons.clone(), &caps, tree_prb.store_mut()).unwrap();
		let tree = flatten(tree, tree_prb.store_mut()).unwrap();
		let tree = decompose_flat(tree, &caps, tree_prb.store_mut()).unwrap();

		let flat = flatten(cons.clone(), prb.store_mut()).unwrap();
		let flat = decompose_flat(flat, &caps, prb.store_mut()).unwrap();

		for c in tree.iter().chain(&flat) {
			assert!(!c.to_string().contains("circuit"));
		}
		let project = [succ.as_slice(), &[b]].concat();
		assert_equivalent(&cons, &tree, &project);
		assert_equivalent(&cons, &flat, &project);
	}

	#[test]
	fn test_nested_direct() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=3).unwrap();
		let b = prb.new_bool_var();
		let d = direct("AddMaxEquality", vec![Expr::from(x).into()], Vec::new());

		let dec = decompose_in_tree(vec![d.clone()], &Capabilities::default(), prb.store_mut());
		assert_eq!(dec, Ok(vec![d.clone()]));

		let nested = b.implies(d.clone());
		assert_eq!(
			decompose_in_tree(vec![nested.clone()], &Capabilities::default(), prb.store_mut()),
			Err(TransformError::UnimplementedDecomposition(d.to_string()))
		);
		let flat = flatten(vec![nested], prb.store_mut()).unwrap();
		assert_eq!(
			decompose_flat(flat, &Capabilities::default(), prb.store_mut()),
			Err(TransformError::UnimplementedDecomposition(d.to_string()))
		);
	}
}
