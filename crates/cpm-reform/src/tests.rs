//! Helpers shared by the unit tests of the crate.
//!
//! Solutions are enumerated by a naive depth-first search over the variable
//! domains, which is only suitable for the small models used in tests.

use std::collections::BTreeSet;

use expect_test::Expect;
use itertools::Itertools;

use crate::{
	constraints::GlobalConstraint, functions::GlobalFunction, Assignment, Expr, IntVal, Variable,
};

/// Depth-first enumeration of the assignments satisfying a list of
/// constraints.
struct Search {
	/// Variables in the order in which they are assigned, starting with the
	/// projected variables.
	order: Vec<Variable>,
	/// Number of projected variables at the start of `order`.
	projected: usize,
	/// Constraints to check once the first `i` variables of `order` are
	/// assigned, indexed by `i`.
	checks: Vec<Vec<Expr>>,
	/// Current (partial) assignment.
	sol: Assignment,
	/// Projections of the solutions found so far.
	found: BTreeSet<Vec<IntVal>>,
}

impl Search {
	/// Whether all constraints that can be evaluated once `depth` variables are
	/// assigned hold.
	fn consistent(&self, depth: usize) -> bool {
		self.checks[depth]
			.iter()
			.all(|c| c.holds(&self.sol) == Some(true))
	}

	/// Extend the current assignment starting at `order[depth]`, returning
	/// whether any solution was found.
	///
	/// Once all projected variables are assigned, the search stops at the first
	/// solution.
	fn search(&mut self, depth: usize) -> bool {
		if depth == self.order.len() {
			let projection = self.order[..self.projected]
				.iter()
				.map(|&v| self.sol.get(v).unwrap())
				.collect();
			let _ = self.found.insert(projection);
			return true;
		}
		let var = self.order[depth];
		let (lb, ub) = var.bounds();
		let mut found = false;
		for val in lb..=ub {
			self.sol.assign(var, val);
			if self.consistent(depth + 1) && self.search(depth + 1) {
				found = true;
				if depth >= self.projected {
					break;
				}
			}
		}
		self.sol.unassign(var);
		found
	}
}

/// Returns the global constraint of the expression, panicking if it is not one.
pub(crate) fn global(e: &Expr) -> &GlobalConstraint {
	match e {
		Expr::Global(g) => g.as_ref(),
		_ => panic!("expected a global constraint, found `{e}`"),
	}
}

/// Returns the global function of the expression, panicking if it is not one.
pub(crate) fn function(e: &Expr) -> &GlobalFunction {
	match e {
		Expr::Func(f) => f.as_ref(),
		_ => panic!("expected a global function, found `{e}`"),
	}
}

/// Returns the values of the `project` variables in all assignments that
/// satisfy the constraints.
///
/// Variables that occur in the constraints but not in `project` are
/// existentially quantified.
pub(crate) fn solutions(constraints: &[Expr], project: &[Variable]) -> BTreeSet<Vec<IntVal>> {
	let mut order = project.to_vec();
	let others = constraints
		.iter()
		.flat_map(Expr::variables)
		.filter(|v| !project.contains(v))
		.unique()
		.sorted_by_key(|v| v.index())
		.collect_vec();
	order.extend(others);

	let mut checks = vec![Vec::new(); order.len() + 1];
	for c in constraints {
		let level = c
			.variables()
			.iter()
			.filter_map(|v| order.iter().position(|o| o == v))
			.max()
			.map_or(0, |pos| pos + 1);
		checks[level].push(c.clone());
	}

	let mut search = Search {
		order,
		projected: project.len(),
		checks,
		sol: Assignment::default(),
		found: BTreeSet::new(),
	};
	if search.consistent(0) {
		let _ = search.search(0);
	}
	search.found
}

/// Check the projected solutions of the constraints against a snapshot, with
/// one solution per line.
pub(crate) fn expect_solutions(constraints: &[Expr], project: &[Variable], expect: Expect) {
	let sols = solutions(constraints, project);
	expect.assert_eq(&sols.iter().map(|sol| sol.iter().join(", ")).join("\n"));
}

/// Assert that two lists of constraints have the same solutions when projected
/// onto the given variables.
pub(crate) fn assert_equivalent(original: &[Expr], transformed: &[Expr], project: &[Variable]) {
	assert_eq!(
		solutions(original, project),
		solutions(transformed, project),
		"solutions differ between\n{}\nand\n{}",
		original.iter().join("\n"),
		transformed.iter().join("\n"),
	);
}
