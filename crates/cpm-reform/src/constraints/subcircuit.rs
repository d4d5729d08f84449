//! Structures and decompositions for the `subcircuit` constraint, and its
//! variant that designates a position that must be part of the circuit.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	all_different,
	constraints::{
		bounds_hull, check_integer_args, index_of, successor, successors_in_range, try_map_all,
		values_of, BoolGlobal, Decomposition, GlobalConstraint,
	},
	functions::{minimum::Minimum, GlobalFunction},
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `subcircuit` constraint within a model.
///
/// This constraint enforces that the successor expressions form a single cycle
/// over a subset of the positions. Positions that are not part of the cycle
/// point to themselves. A model in which every position points to itself
/// forms the empty subcircuit, which is permitted.
pub struct SubCircuit {
	/// Successor of each position.
	pub(crate) succ: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `subcircuitwithstart` constraint within a model.
///
/// This constraint enforces [`SubCircuit`], and additionally requires that the
/// position `start` is part of the (thus non-empty) cycle.
pub struct SubCircuitWithStart {
	/// Successor of each position.
	pub(crate) succ: Vec<Expr>,
	/// Position that must be part of the cycle.
	pub(crate) start: usize,
}

/// Check the shape of the arguments of a subcircuit constraint.
fn check_successors(name: &'static str, succ: &[Expr]) -> Result<(), ModelError> {
	check_integer_args(name, succ)?;
	if succ.len() < 2 {
		return Err(ModelError::TooFewArguments {
			name,
			min: 2,
			found: succ.len(),
		});
	}
	Ok(())
}

impl SubCircuit {
	/// Create a new subcircuit constraint over the given successor expressions.
	pub fn new(succ: Vec<Expr>) -> Result<Self, ModelError> {
		check_successors("subcircuit", &succ)?;
		Ok(Self { succ })
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			succ: try_map_all(&self.succ, f)?,
		})
	}
}

impl BoolGlobal for SubCircuit {
	fn name(&self) -> &'static str {
		"subcircuit"
	}

	fn args(&self) -> Vec<Expr> {
		self.succ.clone()
	}

	fn decompose(&self, store: &mut VarStore) -> Decomposition {
		let succ = &self.succ;
		let n = succ.len();
		let hull = bounds_hull(succ, (0, n as IntVal));

		// The cycle is followed from its smallest position, or from `n` if every
		// position points to itself
		let start: Expr = store.new_aux_int(0, n as IntVal).into();
		let candidates = (0..n)
			.map(|i| ((n - i) as IntVal * succ[i].eq(i as IntVal)) + i as IntVal)
			.collect();
		// Positions visited when following the successors from `start`
		let visits: Vec<Expr> = (0..n)
			.map(|_| store.new_aux_int(hull.0, hull.1).into())
			.collect();

		let mut defining = vec![
			start.eq(GlobalFunction::Minimum(Minimum { args: candidates })),
			visits[0].eq(start),
		];
		defining.extend(
			(1..n).map(|i| visits[i].eq(successor(succ, visits[i - 1].clone(), hull))),
		);

		let mut constraining = successors_in_range(succ);
		constraining.push(all_different(succ.clone()));
		// Every position that does not point to itself is part of the cycle
		constraining.extend((0..n).map(|i| {
			succ[i]
				.ne(i as IntVal)
				.implies(Expr::any(visits.iter().map(|v| v.eq(i as IntVal))))
		}));

		Decomposition {
			constraining,
			defining,
		}
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let succ = values_of(&self.succ, sol)?;
		let n = succ.len();
		let Some(start) = (0..n).find(|&i| succ[i] != i as IntVal) else {
			return Some(true);
		};
		if !succ.iter().all_unique() {
			return Some(false);
		}

		let mut visited = vec![false; n];
		visited[start] = true;
		let mut cur = start;
		loop {
			let Some(next) = index_of(succ[cur], n) else {
				return Some(false);
			};
			if next == start {
				break;
			}
			if visited[next] {
				return Some(false);
			}
			visited[next] = true;
			cur = next;
		}
		Some((0..n).all(|i| visited[i] || succ[i] == i as IntVal))
	}
}

impl SubCircuitWithStart {
	/// Create a new subcircuit constraint over the given successor expressions,
	/// in which position `start` is part of the cycle.
	///
	/// Fails if `start` does not refer to one of the positions.
	pub fn new(succ: Vec<Expr>, start: usize) -> Result<Self, ModelError> {
		check_successors("subcircuitwithstart", &succ)?;
		if start >= succ.len() {
			return Err(ModelError::IndexOutOfRange {
				name: "subcircuitwithstart",
				index: start,
				len: succ.len(),
			});
		}
		Ok(Self { succ, start })
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			succ: try_map_all(&self.succ, f)?,
			start: self.start,
		})
	}
}

impl BoolGlobal for SubCircuitWithStart {
	fn name(&self) -> &'static str {
		"subcircuitwithstart"
	}

	fn args(&self) -> Vec<Expr> {
		self.succ.clone()
	}

	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		let subcircuit = GlobalConstraint::SubCircuit(SubCircuit {
			succ: self.succ.clone(),
		});
		Decomposition::constraining(vec![
			subcircuit.into(),
			self.succ[self.start].ne(self.start as IntVal),
		])
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let subcircuit = SubCircuit {
			succ: self.succ.clone(),
		};
		let start = self.succ[self.start].value(sol)?;
		Some(subcircuit.value(sol)? && start != self.start as IntVal)
	}
}

impl Display for SubCircuitWithStart {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}({}, start = {})",
			self.name(),
			self.succ.iter().format(", "),
			self.start
		)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{
		constraints::BoolGlobal,
		model::{eval::Assignment, expr::Expr, ModelError},
		reformulate::{decompose::decompose_in_tree, Capabilities},
		subcircuit, subcircuit_with_start,
		tests::{assert_equivalent, expect_solutions, global, solutions},
		IntVal, Model,
	};

	/// Evaluate a subcircuit over constant successors.
	fn holds(succ: &[IntVal]) -> Option<bool> {
		let c = subcircuit(succ.iter().map(|&s| Expr::Int(s))).unwrap();
		global(&c).value(&Assignment::default())
	}

	#[test]
	fn test_subcircuit_value() {
		assert_eq!(holds(&[0, 1, 2, 3]), Some(true));
		assert_eq!(holds(&[1, 0, 2, 3]), Some(true));
		assert_eq!(holds(&[2, 1, 3, 0]), Some(true));
		// Two disjoint cycles
		assert_eq!(holds(&[1, 0, 3, 2]), Some(false));
		// Repeated successor
		assert_eq!(holds(&[1, 1, 2, 3]), Some(false));
		// Successor outside of the positions
		assert_eq!(holds(&[4, 1, 2, 3]), Some(false));
	}

	#[test]
	fn test_subcircuit_with_start_value() {
		let self_loops = [0, 1, 2, 3].map(Expr::Int);
		for start in 0..4 {
			let c = subcircuit_with_start(self_loops.clone(), start).unwrap();
			assert_eq!(global(&c).value(&Assignment::default()), Some(false));
		}
		let c = subcircuit_with_start([1, 0, 2, 3].map(Expr::Int), 1).unwrap();
		assert_eq!(global(&c).value(&Assignment::default()), Some(true));
		let c = subcircuit_with_start([1, 0, 2, 3].map(Expr::Int), 2).unwrap();
		assert_eq!(global(&c).value(&Assignment::default()), Some(false));

		assert_eq!(
			subcircuit_with_start(self_loops, 4),
			Err(ModelError::IndexOutOfRange {
				name: "subcircuitwithstart",
				index: 4,
				len: 4
			})
		);
	}

	#[test]
	fn test_subcircuit_single_node() {
		// A cycle of length one is a self-loop, i.e. the node is not part of it
		assert_eq!(holds(&[0, 1]), Some(true));
		assert_eq!(
			subcircuit([Expr::Int(0)]),
			Err(ModelError::TooFewArguments {
				name: "subcircuit",
				min: 2,
				found: 1
			})
		);
	}

	#[test]
	#[traced_test]
	fn test_subcircuit_decomposition() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=2).unwrap();
		let c = subcircuit(succ.clone()).unwrap();

		let dec = global(&c).decompose(prb.store_mut());
		let cons: Vec<_> = dec.constraining.into_iter().chain(dec.defining).collect();
		expect_solutions(
			&cons,
			&succ,
			expect![[r#"
    0, 1, 2
    0, 2, 1
    1, 0, 2
    1, 2, 0
    2, 0, 1
    2, 1, 0"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_subcircuit_with_start_decomposition() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=2).unwrap();
		let c = subcircuit_with_start(succ.clone(), 0).unwrap();

		let dec = global(&c).decompose(prb.store_mut());
		expect_solutions(
			&dec.constraining,
			&succ,
			expect![[r#"
    1, 0, 2
    1, 2, 0
    2, 0, 1
    2, 1, 0"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_subcircuit_nested_successors_out_of_range() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=3).unwrap();
		let b = prb.new_bool_var();
		let c = subcircuit(succ.clone()).unwrap();
		let project = [succ.as_slice(), &[b]].concat();

		for (cons, count) in [
			// Every permutation of three positions is a subcircuit
			(vec![b.implies(c.clone())], 70),
			(vec![Expr::from(b).eq(c.clone())], 64),
			(vec![!c.clone()], 116),
		] {
			let dec = decompose_in_tree(cons.clone(), &Capabilities::default(), prb.store_mut()).unwrap();
			assert_eq!(solutions(&dec, &project).len(), count);
			assert_equivalent(&cons, &dec, &project);
		}

		// Definitions allow successors that leave the positions
		let dec = global(&c).decompose(prb.store_mut());
		let fixed = [succ[0].eq(3), succ[1].eq(3), succ[2].eq(3)];
		let cons = [dec.defining.as_slice(), &fixed].concat();
		expect_solutions(&cons, &succ, expect!["3, 3, 3"]);
	}

	#[test]
	#[traced_test]
	fn test_subcircuit_with_start_negated() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, -1..=3).unwrap();
		let cons = vec![!subcircuit_with_start(succ.clone(), 1).unwrap()];
		let dec = decompose_in_tree(cons.clone(), &Capabilities::default(), prb.store_mut()).unwrap();
		assert_equivalent(&cons, &dec, &succ);
	}
}
