//! Structures and decomposition for the `circuit` constraint.

use crate::{
	all_different,
	constraints::{
		bounds_hull, check_integer_args, index_of, successor, successors_in_range, try_map_all,
		values_of, BoolGlobal, Decomposition,
	},
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `circuit` constraint within a model.
///
/// This constraint enforces that the successor expressions form a single
/// Hamiltonian cycle, where `succ[i] = j` means that `j` is visited directly
/// after `i`.
pub struct Circuit {
	/// Successor of each position.
	pub(crate) succ: Vec<Expr>,
}

impl Circuit {
	/// Create a new circuit constraint over the given successor expressions.
	///
	/// Fails if any of the expressions is Boolean, or if fewer than two
	/// positions are given.
	pub fn new(succ: Vec<Expr>) -> Result<Self, ModelError> {
		check_integer_args("circuit", &succ)?;
		if succ.len() < 2 {
			return Err(ModelError::TooFewArguments {
				name: "circuit",
				min: 2,
				found: succ.len(),
			});
		}
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

impl BoolGlobal for Circuit {
	fn name(&self) -> &'static str {
		"circuit"
	}

	fn args(&self) -> Vec<Expr> {
		self.succ.clone()
	}

	fn decompose(&self, store: &mut VarStore) -> Decomposition {
		let n = self.succ.len();
		let hull = bounds_hull(&self.succ, (0, 0));
		// order[i] is the position visited after i + 1 steps from position 0,
		// where a value outside of the positions is never left again
		let order: Vec<Expr> = (0..n)
			.map(|_| store.new_aux_int(hull.0, hull.1).into())
			.collect();

		let mut constraining = successors_in_range(&self.succ);
		constraining.extend([
			all_different(self.succ.clone()),
			all_different(order.clone()),
			// The last step returns to position 0
			order[n - 1].eq(0),
		]);

		let mut defining = vec![order[0].eq(self.succ[0].clone())];
		defining.extend(
			(1..n).map(|i| order[i].eq(successor(&self.succ, order[i - 1].clone(), hull))),
		);

		Decomposition {
			constraining,
			defining,
		}
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let succ = values_of(&self.succ, sol)?;
		let n = succ.len();
		let mut cur = 0;
		for step in 1..=n {
			cur = match index_of(succ[cur], n) {
				Some(next) => next,
				None => return Some(false),
			};
			if cur == 0 {
				return Some(step == n);
			}
		}
		Some(false)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use tracing_test::traced_test;

	use crate::{
		circuit,
		constraints::BoolGlobal,
		model::{eval::Assignment, expr::Expr, ModelError},
		reformulate::{decompose::decompose_in_tree, Capabilities},
		tests::{assert_equivalent, expect_solutions, global, solutions},
		Model,
	};

	#[test]
	fn test_circuit_value() {
		let cycle = circuit([1, 2, 0].map(Expr::Int)).unwrap();
		assert_eq!(global(&cycle).value(&Assignment::default()), Some(true));

		let self_loops = circuit([0, 1, 2].map(Expr::Int)).unwrap();
		assert_eq!(global(&self_loops).value(&Assignment::default()), Some(false));

		let two_cycles = circuit([1, 0, 3, 2].map(Expr::Int)).unwrap();
		assert_eq!(global(&two_cycles).value(&Assignment::default()), Some(false));

		let out_of_range = circuit([1, 5, 0].map(Expr::Int)).unwrap();
		assert_eq!(global(&out_of_range).value(&Assignment::default()), Some(false));
	}

	#[test]
	fn test_circuit_arguments() {
		let mut prb = Model::default();
		let b = prb.new_bool_var();
		assert_eq!(
			circuit([Expr::Int(0)]),
			Err(ModelError::TooFewArguments {
				name: "circuit",
				min: 2,
				found: 1
			})
		);
		assert!(matches!(
			circuit([Expr::Int(1), b.into()]),
			Err(ModelError::NonIntegerArgument { .. })
		));
	}

	#[test]
	#[traced_test]
	fn test_circuit_decomposition() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=2).unwrap();
		let c = circuit(succ.clone()).unwrap();

		let dec = global(&c).decompose(prb.store_mut());
		let cons: Vec<_> = dec.constraining.into_iter().chain(dec.defining).collect();
		expect_solutions(
			&cons,
			&succ,
			expect![[r#"
    1, 2, 0
    2, 0, 1"#]],
		);
	}

	#[test]
	#[traced_test]
	fn test_circuit_nested_successors_out_of_range() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=3).unwrap();
		let b = prb.new_bool_var();
		let c = circuit(succ.clone()).unwrap();
		let project = [succ.as_slice(), &[b]].concat();

		for (cons, count) in [
			// Only the two circuits are excluded when `b` holds
			(vec![b.implies(c.clone())], 66),
			(vec![Expr::from(b).eq(c.clone())], 64),
			(vec![!c.clone()], 124),
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
}
