//! The [`Model`] that collects decision variables and the constraints over
//! them, and the pipelines that reformulate it for a solver backend.

pub mod eval;
pub mod expr;
pub mod var;

use std::ops::{AddAssign, RangeInclusive};

use thiserror::Error;
use tracing::debug;

use crate::{
	model::{
		expr::Expr,
		var::{VarKind, VarStore, Variable},
	},
	reformulate::{
		decompose::{decompose_flat, decompose_in_tree},
		flatten::flatten,
		linearize::{linearize, only_positive_bv},
		normalize::toplevel_list,
		reification::only_implies,
		DecompositionStrategy, TransformConfig, TransformError,
	},
	IntVal,
};

#[derive(Clone, Debug, Default)]
/// A formulation of a problem instance in terms of decision variables and
/// constraints.
pub struct Model {
	/// Allocator of all variables in the model, including auxiliary variables
	/// introduced by reformulations.
	store: VarStore,
	/// The constraints that have been added to the model.
	constraints: Vec<Expr>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type used when an expression or variable is created with malformed
/// arguments.
pub enum ModelError {
	#[error("cannot create a variable with the empty domain {lb}..={ub}")]
	/// A variable was requested with a lower bound exceeding its upper bound.
	EmptyDomain {
		/// Requested lower bound.
		lb: IntVal,
		/// Requested upper bound.
		ub: IntVal,
	},
	#[error("{name} expects an index in the range 0..{len}, but was given {index}")]
	/// A designated index is outside the range of the given arguments.
	IndexOutOfRange {
		/// Name of the constraint.
		name: &'static str,
		/// The given index.
		index: usize,
		/// The number of positions.
		len: usize,
	},
	#[error("{name} expects {expected} elements, but was given {found}")]
	/// Two argument lists that must be of equal length are not.
	LengthMismatch {
		/// Name of the constraint.
		name: &'static str,
		/// The number of expected elements.
		expected: usize,
		/// The number of given elements.
		found: usize,
	},
	#[error("{name} requires non-negative durations, but `{arg}` can be negative")]
	/// A duration argument has a negative lower bound.
	NegativeDuration {
		/// Name of the constraint.
		name: &'static str,
		/// The offending argument.
		arg: String,
	},
	#[error("{name} only accepts Boolean arguments, but was given `{arg}`")]
	/// An integer expression was given where a Boolean expression is required.
	NonBooleanArgument {
		/// Name of the constraint.
		name: &'static str,
		/// The offending argument.
		arg: String,
	},
	#[error("{name} only accepts integer arguments, but was given `{arg}`")]
	/// A Boolean expression was given where an integer expression is required.
	NonIntegerArgument {
		/// Name of the constraint.
		name: &'static str,
		/// The offending argument.
		arg: String,
	},
	#[error("{name} requires at least {min} arguments, but was given {found}")]
	/// Not enough arguments were given.
	TooFewArguments {
		/// Name of the constraint.
		name: &'static str,
		/// The minimal number of arguments.
		min: usize,
		/// The number of given arguments.
		found: usize,
	},
}

impl Model {
	/// Returns the constraints that have been added to the model.
	pub fn constraints(&self) -> &[Expr] {
		&self.constraints
	}

	/// Create a new Boolean variable.
	pub fn new_bool_var(&mut self) -> Variable {
		self.store.new_user_var(0, 1, VarKind::Bool)
	}

	/// Create `len` new Boolean variables.
	pub fn new_bool_vars(&mut self, len: usize) -> Vec<Variable> {
		(0..len).map(|_| self.new_bool_var()).collect()
	}

	/// Create a new integer variable with the given domain.
	pub fn new_int_var(&mut self, domain: RangeInclusive<IntVal>) -> Result<Variable, ModelError> {
		let (lb, ub) = domain.into_inner();
		if lb > ub {
			return Err(ModelError::EmptyDomain { lb, ub });
		}
		Ok(self.store.new_user_var(lb, ub, VarKind::Int))
	}

	/// Create `len` new integer variables with the given domain.
	pub fn new_int_vars(
		&mut self,
		len: usize,
		domain: RangeInclusive<IntVal>,
	) -> Result<Vec<Variable>, ModelError> {
		(0..len).map(|_| self.new_int_var(domain.clone())).collect()
	}

	/// Returns the allocator of the variables of the model.
	pub fn store(&self) -> &VarStore {
		&self.store
	}

	/// Returns the allocator of the variables of the model, to be used when
	/// calling the individual reformulation passes.
	pub fn store_mut(&mut self) -> &mut VarStore {
		&mut self.store
	}

	/// Reformulate the model into a flat list of primitive constraints, in
	/// which every remaining global constraint is supported by the backend
	/// described in the configuration.
	///
	/// Auxiliary variables introduced by the reformulation are added to the
	/// model's [`VarStore`].
	pub fn to_primitive(&mut self, config: &TransformConfig) -> Result<Vec<Expr>, TransformError> {
		let caps = config.capabilities();
		let constraints = toplevel_list(self.constraints.iter().cloned());
		let flat = match config.strategy() {
			DecompositionStrategy::Tree => {
				let decomposed = decompose_in_tree(constraints, caps, &mut self.store)?;
				flatten(decomposed, &mut self.store)?
			}
			DecompositionStrategy::Flat => flatten(constraints, &mut self.store)?,
		};
		let result = decompose_flat(flat, caps, &mut self.store)?;
		debug!(
			constraints = result.len(),
			variables = self.store.len(),
			"reformulated model to primitive constraints"
		);
		Ok(result)
	}

	/// Reformulate the model into linear constraints and indicator constraints
	/// over positive Boolean variables.
	///
	/// Auxiliary variables introduced by the reformulation are added to the
	/// model's [`VarStore`].
	pub fn to_linear(&mut self, config: &TransformConfig) -> Result<Vec<Expr>, TransformError> {
		let caps = config.capabilities();
		let constraints = toplevel_list(self.constraints.iter().cloned());
		let decomposed = decompose_in_tree(constraints, caps, &mut self.store)?;
		let flat = flatten(decomposed, &mut self.store)?;
		let flat = decompose_flat(flat, caps, &mut self.store)?;
		let implied = only_implies(flat, &mut self.store)?;
		let linear = linearize(implied, caps, &mut self.store)?;
		let result = only_positive_bv(linear, &mut self.store)?;
		debug!(
			constraints = result.len(),
			variables = self.store.len(),
			"reformulated model to linear constraints"
		);
		Ok(result)
	}
}

impl AddAssign<Expr> for Model {
	fn add_assign(&mut self, constraint: Expr) {
		self.constraints.push(constraint);
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use tracing_test::traced_test;

	use crate::{
		all_different, circuit,
		model::ModelError,
		reformulate::{Capabilities, DecompositionStrategy, TransformConfig},
		subcircuit,
		tests::{assert_equivalent, expect_solutions},
		Model,
	};

	#[test]
	fn test_empty_domain() {
		let mut prb = Model::default();
		assert_eq!(
			prb.new_int_var(3..=2),
			Err(ModelError::EmptyDomain { lb: 3, ub: 2 })
		);
		assert!(prb.store().is_empty());
	}

	#[test]
	#[traced_test]
	fn test_to_primitive_circuit() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=2).unwrap();
		prb += circuit(succ.clone()).unwrap();

		for strategy in [DecompositionStrategy::Tree, DecompositionStrategy::Flat] {
			let mut slv = prb.clone();
			let config = TransformConfig::default()
				.with_capabilities(Capabilities::default().with_supported(["alldifferent"]))
				.with_strategy(strategy);
			let cons = slv.to_primitive(&config).unwrap();
			assert!(cons
				.iter()
				.all(|c| c.name() != "circuit" && c.name() != "element"));
			expect_solutions(
				&cons,
				&succ,
				expect![[r#"
    1, 2, 0
    2, 0, 1"#]],
			);
		}
	}

	#[test]
	#[traced_test]
	fn test_to_primitive_nested_circuits() {
		let mut prb = Model::default();
		let succ = prb.new_int_vars(3, 0..=3).unwrap();
		let b = prb.new_bool_var();
		let project = [succ.as_slice(), &[b]].concat();

		let cases = [
			b.implies(circuit(succ.clone()).unwrap()),
			!subcircuit(succ.clone()).unwrap(),
		];
		for c in cases {
			for strategy in [DecompositionStrategy::Tree, DecompositionStrategy::Flat] {
				let mut slv = prb.clone();
				slv += c.clone();
				let config = TransformConfig::default().with_strategy(strategy);
				let cons = slv.to_primitive(&config).unwrap();
				assert_equivalent(&[c.clone()], &cons, &project);
			}
		}
	}

	#[test]
	#[traced_test]
	fn test_to_linear_all_different() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(3, 1..=3).unwrap();
		prb += all_different(x.clone());
		prb += x[0].lt(x[1]);

		// Decomposed into disequalities
		let mut slv = prb.clone();
		let cons = slv.to_linear(&TransformConfig::default()).unwrap();
		assert!(cons
			.iter()
			.all(|c| ["==", "<=", ">=", "->"].contains(&c.name())));
		assert!(!cons.iter().join("\n").contains('~'));
		assert_equivalent(prb.constraints(), &cons, &x);

		// Assignment encoding of a supported alldifferent
		let mut slv = prb.clone();
		let config = TransformConfig::default()
			.with_capabilities(Capabilities::default().with_supported(["alldifferent"]));
		let cons = slv.to_linear(&config).unwrap();
		expect![[r#"
    sum([BV3, BV4, BV5]) == 1
    sum([1, 2, 3, -1] * [BV3, BV4, BV5, IV0]) == 0
    sum([1, -1] * [IV0, IV1]) <= -1"#]]
		.assert_eq(&cons.iter().take(2).chain(cons.last()).join("\n"));
		assert_eq!(cons.len(), 10);
		assert_equivalent(prb.constraints(), &cons, &x);
	}
}
