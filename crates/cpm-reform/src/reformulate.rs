//! Configuration, errors, and passes of the reformulation process that rewrites
//! the constraints of a [`crate::Model`] into a form a solver backend can
//! consume.
//!
//! The passes are meant to be applied in order:
//!
//! 1. [`normalize::toplevel_list`] splits top-level conjunctions,
//! 2. [`decompose::decompose_in_tree`] removes unsupported global constraints
//!    from arbitrarily nested expressions,
//! 3. [`flatten::flatten`] brings the constraints into flat normal form,
//! 4. [`decompose::decompose_flat`] removes any unsupported global constraint
//!    that remains in flat (reified) form,
//! 5. [`reification::only_implies`] rewrites reifications into implications,
//!    and
//! 6. [`linearize::linearize`] and [`linearize::only_positive_bv`] produce the
//!    linear normal form.
//!
//! Every pass borrows the [`VarStore`](crate::VarStore) of the model to create
//! auxiliary variables.

pub mod decompose;
pub mod flatten;
pub mod linearize;
pub mod normalize;
pub mod reification;

use std::collections::BTreeSet;

use itertools::Itertools;
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
/// Description of the constraints a solver backend can handle natively.
///
/// Constraints are identified by the name they report through
/// [`crate::Expr::name`].
pub struct Capabilities {
	/// Names of the constraints supported at the top level of a model.
	supported: BTreeSet<String>,
	/// Names of the constraints supported when nested in another expression,
	/// e.g. when reified.
	supported_reified: BTreeSet<String>,
	/// Names of the (non-linear) expressions that linearization keeps as is.
	linear: BTreeSet<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// The strategy used to remove unsupported global constraints.
pub enum DecompositionStrategy {
	/// Decompose constraints wherever they occur in the expression trees, and
	/// flatten the result afterwards.
	#[default]
	Tree,
	/// Flatten the constraints first, and decompose the flat constraints,
	/// flattening again after every decomposition.
	Flat,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
/// Configuration object for the reformulation of a [`crate::Model`].
pub struct TransformConfig {
	/// Capabilities of the targeted solver backend.
	capabilities: Capabilities,
	/// The strategy used to decompose unsupported constraints.
	strategy: DecompositionStrategy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type used when a constraint cannot be reformulated into the requested
/// form.
pub enum TransformError {
	#[error("`{0}` is not supported by the backend, and cannot be decomposed")]
	/// Error used when an unsupported constraint provides no decomposition.
	UnimplementedDecomposition(String),
	#[error("`{0}` cannot be reformulated into the requested form")]
	/// Error used when an expression reaches a pass that has no rule to rewrite
	/// it.
	UnsupportedExpression(String),
}

impl Capabilities {
	/// Returns whether linearization keeps the expression `name` as is.
	///
	/// This is always the case for (weighted) sums.
	pub fn is_linear(&self, name: &str) -> bool {
		matches!(name, "sum" | "wsum") || self.linear.contains(name)
	}

	/// Returns whether the constraint `name` is supported at the top level.
	pub fn is_supported(&self, name: &str) -> bool {
		self.supported.contains(name)
	}

	/// Returns whether the constraint `name` is supported when nested in
	/// another expression.
	pub fn is_supported_reified(&self, name: &str) -> bool {
		self.supported_reified.contains(name)
	}

	/// Add expressions that linearization can keep as is.
	pub fn with_linear<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.linear.extend(names.into_iter().map_into());
		self
	}

	/// Add constraints supported at the top level.
	pub fn with_supported<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.supported.extend(names.into_iter().map_into());
		self
	}

	/// Add constraints supported when nested in another expression.
	pub fn with_supported_reified<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.supported_reified
			.extend(names.into_iter().map_into());
		self
	}
}

impl TransformConfig {
	/// Get the capabilities of the targeted solver backend.
	pub fn capabilities(&self) -> &Capabilities {
		&self.capabilities
	}

	/// Get the strategy used to decompose unsupported constraints.
	pub fn strategy(&self) -> DecompositionStrategy {
		self.strategy
	}

	/// Change the capabilities of the targeted solver backend.
	pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
		self.capabilities = capabilities;
		self
	}

	/// Change the strategy used to decompose unsupported constraints.
	pub fn with_strategy(mut self, strategy: DecompositionStrategy) -> Self {
		self.strategy = strategy;
		self
	}
}
