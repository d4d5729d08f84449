//! Structures for constraints that are passed verbatim to a solver backend.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{constraints::try_map_all, model::expr::Expr, reformulate::TransformError};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// An argument of a [`DirectConstraint`].
pub enum DirectArgument {
	/// A single expression.
	Expr(Expr),
	/// A list of expressions.
	Array(Vec<Expr>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A constraint that calls the function `name` of a solver backend.
///
/// Direct constraints are never decomposed, flattened, or reified. Variables
/// in the arguments are replaced by the backend's own variables, except for
/// the argument positions listed in `novar`.
pub struct DirectConstraint {
	/// Name of the backend function.
	name: String,
	/// Arguments of the backend function call.
	args: Vec<DirectArgument>,
	/// Positions of the arguments that must be passed without substituting
	/// variables.
	novar: Vec<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// How an argument of a [`DirectConstraint`] is passed to the backend.
pub enum CallArgument<'a> {
	/// Variables in the argument are replaced by backend variables.
	Substitute(&'a DirectArgument),
	/// The argument is passed as is.
	Verbatim(&'a DirectArgument),
}

impl DirectArgument {
	/// Returns the expressions contained in the argument.
	pub fn exprs(&self) -> &[Expr] {
		match self {
			DirectArgument::Expr(e) => std::slice::from_ref(e),
			DirectArgument::Array(exprs) => exprs,
		}
	}
}

impl Display for DirectArgument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DirectArgument::Expr(e) => write!(f, "{e}"),
			DirectArgument::Array(exprs) => write!(f, "[{}]", exprs.iter().format(", ")),
		}
	}
}

impl From<Expr> for DirectArgument {
	fn from(value: Expr) -> Self {
		DirectArgument::Expr(value)
	}
}

impl From<Vec<Expr>> for DirectArgument {
	fn from(value: Vec<Expr>) -> Self {
		DirectArgument::Array(value)
	}
}

impl DirectConstraint {
	/// Create a new direct constraint.
	pub fn new(name: String, args: Vec<DirectArgument>, novar: Vec<usize>) -> Self {
		Self { name, args, novar }
	}

	/// Returns all expressions in the arguments of the call.
	pub fn args(&self) -> Vec<Expr> {
		self.args
			.iter()
			.flat_map(|a| a.exprs().iter().cloned())
			.collect()
	}

	/// Returns the arguments of the call, tagged with whether variables in them
	/// are to be substituted.
	pub fn call_arguments(&self) -> impl Iterator<Item = CallArgument<'_>> + '_ {
		self.args.iter().enumerate().map(|(i, a)| {
			if self.novar.contains(&i) {
				CallArgument::Verbatim(a)
			} else {
				CallArgument::Substitute(a)
			}
		})
	}

	/// Returns the name of the backend function.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Create a copy of the constraint in which the expressions of every
	/// argument that is not passed verbatim are mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		let args = self
			.call_arguments()
			.map(|arg| match arg {
				CallArgument::Verbatim(a) => Ok(a.clone()),
				CallArgument::Substitute(DirectArgument::Expr(e)) => Ok(DirectArgument::Expr(f(e)?)),
				CallArgument::Substitute(DirectArgument::Array(exprs)) => {
					Ok(DirectArgument::Array(try_map_all(exprs, &mut *f)?))
				}
			})
			.try_collect()?;
		Ok(Self {
			name: self.name.clone(),
			args,
			novar: self.novar.clone(),
		})
	}
}

impl Display for DirectConstraint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", self.name, self.args.iter().format(", "))
	}
}
