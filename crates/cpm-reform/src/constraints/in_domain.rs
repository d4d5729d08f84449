//! Structures and decomposition for the `InDomain` constraint, which restricts
//! an expression to a set of values that need not form an interval.

use std::{
	fmt::{self, Display},
	ops::RangeInclusive,
};

use itertools::Itertools;
use rangelist::RangeList;

use crate::{
	constraints::{try_map_all, values_of, BoolGlobal, Decomposition},
	model::{eval::Assignment, expr::Expr, var::VarStore},
	reformulate::TransformError,
	IntSetVal, IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `InDomain` constraint within a model.
///
/// This constraint enforces that `expr` takes one of the given values.
pub struct InDomain {
	/// The restricted expression.
	pub(crate) expr: Expr,
	/// The allowed values.
	pub(crate) values: InDomainValues,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// The values allowed by an [`InDomain`] constraint.
pub enum InDomainValues {
	/// A constant set of values.
	Set(IntSetVal),
	/// A list of expressions, at least one of which is not constant.
	Exprs(Vec<Expr>),
}

impl InDomain {
	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		let values = match &self.values {
			InDomainValues::Set(set) => InDomainValues::Set(set.clone()),
			InDomainValues::Exprs(exprs) => InDomainValues::Exprs(try_map_all(exprs, f)?),
		};
		Ok(Self {
			expr: f(&self.expr)?,
			values,
		})
	}
}

impl BoolGlobal for InDomain {
	fn name(&self) -> &'static str {
		"InDomain"
	}

	fn args(&self) -> Vec<Expr> {
		let mut args = vec![self.expr.clone()];
		if let InDomainValues::Exprs(exprs) = &self.values {
			args.extend(exprs.iter().cloned());
		}
		args
	}

	fn decompose(&self, store: &mut VarStore) -> Decomposition {
		let mut defining = Vec::new();
		let target = if self.expr.is_var_or_const() {
			self.expr.clone()
		} else {
			let aux: Expr = store.new_aux_for(&self.expr).into();
			defining.push(aux.eq(self.expr.clone()));
			aux
		};

		let constraining = match &self.values {
			InDomainValues::Set(set) => {
				let (lb, ub) = target.bounds();
				(lb..=ub)
					.filter(|v| !set.contains(v))
					.map(|v| target.ne(v))
					.collect()
			}
			InDomainValues::Exprs(exprs) => {
				vec![Expr::any(exprs.iter().map(|a| target.eq(a.clone())))]
			}
		};

		Decomposition {
			constraining,
			defining,
		}
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let val = self.expr.value(sol)?;
		match &self.values {
			InDomainValues::Set(set) => Some(set.contains(&val)),
			InDomainValues::Exprs(exprs) => Some(values_of(exprs, sol)?.contains(&val)),
		}
	}
}

impl Display for InDomain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.values {
			InDomainValues::Set(set) => write!(
				f,
				"{} in {{{}}}",
				self.expr,
				set.iter().format_with(", ", |r, f| if r.start() == r.end() {
					f(&r.start())
				} else {
					f(&format_args!("{}..={}", r.start(), r.end()))
				})
			),
			InDomainValues::Exprs(exprs) => {
				write!(f, "{} in [{}]", self.expr, exprs.iter().format(", "))
			}
		}
	}
}

impl From<Vec<Expr>> for InDomainValues {
	fn from(values: Vec<Expr>) -> Self {
		match values
			.iter()
			.map(Expr::as_constant)
			.collect::<Option<Vec<_>>>()
		{
			Some(mut vals) => {
				vals.sort_unstable();
				vals.dedup();
				let mut ranges: Vec<RangeInclusive<IntVal>> = Vec::new();
				for v in vals {
					match ranges.last_mut() {
						Some(r) if *r.end() + 1 == v => *r = *r.start()..=v,
						_ => ranges.push(v..=v),
					}
				}
				InDomainValues::Set(RangeList::from_iter(ranges))
			}
			None => InDomainValues::Exprs(values),
		}
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use tracing_test::traced_test;

	use crate::{
		constraints::BoolGlobal,
		in_domain,
		model::expr::Expr,
		tests::{expect_solutions, global},
		Model,
	};

	#[test]
	fn test_in_domain_constants() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=6).unwrap();
		let values = [5, 1, 3, 2, 1].map(Expr::Int).to_vec();
		let c = in_domain(x, values);
		expect!["IV0 in {1..=3, 5}"].assert_eq(&c.to_string());

		let dec = global(&c).decompose(prb.store_mut());
		expect![[r#"
    IV0 != 0
    IV0 != 4
    IV0 != 6"#]]
		.assert_eq(&dec.constraining.iter().join("\n"));
	}

	#[test]
	#[traced_test]
	fn test_in_domain_expressions() {
		let mut prb = Model::default();
		let x = prb.new_int_var(0..=3).unwrap();
		let y = prb.new_int_var(0..=3).unwrap();
		let c = in_domain(x + y, vec![Expr::Int(0), y.into()]);
		expect!["sum([IV0, IV1]) in [0, IV1]"].assert_eq(&c.to_string());

		let dec = global(&c).decompose(prb.store_mut());
		expect!["IV2 == sum([IV0, IV1])"].assert_eq(&dec.defining.iter().join("\n"));
		let cons: Vec<_> = dec.constraining.into_iter().chain(dec.defining).collect();
		expect_solutions(
			&cons,
			&[x, y],
			expect![[r#"
    0, 0
    0, 1
    0, 2
    0, 3"#]],
		);
	}
}
