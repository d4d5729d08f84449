//! Structures and decomposition for the `element` function.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
	constraints::{index_of, try_map_all, Decomposition},
	functions::NumGlobal,
	model::{
		eval::Assignment,
		expr::{CmpOp, Comparison, Expr},
		var::VarStore,
	},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `element` function within a model.
///
/// The function takes the value of `array[index]`, and is undefined when
/// `index` does not refer to a position of the array.
pub struct Element {
	/// The array that is indexed.
	pub(crate) array: Vec<Expr>,
	/// The (zero-based) index into the array.
	pub(crate) index: Expr,
}

impl Element {
	/// Create a copy of the function with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			array: try_map_all(&self.array, f)?,
			index: f(&self.index)?,
		})
	}
}

impl NumGlobal for Element {
	fn name(&self) -> &'static str {
		"element"
	}

	fn args(&self) -> Vec<Expr> {
		let mut args = self.array.clone();
		args.push(self.index.clone());
		args
	}

	fn bounds(&self) -> (IntVal, IntVal) {
		let (lbs, ubs): (Vec<_>, Vec<_>) = self.array.iter().map(Expr::bounds).unzip();
		(
			lbs.into_iter().min().unwrap_or_default(),
			ubs.into_iter().max().unwrap_or_default(),
		)
	}

	fn is_total(&self) -> bool {
		let (lb, ub) = self.index.bounds();
		lb >= 0 && ub < self.array.len() as IntVal
	}

	fn decompose_comparison(&self, op: CmpOp, rhs: Expr, _: &mut VarStore) -> Decomposition {
		let n = self.array.len() as IntVal;
		if let Some(idx) = self.index.as_constant() {
			let holds = match index_of(idx, self.array.len()) {
				Some(i) => Comparison::new(op, self.array[i].clone(), rhs).into(),
				None => Expr::Bool(false),
			};
			return Decomposition::constraining(vec![holds]);
		}

		let (lb, ub) = self.index.bounds();
		let mut constraining = Vec::new();
		if lb < 0 {
			constraining.push(self.index.geq(0));
		}
		if ub >= n {
			constraining.push(self.index.lt(n));
		}
		constraining.extend((lb.max(0)..=ub.min(n - 1)).map(|i| {
			self.index.eq(i).implies(Comparison::new(
				op,
				self.array[i as usize].clone(),
				rhs.clone(),
			))
		}));
		Decomposition::constraining(constraining)
	}

	fn value(&self, sol: &Assignment) -> Option<IntVal> {
		let idx = index_of(self.index.value(sol)?, self.array.len())?;
		self.array[idx].value(sol)
	}
}

impl Display for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}([{}], {})",
			self.name(),
			self.array.iter().format(", "),
			self.index
		)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use tracing_test::traced_test;

	use crate::{
		element,
		functions::NumGlobal,
		model::{
			eval::Assignment,
			expr::{CmpOp, Expr},
		},
		reformulate::{decompose::decompose_in_tree, Capabilities},
		tests::{assert_equivalent, function},
		Model,
	};

	#[test]
	fn test_element_value() {
		let mut prb = Model::default();
		let idx = prb.new_int_var(-1..=3).unwrap();
		let e = element(vec![Expr::Int(4), Expr::Int(7), Expr::Int(9)], idx);
		assert!(!function(&e).is_total());
		assert_eq!(e.bounds(), (4, 9));

		let value_at = |i| e.value(&Assignment::default().with(idx, i));
		assert_eq!(value_at(0), Some(4));
		assert_eq!(value_at(2), Some(9));
		assert_eq!(value_at(-1), None);
		assert_eq!(value_at(3), None);
	}

	#[test]
	#[traced_test]
	fn test_element_decomposition() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(3, 0..=2).unwrap();
		let idx = prb.new_int_var(-1..=3).unwrap();
		let array = x.iter().map(|&v| Expr::from(v)).collect_vec();
		let e = element(array, idx);

		let dec = function(&e).decompose_comparison(CmpOp::Eq, Expr::Int(1), prb.store_mut());
		assert!(dec.defining.is_empty());
		expect![[r#"
    IV3 >= 0
    IV3 < 3
    (IV3 == 0) -> (IV0 == 1)
    (IV3 == 1) -> (IV1 == 1)
    (IV3 == 2) -> (IV2 == 1)"#]]
		.assert_eq(&dec.constraining.iter().join("\n"));

		let vars = x.iter().copied().chain([idx]).collect_vec();
		assert_equivalent(&[e.eq(1)], &dec.constraining, &vars);
	}

	#[test]
	fn test_element_constant_index() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(2, 0..=2).unwrap();
		let array = x.iter().map(|&v| Expr::from(v)).collect_vec();

		let e = element(array.clone(), 1);
		let dec = function(&e).decompose_comparison(CmpOp::Ne, Expr::Int(0), prb.store_mut());
		expect!["IV1 != 0"].assert_eq(&dec.constraining.iter().join(", "));

		let e = element(array, 2);
		let dec = function(&e).decompose_comparison(CmpOp::Ne, Expr::Int(0), prb.store_mut());
		expect!["false"].assert_eq(&dec.constraining.iter().join(", "));
	}

	#[test]
	#[traced_test]
	fn test_element_nested_index_out_of_range() {
		let mut prb = Model::default();
		let x = prb.new_int_vars(2, 0..=2).unwrap();
		let idx = prb.new_int_var(-1..=2).unwrap();
		let b = prb.new_bool_var();
		let e = element(x.iter().map(|&v| Expr::from(v)).collect(), idx);
		let project = [x.as_slice(), &[idx, b]].concat();

		for cons in [
			vec![Expr::from(b).eq(e.eq(1))],
			vec![b.implies(e.ne(x[0]))],
			vec![Expr::from(b) | e.gt(x[1])],
		] {
			let dec = decompose_in_tree(cons.clone(), &Capabilities::default(), prb.store_mut()).unwrap();
			assert_equivalent(&cons, &dec, &project);
		}
	}
}
