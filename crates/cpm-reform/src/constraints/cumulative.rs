//! Structures and decomposition for the `cumulative` scheduling constraint.

use std::fmt::{self, Display};

use itertools::{izip, Itertools};

use crate::{
	constraints::{try_map_all, values_of, BoolGlobal, Decomposition},
	model::{eval::Assignment, expr::Expr, var::VarStore, ModelError},
	reformulate::TransformError,
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// Representation of the `cumulative` constraint within a model.
///
/// This constraint enforces that every task `i` runs from `start[i]` until
/// (exclusive) `end[i] == start[i] + duration[i]`, and that at no point in
/// time the total demand of the running tasks exceeds the capacity of the
/// resource.
pub struct Cumulative {
	/// Start time of each task.
	pub(crate) start: Vec<Expr>,
	/// Duration of each task.
	pub(crate) duration: Vec<Expr>,
	/// End time of each task.
	pub(crate) end: Vec<Expr>,
	/// Resource demand of each task.
	pub(crate) demand: Vec<Expr>,
	/// Capacity of the resource.
	pub(crate) capacity: Expr,
}

impl Cumulative {
	/// Create a new cumulative constraint.
	///
	/// When a single demand is given, it is used for every task. Fails if the
	/// task lists are of different lengths, or if a duration can take a
	/// negative value.
	pub fn new(
		start: Vec<Expr>,
		duration: Vec<Expr>,
		end: Vec<Expr>,
		mut demand: Vec<Expr>,
		capacity: Expr,
	) -> Result<Self, ModelError> {
		let n = start.len();
		if demand.len() == 1 {
			demand = vec![demand[0].clone(); n];
		}
		if let Some(found) = [duration.len(), end.len(), demand.len()]
			.into_iter()
			.find(|&len| len != n)
		{
			return Err(ModelError::LengthMismatch {
				name: "cumulative",
				expected: n,
				found,
			});
		}
		if let Some(d) = duration.iter().find(|d| d.bounds().0 < 0) {
			return Err(ModelError::NegativeDuration {
				name: "cumulative",
				arg: d.to_string(),
			});
		}
		Ok(Self {
			start,
			duration,
			end,
			demand,
			capacity,
		})
	}

	/// Create a copy of the constraint with every argument mapped by `f`.
	pub(crate) fn try_map_args<F>(&self, f: &mut F) -> Result<Self, TransformError>
	where
		F: FnMut(&Expr) -> Result<Expr, TransformError>,
	{
		Ok(Self {
			start: try_map_all(&self.start, f)?,
			duration: try_map_all(&self.duration, f)?,
			end: try_map_all(&self.end, f)?,
			demand: try_map_all(&self.demand, f)?,
			capacity: f(&self.capacity)?,
		})
	}
}

impl BoolGlobal for Cumulative {
	fn name(&self) -> &'static str {
		"cumulative"
	}

	fn args(&self) -> Vec<Expr> {
		self.start
			.iter()
			.chain(&self.duration)
			.chain(&self.end)
			.chain(&self.demand)
			.chain([&self.capacity])
			.cloned()
			.collect()
	}

	/// Time-resource decomposition: the resource usage is checked at every
	/// point in time any task can be running.
	fn decompose(&self, _: &mut VarStore) -> Decomposition {
		let mut constraining: Vec<Expr> = izip!(&self.start, &self.duration, &self.end)
			.map(|(s, d, e)| (s.clone() + d.clone()).eq(e.clone()))
			.collect();

		let lb = self.start.iter().map(|s| s.bounds().0).min();
		let ub = self.end.iter().map(|e| e.bounds().1).max();
		if let (Some(lb), Some(ub)) = (lb, ub) {
			for t in lb..=ub {
				let usage = izip!(&self.start, &self.end, &self.demand)
					.map(|(s, e, d)| d.clone() * (s.leq(t) & e.gt(t)));
				constraining.push(Expr::sum(usage).leq(self.capacity.clone()));
			}
		}
		Decomposition::constraining(constraining)
	}

	fn value(&self, sol: &Assignment) -> Option<bool> {
		let start = values_of(&self.start, sol)?;
		let duration = values_of(&self.duration, sol)?;
		let end = values_of(&self.end, sol)?;
		let demand = values_of(&self.demand, sol)?;
		let capacity = self.capacity.value(sol)?;

		if izip!(&start, &duration, &end).any(|(s, d, e)| s + d != *e) {
			return Some(false);
		}
		let (Some(&lb), Some(&ub)) = (start.iter().min(), end.iter().max()) else {
			return Some(true);
		};
		Some((lb..=ub).all(|t| {
			let usage: IntVal = izip!(&start, &end, &demand)
				.filter(|&(&s, &e, _)| s <= t && t < e)
				.map(|(_, _, d)| d)
				.sum();
			usage <= capacity
		}))
	}
}

impl Display for Cumulative {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}([{}], [{}], [{}], [{}], {})",
			self.name(),
			self.start.iter().format(", "),
			self.duration.iter().format(", "),
			self.end.iter().format(", "),
			self.demand.iter().format(", "),
			self.capacity
		)
	}
}

#[cfg(test)]
mod tests {
	use expect_test::expect;
	use itertools::Itertools;
	use tracing_test::traced_test;

	use crate::{
		constraints::BoolGlobal,
		cumulative,
		model::{eval::Assignment, expr::Expr, ModelError},
		tests::{expect_solutions, global},
		Model,
	};

	#[test]
	fn test_cumulative_arguments() {
		let mut prb = Model::default();
		let s = prb.new_int_vars(2, 0..=2).unwrap();
		let d = prb.new_int_var(-1..=2).unwrap();
		let start: Vec<Expr> = s.iter().copied().map_into().collect();

		assert_eq!(
			cumulative(
				start.clone(),
				vec![Expr::Int(1)],
				start.clone(),
				vec![Expr::Int(1)],
				Expr::Int(1)
			),
			Err(ModelError::LengthMismatch {
				name: "cumulative",
				expected: 2,
				found: 1
			})
		);
		assert_eq!(
			cumulative(
				start.clone(),
				vec![Expr::Int(1), d.into()],
				start.clone(),
				vec![Expr::Int(1)],
				Expr::Int(1)
			),
			Err(ModelError::NegativeDuration {
				name: "cumulative",
				arg: "IV2".to_owned()
			})
		);

		// A single demand is used for all tasks
		let c = cumulative(
			start.clone(),
			vec![Expr::Int(1), Expr::Int(1)],
			start,
			vec![Expr::Int(3)],
			Expr::Int(4),
		)
		.unwrap();
		expect!["cumulative([IV0, IV1], [1, 1], [IV0, IV1], [3, 3], 4)"].assert_eq(&c.to_string());
	}

	#[test]
	fn test_cumulative_value() {
		let c = cumulative(
			[0, 1, 3].map(Expr::Int).to_vec(),
			[2, 2, 1].map(Expr::Int).to_vec(),
			[2, 3, 4].map(Expr::Int).to_vec(),
			[1, 1, 2].map(Expr::Int).to_vec(),
			Expr::Int(2),
		)
		.unwrap();
		assert_eq!(global(&c).value(&Assignment::default()), Some(true));

		let c = cumulative(
			[0, 1, 2].map(Expr::Int).to_vec(),
			[2, 2, 1].map(Expr::Int).to_vec(),
			[2, 3, 3].map(Expr::Int).to_vec(),
			[1, 1, 2].map(Expr::Int).to_vec(),
			Expr::Int(2),
		)
		.unwrap();
		assert_eq!(global(&c).value(&Assignment::default()), Some(false));
	}

	#[test]
	#[traced_test]
	fn test_cumulative_decomposition() {
		let mut prb = Model::default();
		let start = prb.new_int_vars(2, 0..=2).unwrap();
		let end = prb.new_int_vars(2, 0..=4).unwrap();
		let c = cumulative(
			start.iter().copied().map_into().collect(),
			vec![Expr::Int(2), Expr::Int(2)],
			end.iter().copied().map_into().collect(),
			vec![Expr::Int(1)],
			Expr::Int(1),
		)
		.unwrap();

		let dec = global(&c).decompose(prb.store_mut());
		expect![[r#"
    sum([IV0, 2]) == IV2
    sum([IV1, 2]) == IV3
    sum([1 * and([IV0 <= 0, IV2 > 0]), 1 * and([IV1 <= 0, IV3 > 0])]) <= 1"#]]
		.assert_eq(&dec.constraining.iter().take(3).join("\n"));
		expect_solutions(
			&dec.constraining,
			&start,
			expect![[r#"
    0, 2
    2, 0"#]],
		);
	}
}
