//! Methods to perform linear transformations.

use std::ops::{Add, Neg};

use crate::{IntVal, NonZeroIntVal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// An integer linear transformation of a discrete value.
///
/// The transformation will take a discrete value `x` and transform it to `scale
/// * x + offset`.
pub(crate) struct LinearTransform {
	/// The multiplicative scale.
	pub(crate) scale: NonZeroIntVal,
	/// The additive offset.
	pub(crate) offset: IntVal,
}

impl LinearTransform {
	/// The transformation `1 - x` that maps a Boolean value to its negation.
	pub(crate) fn negated_view() -> Self {
		-Self::default() + 1
	}

	/// Return whether the scale applied by the linear transformation is positive.
	pub(crate) fn positive_scale(&self) -> bool {
		self.scale.get() > 0
	}

	/// Perform the linear transformation on a value.
	pub(crate) fn transform(&self, val: IntVal) -> IntVal {
		(val * self.scale.get()) + self.offset
	}

	/// Perform the linear transformation on the bounds of a value, returning
	/// the bounds of the result.
	pub(crate) fn transform_bounds(&self, lb: IntVal, ub: IntVal) -> (IntVal, IntVal) {
		if self.positive_scale() {
			(self.transform(lb), self.transform(ub))
		} else {
			(self.transform(ub), self.transform(lb))
		}
	}

	/// Returns the term `weight * (scale * x + offset)` split into the
	/// coefficient of `x` and a constant.
	pub(crate) fn weighted(&self, weight: IntVal) -> (IntVal, IntVal) {
		(weight * self.scale.get(), weight * self.offset)
	}
}

impl Add<IntVal> for LinearTransform {
	type Output = Self;

	fn add(self, rhs: IntVal) -> Self::Output {
		LinearTransform {
			scale: self.scale,
			offset: self.offset + rhs,
		}
	}
}

impl Default for LinearTransform {
	fn default() -> Self {
		Self {
			scale: NonZeroIntVal::new(1).unwrap(),
			offset: 0,
		}
	}
}

impl Neg for LinearTransform {
	type Output = Self;

	fn neg(self) -> Self::Output {
		Self {
			scale: NonZeroIntVal::new(-self.scale.get()).unwrap(),
			offset: -self.offset,
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::helpers::linear_transform::LinearTransform;

	#[test]
	fn test_negated_view() {
		let view = LinearTransform::negated_view();
		assert_eq!(view.transform(0), 1);
		assert_eq!(view.transform(1), 0);
		assert_eq!(view.transform_bounds(0, 1), (0, 1));
		assert!(!view.positive_scale());
		// 3 * (1 - x) == -3 * x + 3
		assert_eq!(view.weighted(3), (-3, 3));
	}
}
