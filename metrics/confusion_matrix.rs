use super::{
	guard::Guarded, resizable_matrix::ResizableMatrix, validate::check_classification,
	StreamingMetric,
};
use itertools::izip;

/**
A `ConfusionMatrix` accumulates the weight of every `(actual, predicted)` pair of categories it observes. Row `actual`, column `predicted` holds the total weight of observations where the true category was `actual` and the model predicted `predicted`, so the diagonal holds agreements and everything else holds confusions.

The matrix starts empty and grows to fit the largest category seen. It can be shared between threads: observations take a write lock and every statistic is computed from a single read lock.

```
use online_metrics::ConfusionMatrix;

let matrix = ConfusionMatrix::new();
for (actual, predicted) in [(2, 0), (0, 0), (2, 2), (2, 2), (0, 0), (1, 2)].iter() {
	matrix.observe(*actual, *predicted);
}
assert_eq!(matrix.order(), 3);
assert_eq!(matrix.row(2), Some(vec![1.0, 0.0, 2.0]));
assert!((matrix.kappa() - 0.429).abs() < 0.001);
```
*/
#[derive(Debug, Default)]
pub struct ConfusionMatrix {
	matrix: Guarded<ResizableMatrix>,
}

/// The per-category statistics of a [ConfusionMatrix](struct.ConfusionMatrix.html).
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMetrics {
	/// The weight of observations whose true category is this one. This is the row sum.
	pub weight: f64,
	/// The weight of observations predicted as this category. This is the column sum.
	pub predicted_weight: f64,
	pub precision: f64,
	pub sensitivity: f64,
	pub f1: f64,
}

/// The output of [ConfusionMatrix](struct.ConfusionMatrix.html)'s `snapshot()`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfusionMatrixOutput {
	pub order: usize,
	pub total_weight: f64,
	pub accuracy: f64,
	pub kappa: f64,
	pub matthews: f64,
	/// One entry per category, in category order.
	pub class_metrics: Vec<ClassMetrics>,
}

impl ConfusionMatrix {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return to the empty state.
	pub fn reset(&self) {
		self.matrix.write().reset();
	}

	/// Record an observation with a weight of 1.
	pub fn observe(&self, actual: i64, predicted: i64) {
		self.observe_weight(actual, predicted, 1.0)
	}

	/// Record an observation of the actual vs. the predicted category. Observations with a negative category or a weight that is not positive are ignored.
	///
	/// The matrix grows to the largest category observed, so categories should be dense indexes. A category so large that the matrix cannot be allocated panics, as any oversized allocation does.
	pub fn observe_weight(&self, actual: i64, predicted: i64, weight: f64) {
		let (actual, predicted) = match check_classification(actual, predicted, weight) {
			Ok(indexes) => indexes,
			Err(error) => {
				log::trace!("ignoring confusion matrix observation: {}", error);
				return;
			}
		};
		self.matrix.write().add(actual, predicted, weight);
	}

	/// The number of rows, which is also the number of columns.
	pub fn order(&self) -> usize {
		self.matrix.read().size()
	}

	pub fn total_weight(&self) -> f64 {
		self.matrix.read().sum()
	}

	/// The distribution of predicted categories for the true category `x`, or `None` if `x` has not been seen.
	pub fn row(&self, x: usize) -> Option<Vec<f64>> {
		self.matrix.read().row(x)
	}

	/// The distribution of true categories for the predicted category `x`, or `None` if `x` has not been seen.
	pub fn column(&self, x: usize) -> Option<Vec<f64>> {
		self.matrix.read().column(x)
	}

	/// The proportion of the total weight on the diagonal.
	pub fn accuracy(&self) -> f64 {
		accuracy(&self.matrix.read())
	}

	/// The positive predictive value for category `x`.
	pub fn precision(&self, x: usize) -> f64 {
		precision(&self.matrix.read(), x)
	}

	/// The recall, or hit rate, for category `x`.
	pub fn sensitivity(&self, x: usize) -> f64 {
		sensitivity(&self.matrix.read(), x)
	}

	/// The harmonic mean of precision and sensitivity for category `x`. This is 0, not NaN, when the category has observations but no true positives.
	pub fn f1(&self, x: usize) -> f64 {
		f1(&self.matrix.read(), x)
	}

	/// Precision, sensitivity and F1 for category `x`, read together.
	pub fn class_metrics(&self, x: usize) -> ClassMetrics {
		class_metrics(&self.matrix.read(), x)
	}

	/// Cohen's kappa measures agreement between actual and predicted categories, corrected for the agreement expected by chance. [Learn more](https://en.wikipedia.org/wiki/Cohen%27s_kappa).
	pub fn kappa(&self) -> f64 {
		kappa(&self.matrix.read())
	}

	/// The multiclass Matthews correlation coefficient, between -1 for inverse prediction and +1 for perfect prediction. It stays meaningful when categories have very different sizes. [Learn more](https://en.wikipedia.org/wiki/Phi_coefficient).
	pub fn matthews(&self) -> f64 {
		matthews(&self.matrix.read())
	}
}

impl StreamingMetric for ConfusionMatrix {
	type Input = (i64, i64);
	type Output = ConfusionMatrixOutput;

	fn update(&self, (actual, predicted): Self::Input, weight: f64) {
		self.observe_weight(actual, predicted, weight)
	}

	fn merge(&self, other: &Self) {
		let other = other.matrix.snapshot();
		self.matrix.write().merge(&other);
	}

	fn snapshot(&self) -> ConfusionMatrixOutput {
		let matrix = self.matrix.read();
		ConfusionMatrixOutput {
			order: matrix.size(),
			total_weight: matrix.sum(),
			accuracy: accuracy(&matrix),
			kappa: kappa(&matrix),
			matthews: matthews(&matrix),
			class_metrics: (0..matrix.size())
				.map(|x| class_metrics(&matrix, x))
				.collect(),
		}
	}

	fn reset(&self) {
		ConfusionMatrix::reset(self)
	}
}

fn accuracy(matrix: &ResizableMatrix) -> f64 {
	let sum = matrix.sum();
	if sum == 0.0 {
		return 0.0;
	}
	matrix.diagonal_sum() / sum
}

fn precision(matrix: &ResizableMatrix, x: usize) -> f64 {
	let predicted_weight = matrix.col_sum(x);
	if predicted_weight == 0.0 {
		return 0.0;
	}
	matrix.at(x, x) / predicted_weight
}

fn sensitivity(matrix: &ResizableMatrix, x: usize) -> f64 {
	let weight = matrix.row_sum(x);
	if weight == 0.0 {
		return 0.0;
	}
	matrix.at(x, x) / weight
}

fn f1(matrix: &ResizableMatrix, x: usize) -> f64 {
	let predicted_weight = matrix.col_sum(x);
	let weight = matrix.row_sum(x);
	if predicted_weight == 0.0 || weight == 0.0 {
		return 0.0;
	}
	let true_positives = matrix.at(x, x);
	let precision = true_positives / predicted_weight;
	let sensitivity = true_positives / weight;
	// No true positives.
	if precision + sensitivity == 0.0 {
		return 0.0;
	}
	2.0 * precision * sensitivity / (precision + sensitivity)
}

fn class_metrics(matrix: &ResizableMatrix, x: usize) -> ClassMetrics {
	ClassMetrics {
		weight: matrix.row_sum(x),
		predicted_weight: matrix.col_sum(x),
		precision: precision(matrix, x),
		sensitivity: sensitivity(matrix, x),
		f1: f1(matrix, x),
	}
}

fn kappa(matrix: &ResizableMatrix) -> f64 {
	let sum = matrix.sum();
	if sum == 0.0 {
		return 0.0;
	}
	let observed = matrix.diagonal_sum();
	let row_sums = matrix.row_sums();
	let col_sums = matrix.col_sums();
	let mut expected: f64 = 0.0;
	for (row_sum, col_sum) in row_sums.iter().zip(col_sums.iter()) {
		expected += row_sum * col_sum / sum;
	}
	let denominator = sum - expected;
	if denominator == 0.0 {
		return 1.0;
	}
	(observed - expected) / denominator
}

fn matthews(matrix: &ResizableMatrix) -> f64 {
	let sum = matrix.sum();
	if sum == 0.0 {
		return 0.0;
	}
	let row_sums = matrix.row_sums();
	let col_sums = matrix.col_sums();
	let mut agreement: f64 = 0.0;
	let mut cf1: f64 = 0.0;
	let mut cf2: f64 = 0.0;
	let mut cf3: f64 = 0.0;
	for (diagonal, row_sum, col_sum) in izip!(matrix.diag(), &row_sums, &col_sums) {
		agreement += *diagonal;
		cf1 += row_sum * col_sum;
		cf2 += row_sum * row_sum;
		cf3 += col_sum * col_sum;
	}
	let sum2 = sum * sum;
	let product = (sum2 - cf2) * (sum2 - cf3);
	// A row or column marginal has zero variance.
	if product == 0.0 {
		return 0.0;
	}
	(agreement * sum - cf1) / product.sqrt()
}

#[cfg(test)]
fn observe_all(matrix: &ConfusionMatrix, actual: &[i64], predicted: &[i64]) {
	for (actual, predicted) in actual.iter().zip(predicted.iter()) {
		matrix.observe(*actual, *predicted);
	}
}

/// 100 observations across three categories, from Artstein and Poesio (2008), Table 4.
#[cfg(test)]
fn multiclass() -> ConfusionMatrix {
	let actual: Vec<i64> = [(0, 46), (1, 44), (2, 10)]
		.iter()
		.flat_map(|&(category, n)| std::iter::repeat(category).take(n))
		.collect();
	let predicted: Vec<i64> = [(0, 52), (1, 32), (2, 16)]
		.iter()
		.flat_map(|&(category, n)| std::iter::repeat(category).take(n))
		.collect();
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &actual, &predicted);
	matrix
}

/// 100 binary observations, from Artstein and Poesio (2008), Table 1.
#[cfg(test)]
fn binary() -> ConfusionMatrix {
	let actual: Vec<i64> = [(0, 40), (1, 60)]
		.iter()
		.flat_map(|&(category, n)| std::iter::repeat(category).take(n))
		.collect();
	let predicted: Vec<i64> = [(0, 20), (1, 20), (0, 10), (1, 50)]
		.iter()
		.flat_map(|&(category, n)| std::iter::repeat(category).take(n))
		.collect();
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &actual, &predicted);
	matrix
}

#[test]
fn test_weights() {
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 0, 1, 0, 0, 1, 1, 1], &[1, 0, 1, 0, 0, 0, 0, 1]);
	assert_eq!(matrix.order(), 2);
	assert_eq!(matrix.total_weight(), 8.0);
	assert_eq!(matrix.row(0), Some(vec![3.0, 1.0]));
	assert_eq!(matrix.row(1), Some(vec![2.0, 2.0]));
	assert_eq!(matrix.row(2), None);
	assert_eq!(matrix.column(0), Some(vec![3.0, 2.0]));
	assert_eq!(matrix.column(1), Some(vec![1.0, 2.0]));
	assert_eq!(matrix.column(2), None);
}

#[test]
fn test_reset() {
	let matrix = ConfusionMatrix::new();
	matrix.observe_weight(0, 0, 40.0);
	matrix.observe_weight(0, 1, 5.0);
	matrix.observe_weight(1, 0, 5.0);
	matrix.observe_weight(1, 1, 50.0);
	assert_eq!(matrix.order(), 2);
	assert_eq!(matrix.total_weight(), 100.0);
	matrix.reset();
	assert_eq!(matrix.order(), 0);
	assert_eq!(matrix.total_weight(), 0.0);
	assert_eq!(matrix.row(0), None);
	assert_eq!(matrix.snapshot(), ConfusionMatrix::new().snapshot());
}

#[test]
fn test_ignores_invalid_observations() {
	let matrix = ConfusionMatrix::new();
	matrix.observe(1, 1);
	matrix.observe(-1, 4);
	matrix.observe(4, -1);
	matrix.observe_weight(6, 6, 0.0);
	matrix.observe_weight(6, 6, -2.0);
	matrix.observe_weight(6, 6, f64::NAN);
	assert_eq!(matrix.order(), 2);
	assert_eq!(matrix.total_weight(), 1.0);
}

#[test]
fn test_growth_preserves_history() {
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 1, 2, 2, 1], &[0, 2, 1, 2, 1]);
	let before: Vec<_> = (0..3).map(|x| matrix.row(x)).collect();
	matrix.observe(2, 7);
	assert_eq!(matrix.order(), 8);
	for (x, row) in before.into_iter().enumerate() {
		let row = row.unwrap();
		assert_eq!(matrix.row(x).unwrap()[..3], row[..]);
	}
	assert_eq!(matrix.row(2), Some(vec![0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn test_weight_linearity() {
	let a = ConfusionMatrix::new();
	a.observe_weight(1, 2, 0.5);
	a.observe_weight(1, 2, 2.0);
	a.observe(0, 0);
	let b = ConfusionMatrix::new();
	b.observe_weight(1, 2, 2.5);
	b.observe(0, 0);
	assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn test_precision() {
	let matrix = multiclass();
	assert!((matrix.precision(0) - 0.884).abs() < 0.001);
	assert!((matrix.precision(1) - 1.000).abs() < 0.001);
	assert!((matrix.precision(2) - 0.625).abs() < 0.001);
	assert_eq!(matrix.precision(3), 0.0);
}

#[test]
fn test_sensitivity() {
	let matrix = multiclass();
	assert!((matrix.sensitivity(0) - 1.000).abs() < 0.001);
	assert!((matrix.sensitivity(1) - 0.727).abs() < 0.001);
	assert!((matrix.sensitivity(2) - 1.000).abs() < 0.001);
	assert_eq!(matrix.sensitivity(3), 0.0);
}

#[test]
fn test_f1() {
	let matrix = multiclass();
	assert!((matrix.f1(0) - 0.939).abs() < 0.001);
	assert!((matrix.f1(1) - 0.842).abs() < 0.001);
	assert!((matrix.f1(2) - 0.769).abs() < 0.001);
	assert_eq!(matrix.f1(3), 0.0);
}

#[test]
fn test_f1_without_true_positives() {
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 1], &[1, 0]);
	assert_eq!(matrix.precision(0), 0.0);
	assert_eq!(matrix.sensitivity(0), 0.0);
	assert_eq!(matrix.f1(0), 0.0);
}

#[test]
fn test_accuracy() {
	assert!((multiclass().accuracy() - 0.880).abs() < 0.001);
	assert_eq!(ConfusionMatrix::new().accuracy(), 0.0);
}

#[test]
fn test_kappa() {
	assert!((binary().kappa() - 0.348).abs() < 0.001);
	assert!((multiclass().kappa() - 0.801).abs() < 0.001);
}

#[test]
fn test_kappa_weighted() {
	let matrix = ConfusionMatrix::new();
	matrix.observe_weight(0, 0, 22.0);
	matrix.observe_weight(0, 1, 7.0);
	matrix.observe_weight(1, 0, 9.0);
	matrix.observe_weight(1, 1, 13.0);
	assert!((matrix.kappa() - 0.353).abs() < 0.001);
}

#[test]
fn test_kappa_degenerate() {
	let matrix = ConfusionMatrix::new();
	assert_eq!(matrix.kappa(), 0.0);
	matrix.observe(0, 1);
	assert_eq!(matrix.kappa(), 0.0);

	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 1], &[0, 1]);
	assert_eq!(matrix.kappa(), 1.0);

	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 1], &[1, 0]);
	assert_eq!(matrix.kappa(), -1.0);

	// A single category agrees with chance exactly.
	let matrix = ConfusionMatrix::new();
	matrix.observe(0, 0);
	matrix.observe(0, 0);
	assert_eq!(matrix.kappa(), 1.0);
	assert_eq!(matrix.matthews(), 0.0);
}

#[test]
fn test_matthews() {
	assert!((binary().matthews() - 0.356).abs() < 0.001);
	assert!((multiclass().matthews() - 0.816).abs() < 0.001);
	assert_eq!(ConfusionMatrix::new().matthews(), 0.0);
}

#[test]
fn test_matthews_full_agreement() {
	let labels = [1, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1];
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &labels, &labels);
	assert_eq!(matrix.matthews(), 1.0);
	assert_eq!(matrix.kappa(), 1.0);
	assert_eq!(matrix.accuracy(), 1.0);

	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 0, 1, 2], &[0, 0, 1, 2]);
	assert_eq!(matrix.matthews(), 1.0);
	assert_eq!(matrix.kappa(), 1.0);
	assert_eq!(matrix.accuracy(), 1.0);
}

#[test]
fn test_matthews_no_agreement() {
	let matrix = ConfusionMatrix::new();
	observe_all(
		&matrix,
		&[1, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1],
		&[1, 1, 1, 0, 0, 1, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1],
	);
	assert_eq!(matrix.matthews(), 0.0);

	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 0, 1, 1, 2, 2], &[2, 2, 0, 0, 1, 1]);
	assert!((matrix.matthews() + 0.5).abs() < 0.0001);

	let matrix = ConfusionMatrix::new();
	observe_all(
		&matrix,
		&[0, 1, 2, 0, 1, 2, 0, 1, 2],
		&[1, 1, 1, 2, 2, 2, 0, 0, 0],
	);
	assert!(matrix.matthews().abs() < 0.0001);
}

#[test]
fn test_matthews_zero_variance() {
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[0, 1, 2], &[3, 3, 3]);
	assert_eq!(matrix.matthews(), 0.0);
}

#[test]
fn test_snapshot() {
	let matrix = ConfusionMatrix::new();
	observe_all(&matrix, &[2, 0, 2, 2, 0, 1], &[0, 0, 2, 2, 0, 2]);
	assert_eq!(matrix.row(0), Some(vec![2.0, 0.0, 0.0]));
	assert_eq!(matrix.row(1), Some(vec![0.0, 0.0, 1.0]));
	assert_eq!(matrix.row(2), Some(vec![1.0, 0.0, 2.0]));
	insta::assert_debug_snapshot!(matrix.snapshot(), @r###"
 ConfusionMatrixOutput {
     order: 3,
     total_weight: 6.0,
     accuracy: 0.6666666666666666,
     kappa: 0.42857142857142855,
     matthews: 0.45226701686664544,
     class_metrics: [
         ClassMetrics {
             weight: 2.0,
             predicted_weight: 3.0,
             precision: 0.6666666666666666,
             sensitivity: 1.0,
             f1: 0.8,
         },
         ClassMetrics {
             weight: 1.0,
             predicted_weight: 0.0,
             precision: 0.0,
             sensitivity: 0.0,
             f1: 0.0,
         },
         ClassMetrics {
             weight: 3.0,
             predicted_weight: 3.0,
             precision: 0.6666666666666666,
             sensitivity: 0.6666666666666666,
             f1: 0.6666666666666666,
         },
     ],
 }
 "###);
	assert_eq!(matrix.class_metrics(7), ConfusionMatrix::new().class_metrics(0));
}

#[test]
fn test_merge() {
	let actual = [2, 0, 2, 2, 0, 1];
	let predicted = [0, 0, 2, 2, 0, 2];
	let a = ConfusionMatrix::new();
	observe_all(&a, &actual[..3], &predicted[..3]);
	let b = ConfusionMatrix::new();
	observe_all(&b, &actual[3..], &predicted[3..]);
	a.merge(&b);
	let all = ConfusionMatrix::new();
	observe_all(&all, &actual, &predicted);
	assert_eq!(a.snapshot(), all.snapshot());
	// Merging into itself doubles every cell.
	b.merge(&b);
	assert_eq!(b.total_weight(), 6.0);
}

#[test]
fn test_concurrent_observations() {
	use rayon::prelude::*;
	let matrix = ConfusionMatrix::new();
	rayon::join(
		|| {
			(0..1000i64)
				.into_par_iter()
				.for_each(|i| matrix.observe(i % 4, (i / 2) % 4));
		},
		|| {
			for _ in 0..100 {
				let output = matrix.snapshot();
				assert!(output.accuracy >= 0.0 && output.accuracy <= 1.0);
				assert_eq!(output.class_metrics.len(), output.order);
			}
		},
	);
	assert_eq!(matrix.order(), 4);
	assert_eq!(matrix.total_weight(), 1000.0);
	assert_eq!(matrix.row(0), Some(vec![125.0, 0.0, 125.0, 0.0]));
}
