/*!
This crate implements online evaluation metrics for classification and regression models. Each metric, such as [`ConfusionMatrix`](struct.ConfusionMatrix.html) or [`Regression`](struct.Regression.html), accepts a stream of `(actual, predicted)` observations with an optional weight and can report its running statistics at any time.

Every metric guards its state with a read-write lock, so a single value can be shared by many producer threads while other threads read statistics. Invalid observations, such as negative categories, weights that are not positive, or probabilities outside `[0, 1]`, are ignored rather than reported as errors. Enable `trace` logging for this crate to see each ignored observation.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod accuracy;
mod confusion_matrix;
mod guard;
mod log_loss;
mod mean_variance;
mod regression;
mod resizable_matrix;
mod validate;

pub use self::accuracy::{Accuracy, AccuracyOutput};
pub use self::confusion_matrix::{ClassMetrics, ConfusionMatrix, ConfusionMatrixOutput};
pub use self::log_loss::{LogLoss, LogLossOptions, LogLossOutput, DEFAULT_EPSILON};
pub use self::mean_variance::merge_mean_m2;
pub use self::regression::{Regression, RegressionOutput};
pub use self::validate::{
	is_valid_category, is_valid_numeric, is_valid_probability, is_valid_weight,
	InvalidObservation,
};

/**
The `StreamingMetric` trait defines a common interface to the metrics in this crate. Every method takes `&self`, because metrics are shared between threads and guard their own state.

Call `update()` with values of the associated type `Input` as they arrive. Metrics computed independently, for example one per worker thread, can be combined with `merge()`. Call `snapshot()` at any time to produce the associated type `Output` from a consistent view of the state, and `reset()` to start over.

# Examples

Here is a basic implementation of a `Max` metric, which takes `f64`s as input and produces the largest input seen, if any.

```
use online_metrics::StreamingMetric;
use std::sync::Mutex;

#[derive(Default)]
struct Max(Mutex<Option<f64>>);

impl StreamingMetric for Max {
	type Input = f64;
	type Output = Option<f64>;
	fn update(&self, input: f64, _weight: f64) {
		let mut max = self.0.lock().unwrap();
		*max = Some(max.map_or(input, |max| max.max(input)));
	}
	fn merge(&self, other: &Self) {
		if let Some(value) = other.snapshot() {
			self.update(value, 1.0)
		}
	}
	fn snapshot(&self) -> Option<f64> {
		*self.0.lock().unwrap()
	}
	fn reset(&self) {
		*self.0.lock().unwrap() = None
	}
}

let max = Max::default();
max.update(1.0, 1.0);
max.update(3.0, 1.0);
assert_eq!(max.snapshot(), Some(3.0));
```
*/
pub trait StreamingMetric {
	/// `Input` is the type of a single observation passed to `update()`.
	type Input;
	/// `Output` is the return type of `snapshot()`.
	type Output;
	/// Record `input` with the given `weight`. Invalid observations are ignored.
	fn update(&self, input: Self::Input, weight: f64);
	/// Add the observations recorded by `other` to this metric.
	fn merge(&self, other: &Self);
	/// Compute every statistic from one consistent view of the state.
	fn snapshot(&self) -> Self::Output;
	/// Discard every observation.
	fn reset(&self);
}

#[cfg(test)]
fn assert_reset_matches_new<M>(inputs: Vec<(M::Input, f64)>)
where
	M: StreamingMetric + Default,
	M::Output: PartialEq + std::fmt::Debug,
{
	let metric = M::default();
	for (input, weight) in inputs {
		metric.update(input, weight);
	}
	metric.reset();
	assert_eq!(metric.snapshot(), M::default().snapshot());
}

#[cfg(test)]
fn assert_weights_add<M>(input: M::Input, a: f64, b: f64)
where
	M: StreamingMetric + Default,
	M::Input: Clone,
	M::Output: PartialEq + std::fmt::Debug,
{
	let split = M::default();
	split.update(input.clone(), a);
	split.update(input.clone(), b);
	let combined = M::default();
	combined.update(input, a + b);
	assert_eq!(split.snapshot(), combined.snapshot());
}

#[test]
fn test_reset_matches_new() {
	assert_reset_matches_new::<ConfusionMatrix>(vec![((0, 1), 1.0), ((4, 4), 2.0)]);
	assert_reset_matches_new::<Accuracy>(vec![((0, 1), 1.0), ((4, 4), 2.0)]);
	assert_reset_matches_new::<LogLoss>(vec![(0.0, 1.0), (0.7, 3.0)]);
	assert_reset_matches_new::<Regression>(vec![((-3.0, 2.0), 1.0), ((5.0, 5.5), 2.0)]);
}

#[test]
fn test_weights_add() {
	assert_weights_add::<ConfusionMatrix>((2, 1), 0.5, 2.0);
	assert_weights_add::<Accuracy>((3, 3), 1.0, 3.0);
	assert_weights_add::<LogLoss>(0.5, 1.0, 1.0);
	assert_weights_add::<Regression>((4.0, 6.0), 1.5, 1.5);
}

#[test]
fn test_shared_between_threads() {
	use rayon::prelude::*;
	let accuracy = Accuracy::new();
	let log_loss = LogLoss::new();
	let regression = Regression::new();
	(0..4000i64).into_par_iter().for_each(|i| {
		accuracy.observe(i % 3, i % 2);
		log_loss.observe(0.5);
		regression.observe_weight(i as f64, i as f64 + 1.0, 0.5);
	});
	assert_eq!(accuracy.total_weight(), 4000.0);
	assert_eq!(log_loss.total_weight(), 4000.0);
	assert!((log_loss.score() - 0.5f64.ln().abs()).abs() < 1e-9);
	assert_eq!(regression.total_weight(), 2000.0);
	assert_eq!(regression.mae(), 1.0);
	assert_eq!(regression.max_error(), 1.0);
}
