use super::{guard::Guarded, validate::check_classification, StreamingMetric};

/// The accuracy is the proportion of the observed weight where predicted == actual.
#[derive(Debug, Default)]
pub struct Accuracy(Guarded<AccuracyState>);

#[derive(Clone, Copy, Debug, Default)]
struct AccuracyState {
	observed: f64,
	correct: f64,
}

/// The output of [Accuracy](struct.Accuracy.html)'s `snapshot()`.
#[derive(Clone, Debug, PartialEq)]
pub struct AccuracyOutput {
	pub correct_weight: f64,
	pub total_weight: f64,
	pub rate: f64,
}

impl Accuracy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reset(&self) {
		*self.0.write() = AccuracyState::default();
	}

	pub fn observe(&self, actual: i64, predicted: i64) {
		self.observe_weight(actual, predicted, 1.0)
	}

	/// Observations with a negative category or a weight that is not positive are ignored.
	pub fn observe_weight(&self, actual: i64, predicted: i64, weight: f64) {
		if let Err(error) = check_classification(actual, predicted, weight) {
			log::trace!("ignoring accuracy observation: {}", error);
			return;
		}
		let mut state = self.0.write();
		state.observed += weight;
		if actual == predicted {
			state.correct += weight;
		}
	}

	pub fn total_weight(&self) -> f64 {
		self.0.read().observed
	}

	pub fn correct_weight(&self) -> f64 {
		self.0.read().correct
	}

	pub fn rate(&self) -> f64 {
		self.0.snapshot().rate()
	}
}

impl AccuracyState {
	fn rate(&self) -> f64 {
		if self.observed == 0.0 {
			return 0.0;
		}
		self.correct / self.observed
	}
}

impl StreamingMetric for Accuracy {
	type Input = (i64, i64);
	type Output = AccuracyOutput;

	fn update(&self, (actual, predicted): Self::Input, weight: f64) {
		self.observe_weight(actual, predicted, weight)
	}

	fn merge(&self, other: &Self) {
		let other = other.0.snapshot();
		let mut state = self.0.write();
		state.observed += other.observed;
		state.correct += other.correct;
	}

	fn snapshot(&self) -> AccuracyOutput {
		let state = self.0.snapshot();
		AccuracyOutput {
			correct_weight: state.correct,
			total_weight: state.observed,
			rate: state.rate(),
		}
	}

	fn reset(&self) {
		Accuracy::reset(self)
	}
}

#[cfg(test)]
fn observed() -> Accuracy {
	let accuracy = Accuracy::new();
	accuracy.observe(1, 1);
	accuracy.observe(1, 1);
	accuracy.observe(1, 0);
	accuracy.observe(0, 0);
	accuracy.observe(0, 0);
	accuracy.observe(0, 1);
	accuracy.observe(1, 1);
	accuracy.observe_weight(1, 1, 1.0);
	accuracy.observe_weight(1, 1, 2.0);
	accuracy.observe_weight(0, 0, 1.0);
	accuracy.observe_weight(0, 1, 1.0);
	accuracy
}

#[test]
fn test_stats() {
	let accuracy = observed();
	assert_eq!(accuracy.correct_weight(), 9.0);
	assert_eq!(accuracy.total_weight(), 12.0);
	assert_eq!(accuracy.rate(), 0.75);
}

#[test]
fn test_ignores_invalid_observations() {
	let accuracy = observed();
	accuracy.observe(-1, 1);
	accuracy.observe(1, -1);
	accuracy.observe(-1, -1);
	accuracy.observe_weight(1, 1, 0.0);
	accuracy.observe_weight(1, 1, -4.0);
	assert_eq!(accuracy.total_weight(), 12.0);
	assert_eq!(accuracy.correct_weight(), 9.0);
}

#[test]
fn test_reset() {
	let accuracy = observed();
	accuracy.reset();
	assert_eq!(accuracy.rate(), 0.0);
	assert_eq!(accuracy.snapshot(), Accuracy::new().snapshot());
}

#[test]
fn test_merge() {
	let a = observed();
	let b = Accuracy::new();
	b.observe(3, 3);
	b.observe_weight(3, 2, 3.0);
	a.merge(&b);
	insta::assert_debug_snapshot!(a.snapshot(), @r###"
 AccuracyOutput {
     correct_weight: 10.0,
     total_weight: 16.0,
     rate: 0.625,
 }
 "###);
}
