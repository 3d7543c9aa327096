use super::{
	guard::Guarded,
	validate::{check_probability, check_weight, InvalidObservation},
	StreamingMetric,
};
use serde::{Deserialize, Serialize};

/// The epsilon used when none is configured.
pub const DEFAULT_EPSILON: f64 = 1e-15;

/// LogLoss, also known as logistic loss or cross entropy loss, is the negative weighted mean of the log of the probability assigned to the true class. [Learn more](https://en.wikipedia.org/wiki/Cross_entropy#Cross-entropy_loss_function_and_logistic_regression).
#[derive(Debug)]
pub struct LogLoss {
	epsilon: f64,
	state: Guarded<LogLossState>,
}

#[derive(Clone, Copy, Debug, Default)]
struct LogLossState {
	log_sum: f64,
	weight: f64,
}

/// These are the options passed to `LogLoss::with_options`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogLossOptions {
	/// This value is added to a probability of zero before taking its log. If it is `None` or not positive, `DEFAULT_EPSILON` is used.
	pub epsilon: Option<f64>,
}

impl LogLossOptions {
	pub fn epsilon(&self) -> f64 {
		match self.epsilon {
			Some(epsilon) if epsilon > 0.0 => epsilon,
			_ => DEFAULT_EPSILON,
		}
	}
}

/// The output of [LogLoss](struct.LogLoss.html)'s `snapshot()`.
#[derive(Clone, Debug, PartialEq)]
pub struct LogLossOutput {
	pub total_weight: f64,
	pub score: f64,
}

impl Default for LogLoss {
	fn default() -> Self {
		Self::with_options(LogLossOptions::default())
	}
}

impl LogLoss {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_epsilon(epsilon: f64) -> Self {
		Self::with_options(LogLossOptions {
			epsilon: Some(epsilon),
		})
	}

	pub fn with_options(options: LogLossOptions) -> Self {
		Self {
			epsilon: options.epsilon(),
			state: Guarded::default(),
		}
	}

	pub fn epsilon(&self) -> f64 {
		self.epsilon
	}

	/// Clear all observations. The epsilon is kept.
	pub fn reset(&self) {
		*self.state.write() = LogLossState::default();
	}

	/// Record the probability the model assigned to the class that was actually observed. If the predictions were
	///
	/// | dog | cat | fish |
	/// |-----|-----|------|
	/// | 0.2 | 0.5 | 0.3  |
	/// | 0.8 | 0.1 | 0.1  |
	/// | 0.6 | 0.1 | 0.4  |
	///
	/// and the actual classes were cat, dog and fish, observe `0.5`, `0.8` and `0.4`.
	pub fn observe(&self, probability: f64) {
		self.observe_weight(probability, 1.0)
	}

	/// Probabilities outside `[0, 1]` and weights that are not positive are ignored.
	pub fn observe_weight(&self, probability: f64, weight: f64) {
		if let Err(error) = validate(probability, weight) {
			log::trace!("ignoring log loss observation: {}", error);
			return;
		}
		let probability = if probability == 0.0 {
			probability + self.epsilon
		} else {
			probability
		};
		let log_probability = probability.ln();
		let mut state = self.state.write();
		state.weight += weight;
		state.log_sum += weight * log_probability;
	}

	pub fn total_weight(&self) -> f64 {
		self.state.read().weight
	}

	/// The log loss. With nothing observed this is `-ln(epsilon)`, the same score as observing only zero probabilities.
	pub fn score(&self) -> f64 {
		self.score_of(self.state.snapshot())
	}

	fn score_of(&self, state: LogLossState) -> f64 {
		if state.weight > 0.0 {
			-state.log_sum / state.weight
		} else {
			-self.epsilon.ln()
		}
	}
}

fn validate(probability: f64, weight: f64) -> Result<(), InvalidObservation> {
	check_probability(probability)?;
	check_weight(weight)?;
	Ok(())
}

impl StreamingMetric for LogLoss {
	type Input = f64;
	type Output = LogLossOutput;

	fn update(&self, probability: f64, weight: f64) {
		self.observe_weight(probability, weight)
	}

	fn merge(&self, other: &Self) {
		let other = other.state.snapshot();
		let mut state = self.state.write();
		state.log_sum += other.log_sum;
		state.weight += other.weight;
	}

	fn snapshot(&self) -> LogLossOutput {
		let state = self.state.snapshot();
		LogLossOutput {
			total_weight: state.weight,
			score: self.score_of(state),
		}
	}

	fn reset(&self) {
		LogLoss::reset(self)
	}
}

#[test]
fn test_score() {
	let log_loss = LogLoss::new();
	for probability in [0.5, 0.1, 0.01, 0.1, 0.25, 0.999].iter() {
		log_loss.observe(*probability);
	}
	assert!((log_loss.score() - 1.882).abs() < 0.001);
}

#[test]
fn test_score_per_class() {
	let log_loss = LogLoss::new();
	log_loss.observe(0.5);
	log_loss.observe(0.8);
	log_loss.observe(0.4);
	assert!((log_loss.score() - 0.611).abs() < 0.001);
}

#[test]
fn test_score_variable() {
	let log_loss = LogLoss::new();
	for probability in [0.8, 0.9, 0.1, 0.6].iter() {
		log_loss.observe(*probability);
	}
	assert!((log_loss.score() - 0.785).abs() < 0.001);
	log_loss.observe(0.0);
	assert!((log_loss.score() - 7.536).abs() < 0.001);
	log_loss.observe(0.99);
	assert!((log_loss.score() - 6.282).abs() < 0.001);
}

#[test]
fn test_empty() {
	let log_loss = LogLoss::new();
	assert!((log_loss.score() - 34.539).abs() < 0.001);
	assert_eq!(log_loss.total_weight(), 0.0);
}

#[test]
fn test_perfect_match() {
	let log_loss = LogLoss::new();
	log_loss.observe_weight(1.0, 10.0);
	assert!(log_loss.score().abs() < 0.001);
	log_loss.observe_weight(1.0, 10.0);
	assert!(log_loss.score().abs() < 0.001);
}

#[test]
fn test_perfect_failure() {
	let log_loss = LogLoss::new();
	log_loss.observe_weight(0.0, 10.0);
	assert!((log_loss.score() - 34.539).abs() < 0.001);
	log_loss.observe_weight(0.0, 10.0);
	assert!((log_loss.score() - 34.539).abs() < 0.001);
}

#[test]
fn test_ignores_invalid_observations() {
	let log_loss = LogLoss::new();
	log_loss.observe(0.5);
	log_loss.observe(1.5);
	log_loss.observe(-0.1);
	log_loss.observe(f64::NAN);
	log_loss.observe_weight(0.5, 0.0);
	log_loss.observe_weight(0.5, -1.0);
	assert_eq!(log_loss.total_weight(), 1.0);
	assert!((log_loss.score() - 0.5f64.ln().abs()).abs() < 1e-12);
}

#[test]
fn test_epsilon() {
	assert_eq!(LogLoss::new().epsilon(), DEFAULT_EPSILON);
	assert_eq!(LogLoss::with_epsilon(0.0).epsilon(), DEFAULT_EPSILON);
	assert_eq!(LogLoss::with_epsilon(-1.0).epsilon(), DEFAULT_EPSILON);
	let log_loss = LogLoss::with_epsilon(1e-3);
	assert!((log_loss.score() - 6.908).abs() < 0.001);
	log_loss.observe(0.0);
	assert!((log_loss.score() - 6.908).abs() < 0.001);
	log_loss.reset();
	assert_eq!(log_loss.epsilon(), 1e-3);
	assert_eq!(log_loss.total_weight(), 0.0);
}

#[test]
fn test_options() {
	let options: LogLossOptions = serde_json::from_str(r#"{ "epsilon": 0.01 }"#).unwrap();
	assert_eq!(options.epsilon(), 0.01);
	let options: LogLossOptions = serde_json::from_str("{}").unwrap();
	assert_eq!(options, LogLossOptions::default());
	assert_eq!(options.epsilon(), DEFAULT_EPSILON);
	assert_eq!(LogLoss::with_options(options).epsilon(), DEFAULT_EPSILON);
}

#[test]
fn test_merge() {
	let a = LogLoss::new();
	a.observe(0.5);
	let b = LogLoss::new();
	b.observe(0.8);
	b.observe(0.4);
	a.merge(&b);
	let all = LogLoss::new();
	all.observe(0.5);
	all.observe(0.8);
	all.observe(0.4);
	assert_eq!(a.total_weight(), 3.0);
	assert!((a.score() - all.score()).abs() < 1e-12);
}
