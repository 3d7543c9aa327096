use super::{
	guard::Guarded,
	mean_variance::merge_mean_m2,
	validate::{check_numeric, check_weight, InvalidObservation},
	StreamingMetric,
};

/// `Regression` accumulates the errors between actual and predicted values. From a single pass it reports mean absolute, squared and squared logarithmic errors, their roots, and the coefficient of determination.
#[derive(Debug, Default)]
pub struct Regression(Guarded<RegressionState>);

#[derive(Clone, Copy, Debug, Default)]
struct RegressionState {
	/// total weight observed
	weight: f64,
	/// weighted sum of actual values
	sum: f64,
	/// weighted sum of absolute residuals
	res_sum: f64,
	/// weighted sum of squared residuals
	res_sum2: f64,
	/// weighted sum of squared logarithmic residuals
	log_sum2: f64,
	/// weighted sum of squared deviations from the running mean
	tot_sum2: f64,
	/// largest absolute residual
	max_delta: f64,
}

/// The output of [Regression](struct.Regression.html)'s `snapshot()`.
#[derive(Clone, Debug, PartialEq)]
pub struct RegressionOutput {
	pub total_weight: f64,
	pub mean: f64,
	pub max_error: f64,
	pub mae: f64,
	pub mse: f64,
	pub rmse: f64,
	pub msle: f64,
	pub rmsle: f64,
	pub r2: f64,
}

impl Regression {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reset(&self) {
		*self.0.write() = RegressionState::default();
	}

	pub fn observe(&self, actual: f64, predicted: f64) {
		self.observe_weight(actual, predicted, 1.0)
	}

	/// NaN values and weights that are not positive are ignored.
	pub fn observe_weight(&self, actual: f64, predicted: f64, weight: f64) {
		if let Err(error) = validate(actual, predicted, weight) {
			log::trace!("ignoring regression observation: {}", error);
			return;
		}
		let residual = (actual - predicted).abs();
		let log_residual = (actual.ln_1p() - predicted.ln_1p()).abs();
		let mut state = self.0.write();
		if residual > state.max_delta {
			state.max_delta = residual;
		}
		// The deviation is taken from the mean before this observation is added.
		if state.weight != 0.0 {
			let delta = actual - state.sum / state.weight;
			state.tot_sum2 += delta * delta * weight;
		}
		state.res_sum += residual * weight;
		state.res_sum2 += residual * residual * weight;
		state.log_sum2 += log_residual * log_residual * weight;
		state.sum += actual * weight;
		state.weight += weight;
	}

	pub fn total_weight(&self) -> f64 {
		self.0.read().weight
	}

	/// The largest absolute error observed.
	pub fn max_error(&self) -> f64 {
		self.0.read().max_delta
	}

	/// The weighted mean of the actual values.
	pub fn mean(&self) -> f64 {
		self.0.snapshot().mean()
	}

	/// The mean absolute error.
	pub fn mae(&self) -> f64 {
		self.0.snapshot().mae()
	}

	/// The mean squared error.
	pub fn mse(&self) -> f64 {
		self.0.snapshot().mse()
	}

	/// The mean squared logarithmic error. This is NaN once a value below -1 has been observed.
	pub fn msle(&self) -> f64 {
		self.0.snapshot().msle()
	}

	pub fn rmse(&self) -> f64 {
		self.mse().sqrt()
	}

	pub fn rmsle(&self) -> f64 {
		self.msle().sqrt()
	}

	/// The coefficient of determination, R².
	pub fn r2(&self) -> f64 {
		self.0.snapshot().r2()
	}
}

impl RegressionState {
	fn mean(&self) -> f64 {
		self.per_weight(self.sum)
	}

	fn mae(&self) -> f64 {
		self.per_weight(self.res_sum)
	}

	fn mse(&self) -> f64 {
		self.per_weight(self.res_sum2)
	}

	fn msle(&self) -> f64 {
		self.per_weight(self.log_sum2)
	}

	fn r2(&self) -> f64 {
		if self.tot_sum2 > 0.0 {
			1.0 - self.res_sum2 / self.tot_sum2
		} else {
			0.0
		}
	}

	fn per_weight(&self, value: f64) -> f64 {
		if self.weight > 0.0 {
			value / self.weight
		} else {
			0.0
		}
	}
}

fn validate(actual: f64, predicted: f64, weight: f64) -> Result<(), InvalidObservation> {
	check_numeric(actual)?;
	check_numeric(predicted)?;
	check_weight(weight)?;
	Ok(())
}

impl StreamingMetric for Regression {
	type Input = (f64, f64);
	type Output = RegressionOutput;

	fn update(&self, (actual, predicted): Self::Input, weight: f64) {
		self.observe_weight(actual, predicted, weight)
	}

	/// The squared deviations of `other` are combined with the parallel variance merge, so R² after a merge can differ slightly from feeding both streams into one accumulator.
	fn merge(&self, other: &Self) {
		let other = other.0.snapshot();
		if other.weight == 0.0 {
			return;
		}
		let mut state = self.0.write();
		if state.weight == 0.0 {
			*state = other;
			return;
		}
		let (_, tot_sum2) = merge_mean_m2(
			state.weight,
			state.mean(),
			state.tot_sum2,
			other.weight,
			other.mean(),
			other.tot_sum2,
		);
		state.tot_sum2 = tot_sum2;
		state.res_sum += other.res_sum;
		state.res_sum2 += other.res_sum2;
		state.log_sum2 += other.log_sum2;
		state.sum += other.sum;
		state.weight += other.weight;
		state.max_delta = state.max_delta.max(other.max_delta);
	}

	fn snapshot(&self) -> RegressionOutput {
		let state = self.0.snapshot();
		let mse = state.mse();
		let msle = state.msle();
		RegressionOutput {
			total_weight: state.weight,
			mean: state.mean(),
			max_error: state.max_delta,
			mae: state.mae(),
			mse,
			rmse: mse.sqrt(),
			msle,
			rmsle: msle.sqrt(),
			r2: state.r2(),
		}
	}

	fn reset(&self) {
		Regression::reset(self)
	}
}

#[cfg(test)]
fn observed() -> Regression {
	let regression = Regression::new();
	regression.observe(26.0, 25.0);
	regression.observe(20.0, 25.0);
	regression.observe(24.0, 22.0);
	regression.observe(21.0, 23.0);
	regression.observe(23.0, 24.0);
	regression.observe(25.0, 29.0);
	regression.observe(27.0, 28.0);
	regression.observe_weight(28.0, 26.0, 2.0);
	regression.observe(29.0, 30.0);
	regression.observe(22.0, 18.0);
	regression
}

#[test]
fn test_basic_stats() {
	let regression = observed();
	assert_eq!(regression.total_weight(), 11.0);
	assert_eq!(regression.max_error(), 5.0);
	assert!((regression.mean() - 24.818).abs() < 0.001);
}

#[test]
fn test_mean_errors() {
	let regression = observed();
	assert!((regression.mae() - 2.273).abs() < 0.001);
	assert!((regression.mse() - 7.000).abs() < 0.001);
	assert!((regression.rmse() - 2.646).abs() < 0.001);
	assert!((regression.msle() - 0.012).abs() < 0.001);
	assert!((regression.rmsle() - 0.110).abs() < 0.001);
}

#[test]
fn test_r2() {
	let regression = observed();
	assert!((regression.r2() - 0.394).abs() < 0.001);
	regression.observe_weight(28.0, 28.0, 2.0);
	assert!((regression.r2() - 0.477).abs() < 0.001);
}

#[test]
fn test_blanks() {
	let regression = observed();
	regression.reset();
	assert_eq!(regression.snapshot(), Regression::new().snapshot());
	insta::assert_debug_snapshot!(regression.snapshot(), @r###"
 RegressionOutput {
     total_weight: 0.0,
     mean: 0.0,
     max_error: 0.0,
     mae: 0.0,
     mse: 0.0,
     rmse: 0.0,
     msle: 0.0,
     rmsle: 0.0,
     r2: 0.0,
 }
 "###);
}

#[test]
fn test_negative_values() {
	let regression = observed();
	regression.observe(-28.0, -27.0);
	assert_eq!(regression.max_error(), 5.0);
	assert!((regression.mean() - 20.417).abs() < 0.001);
	assert!((regression.mae() - 2.167).abs() < 0.001);
	assert!((regression.mse() - 6.500).abs() < 0.001);
	assert!((regression.rmse() - 2.550).abs() < 0.001);
	assert!(regression.msle().is_nan());
	assert!(regression.rmsle().is_nan());
}

#[test]
fn test_ignores_invalid_observations() {
	let regression = observed();
	regression.observe(f64::NAN, 1.0);
	regression.observe(1.0, f64::NAN);
	regression.observe_weight(1.0, 2.0, 0.0);
	regression.observe_weight(1.0, 2.0, -1.0);
	assert_eq!(regression.total_weight(), 11.0);
	assert_eq!(regression.max_error(), 5.0);
}

#[test]
fn test_example() {
	let regression = Regression::new();
	let actual = [26.0, 20.0, 24.0, 21.0, 23.0, 25.0, 27.0];
	let predicted = [25.0, 25.0, 22.0, 23.0, 24.0, 29.0, 28.0];
	for (actual, predicted) in actual.iter().zip(predicted.iter()) {
		regression.update((*actual, *predicted), 1.0);
	}
	let output = regression.snapshot();
	assert_eq!(output.total_weight, 7.0);
	assert!((output.mae - 2.286).abs() < 0.001);
	assert!((output.mse - 7.429).abs() < 0.001);
	assert!((output.rmse - 2.726).abs() < 0.001);
	assert!((output.msle - 0.012).abs() < 0.001);
	assert!((output.rmsle - 0.110).abs() < 0.001);
	assert!((output.r2 - 0.162).abs() < 0.001);
}

#[test]
fn test_merge() {
	let a = Regression::new();
	a.observe(2.0, 3.0);
	let b = Regression::new();
	b.observe_weight(4.0, 4.5, 3.0);
	a.merge(&b);
	let output = a.snapshot();
	assert_eq!(output.total_weight, 4.0);
	assert_eq!(output.mean, 3.5);
	assert_eq!(output.max_error, 1.0);
	assert_eq!(output.mae, 0.625);
	// tot_sum2 = (4 - 2)² · 1 · 3 / 4 = 3 and res_sum2 = 1 + 0.75 = 1.75
	assert!((output.r2 - (1.0 - 1.75 / 3.0)).abs() < 1e-12);

	let empty = Regression::new();
	empty.merge(&a);
	assert_eq!(empty.snapshot(), a.snapshot());
	a.merge(&Regression::new());
	assert_eq!(empty.snapshot(), a.snapshot());
}
