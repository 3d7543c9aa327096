//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

/// Combine two separately accumulated weighted means and sums of squared deviations (m2) into a single mean and m2. Weights need not be integers.
pub fn merge_mean_m2(
	weight_a: f64,
	mean_a: f64,
	m2_a: f64,
	weight_b: f64,
	mean_b: f64,
	m2_b: f64,
) -> (f64, f64) {
	let weight = weight_a + weight_b;
	if weight == 0.0 {
		return (0.0, 0.0);
	}
	(
		(weight_a * mean_a + weight_b * mean_b) / weight,
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (weight_a * weight_b / weight),
	)
}

#[cfg(test)]
fn mean_m2(values: &[(f64, f64)]) -> (f64, f64, f64) {
	let weight: f64 = values.iter().map(|(_, weight)| weight).sum();
	let mean = values.iter().map(|(value, weight)| value * weight).sum::<f64>() / weight;
	let m2 = values
		.iter()
		.map(|(value, weight)| (value - mean) * (value - mean) * weight)
		.sum();
	(weight, mean, m2)
}

#[test]
fn test_merge_mean_m2() {
	let a = [(1.0, 1.0), (4.0, 2.0), (6.0, 0.5)];
	let b = [(2.0, 3.0), (10.0, 1.0)];
	let all: Vec<_> = a.iter().chain(b.iter()).cloned().collect();
	let (weight_a, mean_a, m2_a) = mean_m2(&a);
	let (weight_b, mean_b, m2_b) = mean_m2(&b);
	let (_, expected_mean, expected_m2) = mean_m2(&all);
	let (mean, m2) = merge_mean_m2(weight_a, mean_a, m2_a, weight_b, mean_b, m2_b);
	assert!((mean - expected_mean).abs() < 1e-12);
	assert!((m2 - expected_m2).abs() < 1e-9);
}

#[test]
fn test_merge_empty() {
	assert_eq!(merge_mean_m2(0.0, 0.0, 0.0, 0.0, 0.0, 0.0), (0.0, 0.0));
	assert_eq!(merge_mean_m2(0.0, 0.0, 0.0, 2.0, 3.0, 1.5), (3.0, 1.5));
}
