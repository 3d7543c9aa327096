use num_traits::ToPrimitive;
use thiserror::Error;

/// The reason an observation was not recorded.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum InvalidObservation {
	#[error("category {0} is negative")]
	Category(i64),
	#[error("weight {0} is not positive")]
	Weight(f64),
	#[error("probability {0} is outside [0, 1]")]
	Probability(f64),
	#[error("value is NaN")]
	Numeric,
}

pub fn is_valid_category(x: i64) -> bool {
	x > -1
}

/// NaN weights compare false and are rejected along with zero and negative weights.
pub fn is_valid_weight(w: f64) -> bool {
	w > 0.0
}

pub fn is_valid_probability(p: f64) -> bool {
	(0.0..=1.0).contains(&p)
}

/// Infinite values are accepted, only NaN is rejected.
pub fn is_valid_numeric(v: f64) -> bool {
	!v.is_nan()
}

pub fn check_category(x: i64) -> Result<(), InvalidObservation> {
	if is_valid_category(x) {
		Ok(())
	} else {
		Err(InvalidObservation::Category(x))
	}
}

pub fn check_weight(w: f64) -> Result<(), InvalidObservation> {
	if is_valid_weight(w) {
		Ok(())
	} else {
		Err(InvalidObservation::Weight(w))
	}
}

pub fn check_probability(p: f64) -> Result<(), InvalidObservation> {
	if is_valid_probability(p) {
		Ok(())
	} else {
		Err(InvalidObservation::Probability(p))
	}
}

pub fn check_numeric(v: f64) -> Result<(), InvalidObservation> {
	if is_valid_numeric(v) {
		Ok(())
	} else {
		Err(InvalidObservation::Numeric)
	}
}

/// Validate an `(actual, predicted, weight)` classification observation and convert its categories to matrix indexes. Only targets where `usize` is narrower than `i64` can fail the conversion.
pub fn check_classification(
	actual: i64,
	predicted: i64,
	weight: f64,
) -> Result<(usize, usize), InvalidObservation> {
	check_category(actual)?;
	check_category(predicted)?;
	check_weight(weight)?;
	let actual = actual
		.to_usize()
		.ok_or(InvalidObservation::Category(actual))?;
	let predicted = predicted
		.to_usize()
		.ok_or(InvalidObservation::Category(predicted))?;
	Ok((actual, predicted))
}

#[test]
fn test_predicates() {
	assert!(is_valid_category(0));
	assert!(is_valid_category(7));
	assert!(!is_valid_category(-1));
	assert!(is_valid_weight(0.5));
	assert!(!is_valid_weight(0.0));
	assert!(!is_valid_weight(-1.0));
	assert!(!is_valid_weight(f64::NAN));
	assert!(is_valid_probability(0.0));
	assert!(is_valid_probability(1.0));
	assert!(!is_valid_probability(1.01));
	assert!(!is_valid_probability(-0.01));
	assert!(!is_valid_probability(f64::NAN));
	assert!(is_valid_numeric(-3.0));
	assert!(is_valid_numeric(f64::INFINITY));
	assert!(!is_valid_numeric(f64::NAN));
}

#[test]
fn test_checks() {
	assert_eq!(check_category(-2), Err(InvalidObservation::Category(-2)));
	assert_eq!(check_weight(0.0), Err(InvalidObservation::Weight(0.0)));
	assert_eq!(
		check_probability(2.0),
		Err(InvalidObservation::Probability(2.0))
	);
	assert_eq!(check_numeric(f64::NAN), Err(InvalidObservation::Numeric));
	assert_eq!(check_category(3), Ok(()));
	assert_eq!(
		InvalidObservation::Weight(-1.5).to_string(),
		"weight -1.5 is not positive"
	);
}

#[test]
fn test_check_classification() {
	assert_eq!(check_classification(2, 0, 1.0), Ok((2, 0)));
	assert_eq!(
		check_classification(-1, 0, 1.0),
		Err(InvalidObservation::Category(-1))
	);
	assert_eq!(
		check_classification(0, -3, 1.0),
		Err(InvalidObservation::Category(-3))
	);
	assert_eq!(
		check_classification(0, 0, -1.0),
		Err(InvalidObservation::Weight(-1.0))
	);
}
