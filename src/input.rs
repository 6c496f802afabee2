use crate::calculator::CalcError;

/// Convert string input to a number.
///
/// Surrounding whitespace is ignored. Fails with [`CalcError::InvalidNumber`]
/// carrying the original input when it cannot be converted.
pub fn validate_number_input(value: &str) -> Result<f64, CalcError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| CalcError::InvalidNumber(value.to_string()))
}
