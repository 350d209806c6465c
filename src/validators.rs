//! Value checks applied before a command is formatted. A failing check means
//! nothing is sent to the instrument.

use std::fmt::{Debug, Display};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("value {value} is not in range [{min}, {max}]")]
    OutOfRange { value: String, min: String, max: String },
    #[error("value '{value}' is not one of {allowed:?}")]
    NotInSet { value: String, allowed: Vec<String> },
    #[error("{0}")]
    Invalid(String),
}

/// Accepts `value` only if it is a member of `allowed`.
pub fn strict_discrete_set<T>(value: T, allowed: &[T]) -> Result<T, ValidationError>
where
    T: PartialEq + Display,
{
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::NotInSet {
            value: value.to_string(),
            allowed: allowed.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Accepts `value` only if it lies within `[min, max]`.
pub fn strict_range<T>(value: T, min: T, max: T) -> Result<T, ValidationError>
where
    T: PartialOrd + Display,
{
    if min <= value && value <= max {
        Ok(value)
    } else {
        Err(out_of_range(value, min, max))
    }
}

/// Clamps `value` into `[min, max]`.
pub fn truncated_range<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Picks the smallest member of `allowed` that is not below `value`, or the
/// largest member when `value` exceeds them all.
pub fn truncated_discrete_set<T>(value: T, allowed: &[T]) -> Result<T, ValidationError>
where
    T: PartialOrd + Copy + Display,
{
    let mut sorted = allowed.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    match sorted.iter().find(|v| **v >= value) {
        Some(v) => Ok(*v),
        None => sorted.last().copied().ok_or_else(|| {
            ValidationError::Invalid(format!("no allowed values to truncate {} onto", value))
        }),
    }
}

/// Like `truncated_discrete_set` over the grid `min, min + step, ..., max`.
pub fn truncated_step(value: f64, min: f64, max: f64, step: f64) -> f64 {
    let value = truncated_range(value, min, max);
    let steps = ((value - min) / step - 1e-9).ceil().max(0.0);
    let snapped = min + steps * step;
    // round off accumulated binary noise at the grid resolution
    let scale = 1.0 / step;
    let snapped = (snapped * scale).round() / scale;
    snapped.min(max)
}

/// Accepts `value` only if it lies within `[min, max]` on a grid of `step`.
pub fn strict_discrete_range(value: i64, min: i64, max: i64, step: i64) -> Result<i64, ValidationError> {
    let value = strict_range(value, min, max)?;
    if (value - min) % step == 0 {
        Ok(value)
    } else {
        Err(ValidationError::Invalid(format!(
            "value {} is not a multiple of {} from {}",
            value, step, min
        )))
    }
}

fn out_of_range<T: Display>(value: T, min: T, max: T) -> ValidationError {
    ValidationError::OutOfRange {
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}
