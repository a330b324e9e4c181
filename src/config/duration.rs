//! Duration strings such as `24h`, `1h30m`, `1.5h` or `500ms`
//!
//! A duration is one or more `<number><unit>` pairs. Numbers may carry a
//! fraction. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
//! A lone `0` is also accepted.

use std::time::Duration;

use thiserror::Error;

/// Why a duration string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("missing unit after {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {0:?}")]
    UnknownUnit(String),

    #[error("duration is negative")]
    Negative,

    #[error("duration is too large")]
    Overflow,
}

fn unit_nanos(unit: &str) -> Option<f64> {
    let nanos = match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60.0 * 1e9,
        "h" => 3600.0 * 1e9,
        _ => return None,
    };
    Some(nanos)
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Parses a duration string
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use shelf::config::parse_duration;
///
/// assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(DurationError::Empty);
    }
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if rest.starts_with('-') {
        return Err(DurationError::Negative);
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_end = rest.find(|c| !is_number_char(c)).unwrap_or(rest.len());
        let number = &rest[..number_end];
        if number.is_empty() || number == "." {
            return Err(DurationError::InvalidNumber(rest.to_string()));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError::InvalidNumber(number.to_string()))?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number_char).unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(number.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit(unit.to_string()))?;
        total_nanos += value * scale;
        rest = &rest[unit_end..];
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(DurationError::Overflow);
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
