//! Time-to-live parsing.
//!
//! Credential lifetimes are written as `<integer><unit>` where the unit is one
//! of `s`, `m`, `h` or `d`.

use std::time::Duration;

use crate::error::{AuthError, AuthResult};

/// Parse a ttl string such as `"30s"`, `"5m"`, `"2h"` or `"7d"`.
///
/// # Example
///
/// ```
/// use gateway_auth::parse_duration;
///
/// assert_eq!(parse_duration("5m").unwrap().as_millis(), 300_000);
/// assert!(parse_duration("5x").is_err());
/// ```
pub fn parse_duration(input: &str) -> AuthResult<Duration> {
    let invalid = || AuthError::InvalidDuration(input.to_string());

    let trimmed = input.trim();
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let digits = &trimmed[..trimmed.len() - unit.len_utf8()];

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}
