// src/config/duration.rs

use std::time::Duration;

use crate::errors::{GracefulError, Result};

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
///
/// Also accepts `ns` and `us` so very short watchdog timeouts can be
/// expressed. Whitespace around the number and unit is ignored.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let invalid = |reason: String| GracefulError::InvalidDuration {
        input: s.to_string(),
        reason,
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty duration string".to_string()));
    }

    let idx = trimmed
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| invalid("duration missing unit suffix".to_string()))?;

    let (num_part, unit_part) = trimmed.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| invalid(format!("invalid duration number '{num_part}': {e}")))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ns" => Ok(Duration::from_nanos(value)),
        "us" => Ok(Duration::from_micros(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(60 * 60))),
        _ => Err(invalid(format!(
            "unsupported duration unit '{unit}'; expected ns, us, ms, s, m, or h"
        ))),
    }
}
