//! Human-readable delay strings.

use std::time::Duration;

/// Parse a delay such as `"30s"`, `"5m"` or `"1h"`. A bare number is
/// seconds. Anything malformed falls back to `default` so a typo in the
/// config slows the bot down rather than stopping it.
#[must_use]
pub fn parse_delay(raw: &str, default: Duration) -> Duration {
    let raw = raw.trim();
    if raw.is_empty() {
        return default;
    }

    let (number, unit) = match raw.char_indices().last() {
        Some((last, c)) if c.is_ascii_alphabetic() => (&raw[..last], Some(c.to_ascii_lowercase())),
        _ => (raw, None),
    };

    let Ok(value) = number.trim().parse::<u64>() else {
        tracing::warn!(raw = raw, "unparseable delay, using default");
        return default;
    };

    match unit {
        None | Some('s') => Duration::from_secs(value),
        Some('m') => Duration::from_secs(value * 60),
        Some('h') => Duration::from_secs(value * 60 * 60),
        Some(other) => {
            tracing::warn!(raw = raw, unit = %other, "unknown delay unit, using default");
            default
        }
    }
}
