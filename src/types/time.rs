//! Wall-clock instants, time units, level-of-detail, and pure conversions.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::error::{TemporalError, TemporalResult};

/// A timezoned wall-clock point with microsecond precision.
///
/// Comparisons respect the timezone (two instants at the same absolute time
/// compare equal regardless of offset). Naive timestamps are refused at
/// parse time.
pub type Instant = DateTime<FixedOffset>;

/// The base unit a network's integer ticks are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimeUnit {
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Microseconds per one of this unit.
    pub fn micros(&self) -> i64 {
        match self {
            Self::Microsecond => 1,
            Self::Millisecond => 1_000,
            Self::Second => 1_000_000,
            Self::Minute => 60_000_000,
            Self::Hour => 3_600_000_000,
            Self::Day => 86_400_000_000,
        }
    }

    /// Return a human-readable name for this unit.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Microsecond => "microsecond",
            Self::Millisecond => "millisecond",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Parse a unit from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "microsecond" | "microseconds" | "us" => Some(Self::Microsecond),
            "millisecond" | "milliseconds" | "ms" => Some(Self::Millisecond),
            "second" | "seconds" | "s" => Some(Self::Second),
            "minute" | "minutes" | "min" => Some(Self::Minute),
            "hour" | "hours" | "h" => Some(Self::Hour),
            "day" | "days" | "d" => Some(Self::Day),
            _ => None,
        }
    }
}

impl Default for TimeUnit {
    fn default() -> Self {
        Self::Second
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolution multiplier that scales real durations to integer ticks,
/// trading precision for solver input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LodLevel {
    UltraHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl LodLevel {
    /// The tick multiplier for this level: tick = raw unit value × resolution.
    pub fn resolution(&self) -> i64 {
        match self {
            Self::UltraHigh => 1,
            Self::High => 10,
            Self::Medium => 100,
            Self::Low => 1_000,
            Self::VeryLow => 10_000,
        }
    }

    /// Return a human-readable name for this level.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UltraHigh => "ultra_high",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }

    /// Parse a level from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ultra_high" | "ultrahigh" => Some(Self::UltraHigh),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "very_low" | "verylow" => Some(Self::VeryLow),
            _ => None,
        }
    }
}

impl Default for LodLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for LodLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Convert Unix-epoch seconds (possibly fractional) to an instant, rounded
/// to the microsecond.
pub fn seconds_to_instant(seconds: f64) -> TemporalResult<Instant> {
    if !seconds.is_finite() {
        return Err(TemporalError::InvalidTimestamp {
            value: seconds.to_string(),
            reason: "not a finite number".to_string(),
        });
    }
    instant_from_epoch_micros((seconds * 1e6).round() as i64)
}

fn instant_from_epoch_micros(micros: i64) -> TemporalResult<Instant> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| TemporalError::InvalidTimestamp {
            value: micros.to_string(),
            reason: "epoch offset out of range".to_string(),
        })
}

/// Microseconds since the Unix epoch, divided by 1e6.
pub fn instant_to_seconds(t: Instant) -> f64 {
    t.timestamp_micros() as f64 / 1e6
}

/// Add (possibly fractional) seconds to an instant at microsecond precision.
pub fn add_seconds(t: Instant, seconds: f64) -> TemporalResult<Instant> {
    if !seconds.is_finite() {
        return Err(TemporalError::InvalidTimestamp {
            value: seconds.to_string(),
            reason: "not a finite number".to_string(),
        });
    }
    let micros = (seconds * 1e6).round() as i64;
    t.checked_add_signed(Duration::microseconds(micros))
        .ok_or_else(|| TemporalError::InvalidTimestamp {
            value: seconds.to_string(),
            reason: "result out of range".to_string(),
        })
}

/// Signed duration from `a` to `b` in seconds.
pub fn duration_seconds(a: Instant, b: Instant) -> f64 {
    let span = b - a;
    match span.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => span.num_milliseconds() as f64 / 1e3,
    }
}

/// Milliseconds to fractional seconds.
pub fn ms_to_seconds(ms: i64) -> f64 {
    ms as f64 / 1e3
}

/// Fractional seconds to integer milliseconds, rounded.
pub fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1e3).round() as i64
}

/// Convert a signed microsecond span to a fractional count of `unit`.
pub fn micros_in_unit(micros: i64, unit: TimeUnit) -> f64 {
    micros as f64 / unit.micros() as f64
}

/// Require that `start` strictly precedes `end`.
///
/// Equal endpoints are rejected here even though [`Interval`] construction
/// admits them; this guard is for callers that need a positive extent, such
/// as scheduling windows. See `Interval::new` for the closed-range contract.
///
/// [`Interval`]: super::interval::Interval
pub fn validate_time_order(start: Instant, end: Instant) -> TemporalResult<()> {
    if start < end {
        Ok(())
    } else {
        Err(TemporalError::TimeOrderError)
    }
}

/// Parse an RFC 3339 / ISO-8601 timestamp. Timestamps without a timezone
/// are refused rather than assumed local.
pub fn parse_instant(s: &str) -> TemporalResult<Instant> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt),
        Err(e) => {
            if chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
                Err(TemporalError::NaiveTimestamp(s.to_string()))
            } else {
                Err(TemporalError::InvalidTimestamp {
                    value: s.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Format an instant as RFC 3339 with microsecond precision.
pub fn format_instant(t: Instant) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Truncate an instant to the start of its minute.
pub fn truncate_to_minute(t: Instant) -> Instant {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Parse an ISO-8601 duration of the `PnDTnHnMnS` family into seconds.
///
/// Weeks, months, and years are not accepted: calendar-relative components
/// have no fixed length and cannot back an STN duration.
pub fn parse_iso8601_duration(s: &str) -> TemporalResult<f64> {
    let invalid = || TemporalError::InvalidDuration(s.to_string());
    let rest = s.strip_prefix('P').ok_or_else(invalid)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut seconds = 0.0f64;
    let mut matched = false;
    scan_components(date_part, &[('D', 86_400.0)], &mut seconds, &mut matched)
        .map_err(|_| invalid())?;
    if let Some(t) = time_part {
        scan_components(
            t,
            &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)],
            &mut seconds,
            &mut matched,
        )
        .map_err(|_| invalid())?;
    }
    if !matched {
        return Err(invalid());
    }
    Ok(seconds)
}

fn scan_components(
    part: &str,
    designators: &[(char, f64)],
    seconds: &mut f64,
    matched: &mut bool,
) -> Result<(), ()> {
    let mut num = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' {
            num.push(c);
        } else {
            let factor = designators
                .iter()
                .find(|(d, _)| *d == c)
                .map(|(_, f)| *f)
                .ok_or(())?;
            let value: f64 = num.parse().map_err(|_| ())?;
            *seconds += value * factor;
            *matched = true;
            num.clear();
        }
    }
    // Trailing digits without a designator are malformed
    if num.is_empty() {
        Ok(())
    } else {
        Err(())
    }
}
