//! Temporal intervals — named extents with optional participant attachment.

use serde::Serialize;
use serde_json::json;

use super::error::{TemporalError, TemporalResult};
use super::participant::Participant;
use super::time::{self, Instant, TimeUnit};
use super::{
    Metadata, META_FIXED_SCHEDULE, META_FLOATING_DURATION, META_ISO8601_DURATION,
    META_OPEN_ENDED_END, META_OPEN_ENDED_START,
};

/// STN label for an interval's start point.
pub fn start_label(id: &str) -> String {
    format!("{}_start", id)
}

/// STN label for an interval's end point.
pub fn end_label(id: &str) -> String {
    format!("{}_end", id)
}

/// A named temporal extent.
///
/// An interval is immutable in shape: solving replaces its times rather than
/// mutating it in place. Either endpoint may be absent, but only to express
/// open-ended or floating-duration intervals, which are not admitted to an
/// STN.
#[derive(Debug, Clone, Serialize)]
pub struct Interval {
    /// Opaque unique identifier.
    pub id: String,
    /// Start of the extent.
    pub start_time: Option<Instant>,
    /// End of the extent (exclusive for containment checks).
    pub end_time: Option<Instant>,
    /// The acting participant, if any. A reference, not an owner.
    pub agent: Option<Participant>,
    /// The acted-upon participant, if any. A reference, not an owner.
    pub entity: Option<Participant>,
    /// Free-form metadata. Recognized keys have typed accessors.
    pub metadata: Metadata,
}

impl Interval {
    /// Create a closed interval.
    ///
    /// Equal endpoints are admitted (a zero extent is representable, though
    /// it will be refused at STN admission); reversed endpoints are not.
    pub fn new(id: impl Into<String>, start: Instant, end: Instant) -> TemporalResult<Self> {
        if start > end {
            return Err(TemporalError::TimeOrderError);
        }
        Ok(Self {
            id: id.into(),
            start_time: Some(start),
            end_time: Some(end),
            agent: None,
            entity: None,
            metadata: Metadata::new(),
        })
    }

    /// Create an interval from a pair of ISO-8601 timestamps.
    pub fn from_iso8601(id: impl Into<String>, start: &str, end: &str) -> TemporalResult<Self> {
        let s = time::parse_instant(start)?;
        let e = time::parse_instant(end)?;
        let mut interval = Self::new(id, s, e)?;
        interval
            .metadata
            .insert("iso8601_source".to_string(), json!([start, end]));
        Ok(interval)
    }

    /// Create an open-ended interval with exactly one endpoint.
    pub fn open_ended(
        id: impl Into<String>,
        start: Option<Instant>,
        end: Option<Instant>,
    ) -> TemporalResult<Self> {
        let id = id.into();
        let (flag, value) = match (start, end) {
            (Some(_), None) => (META_OPEN_ENDED_END, true),
            (None, Some(_)) => (META_OPEN_ENDED_START, true),
            _ => {
                return Err(TemporalError::InvalidIntervalSpec(format!(
                    "open-ended interval {} must have exactly one endpoint",
                    id
                )))
            }
        };
        let mut metadata = Metadata::new();
        metadata.insert(flag.to_string(), json!(value));
        Ok(Self {
            id,
            start_time: start,
            end_time: end,
            agent: None,
            entity: None,
            metadata,
        })
    }

    /// Create a floating interval carrying only an ISO-8601 duration.
    pub fn floating(id: impl Into<String>, iso_duration: &str) -> TemporalResult<Self> {
        let seconds = time::parse_iso8601_duration(iso_duration)?;
        if seconds <= 0.0 {
            return Err(TemporalError::InvalidDuration(iso_duration.to_string()));
        }
        let mut metadata = Metadata::new();
        metadata.insert(META_FLOATING_DURATION.to_string(), json!(true));
        metadata.insert(META_ISO8601_DURATION.to_string(), json!(iso_duration));
        Ok(Self {
            id: id.into(),
            start_time: None,
            end_time: None,
            agent: None,
            entity: None,
            metadata,
        })
    }

    /// Attach the acting participant.
    pub fn with_agent(mut self, agent: Participant) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Attach the acted-upon participant.
    pub fn with_entity(mut self, entity: Participant) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Merge entries into the metadata bag.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Both endpoints, when the interval is fully anchored.
    pub fn bounds(&self) -> Option<(Instant, Instant)> {
        match (self.start_time, self.end_time) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }

    /// Whether both endpoints are present.
    pub fn is_anchored(&self) -> bool {
        self.bounds().is_some()
    }

    /// Whether the interval is missing an endpoint by design.
    pub fn is_open_ended(&self) -> bool {
        self.flag(META_OPEN_ENDED_START) || self.flag(META_OPEN_ENDED_END)
    }

    /// Whether the interval carries only a duration, with no position.
    pub fn is_floating(&self) -> bool {
        self.flag(META_FLOATING_DURATION)
    }

    /// Whether the interval's times are fixed and must not be reassigned.
    pub fn is_fixed_schedule(&self) -> bool {
        self.flag(META_FIXED_SCHEDULE)
    }

    fn flag(&self, key: &str) -> bool {
        self.metadata.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// The floating duration recorded in metadata, in seconds.
    pub fn floating_duration_seconds(&self) -> Option<f64> {
        let iso = self.metadata.get(META_ISO8601_DURATION)?.as_str()?;
        time::parse_iso8601_duration(iso).ok()
    }

    fn duration_micros(&self) -> Option<i64> {
        match self.bounds() {
            Some((s, e)) => (e - s).num_microseconds(),
            None => self
                .floating_duration_seconds()
                .map(|secs| (secs * 1e6).round() as i64),
        }
    }

    /// Duration in whole milliseconds, when known.
    pub fn duration_ms(&self) -> Option<i64> {
        self.duration_micros()
            .map(|us| (us as f64 / 1e3).round() as i64)
    }

    /// Duration in fractional seconds, when known.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_micros().map(|us| us as f64 / 1e6)
    }

    /// Duration as a fractional count of `unit`, when known.
    pub fn duration_in_unit(&self, unit: TimeUnit) -> Option<f64> {
        self.duration_micros()
            .map(|us| time::micros_in_unit(us, unit))
    }

    /// Half-open containment: `start ≤ t < end`. A missing endpoint is
    /// unbounded on that side; floating intervals contain nothing.
    pub fn contains(&self, t: Instant) -> bool {
        if self.start_time.is_none() && self.end_time.is_none() {
            return false;
        }
        let after_start = self.start_time.map_or(true, |s| s <= t);
        let before_end = self.end_time.map_or(true, |e| t < e);
        after_start && before_end
    }

    /// Strict overlap: touching intervals do not overlap. Missing endpoints
    /// are unbounded; floating intervals overlap nothing.
    pub fn overlaps(&self, other: &Interval) -> bool {
        if (self.start_time.is_none() && self.end_time.is_none())
            || (other.start_time.is_none() && other.end_time.is_none())
        {
            return false;
        }
        let self_starts_first = match (self.start_time, other.end_time) {
            (Some(s), Some(e)) => s < e,
            _ => true,
        };
        let other_starts_first = match (other.start_time, self.end_time) {
            (Some(s), Some(e)) => s < e,
            _ => true,
        };
        self_starts_first && other_starts_first
    }

    /// The STN mirror: start/end point labels and the duration as a whole
    /// count of `unit` ticks (unscaled by LOD).
    pub fn to_stn_points(&self, unit: TimeUnit) -> TemporalResult<(String, String, i64)> {
        if !self.is_anchored() {
            return Err(TemporalError::InvalidIntervalSpec(format!(
                "interval {} is not fully anchored",
                self.id
            )));
        }
        let duration = self.duration_in_unit(unit).unwrap_or(0.0);
        Ok((
            start_label(&self.id),
            end_label(&self.id),
            duration.round() as i64,
        ))
    }
}
