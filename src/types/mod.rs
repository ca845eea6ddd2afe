//! All data types for the timeweave library.

pub mod bridge;
pub mod error;
pub mod interval;
pub mod participant;
pub mod time;

pub use bridge::{BridgeKind, BridgeMarker, BridgePosition, SemanticRef};
pub use error::{TemporalError, TemporalResult};
pub use interval::{end_label, start_label, Interval};
pub use participant::{Participant, ParticipantMode};
pub use time::{
    add_seconds, duration_seconds, format_instant, instant_to_seconds, micros_in_unit,
    ms_to_seconds, parse_instant, parse_iso8601_duration, seconds_to_instant, seconds_to_ms,
    truncate_to_minute, validate_time_order, Instant, LodLevel, TimeUnit,
};

/// Free-form metadata bag carried by intervals, participants, bridges, and
/// timelines. Recognized keys have typed accessors on the owning type.
pub type Metadata = std::collections::BTreeMap<String, serde_json::Value>;

/// Metadata key: the interval has no fixed start.
pub const META_OPEN_ENDED_START: &str = "open_ended_start";

/// Metadata key: the interval has no fixed end.
pub const META_OPEN_ENDED_END: &str = "open_ended_end";

/// Metadata key: the interval carries only a duration, no position.
pub const META_FLOATING_DURATION: &str = "floating_duration";

/// Metadata key: ISO-8601 duration string backing a floating interval.
pub const META_ISO8601_DURATION: &str = "iso8601_duration";

/// Metadata key: the interval's times are fixed and must not be reassigned.
pub const META_FIXED_SCHEDULE: &str = "fixed_schedule";

/// Returns the current wall-clock time as a timezoned instant.
pub fn now() -> Instant {
    chrono::Utc::now().fixed_offset()
}
