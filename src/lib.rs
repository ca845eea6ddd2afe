//! Timeweave — temporal reasoning engine for planning and scheduling.
//!
//! Represents time intervals, qualitative temporal relations between them
//! (Allen's interval algebra), and the participants (agents and entities)
//! that inhabit those intervals. Qualitative relations are lowered into a
//! Simple Temporal Network of numeric distance constraints; a pluggable
//! solver checks consistency and assigns concrete times.

pub mod cli;
pub mod relations;
pub mod stn;
pub mod timeline;
pub mod types;

// Re-export commonly used types at the crate root
pub use relations::{
    allen_relation, allen_to_language_neutral, classify_relation, constraint_between,
    filter_valid_intervals, generate_stn_constraint, relation_description,
    validate_interval_duration, AllenRelation, RelationCode,
};
pub use stn::{
    Bound, FloydWarshallSolver, SolverOutcome, Stn, StnOptions, StnSolver,
    DEFAULT_MAX_TIMEPOINTS, DEFAULT_SOLVER_TIMEOUT,
};
pub use timeline::{segment_by_bridges, validate_segments, TimeRange, Timeline, TimelineBuilder};
pub use types::{
    end_label, format_instant, now, parse_instant, parse_iso8601_duration, start_label,
    BridgeKind, BridgeMarker, BridgePosition, Instant, Interval, LodLevel, Metadata, Participant,
    ParticipantMode, SemanticRef, TemporalError, TemporalResult, TimeUnit,
};
