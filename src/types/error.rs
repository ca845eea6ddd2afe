//! Error types for the timeweave library.

use thiserror::Error;

use super::time::TimeUnit;

/// All errors that can occur in the timeweave library.
#[derive(Error, Debug)]
pub enum TemporalError {
    /// Interval duration rounds below one tick of the target unit.
    #[error("Interval {id} has zero duration in unit {unit}")]
    ZeroDurationViolation { id: String, unit: TimeUnit },

    /// Interval endpoints are reversed.
    #[error("Interval {0} has negative duration")]
    NegativeDuration(String),

    /// Start does not strictly precede end.
    #[error("start must be before end")]
    TimeOrderError,

    /// Bridge marker placed exactly on an interval boundary.
    #[error("Bridge {bridge_id} coincides with a boundary of interval {interval_id}")]
    BoundaryConflict {
        bridge_id: String,
        interval_id: String,
    },

    /// Interval or bridge id reused where uniqueness is required.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Interval not found by id.
    #[error("Interval {0} not found")]
    IntervalNotFound(String),

    /// Bridge marker not found by id.
    #[error("Bridge {0} not found")]
    BridgeNotFound(String),

    /// Constraint references a time point that is not in the network.
    #[error("Time point {0} is not in the network")]
    UnknownTimePoint(String),

    /// Label collides with the constant-work dummy pool.
    #[error("Label {0} is reserved for the constant-work pool")]
    ReservedLabel(String),

    /// State transition applied to a participant variant that cannot take it.
    #[error("Participant {id} cannot transition: {reason}")]
    InvalidTransition { id: String, reason: String },

    /// Time-point capacity exceeded.
    #[error("Network is at capacity ({0} time points)")]
    TimepointsExhausted(usize),

    /// The solver reported the network inconsistent.
    #[error("STN is unsatisfiable")]
    Unsatisfiable,

    /// The solver did not respond within the timeout.
    #[error("Solver timed out after {0:?}")]
    SolverTimeout(std::time::Duration),

    /// Participant failed shape validation.
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),

    /// Interval failed shape validation at a boundary.
    #[error("Invalid interval: {0}")]
    InvalidIntervalSpec(String),

    /// Timestamp carries no timezone.
    #[error("Timestamp {0:?} has no timezone")]
    NaiveTimestamp(String),

    /// Timestamp could not be parsed or is out of range.
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// ISO-8601 duration could not be parsed.
    #[error("Invalid ISO-8601 duration {0:?}")]
    InvalidDuration(String),

    /// Plan file could not be decoded.
    #[error("Invalid plan file: {0}")]
    InvalidPlan(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for timeweave operations.
pub type TemporalResult<T> = Result<T, TemporalError>;
