//! Lowering Allen relations into numeric STN bound pairs.
//!
//! Downstream solvers treat zero-width bounds as ill-posed, so every fixed
//! equality becomes the micro-range `(-1, 1)`: the intervals stay
//! effectively simultaneous while the network remains solvable.

use crate::stn::Bound;
use crate::types::{
    end_label, micros_in_unit, start_label, Instant, Interval, TemporalError, TemporalResult,
    TimeUnit,
};

use super::classify::{classify_relation, RelationCode};

/// Validate that an interval has a usable positive duration in `unit`.
///
/// An interval shorter than one tick of the target unit cannot be
/// represented in the network and is refused before the solver ever sees
/// it. Coarsening the unit can only shrink the tick count, so a refusal is
/// stable under unit coarsening.
pub fn validate_interval_duration(interval: &Interval, unit: TimeUnit) -> TemporalResult<()> {
    let duration = interval.duration_in_unit(unit).ok_or_else(|| {
        TemporalError::InvalidIntervalSpec(format!(
            "interval {} is not fully anchored",
            interval.id
        ))
    })?;
    if duration < 0.0 {
        return Err(TemporalError::NegativeDuration(interval.id.clone()));
    }
    if duration < 1.0 {
        return Err(TemporalError::ZeroDurationViolation {
            id: interval.id.clone(),
            unit,
        });
    }
    Ok(())
}

/// Keep only the intervals that pass duration validation for `unit`.
pub fn filter_valid_intervals(intervals: &[Interval], unit: TimeUnit) -> Vec<Interval> {
    intervals
        .iter()
        .filter(|i| validate_interval_duration(i, unit).is_ok())
        .cloned()
        .collect()
}

/// Signed whole-tick distance from `from` to `to` in `unit`.
fn ticks(from: Instant, to: Instant, unit: TimeUnit) -> i64 {
    let micros = (to - from).num_microseconds().unwrap_or(i64::MAX / 2);
    micros_in_unit(micros, unit).round() as i64
}

/// Lower the relation between two intervals into an STN bound pair in raw
/// `unit` ticks.
///
/// Both intervals must have positive duration in `unit`. No result ever has
/// `lo == hi`; the minimal width is 2.
pub fn generate_stn_constraint(
    a: &Interval,
    b: &Interval,
    unit: TimeUnit,
) -> TemporalResult<Bound> {
    validate_interval_duration(a, unit)?;
    validate_interval_duration(b, unit)?;
    let code = classify_relation(a, b)?;
    let (a_bounds, b_bounds) = match (a.bounds(), b.bounds()) {
        (Some(ab), Some(bb)) => (ab, bb),
        // Unreachable: duration validation requires anchored intervals.
        _ => {
            return Err(TemporalError::InvalidIntervalSpec(format!(
                "intervals {} and {} must be fully anchored",
                a.id, b.id
            )))
        }
    };
    Ok(widen_if_degenerate(lower_relation(
        a_bounds, b_bounds, code, unit,
    )))
}

fn lower_relation(
    (a_start, a_end): (Instant, Instant),
    (b_start, b_end): (Instant, Instant),
    code: RelationCode,
    unit: TimeUnit,
) -> Bound {
    match code {
        RelationCode::Eq
        | RelationCode::AdjF
        | RelationCode::AdjB
        | RelationCode::StartAlign
        | RelationCode::StartExtend
        | RelationCode::EndAlign
        | RelationCode::EndExtend => Bound::MICRO,
        RelationCode::Precedes => {
            let gap = ticks(a_end, b_start, unit);
            if gap == 0 {
                // The gap rounds away in this unit: effectively adjacent
                Bound::MICRO
            } else {
                Bound::new((gap - 1).max(0), gap + 1)
            }
        }
        RelationCode::Follows => {
            let gap = ticks(b_end, a_start, unit);
            Bound::new(-gap - 1, (-gap + 1).max(1))
        }
        RelationCode::OverlapF => overlap_bound(ticks(b_start, a_end, unit)),
        RelationCode::OverlapB => overlap_bound(ticks(a_start, b_end, unit)).negated(),
        RelationCode::Within => within_bound(a_start, a_end, b_start, b_end, unit),
        RelationCode::Contains => within_bound(b_start, b_end, a_start, a_end, unit).negated(),
    }
}

/// Bound for an overlap of `depth` ticks; a zero-tick overlap collapses to
/// the micro-range.
fn overlap_bound(depth: i64) -> Bound {
    if depth == 0 {
        Bound::MICRO
    } else {
        Bound::new((depth - 1).max(0), depth + 1)
    }
}

/// Bound pinning the inner interval's offsets within the outer one.
fn within_bound(
    inner_start: Instant,
    inner_end: Instant,
    outer_start: Instant,
    outer_end: Instant,
    unit: TimeUnit,
) -> Bound {
    let start_offset = ticks(outer_start, inner_start, unit);
    let end_offset = ticks(inner_end, outer_end, unit);
    Bound::new(start_offset, start_offset + end_offset)
}

/// A bound narrower than the micro-range would read as ill-posed downstream;
/// widen symmetrically so the admitted value set only grows.
fn widen_if_degenerate(bound: Bound) -> Bound {
    if bound.width() < 2 {
        Bound::new(bound.lo - 1, bound.hi + 1)
    } else {
        bound
    }
}

/// Lower a relation and name the canonical endpoint pair the bound applies
/// between, as `(from, to, bound)` with `lo ≤ t(to) − t(from) ≤ hi`.
pub fn constraint_between(
    a: &Interval,
    b: &Interval,
    unit: TimeUnit,
) -> TemporalResult<(String, String, Bound)> {
    let code = classify_relation(a, b)?;
    let bound = generate_stn_constraint(a, b, unit)?;
    let (from, to) = match code {
        // Gap or adjacency between a's end and b's start
        RelationCode::AdjF | RelationCode::Precedes => (end_label(&a.id), start_label(&b.id)),
        // Negated views anchored on b's end
        RelationCode::AdjB | RelationCode::OverlapB => (end_label(&b.id), start_label(&a.id)),
        RelationCode::Follows => (start_label(&a.id), end_label(&b.id)),
        RelationCode::OverlapF => (start_label(&b.id), end_label(&a.id)),
        RelationCode::EndAlign | RelationCode::EndExtend => (end_label(&a.id), end_label(&b.id)),
        // Start-anchored relations measure a's start from b's start
        RelationCode::Eq
        | RelationCode::StartAlign
        | RelationCode::StartExtend
        | RelationCode::Within
        | RelationCode::Contains => (start_label(&b.id), start_label(&a.id)),
    };
    Ok((from, to, bound))
}
