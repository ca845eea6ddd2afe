//! Segmentation — projecting a timeline onto bridge-delimited ranges.
//!
//! Segmentation is read-only: the input timeline is untouched, each segment
//! is a fresh timeline with its own network, and an interval spanning a
//! bridge appears in every segment it overlaps.

use serde_json::json;

use crate::types::{
    format_instant, parse_instant, Instant, Interval, TemporalError, TemporalResult,
};

use super::Timeline;

/// A contiguous range delimited by bridge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Instant,
    pub end: Instant,
    /// The bridge position that opened this range; None for the first.
    pub bridge_before: Option<Instant>,
}

/// Min start / max end over the timeline's anchored intervals.
pub fn get_timeline_bounds(timeline: &Timeline) -> Option<(Instant, Instant)> {
    timeline.bounds()
}

/// Pair the boundary sequence `[start, bridges…, end]` into consecutive
/// ranges. Bridge positions outside the bounds are ignored.
pub fn create_time_ranges(
    bounds: (Instant, Instant),
    bridge_positions: &[Instant],
) -> Vec<TimeRange> {
    let (start, end) = bounds;
    let mut boundaries = vec![start];
    boundaries.extend(
        bridge_positions
            .iter()
            .copied()
            .filter(|p| *p > start && *p < end),
    );
    boundaries.push(end);
    boundaries.sort();

    boundaries
        .windows(2)
        .enumerate()
        .map(|(i, pair)| TimeRange {
            start: pair[0],
            end: pair[1],
            bridge_before: (i > 0).then_some(pair[0]),
        })
        .collect()
}

/// Whether an anchored interval overlaps `[range.start, range.end)`.
pub fn interval_in_range(interval: &Interval, range: &TimeRange) -> bool {
    match interval.bounds() {
        Some((start, end)) => start < range.end && end > range.start,
        None => false,
    }
}

/// Project one range of a timeline into a fresh segment timeline.
///
/// `index` is the 1-based segment number recorded in the metadata.
pub fn create_segment(
    timeline: &Timeline,
    range: &TimeRange,
    index: usize,
) -> TemporalResult<Timeline> {
    let mut segment = Timeline::with_options(timeline.stn().options());
    for interval in timeline.get_intervals() {
        if interval_in_range(interval, range) {
            segment.add_interval(interval.clone())?;
        }
    }
    segment.metadata.insert("segment".to_string(), json!(index));
    segment.metadata.insert(
        "segment_start".to_string(),
        json!(format_instant(range.start)),
    );
    segment
        .metadata
        .insert("segment_end".to_string(), json!(format_instant(range.end)));
    segment.metadata.insert(
        "bridge_before".to_string(),
        match range.bridge_before {
            Some(p) => json!(format_instant(p)),
            None => serde_json::Value::Null,
        },
    );
    Ok(segment)
}

/// Split a timeline into per-range projections along its bridge markers.
///
/// Ranges that cover no interval are dropped; the kept segments are numbered
/// from 1. A timeline with no anchored intervals yields no segments.
pub fn segment_by_bridges(timeline: &Timeline) -> TemporalResult<Vec<Timeline>> {
    let Some(bounds) = get_timeline_bounds(timeline) else {
        return Ok(Vec::new());
    };
    let positions = timeline.bridge_positions();
    let ranges = create_time_ranges(bounds, &positions);

    let mut segments = Vec::new();
    for range in &ranges {
        if !timeline
            .get_intervals()
            .iter()
            .any(|i| interval_in_range(i, range))
        {
            continue;
        }
        segments.push(create_segment(timeline, range, segments.len() + 1)?);
    }
    log::debug!(
        "segmented timeline into {} segments along {} bridges",
        segments.len(),
        positions.len()
    );
    Ok(segments)
}

/// Record the point-label partition of a segmentation into the parent
/// timeline's network.
pub fn record_segmentation(timeline: &mut Timeline) -> TemporalResult<()> {
    let segments = segment_by_bridges(timeline)?;
    let partition: Vec<Vec<String>> = segments
        .iter()
        .map(|segment| segment.stn().time_points().iter().cloned().collect())
        .collect();
    timeline.stn_mut().set_segments(partition);
    Ok(())
}

/// Check that every segment is well-formed: non-empty, carrying range
/// metadata, with each interval overlapping the recorded range.
pub fn validate_segments(segments: &[Timeline]) -> TemporalResult<()> {
    for segment in segments {
        if segment.interval_count() == 0 {
            return Err(TemporalError::InvalidIntervalSpec(
                "segment holds no intervals".to_string(),
            ));
        }
        let range = segment_range(segment)?;
        for interval in segment.get_intervals() {
            if !interval_in_range(interval, &range) {
                return Err(TemporalError::InvalidIntervalSpec(format!(
                    "interval {} does not overlap its segment range",
                    interval.id
                )));
            }
        }
    }
    Ok(())
}

fn segment_range(segment: &Timeline) -> TemporalResult<TimeRange> {
    let read = |key: &str| -> TemporalResult<Instant> {
        let value = segment
            .metadata
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                TemporalError::InvalidIntervalSpec(format!("segment missing {} metadata", key))
            })?;
        parse_instant(value)
    };
    let bridge_before = segment
        .metadata
        .get("bridge_before")
        .and_then(|v| v.as_str())
        .map(parse_instant)
        .transpose()?;
    Ok(TimeRange {
        start: read("segment_start")?,
        end: read("segment_end")?,
        bridge_before,
    })
}
