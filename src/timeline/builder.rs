//! Stateful timeline construction with automatic bridge insertion.

use crate::stn::StnOptions;
use crate::types::{
    format_instant, BridgeKind, BridgeMarker, Instant, Interval, TemporalResult,
};

use super::Timeline;

/// Default spacing between automatic bridges, in seconds.
const DEFAULT_BRIDGE_SPACING_SECS: i64 = 1_800;

/// Builds a [`Timeline`], optionally inserting synchronization markers as
/// intervals accumulate.
///
/// With auto-bridging on, the first added interval anchors `auto_bridge_1`
/// at its own start; afterwards any interval starting at least the
/// configured spacing past the last bridge inserts a new marker at the
/// midpoint between that bridge and the interval's start.
pub struct TimelineBuilder {
    timeline: Timeline,
    auto_bridges: bool,
    bridge_spacing_secs: i64,
    last_bridge_time: Option<Instant>,
    bridge_counter: usize,
}

impl TimelineBuilder {
    /// Builder over an empty timeline with default network options.
    pub fn new() -> Self {
        Self::with_options(StnOptions::default())
    }

    /// Builder over an empty timeline with explicit network options.
    pub fn with_options(options: StnOptions) -> Self {
        Self {
            timeline: Timeline::with_options(options),
            auto_bridges: false,
            bridge_spacing_secs: DEFAULT_BRIDGE_SPACING_SECS,
            last_bridge_time: None,
            bridge_counter: 0,
        }
    }

    /// Enable automatic bridge insertion every `spacing_seconds`.
    pub fn auto_bridges(mut self, spacing_seconds: i64) -> Self {
        self.auto_bridges = true;
        self.bridge_spacing_secs = spacing_seconds;
        self
    }

    /// Add one interval, inserting an automatic bridge first when due.
    pub fn add_interval(&mut self, interval: Interval) -> TemporalResult<()> {
        if self.auto_bridges {
            if let Some(start) = interval.start_time {
                self.maybe_insert_bridge(start)?;
            }
        }
        self.timeline.add_interval(interval)
    }

    /// Add a batch of intervals, sorted by start time first so the spacing
    /// rule applies cumulatively.
    pub fn add_intervals(&mut self, mut intervals: Vec<Interval>) -> TemporalResult<()> {
        intervals.sort_by_key(|i| i.start_time);
        for interval in intervals {
            self.add_interval(interval)?;
        }
        Ok(())
    }

    /// Add a manual bridge marker. Its position advances the auto-bridge
    /// cursor.
    pub fn add_bridge(&mut self, bridge: BridgeMarker) -> TemporalResult<()> {
        let position = bridge.resolved_position();
        self.timeline.add_bridge(bridge)?;
        if let Some(p) = position {
            self.last_bridge_time = Some(match self.last_bridge_time {
                Some(last) => last.max(p),
                None => p,
            });
        }
        Ok(())
    }

    fn maybe_insert_bridge(&mut self, interval_start: Instant) -> TemporalResult<()> {
        let position = match self.last_bridge_time {
            // First interval anchors the first bridge at its own start
            None => interval_start,
            Some(last) => {
                let gap = (interval_start - last).num_seconds();
                if gap < self.bridge_spacing_secs {
                    return Ok(());
                }
                last + (interval_start - last) / 2
            }
        };
        self.bridge_counter += 1;
        let id = format!("auto_bridge_{}", self.bridge_counter);
        self.timeline.add_bridge(BridgeMarker::at(
            id.clone(),
            BridgeKind::AutoGenerated,
            position,
        ))?;
        log::debug!("inserted {} at {}", id, format_instant(position));
        self.last_bridge_time = Some(position);
        Ok(())
    }

    /// The timeline built so far.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Finish and hand over the timeline.
    pub fn build(self) -> Timeline {
        self.timeline
    }
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
