//! The timeline composite.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::relations::{constraint_between, AllenRelation, RelationCode};
use crate::stn::{Bound, Stn, StnOptions, StnSolver};
use crate::types::{
    end_label, format_instant, start_label, truncate_to_minute, BridgeMarker, BridgePosition,
    Instant, Interval, Metadata, SemanticRef, TemporalError, TemporalResult,
};

/// Owns a set of intervals, a set of bridge markers, and one STN.
///
/// Every interval is mirrored into the network as two time points plus a
/// duration constraint; removing the interval removes the mirror and every
/// constraint touching it. Participants referenced by intervals are not
/// lifetime-scoped to the timeline.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    intervals: BTreeMap<String, Interval>,
    bridges: BTreeMap<String, BridgeMarker>,
    stn: Stn,
    /// Free-form metadata. Segmentation writes its bookkeeping here.
    pub metadata: Metadata,
}

impl Timeline {
    /// Empty timeline with default network options.
    pub fn new() -> Self {
        Self::with_options(StnOptions::default())
    }

    /// Empty timeline with explicit network options.
    pub fn with_options(options: StnOptions) -> Self {
        Self {
            intervals: BTreeMap::new(),
            bridges: BTreeMap::new(),
            stn: Stn::new(options),
            metadata: Metadata::new(),
        }
    }

    /// The network mirror.
    pub fn stn(&self) -> &Stn {
        &self.stn
    }

    pub(crate) fn stn_mut(&mut self) -> &mut Stn {
        &mut self.stn
    }

    /// Number of owned intervals.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of bridge markers.
    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    /// An interval by id.
    pub fn get_interval(&self, id: &str) -> Option<&Interval> {
        self.intervals.get(id)
    }

    /// All intervals, ordered by id.
    pub fn get_intervals(&self) -> Vec<&Interval> {
        self.intervals.values().collect()
    }

    /// Add an interval, mirroring it into the network when it is anchored.
    /// Open-ended and floating intervals are held but not admitted to the
    /// STN; an anchored interval shorter than one tick of the network's
    /// unit is refused with `ZeroDurationViolation`.
    pub fn add_interval(&mut self, interval: Interval) -> TemporalResult<()> {
        if self.intervals.contains_key(&interval.id) {
            return Err(TemporalError::DuplicateId(interval.id.clone()));
        }
        if interval.is_anchored() {
            self.stn.add_interval(&interval)?;
        }
        self.intervals.insert(interval.id.clone(), interval);
        Ok(())
    }

    /// Add a batch of intervals atomically: on any failure the timeline is
    /// left unchanged.
    pub fn add_intervals(&mut self, intervals: Vec<Interval>) -> TemporalResult<()> {
        let mut staged = self.clone();
        for interval in intervals {
            staged.add_interval(interval)?;
        }
        *self = staged;
        Ok(())
    }

    /// Replace an interval and refresh its mirror. Relation constraints
    /// referencing the old endpoints are dropped with the old mirror.
    pub fn update_interval(&mut self, interval: Interval) -> TemporalResult<()> {
        if !self.intervals.contains_key(&interval.id) {
            return Err(TemporalError::IntervalNotFound(interval.id.clone()));
        }
        let mirrored = self.stn.get_interval(&interval.id).is_some();
        match (mirrored, interval.is_anchored()) {
            (true, true) => self.stn.update_interval(&interval)?,
            (true, false) => {
                self.stn.remove_interval(&interval.id)?;
            }
            (false, true) => self.stn.add_interval(&interval)?,
            (false, false) => {}
        }
        self.intervals.insert(interval.id.clone(), interval);
        Ok(())
    }

    /// Remove an interval and its mirror, dropping every constraint that
    /// touches its endpoints.
    pub fn remove_interval(&mut self, id: &str) -> TemporalResult<Interval> {
        let removed = self
            .intervals
            .remove(id)
            .ok_or_else(|| TemporalError::IntervalNotFound(id.to_string()))?;
        if self.stn.get_interval(id).is_some() {
            self.stn.remove_interval(id)?;
        }
        Ok(removed)
    }

    /// Pass a raw bound through to the network. `from` and `to` are endpoint
    /// labels such as `"{id}_start"`, in network ticks.
    pub fn add_constraint(&mut self, from: &str, to: &str, bound: Bound) -> TemporalResult<()> {
        self.stn.add_constraint(from, to, bound)
    }

    /// Classify the relation between two owned intervals and lower it into
    /// the network at its canonical endpoints, scaled to the network's LOD.
    pub fn relate(&mut self, a_id: &str, b_id: &str) -> TemporalResult<RelationCode> {
        let a = self
            .intervals
            .get(a_id)
            .ok_or_else(|| TemporalError::IntervalNotFound(a_id.to_string()))?
            .clone();
        let b = self
            .intervals
            .get(b_id)
            .ok_or_else(|| TemporalError::IntervalNotFound(b_id.to_string()))?
            .clone();
        let code = crate::relations::classify_relation(&a, &b)?;
        let (from, to, bound) = constraint_between(&a, &b, self.stn.time_unit())?;
        let resolution = self.stn.lod_resolution();
        self.stn.add_constraint(
            &from,
            &to,
            Bound::new(bound.lo * resolution, bound.hi * resolution),
        )?;
        Ok(code)
    }

    /// Add a bridge marker. The id must be unique and an absolute position
    /// must not coincide with any interval boundary.
    pub fn add_bridge(&mut self, bridge: BridgeMarker) -> TemporalResult<()> {
        if self.bridges.contains_key(&bridge.id) {
            return Err(TemporalError::DuplicateId(bridge.id.clone()));
        }
        self.check_boundary_conflict(&bridge)?;
        self.bridges.insert(bridge.id.clone(), bridge);
        Ok(())
    }

    /// Replace an existing bridge marker, re-validating its placement.
    pub fn update_bridge(&mut self, bridge: BridgeMarker) -> TemporalResult<()> {
        if !self.bridges.contains_key(&bridge.id) {
            return Err(TemporalError::BridgeNotFound(bridge.id.clone()));
        }
        self.check_boundary_conflict(&bridge)?;
        self.bridges.insert(bridge.id.clone(), bridge);
        Ok(())
    }

    /// Remove a bridge marker.
    pub fn remove_bridge(&mut self, id: &str) -> TemporalResult<BridgeMarker> {
        self.bridges
            .remove(id)
            .ok_or_else(|| TemporalError::BridgeNotFound(id.to_string()))
    }

    /// A bridge marker by id.
    pub fn get_bridge(&self, id: &str) -> Option<&BridgeMarker> {
        self.bridges.get(id)
    }

    /// All bridge markers, sorted by resolved position; unresolved semantic
    /// markers sort last.
    pub fn get_bridges(&self) -> Vec<&BridgeMarker> {
        let mut all: Vec<&BridgeMarker> = self.bridges.values().collect();
        all.sort_by_key(|b| (b.resolved_position().is_none(), b.resolved_position()));
        all
    }

    /// Resolved bridge positions, ascending.
    pub fn bridge_positions(&self) -> Vec<Instant> {
        let mut positions: Vec<Instant> = self
            .bridges
            .values()
            .filter_map(|b| b.resolved_position())
            .collect();
        positions.sort();
        positions
    }

    /// Bridge markers whose resolved position falls in `[start, end)`.
    pub fn bridges_in_range(&self, start: Instant, end: Instant) -> Vec<&BridgeMarker> {
        let mut hits: Vec<&BridgeMarker> = self
            .bridges
            .values()
            .filter(|b| {
                b.resolved_position()
                    .map(|p| start <= p && p < end)
                    .unwrap_or(false)
            })
            .collect();
        hits.sort_by_key(|b| b.resolved_position());
        hits
    }

    /// Fill `computed_position` on semantic bridge markers from the
    /// timeline's bounds or the referenced interval. Markers whose reference
    /// cannot be resolved yet are skipped.
    pub fn resolve_bridge_positions(&mut self) {
        let timeline_bounds = self.bounds();
        let mut updates: Vec<(String, Instant)> = Vec::new();
        for bridge in self.bridges.values() {
            let BridgePosition::Semantic {
                relation,
                reference,
            } = &bridge.position
            else {
                continue;
            };
            let range = match reference {
                SemanticRef::Timeline => timeline_bounds,
                SemanticRef::Interval(id) => {
                    self.intervals.get(id).and_then(|i| i.bounds())
                }
            };
            let Some((range_start, range_end)) = range else {
                log::debug!("bridge {} reference not resolvable yet", bridge.id);
                continue;
            };
            updates.push((
                bridge.id.clone(),
                semantic_position(*relation, range_start, range_end),
            ));
        }
        for (id, position) in updates {
            if let Some(bridge) = self.bridges.get_mut(&id) {
                bridge.computed_position = Some(position);
            }
        }
    }

    fn check_boundary_conflict(&self, bridge: &BridgeMarker) -> TemporalResult<()> {
        let BridgePosition::Absolute(position) = &bridge.position else {
            return Ok(());
        };
        for interval in self.intervals.values() {
            if interval.start_time == Some(*position) || interval.end_time == Some(*position) {
                return Err(TemporalError::BoundaryConflict {
                    bridge_id: bridge.id.clone(),
                    interval_id: interval.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Min start / max end over the anchored intervals.
    pub fn bounds(&self) -> Option<(Instant, Instant)> {
        let mut extremes: Option<(Instant, Instant)> = None;
        for (start, end) in self.intervals.values().filter_map(|i| i.bounds()) {
            extremes = Some(match extremes {
                None => (start, end),
                Some((min_start, max_end)) => (min_start.min(start), max_end.max(end)),
            });
        }
        extremes
    }

    /// Base instant for mapping solved offsets back to wall-clock times:
    /// the earliest interval start, truncated to its minute.
    fn base_instant(&self) -> Option<Instant> {
        self.intervals
            .values()
            .filter_map(|i| i.start_time)
            .min()
            .map(truncate_to_minute)
    }

    /// Solve the network and map assigned offsets back onto interval
    /// instants, yielding a new timeline. On failure the original value is
    /// untouched.
    pub fn solve(&self, solver: &dyn StnSolver, timeout: Duration) -> TemporalResult<Timeline> {
        let solved_stn = self.stn.solve(solver, timeout)?;
        let mut solved = self.clone();
        solved.stn = solved_stn;

        let Some(base) = self.base_instant() else {
            return Ok(solved);
        };
        let Some(times) = solved.stn.solved_times().cloned() else {
            return Ok(solved);
        };
        let resolution = solved.stn.lod_resolution() as f64;
        let unit_micros = solved.stn.time_unit().micros() as f64;
        let to_instant = |ticks: i64| {
            let micros = (ticks as f64 / resolution * unit_micros).round() as i64;
            base.checked_add_signed(chrono::Duration::microseconds(micros))
        };

        for (id, interval) in solved.intervals.iter_mut() {
            if interval.is_fixed_schedule() {
                continue;
            }
            let (Some(&start_ticks), Some(&end_ticks)) =
                (times.get(&start_label(id)), times.get(&end_label(id)))
            else {
                continue;
            };
            if let (Some(new_start), Some(new_end)) =
                (to_instant(start_ticks), to_instant(end_ticks))
            {
                interval.start_time = Some(new_start);
                interval.end_time = Some(new_end);
            }
        }
        log::info!(
            "solved timeline: {} intervals anchored from {}",
            solved.intervals.len(),
            format_instant(base)
        );
        Ok(solved)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock position for a semantic bridge relative to a resolved range.
fn semantic_position(relation: AllenRelation, start: Instant, end: Instant) -> Instant {
    use AllenRelation::*;
    match relation {
        // A point marker "meets" a range at its opening boundary
        Before | Meets | Starts | StartedBy => start,
        After | MetBy | Finishes | FinishedBy => end,
        _ => start + (end - start) / 2,
    }
}
