//! The network structure — time points, constraints, unit, and LOD.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::relations::lowering::validate_interval_duration;
use crate::types::{
    end_label, start_label, Interval, LodLevel, TemporalError, TemporalResult, TimeUnit,
};

use super::solver::StnSolver;

/// Default capacity for the time-point set.
pub const DEFAULT_MAX_TIMEPOINTS: usize = 64;

/// Prefix for the constant-work dummy pool. Real labels must not use it.
const DUMMY_PREFIX: &str = "__cw_";

/// Inclusive distance bound `lo ≤ t(to) − t(from) ≤ hi`, in network ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bound {
    pub lo: i64,
    pub hi: i64,
}

impl Bound {
    /// The micro-range standing in for exact equality.
    pub const MICRO: Bound = Bound { lo: -1, hi: 1 };

    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    /// The same bound seen from the opposite direction.
    pub fn negated(&self) -> Self {
        Self {
            lo: -self.hi,
            hi: -self.lo,
        }
    }

    /// Intersection with another bound on the same pair; None when empty.
    pub fn intersect(&self, other: &Bound) -> Option<Bound> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        (lo <= hi).then_some(Bound { lo, hi })
    }

    /// Scale by `numerator / denominator`, rounding lo down and hi up so the
    /// scaled bound contains every assignment the original admitted.
    pub fn rescaled(&self, numerator: i64, denominator: i64) -> Bound {
        Bound {
            lo: scale_floor(self.lo, numerator, denominator),
            hi: scale_ceil(self.hi, numerator, denominator),
        }
    }

    pub fn width(&self) -> i64 {
        self.hi - self.lo
    }
}

fn scale_floor(value: i64, numerator: i64, denominator: i64) -> i64 {
    let product = value as i128 * numerator as i128;
    product.div_euclid(denominator as i128) as i64
}

fn scale_ceil(value: i64, numerator: i64, denominator: i64) -> i64 {
    let product = value as i128 * numerator as i128;
    (-(-product).div_euclid(denominator as i128)) as i64
}

/// Options for constructing an [`Stn`].
#[derive(Debug, Clone, Serialize)]
pub struct StnOptions {
    /// Base unit of the network's integer ticks.
    pub time_unit: TimeUnit,
    /// Resolution multiplier applied to every tick.
    pub lod_level: LodLevel,
    /// Hard cap on the number of time points.
    pub max_timepoints: usize,
    /// Pre-pad the point set with dummies so solver cost is
    /// input-independent up to the cap.
    pub constant_work_enabled: bool,
}

impl Default for StnOptions {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::default(),
            lod_level: LodLevel::default(),
            max_timepoints: DEFAULT_MAX_TIMEPOINTS,
            constant_work_enabled: false,
        }
    }
}

/// A Simple Temporal Network: labelled time points and a matrix of integer
/// distance bounds between them, in `time_unit × resolution` ticks.
#[derive(Debug, Clone, Serialize)]
pub struct Stn {
    time_points: BTreeSet<String>,
    #[serde(serialize_with = "serialize_constraints")]
    constraints: BTreeMap<(String, String), Bound>,
    /// None until solved. Once false, sticky until the network is rebuilt.
    consistent: Option<bool>,
    time_unit: TimeUnit,
    lod_level: LodLevel,
    max_timepoints: usize,
    constant_work_enabled: bool,
    /// Mirrored intervals backing the interval-level queries.
    intervals: BTreeMap<String, Interval>,
    /// Offsets assigned by the last successful solve.
    solved_times: Option<BTreeMap<String, i64>>,
    /// Point partition recorded by timeline segmentation.
    segments: Vec<Vec<String>>,
}

fn serialize_constraints<S>(
    constraints: &BTreeMap<(String, String), Bound>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(
        constraints
            .iter()
            .map(|((from, to), bound)| (from, to, bound.lo, bound.hi)),
    )
}

impl Stn {
    /// Create a fresh network.
    ///
    /// With constant work enabled the point set is eagerly padded to
    /// `max_timepoints` with self-looped dummies, so solver work does not
    /// depend on how many real intervals are present.
    pub fn new(options: StnOptions) -> Self {
        let mut stn = Self {
            time_points: BTreeSet::new(),
            constraints: BTreeMap::new(),
            consistent: None,
            time_unit: options.time_unit,
            lod_level: options.lod_level,
            max_timepoints: options.max_timepoints,
            constant_work_enabled: options.constant_work_enabled,
            intervals: BTreeMap::new(),
            solved_times: None,
            segments: Vec::new(),
        };
        if stn.constant_work_enabled {
            stn.replenish_dummies();
        }
        stn
    }

    /// Fresh network with default options.
    pub fn with_defaults() -> Self {
        Self::new(StnOptions::default())
    }

    /// The options this network was built with.
    pub fn options(&self) -> StnOptions {
        StnOptions {
            time_unit: self.time_unit,
            lod_level: self.lod_level,
            max_timepoints: self.max_timepoints,
            constant_work_enabled: self.constant_work_enabled,
        }
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn lod_level(&self) -> LodLevel {
        self.lod_level
    }

    /// The tick multiplier of the current LOD level.
    pub fn lod_resolution(&self) -> i64 {
        self.lod_level.resolution()
    }

    pub fn max_timepoints(&self) -> usize {
        self.max_timepoints
    }

    pub fn constant_work_enabled(&self) -> bool {
        self.constant_work_enabled
    }

    /// Tri-state consistency: None until solved.
    pub fn consistent(&self) -> Option<bool> {
        self.consistent
    }

    /// Offsets from the last successful solve, in unit × resolution ticks.
    pub fn solved_times(&self) -> Option<&BTreeMap<String, i64>> {
        self.solved_times.as_ref()
    }

    /// All point labels, dummies included.
    pub fn time_points(&self) -> &BTreeSet<String> {
        &self.time_points
    }

    /// All constraints.
    pub fn constraints(&self) -> &BTreeMap<(String, String), Bound> {
        &self.constraints
    }

    /// The bound between two points, if one is set.
    pub fn constraint(&self, from: &str, to: &str) -> Option<Bound> {
        self.constraints
            .get(&(from.to_string(), to.to_string()))
            .copied()
    }

    /// Number of real (non-dummy) time points.
    pub fn real_point_count(&self) -> usize {
        self.time_points
            .iter()
            .filter(|p| !p.starts_with(DUMMY_PREFIX))
            .count()
    }

    /// The point partition recorded by timeline segmentation.
    pub fn segments(&self) -> &[Vec<String>] {
        &self.segments
    }

    /// Record a point partition produced by segmentation.
    pub fn set_segments(&mut self, segments: Vec<Vec<String>>) {
        self.segments = segments;
    }

    /// Add a labelled time point.
    ///
    /// Dummy-pool labels are reserved; adding an existing label is a no-op.
    /// In constant-work mode a dummy is consumed to keep the set size fixed.
    pub fn add_time_point(&mut self, label: impl Into<String>) -> TemporalResult<()> {
        let label = label.into();
        if label.starts_with(DUMMY_PREFIX) {
            return Err(TemporalError::ReservedLabel(label));
        }
        if self.time_points.contains(&label) {
            return Ok(());
        }
        if self.real_point_count() >= self.max_timepoints {
            return Err(TemporalError::TimepointsExhausted(self.max_timepoints));
        }
        if self.constant_work_enabled {
            self.consume_dummy();
        }
        self.time_points.insert(label);
        self.invalidate_solution();
        Ok(())
    }

    fn consume_dummy(&mut self) {
        let dummy = self
            .time_points
            .iter()
            .find(|p| p.starts_with(DUMMY_PREFIX))
            .cloned();
        if let Some(label) = dummy {
            self.time_points.remove(&label);
            self.constraints.remove(&(label.clone(), label));
        }
    }

    fn replenish_dummies(&mut self) {
        let mut k = 0;
        while self.time_points.len() < self.max_timepoints {
            let label = format!("{}{}", DUMMY_PREFIX, k);
            if !self.time_points.contains(&label) {
                self.constraints
                    .insert((label.clone(), label.clone()), Bound::MICRO);
                self.time_points.insert(label);
            }
            k += 1;
        }
    }

    /// Add (or tighten) a constraint between two known points.
    ///
    /// A repeated pair is intersected with the existing bound; an empty
    /// intersection marks the network inconsistent and leaves the stored
    /// bound untouched.
    pub fn add_constraint(&mut self, from: &str, to: &str, bound: Bound) -> TemporalResult<()> {
        if !self.time_points.contains(from) {
            return Err(TemporalError::UnknownTimePoint(from.to_string()));
        }
        if !self.time_points.contains(to) {
            return Err(TemporalError::UnknownTimePoint(to.to_string()));
        }
        let key = (from.to_string(), to.to_string());
        let merged = match self.constraints.get(&key) {
            Some(existing) => match existing.intersect(&bound) {
                Some(b) => b,
                None => {
                    log::warn!(
                        "constraint ({} -> {}) intersects to empty; network is inconsistent",
                        from,
                        to
                    );
                    self.consistent = Some(false);
                    return Ok(());
                }
            },
            None => bound,
        };
        self.constraints.insert(key, merged);
        self.invalidate_solution();
        Ok(())
    }

    /// Mirror an interval as two points plus a duration constraint.
    ///
    /// Admission is gated on duration validation in the network's unit: an
    /// interval shorter than one tick is refused here, before a solver can
    /// ever see it. The duration is scaled to ticks and carried as a
    /// micro-widened bound, matching the no-zero-width contract of the
    /// lowering layer.
    pub fn add_interval(&mut self, interval: &Interval) -> TemporalResult<()> {
        validate_interval_duration(interval, self.time_unit)?;
        if self.intervals.contains_key(&interval.id) {
            return Err(TemporalError::DuplicateId(interval.id.clone()));
        }
        if self.real_point_count() + 2 > self.max_timepoints {
            return Err(TemporalError::TimepointsExhausted(self.max_timepoints));
        }
        let (start, end, _) = interval.to_stn_points(self.time_unit)?;
        let duration = interval.duration_in_unit(self.time_unit).unwrap_or(0.0);
        let ticks = (duration * self.lod_resolution() as f64).round() as i64;

        self.add_time_point(start.clone())?;
        self.add_time_point(end.clone())?;
        self.add_constraint(&start, &end, Bound::new(ticks - 1, ticks + 1))?;
        self.intervals
            .insert(interval.id.clone(), interval.clone());
        Ok(())
    }

    /// Re-mirror a changed interval. Constraints touching its old endpoints
    /// are dropped along with the old mirror.
    pub fn update_interval(&mut self, interval: &Interval) -> TemporalResult<()> {
        if !self.intervals.contains_key(&interval.id) {
            return Err(TemporalError::IntervalNotFound(interval.id.clone()));
        }
        self.remove_interval(&interval.id)?;
        self.add_interval(interval)
    }

    /// Remove an interval's mirror: both points and every constraint that
    /// touches them.
    pub fn remove_interval(&mut self, id: &str) -> TemporalResult<Interval> {
        let removed = self
            .intervals
            .remove(id)
            .ok_or_else(|| TemporalError::IntervalNotFound(id.to_string()))?;
        let start = start_label(id);
        let end = end_label(id);
        self.time_points.remove(&start);
        self.time_points.remove(&end);
        self.constraints
            .retain(|(from, to), _| from != &start && from != &end && to != &start && to != &end);
        if self.constant_work_enabled {
            self.replenish_dummies();
        }
        self.invalidate_solution();
        Ok(removed)
    }

    /// A mirrored interval by id.
    pub fn get_interval(&self, id: &str) -> Option<&Interval> {
        self.intervals.get(id)
    }

    /// All mirrored intervals, ordered by id.
    pub fn get_intervals(&self) -> Vec<&Interval> {
        self.intervals.values().collect()
    }

    /// Number of mirrored intervals.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// A structural change makes any earlier solution stale; a known-false
    /// network stays false until rebuilt.
    fn invalidate_solution(&mut self) {
        if self.consistent == Some(true) {
            self.consistent = None;
        }
        self.solved_times = None;
    }

    /// Solve the network, returning a new STN carrying the outcome.
    ///
    /// The input is untouched; a known-inconsistent network short-circuits.
    pub fn solve(&self, solver: &dyn StnSolver, timeout: Duration) -> TemporalResult<Stn> {
        if self.consistent == Some(false) {
            return Err(TemporalError::Unsatisfiable);
        }
        let outcome = solver.solve(self, timeout)?;
        if !outcome.consistent {
            return Err(TemporalError::Unsatisfiable);
        }
        let mut solved = self.clone();
        solved.consistent = Some(true);
        solved.solved_times = Some(outcome.solved_times);
        Ok(solved)
    }

    /// Re-express every bound at a new LOD resolution.
    ///
    /// Rounding is outward on `hi` and inward (downward) on `lo`, so every
    /// assignment the original admitted survives the rescale.
    pub fn rescale_lod(&self, new_level: LodLevel) -> Stn {
        let old_resolution = self.lod_resolution();
        let new_resolution = new_level.resolution();
        let mut rescaled = self.clone();
        rescaled.lod_level = new_level;
        if old_resolution == new_resolution {
            return rescaled;
        }
        for bound in rescaled.constraints.values_mut() {
            *bound = bound.rescaled(new_resolution, old_resolution);
        }
        rescaled.solved_times = None;
        rescaled
    }

    /// Re-express every bound in a new time unit, with the same widening
    /// rounding as [`Stn::rescale_lod`].
    pub fn convert_units(&self, new_unit: TimeUnit) -> Stn {
        let old_micros = self.time_unit.micros();
        let new_micros = new_unit.micros();
        let mut converted = self.clone();
        converted.time_unit = new_unit;
        if old_micros == new_micros {
            return converted;
        }
        for bound in converted.constraints.values_mut() {
            *bound = bound.rescaled(old_micros, new_micros);
        }
        converted.solved_times = None;
        converted
    }
}
