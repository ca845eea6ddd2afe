//! Interval-level scheduling queries over the mirrored interval set.

use chrono::Duration;

use crate::types::{Instant, Interval};

use super::network::Stn;

impl Stn {
    /// Anchored intervals that strictly overlap the window `[start, end)`,
    /// ordered by start time.
    pub fn get_overlapping_intervals(&self, start: Instant, end: Instant) -> Vec<&Interval> {
        let mut hits: Vec<&Interval> = self
            .get_intervals()
            .into_iter()
            .filter(|i| match i.bounds() {
                Some((s, e)) => s < end && start < e,
                None => false,
            })
            .collect();
        hits.sort_by_key(|i| i.start_time);
        hits
    }

    /// Intervals that would conflict with a candidate placement at
    /// `[new_start, new_end)`.
    pub fn check_interval_conflicts(&self, new_start: Instant, new_end: Instant) -> Vec<&Interval> {
        self.get_overlapping_intervals(new_start, new_end)
    }

    /// Gaps of at least `duration` inside the window, as `(start, end)`
    /// pairs covering the whole free stretch.
    pub fn find_free_slots(
        &self,
        duration: Duration,
        window_start: Instant,
        window_end: Instant,
    ) -> Vec<(Instant, Instant)> {
        let mut slots = Vec::new();
        if window_start >= window_end {
            return slots;
        }

        let busy = self.merged_busy_ranges();
        let mut cursor = window_start;
        for (busy_start, busy_end) in busy {
            if busy_end <= cursor {
                continue;
            }
            if busy_start >= window_end {
                break;
            }
            if busy_start > cursor && busy_start - cursor >= duration {
                slots.push((cursor, busy_start));
            }
            if busy_end > cursor {
                cursor = busy_end;
            }
        }
        if cursor < window_end && window_end - cursor >= duration {
            slots.push((cursor, window_end));
        }
        slots
    }

    /// The earliest instant at or after `earliest` where `duration` fits
    /// without conflicting with any mirrored interval.
    pub fn find_next_available_slot(
        &self,
        duration: Duration,
        earliest: Instant,
    ) -> Option<Instant> {
        let mut cursor = earliest;
        for (busy_start, busy_end) in self.merged_busy_ranges() {
            if busy_end <= cursor {
                continue;
            }
            let fits_before = cursor.checked_add_signed(duration)?;
            if fits_before <= busy_start {
                return Some(cursor);
            }
            cursor = busy_end;
        }
        // Past the last busy block everything is free
        cursor.checked_add_signed(duration).map(|_| cursor)
    }

    /// Anchored interval extents, sorted and merged where they touch or
    /// overlap.
    fn merged_busy_ranges(&self) -> Vec<(Instant, Instant)> {
        let mut ranges: Vec<(Instant, Instant)> = self
            .get_intervals()
            .into_iter()
            .filter_map(|i| i.bounds())
            .collect();
        ranges.sort();

        let mut merged: Vec<(Instant, Instant)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, last_end)) if start <= *last_end => {
                    if end > *last_end {
                        *last_end = end;
                    }
                }
                _ => merged.push((start, end)),
            }
        }
        merged
    }
}
