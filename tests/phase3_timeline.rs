//! Phase 3 tests: the timeline composite, bridges, the builder, solving,
//! and segmentation.

use std::time::Duration;

use timeweave::types::{
    parse_instant, BridgeKind, BridgeMarker, Instant, SemanticRef, TemporalError,
};
use timeweave::{
    segment_by_bridges, validate_segments, AllenRelation, Bound, FloydWarshallSolver, Interval,
    RelationCode, Timeline, TimelineBuilder,
};

fn ts(s: &str) -> Instant {
    parse_instant(s).unwrap()
}

fn iv(id: &str, start: &str, end: &str) -> Interval {
    Interval::new(id, ts(start), ts(end)).unwrap()
}

// ==================== Interval Mirror Tests ====================

#[test]
fn test_timeline_mirrors_intervals_into_stn() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("cook", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();

    assert!(timeline.stn().time_points().contains("cook_start"));
    assert!(timeline.stn().time_points().contains("cook_end"));
    assert!(timeline.stn().constraint("cook_start", "cook_end").is_some());

    let removed = timeline.remove_interval("cook").unwrap();
    assert_eq!(removed.id, "cook");
    assert!(!timeline.stn().time_points().contains("cook_start"));
    assert!(!timeline.stn().time_points().contains("cook_end"));
    assert!(timeline.stn().constraints().is_empty());
}

#[test]
fn test_timeline_rejects_duplicate_interval() {
    let mut timeline = Timeline::new();
    let i = iv("i", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z");
    timeline.add_interval(i.clone()).unwrap();
    match timeline.add_interval(i) {
        Err(TemporalError::DuplicateId(id)) => assert_eq!(id, "i"),
        other => panic!("Expected DuplicateId, got {:?}", other),
    }
}

#[test]
fn test_add_intervals_is_atomic() {
    let mut timeline = Timeline::new();
    let batch = vec![
        iv("a", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"),
        iv("b", "2025-01-01T11:00:00Z", "2025-01-01T12:00:00Z"),
        iv("a", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"),
    ];
    assert!(timeline.add_intervals(batch).is_err());
    // Nothing from the failed batch may stick
    assert_eq!(timeline.interval_count(), 0);
    assert!(timeline.stn().time_points().is_empty());
}

#[test]
fn test_zero_duration_interval_refused_at_admission() {
    let mut timeline = Timeline::new();
    let zero = iv("zero", "2025-01-01T10:00:00Z", "2025-01-01T10:00:00Z");
    match timeline.add_interval(zero) {
        Err(TemporalError::ZeroDurationViolation { id, .. }) => assert_eq!(id, "zero"),
        other => panic!("Expected ZeroDurationViolation, got {:?}", other),
    }
    // The refused interval is held nowhere
    assert_eq!(timeline.interval_count(), 0);
    assert!(timeline.stn().time_points().is_empty());
}

#[test]
fn test_open_ended_interval_not_mirrored() {
    let mut timeline = Timeline::new();
    let open = Interval::open_ended("open", Some(ts("2025-01-01T10:00:00Z")), None).unwrap();
    timeline.add_interval(open).unwrap();
    assert_eq!(timeline.interval_count(), 1);
    assert!(timeline.stn().time_points().is_empty());
}

#[test]
fn test_update_interval_refreshes_mirror() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    let hour_ticks = 3_600 * 100;
    assert_eq!(
        timeline.stn().constraint("i_start", "i_end"),
        Some(Bound::new(hour_ticks - 1, hour_ticks + 1))
    );

    timeline
        .update_interval(iv("i", "2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"))
        .unwrap();
    let two_hour_ticks = 7_200 * 100;
    assert_eq!(
        timeline.stn().constraint("i_start", "i_end"),
        Some(Bound::new(two_hour_ticks - 1, two_hour_ticks + 1))
    );

    match timeline.update_interval(iv("ghost", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z")) {
        Err(TemporalError::IntervalNotFound(_)) => {}
        other => panic!("Expected IntervalNotFound, got {:?}", other),
    }
}

#[test]
fn test_relate_lowers_into_network() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("a", "2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("b", "2025-01-01T12:00:00Z", "2025-01-01T14:00:00Z"))
        .unwrap();

    let code = timeline.relate("a", "b").unwrap();
    assert_eq!(code, RelationCode::AdjF);
    // Micro-range scaled by the Medium resolution
    assert_eq!(
        timeline.stn().constraint("a_end", "b_start"),
        Some(Bound::new(-100, 100))
    );

    match timeline.relate("a", "ghost") {
        Err(TemporalError::IntervalNotFound(_)) => {}
        other => panic!("Expected IntervalNotFound, got {:?}", other),
    }
}

// ==================== Bridge Tests ====================

#[test]
fn test_bridge_duplicate_id_rejected() {
    let mut timeline = Timeline::new();
    let bridge = BridgeMarker::at("b1", BridgeKind::Decision, ts("2025-01-01T11:30:00Z"));
    timeline.add_bridge(bridge.clone()).unwrap();
    match timeline.add_bridge(bridge) {
        Err(TemporalError::DuplicateId(id)) => assert_eq!(id, "b1"),
        other => panic!("Expected DuplicateId, got {:?}", other),
    }
}

#[test]
fn test_bridge_boundary_conflict() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();

    let on_start = BridgeMarker::at("b1", BridgeKind::Decision, ts("2025-01-01T10:00:00Z"));
    match timeline.add_bridge(on_start) {
        Err(TemporalError::BoundaryConflict {
            bridge_id,
            interval_id,
        }) => {
            assert_eq!(bridge_id, "b1");
            assert_eq!(interval_id, "i");
        }
        other => panic!("Expected BoundaryConflict, got {:?}", other),
    }

    let on_end = BridgeMarker::at("b2", BridgeKind::Decision, ts("2025-01-01T11:00:00Z"));
    assert!(timeline.add_bridge(on_end).is_err());

    let clear = BridgeMarker::at("b3", BridgeKind::Decision, ts("2025-01-01T11:30:00Z"));
    timeline.add_bridge(clear).unwrap();
}

#[test]
fn test_update_bridge_revalidates_placement() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::at(
            "b1",
            BridgeKind::Condition,
            ts("2025-01-01T11:30:00Z"),
        ))
        .unwrap();

    let moved_onto_boundary =
        BridgeMarker::at("b1", BridgeKind::Condition, ts("2025-01-01T11:00:00Z"));
    assert!(timeline.update_bridge(moved_onto_boundary).is_err());

    let moved_clear = BridgeMarker::at("b1", BridgeKind::Condition, ts("2025-01-01T12:00:00Z"));
    timeline.update_bridge(moved_clear).unwrap();
    assert_eq!(
        timeline.get_bridge("b1").unwrap().resolved_position(),
        Some(ts("2025-01-01T12:00:00Z"))
    );

    let unknown = BridgeMarker::at("ghost", BridgeKind::Condition, ts("2025-01-01T13:00:00Z"));
    match timeline.update_bridge(unknown) {
        Err(TemporalError::BridgeNotFound(_)) => {}
        other => panic!("Expected BridgeNotFound, got {:?}", other),
    }
}

#[test]
fn test_bridges_sorted_and_ranged() {
    let mut timeline = Timeline::new();
    timeline
        .add_bridge(BridgeMarker::at(
            "late",
            BridgeKind::Synchronization,
            ts("2025-01-01T15:00:00Z"),
        ))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::at(
            "early",
            BridgeKind::Synchronization,
            ts("2025-01-01T09:00:00Z"),
        ))
        .unwrap();
    timeline.add_bridge(BridgeMarker::semantic(
        "floating",
        BridgeKind::Condition,
        AllenRelation::During,
        SemanticRef::Timeline,
    ))
    .unwrap();

    let sorted = timeline.get_bridges();
    assert_eq!(sorted[0].id, "early");
    assert_eq!(sorted[1].id, "late");
    // Unresolved semantic markers sort last
    assert_eq!(sorted[2].id, "floating");

    assert_eq!(
        timeline.bridge_positions(),
        vec![ts("2025-01-01T09:00:00Z"), ts("2025-01-01T15:00:00Z")]
    );
    let in_range =
        timeline.bridges_in_range(ts("2025-01-01T09:00:00Z"), ts("2025-01-01T10:00:00Z"));
    assert_eq!(in_range.len(), 1);
    assert_eq!(in_range[0].id, "early");
}

#[test]
fn test_unresolved_bridge_comparisons_are_false() {
    let bridge = BridgeMarker::semantic(
        "b",
        BridgeKind::Condition,
        AllenRelation::Before,
        SemanticRef::Interval("i".to_string()),
    );
    let t = ts("2025-01-01T10:00:00Z");
    assert!(!bridge.is_at(t));
    assert!(!bridge.is_before(t));
    assert!(!bridge.is_after(t));
}

#[test]
fn test_resolve_semantic_bridge_positions() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i", "2025-01-01T10:00:00Z", "2025-01-01T12:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("j", "2025-01-01T13:00:00Z", "2025-01-01T14:00:00Z"))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::semantic(
            "at_start",
            BridgeKind::Decision,
            AllenRelation::Before,
            SemanticRef::Timeline,
        ))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::semantic(
            "mid_i",
            BridgeKind::Condition,
            AllenRelation::During,
            SemanticRef::Interval("i".to_string()),
        ))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::semantic(
            "ghost_ref",
            BridgeKind::Condition,
            AllenRelation::During,
            SemanticRef::Interval("missing".to_string()),
        ))
        .unwrap();

    timeline.resolve_bridge_positions();

    assert_eq!(
        timeline.get_bridge("at_start").unwrap().resolved_position(),
        Some(ts("2025-01-01T10:00:00Z"))
    );
    assert_eq!(
        timeline.get_bridge("mid_i").unwrap().resolved_position(),
        Some(ts("2025-01-01T11:00:00Z"))
    );
    assert_eq!(
        timeline.get_bridge("ghost_ref").unwrap().resolved_position(),
        None
    );
}

// ==================== Builder Tests ====================

#[test]
fn test_builder_auto_bridge_insertion() {
    let mut builder = TimelineBuilder::new().auto_bridges(1_800);
    builder
        .add_interval(iv("i1", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();

    // First interval anchors auto_bridge_1 at its own start
    let timeline = builder.timeline();
    assert_eq!(timeline.bridge_count(), 1);
    assert_eq!(
        timeline.get_bridge("auto_bridge_1").unwrap().resolved_position(),
        Some(ts("2025-01-01T10:00:00Z"))
    );
    assert_eq!(
        timeline.get_bridge("auto_bridge_1").unwrap().kind,
        BridgeKind::AutoGenerated
    );

    // 3600 s past the last bridge, spacing 1800: midpoint bridge at 10:30
    builder
        .add_interval(iv("i2", "2025-01-01T11:00:00Z", "2025-01-01T12:00:00Z"))
        .unwrap();
    let timeline = builder.timeline();
    assert_eq!(timeline.bridge_count(), 2);
    assert_eq!(
        timeline.get_bridge("auto_bridge_2").unwrap().resolved_position(),
        Some(ts("2025-01-01T10:30:00Z"))
    );
}

#[test]
fn test_builder_skips_bridges_below_spacing() {
    let mut builder = TimelineBuilder::new().auto_bridges(7_200);
    builder
        .add_interval(iv("i1", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    builder
        .add_interval(iv("i2", "2025-01-01T11:00:00Z", "2025-01-01T12:00:00Z"))
        .unwrap();
    // 3600 s gap is below the 7200 s spacing
    assert_eq!(builder.timeline().bridge_count(), 1);
}

#[test]
fn test_builder_batch_sorts_by_start() {
    let mut builder = TimelineBuilder::new().auto_bridges(1_800);
    builder
        .add_intervals(vec![
            iv("late", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"),
            iv("early", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"),
        ])
        .unwrap();
    let timeline = builder.build();
    // The first bridge anchors at the earliest interval start
    assert_eq!(
        timeline.get_bridge("auto_bridge_1").unwrap().resolved_position(),
        Some(ts("2025-01-01T10:00:00Z"))
    );
    // The second lands midway between 10:00 and 12:00
    assert_eq!(
        timeline.get_bridge("auto_bridge_2").unwrap().resolved_position(),
        Some(ts("2025-01-01T11:00:00Z"))
    );
}

// ==================== Solve Tests ====================

#[test]
fn test_timeline_solve_assigns_times() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("a", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("b", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    timeline.relate("a", "b").unwrap();

    let solved = timeline
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();
    assert_eq!(solved.stn().consistent(), Some(true));

    // Assigned times stay within the micro-range slop of the originals
    for (id, start, end) in [
        ("a", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"),
        ("b", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"),
    ] {
        let interval = solved.get_interval(id).unwrap();
        let (s, e) = interval.bounds().unwrap();
        assert!(
            (s - ts(start)).num_seconds().abs() <= 2,
            "{} start drifted to {}",
            id,
            s
        );
        assert!(
            (e - ts(end)).num_seconds().abs() <= 2,
            "{} end drifted to {}",
            id,
            e
        );
    }

    // The input timeline is untouched
    assert_eq!(
        timeline.get_interval("a").unwrap().bounds().unwrap().0,
        ts("2025-01-01T10:00:00Z")
    );
}

#[test]
fn test_solve_failure_leaves_original() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("a", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("b", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    // Contradictory ordering between the two starts
    timeline
        .add_constraint("a_start", "b_start", Bound::new(1_000, 2_000))
        .unwrap();
    timeline
        .add_constraint("b_start", "a_start", Bound::new(1_000, 2_000))
        .unwrap();

    match timeline.solve(&FloydWarshallSolver, Duration::from_secs(5)) {
        Err(TemporalError::Unsatisfiable) => {}
        other => panic!("Expected Unsatisfiable, got {:?}", other.map(|_| ())),
    }
    assert_eq!(timeline.stn().consistent(), None);
    assert_eq!(timeline.interval_count(), 2);
}

// ==================== Segmentation Tests ====================

#[test]
fn test_segmentation_splits_on_bridge() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i1", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("i2", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::at(
            "b",
            BridgeKind::Decision,
            ts("2025-01-01T11:30:00Z"),
        ))
        .unwrap();

    let segments = segment_by_bridges(&timeline).unwrap();
    assert_eq!(segments.len(), 2);

    let first = &segments[0];
    assert_eq!(first.metadata["segment"], 1);
    assert_eq!(first.interval_count(), 1);
    assert!(first.get_interval("i1").is_some());
    assert!(first.metadata["bridge_before"].is_null());
    assert_eq!(
        first.metadata["segment_end"].as_str().unwrap(),
        "2025-01-01T11:30:00.000000Z"
    );

    let second = &segments[1];
    assert_eq!(second.metadata["segment"], 2);
    assert_eq!(second.interval_count(), 1);
    assert!(second.get_interval("i2").is_some());
    assert_eq!(
        second.metadata["bridge_before"].as_str().unwrap(),
        "2025-01-01T11:30:00.000000Z"
    );

    validate_segments(&segments).unwrap();
    // The input timeline is untouched
    assert_eq!(timeline.interval_count(), 2);
    assert_eq!(timeline.bridge_count(), 1);
}

#[test]
fn test_spanning_interval_appears_in_both_segments() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("span", "2025-01-01T10:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("tail", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::at(
            "b",
            BridgeKind::Synchronization,
            ts("2025-01-01T11:00:00Z"),
        ))
        .unwrap();

    let segments = segment_by_bridges(&timeline).unwrap();
    assert_eq!(segments.len(), 2);
    assert!(segments[0].get_interval("span").is_some());
    assert!(segments[1].get_interval("span").is_some());
    assert!(segments[0].get_interval("tail").is_none());
    assert!(segments[1].get_interval("tail").is_some());
}

#[test]
fn test_segments_have_fresh_networks_and_no_bridges() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i1", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("i2", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    timeline.relate("i1", "i2").unwrap();
    timeline
        .add_bridge(BridgeMarker::at(
            "b",
            BridgeKind::Decision,
            ts("2025-01-01T11:30:00Z"),
        ))
        .unwrap();

    let segments = segment_by_bridges(&timeline).unwrap();
    for segment in &segments {
        assert_eq!(segment.bridge_count(), 0);
        // Fresh network: only this segment's own mirror, no parent relations
        assert_eq!(
            segment.stn().time_points().len(),
            segment.interval_count() * 2
        );
        assert_eq!(
            segment.stn().constraints().len(),
            segment.interval_count()
        );
    }
}

#[test]
fn test_segmentation_without_bridges_or_intervals() {
    let empty = Timeline::new();
    assert!(segment_by_bridges(&empty).unwrap().is_empty());

    let mut no_bridges = Timeline::new();
    no_bridges
        .add_interval(iv("i", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    let segments = segment_by_bridges(&no_bridges).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].interval_count(), 1);
}

#[test]
fn test_record_segmentation_partitions_points() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("i1", "2025-01-01T10:00:00Z", "2025-01-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("i2", "2025-01-01T12:00:00Z", "2025-01-01T13:00:00Z"))
        .unwrap();
    timeline
        .add_bridge(BridgeMarker::at(
            "b",
            BridgeKind::Decision,
            ts("2025-01-01T11:30:00Z"),
        ))
        .unwrap();

    timeweave::timeline::record_segmentation(&mut timeline).unwrap();
    let segments = timeline.stn().segments();
    assert_eq!(segments.len(), 2);
    assert!(segments[0].contains(&"i1_start".to_string()));
    assert!(segments[1].contains(&"i2_end".to_string()));
}
