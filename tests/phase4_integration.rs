//! Phase 4 tests: end-to-end scenarios across participants, timelines,
//! solving, segmentation, and the CLI plan format.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use timeweave::cli::commands::load_plan;
use timeweave::types::{
    parse_instant, BridgeKind, BridgeMarker, Instant, Participant, TemporalError,
};
use timeweave::{
    segment_by_bridges, FloydWarshallSolver, Interval, LodLevel, RelationCode, Stn, StnOptions,
    Timeline, TimelineBuilder, TimeUnit,
};

fn ts(s: &str) -> Instant {
    parse_instant(s).unwrap()
}

fn iv(id: &str, start: &str, end: &str) -> Interval {
    Interval::new(id, ts(start), ts(end)).unwrap()
}

// ==================== End-to-End Planning ====================

#[test]
fn test_full_planning_flow() {
    let chef = Participant::agent("aria", "Aria").with_capabilities(["cooking"]);
    let oven = Participant::entity("oven", "Oven").with_owner("aria");

    let mut timeline = Timeline::new();
    timeline
        .add_interval(
            iv("prep", "2025-03-01T09:00:00Z", "2025-03-01T09:45:00Z")
                .with_agent(chef.clone()),
        )
        .unwrap();
    timeline
        .add_interval(
            iv("bake", "2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z")
                .with_agent(chef)
                .with_entity(oven),
        )
        .unwrap();
    timeline
        .add_interval(iv("serve", "2025-03-01T11:00:00Z", "2025-03-01T11:30:00Z"))
        .unwrap();

    assert_eq!(timeline.relate("prep", "bake").unwrap(), RelationCode::Precedes);
    assert_eq!(timeline.relate("bake", "serve").unwrap(), RelationCode::AdjF);

    let solved = timeline
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();
    assert_eq!(solved.stn().consistent(), Some(true));

    // Participant attachments ride through solving
    let bake = solved.get_interval("bake").unwrap();
    let chef = bake.agent.as_ref().unwrap();
    assert!(chef.can_perform_action("cooking"));
    assert!(bake.entity.as_ref().unwrap().owned_by("aria"));

    // Assigned times preserve the plan's ordering
    let prep_end = solved.get_interval("prep").unwrap().bounds().unwrap().1;
    let bake_start = bake.bounds().unwrap().0;
    assert!(prep_end <= bake_start + chrono::Duration::seconds(2));
}

#[test]
fn test_builder_to_segments_to_solved() {
    let mut builder = TimelineBuilder::new().auto_bridges(1_800);
    builder
        .add_intervals(vec![
            iv("late", "2025-03-01T12:00:00Z", "2025-03-01T13:00:00Z"),
            iv("early", "2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z"),
        ])
        .unwrap();
    let timeline = builder.build();
    assert!(timeline.bridge_count() >= 2);

    // Segments solve independently, mirroring the parallel-solve story
    let segments = segment_by_bridges(&timeline).unwrap();
    assert!(!segments.is_empty());
    for segment in &segments {
        let solved = segment
            .solve(&FloydWarshallSolver, Duration::from_secs(5))
            .unwrap();
        assert_eq!(solved.stn().consistent(), Some(true));
    }
}

#[test]
fn test_open_ended_and_floating_ride_along() {
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("fixed", "2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(Interval::open_ended("tail", Some(ts("2025-03-01T11:00:00Z")), None).unwrap())
        .unwrap();
    timeline
        .add_interval(Interval::floating("chore", "PT45M").unwrap())
        .unwrap();

    // Only the anchored interval is mirrored and solved
    assert_eq!(timeline.stn().interval_count(), 1);
    let solved = timeline
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();
    assert!(solved.get_interval("tail").unwrap().end_time.is_none());
    assert!(solved.get_interval("chore").unwrap().is_floating());
}

#[test]
fn test_constant_work_timeline_capacity() {
    let mut timeline = Timeline::with_options(StnOptions {
        max_timepoints: 4,
        constant_work_enabled: true,
        ..StnOptions::default()
    });
    timeline
        .add_interval(iv("a", "2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z"))
        .unwrap();
    timeline
        .add_interval(iv("b", "2025-03-01T12:00:00Z", "2025-03-01T13:00:00Z"))
        .unwrap();
    assert_eq!(timeline.stn().time_points().len(), 4);

    match timeline.add_interval(iv("c", "2025-03-01T14:00:00Z", "2025-03-01T15:00:00Z")) {
        Err(TemporalError::TimepointsExhausted(4)) => {}
        other => panic!("Expected TimepointsExhausted, got {:?}", other),
    }
    // The refused interval left nothing behind
    assert_eq!(timeline.interval_count(), 2);
    assert_eq!(timeline.stn().time_points().len(), 4);
}

// ==================== Unit and LOD Round Trips ====================

#[test]
fn test_unit_conversion_end_to_end() {
    let mut timeline = Timeline::with_options(StnOptions {
        lod_level: LodLevel::UltraHigh,
        ..StnOptions::default()
    });
    timeline
        .add_interval(iv("a", "2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z"))
        .unwrap();

    let in_ms = timeline.stn().convert_units(TimeUnit::Millisecond);
    let bound = in_ms.constraint("a_start", "a_end").unwrap();
    // 3600 s ± 1 widens to 3,599,000..3,601,000 ms
    assert_eq!(bound.lo, 3_599_000);
    assert_eq!(bound.hi, 3_601_000);

    let solved = in_ms
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();
    assert_eq!(solved.consistent(), Some(true));
}

#[test]
fn test_lod_rescale_roundtrip_containment() {
    let mut stn = Stn::with_defaults();
    let a = iv("a", "2025-03-01T10:00:00Z", "2025-03-01T10:30:00Z");
    stn.add_interval(&a).unwrap();
    let original = stn.constraint("a_start", "a_end").unwrap();

    let down = stn.rescale_lod(LodLevel::VeryLow);
    let up = down.rescale_lod(LodLevel::Medium);
    let rescaled = up.constraint("a_start", "a_end").unwrap();
    assert!(rescaled.lo <= original.lo);
    assert!(rescaled.hi >= original.hi);

    // Satisfiability survives the round trip
    assert_eq!(
        up.solve(&FloydWarshallSolver, Duration::from_secs(5))
            .unwrap()
            .consistent(),
        Some(true)
    );
}

// ==================== Plan File Round Trips ====================

fn write_plan(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_plan_file_loads_and_solves() {
    let file = write_plan(
        r#"{
            "unit": "second",
            "lod": "medium",
            "intervals": [
                {"id": "prep", "start": "2025-03-01T09:00:00Z", "end": "2025-03-01T09:45:00Z"},
                {"id": "bake", "start": "2025-03-01T10:00:00Z", "end": "2025-03-01T11:00:00Z"}
            ],
            "relations": [["prep", "bake"]],
            "bridges": [
                {"id": "check", "kind": "resource_check", "at": "2025-03-01T09:50:00Z"}
            ]
        }"#,
    );

    let timeline = load_plan(file.path()).unwrap();
    assert_eq!(timeline.interval_count(), 2);
    assert_eq!(timeline.bridge_count(), 1);
    assert_eq!(
        timeline.get_bridge("check").unwrap().kind,
        BridgeKind::ResourceCheck
    );

    let solved = timeline
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();
    assert_eq!(solved.stn().consistent(), Some(true));
}

#[test]
fn test_plan_file_rejects_bad_input() {
    let not_json = write_plan("not a plan");
    match load_plan(not_json.path()) {
        Err(TemporalError::InvalidPlan(_)) => {}
        other => panic!("Expected InvalidPlan, got {:?}", other.map(|_| ())),
    }

    let bad_unit = write_plan(r#"{"unit": "fortnight", "intervals": []}"#);
    assert!(load_plan(bad_unit.path()).is_err());

    let naive_time = write_plan(
        r#"{"intervals": [{"id": "i", "start": "2025-03-01T09:00:00", "end": "2025-03-01T10:00:00"}]}"#,
    );
    match load_plan(naive_time.path()) {
        Err(TemporalError::NaiveTimestamp(_)) => {}
        other => panic!("Expected NaiveTimestamp, got {:?}", other.map(|_| ())),
    }
}

// ==================== Wire Stability ====================

#[test]
fn test_bridge_kind_wire_names() {
    let pairs = [
        (BridgeKind::Decision, "decision"),
        (BridgeKind::Condition, "condition"),
        (BridgeKind::Synchronization, "synchronization"),
        (BridgeKind::ResourceCheck, "resource_check"),
        (BridgeKind::AutoGenerated, "auto_generated"),
    ];
    for (kind, name) in pairs {
        assert_eq!(kind.name(), name);
        assert_eq!(BridgeKind::from_name(name), Some(kind));
    }
    assert_eq!(BridgeKind::from_name("viaduct"), None);
}

#[test]
fn test_solved_output_is_reusable() {
    // A solved timeline still accepts edits and re-solves
    let mut timeline = Timeline::new();
    timeline
        .add_interval(iv("a", "2025-03-01T10:00:00Z", "2025-03-01T11:00:00Z"))
        .unwrap();
    let mut solved = timeline
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();

    solved
        .add_interval(iv("b", "2025-03-01T12:00:00Z", "2025-03-01T13:00:00Z"))
        .unwrap();
    // The edit invalidated the earlier outcome
    assert_eq!(solved.stn().consistent(), None);
    let resolved = solved
        .solve(&FloydWarshallSolver, Duration::from_secs(5))
        .unwrap();
    assert_eq!(resolved.stn().consistent(), Some(true));
    assert!(resolved
        .stn()
        .solved_times()
        .unwrap()
        .contains_key("b_start"));
}

#[test]
fn test_bridge_marker_iso_positions() {
    let bridge =
        BridgeMarker::at_iso8601("b", BridgeKind::Decision, "2025-03-01T10:00:00+01:00").unwrap();
    assert_eq!(
        bridge.resolved_position(),
        Some(ts("2025-03-01T09:00:00Z"))
    );
    assert!(BridgeMarker::at_iso8601("b", BridgeKind::Decision, "2025-03-01T10:00:00").is_err());
}
