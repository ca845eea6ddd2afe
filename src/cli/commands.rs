//! CLI command implementations.

use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use crate::relations::{classify_relation, generate_stn_constraint, RelationCode};
use crate::stn::{FloydWarshallSolver, StnOptions, DEFAULT_SOLVER_TIMEOUT};
use crate::timeline::{segment_by_bridges, Timeline};
use crate::types::{
    format_instant, BridgeKind, BridgeMarker, Interval, LodLevel, TemporalError, TemporalResult,
    TimeUnit,
};

/// JSON plan file accepted by `solve` and `segment`.
#[derive(Debug, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub lod: Option<String>,
    pub intervals: Vec<PlanInterval>,
    #[serde(default)]
    pub relations: Vec<(String, String)>,
    #[serde(default)]
    pub bridges: Vec<PlanBridge>,
}

/// One interval entry in a plan file.
#[derive(Debug, Deserialize)]
pub struct PlanInterval {
    pub id: String,
    pub start: String,
    pub end: String,
}

/// One bridge entry in a plan file.
#[derive(Debug, Deserialize)]
pub struct PlanBridge {
    pub id: String,
    #[serde(default = "default_bridge_kind")]
    pub kind: String,
    pub at: String,
}

fn default_bridge_kind() -> String {
    "synchronization".to_string()
}

/// Load a plan file into a timeline.
pub fn load_plan(path: &Path) -> TemporalResult<Timeline> {
    let raw = std::fs::read_to_string(path)?;
    let plan: PlanFile =
        serde_json::from_str(&raw).map_err(|e| TemporalError::InvalidPlan(e.to_string()))?;

    let mut options = StnOptions::default();
    if let Some(unit) = &plan.unit {
        options.time_unit = TimeUnit::from_name(unit)
            .ok_or_else(|| TemporalError::InvalidPlan(format!("unknown unit {:?}", unit)))?;
    }
    if let Some(lod) = &plan.lod {
        options.lod_level = LodLevel::from_name(lod)
            .ok_or_else(|| TemporalError::InvalidPlan(format!("unknown lod {:?}", lod)))?;
    }

    let mut timeline = Timeline::with_options(options);
    for entry in &plan.intervals {
        timeline.add_interval(Interval::from_iso8601(
            entry.id.as_str(),
            &entry.start,
            &entry.end,
        )?)?;
    }
    for (a, b) in &plan.relations {
        timeline.relate(a, b)?;
    }
    for entry in &plan.bridges {
        let kind = BridgeKind::from_name(&entry.kind)
            .ok_or_else(|| TemporalError::InvalidPlan(format!("unknown kind {:?}", entry.kind)))?;
        timeline.add_bridge(BridgeMarker::at_iso8601(entry.id.as_str(), kind, &entry.at)?)?;
    }
    Ok(timeline)
}

/// Classify the relation between two intervals given as ISO-8601 endpoint
/// pairs, and show the lowered bound.
pub fn cmd_classify(
    a_start: &str,
    a_end: &str,
    b_start: &str,
    b_end: &str,
    unit: TimeUnit,
    json_output: bool,
) -> TemporalResult<()> {
    let a = Interval::from_iso8601("a", a_start, a_end)?;
    let b = Interval::from_iso8601("b", b_start, b_end)?;
    let code = classify_relation(&a, &b)?;
    let bound = generate_stn_constraint(&a, &b, unit);

    if json_output {
        let out = json!({
            "code": code.code(),
            "allen": code.to_allen().name(),
            "description": code.description(),
            "bound": bound.as_ref().ok().map(|b| json!({"lo": b.lo, "hi": b.hi})),
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
    } else {
        println!("Relation: {} ({})", code.code(), code.to_allen().name());
        println!("Description: {}", code.description());
        match bound {
            Ok(b) => println!("Bound ({}): [{}, {}]", unit, b.lo, b.hi),
            Err(e) => println!("Bound: not lowerable ({})", e),
        }
    }
    Ok(())
}

/// Solve a plan file and show the assigned interval times.
pub fn cmd_solve(path: &Path, json_output: bool) -> TemporalResult<()> {
    let timeline = load_plan(path)?;
    let solved = timeline.solve(&FloydWarshallSolver, DEFAULT_SOLVER_TIMEOUT)?;

    if json_output {
        let intervals: Vec<_> = solved
            .get_intervals()
            .into_iter()
            .map(|i| {
                json!({
                    "id": i.id,
                    "start": i.start_time.map(format_instant),
                    "end": i.end_time.map(format_instant),
                })
            })
            .collect();
        let out = json!({
            "consistent": solved.stn().consistent(),
            "intervals": intervals,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
    } else {
        println!("Consistent: yes");
        for interval in solved.get_intervals() {
            match interval.bounds() {
                Some((start, end)) => println!(
                    "  {}: {} -> {}",
                    interval.id,
                    format_instant(start),
                    format_instant(end)
                ),
                None => println!("  {}: unanchored", interval.id),
            }
        }
    }
    Ok(())
}

/// Segment a plan file along its bridges and show the segments.
pub fn cmd_segment(path: &Path, json_output: bool) -> TemporalResult<()> {
    let timeline = load_plan(path)?;
    let segments = segment_by_bridges(&timeline)?;

    if json_output {
        let out: Vec<_> = segments
            .iter()
            .map(|segment| {
                json!({
                    "metadata": segment.metadata,
                    "intervals": segment
                        .get_intervals()
                        .into_iter()
                        .map(|i| i.id.clone())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
    } else {
        println!("{} segments", segments.len());
        for segment in &segments {
            let number = segment
                .metadata
                .get("segment")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            let ids: Vec<String> = segment
                .get_intervals()
                .into_iter()
                .map(|i| i.id.clone())
                .collect();
            println!("  segment {}: {}", number, ids.join(", "));
        }
    }
    Ok(())
}

/// List the 13 relation codes with their Allen names and descriptions.
pub fn cmd_relations(json_output: bool) -> TemporalResult<()> {
    let codes = [
        RelationCode::Eq,
        RelationCode::AdjF,
        RelationCode::AdjB,
        RelationCode::Precedes,
        RelationCode::Follows,
        RelationCode::OverlapF,
        RelationCode::OverlapB,
        RelationCode::Within,
        RelationCode::Contains,
        RelationCode::StartAlign,
        RelationCode::StartExtend,
        RelationCode::EndAlign,
        RelationCode::EndExtend,
    ];

    if json_output {
        let out: Vec<_> = codes
            .iter()
            .map(|c| {
                json!({
                    "code": c.code(),
                    "allen": c.to_allen().name(),
                    "description": c.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
    } else {
        for code in codes {
            println!(
                "{:<14} {:<14} {}",
                code.code(),
                code.to_allen().name(),
                code.description()
            );
        }
    }
    Ok(())
}
