//! Allen interval algebra — classifying interval pairs into the 13
//! qualitative relations and their wire-stable codes.

use std::cmp::Ordering;

use serde::Serialize;

use crate::types::{Instant, Interval, TemporalError, TemporalResult};

/// The 13 Allen relations between two intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AllenRelation {
    /// `a` ends before `b` begins, with a gap.
    Before,
    /// `a` ends exactly where `b` begins.
    Meets,
    /// `a` begins first and ends inside `b`.
    Overlaps,
    /// `a` and `b` share an end; `a` begins first.
    FinishedBy,
    /// `b` lies strictly inside `a`.
    Contains,
    /// `a` and `b` share a start; `a` ends first.
    Starts,
    /// `a` and `b` occupy the same extent.
    Equals,
    /// `a` and `b` share a start; `b` ends first.
    StartedBy,
    /// `a` lies strictly inside `b`.
    During,
    /// `a` and `b` share an end; `b` begins first.
    Finishes,
    /// `b` begins first and ends inside `a`.
    OverlappedBy,
    /// `b` ends exactly where `a` begins.
    MetBy,
    /// `a` begins after `b` ends, with a gap.
    After,
}

impl AllenRelation {
    /// Return the Allen name for this relation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Meets => "meets",
            Self::Overlaps => "overlaps",
            Self::FinishedBy => "finished_by",
            Self::Contains => "contains",
            Self::Starts => "starts",
            Self::Equals => "equals",
            Self::StartedBy => "started_by",
            Self::During => "during",
            Self::Finishes => "finishes",
            Self::OverlappedBy => "overlapped_by",
            Self::MetBy => "met_by",
            Self::After => "after",
        }
    }

    /// Parse an Allen name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "before" => Some(Self::Before),
            "meets" => Some(Self::Meets),
            "overlaps" => Some(Self::Overlaps),
            "finished_by" | "finishedby" => Some(Self::FinishedBy),
            "contains" => Some(Self::Contains),
            "starts" => Some(Self::Starts),
            "equals" => Some(Self::Equals),
            "started_by" | "startedby" => Some(Self::StartedBy),
            "during" => Some(Self::During),
            "finishes" => Some(Self::Finishes),
            "overlapped_by" | "overlappedby" => Some(Self::OverlappedBy),
            "met_by" | "metby" => Some(Self::MetBy),
            "after" => Some(Self::After),
            _ => None,
        }
    }

    /// The inverse relation: `allen_relation(a, b)` inverts to
    /// `allen_relation(b, a)`.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            Self::Meets => Self::MetBy,
            Self::MetBy => Self::Meets,
            Self::Overlaps => Self::OverlappedBy,
            Self::OverlappedBy => Self::Overlaps,
            Self::Starts => Self::StartedBy,
            Self::StartedBy => Self::Starts,
            Self::During => Self::Contains,
            Self::Contains => Self::During,
            Self::Finishes => Self::FinishedBy,
            Self::FinishedBy => Self::Finishes,
            Self::Equals => Self::Equals,
        }
    }

    /// The wire-stable language-neutral code for this relation.
    pub fn to_code(&self) -> RelationCode {
        match self {
            Self::Equals => RelationCode::Eq,
            Self::Meets => RelationCode::AdjF,
            Self::MetBy => RelationCode::AdjB,
            Self::Before => RelationCode::Precedes,
            Self::After => RelationCode::Follows,
            Self::Overlaps => RelationCode::OverlapF,
            Self::OverlappedBy => RelationCode::OverlapB,
            Self::During => RelationCode::Within,
            Self::Contains => RelationCode::Contains,
            Self::Starts => RelationCode::StartAlign,
            Self::StartedBy => RelationCode::StartExtend,
            Self::Finishes => RelationCode::EndAlign,
            Self::FinishedBy => RelationCode::EndExtend,
        }
    }
}

impl std::fmt::Display for AllenRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Language-neutral relation codes, stable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationCode {
    Eq,
    AdjF,
    AdjB,
    Precedes,
    Follows,
    OverlapF,
    OverlapB,
    Within,
    Contains,
    StartAlign,
    StartExtend,
    EndAlign,
    EndExtend,
}

impl RelationCode {
    /// The wire string, e.g. `"ADJ_F"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::AdjF => "ADJ_F",
            Self::AdjB => "ADJ_B",
            Self::Precedes => "PRECEDES",
            Self::Follows => "FOLLOWS",
            Self::OverlapF => "OVERLAP_F",
            Self::OverlapB => "OVERLAP_B",
            Self::Within => "WITHIN",
            Self::Contains => "CONTAINS",
            Self::StartAlign => "START_ALIGN",
            Self::StartExtend => "START_EXTEND",
            Self::EndAlign => "END_ALIGN",
            Self::EndExtend => "END_EXTEND",
        }
    }

    /// Parse a wire code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "EQ" => Some(Self::Eq),
            "ADJ_F" => Some(Self::AdjF),
            "ADJ_B" => Some(Self::AdjB),
            "PRECEDES" => Some(Self::Precedes),
            "FOLLOWS" => Some(Self::Follows),
            "OVERLAP_F" => Some(Self::OverlapF),
            "OVERLAP_B" => Some(Self::OverlapB),
            "WITHIN" => Some(Self::Within),
            "CONTAINS" => Some(Self::Contains),
            "START_ALIGN" => Some(Self::StartAlign),
            "START_EXTEND" => Some(Self::StartExtend),
            "END_ALIGN" => Some(Self::EndAlign),
            "END_EXTEND" => Some(Self::EndExtend),
            _ => None,
        }
    }

    /// The Allen relation this code names.
    pub fn to_allen(&self) -> AllenRelation {
        match self {
            Self::Eq => AllenRelation::Equals,
            Self::AdjF => AllenRelation::Meets,
            Self::AdjB => AllenRelation::MetBy,
            Self::Precedes => AllenRelation::Before,
            Self::Follows => AllenRelation::After,
            Self::OverlapF => AllenRelation::Overlaps,
            Self::OverlapB => AllenRelation::OverlappedBy,
            Self::Within => AllenRelation::During,
            Self::Contains => AllenRelation::Contains,
            Self::StartAlign => AllenRelation::Starts,
            Self::StartExtend => AllenRelation::StartedBy,
            Self::EndAlign => AllenRelation::Finishes,
            Self::EndExtend => AllenRelation::FinishedBy,
        }
    }

    /// A human-readable description of the relation.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Eq => "intervals occupy the same extent",
            Self::AdjF => "first interval ends exactly where the second begins",
            Self::AdjB => "first interval begins exactly where the second ends",
            Self::Precedes => "first interval ends before the second begins",
            Self::Follows => "first interval begins after the second ends",
            Self::OverlapF => "first interval overlaps the front of the second",
            Self::OverlapB => "first interval overlaps the back of the second",
            Self::Within => "first interval lies strictly inside the second",
            Self::Contains => "first interval strictly contains the second",
            Self::StartAlign => "intervals share a start and the first ends earlier",
            Self::StartExtend => "intervals share a start and the first ends later",
            Self::EndAlign => "intervals share an end and the first starts later",
            Self::EndExtend => "intervals share an end and the first starts earlier",
        }
    }
}

impl std::fmt::Display for RelationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Map an Allen relation name to its language-neutral code.
pub fn allen_to_language_neutral(name: &str) -> Option<RelationCode> {
    AllenRelation::from_name(name).map(|r| r.to_code())
}

/// Human-readable description for a wire code string.
pub fn relation_description(code: &str) -> Option<&'static str> {
    RelationCode::from_code(code).map(|c| c.description())
}

fn anchored(interval: &Interval) -> TemporalResult<(Instant, Instant)> {
    interval.bounds().ok_or_else(|| {
        TemporalError::InvalidIntervalSpec(format!(
            "interval {} is not fully anchored",
            interval.id
        ))
    })
}

/// Classify two anchored intervals into their Allen relation, from the four
/// pairwise endpoint comparisons. Total: every anchored pair maps to
/// exactly one relation.
pub fn allen_relation(a: &Interval, b: &Interval) -> TemporalResult<AllenRelation> {
    let (a_start, a_end) = anchored(a)?;
    let (b_start, b_end) = anchored(b)?;

    let relation = match (a_start.cmp(&b_start), a_end.cmp(&b_end)) {
        (Ordering::Equal, Ordering::Equal) => AllenRelation::Equals,
        (Ordering::Equal, Ordering::Less) => AllenRelation::Starts,
        (Ordering::Equal, Ordering::Greater) => AllenRelation::StartedBy,
        (Ordering::Less, Ordering::Equal) => AllenRelation::FinishedBy,
        (Ordering::Greater, Ordering::Equal) => AllenRelation::Finishes,
        (Ordering::Less, Ordering::Greater) => AllenRelation::Contains,
        (Ordering::Greater, Ordering::Less) => AllenRelation::During,
        (Ordering::Less, Ordering::Less) => {
            if a_end < b_start {
                AllenRelation::Before
            } else if a_end == b_start {
                AllenRelation::Meets
            } else {
                AllenRelation::Overlaps
            }
        }
        (Ordering::Greater, Ordering::Greater) => {
            if b_end < a_start {
                AllenRelation::After
            } else if b_end == a_start {
                AllenRelation::MetBy
            } else {
                AllenRelation::OverlappedBy
            }
        }
    };
    Ok(relation)
}

/// Classify two intervals into a language-neutral relation code.
pub fn classify_relation(a: &Interval, b: &Interval) -> TemporalResult<RelationCode> {
    Ok(allen_relation(a, b)?.to_code())
}
