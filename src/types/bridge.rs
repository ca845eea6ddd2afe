//! Bridge markers — named decision and synchronization points used to
//! segment a timeline.
//!
//! A marker is a point, not a constraint: the lowering of relations into
//! STN bounds lives in `relations::lowering`.

use serde::Serialize;

use crate::relations::AllenRelation;

use super::error::TemporalResult;
use super::time::{self, Instant};
use super::Metadata;

/// What a bridge marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BridgeKind {
    /// A point where a plan branches on a choice.
    Decision,
    /// A point gated on a condition becoming true.
    Condition,
    /// A rendezvous between concurrent strands.
    Synchronization,
    /// A point where resource availability is re-checked.
    ResourceCheck,
    /// Inserted automatically by the timeline builder.
    AutoGenerated,
}

impl BridgeKind {
    /// Return a human-readable name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Condition => "condition",
            Self::Synchronization => "synchronization",
            Self::ResourceCheck => "resource_check",
            Self::AutoGenerated => "auto_generated",
        }
    }

    /// Parse a kind from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "decision" => Some(Self::Decision),
            "condition" => Some(Self::Condition),
            "synchronization" | "sync" => Some(Self::Synchronization),
            "resource_check" | "resourcecheck" => Some(Self::ResourceCheck),
            "auto_generated" | "autogenerated" => Some(Self::AutoGenerated),
            _ => None,
        }
    }
}

impl std::fmt::Display for BridgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a semantic bridge position is anchored to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SemanticRef {
    /// The whole timeline's bounds.
    Timeline,
    /// A specific interval, by id.
    Interval(String),
}

/// Where a bridge marker sits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BridgePosition {
    /// A concrete wall-clock position.
    Absolute(Instant),
    /// A position described relative to another entity, resolved lazily
    /// against the owning timeline.
    Semantic {
        relation: AllenRelation,
        reference: SemanticRef,
    },
}

/// A named point within a timeline.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeMarker {
    /// Unique id within the owning timeline.
    pub id: String,
    /// What the marker represents.
    pub kind: BridgeKind,
    /// Where the marker sits.
    pub position: BridgePosition,
    /// Resolved wall-clock position for semantic markers.
    pub computed_position: Option<Instant>,
    /// Free-form metadata.
    pub metadata: Metadata,
}

impl BridgeMarker {
    /// Create a marker at a concrete instant.
    pub fn at(id: impl Into<String>, kind: BridgeKind, position: Instant) -> Self {
        Self {
            id: id.into(),
            kind,
            position: BridgePosition::Absolute(position),
            computed_position: None,
            metadata: Metadata::new(),
        }
    }

    /// Create a marker at an ISO-8601 position.
    pub fn at_iso8601(
        id: impl Into<String>,
        kind: BridgeKind,
        position: &str,
    ) -> TemporalResult<Self> {
        Ok(Self::at(id, kind, time::parse_instant(position)?))
    }

    /// Create a marker positioned relative to the timeline or an interval.
    /// The wall-clock position stays unknown until the owning timeline
    /// resolves it.
    pub fn semantic(
        id: impl Into<String>,
        kind: BridgeKind,
        relation: AllenRelation,
        reference: SemanticRef,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            position: BridgePosition::Semantic {
                relation,
                reference,
            },
            computed_position: None,
            metadata: Metadata::new(),
        }
    }

    /// Merge entries into the metadata bag.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// The wall-clock position, if known. Semantic markers report None
    /// until the owning timeline resolves them.
    pub fn resolved_position(&self) -> Option<Instant> {
        match &self.position {
            BridgePosition::Absolute(t) => Some(*t),
            BridgePosition::Semantic { .. } => self.computed_position,
        }
    }

    /// Whether the marker sits exactly at `t`. Unresolved markers compare
    /// false to every instant.
    pub fn is_at(&self, t: Instant) -> bool {
        self.resolved_position() == Some(t)
    }

    /// Whether the marker sits before `t`. False when unresolved.
    pub fn is_before(&self, t: Instant) -> bool {
        self.resolved_position().is_some_and(|p| p < t)
    }

    /// Whether the marker sits after `t`. False when unresolved.
    pub fn is_after(&self, t: Instant) -> bool {
        self.resolved_position().is_some_and(|p| p > t)
    }
}
