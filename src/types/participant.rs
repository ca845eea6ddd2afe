//! Participants — agents that act, entities that are acted upon, and
//! hybrids that switch between the two.

use std::collections::BTreeSet;

use serde::Serialize;

use super::error::{TemporalError, TemporalResult};
use super::Metadata;

/// Which face a hybrid participant currently presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParticipantMode {
    Agent,
    Entity,
}

impl ParticipantMode {
    /// Return a human-readable name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Entity => "entity",
        }
    }

    /// Parse a mode from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "agent" => Some(Self::Agent),
            "entity" => Some(Self::Entity),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParticipantMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An actor or object attached to intervals on a timeline.
///
/// The variant is the type tag: agents hold capability tokens and act,
/// entities are acted upon and may name an owning agent (an id lookup, never
/// a pointer), hybrids carry both shapes and switch modes at runtime.
#[derive(Debug, Clone, Serialize)]
pub enum Participant {
    /// An actor holding capability tokens.
    Agent {
        id: String,
        name: String,
        properties: Metadata,
        metadata: Metadata,
        capabilities: BTreeSet<String>,
    },
    /// An object, optionally owned by an agent.
    Entity {
        id: String,
        name: String,
        properties: Metadata,
        metadata: Metadata,
        owner_agent_id: Option<String>,
    },
    /// Switches between agent and entity roles.
    Hybrid {
        id: String,
        name: String,
        properties: Metadata,
        metadata: Metadata,
        capabilities: BTreeSet<String>,
        current_mode: ParticipantMode,
    },
}

impl Participant {
    /// Create an agent with no capabilities.
    pub fn agent(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Agent {
            id: id.into(),
            name: name.into(),
            properties: Metadata::new(),
            metadata: Metadata::new(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Create an unowned entity.
    pub fn entity(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Entity {
            id: id.into(),
            name: name.into(),
            properties: Metadata::new(),
            metadata: Metadata::new(),
            owner_agent_id: None,
        }
    }

    /// Create a hybrid starting in the given mode.
    pub fn hybrid(
        id: impl Into<String>,
        name: impl Into<String>,
        mode: ParticipantMode,
    ) -> Self {
        Self::Hybrid {
            id: id.into(),
            name: name.into(),
            properties: Metadata::new(),
            metadata: Metadata::new(),
            capabilities: BTreeSet::new(),
            current_mode: mode,
        }
    }

    /// Replace the property bag.
    pub fn with_properties(mut self, properties: Metadata) -> Self {
        match &mut self {
            Self::Agent { properties: p, .. }
            | Self::Entity { properties: p, .. }
            | Self::Hybrid { properties: p, .. } => *p = properties,
        }
        self
    }

    /// Replace the metadata bag.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        match &mut self {
            Self::Agent { metadata: m, .. }
            | Self::Entity { metadata: m, .. }
            | Self::Hybrid { metadata: m, .. } => *m = metadata,
        }
        self
    }

    /// Install capability tokens. Entities are left unchanged.
    pub fn with_capabilities<I, S>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Self::Agent { capabilities, .. } | Self::Hybrid { capabilities, .. } = &mut self {
            capabilities.extend(caps.into_iter().map(Into::into));
        }
        self
    }

    /// Set the owning agent id. Non-entities are left unchanged.
    pub fn with_owner(mut self, agent_id: impl Into<String>) -> Self {
        if let Self::Entity { owner_agent_id, .. } = &mut self {
            *owner_agent_id = Some(agent_id.into());
        }
        self
    }

    /// The participant's unique id.
    pub fn id(&self) -> &str {
        match self {
            Self::Agent { id, .. } | Self::Entity { id, .. } | Self::Hybrid { id, .. } => id,
        }
    }

    /// The participant's display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Agent { name, .. } | Self::Entity { name, .. } | Self::Hybrid { name, .. } => {
                name
            }
        }
    }

    /// The property bag.
    pub fn properties(&self) -> &Metadata {
        match self {
            Self::Agent { properties, .. }
            | Self::Entity { properties, .. }
            | Self::Hybrid { properties, .. } => properties,
        }
    }

    /// The metadata bag.
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Agent { metadata, .. }
            | Self::Entity { metadata, .. }
            | Self::Hybrid { metadata, .. } => metadata,
        }
    }

    /// The variant tag as a string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Agent { .. } => "agent",
            Self::Entity { .. } => "entity",
            Self::Hybrid { .. } => "hybrid",
        }
    }

    /// Whether this is a pure agent.
    pub fn is_agent(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }

    /// Whether this is a pure entity.
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Entity { .. })
    }

    /// Whether this is a hybrid.
    pub fn is_hybrid(&self) -> bool {
        matches!(self, Self::Hybrid { .. })
    }

    /// True for agents, and for hybrids currently in agent mode.
    pub fn is_currently_agent(&self) -> bool {
        match self {
            Self::Agent { .. } => true,
            Self::Entity { .. } => false,
            Self::Hybrid { current_mode, .. } => *current_mode == ParticipantMode::Agent,
        }
    }

    /// The capability set, when the variant carries one.
    pub fn capabilities(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Agent { capabilities, .. } | Self::Hybrid { capabilities, .. } => {
                Some(capabilities)
            }
            Self::Entity { .. } => None,
        }
    }

    /// Whether the participant holds the capability token.
    pub fn has_capability(&self, cap: &str) -> bool {
        self.capabilities().is_some_and(|c| c.contains(cap))
    }

    /// Add one capability token. No-op on entities.
    pub fn add_capability(&mut self, cap: impl Into<String>) {
        if let Self::Agent { capabilities, .. } | Self::Hybrid { capabilities, .. } = self {
            capabilities.insert(cap.into());
        }
    }

    /// Add several capability tokens. No-op on entities.
    pub fn add_capabilities<I, S>(&mut self, caps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Self::Agent { capabilities, .. } | Self::Hybrid { capabilities, .. } = self {
            capabilities.extend(caps.into_iter().map(Into::into));
        }
    }

    /// Remove capability tokens. No-op on entities.
    pub fn remove_capabilities(&mut self, caps: &[&str]) {
        if let Self::Agent { capabilities, .. } | Self::Hybrid { capabilities, .. } = self {
            for cap in caps {
                capabilities.remove(*cap);
            }
        }
    }

    /// True when the participant is currently an agent holding `action`.
    pub fn can_perform_action(&self, action: &str) -> bool {
        self.is_currently_agent() && self.has_capability(action)
    }

    /// Force the participant into agent mode and install `capabilities`.
    ///
    /// Pure entities lack the agent shape and fail with `InvalidTransition`.
    pub fn transition_to_agent<I, S>(&mut self, caps: I) -> TemporalResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let installed: BTreeSet<String> = caps.into_iter().map(Into::into).collect();
        match self {
            Self::Agent { capabilities, .. } => {
                *capabilities = installed;
                Ok(())
            }
            Self::Hybrid {
                capabilities,
                current_mode,
                ..
            } => {
                *capabilities = installed;
                *current_mode = ParticipantMode::Agent;
                Ok(())
            }
            Self::Entity { id, .. } => Err(TemporalError::InvalidTransition {
                id: id.clone(),
                reason: "a pure entity has no agent shape".to_string(),
            }),
        }
    }

    /// Drop into entity mode, clearing the participant's agent powers.
    ///
    /// An agent becomes a hybrid in entity mode (its capability set is
    /// retained but powerless until a transition back). Pure entities fail
    /// with `InvalidTransition`.
    pub fn transition_to_entity(&mut self) -> TemporalResult<()> {
        match self {
            Self::Agent {
                id,
                name,
                properties,
                metadata,
                capabilities,
            } => {
                *self = Self::Hybrid {
                    id: id.clone(),
                    name: name.clone(),
                    properties: properties.clone(),
                    metadata: metadata.clone(),
                    capabilities: capabilities.clone(),
                    current_mode: ParticipantMode::Entity,
                };
                Ok(())
            }
            Self::Hybrid { current_mode, .. } => {
                *current_mode = ParticipantMode::Entity;
                Ok(())
            }
            Self::Entity { id, .. } => Err(TemporalError::InvalidTransition {
                id: id.clone(),
                reason: "already a pure entity".to_string(),
            }),
        }
    }

    /// Whether this entity is owned by `agent_id`. Non-entities own nothing
    /// and report false.
    pub fn owned_by(&self, agent_id: &str) -> bool {
        matches!(self, Self::Entity { owner_agent_id: Some(owner), .. } if owner == agent_id)
    }

    /// Whether this entity has an owner.
    pub fn has_owner(&self) -> bool {
        matches!(
            self,
            Self::Entity {
                owner_agent_id: Some(_),
                ..
            }
        )
    }

    /// The owning agent's id, if any.
    pub fn owner_agent_id(&self) -> Option<&str> {
        match self {
            Self::Entity { owner_agent_id, .. } => owner_agent_id.as_deref(),
            _ => None,
        }
    }

    /// Hand the entity to a new owner. Only entities have owners.
    pub fn transfer_ownership(&mut self, new_owner: impl Into<String>) -> TemporalResult<()> {
        match self {
            Self::Entity { owner_agent_id, .. } => {
                *owner_agent_id = Some(new_owner.into());
                Ok(())
            }
            _ => Err(TemporalError::InvalidParticipant(format!(
                "{} {} cannot be owned",
                self.kind_name(),
                self.id()
            ))),
        }
    }

    /// Clear the entity's owner. Only entities have owners.
    pub fn remove_ownership(&mut self) -> TemporalResult<()> {
        match self {
            Self::Entity { owner_agent_id, .. } => {
                *owner_agent_id = None;
                Ok(())
            }
            _ => Err(TemporalError::InvalidParticipant(format!(
                "{} {} cannot be owned",
                self.kind_name(),
                self.id()
            ))),
        }
    }

    /// Validate the participant's shape.
    pub fn validate(&self) -> TemporalResult<()> {
        if self.id().is_empty() {
            return Err(TemporalError::InvalidParticipant(
                "empty participant id".to_string(),
            ));
        }
        if self.name().is_empty() {
            return Err(TemporalError::InvalidParticipant(format!(
                "participant {} has an empty name",
                self.id()
            )));
        }
        Ok(())
    }
}
