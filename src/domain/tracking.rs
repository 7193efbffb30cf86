//! Tracked entities and their interaction logs.
//!
//! A [`TrackedEntity`] owns two append-only logs of [`TrackingEvent`]s
//! (clicks and views) together with denormalized counters. The counters
//! are always derived from the log lengths, never incremented on their
//! own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::EntityId;

/// Actor identifier recorded for unauthenticated traffic.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// Kind of interaction being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// The listing was clicked (e.g. contact details revealed).
    Click,
    /// The listing page was viewed.
    View,
}

impl InteractionKind {
    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::View => "view",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(Self::Click),
            "view" => Ok(Self::View),
            other => Err(format!("unknown interaction kind: {other}")),
        }
    }
}

/// A single click or view. Immutable once appended to a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrackingEvent {
    /// Who interacted; [`ANONYMOUS_ACTOR`] for unauthenticated traffic.
    pub actor_id: String,
    /// When the interaction happened.
    pub occurred_at: DateTime<Utc>,
    /// Free-form device description (usually the user agent).
    pub device_label: String,
    /// Network address the interaction came from.
    pub source_address: String,
}

impl TrackingEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(
        actor_id: impl Into<String>,
        device_label: impl Into<String>,
        source_address: impl Into<String>,
    ) -> Self {
        Self::at(actor_id, device_label, source_address, Utc::now())
    }

    /// Creates an event with an explicit timestamp.
    #[must_use]
    pub fn at(
        actor_id: impl Into<String>,
        device_label: impl Into<String>,
        source_address: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            occurred_at,
            device_label: device_label.into(),
            source_address: source_address.into(),
        }
    }
}

/// An advertisement with its interaction logs and counters.
///
/// Invariant after every successful mutation:
/// `click_count == clicks.len()` and `view_count == views.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// Unique entity identifier.
    pub id: EntityId,
    /// Identifier of the user who published the advertisement.
    pub owner_id: String,
    /// Listing title.
    pub title: String,
    /// Listing category (e.g. `"cars"`, `"houses"`).
    pub category: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Click log in insertion order.
    pub clicks: Vec<TrackingEvent>,
    /// View log in insertion order.
    pub views: Vec<TrackingEvent>,
    /// Denormalized `clicks.len()`.
    pub click_count: u64,
    /// Denormalized `views.len()`.
    pub view_count: u64,
    /// Revision number, bumped by the store on every successful write.
    pub version: u64,
}

impl TrackedEntity {
    /// Creates an entity with empty logs.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            owner_id: owner_id.into(),
            title: title.into(),
            category: category.into(),
            created_at: Utc::now(),
            clicks: Vec::new(),
            views: Vec::new(),
            click_count: 0,
            view_count: 0,
            version: 0,
        }
    }

    /// Returns the log for the given interaction kind.
    #[must_use]
    pub fn log(&self, kind: InteractionKind) -> &[TrackingEvent] {
        match kind {
            InteractionKind::Click => &self.clicks,
            InteractionKind::View => &self.views,
        }
    }

    /// Returns the counter for the given interaction kind.
    #[must_use]
    pub const fn count(&self, kind: InteractionKind) -> u64 {
        match kind {
            InteractionKind::Click => self.click_count,
            InteractionKind::View => self.view_count,
        }
    }

    /// Appends an event to the selected log and returns the recomputed
    /// counter.
    pub fn append(&mut self, kind: InteractionKind, event: TrackingEvent) -> u64 {
        match kind {
            InteractionKind::Click => self.clicks.push(event),
            InteractionKind::View => self.views.push(event),
        }
        self.recount();
        self.count(kind)
    }

    /// Re-derives both counters from the log lengths.
    pub fn recount(&mut self) {
        self.click_count = self.clicks.len() as u64;
        self.view_count = self.views.len() as u64;
    }
}

/// Lightweight summary of an entity for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntitySummary {
    /// Entity identifier.
    pub id: EntityId,
    /// Owner identifier.
    pub owner_id: String,
    /// Listing title.
    pub title: String,
    /// Listing category.
    pub category: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Number of clicks.
    pub click_count: u64,
    /// Number of views.
    pub view_count: u64,
}

impl From<&TrackedEntity> for EntitySummary {
    fn from(entity: &TrackedEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id.clone(),
            title: entity.title.clone(),
            category: entity.category.clone(),
            created_at: entity.created_at,
            click_count: entity.click_count,
            view_count: entity.view_count,
        }
    }
}

/// Marketplace-wide interaction totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MarketplaceStats {
    /// Number of tracked entities.
    pub total_entities: u64,
    /// Sum of all click counters.
    pub total_clicks: u64,
    /// Sum of all view counters.
    pub total_views: u64,
    /// Most viewed entities, highest first.
    pub top_viewed: Vec<EntitySummary>,
}
