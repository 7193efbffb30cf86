//! Database row models for users, entities, and tracking events.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    EntityId, EntitySummary, InteractionKind, TrackedEntity, TrackingEvent, UserRecord, UserRole,
};

/// A row from the `users` table.
#[derive(Debug, Clone)]
pub struct UserRow {
    /// Identity-provider identifier.
    pub identifier: String,
    /// Role string (`"admin"` or `"customer"`).
    pub role: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Optional email.
    pub email: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        let role = row.role.parse().unwrap_or_else(|_| {
            tracing::warn!(user = %row.identifier, role = %row.role, "unrecognised role, treating as customer");
            UserRole::Customer
        });
        Self {
            identifier: row.identifier,
            role,
            display_name: row.display_name,
            email: row.email,
        }
    }
}

/// A row from the `entities` table (without logs).
#[derive(Debug, Clone)]
pub struct EntityRow {
    /// Entity UUID.
    pub id: Uuid,
    /// Owner identifier.
    pub owner_id: String,
    /// Listing title.
    pub title: String,
    /// Listing category.
    pub category: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Stored click counter.
    pub click_count: i64,
    /// Stored view counter.
    pub view_count: i64,
    /// Revision number.
    pub version: i64,
}

impl EntityRow {
    /// Builds a summary from the stored counters.
    #[must_use]
    pub fn into_summary(self) -> EntitySummary {
        EntitySummary {
            id: EntityId::from_uuid(self.id),
            owner_id: self.owner_id,
            title: self.title,
            category: self.category,
            created_at: self.created_at,
            click_count: to_u64(self.click_count),
            view_count: to_u64(self.view_count),
        }
    }

    /// Assembles a full entity from the row and its event rows.
    ///
    /// Counters are re-derived from the logs.
    #[must_use]
    pub fn into_entity(self, events: Vec<EventRow>) -> TrackedEntity {
        let mut entity = TrackedEntity {
            id: EntityId::from_uuid(self.id),
            owner_id: self.owner_id,
            title: self.title,
            category: self.category,
            created_at: self.created_at,
            clicks: Vec::new(),
            views: Vec::new(),
            click_count: 0,
            view_count: 0,
            version: to_u64(self.version),
        };
        for row in events {
            match row.kind.parse::<InteractionKind>() {
                Ok(InteractionKind::Click) => entity.clicks.push(row.into_event()),
                Ok(InteractionKind::View) => entity.views.push(row.into_event()),
                Err(e) => tracing::warn!(entity_id = %entity.id, error = %e, "skipping event row"),
            }
        }
        entity.recount();
        entity
    }
}

/// A row from the `tracking_events` table.
#[derive(Debug, Clone)]
pub struct EventRow {
    /// `"click"` or `"view"`.
    pub kind: String,
    /// Interacting actor.
    pub actor_id: String,
    /// Interaction timestamp.
    pub occurred_at: DateTime<Utc>,
    /// Device description.
    pub device_label: String,
    /// Source network address.
    pub source_address: String,
}

impl EventRow {
    /// Converts the row into a domain event.
    #[must_use]
    pub fn into_event(self) -> TrackingEvent {
        TrackingEvent {
            actor_id: self.actor_id,
            occurred_at: self.occurred_at,
            device_label: self.device_label,
            source_address: self.source_address,
        }
    }
}

/// Converts a non-negative database counter to `u64`, clamping negatives
/// to zero.
#[must_use]
pub fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Converts a `u64` to a database `BIGINT`, saturating at `i64::MAX`.
#[must_use]
pub fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_row(kind: &str, actor: &str) -> EventRow {
        EventRow {
            kind: kind.to_string(),
            actor_id: actor.to_string(),
            occurred_at: Utc::now(),
            device_label: "agent".to_string(),
            source_address: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn entity_counters_come_from_event_rows() {
        let row = EntityRow {
            id: Uuid::new_v4(),
            owner_id: "seller".to_string(),
            title: "Loft".to_string(),
            category: "houses".to_string(),
            created_at: Utc::now(),
            click_count: 99,
            view_count: 99,
            version: 4,
        };
        let entity = row.into_entity(vec![
            event_row("view", "anonymous"),
            event_row("click", "u1"),
            event_row("view", "u2"),
            event_row("bogus", "u3"),
        ]);
        assert_eq!(entity.click_count, 1);
        assert_eq!(entity.view_count, 2);
        assert_eq!(entity.version, 4);
    }

    #[test]
    fn unknown_role_is_not_admin() {
        let record = UserRecord::from(UserRow {
            identifier: "u1".to_string(),
            role: "superuser".to_string(),
            display_name: None,
            email: None,
        });
        assert!(!record.is_admin());
    }

    #[test]
    fn counter_conversions_clamp() {
        assert_eq!(to_u64(-3), 0);
        assert_eq!(to_i64(u64::MAX), i64::MAX);
    }
}
