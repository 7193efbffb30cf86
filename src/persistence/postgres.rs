//! PostgreSQL implementation of the user and entity stores.
//!
//! Interaction appends run in a single transaction that locks the entity
//! row, inserts the event row, and re-derives both counters from the event
//! table. Counters therefore always match the logs, even under concurrent
//! appends.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::{EntityRow, EventRow, UserRow, to_i64, to_u64};
use super::{EntityStore, UserStore};
use crate::config::GatewayConfig;
use crate::domain::{
    EntityId, EntitySummary, InteractionKind, MarketplaceStats, TrackedEntity, TrackingEvent,
    UserRecord,
};
use crate::error::GatewayError;

type EntityTuple = (Uuid, String, String, String, DateTime<Utc>, i64, i64, i64);
type EventTuple = (String, String, DateTime<Utc>, String, String);

const ENTITY_COLUMNS: &str =
    "id, owner_id, title, category, created_at, click_count, view_count, version";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the pool settings from `config` and applies the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the database cannot be
    /// reached, or [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        tracing::info!("connected to postgres and applied migrations");
        Ok(Self::new(pool))
    }

    async fn insert_events(
        tx: &mut Transaction<'_, Postgres>,
        entity: &TrackedEntity,
    ) -> Result<(), GatewayError> {
        for kind in [InteractionKind::Click, InteractionKind::View] {
            for event in entity.log(kind) {
                insert_event(tx, *entity.id.as_uuid(), kind, event).await?;
            }
        }
        Ok(())
    }
}

async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    entity_id: Uuid,
    kind: InteractionKind,
    event: &TrackingEvent,
) -> Result<(), GatewayError> {
    sqlx::query(
        "INSERT INTO tracking_events \
         (entity_id, kind, actor_id, occurred_at, device_label, source_address) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entity_id)
    .bind(kind.as_str())
    .bind(&event.actor_id)
    .bind(event.occurred_at)
    .bind(&event.device_label)
    .bind(&event.source_address)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn entity_row(t: EntityTuple) -> EntityRow {
    let (id, owner_id, title, category, created_at, click_count, view_count, version) = t;
    EntityRow {
        id,
        owner_id,
        title,
        category,
        created_at,
        click_count,
        view_count,
        version,
    }
}

fn event_row(t: EventTuple) -> EventRow {
    let (kind, actor_id, occurred_at, device_label, source_address) = t;
    EventRow {
        kind,
        actor_id,
        occurred_at,
        device_label,
        source_address,
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserRecord>, GatewayError> {
        let row = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
            "SELECT identifier, role, display_name, email FROM users WHERE identifier = $1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        Ok(row.map(|(identifier, role, display_name, email)| {
            UserRecord::from(UserRow {
                identifier,
                role,
                display_name,
                email,
            })
        }))
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    async fn insert(&self, entity: TrackedEntity) -> Result<EntityId, GatewayError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO entities \
             (id, owner_id, title, category, created_at, click_count, view_count, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0)",
        )
        .bind(entity.id.as_uuid())
        .bind(&entity.owner_id)
        .bind(&entity.title)
        .bind(&entity.category)
        .bind(entity.created_at)
        .bind(to_i64(entity.clicks.len() as u64))
        .bind(to_i64(entity.views.len() as u64))
        .execute(&mut *tx)
        .await?;
        Self::insert_events(&mut tx, &entity).await?;
        tx.commit().await?;
        Ok(entity.id)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<TrackedEntity>, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, EntityTuple>(&format!(
            "SELECT {ENTITY_COLUMNS} FROM entities WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let events = sqlx::query_as::<_, EventTuple>(
            "SELECT kind, actor_id, occurred_at, device_label, source_address \
             FROM tracking_events WHERE entity_id = $1 ORDER BY id ASC",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(
            entity_row(row).into_entity(events.into_iter().map(event_row).collect()),
        ))
    }

    async fn save(
        &self,
        entity: &TrackedEntity,
        expected_version: u64,
    ) -> Result<u64, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let new_version = sqlx::query_scalar::<_, i64>(
            "UPDATE entities SET owner_id = $2, title = $3, category = $4, \
             click_count = $5, view_count = $6, version = version + 1 \
             WHERE id = $1 AND version = $7 RETURNING version",
        )
        .bind(entity.id.as_uuid())
        .bind(&entity.owner_id)
        .bind(&entity.title)
        .bind(&entity.category)
        .bind(to_i64(entity.clicks.len() as u64))
        .bind(to_i64(entity.views.len() as u64))
        .bind(to_i64(expected_version))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_version) = new_version else {
            let exists = sqlx::query_scalar::<_, i64>("SELECT version FROM entities WHERE id = $1")
                .bind(entity.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            return Err(if exists {
                GatewayError::VersionConflict(entity.id)
            } else {
                GatewayError::EntityNotFound(entity.id)
            });
        };

        sqlx::query("DELETE FROM tracking_events WHERE entity_id = $1")
            .bind(entity.id.as_uuid())
            .execute(&mut *tx)
            .await?;
        Self::insert_events(&mut tx, entity).await?;
        tx.commit().await?;
        Ok(to_u64(new_version))
    }

    async fn append_interaction(
        &self,
        id: EntityId,
        kind: InteractionKind,
        event: TrackingEvent,
    ) -> Result<u64, GatewayError> {
        let mut tx = self.pool.begin().await?;
        let locked = sqlx::query_scalar::<_, i64>(
            "SELECT version FROM entities WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(GatewayError::EntityNotFound(id));
        }

        insert_event(&mut tx, *id.as_uuid(), kind, &event).await?;

        let (click_count, view_count) = sqlx::query_as::<_, (i64, i64)>(
            "UPDATE entities SET \
             click_count = (SELECT COUNT(*) FROM tracking_events WHERE entity_id = $1 AND kind = 'click'), \
             view_count = (SELECT COUNT(*) FROM tracking_events WHERE entity_id = $1 AND kind = 'view'), \
             version = version + 1 \
             WHERE id = $1 RETURNING click_count, view_count",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(match kind {
            InteractionKind::Click => to_u64(click_count),
            InteractionKind::View => to_u64(view_count),
        })
    }

    async fn list(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<EntitySummary>, u64), GatewayError> {
        let rows = sqlx::query_as::<_, EntityTuple>(&format!(
            "SELECT {ENTITY_COLUMNS} FROM entities \
             ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(to_i64(limit as u64))
        .bind(to_i64(offset as u64))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entities")
            .fetch_one(&self.pool)
            .await?;

        Ok((
            rows.into_iter()
                .map(|t| entity_row(t).into_summary())
                .collect(),
            to_u64(total),
        ))
    }

    async fn stats(&self, top_n: usize) -> Result<MarketplaceStats, GatewayError> {
        let (total_entities, total_clicks, total_views) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                "SELECT COUNT(*), \
                 COALESCE(SUM(click_count), 0)::BIGINT, \
                 COALESCE(SUM(view_count), 0)::BIGINT \
                 FROM entities",
            )
            .fetch_one(&self.pool)
            .await?;

        let top = sqlx::query_as::<_, EntityTuple>(&format!(
            "SELECT {ENTITY_COLUMNS} FROM entities \
             ORDER BY view_count DESC, created_at DESC LIMIT $1"
        ))
        .bind(to_i64(top_n as u64))
        .fetch_all(&self.pool)
        .await?;

        Ok(MarketplaceStats {
            total_entities: to_u64(total_entities),
            total_clicks: to_u64(total_clicks),
            total_views: to_u64(total_views),
            top_viewed: top
                .into_iter()
                .map(|t| entity_row(t).into_summary())
                .collect(),
        })
    }
}
