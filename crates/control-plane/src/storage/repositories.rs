// Repository layer for database operations

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

const EVENT_COLUMNS: &str =
    "id, device_id, event_type, raw_payload, created_at, matched_responders, status";

/// Advisory lock key held while inserting an event
const EVENT_INSERT_LOCK: i64 = 0x6f75_7472_6561_6368;

const RESPONDER_COLUMNS: &str = "id, name, phone, email, lat, lon, services, created_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self { pool })
    }

    /// Apply embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Events
    // ============================================

    /// Insert an event. `created_at` is stamped by the database and never
    /// precedes the newest stored event.
    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        let mut tx = self.pool.begin().await?;

        // Inserts run one at a time so the MAX below sees every earlier insert
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(EVENT_INSERT_LOCK)
            .execute(&mut *tx)
            .await
            .context("Failed to acquire event insert lock")?;

        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (id, device_id, event_type, raw_payload, created_at, matched_responders, status)
            VALUES (
                $1, $2, $3, $4,
                GREATEST(clock_timestamp(), COALESCE((SELECT MAX(created_at) FROM events), clock_timestamp())),
                '{{}}', 'new'
            )
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(&input.device_id)
        .bind(&input.event_type)
        .bind(&input.raw_payload)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn mark_event_notified(
        &self,
        id: Uuid,
        responder_ids: &[Uuid],
    ) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET matched_responders = $2, status = 'notified'
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(responder_ids)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_events(&self, limit: i64) -> Result<Vec<EventRow>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_all_events(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM events")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> Result<StatsRow> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM events) AS total_events,
                (SELECT COUNT(*) FROM responders) AS total_responders,
                (SELECT COUNT(*) FROM events WHERE status = 'notified') AS active_alerts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Responders
    // ============================================

    pub async fn create_responder(&self, input: CreateResponderRow) -> Result<ResponderRow> {
        let row = sqlx::query_as::<_, ResponderRow>(&format!(
            r#"
            INSERT INTO responders (id, name, phone, email, lat, lon, services)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RESPONDER_COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.lat)
        .bind(input.lon)
        .bind(&input.services)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// All responders in creation order
    pub async fn list_responders(&self) -> Result<Vec<ResponderRow>> {
        let rows = sqlx::query_as::<_, ResponderRow>(&format!(
            "SELECT {RESPONDER_COLUMNS} FROM responders ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
