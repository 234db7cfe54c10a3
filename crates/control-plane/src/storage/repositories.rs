// Repository layer for PostgreSQL
// Decision: runtime-checked queries (query_as) so the crate builds without a live database
// Decision: ids are generated in Rust (uuid v7) so both backends agree on ordering

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::models::*;
use super::ShortCodeTaken;

/// Postgres error code for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

const EVENT_COLUMNS: &str = "id, short_code, title, description, owner_id, active_activity_id, created_at, updated_at, deleted_at";
const ACTIVITY_COLUMNS: &str = "id, event_id, position, kind, content, created_at, updated_at";
const RESPONSE_COLUMNS: &str = "id, activity_id, respondent_key, answer, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        let sql = format!(
            r#"
            INSERT INTO events (id, short_code, title, description, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, EventRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(&input.short_code)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_short_code_conflict(e, &input.short_code))
    }

    /// Active (non-deleted) event by id
    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Active event holding `short_code`
    pub async fn get_event_by_short_code(&self, short_code: &str) -> Result<Option<EventRow>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE short_code = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(short_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_events_for_owner(&self, owner_id: Uuid) -> Result<Vec<EventRow>> {
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE owner_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn update_event(&self, id: Uuid, input: UpdateEventRow) -> Result<Option<EventRow>> {
        let sql = format!(
            r#"
            UPDATE events
            SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let (set_description, description) = match input.description {
            Some(d) => (true, d),
            None => (false, None),
        };
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(set_description)
            .bind(&description)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn set_event_short_code(
        &self,
        id: Uuid,
        short_code: &str,
    ) -> Result<Option<EventRow>> {
        let sql = format!(
            r#"
            UPDATE events
            SET short_code = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {EVENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(short_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_short_code_conflict(e, short_code))
    }

    pub async fn set_active_activity(
        &self,
        id: Uuid,
        activity_id: Option<Uuid>,
    ) -> Result<Option<EventRow>> {
        let sql = format!(
            r#"
            UPDATE events
            SET active_activity_id = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(activity_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Soft delete. Returns false if the event was missing or already deleted.
    pub async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Activities
    // ============================================

    /// Append an activity at the end of its event
    /// Append an activity. The event row is locked so concurrent creates
    /// and deletes for the same event take positions one at a time.
    pub async fn create_activity(&self, input: CreateActivityRow) -> Result<ActivityRow> {
        let mut tx = self.pool.begin().await?;
        lock_event(&mut tx, input.event_id).await?;

        let sql = format!(
            r#"
            INSERT INTO activities (id, event_id, position, kind, content)
            VALUES (
                $1, $2,
                (SELECT COUNT(*)::INT FROM activities WHERE event_id = $2),
                $3, $4
            )
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(input.event_id)
            .bind(&input.kind)
            .bind(&input.content)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn get_activity(&self, id: Uuid) -> Result<Option<ActivityRow>> {
        let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = $1");
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_activities(&self, event_id: Uuid) -> Result<Vec<ActivityRow>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE event_id = $1 ORDER BY position ASC"
        );
        let rows = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn update_activity_content(
        &self,
        id: Uuid,
        content: serde_json::Value,
    ) -> Result<Option<ActivityRow>> {
        let sql = format!(
            r#"
            UPDATE activities
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(id)
            .bind(&content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Delete an activity, close the gap in positions and clear it as the
    /// event's active activity.
    pub async fn delete_activity(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT event_id FROM activities WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((event_id,)) = owner else {
            return Ok(false);
        };
        lock_event(&mut tx, event_id).await?;

        // Re-read under the lock; a concurrent delete may have won
        let deleted: Option<(i32,)> =
            sqlx::query_as("DELETE FROM activities WHERE id = $1 RETURNING position")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((position,)) = deleted else {
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE activities
            SET position = position - 1
            WHERE event_id = $1 AND position > $2
            "#,
        )
        .bind(event_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE events
            SET active_activity_id = NULL, updated_at = NOW()
            WHERE id = $1 AND active_activity_id = $2
            "#,
        )
        .bind(event_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Assign positions in the given order. Ids must already be validated as
    /// a permutation of the event's activities.
    pub async fn reorder_activities(
        &self,
        event_id: Uuid,
        activity_ids: &[Uuid],
    ) -> Result<Vec<ActivityRow>> {
        let mut tx = self.pool.begin().await?;
        lock_event(&mut tx, event_id).await?;
        for (position, id) in activity_ids.iter().enumerate() {
            sqlx::query(
                r#"
                UPDATE activities
                SET position = $3, updated_at = NOW()
                WHERE id = $1 AND event_id = $2
                "#,
            )
            .bind(id)
            .bind(event_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.list_activities(event_id).await
    }

    // ============================================
    // Responses
    // ============================================

    /// Insert or replace the respondent's answer; `created_at` is preserved
    pub async fn upsert_response(&self, input: UpsertResponseRow) -> Result<ActivityResponseRow> {
        let sql = format!(
            r#"
            INSERT INTO activity_responses (id, activity_id, respondent_key, answer)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (activity_id, respondent_key)
            DO UPDATE SET answer = EXCLUDED.answer, updated_at = NOW()
            RETURNING {RESPONSE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ActivityResponseRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(input.activity_id)
            .bind(&input.respondent_key)
            .bind(&input.answer)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_response(
        &self,
        activity_id: Uuid,
        respondent_key: &str,
    ) -> Result<Option<ActivityResponseRow>> {
        let sql = format!(
            r#"
            SELECT {RESPONSE_COLUMNS}
            FROM activity_responses
            WHERE activity_id = $1 AND respondent_key = $2
            "#
        );
        let row = sqlx::query_as::<_, ActivityResponseRow>(&sql)
            .bind(activity_id)
            .bind(respondent_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_responses(&self, activity_id: Uuid) -> Result<Vec<ActivityResponseRow>> {
        let sql = format!(
            r#"
            SELECT {RESPONSE_COLUMNS}
            FROM activity_responses
            WHERE activity_id = $1
            ORDER BY created_at ASC
            "#
        );
        let rows = sqlx::query_as::<_, ActivityResponseRow>(&sql)
            .bind(activity_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn delete_responses(&self, activity_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM activity_responses WHERE activity_id = $1")
            .bind(activity_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Take the event row lock that serializes position changes of its activities
async fn lock_event(conn: &mut PgConnection, event_id: Uuid) -> Result<()> {
    sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn map_short_code_conflict(err: sqlx::Error, short_code: &str) -> anyhow::Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return ShortCodeTaken(short_code.to_string()).into();
        }
    }
    err.into()
}
