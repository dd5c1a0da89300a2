use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ConsumedRecord, MediaFamily},
    services::history::{HistoryProvider, SessionResolver},
};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(Debug, FromRow)]
struct ConsumedRow {
    media_id: String,
    media_type: String,
    title: String,
    subtitle: Option<String>,
    consumed_at: chrono::DateTime<chrono::Utc>,
}

impl ConsumedRow {
    fn into_record(self) -> Option<ConsumedRecord> {
        let media_family = match self.media_type.parse::<MediaFamily>() {
            Ok(family) => family,
            Err(_) => {
                tracing::warn!(
                    media_id = %self.media_id,
                    media_type = %self.media_type,
                    "Skipping consumed row with unknown media type"
                );
                return None;
            }
        };

        Some(ConsumedRecord {
            media_id: self.media_id,
            media_family,
            title: self.title,
            subtitle: self.subtitle,
            consumed_at: self.consumed_at,
        })
    }
}

/// History and session store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HistoryProvider for PgStore {
    async fn list_consumed(&self, user_id: Uuid) -> AppResult<Vec<ConsumedRecord>> {
        let rows: Vec<ConsumedRow> = sqlx::query_as(
            r#"
            SELECT media_id, media_type, title, subtitle, consumed_at
            FROM consumed
            WHERE user_id = $1
            ORDER BY consumed_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let records: Vec<ConsumedRecord> =
            rows.into_iter().filter_map(ConsumedRow::into_record).collect();

        tracing::debug!(user_id = %user_id, records = records.len(), "Loaded consumption history");

        Ok(records)
    }
}

#[async_trait::async_trait]
impl SessionResolver for PgStore {
    async fn resolve(&self, token: &str) -> AppResult<Option<Uuid>> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM sessions
            WHERE token = $1 AND expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id)
    }
}
