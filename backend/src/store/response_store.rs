// src/store/response_store.rs

use std::time::Duration;

use sqlx::{QueryBuilder, Sqlite, SqlitePool, sqlite::SqlitePoolOptions};

use crate::{
    config::MAX_PAGE_SIZE,
    error::AppError,
    models::response::{ResponseQuery, ResponseRecord, StoredResponse, SubmissionSummary},
};

/// Append-only log of finalized answers.
#[derive(Clone)]
pub struct ResponseStore {
    pool: SqlitePool,
}

impl ResponseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool on `database_url` and applies the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        // An in-memory database only exists inside one connection.
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
            .acquire_timeout(Duration::from_secs(3))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Appends one finalize batch inside a single transaction: either every
    /// record lands or none does.
    pub async fn append(&self, records: &[ResponseRecord]) -> Result<(), AppError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO responses
                (candidate_name, candidate_email, started_at, submitted_at, question_id, question_text, answer_text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&record.candidate_name)
            .bind(&record.candidate_email)
            .bind(record.started_at)
            .bind(record.submitted_at)
            .bind(record.question_id)
            .bind(&record.question_text)
            .bind(&record.answer_text)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert response: {:?}", e);
                AppError::Storage(e.to_string())
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Raw records, newest submission first.
    pub async fn query(&self, filter: &ResponseQuery) -> Result<Vec<StoredResponse>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, candidate_name, candidate_email, started_at, submitted_at, \
             question_id, question_text, answer_text FROM responses",
        );

        if let Some(email) = filter.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            builder.push(" WHERE candidate_email = ");
            builder.push_bind(email.to_string());
        }

        builder.push(" ORDER BY submitted_at DESC, id ASC");

        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit.clamp(1, MAX_PAGE_SIZE));
        }

        let rows = builder
            .build_query_as::<StoredResponse>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query responses: {:?}", e);
                AppError::Storage(e.to_string())
            })?;

        Ok(rows)
    }

    /// Most recent submission events, one row per (candidate email, submitted_at).
    pub async fn recent_submissions(&self, limit: i64) -> Result<Vec<SubmissionSummary>, AppError> {
        let summaries = sqlx::query_as::<_, SubmissionSummary>(
            r#"
            SELECT
                MAX(candidate_name) AS candidate_name,
                candidate_email,
                MIN(started_at) AS started_at,
                submitted_at,
                COUNT(*) AS question_count,
                SUM(CASE WHEN answer_text <> '' THEN 1 ELSE 0 END) AS answered_count
            FROM responses
            GROUP BY candidate_email, submitted_at
            ORDER BY submitted_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit.clamp(1, MAX_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch recent submissions: {:?}", e);
            AppError::Storage(e.to_string())
        })?;

        Ok(summaries)
    }
}
