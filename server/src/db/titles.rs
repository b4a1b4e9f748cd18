//! PostgreSQL-backed title store.

use async_trait::async_trait;
use reelrack_engine::{
    CatalogRecord, Error as EngineError, Genre, Kind, NewRecord, RecordFields, RecordPatch,
    Timestamp, WriteOutcome,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Row};

use super::{now_millis, TitleStore};
use crate::error::{AppError, Result};

const MAX_CONNECTIONS: u32 = 10;

const SELECT_TITLES: &str = r#"
    SELECT id, title, kind, year, genres, cast_summary, description,
           poster_url, trailer_url, created_by, created_at, updated_at
    FROM titles
"#;

/// A row of the `titles` table.
#[derive(Debug)]
struct TitleRow {
    id: String,
    title: String,
    kind: String,
    year: i32,
    genres: serde_json::Value,
    cast_summary: String,
    description: String,
    poster_url: String,
    trailer_url: String,
    created_by: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TitleRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(TitleRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            kind: row.try_get("kind")?,
            year: row.try_get("year")?,
            genres: row.try_get("genres")?,
            cast_summary: row.try_get("cast_summary")?,
            description: row.try_get("description")?,
            poster_url: row.try_get("poster_url")?,
            trailer_url: row.try_get("trailer_url")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TitleRow {
    fn into_record(self) -> Result<CatalogRecord> {
        let kind: Kind = self.kind.parse()?;
        let genres: Vec<Genre> = serde_json::from_value(self.genres).map_err(|e| {
            AppError::Internal(format!("stored genres of {} are malformed: {e}", self.id))
        })?;

        Ok(CatalogRecord {
            id: self.id,
            fields: RecordFields {
                title: self.title,
                kind,
                year: self.year,
                genres,
                cast_summary: self.cast_summary,
                description: self.description,
                poster_url: self.poster_url,
                trailer_url: self.trailer_url,
            },
            created_by: self.created_by,
            created_at: self.created_at.max(0) as Timestamp,
            updated_at: self.updated_at.max(0) as Timestamp,
        })
    }
}

/// [`TitleStore`] persisting to the `titles` table.
#[derive(Debug, Clone)]
pub struct PgTitleStore {
    pool: PgPool,
}

impl PgTitleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to PostgreSQL and bring the `titles` schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }
}

/// Insert a document unless its id exists. Returns whether a row was written.
async fn insert_title(conn: &mut PgConnection, record: &CatalogRecord) -> Result<bool> {
    let fields = &record.fields;
    let genres = serde_json::to_value(&fields.genres)
        .map_err(|e| EngineError::Serialization(e.to_string()))?;

    let result = sqlx::query(
        r#"
        INSERT INTO titles (
            id, title, kind, year, genres, cast_summary, description,
            poster_url, trailer_url, created_by, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&record.id)
    .bind(&fields.title)
    .bind(fields.kind.as_str())
    .bind(fields.year)
    .bind(genres)
    .bind(&fields.cast_summary)
    .bind(&fields.description)
    .bind(&fields.poster_url)
    .bind(&fields.trailer_url)
    .bind(&record.created_by)
    .bind(record.created_at as i64)
    .bind(record.updated_at as i64)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Overwrite the mutable columns of an existing document.
async fn update_title(conn: &mut PgConnection, record: &CatalogRecord) -> Result<()> {
    let fields = &record.fields;
    let genres = serde_json::to_value(&fields.genres)
        .map_err(|e| EngineError::Serialization(e.to_string()))?;

    sqlx::query(
        r#"
        UPDATE titles SET
            title = $2, kind = $3, year = $4, genres = $5, cast_summary = $6,
            description = $7, poster_url = $8, trailer_url = $9, updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(&record.id)
    .bind(&fields.title)
    .bind(fields.kind.as_str())
    .bind(fields.year)
    .bind(genres)
    .bind(&fields.cast_summary)
    .bind(&fields.description)
    .bind(&fields.poster_url)
    .bind(&fields.trailer_url)
    .bind(record.updated_at as i64)
    .execute(conn)
    .await?;

    Ok(())
}

#[async_trait]
impl TitleStore for PgTitleStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> Result<Vec<CatalogRecord>> {
        let rows: Vec<TitleRow> =
            sqlx::query_as(&format!("{SELECT_TITLES} ORDER BY created_at DESC, seq DESC"))
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TitleRow::into_record).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogRecord>> {
        let row: Option<TitleRow> = sqlx::query_as(&format!("{SELECT_TITLES} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TitleRow::into_record).transpose()
    }

    async fn create(&self, record: NewRecord) -> Result<CatalogRecord> {
        let record = record.into_record(now_millis())?;
        let mut conn = self.pool.acquire().await?;
        if !insert_title(&mut *conn, &record).await? {
            return Err(EngineError::RecordAlreadyExists(record.id).into());
        }
        tracing::debug!(record_id = %record.id, "title inserted");
        Ok(record)
    }

    async fn merge(&self, id: &str, patch: RecordPatch) -> Result<(CatalogRecord, WriteOutcome)> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<TitleRow> =
            sqlx::query_as(&format!("{SELECT_TITLES} WHERE id = $1 FOR UPDATE"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (record, outcome) = match existing {
            Some(row) => {
                let mut record = row.into_record()?;
                let timestamp = now_millis().max(record.updated_at + 1);
                record
                    .apply_patch(&patch, timestamp)
                    .map_err(EngineError::from)?;
                update_title(&mut *tx, &record).await?;
                (record, WriteOutcome::Updated)
            }
            None => {
                let record = patch.into_record(id, now_millis())?;
                if !insert_title(&mut *tx, &record).await? {
                    // created concurrently between the select and the insert
                    return Err(AppError::Conflict(format!(
                        "title {id} was created concurrently"
                    )));
                }
                (record, WriteOutcome::Created)
            }
        };

        tx.commit().await?;
        Ok((record, outcome))
    }

    async fn delete(&self, id: &str) -> Result<WriteOutcome> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(if result.rows_affected() > 0 {
            WriteOutcome::Deleted
        } else {
            WriteOutcome::Unchanged
        })
    }
}
