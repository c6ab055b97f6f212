use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{DistanceMetric, TranscriptIndex, TranscriptIndexError};
use crate::domain::{Embedding, JobId, ScoredSegment, TranscriptSegment};

use super::ranking::{check_query, check_segments, rank};

/// Segments live in `transcript_segments`, tagged with the processing revision
/// that built them; rows with `retired_at` set belong to an archived
/// generation. Similarity is computed in process over the job's live rows.
pub struct PgTranscriptIndex {
    pool: PgPool,
    dimension: usize,
    metric: DistanceMetric,
}

impl PgTranscriptIndex {
    pub fn new(pool: PgPool, dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            pool,
            dimension,
            metric,
        }
    }

    async fn load(&self, job_id: JobId) -> Result<Vec<TranscriptSegment>, TranscriptIndexError> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, text, start_secs, end_secs, speaker, embedding
            FROM transcript_segments
            WHERE job_id = $1 AND retired_at IS NULL
            ORDER BY sequence ASC
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        if rows.is_empty() {
            return Err(TranscriptIndexError::NotFound(job_id));
        }

        rows.iter().map(row_to_segment).collect()
    }
}

fn storage(e: sqlx::Error) -> TranscriptIndexError {
    TranscriptIndexError::Storage(e.to_string())
}

fn row_to_segment(row: &PgRow) -> Result<TranscriptSegment, TranscriptIndexError> {
    let sequence: i32 = row.try_get("sequence").map_err(storage)?;
    let values: Vec<f32> = row.try_get("embedding").map_err(storage)?;
    Ok(TranscriptSegment {
        sequence: sequence as u32,
        text: row.try_get("text").map_err(storage)?,
        start: row.try_get("start_secs").map_err(storage)?,
        end: row.try_get("end_secs").map_err(storage)?,
        speaker: row.try_get("speaker").map_err(storage)?,
        embedding: Embedding::new(values),
    })
}

#[async_trait]
impl TranscriptIndex for PgTranscriptIndex {
    #[instrument(skip(self, segments), fields(job_id = %job_id, count = segments.len()))]
    async fn append(
        &self,
        job_id: JobId,
        revision: u32,
        segments: Vec<TranscriptSegment>,
    ) -> Result<usize, TranscriptIndexError> {
        check_segments(job_id, &segments, self.dimension)?;

        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Concurrent appends for one job queue up behind the record's row lock.
        sqlx::query("SELECT id FROM job_records WHERE id = $1 FOR UPDATE")
            .bind(job_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;

        let live: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(revision) FROM transcript_segments WHERE job_id = $1 AND retired_at IS NULL",
        )
        .bind(job_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        match live.map(|l| l as u32) {
            Some(live) if live == revision => {
                return Err(TranscriptIndexError::AlreadyIndexed(job_id));
            }
            Some(live) if live > revision => {
                return Err(TranscriptIndexError::StaleRevision {
                    job_id,
                    live,
                    attempted: revision,
                });
            }
            Some(live) => {
                sqlx::query(
                    "UPDATE transcript_segments SET retired_at = NOW() WHERE job_id = $1 AND retired_at IS NULL",
                )
                .bind(job_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
                tracing::debug!(revision = live, "Index generation retired");
            }
            None => {}
        }

        for segment in &segments {
            sqlx::query(
                r#"
                INSERT INTO transcript_segments
                    (job_id, revision, sequence, text, start_secs, end_secs, speaker, embedding)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(job_id.as_uuid())
            .bind(revision as i32)
            .bind(segment.sequence as i32)
            .bind(&segment.text)
            .bind(segment.start)
            .bind(segment.end)
            .bind(segment.speaker.as_deref())
            .bind(&segment.embedding.values)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    TranscriptIndexError::AlreadyIndexed(job_id)
                }
                other => storage(other),
            })?;
        }

        tx.commit().await.map_err(storage)?;
        Ok(segments.len())
    }

    #[instrument(skip(self, query), fields(job_id = %job_id, k))]
    async fn query(
        &self,
        job_id: JobId,
        query: &Embedding,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, TranscriptIndexError> {
        check_query(query, self.dimension)?;
        let segments = self.load(job_id).await?;
        Ok(rank(&segments, query, k, self.metric))
    }

    async fn segments(&self, job_id: JobId) -> Result<Vec<TranscriptSegment>, TranscriptIndexError> {
        self.load(job_id).await
    }

    async fn live_revision(&self, job_id: JobId) -> Result<Option<u32>, TranscriptIndexError> {
        let live: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(revision) FROM transcript_segments WHERE job_id = $1 AND retired_at IS NULL",
        )
        .bind(job_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        Ok(live.map(|l| l as u32))
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn retire(
        &self,
        job_id: JobId,
        before_revision: u32,
    ) -> Result<bool, TranscriptIndexError> {
        let result = sqlx::query(
            r#"
            UPDATE transcript_segments SET retired_at = NOW()
            WHERE job_id = $1 AND retired_at IS NULL AND revision < $2
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(before_revision as i32)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.rows_affected() > 0)
    }
}
