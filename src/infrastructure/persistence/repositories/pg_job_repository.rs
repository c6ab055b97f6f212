use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{JobMutation, JobRepository, RepositoryError};
use crate::domain::{
    Artifacts, DocumentRequest, JobError, JobId, JobRecord, JobStatus, MediaRef, Stage,
    TransitionEntry,
};

const SELECT_RECORD: &str = r#"
    SELECT id, stage, status, attempts, last_error, source, request, artifacts,
           cancel_requested, revision, history, created_at, updated_at
    FROM job_records
"#;

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn row_to_record(row: &PgRow) -> Result<JobRecord, RepositoryError> {
    let stage: String = row.try_get("stage").map_err(query_failed)?;
    let status: String = row.try_get("status").map_err(query_failed)?;
    let attempts: Json<BTreeMap<Stage, u32>> = row.try_get("attempts").map_err(query_failed)?;
    let last_error: Option<Json<JobError>> = row.try_get("last_error").map_err(query_failed)?;
    let source: String = row.try_get("source").map_err(query_failed)?;
    let request: Json<DocumentRequest> = row.try_get("request").map_err(query_failed)?;
    let artifacts: Json<Artifacts> = row.try_get("artifacts").map_err(query_failed)?;
    let history: Json<Vec<TransitionEntry>> = row.try_get("history").map_err(query_failed)?;
    let revision: i32 = row.try_get("revision").map_err(query_failed)?;

    Ok(JobRecord {
        id: JobId::from_uuid(row.try_get("id").map_err(query_failed)?),
        stage: stage.parse().map_err(RepositoryError::QueryFailed)?,
        status: status.parse().map_err(RepositoryError::QueryFailed)?,
        attempts: attempts.0,
        last_error: last_error.map(|e| e.0),
        source: MediaRef::from_raw(source),
        request: request.0,
        artifacts: artifacts.0,
        cancel_requested: row.try_get("cancel_requested").map_err(query_failed)?,
        revision: u32::try_from(revision)
            .map_err(|_| RepositoryError::QueryFailed(format!("negative revision {}", revision)))?,
        history: history.0,
        created_at: row.try_get("created_at").map_err(query_failed)?,
        updated_at: row.try_get("updated_at").map_err(query_failed)?,
    })
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, record), fields(job_id = %record.id))]
    async fn create(&self, record: &JobRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO job_records (id, stage, status, attempts, last_error, source, request,
                                     artifacts, cancel_requested, revision, history,
                                     created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.stage.as_str())
        .bind(record.status.as_str())
        .bind(Json(&record.attempts))
        .bind(record.last_error.as_ref().map(Json))
        .bind(record.source.as_str())
        .bind(Json(&record.request))
        .bind(Json(&record.artifacts))
        .bind(record.cancel_requested)
        .bind(record.revision as i32)
        .bind(Json(&record.history))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db.to_string())
            }
            other => query_failed(other),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get(&self, id: JobId) -> Result<JobRecord, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_RECORD} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        match row {
            Some(r) => row_to_record(&r),
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    #[instrument(
        skip(self, mutation),
        fields(job_id = %id, stage = %expected_stage, status = %expected_status)
    )]
    async fn compare_and_transition(
        &self,
        id: JobId,
        expected_stage: Stage,
        expected_status: JobStatus,
        mutation: JobMutation,
    ) -> Result<JobRecord, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let row = sqlx::query(&format!("{SELECT_RECORD} WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_failed)?;

        let current = match row {
            Some(r) => row_to_record(&r)?,
            None => return Err(RepositoryError::NotFound(id)),
        };

        if current.stage != expected_stage || current.status != expected_status {
            return Err(RepositoryError::Conflict {
                id,
                expected_stage,
                expected_status,
                actual_stage: current.stage,
                actual_status: current.status,
            });
        }

        let mut next = current;
        mutation(&mut next);
        next.stamp(expected_stage, expected_status);

        sqlx::query(
            r#"
            UPDATE job_records
            SET stage = $2, status = $3, attempts = $4, last_error = $5, artifacts = $6,
                cancel_requested = $7, revision = $8, history = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(next.stage.as_str())
        .bind(next.status.as_str())
        .bind(Json(&next.attempts))
        .bind(next.last_error.as_ref().map(Json))
        .bind(Json(&next.artifacts))
        .bind(next.cancel_requested)
        .bind(next.revision as i32)
        .bind(Json(&next.history))
        .bind(next.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        Ok(next)
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> Result<Vec<JobRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_RECORD} WHERE status IN ('PENDING', 'RUNNING') AND stage <> 'COMPLETE' ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter().map(row_to_record).collect()
    }
}
