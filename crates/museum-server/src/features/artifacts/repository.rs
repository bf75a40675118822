//! Artifact persistence

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Artifact, ArtifactFilter, ArtifactInput};
use crate::db::{counted_rows, with_timeout, DbError, DbResult};
use crate::features::shared::error_helpers::classify;
use crate::features::shared::{Filters, Paginated};

#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// `InvalidReference("researcher_id")` when the researcher does not exist
    async fn insert(&self, input: &ArtifactInput) -> DbResult<Artifact>;

    async fn get(&self, id: i64) -> DbResult<Artifact>;

    async fn update(&self, artifact: &Artifact) -> DbResult<Artifact>;

    async fn delete(&self, id: i64) -> DbResult<()>;

    async fn get_all(
        &self,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>>;

    async fn get_all_for_researcher(
        &self,
        researcher_id: i64,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>>;
}

#[derive(Debug, Clone)]
pub struct PgArtifactRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgArtifactRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn list(
        &self,
        researcher_id: Option<i64>,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>> {
        let sql = format!(
            r#"
            SELECT count(*) OVER() AS total_records, artifact_id, title, age, location, researcher_id
            FROM artifact
            WHERE ($1::BIGINT IS NULL OR researcher_id = $1)
            AND (to_tsvector('simple', title) @@ plainto_tsquery('simple', $2) OR $2 = '')
            AND (to_tsvector('simple', location) @@ plainto_tsquery('simple', $3) OR $3 = '')
            AND ($4::INT IS NULL OR age = $4)
            ORDER BY {} {}, artifact_id ASC
            LIMIT $5 OFFSET $6
            "#,
            filters.sort_column(),
            filters.sort_direction()
        );

        let query = sqlx::query(&sql)
            .bind(researcher_id)
            .bind(&filter.title)
            .bind(&filter.location)
            .bind(filter.age)
            .bind(filters.limit())
            .bind(filters.offset());

        let rows = with_timeout(self.timeout, query.fetch_all(&self.pool)).await?;
        Ok(Paginated::from_counted_rows(counted_rows(rows)?, filters))
    }
}

#[async_trait]
impl ArtifactRepository for PgArtifactRepository {
    #[tracing::instrument(skip(self, input), fields(researcher_id = input.researcher_id))]
    async fn insert(&self, input: &ArtifactInput) -> DbResult<Artifact> {
        let query = sqlx::query_as::<_, Artifact>(
            r#"
            INSERT INTO artifact (title, age, location, researcher_id)
            VALUES ($1, $2, $3, $4)
            RETURNING artifact_id, title, age, location, researcher_id
            "#,
        )
        .bind(&input.title)
        .bind(input.age)
        .bind(&input.location)
        .bind(input.researcher_id);

        with_timeout(self.timeout, async {
            query
                .fetch_one(&self.pool)
                .await
                .map_err(|e| classify(e, "researcher_id"))
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: i64) -> DbResult<Artifact> {
        if id < 1 {
            return Err(DbError::not_found("Artifact", id));
        }

        let query = sqlx::query_as::<_, Artifact>(
            r#"
            SELECT artifact_id, title, age, location, researcher_id
            FROM artifact
            WHERE artifact_id = $1
            "#,
        )
        .bind(id);

        with_timeout(self.timeout, query.fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| DbError::not_found("Artifact", id))
    }

    #[tracing::instrument(skip(self, artifact), fields(id = artifact.id))]
    async fn update(&self, artifact: &Artifact) -> DbResult<Artifact> {
        let query = sqlx::query_as::<_, Artifact>(
            r#"
            UPDATE artifact
            SET title = $1, age = $2, location = $3, researcher_id = $4
            WHERE artifact_id = $5
            RETURNING artifact_id, title, age, location, researcher_id
            "#,
        )
        .bind(&artifact.title)
        .bind(artifact.age)
        .bind(&artifact.location)
        .bind(artifact.researcher_id)
        .bind(artifact.id);

        with_timeout(self.timeout, async {
            query
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| classify(e, "researcher_id"))
        })
        .await?
        .ok_or_else(|| DbError::not_found("Artifact", artifact.id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> DbResult<()> {
        if id < 1 {
            return Err(DbError::not_found("Artifact", id));
        }

        let query = sqlx::query("DELETE FROM artifact WHERE artifact_id = $1").bind(id);
        let result = with_timeout(self.timeout, query.execute(&self.pool)).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Artifact", id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, filter, filters), fields(page = filters.page()))]
    async fn get_all(
        &self,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>> {
        self.list(None, filter, filters).await
    }

    #[tracing::instrument(skip(self, filter, filters), fields(page = filters.page()))]
    async fn get_all_for_researcher(
        &self,
        researcher_id: i64,
        filter: &ArtifactFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Artifact>> {
        self.list(Some(researcher_id), filter, filters).await
    }
}
