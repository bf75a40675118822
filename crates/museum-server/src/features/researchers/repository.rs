//! Researcher persistence

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Researcher, ResearcherFilter, ResearcherInput};
use crate::db::{counted_rows, with_timeout, DbError, DbResult};
use crate::features::shared::{Filters, Paginated};

#[async_trait]
pub trait ResearcherRepository: Send + Sync {
    async fn insert(&self, input: &ResearcherInput) -> DbResult<Researcher>;

    /// `NotFound` for ids below 1 or no match
    async fn get(&self, id: i64) -> DbResult<Researcher>;

    /// Replace every mutable field of the row with `researcher.id`
    async fn update(&self, researcher: &Researcher) -> DbResult<Researcher>;

    async fn delete(&self, id: i64) -> DbResult<()>;

    async fn get_all(
        &self,
        filter: &ResearcherFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Researcher>>;
}

#[derive(Debug, Clone)]
pub struct PgResearcherRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgResearcherRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl ResearcherRepository for PgResearcherRepository {
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    async fn insert(&self, input: &ResearcherInput) -> DbResult<Researcher> {
        let query = sqlx::query_as::<_, Researcher>(
            r#"
            INSERT INTO researcher (name, specialization, project)
            VALUES ($1, $2, $3)
            RETURNING researcher_id, name, specialization, project
            "#,
        )
        .bind(&input.name)
        .bind(&input.specialization)
        .bind(&input.project);

        with_timeout(self.timeout, query.fetch_one(&self.pool)).await
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: i64) -> DbResult<Researcher> {
        if id < 1 {
            return Err(DbError::not_found("Researcher", id));
        }

        let query = sqlx::query_as::<_, Researcher>(
            r#"
            SELECT researcher_id, name, specialization, project
            FROM researcher
            WHERE researcher_id = $1
            "#,
        )
        .bind(id);

        with_timeout(self.timeout, query.fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| DbError::not_found("Researcher", id))
    }

    #[tracing::instrument(skip(self, researcher), fields(id = researcher.id))]
    async fn update(&self, researcher: &Researcher) -> DbResult<Researcher> {
        let query = sqlx::query_as::<_, Researcher>(
            r#"
            UPDATE researcher
            SET name = $1, specialization = $2, project = $3
            WHERE researcher_id = $4
            RETURNING researcher_id, name, specialization, project
            "#,
        )
        .bind(&researcher.name)
        .bind(&researcher.specialization)
        .bind(&researcher.project)
        .bind(researcher.id);

        with_timeout(self.timeout, query.fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| DbError::not_found("Researcher", researcher.id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> DbResult<()> {
        if id < 1 {
            return Err(DbError::not_found("Researcher", id));
        }

        let query = sqlx::query("DELETE FROM researcher WHERE researcher_id = $1").bind(id);
        let result = with_timeout(self.timeout, query.execute(&self.pool)).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Researcher", id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, filter, filters), fields(page = filters.page()))]
    async fn get_all(
        &self,
        filter: &ResearcherFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Researcher>> {
        let sql = format!(
            r#"
            SELECT count(*) OVER() AS total_records, researcher_id, name, specialization, project
            FROM researcher
            WHERE (to_tsvector('simple', name) @@ plainto_tsquery('simple', $1) OR $1 = '')
            AND (to_tsvector('simple', specialization) @@ plainto_tsquery('simple', $2) OR $2 = '')
            ORDER BY {} {}, researcher_id ASC
            LIMIT $3 OFFSET $4
            "#,
            filters.sort_column(),
            filters.sort_direction()
        );

        let query = sqlx::query(&sql)
            .bind(&filter.name)
            .bind(&filter.specialization)
            .bind(filters.limit())
            .bind(filters.offset());

        let rows = with_timeout(self.timeout, query.fetch_all(&self.pool)).await?;
        Ok(Paginated::from_counted_rows(counted_rows(rows)?, filters))
    }
}
