//! Expedition persistence

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Expedition, ExpeditionFilter, ExpeditionInput};
use crate::db::{counted_rows, with_timeout, DbError, DbResult};
use crate::features::shared::error_helpers::classify;
use crate::features::shared::{Filters, Paginated};

#[async_trait]
pub trait ExpeditionRepository: Send + Sync {
    /// `InvalidReference("researcher_id")` when the researcher does not exist
    async fn insert(&self, input: &ExpeditionInput) -> DbResult<Expedition>;

    async fn get(&self, id: i64) -> DbResult<Expedition>;

    async fn update(&self, expedition: &Expedition) -> DbResult<Expedition>;

    async fn delete(&self, id: i64) -> DbResult<()>;

    async fn get_all(
        &self,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>>;

    async fn get_all_for_researcher(
        &self,
        researcher_id: i64,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>>;
}

#[derive(Debug, Clone)]
pub struct PgExpeditionRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgExpeditionRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn list(
        &self,
        researcher_id: Option<i64>,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>> {
        let sql = format!(
            r#"
            SELECT count(*) OVER() AS total_records, expedition_id, title, expedition_year, researcher_id
            FROM expedition
            WHERE ($1::BIGINT IS NULL OR researcher_id = $1)
            AND (to_tsvector('simple', title) @@ plainto_tsquery('simple', $2) OR $2 = '')
            AND ($3::INT IS NULL OR expedition_year = $3)
            ORDER BY {} {}, expedition_id ASC
            LIMIT $4 OFFSET $5
            "#,
            filters.sort_column(),
            filters.sort_direction()
        );

        let query = sqlx::query(&sql)
            .bind(researcher_id)
            .bind(&filter.title)
            .bind(filter.expedition_year)
            .bind(filters.limit())
            .bind(filters.offset());

        let rows = with_timeout(self.timeout, query.fetch_all(&self.pool)).await?;
        Ok(Paginated::from_counted_rows(counted_rows(rows)?, filters))
    }
}

#[async_trait]
impl ExpeditionRepository for PgExpeditionRepository {
    #[tracing::instrument(skip(self, input), fields(researcher_id = input.researcher_id))]
    async fn insert(&self, input: &ExpeditionInput) -> DbResult<Expedition> {
        let query = sqlx::query_as::<_, Expedition>(
            r#"
            INSERT INTO expedition (title, expedition_year, researcher_id)
            VALUES ($1, $2, $3)
            RETURNING expedition_id, title, expedition_year, researcher_id
            "#,
        )
        .bind(&input.title)
        .bind(input.expedition_year)
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
    async fn get(&self, id: i64) -> DbResult<Expedition> {
        if id < 1 {
            return Err(DbError::not_found("Expedition", id));
        }

        let query = sqlx::query_as::<_, Expedition>(
            r#"
            SELECT expedition_id, title, expedition_year, researcher_id
            FROM expedition
            WHERE expedition_id = $1
            "#,
        )
        .bind(id);

        with_timeout(self.timeout, query.fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| DbError::not_found("Expedition", id))
    }

    #[tracing::instrument(skip(self, expedition), fields(id = expedition.id))]
    async fn update(&self, expedition: &Expedition) -> DbResult<Expedition> {
        let query = sqlx::query_as::<_, Expedition>(
            r#"
            UPDATE expedition
            SET title = $1, expedition_year = $2, researcher_id = $3
            WHERE expedition_id = $4
            RETURNING expedition_id, title, expedition_year, researcher_id
            "#,
        )
        .bind(&expedition.title)
        .bind(expedition.expedition_year)
        .bind(expedition.researcher_id)
        .bind(expedition.id);

        with_timeout(self.timeout, async {
            query
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| classify(e, "researcher_id"))
        })
        .await?
        .ok_or_else(|| DbError::not_found("Expedition", expedition.id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> DbResult<()> {
        if id < 1 {
            return Err(DbError::not_found("Expedition", id));
        }

        let query = sqlx::query("DELETE FROM expedition WHERE expedition_id = $1").bind(id);
        let result = with_timeout(self.timeout, query.execute(&self.pool)).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expedition", id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, filter, filters), fields(page = filters.page()))]
    async fn get_all(
        &self,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>> {
        self.list(None, filter, filters).await
    }

    #[tracing::instrument(skip(self, filter, filters), fields(page = filters.page()))]
    async fn get_all_for_researcher(
        &self,
        researcher_id: i64,
        filter: &ExpeditionFilter,
        filters: &Filters,
    ) -> DbResult<Paginated<Expedition>> {
        self.list(Some(researcher_id), filter, filters).await
    }
}
