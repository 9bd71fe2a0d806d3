use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{RepoError, RepoResult};
use learnmart_models::Section;

use crate::error::map_db_error;
use crate::traits::SectionRepository;

#[derive(Clone)]
pub struct PgSectionRepository {
    pool: PgPool,
}

impl PgSectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectionRepository for PgSectionRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Section>> {
        sqlx::query_as::<_, Section>(
            "SELECT id, course_id, title, position, created_at FROM sections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list_by_course(&self, course_id: Uuid) -> RepoResult<Vec<Section>> {
        sqlx::query_as::<_, Section>(
            r"
            SELECT id, course_id, title, position, created_at
            FROM sections
            WHERE course_id = $1
            ORDER BY position ASC, created_at ASC
            ",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, section), fields(section.id = %section.id))]
    async fn create(&self, section: &Section) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO sections (id, course_id, title, position, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(section.id)
        .bind(section.course_id)
        .bind(&section.title)
        .bind(section.position)
        .bind(section.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self, section), fields(section.id = %section.id))]
    async fn update(&self, section: &Section) -> RepoResult<()> {
        let result = sqlx::query("UPDATE sections SET title = $2, position = $3 WHERE id = $1")
            .bind(section.id)
            .bind(&section.title)
            .bind(section.position)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
