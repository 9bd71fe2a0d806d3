use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{RepoError, RepoResult};
use learnmart_models::{Lecture, LectureStatus};

use crate::error::map_db_error;
use crate::traits::LectureRepository;

const LECTURE_COLUMNS: &str = "id, course_id, section_id, title, video_key, duration_seconds, status, is_preview, position, created_at, updated_at";

#[derive(Clone)]
pub struct PgLectureRepository {
    pool: PgPool,
}

impl PgLectureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LectureRepository for PgLectureRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Lecture>> {
        sqlx::query_as::<_, Lecture>(&format!(
            "SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn find_by_video_key(&self, video_key: &str) -> RepoResult<Option<Lecture>> {
        sqlx::query_as::<_, Lecture>(&format!(
            "SELECT {LECTURE_COLUMNS} FROM lectures WHERE video_key = $1 LIMIT 1"
        ))
        .bind(video_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list_by_course(&self, course_id: Uuid) -> RepoResult<Vec<Lecture>> {
        sqlx::query_as::<_, Lecture>(&format!(
            "SELECT {LECTURE_COLUMNS} FROM lectures WHERE course_id = $1 ORDER BY position ASC, created_at ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, lecture), fields(lecture.id = %lecture.id))]
    async fn create(&self, lecture: &Lecture) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO lectures ({LECTURE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(lecture.id)
        .bind(lecture.course_id)
        .bind(lecture.section_id)
        .bind(&lecture.title)
        .bind(&lecture.video_key)
        .bind(lecture.duration_seconds)
        .bind(lecture.status)
        .bind(lecture.is_preview)
        .bind(lecture.position)
        .bind(lecture.created_at)
        .bind(lecture.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self, lecture), fields(lecture.id = %lecture.id))]
    async fn update(&self, lecture: &Lecture) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE lectures
            SET title = $2, video_key = $3, duration_seconds = $4, status = $5,
                is_preview = $6, position = $7, updated_at = $8
            WHERE id = $1
            ",
        )
        .bind(lecture.id)
        .bind(&lecture.title)
        .bind(&lecture.video_key)
        .bind(lecture.duration_seconds)
        .bind(lecture.status)
        .bind(lecture.is_preview)
        .bind(lecture.position)
        .bind(lecture.updated_at)
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
        let result = sqlx::query("DELETE FROM lectures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_ready(&self, course_id: Uuid) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lectures WHERE course_id = $1 AND status = $2",
        )
        .bind(course_id)
        .bind(LectureStatus::Ready)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}
