use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{PaginationParams, RepoResult};
use learnmart_models::{Course, EnrolledCourse, Enrollment, Transaction};

use super::ledger::apply_movements;
use crate::error::{map_db_error, map_unique_violation};
use crate::traits::{EnrollmentRepository, Page};

#[derive(Clone)]
pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct EnrolledCourseRow {
    enrollment_id: Uuid,
    enrolled_at: DateTime<Utc>,
    #[sqlx(flatten)]
    course: Course,
}

impl From<EnrolledCourseRow> for EnrolledCourse {
    fn from(row: EnrolledCourseRow) -> Self {
        Self {
            enrollment_id: row.enrollment_id,
            enrolled_at: row.enrolled_at,
            course: row.course,
        }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: Uuid, course_id: Uuid) -> RepoResult<Option<Enrollment>> {
        sqlx::query_as::<_, Enrollment>(
            "SELECT id, user_id, course_id, created_at FROM enrollments WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, enrollment, movements), fields(enrollment.id = %enrollment.id))]
    async fn enroll(&self, enrollment: &Enrollment, movements: &[Transaction]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO enrollments (id, user_id, course_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(enrollment.id)
        .bind(enrollment.user_id)
        .bind(enrollment.course_id)
        .bind(enrollment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Already enrolled in this course"))?;

        apply_movements(&mut *tx, movements).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<EnrolledCourse>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, EnrolledCourseRow>(
            r"
            SELECT e.id AS enrollment_id, e.created_at AS enrolled_at,
                   c.id, c.instructor_id, c.category_id, c.title, c.description, c.price,
                   c.thumbnail_key, c.level, c.status, c.created_at, c.updated_at
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok((rows.into_iter().map(EnrolledCourse::from).collect(), total))
    }

    #[instrument(skip(self))]
    async fn count_for_course(&self, course_id: Uuid) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }
}
