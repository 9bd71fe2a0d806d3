use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{PaginationParams, RepoError, RepoResult};
use learnmart_models::{Course, CourseFilterParams, CourseStatus};

use crate::error::map_db_error;
use crate::traits::{CourseRepository, Page};

const COURSE_COLUMNS: &str = "id, instructor_id, category_id, title, description, price, thumbnail_key, level, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        mut count: QueryBuilder<'_, Postgres>,
        mut query: QueryBuilder<'_, Postgres>,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Course>> {
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let courses = query
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok((courses, total))
    }
}

fn push_published_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &CourseFilterParams) {
    builder
        .push(" WHERE status = ")
        .push_bind(CourseStatus::Published);
    if let Some(category_id) = filters.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(level) = filters.level {
        builder.push(" AND level = ").push_bind(level);
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Course>> {
        sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self, course), fields(course.id = %course.id))]
    async fn create(&self, course: &Course) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO courses ({COURSE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(course.id)
        .bind(course.instructor_id)
        .bind(course.category_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price)
        .bind(&course.thumbnail_key)
        .bind(course.level)
        .bind(course.status)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self, course), fields(course.id = %course.id))]
    async fn update(&self, course: &Course) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE courses
            SET category_id = $2, title = $3, description = $4, price = $5,
                thumbnail_key = $6, level = $7, status = $8, updated_at = $9
            WHERE id = $1
            ",
        )
        .bind(course.id)
        .bind(course.category_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price)
        .bind(&course.thumbnail_key)
        .bind(course.level)
        .bind(course.status)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    /// Sections, lectures and enrollments go with the course via `ON DELETE CASCADE`.
    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
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
    async fn list_published(&self, filters: &CourseFilterParams) -> RepoResult<Page<Course>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM courses");
        push_published_filters(&mut count, filters);
        let mut query = QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
        push_published_filters(&mut query, filters);

        self.fetch_page(count, query, &filters.pagination).await
    }

    #[instrument(skip(self))]
    async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Course>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM courses WHERE instructor_id = ");
        count.push_bind(instructor_id);
        let mut query = QueryBuilder::new(format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE instructor_id = "
        ));
        query.push_bind(instructor_id);

        self.fetch_page(count, query, pagination).await
    }
}
