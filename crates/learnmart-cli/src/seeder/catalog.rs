//! Category, instructor and course generation and batch inserts.

use std::time::Instant;

use fake::Fake;
use fake::faker::company::en::{Buzzword, CatchPhrase};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::{FirstName, LastName};
use learnmart_models::{CourseLevel, CourseStatus, LectureStatus, UserRole};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::models::{CategorySeed, CourseSeed, InstructorSeed};

/// Domain all seeded accounts share, used again when clearing.
pub const SEED_EMAIL_DOMAIN: &str = "example.com";

const BATCH_SIZE: usize = 500;
const LEVELS: [CourseLevel; 3] = [
    CourseLevel::Beginner,
    CourseLevel::Intermediate,
    CourseLevel::Advanced,
];

type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

pub fn generate_categories(count: usize) -> Vec<CategorySeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let word: String = Buzzword().fake();
            CategorySeed {
                id: Uuid::new_v4(),
                // Suffix keeps names unique under the case-insensitive index
                name: format!("{} {}", capitalize(&word), idx + 1),
                description: CatchPhrase().fake(),
            }
        })
        .collect()
}

pub fn generate_instructors(count: usize, password_hash: &str) -> Vec<InstructorSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            InstructorSeed {
                id: Uuid::new_v4(),
                email: format!(
                    "{}.{}+instructor{}@{}",
                    first_name.to_lowercase(),
                    last_name.to_lowercase(),
                    idx,
                    SEED_EMAIL_DOMAIN
                ),
                name: format!("{} {}", first_name, last_name),
                password_hash: password_hash.to_string(),
                bio: Sentence(6..12).fake(),
                coins: (100..1000).fake(),
            }
        })
        .collect()
}

pub fn generate_courses(
    instructor_ids: &[Uuid],
    category_ids: &[Uuid],
    courses_per_instructor: usize,
) -> Vec<CourseSeed> {
    if category_ids.is_empty() {
        return Vec::new();
    }

    instructor_ids
        .par_iter()
        .enumerate()
        .flat_map(|(instructor_idx, &instructor_id)| {
            (0..courses_per_instructor)
                .map(|course_idx| {
                    let slot = instructor_idx * courses_per_instructor + course_idx;
                    let topic: String = Buzzword().fake();
                    CourseSeed {
                        id: Uuid::new_v4(),
                        instructor_id,
                        category_id: category_ids[slot % category_ids.len()],
                        title: format!("Mastering {}", capitalize(&topic)),
                        description: Paragraph(2..4).fake(),
                        price: (0..50).fake::<i64>() * 10,
                        level: LEVELS[slot % LEVELS.len()],
                        section_id: Uuid::new_v4(),
                        section_title: "Getting started".to_string(),
                        lecture_id: Uuid::new_v4(),
                        lecture_title: Sentence(3..6).fake(),
                        duration_seconds: (120..1800).fake(),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn seed_categories(db: &PgPool, count: usize) -> SeedResult<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("🗂️  Seeding {} categories...", count);

    let categories = generate_categories(count);
    let mut tx = db.begin().await?;
    for chunk in categories.chunks(BATCH_SIZE) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO categories (id, name, description) ");
        builder.push_values(chunk, |mut row, category| {
            row.push_bind(category.id)
                .push_bind(&category.name)
                .push_bind(&category.description);
        });
        builder.push(" ON CONFLICT DO NOTHING");
        builder.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} categories in {:?}",
        categories.len(),
        start_time.elapsed()
    );
    Ok(categories.into_iter().map(|c| c.id).collect())
}

pub async fn seed_instructors(
    db: &PgPool,
    count: usize,
    password_hash: &str,
) -> SeedResult<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("👩‍🏫 Seeding {} instructors...", count);

    let instructors = generate_instructors(count, password_hash);
    let mut tx = db.begin().await?;
    for chunk in instructors.chunks(BATCH_SIZE) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (id, name, email, password_hash, role, coins, bio) ",
        );
        builder.push_values(chunk, |mut row, instructor| {
            row.push_bind(instructor.id)
                .push_bind(&instructor.name)
                .push_bind(&instructor.email)
                .push_bind(&instructor.password_hash)
                .push_bind(UserRole::Instructor)
                .push_bind(instructor.coins)
                .push_bind(&instructor.bio);
        });
        builder.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} instructors in {:?}",
        instructors.len(),
        start_time.elapsed()
    );
    Ok(instructors.into_iter().map(|i| i.id).collect())
}

async fn insert_courses_chunk(
    tx: &mut Transaction<'_, Postgres>,
    courses: &[CourseSeed],
) -> SeedResult<()> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO courses (id, instructor_id, category_id, title, description, price, level, status) ",
    );
    builder.push_values(courses, |mut row, course| {
        row.push_bind(course.id)
            .push_bind(course.instructor_id)
            .push_bind(course.category_id)
            .push_bind(&course.title)
            .push_bind(&course.description)
            .push_bind(course.price)
            .push_bind(course.level)
            .push_bind(CourseStatus::Published);
    });
    builder.build().execute(&mut **tx).await?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO sections (id, course_id, title, position) ");
    builder.push_values(courses, |mut row, course| {
        row.push_bind(course.section_id)
            .push_bind(course.id)
            .push_bind(&course.section_title)
            .push_bind(0_i32);
    });
    builder.build().execute(&mut **tx).await?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO lectures (id, course_id, section_id, title, video_key, duration_seconds, status, is_preview, position) ",
    );
    builder.push_values(courses, |mut row, course| {
        row.push_bind(course.lecture_id)
            .push_bind(course.id)
            .push_bind(course.section_id)
            .push_bind(&course.lecture_title)
            .push_bind(format!("users/{}/seed/{}.mp4", course.instructor_id, course.lecture_id))
            .push_bind(course.duration_seconds)
            .push_bind(LectureStatus::Ready)
            .push_bind(true)
            .push_bind(0_i32);
    });
    builder.build().execute(&mut **tx).await?;

    Ok(())
}

pub async fn seed_courses(
    db: &PgPool,
    instructor_ids: &[Uuid],
    category_ids: &[Uuid],
    courses_per_instructor: usize,
) -> SeedResult<usize> {
    let start_time = Instant::now();
    let courses = generate_courses(instructor_ids, category_ids, courses_per_instructor);
    println!("📘 Seeding {} published courses...", courses.len());

    // Three inserts per chunk, nine binds per lecture row
    let mut tx = db.begin().await?;
    for chunk in courses.chunks(BATCH_SIZE) {
        insert_courses_chunk(&mut tx, chunk).await?;
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} courses in {:?}",
        courses.len(),
        start_time.elapsed()
    );
    Ok(courses.len())
}

/// Deletes seeded instructors with everything they own, then unused categories.
pub async fn clear_catalog(db: &PgPool) -> SeedResult<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let pattern = format!("%@{}", SEED_EMAIL_DOMAIN);
    let mut tx = db.begin().await?;

    sqlx::query(
        "DELETE FROM enrollments WHERE course_id IN (
            SELECT c.id FROM courses c JOIN users u ON u.id = c.instructor_id
            WHERE u.email LIKE $1 AND u.role = 'instructor')",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM courses WHERE instructor_id IN (
            SELECT id FROM users WHERE email LIKE $1 AND role = 'instructor')",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?;

    let users = sqlx::query(
        "DELETE FROM users u WHERE u.email LIKE $1 AND u.role = 'instructor'
         AND NOT EXISTS (SELECT 1 FROM bids b WHERE b.instructor_id = u.id)
         AND NOT EXISTS (SELECT 1 FROM transactions t WHERE t.user_id = u.id)",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let categories = sqlx::query(
        "DELETE FROM categories cat
         WHERE NOT EXISTS (SELECT 1 FROM courses c WHERE c.category_id = cat.id)",
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    println!(
        "   ✓ Deleted {} instructors and {} categories in {:?}",
        users,
        categories,
        start_time.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_instructor_emails_are_seed_scoped() {
        let instructors = generate_instructors(5, "hash");
        assert_eq!(instructors.len(), 5);
        assert!(
            instructors
                .iter()
                .all(|i| i.email.ends_with("@example.com") && i.email.contains("+instructor"))
        );
    }

    #[test]
    fn test_category_names_are_unique() {
        let categories = generate_categories(20);
        let mut names: Vec<String> = categories.iter().map(|c| c.name.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_courses_spread_over_categories() {
        let instructors = vec![Uuid::new_v4(), Uuid::new_v4()];
        let categories = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let courses = generate_courses(&instructors, &categories, 3);

        assert_eq!(courses.len(), 6);
        for category in &categories {
            assert!(courses.iter().any(|c| c.category_id == *category));
        }
        assert!(courses.iter().all(|c| c.price >= 0 && c.price % 10 == 0));
    }

    #[test]
    fn test_no_courses_without_categories() {
        assert!(generate_courses(&[Uuid::new_v4()], &[], 3).is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("rust"), "Rust");
        assert_eq!(capitalize(""), "");
    }
}
