//! Fake data for development databases.
//!
//! Seeded instructors use `@example.com` addresses and the shared password
//! [`SEED_PASSWORD`]; `clear_seed` removes them with their courses.

mod catalog;
mod models;

use std::time::Instant;

use learnmart_core::hash_password;
use sqlx::PgPool;

pub use catalog::{
    SEED_EMAIL_DOMAIN, clear_catalog, generate_categories, generate_courses, generate_instructors,
    seed_categories, seed_courses, seed_instructors,
};
pub use models::{CategorySeed, CourseSeed, InstructorSeed, SeedConfig};

pub const SEED_PASSWORD: &str = "password123";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Seeding database: {:?}", config);

    let password_hash =
        hash_password(SEED_PASSWORD).map_err(|e| format!("Failed to hash password: {}", e))?;

    let category_ids = seed_categories(db, config.categories).await?;
    let instructor_ids = seed_instructors(db, config.instructors, &password_hash).await?;
    let courses = seed_courses(
        db,
        &instructor_ids,
        &category_ids,
        config.courses_per_instructor,
    )
    .await?;

    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());
    println!(
        "   {} categories, {} instructors, {} courses",
        category_ids.len(),
        instructor_ids.len(),
        courses
    );
    println!("   Instructor password: {}", SEED_PASSWORD);
    Ok(())
}

pub async fn clear_seed(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    clear_catalog(db).await?;
    println!("✅ Seeded data cleared");
    Ok(())
}
