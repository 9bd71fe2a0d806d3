//! Seed rows and seeding configuration.

use learnmart_models::CourseLevel;
use uuid::Uuid;

pub struct CategorySeed {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

pub struct InstructorSeed {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub coins: i64,
}

/// A published course with one section holding one ready preview lecture.
pub struct CourseSeed {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub level: CourseLevel,
    pub section_id: Uuid,
    pub section_title: String,
    pub lecture_id: Uuid,
    pub lecture_title: String,
    pub duration_seconds: i32,
}

/// How much fake data to generate.
#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub categories: usize,
    pub instructors: usize,
    pub courses_per_instructor: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            categories: 5,
            instructors: 10,
            courses_per_instructor: 3,
        }
    }
}

impl SeedConfig {
    pub fn new(categories: usize) -> Self {
        Self {
            categories,
            ..Default::default()
        }
    }

    pub fn with_instructors(mut self, instructors: usize) -> Self {
        self.instructors = instructors;
        self
    }

    pub fn with_courses_per_instructor(mut self, courses: usize) -> Self {
        self.courses_per_instructor = courses;
        self
    }

    pub fn total_courses(&self) -> usize {
        self.instructors * self.courses_per_instructor
    }
}
