//! # LearnMart CLI
//!
//! Administrative tools for LearnMart: creating admin accounts and seeding
//! a development database with fake categories, instructors and courses.
//!
//! ## Usage
//!
//! ```ignore
//! use learnmart_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(5).with_instructors(10).with_courses_per_instructor(3);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
