//! # LearnMart DB
//!
//! Data access for the LearnMart API.
//!
//! Services only see the async repository traits in [`traits`], bundled in
//! [`Repositories`]. Two implementations exist:
//!
//! - [`postgres`]: SQLx-backed repositories used in production
//! - [`memory`]: a single in-process store (feature `test-utils`) used by the
//!   integration tests
//!
//! Money movements ([`traits::TransactionRepository::apply`], enrollments
//! and gig settlements) are atomic: a user's balance never drops below zero
//! and each movement leaves a transaction row.
//!
//! # Example
//!
//! ```ignore
//! use learnmart_db::{DatabaseConfig, Repositories, create_pool, run_migrations};
//!
//! let pool = create_pool(&DatabaseConfig::from_env()).await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::postgres(pool);
//! ```

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod traits;

use std::sync::Arc;

pub use pool::{DatabaseConfig, PgPool, create_pool, run_migrations};
pub use traits::{
    CategoryRepository, CoinRatioRepository, CourseRepository, EnrollmentRepository,
    GigRepository, LectureRepository, NotificationRepository, SectionRepository,
    TransactionRepository, UserRepository,
};

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub lectures: Arc<dyn LectureRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub gigs: Arc<dyn GigRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub coin_ratio: Arc<dyn CoinRatioRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        use postgres::*;

        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            categories: Arc::new(PgCategoryRepository::new(pool.clone())),
            courses: Arc::new(PgCourseRepository::new(pool.clone())),
            sections: Arc::new(PgSectionRepository::new(pool.clone())),
            lectures: Arc::new(PgLectureRepository::new(pool.clone())),
            enrollments: Arc::new(PgEnrollmentRepository::new(pool.clone())),
            gigs: Arc::new(PgGigRepository::new(pool.clone())),
            transactions: Arc::new(PgTransactionRepository::new(pool.clone())),
            coin_ratio: Arc::new(PgCoinRatioRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Self {
        Self::from_memory(memory::MemoryStore::default())
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn from_memory(store: memory::MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            categories: store.clone(),
            courses: store.clone(),
            sections: store.clone(),
            lectures: store.clone(),
            enrollments: store.clone(),
            gigs: store.clone(),
            transactions: store.clone(),
            coin_ratio: store.clone(),
            notifications: store,
        }
    }
}
