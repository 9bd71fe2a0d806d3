//! PostgreSQL implementations of the repository traits.

mod category;
mod coin_ratio;
mod course;
mod enrollment;
mod gig;
mod lecture;
mod ledger;
mod notification;
mod section;
mod transaction;
mod user;

pub use category::PgCategoryRepository;
pub use coin_ratio::PgCoinRatioRepository;
pub use course::PgCourseRepository;
pub use enrollment::PgEnrollmentRepository;
pub use gig::PgGigRepository;
pub use lecture::PgLectureRepository;
pub use notification::PgNotificationRepository;
pub use section::PgSectionRepository;
pub use transaction::PgTransactionRepository;
pub use user::PgUserRepository;
