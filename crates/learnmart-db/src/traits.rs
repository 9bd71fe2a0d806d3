//! Repository traits.
//!
//! List operations return the page of rows together with the total count
//! matching the filter, so callers can build pagination metadata.

use async_trait::async_trait;
use uuid::Uuid;

use learnmart_core::{PaginationParams, RepoResult};
use learnmart_models::{
    Bid, Category, CategoryFilterParams, CoinRatio, Course, CourseFilterParams, EnrolledCourse,
    Enrollment, Gig, GigFilterParams, Lecture, Notification, NotificationFilterParams,
    PurchaseType, Section, Transaction, TransactionFilterParams, User, UserFilterParams,
};

pub type Page<T> = (Vec<T>, i64);

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, user: &User) -> RepoResult<()>;

    /// Persists name, bio, avatar key, role and blocked flag. Coins and
    /// password hash are only changed through their dedicated operations.
    async fn update(&self, user: &User) -> RepoResult<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()>;

    async fn list(&self, filters: &UserFilterParams) -> RepoResult<Page<User>>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Category>>;

    /// Case-insensitive lookup.
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>>;

    async fn create(&self, category: &Category) -> RepoResult<()>;

    async fn update(&self, category: &Category) -> RepoResult<()>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    /// Whether any course references the category.
    async fn is_in_use(&self, id: Uuid) -> RepoResult<bool>;

    async fn list(&self, filters: &CategoryFilterParams) -> RepoResult<Page<Category>>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Course>>;

    async fn create(&self, course: &Course) -> RepoResult<()>;

    async fn update(&self, course: &Course) -> RepoResult<()>;

    /// Removes the course with its sections, lectures and enrollments.
    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    /// Published courses only.
    async fn list_published(&self, filters: &CourseFilterParams) -> RepoResult<Page<Course>>;

    /// Every course of one instructor, drafts included.
    async fn list_by_instructor(
        &self,
        instructor_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Course>>;
}

#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Section>>;

    /// Ordered by position, then creation time.
    async fn list_by_course(&self, course_id: Uuid) -> RepoResult<Vec<Section>>;

    async fn create(&self, section: &Section) -> RepoResult<()>;

    async fn update(&self, section: &Section) -> RepoResult<()>;

    /// Removes the section and its lectures.
    async fn delete(&self, id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait LectureRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Lecture>>;

    /// The lecture currently pointing at `video_key`, if any.
    async fn find_by_video_key(&self, video_key: &str) -> RepoResult<Option<Lecture>>;

    /// Ordered by position, then creation time.
    async fn list_by_course(&self, course_id: Uuid) -> RepoResult<Vec<Lecture>>;

    async fn create(&self, lecture: &Lecture) -> RepoResult<()>;

    async fn update(&self, lecture: &Lecture) -> RepoResult<()>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    async fn count_ready(&self, course_id: Uuid) -> RepoResult<i64>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, course_id: Uuid) -> RepoResult<Option<Enrollment>>;

    /// Creates the enrollment and applies `movements` in one unit.
    ///
    /// Fails with `Conflict` on a duplicate enrollment and with
    /// `InsufficientCoins` when a debit would overdraw; nothing is written then.
    async fn enroll(&self, enrollment: &Enrollment, movements: &[Transaction]) -> RepoResult<()>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<EnrolledCourse>>;

    async fn count_for_course(&self, course_id: Uuid) -> RepoResult<i64>;
}

#[async_trait]
pub trait GigRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Gig>>;

    async fn create(&self, gig: &Gig) -> RepoResult<()>;

    async fn list(&self, filters: &GigFilterParams) -> RepoResult<Page<Gig>>;

    async fn highest_bid(&self, gig_id: Uuid) -> RepoResult<Option<Bid>>;

    async fn count_bids(&self, gig_id: Uuid) -> RepoResult<i64>;

    /// Inserts `bid` only if it beats the current highest bid, checked under
    /// a lock on the gig. Returns the bid it displaced.
    async fn place_bid(&self, bid: &Bid) -> RepoResult<Option<Bid>>;

    async fn list_bids(&self, gig_id: Uuid, pagination: &PaginationParams)
    -> RepoResult<Page<Bid>>;

    async fn list_bids_by_instructor(
        &self,
        instructor_id: Uuid,
        pagination: &PaginationParams,
    ) -> RepoResult<Page<Bid>>;

    /// Highest first.
    async fn bids_by_amount(&self, gig_id: Uuid) -> RepoResult<Vec<Bid>>;

    /// Closes the gig with `winning_bid_id` and applies `movements` in one unit.
    async fn settle(
        &self,
        gig_id: Uuid,
        winning_bid_id: Option<Uuid>,
        movements: &[Transaction],
    ) -> RepoResult<Gig>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Applies every movement to its user's balance and records it, all or nothing.
    async fn apply(&self, movements: &[Transaction]) -> RepoResult<()>;

    async fn find_by_reference(
        &self,
        purchase_type: PurchaseType,
        reference_id: &str,
    ) -> RepoResult<Option<Transaction>>;

    async fn list(
        &self,
        user_id: Uuid,
        filters: &TransactionFilterParams,
    ) -> RepoResult<Page<Transaction>>;
}

#[async_trait]
pub trait CoinRatioRepository: Send + Sync {
    async fn get(&self) -> RepoResult<CoinRatio>;

    async fn set(&self, ratio: &CoinRatio) -> RepoResult<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> RepoResult<()>;

    async fn list(
        &self,
        user_id: Uuid,
        filters: &NotificationFilterParams,
    ) -> RepoResult<Page<Notification>>;

    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64>;

    /// `NotFound` unless the notification belongs to `user_id`.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> RepoResult<Notification>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<i64>;

    /// `NotFound` unless the notification belongs to `user_id`.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> RepoResult<()>;
}
