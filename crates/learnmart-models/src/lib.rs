//! # LearnMart Models
//!
//! Domain models and DTOs for the LearnMart API.
//!
//! Entities derive [`sqlx::FromRow`] and serialize with camelCase field
//! names. Request DTOs derive [`validator::Validate`] and every public shape
//! derives [`utoipa::ToSchema`] so it shows up in the OpenAPI document.
//!
//! # Modules
//!
//! - [`users`]: Users, roles and profile DTOs
//! - [`auth`]: Sign-up, OTP, sign-in and password reset DTOs
//! - [`categories`]: Course categories
//! - [`courses`]: Courses, sections, lectures and enrollments
//! - [`gigs`]: Gigs and bids
//! - [`payments`]: Coin ratio, transactions and purchases
//! - [`notifications`]: In-app notifications
//! - [`files`]: Signed URL requests
//! - [`events`]: Lecture processing events exchanged over pub/sub

pub mod auth;
pub mod categories;
pub mod courses;
pub mod events;
pub mod files;
pub mod gigs;
pub mod notifications;
pub mod payments;
pub mod users;

pub use auth::{
    AccessTokenResponse, ForgotPasswordRequest, PendingSignup, RefreshTokenRequest,
    ResendOtpRequest, ResetPasswordRequest, SignInRequest, SignInResponse, SignOutRequest,
    SignUpRequest, VerifyOtpRequest,
};
pub use categories::{Category, CategoryFilterParams, CreateCategoryDto, UpdateCategoryDto};
pub use courses::{
    Course, CourseDetail, CourseFilterParams, CourseLevel, CourseStatus, CreateCourseDto,
    CreateLectureDto, CreateSectionDto, EnrolledCourse, Enrollment, Lecture, LectureStatus,
    LectureView, Section, SectionWithLectures, UpdateCourseDto, UpdateLectureDto,
    UpdateSectionDto,
};
pub use events::{LECTURE_EVENTS_CHANNEL, LectureEvent, LectureEventData, LectureEventKind};
pub use files::{DownloadUrlParams, SignedUrlDto, SignedUrlResponse};
pub use gigs::{Bid, CreateGigDto, Gig, GigDetail, GigFilterParams, GigStatus, PlaceBidDto};
pub use notifications::{
    Notification, NotificationFilterParams, NotificationKind, UnreadCountResponse,
};
pub use payments::{
    BalanceResponse, CoinRatio, PurchaseCoinsDto, PurchaseCoinsResponse, PurchaseType,
    PurchaseTypeFilter, Transaction, TransactionFilterParams, TransactionType,
    TransactionTypeFilter, UpdateCoinRatioDto,
};
pub use users::{
    BlockUserDto, ChangePasswordDto, UpdateProfileDto, UpdateRoleDto, User, UserFilterParams,
    UserResponse, UserRole, normalize_email,
};
