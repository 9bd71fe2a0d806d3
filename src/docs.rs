use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use learnmart_core::{ErrorResponse, FieldError, MessageData, PaginationMeta, PaginationParams};
use learnmart_models::{
    AccessTokenResponse, BalanceResponse, Bid, BlockUserDto, Category, ChangePasswordDto,
    CoinRatio, Course, CourseDetail, CourseLevel, CourseStatus, CreateCategoryDto,
    CreateCourseDto, CreateGigDto, CreateLectureDto, CreateSectionDto, EnrolledCourse,
    Enrollment, ForgotPasswordRequest, Gig, GigDetail, GigStatus, Lecture, LectureStatus,
    LectureView, Notification, NotificationKind, PlaceBidDto, PurchaseCoinsDto,
    PurchaseCoinsResponse, PurchaseType, PurchaseTypeFilter, RefreshTokenRequest,
    ResendOtpRequest, ResetPasswordRequest, Section, SectionWithLectures, SignInRequest,
    SignInResponse, SignOutRequest, SignUpRequest, SignedUrlDto, SignedUrlResponse, Transaction,
    TransactionType, TransactionTypeFilter, UnreadCountResponse, UpdateCategoryDto,
    UpdateCoinRatioDto, UpdateCourseDto, UpdateLectureDto, UpdateProfileDto, UpdateRoleDto,
    UpdateSectionDto, UserResponse, UserRole, VerifyOtpRequest,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::sign_up,
        crate::modules::auth::controller::resend_otp,
        crate::modules::auth::controller::verify_otp,
        crate::modules::auth::controller::sign_in,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::sign_out,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::auth::controller::me,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::block_user,
        crate::modules::users::controller::update_role,
        crate::modules::categories::controller::list_categories,
        crate::modules::categories::controller::get_category,
        crate::modules::categories::controller::create_category,
        crate::modules::categories::controller::update_category,
        crate::modules::categories::controller::delete_category,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::list_my_courses,
        crate::modules::courses::controller::list_enrolled_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::publish_course,
        crate::modules::courses::controller::enroll,
        crate::modules::courses::controller::create_section,
        crate::modules::courses::controller::update_section,
        crate::modules::courses::controller::delete_section,
        crate::modules::courses::controller::create_lecture,
        crate::modules::courses::controller::update_lecture,
        crate::modules::courses::controller::delete_lecture,
        crate::modules::gigs::controller::list_gigs,
        crate::modules::gigs::controller::create_gig,
        crate::modules::gigs::controller::list_my_bids,
        crate::modules::gigs::controller::get_gig,
        crate::modules::gigs::controller::list_bids,
        crate::modules::gigs::controller::place_bid,
        crate::modules::gigs::controller::close_gig,
        crate::modules::payments::controller::get_coin_ratio,
        crate::modules::payments::controller::update_coin_ratio,
        crate::modules::payments::controller::purchase_coins,
        crate::modules::payments::controller::list_transactions,
        crate::modules::payments::controller::get_balance,
        crate::modules::notifications::controller::list_notifications,
        crate::modules::notifications::controller::unread_count,
        crate::modules::notifications::controller::mark_read,
        crate::modules::notifications::controller::mark_all_read,
        crate::modules::notifications::controller::delete_notification,
        crate::modules::files::controller::create_signed_url,
        crate::modules::files::controller::get_download_url,
    ),
    components(
        schemas(
            ErrorResponse,
            FieldError,
            MessageData,
            PaginationMeta,
            PaginationParams,
            UserRole,
            UserResponse,
            SignUpRequest,
            ResendOtpRequest,
            VerifyOtpRequest,
            SignInRequest,
            SignInResponse,
            RefreshTokenRequest,
            AccessTokenResponse,
            SignOutRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdateProfileDto,
            ChangePasswordDto,
            BlockUserDto,
            UpdateRoleDto,
            Category,
            CreateCategoryDto,
            UpdateCategoryDto,
            Course,
            CourseLevel,
            CourseStatus,
            CourseDetail,
            CreateCourseDto,
            UpdateCourseDto,
            Section,
            SectionWithLectures,
            CreateSectionDto,
            UpdateSectionDto,
            Lecture,
            LectureStatus,
            LectureView,
            CreateLectureDto,
            UpdateLectureDto,
            Enrollment,
            EnrolledCourse,
            Gig,
            GigStatus,
            GigDetail,
            Bid,
            CreateGigDto,
            PlaceBidDto,
            CoinRatio,
            UpdateCoinRatioDto,
            PurchaseCoinsDto,
            PurchaseCoinsResponse,
            BalanceResponse,
            Transaction,
            TransactionType,
            PurchaseType,
            TransactionTypeFilter,
            PurchaseTypeFilter,
            Notification,
            NotificationKind,
            UnreadCountResponse,
            SignedUrlDto,
            SignedUrlResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-up with OTP, sign-in, tokens and password reset"),
        (name = "Users", description = "Profiles and user administration"),
        (name = "Categories", description = "Course categories"),
        (name = "Courses", description = "Courses, sections, lectures and enrollment"),
        (name = "Gigs", description = "Gig bidding for instructors"),
        (name = "Payments", description = "Coins, coin ratio and transaction history"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Files", description = "Pre-signed storage URLs")
    ),
    info(
        title = "LearnMart API",
        version = "0.1.0",
        description = "E-learning marketplace API built with Rust, Axum, PostgreSQL and Redis.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
