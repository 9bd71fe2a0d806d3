//! Extractors for authentication and role checks.
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. [`auth::AuthUser`] verifies the access token and exposes its claims
//! 3. Role extractors such as [`auth::RequireAdmin`] reject other roles with 403
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireInstructor};
//!
//! async fn get_profile(auth_user: AuthUser) -> impl IntoResponse {
//!     let user_id = auth_user.user_id();
//!     // ...
//! }
//!
//! async fn create_course(RequireInstructor(auth_user): RequireInstructor) -> impl IntoResponse {
//!     // Only instructors and admins get here
//! }
//! ```

pub mod auth;
