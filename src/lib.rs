//! # LearnMart API
//!
//! An e-learning marketplace backend built with Axum, PostgreSQL and Redis.
//! Students buy coins and spend them on courses, instructors publish
//! courses and bid coins on gigs opened by admins.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # Auth extractors and role guards
//! ├── modules/          # Feature modules
//! │   ├── auth/         # Sign-up with OTP, sign-in, tokens, password reset
//! │   ├── users/        # Profiles and user administration
//! │   ├── categories/   # Course categories
//! │   ├── courses/      # Courses, sections, lectures, enrollment, lecture events
//! │   ├── gigs/         # Gigs, bids and settlement
//! │   ├── payments/     # Coin ratio, coin purchases, transaction history
//! │   ├── notifications/# In-app notifications
//! │   └── files/        # Pre-signed storage URLs
//! └── utils/            # Email delivery
//! ```
//!
//! Each feature module has the same layout:
//!
//! - `mod.rs`: Module exports
//! - `controller.rs`: HTTP handlers with their OpenAPI annotations
//! - `service.rs`: Business rules
//! - `router.rs`: Axum router configuration
//!
//! Domain types live in `learnmart-models`, persistence behind the traits
//! of `learnmart-db`, and Redis-backed state in `learnmart-cache`.
//!
//! ## Authentication
//!
//! - **Access token**: 15 minutes, carries id, email and role
//! - **Refresh token**: 1 day, tracked as a revocable session in Redis
//! - **Reset token**: 5 minutes, bound to the account email
//!
//! Each kind is signed with its own secret.
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export workspace crates for convenience
pub use learnmart_auth;
pub use learnmart_cache;
pub use learnmart_config;
pub use learnmart_core;
pub use learnmart_db;
pub use learnmart_models;
