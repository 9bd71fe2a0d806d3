//! # LearnMart Core
//!
//! Core types, errors, and utilities for the LearnMart API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error taxonomy with HTTP response conversion
//! - [`response`]: The success envelope every handler responds with
//! - [`pagination`]: Page-based pagination with coercion and clamping
//! - [`password`]: Password hashing and verification
//! - [`serde`]: Custom serde deserialization helpers for query strings
//! - [`storage`]: Signed URL generation for object storage
//!
//! # Example
//!
//! ```ignore
//! use learnmart_core::{ApiResponse, AppError, PaginationParams};
//!
//! let error = AppError::not_found("Course not found");
//! let params = PaginationParams::default();
//! assert_eq!(params.page(), 1);
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod response;
pub mod serde;
pub mod storage;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorResponse, FieldError, RepoError, RepoResult};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use response::{ApiResponse, MessageData};
pub use storage::{HmacUrlSigner, SignedUrlRequest, StorageError, UrlSigner};
