//! Pagination utilities for API responses.
//!
//! List endpoints are page-based and accept two query parameters:
//!
//! - `page`: Page number (1-indexed, default: 1). Values below 1 become 1.
//! - `limit`: Items per page (default: 10), clamped to [1, 100].
//!
//! Both arrive as strings in the query string and are coerced to integers;
//! empty strings are treated as absent.
//!
//! # Example
//!
//! ```ignore
//! use learnmart_core::pagination::{Paginated, PaginationParams};
//!
//! async fn list_courses(
//!     ValidatedQuery(params): ValidatedQuery<PaginationParams>,
//! ) -> Result<ApiResponse<Paginated<Course>>, AppError> {
//!     let (items, total) = repo.list(params.limit(), params.offset()).await?;
//!     Ok(ApiResponse::ok("Courses fetched", Paginated::new(items, total, &params)))
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

/// Deserializes an optional string (or number) into an optional i64.
///
/// Query parameters may be empty strings, which are treated as `None`.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got `{}`", s))),
    }
}

/// Metadata about a paginated response.
///
/// ```json
/// { "total": 42, "page": 2, "limit": 10, "totalPages": 5, "hasMore": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    /// Number of pages for the current limit
    pub total_pages: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let page = params.page();
        let total = total.max(0);
        let total_pages = (total + limit - 1) / limit;

        Self {
            total,
            page,
            limit,
            total_pages,
            has_more: params.offset() + limit < total,
        }
    }
}

/// Query parameters for pagination.
///
/// `page` is clamped to a minimum of 1 and `limit` to the range [1, 100].
#[derive(Debug, Clone, Hash, PartialEq, Eq, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[param(value_type = Option<i64>)]
    pub page: Option<i64>,
    /// Maximum number of items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[param(value_type = Option<i64>)]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(DEFAULT_PAGE),
            limit: Some(DEFAULT_LIMIT),
        }
    }
}

impl PaginationParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Returns the effective page, never below 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Returns the effective limit, clamped to [1, 100].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of items to skip for the effective page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// A page of items together with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            items,
            meta: PaginationMeta::new(total, params),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
