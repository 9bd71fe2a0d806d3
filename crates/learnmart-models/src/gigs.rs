//! Gigs are bidding windows opened by admins; instructors bid coins on them.

use chrono::{DateTime, Utc};
use learnmart_core::PaginationParams;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "gig_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GigStatus {
    Open,
    Closed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Gig {
    pub id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub description: String,
    pub min_bid: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: GigStatus,
    pub winning_bid_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Gig {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.ends_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub gig_id: Uuid,
    pub instructor_id: Uuid,
    pub amount: i64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GigDetail {
    #[serde(flatten)]
    pub gig: Gig,
    pub bid_count: i64,
    pub highest_bid: Option<i64>,
}

fn validate_gig_window(dto: &CreateGigDto) -> Result<(), ValidationError> {
    if dto.ends_at <= dto.starts_at {
        return Err(ValidationError::new("gig_window")
            .with_message("endsAt must be after startsAt".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_gig_window"))]
pub struct CreateGigDto {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(range(min = 1, message = "minBid must be at least 1"))]
    pub min_bid: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaceBidDto {
    #[validate(range(min = 1, message = "amount must be at least 1"))]
    pub amount: i64,
    #[validate(length(max = 1000, message = "message must be at most 1000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GigFilterParams {
    pub status: Option<GigStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_gig_window_must_be_forward() {
        let now = Utc::now();
        let dto = CreateGigDto {
            title: "Rust course".to_string(),
            description: "Build a Rust course".to_string(),
            min_bid: 10,
            starts_at: now,
            ends_at: now - Duration::hours(1),
        };
        assert!(dto.validate().is_err());

        let ok = CreateGigDto {
            ends_at: now + Duration::hours(1),
            ..dto
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_window_checks() {
        let now = Utc::now();
        let gig = Gig {
            id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            title: "t".to_string(),
            description: "d".to_string(),
            min_bid: 1,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            status: GigStatus::Open,
            winning_bid_id: None,
            created_at: now,
        };
        assert!(gig.has_started(now));
        assert!(!gig.has_ended(now));
        assert!(gig.has_ended(now + Duration::hours(2)));
    }
}
