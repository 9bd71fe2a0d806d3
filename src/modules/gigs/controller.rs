use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, Paginated, PaginationParams};
use learnmart_models::{Bid, CreateGigDto, Gig, GigDetail, GigFilterParams, PlaceBidDto};

use super::service::GigService;
use crate::middleware::auth::{AuthUser, RequireAdmin, RequireInstructor};
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/gigs",
    params(GigFilterParams),
    responses(
        (status = 200, description = "Paginated gigs", body = [Gig])
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_gigs(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedQuery(filters): ValidatedQuery<GigFilterParams>,
) -> Result<ApiResponse<Paginated<Gig>>, AppError> {
    let gigs = GigService::list_gigs(&state, filters).await?;
    Ok(ApiResponse::ok("Gigs fetched successfully", gigs))
}

#[utoipa::path(
    post,
    path = "/api/gigs",
    request_body = CreateGigDto,
    responses(
        (status = 201, description = "Gig created", body = Gig),
        (status = 400, description = "Gig window already over", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_gig(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateGigDto>,
) -> Result<ApiResponse<Gig>, AppError> {
    let gig = GigService::create_gig(&state, admin.user_id(), dto).await?;
    Ok(ApiResponse::created("Gig created successfully", gig))
}

#[utoipa::path(
    get,
    path = "/api/gigs/bids/mine",
    params(PaginationParams),
    responses(
        (status = 200, description = "Bids placed by the caller", body = [Bid]),
        (status = 403, description = "Instructor role required", body = ErrorResponse)
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_my_bids(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    ValidatedQuery(pagination): ValidatedQuery<PaginationParams>,
) -> Result<ApiResponse<Paginated<Bid>>, AppError> {
    let bids = GigService::list_my_bids(&state, auth_user.user_id(), pagination).await?;
    Ok(ApiResponse::ok("Bids fetched successfully", bids))
}

#[utoipa::path(
    get,
    path = "/api/gigs/{id}",
    params(("id" = Uuid, Path, description = "Gig ID")),
    responses(
        (status = 200, description = "Gig with bid summary", body = GigDetail),
        (status = 404, description = "Gig not found", body = ErrorResponse)
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_gig(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<GigDetail>, AppError> {
    let gig = GigService::get_gig(&state, id).await?;
    Ok(ApiResponse::ok("Gig fetched successfully", gig))
}

#[utoipa::path(
    get,
    path = "/api/gigs/{id}/bids",
    params(("id" = Uuid, Path, description = "Gig ID"), PaginationParams),
    responses(
        (status = 200, description = "Bids on the gig, highest first", body = [Bid]),
        (status = 404, description = "Gig not found", body = ErrorResponse)
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_bids(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedQuery(pagination): ValidatedQuery<PaginationParams>,
) -> Result<ApiResponse<Paginated<Bid>>, AppError> {
    let bids = GigService::list_bids(&state, id, pagination).await?;
    Ok(ApiResponse::ok("Bids fetched successfully", bids))
}

#[utoipa::path(
    post,
    path = "/api/gigs/{id}/bids",
    params(("id" = Uuid, Path, description = "Gig ID")),
    request_body = PlaceBidDto,
    responses(
        (status = 201, description = "Bid placed", body = Bid),
        (status = 400, description = "Bid rejected", body = ErrorResponse),
        (status = 404, description = "Gig not found", body = ErrorResponse)
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn place_bid(
    State(state): State<AppState>,
    RequireInstructor(auth_user): RequireInstructor,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<PlaceBidDto>,
) -> Result<ApiResponse<Bid>, AppError> {
    let bid = GigService::place_bid(&state, auth_user.user_id(), id, dto).await?;
    Ok(ApiResponse::created("Bid placed successfully", bid))
}

#[utoipa::path(
    patch,
    path = "/api/gigs/{id}/close",
    params(("id" = Uuid, Path, description = "Gig ID")),
    responses(
        (status = 200, description = "Gig settled", body = Gig),
        (status = 400, description = "Gig already closed", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Gigs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn close_gig(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Gig>, AppError> {
    let gig = GigService::close_gig(&state, id).await?;
    Ok(ApiResponse::ok("Gig closed successfully", gig))
}
