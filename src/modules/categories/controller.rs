use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use learnmart_core::{ApiResponse, AppError, ErrorResponse, MessageData, Paginated};
use learnmart_models::{Category, CategoryFilterParams, CreateCategoryDto, UpdateCategoryDto};

use super::service::CategoryService;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    get,
    path = "/api/categories",
    params(CategoryFilterParams),
    responses(
        (status = 200, description = "Paginated categories", body = [Category])
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    ValidatedQuery(filters): ValidatedQuery<CategoryFilterParams>,
) -> Result<ApiResponse<Paginated<Category>>, AppError> {
    let categories = CategoryService::list_categories(&state, filters).await?;
    Ok(ApiResponse::ok("Categories fetched successfully", categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Category>, AppError> {
    let category = CategoryService::get_category(&state, id).await?;
    Ok(ApiResponse::ok("Category fetched successfully", category))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Duplicate name", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateCategoryDto>,
) -> Result<ApiResponse<Category>, AppError> {
    let category = CategoryService::create_category(&state, dto).await?;
    Ok(ApiResponse::created("Category created successfully", category))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Duplicate name", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCategoryDto>,
) -> Result<ApiResponse<Category>, AppError> {
    let category = CategoryService::update_category(&state, id, dto).await?;
    Ok(ApiResponse::ok("Category updated successfully", category))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageData),
        (status = 400, description = "Category still in use", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<MessageData>, AppError> {
    CategoryService::delete_category(&state, id).await?;
    Ok(ApiResponse::ok(
        "Category deleted successfully",
        MessageData::new("Category deleted successfully"),
    ))
}
