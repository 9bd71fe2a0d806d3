use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use learnmart_core::{AppError, Paginated};
use learnmart_models::{Category, CategoryFilterParams, CreateCategoryDto, UpdateCategoryDto};

use crate::state::AppState;

pub struct CategoryService;

fn trimmed_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

impl CategoryService {
    #[instrument(skip(state))]
    pub async fn get_category(state: &AppState, id: Uuid) -> Result<Category, AppError> {
        state
            .repos
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))
    }

    #[instrument(skip(state))]
    pub async fn list_categories(
        state: &AppState,
        filters: CategoryFilterParams,
    ) -> Result<Paginated<Category>, AppError> {
        let (categories, total) = state.repos.categories.list(&filters).await?;
        Ok(Paginated::new(categories, total, &filters.pagination))
    }

    #[instrument(skip(state))]
    pub async fn create_category(
        state: &AppState,
        dto: CreateCategoryDto,
    ) -> Result<Category, AppError> {
        let name = dto.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("name must not be blank"));
        }
        if state.repos.categories.find_by_name(name).await?.is_some() {
            return Err(AppError::bad_request(
                "A category with this name already exists",
            ));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: trimmed_description(dto.description),
            created_at: now,
            updated_at: now,
        };
        state.repos.categories.create(&category).await?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(state))]
    pub async fn update_category(
        state: &AppState,
        id: Uuid,
        dto: UpdateCategoryDto,
    ) -> Result<Category, AppError> {
        let mut category = Self::get_category(state, id).await?;

        if let Some(name) = dto.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::bad_request("name must not be blank"));
            }
            if let Some(existing) = state.repos.categories.find_by_name(name).await?
                && existing.id != id
            {
                return Err(AppError::bad_request(
                    "A category with this name already exists",
                ));
            }
            category.name = name.to_string();
        }
        if dto.description.is_some() {
            category.description = trimmed_description(dto.description);
        }
        category.updated_at = Utc::now();

        state.repos.categories.update(&category).await?;
        Ok(category)
    }

    #[instrument(skip(state))]
    pub async fn delete_category(state: &AppState, id: Uuid) -> Result<(), AppError> {
        Self::get_category(state, id).await?;

        if state.repos.categories.is_in_use(id).await? {
            return Err(AppError::bad_request(
                "Category is still used by one or more courses",
            ));
        }

        state.repos.categories.delete(id).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
