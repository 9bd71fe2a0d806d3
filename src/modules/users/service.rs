use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use learnmart_core::storage::sanitize_key;
use learnmart_core::{AppError, MessageData, Paginated, hash_password, verify_password};
use learnmart_models::{
    BlockUserDto, ChangePasswordDto, UpdateProfileDto, UpdateRoleDto, User, UserFilterParams,
    UserResponse,
};

use crate::state::AppState;

pub struct UserService;

impl UserService {
    pub(crate) async fn find_user(state: &AppState, id: Uuid) -> Result<User, AppError> {
        state
            .repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    #[instrument(skip(state))]
    pub async fn get_profile(state: &AppState, user_id: Uuid) -> Result<UserResponse, AppError> {
        Ok(Self::find_user(state, user_id).await?.into())
    }

    #[instrument(skip(state))]
    pub async fn update_profile(
        state: &AppState,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<UserResponse, AppError> {
        let mut user = Self::find_user(state, user_id).await?;

        if let Some(name) = dto.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::bad_request("name must not be blank"));
            }
            user.name = name.to_string();
        }
        if let Some(bio) = dto.bio {
            let bio = bio.trim();
            user.bio = (!bio.is_empty()).then(|| bio.to_string());
        }
        if let Some(avatar_key) = dto.avatar_key {
            user.avatar_key = Some(sanitize_key(&avatar_key)?);
        }
        user.updated_at = Utc::now();

        state.repos.users.update(&user).await?;
        Ok(user.into())
    }

    #[instrument(skip(state, dto))]
    pub async fn change_password(
        state: &AppState,
        user_id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<MessageData, AppError> {
        let user = Self::find_user(state, user_id).await?;

        if !verify_password(&dto.current_password, &user.password_hash)? {
            return Err(AppError::bad_request("Current password is incorrect"));
        }

        let password_hash = hash_password(&dto.new_password)?;
        state
            .repos
            .users
            .update_password(user.id, &password_hash)
            .await?;
        state
            .sessions
            .revoke_all(user.id)
            .await
            .map_err(AppError::internal)?;

        info!(user_id = %user.id, "Password changed");
        Ok(MessageData::new("Password changed successfully"))
    }

    #[instrument(skip(state))]
    pub async fn list_users(
        state: &AppState,
        filters: UserFilterParams,
    ) -> Result<Paginated<UserResponse>, AppError> {
        let (users, total) = state.repos.users.list(&filters).await?;
        Ok(Paginated::new(users, total, &filters.pagination).map(UserResponse::from))
    }

    #[instrument(skip(state))]
    pub async fn set_blocked(
        state: &AppState,
        admin_id: Uuid,
        target_id: Uuid,
        dto: BlockUserDto,
    ) -> Result<UserResponse, AppError> {
        if admin_id == target_id {
            return Err(AppError::bad_request("You cannot block your own account"));
        }

        let mut user = Self::find_user(state, target_id).await?;
        user.is_blocked = dto.is_blocked;
        user.updated_at = Utc::now();
        state.repos.users.update(&user).await?;

        if user.is_blocked {
            state
                .sessions
                .revoke_all(user.id)
                .await
                .map_err(AppError::internal)?;
        }

        info!(user_id = %user.id, is_blocked = user.is_blocked, "Block status changed");
        Ok(user.into())
    }

    #[instrument(skip(state))]
    pub async fn update_role(
        state: &AppState,
        admin_id: Uuid,
        target_id: Uuid,
        dto: UpdateRoleDto,
    ) -> Result<UserResponse, AppError> {
        if admin_id == target_id {
            return Err(AppError::bad_request("You cannot change your own role"));
        }

        let mut user = Self::find_user(state, target_id).await?;
        user.role = dto.role;
        user.updated_at = Utc::now();
        state.repos.users.update(&user).await?;

        info!(user_id = %user.id, role = %user.role, "Role changed");
        Ok(user.into())
    }
}
