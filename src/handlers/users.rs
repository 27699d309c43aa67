// Account management under /api/users. Role requirements live in the
// policy table; only owner-or-privileged is decided here.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;

use crate::api::{parse_id, JsonBody};
use crate::auth::{hash_password_blocking, validate_password_policy};
use crate::database::models::{NewUser, Role, UpdateUser, User};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    #[serde(default, alias = "newPassword")]
    pub password: String,
}

/// GET /api/users?search=&role=
pub async fn list(State(state): State<AppState>, Query(params): Query<HashMap<String, String>>) -> ApiResult<Vec<User>> {
    let filter_data = FilterData::from(params);
    let repo = state.users();
    let users = repo.select_any(&filter_data).await?;
    let total = repo.count(&filter_data).await?;
    Ok(ApiResponse::success(users).with_count(total))
}

/// POST /api/users - account created by an admin or staff actor
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    JsonBody(input): JsonBody<NewUser>,
) -> ApiResult<User> {
    input.validate().map_err(ApiError::invalid_fields)?;
    validate_password_policy(&input.password)?;

    let role = match input.role.as_deref().map(str::trim) {
        Some(role) => role.parse::<Role>().map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => Role::Staff,
    };

    let password_hash = hash_password_blocking(input.password.clone()).await?;
    let user = state.users().insert(&input, &password_hash, role).await?;
    tracing::info!(actor = actor.user_id, user_id = user.id, role = %role, "Created account");

    Ok(ApiResponse::created(user).with_message("User created successfully"))
}

/// GET /api/users/me
pub async fn me(State(state): State<AppState>, Extension(actor): Extension<AuthUser>) -> ApiResult<User> {
    let user = state.users().select_404(actor.user_id).await?;
    Ok(ApiResponse::success(user))
}

/// GET /api/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let id = parse_id(&id)?;
    let user = state.users().select_404(id).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/:id - full name, email and role
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<UpdateUser>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    let user = state.users().update(id, patch).await.map_err(|err| match err {
        DatabaseError::Invalid(field_errors) => ApiError::invalid_fields(field_errors),
        other => other.into(),
    })?;
    Ok(ApiResponse::success(user).with_message("User updated successfully"))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    let user = state.users().delete(id).await?;
    tracing::info!(actor = actor.user_id, user_id = id, "Deleted account");
    Ok(ApiResponse::success(user).with_message("User deleted successfully"))
}

/// PUT /api/users/:id/activate
pub async fn activate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    set_active(state, id, true).await
}

/// PUT /api/users/:id/deactivate
pub async fn deactivate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    set_active(state, id, false).await
}

async fn set_active(state: AppState, id: String, is_active: bool) -> ApiResult<User> {
    let id = parse_id(&id)?;
    let user = state.users().set_active(id, is_active).await?;
    let message = if is_active { "User activated successfully" } else { "User deactivated successfully" };
    Ok(ApiResponse::success(user).with_message(message))
}

/// PUT /api/users/:id/password - the account owner or an admin/staff actor
pub async fn update_password(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<PasswordUpdate>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    ensure_owner_or_privileged(&actor, id)?;
    validate_password_policy(&input.password)?;

    let password_hash = hash_password_blocking(input.password).await?;
    state.users().update_password(id, &password_hash).await?;
    tracing::info!(actor = actor.user_id, user_id = id, "Password updated");

    Ok(ApiResponse::message("Password updated successfully"))
}

fn ensure_owner_or_privileged(actor: &AuthUser, id: i64) -> Result<(), ApiError> {
    if actor.user_id == id || actor.is_privileged() {
        Ok(())
    } else {
        Err(ApiError::forbidden("You may only change your own password"))
    }
}
