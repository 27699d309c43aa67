// Token acquisition: POST /api/users/register and POST /api/users/login

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::JsonBody;
use crate::auth::{
    generate_jwt, hash_password_blocking, validate_password_policy, verify_password_blocking, Claims,
};
use crate::database::models::{NewUser, Role, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::FieldErrors;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

impl SessionResponse {
    fn issue(user: User) -> Result<Self, ApiError> {
        let token = generate_jwt(&Claims::for_user(&user))?;
        Ok(Self { token, user })
    }
}

/// Why a login was refused. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    UnknownEmail,
    WrongPassword,
    InactiveAccount,
}

impl LoginFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            LoginFailure::UnknownEmail => "unknown_email",
            LoginFailure::WrongPassword => "wrong_password",
            LoginFailure::InactiveAccount => "inactive_account",
        }
    }

    fn into_api_error(self) -> ApiError {
        match self {
            LoginFailure::UnknownEmail | LoginFailure::WrongPassword => ApiError::unauthorized(INVALID_CREDENTIALS),
            LoginFailure::InactiveAccount => ApiError::forbidden("Account is deactivated"),
        }
    }
}

/// POST /api/users/register - self-service sign-up, always as staff
pub async fn register(State(state): State<AppState>, JsonBody(mut input): JsonBody<NewUser>) -> ApiResult<SessionResponse> {
    input.role = None;
    input.validate().map_err(ApiError::invalid_fields)?;
    validate_password_policy(&input.password)?;

    let password_hash = hash_password_blocking(input.password.clone()).await?;
    let user = state.users().insert(&input, &password_hash, Role::Staff).await?;
    tracing::info!(user_id = user.id, "Registered new account");

    Ok(ApiResponse::created(SessionResponse::issue(user)?).with_message("Registration successful"))
}

/// POST /api/users/login
pub async fn login(State(state): State<AppState>, JsonBody(input): JsonBody<LoginRequest>) -> ApiResult<SessionResponse> {
    let mut errors = FieldErrors::new();
    errors.require_text("email", &input.email);
    if input.password.is_empty() {
        errors.add("password", "This field is required");
    }
    errors.into_result().map_err(ApiError::invalid_fields)?;

    let user = match authenticate(&state, &input).await? {
        Ok(user) => user,
        Err(failure) => {
            tracing::warn!(reason = failure.reason(), "Login refused");
            return Err(failure.into_api_error());
        }
    };

    tracing::info!(user_id = user.id, "Login succeeded");
    Ok(ApiResponse::success(SessionResponse::issue(user)?).with_message("Login successful"))
}

async fn authenticate(state: &AppState, input: &LoginRequest) -> Result<Result<User, LoginFailure>, ApiError> {
    let Some(user) = state.users().find_by_email(&input.email).await? else {
        return Ok(Err(LoginFailure::UnknownEmail));
    };
    if !verify_password_blocking(input.password.clone(), user.password_hash.clone()).await? {
        return Ok(Err(LoginFailure::WrongPassword));
    }
    if !user.is_active {
        return Ok(Err(LoginFailure::InactiveAccount));
    }
    Ok(Ok(user))
}
