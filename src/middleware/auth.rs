use axum::{
    extract::{MatchedPath, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::policy::{access_for, Access};

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl AuthUser {
    /// `None` for a role string this build does not know
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_privileged(&self) -> bool {
        self.role().map(|r| r.is_privileged()).unwrap_or(false)
    }
}

/// Single gate for every routed request: looks up the route's policy,
/// verifies the bearer token when one is required and checks the role.
pub async fn auth_gate(
    matched_path: Option<MatchedPath>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = matched_path.as_ref().map(|p| p.as_str()).unwrap_or_else(|| request.uri().path());
    let access = access_for(request.method().as_str(), path);

    if access == Access::Public {
        return Ok(next.run(request).await);
    }

    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let auth_user = AuthUser::from(validate_jwt(&token)?);

    if let Access::Roles(allowed) = access {
        let permitted = auth_user.role().map(|r| allowed.contains(&r)).unwrap_or(false);
        if !permitted {
            tracing::warn!(user_id = auth_user.user_id, role = %auth_user.role, path, "Role not permitted");
            return Err(ApiError::forbidden("Insufficient permissions for this operation"));
        }
    }

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
