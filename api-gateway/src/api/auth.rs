//! Authentication API handlers
//!
//! Registration, login, logout, token refresh and the caller's profile.
//! Registering or logging in also opens the user's account if it does not
//! exist yet.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use common::model::user::NewUser;
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::api::dto::{AccessTokenResponse, AuthResponse, MessageResponse, UserDto};
use crate::api::response::ApiResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request carrying a refresh token
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register/",
    request_body = NewUser,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid registration data or email taken", body = crate::error::ErrorResponse),
        (status = 500, description = "Account could not be opened", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let Json(new_user) = payload?;
    let user = state.identity_service.register(new_user).await?;

    if let Err(e) = state.account_service.open_account(user.id).await {
        // The user exists; logging in opens the account later
        error!("Failed to open account for new user {}: {}", user.id, e);
        return Err(e.into());
    }

    let tokens = state.identity_service.tokens().issue(user.id)?;
    Ok(ApiResponse::created(AuthResponse::new("User registered successfully", user, tokens)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Malformed request", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let Json(request) = payload?;
    let user = state.identity_service.login(&request.email, &request.password).await?;
    state.account_service.open_account(user.id).await?;

    let tokens = state.identity_service.tokens().issue(user.id)?;
    Ok(ApiResponse::new(AuthResponse::new("Login successful", user, tokens)))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout/",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 400, description = "Invalid token", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<ApiResponse<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    state
        .identity_service
        .tokens()
        .revoke(&request.refresh, user.user_id)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    info!("User {} logged out", user.user_id);
    Ok(ApiResponse::new(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/token/refresh/",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid, expired or revoked refresh token", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<ApiResponse<AccessTokenResponse>, ApiError> {
    let Json(request) = payload?;
    let access = state.identity_service.tokens().refresh(&request.refresh)?;
    Ok(ApiResponse::new(AccessTokenResponse { access }))
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile/",
    responses(
        (status = 200, description = "User profile", body = UserDto),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let user = state.identity_service.get_user(user.user_id).await?;
    Ok(ApiResponse::new(user.into()))
}
