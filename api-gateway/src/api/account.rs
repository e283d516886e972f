//! Account API handlers
//!
//! Handles endpoints on the caller's own account:
//! - Get account details
//! - Deposit and withdraw funds
//! - Set the balance outright

use std::sync::Arc;

use account_service::AmountInput;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::api::dto::{AccountDto, TransactionResponse};
use crate::api::response::ApiResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Get the caller's account
#[utoipa::path(
    get,
    path = "/api/account/",
    responses(
        (status = 200, description = "Account details retrieved successfully", body = AccountDto),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<ApiResponse<AccountDto>, ApiError> {
    let account = state.account_service.get_account(user.user_id).await?;
    Ok(ApiResponse::new(account.into()))
}

/// Deposit request
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Amount as a decimal string or JSON number
    #[serde(default)]
    #[schema(value_type = String, example = "50.00")]
    pub amount: AmountInput,
}

/// Deposit funds into the caller's account
#[utoipa::path(
    post,
    path = "/api/account/deposit/",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit successful", body = TransactionResponse),
        (status = 400, description = "Invalid amount", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Concurrent updates could not be reconciled", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "account"
)]
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<ApiResponse<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let account = state.account_service.deposit(user.user_id, &request.amount).await?;

    info!("Deposit into account {} by user {}", account.id, user.user_id);
    Ok(ApiResponse::new(TransactionResponse::new("Deposit successful", account)))
}

/// Withdraw request
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Amount as a decimal string or JSON number
    #[serde(default)]
    #[schema(value_type = String, example = "25.00")]
    pub amount: AmountInput,
}

/// Withdraw funds from the caller's account
#[utoipa::path(
    post,
    path = "/api/account/withdraw/",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal successful", body = TransactionResponse),
        (status = 400, description = "Invalid amount or insufficient funds", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Concurrent updates could not be reconciled", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "account"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<ApiResponse<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let account = state.account_service.withdraw(user.user_id, &request.amount).await?;

    info!("Withdrawal from account {} by user {}", account.id, user.user_id);
    Ok(ApiResponse::new(TransactionResponse::new("Withdrawal successful", account)))
}

/// Set balance request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetBalanceRequest {
    /// New balance as a decimal string or JSON number
    #[serde(default)]
    #[schema(value_type = String, example = "1000.00")]
    pub balance: AmountInput,
}

/// Replace the caller's balance
#[utoipa::path(
    patch,
    path = "/api/account/balance/",
    request_body = SetBalanceRequest,
    responses(
        (status = 200, description = "Balance updated successfully", body = TransactionResponse),
        (status = 400, description = "Invalid or negative balance", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Concurrent updates could not be reconciled", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "account"
)]
pub async fn set_balance(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<SetBalanceRequest>, JsonRejection>,
) -> Result<ApiResponse<TransactionResponse>, ApiError> {
    let Json(request) = payload?;
    let account = state.account_service.set_balance(user.user_id, &request.balance).await?;

    info!("Balance of account {} set by user {}", account.id, user.user_id);
    Ok(ApiResponse::new(TransactionResponse::new("Balance updated successfully", account)))
}
