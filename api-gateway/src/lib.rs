//! HTTP gateway for the neobank account API

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

use account_service::{AccountService, RepositoryType as AccountStore};
use axum::{
    http::Uri,
    routing::{get, patch, post},
    Router,
};
use common::db::{init_db_pool, run_migrations};
use common::error::{ErrorExt, Result};
use identity_service::{IdentityService, RepositoryType as UserStore};
use tracing::info;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::error::ApiError;

/// App state shared across handlers
pub struct AppState {
    /// Account service
    pub account_service: Arc<AccountService>,
    /// Identity service
    pub identity_service: Arc<IdentityService>,
}

impl AppState {
    /// Build the services, against PostgreSQL when a database URL is configured
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let Some(url) = &config.database_url else {
            info!("DATABASE_URL not set, using in-memory stores");
            return Ok(Self {
                account_service: Arc::new(AccountService::with_repository(
                    AccountStore::InMemory,
                    config.account.clone(),
                )),
                identity_service: Arc::new(IdentityService::with_repository(
                    UserStore::InMemory,
                    &config.identity,
                )?),
            });
        };

        let pool = init_db_pool(url, config.db_pool_size)
            .await
            .with_context(|| "Failed to connect to database")?;
        if config.run_migrations {
            run_migrations(&pool).await?;
        }

        Ok(Self {
            account_service: Arc::new(AccountService::with_repository(
                AccountStore::Postgres(pool.clone()),
                config.account.clone(),
            )),
            identity_service: Arc::new(IdentityService::with_repository(
                UserStore::Postgres(pool),
                &config.identity,
            )?),
        })
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Account routes
        api::account::get_account,
        api::account::deposit,
        api::account::withdraw,
        api::account::set_balance,
        // Auth routes
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::auth::refresh_token,
        api::auth::profile,
        // Health
        api::health::health_check,
    ),
    components(
        schemas(
            // Account API
            api::account::DepositRequest,
            api::account::WithdrawRequest,
            api::account::SetBalanceRequest,
            api::dto::AccountDto,
            api::dto::TransactionResponse,

            // Auth API
            common::model::user::NewUser,
            api::auth::LoginRequest,
            api::auth::RefreshRequest,
            api::dto::UserDto,
            api::dto::TokensDto,
            api::dto::AuthResponse,
            api::dto::AccessTokenResponse,

            // Response models
            api::dto::MessageResponse,
            api::dto::HealthResponse,
            error::ErrorResponse,
            error::ErrorInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "account", description = "Account balance endpoints"),
        (name = "auth", description = "Registration and authentication endpoints"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Neobank API",
        version = "1.0.0",
        description = "API for registering users and managing their account balance"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the application router with API routes and docs
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Account routes
        .route("/account/", get(api::account::get_account))
        .route("/account/deposit/", post(api::account::deposit))
        .route("/account/withdraw/", post(api::account::withdraw))
        .route("/account/balance/", patch(api::account::set_balance))
        // Auth routes
        .route("/auth/register/", post(api::auth::register))
        .route("/auth/login/", post(api::auth::login))
        .route("/auth/logout/", post(api::auth::logout))
        .route("/auth/token/refresh/", post(api::auth::refresh_token))
        .route("/auth/profile/", get(api::auth::profile))
        .route("/health/", get(api::health::health_check));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .nest("/api", api_routes)
        .merge(swagger_ui)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
