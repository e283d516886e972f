//! Health check

use crate::api::dto::HealthResponse;
use crate::api::response::ApiResponse;

/// Report that the service is up
#[utoipa::path(
    get,
    path = "/api/health/",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check() -> ApiResponse<HealthResponse> {
    ApiResponse::new(HealthResponse {
        status: "healthy".to_string(),
        message: "Neobank API is running".to_string(),
    })
}
