//! Standardized API response wrapper
//!
//! Handlers return an [`ApiResponse`] carrying the status code alongside the
//! body, so success statuses are visible in the handler signature.

use std::fmt::Debug;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// A JSON body with its HTTP status
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: StatusCode,
    /// The response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 200 OK with `data`
    pub fn new(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// 201 Created with `data`
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

// Implementation to convert ApiResponse to axum Response
impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        (self.status, Json(self.data)).into_response()
    }
}
