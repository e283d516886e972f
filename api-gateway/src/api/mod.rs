//! API handlers
//!
//! Handlers are organized by resource. Each one extracts the caller and the
//! request body, calls a service, and maps the result to a response body.

pub mod account;
pub mod auth;
pub mod dto;
pub mod health;
pub mod response;

pub use response::ApiResponse;
