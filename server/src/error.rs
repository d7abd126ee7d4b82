//! Unified error types for the ghpulse server
//!
//! This module defines error types for each layer:
//! - `GithubError`: GitHub REST client errors
//! - `StoreError`: key-value persistence errors
//! - `ConfigError`: environment configuration errors
//! - `SchedulerError` / `ListenerError`: engine plumbing errors
//! - `AppError`: HTTP-facing errors (rendered as JSON responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// GitHub API client errors
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited (resets at {reset:?})")]
    RateLimited { reset: Option<i64> },

    #[error("Unauthorized - invalid token")]
    Unauthorized,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store is not loaded")]
    NotLoaded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(e: sea_orm::DbErr) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },

    #[error("No GitHub accounts configured (set GH_USERNAME_1 and GH_API_KEY_1)")]
    NoAccounts,
}

/// Job scheduler errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler requires at least one job")]
    NoJobs,

    #[error("Scheduler interval must be greater than zero")]
    ZeroInterval,

    #[error("Scheduler is already running")]
    AlreadyStarted,
}

/// Listener delivery errors
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Listener is closed")]
    Closed,

    #[error("Send failed: {0}")]
    Send(String),
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
