//! Cached aggregate endpoint

use axum::{extract::State, Json};

use crate::domain::entities::CachedMetrics;
use crate::error::AppError;
use crate::AppState;

/// Latest published aggregate with its `updatedAt` timestamp
pub async fn get_metrics(State(state): State<AppState>) -> Result<Json<CachedMetrics>, AppError> {
    state
        .cache
        .try_latest()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No metrics collected yet".to_string()))
}
