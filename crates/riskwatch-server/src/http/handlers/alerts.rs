//! Alert history handler.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use riskwatch_core::{AlertRecord, UserId};

use crate::http::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/users/:user_id/alerts - Most recent alerts for a user.
pub async fn alert_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<AlertRecord>>, ApiError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::InvalidInput {
            message: "user_id must not be empty".to_string(),
        });
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let user_id = UserId::new(user_id);

    let records = state
        .store
        .alert_history(&user_id, limit)
        .await
        .map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Alert history lookup failed");
            ApiError::from(e)
        })?;

    Ok(Json(records))
}
