// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health check endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::api::AppState;

/// Liveness and database reachability check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	match sqlx::query("SELECT 1").execute(&state.pool).await {
		Ok(_) => (
			StatusCode::OK,
			Json(serde_json::json!({ "status": "ok" })),
		),
		Err(e) => {
			tracing::error!(error = %e, "health check database probe failed");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(serde_json::json!({ "status": "degraded" })),
			)
		}
	}
}
