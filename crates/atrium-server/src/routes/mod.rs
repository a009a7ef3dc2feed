// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod auth;
pub mod clients;
pub mod companies;
pub mod files;
pub mod health;
pub mod invitations;
pub mod projects;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use atrium_server_auth::{CompanyId, UserId};

use crate::api::AppState;
use crate::api_response::ApiErrorResponse;

/// Gate a workspace-scoped handler on membership.
///
/// Non-members get the same 404 a missing workspace would produce, so the
/// response does not reveal whether the workspace exists.
pub(crate) async fn require_member<E: ApiErrorResponse>(
	state: &AppState,
	company_id: &CompanyId,
	user_id: &UserId,
) -> Result<(), Response> {
	match state.company_repo.get_membership(company_id, user_id).await {
		Ok(Some(_)) => Ok(()),
		Ok(None) => Err((
			StatusCode::NOT_FOUND,
			Json(E::new("not_found", "Company not found")),
		)
			.into_response()),
		Err(e) => {
			tracing::error!(error = %e, company_id = %company_id, "Membership lookup failed");
			Err((
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(E::new("internal_error", "Something went wrong")),
			)
				.into_response())
		}
	}
}
