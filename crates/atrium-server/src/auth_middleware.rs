// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request extractors for session authentication.
//!
//! - [`RequireAuth`] rejects unauthenticated requests with a 401 JSON body
//! - [`OptionalAuth`] yields `None` instead, for endpoints that branch on
//!   authentication state (e.g. invitation acceptance)

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::request::Parts;

use atrium_server_api::auth::AuthErrorResponse;
use atrium_server_auth::{hash_token, middleware::extract_session_cookie_with_name, CurrentUser};

use crate::api::AppState;

/// Extractor that requires a valid session.
pub struct RequireAuth(pub CurrentUser);

/// Extractor that resolves the session if present.
pub struct OptionalAuth(pub Option<CurrentUser>);

async fn resolve_current_user(parts: &Parts, state: &AppState) -> Option<CurrentUser> {
	let token = extract_session_cookie_with_name(
		&parts.headers,
		&state.auth_config.session_cookie_name,
	)?;

	let token_hash = hash_token(&token);
	match state
		.session_repo
		.find_session_user(&token_hash, chrono::Utc::now())
		.await
	{
		Ok(Some((session, user))) => Some(CurrentUser::from_session(user, session.id)),
		Ok(None) => None,
		Err(e) => {
			tracing::error!(error = %e, "session lookup failed");
			None
		}
	}
}

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = Response;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		match resolve_current_user(parts, state).await {
			Some(current_user) => Ok(RequireAuth(current_user)),
			None => Err((
				StatusCode::UNAUTHORIZED,
				Json(AuthErrorResponse {
					error: "auth_required".to_string(),
					message: "Authentication required".to_string(),
				}),
			)
				.into_response()),
		}
	}
}

impl FromRequestParts<AppState> for OptionalAuth {
	type Rejection = Response;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		Ok(OptionalAuth(resolve_current_user(parts, state).await))
	}
}

/// Build the Set-Cookie header value for a fresh session.
pub fn session_cookie_header(cookie_name: &str, token: &str, max_age_secs: i64) -> String {
	format!("{cookie_name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Build the Set-Cookie header value that clears the session cookie.
pub fn clear_session_cookie_header(cookie_name: &str) -> String {
	format!("{cookie_name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_cookie_is_http_only() {
		let header = session_cookie_header("atrium_session", "tok", 3600);
		assert!(header.contains("atrium_session=tok"));
		assert!(header.contains("HttpOnly"));
		assert!(header.contains("Max-Age=3600"));
	}

	#[test]
	fn clear_cookie_zeroes_max_age() {
		let header = clear_session_cookie_header("atrium_session");
		assert!(header.contains("Max-Age=0"));
	}
}
