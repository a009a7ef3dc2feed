// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication middleware support: session cookies and request context.
//!
//! This module provides:
//! - [`CurrentUser`] - authenticated user context extracted from requests
//! - [`AuthConfig`] - configuration for authentication behavior
//! - Helper functions for extracting the session cookie
//!
//! # Authentication Flow
//!
//! ```text
//! Request → Extract session cookie → Hash token → Session lookup → CurrentUser
//! ```
//!
//! # Security Notes
//!
//! - Session tokens live in an HttpOnly cookie; only their SHA-256 hash is
//!   stored server-side
//! - Token values are never logged

use http::header::COOKIE;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::types::{SessionId, UserId};
use crate::user::User;

/// Default name for the session cookie.
pub const SESSION_COOKIE_NAME: &str = "atrium_session";

/// The currently authenticated user, extracted from request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
	/// The authenticated user.
	pub user: User,
	/// The session this request authenticated with.
	pub session_id: SessionId,
}

impl CurrentUser {
	/// Create a new CurrentUser from a session-based authentication.
	pub fn from_session(user: User, session_id: SessionId) -> Self {
		Self { user, session_id }
	}

	/// The acting user's ID, for permission checks and audit records.
	pub fn user_id(&self) -> &UserId {
		&self.user.id
	}
}

/// Configuration for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Name of the session cookie.
	pub session_cookie_name: String,
	/// Session lifetime in hours.
	pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			session_cookie_name: SESSION_COOKIE_NAME.to_string(),
			session_ttl_hours: 24 * 30,
		}
	}
}

/// Extract the session token from the Cookie header.
///
/// # Returns
///
/// The session token value if found, or `None` if the cookie is not present.
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
	extract_session_cookie_with_name(headers, SESSION_COOKIE_NAME)
}

/// Extract the session token from the Cookie header with a custom cookie name.
pub fn extract_session_cookie_with_name(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| {
			let (name, value) = pair.trim().split_once('=')?;
			(name == cookie_name).then(|| value.to_string())
		})
		.next()
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::HeaderValue;

	fn headers_with_cookie(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
		headers
	}

	#[test]
	fn extracts_session_cookie() {
		let headers = headers_with_cookie("atrium_session=tok123");
		assert_eq!(extract_session_cookie(&headers), Some("tok123".to_string()));
	}

	#[test]
	fn extracts_among_multiple_cookies() {
		let headers = headers_with_cookie("theme=dark; atrium_session=tok456; locale=en");
		assert_eq!(extract_session_cookie(&headers), Some("tok456".to_string()));
	}

	#[test]
	fn missing_cookie_returns_none() {
		let headers = headers_with_cookie("theme=dark");
		assert_eq!(extract_session_cookie(&headers), None);
	}

	#[test]
	fn custom_cookie_name() {
		let headers = headers_with_cookie("custom=tok789");
		assert_eq!(
			extract_session_cookie_with_name(&headers, "custom"),
			Some("tok789".to_string())
		);
	}

	#[test]
	fn does_not_match_prefix_names() {
		let headers = headers_with_cookie("atrium_session_old=stale");
		assert_eq!(extract_session_cookie(&headers), None);
	}
}
