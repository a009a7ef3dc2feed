// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared validation utilities for API handlers.

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use atrium_server_auth::{ClientId, CompanyId, FileId, InvitationId, ProjectId, UserId};

static SLUG_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$|^[a-z0-9]$").unwrap());

static EMAIL_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Validate a slug against format and length constraints.
///
/// Slugs must:
/// - Be between `min_len` and `max_len` characters
/// - Start and end with alphanumeric characters
/// - Contain only lowercase letters, numbers, and hyphens
pub fn validate_slug(slug: &str, min_len: usize, max_len: usize) -> bool {
	slug.len() >= min_len && slug.len() <= max_len && SLUG_REGEX.is_match(slug)
}

/// Sanitize an email address by trimming whitespace and lowercasing.
pub fn sanitize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Shallow shape check for an email address.
pub fn looks_like_email(email: &str) -> bool {
	EMAIL_REGEX.is_match(email)
}

/// Error type for ID parsing failures.
#[derive(Debug, Clone)]
pub struct IdParseError {
	pub error: String,
	pub message: String,
}

impl IdParseError {
	fn invalid(message: impl Into<String>) -> Self {
		Self {
			error: "invalid_id".to_string(),
			message: message.into(),
		}
	}
}

macro_rules! define_id_parser {
	($fn_name:ident, $ty:ty, $label:expr) => {
		#[doc = concat!("Parse a string as a ", $label, ".")]
		pub fn $fn_name(id_str: &str) -> Result<$ty, IdParseError> {
			Uuid::parse_str(id_str)
				.map(<$ty>::new)
				.map_err(|_| IdParseError::invalid(concat!("Invalid ", $label)))
		}
	};
}

define_id_parser!(parse_company_id, CompanyId, "company ID");
define_id_parser!(parse_user_id, UserId, "user ID");
define_id_parser!(parse_invitation_id, InvitationId, "invitation ID");
define_id_parser!(parse_client_id, ClientId, "client ID");
define_id_parser!(parse_project_id, ProjectId, "project ID");
define_id_parser!(parse_file_id, FileId, "file ID");

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validate_slug() {
		assert!(validate_slug("a", 1, 50));
		assert!(validate_slug("abc", 1, 50));
		assert!(validate_slug("abc-def", 1, 50));
		assert!(validate_slug("a1b2c3", 1, 50));

		assert!(!validate_slug("", 1, 50));
		assert!(!validate_slug("-abc", 1, 50));
		assert!(!validate_slug("abc-", 1, 50));
		assert!(!validate_slug("ABC", 1, 50));
		assert!(!validate_slug("ab", 3, 50));
	}

	#[test]
	fn test_sanitize_email() {
		assert_eq!(sanitize_email("  Test@Example.COM  "), "test@example.com");
	}

	#[test]
	fn test_looks_like_email() {
		assert!(looks_like_email("a@b.co"));
		assert!(!looks_like_email("not-an-email"));
		assert!(!looks_like_email("a b@c.d"));
		assert!(!looks_like_email("a@b"));
	}

	#[test]
	fn test_parse_company_id() {
		let valid = "550e8400-e29b-41d4-a716-446655440000";
		assert!(parse_company_id(valid).is_ok());

		let result = parse_company_id("not-a-uuid");
		assert!(result.is_err());
		assert_eq!(result.unwrap_err().error, "invalid_id");
	}

	#[test]
	fn test_parse_invitation_id() {
		let valid = "550e8400-e29b-41d4-a716-446655440000";
		assert!(parse_invitation_id(valid).is_ok());
		assert!(parse_invitation_id("nope").is_err());
	}
}
