// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The user account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A registered user account.
///
/// `email` is stored normalized to lowercase; invitation matching relies
/// on that normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	pub id: UserId,
	pub display_name: String,
	pub email: String,
	/// Set once the verification link from the signup email was followed.
	pub email_verified: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
	/// Create a new unverified user.
	pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: UserId::generate(),
			display_name: display_name.into(),
			email: email.into().trim().to_lowercase(),
			email_verified: false,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}

	/// Returns true if this account has been soft-deleted.
	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_user_normalizes_email() {
		let user = User::new("Bob", "  Bob@Example.COM ");
		assert_eq!(user.email, "bob@example.com");
		assert!(!user.email_verified);
		assert!(!user.is_deleted());
	}
}
