// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The invitation entity and its status enum.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use atrium_server_auth::{CompanyId, InvitationId, UserId};

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
	/// Issued and awaiting acceptance.
	Pending,
	/// Accepted; the invitee became a workspace member.
	Accepted,
	/// Withdrawn by a workspace admin, or voided after a failed email dispatch.
	Cancelled,
	/// Passed its expiry without being accepted.
	Expired,
}

impl InvitationStatus {
	/// Parse a status from its stored string form.
	pub fn parse(s: &str) -> Option<InvitationStatus> {
		match s {
			"pending" => Some(InvitationStatus::Pending),
			"accepted" => Some(InvitationStatus::Accepted),
			"cancelled" => Some(InvitationStatus::Cancelled),
			"expired" => Some(InvitationStatus::Expired),
			_ => None,
		}
	}

	/// Returns all status values.
	pub fn all() -> &'static [InvitationStatus] {
		&[
			InvitationStatus::Pending,
			InvitationStatus::Accepted,
			InvitationStatus::Cancelled,
			InvitationStatus::Expired,
		]
	}
}

impl fmt::Display for InvitationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			InvitationStatus::Pending => write!(f, "pending"),
			InvitationStatus::Accepted => write!(f, "accepted"),
			InvitationStatus::Cancelled => write!(f, "cancelled"),
			InvitationStatus::Expired => write!(f, "expired"),
		}
	}
}

/// An invitation for an email address to join a company workspace.
///
/// Rows are never deleted; cancellation and expiry are status writes, so
/// the table is a permanent record of every invitation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
	pub id: InvitationId,
	pub company_id: CompanyId,
	/// Invitee email, normalized to lowercase.
	pub email: String,
	pub invited_by: UserId,
	/// SHA-256 hash of the acceptance token. The plaintext token only ever
	/// travels inside the invitation email.
	pub token_hash: String,
	pub status: InvitationStatus,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	/// Set if and only if `status == Accepted`.
	pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
	/// Create a fresh pending invitation expiring `ttl` after `now`.
	pub fn new(
		company_id: CompanyId,
		email: impl Into<String>,
		invited_by: UserId,
		token_hash: impl Into<String>,
		now: DateTime<Utc>,
		ttl: Duration,
	) -> Self {
		Self {
			id: InvitationId::generate(),
			company_id,
			email: normalize_email(&email.into()),
			invited_by,
			token_hash: token_hash.into(),
			status: InvitationStatus::Pending,
			created_at: now,
			expires_at: now + ttl,
			accepted_at: None,
		}
	}

	/// Returns true if the expiry window has elapsed at `now`.
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expires_at <= now
	}
}

/// Normalize an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn sample_invitation(ttl_days: i64) -> Invitation {
		Invitation::new(
			CompanyId::generate(),
			"Person@Example.com",
			UserId::generate(),
			"hash",
			Utc::now(),
			Duration::days(ttl_days),
		)
	}

	#[test]
	fn new_invitation_is_pending_and_normalized() {
		let inv = sample_invitation(7);
		assert_eq!(inv.status, InvitationStatus::Pending);
		assert_eq!(inv.email, "person@example.com");
		assert!(inv.accepted_at.is_none());
	}

	#[test]
	fn expiry_is_strictly_after_creation() {
		let inv = sample_invitation(7);
		assert!(inv.expires_at > inv.created_at);
		assert_eq!(inv.expires_at - inv.created_at, Duration::days(7));
	}

	#[test]
	fn is_expired_boundary_is_inclusive() {
		let inv = sample_invitation(2);
		assert!(!inv.is_expired(inv.created_at));
		assert!(inv.is_expired(inv.expires_at));
		assert!(inv.is_expired(inv.expires_at + Duration::seconds(1)));
	}

	#[test]
	fn status_parse_roundtrips_display() {
		for status in InvitationStatus::all() {
			assert_eq!(InvitationStatus::parse(&status.to_string()), Some(*status));
		}
		assert_eq!(InvitationStatus::parse("revoked"), None);
	}

	#[test]
	fn status_serializes_snake_case() {
		let json = serde_json::to_string(&InvitationStatus::Pending).unwrap();
		assert_eq!(json, "\"pending\"");
	}

	proptest! {
		#[test]
		fn expiry_follows_ttl_for_any_window(ttl_hours in 1i64..24 * 365) {
			let now = Utc::now();
			let inv = Invitation::new(
				CompanyId::generate(),
				"a@b.c",
				UserId::generate(),
				"hash",
				now,
				Duration::hours(ttl_hours),
			);
			prop_assert!(inv.expires_at > inv.created_at);
			prop_assert_eq!(inv.expires_at - inv.created_at, Duration::hours(ttl_hours));
		}

		#[test]
		fn normalize_email_is_idempotent(email in "[ ]{0,2}[a-zA-Z0-9.@+-]{1,40}[ ]{0,2}") {
			let once = normalize_email(&email);
			prop_assert_eq!(normalize_email(&once), once.clone());
			prop_assert_eq!(once.trim(), once.as_str());
		}
	}
}
