// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Boundary collaborators of the invitation lifecycle.
//!
//! The lifecycle reads and writes invitations exclusively through
//! [`InvitationStore`], asks [`InvitePolicy`] whether an actor may manage
//! invitations, hands outbound mail to [`InvitationMailer`], and takes the
//! current time and fresh tokens from [`Clock`] and [`TokenSource`].
//! Production wiring lives in the server crate; tests substitute each port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atrium_server_auth::{generate_token, CompanyId, InvitationId, UserId};

use crate::error::{MailerError, StoreError};
use crate::model::{Invitation, InvitationStatus};

/// Time source, injectable for deterministic expiry tests.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Produces a cryptographically unpredictable unique token per call.
pub trait TokenSource: Send + Sync {
	fn generate(&self) -> String;
}

/// Random tokens from the shared auth token generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenSource;

impl TokenSource for RandomTokenSource {
	fn generate(&self) -> String {
		generate_token()
	}
}

/// A user account as the lifecycle sees it while resolving an acceptance.
#[derive(Debug, Clone)]
pub struct Invitee {
	pub user_id: UserId,
	pub email: String,
	pub email_verified: bool,
}

/// Result of the atomic accept write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptCommit {
	/// The row moved `pending → accepted` and the membership row was
	/// inserted (or already existed).
	Applied { membership_created: bool },
	/// The conditional update matched no row; another request got there
	/// first. Carries the status observed after the miss.
	StatusWas(InvitationStatus),
}

/// Persistence operations the lifecycle requires.
///
/// Implementations must enforce uniqueness (token hash, one pending
/// invitation per `(company, email)`, one membership per
/// `(company, user)`) at the storage layer and surface violations as
/// [`StoreError::Conflict`] — concurrent request handlers race, so
/// in-process checks are only advisory.
#[async_trait]
pub trait InvitationStore: Send + Sync {
	async fn insert(&self, invitation: &Invitation) -> Result<(), StoreError>;

	async fn find_by_id(&self, id: &InvitationId) -> Result<Option<Invitation>, StoreError>;

	async fn find_by_token_hash(&self, token_hash: &str)
		-> Result<Option<Invitation>, StoreError>;

	async fn find_pending_by_email(
		&self,
		company_id: &CompanyId,
		email: &str,
	) -> Result<Option<Invitation>, StoreError>;

	/// Write a new status; `accepted_at` is set when the status is
	/// `accepted` and cleared otherwise.
	async fn update_status(
		&self,
		id: &InvitationId,
		status: InvitationStatus,
		accepted_at: Option<DateTime<Utc>>,
	) -> Result<(), StoreError>;

	/// Rotate the token and expiry and force the row back to `pending`.
	async fn reissue(
		&self,
		id: &InvitationId,
		token_hash: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<Invitee>, StoreError>;

	async fn is_member_by_email(
		&self,
		company_id: &CompanyId,
		email: &str,
	) -> Result<bool, StoreError>;

	async fn is_member(&self, company_id: &CompanyId, user_id: &UserId)
		-> Result<bool, StoreError>;

	/// Atomically flip `pending → accepted` and insert the membership row
	/// in one transaction, so membership can never exist while the row
	/// still reads `pending`.
	async fn accept_and_join(
		&self,
		id: &InvitationId,
		user_id: &UserId,
		accepted_at: DateTime<Utc>,
	) -> Result<AcceptCommit, StoreError>;
}

/// Capability oracle for invitation management.
#[async_trait]
pub trait InvitePolicy: Send + Sync {
	async fn can_invite_users(
		&self,
		user_id: &UserId,
		company_id: &CompanyId,
	) -> Result<bool, StoreError>;
}

/// The outbound invitation email, carrying the plaintext token.
#[derive(Debug, Clone)]
pub struct InvitationEmail {
	pub to: String,
	pub company_name: String,
	pub inviter_name: String,
	pub token: String,
}

/// Email dispatch collaborator.
#[async_trait]
pub trait InvitationMailer: Send + Sync {
	/// Send the invitation email and return the transport message id.
	async fn send_invitation(&self, email: InvitationEmail) -> Result<String, MailerError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn system_clock_advances() {
		let clock = SystemClock;
		let a = clock.now();
		let b = clock.now();
		assert!(b >= a);
	}

	#[test]
	fn random_token_source_is_unique_per_call() {
		let source = RandomTokenSource;
		assert_ne!(source.generate(), source.generate());
	}
}
