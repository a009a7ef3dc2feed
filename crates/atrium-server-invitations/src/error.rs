// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed results for every lifecycle operation.
//!
//! Callers branch on these variants to render specific messages; only
//! [`InvitationError::Store`] represents an unexpected failure, and the
//! HTTP layer maps it to a generic internal error without leaking detail.

/// Errors surfaced by an [`InvitationStore`](crate::ports::InvitationStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// A uniqueness constraint was violated (duplicate pending invitation,
	/// duplicate membership, duplicate token hash).
	#[error("Conflict: {0}")]
	Conflict(String),

	/// Any other persistence failure.
	#[error("Storage error: {0}")]
	Internal(String),
}

/// Failure to hand an invitation email to the dispatch collaborator.
#[derive(Debug, thiserror::Error)]
#[error("Email dispatch failed: {0}")]
pub struct MailerError(pub String);

/// Outcome taxonomy of the invitation lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
	/// Actor lacks invite permission on the target workspace.
	#[error("Not allowed to manage invitations for this workspace")]
	Unauthorized,

	/// The invited email already belongs to a workspace member.
	#[error("That email already belongs to a workspace member")]
	AlreadyMember,

	/// A pending invitation already exists for this email and workspace.
	#[error("A pending invitation already exists for that email")]
	DuplicatePending,

	/// No invitation resolves to the given id or token.
	#[error("Invitation not found")]
	NotFound,

	/// Operation attempted on an invitation already in the terminal
	/// `accepted` state.
	#[error("Invitation was already accepted")]
	AlreadyAccepted,

	/// Accept attempted on a cancelled invitation.
	#[error("Invitation was cancelled")]
	Cancelled,

	/// Accept attempted past the expiry window. The stored status is
	/// corrected to `expired` before this is reported.
	#[error("Invitation has expired")]
	Expired,

	/// No user account exists for the invited email.
	#[error("No account exists for the invited email")]
	RegistrationRequired,

	/// No authenticated actor, or the session email does not match the
	/// invitation email.
	#[error("Sign in with the invited email to accept this invitation")]
	AuthRequired,

	/// The accepting account's email address is not verified.
	#[error("Verify your email address before accepting invitations")]
	EmailNotVerified,

	/// The invitation email could not be delivered; the freshly written
	/// row was cancelled as compensation.
	#[error("Invitation email could not be delivered")]
	Dispatch(#[source] MailerError),

	/// Unexpected persistence failure.
	#[error(transparent)]
	Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn store_error_converts_into_invitation_error() {
		let err: InvitationError = StoreError::Internal("disk on fire".to_string()).into();
		assert!(matches!(err, InvitationError::Store(_)));
	}

	#[test]
	fn messages_do_not_leak_internals() {
		// User-facing variants carry stable copy, not debug detail.
		assert_eq!(
			InvitationError::DuplicatePending.to_string(),
			"A pending invitation already exists for that email"
		);
		assert_eq!(
			InvitationError::Expired.to_string(),
			"Invitation has expired"
		);
	}
}
