// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The invitation lifecycle component.
//!
//! All reads and writes of invitations go through [`InvitationLifecycle`];
//! the HTTP handlers are thin adapters over its four operations.
//!
//! # Transition table
//!
//! | Operation | Precondition | Effect |
//! |-----------|--------------|--------|
//! | `issue`   | actor can invite; target not a member; no pending duplicate | new `pending` row, fresh token, email sent |
//! | `resend`  | actor can invite; not `accepted` | fresh token + expiry, forced back to `pending`, email sent |
//! | `cancel`  | actor can invite; not `accepted` | `cancelled` |
//! | `accept`  | `pending`, unexpired, verified session email matches | membership insert + `accepted` |
//!
//! Expiry is never swept in the background; it is detected when an accept
//! arrives and persisted before the failure is reported.

use std::sync::Arc;

use chrono::Duration;

use atrium_server_auth::{hash_token, CompanyId, InvitationId, UserId};

use crate::error::InvitationError;
use crate::model::{normalize_email, Invitation, InvitationStatus};
use crate::ports::{
	AcceptCommit, Clock, InvitationEmail, InvitationMailer, InvitationStore, InvitePolicy, Invitee,
	TokenSource,
};

/// Default invitation expiry window, in days.
///
/// Both issue and resend use this single value; the TTL is deliberately
/// one named constant rather than per-call literals.
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// Lifecycle tuning.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
	/// Expiry window applied on issue and on resend.
	pub ttl_days: i64,
}

impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			ttl_days: DEFAULT_TTL_DAYS,
		}
	}
}

/// Request to issue a new invitation.
#[derive(Debug, Clone)]
pub struct IssueInvitation {
	pub company_id: CompanyId,
	pub email: String,
	pub actor_id: UserId,
	/// Workspace display name, rendered into the email.
	pub company_name: String,
	/// Inviter display name, rendered into the email.
	pub inviter_name: String,
}

/// Request to resend an existing invitation.
#[derive(Debug, Clone)]
pub struct ResendInvitation {
	pub company_id: CompanyId,
	pub invitation_id: InvitationId,
	pub actor_id: UserId,
	pub company_name: String,
	pub inviter_name: String,
}

/// Request to accept an invitation by token.
#[derive(Debug, Clone)]
pub struct AcceptInvitation {
	pub token: String,
	/// The authenticated actor, if any. `None` means no active session.
	pub actor: Option<Invitee>,
}

/// Successful accept result.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
	/// Membership was created by this call.
	Joined { invitation: Invitation },
	/// The actor was already a member; the row was marked accepted if it
	/// was not, and the call succeeds without inserting anything.
	AlreadyMember { invitation: Invitation },
}

impl AcceptOutcome {
	/// The invitation in its post-accept state.
	pub fn invitation(&self) -> &Invitation {
		match self {
			AcceptOutcome::Joined { invitation } => invitation,
			AcceptOutcome::AlreadyMember { invitation } => invitation,
		}
	}
}

/// Mediates every state transition of workspace invitations.
pub struct InvitationLifecycle {
	store: Arc<dyn InvitationStore>,
	policy: Arc<dyn InvitePolicy>,
	mailer: Arc<dyn InvitationMailer>,
	clock: Arc<dyn Clock>,
	tokens: Arc<dyn TokenSource>,
	ttl: Duration,
}

impl InvitationLifecycle {
	pub fn new(
		store: Arc<dyn InvitationStore>,
		policy: Arc<dyn InvitePolicy>,
		mailer: Arc<dyn InvitationMailer>,
		clock: Arc<dyn Clock>,
		tokens: Arc<dyn TokenSource>,
		config: LifecycleConfig,
	) -> Self {
		Self {
			store,
			policy,
			mailer,
			clock,
			tokens,
			ttl: Duration::days(config.ttl_days),
		}
	}

	/// Issue a new invitation and dispatch the invitation email.
	///
	/// # Errors
	///
	/// - [`InvitationError::Unauthorized`] if the actor may not invite
	/// - [`InvitationError::AlreadyMember`] if the email belongs to a member
	/// - [`InvitationError::DuplicatePending`] if a pending invitation
	///   exists (checked before insert, and again via the storage unique
	///   constraint to close the race window)
	/// - [`InvitationError::Dispatch`] if the email send fails; the row is
	///   cancelled as compensation before this is returned
	#[tracing::instrument(
		skip(self, req),
		fields(company_id = %req.company_id, actor_id = %req.actor_id)
	)]
	pub async fn issue(&self, req: IssueInvitation) -> Result<Invitation, InvitationError> {
		if !self
			.policy
			.can_invite_users(&req.actor_id, &req.company_id)
			.await?
		{
			tracing::warn!(
				actor_id = %req.actor_id,
				company_id = %req.company_id,
				"unauthorized invitation issue attempt"
			);
			return Err(InvitationError::Unauthorized);
		}

		let email = normalize_email(&req.email);

		if self.store.is_member_by_email(&req.company_id, &email).await? {
			return Err(InvitationError::AlreadyMember);
		}

		if self
			.store
			.find_pending_by_email(&req.company_id, &email)
			.await?
			.is_some()
		{
			return Err(InvitationError::DuplicatePending);
		}

		let token = self.tokens.generate();
		let now = self.clock.now();
		let invitation = Invitation::new(
			req.company_id,
			email.clone(),
			req.actor_id,
			hash_token(&token),
			now,
			self.ttl,
		);

		match self.store.insert(&invitation).await {
			Ok(()) => {}
			// Two admins inviting the same email concurrently: the unique
			// index catches what the lookup above could not.
			Err(crate::StoreError::Conflict(_)) => return Err(InvitationError::DuplicatePending),
			Err(e) => return Err(e.into()),
		}

		self.dispatch_or_compensate(
			&invitation,
			InvitationEmail {
				to: email,
				company_name: req.company_name,
				inviter_name: req.inviter_name,
				token,
			},
		)
		.await?;

		tracing::info!(
			invitation_id = %invitation.id,
			company_id = %invitation.company_id,
			expires_at = %invitation.expires_at,
			"invitation issued"
		);
		Ok(invitation)
	}

	/// Regenerate the token and expiry of an invitation and force it back
	/// to `pending`, then dispatch a fresh email.
	///
	/// Allowed from `pending`, `cancelled`, and `expired`; rejected for
	/// `accepted` rows.
	#[tracing::instrument(
		skip(self, req),
		fields(
			company_id = %req.company_id,
			invitation_id = %req.invitation_id,
			actor_id = %req.actor_id
		)
	)]
	pub async fn resend(&self, req: ResendInvitation) -> Result<Invitation, InvitationError> {
		if !self
			.policy
			.can_invite_users(&req.actor_id, &req.company_id)
			.await?
		{
			tracing::warn!(
				actor_id = %req.actor_id,
				company_id = %req.company_id,
				"unauthorized invitation resend attempt"
			);
			return Err(InvitationError::Unauthorized);
		}

		let invitation = self
			.store
			.find_by_id(&req.invitation_id)
			.await?
			.filter(|inv| inv.company_id == req.company_id)
			.ok_or(InvitationError::NotFound)?;

		if invitation.status == InvitationStatus::Accepted {
			return Err(InvitationError::AlreadyAccepted);
		}

		let token = self.tokens.generate();
		let token_hash = hash_token(&token);
		let now = self.clock.now();
		let expires_at = now + self.ttl;

		self.store
			.reissue(&invitation.id, &token_hash, expires_at)
			.await?;

		let reissued = Invitation {
			token_hash,
			status: InvitationStatus::Pending,
			expires_at,
			accepted_at: None,
			..invitation
		};

		self.dispatch_or_compensate(
			&reissued,
			InvitationEmail {
				to: reissued.email.clone(),
				company_name: req.company_name,
				inviter_name: req.inviter_name,
				token,
			},
		)
		.await?;

		tracing::info!(
			invitation_id = %reissued.id,
			company_id = %reissued.company_id,
			expires_at = %reissued.expires_at,
			"invitation resent with rotated token"
		);
		Ok(reissued)
	}

	/// Cancel an invitation.
	///
	/// Accepted invitations cannot be cancelled; revoking an existing
	/// membership is a member-management operation, not an invitation
	/// operation.
	#[tracing::instrument(
		skip(self),
		fields(company_id = %company_id, invitation_id = %invitation_id, actor_id = %actor_id)
	)]
	pub async fn cancel(
		&self,
		company_id: &CompanyId,
		invitation_id: &InvitationId,
		actor_id: &UserId,
	) -> Result<Invitation, InvitationError> {
		if !self.policy.can_invite_users(actor_id, company_id).await? {
			tracing::warn!(
				actor_id = %actor_id,
				company_id = %company_id,
				"unauthorized invitation cancel attempt"
			);
			return Err(InvitationError::Unauthorized);
		}

		let invitation = self
			.store
			.find_by_id(invitation_id)
			.await?
			.filter(|inv| inv.company_id == *company_id)
			.ok_or(InvitationError::NotFound)?;

		if invitation.status == InvitationStatus::Accepted {
			return Err(InvitationError::AlreadyAccepted);
		}

		self.store
			.update_status(&invitation.id, InvitationStatus::Cancelled, None)
			.await?;

		tracing::info!(invitation_id = %invitation.id, "invitation cancelled");
		Ok(Invitation {
			status: InvitationStatus::Cancelled,
			accepted_at: None,
			..invitation
		})
	}

	/// Accept an invitation by token.
	///
	/// Preconditions, in order: the token resolves to a row; the row is
	/// `pending` and unexpired (expiry is persisted when detected here); a
	/// user account exists for the invited email; the authenticated actor's
	/// email matches it case-insensitively; the actor's email is verified.
	/// An actor who is already a member short-circuits to success.
	///
	/// Safe under concurrent double-invocation: the status flip is a
	/// conditional write inside one transaction with the membership insert,
	/// and a lost race degrades to the idempotent already-member path.
	#[tracing::instrument(skip(self, req))]
	pub async fn accept(&self, req: AcceptInvitation) -> Result<AcceptOutcome, InvitationError> {
		let token_hash = hash_token(&req.token);
		let invitation = self
			.store
			.find_by_token_hash(&token_hash)
			.await?
			.ok_or(InvitationError::NotFound)?;

		let now = self.clock.now();
		match invitation.status {
			InvitationStatus::Cancelled => return Err(InvitationError::Cancelled),
			InvitationStatus::Expired => return Err(InvitationError::Expired),
			InvitationStatus::Pending if invitation.is_expired(now) => {
				// Lazy expiry: persist the corrected state before reporting.
				self.store
					.update_status(&invitation.id, InvitationStatus::Expired, None)
					.await?;
				tracing::info!(invitation_id = %invitation.id, "invitation lazily expired");
				return Err(InvitationError::Expired);
			}
			InvitationStatus::Pending | InvitationStatus::Accepted => {}
		}

		if self
			.store
			.find_user_by_email(&invitation.email)
			.await?
			.is_none()
		{
			return Err(InvitationError::RegistrationRequired);
		}

		let actor = req.actor.ok_or(InvitationError::AuthRequired)?;
		if !actor.email.eq_ignore_ascii_case(&invitation.email) {
			tracing::warn!(
				invitation_id = %invitation.id,
				"accept attempted with a session for a different email"
			);
			return Err(InvitationError::AuthRequired);
		}
		if !actor.email_verified {
			return Err(InvitationError::EmailNotVerified);
		}

		// Idempotent short-circuit: membership already holds.
		if self
			.store
			.is_member(&invitation.company_id, &actor.user_id)
			.await?
		{
			if invitation.status != InvitationStatus::Accepted {
				self.store
					.update_status(&invitation.id, InvitationStatus::Accepted, Some(now))
					.await?;
			}
			let accepted_at = invitation.accepted_at.unwrap_or(now);
			return Ok(AcceptOutcome::AlreadyMember {
				invitation: Invitation {
					status: InvitationStatus::Accepted,
					accepted_at: Some(accepted_at),
					..invitation
				},
			});
		}

		if invitation.status == InvitationStatus::Accepted {
			return Err(InvitationError::AlreadyAccepted);
		}

		match self
			.store
			.accept_and_join(&invitation.id, &actor.user_id, now)
			.await?
		{
			AcceptCommit::Applied { .. } => {
				tracing::info!(
					invitation_id = %invitation.id,
					company_id = %invitation.company_id,
					user_id = %actor.user_id,
					"invitation accepted, membership created"
				);
				Ok(AcceptOutcome::Joined {
					invitation: Invitation {
						status: InvitationStatus::Accepted,
						accepted_at: Some(now),
						..invitation
					},
				})
			}
			AcceptCommit::StatusWas(observed) => {
				// Another request won the conditional write. If it was the
				// same user double-submitting, membership now exists and the
				// idempotent success path applies.
				if self
					.store
					.is_member(&invitation.company_id, &actor.user_id)
					.await?
				{
					return Ok(AcceptOutcome::AlreadyMember {
						invitation: Invitation {
							status: InvitationStatus::Accepted,
							accepted_at: Some(now),
							..invitation
						},
					});
				}
				Err(match observed {
					InvitationStatus::Cancelled => InvitationError::Cancelled,
					InvitationStatus::Expired => InvitationError::Expired,
					_ => InvitationError::AlreadyAccepted,
				})
			}
		}
	}

	/// Look up an invitation by its plaintext token, for pre-acceptance
	/// display. Does not mutate state.
	#[tracing::instrument(skip(self, token))]
	pub async fn preview(&self, token: &str) -> Result<Invitation, InvitationError> {
		self.store
			.find_by_token_hash(&hash_token(token))
			.await?
			.ok_or(InvitationError::NotFound)
	}

	/// The configured expiry window.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	async fn dispatch_or_compensate(
		&self,
		invitation: &Invitation,
		email: InvitationEmail,
	) -> Result<(), InvitationError> {
		match self.mailer.send_invitation(email).await {
			Ok(message_id) => {
				tracing::debug!(
					invitation_id = %invitation.id,
					message_id = %message_id,
					"invitation email dispatched"
				);
				Ok(())
			}
			Err(e) => {
				tracing::error!(
					invitation_id = %invitation.id,
					error = %e,
					"invitation email dispatch failed, cancelling row"
				);
				// Persistence and dispatch are not atomic; a pending row
				// whose token the recipient never received must not stay
				// actionable. Compensation is best-effort.
				if let Err(cancel_err) = self
					.store
					.update_status(&invitation.id, InvitationStatus::Cancelled, None)
					.await
				{
					tracing::error!(
						invitation_id = %invitation.id,
						error = %cancel_err,
						"compensating cancellation failed"
					);
				}
				Err(InvitationError::Dispatch(e))
			}
		}
	}
}
