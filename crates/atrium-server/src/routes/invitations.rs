// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Invitation HTTP handlers.
//!
//! Implements invitation endpoints:
//! - List invitations for a company
//! - Create invitation
//! - Resend invitation
//! - Cancel invitation
//! - Accept invitation
//! - Public invitation preview by token
//!
//! # Security
//!
//! - Invitation tokens are stored as SHA-256 hashes
//! - Tokens rotate on every resend and expire after a configurable period
//! - All invitation mutations are audit logged
//!
//! # Authorization Matrix
//!
//! | Endpoint             | Required Permission        |
//! |----------------------|----------------------------|
//! | `list_invitations`   | invite permission          |
//! | `create_invitation`  | invite permission          |
//! | `resend_invitation`  | invite permission          |
//! | `cancel_invitation`  | invite permission          |
//! | `accept_invitation`  | session optional (checked by the lifecycle) |
//! | `get_invitation`     | public (with token)        |
//!
//! All state transitions run through the
//! [`InvitationLifecycle`](atrium_server_invitations::InvitationLifecycle);
//! these handlers only translate between HTTP and its typed results.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use chrono::Utc;

use atrium_server_audit::{AuditEventType, AuditLogBuilder, UserId as AuditUserId};
use atrium_server_auth::CurrentUser;
use atrium_server_invitations::{
	AcceptInvitation, AcceptOutcome, Invitation, InvitationError, InvitePolicy, Invitee,
	IssueInvitation, ResendInvitation,
};

pub use atrium_server_api::invitations::*;

use crate::{
	api::AppState,
	auth_middleware::{OptionalAuth, RequireAuth},
	impl_api_error_response, parse_id,
	validation::{parse_company_id, parse_invitation_id, sanitize_email},
};

impl_api_error_response!(InvitationErrorResponse);

/// Map a lifecycle error to its HTTP rendering.
///
/// Storage failures are logged and collapse to a generic internal error;
/// every other variant carries copy the UI can show as-is.
fn error_response(e: InvitationError) -> axum::response::Response {
	let (status, code) = match &e {
		InvitationError::Unauthorized => (StatusCode::FORBIDDEN, "forbidden"),
		InvitationError::AlreadyMember => (StatusCode::CONFLICT, "already_member"),
		InvitationError::DuplicatePending => (StatusCode::CONFLICT, "duplicate_pending"),
		InvitationError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
		InvitationError::AlreadyAccepted => (StatusCode::BAD_REQUEST, "already_accepted"),
		InvitationError::Cancelled => (StatusCode::BAD_REQUEST, "cancelled"),
		InvitationError::Expired => (StatusCode::BAD_REQUEST, "expired"),
		InvitationError::RegistrationRequired => (StatusCode::FORBIDDEN, "registration_required"),
		InvitationError::AuthRequired => (StatusCode::UNAUTHORIZED, "auth_required"),
		InvitationError::EmailNotVerified => (StatusCode::FORBIDDEN, "email_not_verified"),
		InvitationError::Dispatch(_) => (StatusCode::BAD_GATEWAY, "dispatch_failed"),
		InvitationError::Store(inner) => {
			tracing::error!(error = %inner, "invitation storage error");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(InvitationErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	};

	(
		status,
		Json(InvitationErrorResponse {
			error: code.to_string(),
			message: e.to_string(),
		}),
	)
		.into_response()
}

fn actor_from(current_user: &CurrentUser) -> Invitee {
	Invitee {
		user_id: current_user.user.id,
		email: current_user.user.email.clone(),
		email_verified: current_user.user.email_verified,
	}
}

async fn invitation_response(state: &AppState, invitation: &Invitation) -> InvitationResponse {
	let company_name = match state.company_repo.get_company_by_id(&invitation.company_id).await {
		Ok(Some(company)) => company.name,
		_ => "Unknown".to_string(),
	};
	let invited_by_name = match state.user_repo.get_user_by_id(&invitation.invited_by).await {
		Ok(Some(user)) => user.display_name,
		_ => "Unknown".to_string(),
	};

	InvitationResponse {
		id: invitation.id.to_string(),
		company_id: invitation.company_id.to_string(),
		company_name,
		email: invitation.email.clone(),
		status: invitation.status.to_string(),
		invited_by: invitation.invited_by.to_string(),
		invited_by_name,
		created_at: invitation.created_at,
		expires_at: invitation.expires_at,
		is_expired: invitation.is_expired(Utc::now()),
	}
}

/// List invitations for a company.
///
/// # Authorization
///
/// Requires invite permission on the company.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid company ID format
/// - `401 Unauthorized`: Missing or invalid authentication
/// - `403 Forbidden`: Caller may not manage invitations
/// - `404 Not Found`: Company does not exist
/// - `500 Internal Server Error`: Database error
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/invitations",
    params(
        ("company_id" = String, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "List of invitations", body = ListInvitationsResponse),
        (status = 401, description = "Not authenticated", body = InvitationErrorResponse),
        (status = 403, description = "Not authorized", body = InvitationErrorResponse),
        (status = 404, description = "Company not found", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(
	skip(state),
	fields(
		actor_id = %current_user.user.id,
		company_id = %company_id
	)
)]
pub async fn list_invitations(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
) -> impl IntoResponse {
	let company_id = parse_id!(InvitationErrorResponse, parse_company_id(&company_id));

	let company = match state.company_repo.get_company_by_id(&company_id).await {
		Ok(Some(company)) => company,
		Ok(None) => {
			return (
				StatusCode::NOT_FOUND,
				Json(InvitationErrorResponse {
					error: "not_found".to_string(),
					message: "Company not found".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, company_id = %company_id, "Failed to get company");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(InvitationErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	};

	match state
		.company_repo
		.can_invite_users(&current_user.user.id, &company_id)
		.await
	{
		Ok(true) => {}
		Ok(false) => {
			tracing::warn!(
				actor_id = %current_user.user.id,
				company_id = %company_id,
				"Unauthorized invitation list attempt"
			);
			return (
				StatusCode::FORBIDDEN,
				Json(InvitationErrorResponse {
					error: "forbidden".to_string(),
					message: "Not allowed to manage invitations for this workspace".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to check invite permission");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(InvitationErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	}

	let invitations = match state.invitation_repo.list_for_company(&company_id).await {
		Ok(invs) => invs,
		Err(e) => {
			tracing::error!(error = %e, company_id = %company_id, "Failed to list invitations");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(InvitationErrorResponse {
					error: "internal_error".to_string(),
					message: "Failed to list invitations".to_string(),
				}),
			)
				.into_response();
		}
	};

	let now = Utc::now();
	let mut responses = Vec::with_capacity(invitations.len());
	for inv in invitations {
		let invited_by_name = match state.user_repo.get_user_by_id(&inv.invited_by).await {
			Ok(Some(user)) => user.display_name,
			_ => "Unknown".to_string(),
		};
		responses.push(InvitationResponse {
			id: inv.id.to_string(),
			company_id: inv.company_id.to_string(),
			company_name: company.name.clone(),
			email: inv.email,
			status: inv.status.to_string(),
			invited_by: inv.invited_by.to_string(),
			invited_by_name,
			created_at: inv.created_at,
			expires_at: inv.expires_at,
			is_expired: inv.expires_at <= now,
		});
	}

	tracing::info!(
		actor_id = %current_user.user.id,
		company_id = %company_id,
		invitation_count = responses.len(),
		"Listed invitations"
	);

	(
		StatusCode::OK,
		Json(ListInvitationsResponse {
			invitations: responses,
		}),
	)
		.into_response()
}

/// Create an invitation to join a company.
///
/// # Authorization
///
/// Requires invite permission on the company.
///
/// # Security
///
/// - The invitation token is sent via email, never returned in the response
/// - The token is stored as a hash
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/invitations",
    params(
        ("company_id" = String, Path, description = "Company ID")
    ),
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation created", body = CreateInvitationResponse),
        (status = 400, description = "Invalid request", body = InvitationErrorResponse),
        (status = 401, description = "Not authenticated", body = InvitationErrorResponse),
        (status = 403, description = "Not authorized", body = InvitationErrorResponse),
        (status = 404, description = "Company not found", body = InvitationErrorResponse),
        (status = 409, description = "Already a member or already invited", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(
	skip(state, payload),
	fields(
		actor_id = %current_user.user.id,
		company_id = %company_id
	)
)]
pub async fn create_invitation(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
	Json(payload): Json<CreateInvitationRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(InvitationErrorResponse, parse_company_id(&company_id));

	let email = sanitize_email(&payload.email);
	if !crate::validation::looks_like_email(&email) {
		return (
			StatusCode::BAD_REQUEST,
			Json(InvitationErrorResponse {
				error: "invalid_email".to_string(),
				message: "Enter a valid email address".to_string(),
			}),
		)
			.into_response();
	}

	let company = match state.company_repo.get_company_by_id(&company_id).await {
		Ok(Some(company)) => company,
		Ok(None) => {
			return (
				StatusCode::NOT_FOUND,
				Json(InvitationErrorResponse {
					error: "not_found".to_string(),
					message: "Company not found".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, company_id = %company_id, "Failed to get company");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(InvitationErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	};

	let invitation = match state
		.invitations
		.issue(IssueInvitation {
			company_id,
			email,
			actor_id: current_user.user.id,
			company_name: company.name.clone(),
			inviter_name: current_user.user.display_name.clone(),
		})
		.await
	{
		Ok(invitation) => invitation,
		Err(e) => return error_response(e),
	};

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::InvitationCreated)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("invitation", invitation.id.to_string())
			.details(serde_json::json!({
				"company_id": company_id.to_string(),
				"email": &invitation.email,
			}))
			.build(),
	);

	tracing::info!(
		actor_id = %current_user.user.id,
		company_id = %company_id,
		invitation_id = %invitation.id,
		"Invitation created"
	);

	(
		StatusCode::CREATED,
		Json(CreateInvitationResponse {
			id: invitation.id.to_string(),
			email: invitation.email.clone(),
			status: invitation.status.to_string(),
			expires_at: invitation.expires_at,
		}),
	)
		.into_response()
}

/// Resend an invitation with a fresh token and expiry.
///
/// # Authorization
///
/// Requires invite permission on the company. Accepted invitations cannot
/// be resent.
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/invitations/{id}/resend",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Invitation ID")
    ),
    responses(
        (status = 200, description = "Invitation resent", body = CreateInvitationResponse),
        (status = 400, description = "Invitation already accepted", body = InvitationErrorResponse),
        (status = 401, description = "Not authenticated", body = InvitationErrorResponse),
        (status = 403, description = "Not authorized", body = InvitationErrorResponse),
        (status = 404, description = "Invitation not found", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(
	skip(state),
	fields(
		actor_id = %current_user.user.id,
		company_id = %company_id,
		invitation_id = %invitation_id
	)
)]
pub async fn resend_invitation(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, invitation_id)): Path<(String, String)>,
) -> impl IntoResponse {
	let company_id = parse_id!(InvitationErrorResponse, parse_company_id(&company_id));
	let invitation_id = parse_id!(InvitationErrorResponse, parse_invitation_id(&invitation_id));

	let company = match state.company_repo.get_company_by_id(&company_id).await {
		Ok(Some(company)) => company,
		Ok(None) => {
			return (
				StatusCode::NOT_FOUND,
				Json(InvitationErrorResponse {
					error: "not_found".to_string(),
					message: "Company not found".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, company_id = %company_id, "Failed to get company");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(InvitationErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	};

	let invitation = match state
		.invitations
		.resend(ResendInvitation {
			company_id,
			invitation_id,
			actor_id: current_user.user.id,
			company_name: company.name.clone(),
			inviter_name: current_user.user.display_name.clone(),
		})
		.await
	{
		Ok(invitation) => invitation,
		Err(e) => return error_response(e),
	};

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::InvitationResent)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("invitation", invitation.id.to_string())
			.details(serde_json::json!({
				"company_id": company_id.to_string(),
				"email": &invitation.email,
			}))
			.build(),
	);

	tracing::info!(
		actor_id = %current_user.user.id,
		invitation_id = %invitation.id,
		"Invitation resent"
	);

	(
		StatusCode::OK,
		Json(CreateInvitationResponse {
			id: invitation.id.to_string(),
			email: invitation.email.clone(),
			status: invitation.status.to_string(),
			expires_at: invitation.expires_at,
		}),
	)
		.into_response()
}

/// Cancel an invitation.
///
/// # Authorization
///
/// Requires invite permission on the company. Accepted invitations cannot
/// be cancelled; remove the member instead.
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/invitations/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Invitation ID")
    ),
    responses(
        (status = 200, description = "Invitation cancelled", body = InvitationSuccessResponse),
        (status = 400, description = "Invitation already accepted", body = InvitationErrorResponse),
        (status = 401, description = "Not authenticated", body = InvitationErrorResponse),
        (status = 403, description = "Not authorized", body = InvitationErrorResponse),
        (status = 404, description = "Invitation not found", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(
	skip(state),
	fields(
		actor_id = %current_user.user.id,
		company_id = %company_id,
		invitation_id = %invitation_id
	)
)]
pub async fn cancel_invitation(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, invitation_id)): Path<(String, String)>,
) -> impl IntoResponse {
	let company_id = parse_id!(InvitationErrorResponse, parse_company_id(&company_id));
	let invitation_id = parse_id!(InvitationErrorResponse, parse_invitation_id(&invitation_id));

	let invitation = match state
		.invitations
		.cancel(&company_id, &invitation_id, &current_user.user.id)
		.await
	{
		Ok(invitation) => invitation,
		Err(e) => return error_response(e),
	};

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::InvitationCancelled)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("invitation", invitation.id.to_string())
			.details(serde_json::json!({
				"company_id": company_id.to_string(),
				"email": &invitation.email,
			}))
			.build(),
	);

	tracing::info!(
		actor_id = %current_user.user.id,
		invitation_id = %invitation.id,
		"Invitation cancelled"
	);

	(
		StatusCode::OK,
		Json(InvitationSuccessResponse {
			message: "Invitation cancelled".to_string(),
		}),
	)
		.into_response()
}

/// Accept an invitation by token.
///
/// # Authorization
///
/// Session optional: the lifecycle reports `registration_required` when no
/// account exists for the invited email, `auth_required` when the session
/// is missing or for a different email, and `email_not_verified` until the
/// account's address is confirmed. A caller who is already a member gets a
/// success response without a second membership row.
///
/// # Security
///
/// - The token is validated by comparing hashes
/// - A pending invitation past its expiry is marked expired before the
///   failure is reported
#[utoipa::path(
    post,
    path = "/api/invitations/accept",
    request_body = AcceptInvitationRequest,
    responses(
        (status = 200, description = "Invitation accepted", body = AcceptInvitationResponse),
        (status = 400, description = "Invalid, cancelled, or expired invitation", body = InvitationErrorResponse),
        (status = 401, description = "Not authenticated", body = InvitationErrorResponse),
        (status = 403, description = "Registration or verification required", body = InvitationErrorResponse),
        (status = 404, description = "Invitation not found", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(skip(state, payload, auth))]
pub async fn accept_invitation(
	OptionalAuth(auth): OptionalAuth,
	State(state): State<AppState>,
	Json(payload): Json<AcceptInvitationRequest>,
) -> impl IntoResponse {
	let actor = auth.as_ref().map(actor_from);

	let outcome = match state
		.invitations
		.accept(AcceptInvitation {
			token: payload.token,
			actor,
		})
		.await
	{
		Ok(outcome) => outcome,
		Err(e) => return error_response(e),
	};

	let invitation = outcome.invitation();
	let company_name = match state
		.company_repo
		.get_company_by_id(&invitation.company_id)
		.await
	{
		Ok(Some(company)) => company.name,
		_ => "Unknown".to_string(),
	};

	// The lifecycle only succeeds with an authenticated actor.
	let Some(current_user) = auth.as_ref() else {
		tracing::error!(invitation_id = %invitation.id, "accept succeeded without a session");
		return (
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(InvitationErrorResponse {
				error: "internal_error".to_string(),
				message: "Something went wrong".to_string(),
			}),
		)
			.into_response();
	};
	let joined = matches!(outcome, AcceptOutcome::Joined { .. });
	let actor_id = current_user.user.id;

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::InvitationAccepted)
			.actor(AuditUserId::new(actor_id.into_inner()))
			.resource("company", invitation.company_id.to_string())
			.details(serde_json::json!({
				"invitation_id": invitation.id.to_string(),
				"joined": joined,
			}))
			.build(),
	);

	tracing::info!(
		actor_id = %actor_id,
		company_id = %invitation.company_id,
		invitation_id = %invitation.id,
		joined,
		"Invitation accepted"
	);

	(
		StatusCode::OK,
		Json(AcceptInvitationResponse {
			company_id: invitation.company_id.to_string(),
			company_name,
			role: "member".to_string(),
			joined,
		}),
	)
		.into_response()
}

/// Get invitation details by token.
///
/// # Authorization
///
/// Public endpoint; the token acts as the credential. Only limited
/// information is exposed.
#[utoipa::path(
    get,
    path = "/api/invitations/{token}",
    params(
        ("token" = String, Path, description = "Invitation token")
    ),
    responses(
        (status = 200, description = "Invitation details", body = InvitationResponse),
        (status = 404, description = "Invitation not found", body = InvitationErrorResponse)
    ),
    tag = "invitations"
)]
#[tracing::instrument(skip(state, token))]
pub async fn get_invitation(
	State(state): State<AppState>,
	Path(token): Path<String>,
) -> impl IntoResponse {
	let invitation = match state.invitations.preview(&token).await {
		Ok(invitation) => invitation,
		Err(e) => return error_response(e),
	};

	let response = invitation_response(&state, &invitation).await;
	(StatusCode::OK, Json(response)).into_response()
}
