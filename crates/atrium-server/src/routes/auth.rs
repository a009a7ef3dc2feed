// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Authentication HTTP handlers: registration, email verification,
//! login, logout, and the current-user endpoint.
//!
//! # Security
//!
//! - Passwords are hashed with Argon2id; session and verification tokens
//!   are stored as SHA-256 hashes
//! - Login failures return one generic message regardless of whether the
//!   email exists
//! - The session cookie is HttpOnly

use axum::{
	extract::{Query, State},
	http::{header, StatusCode},
	response::IntoResponse,
	Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use atrium_server_audit::{AuditEventType, AuditLogBuilder, AuditSeverity, UserId as AuditUserId};
use atrium_server_auth::{generate_token, hash_token, password, User};
use atrium_server_email::EmailRequest;

pub use atrium_server_api::auth::*;

use crate::{
	api::AppState,
	auth_middleware::{clear_session_cookie_header, session_cookie_header, RequireAuth},
	impl_api_error_response,
	validation::{looks_like_email, sanitize_email},
};

impl_api_error_response!(AuthErrorResponse);

const MIN_PASSWORD_LEN: usize = 8;

/// Register a new account and dispatch the verification email.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email or password shorter than 8 characters
/// - `409 Conflict`: Email already registered
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = AuthErrorResponse),
        (status = 409, description = "Email already registered", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(state, payload))]
pub async fn register(
	State(state): State<AppState>,
	Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
	let email = sanitize_email(&payload.email);
	if !looks_like_email(&email) {
		return (
			StatusCode::BAD_REQUEST,
			Json(AuthErrorResponse {
				error: "invalid_email".to_string(),
				message: "Enter a valid email address".to_string(),
			}),
		)
			.into_response();
	}
	if payload.password.len() < MIN_PASSWORD_LEN {
		return (
			StatusCode::BAD_REQUEST,
			Json(AuthErrorResponse {
				error: "weak_password".to_string(),
				message: "Password must be at least 8 characters".to_string(),
			}),
		)
			.into_response();
	}
	let display_name = payload.display_name.trim();
	if display_name.is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(AuthErrorResponse {
				error: "invalid_name".to_string(),
				message: "Enter a display name".to_string(),
			}),
		)
			.into_response();
	}

	let password_hash = match password::hash_password(&payload.password) {
		Ok(hash) => hash,
		Err(e) => {
			tracing::error!(error = %e, "Password hashing failed");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(AuthErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	};

	let user = User::new(display_name, &email);
	let verification_token = generate_token();
	let verification_expires = Utc::now() + Duration::hours(state.verification_ttl_hours);

	match state
		.user_repo
		.create_user(
			&user,
			&password_hash,
			&hash_token(&verification_token),
			verification_expires,
		)
		.await
	{
		Ok(()) => {}
		Err(atrium_server_db::DbError::Conflict(_)) => {
			return (
				StatusCode::CONFLICT,
				Json(AuthErrorResponse {
					error: "email_taken".to_string(),
					message: "An account with that email already exists".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to create user");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(AuthErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	}

	// The account can request a fresh verification link later, so a
	// failed send is logged but does not undo the registration.
	let verification_sent = match state
		.email_service
		.send(
			&user.email,
			EmailRequest::VerifyEmail {
				token: verification_token,
				expires_hours: state.verification_ttl_hours,
			},
		)
		.await
	{
		Ok(_) => true,
		Err(e) => {
			tracing::warn!(error = %e, user_id = %user.id, "Failed to send verification email");
			false
		}
	};

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::UserRegistered)
			.actor(AuditUserId::new(user.id.into_inner()))
			.resource("user", user.id.to_string())
			.build(),
	);

	tracing::info!(user_id = %user.id, "user registered");

	(
		StatusCode::CREATED,
		Json(RegisterResponse {
			user_id: user.id.to_string(),
			email: user.email,
			verification_sent,
		}),
	)
		.into_response()
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailParams {
	pub token: String,
}

/// Verify an email address from the signup link.
#[utoipa::path(
    get,
    path = "/auth/verify-email",
    params(
        ("token" = String, Query, description = "Verification token")
    ),
    responses(
        (status = 200, description = "Email verified", body = AuthSuccessResponse),
        (status = 400, description = "Unknown or expired token", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(state, params))]
pub async fn verify_email(
	State(state): State<AppState>,
	Query(params): Query<VerifyEmailParams>,
) -> impl IntoResponse {
	match state
		.user_repo
		.verify_email_by_token(&hash_token(&params.token), Utc::now())
		.await
	{
		Ok(Some(user)) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::EmailVerified)
					.actor(AuditUserId::new(user.id.into_inner()))
					.resource("user", user.id.to_string())
					.build(),
			);
			tracing::info!(user_id = %user.id, "email verified");
			(
				StatusCode::OK,
				Json(AuthSuccessResponse {
					message: "Email verified".to_string(),
				}),
			)
				.into_response()
		}
		Ok(None) => (
			StatusCode::BAD_REQUEST,
			Json(AuthErrorResponse {
				error: "invalid_token".to_string(),
				message: "Verification link is invalid or has expired".to_string(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Email verification failed");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(AuthErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response()
		}
	}
}

/// Log in with email and password, establishing a session cookie.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(state, payload))]
pub async fn login(
	State(state): State<AppState>,
	Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
	let email = sanitize_email(&payload.email);

	let invalid_credentials = || {
		(
			StatusCode::UNAUTHORIZED,
			Json(AuthErrorResponse {
				error: "invalid_credentials".to_string(),
				message: "Invalid email or password".to_string(),
			}),
		)
			.into_response()
	};

	let (user_id, stored_hash) = match state.user_repo.get_password_hash(&email).await {
		Ok(Some(pair)) => pair,
		Ok(None) => return invalid_credentials(),
		Err(e) => {
			tracing::error!(error = %e, "Login lookup failed");
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(AuthErrorResponse {
					error: "internal_error".to_string(),
					message: "Something went wrong".to_string(),
				}),
			)
				.into_response();
		}
	};

	if password::verify_password(&payload.password, &stored_hash).is_err() {
		state.audit_service.log(
			AuditLogBuilder::new(AuditEventType::LoginFailed)
				.severity(AuditSeverity::Warning)
				.actor(AuditUserId::new(user_id.into_inner()))
				.build(),
		);
		tracing::warn!(user_id = %user_id, "login failed");
		return invalid_credentials();
	}

	let user = match state.user_repo.get_user_by_id(&user_id).await {
		Ok(Some(user)) => user,
		_ => return invalid_credentials(),
	};

	let token = generate_token();
	let expires_at = Utc::now() + Duration::hours(state.auth_config.session_ttl_hours);
	if let Err(e) = state
		.session_repo
		.create_session(&user.id, &hash_token(&token), expires_at)
		.await
	{
		tracing::error!(error = %e, user_id = %user.id, "Failed to create session");
		return (
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(AuthErrorResponse {
				error: "internal_error".to_string(),
				message: "Something went wrong".to_string(),
			}),
		)
			.into_response();
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::Login)
			.actor(AuditUserId::new(user.id.into_inner()))
			.build(),
	);
	tracing::info!(user_id = %user.id, "user logged in");

	let cookie = session_cookie_header(
		&state.auth_config.session_cookie_name,
		&token,
		state.auth_config.session_ttl_hours * 3600,
	);

	(
		StatusCode::OK,
		[(header::SET_COOKIE, cookie)],
		Json(LoginResponse {
			user_id: user.id.to_string(),
			display_name: user.display_name,
			email: user.email,
			email_verified: user.email_verified,
		}),
	)
		.into_response()
}

/// Destroy the current session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = AuthSuccessResponse),
        (status = 401, description = "Not authenticated", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id))]
pub async fn logout(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
) -> impl IntoResponse {
	if let Err(e) = state
		.session_repo
		.delete_session(&current_user.session_id)
		.await
	{
		tracing::error!(error = %e, "Failed to delete session");
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::Logout)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.build(),
	);

	let cookie = clear_session_cookie_header(&state.auth_config.session_cookie_name);
	(
		StatusCode::OK,
		[(header::SET_COOKIE, cookie)],
		Json(AuthSuccessResponse {
			message: "Logged out".to_string(),
		}),
	)
		.into_response()
}

/// The authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated", body = AuthErrorResponse)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(current_user), fields(actor_id = %current_user.user.id))]
pub async fn me(RequireAuth(current_user): RequireAuth) -> impl IntoResponse {
	let user = current_user.user;
	(
		StatusCode::OK,
		Json(MeResponse {
			user_id: user.id.to_string(),
			display_name: user.display_name,
			email: user.email,
			email_verified: user.email_verified,
			created_at: user.created_at,
		}),
	)
		.into_response()
}
