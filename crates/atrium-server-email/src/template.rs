// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Transactional email templates.

use url::form_urlencoded;

/// Email templates with their variable data.
#[derive(Debug, Clone)]
pub enum EmailRequest {
	/// Workspace invitation email.
	Invitation {
		/// Name of the workspace.
		company_name: String,
		/// Name of the person who sent the invitation.
		inviter_name: String,
		/// Invitation token, embedded in the acceptance link.
		token: String,
		/// Days until the link expires; mirrors the lifecycle TTL.
		expires_days: i64,
	},
	/// Email address verification after signup.
	VerifyEmail {
		/// Verification token.
		token: String,
		/// Hours until the link expires.
		expires_hours: i64,
	},
}

/// Build an absolute link with the token as a single URL-encoded query
/// parameter.
fn token_link(base_url: &str, path: &str, token: &str) -> String {
	let encoded: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
	format!("{}{}?token={}", base_url.trim_end_matches('/'), path, encoded)
}

/// Render an email template to subject and body.
///
/// Returns a tuple of (subject, body) strings.
pub fn render_email(request: &EmailRequest, base_url: &str) -> (String, String) {
	match request {
		EmailRequest::Invitation {
			company_name,
			inviter_name,
			token,
			expires_days,
		} => {
			let subject = format!("You've been invited to {company_name}");
			let body = format!(
				"{inviter_name} invited you to join the {company_name} workspace on Atrium.\n\n\
				Accept the invitation:\n\n{}\n\n\
				The link expires in {expires_days} days. If you weren't expecting this invitation, you can ignore this email.",
				token_link(base_url, "/invitations/accept", token),
			);
			(subject, body)
		}
		EmailRequest::VerifyEmail {
			token,
			expires_hours,
		} => {
			let subject = "Verify your email address".to_string();
			let body = format!(
				"Welcome to Atrium. Confirm your email address to finish setting up your account:\n\n{}\n\n\
				The link expires in {expires_hours} hours. If you didn't create an account, you can ignore this email.",
				token_link(base_url, "/auth/verify-email", token),
			);
			(subject, body)
		}
	}
}
