// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email dispatch service.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use atrium_server_invitations::{InvitationEmail, InvitationMailer, MailerError};

use crate::template::{render_email, EmailRequest};

/// Errors from email dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
	#[error("Transport error: {0}")]
	Transport(String),
}

/// Low-level mail transport seam.
///
/// An SMTP client implements this in deployments with outbound mail;
/// [`LogMailer`] stands in everywhere else.
#[async_trait]
pub trait Mailer: Send + Sync {
	/// Deliver one message and return a transport message id.
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, EmailError>;
}

/// Mailer that records messages through `tracing` instead of delivering
/// them. The message id it returns is locally generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, EmailError> {
		let message_id = format!("log-{}", Uuid::new_v4().simple());
		tracing::info!(
			to = %to,
			subject = %subject,
			body_len = body.len(),
			message_id = %message_id,
			"email logged (no transport configured)"
		);
		tracing::debug!(body = %body, "email body");
		Ok(message_id)
	}
}

/// Renders templates and dispatches them through the configured mailer.
pub struct EmailService {
	mailer: Arc<dyn Mailer>,
	base_url: String,
	invite_ttl_days: i64,
}

impl EmailService {
	/// Create a new service.
	///
	/// # Arguments
	/// * `mailer` - transport implementation
	/// * `base_url` - absolute base for links embedded in emails
	/// * `invite_ttl_days` - invitation expiry copy; must mirror the
	///   lifecycle TTL so the email never promises a different window
	pub fn new(mailer: Arc<dyn Mailer>, base_url: impl Into<String>, invite_ttl_days: i64) -> Self {
		Self {
			mailer,
			base_url: base_url.into(),
			invite_ttl_days,
		}
	}

	/// Render and send an email, returning the transport message id.
	#[tracing::instrument(skip(self, request), fields(to = %to))]
	pub async fn send(&self, to: &str, request: EmailRequest) -> Result<String, EmailError> {
		let (subject, body) = render_email(&request, &self.base_url);
		self.mailer.send(to, &subject, &body).await
	}
}

#[async_trait]
impl InvitationMailer for EmailService {
	async fn send_invitation(&self, email: InvitationEmail) -> Result<String, MailerError> {
		self.send(
			&email.to,
			EmailRequest::Invitation {
				company_name: email.company_name,
				inviter_name: email.inviter_name,
				token: email.token,
				expires_days: self.invite_ttl_days,
			},
		)
		.await
		.map_err(|e| MailerError(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	#[derive(Default)]
	struct CapturingMailer {
		messages: Mutex<Vec<(String, String, String)>>,
	}

	#[async_trait]
	impl Mailer for CapturingMailer {
		async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, EmailError> {
			self.messages.lock().unwrap().push((
				to.to_string(),
				subject.to_string(),
				body.to_string(),
			));
			Ok("msg-1".to_string())
		}
	}

	#[tokio::test]
	async fn service_renders_and_dispatches() {
		let mailer = Arc::new(CapturingMailer::default());
		let service = EmailService::new(Arc::clone(&mailer) as Arc<dyn Mailer>, "https://a.example", 7);

		let id = service
			.send(
				"bob@x.com",
				EmailRequest::VerifyEmail {
					token: "tok".to_string(),
					expires_hours: 48,
				},
			)
			.await
			.unwrap();

		assert_eq!(id, "msg-1");
		let messages = mailer.messages.lock().unwrap();
		assert_eq!(messages.len(), 1);
		assert_eq!(messages[0].0, "bob@x.com");
		assert!(messages[0].2.contains("https://a.example/auth/verify-email?token=tok"));
	}

	#[tokio::test]
	async fn invitation_mailer_port_carries_configured_ttl() {
		let mailer = Arc::new(CapturingMailer::default());
		let service = EmailService::new(Arc::clone(&mailer) as Arc<dyn Mailer>, "https://a.example", 7);

		service
			.send_invitation(InvitationEmail {
				to: "bob@x.com".to_string(),
				company_name: "Acme".to_string(),
				inviter_name: "Alice".to_string(),
				token: "tok-1".to_string(),
			})
			.await
			.unwrap();

		let messages = mailer.messages.lock().unwrap();
		assert!(messages[0].2.contains("expires in 7 days"));
		assert!(messages[0].2.contains("/invitations/accept?token=tok-1"));
	}

	#[tokio::test]
	async fn log_mailer_succeeds_without_transport() {
		let mailer = LogMailer;
		let id = mailer.send("a@b.c", "hi", "body").await.unwrap();
		assert!(id.starts_with("log-"));
	}
}
