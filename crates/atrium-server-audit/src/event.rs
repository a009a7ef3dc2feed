// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Actor identifier carried by audit entries.
///
/// A local newtype so this crate does not depend on the auth crate's
/// identity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
	pub fn new(id: Uuid) -> Self {
		Self(id)
	}

	pub fn into_inner(self) -> Uuid {
		self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Classification of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	UserRegistered,
	EmailVerified,
	Login,
	LoginFailed,
	Logout,
	CompanyCreated,
	MemberAdded,
	MemberRemoved,
	InvitationCreated,
	InvitationResent,
	InvitationCancelled,
	InvitationAccepted,
	ClientModified,
	ProjectModified,
	FileModified,
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditEventType::UserRegistered => "user_registered",
			AuditEventType::EmailVerified => "email_verified",
			AuditEventType::Login => "login",
			AuditEventType::LoginFailed => "login_failed",
			AuditEventType::Logout => "logout",
			AuditEventType::CompanyCreated => "company_created",
			AuditEventType::MemberAdded => "member_added",
			AuditEventType::MemberRemoved => "member_removed",
			AuditEventType::InvitationCreated => "invitation_created",
			AuditEventType::InvitationResent => "invitation_resent",
			AuditEventType::InvitationCancelled => "invitation_cancelled",
			AuditEventType::InvitationAccepted => "invitation_accepted",
			AuditEventType::ClientModified => "client_modified",
			AuditEventType::ProjectModified => "project_modified",
			AuditEventType::FileModified => "file_modified",
		};
		write!(f, "{s}")
	}
}

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Info,
	Warning,
	Critical,
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuditSeverity::Info => write!(f, "info"),
			AuditSeverity::Warning => write!(f, "warning"),
			AuditSeverity::Critical => write!(f, "critical"),
		}
	}
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	pub severity: AuditSeverity,
	pub actor_user_id: Option<UserId>,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	pub details: serde_json::Value,
}

impl AuditLogEntry {
	/// Start building an entry for the given event type.
	pub fn builder(event_type: AuditEventType) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type)
	}
}

/// Builder for [`AuditLogEntry`].
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_type: AuditEventType,
	severity: AuditSeverity,
	actor_user_id: Option<UserId>,
	resource_type: Option<String>,
	resource_id: Option<String>,
	details: serde_json::Value,
}

impl AuditLogBuilder {
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			event_type,
			severity: AuditSeverity::Info,
			actor_user_id: None,
			resource_type: None,
			resource_id: None,
			details: serde_json::Value::Null,
		}
	}

	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = severity;
		self
	}

	pub fn actor(mut self, actor: UserId) -> Self {
		self.actor_user_id = Some(actor);
		self
	}

	pub fn resource(mut self, resource_type: impl Into<String>, id: impl Into<String>) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = Some(id.into());
		self
	}

	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			severity: self.severity,
			actor_user_id: self.actor_user_id,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			details: self.details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_defaults_to_info() {
		let entry = AuditLogEntry::builder(AuditEventType::Login).build();
		assert_eq!(entry.severity, AuditSeverity::Info);
		assert!(entry.actor_user_id.is_none());
		assert_eq!(entry.details, serde_json::Value::Null);
	}

	#[test]
	fn builder_sets_all_fields() {
		let actor = UserId::new(Uuid::new_v4());
		let entry = AuditLogEntry::builder(AuditEventType::InvitationCreated)
			.severity(AuditSeverity::Warning)
			.actor(actor)
			.resource("invitation", "inv-1")
			.details(serde_json::json!({"email": "a@b.c"}))
			.build();

		assert_eq!(entry.event_type, AuditEventType::InvitationCreated);
		assert_eq!(entry.severity, AuditSeverity::Warning);
		assert_eq!(entry.actor_user_id, Some(actor));
		assert_eq!(entry.resource_type.as_deref(), Some("invitation"));
		assert_eq!(entry.resource_id.as_deref(), Some("inv-1"));
	}

	#[test]
	fn event_type_display_is_snake_case() {
		assert_eq!(AuditEventType::InvitationAccepted.to_string(), "invitation_accepted");
		assert_eq!(AuditEventType::MemberAdded.to_string(), "member_added");
	}

	#[test]
	fn severity_orders_by_importance() {
		assert!(AuditSeverity::Info < AuditSeverity::Warning);
		assert!(AuditSeverity::Warning < AuditSeverity::Critical);
	}
}
