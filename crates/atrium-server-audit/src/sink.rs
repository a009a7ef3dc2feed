// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit sinks.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::event::AuditLogEntry;

/// Errors from publishing to a sink.
#[derive(Debug, thiserror::Error)]
pub enum AuditSinkError {
	/// Retryable failure (pool exhaustion, locked database).
	#[error("Transient: {0}")]
	Transient(String),

	/// Non-retryable failure (serialization, constraint violation).
	#[error("Permanent: {0}")]
	Permanent(String),
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError>;

	async fn health_check(&self) -> Result<(), AuditSinkError> {
		Ok(())
	}
}

/// Writes audit events to the `audit_logs` table.
pub struct SqliteAuditSink {
	pool: SqlitePool,
	name: String,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			name: "sqlite".to_string(),
		}
	}
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
	fn name(&self) -> &str {
		&self.name
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let details_json = serde_json::to_string(&event.details)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize details: {e}")))?;

		sqlx::query(
			r#"
			INSERT INTO audit_logs (
				id, timestamp, event_type, severity, actor_user_id,
				resource_type, resource_id, details, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.id.to_string())
		.bind(event.timestamp.to_rfc3339())
		.bind(event.event_type.to_string())
		.bind(event.severity.to_string())
		.bind(event.actor_user_id.as_ref().map(|u| u.to_string()))
		.bind(&event.resource_type)
		.bind(&event.resource_id)
		.bind(&details_json)
		.bind(chrono::Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| {
			if is_transient_error(&e) {
				AuditSinkError::Transient(format!("database error: {e}"))
			} else {
				AuditSinkError::Permanent(format!("database error: {e}"))
			}
		})?;

		Ok(())
	}

	async fn health_check(&self) -> Result<(), AuditSinkError> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(|e| AuditSinkError::Transient(format!("health check failed: {e}")))?;
		Ok(())
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked") || msg.contains("timeout")
		}
		_ => false,
	}
}
