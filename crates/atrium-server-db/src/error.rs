// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use atrium_server_invitations::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for DbError {
	/// Classify unique-constraint violations as [`DbError::Conflict`] so
	/// callers can translate them into domain errors instead of surfacing
	/// a raw storage failure.
	fn from(e: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db_err) = &e {
			if db_err.is_unique_violation() {
				return DbError::Conflict(db_err.message().to_string());
			}
		}
		DbError::Sqlx(e)
	}
}

impl From<DbError> for StoreError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Conflict(msg) => StoreError::Conflict(msg),
			other => StoreError::Internal(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
