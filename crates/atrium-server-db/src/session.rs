// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session repository for cookie-based authentication.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{SessionId, User, UserId};

use crate::error::DbError;
use crate::user::UserRepository;

/// A login session. Only the SHA-256 hash of the cookie token is stored.
#[derive(Debug, Clone)]
pub struct Session {
	pub id: SessionId,
	pub user_id: UserId,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

/// Repository for sessions.
#[derive(Clone)]
pub struct SessionRepository {
	pool: SqlitePool,
}

impl SessionRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new session.
	#[tracing::instrument(skip(self, token_hash), fields(user_id = %user_id))]
	pub async fn create_session(
		&self,
		user_id: &UserId,
		token_hash: &str,
		expires_at: DateTime<Utc>,
	) -> Result<SessionId, DbError> {
		let id = SessionId::generate();
		let now = Utc::now().to_rfc3339();

		sqlx::query(
			r#"
			INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(user_id.to_string())
		.bind(token_hash)
		.bind(&now)
		.bind(expires_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(session_id = %id, user_id = %user_id, "session created");
		Ok(id)
	}

	/// Resolve a session token hash to its session and user.
	///
	/// # Returns
	/// `None` if the hash is unknown, the session is past expiry, or the
	/// user has been deleted.
	#[tracing::instrument(skip(self, token_hash))]
	pub async fn find_session_user(
		&self,
		token_hash: &str,
		now: DateTime<Utc>,
	) -> Result<Option<(Session, User)>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, user_id, created_at, expires_at
			FROM sessions
			WHERE token_hash = ? AND expires_at > ?
			"#,
		)
		.bind(token_hash)
		.bind(now.to_rfc3339())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		let session = row_to_session(&row)?;

		let users = UserRepository::new(self.pool.clone());
		let Some(user) = users.get_user_by_id(&session.user_id).await? else {
			return Ok(None);
		};

		Ok(Some((session, user)))
	}

	/// Delete a session (logout).
	///
	/// # Returns
	/// `true` if a session was deleted, `false` if not found.
	#[tracing::instrument(skip(self), fields(session_id = %id))]
	pub async fn delete_session(&self, id: &SessionId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM sessions
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Delete all sessions past their expiry.
	///
	/// # Returns
	/// The number of sessions removed.
	#[tracing::instrument(skip(self))]
	pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM sessions
			WHERE expires_at <= ?
			"#,
		)
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected();
		if removed > 0 {
			tracing::debug!(removed, "expired sessions deleted");
		}
		Ok(removed)
	}
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, DbError> {
	let id_str: String = row.get("id");
	let user_id_str: String = row.get("user_id");
	let created_at: String = row.get("created_at");
	let expires_at: String = row.get("expires_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid session ID: {e}")))?;
	let user_id = Uuid::parse_str(&user_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid user_id: {e}")))?;

	Ok(Session {
		id: SessionId::new(id),
		user_id: UserId::new(user_id),
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
		expires_at: chrono::DateTime::parse_from_rfc3339(&expires_at)
			.map_err(|e| DbError::Internal(format!("Invalid expires_at: {e}")))?
			.with_timezone(&Utc),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_test_user};
	use chrono::Duration;

	#[tokio::test]
	async fn test_create_and_resolve_session() {
		let pool = create_test_pool().await;
		let repo = SessionRepository::new(pool.clone());
		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "s@example.com").await;

		let expires = Utc::now() + Duration::hours(24);
		let session_id = repo.create_session(&user_id, "tok-hash", expires).await.unwrap();

		let (session, user) = repo
			.find_session_user("tok-hash", Utc::now())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(session.id, session_id);
		assert_eq!(user.id, user_id);
	}

	#[tokio::test]
	async fn test_expired_session_does_not_resolve() {
		let pool = create_test_pool().await;
		let repo = SessionRepository::new(pool.clone());
		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "old@example.com").await;

		repo.create_session(&user_id, "stale-hash", Utc::now() - Duration::hours(1))
			.await
			.unwrap();

		let result = repo.find_session_user("stale-hash", Utc::now()).await.unwrap();
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn test_delete_session() {
		let pool = create_test_pool().await;
		let repo = SessionRepository::new(pool.clone());
		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "del@example.com").await;

		let session_id = repo
			.create_session(&user_id, "h", Utc::now() + Duration::hours(1))
			.await
			.unwrap();

		assert!(repo.delete_session(&session_id).await.unwrap());
		assert!(!repo.delete_session(&session_id).await.unwrap());
		assert!(repo.find_session_user("h", Utc::now()).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_delete_expired_sweeps_only_stale_rows() {
		let pool = create_test_pool().await;
		let repo = SessionRepository::new(pool.clone());
		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "sweep@example.com").await;

		repo.create_session(&user_id, "h-old", Utc::now() - Duration::hours(2))
			.await
			.unwrap();
		repo.create_session(&user_id, "h-new", Utc::now() + Duration::hours(2))
			.await
			.unwrap();

		let removed = repo.delete_expired(Utc::now()).await.unwrap();
		assert_eq!(removed, 1);
		assert!(repo
			.find_session_user("h-new", Utc::now())
			.await
			.unwrap()
			.is_some());
	}
}
