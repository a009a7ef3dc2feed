// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User repository for database operations.

use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{User, UserId};

use crate::error::DbError;

/// Repository for user accounts.
///
/// Emails are unique and stored lowercase. Verification state lives on
/// the user row: a token hash plus expiry, cleared once the link is
/// followed.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new user with their password hash and verification token.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the email is already registered.
	#[tracing::instrument(skip(self, user, password_hash, verification_token_hash), fields(user_id = %user.id))]
	pub async fn create_user(
		&self,
		user: &User,
		password_hash: &str,
		verification_token_hash: &str,
		verification_expires_at: chrono::DateTime<Utc>,
	) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO users (
				id, display_name, email, password_hash, email_verified,
				verification_token_hash, verification_expires_at,
				created_at, updated_at, deleted_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.display_name)
		.bind(&user.email)
		.bind(password_hash)
		.bind(user.email_verified as i32)
		.bind(verification_token_hash)
		.bind(verification_expires_at.to_rfc3339())
		.bind(user.created_at.to_rfc3339())
		.bind(user.updated_at.to_rfc3339())
		.bind(user.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %user.id, "user created");
		Ok(())
	}

	/// Get a user by ID.
	///
	/// # Returns
	/// `None` if no user exists with this ID or if soft-deleted.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, display_name, email, email_verified, created_at, updated_at, deleted_at
			FROM users
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Get a user by email (lowercase).
	#[tracing::instrument(skip(self, email))]
	pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, display_name, email, email_verified, created_at, updated_at, deleted_at
			FROM users
			WHERE email = ? AND deleted_at IS NULL
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Fetch the stored password hash for a login attempt.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_password_hash(&self, email: &str) -> Result<Option<(UserId, String)>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, password_hash
			FROM users
			WHERE email = ? AND deleted_at IS NULL
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| {
			let id_str: String = r.get("id");
			let id = Uuid::parse_str(&id_str)
				.map_err(|e| DbError::Internal(format!("Invalid user ID: {e}")))?;
			Ok((UserId::new(id), r.get("password_hash")))
		})
		.transpose()
	}

	/// Mark the user owning this verification token as verified.
	///
	/// The token is single-use: the hash and expiry columns are cleared on
	/// success.
	///
	/// # Returns
	/// The verified user, or `None` if the token is unknown or past its
	/// expiry.
	#[tracing::instrument(skip(self, token_hash))]
	pub async fn verify_email_by_token(
		&self,
		token_hash: &str,
		now: chrono::DateTime<Utc>,
	) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, display_name, email, email_verified, created_at, updated_at, deleted_at
			FROM users
			WHERE verification_token_hash = ?
				AND verification_expires_at > ?
				AND deleted_at IS NULL
			"#,
		)
		.bind(token_hash)
		.bind(now.to_rfc3339())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		let mut user = row_to_user(&row)?;

		sqlx::query(
			r#"
			UPDATE users
			SET email_verified = 1,
				verification_token_hash = NULL,
				verification_expires_at = NULL,
				updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(now.to_rfc3339())
		.bind(user.id.to_string())
		.execute(&self.pool)
		.await?;

		user.email_verified = true;
		tracing::info!(user_id = %user.id, "email verified");
		Ok(Some(user))
	}
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id_str: String = row.get("id");
	let email_verified: i32 = row.get("email_verified");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deleted_at: Option<String> = row.get("deleted_at");

	let id =
		Uuid::parse_str(&id_str).map_err(|e| DbError::Internal(format!("Invalid user ID: {e}")))?;

	Ok(User {
		id: UserId::new(id),
		display_name: row.get("display_name"),
		email: row.get("email"),
		email_verified: email_verified != 0,
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
		updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
			.map_err(|e| DbError::Internal(format!("Invalid updated_at: {e}")))?
			.with_timezone(&Utc),
		deleted_at: deleted_at.and_then(|d| {
			chrono::DateTime::parse_from_rfc3339(&d)
				.map(|dt| dt.with_timezone(&Utc))
				.ok()
		}),
	})
}
