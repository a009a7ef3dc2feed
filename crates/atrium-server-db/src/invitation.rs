// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Invitation repository: the SQLite adapter behind the invitation
//! lifecycle's store port.
//!
//! # Database Constraints
//!
//! - `token_hash` is unique
//! - a partial unique index allows at most one `pending` row per
//!   `(company_id, email)`
//! - `(company_id, user_id)` memberships are unique
//!
//! Violations surface as [`StoreError::Conflict`] so the lifecycle can
//! translate them into domain errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{CompanyId, CompanyRole, InvitationId, UserId};
use atrium_server_invitations::{
	AcceptCommit, Invitation, InvitationStatus, InvitationStore, Invitee, StoreError,
};

use crate::error::DbError;

/// Repository for workspace invitations.
#[derive(Clone)]
pub struct InvitationRepository {
	pool: SqlitePool,
}

impl InvitationRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// List invitations for a company, newest first.
	///
	/// Cancelled and expired rows are kept as history; callers filter by
	/// status when they only want actionable rows.
	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn list_for_company(
		&self,
		company_id: &CompanyId,
	) -> Result<Vec<Invitation>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, company_id, email, invited_by, token_hash, status, created_at, expires_at, accepted_at
			FROM invitations
			WHERE company_id = ?
			ORDER BY created_at DESC
			"#,
		)
		.bind(company_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let invitations: Result<Vec<_>, _> = rows.iter().map(row_to_invitation).collect();
		let invitations = invitations?;
		tracing::debug!(company_id = %company_id, count = invitations.len(), "listed invitations");
		Ok(invitations)
	}

	/// List pending invitations for a company, newest first.
	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn list_pending(&self, company_id: &CompanyId) -> Result<Vec<Invitation>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, company_id, email, invited_by, token_hash, status, created_at, expires_at, accepted_at
			FROM invitations
			WHERE company_id = ? AND status = 'pending'
			ORDER BY created_at DESC
			"#,
		)
		.bind(company_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_invitation).collect()
	}
}

#[async_trait]
impl InvitationStore for InvitationRepository {
	async fn insert(&self, invitation: &Invitation) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			INSERT INTO invitations (id, company_id, email, invited_by, token_hash, status, created_at, expires_at, accepted_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(invitation.id.to_string())
		.bind(invitation.company_id.to_string())
		.bind(&invitation.email)
		.bind(invitation.invited_by.to_string())
		// Note: token_hash is intentionally not logged
		.bind(&invitation.token_hash)
		.bind(invitation.status.to_string())
		.bind(invitation.created_at.to_rfc3339())
		.bind(invitation.expires_at.to_rfc3339())
		.bind(invitation.accepted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await
		.map_err(DbError::from)?;

		tracing::debug!(invitation_id = %invitation.id, company_id = %invitation.company_id, "invitation created");
		Ok(())
	}

	async fn find_by_id(&self, id: &InvitationId) -> Result<Option<Invitation>, StoreError> {
		let row = sqlx::query(
			r#"
			SELECT id, company_id, email, invited_by, token_hash, status, created_at, expires_at, accepted_at
			FROM invitations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await
		.map_err(DbError::from)?;

		Ok(row.map(|r| row_to_invitation(&r)).transpose()?)
	}

	async fn find_by_token_hash(
		&self,
		token_hash: &str,
	) -> Result<Option<Invitation>, StoreError> {
		let row = sqlx::query(
			r#"
			SELECT id, company_id, email, invited_by, token_hash, status, created_at, expires_at, accepted_at
			FROM invitations
			WHERE token_hash = ?
			"#,
		)
		.bind(token_hash)
		.fetch_optional(&self.pool)
		.await
		.map_err(DbError::from)?;

		Ok(row.map(|r| row_to_invitation(&r)).transpose()?)
	}

	async fn find_pending_by_email(
		&self,
		company_id: &CompanyId,
		email: &str,
	) -> Result<Option<Invitation>, StoreError> {
		let row = sqlx::query(
			r#"
			SELECT id, company_id, email, invited_by, token_hash, status, created_at, expires_at, accepted_at
			FROM invitations
			WHERE company_id = ? AND email = ? AND status = 'pending'
			"#,
		)
		.bind(company_id.to_string())
		.bind(email)
		.fetch_optional(&self.pool)
		.await
		.map_err(DbError::from)?;

		Ok(row.map(|r| row_to_invitation(&r)).transpose()?)
	}

	async fn update_status(
		&self,
		id: &InvitationId,
		status: InvitationStatus,
		accepted_at: Option<DateTime<Utc>>,
	) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			UPDATE invitations
			SET status = ?, accepted_at = ?
			WHERE id = ?
			"#,
		)
		.bind(status.to_string())
		.bind(accepted_at.map(|d| d.to_rfc3339()))
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(DbError::from)?;

		tracing::debug!(invitation_id = %id, status = %status, "invitation status updated");
		Ok(())
	}

	async fn reissue(
		&self,
		id: &InvitationId,
		token_hash: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			UPDATE invitations
			SET token_hash = ?, expires_at = ?, status = 'pending', accepted_at = NULL
			WHERE id = ?
			"#,
		)
		.bind(token_hash)
		.bind(expires_at.to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(DbError::from)?;

		tracing::debug!(invitation_id = %id, "invitation reissued");
		Ok(())
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<Invitee>, StoreError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, email_verified
			FROM users
			WHERE email = ? AND deleted_at IS NULL
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await
		.map_err(DbError::from)?;

		row.map(|r| {
			let id_str: String = r.get("id");
			let email_verified: i32 = r.get("email_verified");
			let id = Uuid::parse_str(&id_str)
				.map_err(|e| StoreError::Internal(format!("Invalid user ID: {e}")))?;
			Ok(Invitee {
				user_id: UserId::new(id),
				email: r.get("email"),
				email_verified: email_verified != 0,
			})
		})
		.transpose()
	}

	async fn is_member_by_email(
		&self,
		company_id: &CompanyId,
		email: &str,
	) -> Result<bool, StoreError> {
		let row: (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*)
			FROM company_memberships m
			INNER JOIN users u ON m.user_id = u.id
			WHERE m.company_id = ? AND u.email = ? AND u.deleted_at IS NULL
			"#,
		)
		.bind(company_id.to_string())
		.bind(email)
		.fetch_one(&self.pool)
		.await
		.map_err(DbError::from)?;

		Ok(row.0 > 0)
	}

	async fn is_member(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
	) -> Result<bool, StoreError> {
		let row: (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*) FROM company_memberships
			WHERE company_id = ? AND user_id = ?
			"#,
		)
		.bind(company_id.to_string())
		.bind(user_id.to_string())
		.fetch_one(&self.pool)
		.await
		.map_err(DbError::from)?;

		Ok(row.0 > 0)
	}

	async fn accept_and_join(
		&self,
		id: &InvitationId,
		user_id: &UserId,
		accepted_at: DateTime<Utc>,
	) -> Result<AcceptCommit, StoreError> {
		let mut tx = self.pool.begin().await.map_err(DbError::from)?;

		// Conditional flip: only one concurrent accept can move the row
		// out of `pending`.
		let updated = sqlx::query(
			r#"
			UPDATE invitations
			SET status = 'accepted', accepted_at = ?
			WHERE id = ? AND status = 'pending'
			"#,
		)
		.bind(accepted_at.to_rfc3339())
		.bind(id.to_string())
		.execute(&mut *tx)
		.await
		.map_err(DbError::from)?;

		if updated.rows_affected() == 0 {
			let status_str: Option<(String,)> =
				sqlx::query_as("SELECT status FROM invitations WHERE id = ?")
					.bind(id.to_string())
					.fetch_optional(&mut *tx)
					.await
					.map_err(DbError::from)?;
			tx.rollback().await.map_err(DbError::from)?;

			let status = status_str
				.and_then(|(s,)| InvitationStatus::parse(&s))
				.ok_or_else(|| StoreError::Internal("invitation disappeared".to_string()))?;
			return Ok(AcceptCommit::StatusWas(status));
		}

		let company_id: (String,) =
			sqlx::query_as("SELECT company_id FROM invitations WHERE id = ?")
				.bind(id.to_string())
				.fetch_one(&mut *tx)
				.await
				.map_err(DbError::from)?;

		// INSERT OR IGNORE keeps the accept idempotent when the membership
		// row already exists.
		let inserted = sqlx::query(
			r#"
			INSERT OR IGNORE INTO company_memberships (id, company_id, user_id, role, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(Uuid::new_v4().to_string())
		.bind(&company_id.0)
		.bind(user_id.to_string())
		.bind(CompanyRole::Member.to_string())
		.bind(accepted_at.to_rfc3339())
		.execute(&mut *tx)
		.await
		.map_err(DbError::from)?;

		tx.commit().await.map_err(DbError::from)?;

		tracing::debug!(
			invitation_id = %id,
			user_id = %user_id,
			membership_created = inserted.rows_affected() > 0,
			"invitation accepted"
		);
		Ok(AcceptCommit::Applied {
			membership_created: inserted.rows_affected() > 0,
		})
	}
}

fn row_to_invitation(row: &sqlx::sqlite::SqliteRow) -> Result<Invitation, DbError> {
	let id_str: String = row.get("id");
	let company_id_str: String = row.get("company_id");
	let invited_by_str: String = row.get("invited_by");
	let status_str: String = row.get("status");
	let created_at: String = row.get("created_at");
	let expires_at: String = row.get("expires_at");
	let accepted_at: Option<String> = row.get("accepted_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid invitation ID: {e}")))?;
	let company_id = Uuid::parse_str(&company_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid company_id: {e}")))?;
	let invited_by = Uuid::parse_str(&invited_by_str)
		.map_err(|e| DbError::Internal(format!("Invalid invited_by: {e}")))?;
	let status = InvitationStatus::parse(&status_str)
		.ok_or_else(|| DbError::Internal(format!("Invalid status: {status_str}")))?;

	Ok(Invitation {
		id: InvitationId::new(id),
		company_id: CompanyId::new(company_id),
		email: row.get("email"),
		invited_by: UserId::new(invited_by),
		token_hash: row.get("token_hash"),
		status,
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
		expires_at: chrono::DateTime::parse_from_rfc3339(&expires_at)
			.map_err(|e| DbError::Internal(format!("Invalid expires_at: {e}")))?
			.with_timezone(&Utc),
		accepted_at: accepted_at.and_then(|d| {
			chrono::DateTime::parse_from_rfc3339(&d)
				.map(|dt| dt.with_timezone(&Utc))
				.ok()
		}),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::company::CompanyRepository;
	use crate::testing::{create_test_pool, insert_test_user};
	use atrium_server_auth::Company;
	use chrono::Duration;

	struct Fixture {
		pool: SqlitePool,
		repo: InvitationRepository,
		company: Company,
		admin: UserId,
	}

	async fn fixture() -> Fixture {
		let pool = create_test_pool().await;
		let companies = CompanyRepository::new(pool.clone());
		let company = Company::new("Acme", "acme");
		companies.create_company(&company).await.unwrap();

		let admin = UserId::generate();
		insert_test_user(&pool, &admin, "admin@acme.com").await;
		companies
			.add_member(&company.id, &admin, CompanyRole::Admin)
			.await
			.unwrap();

		Fixture {
			repo: InvitationRepository::new(pool.clone()),
			pool,
			company,
			admin,
		}
	}

	fn make_invitation(f: &Fixture, email: &str, token_hash: &str) -> Invitation {
		Invitation::new(
			f.company.id,
			email,
			f.admin,
			token_hash,
			Utc::now(),
			Duration::days(7),
		)
	}

	#[tokio::test]
	async fn test_insert_and_find() {
		let f = fixture().await;
		let invitation = make_invitation(&f, "bob@x.com", "hash-1");
		f.repo.insert(&invitation).await.unwrap();

		let by_id = f.repo.find_by_id(&invitation.id).await.unwrap().unwrap();
		assert_eq!(by_id.email, "bob@x.com");
		assert_eq!(by_id.status, InvitationStatus::Pending);

		let by_hash = f.repo.find_by_token_hash("hash-1").await.unwrap().unwrap();
		assert_eq!(by_hash.id, invitation.id);

		let pending = f
			.repo
			.find_pending_by_email(&f.company.id, "bob@x.com")
			.await
			.unwrap();
		assert!(pending.is_some());
	}

	#[tokio::test]
	async fn test_second_pending_for_same_email_is_conflict() {
		let f = fixture().await;
		f.repo
			.insert(&make_invitation(&f, "dup@x.com", "hash-a"))
			.await
			.unwrap();

		let err = f
			.repo
			.insert(&make_invitation(&f, "dup@x.com", "hash-b"))
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::Conflict(_)));
	}

	#[tokio::test]
	async fn test_non_pending_rows_do_not_block_new_invitations() {
		let f = fixture().await;
		let first = make_invitation(&f, "again@x.com", "hash-1st");
		f.repo.insert(&first).await.unwrap();
		f.repo
			.update_status(&first.id, InvitationStatus::Cancelled, None)
			.await
			.unwrap();

		// Partial unique index only covers pending rows.
		f.repo
			.insert(&make_invitation(&f, "again@x.com", "hash-2nd"))
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_duplicate_token_hash_is_conflict() {
		let f = fixture().await;
		f.repo
			.insert(&make_invitation(&f, "a@x.com", "same-hash"))
			.await
			.unwrap();

		let err = f
			.repo
			.insert(&make_invitation(&f, "b@x.com", "same-hash"))
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::Conflict(_)));
	}

	#[tokio::test]
	async fn test_reissue_rotates_token_and_resets_status() {
		let f = fixture().await;
		let invitation = make_invitation(&f, "rot@x.com", "old-hash");
		f.repo.insert(&invitation).await.unwrap();
		f.repo
			.update_status(&invitation.id, InvitationStatus::Expired, None)
			.await
			.unwrap();

		let new_expiry = Utc::now() + Duration::days(7);
		f.repo
			.reissue(&invitation.id, "new-hash", new_expiry)
			.await
			.unwrap();

		let row = f.repo.find_by_id(&invitation.id).await.unwrap().unwrap();
		assert_eq!(row.status, InvitationStatus::Pending);
		assert_eq!(row.token_hash, "new-hash");
		assert!(row.accepted_at.is_none());
		assert!(f.repo.find_by_token_hash("old-hash").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_accept_and_join_is_atomic_and_conditional() {
		let f = fixture().await;
		let invitation = make_invitation(&f, "bob@x.com", "acc-hash");
		f.repo.insert(&invitation).await.unwrap();

		let bob = UserId::generate();
		insert_test_user(&f.pool, &bob, "bob@x.com").await;

		let now = Utc::now();
		let commit = f
			.repo
			.accept_and_join(&invitation.id, &bob, now)
			.await
			.unwrap();
		assert_eq!(
			commit,
			AcceptCommit::Applied {
				membership_created: true
			}
		);

		assert!(f.repo.is_member(&f.company.id, &bob).await.unwrap());
		let row = f.repo.find_by_id(&invitation.id).await.unwrap().unwrap();
		assert_eq!(row.status, InvitationStatus::Accepted);
		assert!(row.accepted_at.is_some());

		// Second invocation observes the terminal status.
		let second = f
			.repo
			.accept_and_join(&invitation.id, &bob, now)
			.await
			.unwrap();
		assert_eq!(second, AcceptCommit::StatusWas(InvitationStatus::Accepted));

		// Exactly one membership row exists.
		let count: (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM company_memberships WHERE company_id = ? AND user_id = ?",
		)
		.bind(f.company.id.to_string())
		.bind(bob.to_string())
		.fetch_one(&f.pool)
		.await
		.unwrap();
		assert_eq!(count.0, 1);
	}

	#[tokio::test]
	async fn test_accept_and_join_tolerates_existing_membership() {
		let f = fixture().await;
		let invitation = make_invitation(&f, "bob2@x.com", "acc2-hash");
		f.repo.insert(&invitation).await.unwrap();

		let bob = UserId::generate();
		insert_test_user(&f.pool, &bob, "bob2@x.com").await;
		CompanyRepository::new(f.pool.clone())
			.add_member(&f.company.id, &bob, CompanyRole::Member)
			.await
			.unwrap();

		let commit = f
			.repo
			.accept_and_join(&invitation.id, &bob, Utc::now())
			.await
			.unwrap();
		assert_eq!(
			commit,
			AcceptCommit::Applied {
				membership_created: false
			}
		);
	}

	#[tokio::test]
	async fn test_find_user_and_member_lookups() {
		let f = fixture().await;
		let invitee = f
			.repo
			.find_user_by_email("admin@acme.com")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(invitee.user_id, f.admin);
		assert!(invitee.email_verified);

		assert!(f
			.repo
			.find_user_by_email("ghost@acme.com")
			.await
			.unwrap()
			.is_none());

		assert!(f
			.repo
			.is_member_by_email(&f.company.id, "admin@acme.com")
			.await
			.unwrap());
		assert!(!f
			.repo
			.is_member_by_email(&f.company.id, "ghost@acme.com")
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn test_list_pending_excludes_terminal_rows() {
		let f = fixture().await;
		let a = make_invitation(&f, "a@x.com", "h-a");
		let b = make_invitation(&f, "b@x.com", "h-b");
		f.repo.insert(&a).await.unwrap();
		f.repo.insert(&b).await.unwrap();
		f.repo
			.update_status(&a.id, InvitationStatus::Cancelled, None)
			.await
			.unwrap();

		let pending = f.repo.list_pending(&f.company.id).await.unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].id, b.id);

		let all = f.repo.list_for_company(&f.company.id).await.unwrap();
		assert_eq!(all.len(), 2);
	}
}
