// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Company repository for database operations.
//!
//! This module provides database access for workspace management including:
//! - Company CRUD operations
//! - Membership management (owners, admins, members)
//! - The invite-permission oracle used by the invitation lifecycle

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{Company, CompanyId, CompanyMembership, CompanyRole, User, UserId};
use atrium_server_invitations::{InvitePolicy, StoreError};

use crate::error::DbError;
use crate::user::UserRepository;

#[async_trait]
pub trait CompanyStore: Send + Sync {
	async fn create_company(&self, company: &Company) -> Result<(), DbError>;
	async fn get_company_by_id(&self, id: &CompanyId) -> Result<Option<Company>, DbError>;
	async fn get_company_by_slug(&self, slug: &str) -> Result<Option<Company>, DbError>;
	async fn list_companies_for_user(&self, user_id: &UserId) -> Result<Vec<Company>, DbError>;
	async fn add_member(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
		role: CompanyRole,
	) -> Result<(), DbError>;
	async fn get_membership(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
	) -> Result<Option<CompanyMembership>, DbError>;
	async fn list_members(
		&self,
		company_id: &CompanyId,
	) -> Result<Vec<(CompanyMembership, User)>, DbError>;
	async fn remove_member(&self, company_id: &CompanyId, user_id: &UserId)
		-> Result<bool, DbError>;
	async fn count_owners(&self, company_id: &CompanyId) -> Result<i64, DbError>;
}

/// Repository for company workspaces and their memberships.
///
/// All IDs are UUIDs stored as strings in SQLite.
#[derive(Clone)]
pub struct CompanyRepository {
	pool: SqlitePool,
}

impl CompanyRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a new company.
	///
	/// # Errors
	/// Returns `DbError::Conflict` on a duplicate slug.
	#[tracing::instrument(skip(self, company), fields(company_id = %company.id, slug = %company.slug))]
	pub async fn create_company(&self, company: &Company) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO companies (id, name, slug, created_at, updated_at, deleted_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(company.id.to_string())
		.bind(&company.name)
		.bind(&company.slug)
		.bind(company.created_at.to_rfc3339())
		.bind(company.updated_at.to_rfc3339())
		.bind(company.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await?;

		tracing::debug!(company_id = %company.id, slug = %company.slug, "company created");
		Ok(())
	}

	/// Get a company by ID.
	///
	/// # Returns
	/// `None` if no company exists with this ID or if soft-deleted.
	#[tracing::instrument(skip(self), fields(company_id = %id))]
	pub async fn get_company_by_id(&self, id: &CompanyId) -> Result<Option<Company>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, created_at, updated_at, deleted_at
			FROM companies
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_company(&r)).transpose()
	}

	/// Get a company by slug.
	#[tracing::instrument(skip(self), fields(slug = %slug))]
	pub async fn get_company_by_slug(&self, slug: &str) -> Result<Option<Company>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, created_at, updated_at, deleted_at
			FROM companies
			WHERE slug = ? AND deleted_at IS NULL
			"#,
		)
		.bind(slug)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_company(&r)).transpose()
	}

	/// List companies a user belongs to (via membership), ordered by name.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_companies_for_user(&self, user_id: &UserId) -> Result<Vec<Company>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT c.id, c.name, c.slug, c.created_at, c.updated_at, c.deleted_at
			FROM companies c
			INNER JOIN company_memberships m ON c.id = m.company_id
			WHERE m.user_id = ? AND c.deleted_at IS NULL
			ORDER BY c.name ASC
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let companies: Result<Vec<_>, _> = rows.iter().map(row_to_company).collect();
		let companies = companies?;
		tracing::debug!(user_id = %user_id, count = companies.len(), "listed companies for user");
		Ok(companies)
	}

	/// Add a member to a company.
	///
	/// # Database Constraints
	/// - (`company_id`, `user_id`) must be unique
	#[tracing::instrument(skip(self), fields(company_id = %company_id, user_id = %user_id, role = %role))]
	pub async fn add_member(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
		role: CompanyRole,
	) -> Result<(), DbError> {
		let id = Uuid::new_v4().to_string();
		let now = Utc::now().to_rfc3339();
		sqlx::query(
			r#"
			INSERT INTO company_memberships (id, company_id, user_id, role, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(&id)
		.bind(company_id.to_string())
		.bind(user_id.to_string())
		.bind(role.to_string())
		.bind(&now)
		.execute(&self.pool)
		.await?;

		tracing::debug!(company_id = %company_id, user_id = %user_id, role = %role, "member added");
		Ok(())
	}

	/// Get a membership for a user in a company.
	#[tracing::instrument(skip(self), fields(company_id = %company_id, user_id = %user_id))]
	pub async fn get_membership(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
	) -> Result<Option<CompanyMembership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT company_id, user_id, role, created_at
			FROM company_memberships
			WHERE company_id = ? AND user_id = ?
			"#,
		)
		.bind(company_id.to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_membership(&r)).transpose()
	}

	/// List all members of a company with their user info, ordered by join
	/// date.
	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn list_members(
		&self,
		company_id: &CompanyId,
	) -> Result<Vec<(CompanyMembership, User)>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT m.company_id, m.user_id, m.role, m.created_at
			FROM company_memberships m
			WHERE m.company_id = ?
			ORDER BY m.created_at ASC
			"#,
		)
		.bind(company_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let users = UserRepository::new(self.pool.clone());
		let mut result = Vec::with_capacity(rows.len());
		for row in &rows {
			let membership = row_to_membership(row)?;
			if let Some(user) = users.get_user_by_id(&membership.user_id).await? {
				result.push((membership, user));
			}
		}
		tracing::debug!(company_id = %company_id, count = result.len(), "listed members");
		Ok(result)
	}

	/// Remove a member from a company.
	///
	/// # Returns
	/// `true` if a member was removed, `false` if not found.
	#[tracing::instrument(skip(self), fields(company_id = %company_id, user_id = %user_id))]
	pub async fn remove_member(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM company_memberships
			WHERE company_id = ? AND user_id = ?
			"#,
		)
		.bind(company_id.to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected() > 0;
		if removed {
			tracing::debug!(company_id = %company_id, user_id = %user_id, "member removed");
		}
		Ok(removed)
	}

	/// Count owners of a company.
	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn count_owners(&self, company_id: &CompanyId) -> Result<i64, DbError> {
		let row: (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*) FROM company_memberships
			WHERE company_id = ? AND role = 'owner'
			"#,
		)
		.bind(company_id.to_string())
		.fetch_one(&self.pool)
		.await?;

		Ok(row.0)
	}
}

#[async_trait]
impl CompanyStore for CompanyRepository {
	async fn create_company(&self, company: &Company) -> Result<(), DbError> {
		self.create_company(company).await
	}

	async fn get_company_by_id(&self, id: &CompanyId) -> Result<Option<Company>, DbError> {
		self.get_company_by_id(id).await
	}

	async fn get_company_by_slug(&self, slug: &str) -> Result<Option<Company>, DbError> {
		self.get_company_by_slug(slug).await
	}

	async fn list_companies_for_user(&self, user_id: &UserId) -> Result<Vec<Company>, DbError> {
		self.list_companies_for_user(user_id).await
	}

	async fn add_member(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
		role: CompanyRole,
	) -> Result<(), DbError> {
		self.add_member(company_id, user_id, role).await
	}

	async fn get_membership(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
	) -> Result<Option<CompanyMembership>, DbError> {
		self.get_membership(company_id, user_id).await
	}

	async fn list_members(
		&self,
		company_id: &CompanyId,
	) -> Result<Vec<(CompanyMembership, User)>, DbError> {
		self.list_members(company_id).await
	}

	async fn remove_member(
		&self,
		company_id: &CompanyId,
		user_id: &UserId,
	) -> Result<bool, DbError> {
		self.remove_member(company_id, user_id).await
	}

	async fn count_owners(&self, company_id: &CompanyId) -> Result<i64, DbError> {
		self.count_owners(company_id).await
	}
}

#[async_trait]
impl InvitePolicy for CompanyRepository {
	/// An actor may manage invitations when their membership role carries
	/// admin permissions.
	async fn can_invite_users(
		&self,
		user_id: &UserId,
		company_id: &CompanyId,
	) -> Result<bool, StoreError> {
		let membership = self
			.get_membership(company_id, user_id)
			.await
			.map_err(StoreError::from)?;
		Ok(membership.is_some_and(|m| m.role.can_invite_users()))
	}
}

fn row_to_company(row: &sqlx::sqlite::SqliteRow) -> Result<Company, DbError> {
	let id_str: String = row.get("id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deleted_at: Option<String> = row.get("deleted_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid company ID: {e}")))?;

	Ok(Company {
		id: CompanyId::new(id),
		name: row.get("name"),
		slug: row.get("slug"),
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

fn row_to_membership(row: &sqlx::sqlite::SqliteRow) -> Result<CompanyMembership, DbError> {
	let company_id_str: String = row.get("company_id");
	let user_id_str: String = row.get("user_id");
	let role_str: String = row.get("role");
	let created_at: String = row.get("created_at");

	let company_id = Uuid::parse_str(&company_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid company_id: {e}")))?;
	let user_id = Uuid::parse_str(&user_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid user_id: {e}")))?;
	let role = CompanyRole::parse(&role_str).unwrap_or(CompanyRole::Member);

	Ok(CompanyMembership {
		company_id: CompanyId::new(company_id),
		user_id: UserId::new(user_id),
		role,
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_test_user};
	use proptest::prelude::*;
	use std::collections::HashSet;

	proptest! {
		#[test]
		fn company_id_generation_is_unique(count in 1..1000usize) {
			let mut ids = HashSet::new();
			for _ in 0..count {
				let id = CompanyId::generate();
				prop_assert!(ids.insert(id.to_string()), "Generated duplicate CompanyId");
			}
		}
	}

	async fn make_repo() -> (SqlitePool, CompanyRepository) {
		let pool = create_test_pool().await;
		(pool.clone(), CompanyRepository::new(pool))
	}

	#[tokio::test]
	async fn test_create_and_get_company() {
		let (_pool, repo) = make_repo().await;
		let company = Company::new("Acme Corp", "acme-corp");

		repo.create_company(&company).await.unwrap();

		let fetched = repo.get_company_by_id(&company.id).await.unwrap().unwrap();
		assert_eq!(fetched.name, "Acme Corp");
		assert_eq!(fetched.slug, "acme-corp");

		let by_slug = repo.get_company_by_slug("acme-corp").await.unwrap().unwrap();
		assert_eq!(by_slug.id, company.id);
	}

	#[tokio::test]
	async fn test_duplicate_slug_is_conflict() {
		let (_pool, repo) = make_repo().await;
		repo.create_company(&Company::new("One", "same-slug")).await.unwrap();

		let err = repo
			.create_company(&Company::new("Two", "same-slug"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn test_add_and_get_member() {
		let (pool, repo) = make_repo().await;
		let company = Company::new("Member Org", "member-org");
		repo.create_company(&company).await.unwrap();

		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "member@example.com").await;

		repo.add_member(&company.id, &user_id, CompanyRole::Admin)
			.await
			.unwrap();

		let membership = repo
			.get_membership(&company.id, &user_id)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(membership.role, CompanyRole::Admin);
	}

	#[tokio::test]
	async fn test_duplicate_membership_is_conflict() {
		let (pool, repo) = make_repo().await;
		let company = Company::new("Dup Org", "dup-org");
		repo.create_company(&company).await.unwrap();
		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "dupm@example.com").await;

		repo.add_member(&company.id, &user_id, CompanyRole::Member)
			.await
			.unwrap();
		let err = repo
			.add_member(&company.id, &user_id, CompanyRole::Member)
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn test_list_companies_for_user() {
		let (pool, repo) = make_repo().await;
		let user_id = UserId::generate();
		insert_test_user(&pool, &user_id, "lister@example.com").await;

		let c1 = Company::new("Org One", "org-one");
		let c2 = Company::new("Org Two", "org-two");
		let c3 = Company::new("Org Three", "org-three");
		repo.create_company(&c1).await.unwrap();
		repo.create_company(&c2).await.unwrap();
		repo.create_company(&c3).await.unwrap();

		repo.add_member(&c1.id, &user_id, CompanyRole::Owner).await.unwrap();
		repo.add_member(&c2.id, &user_id, CompanyRole::Member).await.unwrap();

		let companies = repo.list_companies_for_user(&user_id).await.unwrap();
		assert_eq!(companies.len(), 2);
		let ids: HashSet<_> = companies.iter().map(|c| c.id).collect();
		assert!(ids.contains(&c1.id));
		assert!(ids.contains(&c2.id));
		assert!(!ids.contains(&c3.id));
	}

	#[tokio::test]
	async fn test_remove_member_and_count_owners() {
		let (pool, repo) = make_repo().await;
		let company = Company::new("Counts", "counts");
		repo.create_company(&company).await.unwrap();

		let owner = UserId::generate();
		let member = UserId::generate();
		insert_test_user(&pool, &owner, "owner@example.com").await;
		insert_test_user(&pool, &member, "plain@example.com").await;

		repo.add_member(&company.id, &owner, CompanyRole::Owner).await.unwrap();
		repo.add_member(&company.id, &member, CompanyRole::Member).await.unwrap();
		assert_eq!(repo.count_owners(&company.id).await.unwrap(), 1);

		assert!(repo.remove_member(&company.id, &member).await.unwrap());
		assert!(!repo.remove_member(&company.id, &member).await.unwrap());
		assert_eq!(repo.list_members(&company.id).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_invite_policy_requires_admin_role() {
		let (pool, repo) = make_repo().await;
		let company = Company::new("Policy Org", "policy-org");
		repo.create_company(&company).await.unwrap();

		let admin = UserId::generate();
		let member = UserId::generate();
		let outsider = UserId::generate();
		insert_test_user(&pool, &admin, "admin@example.com").await;
		insert_test_user(&pool, &member, "m@example.com").await;

		repo.add_member(&company.id, &admin, CompanyRole::Admin).await.unwrap();
		repo.add_member(&company.id, &member, CompanyRole::Member).await.unwrap();

		assert!(repo.can_invite_users(&admin, &company.id).await.unwrap());
		assert!(!repo.can_invite_users(&member, &company.id).await.unwrap());
		assert!(!repo.can_invite_users(&outsider, &company.id).await.unwrap());
	}
}
