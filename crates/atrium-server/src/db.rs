// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Database wiring for the server.
//!
//! This module re-exports repositories from atrium-server-db and provides
//! server-specific migrations.

use sqlx::sqlite::SqlitePool;

use crate::error::ServerError;

pub use atrium_server_db::{
	create_pool, ClientRepository, CompanyRepository, DbError, FileRepository,
	InvitationRepository, ProjectRepository, SessionRepository, UserRepository,
};

/// Run all database migrations (001-008).
///
/// # Arguments
/// * `pool` - SQLite connection pool
///
/// # Errors
/// Returns `ServerError::Database` if migrations fail.
///
/// # Note
/// Migrations are idempotent - safe to run multiple times.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), ServerError> {
	let migrations = [
		include_str!("../migrations/001_create_users.sql"),
		include_str!("../migrations/002_create_sessions.sql"),
		include_str!("../migrations/003_create_companies.sql"),
		include_str!("../migrations/004_create_invitations.sql"),
		include_str!("../migrations/005_create_clients.sql"),
		include_str!("../migrations/006_create_projects.sql"),
		include_str!("../migrations/007_create_files.sql"),
		include_str!("../migrations/008_create_audit_logs.sql"),
	];

	for (index, migration) in migrations.iter().enumerate() {
		for stmt in migration.split(';').filter(|s| !s.trim().is_empty()) {
			if let Err(e) = sqlx::query(stmt).execute(pool).await {
				let msg = e.to_string();
				if !msg.contains("already exists") && !msg.contains("duplicate column") {
					tracing::error!(migration = index + 1, error = %e, "migration failed");
					return Err(e.into());
				}
			}
		}
	}

	tracing::debug!("database migrations applied");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
	use std::str::FromStr;

	async fn memory_pool() -> SqlitePool {
		let options = SqliteConnectOptions::from_str(":memory:")
			.unwrap()
			.create_if_missing(true)
			.foreign_keys(false);
		SqlitePoolOptions::new()
			.max_connections(1)
			.connect_with(options)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn migrations_apply_cleanly() {
		let pool = memory_pool().await;
		run_migrations(&pool).await.unwrap();

		let tables: Vec<(String,)> = sqlx::query_as(
			"SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		let names: Vec<_> = tables.iter().map(|(n,)| n.as_str()).collect();

		for expected in [
			"audit_logs",
			"clients",
			"companies",
			"company_memberships",
			"files",
			"invitations",
			"projects",
			"sessions",
			"users",
		] {
			assert!(names.contains(&expected), "missing table {expected}");
		}
	}

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = memory_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();
	}

	#[tokio::test]
	async fn pending_invitation_index_is_partial() {
		let pool = memory_pool().await;
		run_migrations(&pool).await.unwrap();

		let now = chrono::Utc::now().to_rfc3339();
		let insert = |id: &str, status: &str, hash: &str| {
			let now = now.clone();
			let pool = pool.clone();
			let id = id.to_string();
			let status = status.to_string();
			let hash = hash.to_string();
			async move {
				sqlx::query(
					r#"
					INSERT INTO invitations (id, company_id, email, invited_by, token_hash, status, created_at, expires_at)
					VALUES (?, 'c-1', 'a@x.com', 'u-1', ?, ?, ?, ?)
					"#,
				)
				.bind(id)
				.bind(hash)
				.bind(status)
				.bind(&now)
				.bind(&now)
				.execute(&pool)
				.await
			}
		};

		insert("i-1", "pending", "h-1").await.unwrap();
		// Second pending row for the same (company, email) is blocked.
		assert!(insert("i-2", "pending", "h-2").await.is_err());
		// Non-pending rows are not.
		insert("i-3", "cancelled", "h-3").await.unwrap();
	}
}
