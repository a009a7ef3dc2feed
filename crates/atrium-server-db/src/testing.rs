// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared helpers for repository tests: an in-memory pool carrying the
//! same schema the server migrations produce.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use atrium_server_auth::UserId;

pub(crate) async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("Failed to create test pool");

	let schema = [
		r#"
		CREATE TABLE IF NOT EXISTS users (
			id TEXT PRIMARY KEY,
			display_name TEXT NOT NULL,
			email TEXT UNIQUE NOT NULL,
			password_hash TEXT NOT NULL,
			email_verified INTEGER NOT NULL DEFAULT 0,
			verification_token_hash TEXT,
			verification_expires_at TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS sessions (
			id TEXT PRIMARY KEY,
			user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
			token_hash TEXT UNIQUE NOT NULL,
			created_at TEXT NOT NULL,
			expires_at TEXT NOT NULL
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS companies (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			slug TEXT UNIQUE NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS company_memberships (
			id TEXT PRIMARY KEY,
			company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
			user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
			role TEXT NOT NULL,
			created_at TEXT NOT NULL,
			UNIQUE(company_id, user_id)
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS invitations (
			id TEXT PRIMARY KEY,
			company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
			email TEXT NOT NULL,
			invited_by TEXT NOT NULL REFERENCES users(id),
			token_hash TEXT UNIQUE NOT NULL,
			status TEXT NOT NULL DEFAULT 'pending',
			created_at TEXT NOT NULL,
			expires_at TEXT NOT NULL,
			accepted_at TEXT
		)
		"#,
		r#"
		CREATE UNIQUE INDEX IF NOT EXISTS idx_invitations_one_pending
		ON invitations(company_id, email) WHERE status = 'pending'
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS clients (
			id TEXT PRIMARY KEY,
			company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
			name TEXT NOT NULL,
			email TEXT,
			phone TEXT,
			address TEXT,
			notes TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS projects (
			id TEXT PRIMARY KEY,
			company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
			client_id TEXT REFERENCES clients(id) ON DELETE SET NULL,
			title TEXT NOT NULL,
			description TEXT,
			status TEXT NOT NULL DEFAULT 'backlog',
			position INTEGER NOT NULL DEFAULT 0,
			due_date TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS files (
			id TEXT PRIMARY KEY,
			company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
			project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
			name TEXT NOT NULL,
			content_type TEXT NOT NULL,
			size_bytes INTEGER NOT NULL,
			storage_key TEXT NOT NULL,
			uploaded_by TEXT NOT NULL REFERENCES users(id),
			created_at TEXT NOT NULL
		)
		"#,
	];

	for stmt in schema {
		sqlx::query(stmt).execute(&pool).await.unwrap();
	}

	pool
}

pub(crate) async fn insert_test_user(pool: &SqlitePool, user_id: &UserId, email: &str) {
	let now = Utc::now().to_rfc3339();
	sqlx::query(
		r#"
		INSERT INTO users (id, display_name, email, password_hash, email_verified, created_at, updated_at)
		VALUES (?, 'Test User', ?, 'x', 1, ?, ?)
		"#,
	)
	.bind(user_id.to_string())
	.bind(email)
	.bind(&now)
	.bind(&now)
	.execute(pool)
	.await
	.unwrap();
}
