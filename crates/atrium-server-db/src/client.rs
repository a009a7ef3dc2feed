// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client repository.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{ClientId, CompanyId};

use crate::error::DbError;
use crate::types::Client;

/// Field-level patch for inline edits; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
	pub name: Option<String>,
	pub email: Option<Option<String>>,
	pub phone: Option<Option<String>>,
	pub address: Option<Option<String>>,
	pub notes: Option<Option<String>>,
}

impl ClientPatch {
	pub fn is_empty(&self) -> bool {
		self.name.is_none()
			&& self.email.is_none()
			&& self.phone.is_none()
			&& self.address.is_none()
			&& self.notes.is_none()
	}
}

#[derive(Clone)]
pub struct ClientRepository {
	pool: SqlitePool,
}

impl ClientRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, client), fields(client_id = %client.id, company_id = %client.company_id))]
	pub async fn create_client(&self, client: &Client) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO clients (id, company_id, name, email, phone, address, notes, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(client.id.to_string())
		.bind(client.company_id.to_string())
		.bind(&client.name)
		.bind(&client.email)
		.bind(&client.phone)
		.bind(&client.address)
		.bind(&client.notes)
		.bind(client.created_at.to_rfc3339())
		.bind(client.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(client_id = %client.id, "client created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(client_id = %id))]
	pub async fn get_client(
		&self,
		company_id: &CompanyId,
		id: &ClientId,
	) -> Result<Option<Client>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, company_id, name, email, phone, address, notes, created_at, updated_at
			FROM clients
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(id.to_string())
		.bind(company_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_client(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn list_clients(&self, company_id: &CompanyId) -> Result<Vec<Client>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, company_id, name, email, phone, address, notes, created_at, updated_at
			FROM clients
			WHERE company_id = ?
			ORDER BY name ASC
			"#,
		)
		.bind(company_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_client).collect()
	}

	/// Apply a partial update and return the new row.
	///
	/// # Returns
	/// `None` if the client does not exist in this company.
	#[tracing::instrument(skip(self, patch), fields(client_id = %id, company_id = %company_id))]
	pub async fn update_client(
		&self,
		company_id: &CompanyId,
		id: &ClientId,
		patch: ClientPatch,
	) -> Result<Option<Client>, DbError> {
		let Some(mut client) = self.get_client(company_id, id).await? else {
			return Ok(None);
		};

		if let Some(name) = patch.name {
			client.name = name;
		}
		if let Some(email) = patch.email {
			client.email = email;
		}
		if let Some(phone) = patch.phone {
			client.phone = phone;
		}
		if let Some(address) = patch.address {
			client.address = address;
		}
		if let Some(notes) = patch.notes {
			client.notes = notes;
		}
		client.updated_at = Utc::now();

		sqlx::query(
			r#"
			UPDATE clients
			SET name = ?, email = ?, phone = ?, address = ?, notes = ?, updated_at = ?
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(&client.name)
		.bind(&client.email)
		.bind(&client.phone)
		.bind(&client.address)
		.bind(&client.notes)
		.bind(client.updated_at.to_rfc3339())
		.bind(id.to_string())
		.bind(company_id.to_string())
		.execute(&self.pool)
		.await?;

		tracing::debug!(client_id = %id, "client updated");
		Ok(Some(client))
	}

	/// # Returns
	/// `true` if a client was deleted, `false` if not found.
	#[tracing::instrument(skip(self), fields(client_id = %id, company_id = %company_id))]
	pub async fn delete_client(&self, company_id: &CompanyId, id: &ClientId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM clients
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(id.to_string())
		.bind(company_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}

fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client, DbError> {
	let id_str: String = row.get("id");
	let company_id_str: String = row.get("company_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid client ID: {e}")))?;
	let company_id = Uuid::parse_str(&company_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid company_id: {e}")))?;

	Ok(Client {
		id: ClientId::new(id),
		company_id: CompanyId::new(company_id),
		name: row.get("name"),
		email: row.get("email"),
		phone: row.get("phone"),
		address: row.get("address"),
		notes: row.get("notes"),
		created_at: parse_ts(&created_at)?,
		updated_at: parse_ts(&updated_at)?,
	})
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, DbError> {
	chrono::DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid timestamp: {e}")))
}
