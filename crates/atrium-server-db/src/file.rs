// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-metadata repository. The object bytes live elsewhere; this layer
//! only tracks the records.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{CompanyId, FileId, ProjectId, UserId};

use crate::error::DbError;
use crate::types::FileRecord;

#[derive(Clone)]
pub struct FileRepository {
	pool: SqlitePool,
}

impl FileRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, file), fields(file_id = %file.id, company_id = %file.company_id))]
	pub async fn create_file(&self, file: &FileRecord) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO files (id, company_id, project_id, name, content_type, size_bytes, storage_key, uploaded_by, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(file.id.to_string())
		.bind(file.company_id.to_string())
		.bind(file.project_id.map(|p| p.to_string()))
		.bind(&file.name)
		.bind(&file.content_type)
		.bind(file.size_bytes)
		.bind(&file.storage_key)
		.bind(file.uploaded_by.to_string())
		.bind(file.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(file_id = %file.id, "file record created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(file_id = %id))]
	pub async fn get_file(
		&self,
		company_id: &CompanyId,
		id: &FileId,
	) -> Result<Option<FileRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, company_id, project_id, name, content_type, size_bytes, storage_key, uploaded_by, created_at
			FROM files
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(id.to_string())
		.bind(company_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_file(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn list_files(&self, company_id: &CompanyId) -> Result<Vec<FileRecord>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, company_id, project_id, name, content_type, size_bytes, storage_key, uploaded_by, created_at
			FROM files
			WHERE company_id = ?
			ORDER BY created_at DESC
			"#,
		)
		.bind(company_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_file).collect()
	}

	/// Rename a file record.
	///
	/// # Returns
	/// The updated record, or `None` if not found in this company.
	#[tracing::instrument(skip(self), fields(file_id = %id, company_id = %company_id))]
	pub async fn rename_file(
		&self,
		company_id: &CompanyId,
		id: &FileId,
		name: &str,
	) -> Result<Option<FileRecord>, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE files
			SET name = ?
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(name)
		.bind(id.to_string())
		.bind(company_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Ok(None);
		}
		self.get_file(company_id, id).await
	}

	/// # Returns
	/// `true` if a record was deleted, `false` if not found.
	#[tracing::instrument(skip(self), fields(file_id = %id, company_id = %company_id))]
	pub async fn delete_file(&self, company_id: &CompanyId, id: &FileId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM files
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

fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> Result<FileRecord, DbError> {
	let id_str: String = row.get("id");
	let company_id_str: String = row.get("company_id");
	let project_id_str: Option<String> = row.get("project_id");
	let uploaded_by_str: String = row.get("uploaded_by");
	let created_at: String = row.get("created_at");

	let id =
		Uuid::parse_str(&id_str).map_err(|e| DbError::Internal(format!("Invalid file ID: {e}")))?;
	let company_id = Uuid::parse_str(&company_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid company_id: {e}")))?;
	let project_id = project_id_str
		.map(|s| Uuid::parse_str(&s).map(ProjectId::new))
		.transpose()
		.map_err(|e| DbError::Internal(format!("Invalid project_id: {e}")))?;
	let uploaded_by = Uuid::parse_str(&uploaded_by_str)
		.map_err(|e| DbError::Internal(format!("Invalid uploaded_by: {e}")))?;

	Ok(FileRecord {
		id: FileId::new(id),
		company_id: CompanyId::new(company_id),
		project_id,
		name: row.get("name"),
		content_type: row.get("content_type"),
		size_bytes: row.get("size_bytes"),
		storage_key: row.get("storage_key"),
		uploaded_by: UserId::new(uploaded_by),
		created_at: parse_ts(&created_at)?,
	})
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, DbError> {
	chrono::DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid timestamp: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::company::CompanyRepository;
	use crate::testing::{create_test_pool, insert_test_user};
	use atrium_server_auth::Company;

	async fn fixture() -> (FileRepository, CompanyId, UserId) {
		let pool = create_test_pool().await;
		let company = Company::new("Acme", "acme");
		CompanyRepository::new(pool.clone())
			.create_company(&company)
			.await
			.unwrap();
		let uploader = UserId::generate();
		insert_test_user(&pool, &uploader, "up@example.com").await;
		(FileRepository::new(pool), company.id, uploader)
	}

	fn make_file(company_id: CompanyId, uploaded_by: UserId, name: &str) -> FileRecord {
		FileRecord {
			id: FileId::generate(),
			company_id,
			project_id: None,
			name: name.to_string(),
			content_type: "application/pdf".to_string(),
			size_bytes: 1024,
			storage_key: format!("files/{}", Uuid::new_v4()),
			uploaded_by,
			created_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn test_create_list_get() {
		let (repo, company_id, uploader) = fixture().await;
		let file = make_file(company_id, uploader, "contract.pdf");
		repo.create_file(&file).await.unwrap();

		let files = repo.list_files(&company_id).await.unwrap();
		assert_eq!(files.len(), 1);

		let fetched = repo.get_file(&company_id, &file.id).await.unwrap().unwrap();
		assert_eq!(fetched.name, "contract.pdf");
		assert_eq!(fetched.size_bytes, 1024);
	}

	#[tokio::test]
	async fn test_rename() {
		let (repo, company_id, uploader) = fixture().await;
		let file = make_file(company_id, uploader, "draft.pdf");
		repo.create_file(&file).await.unwrap();

		let renamed = repo
			.rename_file(&company_id, &file.id, "final.pdf")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(renamed.name, "final.pdf");

		let missing = repo
			.rename_file(&CompanyId::generate(), &file.id, "nope.pdf")
			.await
			.unwrap();
		assert!(missing.is_none());
	}

	#[tokio::test]
	async fn test_delete() {
		let (repo, company_id, uploader) = fixture().await;
		let file = make_file(company_id, uploader, "temp.bin");
		repo.create_file(&file).await.unwrap();

		assert!(repo.delete_file(&company_id, &file.id).await.unwrap());
		assert!(!repo.delete_file(&company_id, &file.id).await.unwrap());
	}
}
