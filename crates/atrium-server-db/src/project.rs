// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project repository, including the Kanban status mutation.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use atrium_server_auth::{ClientId, CompanyId, ProjectId};

use crate::error::DbError;
use crate::types::{Project, ProjectStatus};

/// Field-level patch; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
	pub title: Option<String>,
	pub description: Option<Option<String>>,
	pub client_id: Option<Option<ClientId>>,
	pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Clone)]
pub struct ProjectRepository {
	pool: SqlitePool,
}

impl ProjectRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, project), fields(project_id = %project.id, company_id = %project.company_id))]
	pub async fn create_project(&self, project: &Project) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO projects (id, company_id, client_id, title, description, status, position, due_date, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(project.id.to_string())
		.bind(project.company_id.to_string())
		.bind(project.client_id.map(|c| c.to_string()))
		.bind(&project.title)
		.bind(&project.description)
		.bind(project.status.to_string())
		.bind(project.position)
		.bind(project.due_date.map(|d| d.to_string()))
		.bind(project.created_at.to_rfc3339())
		.bind(project.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(project_id = %project.id, "project created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(project_id = %id))]
	pub async fn get_project(
		&self,
		company_id: &CompanyId,
		id: &ProjectId,
	) -> Result<Option<Project>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, company_id, client_id, title, description, status, position, due_date, created_at, updated_at
			FROM projects
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(id.to_string())
		.bind(company_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_project(&r)).transpose()
	}

	/// List the board: ordered by status column, then position.
	#[tracing::instrument(skip(self), fields(company_id = %company_id))]
	pub async fn list_projects(&self, company_id: &CompanyId) -> Result<Vec<Project>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, company_id, client_id, title, description, status, position, due_date, created_at, updated_at
			FROM projects
			WHERE company_id = ?
			ORDER BY status ASC, position ASC, created_at ASC
			"#,
		)
		.bind(company_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_project).collect()
	}

	/// Apply a partial update and return the new row.
	#[tracing::instrument(skip(self, patch), fields(project_id = %id, company_id = %company_id))]
	pub async fn update_project(
		&self,
		company_id: &CompanyId,
		id: &ProjectId,
		patch: ProjectPatch,
	) -> Result<Option<Project>, DbError> {
		let Some(mut project) = self.get_project(company_id, id).await? else {
			return Ok(None);
		};

		if let Some(title) = patch.title {
			project.title = title;
		}
		if let Some(description) = patch.description {
			project.description = description;
		}
		if let Some(client_id) = patch.client_id {
			project.client_id = client_id;
		}
		if let Some(due_date) = patch.due_date {
			project.due_date = due_date;
		}
		project.updated_at = Utc::now();

		sqlx::query(
			r#"
			UPDATE projects
			SET title = ?, description = ?, client_id = ?, due_date = ?, updated_at = ?
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(&project.title)
		.bind(&project.description)
		.bind(project.client_id.map(|c| c.to_string()))
		.bind(project.due_date.map(|d| d.to_string()))
		.bind(project.updated_at.to_rfc3339())
		.bind(id.to_string())
		.bind(company_id.to_string())
		.execute(&self.pool)
		.await?;

		tracing::debug!(project_id = %id, "project updated");
		Ok(Some(project))
	}

	/// Move a project to a Kanban column at a position.
	///
	/// This is the server side of a board drag: a single-row write guarded
	/// by the company scope.
	///
	/// # Returns
	/// The updated row, or `None` if the project does not exist in this
	/// company.
	#[tracing::instrument(skip(self), fields(project_id = %id, company_id = %company_id, status = %status, position))]
	pub async fn update_status(
		&self,
		company_id: &CompanyId,
		id: &ProjectId,
		status: ProjectStatus,
		position: i64,
	) -> Result<Option<Project>, DbError> {
		let now = Utc::now();
		let result = sqlx::query(
			r#"
			UPDATE projects
			SET status = ?, position = ?, updated_at = ?
			WHERE id = ? AND company_id = ?
			"#,
		)
		.bind(status.to_string())
		.bind(position)
		.bind(now.to_rfc3339())
		.bind(id.to_string())
		.bind(company_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Ok(None);
		}

		tracing::debug!(project_id = %id, status = %status, "project moved");
		self.get_project(company_id, id).await
	}

	/// # Returns
	/// `true` if a project was deleted, `false` if not found.
	#[tracing::instrument(skip(self), fields(project_id = %id, company_id = %company_id))]
	pub async fn delete_project(
		&self,
		company_id: &CompanyId,
		id: &ProjectId,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM projects
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

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Result<Project, DbError> {
	let id_str: String = row.get("id");
	let company_id_str: String = row.get("company_id");
	let client_id_str: Option<String> = row.get("client_id");
	let status_str: String = row.get("status");
	let due_date: Option<String> = row.get("due_date");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	let id = Uuid::parse_str(&id_str)
		.map_err(|e| DbError::Internal(format!("Invalid project ID: {e}")))?;
	let company_id = Uuid::parse_str(&company_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid company_id: {e}")))?;
	let client_id = client_id_str
		.map(|s| Uuid::parse_str(&s).map(ClientId::new))
		.transpose()
		.map_err(|e| DbError::Internal(format!("Invalid client_id: {e}")))?;
	let status = ProjectStatus::parse(&status_str)
		.ok_or_else(|| DbError::Internal(format!("Invalid status: {status_str}")))?;

	Ok(Project {
		id: ProjectId::new(id),
		company_id: CompanyId::new(company_id),
		client_id,
		title: row.get("title"),
		description: row.get("description"),
		status,
		position: row.get("position"),
		due_date: due_date.and_then(|d| d.parse().ok()),
		created_at: parse_ts(&created_at)?,
		updated_at: parse_ts(&updated_at)?,
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
	use crate::testing::create_test_pool;
	use atrium_server_auth::Company;

	async fn fixture() -> (ProjectRepository, CompanyId) {
		let pool = create_test_pool().await;
		let company = Company::new("Acme", "acme");
		CompanyRepository::new(pool.clone())
			.create_company(&company)
			.await
			.unwrap();
		(ProjectRepository::new(pool), company.id)
	}

	fn make_project(company_id: CompanyId, title: &str) -> Project {
		let now = Utc::now();
		Project {
			id: ProjectId::generate(),
			company_id,
			client_id: None,
			title: title.to_string(),
			description: None,
			status: ProjectStatus::Backlog,
			position: 0,
			due_date: None,
			created_at: now,
			updated_at: now,
		}
	}

	#[tokio::test]
	async fn test_create_and_get() {
		let (repo, company_id) = fixture().await;
		let project = make_project(company_id, "Website redesign");
		repo.create_project(&project).await.unwrap();

		let fetched = repo.get_project(&company_id, &project.id).await.unwrap().unwrap();
		assert_eq!(fetched.title, "Website redesign");
		assert_eq!(fetched.status, ProjectStatus::Backlog);
	}

	#[tokio::test]
	async fn test_kanban_move_updates_status_and_position() {
		let (repo, company_id) = fixture().await;
		let project = make_project(company_id, "Move me");
		repo.create_project(&project).await.unwrap();

		let moved = repo
			.update_status(&company_id, &project.id, ProjectStatus::InProgress, 3)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(moved.status, ProjectStatus::InProgress);
		assert_eq!(moved.position, 3);
	}

	#[tokio::test]
	async fn test_kanban_move_is_scoped_to_company() {
		let (repo, company_id) = fixture().await;
		let project = make_project(company_id, "Scoped");
		repo.create_project(&project).await.unwrap();

		let other = CompanyId::generate();
		let result = repo
			.update_status(&other, &project.id, ProjectStatus::Done, 0)
			.await
			.unwrap();
		assert!(result.is_none());

		// Untouched.
		let row = repo.get_project(&company_id, &project.id).await.unwrap().unwrap();
		assert_eq!(row.status, ProjectStatus::Backlog);
	}

	#[tokio::test]
	async fn test_partial_update() {
		let (repo, company_id) = fixture().await;
		let project = make_project(company_id, "Old title");
		repo.create_project(&project).await.unwrap();

		let updated = repo
			.update_project(
				&company_id,
				&project.id,
				ProjectPatch {
					title: Some("New title".to_string()),
					due_date: Some(Some("2025-06-01".parse().unwrap())),
					..Default::default()
				},
			)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(updated.title, "New title");
		assert_eq!(updated.due_date.unwrap().to_string(), "2025-06-01");
	}

	#[tokio::test]
	async fn test_list_orders_by_column_then_position() {
		let (repo, company_id) = fixture().await;
		let mut a = make_project(company_id, "A");
		a.status = ProjectStatus::Backlog;
		a.position = 1;
		let mut b = make_project(company_id, "B");
		b.status = ProjectStatus::Backlog;
		b.position = 0;
		repo.create_project(&a).await.unwrap();
		repo.create_project(&b).await.unwrap();

		let projects = repo.list_projects(&company_id).await.unwrap();
		assert_eq!(projects[0].title, "B");
		assert_eq!(projects[1].title, "A");
	}

	#[tokio::test]
	async fn test_delete() {
		let (repo, company_id) = fixture().await;
		let project = make_project(company_id, "Temp");
		repo.create_project(&project).await.unwrap();

		assert!(repo.delete_project(&company_id, &project.id).await.unwrap());
		assert!(repo.get_project(&company_id, &project.id).await.unwrap().is_none());
	}
}
