// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Project HTTP handlers, including the Kanban board mutation.
//!
//! Moving a card is a plain status/position write scoped to the company;
//! the board UI applies the move optimistically and reconciles from the
//! response, so the endpoint is safe to call repeatedly.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use chrono::Utc;

use atrium_server_audit::{AuditEventType, AuditLogBuilder, UserId as AuditUserId};
use atrium_server_auth::ProjectId;
use atrium_server_db::{Project, ProjectPatch, ProjectStatus};

pub use atrium_server_api::projects::*;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	impl_api_error_response, parse_id,
	routes::require_member,
	validation::{parse_client_id, parse_company_id, parse_project_id},
};

impl_api_error_response!(ProjectErrorResponse);

fn project_response(project: &Project) -> ProjectResponse {
	ProjectResponse {
		id: project.id.to_string(),
		company_id: project.company_id.to_string(),
		client_id: project.client_id.map(|c| c.to_string()),
		title: project.title.clone(),
		description: project.description.clone(),
		status: project.status.to_string(),
		position: project.position,
		due_date: project.due_date,
		created_at: project.created_at,
		updated_at: project.updated_at,
	}
}

fn internal_error() -> axum::response::Response {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(ProjectErrorResponse {
			error: "internal_error".to_string(),
			message: "Something went wrong".to_string(),
		}),
	)
		.into_response()
}

fn project_not_found() -> axum::response::Response {
	(
		StatusCode::NOT_FOUND,
		Json(ProjectErrorResponse {
			error: "not_found".to_string(),
			message: "Project not found".to_string(),
		}),
	)
		.into_response()
}

/// List the workspace board, ordered by column then position.
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/projects",
    params(("company_id" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Project list", body = ListProjectsResponse),
        (status = 401, description = "Not authenticated", body = ProjectErrorResponse),
        (status = 404, description = "Company not found", body = ProjectErrorResponse)
    ),
    tag = "projects"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn list_projects(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
) -> impl IntoResponse {
	let company_id = parse_id!(ProjectErrorResponse, parse_company_id(&company_id));
	if let Err(resp) =
		require_member::<ProjectErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	match state.project_repo.list_projects(&company_id).await {
		Ok(projects) => (
			StatusCode::OK,
			Json(ListProjectsResponse {
				projects: projects.iter().map(project_response).collect(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to list projects");
			internal_error()
		}
	}
}

/// Create a project in the backlog column.
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/projects",
    params(("company_id" = String, Path, description = "Company ID")),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = ProjectErrorResponse),
        (status = 401, description = "Not authenticated", body = ProjectErrorResponse),
        (status = 404, description = "Company not found", body = ProjectErrorResponse)
    ),
    tag = "projects"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn create_project(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
	Json(payload): Json<CreateProjectRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(ProjectErrorResponse, parse_company_id(&company_id));
	if let Err(resp) =
		require_member::<ProjectErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	let title = payload.title.trim();
	if title.is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(ProjectErrorResponse {
				error: "invalid_title".to_string(),
				message: "Enter a project title".to_string(),
			}),
		)
			.into_response();
	}

	let client_id = match payload.client_id.as_deref() {
		Some(raw) => Some(parse_id!(ProjectErrorResponse, parse_client_id(raw))),
		None => None,
	};

	let now = Utc::now();
	let project = Project {
		id: ProjectId::generate(),
		company_id,
		client_id,
		title: title.to_string(),
		description: payload.description,
		status: ProjectStatus::Backlog,
		position: 0,
		due_date: payload.due_date,
		created_at: now,
		updated_at: now,
	};

	if let Err(e) = state.project_repo.create_project(&project).await {
		tracing::error!(error = %e, "Failed to create project");
		return internal_error();
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::ProjectModified)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("project", project.id.to_string())
			.details(serde_json::json!({ "action": "created" }))
			.build(),
	);

	(StatusCode::CREATED, Json(project_response(&project))).into_response()
}

/// Apply a partial update to a project.
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/projects/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 401, description = "Not authenticated", body = ProjectErrorResponse),
        (status = 404, description = "Project not found", body = ProjectErrorResponse)
    ),
    tag = "projects"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id, project_id = %project_id))]
pub async fn update_project(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, project_id)): Path<(String, String)>,
	Json(payload): Json<UpdateProjectRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(ProjectErrorResponse, parse_company_id(&company_id));
	let project_id = parse_id!(ProjectErrorResponse, parse_project_id(&project_id));
	if let Err(resp) =
		require_member::<ProjectErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	let client_id = match payload.client_id {
		Some(Some(raw)) => Some(Some(parse_id!(ProjectErrorResponse, parse_client_id(&raw)))),
		Some(None) => Some(None),
		None => None,
	};

	let patch = ProjectPatch {
		title: payload.title,
		description: payload.description,
		client_id,
		due_date: payload.due_date,
	};

	match state
		.project_repo
		.update_project(&company_id, &project_id, patch)
		.await
	{
		Ok(Some(project)) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::ProjectModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("project", project.id.to_string())
					.details(serde_json::json!({ "action": "updated" }))
					.build(),
			);
			(StatusCode::OK, Json(project_response(&project))).into_response()
		}
		Ok(None) => project_not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to update project");
			internal_error()
		}
	}
}

/// Move a project to a Kanban column and position.
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/projects/{id}/status",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Project ID")
    ),
    request_body = MoveProjectRequest,
    responses(
        (status = 200, description = "Project moved", body = ProjectResponse),
        (status = 400, description = "Unknown status", body = ProjectErrorResponse),
        (status = 401, description = "Not authenticated", body = ProjectErrorResponse),
        (status = 404, description = "Project not found", body = ProjectErrorResponse)
    ),
    tag = "projects"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id, project_id = %project_id))]
pub async fn move_project(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, project_id)): Path<(String, String)>,
	Json(payload): Json<MoveProjectRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(ProjectErrorResponse, parse_company_id(&company_id));
	let project_id = parse_id!(ProjectErrorResponse, parse_project_id(&project_id));
	if let Err(resp) =
		require_member::<ProjectErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	let Some(status) = ProjectStatus::parse(&payload.status) else {
		return (
			StatusCode::BAD_REQUEST,
			Json(ProjectErrorResponse {
				error: "invalid_status".to_string(),
				message: "Status must be one of: backlog, in_progress, review, done".to_string(),
			}),
		)
			.into_response();
	};

	match state
		.project_repo
		.update_status(&company_id, &project_id, status, payload.position)
		.await
	{
		Ok(Some(project)) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::ProjectModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("project", project.id.to_string())
					.details(serde_json::json!({
						"action": "moved",
						"status": status.to_string(),
						"position": payload.position,
					}))
					.build(),
			);
			tracing::info!(
				actor_id = %current_user.user.id,
				project_id = %project.id,
				status = %status,
				"Project moved"
			);
			(StatusCode::OK, Json(project_response(&project))).into_response()
		}
		Ok(None) => project_not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to move project");
			internal_error()
		}
	}
}

/// Delete a project.
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/projects/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted", body = ProjectSuccessResponse),
        (status = 401, description = "Not authenticated", body = ProjectErrorResponse),
        (status = 404, description = "Project not found", body = ProjectErrorResponse)
    ),
    tag = "projects"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id, project_id = %project_id))]
pub async fn delete_project(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, project_id)): Path<(String, String)>,
) -> impl IntoResponse {
	let company_id = parse_id!(ProjectErrorResponse, parse_company_id(&company_id));
	let project_id = parse_id!(ProjectErrorResponse, parse_project_id(&project_id));
	if let Err(resp) =
		require_member::<ProjectErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	match state.project_repo.delete_project(&company_id, &project_id).await {
		Ok(true) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::ProjectModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("project", project_id.to_string())
					.details(serde_json::json!({ "action": "deleted" }))
					.build(),
			);
			(
				StatusCode::OK,
				Json(ProjectSuccessResponse {
					message: "Project deleted".to_string(),
				}),
			)
				.into_response()
		}
		Ok(false) => project_not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to delete project");
			internal_error()
		}
	}
}
