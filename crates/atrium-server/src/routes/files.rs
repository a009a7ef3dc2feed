// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! File-metadata HTTP handlers. The byte pipeline lives in object
//! storage; these endpoints only manage the records.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use chrono::Utc;

use atrium_server_audit::{AuditEventType, AuditLogBuilder, UserId as AuditUserId};
use atrium_server_auth::FileId;
use atrium_server_db::FileRecord;

pub use atrium_server_api::files::*;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	impl_api_error_response, parse_id,
	routes::require_member,
	validation::{parse_company_id, parse_file_id, parse_project_id},
};

impl_api_error_response!(FileErrorResponse);

fn file_response(file: &FileRecord) -> FileResponse {
	FileResponse {
		id: file.id.to_string(),
		company_id: file.company_id.to_string(),
		project_id: file.project_id.map(|p| p.to_string()),
		name: file.name.clone(),
		content_type: file.content_type.clone(),
		size_bytes: file.size_bytes,
		storage_key: file.storage_key.clone(),
		uploaded_by: file.uploaded_by.to_string(),
		created_at: file.created_at,
	}
}

fn internal_error() -> axum::response::Response {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(FileErrorResponse {
			error: "internal_error".to_string(),
			message: "Something went wrong".to_string(),
		}),
	)
		.into_response()
}

fn file_not_found() -> axum::response::Response {
	(
		StatusCode::NOT_FOUND,
		Json(FileErrorResponse {
			error: "not_found".to_string(),
			message: "File not found".to_string(),
		}),
	)
		.into_response()
}

/// List file records in a workspace.
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/files",
    params(("company_id" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "File list", body = ListFilesResponse),
        (status = 401, description = "Not authenticated", body = FileErrorResponse),
        (status = 404, description = "Company not found", body = FileErrorResponse)
    ),
    tag = "files"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn list_files(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
) -> impl IntoResponse {
	let company_id = parse_id!(FileErrorResponse, parse_company_id(&company_id));
	if let Err(resp) =
		require_member::<FileErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	match state.file_repo.list_files(&company_id).await {
		Ok(files) => (
			StatusCode::OK,
			Json(ListFilesResponse {
				files: files.iter().map(file_response).collect(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to list files");
			internal_error()
		}
	}
}

/// Register a file's metadata after upload.
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/files",
    params(("company_id" = String, Path, description = "Company ID")),
    request_body = CreateFileRequest,
    responses(
        (status = 201, description = "File record created", body = FileResponse),
        (status = 400, description = "Invalid request", body = FileErrorResponse),
        (status = 401, description = "Not authenticated", body = FileErrorResponse),
        (status = 404, description = "Company not found", body = FileErrorResponse)
    ),
    tag = "files"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn create_file(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
	Json(payload): Json<CreateFileRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(FileErrorResponse, parse_company_id(&company_id));
	if let Err(resp) =
		require_member::<FileErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	if payload.name.trim().is_empty() || payload.storage_key.trim().is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(FileErrorResponse {
				error: "invalid_request".to_string(),
				message: "File name and storage key are required".to_string(),
			}),
		)
			.into_response();
	}
	if payload.size_bytes < 0 {
		return (
			StatusCode::BAD_REQUEST,
			Json(FileErrorResponse {
				error: "invalid_request".to_string(),
				message: "File size cannot be negative".to_string(),
			}),
		)
			.into_response();
	}

	let project_id = match payload.project_id.as_deref() {
		Some(raw) => Some(parse_id!(FileErrorResponse, parse_project_id(raw))),
		None => None,
	};

	let file = FileRecord {
		id: FileId::generate(),
		company_id,
		project_id,
		name: payload.name.trim().to_string(),
		content_type: payload.content_type,
		size_bytes: payload.size_bytes,
		storage_key: payload.storage_key,
		uploaded_by: current_user.user.id,
		created_at: Utc::now(),
	};

	if let Err(e) = state.file_repo.create_file(&file).await {
		tracing::error!(error = %e, "Failed to create file record");
		return internal_error();
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::FileModified)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("file", file.id.to_string())
			.details(serde_json::json!({ "action": "created", "name": &file.name }))
			.build(),
	);

	(StatusCode::CREATED, Json(file_response(&file))).into_response()
}

/// Rename a file record.
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/files/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "File ID")
    ),
    request_body = RenameFileRequest,
    responses(
        (status = 200, description = "File renamed", body = FileResponse),
        (status = 400, description = "Invalid name", body = FileErrorResponse),
        (status = 401, description = "Not authenticated", body = FileErrorResponse),
        (status = 404, description = "File not found", body = FileErrorResponse)
    ),
    tag = "files"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id, file_id = %file_id))]
pub async fn rename_file(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, file_id)): Path<(String, String)>,
	Json(payload): Json<RenameFileRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(FileErrorResponse, parse_company_id(&company_id));
	let file_id = parse_id!(FileErrorResponse, parse_file_id(&file_id));
	if let Err(resp) =
		require_member::<FileErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	let name = payload.name.trim();
	if name.is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(FileErrorResponse {
				error: "invalid_name".to_string(),
				message: "Enter a file name".to_string(),
			}),
		)
			.into_response();
	}

	match state.file_repo.rename_file(&company_id, &file_id, name).await {
		Ok(Some(file)) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::FileModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("file", file.id.to_string())
					.details(serde_json::json!({ "action": "renamed", "name": &file.name }))
					.build(),
			);
			(StatusCode::OK, Json(file_response(&file))).into_response()
		}
		Ok(None) => file_not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to rename file");
			internal_error()
		}
	}
}

/// Delete a file record.
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/files/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File record deleted", body = FileSuccessResponse),
        (status = 401, description = "Not authenticated", body = FileErrorResponse),
        (status = 404, description = "File not found", body = FileErrorResponse)
    ),
    tag = "files"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id, file_id = %file_id))]
pub async fn delete_file(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, file_id)): Path<(String, String)>,
) -> impl IntoResponse {
	let company_id = parse_id!(FileErrorResponse, parse_company_id(&company_id));
	let file_id = parse_id!(FileErrorResponse, parse_file_id(&file_id));
	if let Err(resp) =
		require_member::<FileErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	match state.file_repo.delete_file(&company_id, &file_id).await {
		Ok(true) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::FileModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("file", file_id.to_string())
					.details(serde_json::json!({ "action": "deleted" }))
					.build(),
			);
			(
				StatusCode::OK,
				Json(FileSuccessResponse {
					message: "File deleted".to_string(),
				}),
			)
				.into_response()
		}
		Ok(false) => file_not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to delete file");
			internal_error()
		}
	}
}
