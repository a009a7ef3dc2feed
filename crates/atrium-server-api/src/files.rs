// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Register a file's metadata after its bytes were placed in object
/// storage. The upload pipeline itself is outside this API.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFileRequest {
	pub name: String,
	pub content_type: String,
	pub size_bytes: i64,
	pub storage_key: String,
	#[serde(default)]
	pub project_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameFileRequest {
	pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
	pub id: String,
	pub company_id: String,
	pub project_id: Option<String>,
	pub name: String,
	pub content_type: String,
	pub size_bytes: i64,
	pub storage_key: String,
	pub uploaded_by: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListFilesResponse {
	pub files: Vec<FileResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileSuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileErrorResponse {
	pub error: String,
	pub message: String,
}
