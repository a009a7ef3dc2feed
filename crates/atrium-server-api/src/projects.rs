// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::patch::double_option;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub due_date: Option<NaiveDate>,
}

/// Partial update. Absent fields are untouched; an explicit `null` clears
/// the field.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<String>)]
	pub description: Option<Option<String>>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<String>)]
	pub client_id: Option<Option<String>>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<NaiveDate>)]
	pub due_date: Option<Option<NaiveDate>>,
}

/// Server side of a Kanban drag: target column and position.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveProjectRequest {
	pub status: String,
	#[serde(default)]
	pub position: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
	pub id: String,
	pub company_id: String,
	pub client_id: Option<String>,
	pub title: String,
	pub description: Option<String>,
	pub status: String,
	pub position: i64,
	pub due_date: Option<NaiveDate>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProjectsResponse {
	pub projects: Vec<ProjectResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectSuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectErrorResponse {
	pub error: String,
	pub message: String,
}
