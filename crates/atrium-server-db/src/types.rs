// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Models for the CRUD entities that live inside a workspace.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use atrium_server_auth::{ClientId, CompanyId, FileId, ProjectId, UserId};

/// A client record inside a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
	pub id: ClientId,
	pub company_id: CompanyId,
	pub name: String,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub address: Option<String>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Kanban column of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
	Backlog,
	InProgress,
	Review,
	Done,
}

impl ProjectStatus {
	/// Parse a status from its stored string form.
	pub fn parse(s: &str) -> Option<ProjectStatus> {
		match s {
			"backlog" => Some(ProjectStatus::Backlog),
			"in_progress" => Some(ProjectStatus::InProgress),
			"review" => Some(ProjectStatus::Review),
			"done" => Some(ProjectStatus::Done),
			_ => None,
		}
	}

	/// Returns all status values in board order.
	pub fn all() -> &'static [ProjectStatus] {
		&[
			ProjectStatus::Backlog,
			ProjectStatus::InProgress,
			ProjectStatus::Review,
			ProjectStatus::Done,
		]
	}
}

impl fmt::Display for ProjectStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProjectStatus::Backlog => write!(f, "backlog"),
			ProjectStatus::InProgress => write!(f, "in_progress"),
			ProjectStatus::Review => write!(f, "review"),
			ProjectStatus::Done => write!(f, "done"),
		}
	}
}

/// A project on the workspace Kanban board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
	pub id: ProjectId,
	pub company_id: CompanyId,
	pub client_id: Option<ClientId>,
	pub title: String,
	pub description: Option<String>,
	pub status: ProjectStatus,
	/// Ordering within the status column; lower sorts first.
	pub position: i64,
	pub due_date: Option<NaiveDate>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Metadata for a stored file. The bytes themselves live in object
/// storage under `storage_key`; this layer only tracks the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
	pub id: FileId,
	pub company_id: CompanyId,
	pub project_id: Option<ProjectId>,
	pub name: String,
	pub content_type: String,
	pub size_bytes: i64,
	pub storage_key: String,
	pub uploaded_by: UserId,
	pub created_at: DateTime<Utc>,
}
