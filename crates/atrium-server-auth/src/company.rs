// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Company workspace and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CompanyId, CompanyRole, UserId};

/// A company workspace: the tenancy boundary for clients, projects,
/// files, and invitations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
	pub id: CompanyId,
	pub name: String,
	/// URL-safe unique identifier.
	pub slug: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl Company {
	/// Create a new workspace.
	pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: CompanyId::generate(),
			name: name.into(),
			slug: slug.into(),
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}
}

/// A user's membership in a company workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMembership {
	pub company_id: CompanyId,
	pub user_id: UserId,
	pub role: CompanyRole,
	pub created_at: DateTime<Utc>,
}
