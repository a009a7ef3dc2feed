// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
	pub name: String,
	pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
	pub id: String,
	pub name: String,
	pub slug: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCompaniesResponse {
	pub companies: Vec<CompanyResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
	pub user_id: String,
	pub display_name: String,
	pub email: String,
	pub role: String,
	pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMembersResponse {
	pub members: Vec<MemberResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanySuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyErrorResponse {
	pub error: String,
	pub message: String,
}
