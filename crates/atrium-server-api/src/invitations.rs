// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct InvitationResponse {
	pub id: String,
	pub company_id: String,
	pub company_name: String,
	pub email: String,
	pub status: String,
	pub invited_by: String,
	pub invited_by_name: String,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	pub is_expired: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListInvitationsResponse {
	pub invitations: Vec<InvitationResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvitationRequest {
	pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateInvitationResponse {
	pub id: String,
	pub email: String,
	pub status: String,
	pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptInvitationRequest {
	pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptInvitationResponse {
	pub company_id: String,
	pub company_name: String,
	pub role: String,
	/// True when this call created the membership; false when the caller
	/// was already a member and the accept was an idempotent success.
	pub joined: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvitationSuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvitationErrorResponse {
	pub error: String,
	pub message: String,
}
