// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
	pub display_name: String,
	pub email: String,
	pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
	pub user_id: String,
	pub email: String,
	/// Verification email was dispatched to this address.
	pub verification_sent: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
	pub user_id: String,
	pub display_name: String,
	pub email: String,
	pub email_verified: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
	pub user_id: String,
	pub display_name: String,
	pub email: String,
	pub email_verified: bool,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthSuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthErrorResponse {
	pub error: String,
	pub message: String,
}
