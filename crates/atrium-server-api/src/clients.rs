// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::patch::double_option;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClientRequest {
	pub name: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub notes: Option<String>,
}

/// Inline-edit patch. Absent fields are untouched; an explicit `null`
/// clears the field.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateClientRequest {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<String>)]
	pub email: Option<Option<String>>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<String>)]
	pub phone: Option<Option<String>>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<String>)]
	pub address: Option<Option<String>>,
	#[serde(default, deserialize_with = "double_option")]
	#[schema(value_type = Option<String>)]
	pub notes: Option<Option<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientResponse {
	pub id: String,
	pub company_id: String,
	pub name: String,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub address: Option<String>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListClientsResponse {
	pub clients: Vec<ClientResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientSuccessResponse {
	pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientErrorResponse {
	pub error: String,
	pub message: String,
}
