// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client record HTTP handlers. Any workspace member can manage clients.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use chrono::Utc;

use atrium_server_audit::{AuditEventType, AuditLogBuilder, UserId as AuditUserId};
use atrium_server_auth::ClientId;
use atrium_server_db::{Client, ClientPatch};

pub use atrium_server_api::clients::*;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	impl_api_error_response, parse_id,
	routes::require_member,
	validation::{parse_client_id, parse_company_id},
};

impl_api_error_response!(ClientErrorResponse);

fn client_response(client: &Client) -> ClientResponse {
	ClientResponse {
		id: client.id.to_string(),
		company_id: client.company_id.to_string(),
		name: client.name.clone(),
		email: client.email.clone(),
		phone: client.phone.clone(),
		address: client.address.clone(),
		notes: client.notes.clone(),
		created_at: client.created_at,
		updated_at: client.updated_at,
	}
}

fn internal_error() -> axum::response::Response {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(ClientErrorResponse {
			error: "internal_error".to_string(),
			message: "Something went wrong".to_string(),
		}),
	)
		.into_response()
}

/// List clients in a workspace.
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/clients",
    params(("company_id" = String, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Client list", body = ListClientsResponse),
        (status = 401, description = "Not authenticated", body = ClientErrorResponse),
        (status = 404, description = "Company not found", body = ClientErrorResponse)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn list_clients(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
) -> impl IntoResponse {
	let company_id = parse_id!(ClientErrorResponse, parse_company_id(&company_id));
	if let Err(resp) =
		require_member::<ClientErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	match state.client_repo.list_clients(&company_id).await {
		Ok(clients) => (
			StatusCode::OK,
			Json(ListClientsResponse {
				clients: clients.iter().map(client_response).collect(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to list clients");
			internal_error()
		}
	}
}

/// Create a client record.
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/clients",
    params(("company_id" = String, Path, description = "Company ID")),
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Invalid request", body = ClientErrorResponse),
        (status = 401, description = "Not authenticated", body = ClientErrorResponse),
        (status = 404, description = "Company not found", body = ClientErrorResponse)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn create_client(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
	Json(payload): Json<CreateClientRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(ClientErrorResponse, parse_company_id(&company_id));
	if let Err(resp) =
		require_member::<ClientErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	let name = payload.name.trim();
	if name.is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(ClientErrorResponse {
				error: "invalid_name".to_string(),
				message: "Enter a client name".to_string(),
			}),
		)
			.into_response();
	}

	let now = Utc::now();
	let client = Client {
		id: ClientId::generate(),
		company_id,
		name: name.to_string(),
		email: payload.email,
		phone: payload.phone,
		address: payload.address,
		notes: payload.notes,
		created_at: now,
		updated_at: now,
	};

	if let Err(e) = state.client_repo.create_client(&client).await {
		tracing::error!(error = %e, "Failed to create client");
		return internal_error();
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::ClientModified)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("client", client.id.to_string())
			.details(serde_json::json!({ "action": "created" }))
			.build(),
	);

	(StatusCode::CREATED, Json(client_response(&client))).into_response()
}

/// Apply an inline edit to a client record.
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/clients/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Client ID")
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientResponse),
        (status = 401, description = "Not authenticated", body = ClientErrorResponse),
        (status = 404, description = "Client not found", body = ClientErrorResponse)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id, company_id = %company_id, client_id = %client_id))]
pub async fn update_client(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, client_id)): Path<(String, String)>,
	Json(payload): Json<UpdateClientRequest>,
) -> impl IntoResponse {
	let company_id = parse_id!(ClientErrorResponse, parse_company_id(&company_id));
	let client_id = parse_id!(ClientErrorResponse, parse_client_id(&client_id));
	if let Err(resp) =
		require_member::<ClientErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	let patch = ClientPatch {
		name: payload.name,
		email: payload.email,
		phone: payload.phone,
		address: payload.address,
		notes: payload.notes,
	};

	match state.client_repo.update_client(&company_id, &client_id, patch).await {
		Ok(Some(client)) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::ClientModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("client", client.id.to_string())
					.details(serde_json::json!({ "action": "updated" }))
					.build(),
			);
			(StatusCode::OK, Json(client_response(&client))).into_response()
		}
		Ok(None) => (
			StatusCode::NOT_FOUND,
			Json(ClientErrorResponse {
				error: "not_found".to_string(),
				message: "Client not found".to_string(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to update client");
			internal_error()
		}
	}
}

/// Delete a client record.
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/clients/{id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client deleted", body = ClientSuccessResponse),
        (status = 401, description = "Not authenticated", body = ClientErrorResponse),
        (status = 404, description = "Client not found", body = ClientErrorResponse)
    ),
    tag = "clients"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id, client_id = %client_id))]
pub async fn delete_client(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, client_id)): Path<(String, String)>,
) -> impl IntoResponse {
	let company_id = parse_id!(ClientErrorResponse, parse_company_id(&company_id));
	let client_id = parse_id!(ClientErrorResponse, parse_client_id(&client_id));
	if let Err(resp) =
		require_member::<ClientErrorResponse>(&state, &company_id, &current_user.user.id).await
	{
		return resp;
	}

	match state.client_repo.delete_client(&company_id, &client_id).await {
		Ok(true) => {
			state.audit_service.log(
				AuditLogBuilder::new(AuditEventType::ClientModified)
					.actor(AuditUserId::new(current_user.user.id.into_inner()))
					.resource("client", client_id.to_string())
					.details(serde_json::json!({ "action": "deleted" }))
					.build(),
			);
			(
				StatusCode::OK,
				Json(ClientSuccessResponse {
					message: "Client deleted".to_string(),
				}),
			)
				.into_response()
		}
		Ok(false) => (
			StatusCode::NOT_FOUND,
			Json(ClientErrorResponse {
				error: "not_found".to_string(),
				message: "Client not found".to_string(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to delete client");
			internal_error()
		}
	}
}
