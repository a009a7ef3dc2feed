// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Company workspace HTTP handlers.
//!
//! # Authorization Matrix
//!
//! | Endpoint          | Required Permission                  |
//! |-------------------|--------------------------------------|
//! | `create_company`  | authenticated (creator becomes owner)|
//! | `list_companies`  | authenticated (own memberships)      |
//! | `get_company`     | member                               |
//! | `list_members`    | member                               |
//! | `remove_member`   | admin, outranking the target         |

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};

use atrium_server_audit::{AuditEventType, AuditLogBuilder, UserId as AuditUserId};
use atrium_server_auth::{Company, CompanyRole};

pub use atrium_server_api::companies::*;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	impl_api_error_response, parse_id,
	validation::{parse_company_id, parse_user_id, validate_slug},
};

impl_api_error_response!(CompanyErrorResponse);

fn company_response(company: &Company) -> CompanyResponse {
	CompanyResponse {
		id: company.id.to_string(),
		name: company.name.clone(),
		slug: company.slug.clone(),
		created_at: company.created_at,
	}
}

fn internal_error() -> axum::response::Response {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(CompanyErrorResponse {
			error: "internal_error".to_string(),
			message: "Something went wrong".to_string(),
		}),
	)
		.into_response()
}

fn not_found() -> axum::response::Response {
	(
		StatusCode::NOT_FOUND,
		Json(CompanyErrorResponse {
			error: "not_found".to_string(),
			message: "Company not found".to_string(),
		}),
	)
		.into_response()
}

/// Create a company workspace; the creator becomes its owner.
#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Invalid name or slug", body = CompanyErrorResponse),
        (status = 401, description = "Not authenticated", body = CompanyErrorResponse),
        (status = 409, description = "Slug already taken", body = CompanyErrorResponse)
    ),
    tag = "companies"
)]
#[tracing::instrument(skip(state, payload), fields(actor_id = %current_user.user.id))]
pub async fn create_company(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Json(payload): Json<CreateCompanyRequest>,
) -> impl IntoResponse {
	let name = payload.name.trim();
	if name.is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(CompanyErrorResponse {
				error: "invalid_name".to_string(),
				message: "Enter a workspace name".to_string(),
			}),
		)
			.into_response();
	}
	if !validate_slug(&payload.slug, 3, 50) {
		return (
			StatusCode::BAD_REQUEST,
			Json(CompanyErrorResponse {
				error: "invalid_slug".to_string(),
				message: "Slug must be 3-50 lowercase letters, digits, or hyphens".to_string(),
			}),
		)
			.into_response();
	}

	let company = Company::new(name, &payload.slug);
	match state.company_repo.create_company(&company).await {
		Ok(()) => {}
		Err(atrium_server_db::DbError::Conflict(_)) => {
			return (
				StatusCode::CONFLICT,
				Json(CompanyErrorResponse {
					error: "slug_taken".to_string(),
					message: "That slug is already in use".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to create company");
			return internal_error();
		}
	}

	if let Err(e) = state
		.company_repo
		.add_member(&company.id, &current_user.user.id, CompanyRole::Owner)
		.await
	{
		tracing::error!(error = %e, company_id = %company.id, "Failed to add creator as owner");
		return internal_error();
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::CompanyCreated)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("company", company.id.to_string())
			.details(serde_json::json!({ "slug": &company.slug }))
			.build(),
	);

	tracing::info!(
		actor_id = %current_user.user.id,
		company_id = %company.id,
		"Company created"
	);

	(StatusCode::CREATED, Json(company_response(&company))).into_response()
}

/// List the companies the caller belongs to.
#[utoipa::path(
    get,
    path = "/api/companies",
    responses(
        (status = 200, description = "Companies the caller belongs to", body = ListCompaniesResponse),
        (status = 401, description = "Not authenticated", body = CompanyErrorResponse)
    ),
    tag = "companies"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id))]
pub async fn list_companies(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
) -> impl IntoResponse {
	match state
		.company_repo
		.list_companies_for_user(&current_user.user.id)
		.await
	{
		Ok(companies) => (
			StatusCode::OK,
			Json(ListCompaniesResponse {
				companies: companies.iter().map(company_response).collect(),
			}),
		)
			.into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to list companies");
			internal_error()
		}
	}
}

/// Get one company the caller belongs to.
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}",
    params(
        ("company_id" = String, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company details", body = CompanyResponse),
        (status = 401, description = "Not authenticated", body = CompanyErrorResponse),
        (status = 404, description = "Company not found", body = CompanyErrorResponse)
    ),
    tag = "companies"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn get_company(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
) -> impl IntoResponse {
	let company_id = parse_id!(CompanyErrorResponse, parse_company_id(&company_id));

	// Non-members see the same 404 as a missing workspace.
	match state
		.company_repo
		.get_membership(&company_id, &current_user.user.id)
		.await
	{
		Ok(Some(_)) => {}
		Ok(None) => return not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Membership lookup failed");
			return internal_error();
		}
	}

	match state.company_repo.get_company_by_id(&company_id).await {
		Ok(Some(company)) => (StatusCode::OK, Json(company_response(&company))).into_response(),
		Ok(None) => not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to get company");
			internal_error()
		}
	}
}

/// List members of a company the caller belongs to.
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/members",
    params(
        ("company_id" = String, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Member list", body = ListMembersResponse),
        (status = 401, description = "Not authenticated", body = CompanyErrorResponse),
        (status = 404, description = "Company not found", body = CompanyErrorResponse)
    ),
    tag = "companies"
)]
#[tracing::instrument(skip(state), fields(actor_id = %current_user.user.id, company_id = %company_id))]
pub async fn list_members(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path(company_id): Path<String>,
) -> impl IntoResponse {
	let company_id = parse_id!(CompanyErrorResponse, parse_company_id(&company_id));

	match state
		.company_repo
		.get_membership(&company_id, &current_user.user.id)
		.await
	{
		Ok(Some(_)) => {}
		Ok(None) => return not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Membership lookup failed");
			return internal_error();
		}
	}

	match state.company_repo.list_members(&company_id).await {
		Ok(members) => {
			let members = members
				.into_iter()
				.map(|(membership, user)| MemberResponse {
					user_id: user.id.to_string(),
					display_name: user.display_name,
					email: user.email,
					role: membership.role.to_string(),
					joined_at: membership.created_at,
				})
				.collect();
			(StatusCode::OK, Json(ListMembersResponse { members })).into_response()
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to list members");
			internal_error()
		}
	}
}

/// Remove a member from a company.
///
/// # Authorization
///
/// Requires an admin role outranking the target. The last owner cannot be
/// removed.
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/members/{user_id}",
    params(
        ("company_id" = String, Path, description = "Company ID"),
        ("user_id" = String, Path, description = "Member user ID")
    ),
    responses(
        (status = 200, description = "Member removed", body = CompanySuccessResponse),
        (status = 400, description = "Cannot remove the last owner", body = CompanyErrorResponse),
        (status = 401, description = "Not authenticated", body = CompanyErrorResponse),
        (status = 403, description = "Not authorized", body = CompanyErrorResponse),
        (status = 404, description = "Member not found", body = CompanyErrorResponse)
    ),
    tag = "companies"
)]
#[tracing::instrument(
	skip(state),
	fields(actor_id = %current_user.user.id, company_id = %company_id, target_id = %user_id)
)]
pub async fn remove_member(
	RequireAuth(current_user): RequireAuth,
	State(state): State<AppState>,
	Path((company_id, user_id)): Path<(String, String)>,
) -> impl IntoResponse {
	let company_id = parse_id!(CompanyErrorResponse, parse_company_id(&company_id));
	let target_id = parse_id!(CompanyErrorResponse, parse_user_id(&user_id));

	let actor_role = match state
		.company_repo
		.get_membership(&company_id, &current_user.user.id)
		.await
	{
		Ok(Some(membership)) => membership.role,
		Ok(None) => return not_found(),
		Err(e) => {
			tracing::error!(error = %e, "Membership lookup failed");
			return internal_error();
		}
	};

	let target_role = match state
		.company_repo
		.get_membership(&company_id, &target_id)
		.await
	{
		Ok(Some(membership)) => membership.role,
		Ok(None) => {
			return (
				StatusCode::NOT_FOUND,
				Json(CompanyErrorResponse {
					error: "not_found".to_string(),
					message: "Member not found".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, "Membership lookup failed");
			return internal_error();
		}
	};

	if !actor_role.has_permission_of(&CompanyRole::Admin)
		|| !actor_role.has_permission_of(&target_role)
	{
		tracing::warn!(
			actor_id = %current_user.user.id,
			target_id = %target_id,
			"Unauthorized member removal attempt"
		);
		return (
			StatusCode::FORBIDDEN,
			Json(CompanyErrorResponse {
				error: "forbidden".to_string(),
				message: "Not allowed to remove this member".to_string(),
			}),
		)
			.into_response();
	}

	if target_role == CompanyRole::Owner {
		match state.company_repo.count_owners(&company_id).await {
			Ok(1) => {
				return (
					StatusCode::BAD_REQUEST,
					Json(CompanyErrorResponse {
						error: "last_owner".to_string(),
						message: "A workspace must keep at least one owner".to_string(),
					}),
				)
					.into_response();
			}
			Ok(_) => {}
			Err(e) => {
				tracing::error!(error = %e, "Owner count failed");
				return internal_error();
			}
		}
	}

	match state.company_repo.remove_member(&company_id, &target_id).await {
		Ok(true) => {}
		Ok(false) => {
			return (
				StatusCode::NOT_FOUND,
				Json(CompanyErrorResponse {
					error: "not_found".to_string(),
					message: "Member not found".to_string(),
				}),
			)
				.into_response();
		}
		Err(e) => {
			tracing::error!(error = %e, "Failed to remove member");
			return internal_error();
		}
	}

	state.audit_service.log(
		AuditLogBuilder::new(AuditEventType::MemberRemoved)
			.actor(AuditUserId::new(current_user.user.id.into_inner()))
			.resource("company", company_id.to_string())
			.details(serde_json::json!({ "target_user_id": target_id.to_string() }))
			.build(),
	);

	tracing::info!(
		actor_id = %current_user.user.id,
		target_id = %target_id,
		company_id = %company_id,
		"Member removed"
	);

	(
		StatusCode::OK,
		Json(CompanySuccessResponse {
			message: "Member removed".to_string(),
		}),
	)
		.into_response()
}
