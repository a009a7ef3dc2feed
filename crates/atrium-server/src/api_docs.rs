// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! OpenAPI documentation assembly.

use utoipa::OpenApi;

use atrium_server_api::{auth, clients, companies, files, invitations, projects};

use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health_check,
		routes::auth::register,
		routes::auth::verify_email,
		routes::auth::login,
		routes::auth::logout,
		routes::auth::me,
		routes::companies::create_company,
		routes::companies::list_companies,
		routes::companies::get_company,
		routes::companies::list_members,
		routes::companies::remove_member,
		routes::invitations::list_invitations,
		routes::invitations::create_invitation,
		routes::invitations::resend_invitation,
		routes::invitations::cancel_invitation,
		routes::invitations::accept_invitation,
		routes::invitations::get_invitation,
		routes::clients::list_clients,
		routes::clients::create_client,
		routes::clients::update_client,
		routes::clients::delete_client,
		routes::projects::list_projects,
		routes::projects::create_project,
		routes::projects::update_project,
		routes::projects::move_project,
		routes::projects::delete_project,
		routes::files::list_files,
		routes::files::create_file,
		routes::files::rename_file,
		routes::files::delete_file,
	),
	components(schemas(
		auth::RegisterRequest,
		auth::RegisterResponse,
		auth::LoginRequest,
		auth::LoginResponse,
		auth::MeResponse,
		auth::AuthSuccessResponse,
		auth::AuthErrorResponse,
		companies::CreateCompanyRequest,
		companies::CompanyResponse,
		companies::ListCompaniesResponse,
		companies::MemberResponse,
		companies::ListMembersResponse,
		companies::CompanySuccessResponse,
		companies::CompanyErrorResponse,
		invitations::InvitationResponse,
		invitations::ListInvitationsResponse,
		invitations::CreateInvitationRequest,
		invitations::CreateInvitationResponse,
		invitations::AcceptInvitationRequest,
		invitations::AcceptInvitationResponse,
		invitations::InvitationSuccessResponse,
		invitations::InvitationErrorResponse,
		clients::CreateClientRequest,
		clients::UpdateClientRequest,
		clients::ClientResponse,
		clients::ListClientsResponse,
		clients::ClientSuccessResponse,
		clients::ClientErrorResponse,
		projects::CreateProjectRequest,
		projects::UpdateProjectRequest,
		projects::MoveProjectRequest,
		projects::ProjectResponse,
		projects::ListProjectsResponse,
		projects::ProjectSuccessResponse,
		projects::ProjectErrorResponse,
		files::CreateFileRequest,
		files::RenameFileRequest,
		files::FileResponse,
		files::ListFilesResponse,
		files::FileSuccessResponse,
		files::FileErrorResponse,
	)),
	tags(
		(name = "health", description = "Liveness"),
		(name = "auth", description = "Registration, verification, sessions"),
		(name = "companies", description = "Workspaces and membership"),
		(name = "invitations", description = "Workspace invitation lifecycle"),
		(name = "clients", description = "Client records"),
		(name = "projects", description = "Kanban board"),
		(name = "files", description = "File metadata"),
	)
)]
pub struct ApiDoc;
