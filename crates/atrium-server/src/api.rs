// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use atrium_server_audit::{AuditService, SqliteAuditSink};
use atrium_server_auth::AuthConfig;
use atrium_server_config::ServerConfig;
use atrium_server_db::{
	ClientRepository, CompanyRepository, FileRepository, InvitationRepository, ProjectRepository,
	SessionRepository, UserRepository,
};
use atrium_server_email::{EmailService, LogMailer, Mailer};
use atrium_server_invitations::{
	InvitationLifecycle, LifecycleConfig, RandomTokenSource, SystemClock,
};

use crate::api_docs::ApiDoc;
use crate::routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub user_repo: Arc<UserRepository>,
	pub session_repo: Arc<SessionRepository>,
	pub company_repo: Arc<CompanyRepository>,
	pub invitation_repo: Arc<InvitationRepository>,
	pub client_repo: Arc<ClientRepository>,
	pub project_repo: Arc<ProjectRepository>,
	pub file_repo: Arc<FileRepository>,
	/// The invitation state machine; handlers never touch invitation rows
	/// directly.
	pub invitations: Arc<InvitationLifecycle>,
	pub email_service: Arc<EmailService>,
	pub audit_service: Arc<AuditService>,
	pub auth_config: AuthConfig,
	pub verification_ttl_hours: i64,
	pub base_url: String,
}

/// Creates the application state, wiring the invitation lifecycle to its
/// SQLite store, the company-role permission oracle, and the email
/// service.
///
/// `mailer` overrides the transport; `None` falls back to [`LogMailer`]
/// for deployments without outbound mail.
pub fn create_app_state(
	pool: SqlitePool,
	config: &ServerConfig,
	mailer: Option<Arc<dyn Mailer>>,
) -> AppState {
	let user_repo = Arc::new(UserRepository::new(pool.clone()));
	let session_repo = Arc::new(SessionRepository::new(pool.clone()));
	let company_repo = Arc::new(CompanyRepository::new(pool.clone()));
	let invitation_repo = Arc::new(InvitationRepository::new(pool.clone()));
	let client_repo = Arc::new(ClientRepository::new(pool.clone()));
	let project_repo = Arc::new(ProjectRepository::new(pool.clone()));
	let file_repo = Arc::new(FileRepository::new(pool.clone()));

	let email_service = Arc::new(EmailService::new(
		mailer.unwrap_or_else(|| Arc::new(LogMailer)),
		config.http.base_url.clone(),
		config.invitations.ttl_days,
	));

	let invitations = Arc::new(InvitationLifecycle::new(
		Arc::clone(&invitation_repo) as _,
		Arc::clone(&company_repo) as _,
		Arc::clone(&email_service) as _,
		Arc::new(SystemClock),
		Arc::new(RandomTokenSource),
		LifecycleConfig {
			ttl_days: config.invitations.ttl_days,
		},
	));

	let audit_service = Arc::new(AuditService::new(
		10000,
		vec![Arc::new(SqliteAuditSink::new(pool.clone())) as _],
	));

	let auth_config = AuthConfig {
		session_ttl_hours: config.auth.session_ttl_hours,
		..AuthConfig::default()
	};

	AppState {
		pool,
		user_repo,
		session_repo,
		company_repo,
		invitation_repo,
		client_repo,
		project_repo,
		file_repo,
		invitations,
		email_service,
		audit_service,
		auth_config,
		verification_ttl_hours: config.auth.verification_ttl_hours,
		base_url: config.http.base_url.clone(),
	}
}

/// Assemble the full router.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		// Health
		.route("/health", get(routes::health::health_check))
		// Auth (public)
		.route("/auth/register", post(routes::auth::register))
		.route("/auth/login", post(routes::auth::login))
		.route("/auth/logout", post(routes::auth::logout))
		.route("/auth/verify-email", get(routes::auth::verify_email))
		.route("/api/me", get(routes::auth::me))
		// Companies
		.route(
			"/api/companies",
			post(routes::companies::create_company).get(routes::companies::list_companies),
		)
		.route(
			"/api/companies/{company_id}",
			get(routes::companies::get_company),
		)
		.route(
			"/api/companies/{company_id}/members",
			get(routes::companies::list_members),
		)
		.route(
			"/api/companies/{company_id}/members/{user_id}",
			delete(routes::companies::remove_member),
		)
		// Invitations
		.route(
			"/api/companies/{company_id}/invitations",
			get(routes::invitations::list_invitations)
				.post(routes::invitations::create_invitation),
		)
		.route(
			"/api/companies/{company_id}/invitations/{id}",
			delete(routes::invitations::cancel_invitation),
		)
		.route(
			"/api/companies/{company_id}/invitations/{id}/resend",
			post(routes::invitations::resend_invitation),
		)
		.route(
			"/api/invitations/accept",
			post(routes::invitations::accept_invitation),
		)
		// Public invitation preview (token acts as the credential)
		.route(
			"/api/invitations/{token}",
			get(routes::invitations::get_invitation),
		)
		// Clients
		.route(
			"/api/companies/{company_id}/clients",
			get(routes::clients::list_clients).post(routes::clients::create_client),
		)
		.route(
			"/api/companies/{company_id}/clients/{id}",
			patch(routes::clients::update_client).delete(routes::clients::delete_client),
		)
		// Projects (Kanban board)
		.route(
			"/api/companies/{company_id}/projects",
			get(routes::projects::list_projects).post(routes::projects::create_project),
		)
		.route(
			"/api/companies/{company_id}/projects/{id}",
			patch(routes::projects::update_project).delete(routes::projects::delete_project),
		)
		.route(
			"/api/companies/{company_id}/projects/{id}/status",
			patch(routes::projects::move_project),
		)
		// Files (metadata only)
		.route(
			"/api/companies/{company_id}/files",
			get(routes::files::list_files).post(routes::files::create_file),
		)
		.route(
			"/api/companies/{company_id}/files/{id}",
			patch(routes::files::rename_file).delete(routes::files::delete_file),
		)
		.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use axum::body::Body;
	use http::{header, Request, StatusCode};
	use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
	use std::str::FromStr;
	use std::sync::Mutex;
	use tower::util::ServiceExt;

	use atrium_server_email::EmailError;

	/// Captures rendered emails so tests can pull tokens out of the links.
	#[derive(Default)]
	struct CapturingMailer {
		bodies: Mutex<Vec<(String, String)>>,
	}

	impl CapturingMailer {
		fn token_sent_to(&self, email: &str) -> Option<String> {
			let bodies = self.bodies.lock().unwrap();
			bodies
				.iter()
				.rev()
				.find(|(to, _)| to == email)
				.and_then(|(_, body)| {
					let start = body.find("?token=")? + "?token=".len();
					let rest = &body[start..];
					let end = rest
						.find(char::is_whitespace)
						.unwrap_or(rest.len());
					Some(rest[..end].to_string())
				})
		}
	}

	#[async_trait]
	impl Mailer for CapturingMailer {
		async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<String, EmailError> {
			self.bodies
				.lock()
				.unwrap()
				.push((to.to_string(), body.to_string()));
			Ok("msg".to_string())
		}
	}

	struct TestServer {
		router: Router,
		mailer: Arc<CapturingMailer>,
		pool: SqlitePool,
	}

	async fn test_server() -> TestServer {
		let options = SqliteConnectOptions::from_str(":memory:")
			.unwrap()
			.create_if_missing(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect_with(options)
			.await
			.unwrap();
		crate::db::run_migrations(&pool).await.unwrap();

		let config = ServerConfig::default();
		let mailer = Arc::new(CapturingMailer::default());
		let state = create_app_state(
			pool.clone(),
			&config,
			Some(Arc::clone(&mailer) as Arc<dyn Mailer>),
		);
		TestServer {
			router: create_router(state),
			mailer,
			pool,
		}
	}

	async fn send_json(
		router: &Router,
		method: &str,
		uri: &str,
		cookie: Option<&str>,
		body: Option<serde_json::Value>,
	) -> (StatusCode, Option<String>, serde_json::Value) {
		let mut builder = Request::builder().method(method).uri(uri);
		if let Some(cookie) = cookie {
			builder = builder.header(header::COOKIE, cookie);
		}
		let request = match body {
			Some(json) => builder
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(json.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};

		let response = router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let set_cookie = response
			.headers()
			.get(header::SET_COOKIE)
			.and_then(|v| v.to_str().ok())
			.map(|v| v.split(';').next().unwrap_or_default().to_string());
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let json = if bytes.is_empty() {
			serde_json::Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
		};
		(status, set_cookie, json)
	}

	async fn register_and_login(server: &TestServer, name: &str, email: &str) -> String {
		let (status, _, _) = send_json(
			&server.router,
			"POST",
			"/auth/register",
			None,
			Some(serde_json::json!({
				"display_name": name,
				"email": email,
				"password": "correct-horse-battery",
			})),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);

		let token = server.mailer.token_sent_to(email).expect("verification email");
		let (status, _, _) = send_json(
			&server.router,
			"GET",
			&format!("/auth/verify-email?token={token}"),
			None,
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);

		let (status, cookie, _) = send_json(
			&server.router,
			"POST",
			"/auth/login",
			None,
			Some(serde_json::json!({
				"email": email,
				"password": "correct-horse-battery",
			})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		cookie.expect("session cookie")
	}

	async fn create_company(server: &TestServer, cookie: &str, slug: &str) -> String {
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/api/companies",
			Some(cookie),
			Some(serde_json::json!({ "name": "Acme Corp", "slug": slug })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		body["id"].as_str().unwrap().to_string()
	}

	#[tokio::test]
	async fn health_endpoint_reports_ok() {
		let server = test_server().await;
		let (status, _, body) = send_json(&server.router, "GET", "/health", None, None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}

	#[tokio::test]
	async fn register_verify_login_me_roundtrip() {
		let server = test_server().await;
		let cookie = register_and_login(&server, "Alice", "alice@example.com").await;

		let (status, _, body) =
			send_json(&server.router, "GET", "/api/me", Some(&cookie), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["email"], "alice@example.com");
		assert_eq!(body["email_verified"], true);
	}

	#[tokio::test]
	async fn unauthenticated_requests_are_rejected() {
		let server = test_server().await;
		let (status, _, body) = send_json(&server.router, "GET", "/api/me", None, None).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["error"], "auth_required");
	}

	#[tokio::test]
	async fn login_with_wrong_password_fails_generically() {
		let server = test_server().await;
		register_and_login(&server, "Alice", "alice@example.com").await;

		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/auth/login",
			None,
			Some(serde_json::json!({
				"email": "alice@example.com",
				"password": "wrong-password-entirely",
			})),
		)
		.await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["error"], "invalid_credentials");
	}

	#[tokio::test]
	async fn invitation_flow_end_to_end() {
		let server = test_server().await;
		let admin_cookie = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &admin_cookie, "acme").await;

		// Invite bob, who has no account yet.
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations"),
			Some(&admin_cookie),
			Some(serde_json::json!({ "email": "bob@example.com" })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["status"], "pending");

		// A second pending invitation for the same email is rejected.
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations"),
			Some(&admin_cookie),
			Some(serde_json::json!({ "email": "bob@example.com" })),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "duplicate_pending");

		let invite_token = server
			.mailer
			.token_sent_to("bob@example.com")
			.expect("invitation email");

		// Accepting before bob registers requires registration.
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/api/invitations/accept",
			None,
			Some(serde_json::json!({ "token": invite_token })),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "registration_required");

		// Bob registers, verifies, logs in, and accepts.
		let bob_cookie = register_and_login(&server, "Bob", "bob@example.com").await;
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/api/invitations/accept",
			Some(&bob_cookie),
			Some(serde_json::json!({ "token": invite_token })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["joined"], true);
		assert_eq!(body["company_name"], "Acme Corp");

		// Double-submit: idempotent success, no second membership.
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/api/invitations/accept",
			Some(&bob_cookie),
			Some(serde_json::json!({ "token": invite_token })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["joined"], false);

		let count: (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM company_memberships WHERE company_id = ?",
		)
		.bind(&company_id)
		.fetch_one(&server.pool)
		.await
		.unwrap();
		assert_eq!(count.0, 2, "owner plus bob, nothing else");

		// Bob is a plain member, so he cannot invite.
		let (status, _, _) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations"),
			Some(&bob_cookie),
			Some(serde_json::json!({ "email": "carol@example.com" })),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn cancelled_invitation_cannot_be_accepted() {
		let server = test_server().await;
		let admin_cookie = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &admin_cookie, "acme").await;

		let (_, _, body) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations"),
			Some(&admin_cookie),
			Some(serde_json::json!({ "email": "bob@example.com" })),
		)
		.await;
		let invitation_id = body["id"].as_str().unwrap().to_string();
		let invite_token = server.mailer.token_sent_to("bob@example.com").unwrap();

		let (status, _, _) = send_json(
			&server.router,
			"DELETE",
			&format!("/api/companies/{company_id}/invitations/{invitation_id}"),
			Some(&admin_cookie),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);

		let bob_cookie = register_and_login(&server, "Bob", "bob@example.com").await;
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/api/invitations/accept",
			Some(&bob_cookie),
			Some(serde_json::json!({ "token": invite_token })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "cancelled");
	}

	#[tokio::test]
	async fn resend_rotates_the_token() {
		let server = test_server().await;
		let admin_cookie = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &admin_cookie, "acme").await;

		let (_, _, body) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations"),
			Some(&admin_cookie),
			Some(serde_json::json!({ "email": "bob@example.com" })),
		)
		.await;
		let invitation_id = body["id"].as_str().unwrap().to_string();
		let old_token = server.mailer.token_sent_to("bob@example.com").unwrap();

		let (status, _, _) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations/{invitation_id}/resend"),
			Some(&admin_cookie),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);

		let new_token = server.mailer.token_sent_to("bob@example.com").unwrap();
		assert_ne!(old_token, new_token);

		let bob_cookie = register_and_login(&server, "Bob", "bob@example.com").await;
		let (status, _, body) = send_json(
			&server.router,
			"POST",
			"/api/invitations/accept",
			Some(&bob_cookie),
			Some(serde_json::json!({ "token": old_token })),
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "not_found");

		let (status, _, _) = send_json(
			&server.router,
			"POST",
			"/api/invitations/accept",
			Some(&bob_cookie),
			Some(serde_json::json!({ "token": new_token })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
	}

	#[tokio::test]
	async fn invitation_preview_is_public() {
		let server = test_server().await;
		let admin_cookie = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &admin_cookie, "acme").await;

		send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/invitations"),
			Some(&admin_cookie),
			Some(serde_json::json!({ "email": "bob@example.com" })),
		)
		.await;
		let token = server.mailer.token_sent_to("bob@example.com").unwrap();

		let (status, _, body) = send_json(
			&server.router,
			"GET",
			&format!("/api/invitations/{token}"),
			None,
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["company_name"], "Acme Corp");
		assert_eq!(body["email"], "bob@example.com");
		assert_eq!(body["is_expired"], false);
	}

	#[tokio::test]
	async fn kanban_move_round_trip() {
		let server = test_server().await;
		let cookie = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &cookie, "acme").await;

		let (status, _, body) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/projects"),
			Some(&cookie),
			Some(serde_json::json!({ "title": "Launch site" })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["status"], "backlog");
		let project_id = body["id"].as_str().unwrap().to_string();

		let (status, _, body) = send_json(
			&server.router,
			"PATCH",
			&format!("/api/companies/{company_id}/projects/{project_id}/status"),
			Some(&cookie),
			Some(serde_json::json!({ "status": "in_progress", "position": 2 })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "in_progress");
		assert_eq!(body["position"], 2);

		let (status, _, body) = send_json(
			&server.router,
			"PATCH",
			&format!("/api/companies/{company_id}/projects/{project_id}/status"),
			Some(&cookie),
			Some(serde_json::json!({ "status": "archived" })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "invalid_status");
	}

	#[tokio::test]
	async fn client_inline_edit_round_trip() {
		let server = test_server().await;
		let cookie = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &cookie, "acme").await;

		let (status, _, body) = send_json(
			&server.router,
			"POST",
			&format!("/api/companies/{company_id}/clients"),
			Some(&cookie),
			Some(serde_json::json!({ "name": "Globex", "email": "ops@globex.com" })),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		let client_id = body["id"].as_str().unwrap().to_string();

		// Patch one field; clear another with an explicit null.
		let (status, _, body) = send_json(
			&server.router,
			"PATCH",
			&format!("/api/companies/{company_id}/clients/{client_id}"),
			Some(&cookie),
			Some(serde_json::json!({ "phone": "555-0100", "email": null })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["phone"], "555-0100");
		assert_eq!(body["email"], serde_json::Value::Null);
		assert_eq!(body["name"], "Globex");
	}

	#[tokio::test]
	async fn workspace_data_is_invisible_to_non_members() {
		let server = test_server().await;
		let alice = register_and_login(&server, "Alice", "alice@example.com").await;
		let company_id = create_company(&server, &alice, "acme").await;

		let mallory = register_and_login(&server, "Mallory", "mallory@example.com").await;
		let (status, _, body) = send_json(
			&server.router,
			"GET",
			&format!("/api/companies/{company_id}/clients"),
			Some(&mallory),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "not_found");
	}
}
