// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Atrium workspace server.
//!
//! This crate provides the HTTP server for the Atrium multi-tenant
//! workspace application: authentication, company workspaces and
//! memberships, the invitation lifecycle, and the client/project/file
//! CRUD surface, persisted to SQLite.

pub mod api;
pub mod api_docs;
pub mod api_response;
pub mod auth_middleware;
pub mod db;
pub mod error;
pub mod routes;
pub mod validation;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use atrium_server_config::ServerConfig;
pub use error::ServerError;
