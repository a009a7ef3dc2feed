// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use atrium_server_db::DbError;

/// Top-level server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("Repository error: {0}")]
	Repository(#[from] DbError),

	#[error("Configuration error: {0}")]
	Config(#[from] atrium_server_config::ConfigError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}
