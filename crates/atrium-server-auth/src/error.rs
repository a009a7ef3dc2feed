// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Errors produced by authentication primitives.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Invalid credentials")]
	InvalidCredentials,

	#[error("Password hashing failed: {0}")]
	Hashing(String),

	#[error("Session expired or invalid")]
	SessionInvalid,
}
