// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Opaque token generation and hashing.
//!
//! Tokens are the bearer credentials for sessions, email verification, and
//! workspace invitations. Only the SHA-256 hash of a token is ever stored;
//! the plaintext is handed to the recipient exactly once.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate an unpredictable opaque token.
///
/// Two concatenated random UUIDs give 256 bits of randomness in a
/// URL-safe, hex-adjacent alphabet.
pub fn generate_token() -> String {
	format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Hash a token for storage or lookup.
///
/// Returns the lowercase hex encoding of the SHA-256 digest.
pub fn hash_token(token: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(token.as_bytes());
	hex::encode(hasher.finalize())
}
