// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Argon2 password hashing.
//!
//! Production builds use Argon2id with the library defaults (~19 MiB
//! memory, 2 iterations). Test builds use reduced-cost parameters which
//! MUST NOT be used in production.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

#[inline]
fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		use argon2::{Algorithm, Params, Version};
		// Fast, insecure parameters for tests ONLY.
		let params = Params::new(
			1024, // memory_kib: 1 MiB
			1,    // iterations
			1,    // parallelism
			None, // output length = default
		)
		.expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
	let salt = SaltString::generate(&mut OsRng);
	argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(())` on match and [`AuthError::InvalidCredentials`] on
/// mismatch; malformed stored hashes are reported as hashing errors.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
	let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
	argon2_instance()
		.verify_password(password.as_bytes(), &parsed)
		.map_err(|_| AuthError::InvalidCredentials)
}
