// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a runtime struct and a partial layer
//! with `merge`/`finalize`.

use serde::Deserialize;

use crate::error::ConfigError;

// =============================================================================
// HTTP
// =============================================================================

/// HTTP configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Absolute base URL used in links embedded in emails.
	pub base_url: String,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8080,
			base_url: "http://127.0.0.1:8080".to_string(),
		}
	}
}

/// HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub base_url: Option<String>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let defaults = HttpConfig::default();
		HttpConfig {
			host: self.host.unwrap_or(defaults.host),
			port: self.port.unwrap_or(defaults.port),
			base_url: self.base_url.unwrap_or(defaults.base_url),
		}
	}
}

// =============================================================================
// Database
// =============================================================================

/// Database configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./atrium.db".to_string(),
		}
	}
}

/// Database configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| "sqlite:./atrium.db".to_string()),
		}
	}
}

// =============================================================================
// Auth
// =============================================================================

/// Authentication configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Session lifetime in hours.
	pub session_ttl_hours: i64,
	/// Verification-link lifetime in hours.
	pub verification_ttl_hours: i64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			session_ttl_hours: 24 * 30,
			verification_ttl_hours: 48,
		}
	}
}

/// Auth configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub session_ttl_hours: Option<i64>,
	#[serde(default)]
	pub verification_ttl_hours: Option<i64>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.session_ttl_hours.is_some() {
			self.session_ttl_hours = other.session_ttl_hours;
		}
		if other.verification_ttl_hours.is_some() {
			self.verification_ttl_hours = other.verification_ttl_hours;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		let defaults = AuthConfig::default();
		AuthConfig {
			session_ttl_hours: self.session_ttl_hours.unwrap_or(defaults.session_ttl_hours),
			verification_ttl_hours: self
				.verification_ttl_hours
				.unwrap_or(defaults.verification_ttl_hours),
		}
	}
}

// =============================================================================
// Invitations
// =============================================================================

/// Invitation configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct InvitationsConfig {
	/// Expiry window, in days, applied on issue and on resend. The single
	/// authoritative TTL; no other literal exists.
	pub ttl_days: i64,
}

impl Default for InvitationsConfig {
	fn default() -> Self {
		Self { ttl_days: 7 }
	}
}

/// Invitations configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvitationsConfigLayer {
	#[serde(default)]
	pub ttl_days: Option<i64>,
}

impl InvitationsConfigLayer {
	pub fn merge(&mut self, other: InvitationsConfigLayer) {
		if other.ttl_days.is_some() {
			self.ttl_days = other.ttl_days;
		}
	}

	pub fn finalize(self) -> Result<InvitationsConfig, ConfigError> {
		let ttl_days = self.ttl_days.unwrap_or(7);
		if ttl_days < 1 {
			return Err(ConfigError::InvalidValue {
				key: "invitations.ttl_days".to_string(),
				message: format!("must be at least 1, got {ttl_days}"),
			});
		}
		Ok(InvitationsConfig { ttl_days })
	}
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct LoggingConfig {
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

/// Logging configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfigLayer {
	#[serde(default)]
	pub level: Option<String>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: LoggingConfigLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| "info".to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn http_defaults() {
		let config = HttpConfigLayer::default().finalize();
		assert_eq!(config.host, "127.0.0.1");
		assert_eq!(config.port, 8080);
	}

	#[test]
	fn database_custom_url() {
		let layer = DatabaseConfigLayer {
			url: Some("sqlite:/var/lib/atrium/data.db".to_string()),
		};
		assert_eq!(layer.finalize().url, "sqlite:/var/lib/atrium/data.db");
	}

	#[test]
	fn invitations_default_ttl_is_seven_days() {
		let config = InvitationsConfigLayer::default().finalize().unwrap();
		assert_eq!(config.ttl_days, 7);
	}

	#[test]
	fn invitations_ttl_must_be_positive() {
		let layer = InvitationsConfigLayer { ttl_days: Some(0) };
		assert!(layer.finalize().is_err());
		let layer = InvitationsConfigLayer { ttl_days: Some(-3) };
		assert!(layer.finalize().is_err());
	}

	#[test]
	fn auth_merge_overrides_session_ttl() {
		let mut layer = AuthConfigLayer {
			session_ttl_hours: Some(24),
			verification_ttl_hours: None,
		};
		layer.merge(AuthConfigLayer {
			session_ttl_hours: Some(48),
			verification_ttl_hours: None,
		});
		assert_eq!(layer.finalize().session_ttl_hours, 48);
	}
}
