// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for authentication and authorization.
//!
//! This module defines the foundational types used throughout the server:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for different entity
//!   types ([`UserId`], [`CompanyId`], [`InvitationId`], etc.) preventing
//!   accidental mixing
//! - **Role enum**: Hierarchical roles within a company workspace
//!   ([`CompanyRole`])
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(SessionId, "Unique identifier for a session.");
define_id_type!(CompanyId, "Unique identifier for a company workspace.");
define_id_type!(InvitationId, "Unique identifier for an invitation.");
define_id_type!(ClientId, "Unique identifier for a client record.");
define_id_type!(ProjectId, "Unique identifier for a project.");
define_id_type!(FileId, "Unique identifier for a file record.");

// =============================================================================
// Company Roles
// =============================================================================

/// Roles within a company workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyRole {
	/// Full workspace control, can delete the workspace.
	Owner,
	/// Manage members, invitations, and settings; cannot delete the workspace.
	Admin,
	/// Standard member access.
	Member,
}

impl CompanyRole {
	/// Returns all available company roles.
	pub fn all() -> &'static [CompanyRole] {
		&[CompanyRole::Owner, CompanyRole::Admin, CompanyRole::Member]
	}

	/// Returns true if this role has at least the permissions of the given role.
	pub fn has_permission_of(&self, other: &CompanyRole) -> bool {
		matches!(
			(self, other),
			(CompanyRole::Owner, _)
				| (CompanyRole::Admin, CompanyRole::Admin | CompanyRole::Member)
				| (CompanyRole::Member, CompanyRole::Member)
		)
	}

	/// Returns true if this role may issue, resend, or cancel invitations.
	pub fn can_invite_users(&self) -> bool {
		self.has_permission_of(&CompanyRole::Admin)
	}

	/// Parse a role from its stored string form.
	pub fn parse(s: &str) -> Option<CompanyRole> {
		match s {
			"owner" => Some(CompanyRole::Owner),
			"admin" => Some(CompanyRole::Admin),
			"member" => Some(CompanyRole::Member),
			_ => None,
		}
	}
}

impl fmt::Display for CompanyRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CompanyRole::Owner => write!(f, "owner"),
			CompanyRole::Admin => write!(f, "admin"),
			CompanyRole::Member => write!(f, "member"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod id_types {
		use super::*;

		#[test]
		fn user_id_roundtrips() {
			let uuid = Uuid::new_v4();
			let user_id = UserId::new(uuid);
			assert_eq!(user_id.into_inner(), uuid);
		}

		#[test]
		fn user_id_generates_unique() {
			let id1 = UserId::generate();
			let id2 = UserId::generate();
			assert_ne!(id1, id2);
		}

		#[test]
		fn user_id_serializes_as_uuid() {
			let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
			let user_id = UserId::new(uuid);
			let json = serde_json::to_string(&user_id).unwrap();
			assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
		}

		proptest! {
				#[test]
				fn user_id_roundtrip_any_uuid(
						a: u128
				) {
						let uuid = Uuid::from_u128(a);
						let user_id = UserId::new(uuid);
						prop_assert_eq!(user_id.into_inner(), uuid);
						prop_assert_eq!(Uuid::from(user_id), uuid);
				}

				#[test]
				fn company_id_roundtrip_any_uuid(
						a: u128
				) {
						let uuid = Uuid::from_u128(a);
						let company_id = CompanyId::new(uuid);
						prop_assert_eq!(company_id.into_inner(), uuid);
				}

				#[test]
				fn invitation_id_display_matches_uuid(
						a: u128
				) {
						let uuid = Uuid::from_u128(a);
						let invitation_id = InvitationId::new(uuid);
						prop_assert_eq!(invitation_id.to_string(), uuid.to_string());
				}
		}
	}

	mod roles {
		use super::*;

		#[test]
		fn company_role_permission_hierarchy() {
			assert!(CompanyRole::Owner.has_permission_of(&CompanyRole::Owner));
			assert!(CompanyRole::Owner.has_permission_of(&CompanyRole::Admin));
			assert!(CompanyRole::Owner.has_permission_of(&CompanyRole::Member));

			assert!(!CompanyRole::Admin.has_permission_of(&CompanyRole::Owner));
			assert!(CompanyRole::Admin.has_permission_of(&CompanyRole::Admin));
			assert!(CompanyRole::Admin.has_permission_of(&CompanyRole::Member));

			assert!(!CompanyRole::Member.has_permission_of(&CompanyRole::Owner));
			assert!(!CompanyRole::Member.has_permission_of(&CompanyRole::Admin));
			assert!(CompanyRole::Member.has_permission_of(&CompanyRole::Member));
		}

		#[test]
		fn invite_permission_requires_admin() {
			assert!(CompanyRole::Owner.can_invite_users());
			assert!(CompanyRole::Admin.can_invite_users());
			assert!(!CompanyRole::Member.can_invite_users());
		}

		#[test]
		fn role_parse_roundtrips_display() {
			for role in CompanyRole::all() {
				assert_eq!(CompanyRole::parse(&role.to_string()), Some(*role));
			}
			assert_eq!(CompanyRole::parse("superuser"), None);
		}

		#[test]
		fn role_serializes_snake_case() {
			let json = serde_json::to_string(&CompanyRole::Owner).unwrap();
			assert_eq!(json, "\"owner\"");
		}
	}
}
