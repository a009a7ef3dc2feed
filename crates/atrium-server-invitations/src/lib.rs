// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Workspace invitation lifecycle.
//!
//! This crate owns the state machine that governs how an invitation moves
//! from creation to acceptance, cancellation, or expiry:
//!
//! ```text
//!             issue
//!               │
//!               ▼
//!           ┌───────┐  resend (new token + expiry)
//!           │pending│◄─────────────┬──────────────┐
//!           └───┬───┘              │              │
//!     accept    │   cancel         │              │
//!   ┌───────────┼───────────┐      │              │
//!   ▼           ▼           ▼      │              │
//! accepted  cancelled    expired ──┘──────────────┘
//! ```
//!
//! `accepted` is terminal. `cancelled` and `expired` are terminal except
//! for an explicit resend, which is treated as re-creation: a fresh token,
//! a fresh expiry window, and a forced return to `pending`.
//!
//! The lifecycle component talks to the outside world only through the
//! ports in [`ports`]: a persistence store, a permission oracle, an email
//! dispatcher, a clock, and a token source. All of them are injectable,
//! which keeps expiry and dispatch-failure behavior deterministic in tests.
//!
//! # Security
//!
//! - Tokens are generated from a CSPRNG-backed source and stored only as
//!   SHA-256 hashes
//! - Every resend rotates the token; the previous link stops resolving
//! - Expiry is enforced lazily at accept time and persisted when detected

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod ports;

pub use error::{InvitationError, MailerError, StoreError};
pub use lifecycle::{
	AcceptInvitation, AcceptOutcome, InvitationLifecycle, IssueInvitation, LifecycleConfig,
	ResendInvitation, DEFAULT_TTL_DAYS,
};
pub use model::{normalize_email, Invitation, InvitationStatus};
pub use ports::{
	AcceptCommit, Clock, InvitationEmail, InvitationMailer, InvitationStore, InvitePolicy, Invitee,
	RandomTokenSource, SystemClock, TokenSource,
};
