// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Email rendering and dispatch for the Atrium server.
//!
//! This crate renders transactional emails (workspace invitations, email
//! verification) and hands them to a [`Mailer`]. The mailer is a seam: a
//! real SMTP transport plugs in behind it, while deployments without one
//! fall back to [`LogMailer`], which records the message through `tracing`
//! and succeeds.
//!
//! [`EmailService`] also implements the invitation lifecycle's mailer
//! port, so the server can hand one object to both the HTTP layer and the
//! lifecycle component.

pub mod service;
pub mod template;

pub use service::{EmailError, EmailService, LogMailer, Mailer};
pub use template::{render_email, EmailRequest};
