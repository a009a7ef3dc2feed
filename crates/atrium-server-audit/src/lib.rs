// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Audit event pipeline for the Atrium server.
//!
//! Mutating operations emit [`AuditLogEntry`] records into a bounded
//! queue; a background task fans them out to the configured
//! [`AuditSink`]s. Publishing never blocks the request path, and a full
//! queue drops new events rather than stalling handlers.

pub mod event;
pub mod pipeline;
pub mod sink;

pub use event::{AuditEventType, AuditLogBuilder, AuditLogEntry, AuditSeverity, UserId};
pub use pipeline::AuditService;
pub use sink::{AuditSink, AuditSinkError, SqliteAuditSink};
