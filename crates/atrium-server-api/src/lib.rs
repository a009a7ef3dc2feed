// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request and response types for the Atrium HTTP API.
//!
//! Pure data: serde + OpenAPI schema derives, no behavior. One module per
//! resource. Every error body is a struct with `error` (machine-readable
//! code) and `message` (human-readable copy) fields.

pub mod auth;
pub mod clients;
pub mod companies;
pub mod files;
pub mod invitations;
pub mod patch;
pub mod projects;
