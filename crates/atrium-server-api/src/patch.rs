// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Patch-field deserialization.
//!
//! `Option<Option<T>>` distinguishes "key absent" (outer `None`, leave the
//! field untouched) from "key present with null" (inner `None`, clear the
//! field). Serde collapses both to `None` by default; this deserializer
//! preserves the distinction when paired with `#[serde(default)]`.

use serde::{Deserialize, Deserializer};

pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	T: Deserialize<'de>,
	D: Deserializer<'de>,
{
	Deserialize::deserialize(deserializer).map(Some)
}
