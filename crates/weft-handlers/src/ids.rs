// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier conventions shared by handlers and web clients.

/// Content type id prefix of the built-in folder content type.
pub const FOLDER_CONTENT_TYPE_ID: &str = "0x0120";

/// Field ids compare without braces and case-insensitively.
pub fn same_id(a: &str, b: &str) -> bool {
	let trim = |s: &str| s.trim_matches(|c| c == '{' || c == '}').to_ascii_lowercase();
	trim(a) == trim(b)
}

/// Whether `id` is a direct child of `parent`: the parent id, `00`, then a
/// 32-digit suffix.
pub fn is_child_content_type(id: &str, parent: &str) -> bool {
	id.len() == parent.len() + 34 && id.starts_with(parent) && id[parent.len()..].starts_with("00")
}
