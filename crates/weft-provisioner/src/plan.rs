// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Execution order of a template's sections.

use weft_core::{Section, Template};

use crate::registry::{HandlerRegistry, HandlerSort};

/// Stable-sorts raw template keys by priority. Ties keep input order.
pub fn order_keys<'a>(keys: impl IntoIterator<Item = &'a str>, sort: &HandlerSort) -> Vec<&'a str> {
	let mut keys: Vec<&str> = keys.into_iter().collect();
	keys.sort_by_key(|key| sort.priority_of(key));
	keys
}

/// The sections of `template` that will run, in order.
///
/// Keys are taken in document order, stable-sorted by priority, restricted to
/// `allowed` when given, and dropped when no handler is registered for them.
pub fn plan_operations(
	template: &Template,
	allowed: Option<&[Section]>,
	registry: &HandlerRegistry,
) -> Vec<Section> {
	order_keys(template.section_names(), registry.sort())
		.into_iter()
		.filter_map(|key| key.parse::<Section>().ok())
		.filter(|section| allowed.map_or(true, |allowed| allowed.contains(section)))
		.filter(|section| registry.contains(*section))
		.collect()
}
