// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Which handler runs for each section, and in what order.

use std::collections::BTreeMap;
use std::sync::Arc;

use weft_config::HandlersConfig;
use weft_core::{Handler, HandlerSettings, Section};

/// Priority of a template key missing from the sort table.
pub const UNKNOWN_SECTION_PRIORITY: u32 = 99;

/// Section to execution priority. Lower runs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSort {
	priorities: BTreeMap<Section, u32>,
}

impl HandlerSort {
	/// An empty table; every key sorts at [`UNKNOWN_SECTION_PRIORITY`].
	pub fn empty() -> Self {
		Self {
			priorities: BTreeMap::new(),
		}
	}

	/// The built-in priorities of every section.
	pub fn defaults() -> Self {
		Self {
			priorities: Section::ALL
				.iter()
				.map(|section| (*section, section.default_priority()))
				.collect(),
		}
	}

	pub fn with_overrides(mut self, overrides: &BTreeMap<Section, u32>) -> Self {
		self.priorities.extend(overrides.iter().map(|(s, p)| (*s, *p)));
		self
	}

	pub fn set(&mut self, section: Section, priority: u32) {
		self.priorities.insert(section, priority);
	}

	pub fn priority(&self, section: Section) -> u32 {
		self
			.priorities
			.get(&section)
			.copied()
			.unwrap_or(UNKNOWN_SECTION_PRIORITY)
	}

	/// Priority of a raw template key. Keys that are not sections sort last.
	pub fn priority_of(&self, key: &str) -> u32 {
		key
			.parse::<Section>()
			.map(|section| self.priority(section))
			.unwrap_or(UNKNOWN_SECTION_PRIORITY)
	}
}

impl Default for HandlerSort {
	fn default() -> Self {
		Self::defaults()
	}
}

/// Registered handlers keyed by section, plus their sort table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
	handlers: BTreeMap<Section, Arc<dyn Handler>>,
	sort: HandlerSort,
}

impl HandlerRegistry {
	/// A registry with no handlers and the default sort table.
	pub fn new() -> Self {
		Self::default()
	}

	/// The built-in handlers minus those disabled in `config`, sorted by the
	/// default priorities with `config` overrides applied.
	pub fn from_config(config: &HandlersConfig, settings: Arc<HandlerSettings>) -> Self {
		let handlers = Section::ALL
			.iter()
			.filter(|section| !config.is_disabled(**section))
			.map(|section| (*section, weft_handlers::default_handler(*section, settings.clone())))
			.collect();
		Self {
			handlers,
			sort: HandlerSort::defaults().with_overrides(&config.priorities),
		}
	}

	/// Registers `handler` for its section, replacing any existing one.
	pub fn register(&mut self, handler: Arc<dyn Handler>) {
		self.handlers.insert(handler.section(), handler);
	}

	pub fn unregister(&mut self, section: Section) -> Option<Arc<dyn Handler>> {
		self.handlers.remove(&section)
	}

	pub fn get(&self, section: Section) -> Option<&Arc<dyn Handler>> {
		self.handlers.get(&section)
	}

	pub fn contains(&self, section: Section) -> bool {
		self.handlers.contains_key(&section)
	}

	pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
		self.handlers.keys().copied()
	}

	pub fn sort(&self) -> &HandlerSort {
		&self.sort
	}

	pub fn sort_mut(&mut self) -> &mut HandlerSort {
		&mut self.sort
	}
}

impl std::fmt::Debug for HandlerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerRegistry")
			.field("handlers", &self.handlers.keys().collect::<Vec<_>>())
			.field("sort", &self.sort)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_keys_sort_last() {
		let sort = HandlerSort::defaults();
		assert_eq!(sort.priority_of("Parameters"), UNKNOWN_SECTION_PRIORITY);
		assert_eq!(sort.priority_of("SiteFields"), 0);
		assert_eq!(HandlerSort::empty().priority(Section::Hooks), UNKNOWN_SECTION_PRIORITY);
	}

	#[test]
	fn overrides_replace_defaults() {
		let overrides = BTreeMap::from([(Section::Hooks, 0)]);
		let sort = HandlerSort::defaults().with_overrides(&overrides);
		assert_eq!(sort.priority(Section::Hooks), 0);
		assert_eq!(sort.priority(Section::Lists), 3);
	}

	#[test]
	fn config_disables_handlers() {
		let config = HandlersConfig {
			disabled: vec![Section::Hooks, Section::Files],
			..Default::default()
		};
		let registry = HandlerRegistry::from_config(&config, Arc::new(HandlerSettings::default()));
		assert!(!registry.contains(Section::Hooks));
		assert!(!registry.contains(Section::Files));
		assert_eq!(registry.sections().count(), Section::ALL.len() - 2);
		assert_eq!(registry.get(Section::Lists).map(|h| h.section()), Some(Section::Lists));
	}

	#[test]
	fn register_replaces_by_section() {
		let settings = Arc::new(HandlerSettings::default());
		let mut registry = HandlerRegistry::new();
		registry.register(weft_handlers::default_handler(Section::Features, settings.clone()));
		registry.register(weft_handlers::default_handler(Section::Features, settings));
		assert_eq!(registry.sections().collect::<Vec<_>>(), vec![Section::Features]);
		assert!(registry.unregister(Section::Features).is_some());
		assert!(!registry.contains(Section::Features));
	}
}
