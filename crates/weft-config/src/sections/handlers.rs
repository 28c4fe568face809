// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handler selection and ordering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use weft_core::Section;

use crate::error::ConfigError;

/// Section names stay strings until finalize so that a typo surfaces as a
/// config error naming the offending key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HandlersConfigLayer {
	pub disabled: Option<Vec<String>>,
	pub priorities: Option<BTreeMap<String, u32>>,
}

impl HandlersConfigLayer {
	/// `disabled` is replaced wholesale; `priorities` merge per section.
	pub fn merge(&mut self, other: Self) {
		if other.disabled.is_some() {
			self.disabled = other.disabled;
		}
		if let Some(priorities) = other.priorities {
			self.priorities.get_or_insert_with(BTreeMap::new).extend(priorities);
		}
	}

	pub fn finalize(self) -> Result<HandlersConfig, ConfigError> {
		let disabled = self
			.disabled
			.unwrap_or_default()
			.iter()
			.map(|name| parse_section("handlers.disabled", name))
			.collect::<Result<Vec<_>, _>>()?;

		let priorities = self
			.priorities
			.unwrap_or_default()
			.into_iter()
			.map(|(name, priority)| Ok((parse_section("handlers.priorities", &name)?, priority)))
			.collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

		Ok(HandlersConfig {
			disabled,
			priorities,
		})
	}
}

fn parse_section(key: &str, name: &str) -> Result<Section, ConfigError> {
	name
		.trim()
		.parse()
		.map_err(|_| ConfigError::invalid(key, format!("unknown section '{name}'")))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HandlersConfig {
	/// Sections whose default handler is not registered.
	pub disabled: Vec<Section>,
	/// Overrides of the default execution priority.
	pub priorities: BTreeMap<Section, u32>,
}

impl HandlersConfig {
	pub fn is_disabled(&self, section: Section) -> bool {
		self.disabled.contains(&section)
	}
}
