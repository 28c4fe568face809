// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The partially-specified configuration produced by each source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sections::{
	EnvironmentConfigLayer, HandlersConfigLayer, LoggingConfigLayer, PollingConfigLayer,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningConfigLayer {
	pub logging: Option<LoggingConfigLayer>,
	pub handlers: Option<HandlersConfigLayer>,
	pub polling: Option<PollingConfigLayer>,
	pub environment: Option<EnvironmentConfigLayer>,
	pub parameters: Option<BTreeMap<String, String>>,
}

macro_rules! merge_section {
	($self:ident, $other:ident, $field:ident) => {
		match (&mut $self.$field, $other.$field) {
			(Some(existing), Some(incoming)) => existing.merge(incoming),
			(slot @ None, Some(incoming)) => *slot = Some(incoming),
			(_, None) => {}
		}
	};
}

impl ProvisioningConfigLayer {
	/// Overlays `other` on top of `self`. Fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section!(self, other, logging);
		merge_section!(self, other, handlers);
		merge_section!(self, other, polling);
		merge_section!(self, other, environment);
		if let Some(parameters) = other.parameters {
			self.parameters.get_or_insert_with(BTreeMap::new).extend(parameters);
		}
	}
}
