// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Site environment overrides for URL tokens.

use serde::{Deserialize, Serialize};
use weft_core::SiteEnvironment;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfigLayer {
	pub site_url: Option<String>,
	pub host_url: Option<String>,
}

impl EnvironmentConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.site_url.is_some() {
			self.site_url = other.site_url;
		}
		if other.host_url.is_some() {
			self.host_url = other.host_url;
		}
	}

	pub fn finalize(self) -> Result<EnvironmentConfig, ConfigError> {
		if let Some(site_url) = &self.site_url {
			SiteEnvironment::from_site_url(site_url)
				.map_err(|e| ConfigError::invalid("environment.site_url", format!("'{site_url}': {e}")))?;
		}
		if self.host_url.is_some() && self.site_url.is_none() {
			return Err(ConfigError::invalid(
				"environment.host_url",
				"requires environment.site_url to be set",
			));
		}
		Ok(EnvironmentConfig {
			site_url: self.site_url,
			host_url: self.host_url,
		})
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
	/// Absolute site URL overriding the one reported by the target web.
	pub site_url: Option<String>,
	pub host_url: Option<String>,
}

impl EnvironmentConfig {
	/// The configured environment, if a site URL is set.
	pub fn site_environment(&self) -> Option<SiteEnvironment> {
		let env = SiteEnvironment::from_site_url(self.site_url.as_deref()?).ok()?;
		Some(match &self.host_url {
			Some(host) => env.with_host_url(host.clone()),
			None => env,
		})
	}
}
