// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment URL tokens: `{site}`, `{sitecollection}`, `{wpgallery}`,
//! `{hosturl}` and `{themegallery}`.
//!
//! These resolve from where the site lives rather than from provisioning
//! state, so they are a separate pass from [`crate::TokenResolver`]. The two
//! vocabularies are disjoint (none of these tokens contain a colon) and the
//! passes can run in either order.

use url::Url;

use crate::context::WebInfo;

/// Where the target site lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEnvironment {
	/// Absolute site URL without a trailing slash.
	pub site_url: String,
	/// Server-relative site path without a trailing slash; empty for a root site.
	pub site_server_relative_url: String,
	/// `scheme://host[:port]`.
	pub host_url: String,
}

impl SiteEnvironment {
	pub fn from_site_url(site_url: &str) -> Result<Self, url::ParseError> {
		let url = Url::parse(site_url)?;
		let host_url = url.origin().ascii_serialization();
		let path = url.path().trim_end_matches('/').to_string();
		Ok(Self {
			site_url: format!("{host_url}{path}"),
			site_server_relative_url: path,
			host_url,
		})
	}

	/// Builds the environment from a web snapshot, if its URL parses.
	pub fn from_web(web: &WebInfo) -> Option<Self> {
		Self::from_site_url(&web.url).ok()
	}

	pub fn with_host_url(mut self, host_url: impl Into<String>) -> Self {
		self.host_url = host_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn resolve(&self, input: &str) -> String {
		input
			.replace("{site}", &self.site_server_relative_url)
			.replace("{sitecollection}", &self.site_url)
			.replace("{wpgallery}", &format!("{}/_catalogs/wp", self.site_url))
			.replace("{hosturl}", &self.host_url)
			.replace("{themegallery}", &format!("{}/_catalogs/theme/15", self.site_url))
	}

	/// Strips this environment's host from an absolute URL on the same host.
	pub fn make_relative(&self, url: &str) -> String {
		match url.strip_prefix(&self.host_url) {
			Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.to_string(),
			_ => url.to_string(),
		}
	}
}
