// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging configuration section.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
	pub prefix: Option<String>,
	pub json: Option<bool>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.prefix.is_some() {
			self.prefix = other.prefix;
		}
		if other.json.is_some() {
			self.json = other.json;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
			prefix: self.prefix.filter(|p| !p.is_empty()),
			json: self.json.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
	/// Default filter directive; `RUST_LOG` takes priority when set.
	pub level: String,
	/// Attached to every handler log event.
	pub prefix: Option<String>,
	pub json: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		LoggingConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_layer_finalize_defaults() {
		let config = LoggingConfigLayer::default().finalize();
		assert_eq!(config.level, "info");
		assert!(config.prefix.is_none());
		assert!(!config.json);
	}

	#[test]
	fn test_empty_prefix_is_none() {
		let config = LoggingConfigLayer {
			prefix: Some(String::new()),
			..Default::default()
		}
		.finalize();
		assert!(config.prefix.is_none());
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = LoggingConfigLayer {
			level: Some("debug".to_string()),
			prefix: Some("[base]".to_string()),
			json: None,
		};
		base.merge(LoggingConfigLayer {
			json: Some(true),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.level, "debug");
		assert_eq!(config.prefix.as_deref(), Some("[base]"));
		assert!(config.json);
	}
}
