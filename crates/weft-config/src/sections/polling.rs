// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Polling configuration for long-running remote operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PollingConfigLayer {
	pub interval_ms: Option<u64>,
	pub max_attempts: Option<u32>,
}

impl PollingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.interval_ms.is_some() {
			self.interval_ms = other.interval_ms;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
	}

	pub fn finalize(self) -> Result<PollingConfig, ConfigError> {
		let interval_ms = self.interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
		let max_attempts = self.max_attempts.unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS);
		if interval_ms == 0 {
			return Err(ConfigError::invalid("polling.interval_ms", "must be greater than zero"));
		}
		if max_attempts == 0 {
			return Err(ConfigError::invalid("polling.max_attempts", "must be greater than zero"));
		}
		Ok(PollingConfig {
			interval_ms,
			max_attempts,
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollingConfig {
	pub interval_ms: u64,
	pub max_attempts: u32,
}

impl PollingConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}
}

impl Default for PollingConfig {
	fn default() -> Self {
		Self {
			interval_ms: DEFAULT_POLL_INTERVAL_MS,
			max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_layer_finalize_defaults() {
		let config = PollingConfigLayer::default().finalize().unwrap();
		assert_eq!(config, PollingConfig::default());
		assert_eq!(config.interval(), Duration::from_secs(5));
	}

	#[test]
	fn test_zero_interval_rejected() {
		let err = PollingConfigLayer {
			interval_ms: Some(0),
			..Default::default()
		}
		.finalize()
		.unwrap_err();
		assert!(err.to_string().contains("polling.interval_ms"));
	}

	#[test]
	fn test_zero_attempts_rejected() {
		let err = PollingConfigLayer {
			max_attempts: Some(0),
			..Default::default()
		}
		.finalize()
		.unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "polling.max_attempts"));
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = PollingConfigLayer {
			interval_ms: Some(100),
			max_attempts: Some(3),
		};
		base.merge(PollingConfigLayer {
			interval_ms: Some(250),
			max_attempts: None,
		});
		assert_eq!(base.interval_ms, Some(250));
		assert_eq!(base.max_attempts, Some(3));
	}
}
