// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for Weft provisioning.
//!
//! This crate provides:
//! - Layered configuration from defaults, a TOML file, the environment and CLI overrides
//! - Validation of handler names and polling limits
//! - Consistent environment variable naming (`WEFT_*`)
//!
//! # Usage
//!
//! ```ignore
//! use weft_config::load_config;
//!
//! let config = load_config()?;
//! println!("logging at {}", config.logging.level);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ProvisioningConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, OverrideSource, Precedence, TomlSource};

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved provisioning configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningConfig {
	pub logging: LoggingConfig,
	pub handlers: HandlersConfig,
	pub polling: PollingConfig,
	pub environment: EnvironmentConfig,
	/// Values for `{parameter:Name}` tokens. These win over parameters declared
	/// in a template.
	pub parameters: BTreeMap<String, String>,
}

impl ProvisioningConfig {
	/// Re-checks the limits [`finalize`] enforces, for configs built directly
	/// rather than loaded from sources.
	pub fn validate(&self) -> Result<(), ConfigError> {
		PollingConfigLayer {
			interval_ms: Some(self.polling.interval_ms),
			max_attempts: Some(self.polling.max_attempts),
		}
		.finalize()?;
		EnvironmentConfigLayer {
			site_url: self.environment.site_url.clone(),
			host_url: self.environment.host_url.clone(),
		}
		.finalize()?;
		Ok(())
	}
}

/// Load configuration with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WEFT_*`)
/// 2. Config file (`./weft.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ProvisioningConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::local()),
		Box::new(EnvSource::from_process()),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ProvisioningConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::from_process()),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ProvisioningConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ProvisioningConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize a configuration layer into resolved config.
pub fn finalize(layer: ProvisioningConfigLayer) -> Result<ProvisioningConfig, ConfigError> {
	let logging = layer.logging.unwrap_or_default().finalize();
	let handlers = layer.handlers.unwrap_or_default().finalize()?;
	let polling = layer.polling.unwrap_or_default().finalize()?;
	let environment = layer.environment.unwrap_or_default().finalize()?;
	let parameters = layer.parameters.unwrap_or_default();

	info!(
		log_level = %logging.level,
		disabled_handlers = handlers.disabled.len(),
		priority_overrides = handlers.priorities.len(),
		poll_interval_ms = polling.interval_ms,
		poll_max_attempts = polling.max_attempts,
		site_url_override = environment.site_url.is_some(),
		parameters = parameters.len(),
		"Provisioning configuration loaded"
	);

	Ok(ProvisioningConfig {
		logging,
		handlers,
		polling,
		environment,
		parameters,
	})
}
