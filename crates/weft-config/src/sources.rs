// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment variables and
//! command-line overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ProvisioningConfigLayer;
use crate::sections::{
	EnvironmentConfigLayer, HandlersConfigLayer, LoggingConfigLayer, PollingConfigLayer,
};

pub const ENV_PREFIX: &str = "WEFT_";
const PARAM_PREFIX: &str = "WEFT_PARAM_";
const PRIORITY_PREFIX: &str = "WEFT_HANDLER_PRIORITY_";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	Cli = 60,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ProvisioningConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `weft.toml` in the working directory.
	pub fn local() -> Self {
		Self::new("weft.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ProvisioningConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ProvisioningConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `WEFT_<SECTION>_<FIELD>`, plus `WEFT_PARAM_<NAME>` for template
/// parameters and `WEFT_HANDLER_PRIORITY_<Section>` for priority overrides.
/// Variables are captured when the source is built.
pub struct EnvSource {
	vars: BTreeMap<String, String>,
}

impl EnvSource {
	/// Captures the `WEFT_*` variables of the current process.
	pub fn from_process() -> Self {
		Self::from_vars(std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)))
	}

	pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		self.vars.get(name).filter(|s| !s.is_empty()).cloned()
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn u32(&self, name: &str) -> Result<Option<u32>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|_| ConfigError::invalid(name, format!("invalid u32 value '{v}'"))),
			None => Ok(None),
		}
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|_| ConfigError::invalid(name, format!("invalid u64 value '{v}'"))),
			None => Ok(None),
		}
	}

	fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a String)> + 'a {
		self
			.vars
			.iter()
			.filter_map(move |(k, v)| k.strip_prefix(prefix).map(|rest| (rest, v)))
			.filter(|(rest, _)| !rest.is_empty())
	}

	fn load_logging(&self) -> LoggingConfigLayer {
		LoggingConfigLayer {
			level: self.var("WEFT_LOG_LEVEL"),
			prefix: self.var("WEFT_LOG_PREFIX"),
			json: self.bool("WEFT_LOG_JSON"),
		}
	}

	fn load_handlers(&self) -> Result<HandlersConfigLayer, ConfigError> {
		let disabled = self.var("WEFT_HANDLERS_DISABLED").map(|s| {
			s.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		});

		let mut priorities = BTreeMap::new();
		for (section, _) in self.with_prefix(PRIORITY_PREFIX) {
			let name = format!("{PRIORITY_PREFIX}{section}");
			if let Some(priority) = self.u32(&name)? {
				priorities.insert(section.to_string(), priority);
			}
		}

		Ok(HandlersConfigLayer {
			disabled,
			priorities: (!priorities.is_empty()).then_some(priorities),
		})
	}

	fn load_polling(&self) -> Result<PollingConfigLayer, ConfigError> {
		Ok(PollingConfigLayer {
			interval_ms: self.u64("WEFT_POLL_INTERVAL_MS")?,
			max_attempts: self.u32("WEFT_POLL_MAX_ATTEMPTS")?,
		})
	}

	fn load_environment(&self) -> EnvironmentConfigLayer {
		EnvironmentConfigLayer {
			site_url: self.var("WEFT_SITE_URL"),
			host_url: self.var("WEFT_HOST_URL"),
		}
	}

	fn load_parameters(&self) -> Option<BTreeMap<String, String>> {
		let parameters: BTreeMap<String, String> = self
			.with_prefix(PARAM_PREFIX)
			.map(|(name, value)| (name.to_string(), value.clone()))
			.collect();
		(!parameters.is_empty()).then_some(parameters)
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		debug!(vars = self.vars.len(), "loading environment variables");
		Ok(ProvisioningConfigLayer {
			logging: Some(self.load_logging()),
			handlers: Some(self.load_handlers()?),
			polling: Some(self.load_polling()?),
			environment: Some(self.load_environment()),
			parameters: self.load_parameters(),
		})
	}
}

/// A layer built in code, typically from command-line flags.
pub struct OverrideSource {
	layer: ProvisioningConfigLayer,
}

impl OverrideSource {
	pub fn new(layer: ProvisioningConfigLayer) -> Self {
		Self { layer }
	}
}

impl ConfigSource for OverrideSource {
	fn name(&self) -> &'static str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ProvisioningConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}
