// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The contract every section handler implements.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ProvisioningContext;
use crate::error::HandlerError;
use crate::section::Section;
use crate::token::TokenResolver;
use crate::url_tokens::SiteEnvironment;
use crate::web::WebClient;

const PROVISION_SCOPE: &str = "ProvisionObjects";

/// Settings every handler is constructed with.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
	/// Prefix attached to every handler log event.
	pub log_prefix: Option<String>,
	/// Values for `{parameter:Name}` tokens.
	pub parameters: BTreeMap<String, String>,
	/// Overrides the environment derived from the web snapshot.
	pub environment: Option<SiteEnvironment>,
	pub poll_interval: Duration,
	pub max_poll_attempts: u32,
}

impl Default for HandlerSettings {
	fn default() -> Self {
		Self {
			log_prefix: None,
			parameters: BTreeMap::new(),
			environment: None,
			poll_interval: Duration::from_secs(5),
			max_poll_attempts: 60,
		}
	}
}

impl HandlerSettings {
	pub fn token_resolver<'a>(&'a self, context: &'a ProvisioningContext) -> TokenResolver<'a> {
		TokenResolver::new(context, &self.parameters)
	}

	/// The configured environment, or the one derived from the web snapshot.
	pub fn site_environment(&self, context: &ProvisioningContext) -> Option<SiteEnvironment> {
		self
			.environment
			.clone()
			.or_else(|| SiteEnvironment::from_web(&context.web))
	}

	/// Resolves environment URL tokens. Without a known environment the input
	/// is returned unchanged.
	pub fn resolve_url_tokens(&self, context: &ProvisioningContext, input: &str) -> String {
		match self.site_environment(context) {
			Some(env) => env.resolve(input),
			None => input.to_string(),
		}
	}

	/// Applies both token passes.
	pub fn resolve_all(&self, context: &ProvisioningContext, input: &str) -> String {
		let resolved = self.token_resolver(context).resolve(input);
		self.resolve_url_tokens(context, &resolved)
	}
}

/// Structured logger bound to one handler.
///
/// Events carry `handler`, `scope` and `prefix` fields so operators can
/// correlate log lines with a specific handler pass.
#[derive(Debug, Clone)]
pub struct HandlerLog {
	handler: Section,
	prefix: String,
}

impl HandlerLog {
	pub fn new(handler: Section, prefix: Option<&str>) -> Self {
		Self {
			handler,
			prefix: prefix.unwrap_or_default().to_string(),
		}
	}

	pub fn for_settings(handler: Section, settings: &HandlerSettings) -> Self {
		Self::new(handler, settings.log_prefix.as_deref())
	}

	pub fn handler(&self) -> Section {
		self.handler
	}

	pub fn info(&self, scope: &str, message: impl AsRef<str>) {
		tracing::info!(
			handler = %self.handler,
			scope,
			prefix = %self.prefix,
			"{}",
			message.as_ref()
		);
	}

	pub fn warn(&self, scope: &str, message: impl AsRef<str>) {
		tracing::warn!(
			handler = %self.handler,
			scope,
			prefix = %self.prefix,
			"{}",
			message.as_ref()
		);
	}

	pub fn error(&self, scope: &str, message: impl AsRef<str>) {
		tracing::error!(
			handler = %self.handler,
			scope,
			prefix = %self.prefix,
			"{}",
			message.as_ref()
		);
	}

	pub fn scope_started(&self) {
		self.info(PROVISION_SCOPE, "Code execution scope started");
	}

	pub fn scope_ended(&self, error: Option<&HandlerError>) {
		match error {
			Some(e) => self.error(
				PROVISION_SCOPE,
				format!("Code execution scope ended with error: {e}"),
			),
			None => self.info(PROVISION_SCOPE, "Code execution scope ended"),
		}
	}

	/// Runs `work` between a scope-started and a scope-ended event.
	pub async fn scoped<T, F>(&self, work: F) -> Result<T, HandlerError>
	where
		F: Future<Output = Result<T, HandlerError>>,
	{
		self.scope_started();
		let result = work.await;
		self.scope_ended(result.as_ref().err());
		result
	}
}

/// Provisions one template section against a target web.
///
/// Implementations must treat `payload` as read-only, emit scope events around
/// their work (see [`HandlerLog::scoped`]), and record any identifiers later
/// handlers may reference in `context`.
#[async_trait]
pub trait Handler: Send + Sync {
	fn section(&self) -> Section;

	/// The default does nothing beyond warning that it was not overridden.
	async fn provision_objects(
		&self,
		web: &dyn WebClient,
		_payload: &Value,
		_context: &mut ProvisioningContext,
	) -> Result<(), HandlerError> {
		HandlerLog::new(self.section(), None).warn(
			PROVISION_SCOPE,
			format!(
				"Handler {} for web [{}] does not override provision_objects",
				self.section(),
				web.url()
			),
		);
		Ok(())
	}
}
