// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tracing::{error, info, instrument};
use weft_config::ProvisioningConfig;
use weft_core::{Handler, HandlerSettings, ProvisioningContext, Section, Template, WebClient};

use crate::error::{ProvisioningError, Result};
use crate::plan::plan_operations;
use crate::registry::{HandlerRegistry, HandlerSort};

/// Lifecycle of a [`WebProvisioner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionerState {
	Unconfigured,
	Configured,
	Running,
	Completed,
	Failed,
}

/// Applies site templates to one target web.
///
/// Handlers run one at a time in priority order and share a single
/// [`ProvisioningContext`]. The first handler failure aborts the run.
pub struct WebProvisioner {
	web: Arc<dyn WebClient>,
	config: Option<ProvisioningConfig>,
	custom_handlers: Vec<Arc<dyn Handler>>,
	handler_sort: Option<HandlerSort>,
	context: ProvisioningContext,
	state: ProvisionerState,
}

impl WebProvisioner {
	pub fn new(web: Arc<dyn WebClient>) -> Self {
		Self {
			web,
			config: None,
			custom_handlers: Vec::new(),
			handler_sort: None,
			context: ProvisioningContext::default(),
			state: ProvisionerState::Unconfigured,
		}
	}

	/// Validates and stores the configuration used by every later run. A
	/// rejected config leaves the provisioner as it was.
	pub fn setup(&mut self, config: ProvisioningConfig) -> Result<&mut Self> {
		config.validate()?;
		info!(
			disabled = config.handlers.disabled.len(),
			overrides = config.handlers.priorities.len(),
			"Provisioner configured"
		);
		self.config = Some(config);
		self.state = ProvisionerState::Configured;
		Ok(self)
	}

	/// Replaces the built-in sort table. Priority overrides from the
	/// configuration still apply on top of it.
	pub fn with_handler_sort(&mut self, sort: HandlerSort) -> &mut Self {
		self.handler_sort = Some(sort);
		self
	}

	/// Uses `handler` for its section instead of the built-in one.
	///
	/// A section disabled in the configuration stays disabled.
	pub fn register_handler(&mut self, handler: Arc<dyn Handler>) -> &mut Self {
		self.custom_handlers.push(handler);
		self
	}

	pub fn state(&self) -> ProvisionerState {
		self.state
	}

	/// Context of the most recent run.
	pub fn context(&self) -> &ProvisioningContext {
		&self.context
	}

	pub fn config(&self) -> Option<&ProvisioningConfig> {
		self.config.as_ref()
	}

	fn handler_settings(config: &ProvisioningConfig, template: &Template) -> HandlerSettings {
		let mut parameters = template.parameters();
		parameters.extend(config.parameters.clone());
		HandlerSettings {
			log_prefix: config.logging.prefix.clone(),
			parameters,
			environment: config.environment.site_environment(),
			poll_interval: config.polling.interval(),
			max_poll_attempts: config.polling.max_attempts,
		}
	}

	fn build_registry(&self, config: &ProvisioningConfig, template: &Template) -> HandlerRegistry {
		let settings = Arc::new(Self::handler_settings(config, template));
		let mut registry = HandlerRegistry::from_config(&config.handlers, settings);
		if let Some(sort) = &self.handler_sort {
			*registry.sort_mut() = sort.clone().with_overrides(&config.handlers.priorities);
		}
		for handler in &self.custom_handlers {
			if !config.handlers.is_disabled(handler.section()) {
				registry.register(handler.clone());
			}
		}
		registry
	}

	/// The sections [`Self::apply_template`] would run, in order.
	pub fn plan(&self, template: &Template, handler_names: Option<&[Section]>) -> Result<Vec<Section>> {
		let config = self.config.as_ref().ok_or(ProvisioningError::NotConfigured)?;
		let registry = self.build_registry(config, template);
		Ok(plan_operations(template, handler_names, &registry))
	}

	/// Provisions `template` onto the target web.
	///
	/// `progress` is called with each section just before its handler runs.
	#[instrument(skip(self, template, progress), fields(web = %self.web.url()))]
	pub async fn apply_template(
		&mut self,
		template: &Template,
		handler_names: Option<&[Section]>,
		progress: Option<&mut (dyn FnMut(Section) + Send)>,
	) -> Result<()> {
		let config = self.config.clone().ok_or(ProvisioningError::NotConfigured)?;

		self.state = ProvisionerState::Running;
		let result = self.run(&config, template, handler_names, progress).await;
		self.state = match result {
			Ok(()) => ProvisionerState::Completed,
			Err(_) => ProvisionerState::Failed,
		};
		result
	}

	async fn run(
		&mut self,
		config: &ProvisioningConfig,
		template: &Template,
		handler_names: Option<&[Section]>,
		mut progress: Option<&mut (dyn FnMut(Section) + Send)>,
	) -> Result<()> {
		let registry = self.build_registry(config, template);
		// Cleared first so a failed snapshot leaves no context from an earlier run.
		self.context = ProvisioningContext::default();
		let web = self.web.web_info().await?;
		self.context = ProvisioningContext::new(web);

		let operations = plan_operations(template, handler_names, &registry);
		info!(
			operations = operations.len(),
			web_id = %self.context.web.id,
			"Applying template"
		);

		for section in operations {
			let (Some(handler), Some(payload)) = (registry.get(section), template.section(section.as_str())) else {
				continue;
			};
			if let Some(report) = progress.as_deref_mut() {
				report(section);
			}
			info!(handler = %section, "Running handler");
			handler
				.provision_objects(self.web.as_ref(), payload, &mut self.context)
				.await
				.map_err(|source| {
					error!(handler = %section, error = %source, "Handler failed");
					ProvisioningError::Handler {
						handler: section,
						source,
					}
				})?;
		}

		info!("Template applied");
		Ok(())
	}
}
