// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::CustomAction;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

/// Adds user custom actions whose title is not already present on the web.
pub struct CustomActionsHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

impl CustomActionsHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::CustomActions, &settings),
			settings,
		}
	}
}

#[async_trait]
impl Handler for CustomActionsHandler {
	fn section(&self) -> Section {
		Section::CustomActions
	}

	async fn provision_objects(
		&self,
		web: &dyn WebClient,
		payload: &Value,
		context: &mut ProvisioningContext,
	) -> Result<(), HandlerError> {
		self
			.log
			.scoped(async {
				let actions: Vec<CustomAction> = parse_section(Section::CustomActions, payload)?;
				let existing = web.custom_action_titles().await?;

				for action in actions {
					if existing.contains(&action.title) {
						self.log.info(
							"ProvisionObjects",
							format!("Custom action '{}' already exists, skipping", action.title),
						);
						continue;
					}
					let action = CustomAction {
						url: self.settings.resolve_url_tokens(context, &action.url),
						..action
					};
					self
						.log
						.info("ProvisionObjects", format!("Adding custom action '{}'", action.title));
					web.add_custom_action(&action).await?;
				}
				Ok(())
			})
			.await
	}
}
