// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use weft_core::schema::{ClientSideControl, ClientSidePage};
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

/// Creates modern pages with token-resolved control properties.
pub struct ClientSidePagesHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

/// Applies `resolve` to every string inside `value`, leaving keys untouched.
fn map_strings(value: &Value, resolve: &dyn Fn(&str) -> String) -> Value {
	match value {
		Value::String(s) => Value::String(resolve(s)),
		Value::Array(items) => Value::Array(items.iter().map(|v| map_strings(v, resolve)).collect()),
		Value::Object(map) => Value::Object(
			map
				.iter()
				.map(|(k, v)| (k.clone(), map_strings(v, resolve)))
				.collect(),
		),
		other => other.clone(),
	}
}

impl ClientSidePagesHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::ClientSidePages, &settings),
			settings,
		}
	}

	/// Properties get both token passes; server-processed content only the
	/// context pass.
	fn resolve_control(&self, context: &ProvisioningContext, control: &ClientSideControl) -> ClientSideControl {
		let resolve_all = |s: &str| self.settings.resolve_all(context, s);
		let properties: Map<String, Value> = control
			.properties
			.iter()
			.map(|(k, v)| (k.clone(), map_strings(v, &resolve_all)))
			.collect();
		let server_processed_content = control
			.server_processed_content
			.as_ref()
			.map(|content| self.settings.token_resolver(context).resolve_value(content));
		ClientSideControl {
			properties,
			server_processed_content,
			..control.clone()
		}
	}

	fn resolve_page(&self, context: &ProvisioningContext, page: &ClientSidePage) -> ClientSidePage {
		let mut resolved = page.clone();
		for section in &mut resolved.sections {
			for column in &mut section.columns {
				for control in &mut column.controls {
					*control = self.resolve_control(context, control);
				}
			}
		}
		for control in &mut resolved.vertical_section {
			*control = self.resolve_control(context, control);
		}
		resolved
	}
}

#[async_trait]
impl Handler for ClientSidePagesHandler {
	fn section(&self) -> Section {
		Section::ClientSidePages
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
				let pages: Vec<ClientSidePage> = parse_section(Section::ClientSidePages, payload)?;
				for page in &pages {
					self.log.info(
						"processClientSidePage",
						format!("Processing client side page {}", page.name),
					);
					let resolved = self.resolve_page(context, page);
					self.log.info(
						"processClientSidePage",
						format!("Saving client side page {}", page.name),
					);
					web.create_client_side_page(&resolved).await?;
				}
				Ok(())
			})
			.await
	}
}
