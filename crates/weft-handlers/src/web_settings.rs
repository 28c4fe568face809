// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::WebSettings;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

/// Applies web properties. `WelcomePage` goes to the root folder, everything
/// else to the web.
pub struct WebSettingsHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

impl WebSettingsHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::WebSettings, &settings),
			settings,
		}
	}
}

#[async_trait]
impl Handler for WebSettingsHandler {
	fn section(&self) -> Section {
		Section::WebSettings
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
				let mut web_settings: WebSettings = parse_section(Section::WebSettings, payload)?;

				for (key, value) in web_settings.settings.iter_mut() {
					if let Value::String(s) = value {
						*s = self.settings.resolve_url_tokens(context, s);
						self
							.log
							.info("ProvisionObjects", format!("Setting value of {key} to {s}."));
					}
				}

				if let Some(page) = &web_settings.welcome_page {
					let page = self.settings.resolve_url_tokens(context, page);
					self
						.log
						.info("ProvisionObjects", format!("Setting value of WelcomePage to {page}."));
					web.set_welcome_page(&page).await?;
				}
				if !web_settings.settings.is_empty() {
					web.update_web_settings(&web_settings.settings).await?;
				}
				Ok(())
			})
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryWeb;
	use crate::test_support::{context, settings};
	use serde_json::json;

	#[tokio::test]
	async fn splits_welcome_page_from_web_properties() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		let mut ctx = context(&web).await;

		WebSettingsHandler::new(settings())
			.provision_objects(
				&web,
				&json!({
					"WelcomePage": "SitePages/Home.aspx",
					"AlternateCssUrl": "{site}/SiteAssets/site.css",
					"QuickLaunchEnabled": false
				}),
				&mut ctx,
			)
			.await
			.unwrap();

		let state = web.snapshot();
		assert_eq!(state.welcome_page.as_deref(), Some("SitePages/Home.aspx"));
		assert_eq!(state.web_settings["AlternateCssUrl"], "/sites/a/SiteAssets/site.css");
		assert_eq!(state.web_settings["QuickLaunchEnabled"], false);
		assert!(!state.web_settings.contains_key("WelcomePage"));
	}

	#[tokio::test]
	async fn welcome_page_only_skips_web_update() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		let mut ctx = context(&web).await;

		WebSettingsHandler::new(settings())
			.provision_objects(&web, &json!({"WelcomePage": "Home.aspx"}), &mut ctx)
			.await
			.unwrap();

		assert!(!web.calls().contains(&"update_web_settings".to_string()));
	}
}
