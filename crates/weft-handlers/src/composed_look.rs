// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::ComposedLook;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	ThemeRequest, WebClient,
};

/// Applies a theme. Theme file URLs are resolved and made host-relative.
pub struct ComposedLookHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

impl ComposedLookHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::ComposedLook, &settings),
			settings,
		}
	}

	fn relative_url(&self, context: &ProvisioningContext, url: &str) -> String {
		let resolved = self.settings.resolve_url_tokens(context, url);
		match self.settings.site_environment(context) {
			Some(env) => env.make_relative(&resolved),
			None => resolved,
		}
	}
}

#[async_trait]
impl Handler for ComposedLookHandler {
	fn section(&self) -> Section {
		Section::ComposedLook
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
				let look: ComposedLook = parse_section(Section::ComposedLook, payload)?;
				let theme = ThemeRequest {
					color_palette_url: self.relative_url(context, &look.color_palette_url),
					font_scheme_url: self.relative_url(context, &look.font_scheme_url),
					background_image_url: look
						.background_image_url
						.as_deref()
						.map(|url| self.relative_url(context, url)),
					share_generated: false,
				};
				self.log.info(
					"ProvisionObjects",
					format!("Applying theme {}", theme.color_palette_url),
				);
				web.apply_theme(&theme).await?;
				Ok(())
			})
			.await
	}
}
