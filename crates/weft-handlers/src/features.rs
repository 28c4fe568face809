// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::Feature;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

/// Activates or deactivates features in template order.
pub struct FeaturesHandler {
	log: HandlerLog,
}

impl FeaturesHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::Features, &settings),
		}
	}
}

#[async_trait]
impl Handler for FeaturesHandler {
	fn section(&self) -> Section {
		Section::Features
	}

	async fn provision_objects(
		&self,
		web: &dyn WebClient,
		payload: &Value,
		_context: &mut ProvisioningContext,
	) -> Result<(), HandlerError> {
		self
			.log
			.scoped(async {
				let features: Vec<Feature> = parse_section(Section::Features, payload)?;
				for feature in &features {
					if feature.deactivate {
						self.log.info("ProvisionObjects", format!("Deactivating feature {}", feature.id));
						web.deactivate_feature(&feature.id, feature.force).await?;
					} else {
						self.log.info("ProvisionObjects", format!("Activating feature {}", feature.id));
						web.activate_feature(&feature.id, feature.force).await?;
					}
				}
				Ok(())
			})
			.await
	}
}
