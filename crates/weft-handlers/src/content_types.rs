// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::{ContentType, FieldReference};
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient, WebError,
};

/// Creates or updates content types and their field links.
///
/// Content types are processed in ascending id order so that parents exist
/// before their children. Field-link failures are logged and do not fail the
/// handler.
pub struct ContentTypesHandler {
	log: HandlerLog,
}

impl ContentTypesHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::ContentTypes, &settings),
		}
	}

	async fn refresh(&self, web: &dyn WebClient, context: &mut ProvisioningContext) -> Result<(), WebError> {
		context.replace_content_types(web.content_types().await?);
		Ok(())
	}

	async fn process_content_type(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		content_type: &ContentType,
	) -> Result<(), HandlerError> {
		let known = if content_type.id.is_empty() {
			context.content_type(&content_type.name)
		} else {
			context.content_type(&content_type.id)
		};

		let id = match known {
			Some(existing) => {
				self.log.info(
					"processContentType",
					format!("Processing content type [{}] ({})", content_type.name, existing.id),
				);
				web.update_content_type(&existing.id, content_type).await?;
				existing.id.clone()
			}
			None if !content_type.id.is_empty() => {
				self.log.info(
					"addContentType",
					format!("Adding content type [{}] ({})", content_type.name, content_type.id),
				);
				web.add_content_type(content_type).await?;
				content_type.id.clone()
			}
			None => {
				return Err(HandlerError::Failed(format!(
					"Content type with name '{}' does not exist in the web.",
					content_type.name
				)))
			}
		};

		if !content_type.field_refs.is_empty() {
			self.process_field_refs(web, context, content_type, &id).await;
		}
		Ok(())
	}

	async fn process_field_refs(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		content_type: &ContentType,
		id: &str,
	) {
		let existing_links: &[FieldReference] = context
			.content_type(id)
			.map(|ct| ct.field_refs.as_slice())
			.unwrap_or_default();

		for field_ref in &content_type.field_refs {
			let name = field_ref.name.as_deref().unwrap_or_default();
			let existing = existing_links
				.iter()
				.find(|link| link.name.as_deref() == Some(name));

			let result = match existing {
				Some(link) => {
					let update = FieldReference {
						id: link.id.clone(),
						..field_ref.clone()
					};
					web.update_field_link(id, &update).await
				}
				None => {
					self.log.info(
						"processContentTypeFieldRefs",
						format!(
							"Adding field ref {name} to content type [{}] ({id})",
							content_type.name
						),
					);
					web.add_field_link(id, field_ref).await
				}
			};

			if let Err(e) = result {
				self.log.warn(
					"processContentTypeFieldRefs",
					format!(
						"Failed to process field ref {name} for content type [{}] ({id}): {e}",
						content_type.name
					),
				);
			}
		}
	}
}

#[async_trait]
impl Handler for ContentTypesHandler {
	fn section(&self) -> Section {
		Section::ContentTypes
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
				let mut content_types: Vec<ContentType> = parse_section(Section::ContentTypes, payload)?;
				content_types.sort_by(|a, b| a.id.cmp(&b.id));

				self.refresh(web, context).await?;
				for content_type in &content_types {
					self.process_content_type(web, context, content_type).await?;
				}
				self.refresh(web, context).await?;
				Ok(())
			})
			.await
	}
}
