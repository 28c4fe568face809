// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

use crate::xml;

/// Creates or updates site fields from schema XML fragments.
///
/// Known fields are matched on their `Name` attribute against the web's
/// internal names, refreshed into the context before any field is processed.
pub struct SiteFieldsHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

impl SiteFieldsHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::SiteFields, &settings),
			settings,
		}
	}

	async fn process_site_field(
		&self,
		web: &dyn WebClient,
		context: &mut ProvisioningContext,
		schema_xml: &str,
	) -> Result<(), HandlerError> {
		let schema_xml = self.settings.token_resolver(context).resolve(schema_xml);
		let name = xml::attribute(&schema_xml, "Name").ok_or_else(|| {
			HandlerError::Failed(format!("site field schema has no Name attribute: {schema_xml}"))
		})?;
		let display_name = xml::attribute(&schema_xml, "DisplayName").unwrap_or_else(|| name.clone());

		if context.site_fields.contains_key(&name) {
			self
				.log
				.info("processSiteField", format!("Updating site field {display_name}"));
			web.update_site_field(&name, &schema_xml).await?;
		} else {
			self
				.log
				.info("processSiteField", format!("Adding site field {display_name}"));
			let field = web.add_site_field(&schema_xml).await?;
			context.site_fields.insert(field.internal_name, field.id);
		}
		Ok(())
	}
}

#[async_trait]
impl Handler for SiteFieldsHandler {
	fn section(&self) -> Section {
		Section::SiteFields
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
				let fields: Vec<String> = parse_section(Section::SiteFields, payload)?;
				context.site_fields = web
					.web_fields()
					.await?
					.into_iter()
					.map(|f| (f.internal_name, f.id))
					.collect();
				for schema_xml in &fields {
					self.process_site_field(web, context, schema_xml).await?;
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
	async fn adds_new_and_updates_known_fields() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		web.add_site_field(r#"<Field ID="{1}" Name="Status" DisplayName="Status" Type="Text" />"#)
			.await
			.unwrap();
		let mut ctx = context(&web).await;
		ctx.lists.insert("Projects".to_string(), "LIST-1".to_string());

		SiteFieldsHandler::new(settings())
			.provision_objects(
				&web,
				&json!([
					r#"<Field ID="{1}" Name="Status" DisplayName="Status" Type="Choice" />"#,
					r#"<Field ID="{2}" Name="Project" DisplayName="Project" Type="Lookup" List="{listid:Projects}" />"#
				]),
				&mut ctx,
			)
			.await
			.unwrap();

		let fields = web.snapshot().site_fields;
		assert_eq!(fields.len(), 2);
		assert_eq!(xml::attribute(&fields[0].schema_xml, "Type").as_deref(), Some("Choice"));
		assert_eq!(xml::attribute(&fields[1].schema_xml, "List").as_deref(), Some("LIST-1"));
		assert_eq!(ctx.site_fields.get("Project").map(String::as_str), Some("2"));
		assert_eq!(ctx.site_fields.get("Status").map(String::as_str), Some("1"));
	}

	#[tokio::test]
	async fn missing_name_fails() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		let mut ctx = context(&web).await;
		let result = SiteFieldsHandler::new(settings())
			.provision_objects(&web, &json!([r#"<Field Type="Text" />"#]), &mut ctx)
			.await;
		assert!(matches!(result, Err(HandlerError::Failed(_))));
	}
}
