// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lists and their content type bindings, fields, field references and views.
//!
//! Work happens in passes over all lists: ensure each list and bind its
//! content types, then list fields, then field references, then views. Each
//! pass completes for every list before the next begins, so a field on one
//! list may look up another list created in the first pass.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::{ListFieldReference, ListInstance, ListView};
use weft_core::{
	parse_section, FieldInfo, FieldUpdate, Handler, HandlerError, HandlerLog, HandlerSettings,
	ProvisioningContext, Section, WebClient, WebError,
};

use crate::ids::{same_id, FOLDER_CONTENT_TYPE_ID};
use crate::xml;

pub struct ListsHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

impl ListsHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::Lists, &settings),
			settings,
		}
	}

	async fn refresh_lists(&self, web: &dyn WebClient, context: &mut ProvisioningContext) -> Result<(), WebError> {
		context.lists = web.list_ids().await?;
		Ok(())
	}

	async fn process_list(
		&self,
		web: &dyn WebClient,
		context: &mut ProvisioningContext,
		list: &ListInstance,
	) -> Result<(), HandlerError> {
		self.log.info("processList", format!("Processing list {}", list.title));
		if context.lists.contains_key(&list.title) {
			self.log.info(
				"processList",
				format!("List {} already exists. Ensuring...", list.title),
			);
			web.ensure_list(list).await?;
		} else {
			self.log.info(
				"processList",
				format!("List {} doesn't exist. Creating...", list.title),
			);
			let id = web.add_list(list).await?;
			context.lists.insert(list.title.clone(), id);
		}

		if !list.content_type_bindings.is_empty() {
			self.process_content_type_bindings(web, list).await?;
		}
		Ok(())
	}

	async fn process_content_type_bindings(&self, web: &dyn WebClient, list: &ListInstance) -> Result<(), HandlerError> {
		self.log.info(
			"processContentTypeBindings",
			format!("Processing content types for list {}.", list.title),
		);
		for binding in &list.content_type_bindings {
			let ct_id = &binding.content_type_id;
			match web.add_list_content_type(&list.title, ct_id).await {
				Ok(()) => self.log.info(
					"processContentTypeBinding",
					format!("Content Type {ct_id} added successfully to list {}.", list.title),
				),
				Err(e) => self.log.info(
					"processContentTypeBinding",
					format!("Failed to add Content Type {ct_id} to list {}: {e}", list.title),
				),
			}
		}

		if !list.remove_existing_content_types {
			return Ok(());
		}

		for ct_id in web.list_content_type_ids(&list.title).await? {
			let bound = list
				.content_type_bindings
				.iter()
				.any(|b| ct_id.contains(&b.content_type_id));
			if bound || ct_id.contains(FOLDER_CONTENT_TYPE_ID) {
				self.log.info(
					"processContentTypeBindings",
					format!("Skipping removal of content type {ct_id} from list {}", list.title),
				);
				continue;
			}
			self.log.info(
				"processContentTypeBindings",
				format!("Removing content type {ct_id} from list {}", list.title),
			);
			web.remove_list_content_type(&list.title, &ct_id).await?;
		}
		Ok(())
	}

	/// Recreates a list field. Failures are logged, never returned.
	async fn process_field(&self, web: &dyn WebClient, context: &ProvisioningContext, list: &ListInstance, field_xml: &str) {
		let name = xml::attribute(field_xml, "Name").unwrap_or_default();
		let display_name = xml::attribute(field_xml, "DisplayName").unwrap_or_else(|| name.clone());
		self.log.info(
			"processField",
			format!("Processing field {name} ({display_name}) for list {}.", list.title),
		);

		if let Some(id) = xml::attribute(field_xml, "ID") {
			match web.delete_list_field(&list.title, &id).await {
				Ok(()) => self.log.info(
					"processField",
					format!("Field {name} ({display_name}) successfully deleted from list {}.", list.title),
				),
				Err(_) => self.log.info(
					"processField",
					format!("Field {name} ({display_name}) does not exist in list {}.", list.title),
				),
			}
		}

		let created = async {
			let schema_xml = xml::set_attribute(field_xml, "DisplayName", &name)?;
			let schema_xml = self.settings.token_resolver(context).resolve(&schema_xml);
			let field = web.add_list_field(&list.title, &schema_xml).await?;
			let update = FieldUpdate {
				title: Some(display_name.clone()),
				..Default::default()
			};
			web.update_list_field(&list.title, &field.id, &update).await?;
			Ok::<_, HandlerError>(())
		}
		.await;

		match created {
			Ok(()) => self.log.info(
				"processField",
				format!("Field '{display_name}' added successfully to list {}.", list.title),
			),
			Err(e) => self.log.info(
				"processField",
				format!("Failed to add field '{display_name}' to list {}: {e}", list.title),
			),
		}
	}

	async fn process_field_refs(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		list: &ListInstance,
	) -> Result<(), HandlerError> {
		self.log.info(
			"processListFieldRefs",
			format!("Retrieving fields for list {} and web.", list.title),
		);
		let list_fields = web.list_fields(&list.title).await?;
		let web_fields = web.web_fields().await?;

		for field_ref in &list.field_refs {
			self.process_field_ref(web, context, list, field_ref, &list_fields, &web_fields)
				.await?;
		}
		Ok(())
	}

	async fn process_field_ref(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		list: &ListInstance,
		field_ref: &ListFieldReference,
		list_fields: &[FieldInfo],
		web_fields: &[FieldInfo],
	) -> Result<(), HandlerError> {
		self.log.info(
			"processFieldRef",
			format!("Processing field ref '{}' for list {}.", field_ref.id, list.title),
		);
		let update = FieldUpdate {
			title: field_ref.display_name.clone(),
			required: field_ref.required,
			hidden: field_ref.hidden,
		};

		if let Some(existing) = list_fields.iter().find(|f| same_id(&f.id, &field_ref.id)) {
			web.update_list_field(&list.title, &existing.id, &update).await?;
			self.log.info(
				"processFieldRef",
				format!("Field '{}' updated for list {}.", field_ref.id, list.title),
			);
			return Ok(());
		}

		let Some(site_field) = web_fields.iter().find(|f| same_id(&f.id, &field_ref.id)) else {
			self.log.warn(
				"processFieldRef",
				format!("Field '{}' exists neither on list {} nor on the web.", field_ref.id, list.title),
			);
			return Ok(());
		};

		self.log.info(
			"processFieldRef",
			format!("Adding field '{}' to list {}.", field_ref.id, list.title),
		);
		let display_name = field_ref
			.name
			.clone()
			.unwrap_or_else(|| site_field.internal_name.clone());
		let source_id = format!("{{{}}}", context.list_id(&list.title).unwrap_or_default());
		let schema_xml = xml::set_attributes(
			&site_field.schema_xml,
			&[("DisplayName", &display_name), ("SourceID", &source_id)],
		)?;
		let field = web.add_list_field(&list.title, &schema_xml).await?;
		web.update_list_field(&list.title, &field.id, &update).await?;
		self.log.info(
			"processFieldRef",
			format!("Field '{}' added from web.", field_ref.id),
		);
		Ok(())
	}

	/// Updates or creates a view and sets its fields. Failures are logged.
	async fn process_view(&self, web: &dyn WebClient, list: &ListInstance, view: &ListView) {
		self.log.info(
			"processView",
			format!("Processing view {} for list {}.", view.title, list.title),
		);
		let result = async {
			match web.get_view(&list.title, &view.title).await? {
				Some(_) => {
					self.log.info(
						"processView",
						format!("View {} for list {} already exists, updating.", view.title, list.title),
					);
					web.update_view(&list.title, view).await?;
				}
				None => {
					self.log.info(
						"processView",
						format!("View {} for list {} doesn't exist, creating.", view.title, list.title),
					);
					web.add_view(&list.title, view).await?;
				}
			}
			self.process_view_fields(web, list, view).await;
			Ok::<_, WebError>(())
		}
		.await;

		if let Err(e) = result {
			self.log.info(
				"processView",
				format!("Failed to process view {} for list {}: {e}", view.title, list.title),
			);
		}
	}

	async fn process_view_fields(&self, web: &dyn WebClient, list: &ListInstance, view: &ListView) {
		match web.set_view_fields(&list.title, &view.title, &view.view_fields).await {
			Ok(()) => self.log.info(
				"processViewFields",
				format!("View fields successfully processed for view {}.", view.title),
			),
			Err(e) => self.log.info(
				"processViewFields",
				format!("Failed to process view fields for view {}: {e}", view.title),
			),
		}
	}

	async fn process_views(
		&self,
		web: &dyn WebClient,
		context: &mut ProvisioningContext,
		list: &ListInstance,
	) -> Result<(), HandlerError> {
		for view in &list.views {
			self.process_view(web, list, view).await;
		}
		for view in web.list_views(&list.title).await? {
			context.insert_list_view(&list.title, &view.title, view.id);
		}
		Ok(())
	}
}

#[async_trait]
impl Handler for ListsHandler {
	fn section(&self) -> Section {
		Section::Lists
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
				let lists: Vec<ListInstance> = parse_section(Section::Lists, payload)?;

				self.refresh_lists(web, context).await?;
				for list in &lists {
					self.process_list(web, context, list).await?;
				}
				for list in &lists {
					for field_xml in &list.fields {
						self.process_field(web, context, list, field_xml).await;
					}
				}
				for list in lists.iter().filter(|l| !l.field_refs.is_empty()) {
					self.process_field_refs(web, context, list).await?;
				}
				for list in &lists {
					self.process_views(web, context, list).await?;
				}
				self.refresh_lists(web, context).await?;
				Ok(())
			})
			.await
	}
}
