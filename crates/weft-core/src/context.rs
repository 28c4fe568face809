// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run-scoped lookup state shared by every handler in a provisioning run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::FieldReference;

/// Identity snapshot of the target web, taken once at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebInfo {
	pub id: String,
	pub title: String,
	/// Absolute URL of the web.
	pub url: String,
	pub server_relative_url: String,
}

/// Content type as known on the target web.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
	pub id: String,
	pub name: String,
	pub field_refs: Vec<FieldReference>,
}

/// Identifiers discovered or minted during a run.
///
/// Handlers write here whenever they create or discover something a later
/// handler, or token resolution, will need. Entries are authoritative until a
/// handler overwrites them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningContext {
	pub web: WebInfo,
	/// List title to list id.
	pub lists: BTreeMap<String, String>,
	/// `"{ListTitle}|{ViewTitle}"` to view id.
	pub list_views: BTreeMap<String, String>,
	/// Field internal name to field id.
	pub site_fields: BTreeMap<String, String>,
	/// Keyed by both content type name and content type id.
	pub content_types: BTreeMap<String, ContentTypeDescriptor>,
}

impl ProvisioningContext {
	pub fn new(web: WebInfo) -> Self {
		Self {
			web,
			..Default::default()
		}
	}

	pub fn list_view_key(list_title: &str, view_title: &str) -> String {
		format!("{list_title}|{view_title}")
	}

	pub fn list_id(&self, title: &str) -> Option<&str> {
		self.lists.get(title).map(String::as_str)
	}

	pub fn insert_list_view(&mut self, list_title: &str, view_title: &str, view_id: impl Into<String>) {
		self
			.list_views
			.insert(Self::list_view_key(list_title, view_title), view_id.into());
	}

	pub fn list_view_id(&self, list_title: &str, view_title: &str) -> Option<&str> {
		self
			.list_views
			.get(&Self::list_view_key(list_title, view_title))
			.map(String::as_str)
	}

	/// Registers a content type under both its name and its id.
	pub fn insert_content_type(&mut self, descriptor: ContentTypeDescriptor) {
		self
			.content_types
			.insert(descriptor.name.clone(), descriptor.clone());
		self.content_types.insert(descriptor.id.clone(), descriptor);
	}

	/// Looks up a content type by name or id.
	pub fn content_type(&self, name_or_id: &str) -> Option<&ContentTypeDescriptor> {
		self.content_types.get(name_or_id)
	}

	/// Replaces all known content types.
	pub fn replace_content_types(&mut self, descriptors: impl IntoIterator<Item = ContentTypeDescriptor>) {
		self.content_types.clear();
		for descriptor in descriptors {
			self.insert_content_type(descriptor);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn web() -> WebInfo {
		WebInfo {
			id: "web-1".to_string(),
			title: "Project".to_string(),
			url: "https://contoso.example/sites/project".to_string(),
			server_relative_url: "/sites/project".to_string(),
		}
	}

	#[test]
	fn new_context_only_carries_web() {
		let ctx = ProvisioningContext::new(web());
		assert_eq!(ctx.web.id, "web-1");
		assert!(ctx.lists.is_empty());
		assert!(ctx.list_views.is_empty());
		assert!(ctx.site_fields.is_empty());
		assert!(ctx.content_types.is_empty());
	}

	#[test]
	fn list_views_use_composite_key() {
		let mut ctx = ProvisioningContext::new(web());
		ctx.insert_list_view("Tasks", "All Items", "view-1");
		assert_eq!(ctx.list_views.get("Tasks|All Items").map(String::as_str), Some("view-1"));
		assert_eq!(ctx.list_view_id("Tasks", "All Items"), Some("view-1"));
		assert_eq!(ctx.list_view_id("Tasks", "Other"), None);
	}

	#[test]
	fn content_types_are_dual_keyed() {
		let mut ctx = ProvisioningContext::new(web());
		ctx.insert_content_type(ContentTypeDescriptor {
			id: "0x0100AB".to_string(),
			name: "Project Item".to_string(),
			field_refs: Vec::new(),
		});
		assert_eq!(ctx.content_type("0x0100AB").unwrap().name, "Project Item");
		assert_eq!(ctx.content_type("Project Item").unwrap().id, "0x0100AB");
	}

	#[test]
	fn replace_content_types_drops_stale_entries() {
		let mut ctx = ProvisioningContext::new(web());
		ctx.insert_content_type(ContentTypeDescriptor {
			id: "0x01".to_string(),
			name: "Old".to_string(),
			field_refs: Vec::new(),
		});
		ctx.replace_content_types(vec![ContentTypeDescriptor {
			id: "0x0101".to_string(),
			name: "Document".to_string(),
			field_refs: Vec::new(),
		}]);
		assert!(ctx.content_type("Old").is_none());
		assert!(ctx.content_type("Document").is_some());
		assert_eq!(ctx.content_types.len(), 2);
	}
}
