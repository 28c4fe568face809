// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! An in-memory [`WebClient`] used for dry runs and tests.
//!
//! State lives behind a single lock and is fully inspectable through
//! [`MemoryWeb::state`] and [`MemoryWeb::snapshot`]. Every operation is
//! appended to [`WebState::calls`], and [`MemoryWeb::fail_on`] makes a named
//! operation return [`WebError::Remote`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use weft_core::schema::{ClientSidePage, ContentType, CustomAction, FieldReference, ListInstance, ListView};
use weft_core::{
	ContentTypeDescriptor, FieldInfo, FieldUpdate, FileAddRequest, NavigationLocation,
	NavigationNodeInfo, SiteEnvironment, ThemeRequest, ViewInfo, WebClient, WebError, WebInfo,
	WebPartRequest, WebResult,
};

use crate::ids::{is_child_content_type, same_id, FOLDER_CONTENT_TYPE_ID};
use crate::xml;

const ITEM_CONTENT_TYPE_ID: &str = "0x01";

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryView {
	pub id: String,
	pub title: String,
	pub personal: bool,
	pub fields: Vec<String>,
	pub settings: Map<String, Value>,
	pub server_relative_url: String,
}

impl MemoryView {
	fn info(&self) -> ViewInfo {
		ViewInfo {
			id: self.id.clone(),
			title: self.title.clone(),
			server_relative_url: self.server_relative_url.clone(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryList {
	pub id: String,
	pub title: String,
	pub description: String,
	pub template: i32,
	pub content_types_enabled: bool,
	pub settings: Map<String, Value>,
	pub content_type_ids: Vec<String>,
	pub fields: Vec<FieldInfo>,
	pub views: Vec<MemoryView>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryContentType {
	pub id: String,
	pub name: String,
	pub description: String,
	pub group: String,
	pub field_links: Vec<FieldReference>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryFile {
	pub server_relative_url: String,
	pub contents: String,
	pub properties: Map<String, Value>,
	pub web_parts: Vec<WebPartRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryNavigationNode {
	pub id: u64,
	pub location: NavigationLocation,
	pub parent: Option<u64>,
	pub title: String,
	pub url: String,
}

/// Everything the in-memory web knows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebState {
	pub info: WebInfo,
	pub lists: Vec<MemoryList>,
	pub site_fields: Vec<FieldInfo>,
	pub content_types: Vec<MemoryContentType>,
	pub features: BTreeSet<String>,
	/// Documents served by [`WebClient::fetch_source`], keyed by URL.
	pub sources: BTreeMap<String, String>,
	pub files: BTreeMap<String, MemoryFile>,
	pub custom_actions: Vec<CustomAction>,
	pub navigation: Vec<MemoryNavigationNode>,
	pub next_node_id: u64,
	pub content_type_seq: u64,
	pub theme: Option<ThemeRequest>,
	pub web_settings: Map<String, Value>,
	pub welcome_page: Option<String>,
	pub property_bag: BTreeMap<String, String>,
	pub pages: Vec<ClientSidePage>,
	/// Operation names in call order.
	pub calls: Vec<String>,
}

impl WebState {
	pub fn list(&self, title: &str) -> Option<&MemoryList> {
		self.lists.iter().find(|l| l.title == title)
	}

	fn list_mut(&mut self, title: &str) -> WebResult<&mut MemoryList> {
		self
			.lists
			.iter_mut()
			.find(|l| l.title == title)
			.ok_or_else(|| WebError::NotFound(format!("list '{title}'")))
	}

	fn content_type_mut(&mut self, id: &str) -> WebResult<&mut MemoryContentType> {
		self
			.content_types
			.iter_mut()
			.find(|ct| ct.id == id)
			.ok_or_else(|| WebError::NotFound(format!("content type '{id}'")))
	}

	/// Nodes under `parent` at `location`, in insertion order.
	pub fn navigation_children(&self, location: NavigationLocation, parent: Option<u64>) -> Vec<&MemoryNavigationNode> {
		self
			.navigation
			.iter()
			.filter(|n| n.location == location && n.parent == parent)
			.collect()
	}

	/// Mints the id of a list-scoped child of `parent`: `{parent}00{32 hex digits}`.
	fn child_content_type_id(&mut self, parent: &str) -> String {
		self.content_type_seq += 1;
		format!("{parent}00{:032X}", self.content_type_seq)
	}

	fn remove_node_tree(&mut self, id: u64) {
		let children: Vec<u64> = self
			.navigation
			.iter()
			.filter(|n| n.parent == Some(id))
			.map(|n| n.id)
			.collect();
		for child in children {
			self.remove_node_tree(child);
		}
		self.navigation.retain(|n| n.id != id);
	}
}

fn new_id() -> String {
	Uuid::new_v4().to_string()
}

fn field_from_xml(schema_xml: &str) -> WebResult<FieldInfo> {
	let internal_name = xml::attribute(schema_xml, "Name")
		.ok_or_else(|| WebError::Remote("field schema has no Name attribute".to_string()))?;
	let id = xml::attribute(schema_xml, "ID")
		.map(|id| id.trim_matches(|c| c == '{' || c == '}').to_string())
		.unwrap_or_else(new_id);
	Ok(FieldInfo {
		id,
		internal_name,
		schema_xml: schema_xml.to_string(),
	})
}

pub struct MemoryWeb {
	url: String,
	property_bag: bool,
	state: Mutex<WebState>,
	failing: Mutex<HashSet<String>>,
}

impl MemoryWeb {
	/// Creates an empty web at `url` with a fresh id.
	pub fn new(url: impl Into<String>) -> Self {
		let url = url.into();
		let server_relative_url = SiteEnvironment::from_site_url(&url)
			.map(|env| env.site_server_relative_url)
			.unwrap_or_default();
		let state = WebState {
			info: WebInfo {
				id: new_id(),
				title: String::new(),
				url: url.clone(),
				server_relative_url,
			},
			next_node_id: 1,
			..Default::default()
		};
		Self {
			url,
			property_bag: false,
			state: Mutex::new(state),
			failing: Mutex::new(HashSet::new()),
		}
	}

	pub fn with_property_bag_support(mut self) -> Self {
		self.property_bag = true;
		self
	}

	/// Serves `contents` for `url` from [`WebClient::fetch_source`].
	pub fn with_source(self, url: impl Into<String>, contents: impl Into<String>) -> Self {
		self.state.lock().sources.insert(url.into(), contents.into());
		self
	}

	/// Makes every later call to `operation` fail.
	pub fn fail_on(&self, operation: &str) {
		self.failing.lock().insert(operation.to_string());
	}

	pub fn state(&self) -> MutexGuard<'_, WebState> {
		self.state.lock()
	}

	pub fn snapshot(&self) -> WebState {
		self.state.lock().clone()
	}

	/// Operations called so far, in order.
	pub fn calls(&self) -> Vec<String> {
		self.state.lock().calls.clone()
	}

	fn begin(&self, operation: &str) -> WebResult<MutexGuard<'_, WebState>> {
		let mut state = self.state.lock();
		state.calls.push(operation.to_string());
		if self.failing.lock().contains(operation) {
			return Err(WebError::Remote(format!("{operation} failed")));
		}
		Ok(state)
	}
}

#[async_trait]
impl WebClient for MemoryWeb {
	fn url(&self) -> &str {
		&self.url
	}

	async fn web_info(&self) -> WebResult<WebInfo> {
		Ok(self.begin("web_info")?.info.clone())
	}

	async fn list_ids(&self) -> WebResult<BTreeMap<String, String>> {
		let state = self.begin("list_ids")?;
		Ok(state.lists.iter().map(|l| (l.title.clone(), l.id.clone())).collect())
	}

	async fn add_list(&self, list: &ListInstance) -> WebResult<String> {
		let mut state = self.begin("add_list")?;
		if state.list(&list.title).is_some() {
			return Err(WebError::AlreadyExists(format!("list '{}'", list.title)));
		}
		let id = new_id();
		let content_type_ids = vec![
			state.child_content_type_id(ITEM_CONTENT_TYPE_ID),
			state.child_content_type_id(FOLDER_CONTENT_TYPE_ID),
		];
		state.lists.push(MemoryList {
			id: id.clone(),
			title: list.title.clone(),
			description: list.description.clone(),
			template: list.template,
			content_types_enabled: list.content_types_enabled,
			settings: list.additional_settings.clone(),
			content_type_ids,
			fields: Vec::new(),
			views: vec![MemoryView {
				id: new_id(),
				title: "All Items".to_string(),
				..Default::default()
			}],
		});
		Ok(id)
	}

	async fn ensure_list(&self, list: &ListInstance) -> WebResult<String> {
		let mut state = self.begin("ensure_list")?;
		let existing = state.list_mut(&list.title)?;
		existing.description = list.description.clone();
		existing.template = list.template;
		existing.content_types_enabled = list.content_types_enabled;
		existing
			.settings
			.extend(list.additional_settings.iter().map(|(k, v)| (k.clone(), v.clone())));
		Ok(existing.id.clone())
	}

	async fn list_content_type_ids(&self, list_title: &str) -> WebResult<Vec<String>> {
		let mut state = self.begin("list_content_type_ids")?;
		Ok(state.list_mut(list_title)?.content_type_ids.clone())
	}

	async fn add_list_content_type(&self, list_title: &str, content_type_id: &str) -> WebResult<()> {
		let mut state = self.begin("add_list_content_type")?;
		if !state.content_types.iter().any(|ct| ct.id == content_type_id) {
			return Err(WebError::NotFound(format!("content type '{content_type_id}'")));
		}
		if state
			.list_mut(list_title)?
			.content_type_ids
			.iter()
			.any(|id| is_child_content_type(id, content_type_id))
		{
			return Err(WebError::AlreadyExists(format!(
				"content type '{content_type_id}' on list '{list_title}'"
			)));
		}
		let child = state.child_content_type_id(content_type_id);
		state.list_mut(list_title)?.content_type_ids.push(child);
		Ok(())
	}

	async fn remove_list_content_type(&self, list_title: &str, content_type_id: &str) -> WebResult<()> {
		let mut state = self.begin("remove_list_content_type")?;
		let list = state.list_mut(list_title)?;
		let before = list.content_type_ids.len();
		list.content_type_ids.retain(|id| id != content_type_id);
		if list.content_type_ids.len() == before {
			return Err(WebError::NotFound(format!("content type '{content_type_id}'")));
		}
		Ok(())
	}

	async fn list_fields(&self, list_title: &str) -> WebResult<Vec<FieldInfo>> {
		let mut state = self.begin("list_fields")?;
		Ok(state.list_mut(list_title)?.fields.clone())
	}

	async fn add_list_field(&self, list_title: &str, schema_xml: &str) -> WebResult<FieldInfo> {
		let mut state = self.begin("add_list_field")?;
		let field = field_from_xml(schema_xml)?;
		let list = state.list_mut(list_title)?;
		if list
			.fields
			.iter()
			.any(|f| same_id(&f.id, &field.id) || f.internal_name == field.internal_name)
		{
			return Err(WebError::AlreadyExists(format!("field '{}'", field.internal_name)));
		}
		list.fields.push(field.clone());
		Ok(field)
	}

	async fn update_list_field(&self, list_title: &str, field_id: &str, update: &FieldUpdate) -> WebResult<()> {
		let mut state = self.begin("update_list_field")?;
		let list = state.list_mut(list_title)?;
		let field = list
			.fields
			.iter_mut()
			.find(|f| same_id(&f.id, field_id))
			.ok_or_else(|| WebError::NotFound(format!("field '{field_id}'")))?;

		let mut attributes = Vec::new();
		let bool_attr = |b: bool| if b { "TRUE" } else { "FALSE" };
		if let Some(title) = &update.title {
			attributes.push(("DisplayName", title.as_str()));
		}
		if let Some(required) = update.required {
			attributes.push(("Required", bool_attr(required)));
		}
		if let Some(hidden) = update.hidden {
			attributes.push(("Hidden", bool_attr(hidden)));
		}
		field.schema_xml = xml::set_attributes(&field.schema_xml, &attributes)
			.map_err(|e| WebError::Remote(e.to_string()))?;
		Ok(())
	}

	async fn delete_list_field(&self, list_title: &str, field_id: &str) -> WebResult<()> {
		let mut state = self.begin("delete_list_field")?;
		let list = state.list_mut(list_title)?;
		let before = list.fields.len();
		list.fields.retain(|f| !same_id(&f.id, field_id));
		if list.fields.len() == before {
			return Err(WebError::NotFound(format!("field '{field_id}'")));
		}
		Ok(())
	}

	async fn get_view(&self, list_title: &str, view_title: &str) -> WebResult<Option<ViewInfo>> {
		let mut state = self.begin("get_view")?;
		Ok(state
			.list_mut(list_title)?
			.views
			.iter()
			.find(|v| v.title == view_title)
			.map(MemoryView::info))
	}

	async fn add_view(&self, list_title: &str, view: &ListView) -> WebResult<ViewInfo> {
		let mut state = self.begin("add_view")?;
		let list = state.list_mut(list_title)?;
		if list.views.iter().any(|v| v.title == view.title) {
			return Err(WebError::AlreadyExists(format!("view '{}'", view.title)));
		}
		let created = MemoryView {
			id: new_id(),
			title: view.title.clone(),
			personal: view.personal_view,
			fields: Vec::new(),
			settings: view.additional_settings.clone(),
			server_relative_url: String::new(),
		};
		let info = created.info();
		list.views.push(created);
		Ok(info)
	}

	async fn update_view(&self, list_title: &str, view: &ListView) -> WebResult<()> {
		let mut state = self.begin("update_view")?;
		let existing = state
			.list_mut(list_title)?
			.views
			.iter_mut()
			.find(|v| v.title == view.title)
			.ok_or_else(|| WebError::NotFound(format!("view '{}'", view.title)))?;
		existing
			.settings
			.extend(view.additional_settings.iter().map(|(k, v)| (k.clone(), v.clone())));
		Ok(())
	}

	async fn set_view_fields(&self, list_title: &str, view_title: &str, fields: &[String]) -> WebResult<()> {
		let mut state = self.begin("set_view_fields")?;
		let view = state
			.list_mut(list_title)?
			.views
			.iter_mut()
			.find(|v| v.title == view_title)
			.ok_or_else(|| WebError::NotFound(format!("view '{view_title}'")))?;
		view.fields = fields.to_vec();
		Ok(())
	}

	async fn list_views(&self, list_title: &str) -> WebResult<Vec<ViewInfo>> {
		let mut state = self.begin("list_views")?;
		Ok(state
			.list_mut(list_title)?
			.views
			.iter()
			.map(MemoryView::info)
			.collect())
	}

	async fn web_fields(&self) -> WebResult<Vec<FieldInfo>> {
		Ok(self.begin("web_fields")?.site_fields.clone())
	}

	async fn add_site_field(&self, schema_xml: &str) -> WebResult<FieldInfo> {
		let mut state = self.begin("add_site_field")?;
		let field = field_from_xml(schema_xml)?;
		if state
			.site_fields
			.iter()
			.any(|f| f.internal_name == field.internal_name)
		{
			return Err(WebError::AlreadyExists(format!("field '{}'", field.internal_name)));
		}
		state.site_fields.push(field.clone());
		Ok(field)
	}

	async fn update_site_field(&self, internal_name: &str, schema_xml: &str) -> WebResult<()> {
		let mut state = self.begin("update_site_field")?;
		let field = state
			.site_fields
			.iter_mut()
			.find(|f| f.internal_name == internal_name)
			.ok_or_else(|| WebError::NotFound(format!("field '{internal_name}'")))?;
		field.schema_xml = schema_xml.to_string();
		Ok(())
	}

	async fn content_types(&self) -> WebResult<Vec<ContentTypeDescriptor>> {
		let state = self.begin("content_types")?;
		Ok(state
			.content_types
			.iter()
			.map(|ct| ContentTypeDescriptor {
				id: ct.id.clone(),
				name: ct.name.clone(),
				field_refs: ct.field_links.clone(),
			})
			.collect())
	}

	async fn add_content_type(&self, content_type: &ContentType) -> WebResult<()> {
		let mut state = self.begin("add_content_type")?;
		if content_type.id.is_empty() {
			return Err(WebError::Remote(format!(
				"content type '{}' has no id",
				content_type.name
			)));
		}
		if state.content_types.iter().any(|ct| ct.id == content_type.id) {
			return Err(WebError::AlreadyExists(format!("content type '{}'", content_type.id)));
		}
		state.content_types.push(MemoryContentType {
			id: content_type.id.clone(),
			name: content_type.name.clone(),
			description: content_type.description.clone(),
			group: content_type.group.clone(),
			field_links: Vec::new(),
		});
		Ok(())
	}

	async fn update_content_type(&self, content_type_id: &str, content_type: &ContentType) -> WebResult<()> {
		let mut state = self.begin("update_content_type")?;
		let existing = state.content_type_mut(content_type_id)?;
		existing.name = content_type.name.clone();
		if !content_type.description.is_empty() {
			existing.description = content_type.description.clone();
		}
		if !content_type.group.is_empty() {
			existing.group = content_type.group.clone();
		}
		Ok(())
	}

	async fn add_field_link(&self, content_type_id: &str, field: &FieldReference) -> WebResult<()> {
		let mut state = self.begin("add_field_link")?;
		let name = field.name.clone().unwrap_or_default();
		let site_field_id = state
			.site_fields
			.iter()
			.find(|f| f.internal_name == name)
			.map(|f| f.id.clone())
			.ok_or_else(|| WebError::NotFound(format!("field '{name}'")))?;
		let content_type = state.content_type_mut(content_type_id)?;
		if content_type
			.field_links
			.iter()
			.any(|l| same_id(&l.id, &site_field_id))
		{
			return Err(WebError::AlreadyExists(format!("field link '{name}'")));
		}
		content_type.field_links.push(FieldReference {
			id: site_field_id,
			name: Some(name),
			required: field.required,
			hidden: field.hidden,
		});
		Ok(())
	}

	async fn update_field_link(&self, content_type_id: &str, link: &FieldReference) -> WebResult<()> {
		let mut state = self.begin("update_field_link")?;
		let existing = state
			.content_type_mut(content_type_id)?
			.field_links
			.iter_mut()
			.find(|l| same_id(&l.id, &link.id))
			.ok_or_else(|| WebError::NotFound(format!("field link '{}'", link.id)))?;
		if link.required.is_some() {
			existing.required = link.required;
		}
		if link.hidden.is_some() {
			existing.hidden = link.hidden;
		}
		Ok(())
	}

	async fn activate_feature(&self, feature_id: &str, force: bool) -> WebResult<()> {
		let mut state = self.begin("activate_feature")?;
		if !state.features.insert(feature_id.to_string()) && !force {
			return Err(WebError::AlreadyExists(format!("feature '{feature_id}'")));
		}
		Ok(())
	}

	async fn deactivate_feature(&self, feature_id: &str, force: bool) -> WebResult<()> {
		let mut state = self.begin("deactivate_feature")?;
		if !state.features.remove(feature_id) && !force {
			return Err(WebError::NotFound(format!("feature '{feature_id}'")));
		}
		Ok(())
	}

	async fn fetch_source(&self, url: &str) -> WebResult<String> {
		let state = self.begin("fetch_source")?;
		state
			.sources
			.get(url)
			.cloned()
			.ok_or_else(|| WebError::NotFound(format!("source '{url}'")))
	}

	async fn add_file(&self, request: &FileAddRequest) -> WebResult<String> {
		let mut state = self.begin("add_file")?;
		let url = format!(
			"{}/{}",
			request.folder_server_relative_url.trim_end_matches('/'),
			request.name
		);
		if state.files.contains_key(&url) && !request.overwrite {
			return Err(WebError::AlreadyExists(format!("file '{url}'")));
		}
		let file = state.files.entry(url.clone()).or_default();
		file.server_relative_url = url.clone();
		file.contents = request.contents.clone();
		Ok(url)
	}

	async fn set_file_properties(&self, file_url: &str, properties: &Map<String, Value>) -> WebResult<()> {
		let mut state = self.begin("set_file_properties")?;
		let file = state
			.files
			.get_mut(file_url)
			.ok_or_else(|| WebError::NotFound(format!("file '{file_url}'")))?;
		file
			.properties
			.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
		Ok(())
	}

	async fn remove_web_parts(&self, file_url: &str) -> WebResult<()> {
		let mut state = self.begin("remove_web_parts")?;
		state
			.files
			.get_mut(file_url)
			.ok_or_else(|| WebError::NotFound(format!("file '{file_url}'")))?
			.web_parts
			.clear();
		Ok(())
	}

	async fn add_web_part(&self, file_url: &str, web_part: &WebPartRequest) -> WebResult<()> {
		let mut state = self.begin("add_web_part")?;
		state
			.files
			.get_mut(file_url)
			.ok_or_else(|| WebError::NotFound(format!("file '{file_url}'")))?
			.web_parts
			.push(web_part.clone());
		Ok(())
	}

	async fn custom_action_titles(&self) -> WebResult<Vec<String>> {
		let state = self.begin("custom_action_titles")?;
		Ok(state.custom_actions.iter().map(|a| a.title.clone()).collect())
	}

	async fn add_custom_action(&self, action: &CustomAction) -> WebResult<()> {
		self.begin("add_custom_action")?.custom_actions.push(action.clone());
		Ok(())
	}

	async fn navigation_nodes(
		&self,
		location: NavigationLocation,
		parent: Option<u64>,
	) -> WebResult<Vec<NavigationNodeInfo>> {
		let state = self.begin("navigation_nodes")?;
		Ok(state
			.navigation_children(location, parent)
			.into_iter()
			.map(|n| NavigationNodeInfo {
				id: n.id,
				title: n.title.clone(),
				url: n.url.clone(),
			})
			.collect())
	}

	async fn delete_navigation_node(&self, location: NavigationLocation, node_id: u64) -> WebResult<()> {
		let mut state = self.begin("delete_navigation_node")?;
		if !state
			.navigation
			.iter()
			.any(|n| n.id == node_id && n.location == location)
		{
			return Err(WebError::NotFound(format!("navigation node {node_id}")));
		}
		state.remove_node_tree(node_id);
		Ok(())
	}

	async fn add_navigation_node(
		&self,
		location: NavigationLocation,
		parent: Option<u64>,
		title: &str,
		url: &str,
	) -> WebResult<u64> {
		let mut state = self.begin("add_navigation_node")?;
		if let Some(parent) = parent {
			if !state.navigation.iter().any(|n| n.id == parent) {
				return Err(WebError::NotFound(format!("navigation node {parent}")));
			}
		}
		let id = state.next_node_id;
		state.next_node_id += 1;
		state.navigation.push(MemoryNavigationNode {
			id,
			location,
			parent,
			title: title.to_string(),
			url: url.to_string(),
		});
		Ok(id)
	}

	async fn apply_theme(&self, theme: &ThemeRequest) -> WebResult<()> {
		self.begin("apply_theme")?.theme = Some(theme.clone());
		Ok(())
	}

	async fn update_web_settings(&self, settings: &Map<String, Value>) -> WebResult<()> {
		let mut state = self.begin("update_web_settings")?;
		if let Some(Value::String(title)) = settings.get("Title") {
			state.info.title = title.clone();
		}
		state
			.web_settings
			.extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
		Ok(())
	}

	async fn set_welcome_page(&self, page: &str) -> WebResult<()> {
		self.begin("set_welcome_page")?.welcome_page = Some(page.to_string());
		Ok(())
	}

	fn supports_property_bag(&self) -> bool {
		self.property_bag
	}

	async fn set_property_bag(&self, entries: &[(String, String)]) -> WebResult<()> {
		let mut state = self.begin("set_property_bag")?;
		if !self.property_bag {
			return Err(WebError::Unsupported("set_property_bag".to_string()));
		}
		state.property_bag.extend(entries.iter().cloned());
		Ok(())
	}

	async fn create_client_side_page(&self, page: &ClientSidePage) -> WebResult<()> {
		let mut state = self.begin("create_client_side_page")?;
		match state.pages.iter().position(|p| p.name == page.name) {
			Some(_) if !page.overwrite => Err(WebError::AlreadyExists(format!("page '{}'", page.name))),
			Some(index) => {
				state.pages[index] = page.clone();
				Ok(())
			}
			None => {
				state.pages.push(page.clone());
				Ok(())
			}
		}
	}
}
