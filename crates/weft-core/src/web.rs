// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The port through which handlers reach the target web.
//!
//! Only [`WebClient::url`] and [`WebClient::web_info`] are required. Every
//! artifact operation defaults to [`WebError::Unsupported`], so a client only
//! implements what the handlers it is used with need.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::{ContentTypeDescriptor, WebInfo};
use crate::error::{WebError, WebResult};
use crate::schema::{ClientSidePage, ContentType, CustomAction, FieldReference, ListInstance, ListView};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
	pub id: String,
	pub internal_name: String,
	pub schema_xml: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInfo {
	pub id: String,
	pub title: String,
	/// Page the view renders on. Views created by a list view web part live on
	/// that web part's page.
	#[serde(default)]
	pub server_relative_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
	pub title: Option<String>,
	pub required: Option<bool>,
	pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NavigationLocation {
	QuickLaunch,
	TopNavigationBar,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationNodeInfo {
	pub id: u64,
	pub title: String,
	pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRequest {
	pub color_palette_url: String,
	pub font_scheme_url: String,
	pub background_image_url: Option<String>,
	pub share_generated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAddRequest {
	pub folder_server_relative_url: String,
	pub name: String,
	pub contents: String,
	pub overwrite: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPartRequest {
	pub title: String,
	pub zone: String,
	pub order: i32,
	pub xml: String,
}

fn unsupported<T>(operation: &str) -> WebResult<T> {
	Err(WebError::Unsupported(operation.to_string()))
}

/// A handle to the target web.
#[async_trait]
pub trait WebClient: Send + Sync {
	/// Absolute URL of the target web.
	fn url(&self) -> &str;

	/// Fetches the identity snapshot of the target web.
	async fn web_info(&self) -> WebResult<WebInfo>;

	/// List title to list id for every list on the web.
	async fn list_ids(&self) -> WebResult<BTreeMap<String, String>> {
		unsupported("list_ids")
	}

	/// Creates a list and returns its id.
	async fn add_list(&self, _list: &ListInstance) -> WebResult<String> {
		unsupported("add_list")
	}

	/// Updates an existing list's settings and returns its id.
	async fn ensure_list(&self, _list: &ListInstance) -> WebResult<String> {
		unsupported("ensure_list")
	}

	async fn list_content_type_ids(&self, _list_title: &str) -> WebResult<Vec<String>> {
		unsupported("list_content_type_ids")
	}

	async fn add_list_content_type(&self, _list_title: &str, _content_type_id: &str) -> WebResult<()> {
		unsupported("add_list_content_type")
	}

	async fn remove_list_content_type(&self, _list_title: &str, _content_type_id: &str) -> WebResult<()> {
		unsupported("remove_list_content_type")
	}

	async fn list_fields(&self, _list_title: &str) -> WebResult<Vec<FieldInfo>> {
		unsupported("list_fields")
	}

	async fn add_list_field(&self, _list_title: &str, _schema_xml: &str) -> WebResult<FieldInfo> {
		unsupported("add_list_field")
	}

	async fn update_list_field(&self, _list_title: &str, _field_id: &str, _update: &FieldUpdate) -> WebResult<()> {
		unsupported("update_list_field")
	}

	async fn delete_list_field(&self, _list_title: &str, _field_id: &str) -> WebResult<()> {
		unsupported("delete_list_field")
	}

	async fn get_view(&self, _list_title: &str, _view_title: &str) -> WebResult<Option<ViewInfo>> {
		unsupported("get_view")
	}

	async fn add_view(&self, _list_title: &str, _view: &ListView) -> WebResult<ViewInfo> {
		unsupported("add_view")
	}

	async fn update_view(&self, _list_title: &str, _view: &ListView) -> WebResult<()> {
		unsupported("update_view")
	}

	/// Replaces the fields shown by a view.
	async fn set_view_fields(&self, _list_title: &str, _view_title: &str, _fields: &[String]) -> WebResult<()> {
		unsupported("set_view_fields")
	}

	async fn list_views(&self, _list_title: &str) -> WebResult<Vec<ViewInfo>> {
		unsupported("list_views")
	}

	async fn web_fields(&self) -> WebResult<Vec<FieldInfo>> {
		unsupported("web_fields")
	}

	async fn add_site_field(&self, _schema_xml: &str) -> WebResult<FieldInfo> {
		unsupported("add_site_field")
	}

	async fn update_site_field(&self, _internal_name: &str, _schema_xml: &str) -> WebResult<()> {
		unsupported("update_site_field")
	}

	async fn content_types(&self) -> WebResult<Vec<ContentTypeDescriptor>> {
		unsupported("content_types")
	}

	async fn add_content_type(&self, _content_type: &ContentType) -> WebResult<()> {
		unsupported("add_content_type")
	}

	/// Updates name, description and group of an existing content type.
	async fn update_content_type(&self, _content_type_id: &str, _content_type: &ContentType) -> WebResult<()> {
		unsupported("update_content_type")
	}

	/// Adds a link from a content type to a site field by internal name.
	async fn add_field_link(&self, _content_type_id: &str, _field: &FieldReference) -> WebResult<()> {
		unsupported("add_field_link")
	}

	async fn update_field_link(&self, _content_type_id: &str, _link: &FieldReference) -> WebResult<()> {
		unsupported("update_field_link")
	}

	async fn activate_feature(&self, _feature_id: &str, _force: bool) -> WebResult<()> {
		unsupported("activate_feature")
	}

	async fn deactivate_feature(&self, _feature_id: &str, _force: bool) -> WebResult<()> {
		unsupported("deactivate_feature")
	}

	/// Downloads a source document referenced by a template.
	async fn fetch_source(&self, _url: &str) -> WebResult<String> {
		unsupported("fetch_source")
	}

	/// Uploads a file and returns its server-relative URL.
	async fn add_file(&self, _request: &FileAddRequest) -> WebResult<String> {
		unsupported("add_file")
	}

	async fn set_file_properties(&self, _file_url: &str, _properties: &Map<String, Value>) -> WebResult<()> {
		unsupported("set_file_properties")
	}

	async fn remove_web_parts(&self, _file_url: &str) -> WebResult<()> {
		unsupported("remove_web_parts")
	}

	async fn add_web_part(&self, _file_url: &str, _web_part: &WebPartRequest) -> WebResult<()> {
		unsupported("add_web_part")
	}

	async fn custom_action_titles(&self) -> WebResult<Vec<String>> {
		unsupported("custom_action_titles")
	}

	async fn add_custom_action(&self, _action: &CustomAction) -> WebResult<()> {
		unsupported("add_custom_action")
	}

	/// Nodes directly under `parent`, or the top level when `parent` is `None`.
	async fn navigation_nodes(
		&self,
		_location: NavigationLocation,
		_parent: Option<u64>,
	) -> WebResult<Vec<NavigationNodeInfo>> {
		unsupported("navigation_nodes")
	}

	async fn delete_navigation_node(&self, _location: NavigationLocation, _node_id: u64) -> WebResult<()> {
		unsupported("delete_navigation_node")
	}

	/// Adds a node and returns its id.
	async fn add_navigation_node(
		&self,
		_location: NavigationLocation,
		_parent: Option<u64>,
		_title: &str,
		_url: &str,
	) -> WebResult<u64> {
		unsupported("add_navigation_node")
	}

	async fn apply_theme(&self, _theme: &ThemeRequest) -> WebResult<()> {
		unsupported("apply_theme")
	}

	async fn update_web_settings(&self, _settings: &Map<String, Value>) -> WebResult<()> {
		unsupported("update_web_settings")
	}

	async fn set_welcome_page(&self, _page: &str) -> WebResult<()> {
		unsupported("set_welcome_page")
	}

	/// Whether the web allows writing its property bag.
	fn supports_property_bag(&self) -> bool {
		false
	}

	async fn set_property_bag(&self, _entries: &[(String, String)]) -> WebResult<()> {
		unsupported("set_property_bag")
	}

	async fn create_client_side_page(&self, _page: &ClientSidePage) -> WebResult<()> {
		unsupported("create_client_side_page")
	}
}
