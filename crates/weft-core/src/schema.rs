// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Template document and typed section payloads.
//!
//! A [`Template`] is a JSON object whose top-level keys are section names. The
//! orchestrator only ever reads whole sections; handlers deserialize their
//! payload into the typed structs below with [`parse_section`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HandlerError, TemplateError};
use crate::section::Section;

/// Section key holding template-level parameters.
pub const PARAMETERS_KEY: &str = "Parameters";

/// Section key holding the template version string.
pub const VERSION_KEY: &str = "Version";

/// A site template: section name to section payload, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
	sections: Map<String, Value>,
}

impl Template {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_json_str(json: &str) -> Result<Self, TemplateError> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn from_value(value: Value) -> Result<Self, TemplateError> {
		Ok(serde_json::from_value(value)?)
	}

	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_json_str(&content)
	}

	/// Adds or replaces a section, keeping the position of an existing key.
	pub fn with_section(mut self, name: impl Into<String>, payload: Value) -> Self {
		self.sections.insert(name.into(), payload);
		self
	}

	/// Section names actually present in the document, in document order.
	pub fn section_names(&self) -> impl Iterator<Item = &str> {
		self.sections.keys().map(String::as_str)
	}

	pub fn section(&self, name: &str) -> Option<&Value> {
		self.sections.get(name)
	}

	pub fn len(&self) -> usize {
		self.sections.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	/// String parameters declared in the template's `Parameters` section.
	///
	/// Non-string values are ignored.
	pub fn parameters(&self) -> BTreeMap<String, String> {
		self.sections
			.get(PARAMETERS_KEY)
			.and_then(Value::as_object)
			.map(|params| {
				params
					.iter()
					.filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
					.collect()
			})
			.unwrap_or_default()
	}

	pub fn version(&self) -> Option<&str> {
		self.sections.get(VERSION_KEY).and_then(Value::as_str)
	}
}

/// Deserializes a section payload into its typed form.
pub fn parse_section<T: DeserializeOwned>(section: Section, payload: &Value) -> Result<T, HandlerError> {
	T::deserialize(payload).map_err(|source| HandlerError::InvalidPayload { section, source })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldReference {
	#[serde(rename = "ID")]
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentType {
	/// May be empty when the content type is addressed by name only.
	#[serde(rename = "ID", default)]
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub group: String,
	#[serde(default)]
	pub field_refs: Vec<FieldReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientSideControl {
	pub id: String,
	#[serde(default)]
	pub properties: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub server_processed_content: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientSidePageColumn {
	#[serde(default)]
	pub factor: Value,
	#[serde(default)]
	pub controls: Vec<ClientSideControl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientSidePageSection {
	#[serde(default)]
	pub columns: Vec<ClientSidePageColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientSidePage {
	pub name: String,
	pub title: String,
	#[serde(default)]
	pub page_layout_type: Value,
	#[serde(default)]
	pub comments_disabled: bool,
	#[serde(default)]
	pub sections: Vec<ClientSidePageSection>,
	#[serde(default)]
	pub vertical_section: Vec<ClientSideControl>,
	#[serde(default)]
	pub overwrite: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
	pub id: String,
	#[serde(default)]
	pub deactivate: bool,
	#[serde(default)]
	pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileObject {
	pub folder: String,
	pub src: String,
	pub url: String,
	#[serde(default)]
	pub overwrite: bool,
	#[serde(default)]
	pub remove_existing_web_parts: bool,
	#[serde(default)]
	pub web_parts: Vec<WebPart>,
	#[serde(default)]
	pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebPart {
	pub title: String,
	pub zone: String,
	#[serde(default)]
	pub order: i32,
	#[serde(default)]
	pub contents: WebPartContents,
	/// Replace same-named `<property>` elements of XML fetched from
	/// [`WebPartContents::file_src`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub property_overrides: Option<Vec<WebPartPropertyOverride>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub list_view: Option<PageListView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPartPropertyOverride {
	pub name: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub value: String,
}

/// View settings for the list view a web part renders on its page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageListView {
	pub list: String,
	pub view: ListView,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebPartContents {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xml: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub file_src: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComposedLook {
	pub color_palette_url: String,
	pub font_scheme_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomAction {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	pub title: String,
	pub location: String,
	#[serde(default)]
	pub url: String,
	/// Remaining custom action properties, passed through untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Web settings. `WelcomePage` is applied to the root folder, everything else
/// to the web itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSettings {
	#[serde(rename = "WelcomePage", default, skip_serializing_if = "Option::is_none")]
	pub welcome_page: Option<String>,
	#[serde(flatten)]
	pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hook {
	#[serde(default)]
	pub title: String,
	pub url: String,
	pub method: String,
	#[serde(default)]
	pub headers: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Navigation {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub quick_launch: Option<Vec<NavigationNode>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub top_navigation_bar: Option<Vec<NavigationNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NavigationNode {
	pub title: String,
	pub url: String,
	#[serde(default)]
	pub ignore_existing: bool,
	#[serde(default)]
	pub children: Vec<NavigationNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListInstance {
	pub title: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub template: i32,
	#[serde(default)]
	pub content_types_enabled: bool,
	#[serde(default)]
	pub remove_existing_content_types: bool,
	#[serde(default)]
	pub content_type_bindings: Vec<ContentTypeBinding>,
	/// Field schema XML fragments.
	#[serde(default)]
	pub fields: Vec<String>,
	#[serde(default)]
	pub field_refs: Vec<ListFieldReference>,
	#[serde(default)]
	pub views: Vec<ListView>,
	#[serde(default)]
	pub additional_settings: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListFieldReference {
	#[serde(rename = "ID")]
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeBinding {
	#[serde(rename = "ContentTypeID")]
	pub content_type_id: String,
	#[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListView {
	pub title: String,
	#[serde(default)]
	pub personal_view: bool,
	#[serde(default)]
	pub view_fields: Vec<String>,
	#[serde(default)]
	pub additional_settings: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyBagEntry {
	pub key: String,
	pub value: String,
	#[serde(default)]
	pub indexed: bool,
	#[serde(default)]
	pub overwrite: bool,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn section_names_follow_document_order() {
		let template =
			Template::from_json_str(r#"{"Navigation": {}, "Lists": [], "Custom": 1, "Files": []}"#)
				.unwrap();
		let names: Vec<&str> = template.section_names().collect();
		assert_eq!(names, vec!["Navigation", "Lists", "Custom", "Files"]);
	}

	#[test]
	fn non_object_document_is_rejected() {
		assert!(matches!(
			Template::from_json_str("[1, 2, 3]"),
			Err(TemplateError::Json(_))
		));
	}

	#[test]
	fn missing_file_reports_path() {
		let err = Template::from_path("/definitely/not/here.json").unwrap_err();
		match err {
			TemplateError::Io { path, .. } => assert!(path.ends_with("here.json")),
			other => panic!("expected Io error, got {other:?}"),
		}
	}

	#[test]
	fn parameters_ignore_non_string_values() {
		let template = Template::new().with_section(
			PARAMETERS_KEY,
			json!({"Owner": "alice", "Count": 3, "Region": "Nordic"}),
		);
		let params = template.parameters();
		assert_eq!(params.len(), 2);
		assert_eq!(params["Owner"], "alice");
		assert_eq!(params["Region"], "Nordic");
	}

	#[test]
	fn version_is_read_when_present() {
		let template = Template::new().with_section(VERSION_KEY, json!("1.2"));
		assert_eq!(template.version(), Some("1.2"));
		assert_eq!(Template::new().version(), None);
	}

	#[test]
	fn list_instance_parses_with_defaults() {
		let lists: Vec<ListInstance> = parse_section(
			Section::Lists,
			&json!([{"Title": "Tasks", "Template": 171, "Views": [{"Title": "All"}]}]),
		)
		.unwrap();
		assert_eq!(lists[0].title, "Tasks");
		assert_eq!(lists[0].template, 171);
		assert!(!lists[0].content_types_enabled);
		assert_eq!(lists[0].views[0].title, "All");
		assert!(lists[0].views[0].view_fields.is_empty());
	}

	#[test]
	fn web_part_reads_overrides_and_page_list_view() {
		let web_part: WebPart = serde_json::from_value(json!({
			"Title": "Tasks",
			"Zone": "Main",
			"Contents": {"FileSrc": "{site}/wp/tasks.webpart"},
			"PropertyOverrides": [{"name": "Title", "type": "string", "value": "Open tasks"}],
			"ListView": {"List": "Tasks", "View": {"Title": "", "ViewFields": ["Title", "Status"]}}
		}))
		.unwrap();
		let overrides = web_part.property_overrides.unwrap();
		assert_eq!(overrides[0].kind, "string");
		assert_eq!(overrides[0].value, "Open tasks");
		let list_view = web_part.list_view.unwrap();
		assert_eq!(list_view.list, "Tasks");
		assert_eq!(list_view.view.view_fields, vec!["Title", "Status"]);
		assert!(list_view.view.additional_settings.is_empty());
	}

	#[test]
	fn invalid_payload_names_the_section() {
		let err = parse_section::<Vec<Feature>>(Section::Features, &json!({"id": 1})).unwrap_err();
		match err {
			HandlerError::InvalidPayload { section, .. } => assert_eq!(section, Section::Features),
			other => panic!("expected InvalidPayload, got {other:?}"),
		}
	}

	#[test]
	fn web_settings_split_welcome_page() {
		let settings: WebSettings = parse_section(
			Section::WebSettings,
			&json!({"WelcomePage": "SitePages/Home.aspx", "QuickLaunchEnabled": false}),
		)
		.unwrap();
		assert_eq!(settings.welcome_page.as_deref(), Some("SitePages/Home.aspx"));
		assert_eq!(settings.settings.get("QuickLaunchEnabled"), Some(&json!(false)));
		assert!(!settings.settings.contains_key("WelcomePage"));
	}

	#[test]
	fn custom_action_keeps_extra_properties() {
		let action: CustomAction = parse_section(
			Section::CustomActions,
			&json!({
				"Name": "Banner",
				"Title": "Banner",
				"Location": "ClientSideExtension.ApplicationCustomizer",
				"ClientSideComponentId": "abc"
			}),
		)
		.unwrap();
		assert_eq!(action.url, "");
		assert_eq!(action.extra.get("ClientSideComponentId"), Some(&json!("abc")));
	}
}
