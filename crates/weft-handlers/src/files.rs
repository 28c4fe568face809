// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Uploads files, sets their properties and populates their web parts. A web
//! part that renders a list view can also reconfigure that view.
//!
//! A file that fails is logged and skipped; the handler itself only fails on
//! an invalid payload.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use weft_core::schema::{FileObject, PageListView, WebPart};
use weft_core::{
	parse_section, FileAddRequest, Handler, HandlerError, HandlerLog, HandlerSettings,
	ProvisioningContext, Section, WebClient, WebPartRequest,
};

use crate::xml;

pub struct FilesHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

fn combine(base: &str, path: &str) -> String {
	format!(
		"{}/{}",
		base.trim_end_matches('/'),
		path.trim_start_matches('/')
	)
}

impl FilesHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::Files, &settings),
			settings,
		}
	}

	async fn process_file(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		file: &FileObject,
	) -> Result<(), HandlerError> {
		self.log.info(
			"processFile",
			format!("Processing file {}/{}", file.folder, file.url),
		);
		let source = self.settings.resolve_all(context, &file.src);
		let contents = web.fetch_source(&source).await?;

		let folder = combine(&context.web.server_relative_url, &file.folder);
		let request = FileAddRequest {
			folder_server_relative_url: folder.clone(),
			name: file.url.clone(),
			contents,
			overwrite: file.overwrite,
		};
		let file_url = match web.add_file(&request).await {
			Ok(url) => url,
			Err(e) => {
				let fallback = combine(&folder, &file.url);
				self.log.info(
					"processFile",
					format!("Could not add file {fallback} ({e}), using existing file"),
				);
				fallback
			}
		};

		if !file.properties.is_empty() {
			self.log.info(
				"processProperties",
				format!("Processing properties for {}/{}", file.folder, file.url),
			);
			web.set_file_properties(&file_url, &file.properties).await?;
		}

		self.process_web_parts(web, context, file, &file_url).await?;
		self.process_page_list_views(web, file, &file_url).await
	}

	async fn process_web_parts(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		file: &FileObject,
		file_url: &str,
	) -> Result<(), HandlerError> {
		self.log.info(
			"processWebParts",
			format!("Processing webparts for file {}/{}", file.folder, file.url),
		);
		if file.remove_existing_web_parts {
			self.log.info(
				"processWebParts",
				format!("Deleting existing webparts from file {file_url}"),
			);
			web.remove_web_parts(file_url).await?;
		}

		for web_part in &file.web_parts {
			let xml = self.web_part_xml(web, context, web_part).await?;
			self.log.info(
				"processWebParts",
				format!(
					"Processing webpart {} for file {}/{}",
					web_part.title, file.folder, file.url
				),
			);
			let request = WebPartRequest {
				title: web_part.title.clone(),
				zone: web_part.zone.clone(),
				order: web_part.order,
				xml,
			};
			web.add_web_part(file_url, &request).await?;
		}
		Ok(())
	}

	async fn process_page_list_views(
		&self,
		web: &dyn WebClient,
		file: &FileObject,
		file_url: &str,
	) -> Result<(), HandlerError> {
		let list_views: Vec<&PageListView> = file.web_parts.iter().filter_map(|wp| wp.list_view.as_ref()).collect();
		if list_views.is_empty() {
			return Ok(());
		}
		self.log.info(
			"processPageListViews",
			format!("Processing page list views for file {file_url}"),
		);
		for list_view in list_views {
			if let Err(e) = self.process_page_list_view(web, list_view, file_url).await {
				self.log.error(
					"processPageListViews",
					format!("Failed to process page list view for file {file_url}: {e}"),
				);
				return Err(e);
			}
		}
		self.log.info(
			"processPageListViews",
			format!("Successfully processed page list views for file {file_url}"),
		);
		Ok(())
	}

	/// Updates the view of `list_view.list` that renders on `file_url`. Nothing
	/// happens unless exactly one view lives on that page.
	async fn process_page_list_view(
		&self,
		web: &dyn WebClient,
		list_view: &PageListView,
		file_url: &str,
	) -> Result<(), HandlerError> {
		let views = web.list_views(&list_view.list).await?;
		let mut on_page = views.iter().filter(|v| v.server_relative_url == file_url);
		let (Some(page_view), None) = (on_page.next(), on_page.next()) else {
			return Ok(());
		};

		let mut view = list_view.view.clone();
		view.title = page_view.title.clone();
		web.update_view(&list_view.list, &view).await?;
		web.set_view_fields(&list_view.list, &page_view.title, &view.view_fields).await?;
		Ok(())
	}

	/// Web part XML from the inline contents or a fetched source, with
	/// `{site}` made absolute and context tokens resolved.
	async fn web_part_xml(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		web_part: &WebPart,
	) -> Result<String, HandlerError> {
		let raw = match (&web_part.contents.xml, &web_part.contents.file_src) {
			(Some(xml), _) => xml.clone(),
			(None, Some(src)) => {
				let source = self.settings.resolve_all(context, src);
				self.log.info(
					"fetchWebPartContents",
					format!("Retrieving contents from file '{source}'."),
				);
				let fetched = web.fetch_source(&source).await?;
				match &web_part.property_overrides {
					Some(overrides) => xml::override_properties(&fetched, overrides)?,
					None => fetched,
				}
			}
			(None, None) => {
				return Err(HandlerError::Failed(format!(
					"web part '{}' has neither Xml nor FileSrc contents",
					web_part.title
				)))
			}
		};

		let site_url = self
			.settings
			.site_environment(context)
			.map(|env| env.site_url)
			.unwrap_or_else(|| web.url().trim_end_matches('/').to_string());
		let xml = raw.replace("{site}", &site_url);
		Ok(self.settings.token_resolver(context).resolve(&xml))
	}
}

#[async_trait]
impl Handler for FilesHandler {
	fn section(&self) -> Section {
		Section::Files
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
				let files: Vec<FileObject> = parse_section(Section::Files, payload)?;
				for file in &files {
					if let Err(e) = self.process_file(web, context, file).await {
						self.log.error(
							"processFile",
							format!("Failed to process file {}/{}: {e}", file.folder, file.url),
						);
					}
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

	const SITE: &str = "https://contoso.example/sites/a";

	async fn run(web: &MemoryWeb, payload: Value) -> ProvisioningContext {
		let mut ctx = context(web).await;
		FilesHandler::new(settings())
			.provision_objects(web, &payload, &mut ctx)
			.await
			.unwrap();
		ctx
	}

	#[test]
	fn combine_joins_with_single_slash() {
		assert_eq!(combine("/sites/a/", "/SitePages"), "/sites/a/SitePages");
		assert_eq!(combine("", "SitePages"), "/SitePages");
	}

	#[tokio::test]
	async fn uploads_file_with_properties_and_web_parts() {
		let web = MemoryWeb::new(SITE)
			.with_source("/sites/a/assets/home.aspx", "<html/>")
			.with_source("/sites/a/assets/cewp.xml", "<webPart src=\"{site}/x\" />");
		web.add_list(&weft_core::schema::ListInstance {
			title: "Tasks".to_string(),
			..Default::default()
		})
		.await
		.unwrap();

		let ctx = {
			let mut ctx = context(&web).await;
			ctx.lists = web.list_ids().await.unwrap();
			FilesHandler::new(settings())
				.provision_objects(
					&web,
					&json!([{
						"Folder": "SitePages",
						"Src": "{site}/assets/home.aspx",
						"Url": "Home.aspx",
						"Overwrite": true,
						"Properties": {"Title": "Home"},
						"WebParts": [
							{"Title": "Inline", "Zone": "Main", "Order": 1,
							 "Contents": {"Xml": "<webPart list=\"{listid:Tasks}\" />"}},
							{"Title": "Fetched", "Zone": "Main", "Order": 2,
							 "Contents": {"FileSrc": "{site}/assets/cewp.xml"}}
						]
					}]),
					&mut ctx,
				)
				.await
				.unwrap();
			ctx
		};

		let state = web.snapshot();
		let file = &state.files["/sites/a/SitePages/Home.aspx"];
		assert_eq!(file.contents, "<html/>");
		assert_eq!(file.properties["Title"], "Home");
		assert_eq!(file.web_parts.len(), 2);
		assert_eq!(
			file.web_parts[0].xml,
			format!("<webPart list=\"{}\" />", ctx.list_id("Tasks").unwrap())
		);
		assert_eq!(file.web_parts[1].xml, format!("<webPart src=\"{SITE}/x\" />"));
		assert_eq!(file.web_parts[1].order, 2);
	}

	#[tokio::test]
	async fn existing_file_is_reused_when_add_conflicts() {
		let web = MemoryWeb::new(SITE).with_source("/src/page.aspx", "v2");
		web.add_file(&FileAddRequest {
			folder_server_relative_url: "/sites/a/SitePages".to_string(),
			name: "Page.aspx".to_string(),
			contents: "v1".to_string(),
			overwrite: false,
		})
		.await
		.unwrap();
		web.add_web_part(
			"/sites/a/SitePages/Page.aspx",
			&WebPartRequest {
				title: "Old".to_string(),
				..Default::default()
			},
		)
		.await
		.unwrap();

		run(
			&web,
			json!([{
				"Folder": "SitePages",
				"Src": "/src/page.aspx",
				"Url": "Page.aspx",
				"RemoveExistingWebParts": true,
				"WebParts": [{"Title": "New", "Zone": "Main", "Contents": {"Xml": "<webPart/>"}}]
			}]),
		)
		.await;

		let state = web.snapshot();
		let file = &state.files["/sites/a/SitePages/Page.aspx"];
		assert_eq!(file.contents, "v1");
		assert_eq!(file.web_parts.len(), 1);
		assert_eq!(file.web_parts[0].title, "New");
	}

	#[tokio::test]
	async fn failing_file_does_not_stop_the_rest() {
		let web = MemoryWeb::new(SITE).with_source("/src/b.txt", "b");

		run(
			&web,
			json!([
				{"Folder": "Docs", "Src": "/src/missing.txt", "Url": "a.txt"},
				{"Folder": "Docs", "Src": "/src/b.txt", "Url": "b.txt"}
			]),
		)
		.await;

		let state = web.snapshot();
		assert!(!state.files.contains_key("/sites/a/Docs/a.txt"));
		assert_eq!(state.files["/sites/a/Docs/b.txt"].contents, "b");
	}

	const TASKS_WEB_PART: &str = "<webParts><webPart><metaData/><data><properties>\
		<property name=\"Title\" type=\"string\">Tasks</property>\
		<property name=\"ListUrl\" type=\"string\">Lists/Tasks</property>\
		</properties></data></webPart></webParts>";

	#[tokio::test]
	async fn property_overrides_apply_to_fetched_web_parts_only() {
		let web = MemoryWeb::new(SITE)
			.with_source("/src/page.aspx", "<html/>")
			.with_source("/src/tasks.webpart", TASKS_WEB_PART);

		run(
			&web,
			json!([{
				"Folder": "SitePages",
				"Src": "/src/page.aspx",
				"Url": "Tasks.aspx",
				"WebParts": [
					{"Title": "Fetched", "Zone": "Main",
					 "Contents": {"FileSrc": "/src/tasks.webpart"},
					 "PropertyOverrides": [{"name": "Title", "type": "string", "value": "{site}/Tasks"}]},
					{"Title": "Inline", "Zone": "Main",
					 "Contents": {"Xml": TASKS_WEB_PART},
					 "PropertyOverrides": [{"name": "Title", "type": "string", "value": "Ignored"}]}
				]
			}]),
		)
		.await;

		let state = web.snapshot();
		let web_parts = &state.files["/sites/a/SitePages/Tasks.aspx"].web_parts;
		let fetched = &web_parts[0].xml;
		assert!(fetched.contains(&format!(r#"<property name="Title" type="string">{SITE}/Tasks</property>"#)));
		assert!(fetched.contains(r#"<property name="ListUrl" type="string">Lists/Tasks</property>"#));
		assert_eq!(fetched.matches(r#"name="Title""#).count(), 1);
		assert_eq!(web_parts[1].xml, TASKS_WEB_PART);
	}

	async fn web_with_page_view(page_url: &str) -> MemoryWeb {
		let web = MemoryWeb::new(SITE).with_source("/src/page.aspx", "<html/>");
		web.add_list(&weft_core::schema::ListInstance {
			title: "Tasks".to_string(),
			..Default::default()
		})
		.await
		.unwrap();
		web.state().lists[0].views.push(crate::memory::MemoryView {
			id: "page-view".to_string(),
			title: "Page view".to_string(),
			fields: vec!["LinkTitle".to_string()],
			server_relative_url: page_url.to_string(),
			..Default::default()
		});
		web
	}

	fn list_view_page(list: &str) -> Value {
		json!([{
			"Folder": "SitePages",
			"Src": "/src/page.aspx",
			"Url": "Tasks.aspx",
			"WebParts": [{
				"Title": "Tasks", "Zone": "Main",
				"Contents": {"Xml": "<webPart/>"},
				"ListView": {"List": list, "View": {
					"Title": "ignored",
					"ViewFields": ["Title", "Status"],
					"AdditionalSettings": {"RowLimit": 5}
				}}
			}]
		}])
	}

	#[tokio::test]
	async fn page_list_view_is_updated() {
		let web = web_with_page_view("/sites/a/SitePages/Tasks.aspx").await;

		run(&web, list_view_page("Tasks")).await;

		let state = web.snapshot();
		let views = &state.list("Tasks").unwrap().views;
		let page_view = views.iter().find(|v| v.id == "page-view").unwrap();
		assert_eq!(page_view.title, "Page view");
		assert_eq!(page_view.fields, vec!["Title", "Status"]);
		assert_eq!(page_view.settings["RowLimit"], 5);
		let all_items = views.iter().find(|v| v.title == "All Items").unwrap();
		assert!(all_items.settings.is_empty());
	}

	#[tokio::test]
	async fn page_list_view_needs_a_view_on_the_page() {
		let web = web_with_page_view("/sites/a/SitePages/Other.aspx").await;

		run(&web, list_view_page("Tasks")).await;

		let calls = web.calls();
		assert!(calls.contains(&"list_views".to_string()));
		assert!(!calls.contains(&"update_view".to_string()));
		assert!(!calls.contains(&"set_view_fields".to_string()));
	}

	#[tokio::test]
	async fn page_list_view_failure_skips_the_file() {
		let web = web_with_page_view("/sites/a/SitePages/Tasks.aspx").await;
		web.fail_on("update_view");

		run(&web, list_view_page("Tasks")).await;

		let state = web.snapshot();
		assert_eq!(state.files["/sites/a/SitePages/Tasks.aspx"].web_parts.len(), 1);
		assert!(!state.calls.contains(&"set_view_fields".to_string()));
		let page_view = state.list("Tasks").unwrap().views.iter().find(|v| v.id == "page-view").unwrap().clone();
		assert_eq!(page_view.fields, vec!["LinkTitle"]);
	}

	#[tokio::test]
	async fn invalid_payload_fails() {
		let web = MemoryWeb::new(SITE);
		let mut ctx = context(&web).await;
		let result = FilesHandler::new(settings())
			.provision_objects(&web, &json!({"Folder": 1}), &mut ctx)
			.await;
		assert!(matches!(result, Err(HandlerError::InvalidPayload { .. })));
	}
}
