// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use weft_core::schema::{Navigation, NavigationNode};
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, NavigationLocation,
	NavigationNodeInfo, ProvisioningContext, Section, WebClient,
};

/// Replaces the quick launch and top navigation bar with the template's trees.
///
/// Existing nodes at each level are deleted first. A new node whose title
/// matches exactly one deleted node keeps that node's URL unless it sets
/// `IgnoreExisting`.
pub struct NavigationHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
}

impl NavigationHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::Navigation, &settings),
			settings,
		}
	}

	fn process_nav_tree<'a>(
		&'a self,
		web: &'a dyn WebClient,
		context: &'a ProvisioningContext,
		location: NavigationLocation,
		parent: Option<u64>,
		nodes: &'a [NavigationNode],
	) -> BoxFuture<'a, Result<(), HandlerError>> {
		async move {
			let existing = web.navigation_nodes(location, parent).await?;
			for node in &existing {
				web.delete_navigation_node(location, node.id).await?;
			}
			for node in nodes {
				self
					.process_node(web, context, location, parent, node, &existing)
					.await?;
			}
			Ok(())
		}
		.boxed()
	}

	async fn process_node(
		&self,
		web: &dyn WebClient,
		context: &ProvisioningContext,
		location: NavigationLocation,
		parent: Option<u64>,
		node: &NavigationNode,
		existing: &[NavigationNodeInfo],
	) -> Result<(), HandlerError> {
		let mut matching = existing.iter().filter(|n| n.title == node.title);
		let url = match (matching.next(), matching.next()) {
			(Some(only), None) if !node.ignore_existing => only.url.as_str(),
			_ => node.url.as_str(),
		};
		let url = self.settings.resolve_url_tokens(context, url);

		self.log.info(
			"processNode",
			format!("Adding {location:?} node '{}' ({url})", node.title),
		);
		let id = web.add_navigation_node(location, parent, &node.title, &url).await?;
		if !node.children.is_empty() {
			self
				.process_nav_tree(web, context, location, Some(id), &node.children)
				.await?;
		}
		Ok(())
	}
}

#[async_trait]
impl Handler for NavigationHandler {
	fn section(&self) -> Section {
		Section::Navigation
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
				let navigation: Navigation = parse_section(Section::Navigation, payload)?;
				let trees = [
					(NavigationLocation::QuickLaunch, &navigation.quick_launch),
					(NavigationLocation::TopNavigationBar, &navigation.top_navigation_bar),
				];
				for (location, nodes) in trees {
					if let Some(nodes) = nodes {
						self.process_nav_tree(web, context, location, None, nodes).await?;
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

	async fn seed(web: &MemoryWeb, location: NavigationLocation, title: &str, url: &str) -> u64 {
		web.add_navigation_node(location, None, title, url).await.unwrap()
	}

	async fn run(web: &MemoryWeb, payload: Value) {
		let mut ctx = context(web).await;
		NavigationHandler::new(settings())
			.provision_objects(web, &payload, &mut ctx)
			.await
			.unwrap();
	}

	fn titles(web: &MemoryWeb, location: NavigationLocation, parent: Option<u64>) -> Vec<(String, String)> {
		web.state()
			.navigation_children(location, parent)
			.into_iter()
			.map(|n| (n.title.clone(), n.url.clone()))
			.collect()
	}

	#[tokio::test]
	async fn replaces_existing_nodes_and_keeps_matching_urls() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		seed(&web, NavigationLocation::QuickLaunch, "Home", "/sites/a/custom-home").await;
		seed(&web, NavigationLocation::QuickLaunch, "Old", "/old").await;

		run(
			&web,
			json!({"QuickLaunch": [
				{"Title": "Home", "Url": "{site}/SitePages/Home.aspx"},
				{"Title": "Docs", "Url": "{site}/Shared Documents"}
			]}),
		)
		.await;

		assert_eq!(
			titles(&web, NavigationLocation::QuickLaunch, None),
			vec![
				("Home".to_string(), "/sites/a/custom-home".to_string()),
				("Docs".to_string(), "/sites/a/Shared Documents".to_string()),
			]
		);
	}

	#[tokio::test]
	async fn ignore_existing_uses_template_url() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		seed(&web, NavigationLocation::TopNavigationBar, "Home", "/custom").await;

		run(
			&web,
			json!({"TopNavigationBar": [
				{"Title": "Home", "Url": "{site}", "IgnoreExisting": true}
			]}),
		)
		.await;

		assert_eq!(
			titles(&web, NavigationLocation::TopNavigationBar, None),
			vec![("Home".to_string(), "/sites/a".to_string())]
		);
	}

	#[tokio::test]
	async fn children_are_added_under_new_parent() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		seed(&web, NavigationLocation::QuickLaunch, "Stale", "/stale").await;

		run(
			&web,
			json!({"QuickLaunch": [{
				"Title": "Projects",
				"Url": "{site}/projects",
				"Children": [
					{"Title": "Alpha", "Url": "{site}/projects/alpha"},
					{"Title": "Beta", "Url": "{site}/projects/beta"}
				]
			}]}),
		)
		.await;

		let top = web.state().navigation_children(NavigationLocation::QuickLaunch, None)[0].id;
		assert_eq!(
			titles(&web, NavigationLocation::QuickLaunch, Some(top)),
			vec![
				("Alpha".to_string(), "/sites/a/projects/alpha".to_string()),
				("Beta".to_string(), "/sites/a/projects/beta".to_string()),
			]
		);
		assert_eq!(web.snapshot().navigation.len(), 3);
	}

	#[tokio::test]
	async fn absent_tree_is_left_alone() {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		seed(&web, NavigationLocation::TopNavigationBar, "Keep", "/keep").await;

		run(&web, json!({"QuickLaunch": []})).await;

		assert_eq!(titles(&web, NavigationLocation::TopNavigationBar, None).len(), 1);
	}
}
