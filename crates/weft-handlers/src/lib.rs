// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default section handlers for Weft.
//!
//! There is one handler per [`Section`]; [`default_handler`] maps a section
//! to its implementation. [`MemoryWeb`] is an in-memory target web used for
//! simulated runs and tests.

pub mod client_side_pages;
pub mod composed_look;
pub mod content_types;
pub mod custom_actions;
pub mod features;
pub mod files;
pub mod hooks;
pub mod ids;
pub mod lists;
pub mod memory;
pub mod navigation;
pub mod property_bag;
pub mod site_fields;
pub mod web_settings;
pub mod xml;

use std::sync::Arc;

use weft_core::{Handler, HandlerSettings, Section};

pub use client_side_pages::ClientSidePagesHandler;
pub use composed_look::ComposedLookHandler;
pub use content_types::ContentTypesHandler;
pub use custom_actions::CustomActionsHandler;
pub use features::FeaturesHandler;
pub use files::FilesHandler;
pub use hooks::{HookMethod, HookRequest, HookResponse, HookTransport, HooksHandler, ReqwestTransport};
pub use lists::ListsHandler;
pub use memory::{MemoryWeb, WebState};
pub use navigation::NavigationHandler;
pub use property_bag::PropertyBagEntriesHandler;
pub use site_fields::SiteFieldsHandler;
pub use web_settings::WebSettingsHandler;

/// The built-in handler for `section`.
pub fn default_handler(section: Section, settings: Arc<HandlerSettings>) -> Arc<dyn Handler> {
	match section {
		Section::ClientSidePages => Arc::new(ClientSidePagesHandler::new(settings)),
		Section::ComposedLook => Arc::new(ComposedLookHandler::new(settings)),
		Section::ContentTypes => Arc::new(ContentTypesHandler::new(settings)),
		Section::CustomActions => Arc::new(CustomActionsHandler::new(settings)),
		Section::Features => Arc::new(FeaturesHandler::new(settings)),
		Section::Files => Arc::new(FilesHandler::new(settings)),
		Section::Lists => Arc::new(ListsHandler::new(settings)),
		Section::Navigation => Arc::new(NavigationHandler::new(settings)),
		Section::PropertyBagEntries => Arc::new(PropertyBagEntriesHandler::new(settings)),
		Section::WebSettings => Arc::new(WebSettingsHandler::new(settings)),
		Section::SiteFields => Arc::new(SiteFieldsHandler::new(settings)),
		Section::Hooks => Arc::new(HooksHandler::new(settings)),
	}
}

/// Every built-in handler, in [`Section::ALL`] order.
pub fn default_handlers(settings: Arc<HandlerSettings>) -> Vec<Arc<dyn Handler>> {
	Section::ALL
		.iter()
		.map(|section| default_handler(*section, settings.clone()))
		.collect()
}
