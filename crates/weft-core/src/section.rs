// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Closed set of template sections that have a handler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownSection;

/// A template section with a known handler implementation.
///
/// The string form matches the top-level key used in template documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
	ClientSidePages,
	ComposedLook,
	ContentTypes,
	CustomActions,
	Features,
	Files,
	Lists,
	Navigation,
	PropertyBagEntries,
	WebSettings,
	SiteFields,
	Hooks,
}

impl Section {
	pub const ALL: [Section; 12] = [
		Section::ClientSidePages,
		Section::ComposedLook,
		Section::ContentTypes,
		Section::CustomActions,
		Section::Features,
		Section::Files,
		Section::Lists,
		Section::Navigation,
		Section::PropertyBagEntries,
		Section::WebSettings,
		Section::SiteFields,
		Section::Hooks,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Section::ClientSidePages => "ClientSidePages",
			Section::ComposedLook => "ComposedLook",
			Section::ContentTypes => "ContentTypes",
			Section::CustomActions => "CustomActions",
			Section::Features => "Features",
			Section::Files => "Files",
			Section::Lists => "Lists",
			Section::Navigation => "Navigation",
			Section::PropertyBagEntries => "PropertyBagEntries",
			Section::WebSettings => "WebSettings",
			Section::SiteFields => "SiteFields",
			Section::Hooks => "Hooks",
		}
	}

	/// Built-in execution priority. Lower runs first.
	pub fn default_priority(&self) -> u32 {
		match self {
			Section::SiteFields => 0,
			Section::ContentTypes => 1,
			Section::Features => 2,
			Section::Lists => 3,
			Section::Files => 4,
			Section::CustomActions => 5,
			Section::ComposedLook => 6,
			Section::ClientSidePages => 7,
			Section::PropertyBagEntries => 8,
			Section::Navigation => 9,
			Section::WebSettings => 10,
			Section::Hooks => 11,
		}
	}
}

impl fmt::Display for Section {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Section {
	type Err = UnknownSection;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Section::ALL
			.iter()
			.copied()
			.find(|section| section.as_str() == s)
			.ok_or_else(|| UnknownSection(s.to_string()))
	}
}
