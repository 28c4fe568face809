// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use base64::prelude::*;
use serde_json::Value;
use weft_core::schema::PropertyBagEntry;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

/// Property bag key listing the base64-encoded names of indexed properties.
pub const INDEXED_PROPERTY_KEYS: &str = "vti_indexedpropertykeys";

/// Encodes a property name the way the indexed-keys list expects it:
/// base64 over the UTF-16LE bytes of the name.
pub fn encode_indexed_key(key: &str) -> String {
	let bytes: Vec<u8> = key.encode_utf16().flat_map(u16::to_le_bytes).collect();
	BASE64_STANDARD.encode(bytes)
}

/// Writes property bag entries flagged `Overwrite`.
pub struct PropertyBagEntriesHandler {
	log: HandlerLog,
}

impl PropertyBagEntriesHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::PropertyBagEntries, &settings),
		}
	}
}

#[async_trait]
impl Handler for PropertyBagEntriesHandler {
	fn section(&self) -> Section {
		Section::PropertyBagEntries
	}

	async fn provision_objects(
		&self,
		web: &dyn WebClient,
		payload: &Value,
		_context: &mut ProvisioningContext,
	) -> Result<(), HandlerError> {
		self
			.log
			.scoped(async {
				if !web.supports_property_bag() {
					return Err(HandlerError::Unsupported(format!(
						"property bag writes are not available for web [{}]",
						web.url()
					)));
				}
				let entries: Vec<PropertyBagEntry> = parse_section(Section::PropertyBagEntries, payload)?;

				let mut values = Vec::new();
				let mut indexed = Vec::new();
				for entry in entries.iter().filter(|e| e.overwrite) {
					self
						.log
						.info("ProvisionObjects", format!("Setting property {}", entry.key));
					values.push((entry.key.clone(), entry.value.clone()));
					if entry.indexed {
						indexed.push(encode_indexed_key(&entry.key));
					}
				}

				web.set_property_bag(&values).await?;
				if !indexed.is_empty() {
					web.set_property_bag(&[(INDEXED_PROPERTY_KEYS.to_string(), indexed.join("|"))])
						.await?;
				}
				Ok(())
			})
			.await
	}
}
