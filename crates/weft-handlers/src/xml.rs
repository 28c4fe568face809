// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute access on the root element of a field schema fragment, and
//! property overrides on web part definitions.
//!
//! Field definitions arrive as single-element XML strings such as
//! `<Field ID="{...}" Name="Owner" DisplayName="Owner" Type="User" />`. Only the
//! root start tag is ever read or rewritten; child content passes through
//! byte for byte.

use std::ops::Range;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use weft_core::schema::WebPartPropertyOverride;
use weft_core::HandlerError;

/// Element path of the property list in a `.webpart` definition.
const PROPERTIES_PATH: [&[u8]; 4] = [b"webParts", b"webPart", b"data", b"properties"];

/// The root start tag and its byte range in the source.
struct RootTag<'a> {
	range: Range<usize>,
	start: BytesStart<'a>,
	empty: bool,
}

fn position(reader: &Reader<&[u8]>) -> Option<usize> {
	usize::try_from(reader.buffer_position()).ok()
}

fn root_tag(xml: &str) -> Option<RootTag<'_>> {
	let mut reader = Reader::from_str(xml);
	loop {
		let before = position(&reader)?;
		match reader.read_event().ok()? {
			Event::Start(start) => {
				return Some(RootTag {
					range: before..position(&reader)?,
					start,
					empty: false,
				})
			}
			Event::Empty(start) => {
				return Some(RootTag {
					range: before..position(&reader)?,
					start,
					empty: true,
				})
			}
			Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) | Event::Text(_) => {}
			_ => return None,
		}
	}
}

fn attribute_value(attr: &Attribute<'_>) -> String {
	attr
		.unescape_value()
		.map(|value| value.into_owned())
		.unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Value of `name` on the root element, with entity and character references
/// decoded.
pub fn attribute(xml: &str, name: &str) -> Option<String> {
	let root = root_tag(xml)?;
	let value = root
		.start
		.attributes()
		.flatten()
		.find(|attr| attr.key.as_ref() == name.as_bytes())
		.map(|attr| attribute_value(&attr));
	value
}

/// Sets `name` on the root element, replacing an existing value or appending
/// the attribute to the start tag.
pub fn set_attribute(xml: &str, name: &str, value: &str) -> Result<String, HandlerError> {
	let root = root_tag(xml).ok_or_else(|| HandlerError::Failed(format!("not an XML element: {xml}")))?;

	let mut rewritten = root.start.clone();
	rewritten.clear_attributes();
	let mut replaced = false;
	for attr in root.start.attributes() {
		let attr = attr.map_err(|e| HandlerError::Failed(format!("malformed attribute in {xml}: {e}")))?;
		if attr.key.as_ref() == name.as_bytes() {
			rewritten.push_attribute((name, value));
			replaced = true;
		} else if attr.value.contains(&b'"') {
			let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
			let decoded = attribute_value(&attr);
			rewritten.push_attribute((key.as_str(), decoded.as_str()));
		} else {
			rewritten.push_attribute(attr);
		}
	}
	if !replaced {
		rewritten.push_attribute((name, value));
	}

	let mut writer = Writer::new(Vec::new());
	let event = if root.empty {
		Event::Empty(rewritten)
	} else {
		Event::Start(rewritten)
	};
	writer
		.write_event(event)
		.map_err(|e| HandlerError::Failed(format!("failed to write element: {e}")))?;
	let tag = String::from_utf8(writer.into_inner())
		.map_err(|e| HandlerError::Failed(format!("element is not UTF-8: {e}")))?;

	Ok(format!("{}{tag}{}", &xml[..root.range.start], &xml[root.range.end..]))
}

/// Applies [`set_attribute`] for each pair in order.
pub fn set_attributes(xml: &str, attributes: &[(&str, &str)]) -> Result<String, HandlerError> {
	attributes
		.iter()
		.try_fold(xml.to_string(), |acc, (name, value)| set_attribute(&acc, name, value))
}

fn write_failed(e: impl std::fmt::Display) -> HandlerError {
	HandlerError::Failed(format!("failed to write web part: {e}"))
}

fn is_properties(stack: &[Vec<u8>]) -> bool {
	stack.len() == PROPERTIES_PATH.len() && stack.iter().zip(PROPERTIES_PATH).all(|(a, b)| a.as_slice() == b)
}

fn write_overrides(writer: &mut Writer<Vec<u8>>, overrides: &[WebPartPropertyOverride]) -> Result<(), HandlerError> {
	for property in overrides {
		let start = BytesStart::new("property")
			.with_attributes([("name", property.name.as_str()), ("type", property.kind.as_str())]);
		writer.write_event(Event::Start(start)).map_err(write_failed)?;
		writer
			.write_event(Event::Text(BytesText::new(&property.value)))
			.map_err(write_failed)?;
		writer
			.write_event(Event::End(BytesEnd::new("property")))
			.map_err(write_failed)?;
	}
	Ok(())
}

/// Replaces `<property>` elements of a `webParts` definition with the
/// overrides of the same name, appending the overrides after the remaining
/// properties. Any other document is returned unchanged.
pub fn override_properties(xml: &str, overrides: &[WebPartPropertyOverride]) -> Result<String, HandlerError> {
	let overridden = |start: &BytesStart<'_>| {
		start
			.try_get_attribute("name")
			.ok()
			.flatten()
			.map(|attr| attribute_value(&attr))
			.is_some_and(|name| overrides.iter().any(|o| o.name == name))
	};

	let mut reader = Reader::from_str(xml);
	let mut writer = Writer::new(Vec::new());
	let mut stack: Vec<Vec<u8>> = Vec::new();
	let mut skipping = 0usize;
	let mut applied = false;
	loop {
		let event = reader
			.read_event()
			.map_err(|e| HandlerError::Failed(format!("malformed web part XML: {e}")))?;
		if skipping > 0 {
			match event {
				Event::Start(_) => skipping += 1,
				Event::End(_) => skipping -= 1,
				Event::Eof => break,
				_ => {}
			}
			continue;
		}
		match event {
			Event::Eof => break,
			Event::Start(start) if is_properties(&stack) && start.name().as_ref() == b"property" && overridden(&start) => {
				skipping = 1;
			}
			Event::Empty(start) if is_properties(&stack) && start.name().as_ref() == b"property" && overridden(&start) => {}
			Event::Start(start) => {
				stack.push(start.name().as_ref().to_vec());
				writer.write_event(Event::Start(start)).map_err(write_failed)?;
			}
			Event::Empty(start) => {
				stack.push(start.name().as_ref().to_vec());
				if is_properties(&stack) {
					let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
					writer.write_event(Event::Start(start)).map_err(write_failed)?;
					write_overrides(&mut writer, overrides)?;
					writer.write_event(Event::End(end)).map_err(write_failed)?;
					applied = true;
				} else {
					writer.write_event(Event::Empty(start)).map_err(write_failed)?;
				}
				stack.pop();
			}
			Event::End(end) => {
				if is_properties(&stack) {
					write_overrides(&mut writer, overrides)?;
					applied = true;
				}
				stack.pop();
				writer.write_event(Event::End(end)).map_err(write_failed)?;
			}
			other => writer.write_event(other).map_err(write_failed)?,
		}
	}

	if !applied {
		return Ok(xml.to_string());
	}
	String::from_utf8(writer.into_inner()).map_err(|e| HandlerError::Failed(format!("web part is not UTF-8: {e}")))
}
