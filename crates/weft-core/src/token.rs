// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deferred `{kind:value}` tokens resolved against the provisioning context.
//!
//! A token is `{`, a lowercase ASCII kind, `:`, a value made of ASCII letters,
//! `|`, spaces and `ÅÆØåæø`, then `}`. Anything else is literal text.
//! Resolution never fails: a token whose kind is unknown, or whose value has
//! no mapping, is kept verbatim.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::ProvisioningContext;

/// One piece of a tokenized string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
	Literal(&'a str),
	Token(Token<'a>),
}

/// A syntactically valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
	/// The full token text including braces.
	pub raw: &'a str,
	pub kind: &'a str,
	pub value: &'a str,
}

/// Token kinds the resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	ListId,
	/// Value is the composite `"List|View"` key.
	ListViewId,
	/// `webid`, `siteid` and `sitecollectionid` all resolve to the web id.
	WebId,
	Parameter,
}

impl TokenKind {
	pub fn parse(kind: &str) -> Option<Self> {
		match kind {
			"listid" => Some(TokenKind::ListId),
			"listviewid" => Some(TokenKind::ListViewId),
			"webid" | "siteid" | "sitecollectionid" => Some(TokenKind::WebId),
			"parameter" => Some(TokenKind::Parameter),
			_ => None,
		}
	}
}

fn is_value_char(c: char) -> bool {
	c.is_ascii_alphabetic() || matches!(c, '|' | ' ' | 'Å' | 'Æ' | 'Ø' | 'å' | 'æ' | 'ø')
}

/// Attempts to read a token at the start of `s`, which begins with `{`.
fn scan_token(s: &str) -> Option<Token<'_>> {
	let body = &s[1..];
	let kind_len = body
		.find(|c: char| !c.is_ascii_lowercase())
		.unwrap_or(body.len());
	let after_colon = body[kind_len..].strip_prefix(':')?;
	let value_len = after_colon
		.find(|c: char| !is_value_char(c))
		.unwrap_or(after_colon.len());
	if !after_colon[value_len..].starts_with('}') {
		return None;
	}
	let raw_len = 1 + kind_len + 1 + value_len + 1;
	Some(Token {
		raw: &s[..raw_len],
		kind: &body[..kind_len],
		value: &after_colon[..value_len],
	})
}

/// Splits `input` into literal text and tokens.
///
/// Concatenating the `raw` text of every segment reproduces `input`.
pub fn tokenize(input: &str) -> Vec<Segment<'_>> {
	let mut segments = Vec::new();
	let mut literal_start = 0;
	let mut cursor = 0;

	while let Some(offset) = input[cursor..].find('{') {
		let start = cursor + offset;
		match scan_token(&input[start..]) {
			Some(token) => {
				if literal_start < start {
					segments.push(Segment::Literal(&input[literal_start..start]));
				}
				cursor = start + token.raw.len();
				literal_start = cursor;
				segments.push(Segment::Token(token));
			}
			None => cursor = start + 1,
		}
	}

	if literal_start < input.len() {
		segments.push(Segment::Literal(&input[literal_start..]));
	}
	segments
}

/// Resolves `{kind:value}` tokens against a context and a parameter table.
#[derive(Debug, Clone, Copy)]
pub struct TokenResolver<'a> {
	context: &'a ProvisioningContext,
	parameters: &'a BTreeMap<String, String>,
}

impl<'a> TokenResolver<'a> {
	pub fn new(context: &'a ProvisioningContext, parameters: &'a BTreeMap<String, String>) -> Self {
		Self { context, parameters }
	}

	fn lookup(&self, token: &Token<'_>) -> Option<&'a str> {
		let resolved = match TokenKind::parse(token.kind)? {
			TokenKind::ListId => self.context.lists.get(token.value)?,
			TokenKind::ListViewId => self.context.list_views.get(token.value)?,
			TokenKind::WebId => &self.context.web.id,
			TokenKind::Parameter => self.parameters.get(token.value)?,
		};
		(!resolved.is_empty()).then_some(resolved.as_str())
	}

	/// Replaces every resolvable token in `input`.
	pub fn resolve(&self, input: &str) -> String {
		let mut output = String::with_capacity(input.len());
		for segment in tokenize(input) {
			match segment {
				Segment::Literal(text) => output.push_str(text),
				Segment::Token(token) => output.push_str(self.lookup(&token).unwrap_or(token.raw)),
			}
		}
		output
	}

	/// Resolves tokens in every string inside `value`. Object keys are left alone.
	pub fn resolve_value(&self, value: &Value) -> Value {
		match value {
			Value::String(s) => Value::String(self.resolve(s)),
			Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve_value(v)).collect()),
			Value::Object(map) => Value::Object(
				map
					.iter()
					.map(|(k, v)| (k.clone(), self.resolve_value(v)))
					.collect(),
			),
			other => other.clone(),
		}
	}
}
