// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

use crate::section::Section;

/// Result type for calls against the target web.
pub type WebResult<T> = std::result::Result<T, WebError>;

/// Errors reported by a [`crate::WebClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebError {
	#[error("not found: {0}")]
	NotFound(String),

	#[error("already exists: {0}")]
	AlreadyExists(String),

	#[error("operation not supported by target web: {0}")]
	Unsupported(String),

	#[error("remote request failed: {0}")]
	Remote(String),
}

/// Errors raised while a handler provisions its section.
#[derive(Debug, Error)]
pub enum HandlerError {
	#[error("invalid {section} payload: {source}")]
	InvalidPayload {
		section: Section,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Web(#[from] WebError),

	#[error("not supported: {0}")]
	Unsupported(String),

	#[error("hook request failed: {0}")]
	Hook(String),

	#[error("timed out waiting for {what} after {attempts} attempts")]
	PollTimeout { what: String, attempts: u32 },

	#[error("{0}")]
	Failed(String),
}

/// Errors raised while reading a template document.
#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("invalid template JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("failed to read template {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// A section name that has no handler implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown section: {0}")]
pub struct UnknownSection(pub String);
