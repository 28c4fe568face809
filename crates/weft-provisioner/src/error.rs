// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;
use weft_config::ConfigError;
use weft_core::{HandlerError, Section, WebError};

pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// Failure of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisioningError {
	#[error("provisioner is not configured, call setup() before applying a template")]
	NotConfigured,

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("failed to read target web: {0}")]
	Web(#[from] WebError),

	#[error("handler {handler} failed: {source}")]
	Handler {
		handler: Section,
		#[source]
		source: HandlerError,
	},
}

impl ProvisioningError {
	/// The section whose handler failed, if a handler failed.
	pub fn handler(&self) -> Option<Section> {
		match self {
			ProvisioningError::Handler { handler, .. } => Some(*handler),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handler_error_names_the_section() {
		let err = ProvisioningError::Handler {
			handler: Section::Lists,
			source: HandlerError::Failed("boom".to_string()),
		};
		assert_eq!(err.handler(), Some(Section::Lists));
		assert_eq!(err.to_string(), "handler Lists failed: boom");
	}

	#[test]
	fn other_errors_name_no_handler() {
		assert_eq!(ProvisioningError::NotConfigured.handler(), None);
		assert_eq!(
			ProvisioningError::from(WebError::Remote("down".to_string())).handler(),
			None
		);
	}
}
