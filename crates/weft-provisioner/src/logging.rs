// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subscriber installation and an in-memory capture layer.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Layer};
use weft_config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` wins over `config.level`.
///
/// Output goes to stderr so command output on stdout stays machine-readable.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

	if config.json {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_fmt::layer().json().with_writer(std::io::stderr))
			.try_init()
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_fmt::layer().with_writer(std::io::stderr))
			.try_init()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEvent {
	pub level: Level,
	pub target: String,
	pub message: String,
	pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
	pub fn field(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}
}

/// A layer that records every event it sees.
#[derive(Debug, Clone, Default)]
pub struct CaptureLayer {
	events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<CapturedEvent> {
		self.events.lock().clone()
	}

	pub fn clear(&self) {
		self.events.lock().clear();
	}
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		let mut visitor = CaptureVisitor::default();
		event.record(&mut visitor);

		self.events.lock().push(CapturedEvent {
			level: *metadata.level(),
			target: metadata.target().to_string(),
			message: visitor.message.unwrap_or_default(),
			fields: visitor.fields,
		});
	}
}

#[derive(Default)]
struct CaptureVisitor {
	message: Option<String>,
	fields: BTreeMap<String, String>,
}

impl Visit for CaptureVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		self.record(field, format!("{value:?}"));
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		self.record(field, value.to_string());
	}
}

impl CaptureVisitor {
	fn record(&mut self, field: &Field, value: String) {
		if field.name() == "message" {
			self.message = Some(value);
		} else {
			self.fields.insert(field.name().to_string(), value);
		}
	}
}
