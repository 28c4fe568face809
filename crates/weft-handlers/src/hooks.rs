// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP hooks invoked at the end of provisioning.
//!
//! All hooks in a template run concurrently. A `POST` answered with `202
//! Accepted` is followed by polling its `Location` with `GET` until the
//! response is no longer `202`, bounded by the configured attempts.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::header::LOCATION;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use weft_core::schema::Hook;
use weft_core::{
	parse_section, Handler, HandlerError, HandlerLog, HandlerSettings, ProvisioningContext, Section,
	WebClient,
};

/// Body key carrying the target web URL on every `POST`.
pub const WEB_URL_KEY: &str = "pp_webUrl";

const ACCEPTED: u16 = 202;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMethod {
	Get,
	Post,
}

impl HookMethod {
	pub fn parse(method: &str) -> Option<Self> {
		match method {
			"GET" => Some(HookMethod::Get),
			"POST" => Some(HookMethod::Post),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct HookRequest {
	pub method: HookMethod,
	pub url: String,
	pub headers: BTreeMap<String, String>,
	pub body: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookResponse {
	pub status: u16,
	pub status_text: Option<String>,
	pub location: Option<String>,
	/// Parsed JSON body. Only read for unsuccessful responses.
	pub body: Option<Value>,
}

impl HookResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// `"{status}[ - {status_text}][ | {error}]"`, where `error` is the
	/// body's `error` member.
	pub fn failure_detail(&self) -> String {
		let mut detail = self.status.to_string();
		if let Some(text) = self.status_text.as_deref().filter(|t| !t.is_empty()) {
			detail.push_str(" - ");
			detail.push_str(text);
		}
		match self.body.as_ref().and_then(|b| b.get("error")) {
			Some(Value::String(error)) => detail.push_str(&format!(" | {error}")),
			Some(Value::Null) | None => {}
			Some(error) => detail.push_str(&format!(" | {error}")),
		}
		detail
	}
}

/// Sends hook requests. Implemented over `reqwest` by [`ReqwestTransport`].
#[async_trait]
pub trait HookTransport: Send + Sync {
	async fn send(&self, request: &HookRequest) -> Result<HookResponse, HandlerError>;
}

pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	pub fn new() -> Self {
		let client = Client::builder()
			.user_agent(format!("weft/{}", env!("CARGO_PKG_VERSION")))
			.build()
			.unwrap_or_default();
		Self { client }
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

impl Default for ReqwestTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl HookTransport for ReqwestTransport {
	async fn send(&self, request: &HookRequest) -> Result<HookResponse, HandlerError> {
		let method = match request.method {
			HookMethod::Get => Method::GET,
			HookMethod::Post => Method::POST,
		};
		let mut builder = self.client.request(method, &request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name, value);
		}
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| HandlerError::Hook(format!("{}: {e}", request.url)))?;

		let status = response.status();
		let location = response
			.headers()
			.get(LOCATION)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string);
		let body = if status.is_success() {
			None
		} else {
			response.json::<Value>().await.ok()
		};
		Ok(HookResponse {
			status: status.as_u16(),
			status_text: status.canonical_reason().map(str::to_string),
			location,
			body,
		})
	}
}

pub struct HooksHandler {
	settings: Arc<HandlerSettings>,
	log: HandlerLog,
	transport: Arc<dyn HookTransport>,
}

impl HooksHandler {
	pub fn new(settings: Arc<HandlerSettings>) -> Self {
		Self::with_transport(settings, Arc::new(ReqwestTransport::new()))
	}

	pub fn with_transport(settings: Arc<HandlerSettings>, transport: Arc<dyn HookTransport>) -> Self {
		Self {
			log: HandlerLog::for_settings(Section::Hooks, &settings),
			settings,
			transport,
		}
	}

	fn hook_error(detail: &str, index: usize, total: usize, hook: &Hook) -> HandlerError {
		HandlerError::Hook(format!("{detail} - Hook {}/{total}: {}", index + 1, hook.title))
	}

	async fn run_hook(
		&self,
		web_url: &str,
		index: usize,
		total: usize,
		hook: &Hook,
		method: HookMethod,
	) -> Result<(), HandlerError> {
		self.log.info(
			"processHooks",
			format!("Starting {} request: '{}'.", hook.method, hook.title),
		);
		let body = match method {
			HookMethod::Get => None,
			HookMethod::Post => {
				let mut body = hook.body.clone().unwrap_or_else(Map::new);
				body.insert(WEB_URL_KEY.to_string(), Value::String(web_url.to_string()));
				Some(Value::Object(body))
			}
		};
		let request = HookRequest {
			method,
			url: hook.url.clone(),
			headers: hook.headers.clone(),
			body,
		};

		let response = self.transport.send(&request).await?;
		if !response.is_success() {
			return Err(Self::hook_error(&response.failure_detail(), index, total, hook));
		}
		if method == HookMethod::Post && response.status == ACCEPTED {
			let location = response.location.ok_or_else(|| {
				Self::hook_error("202 response without a Location header", index, total, hook)
			})?;
			self.poll_pending(&location, index, total, hook).await?;
		}
		Ok(())
	}

	async fn poll_pending(&self, location: &str, index: usize, total: usize, hook: &Hook) -> Result<(), HandlerError> {
		let request = HookRequest {
			method: HookMethod::Get,
			url: location.to_string(),
			headers: hook.headers.clone(),
			body: None,
		};
		for attempt in 1..=self.settings.max_poll_attempts {
			tokio::time::sleep(self.settings.poll_interval).await;
			tracing::debug!(hook = %hook.title, attempt, location, "polling pending hook result");
			let response = self.transport.send(&request).await?;
			if !response.is_success() {
				return Err(Self::hook_error(&response.failure_detail(), index, total, hook));
			}
			if response.status != ACCEPTED {
				self.log.info(
					"processHooks",
					format!("Hook '{}' completed after {attempt} polls.", hook.title),
				);
				return Ok(());
			}
		}
		Err(HandlerError::PollTimeout {
			what: format!("hook '{}'", hook.title),
			attempts: self.settings.max_poll_attempts,
		})
	}
}

#[async_trait]
impl Handler for HooksHandler {
	fn section(&self) -> Section {
		Section::Hooks
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
				let hooks: Vec<Hook> = parse_section(Section::Hooks, payload)?;
				let total = hooks.len();
				let web_url = web.url();

				let mut pending = Vec::new();
				for (index, hook) in hooks.iter().enumerate() {
					match HookMethod::parse(&hook.method) {
						Some(method) => pending.push(self.run_hook(web_url, index, total, hook, method)),
						None => self.log.info(
							"processHooks",
							format!("Method: '{}' not supported.", hook.method),
						),
					}
				}
				try_join_all(pending).await?;
				Ok(())
			})
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryWeb;
	use crate::test_support::context;
	use parking_lot::Mutex;
	use serde_json::json;
	use std::collections::VecDeque;
	use std::time::Duration;

	/// Replies from a per-URL script and records every request.
	#[derive(Default)]
	struct ScriptedTransport {
		replies: Mutex<BTreeMap<String, VecDeque<HookResponse>>>,
		requests: Mutex<Vec<HookRequest>>,
	}

	impl ScriptedTransport {
		fn reply(self, url: &str, response: HookResponse) -> Self {
			self
				.replies
				.lock()
				.entry(url.to_string())
				.or_default()
				.push_back(response);
			self
		}

		fn requests(&self) -> Vec<HookRequest> {
			self.requests.lock().clone()
		}
	}

	#[async_trait]
	impl HookTransport for ScriptedTransport {
		async fn send(&self, request: &HookRequest) -> Result<HookResponse, HandlerError> {
			self.requests.lock().push(request.clone());
			self
				.replies
				.lock()
				.get_mut(&request.url)
				.and_then(VecDeque::pop_front)
				.ok_or_else(|| HandlerError::Hook(format!("no scripted reply for {}", request.url)))
		}
	}

	fn status(code: u16) -> HookResponse {
		HookResponse {
			status: code,
			..Default::default()
		}
	}

	fn accepted(location: &str) -> HookResponse {
		HookResponse {
			status: 202,
			location: Some(location.to_string()),
			..Default::default()
		}
	}

	fn fast_settings(max_poll_attempts: u32) -> Arc<HandlerSettings> {
		Arc::new(HandlerSettings {
			poll_interval: Duration::from_millis(1),
			max_poll_attempts,
			..Default::default()
		})
	}

	async fn run(transport: Arc<ScriptedTransport>, settings: Arc<HandlerSettings>, payload: Value) -> Result<(), HandlerError> {
		let web = MemoryWeb::new("https://contoso.example/sites/a");
		let mut ctx = context(&web).await;
		HooksHandler::with_transport(settings, transport)
			.provision_objects(&web, &payload, &mut ctx)
			.await
	}

	#[test]
	fn failure_detail_includes_status_text_and_error() {
		let response = HookResponse {
			status: 500,
			status_text: Some("Internal Server Error".to_string()),
			body: Some(json!({"error": "boom"})),
			..Default::default()
		};
		assert_eq!(response.failure_detail(), "500 - Internal Server Error | boom");
		assert_eq!(status(404).failure_detail(), "404");
	}

	#[tokio::test]
	async fn post_body_gets_web_url_and_get_has_no_body() {
		let transport = Arc::new(
			ScriptedTransport::default()
				.reply("https://hooks.example/get", status(200))
				.reply("https://hooks.example/post", status(200)),
		);

		run(
			transport.clone(),
			fast_settings(3),
			json!([
				{"Title": "Ping", "Url": "https://hooks.example/get", "Method": "GET",
				 "Headers": {"X-Key": "k"}},
				{"Title": "Notify", "Url": "https://hooks.example/post", "Method": "POST",
				 "Body": {"team": "ops"}}
			]),
		)
		.await
		.unwrap();

		let requests = transport.requests();
		assert_eq!(requests.len(), 2);
		let get = requests.iter().find(|r| r.method == HookMethod::Get).unwrap();
		assert!(get.body.is_none());
		assert_eq!(get.headers["X-Key"], "k");
		let post = requests.iter().find(|r| r.method == HookMethod::Post).unwrap();
		assert_eq!(
			post.body,
			Some(json!({"team": "ops", "pp_webUrl": "https://contoso.example/sites/a"}))
		);
	}

	#[tokio::test]
	async fn post_without_body_still_sends_web_url() {
		let transport = Arc::new(ScriptedTransport::default().reply("https://hooks.example/post", status(204)));

		run(
			transport.clone(),
			fast_settings(3),
			json!([{"Title": "Bare", "Url": "https://hooks.example/post", "Method": "POST"}]),
		)
		.await
		.unwrap();

		assert_eq!(
			transport.requests()[0].body,
			Some(json!({"pp_webUrl": "https://contoso.example/sites/a"}))
		);
	}

	#[tokio::test]
	async fn accepted_post_is_polled_until_done() {
		let transport = Arc::new(
			ScriptedTransport::default()
				.reply("https://hooks.example/job", accepted("https://hooks.example/status"))
				.reply("https://hooks.example/status", accepted("https://hooks.example/status"))
				.reply("https://hooks.example/status", status(200)),
		);

		run(
			transport.clone(),
			fast_settings(5),
			json!([{"Title": "Job", "Url": "https://hooks.example/job", "Method": "POST"}]),
		)
		.await
		.unwrap();

		let polls: Vec<_> = transport
			.requests()
			.into_iter()
			.filter(|r| r.url == "https://hooks.example/status")
			.collect();
		assert_eq!(polls.len(), 2);
		assert!(polls.iter().all(|r| r.method == HookMethod::Get));
	}

	#[tokio::test]
	async fn polling_gives_up_after_max_attempts() {
		let transport = Arc::new(
			ScriptedTransport::default()
				.reply("https://hooks.example/job", accepted("https://hooks.example/status"))
				.reply("https://hooks.example/status", accepted("https://hooks.example/status"))
				.reply("https://hooks.example/status", accepted("https://hooks.example/status")),
		);

		let result = run(
			transport,
			fast_settings(2),
			json!([{"Title": "Slow", "Url": "https://hooks.example/job", "Method": "POST"}]),
		)
		.await;

		match result {
			Err(HandlerError::PollTimeout { what, attempts }) => {
				assert_eq!(what, "hook 'Slow'");
				assert_eq!(attempts, 2);
			}
			other => panic!("expected poll timeout, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn non_success_reports_position_and_title() {
		let transport = Arc::new(
			ScriptedTransport::default()
				.reply("https://hooks.example/ok", status(200))
				.reply(
					"https://hooks.example/bad",
					HookResponse {
						status: 400,
						status_text: Some("Bad Request".to_string()),
						body: Some(json!({"error": "missing field"})),
						..Default::default()
					},
				),
		);

		let result = run(
			transport,
			fast_settings(1),
			json!([
				{"Title": "Fine", "Url": "https://hooks.example/ok", "Method": "GET"},
				{"Title": "Broken", "Url": "https://hooks.example/bad", "Method": "GET"}
			]),
		)
		.await;

		match result {
			Err(HandlerError::Hook(message)) => {
				assert_eq!(message, "400 - Bad Request | missing field - Hook 2/2: Broken");
			}
			other => panic!("expected hook error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn unsupported_methods_are_skipped() {
		let transport = Arc::new(ScriptedTransport::default());

		run(
			transport.clone(),
			fast_settings(1),
			json!([{"Title": "Remove", "Url": "https://hooks.example/x", "Method": "DELETE"}]),
		)
		.await
		.unwrap();

		assert!(transport.requests().is_empty());
	}
}
