// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use weft_config::{HandlersConfig, ProvisioningConfig};
use weft_core::{
	Handler, HandlerError, HandlerLog, ProvisioningContext, Section, Template, WebClient,
};
use weft_handlers::MemoryWeb;
use weft_provisioner::{CaptureLayer, HandlerSort, ProvisionerState, ProvisioningError, WebProvisioner};

type Journal = Arc<Mutex<Vec<String>>>;

/// Appends `run:<Section>` to the journal, optionally failing.
struct Recording {
	section: Section,
	journal: Journal,
	fail: bool,
}

#[async_trait]
impl Handler for Recording {
	fn section(&self) -> Section {
		self.section
	}

	async fn provision_objects(
		&self,
		_web: &dyn WebClient,
		_payload: &Value,
		_context: &mut ProvisioningContext,
	) -> Result<(), HandlerError> {
		HandlerLog::new(self.section, None)
			.scoped(async {
				self.journal.lock().push(format!("run:{}", self.section));
				if self.fail {
					return Err(HandlerError::Failed(format!("{} exploded", self.section)));
				}
				Ok(())
			})
			.await
	}
}

fn web() -> Arc<MemoryWeb> {
	Arc::new(MemoryWeb::new("https://contoso.example/sites/project"))
}

fn recording_provisioner(
	web: Arc<MemoryWeb>,
	config: ProvisioningConfig,
	journal: &Journal,
	failing: &[Section],
) -> WebProvisioner {
	let mut provisioner = WebProvisioner::new(web);
	provisioner.setup(config).unwrap();
	for section in Section::ALL {
		provisioner.register_handler(Arc::new(Recording {
			section,
			journal: journal.clone(),
			fail: failing.contains(&section),
		}));
	}
	provisioner
}

fn priorities(entries: &[(Section, u32)]) -> ProvisioningConfig {
	ProvisioningConfig {
		handlers: HandlersConfig {
			priorities: entries.iter().copied().collect(),
			..Default::default()
		},
		..Default::default()
	}
}

fn abc_template() -> Template {
	Template::from_value(json!({
		"Navigation": [],
		"Features": [],
		"Hooks": []
	}))
	.unwrap()
}

#[tokio::test]
async fn handlers_run_in_priority_order_with_progress_first() {
	let journal = Journal::default();
	let config = priorities(&[(Section::Navigation, 2), (Section::Features, 1), (Section::Hooks, 50)]);
	let mut provisioner = recording_provisioner(web(), config, &journal, &[]);

	let progress_journal = journal.clone();
	let mut progress = move |section: Section| progress_journal.lock().push(format!("progress:{section}"));
	provisioner
		.apply_template(&abc_template(), None, Some(&mut progress))
		.await
		.unwrap();

	assert_eq!(
		*journal.lock(),
		vec![
			"progress:Features",
			"run:Features",
			"progress:Navigation",
			"run:Navigation",
			"progress:Hooks",
			"run:Hooks",
		]
	);
	assert_eq!(provisioner.state(), ProvisionerState::Completed);
}

#[tokio::test]
async fn first_failure_aborts_and_names_the_handler() {
	let journal = Journal::default();
	let config = priorities(&[(Section::Navigation, 2), (Section::Features, 1)]);
	let mut provisioner = recording_provisioner(web(), config, &journal, &[Section::Features]);

	let err = provisioner
		.apply_template(&abc_template(), None, None)
		.await
		.unwrap_err();

	assert_eq!(err.handler(), Some(Section::Features));
	assert!(matches!(
		err,
		ProvisioningError::Handler {
			source: HandlerError::Failed(_),
			..
		}
	));
	assert_eq!(*journal.lock(), vec!["run:Features"]);
	assert_eq!(provisioner.state(), ProvisionerState::Failed);
}

#[tokio::test]
async fn allow_list_and_disabled_handlers_are_skipped_without_progress() {
	let journal = Journal::default();
	let config = ProvisioningConfig {
		handlers: HandlersConfig {
			disabled: vec![Section::Hooks],
			..Default::default()
		},
		..Default::default()
	};
	let mut provisioner = recording_provisioner(web(), config, &journal, &[]);

	let mut calls = 0;
	let mut progress = |_: Section| calls += 1;
	provisioner
		.apply_template(
			&abc_template(),
			Some(&[Section::Hooks, Section::Navigation][..]),
			Some(&mut progress),
		)
		.await
		.unwrap();

	assert_eq!(*journal.lock(), vec!["run:Navigation"]);
	assert_eq!(calls, 1);
}

#[test]
fn plan_matches_execution_order() {
	let journal = Journal::default();
	let config = priorities(&[(Section::Hooks, 0)]);
	let mut provisioner = recording_provisioner(web(), config, &journal, &[]);
	let template = abc_template();

	let plan = provisioner.plan(&template, None).unwrap();
	tokio_test::block_on(provisioner.apply_template(&template, None, None)).unwrap();

	let executed: Vec<String> = plan.iter().map(|s| format!("run:{s}")).collect();
	assert_eq!(plan, vec![Section::Hooks, Section::Features, Section::Navigation]);
	assert_eq!(*journal.lock(), executed);
}

#[tokio::test]
async fn custom_sort_runs_unlisted_sections_last_in_template_order() {
	let journal = Journal::default();
	let mut provisioner = recording_provisioner(web(), ProvisioningConfig::default(), &journal, &[]);
	let mut sort = HandlerSort::empty();
	sort.set(Section::Navigation, 2);
	sort.set(Section::Features, 1);
	provisioner.with_handler_sort(sort);

	let template = Template::from_value(json!({
		"Navigation": [],
		"Features": [],
		"Lists": [],
		"Hooks": []
	}))
	.unwrap();
	assert_eq!(
		provisioner.plan(&template, None).unwrap(),
		vec![Section::Features, Section::Navigation, Section::Lists, Section::Hooks]
	);
	provisioner.apply_template(&template, None, None).await.unwrap();

	assert_eq!(
		*journal.lock(),
		vec!["run:Features", "run:Navigation", "run:Lists", "run:Hooks"]
	);
}

#[tokio::test]
async fn config_priorities_apply_over_custom_sort() {
	let journal = Journal::default();
	let config = priorities(&[(Section::Hooks, 0)]);
	let mut provisioner = recording_provisioner(web(), config, &journal, &[]);
	let mut sort = HandlerSort::empty();
	sort.set(Section::Navigation, 2);
	sort.set(Section::Features, 1);
	provisioner.with_handler_sort(sort);

	provisioner.apply_template(&abc_template(), None, None).await.unwrap();

	assert_eq!(*journal.lock(), vec!["run:Hooks", "run:Features", "run:Navigation"]);
}

#[tokio::test]
async fn scope_events_bracket_every_handler() {
	let capture = CaptureLayer::new();
	let subscriber = tracing_subscriber::registry().with(capture.clone());
	let _guard = tracing::subscriber::set_default(subscriber);

	let journal = Journal::default();
	let config = priorities(&[(Section::Navigation, 2), (Section::Features, 1)]);
	let mut provisioner = recording_provisioner(web(), config, &journal, &[Section::Navigation]);
	let _ = provisioner.apply_template(&abc_template(), None, None).await;

	let scopes: Vec<(Level, String, String)> = capture
		.events()
		.into_iter()
		.filter(|e| e.field("scope") == Some("ProvisionObjects"))
		.map(|e| (e.level, e.field("handler").unwrap_or_default().to_string(), e.message))
		.collect();

	assert_eq!(scopes.len(), 4);
	assert_eq!(scopes[0].1, "Features");
	assert!(scopes[0].2.contains("scope started"));
	assert!(scopes[1].2.contains("scope ended"));
	assert_eq!(scopes[3].0, Level::ERROR);
	assert_eq!(scopes[3].1, "Navigation");
	assert!(scopes[3].2.contains("Navigation exploded"));
}

#[tokio::test]
async fn default_handlers_provision_a_full_template() {
	let web = Arc::new(
		MemoryWeb::new("https://contoso.example/sites/project")
			.with_property_bag_support()
			.with_source("/sites/project/assets/home.aspx", "<html/>"),
	);
	let config = ProvisioningConfig {
		parameters: BTreeMap::from([("Department".to_string(), "Engineering".to_string())]),
		..Default::default()
	};
	let mut provisioner = WebProvisioner::new(web.clone());
	provisioner.setup(config).unwrap();

	let template = Template::from_value(json!({
		"Parameters": {"Owner": "alice"},
		"WebSettings": {"Title": "Project hub", "WelcomePage": "SitePages/Home.aspx"},
		"Navigation": {"QuickLaunch": [{"Title": "Tasks", "Url": "{site}/Lists/Tasks"}]},
		"Files": [{
			"Folder": "SitePages",
			"Src": "{site}/assets/home.aspx",
			"Url": "Home.aspx",
			"WebParts": [{
				"Title": "Tasks",
				"Zone": "Main",
				"Contents": {"Xml": "<webPart list=\"{listid:Tasks}\" view=\"{listviewid:Tasks|Open}\" owner=\"{parameter:Owner}\" />"}
			}]
		}],
		"Lists": [{
			"Title": "Tasks",
			"FieldRefs": [{"ID": "{F1}", "Name": "ProjectOwner"}],
			"Views": [{"Title": "Open", "ViewFields": ["Title", "ProjectOwner"]}]
		}],
		"PropertyBagEntries": [{"Key": "owner", "Value": "alice", "Indexed": true, "Overwrite": true}],
		"SiteFields": ["<Field ID=\"{F1}\" Name=\"ProjectOwner\" DisplayName=\"{parameter:Department} owner\" Type=\"User\" />"]
	}))
	.unwrap();

	let mut seen = Vec::new();
	let mut progress = |section: Section| seen.push(section);
	provisioner
		.apply_template(&template, None, Some(&mut progress))
		.await
		.unwrap();

	assert_eq!(
		seen,
		vec![
			Section::SiteFields,
			Section::Lists,
			Section::Files,
			Section::PropertyBagEntries,
			Section::Navigation,
			Section::WebSettings,
		]
	);

	let context = provisioner.context();
	let list_id = context.list_id("Tasks").unwrap().to_string();
	let view_id = context.list_view_id("Tasks", "Open").unwrap().to_string();
	assert_eq!(context.site_fields.get("ProjectOwner").map(String::as_str), Some("F1"));

	let state = web.snapshot();
	let tasks = state.list("Tasks").unwrap();
	assert_eq!(tasks.fields.len(), 1);
	let home = &state.files["/sites/project/SitePages/Home.aspx"];
	assert_eq!(
		home.web_parts[0].xml,
		format!("<webPart list=\"{list_id}\" view=\"{view_id}\" owner=\"alice\" />")
	);
	assert_eq!(state.info.title, "Project hub");
	assert!(state.site_fields[0].schema_xml.contains("DisplayName=\"Engineering owner\""));
	assert_eq!(state.welcome_page.as_deref(), Some("SitePages/Home.aspx"));
	assert_eq!(state.property_bag.get("owner").map(String::as_str), Some("alice"));
	assert_eq!(state.navigation[0].url, "/sites/project/Lists/Tasks");
}
