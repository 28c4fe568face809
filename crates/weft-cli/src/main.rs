// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use weft_config::{
	load_from_sources, ConfigSource, DefaultsSource, EnvSource, EnvironmentConfigLayer, LoggingConfigLayer,
	OverrideSource, ProvisioningConfig, ProvisioningConfigLayer, TomlSource,
};
use weft_core::{HandlerSettings, ProvisioningContext, Section, Template, WebInfo};
use weft_handlers::MemoryWeb;
use weft_provisioner::WebProvisioner;

const DEFAULT_WEB_URL: &str = "https://contoso.example/sites/weft";

#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Provision site templates", long_about = None)]
struct Args {
	/// Path to a configuration file (defaults to ./weft.toml)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log filter directive, e.g. "debug" or "weft_handlers=trace"
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	/// Template parameter (repeatable: -p KEY=VALUE)
	#[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_val, global = true)]
	params: Vec<(String, String)>,

	/// Absolute site URL used for {site}, {sitecollection} and friends
	#[arg(long, global = true)]
	site_url: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the handlers a template would run, in execution order
	Plan {
		template: PathBuf,
		/// Only run these sections (comma separated)
		#[arg(long, value_delimiter = ',')]
		handlers: Vec<Section>,
	},
	/// Apply a template to an in-memory web and print the outcome as JSON
	Simulate {
		template: PathBuf,
		/// Only run these sections (comma separated)
		#[arg(long, value_delimiter = ',')]
		handlers: Vec<Section>,
		/// URL of the simulated web
		#[arg(long, default_value = DEFAULT_WEB_URL)]
		web_url: String,
		/// Also print everything the simulated web ended up holding
		#[arg(long)]
		state: bool,
	},
	/// Resolve tokens in a piece of text
	Resolve {
		text: String,
		/// Id used for {webid:..}, {siteid:..} and {sitecollectionid:..}
		#[arg(long)]
		web_id: Option<String>,
	},
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
	let (key, value) = s
		.split_once('=')
		.ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
	if key.is_empty() {
		return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
	}
	Ok((key.to_string(), value.to_string()))
}

/// The command-line flags as the highest-precedence config layer.
fn cli_overrides(args: &Args) -> ProvisioningConfigLayer {
	let parameters: BTreeMap<String, String> = args.params.iter().cloned().collect();
	ProvisioningConfigLayer {
		logging: Some(LoggingConfigLayer {
			level: args.log_level.clone(),
			prefix: None,
			json: args.json_logs.then_some(true),
		}),
		environment: args.site_url.as_ref().map(|site_url| EnvironmentConfigLayer {
			site_url: Some(site_url.clone()),
			host_url: None,
		}),
		parameters: (!parameters.is_empty()).then_some(parameters),
		..Default::default()
	}
}

fn config_sources(args: &Args, env: EnvSource) -> Vec<Box<dyn ConfigSource>> {
	let toml = match &args.config {
		Some(path) => TomlSource::new(path),
		None => TomlSource::local(),
	};
	vec![
		Box::new(DefaultsSource),
		Box::new(toml),
		Box::new(env),
		Box::new(OverrideSource::new(cli_overrides(args))),
	]
}

fn allow_list(handlers: &[Section]) -> Option<&[Section]> {
	(!handlers.is_empty()).then_some(handlers)
}

fn load_template(path: &Path) -> Result<Template> {
	Template::from_path(path).with_context(|| format!("failed to load template {}", path.display()))
}

fn plan(config: ProvisioningConfig, template: &Template, handlers: &[Section]) -> Result<Vec<Section>> {
	let mut provisioner = WebProvisioner::new(Arc::new(MemoryWeb::new(DEFAULT_WEB_URL)));
	provisioner.setup(config)?;
	Ok(provisioner.plan(template, allow_list(handlers))?)
}

async fn simulate(
	config: ProvisioningConfig,
	template: &Template,
	handlers: &[Section],
	web_url: &str,
	include_state: bool,
) -> Result<serde_json::Value> {
	let web = Arc::new(MemoryWeb::new(web_url));
	let mut provisioner = WebProvisioner::new(web.clone());
	provisioner.setup(config)?;

	let mut step = 0usize;
	let mut progress = |section: Section| {
		step += 1;
		eprintln!("[{step}] {section}");
	};
	provisioner
		.apply_template(template, allow_list(handlers), Some(&mut progress))
		.await?;

	let mut output = serde_json::json!({ "context": provisioner.context() });
	if include_state {
		output["web"] = serde_json::to_value(web.snapshot())?;
	}
	Ok(output)
}

fn resolve(config: &ProvisioningConfig, text: &str, web_id: Option<String>) -> String {
	let settings = HandlerSettings {
		parameters: config.parameters.clone(),
		environment: config.environment.site_environment(),
		..Default::default()
	};
	let context = ProvisioningContext::new(WebInfo {
		id: web_id.unwrap_or_default(),
		url: config.environment.site_url.clone().unwrap_or_default(),
		..Default::default()
	});
	settings.resolve_all(&context, text)
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	let config = load_from_sources(config_sources(&args, EnvSource::from_process()))?;
	weft_provisioner::logging::init(&config.logging).context("failed to initialize logging")?;
	debug!(command = ?args.command, "weft starting");

	match args.command {
		Command::Plan { template, handlers } => {
			let template = load_template(&template)?;
			for (index, section) in plan(config, &template, &handlers)?.iter().enumerate() {
				println!("{}. {section}", index + 1);
			}
		}
		Command::Simulate {
			template,
			handlers,
			web_url,
			state,
		} => {
			let template = load_template(&template)?;
			let output = simulate(config, &template, &handlers, &web_url, state).await?;
			println!("{}", serde_json::to_string_pretty(&output)?);
			info!("Simulation finished");
		}
		Command::Resolve { text, web_id } => {
			println!("{}", resolve(&config, &text, web_id));
		}
	}

	Ok(())
}
