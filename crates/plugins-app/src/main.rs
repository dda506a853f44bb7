use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use plugin_core::{telemetry, version};
use tracing::info;
use upstream_plugins::translator::TranslationOutput;
use upstream_plugins::{Registry, serdes};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
	/// Use config from bytes
	#[arg(short, long, value_name = "config")]
	config: Option<String>,

	/// Use config from file
	#[arg(short, long, value_name = "file")]
	file: Option<PathBuf>,

	/// Format of the generated configuration
	#[arg(short, long, value_enum, default_value_t = Output::Json)]
	output: Output,

	/// Only check the config: fails if any upstream or function is rejected. Upstreams
	/// translated with degraded output pass, and are listed on stderr.
	#[arg(long, value_name = "validate-only")]
	validate_only: bool,

	/// Print version (as a simple version string)
	#[arg(short = 'V', value_name = "version")]
	version_short: bool,

	/// Print version (as JSON)
	#[arg(long = "version")]
	version_long: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Output {
	Json,
	Yaml,
}

fn main() -> anyhow::Result<()> {
	let _log_flush = telemetry::setup_logging();

	let Args {
		config,
		file,
		output,
		validate_only,
		version_short,
		version_long,
	} = Args::parse();

	if version_short {
		println!("{}", version::BuildInfo::new().version);
		return Ok(());
	}
	if version_long {
		println!("{}", version::BuildInfo::new());
		return Ok(());
	}

	let (contents, filename) = match (config, file) {
		(Some(_), Some(_)) => {
			anyhow::bail!("only one of --config or --file")
		},
		(Some(config), None) => (config, None),
		(None, Some(file)) => {
			let contents = fs_err::read_to_string(&file)?;
			(contents, Some(file))
		},
		(None, None) => ("{}".to_string(), None),
	};
	let config = upstream_plugins::config::parse_config(contents, filename)?;
	info!(
		upstreams = config.snapshot.upstreams.len(),
		cluster_name_prefix = %config.cluster_name_prefix,
		"loaded config"
	);

	let translation = config
		.translator(Registry::builtin())
		.translate(&config.snapshot);
	let rendered = translation.render()?;

	if validate_only {
		let warnings = validate(&rendered)?;
		for warning in warnings {
			eprintln!("warning: {warning}");
		}
		println!("Configuration is valid!");
		return Ok(());
	}

	match output {
		Output::Json => println!("{}", serde_json::to_string_pretty(&rendered)?),
		Output::Yaml => print!("{}", serdes::yamlviajson::to_string(&rendered)?),
	}
	Ok(())
}

/// Fails when anything was rejected; otherwise returns one line per degraded upstream.
fn validate(output: &TranslationOutput) -> anyhow::Result<Vec<String>> {
	if !output.rejected.is_empty() {
		let names: Vec<_> = output.rejected.iter().map(|r| r.name.as_str()).collect();
		anyhow::bail!("configuration rejected: {}", names.join(", "));
	}
	Ok(
		output
			.warnings
			.iter()
			.map(|w| format!("{} ({}): {}", w.name, w.plugin, w.reason))
			.collect(),
	)
}

#[cfg(test)]
mod tests {
	use upstream_plugins::translator::ReportOutput;

	use super::*;

	fn report(name: &str, plugin: &'static str, reason: &str) -> ReportOutput {
		ReportOutput {
			name: plugin_core::strng::new(name),
			plugin,
			reason: reason.to_string(),
		}
	}

	fn output() -> TranslationOutput {
		TranslationOutput {
			clusters: vec![],
			http_filters: vec![],
			functions: Default::default(),
			dependencies: Default::default(),
			rejected: vec![],
			warnings: vec![],
		}
	}

	#[test]
	fn validation_lists_warnings_without_failing() {
		let mut out = output();
		out.warnings = vec![report("orders", "nats-streaming", "config dropped")];
		assert_eq!(
			validate(&out).unwrap(),
			vec!["orders (nats-streaming): config dropped".to_string()]
		);
		assert!(validate(&output()).unwrap().is_empty());
	}

	#[test]
	fn validation_fails_on_rejections() {
		let mut out = output();
		out.rejected = vec![
			report("bad", "nats-streaming", "unmarshalling service properties"),
			report("orders/publish", "nats-streaming", "functions are not required"),
		];
		out.warnings = vec![report("orders", "nats-streaming", "config dropped")];
		let err = validate(&out).unwrap_err();
		assert_eq!(
			err.to_string(),
			"configuration rejected: bad, orders/publish"
		);
	}
}
