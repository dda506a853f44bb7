use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::Registry;
use crate::serdes;
use crate::translator::Translator;
use crate::types::upstream::{Snapshot, Upstream};
use crate::*;

/// Settings of the translator itself, as written in the `config` section of a local file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
	cluster_name_prefix: Option<String>,
}

/// A local configuration file: translator settings plus the upstreams to translate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LocalConfig {
	#[serde(default)]
	config: Option<RawConfig>,
	#[serde(default)]
	upstreams: Vec<Upstream>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
	/// Prepended to upstream names to form proxy cluster names.
	pub cluster_name_prefix: Strng,
	pub snapshot: Snapshot,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<PathBuf>,
}

impl Config {
	/// A translator for one pass over this config's snapshot.
	pub fn translator(&self, registry: Registry) -> Translator {
		Translator::new(registry).with_cluster_name_prefix(self.cluster_name_prefix.clone())
	}
}

pub fn parse_config(contents: String, filename: Option<PathBuf>) -> anyhow::Result<Config> {
	let local: LocalConfig = serdes::yamlviajson::from_str(&contents).with_context(|| match &filename {
		Some(f) => format!("parsing {}", f.display()),
		None => "parsing inline config".to_string(),
	})?;
	let raw = local.config.unwrap_or_default();

	let cluster_name_prefix = parse::<String>("CLUSTER_NAME_PREFIX")?
		.or(raw.cluster_name_prefix)
		.map(strng::new)
		.unwrap_or_default();

	Ok(Config {
		cluster_name_prefix,
		snapshot: Snapshot {
			upstreams: local.upstreams,
		},
		source: filename,
	})
}

fn parse<T: FromStr>(env: &str) -> anyhow::Result<Option<T>>
where
	<T as FromStr>::Err: ToString,
{
	match env::var(env) {
		Ok(val) => val
			.parse()
			.map(|v| Some(v))
			.map_err(|e: <T as FromStr>::Err| {
				anyhow::anyhow!("invalid env var {}={} ({})", env, val, e.to_string())
			}),
		Err(_) => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use prost_types::value::Kind;

	use super::*;

	const SAMPLE: &str = r#"
config:
  clusterNamePrefix: "edge~"
upstreams:
- name: orders
  type: static
  serviceInfo:
    type: nats-streaming
    properties:
      cluster_id: prod
      discover_prefix: prod.discover
  functions:
  - name: publish
    spec:
      topic: orders
- name: plain
"#;

	#[test]
	fn parses_local_yaml() {
		let cfg = parse_config(SAMPLE.to_string(), Some(PathBuf::from("sample.yaml"))).unwrap();
		// CLUSTER_NAME_PREFIX may override the file in the environment running the tests.
		if env::var("CLUSTER_NAME_PREFIX").is_err() {
			assert_eq!(cfg.cluster_name_prefix.as_str(), "edge~");
		}
		assert_eq!(cfg.source, Some(PathBuf::from("sample.yaml")));

		let upstreams = &cfg.snapshot.upstreams;
		assert_eq!(upstreams.len(), 2);
		assert_eq!(upstreams[0].service_type(), Some("nats-streaming"));
		let props = upstreams[0]
			.service_info
			.as_ref()
			.and_then(|s| s.properties.as_ref())
			.unwrap();
		assert_eq!(
			props.fields["discover_prefix"].kind,
			Some(Kind::StringValue("prod.discover".to_string()))
		);
		assert_eq!(upstreams[0].functions[0].name.as_str(), "publish");
		assert_eq!(upstreams[1].service_type(), None);
	}

	#[test]
	fn empty_config_is_valid() {
		let cfg = parse_config("{}".to_string(), None).unwrap();
		assert!(cfg.snapshot.upstreams.is_empty());
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let err = parse_config("upstream: []".to_string(), None).unwrap_err();
		assert!(format!("{err:#}").contains("parsing inline config"), "{err:#}");
	}

	#[test]
	fn non_object_properties_are_rejected() {
		let input = r#"
upstreams:
- name: orders
  serviceInfo:
    type: nats-streaming
    properties: [1, 2]
"#;
		let err = parse_config(input.to_string(), None).unwrap_err();
		assert!(format!("{err:#}").contains("expected a document object"), "{err:#}");
	}

	#[test]
	fn env_values_are_parsed() {
		assert_eq!(parse::<u32>("UPSTREAM_PLUGINS_TEST_UNSET_VARIABLE").unwrap(), None);
	}
}
