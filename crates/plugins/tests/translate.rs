use std::io::Write;

use serde_json::json;
use upstream_plugins::config::parse_config;
use upstream_plugins::nats_streaming::FILTER_NAME;
use upstream_plugins::translator::ROUTER_FILTER;
use upstream_plugins::{Registry, serdes};

const LOCAL_CONFIG: &str = r#"
config:
  clusterNamePrefix: ""
upstreams:
- name: cluster-42
  type: static
  serviceInfo:
    type: nats-streaming
    properties:
      cluster_id: ""
      discover_prefix: prod.discover
  functions:
  - name: publish
    spec:
      topic: orders
- name: defaults
  type: static
  serviceInfo:
    type: nats-streaming
- name: bad
  type: static
  serviceInfo:
    type: nats-streaming
    properties:
      discover_prefix: 42
- name: rest
  type: static
  serviceInfo:
    type: REST
    properties:
      swagger: /api.json
"#;

fn load(contents: &str) -> upstream_plugins::Config {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(contents.as_bytes()).unwrap();
	let contents = std::fs::read_to_string(file.path()).unwrap();
	parse_config(contents, Some(file.path().to_path_buf())).unwrap()
}

#[test]
fn translates_local_config() {
	let config = load(LOCAL_CONFIG);
	let translation = config
		.translator(Registry::builtin())
		.translate(&config.snapshot);
	let output = serde_json::to_value(translation.render().unwrap()).unwrap();

	// CLUSTER_NAME_PREFIX may be set by whoever runs the tests.
	let prefix = config.cluster_name_prefix.as_str();
	let name = |n: &str| format!("{prefix}{n}");

	assert_eq!(
		output["clusters"],
		json!([
			{
				"name": name("cluster-42"),
				"filterMetadata": {
					"io.solo.nats_streaming": {"cluster_id": "test-cluster", "discover_prefix": "prod.discover"}
				}
			},
			{
				"name": name("defaults"),
				"filterMetadata": {
					"io.solo.nats_streaming": {"cluster_id": "test-cluster", "discover_prefix": "_STAN.discover"}
				}
			},
			{"name": name("rest")}
		])
	);
	assert_eq!(
		output["httpFilters"],
		json!([
			{"name": FILTER_NAME, "config": {"MaxConnections": 1, "Cluster": name("cluster-42")}},
			{"name": FILTER_NAME, "config": {"MaxConnections": 1, "Cluster": name("defaults")}},
			{"name": ROUTER_FILTER}
		])
	);

	let rejected: Vec<_> = output["rejected"]
		.as_array()
		.unwrap()
		.iter()
		.map(|r| r["name"].as_str().unwrap().to_string())
		.collect();
	assert_eq!(rejected, vec!["cluster-42/publish", "bad"]);
	let bad_reason = output["rejected"][1]["reason"].as_str().unwrap();
	assert!(bad_reason.contains("discover_prefix"), "{bad_reason}");
	assert!(output.get("warnings").is_none());
}

#[test]
fn output_renders_as_yaml() {
	let config = load(
		r#"
upstreams:
- name: orders
  serviceInfo:
    type: nats-streaming
"#,
	);
	let translation = config
		.translator(Registry::builtin())
		.translate(&config.snapshot);
	let yaml = serdes::yamlviajson::to_string(&translation.render().unwrap()).unwrap();
	assert!(yaml.contains("MaxConnections: 1"), "{yaml}");
	assert!(yaml.contains("discover_prefix: _STAN.discover"), "{yaml}");
	assert!(yaml.contains(ROUTER_FILTER), "{yaml}");
}

#[test]
fn invalid_file_names_the_source() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(b"upstreams: {}").unwrap();
	let path = file.path().to_path_buf();
	let contents = std::fs::read_to_string(&path).unwrap();
	let err = parse_config(contents, Some(path.clone())).unwrap_err();
	assert!(
		format!("{err:#}").contains(&path.display().to_string()),
		"{err:#}"
	);
}
