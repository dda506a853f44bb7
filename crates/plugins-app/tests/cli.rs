use std::io::Write;
use std::process::{Command, Output};

const CONFIG: &str = r#"
upstreams:
- name: orders
  type: static
  serviceInfo:
    type: nats-streaming
    properties:
      discover_prefix: prod.discover
"#;

fn translate(config: &str, args: &[&str]) -> Output {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(config.as_bytes()).unwrap();
	Command::new(env!("CARGO_BIN_EXE_upstream-translate"))
		.arg("--file")
		.arg(file.path())
		.args(args)
		.env("RUST_LOG", "info")
		.env_remove("LOG_FORMAT")
		.env_remove("CLUSTER_NAME_PREFIX")
		.output()
		.unwrap()
}

#[test]
fn stdout_is_only_the_translated_json() {
	let out = translate(CONFIG, &[]);
	assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

	let rendered: serde_json::Value = serde_json::from_slice(&out.stdout)
		.unwrap_or_else(|e| panic!("{e}: {}", String::from_utf8_lossy(&out.stdout)));
	assert_eq!(rendered["clusters"][0]["name"], "orders");
	assert_eq!(
		rendered["httpFilters"][0]["config"],
		serde_json::json!({"MaxConnections": 1, "Cluster": "orders"})
	);

	let logs = String::from_utf8_lossy(&out.stderr);
	assert!(logs.contains("translation complete"), "{logs}");
}

#[test]
fn yaml_output_carries_no_log_lines() {
	let out = translate(CONFIG, &["--output", "yaml"]);
	assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
	let stdout = String::from_utf8_lossy(&out.stdout);
	assert!(stdout.contains("MaxConnections: 1"), "{stdout}");
	assert!(!stdout.contains("INFO"), "{stdout}");
}

#[test]
fn validate_only_fails_on_rejected_upstreams() {
	let rejected = r#"
upstreams:
- name: bad
  serviceInfo:
    type: nats-streaming
    properties:
      cluster_id: 7
"#;
	let out = translate(rejected, &["--validate-only"]);
	assert!(!out.status.success());
	let stderr = String::from_utf8_lossy(&out.stderr);
	assert!(stderr.contains("configuration rejected: bad"), "{stderr}");

	let out = translate(CONFIG, &["--validate-only"]);
	assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
	assert_eq!(
		String::from_utf8_lossy(&out.stdout).trim(),
		"Configuration is valid!"
	);
}
