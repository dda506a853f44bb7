use prost_types::Struct;
use serde::{Deserialize, Serialize};

use crate::protoutil::serde_struct_option;
use crate::serdes::is_default;
use crate::*;

/// The user resources a translation pass works on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Snapshot {
	#[serde(default)]
	pub upstreams: Vec<Upstream>,
}

/// An abstract upstream service as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Upstream {
	pub name: Strng,
	/// How the upstream's endpoints are discovered (static, kubernetes, ...).
	/// Independent of the service running behind it.
	#[serde(rename = "type", default, skip_serializing_if = "is_default")]
	pub upstream_type: Strng,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub service_info: Option<ServiceInfo>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub functions: Vec<Function>,
}

/// Describes the service running on an upstream, such as nats-streaming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceInfo {
	#[serde(rename = "type")]
	pub service_type: Strng,
	/// Service specific parameters; their schema is owned by the plugin for `service_type`.
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "serde_struct_option"
	)]
	pub properties: Option<Struct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Function {
	pub name: Strng,
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "serde_struct_option"
	)]
	pub spec: Option<Struct>,
}

impl Upstream {
	pub fn service_type(&self) -> Option<&str> {
		self.service_info.as_ref().map(|s| s.service_type.as_str())
	}
}
