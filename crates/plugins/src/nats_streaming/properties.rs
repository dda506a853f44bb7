use prost_types::Struct;
use serde::{Deserialize, Serialize};

use super::Error;
use crate::protoutil;
use crate::*;

pub const CLUSTER_ID: &str = "cluster_id";
pub const DISCOVER_PREFIX: &str = "discover_prefix";

pub const DEFAULT_CLUSTER_ID: &str = "test-cluster";
pub const DEFAULT_DISCOVER_PREFIX: &str = "_STAN.discover";

/// Connection parameters of a NATS Streaming service. Both fields are non-empty once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceProperties {
	pub cluster_id: Strng,
	pub discover_prefix: Strng,
}

// The document as written by the user. Unknown keys are ignored; null counts as absent.
#[derive(Debug, Default, Deserialize)]
struct RawServiceProperties {
	#[serde(default)]
	cluster_id: Option<String>,
	#[serde(default)]
	discover_prefix: Option<String>,
}

impl Default for ServiceProperties {
	fn default() -> Self {
		ServiceProperties {
			cluster_id: strng::new(DEFAULT_CLUSTER_ID),
			discover_prefix: strng::new(DEFAULT_DISCOVER_PREFIX),
		}
	}
}

/// Decodes the service properties document of an upstream, substituting the defaults for
/// missing or empty fields.
pub fn resolve(document: Option<&Struct>) -> Result<ServiceProperties, Error> {
	let raw: RawServiceProperties =
		protoutil::unmarshal_struct(document).map_err(Error::Unmarshal)?;
	Ok(ServiceProperties {
		cluster_id: or_default(raw.cluster_id, DEFAULT_CLUSTER_ID),
		discover_prefix: or_default(raw.discover_prefix, DEFAULT_DISCOVER_PREFIX),
	})
}

/// Builds the properties document for a NATS Streaming service.
pub fn encode(props: &ServiceProperties) -> Result<Struct, protoutil::Error> {
	protoutil::marshal_struct(props)
}

fn or_default(value: Option<String>, default: &str) -> Strng {
	match value {
		Some(v) if !v.is_empty() => strng::new(v),
		_ => strng::new(default),
	}
}
