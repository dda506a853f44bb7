use serde::{Deserialize, Serialize};

use super::properties::{CLUSTER_ID, DEFAULT_CLUSTER_ID, DISCOVER_PREFIX, ServiceProperties};
use crate::metadata::set_filter_metadata_string;
use crate::plugin::{Stage, StagedFilter};
use crate::protoutil;
use crate::types::envoy::{HttpFilter, Metadata};
use crate::*;

pub const FILTER_NAME: &str = "io.solo.nats_streaming";
pub const STAGE: Stage = Stage::OutAuth;

const MAX_CONNECTIONS: u32 = 1;

/// Configuration of the proxy's NATS Streaming HTTP filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterConfig {
	pub max_connections: u32,
	/// Name of the proxy cluster the filter publishes through.
	pub cluster: String,
}

impl FilterConfig {
	pub fn for_cluster(cluster: &str) -> FilterConfig {
		FilterConfig {
			max_connections: MAX_CONNECTIONS,
			cluster: cluster.to_string(),
		}
	}
}

/// Writes the connection parameters into the filter's metadata namespace of a cluster.
pub fn write_metadata(metadata: &mut Metadata, props: &ServiceProperties) {
	// cluster_id always carries the default id; only discover_prefix follows the resolved value.
	set_filter_metadata_string(FILTER_NAME, CLUSTER_ID, DEFAULT_CLUSTER_ID, metadata);
	set_filter_metadata_string(
		FILTER_NAME,
		DISCOVER_PREFIX,
		props.discover_prefix.as_str(),
		metadata,
	);
}

/// Stages the filter carrying `config`. A config that fails to serialize does not prevent
/// staging: the filter is staged without config and the error is handed back.
pub fn stage_filter<T: Serialize + Debug>(
	config: &T,
) -> (StagedFilter, Option<protoutil::Error>) {
	let (config, warning) = match protoutil::marshal_struct(config) {
		Ok(s) => (Some(s), None),
		Err(err) => {
			warn!(filter = FILTER_NAME, ?config, %err, "failed to build filter config");
			(None, Some(err))
		},
	};
	let staged = StagedFilter {
		filter: HttpFilter {
			name: FILTER_NAME.to_string(),
			config,
		},
		stage: STAGE,
	};
	(staged, warning)
}
