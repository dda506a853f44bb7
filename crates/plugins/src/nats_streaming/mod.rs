//! Translates upstreams running a NATS Streaming service.
//!
//! For every such upstream the cluster's filter metadata receives the streaming connection
//! parameters, and one `io.solo.nats_streaming` HTTP filter is staged for the listener's
//! filter chain.

use prost_types::Struct;
use thiserror::Error;

use crate::plugin::{
	FilterParams, FunctionParams, Outcome, Plugin, StagedFilter, UpstreamParams,
};
use crate::protoutil;
use crate::types::envoy::{Cluster, Metadata};
use crate::types::upstream::Upstream;
use crate::*;

pub mod filter;
pub mod properties;


pub use filter::{FILTER_NAME, FilterConfig, STAGE};
pub use properties::{ServiceProperties, encode, resolve};

pub const SERVICE_TYPE: &str = "nats-streaming";
pub const PLUGIN_NAME: &str = "nats-streaming";

#[derive(Error, Debug)]
pub enum Error {
	#[error("unmarshalling service properties: {0}")]
	Unmarshal(#[source] protoutil::Error),
	#[error("functions are not required for service type {}", SERVICE_TYPE)]
	FunctionsNotSupported,
}

/// The NATS Streaming plugin. Filters staged by `process_upstream` are held until the
/// next `http_filters` call.
#[derive(Debug, Default)]
pub struct NatsStreaming {
	filters: Vec<StagedFilter>,
}

impl NatsStreaming {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of filters staged and not yet drained.
	pub fn pending(&self) -> usize {
		self.filters.len()
	}
}

impl Plugin for NatsStreaming {
	fn name(&self) -> &'static str {
		PLUGIN_NAME
	}

	fn http_filters(&mut self, _params: &FilterParams<'_>) -> Vec<StagedFilter> {
		std::mem::take(&mut self.filters)
	}

	fn process_upstream(
		&mut self,
		_params: &UpstreamParams<'_>,
		upstream: &Upstream,
		out: &mut Cluster,
	) -> anyhow::Result<Outcome> {
		let Some(service_info) = upstream
			.service_info
			.as_ref()
			.filter(|s| s.service_type.as_str() == SERVICE_TYPE)
		else {
			return Ok(Outcome::Skipped);
		};
		// Resolve before touching `out`, so a bad document leaves the cluster unchanged.
		let props = properties::resolve(service_info.properties.as_ref())
			.with_context(|| format!("upstream {}", upstream.name))?;

		filter::write_metadata(out.metadata.get_or_insert_with(Metadata::default), &props);

		let (staged, warning) = filter::stage_filter(&FilterConfig::for_cluster(&out.name));
		self.filters.push(staged);
		debug!(
			upstream = %upstream.name,
			cluster = %out.name,
			discover_prefix = %props.discover_prefix,
			"staged {FILTER_NAME} filter"
		);

		Ok(match warning {
			None => Outcome::Applied,
			Some(err) => Outcome::Degraded(
				anyhow::Error::new(err).context(format!("{FILTER_NAME} config for cluster {}", out.name)),
			),
		})
	}

	fn parse_function_spec(
		&self,
		params: &FunctionParams,
		_spec: Option<&Struct>,
	) -> anyhow::Result<Option<Struct>> {
		if params.service_type.as_str() != SERVICE_TYPE {
			return Ok(None);
		}
		Err(Error::FunctionsNotSupported.into())
	}
}
