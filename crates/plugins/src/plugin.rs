//! The capability interface the translator drives for every registered plugin.

use prost_types::Struct;
use serde::Serialize;

use crate::types::envoy::{Cluster, HttpFilter};
use crate::types::upstream::{Snapshot, Upstream};
use crate::*;

/// Position of an HTTP filter in the chain. Filters are ordered by stage, and by
/// registration order within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
	Fault,
	PreInAuth,
	InAuth,
	PostInAuth,
	PreOutAuth,
	OutAuth,
}

/// An HTTP filter waiting to be placed into the listener's filter chain.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFilter {
	pub filter: HttpFilter,
	pub stage: Stage,
}

/// Resources outside the snapshot that a plugin needs before it can translate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
	pub secret_refs: Vec<Strng>,
	pub file_refs: Vec<Strng>,
}

impl Dependencies {
	pub fn merge(&mut self, other: Dependencies) {
		self.secret_refs.extend(other.secret_refs);
		self.file_refs.extend(other.file_refs);
	}

	pub fn is_empty(&self) -> bool {
		self.secret_refs.is_empty() && self.file_refs.is_empty()
	}
}

#[derive(Debug, Clone, Copy)]
pub struct UpstreamParams<'a> {
	pub snapshot: &'a Snapshot,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterParams<'a> {
	pub snapshot: &'a Snapshot,
}

#[derive(Debug, Clone)]
pub struct FunctionParams {
	/// Service type of the upstream the function belongs to.
	pub service_type: Strng,
}

/// Result of offering an upstream to a plugin.
#[derive(Debug)]
pub enum Outcome {
	/// The upstream is not handled by this plugin; nothing was changed.
	Skipped,
	Applied,
	/// The upstream was translated, but part of the generated output had to be dropped.
	Degraded(anyhow::Error),
}

/// A plugin translates the parts of upstreams it understands into proxy configuration.
///
/// A plugin instance is driven through a single translation pass: every upstream is offered
/// to `process_upstream` before `http_filters` is called once to collect the filters the
/// pass produced. Instances are not shared between passes.
pub trait Plugin: Send {
	fn name(&self) -> &'static str;

	fn dependencies(&self, _snapshot: &Snapshot) -> Option<Dependencies> {
		None
	}

	/// Returns, and forgets, every filter staged since the last call.
	fn http_filters(&mut self, params: &FilterParams<'_>) -> Vec<StagedFilter>;

	fn process_upstream(
		&mut self,
		params: &UpstreamParams<'_>,
		upstream: &Upstream,
		out: &mut Cluster,
	) -> anyhow::Result<Outcome>;

	/// Converts a function spec attached to an upstream into the per-route filter config.
	/// `Ok(None)` means the plugin has nothing to say about this service type.
	fn parse_function_spec(
		&self,
		params: &FunctionParams,
		spec: Option<&Struct>,
	) -> anyhow::Result<Option<Struct>>;
}
