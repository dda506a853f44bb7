//! One configuration synthesis pass: offers every upstream to every plugin, then assembles the
//! HTTP filter chain from the filters the plugins staged along the way.

use std::collections::BTreeMap;

use itertools::Itertools;
use prost_types::Struct;
use serde::Serialize;

use crate::plugin::{
	Dependencies, FilterParams, FunctionParams, Outcome, StagedFilter, UpstreamParams,
};
use crate::protoutil;
use crate::registry::Registry;
use crate::serdes::is_default;
use crate::types::envoy::{Cluster, HttpFilter};
use crate::types::upstream::{Snapshot, Upstream};
use crate::*;

/// Terminal filter of every chain.
pub const ROUTER_FILTER: &str = "envoy.router";

#[derive(Debug)]
pub struct RejectedConfig {
	pub name: Strng,
	pub plugin: &'static str,
	pub reason: anyhow::Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionConfig {
	pub upstream: Strng,
	pub function: Strng,
	pub plugin: &'static str,
	pub config: Struct,
}

#[derive(Debug, Default)]
pub struct Translation {
	pub clusters: Vec<Cluster>,
	pub http_filters: Vec<HttpFilter>,
	pub functions: Vec<FunctionConfig>,
	pub dependencies: Dependencies,
	/// Upstreams or functions that could not be translated. Rejected upstreams have no cluster.
	pub rejected: Vec<RejectedConfig>,
	/// Upstreams that were translated with part of their output dropped.
	pub warnings: Vec<RejectedConfig>,
}

pub struct Translator {
	registry: Registry,
	cluster_name_prefix: Strng,
}

impl Translator {
	pub fn new(registry: Registry) -> Self {
		Translator {
			registry,
			cluster_name_prefix: strng::EMPTY,
		}
	}

	pub fn with_cluster_name_prefix(mut self, prefix: Strng) -> Self {
		self.cluster_name_prefix = prefix;
		self
	}

	/// Name of the proxy cluster generated for an upstream.
	pub fn cluster_name(&self, upstream: &str) -> String {
		format!("{}{}", self.cluster_name_prefix, upstream)
	}

	/// Runs the pass. The translator, and the plugins it owns, are consumed so staged filters
	/// can never leak into another pass.
	pub fn translate(mut self, snapshot: &Snapshot) -> Translation {
		let mut out = Translation::default();

		for plugin in self.registry.plugins() {
			if let Some(deps) = plugin.dependencies(snapshot) {
				out.dependencies.merge(deps);
			}
		}

		let params = UpstreamParams { snapshot };
		for upstream in &snapshot.upstreams {
			if let Some(cluster) = self.process_upstream(&params, upstream, &mut out) {
				out.clusters.push(cluster);
			}
			self.parse_functions(upstream, &mut out);
		}

		out.http_filters = self.assemble_filters(snapshot);

		info!(
			clusters = out.clusters.len(),
			http_filters = out.http_filters.len(),
			rejected = out.rejected.len(),
			warnings = out.warnings.len(),
			"translation complete"
		);
		out
	}

	fn process_upstream(
		&mut self,
		params: &UpstreamParams<'_>,
		upstream: &Upstream,
		out: &mut Translation,
	) -> Option<Cluster> {
		let mut cluster = Cluster::named(self.cluster_name(&upstream.name));
		for plugin in self.registry.plugins_mut() {
			match plugin.process_upstream(params, upstream, &mut cluster) {
				Ok(Outcome::Skipped | Outcome::Applied) => {},
				Ok(Outcome::Degraded(reason)) => {
					warn!(upstream = %upstream.name, plugin = plugin.name(), "{reason:#}");
					out.warnings.push(RejectedConfig {
						name: upstream.name.clone(),
						plugin: plugin.name(),
						reason,
					});
				},
				Err(reason) => {
					warn!(upstream = %upstream.name, plugin = plugin.name(), "rejected upstream: {reason:#}");
					out.rejected.push(RejectedConfig {
						name: upstream.name.clone(),
						plugin: plugin.name(),
						reason,
					});
					return None;
				},
			}
		}
		Some(cluster)
	}

	fn parse_functions(&self, upstream: &Upstream, out: &mut Translation) {
		let params = FunctionParams {
			service_type: upstream
				.service_info
				.as_ref()
				.map(|s| s.service_type.clone())
				.unwrap_or_default(),
		};
		for function in &upstream.functions {
			for plugin in self.registry.plugins() {
				match plugin.parse_function_spec(&params, function.spec.as_ref()) {
					Ok(None) => {},
					Ok(Some(config)) => out.functions.push(FunctionConfig {
						upstream: upstream.name.clone(),
						function: function.name.clone(),
						plugin: plugin.name(),
						config,
					}),
					Err(reason) => {
						debug!(upstream = %upstream.name, function = %function.name, "rejected function: {reason:#}");
						out.rejected.push(RejectedConfig {
							name: strng::format!("{}/{}", upstream.name, function.name),
							plugin: plugin.name(),
							reason,
						});
					},
				}
			}
		}
	}

	// Drains every plugin exactly once; the sort is stable so registration order breaks ties.
	fn assemble_filters(&mut self, snapshot: &Snapshot) -> Vec<HttpFilter> {
		let params = FilterParams { snapshot };
		let staged: Vec<StagedFilter> = self
			.registry
			.plugins_mut()
			.iter_mut()
			.flat_map(|p| p.http_filters(&params))
			.collect();
		staged
			.into_iter()
			.sorted_by_key(|f| f.stage)
			.map(|f| f.filter)
			.chain(std::iter::once(HttpFilter {
				name: ROUTER_FILTER.to_string(),
				config: None,
			}))
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOutput {
	pub name: String,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub filter_metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutput {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
	pub name: Strng,
	pub plugin: &'static str,
	pub reason: String,
}

/// A serializable rendering of a [`Translation`], with documents shown as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOutput {
	pub clusters: Vec<ClusterOutput>,
	pub http_filters: Vec<FilterOutput>,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub functions: BTreeMap<String, serde_json::Value>,
	#[serde(skip_serializing_if = "is_default")]
	pub dependencies: Dependencies,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub rejected: Vec<ReportOutput>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub warnings: Vec<ReportOutput>,
}

impl Translation {
	pub fn is_clean(&self) -> bool {
		self.rejected.is_empty() && self.warnings.is_empty()
	}

	pub fn render(&self) -> Result<TranslationOutput, protoutil::Error> {
		let clusters = self
			.clusters
			.iter()
			.map(|c| {
				let filter_metadata = c
					.metadata
					.iter()
					.flat_map(|md| md.filter_metadata.iter())
					.map(|(k, v)| Ok((k.clone(), protoutil::struct_to_json(v)?)))
					.collect::<Result<BTreeMap<_, _>, protoutil::Error>>()?;
				Ok(ClusterOutput {
					name: c.name.clone(),
					filter_metadata,
				})
			})
			.collect::<Result<Vec<_>, protoutil::Error>>()?;
		let http_filters = self
			.http_filters
			.iter()
			.map(|f| {
				Ok(FilterOutput {
					name: f.name.clone(),
					config: f.config.as_ref().map(protoutil::struct_to_json).transpose()?,
				})
			})
			.collect::<Result<Vec<_>, protoutil::Error>>()?;
		let functions = self
			.functions
			.iter()
			.map(|f| {
				Ok((
					format!("{}/{}", f.upstream, f.function),
					protoutil::struct_to_json(&f.config)?,
				))
			})
			.collect::<Result<BTreeMap<_, _>, protoutil::Error>>()?;
		let report = |r: &RejectedConfig| ReportOutput {
			name: r.name.clone(),
			plugin: r.plugin,
			reason: format!("{:#}", r.reason),
		};
		Ok(TranslationOutput {
			clusters,
			http_filters,
			functions,
			dependencies: self.dependencies.clone(),
			rejected: self.rejected.iter().map(report).collect(),
			warnings: self.warnings.iter().map(report).collect(),
		})
	}
}

#[cfg(test)]
#[path = "translator_test.rs"]
mod tests;
