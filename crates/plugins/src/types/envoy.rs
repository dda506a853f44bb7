//! The subset of the proxy's v2 configuration API that upstream plugins produce.
//! Field tags follow the upstream Envoy protos so the messages stay wire compatible.

use std::collections::HashMap;

use prost_types::Struct;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Cluster {
	/// Unique name of the cluster; routes and filters reference it by this name.
	#[prost(string, tag = "1")]
	pub name: ::prost::alloc::string::String,
	#[prost(message, optional, tag = "25")]
	pub metadata: ::core::option::Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
	/// Key is the reverse DNS filter name, e.g. com.acme.widget. The envoy.*
	/// namespace is reserved for Envoy's built-in filters.
	#[prost(map = "string, message", tag = "1")]
	pub filter_metadata: HashMap<::prost::alloc::string::String, Struct>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpFilter {
	#[prost(string, tag = "1")]
	pub name: ::prost::alloc::string::String,
	#[prost(message, optional, tag = "2")]
	pub config: ::core::option::Option<Struct>,
}

impl Cluster {
	pub fn named(name: impl Into<String>) -> Cluster {
		Cluster {
			name: name.into(),
			metadata: None,
		}
	}
}
