use prost_types::value::Kind;
use prost_types::{Struct, Value};

use crate::types::envoy::Metadata;

/// Returns the `key` field of the `filter` namespace, creating the namespace and the field
/// when they are absent. Other namespaces and other fields are left untouched.
pub fn init_filter_metadata_field<'a>(
	filter: &str,
	key: &str,
	metadata: &'a mut Metadata,
) -> &'a mut Value {
	metadata
		.filter_metadata
		.entry(filter.to_string())
		.or_insert_with(Struct::default)
		.fields
		.entry(key.to_string())
		.or_insert_with(Value::default)
}

pub fn set_filter_metadata_string(
	filter: &str,
	key: &str,
	value: impl Into<String>,
	metadata: &mut Metadata,
) {
	init_filter_metadata_field(filter, key, metadata).kind = Some(Kind::StringValue(value.into()));
}

pub fn filter_metadata_string<'a>(
	metadata: Option<&'a Metadata>,
	filter: &str,
	key: &str,
) -> Option<&'a str> {
	let field = metadata?.filter_metadata.get(filter)?.fields.get(key)?;
	match &field.kind {
		Some(Kind::StringValue(s)) => Some(s.as_str()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::protoutil::string_struct;

	#[test]
	fn creates_namespace_and_field() {
		let mut md = Metadata::default();
		let field = init_filter_metadata_field("io.example.filter", "key", &mut md);
		assert_eq!(field.kind, None);
		assert!(md.filter_metadata["io.example.filter"].fields.contains_key("key"));
	}

	#[test]
	fn keeps_unrelated_entries() {
		let mut md = Metadata::default();
		md.filter_metadata
			.insert("other.filter".to_string(), string_struct([("a", "1")]));
		md.filter_metadata
			.insert("io.example.filter".to_string(), string_struct([("keep", "me")]));

		set_filter_metadata_string("io.example.filter", "key", "value", &mut md);

		assert_eq!(
			filter_metadata_string(Some(&md), "io.example.filter", "key"),
			Some("value")
		);
		assert_eq!(
			filter_metadata_string(Some(&md), "io.example.filter", "keep"),
			Some("me")
		);
		assert_eq!(
			filter_metadata_string(Some(&md), "other.filter", "a"),
			Some("1")
		);
	}

	#[test]
	fn overwrites_existing_field_in_place() {
		let mut md = Metadata::default();
		set_filter_metadata_string("f", "k", "old", &mut md);
		set_filter_metadata_string("f", "k", "new", &mut md);
		assert_eq!(filter_metadata_string(Some(&md), "f", "k"), Some("new"));
		assert_eq!(md.filter_metadata["f"].fields.len(), 1);
	}

	#[test]
	fn missing_lookups_are_none() {
		assert_eq!(filter_metadata_string(None, "f", "k"), None);
		assert_eq!(
			filter_metadata_string(Some(&Metadata::default()), "f", "k"),
			None
		);
	}
}
