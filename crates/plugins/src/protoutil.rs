//! Conversion between typed serde values and `google.protobuf.Struct`, the generic
//! configuration document carried by upstreams and HTTP filters.
//!
//! Conversion goes through `serde_json::Value`, so the JSON field names of a type are
//! the keys of its document.

use std::collections::BTreeMap;

use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// Largest magnitude where every integer is exactly representable as an f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Error, Debug)]
pub enum Error {
	#[error("expected a document object, got {0}")]
	NotAnObject(&'static str),
	#[error("number {0} cannot be represented in a document")]
	InvalidNumber(f64),
	#[error("unknown value kind")]
	MissingKind,
	#[error("failed to serialize: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("failed to decode field `{}`: {}", .0.path(), .0.inner())]
	Decode(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Serializes `value` into a document. The value must serialize to a JSON object.
pub fn marshal_struct<T: Serialize + ?Sized>(value: &T) -> Result<Struct, Error> {
	json_to_struct(serde_json::to_value(value)?)
}

/// Decodes a document into `T`. A missing document decodes like an empty one.
pub fn unmarshal_struct<T: DeserializeOwned>(document: Option<&Struct>) -> Result<T, Error> {
	let json = document
		.map(struct_to_json)
		.transpose()?
		.unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
	Ok(serde_path_to_error::deserialize(json)?)
}

pub fn json_to_struct(json: serde_json::Value) -> Result<Struct, Error> {
	match json {
		serde_json::Value::Object(map) => {
			let fields = map
				.into_iter()
				.map(|(k, v)| Ok((k, json_to_value(v)?)))
				.collect::<Result<BTreeMap<_, _>, Error>>()?;
			Ok(Struct { fields })
		},
		other => Err(Error::NotAnObject(json_kind(&other))),
	}
}

pub fn struct_to_json(document: &Struct) -> Result<serde_json::Value, Error> {
	let map = document
		.fields
		.iter()
		.map(|(k, v)| Ok((k.clone(), value_to_json(v)?)))
		.collect::<Result<serde_json::Map<_, _>, Error>>()?;
	Ok(serde_json::Value::Object(map))
}

pub fn json_to_value(json: serde_json::Value) -> Result<Value, Error> {
	let kind = match json {
		serde_json::Value::Null => Kind::NullValue(0),
		serde_json::Value::Bool(b) => Kind::BoolValue(b),
		serde_json::Value::Number(n) => {
			// as_f64 only fails with arbitrary precision numbers, which we do not enable
			Kind::NumberValue(n.as_f64().unwrap_or(f64::NAN))
		},
		serde_json::Value::String(s) => Kind::StringValue(s),
		serde_json::Value::Array(list) => Kind::ListValue(ListValue {
			values: list
				.into_iter()
				.map(json_to_value)
				.collect::<Result<Vec<_>, _>>()?,
		}),
		obj @ serde_json::Value::Object(_) => Kind::StructValue(json_to_struct(obj)?),
	};
	Ok(Value { kind: Some(kind) })
}

pub fn value_to_json(value: &Value) -> Result<serde_json::Value, Error> {
	let Some(kind) = &value.kind else {
		return Err(Error::MissingKind);
	};
	Ok(match kind {
		Kind::NullValue(_) => serde_json::Value::Null,
		Kind::BoolValue(b) => serde_json::Value::Bool(*b),
		Kind::NumberValue(n) => number_to_json(*n)?,
		Kind::StringValue(s) => serde_json::Value::String(s.clone()),
		Kind::ListValue(list) => serde_json::Value::Array(
			list
				.values
				.iter()
				.map(value_to_json)
				.collect::<Result<Vec<_>, _>>()?,
		),
		Kind::StructValue(s) => struct_to_json(s)?,
	})
}

// Documents only carry doubles. Integral values are handed to serde as integers so they
// can decode into integer fields.
fn number_to_json(n: f64) -> Result<serde_json::Value, Error> {
	if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
		return Ok(serde_json::Value::from(n as i64));
	}
	serde_json::Number::from_f64(n)
		.map(serde_json::Value::Number)
		.ok_or(Error::InvalidNumber(n))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
	match v {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "bool",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

/// Builds a document of string fields.
pub fn string_struct<T: IntoIterator<Item = (S, S)>, S: ToString>(a: T) -> Struct {
	let fields = BTreeMap::from_iter(a.into_iter().map(|(k, v)| {
		(
			k.to_string(),
			Value {
				kind: Some(Kind::StringValue(v.to_string())),
			},
		)
	}));
	Struct { fields }
}

/// Serde adapter for optional documents embedded in YAML/JSON configuration.
pub mod serde_struct_option {
	use super::*;

	pub fn serialize<S: Serializer>(t: &Option<Struct>, serializer: S) -> Result<S::Ok, S::Error> {
		match t {
			None => serializer.serialize_none(),
			Some(s) => struct_to_json(s)
				.map_err(serde::ser::Error::custom)?
				.serialize(serializer),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Struct>, D::Error> {
		let json = Option::<serde_json::Value>::deserialize(deserializer)?;
		match json {
			None | Some(serde_json::Value::Null) => Ok(None),
			Some(json) => json_to_struct(json)
				.map(Some)
				.map_err(serde::de::Error::custom),
		}
	}
}

#[cfg(test)]
#[path = "protoutil_test.rs"]
mod tests;
