// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::r#type::Type;

/// A column element value, represented as a native Rust type.
///
/// `Undefined` is the in-memory face of every on-disk NA sentinel. It is a
/// legitimate value, not an error: getters return `Ok(Value::Undefined)`
/// for slots that were never written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// Value is not defined (think null in common programming languages).
	Undefined,
	/// A boolean: true or false.
	Bool(bool),
	/// A single ASCII character.
	Char(char),
	/// An 8-byte floating point.
	Float(f64),
	/// A 4-byte signed integer.
	Int(i32),
	/// An 8-byte signed index.
	Index(i64),
	/// A UTF-8 string.
	Str(String),
	/// A nucleotide sequence.
	Seq(String),
	/// A per-base quality score array.
	Qual(Vec<u8>),
	/// An opaque byte blob.
	Blob(Vec<u8>),
}

impl Value {
	pub fn undefined() -> Self {
		Value::Undefined
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	/// The element type this value belongs to, `None` for `Undefined`.
	pub fn ty(&self) -> Option<Type> {
		match self {
			Value::Undefined => None,
			Value::Bool(_) => Some(Type::Bool),
			Value::Char(_) => Some(Type::Char),
			Value::Float(_) => Some(Type::Float),
			Value::Int(_) => Some(Type::Int),
			Value::Index(_) => Some(Type::Index),
			Value::Str(_) => Some(Type::Str),
			Value::Seq(_) => Some(Type::Seq),
			Value::Qual(_) => Some(Type::Qual),
			Value::Blob(_) => Some(Type::Blob),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Undefined => f.write_str("NA"),
			Value::Bool(v) => write!(f, "{}", v),
			Value::Char(v) => write!(f, "{}", v),
			Value::Float(v) => write!(f, "{}", v),
			Value::Int(v) => write!(f, "{}", v),
			Value::Index(v) => write!(f, "{}", v),
			Value::Str(v) => f.write_str(v),
			Value::Seq(v) => f.write_str(v),
			Value::Qual(v) => {
				let scores: Vec<String> = v.iter().map(|s| s.to_string()).collect();
				f.write_str(&scores.join(" "))
			}
			Value::Blob(v) => write!(f, "<blob {} bytes>", v.len()),
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Float(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Str(v.to_string())
	}
}
