// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The JSON comments channel carried by columns and views.
///
/// Comments are always a JSON object; an empty or missing text reads as
/// `{}`. Keys that collide on merge are overwritten, matching last-write-
/// wins semantics.
#[derive(Clone, Debug, PartialEq)]
pub struct Comments(Map<String, Value>);

impl Comments {
	pub fn empty() -> Self {
		Comments(Map::new())
	}

	/// Parses comment text. Empty input is the empty object; anything
	/// that is valid JSON but not an object is rejected.
	pub fn parse(text: &str) -> Result<Self> {
		let trimmed = text.trim_matches('\0').trim();
		if trimmed.is_empty() {
			return Ok(Comments::empty());
		}
		match serde_json::from_str::<Value>(trimmed) {
			Ok(Value::Object(map)) => Ok(Comments(map)),
			Ok(_) => Err(Error::corrupt(format!("comments are not a JSON object: {trimmed}"))),
			Err(err) => Err(Error::corrupt(format!("comments are not valid JSON: {err}"))),
		}
	}

	pub fn add_key_value(&mut self, key: &str, value: impl Into<Value>) {
		self.0.insert(key.to_string(), value.into());
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn to_json(&self) -> String {
		Value::Object(self.0.clone()).to_string()
	}
}

impl Default for Comments {
	fn default() -> Self {
		Self::empty()
	}
}
