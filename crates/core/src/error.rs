// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Represents all possible errors of the column/view store.
///
/// Low-level failures (I/O, size computation) propagate immediately with
/// no retry; the single designed exception is the retry-after-clone for an
/// insertion into a read-only indexer, driven by [`Error::ReadOnlyIndexer`].
/// Getters never use errors to report undefined slots: NA reads are
/// `Ok(None)` / `Ok(Value::Undefined)`.
#[derive(Debug, Error)]
pub enum Error {
	#[error("mutation attempted on read-only {what}")]
	ReadOnly { what: String },

	#[error("insertion attempted on a read-only indexer")]
	ReadOnlyIndexer,

	#[error("unknown element name: '{name}'")]
	UnknownElement { name: String },

	#[error("unknown column alias: '{alias}'")]
	UnknownAlias { alias: String },

	#[error("inconsistency: {0}")]
	Inconsistency(String),

	#[error("size computation overflow")]
	Allocation,

	#[error("i/o failure: {0}")]
	Io(#[from] std::io::Error),

	#[error("{what} not found: '{name}'")]
	NotFound { what: &'static str, name: String },

	#[error("{what} already exists: '{name}'")]
	AlreadyExists { what: &'static str, name: String },

	#[error("view predicate failed: {description}")]
	PredicateFailed { description: String },

	#[error("corrupt {what}")]
	Corrupt { what: String },
}

impl Error {
	pub fn read_only(what: impl Into<String>) -> Self {
		Error::ReadOnly { what: what.into() }
	}

	pub fn inconsistency(msg: impl Into<String>) -> Self {
		Error::Inconsistency(msg.into())
	}

	pub fn corrupt(what: impl Into<String>) -> Self {
		Error::Corrupt { what: what.into() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		assert_eq!(Error::read_only("column 'seq'").to_string(), "mutation attempted on read-only column 'seq'");
		assert_eq!(
			Error::NotFound { what: "view", name: "cleaned".to_string() }.to_string(),
			"view not found: 'cleaned'"
		);
		assert_eq!(Error::UnknownAlias { alias: "qual".to_string() }.to_string(), "unknown column alias: 'qual'");
	}

	#[test]
	fn test_io_conversion() {
		let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
		assert!(matches!(err, Error::Io(_)));
	}
}
