// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Append-only named blob store.
//!
//! Columns of variable-length element types do not store their values in
//! the column file; they store an opaque `i64` handle returned by an
//! indexer. Several columns may share one indexer by name. An indexer
//! opened from disk is read-only; inserting requires cloning it to a
//! fresh writable copy first, which the owning column does transparently.

mod indexer;

pub use indexer::{Indexer, build_indexer_name};
