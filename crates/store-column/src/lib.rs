// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The column artifact: a single named, versioned, memory-mapped array of
//! fixed-width lines.
//!
//! A column file holds a page-rounded header (including the element-names
//! table) followed by a page-rounded data region of
//! `line_count * nb_elements_per_line` fixed-width slots. Variable-length
//! element types store blob handles that resolve through the column's
//! named indexer.
//!
//! Columns grow geometrically, are truncated to their used size on close,
//! and become permanently immutable once their owning view flags them
//! `finished`. A companion version file per column name tracks the latest
//! version; opening version `-1` resolves through it.

mod accessors;
mod column;
mod elements;
mod layout;
mod recovery;
mod version;

pub use accessors::ElementRef;
pub use column::{Column, ColumnSpec, MAXIMUM_LINE_COUNT, column_file_path};
pub use elements::ElementNames;
pub use recovery::{clean_unfinished_columns, has_unfinished_columns};
pub use version::{latest_version, next_version};

/// Extension of a column file.
pub const COLUMN_EXTENSION: &str = "odc";
/// Extension of a column-name version file.
pub const VERSION_EXTENSION: &str = "odv";
