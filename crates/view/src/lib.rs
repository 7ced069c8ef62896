// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Views: named, versioned logical tables over column references.
//!
//! A view groups aliased columns, optionally reorders or filters their
//! rows through a line-selection indirection column, and owns the
//! create → finish/rollback lifecycle. Finishing validates structural
//! predicates and publishes the metadata file by rename; rolling back
//! deletes every artifact the view itself created.

mod layout;
mod predicate;
mod recovery;
mod view;

pub use predicate::{Predicate, PredicateCheck};
pub use recovery::{clean_unfinished_views, has_unfinished_views};
pub use view::View;

/// Suffix of a published view metadata file.
pub const VIEW_EXTENSION: &str = "obiview";
/// Suffix of a view metadata file still being written.
pub const UNFINISHED_VIEW_EXTENSION: &str = "obiview_unfinished";

/// Tag of views holding nucleotide sequence records.
pub const VIEW_TYPE_NUC_SEQS: &str = "NUC_SEQS_VIEW";

/// Obligatory column names of a nucleotide sequences view.
pub const NUC_SEQUENCE_COLUMN: &str = "NUC_SEQ";
pub const ID_COLUMN: &str = "ID";
pub const DEFINITION_COLUMN: &str = "DEFINITION";
pub const QUALITY_COLUMN: &str = "QUALITY";
pub const COUNT_COLUMN: &str = "COUNT";
/// Name of the column holding merged per-sample counts, which stands in
/// for an explicit count column.
pub const MERGED_SAMPLE_COLUMN: &str = "MERGED_sample";

/// Name under which line-selection columns are stored.
pub const LINES_COLUMN_NAME: &str = "LINES";
/// Prefix of automatically generated row identifiers.
pub const ID_PREFIX: &str = "seq";
