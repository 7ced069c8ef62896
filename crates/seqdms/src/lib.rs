// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! seqdms — a single-writer, multi-reader, memory-mapped columnar store
//! with versioned columns and composable logical views.
//!
//! ```no_run
//! use seqdms::{Dms, View};
//!
//! # fn main() -> seqdms::Result<()> {
//! let dms = Dms::create("/tmp/demo")?;
//! let mut reads = View::create_nuc_seqs(&dms, "raw", true, "")?;
//! reads.set_seq("NUC_SEQ", 0, 0, "ACGT")?;
//! reads.set_qual("QUALITY", 0, 0, &[38, 38, 40, 40])?;
//! reads.finish()?;
//!
//! let reads = View::open(&dms, "raw")?;
//! assert_eq!(reads.get_seq("NUC_SEQ", 0, 0)?.as_deref(), Some("ACGT"));
//! # Ok(())
//! # }
//! ```

pub use seqdms_core::{Comments, Dms, Error, Result};
pub use seqdms_hash::HashTable;
pub use seqdms_indexer::Indexer;
pub use seqdms_store_column::{
	Column, ColumnSpec, ElementNames, ElementRef, clean_unfinished_columns, has_unfinished_columns,
};
pub use seqdms_type::{Type, Value};
pub use seqdms_view::{
	COUNT_COLUMN, DEFINITION_COLUMN, ID_COLUMN, NUC_SEQUENCE_COLUMN, Predicate, PredicateCheck,
	QUALITY_COLUMN, VIEW_TYPE_NUC_SEQS, View, clean_unfinished_views, has_unfinished_views,
};

/// Removes every artifact left behind by writers that died mid-flight:
/// unfinished views first, then unfinished columns.
pub fn clean_unfinished(dms: &Dms) -> Result<()> {
	clean_unfinished_views(dms)?;
	clean_unfinished_columns(dms)
}
