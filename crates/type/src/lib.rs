// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Element data types of the seqdms column store.
//!
//! Every column slot holds a fixed-width stored value. Variable-length
//! types (strings, nucleotide sequences, quality arrays, blobs) store an
//! index into a named blob indexer instead of the value itself, which is
//! why a column carries both a stored and a returned [`Type`].

mod r#type;
mod value;

pub use r#type::{Type, TypeError};
pub use value::Value;

/// Sentinel stored for an undefined boolean slot.
pub const BOOL_NA: u8 = 2;
/// Sentinel stored for an undefined character slot.
pub const CHAR_NA: u8 = 0;
/// Sentinel stored for an undefined integer slot.
pub const INT_NA: i32 = i32::MIN;
/// Sentinel stored for an undefined index slot, and the "no blob" handle.
pub const INDEX_NA: i64 = -1;

/// Sentinel stored for an undefined float slot.
///
/// NaN is not representable as column data; every NaN bit pattern reads
/// back as undefined.
pub const FLOAT_NA: f64 = f64::NAN;
