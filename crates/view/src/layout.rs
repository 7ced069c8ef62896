// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Byte layout of the view metadata file.
//!
//! A fixed struct (little-endian throughout) with a fixed-capacity
//! column-reference array, followed by a JSON comments arena that grows
//! by truncate-and-remap. `used_size` tracks the fixed part plus the
//! comments actually written; `file_size` the current allocation.

use seqdms_core::{Error, Result, bytes};

pub const FILE_SIZE: usize = 0;
pub const USED_SIZE: usize = 8;
pub const NAME: usize = 16;
pub const CREATION_DATE: usize = 272;
pub const FINISHED: usize = 280;
pub const ALL_LINES: usize = 281;
pub const LINE_COUNT: usize = 288;
pub const COLUMN_COUNT: usize = 296;
pub const CREATED_FROM: usize = 304;
pub const VIEW_TYPE: usize = 560;
pub const LINE_SELECTION_NAME: usize = 624;
pub const LINE_SELECTION_VERSION: usize = 752;
pub const COLUMN_REFS: usize = 760;

pub const VIEW_NAME_WIDTH: usize = 256;
pub const VIEW_TYPE_WIDTH: usize = 64;
pub const COLUMN_NAME_WIDTH: usize = 128;
pub const ALIAS_WIDTH: usize = 128;

/// Bytes per column reference: name, version, alias.
pub const COLUMN_REF_STRIDE: usize = COLUMN_NAME_WIDTH + 4 + ALIAS_WIDTH;
/// Fixed capacity of the reference array.
pub const MAX_COLUMN_REFS: usize = 512;

/// Offset of the comments arena (end of the fixed struct).
pub const COMMENTS: usize = COLUMN_REFS + MAX_COLUMN_REFS * COLUMN_REF_STRIDE;

/// One persisted column reference.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnRef {
	pub column_name: String,
	pub version: i32,
	pub alias: String,
}

pub fn get_file_size(view: &[u8]) -> usize {
	bytes::get_u64(view, FILE_SIZE) as usize
}

pub fn set_file_size(view: &mut [u8], size: usize) {
	bytes::put_u64(view, FILE_SIZE, size as u64);
}

pub fn get_used_size(view: &[u8]) -> usize {
	bytes::get_u64(view, USED_SIZE) as usize
}

pub fn set_used_size(view: &mut [u8], size: usize) {
	bytes::put_u64(view, USED_SIZE, size as u64);
}

pub fn get_name(view: &[u8]) -> String {
	bytes::get_str(view, NAME, VIEW_NAME_WIDTH)
}

pub fn set_name(view: &mut [u8], name: &str) {
	bytes::put_str(view, NAME, VIEW_NAME_WIDTH, name);
}

pub fn get_creation_date(view: &[u8]) -> i64 {
	bytes::get_i64(view, CREATION_DATE)
}

pub fn set_creation_date(view: &mut [u8], date: i64) {
	bytes::put_i64(view, CREATION_DATE, date);
}

pub fn get_finished(view: &[u8]) -> bool {
	bytes::get_u8(view, FINISHED) != 0
}

pub fn set_finished(view: &mut [u8], finished: bool) {
	bytes::put_u8(view, FINISHED, finished as u8);
}

pub fn get_all_lines(view: &[u8]) -> bool {
	bytes::get_u8(view, ALL_LINES) != 0
}

pub fn set_all_lines(view: &mut [u8], all_lines: bool) {
	bytes::put_u8(view, ALL_LINES, all_lines as u8);
}

pub fn get_line_count(view: &[u8]) -> usize {
	bytes::get_i64(view, LINE_COUNT).max(0) as usize
}

pub fn set_line_count(view: &mut [u8], count: usize) {
	bytes::put_i64(view, LINE_COUNT, count as i64);
}

pub fn get_column_count(view: &[u8]) -> usize {
	bytes::get_i32(view, COLUMN_COUNT).max(0) as usize
}

pub fn set_column_count(view: &mut [u8], count: usize) {
	bytes::put_i32(view, COLUMN_COUNT, count as i32);
}

pub fn get_created_from(view: &[u8]) -> String {
	bytes::get_str(view, CREATED_FROM, VIEW_NAME_WIDTH)
}

pub fn set_created_from(view: &mut [u8], name: &str) {
	bytes::put_str(view, CREATED_FROM, VIEW_NAME_WIDTH, name);
}

pub fn get_view_type(view: &[u8]) -> String {
	bytes::get_str(view, VIEW_TYPE, VIEW_TYPE_WIDTH)
}

pub fn set_view_type(view: &mut [u8], view_type: &str) {
	bytes::put_str(view, VIEW_TYPE, VIEW_TYPE_WIDTH, view_type);
}

pub fn get_line_selection(view: &[u8]) -> Option<(String, i32)> {
	let name = bytes::get_str(view, LINE_SELECTION_NAME, COLUMN_NAME_WIDTH);
	if name.is_empty() { None } else { Some((name, bytes::get_i32(view, LINE_SELECTION_VERSION))) }
}

pub fn set_line_selection(view: &mut [u8], selection: Option<(&str, i32)>) {
	match selection {
		Some((name, version)) => {
			bytes::put_str(view, LINE_SELECTION_NAME, COLUMN_NAME_WIDTH, name);
			bytes::put_i32(view, LINE_SELECTION_VERSION, version);
		}
		None => {
			bytes::put_str(view, LINE_SELECTION_NAME, COLUMN_NAME_WIDTH, "");
			bytes::put_i32(view, LINE_SELECTION_VERSION, -1);
		}
	}
}

pub fn get_column_ref(view: &[u8], index: usize) -> ColumnRef {
	let base = COLUMN_REFS + index * COLUMN_REF_STRIDE;
	ColumnRef {
		column_name: bytes::get_str(view, base, COLUMN_NAME_WIDTH),
		version: bytes::get_i32(view, base + COLUMN_NAME_WIDTH),
		alias: bytes::get_str(view, base + COLUMN_NAME_WIDTH + 4, ALIAS_WIDTH),
	}
}

pub fn set_column_ref(view: &mut [u8], index: usize, column_ref: &ColumnRef) -> Result<()> {
	if index >= MAX_COLUMN_REFS {
		return Err(Error::inconsistency(format!(
			"a view holds at most {MAX_COLUMN_REFS} column references"
		)));
	}
	let base = COLUMN_REFS + index * COLUMN_REF_STRIDE;
	bytes::put_str(view, base, COLUMN_NAME_WIDTH, &column_ref.column_name);
	bytes::put_i32(view, base + COLUMN_NAME_WIDTH, column_ref.version);
	bytes::put_str(view, base + COLUMN_NAME_WIDTH + 4, ALIAS_WIDTH, &column_ref.alias);
	Ok(())
}

pub fn get_comments(view: &[u8]) -> String {
	let used = get_used_size(view).clamp(COMMENTS, view.len());
	String::from_utf8_lossy(&view[COMMENTS..used]).trim_matches('\0').to_string()
}
