// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Byte layout of the column file header.
//!
//! The header occupies the page-rounded front of every `.odc` file. All
//! integers are little-endian. The element-names table sits behind the
//! fixed part: first `nb_elements_per_line` arena offsets in declaration
//! order, then the same offsets sorted by name (binary-search support),
//! then the `\0`-separated names arena itself.

use seqdms_core::{Result, bytes, round_up_to_page};
use seqdms_type::Type;

pub const HEADER_SIZE: usize = 0;
pub const DATA_SIZE: usize = 8;
pub const LINE_COUNT: usize = 16;
pub const LINES_USED: usize = 24;
pub const NB_ELEMENTS: usize = 32;
pub const STORED_TYPE: usize = 40;
pub const RETURNED_TYPE: usize = 41;
pub const DICT_COLUMN: usize = 42;
pub const TUPLES: usize = 43;
pub const TO_EVAL: usize = 44;
pub const FINISHED: usize = 45;
pub const CREATION_DATE: usize = 48;
pub const VERSION: usize = 56;
pub const CLONED_FROM: usize = 60;
pub const NAME: usize = 64;
pub const INDEXER_NAME: usize = 192;
pub const ASSOCIATED_NAME: usize = 320;
pub const ASSOCIATED_VERSION: usize = 448;
pub const COMMENTS: usize = 456;
pub const ELT_NAMES_LEN: usize = 4552;
pub const ELT_NAMES: usize = 4560;

/// Width of the name, indexer-name, and associated-name fields,
/// terminator included.
pub const NAME_WIDTH: usize = 128;
/// Width of the comments field, terminator included.
pub const COMMENTS_WIDTH: usize = 4096;

/// Header bytes needed for a column of `nb_elements` elements whose
/// formatted names arena occupies `arena_len` bytes, before page rounding.
pub fn header_bytes(nb_elements: usize, arena_len: usize) -> usize {
	ELT_NAMES + 2 * 8 * nb_elements + arena_len
}

/// Page-rounded header size.
pub fn header_size(nb_elements: usize, arena_len: usize) -> usize {
	round_up_to_page(header_bytes(nb_elements, arena_len))
}

/// Page-rounded data-region size for `line_count` lines.
pub fn data_size(ty: Type, line_count: usize, nb_elements: usize) -> usize {
	round_up_to_page(line_count * nb_elements * ty.stored_width())
}

pub fn get_header_size(header: &[u8]) -> usize {
	bytes::get_u64(header, HEADER_SIZE) as usize
}

pub fn get_data_size(header: &[u8]) -> usize {
	bytes::get_u64(header, DATA_SIZE) as usize
}

pub fn set_data_size(header: &mut [u8], size: usize) {
	bytes::put_u64(header, DATA_SIZE, size as u64);
}

pub fn get_line_count(header: &[u8]) -> usize {
	bytes::get_i64(header, LINE_COUNT).max(0) as usize
}

pub fn set_line_count(header: &mut [u8], count: usize) {
	bytes::put_i64(header, LINE_COUNT, count as i64);
}

pub fn get_lines_used(header: &[u8]) -> usize {
	bytes::get_i64(header, LINES_USED).max(0) as usize
}

pub fn set_lines_used(header: &mut [u8], used: usize) {
	bytes::put_i64(header, LINES_USED, used as i64);
}

pub fn get_nb_elements(header: &[u8]) -> usize {
	bytes::get_i64(header, NB_ELEMENTS).max(0) as usize
}

pub fn get_stored_type(header: &[u8]) -> Result<Type> {
	Type::from_code(bytes::get_u8(header, STORED_TYPE))
		.map_err(|err| seqdms_core::Error::corrupt(format!("column header: {err}")))
}

pub fn get_returned_type(header: &[u8]) -> Result<Type> {
	Type::from_code(bytes::get_u8(header, RETURNED_TYPE))
		.map_err(|err| seqdms_core::Error::corrupt(format!("column header: {err}")))
}

pub fn get_flag(header: &[u8], offset: usize) -> bool {
	bytes::get_u8(header, offset) != 0
}

pub fn set_flag(header: &mut [u8], offset: usize, value: bool) {
	bytes::put_u8(header, offset, value as u8);
}

pub fn get_version(header: &[u8]) -> i32 {
	bytes::get_i32(header, VERSION)
}

pub fn get_cloned_from(header: &[u8]) -> Option<i32> {
	match bytes::get_i32(header, CLONED_FROM) {
		-1 => None,
		version => Some(version),
	}
}

pub fn set_cloned_from(header: &mut [u8], version: i32) {
	bytes::put_i32(header, CLONED_FROM, version);
}

pub fn get_name(header: &[u8]) -> String {
	bytes::get_str(header, NAME, NAME_WIDTH)
}

pub fn get_indexer_name(header: &[u8]) -> Option<String> {
	let name = bytes::get_str(header, INDEXER_NAME, NAME_WIDTH);
	if name.is_empty() { None } else { Some(name) }
}

pub fn set_indexer_name(header: &mut [u8], name: &str) {
	bytes::put_str(header, INDEXER_NAME, NAME_WIDTH, name);
}

pub fn get_associated_column(header: &[u8]) -> Option<(String, i32)> {
	let name = bytes::get_str(header, ASSOCIATED_NAME, NAME_WIDTH);
	if name.is_empty() { None } else { Some((name, bytes::get_i32(header, ASSOCIATED_VERSION))) }
}

pub fn set_associated_column(header: &mut [u8], name: &str, version: i32) {
	bytes::put_str(header, ASSOCIATED_NAME, NAME_WIDTH, name);
	bytes::put_i32(header, ASSOCIATED_VERSION, version);
}

pub fn get_comments(header: &[u8]) -> String {
	bytes::get_str(header, COMMENTS, COMMENTS_WIDTH)
}

pub fn set_comments(header: &mut [u8], comments: &str) {
	bytes::put_str(header, COMMENTS, COMMENTS_WIDTH, comments);
}

pub fn get_creation_date(header: &[u8]) -> i64 {
	bytes::get_i64(header, CREATION_DATE)
}
