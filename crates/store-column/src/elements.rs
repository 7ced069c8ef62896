// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use seqdms_core::{Error, Result, bytes};

use crate::layout;

/// The element-names table of a column.
///
/// Names are addressed case-sensitively by exact match. Lookup goes
/// through a second offset table sorted by name, kept on disk next to the
/// declaration-order table, so `index_of` is a binary search.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementNames {
	names: Vec<String>,
	// Declaration indices ordered by name byte-order.
	sorted: Vec<usize>,
}

impl ElementNames {
	/// Builds the table from explicit names. Names must be non-empty,
	/// free of `\0` and `;`, and unique.
	pub fn new(names: Vec<String>) -> Result<Self> {
		if names.is_empty() {
			return Err(Error::inconsistency("a column needs at least one element name"));
		}
		for name in &names {
			if name.is_empty() || name.contains('\0') || name.contains(';') {
				return Err(Error::inconsistency(format!("invalid element name: '{name}'")));
			}
		}
		let mut sorted: Vec<usize> = (0..names.len()).collect();
		sorted.sort_by(|a, b| names[*a].cmp(&names[*b]));
		if sorted.windows(2).any(|w| names[w[0]] == names[w[1]]) {
			return Err(Error::inconsistency("duplicate element name"));
		}
		Ok(Self { names, sorted })
	}

	/// The default table: decimal names `"0".."n-1"`, except that a
	/// single-element column takes the column's own name.
	pub fn default_for(column_name: &str, nb_elements: usize) -> Result<Self> {
		if nb_elements == 1 {
			Self::new(vec![column_name.to_string()])
		} else {
			Self::new((0..nb_elements).map(|i| i.to_string()).collect())
		}
	}

	/// Parses a `;`-separated name list, as accepted at column creation.
	pub fn parse_list(list: &str) -> Result<Self> {
		Self::new(list.split(';').map(str::to_string).collect())
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.sorted
			.binary_search_by(|idx| self.names[*idx].as_str().cmp(name))
			.ok()
			.map(|pos| self.sorted[pos])
	}

	/// Bytes of the `\0`-separated, `\0`-terminated names arena.
	pub fn arena_len(&self) -> usize {
		self.names.iter().map(|n| n.len() + 1).sum()
	}

	/// Serializes the two offset tables and the arena into the header.
	pub fn write_to(&self, header: &mut [u8]) {
		let nb = self.names.len();
		let mut arena_offsets = Vec::with_capacity(nb);
		let mut arena = Vec::with_capacity(self.arena_len());
		for name in &self.names {
			arena_offsets.push(arena.len() as i64);
			arena.extend_from_slice(name.as_bytes());
			arena.push(0);
		}

		bytes::put_i64(header, layout::ELT_NAMES_LEN, arena.len() as i64);
		let mut cursor = layout::ELT_NAMES;
		for offset in &arena_offsets {
			bytes::put_i64(header, cursor, *offset);
			cursor += 8;
		}
		for idx in &self.sorted {
			bytes::put_i64(header, cursor, arena_offsets[*idx]);
			cursor += 8;
		}
		header[cursor..cursor + arena.len()].copy_from_slice(&arena);
	}

	/// Reconstructs the table from a mapped header.
	pub fn read_from(header: &[u8], nb_elements: usize) -> Result<Self> {
		let arena_len = bytes::get_i64(header, layout::ELT_NAMES_LEN);
		if arena_len < 0 {
			return Err(Error::corrupt("negative element-names arena length"));
		}
		let arena_len = arena_len as usize;
		let arena_start = layout::ELT_NAMES + 2 * 8 * nb_elements;
		if arena_start + arena_len > header.len() {
			return Err(Error::corrupt("element-names table overruns the column header"));
		}
		let arena = &header[arena_start..arena_start + arena_len];

		let name_at = |offset: i64| -> Result<String> {
			if offset < 0 || offset as usize >= arena_len {
				return Err(Error::corrupt("element-name offset out of range"));
			}
			let tail = &arena[offset as usize..];
			let end = tail
				.iter()
				.position(|b| *b == 0)
				.ok_or_else(|| Error::corrupt("unterminated element name"))?;
			Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
		};

		let mut names = Vec::with_capacity(nb_elements);
		let mut offset_of = Vec::with_capacity(nb_elements);
		for i in 0..nb_elements {
			let offset = bytes::get_i64(header, layout::ELT_NAMES + 8 * i);
			names.push(name_at(offset)?);
			offset_of.push(offset);
		}
		let mut sorted = Vec::with_capacity(nb_elements);
		for i in 0..nb_elements {
			let offset = bytes::get_i64(header, layout::ELT_NAMES + 8 * (nb_elements + i));
			let idx = offset_of
				.iter()
				.position(|o| *o == offset)
				.ok_or_else(|| Error::corrupt("sorted element-name offset not in declaration table"))?;
			sorted.push(idx);
		}
		Ok(Self { names, sorted })
	}
}
