// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{collections::HashMap, fs, path::PathBuf};

use seqdms_core::{
	Dms, Error, MappedFile, Result,
	bytes::{get_u64, put_u64},
	round_up_to_page,
};
use tracing::debug;

/// Extension of an indexer file inside `INDEXERS/`.
pub const INDEXER_EXTENSION: &str = "odx";

// used_size (u64) + blob_count (u64)
const HEADER_SIZE: usize = 16;
const LEN_PREFIX: usize = 8;

/// The default indexer name for a column: `<name>_<version>`.
pub fn build_indexer_name(column_name: &str, version: i32) -> String {
	format!("{column_name}_{version}")
}

/// An append-only blob store returning stable `i64` handles.
///
/// File layout: a 16-byte header (`used_size`, `blob_count`, both LE u64)
/// followed by length-prefixed blobs. Handles are ordinals in insertion
/// order. Writable handles keep a byte-exact dedup map, so inserting a
/// blob that is already present returns the existing handle.
pub struct Indexer {
	name: String,
	mapped: MappedFile,
	offsets: Vec<usize>,
	used_size: usize,
	dedup: Option<HashMap<Vec<u8>, i64>>,
}

fn indexer_path(dms: &Dms, name: &str) -> PathBuf {
	dms.indexers_directory().join(format!("{name}.{INDEXER_EXTENSION}"))
}

impl Indexer {
	/// Creates a new, empty, writable indexer.
	pub fn create(dms: &Dms, name: &str) -> Result<Self> {
		let path = indexer_path(dms, name);
		if path.exists() {
			return Err(Error::AlreadyExists { what: "indexer", name: name.to_string() });
		}
		let mut mapped = MappedFile::create(&path, round_up_to_page(HEADER_SIZE))?;
		write_header(&mut mapped, HEADER_SIZE, 0)?;
		debug!(name, "created indexer");
		Ok(Self {
			name: name.to_string(),
			mapped,
			offsets: Vec::new(),
			used_size: HEADER_SIZE,
			dedup: Some(HashMap::new()),
		})
	}

	/// Opens an existing indexer read-only.
	pub fn open(dms: &Dms, name: &str) -> Result<Self> {
		let path = indexer_path(dms, name);
		if !path.is_file() {
			return Err(Error::NotFound { what: "indexer", name: name.to_string() });
		}
		let mapped = MappedFile::open_ro(&path)?;
		let (offsets, used_size) = scan(&mapped, name)?;
		Ok(Self { name: name.to_string(), mapped, offsets, used_size, dedup: None })
	}

	pub fn open_or_create(dms: &Dms, name: &str) -> Result<Self> {
		if indexer_path(dms, name).is_file() { Self::open(dms, name) } else { Self::create(dms, name) }
	}

	/// Byte-copies this indexer to `new_name` and opens the copy
	/// writable. Fails with `AlreadyExists` when the target name is
	/// taken, so callers can probe successive names.
	pub fn clone_to(&self, dms: &Dms, new_name: &str) -> Result<Indexer> {
		let target = indexer_path(dms, new_name);
		if target.exists() {
			return Err(Error::AlreadyExists { what: "indexer", name: new_name.to_string() });
		}
		self.mapped.flush()?;
		fs::copy(self.mapped.path(), &target)?;
		let mapped = MappedFile::open_rw(&target)?;
		let (offsets, used_size) = scan(&mapped, new_name)?;
		let mut dedup = HashMap::with_capacity(offsets.len());
		for (ordinal, offset) in offsets.iter().enumerate() {
			let bytes = blob_at(&mapped, *offset, new_name)?;
			dedup.entry(bytes.to_vec()).or_insert(ordinal as i64);
		}
		debug!(from = %self.name, to = new_name, "cloned indexer to writable copy");
		Ok(Indexer { name: new_name.to_string(), mapped, offsets, used_size, dedup: Some(dedup) })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn writable(&self) -> bool {
		self.dedup.is_some()
	}

	pub fn blob_count(&self) -> usize {
		self.offsets.len()
	}

	/// Stores `bytes` and returns its handle; returns the existing
	/// handle when the exact bytes were inserted before.
	pub fn insert(&mut self, bytes: &[u8]) -> Result<i64> {
		let Some(dedup) = &self.dedup else {
			return Err(Error::ReadOnlyIndexer);
		};
		if let Some(index) = dedup.get(bytes) {
			return Ok(*index);
		}

		let offset = self.used_size + LEN_PREFIX;
		let new_used = self
			.used_size
			.checked_add(LEN_PREFIX)
			.and_then(|n| n.checked_add(bytes.len()))
			.ok_or(Error::Allocation)?;
		if new_used > self.mapped.len() {
			let grown = round_up_to_page(new_used.max(self.mapped.len().checked_mul(2).ok_or(Error::Allocation)?));
			self.mapped.resize(grown)?;
		}

		let slice = self.mapped.as_mut_slice()?;
		put_u64(slice, self.used_size, bytes.len() as u64);
		slice[offset..offset + bytes.len()].copy_from_slice(bytes);

		let index = self.offsets.len() as i64;
		self.offsets.push(offset);
		self.used_size = new_used;
		if let Some(dedup) = &mut self.dedup {
			dedup.insert(bytes.to_vec(), index);
		}
		write_header(&mut self.mapped, self.used_size, self.offsets.len())?;
		Ok(index)
	}

	/// Retrieves the bytes stored under `index`.
	pub fn get(&self, index: i64) -> Result<Vec<u8>> {
		if index < 0 || index as usize >= self.offsets.len() {
			return Err(Error::corrupt(format!("blob index {index} out of range in indexer '{}'", self.name)));
		}
		Ok(blob_at(&self.mapped, self.offsets[index as usize], &self.name)?.to_vec())
	}

	/// Shrinks the backing file to its used size. Called when the owning
	/// column closes.
	pub fn truncate(&mut self) -> Result<()> {
		if self.writable() {
			self.mapped.resize(round_up_to_page(self.used_size))?;
			self.mapped.flush()?;
		}
		Ok(())
	}
}

fn write_header(mapped: &mut MappedFile, used_size: usize, blob_count: usize) -> Result<()> {
	let slice = mapped.as_mut_slice()?;
	put_u64(slice, 0, used_size as u64);
	put_u64(slice, 8, blob_count as u64);
	Ok(())
}

fn scan(mapped: &MappedFile, name: &str) -> Result<(Vec<usize>, usize)> {
	let slice = mapped.as_slice();
	if slice.len() < HEADER_SIZE {
		return Err(Error::corrupt(format!("indexer '{name}' shorter than its header")));
	}
	let used_size = get_u64(slice, 0) as usize;
	let blob_count = get_u64(slice, 8) as usize;
	if used_size < HEADER_SIZE || used_size > slice.len() {
		return Err(Error::corrupt(format!("indexer '{name}' has an invalid used size {used_size}")));
	}

	let mut offsets = Vec::with_capacity(blob_count);
	let mut cursor = HEADER_SIZE;
	while cursor < used_size {
		if cursor + LEN_PREFIX > used_size {
			return Err(Error::corrupt(format!("indexer '{name}' has a torn length prefix")));
		}
		let len = get_u64(slice, cursor) as usize;
		cursor += LEN_PREFIX;
		if cursor + len > used_size {
			return Err(Error::corrupt(format!("indexer '{name}' has a torn blob")));
		}
		offsets.push(cursor);
		cursor += len;
	}
	if offsets.len() != blob_count {
		return Err(Error::corrupt(format!(
			"indexer '{name}' header counts {blob_count} blobs but {} were found",
			offsets.len()
		)));
	}
	Ok((offsets, used_size))
}

fn blob_at<'a>(mapped: &'a MappedFile, offset: usize, name: &str) -> Result<&'a [u8]> {
	let slice = mapped.as_slice();
	if offset < LEN_PREFIX || offset > slice.len() {
		return Err(Error::corrupt(format!("blob offset {offset} out of range in indexer '{name}'")));
	}
	let len = get_u64(slice, offset - LEN_PREFIX) as usize;
	if offset + len > slice.len() {
		return Err(Error::corrupt(format!("blob at offset {offset} overruns indexer '{name}'")));
	}
	Ok(&slice[offset..offset + len])
}
