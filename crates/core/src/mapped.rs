// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	fs::{File, OpenOptions},
	path::{Path, PathBuf},
};

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::error::{Error, Result};

enum Map {
	Ro(Mmap),
	Rw(MmapMut),
}

/// A file held open through a memory mapping.
///
/// Writable mappings come only from `create`/`open_rw`; `open_ro` maps
/// read-only. Resizing drops the mapping, truncates, and remaps — pages of
/// a shrunk file must never stay mapped.
pub struct MappedFile {
	path: PathBuf,
	file: File,
	map: Map,
}

impl MappedFile {
	/// Creates the file (failing if it exists), sizes it, and maps it
	/// read-write.
	pub fn create(path: impl AsRef<Path>, size: usize) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = OpenOptions::new().read(true).write(true).create_new(true).open(&path)?;
		file.set_len(size as u64)?;
		let map = unsafe { MmapOptions::new().map_mut(&file)? };
		Ok(Self { path, file, map: Map::Rw(map) })
	}

	pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = OpenOptions::new().read(true).write(true).open(&path)?;
		let map = unsafe { MmapOptions::new().map_mut(&file)? };
		Ok(Self { path, file, map: Map::Rw(map) })
	}

	pub fn open_ro(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = OpenOptions::new().read(true).open(&path)?;
		let map = unsafe { MmapOptions::new().map(&file)? };
		Ok(Self { path, file, map: Map::Ro(map) })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn writable(&self) -> bool {
		matches!(self.map, Map::Rw(_))
	}

	pub fn len(&self) -> usize {
		match &self.map {
			Map::Ro(map) => map.len(),
			Map::Rw(map) => map.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn as_slice(&self) -> &[u8] {
		match &self.map {
			Map::Ro(map) => &map[..],
			Map::Rw(map) => &map[..],
		}
	}

	pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
		match &mut self.map {
			Map::Ro(_) => Err(Error::read_only(format!("mapping of {}", self.path.display()))),
			Map::Rw(map) => Ok(&mut map[..]),
		}
	}

	/// Truncates the file to `size` bytes (growing or shrinking) and
	/// remaps it. Only valid on writable mappings.
	pub fn resize(&mut self, size: usize) -> Result<()> {
		match &mut self.map {
			Map::Ro(_) => Err(Error::read_only(format!("mapping of {}", self.path.display()))),
			Map::Rw(map) => {
				map.flush()?;
				// Replace the live mapping before truncating: pages of
				// a shrunk file must not stay mapped.
				self.map = Map::Rw(MmapMut::map_anon(1)?);
				self.file.set_len(size as u64)?;
				self.map = Map::Rw(unsafe { MmapOptions::new().map_mut(&self.file)? });
				Ok(())
			}
		}
	}

	pub fn flush(&self) -> Result<()> {
		if let Map::Rw(map) = &self.map {
			map.flush()?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use seqdms_testing::temp_dir;

	use super::*;

	#[test]
	fn test_create_write_reopen() {
		temp_dir(|path| {
			let file_path = path.join("data.bin");
			let mut mapped = MappedFile::create(&file_path, 64).unwrap();
			mapped.as_mut_slice().unwrap()[0..4].copy_from_slice(b"abcd");
			mapped.flush().unwrap();
			drop(mapped);

			let reopened = MappedFile::open_ro(&file_path).unwrap();
			assert_eq!(&reopened.as_slice()[0..4], b"abcd");
			assert_eq!(reopened.len(), 64);
			assert!(!reopened.writable());
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_create_existing_fails() {
		temp_dir(|path| {
			let file_path = path.join("data.bin");
			MappedFile::create(&file_path, 16).unwrap();
			assert!(MappedFile::create(&file_path, 16).is_err());
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_resize() {
		temp_dir(|path| {
			let file_path = path.join("data.bin");
			let mut mapped = MappedFile::create(&file_path, 16).unwrap();
			mapped.as_mut_slice().unwrap()[15] = 7;
			mapped.resize(32).unwrap();
			assert_eq!(mapped.len(), 32);
			assert_eq!(mapped.as_slice()[15], 7);
			assert_eq!(mapped.as_slice()[31], 0);

			mapped.resize(16).unwrap();
			assert_eq!(mapped.len(), 16);
			assert_eq!(mapped.as_slice()[15], 7);
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_read_only_rejects_mutation() {
		temp_dir(|path| {
			let file_path = path.join("data.bin");
			MappedFile::create(&file_path, 16).unwrap();
			let mut mapped = MappedFile::open_ro(&file_path).unwrap();
			assert!(mapped.as_mut_slice().is_err());
			assert!(mapped.resize(32).is_err());
			Ok(())
		})
		.unwrap();
	}
}
