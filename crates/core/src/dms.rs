// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	fs,
	path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::{Error, Result};

/// Extension of the store's root directory.
pub const DMS_EXTENSION: &str = "seqdms";
/// Extension of a per-column-name directory inside the store.
pub const COLUMN_DIR_EXTENSION: &str = "obicol";
/// Directory holding view metadata files.
pub const VIEWS_DIR: &str = "VIEWS";
/// Directory holding indexer files.
pub const INDEXERS_DIR: &str = "INDEXERS";

/// Handle on a store directory.
///
/// The directory layout is flat: one `<name>.obicol/` directory per column
/// name (holding every version of that column plus its version file), a
/// `VIEWS/` directory for view metadata, and an `INDEXERS/` directory for
/// blob indexers. `Dms` only resolves paths and walks directories; columns,
/// views, and indexers own their files.
#[derive(Clone, Debug)]
pub struct Dms {
	root: PathBuf,
}

fn root_path(path: &Path) -> PathBuf {
	if path.extension().is_some_and(|ext| ext == DMS_EXTENSION) {
		path.to_path_buf()
	} else {
		let mut name = path.as_os_str().to_os_string();
		name.push(".");
		name.push(DMS_EXTENSION);
		PathBuf::from(name)
	}
}

impl Dms {
	/// Creates a new store directory (plus `VIEWS/` and `INDEXERS/`).
	///
	/// `path` may omit the `.seqdms` extension; it is appended when
	/// missing.
	pub fn create(path: impl AsRef<Path>) -> Result<Self> {
		let root = root_path(path.as_ref());
		if root.exists() {
			return Err(Error::AlreadyExists { what: "dms", name: root.display().to_string() });
		}
		fs::create_dir_all(&root)?;
		fs::create_dir(root.join(VIEWS_DIR))?;
		fs::create_dir(root.join(INDEXERS_DIR))?;
		debug!(root = %root.display(), "created dms");
		Ok(Self { root })
	}

	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let root = root_path(path.as_ref());
		if !root.is_dir() {
			return Err(Error::NotFound { what: "dms", name: root.display().to_string() });
		}
		Ok(Self { root })
	}

	pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
		let root = root_path(path.as_ref());
		if root.is_dir() { Self::open(root) } else { Self::create(root) }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Directory holding every version of the named column.
	pub fn column_directory(&self, column_name: &str) -> PathBuf {
		self.root.join(format!("{column_name}.{COLUMN_DIR_EXTENSION}"))
	}

	/// Like [`Dms::column_directory`], creating the directory if needed.
	pub fn ensure_column_directory(&self, column_name: &str) -> Result<PathBuf> {
		let dir = self.column_directory(column_name);
		if !dir.is_dir() {
			fs::create_dir(&dir)?;
		}
		Ok(dir)
	}

	pub fn views_directory(&self) -> PathBuf {
		self.root.join(VIEWS_DIR)
	}

	pub fn indexers_directory(&self) -> PathBuf {
		self.root.join(INDEXERS_DIR)
	}

	/// Names of every column that has a directory in this store.
	pub fn column_names(&self) -> Result<Vec<String>> {
		let mut names = Vec::new();
		for entry in fs::read_dir(&self.root)? {
			let entry = entry?;
			if !entry.file_type()?.is_dir() {
				continue;
			}
			let file_name = entry.file_name();
			let Some(file_name) = file_name.to_str() else { continue };
			if let Some(name) = file_name.strip_suffix(&format!(".{COLUMN_DIR_EXTENSION}")) {
				names.push(name.to_string());
			}
		}
		names.sort();
		Ok(names)
	}
}

#[cfg(test)]
mod tests {
	use seqdms_testing::temp_dir;

	use super::*;

	#[test]
	fn test_create_open() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			assert!(dms.root().ends_with("store.seqdms"));
			assert!(dms.views_directory().is_dir());
			assert!(dms.indexers_directory().is_dir());

			let reopened = Dms::open(path.join("store")).unwrap();
			assert_eq!(reopened.root(), dms.root());
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_create_twice_fails() {
		temp_dir(|path| {
			Dms::create(path.join("store")).unwrap();
			assert!(matches!(Dms::create(path.join("store")), Err(Error::AlreadyExists { .. })));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_open_missing_fails() {
		temp_dir(|path| {
			assert!(matches!(Dms::open(path.join("absent")), Err(Error::NotFound { .. })));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_column_names() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			dms.ensure_column_directory("seq").unwrap();
			dms.ensure_column_directory("count").unwrap();
			assert_eq!(dms.column_names().unwrap(), vec!["count".to_string(), "seq".to_string()]);
			Ok(())
		})
		.unwrap();
	}
}
