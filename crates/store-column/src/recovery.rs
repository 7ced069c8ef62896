// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Crash recovery for columns.
//!
//! A process that dies while writing leaves column files whose header
//! `finished` flag is still false. The scan walks every `*.obicol`
//! directory and removes them; finished columns are immutable and never
//! touched.

use std::{
	fs,
	io::Read,
	path::{Path, PathBuf},
};

use seqdms_core::{Dms, Result};
use tracing::{debug, warn};

use crate::{COLUMN_EXTENSION, layout};

enum HeaderState {
	Finished,
	Unfinished,
	Unreadable,
}

fn header_state(path: &Path) -> HeaderState {
	let mut buf = [0u8; layout::FINISHED + 1];
	match fs::File::open(path).and_then(|mut file| file.read_exact(&mut buf)) {
		Ok(()) => {
			if buf[layout::FINISHED] != 0 {
				HeaderState::Finished
			} else {
				HeaderState::Unfinished
			}
		}
		Err(err) => {
			warn!(path = %path.display(), %err, "unreadable column header");
			HeaderState::Unreadable
		}
	}
}

fn column_files(dms: &Dms) -> Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for name in dms.column_names()? {
		let dir = dms.column_directory(&name);
		for entry in fs::read_dir(&dir)? {
			let entry = entry?;
			let path = entry.path();
			if path.extension().is_some_and(|ext| ext == COLUMN_EXTENSION) {
				files.push(path);
			}
		}
	}
	Ok(files)
}

/// Whether any column file in the store was left unfinished by a dead
/// writer.
pub fn has_unfinished_columns(dms: &Dms) -> Result<bool> {
	for path in column_files(dms)? {
		if matches!(header_state(&path), HeaderState::Unfinished) {
			return Ok(true);
		}
	}
	Ok(false)
}

/// Deletes every unfinished column file. Unreadable files are torn
/// artifacts of the same kind and are deleted too.
pub fn clean_unfinished_columns(dms: &Dms) -> Result<()> {
	for path in column_files(dms)? {
		match header_state(&path) {
			HeaderState::Finished => {}
			HeaderState::Unfinished | HeaderState::Unreadable => {
				debug!(path = %path.display(), "removing unfinished column file");
				fs::remove_file(&path)?;
			}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use seqdms_testing::temp_dir;
	use seqdms_type::Type;

	use super::*;
	use crate::column::{Column, ColumnSpec, column_file_path};

	#[test]
	fn test_unfinished_column_is_cleaned() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			let column = Column::create(&dms, &ColumnSpec::new("count", Type::Int)).unwrap();
			drop(column); // never finished

			assert!(has_unfinished_columns(&dms).unwrap());
			clean_unfinished_columns(&dms).unwrap();
			assert!(!has_unfinished_columns(&dms).unwrap());
			assert!(!column_file_path(&dms, "count", 0).exists());
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_finished_column_survives() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			let mut column = Column::create(&dms, &ColumnSpec::new("count", Type::Int)).unwrap();
			column.set_int(0, 0, 4).unwrap();
			column.set_finished().unwrap();
			column.close().unwrap();

			assert!(!has_unfinished_columns(&dms).unwrap());
			clean_unfinished_columns(&dms).unwrap();
			assert!(column_file_path(&dms, "count", 0).exists());

			let reopened = Column::open(&dms, "count", 0).unwrap();
			assert_eq!(reopened.get_int(0, 0).unwrap(), Some(4));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_empty_store() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			assert!(!has_unfinished_columns(&dms).unwrap());
			clean_unfinished_columns(&dms).unwrap();
			Ok(())
		})
		.unwrap();
	}
}
