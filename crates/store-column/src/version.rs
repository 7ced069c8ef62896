// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	fs::OpenOptions,
	io::{Read, Seek, SeekFrom, Write},
	os::unix::io::AsRawFd,
	path::PathBuf,
};

use seqdms_core::{Dms, Error, Result};

use crate::VERSION_EXTENSION;

fn version_file_path(dms: &Dms, column_name: &str) -> PathBuf {
	dms.column_directory(column_name).join(format!("{column_name}.{VERSION_EXTENSION}"))
}

struct FileLock {
	fd: i32,
}

impl FileLock {
	fn exclusive(fd: i32) -> Result<Self> {
		if unsafe { libc::flock(fd, libc::LOCK_EX) } != 0 {
			return Err(Error::Io(std::io::Error::last_os_error()));
		}
		Ok(Self { fd })
	}
}

impl Drop for FileLock {
	fn drop(&mut self) {
		unsafe { libc::flock(self.fd, libc::LOCK_UN) };
	}
}

/// The latest version number recorded for `column_name`.
pub fn latest_version(dms: &Dms, column_name: &str) -> Result<i32> {
	let path = version_file_path(dms, column_name);
	if !path.is_file() {
		return Err(Error::NotFound { what: "column", name: column_name.to_string() });
	}
	let mut file = OpenOptions::new().read(true).open(&path)?;
	let _lock = FileLock::exclusive(file.as_raw_fd())?;
	let mut buf = [0u8; 4];
	file.read_exact(&mut buf)?;
	Ok(i32::from_le_bytes(buf))
}

/// Allocates the next version number for `column_name`, creating the
/// column directory and its version file on first use.
///
/// The advisory lock only orders writers inside the supported
/// single-writer discipline; it is not a cross-process safety mechanism.
pub fn next_version(dms: &Dms, column_name: &str) -> Result<i32> {
	dms.ensure_column_directory(column_name)?;
	let path = version_file_path(dms, column_name);
	let existed = path.is_file();
	let mut file = OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;
	let _lock = FileLock::exclusive(file.as_raw_fd())?;

	let version = if existed {
		let mut buf = [0u8; 4];
		file.read_exact(&mut buf)?;
		i32::from_le_bytes(buf).checked_add(1).ok_or(Error::Allocation)?
	} else {
		0
	};

	file.seek(SeekFrom::Start(0))?;
	file.write_all(&version.to_le_bytes())?;
	file.flush()?;
	Ok(version)
}
