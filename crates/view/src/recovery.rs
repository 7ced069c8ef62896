// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Crash recovery for views.
//!
//! A writer that dies before `finish()` leaves a `.obiview_unfinished`
//! file; one that dies between data writes and the final flag can leave
//! a published name whose mapped `finished` flag is still false. Both are
//! dead artifacts and are removed.

use std::{fs, io::Read, path::Path};

use seqdms_core::{Dms, Result};
use tracing::{debug, warn};

use crate::{UNFINISHED_VIEW_EXTENSION, VIEW_EXTENSION, layout};

fn finished_flag(path: &Path) -> Option<bool> {
	let mut buf = [0u8; layout::FINISHED + 1];
	match fs::File::open(path).and_then(|mut file| file.read_exact(&mut buf)) {
		Ok(()) => Some(buf[layout::FINISHED] != 0),
		Err(err) => {
			warn!(path = %path.display(), %err, "unreadable view metadata");
			None
		}
	}
}

fn is_dead_artifact(path: &Path) -> bool {
	let Some(name) = path.file_name().and_then(|n| n.to_str()) else { return false };
	if name.ends_with(&format!(".{UNFINISHED_VIEW_EXTENSION}")) {
		return true;
	}
	if name.ends_with(&format!(".{VIEW_EXTENSION}")) {
		// Published name, but the flag never made it to disk.
		return !finished_flag(path).unwrap_or(false);
	}
	false
}

/// Whether any view in the store was left unfinished by a dead writer.
pub fn has_unfinished_views(dms: &Dms) -> Result<bool> {
	for entry in fs::read_dir(dms.views_directory())? {
		let entry = entry?;
		if is_dead_artifact(&entry.path()) {
			return Ok(true);
		}
	}
	Ok(false)
}

/// Deletes every unfinished view metadata file.
pub fn clean_unfinished_views(dms: &Dms) -> Result<()> {
	for entry in fs::read_dir(dms.views_directory())? {
		let entry = entry?;
		let path = entry.path();
		if is_dead_artifact(&path) {
			debug!(path = %path.display(), "removing unfinished view file");
			fs::remove_file(&path)?;
		}
	}
	Ok(())
}
