// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Shared foundations of the seqdms store: the error taxonomy, the `Dms`
//! directory handle, page-size arithmetic, and the JSON comments channel.

pub mod bytes;
mod comments;
mod dms;
mod error;
mod mapped;
mod page;

pub use comments::Comments;
pub use dms::{COLUMN_DIR_EXTENSION, DMS_EXTENSION, Dms, INDEXERS_DIR, VIEWS_DIR};
pub use error::{Error, Result};
pub use mapped::MappedFile;
pub use page::{page_size, round_up_to_page};
