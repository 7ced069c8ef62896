// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use once_cell::sync::Lazy;

static PAGE_SIZE: Lazy<usize> = Lazy::new(|| {
	let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
	if size <= 0 { 4096 } else { size as usize }
});

/// The platform memory page size. Header and data regions of every mapped
/// file are sized in whole pages.
pub fn page_size() -> usize {
	*PAGE_SIZE
}

/// Rounds `size` up to the next page multiple, never below one page.
pub fn round_up_to_page(size: usize) -> usize {
	let page = page_size();
	let pages = size.div_ceil(page).max(1);
	pages * page
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_page_size_sane() {
		let page = page_size();
		assert!(page >= 512);
		assert_eq!(page & (page - 1), 0, "page size is a power of two");
	}

	#[test]
	fn test_round_up() {
		let page = page_size();
		assert_eq!(round_up_to_page(0), page);
		assert_eq!(round_up_to_page(1), page);
		assert_eq!(round_up_to_page(page), page);
		assert_eq!(round_up_to_page(page + 1), 2 * page);
	}
}
