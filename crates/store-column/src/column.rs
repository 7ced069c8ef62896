// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	fs,
	path::PathBuf,
	time::{SystemTime, UNIX_EPOCH},
};

use seqdms_core::{Comments, Dms, Error, MappedFile, Result, bytes, page_size};
use seqdms_indexer::{Indexer, build_indexer_name};
use seqdms_type::{BOOL_NA, CHAR_NA, FLOAT_NA, INDEX_NA, INT_NA, Type};
use tracing::{debug, warn};

use crate::{COLUMN_EXTENSION, elements::ElementNames, layout, version};

/// Hard ceiling on the line count of any column.
pub const MAXIMUM_LINE_COUNT: usize = 1_000_000_000;

/// Everything needed to create a column.
///
/// `nb_lines` is a lower bound; the created column is at least one page of
/// lines. `element_names` defaults to decimal names (or the column name
/// for a single-element column). `indexer_name` defaults to
/// `<name>_<version>`; naming an existing indexer shares it.
#[derive(Clone, Debug)]
pub struct ColumnSpec {
	pub name: String,
	pub data_type: Type,
	pub nb_lines: usize,
	pub nb_elements_per_line: usize,
	pub element_names: Option<Vec<String>>,
	pub dict_column: bool,
	pub tuples: bool,
	pub to_eval: bool,
	pub indexer_name: Option<String>,
	pub associated_column: Option<(String, i32)>,
	pub comments: String,
}

impl ColumnSpec {
	pub fn new(name: impl Into<String>, data_type: Type) -> Self {
		Self {
			name: name.into(),
			data_type,
			nb_lines: 0,
			nb_elements_per_line: 1,
			element_names: None,
			dict_column: false,
			tuples: false,
			to_eval: false,
			indexer_name: None,
			associated_column: None,
			comments: String::new(),
		}
	}

	pub fn with_elements(mut self, names: &[&str]) -> Self {
		self.element_names = Some(names.iter().map(|n| n.to_string()).collect());
		self.nb_elements_per_line = names.len();
		self
	}

	pub fn with_lines(mut self, nb_lines: usize) -> Self {
		self.nb_lines = nb_lines;
		self
	}
}

/// A handle on one version of an on-disk column.
///
/// Handles from [`Column::create`] and [`Column::clone_column`] are
/// writable until closed; handles from [`Column::open`] never are. The
/// whole file stays memory-mapped for the life of the handle.
pub struct Column {
	pub(crate) dms: Dms,
	pub(crate) mapped: MappedFile,
	pub(crate) name: String,
	pub(crate) version: i32,
	pub(crate) returned_type: Type,
	pub(crate) stored_type: Type,
	pub(crate) nb_elements: usize,
	pub(crate) header_size: usize,
	pub(crate) elements: ElementNames,
	pub(crate) indexer: Option<Indexer>,
	pub(crate) writable: bool,
	closed: bool,
}

/// Path of the column file for `(name, version)`.
pub fn column_file_path(dms: &Dms, name: &str, version: i32) -> PathBuf {
	dms.column_directory(name).join(format!("{name}@{version}.{COLUMN_EXTENSION}"))
}

// Leaves room for the derived indexer name `<name>_<version>` inside the
// same fixed header field width.
const MAX_COLUMN_NAME: usize = layout::NAME_WIDTH - 16;

fn validate_name(name: &str) -> Result<()> {
	if name.is_empty() || name.len() >= MAX_COLUMN_NAME || name.contains(['/', '@', '\0']) {
		return Err(Error::inconsistency(format!("invalid column name: '{name}'")));
	}
	Ok(())
}

fn now_seconds() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Lines that fit in one memory page, the minimum allocation of any
/// column.
fn lines_per_page(stored: Type, nb_elements: usize) -> usize {
	(page_size() / (stored.stored_width() * nb_elements)).max(1)
}

impl Column {
	/// Creates the next version of `spec.name`, sized to at least one
	/// page of lines, with every slot initialized to NA.
	pub fn create(dms: &Dms, spec: &ColumnSpec) -> Result<Column> {
		validate_name(&spec.name)?;
		if spec.nb_elements_per_line < 1 {
			return Err(Error::inconsistency("a column needs at least one element per line"));
		}
		if spec.nb_lines > MAXIMUM_LINE_COUNT {
			return Err(Error::inconsistency(format!(
				"requested line count {} exceeds the maximum {MAXIMUM_LINE_COUNT}",
				spec.nb_lines
			)));
		}

		let elements = match &spec.element_names {
			Some(names) => {
				let elements = ElementNames::new(names.clone())?;
				if elements.len() != spec.nb_elements_per_line {
					return Err(Error::inconsistency(format!(
						"{} element names given for {} elements per line",
						elements.len(),
						spec.nb_elements_per_line
					)));
				}
				elements
			}
			None => ElementNames::default_for(&spec.name, spec.nb_elements_per_line)?,
		};

		let comments = Comments::parse(&spec.comments)?;
		let comments_json = comments.to_json();
		if comments_json.len() >= layout::COMMENTS_WIDTH {
			return Err(Error::inconsistency("column comments exceed the header allocation"));
		}
		if let Some((assoc_name, assoc_version)) = &spec.associated_column {
			if *assoc_version < 0 {
				return Err(Error::inconsistency("the version of an associated column must be explicit"));
			}
			validate_name(assoc_name)?;
		}

		let stored_type = spec.data_type.stored();
		let nb_elements = spec.nb_elements_per_line;
		let line_count = spec.nb_lines.max(lines_per_page(stored_type, nb_elements));

		let version = version::next_version(dms, &spec.name)?;
		let header_size = layout::header_size(nb_elements, elements.arena_len());
		let data_size = layout::data_size(spec.data_type, line_count, nb_elements);
		let path = column_file_path(dms, &spec.name, version);
		let mut mapped = MappedFile::create(&path, header_size + data_size)?;

		{
			let header = mapped.as_mut_slice()?;
			bytes::put_u64(header, layout::HEADER_SIZE, header_size as u64);
			bytes::put_u64(header, layout::DATA_SIZE, data_size as u64);
			layout::set_line_count(header, line_count);
			layout::set_lines_used(header, 0);
			bytes::put_i64(header, layout::NB_ELEMENTS, nb_elements as i64);
			bytes::put_u8(header, layout::STORED_TYPE, stored_type.code());
			bytes::put_u8(header, layout::RETURNED_TYPE, spec.data_type.code());
			layout::set_flag(header, layout::DICT_COLUMN, spec.dict_column);
			layout::set_flag(header, layout::TUPLES, spec.tuples);
			layout::set_flag(header, layout::TO_EVAL, spec.to_eval);
			layout::set_flag(header, layout::FINISHED, false);
			bytes::put_i64(header, layout::CREATION_DATE, now_seconds());
			bytes::put_i32(header, layout::VERSION, version);
			layout::set_cloned_from(header, -1);
			bytes::put_str(header, layout::NAME, layout::NAME_WIDTH, &spec.name);
			bytes::put_str(header, layout::INDEXER_NAME, layout::NAME_WIDTH, "");
			layout::set_comments(header, &comments_json);
			match &spec.associated_column {
				Some((assoc_name, assoc_version)) => {
					layout::set_associated_column(header, assoc_name, *assoc_version);
				}
				None => layout::set_associated_column(header, "", -1),
			}
			elements.write_to(header);
		}

		let indexer = if spec.data_type.is_indirected() || spec.tuples {
			let indexer_name = match &spec.indexer_name {
				Some(name) if !name.is_empty() => {
					if name.len() >= layout::NAME_WIDTH {
						return Err(Error::inconsistency(format!("invalid indexer name: '{name}'")));
					}
					name.clone()
				}
				_ => build_indexer_name(&spec.name, version),
			};
			let indexer = Indexer::open_or_create(dms, &indexer_name)?;
			layout::set_indexer_name(mapped.as_mut_slice()?, &indexer_name);
			Some(indexer)
		} else {
			None
		};

		let mut column = Column {
			dms: dms.clone(),
			mapped,
			name: spec.name.clone(),
			version,
			returned_type: spec.data_type,
			stored_type,
			nb_elements,
			header_size,
			elements,
			indexer,
			writable: true,
			closed: false,
		};
		column.init_na(0, line_count)?;
		debug!(name = %column.name, version, line_count, "created column");
		Ok(column)
	}

	/// Opens `(name, version)` read-only; version `-1` resolves to the
	/// latest version.
	pub fn open(dms: &Dms, name: &str, version: i32) -> Result<Column> {
		let version = if version < 0 { version::latest_version(dms, name)? } else { version };
		let path = column_file_path(dms, name, version);
		if !path.is_file() {
			return Err(Error::NotFound { what: "column", name: format!("{name}@{version}") });
		}
		let mapped = MappedFile::open_ro(&path)?;
		let slice = mapped.as_slice();
		if slice.len() < layout::ELT_NAMES {
			return Err(Error::corrupt(format!("column file {name}@{version} shorter than its header")));
		}
		let header_size = layout::get_header_size(slice);
		let data_size = layout::get_data_size(slice);
		if header_size < layout::ELT_NAMES || header_size + data_size > slice.len() {
			return Err(Error::corrupt(format!("column file {name}@{version} has inconsistent sizes")));
		}
		let header = &slice[..header_size];
		let returned_type = layout::get_returned_type(header)?;
		let stored_type = layout::get_stored_type(header)?;
		if stored_type != returned_type.stored() {
			return Err(Error::corrupt(format!("column file {name}@{version} has mismatched types")));
		}
		let nb_elements = layout::get_nb_elements(header);
		if nb_elements == 0 {
			return Err(Error::corrupt(format!("column file {name}@{version} has no elements per line")));
		}
		if layout::get_line_count(header) * nb_elements * stored_type.stored_width() > data_size {
			return Err(Error::corrupt(format!("column file {name}@{version} overruns its data region")));
		}
		let elements = ElementNames::read_from(header, nb_elements)?;
		let indexer = match layout::get_indexer_name(header) {
			Some(indexer_name) => Some(Indexer::open(dms, &indexer_name)?),
			None => None,
		};
		Ok(Column {
			dms: dms.clone(),
			mapped,
			name: name.to_string(),
			version,
			returned_type,
			stored_type,
			nb_elements,
			header_size,
			elements,
			indexer,
			writable: false,
			closed: false,
		})
	}

	/// Creates a new version of `(name, version)`.
	///
	/// With `clone_data` and no selection the data region is copied
	/// whole; with a selection, the selected lines are copied in
	/// selection order. Without `clone_data` the new version starts
	/// empty. The clone shares the source's indexer by name and records
	/// its origin in `cloned_from`.
	pub fn clone_column(
		dms: &Dms,
		line_selection: Option<&Column>,
		name: &str,
		version: i32,
		clone_data: bool,
	) -> Result<Column> {
		let source = Column::open(dms, name, version)?;
		let nb_lines = if clone_data {
			match line_selection {
				None => source.line_count(),
				Some(selection) => selection.lines_used(),
			}
		} else {
			0
		};

		let spec = ColumnSpec {
			name: name.to_string(),
			data_type: source.returned_type,
			nb_lines,
			nb_elements_per_line: source.nb_elements,
			element_names: Some(source.elements.names().to_vec()),
			dict_column: source.dict_column(),
			tuples: source.tuples(),
			to_eval: source.to_eval(),
			indexer_name: source.indexer_name(),
			associated_column: source.associated_column(),
			comments: source.comments_json(),
		};
		let mut clone = Column::create(dms, &spec)?;
		{
			let header = clone.mapped.as_mut_slice()?;
			layout::set_cloned_from(header, source.version);
		}

		if clone_data {
			let line_bytes = source.nb_elements * source.stored_type.stored_width();
			match line_selection {
				None => {
					let used = source.lines_used();
					let copied = source.line_count().min(clone.line_count()) * line_bytes;
					let src = source.data_slice();
					let range = clone.header_size..clone.header_size + copied;
					clone.mapped.as_mut_slice()?[range].copy_from_slice(&src[..copied]);
					clone.set_lines_used_raw(used)?;
				}
				Some(selection) => {
					for i in 0..selection.lines_used() {
						let index = selection.get_index(i, 0)?.ok_or_else(|| {
							Error::inconsistency("line selection holds an undefined line number")
						})?;
						if index < 0 || index as usize >= source.line_count() {
							return Err(Error::inconsistency(format!(
								"line selection entry {index} is outside column '{name}'"
							)));
						}
						let src_off = index as usize * line_bytes;
						let dst_off = clone.header_size + i * line_bytes;
						let line = source.data_slice()[src_off..src_off + line_bytes].to_vec();
						clone.mapped.as_mut_slice()?[dst_off..dst_off + line_bytes]
							.copy_from_slice(&line);
					}
					clone.set_lines_used_raw(selection.lines_used())?;
				}
			}
		}
		debug!(
			name,
			from_version = source.version,
			to_version = clone.version,
			selected = line_selection.is_some(),
			"cloned column"
		);
		Ok(clone)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> i32 {
		self.version
	}

	pub fn returned_type(&self) -> Type {
		self.returned_type
	}

	pub fn stored_type(&self) -> Type {
		self.stored_type
	}

	pub fn nb_elements_per_line(&self) -> usize {
		self.nb_elements
	}

	pub fn element_names(&self) -> &ElementNames {
		&self.elements
	}

	pub fn writable(&self) -> bool {
		self.writable
	}

	pub fn finished(&self) -> bool {
		layout::get_flag(self.header(), layout::FINISHED)
	}

	pub fn dict_column(&self) -> bool {
		layout::get_flag(self.header(), layout::DICT_COLUMN)
	}

	pub fn tuples(&self) -> bool {
		layout::get_flag(self.header(), layout::TUPLES)
	}

	pub fn to_eval(&self) -> bool {
		layout::get_flag(self.header(), layout::TO_EVAL)
	}

	pub fn line_count(&self) -> usize {
		layout::get_line_count(self.header())
	}

	pub fn lines_used(&self) -> usize {
		layout::get_lines_used(self.header())
	}

	pub fn cloned_from(&self) -> Option<i32> {
		layout::get_cloned_from(self.header())
	}

	pub fn creation_date(&self) -> i64 {
		layout::get_creation_date(self.header())
	}

	pub fn indexer_name(&self) -> Option<String> {
		layout::get_indexer_name(self.header())
	}

	pub fn associated_column(&self) -> Option<(String, i32)> {
		layout::get_associated_column(self.header())
	}

	pub fn set_associated_column(&mut self, name: &str, version: i32) -> Result<()> {
		self.require_writable()?;
		layout::set_associated_column(self.header_mut()?, name, version);
		Ok(())
	}

	/// A human-readable one-stop description of the column.
	pub fn formatted_infos(&self, detailed: bool) -> String {
		let mut infos = format!(
			"{}@{}: {} ({} element(s) per line), {} line(s) used over {}",
			self.name,
			self.version,
			self.returned_type,
			self.nb_elements,
			self.lines_used(),
			self.line_count(),
		);
		if let Some(indexer_name) = self.indexer_name() {
			infos.push_str(&format!(", indexer '{indexer_name}'"));
		}
		if let Some((assoc_name, assoc_version)) = self.associated_column() {
			infos.push_str(&format!(", associated with {assoc_name}@{assoc_version}"));
		}
		if self.finished() {
			infos.push_str(", finished");
		}
		if detailed {
			infos.push_str(&format!("\n\telements: {}", self.elements.names().join(";")));
			infos.push_str(&format!("\n\tcomments: {}", self.comments_json()));
		}
		infos
	}

	pub fn comments(&self) -> Result<Comments> {
		Comments::parse(&layout::get_comments(self.header()))
	}

	pub fn comments_json(&self) -> String {
		layout::get_comments(self.header())
	}

	/// Merges `key: value` into the column comments.
	pub fn add_comment(&mut self, key: &str, value: &str) -> Result<()> {
		self.require_writable()?;
		let mut comments = self.comments()?;
		comments.add_key_value(key, value);
		let json = comments.to_json();
		if json.len() >= layout::COMMENTS_WIDTH {
			return Err(Error::inconsistency("column comments exceed the header allocation"));
		}
		layout::set_comments(self.header_mut()?, &json);
		Ok(())
	}

	/// Flags this column permanently read-only. Only the owning view
	/// calls this, at finish time.
	pub fn set_finished(&mut self) -> Result<()> {
		self.require_writable()?;
		layout::set_flag(self.header_mut()?, layout::FINISHED, true);
		self.mapped.flush()?;
		Ok(())
	}

	/// Sets the high-water mark directly. The view layer uses this when
	/// it grows every column of a view in lockstep.
	pub fn set_lines_used(&mut self, lines_used: usize) -> Result<()> {
		self.require_writable()?;
		if lines_used > self.line_count() {
			return Err(Error::inconsistency(format!(
				"lines_used {lines_used} beyond line count {}",
				self.line_count()
			)));
		}
		self.set_lines_used_raw(lines_used)
	}

	fn set_lines_used_raw(&mut self, lines_used: usize) -> Result<()> {
		layout::set_lines_used(self.header_mut()?, lines_used);
		Ok(())
	}

	/// Doubles the allocated line count (at least one page of lines),
	/// NA-filling the new tail.
	pub fn enlarge(&mut self) -> Result<()> {
		self.require_writable()?;
		let old_count = self.line_count();
		let grown = old_count
			.checked_mul(2)
			.ok_or(Error::Allocation)?
			.max(old_count + lines_per_page(self.stored_type, self.nb_elements));
		let new_count = if grown > MAXIMUM_LINE_COUNT {
			if old_count >= MAXIMUM_LINE_COUNT {
				return Err(Error::inconsistency("column is already at the maximum line count"));
			}
			MAXIMUM_LINE_COUNT
		} else {
			grown
		};
		let new_data_size = layout::data_size(self.stored_type, new_count, self.nb_elements);
		self.mapped.resize(self.header_size + new_data_size)?;
		{
			let header = self.mapped.as_mut_slice()?;
			bytes::put_u64(header, layout::HEADER_SIZE, self.header_size as u64);
			layout::set_data_size(header, new_data_size);
			layout::set_line_count(header, new_count);
		}
		self.init_na(old_count, new_count)?;
		debug!(name = %self.name, version = self.version, old_count, new_count, "enlarged column");
		Ok(())
	}

	/// Shrinks the backing file to the page-rounded size of the used
	/// lines; the freed tail capacity is given up.
	pub(crate) fn truncate(&mut self) -> Result<()> {
		self.require_writable()?;
		let new_data_size = layout::data_size(self.stored_type, self.lines_used(), self.nb_elements);
		if self.header_size + new_data_size >= self.mapped.len() {
			return Ok(());
		}
		let line_bytes = self.nb_elements * self.stored_type.stored_width();
		let new_count = new_data_size / line_bytes;
		self.mapped.resize(self.header_size + new_data_size)?;
		let header = self.mapped.as_mut_slice()?;
		layout::set_data_size(header, new_data_size);
		layout::set_line_count(header, new_count);
		Ok(())
	}

	/// Truncates (when writable) and releases the handle.
	pub fn close(mut self) -> Result<()> {
		self.do_close()
	}

	/// Closes the handle and deletes the backing file. Used by view
	/// rollback for columns the view itself created.
	pub fn delete(mut self) -> Result<()> {
		self.closed = true;
		let path = self.mapped.path().to_path_buf();
		fs::remove_file(&path)?;
		debug!(name = %self.name, version = self.version, "deleted column file");
		if let Some(dir) = path.parent() {
			// Only removes a now-empty directory; the version file
			// usually keeps it alive.
			let _ = fs::remove_dir(dir);
		}
		Ok(())
	}

	fn do_close(&mut self) -> Result<()> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		if self.writable {
			self.truncate()?;
			self.mapped.flush()?;
		}
		if let Some(indexer) = &mut self.indexer {
			indexer.truncate()?;
		}
		Ok(())
	}

	/// Handle-level writability: true for create/clone handles until they
	/// close, regardless of the `finished` flag (closing a just-finished
	/// column still truncates it).
	pub(crate) fn require_writable(&self) -> Result<()> {
		if !self.writable {
			return Err(Error::read_only(format!("column '{}'", self.name)));
		}
		Ok(())
	}

	/// Grows the column to hold `line_nb`, bumps the high-water mark,
	/// and rejects writes on read-only handles and finished columns.
	pub fn prepare_to_set(&mut self, line_nb: usize, elt_idx: usize) -> Result<()> {
		self.require_writable()?;
		if self.finished() {
			return Err(Error::read_only(format!("column '{}'", self.name)));
		}
		if elt_idx >= self.nb_elements {
			return Err(Error::UnknownElement { name: format!("element index {elt_idx}") });
		}
		if line_nb >= MAXIMUM_LINE_COUNT {
			return Err(Error::inconsistency(format!("line {line_nb} beyond the maximum line count")));
		}
		while line_nb + 1 > self.line_count() {
			self.enlarge()?;
		}
		if line_nb + 1 > self.lines_used() {
			self.set_lines_used_raw(line_nb + 1)?;
		}
		Ok(())
	}

	pub fn prepare_to_get(&self, line_nb: usize) -> Result<()> {
		if line_nb + 1 > self.line_count() {
			return Err(Error::inconsistency(format!(
				"line {line_nb} beyond the line count of column '{}'",
				self.name
			)));
		}
		Ok(())
	}

	pub(crate) fn header(&self) -> &[u8] {
		&self.mapped.as_slice()[..self.header_size]
	}

	pub(crate) fn header_mut(&mut self) -> Result<&mut [u8]> {
		let header_size = self.header_size;
		Ok(&mut self.mapped.as_mut_slice()?[..header_size])
	}

	pub(crate) fn data_slice(&self) -> &[u8] {
		let data_size = layout::get_data_size(self.header());
		&self.mapped.as_slice()[self.header_size..self.header_size + data_size]
	}

	/// Absolute byte offset of a slot inside the mapped file.
	pub(crate) fn slot_offset(&self, line_nb: usize, elt_idx: usize) -> Result<usize> {
		if elt_idx >= self.nb_elements {
			return Err(Error::UnknownElement { name: format!("element index {elt_idx}") });
		}
		if line_nb >= self.line_count() {
			return Err(Error::inconsistency(format!(
				"line {line_nb} outside the allocation of column '{}'",
				self.name
			)));
		}
		let width = self.stored_type.stored_width();
		Ok(self.header_size + (line_nb * self.nb_elements + elt_idx) * width)
	}

	/// Fills lines `[from, to)` with the stored type's NA sentinel.
	fn init_na(&mut self, from: usize, to: usize) -> Result<()> {
		let width = self.stored_type.stored_width();
		let nb_elements = self.nb_elements;
		let header_size = self.header_size;
		let stored_type = self.stored_type;
		let slice = self.mapped.as_mut_slice()?;
		for slot in from * nb_elements..to * nb_elements {
			let offset = header_size + slot * width;
			match stored_type {
				Type::Bool => bytes::put_u8(slice, offset, BOOL_NA),
				Type::Char => bytes::put_u8(slice, offset, CHAR_NA),
				Type::Int => bytes::put_i32(slice, offset, INT_NA),
				Type::Float => bytes::put_f64(slice, offset, FLOAT_NA),
				_ => bytes::put_i64(slice, offset, INDEX_NA),
			}
		}
		Ok(())
	}
}

impl Drop for Column {
	fn drop(&mut self) {
		if let Err(err) = self.do_close() {
			warn!(name = %self.name, version = self.version, %err, "error closing column");
		}
	}
}
