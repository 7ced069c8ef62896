// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::{
	fs,
	path::PathBuf,
	time::{SystemTime, UNIX_EPOCH},
};

use seqdms_core::{Comments, Dms, Error, MappedFile, Result, round_up_to_page};
use seqdms_hash::HashTable;
use seqdms_store_column::{Column, ColumnSpec, ElementRef};
use seqdms_type::{Type, Value};
use tracing::{debug, warn};

use crate::{
	COUNT_COLUMN, DEFINITION_COLUMN, ID_COLUMN, ID_PREFIX, LINES_COLUMN_NAME, MERGED_SAMPLE_COLUMN,
	NUC_SEQUENCE_COLUMN, QUALITY_COLUMN, UNFINISHED_VIEW_EXTENSION, VIEW_EXTENSION, VIEW_TYPE_NUC_SEQS,
	layout,
	predicate::{Predicate, PredicateCheck},
};

/// A named logical table over aliased column references.
///
/// A view starts `Unfinished` (writable) and either finishes — validate,
/// publish by rename, flag everything read-only — or rolls back, deleting
/// every artifact it created itself. Finished views only reopen
/// read-only.
///
/// The in-memory handle owns its columns by index: a write may replace
/// the handle at an index with a fresh writable clone. The alias table is
/// regenerated from the column vector whenever it changes.
pub struct View {
	pub(crate) dms: Dms,
	pub(crate) mapped: MappedFile,
	pub(crate) read_only: bool,
	pub(crate) columns: Vec<Column>,
	pub(crate) alias_names: Vec<String>,
	pub(crate) aliases: HashTable<usize>,
	pub(crate) line_selection: Option<Column>,
	pub(crate) predicates: Vec<Predicate>,
	name: String,
	closed: bool,
}

fn finished_path(dms: &Dms, name: &str) -> PathBuf {
	dms.views_directory().join(format!("{name}.{VIEW_EXTENSION}"))
}

fn unfinished_path(dms: &Dms, name: &str) -> PathBuf {
	dms.views_directory().join(format!("{name}.{UNFINISHED_VIEW_EXTENSION}"))
}

fn now_seconds() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

fn validate_view_name(name: &str) -> Result<()> {
	if name.is_empty()
		|| name.len() >= layout::VIEW_NAME_WIDTH
		|| name.contains(['/', '\0'])
	{
		return Err(Error::inconsistency(format!("invalid view name: '{name}'")));
	}
	Ok(())
}

fn derived_predicates(view_type: &str) -> Vec<Predicate> {
	let mut predicates = vec![Predicate::QualityMatchesSequences];
	if view_type == VIEW_TYPE_NUC_SEQS {
		predicates.push(Predicate::HasNucSequenceColumn);
		predicates.push(Predicate::HasIdColumn);
		predicates.push(Predicate::HasDefinitionColumn);
	}
	predicates
}

impl View {
	/// Whether a view of this name exists, finished or in progress.
	pub fn exists(dms: &Dms, name: &str) -> bool {
		finished_path(dms, name).is_file() || unfinished_path(dms, name).is_file()
	}

	/// Creates a new, empty, writable view.
	pub fn create(dms: &Dms, name: &str, comments: &str) -> Result<View> {
		validate_view_name(name)?;
		if View::exists(dms, name) {
			return Err(Error::AlreadyExists { what: "view", name: name.to_string() });
		}

		let size = round_up_to_page(layout::COMMENTS + 2);
		let mut mapped = MappedFile::create(unfinished_path(dms, name), size)?;
		{
			let meta = mapped.as_mut_slice()?;
			layout::set_file_size(meta, size);
			layout::set_used_size(meta, layout::COMMENTS);
			layout::set_name(meta, name);
			layout::set_creation_date(meta, now_seconds());
			layout::set_finished(meta, false);
			layout::set_all_lines(meta, true);
			layout::set_line_count(meta, 0);
			layout::set_column_count(meta, 0);
			layout::set_created_from(meta, "");
			layout::set_view_type(meta, "");
			layout::set_line_selection(meta, None);
		}

		let mut view = View {
			dms: dms.clone(),
			mapped,
			read_only: false,
			columns: Vec::new(),
			alias_names: Vec::new(),
			aliases: HashTable::create(64),
			line_selection: None,
			predicates: derived_predicates(""),
			name: name.to_string(),
			closed: false,
		};
		view.write_comments(comments)?;
		debug!(name, "created view");
		Ok(view)
	}

	/// Creates a writable view cloned from a finished source view.
	///
	/// A fresh `line_selection` picks (and orders) source rows; its
	/// indices are composed through the source's own selection when one
	/// exists. Without a fresh selection, the source's selection column
	/// is reopened and reused as-is. All source columns are attached by
	/// reference under their aliases.
	pub fn clone_from(
		dms: &Dms,
		name: &str,
		source: &View,
		line_selection: Option<&[usize]>,
		comments: &str,
	) -> Result<View> {
		if !source.finished() {
			return Err(Error::inconsistency(format!(
				"view '{}' can not be cloned before it is finished",
				source.name
			)));
		}

		let mut view = View::create(dms, name, comments)?;
		view.predicates = derived_predicates(&source.view_type());
		{
			let view_type = source.view_type();
			let meta = view.metadata_mut()?;
			layout::set_view_type(meta, &view_type);
			layout::set_created_from(meta, &source.name);
		}

		match line_selection {
			Some(selected) => {
				let mut selection =
					Column::create(dms, &ColumnSpec::new(LINES_COLUMN_NAME, Type::Index))?;
				for (row, line) in selected.iter().enumerate() {
					if *line >= source.line_count() {
						return Err(Error::inconsistency(format!(
							"selected line {line} is beyond the {} lines of view '{}'",
							source.line_count(),
							source.name
						)));
					}
					let target = match &source.line_selection {
						Some(source_selection) => source_selection
							.get_index(*line, 0)?
							.ok_or_else(|| {
								Error::corrupt("line selection holds an undefined line number")
							})?,
						None => *line as i64,
					};
					selection.set_index(row, 0, target)?;
				}
				let meta = view.metadata_mut()?;
				layout::set_line_count(meta, selected.len());
				view.line_selection = Some(selection);
				view.save_selection_ref()?;
			}
			None => match &source.line_selection {
				Some(source_selection) => {
					let selection = Column::open(
						dms,
						source_selection.name(),
						source_selection.version(),
					)?;
					let line_count = source.line_count();
					let meta = view.metadata_mut()?;
					layout::set_line_count(meta, line_count);
					view.line_selection = Some(selection);
					view.save_selection_ref()?;
				}
				None => {
					let line_count = source.line_count();
					let meta = view.metadata_mut()?;
					layout::set_line_count(meta, line_count);
				}
			},
		}

		view.add_comment("Cloned from", &source.name)?;
		for (idx, column) in source.columns.iter().enumerate() {
			view.attach_column(column.name(), column.version(), Some(&source.alias_names[idx]))?;
		}
		debug!(name, source = %source.name, "cloned view");
		Ok(view)
	}

	/// Creates a nucleotide sequences view with its obligatory columns
	/// (`NUC_SEQ`, `ID`, `DEFINITION`, and optionally `QUALITY`
	/// associated both ways with `NUC_SEQ`).
	pub fn create_nuc_seqs(dms: &Dms, name: &str, quality_column: bool, comments: &str) -> Result<View> {
		let mut view = View::create(dms, name, comments)?;
		layout::set_view_type(view.metadata_mut()?, VIEW_TYPE_NUC_SEQS);
		view.predicates = derived_predicates(VIEW_TYPE_NUC_SEQS);

		view.create_column(&ColumnSpec::new(NUC_SEQUENCE_COLUMN, Type::Seq), None)?;
		view.create_column(&ColumnSpec::new(ID_COLUMN, Type::Str), None)?;
		view.create_column(&ColumnSpec::new(DEFINITION_COLUMN, Type::Str), None)?;
		if quality_column {
			let (nuc_name, nuc_version) = {
				let nuc = view.column(NUC_SEQUENCE_COLUMN)?;
				(nuc.name().to_string(), nuc.version())
			};
			let mut spec = ColumnSpec::new(QUALITY_COLUMN, Type::Qual);
			spec.associated_column = Some((nuc_name, nuc_version));
			view.create_column(&spec, None)?;
			let (qual_name, qual_version) = {
				let qual = view.column(QUALITY_COLUMN)?;
				(qual.name().to_string(), qual.version())
			};
			let nuc_idx = view.column_index(NUC_SEQUENCE_COLUMN)?;
			view.columns[nuc_idx].set_associated_column(&qual_name, qual_version)?;
		}
		Ok(view)
	}

	/// Opens a finished view read-only.
	pub fn open(dms: &Dms, name: &str) -> Result<View> {
		let path = finished_path(dms, name);
		if !path.is_file() {
			return Err(Error::NotFound { what: "view", name: name.to_string() });
		}
		let mapped = MappedFile::open_ro(&path)?;
		if mapped.len() < layout::COMMENTS {
			return Err(Error::corrupt(format!("view file '{name}' shorter than its fixed layout")));
		}
		let meta = mapped.as_slice();
		let column_count = layout::get_column_count(meta);
		if column_count > layout::MAX_COLUMN_REFS {
			return Err(Error::corrupt(format!("view file '{name}' counts too many columns")));
		}

		let mut columns = Vec::with_capacity(column_count);
		let mut alias_names = Vec::with_capacity(column_count);
		let mut aliases = HashTable::create(column_count.max(16));
		for idx in 0..column_count {
			let column_ref = layout::get_column_ref(meta, idx);
			columns.push(Column::open(dms, &column_ref.column_name, column_ref.version)?);
			aliases.set(&column_ref.alias, idx);
			alias_names.push(column_ref.alias);
		}

		let line_selection = if layout::get_all_lines(meta) {
			None
		} else {
			let (selection_name, selection_version) = layout::get_line_selection(meta)
				.ok_or_else(|| Error::corrupt(format!("view file '{name}' lost its line selection")))?;
			Some(Column::open(dms, &selection_name, selection_version)?)
		};

		let view_type = layout::get_view_type(meta);
		Ok(View {
			dms: dms.clone(),
			mapped,
			read_only: true,
			columns,
			alias_names,
			aliases,
			line_selection,
			predicates: derived_predicates(&view_type),
			name: name.to_string(),
			closed: false,
		})
	}

	/// Removes a finished view's metadata file (never its columns).
	pub fn delete(dms: &Dms, name: &str) -> Result<()> {
		let path = finished_path(dms, name);
		if !path.is_file() {
			return Err(Error::NotFound { what: "view", name: name.to_string() });
		}
		fs::remove_file(path)?;
		Ok(())
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn finished(&self) -> bool {
		layout::get_finished(self.metadata())
	}

	pub fn read_only(&self) -> bool {
		self.read_only
	}

	pub fn line_count(&self) -> usize {
		layout::get_line_count(self.metadata())
	}

	pub fn column_count(&self) -> usize {
		self.columns.len()
	}

	pub fn all_lines(&self) -> bool {
		self.line_selection.is_none()
	}

	pub fn view_type(&self) -> String {
		layout::get_view_type(self.metadata())
	}

	pub fn created_from(&self) -> Option<String> {
		let created_from = layout::get_created_from(self.metadata());
		if created_from.is_empty() { None } else { Some(created_from) }
	}

	pub fn creation_date(&self) -> i64 {
		layout::get_creation_date(self.metadata())
	}

	pub fn aliases(&self) -> &[String] {
		&self.alias_names
	}

	pub fn has_column(&self, alias: &str) -> bool {
		self.aliases.get(alias).is_some()
	}

	pub fn column(&self, alias: &str) -> Result<&Column> {
		Ok(&self.columns[self.column_index(alias)?])
	}

	pub(crate) fn column_index(&self, alias: &str) -> Result<usize> {
		self.aliases.get(alias).copied().ok_or_else(|| Error::UnknownAlias { alias: alias.to_string() })
	}

	/// Registers an extra predicate to be validated at finish time.
	pub fn add_predicate(&mut self, predicate: Predicate) {
		self.predicates.push(predicate);
	}

	/// Attaches an existing column version under `alias` (defaulting to
	/// the column name).
	///
	/// With a line selection the column must already span the view's
	/// lines; without one, the first column adopts its `lines_used` as
	/// the view line count and later columns must match it exactly.
	pub fn attach_column(&mut self, column_name: &str, version: i32, alias: Option<&str>) -> Result<()> {
		self.require_writable()?;
		let alias = match alias {
			Some(alias) if !alias.is_empty() => alias.to_string(),
			_ => column_name.to_string(),
		};
		self.require_free_alias(&alias)?;

		let column = Column::open(&self.dms, column_name, version)?;
		if self.line_selection.is_some() {
			if column.lines_used() < self.line_count() {
				return Err(Error::inconsistency(format!(
					"column '{column_name}' spans {} lines, fewer than the {} lines of view '{}'",
					column.lines_used(),
					self.line_count(),
					self.name
				)));
			}
		} else if self.columns.is_empty() {
			layout::set_line_count(self.metadata_mut()?, column.lines_used());
		} else if column.lines_used() != self.line_count() {
			return Err(Error::inconsistency(format!(
				"column '{column_name}' spans {} lines but view '{}' has {}",
				column.lines_used(),
				self.name,
				self.line_count()
			)));
		}

		self.push_column(column, alias)
	}

	/// Creates a fresh column version and adds it to the view under
	/// `alias` (defaulting to the column name).
	///
	/// A pending line selection is materialized first — every attached
	/// column is cloned through it — because a freshly created column
	/// has no selection to honor.
	pub fn create_column(&mut self, spec: &ColumnSpec, alias: Option<&str>) -> Result<()> {
		self.require_writable()?;
		let alias = match alias {
			Some(alias) if !alias.is_empty() => alias.to_string(),
			_ => spec.name.clone(),
		};
		self.require_free_alias(&alias)?;

		if self.line_selection.is_some() {
			self.clone_columns_for_write(None)?;
		}

		let mut nb_lines = spec.nb_lines;
		if self.line_count() > nb_lines {
			nb_lines = self.line_count();
		} else if nb_lines > self.line_count() {
			self.update_lines(nb_lines)?;
		}

		let mut spec = spec.clone();
		spec.nb_lines = nb_lines;
		let mut column = Column::create(&self.dms, &spec)?;
		column.set_lines_used(nb_lines)?;
		self.push_column(column, alias)
	}

	/// Removes a column from the view. `delete_file` additionally
	/// removes the backing file when the view itself created it.
	pub fn delete_column(&mut self, alias: &str, delete_file: bool) -> Result<()> {
		self.require_writable()?;
		let idx = self.column_index(alias)?;
		let column = self.columns.remove(idx);
		self.alias_names.remove(idx);
		if delete_file && column.writable() {
			column.delete()?;
		} else {
			column.close()?;
		}
		self.refresh_refs()
	}

	/// Renames the alias of a column.
	pub fn rename_column(&mut self, alias: &str, new_alias: &str) -> Result<()> {
		self.require_writable()?;
		if new_alias.is_empty() || new_alias.len() >= layout::ALIAS_WIDTH {
			return Err(Error::inconsistency(format!("invalid alias: '{new_alias}'")));
		}
		let idx = self.column_index(alias)?;
		self.require_free_alias(new_alias)?;
		self.alias_names[idx] = new_alias.to_string();
		self.refresh_refs()
	}

	/// Clones the named column into a fresh writable version and hands
	/// back its index; with a line selection in place, every column is
	/// cloned (the selection applies uniformly) and the selection is
	/// discarded, now baked into the data.
	pub fn clone_column_for_write(&mut self, alias: &str) -> Result<&Column> {
		let idx = self.column_index(alias)?;
		if self.line_selection.is_some() || !self.columns[idx].writable() {
			self.clone_columns_for_write(Some(idx))?;
		}
		Ok(&self.columns[idx])
	}

	fn push_column(&mut self, column: Column, alias: String) -> Result<()> {
		if alias.len() >= layout::ALIAS_WIDTH {
			return Err(Error::inconsistency(format!("invalid alias: '{alias}'")));
		}
		if self.columns.len() >= layout::MAX_COLUMN_REFS {
			return Err(Error::inconsistency(format!(
				"a view holds at most {} columns",
				layout::MAX_COLUMN_REFS
			)));
		}
		self.columns.push(column);
		self.alias_names.push(alias);
		self.refresh_refs()
	}

	fn require_free_alias(&self, alias: &str) -> Result<()> {
		if self.aliases.get(alias).is_some() {
			return Err(Error::inconsistency(format!(
				"alias '{alias}' is already used in view '{}'",
				self.name
			)));
		}
		Ok(())
	}

	pub(crate) fn require_writable(&self) -> Result<()> {
		if self.read_only {
			return Err(Error::read_only(format!("view '{}'", self.name)));
		}
		Ok(())
	}

	/// Rewrites the persisted reference array and regenerates the alias
	/// table from the column vector.
	fn refresh_refs(&mut self) -> Result<()> {
		let refs: Vec<layout::ColumnRef> = self
			.columns
			.iter()
			.zip(&self.alias_names)
			.map(|(column, alias)| layout::ColumnRef {
				column_name: column.name().to_string(),
				version: column.version(),
				alias: alias.clone(),
			})
			.collect();
		let meta = self.mapped.as_mut_slice()?;
		for (idx, column_ref) in refs.iter().enumerate() {
			layout::set_column_ref(meta, idx, column_ref)?;
		}
		layout::set_column_count(meta, refs.len());

		let mut aliases = HashTable::create(self.alias_names.len().max(16));
		for (idx, alias) in self.alias_names.iter().enumerate() {
			aliases.set(alias, idx);
		}
		self.aliases = aliases;
		Ok(())
	}

	fn save_selection_ref(&mut self) -> Result<()> {
		let selection = self.line_selection.as_ref().map(|s| (s.name().to_string(), s.version()));
		let meta = self.mapped.as_mut_slice()?;
		match &selection {
			Some((name, version)) => {
				layout::set_line_selection(meta, Some((name, *version)));
				layout::set_all_lines(meta, false);
			}
			None => {
				layout::set_line_selection(meta, None);
				layout::set_all_lines(meta, true);
			}
		}
		Ok(())
	}

	/// Clones columns into fresh writable versions: the single `target`
	/// when no selection exists, every column (permuted) when one does.
	/// Associated column pairs are re-linked both ways; a baked-in
	/// selection is closed and cleared.
	fn clone_columns_for_write(&mut self, target: Option<usize>) -> Result<()> {
		self.require_writable()?;
		let has_selection = self.line_selection.is_some();
		let old_refs: Vec<(String, i32)> =
			self.columns.iter().map(|c| (c.name().to_string(), c.version())).collect();
		let old_assoc: Vec<Option<(String, i32)>> =
			self.columns.iter().map(|c| c.associated_column()).collect();
		let mut cloned = vec![false; self.columns.len()];

		for idx in 0..self.columns.len() {
			// With a selection every column is re-cloned (the data must
			// be permuted); without one, only a read-only target.
			let must_clone = if has_selection {
				true
			} else {
				target == Some(idx) && !self.columns[idx].writable()
			};
			if !must_clone {
				continue;
			}
			self.replace_with_clone(idx, &old_refs)?;
			cloned[idx] = true;
		}

		// Re-link associated pairs among the new versions; without a
		// selection the partner is cloned on demand.
		for idx in 0..self.columns.len() {
			if !cloned[idx] {
				continue;
			}
			let Some((assoc_name, assoc_version)) = &old_assoc[idx] else { continue };
			let partner = old_refs
				.iter()
				.position(|(name, version)| name == assoc_name && *version == *assoc_version)
				.ok_or_else(|| {
					Error::inconsistency(format!(
						"associated column '{assoc_name}' is not part of view '{}'",
						self.name
					))
				})?;
			if !cloned[partner] && !self.columns[partner].writable() {
				self.replace_with_clone(partner, &old_refs)?;
				cloned[partner] = true;
			}
			let (partner_name, partner_version) =
				(self.columns[partner].name().to_string(), self.columns[partner].version());
			let (own_name, own_version) =
				(self.columns[idx].name().to_string(), self.columns[idx].version());
			self.columns[idx].set_associated_column(&partner_name, partner_version)?;
			self.columns[partner].set_associated_column(&own_name, own_version)?;
		}

		if has_selection {
			if let Some(selection) = self.line_selection.take() {
				selection.close()?;
			}
			self.save_selection_ref()?;
		}
		self.refresh_refs()
	}

	fn replace_with_clone(&mut self, idx: usize, old_refs: &[(String, i32)]) -> Result<()> {
		let (name, version) = &old_refs[idx];
		let clone = Column::clone_column(&self.dms, self.line_selection.as_ref(), name, *version, true)?;
		let old = std::mem::replace(&mut self.columns[idx], clone);
		old.close()
	}

	/// Grows every column of the view to `line_count` lines (cloning any
	/// that are not writable) and adopts it as the view line count.
	pub fn update_lines(&mut self, line_count: usize) -> Result<()> {
		self.require_writable()?;
		for idx in 0..self.columns.len() {
			if self.line_selection.is_some() || !self.columns[idx].writable() {
				self.clone_columns_for_write(Some(idx))?;
			}
			let column = &mut self.columns[idx];
			while line_count > column.line_count() {
				column.enlarge()?;
			}
			column.set_lines_used(line_count)?;
		}
		layout::set_line_count(self.metadata_mut()?, line_count);
		Ok(())
	}

	/// Readies a write to `alias` at `line_nb`: rejects read-only views,
	/// clones the target (or, with a selection, everything), and grows
	/// the whole view when writing past its line count. Returns the
	/// index of the (possibly replaced) column handle.
	pub(crate) fn prepare_to_set_value(&mut self, alias: &str, line_nb: usize) -> Result<usize> {
		self.require_writable()?;
		let idx = self.column_index(alias)?;
		if self.line_selection.is_some() || !self.columns[idx].writable() {
			self.clone_columns_for_write(Some(idx))?;
		}
		if line_nb + 1 > self.line_count() {
			self.update_lines(line_nb + 1)?;
		}
		Ok(idx)
	}

	/// Translates a view line to an underlying column line, through the
	/// line selection when one exists.
	pub(crate) fn prepare_to_get_value(&self, line_nb: usize) -> Result<usize> {
		if line_nb + 1 > self.line_count() {
			return Err(Error::inconsistency(format!(
				"line {line_nb} is beyond the {} lines of view '{}'",
				self.line_count(),
				self.name
			)));
		}
		match &self.line_selection {
			Some(selection) => {
				let target = selection
					.get_index(line_nb, 0)?
					.ok_or_else(|| Error::corrupt("line selection holds an undefined line number"))?;
				if target < 0 {
					return Err(Error::corrupt("negative line number in line selection"));
				}
				Ok(target as usize)
			}
			None => Ok(line_nb),
		}
	}

	/// A human-readable one-stop description of the view.
	pub fn formatted_infos(&self, detailed: bool) -> String {
		let mut infos = format!(
			"view '{}': {} line(s), {} column(s){}",
			self.name,
			self.line_count(),
			self.columns.len(),
			if self.finished() { ", finished" } else { "" },
		);
		if !self.view_type().is_empty() {
			infos.push_str(&format!(", type {}", self.view_type()));
		}
		if let Some(created_from) = self.created_from() {
			infos.push_str(&format!(", created from '{created_from}'"));
		}
		for (column, alias) in self.columns.iter().zip(&self.alias_names) {
			infos.push_str(&format!("\n\t{alias} -> {}", column.formatted_infos(detailed)));
		}
		if detailed {
			infos.push_str(&format!("\n\tcomments: {}", layout::get_comments(self.metadata())));
		}
		infos
	}

	pub fn comments(&self) -> Result<Comments> {
		Comments::parse(&layout::get_comments(self.metadata()))
	}

	/// Replaces the view comments; empty text means the empty object.
	pub fn write_comments(&mut self, comments: &str) -> Result<()> {
		self.require_writable()?;
		let comments = Comments::parse(comments)?;
		self.write_comments_json(&comments.to_json())
	}

	/// Merges `key: value` into the view comments, growing the metadata
	/// file when they no longer fit.
	pub fn add_comment(&mut self, key: &str, value: &str) -> Result<()> {
		self.require_writable()?;
		let mut comments = self.comments()?;
		comments.add_key_value(key, value);
		self.write_comments_json(&comments.to_json())
	}

	fn add_comment_json(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
		let mut comments = self.comments()?;
		comments.add_key_value(key, value);
		self.write_comments_json(&comments.to_json())
	}

	fn write_comments_json(&mut self, json: &str) -> Result<()> {
		let needed = layout::COMMENTS + json.len() + 1;
		if needed > self.mapped.len() {
			let new_size = round_up_to_page(needed);
			self.mapped.resize(new_size)?;
			layout::set_file_size(self.mapped.as_mut_slice()?, new_size);
		}
		let meta = self.mapped.as_mut_slice()?;
		meta[layout::COMMENTS..].fill(0);
		meta[layout::COMMENTS..layout::COMMENTS + json.len()].copy_from_slice(json.as_bytes());
		layout::set_used_size(meta, layout::COMMENTS + json.len());
		Ok(())
	}

	fn metadata(&self) -> &[u8] {
		self.mapped.as_slice()
	}

	fn metadata_mut(&mut self) -> Result<&mut [u8]> {
		self.mapped.as_mut_slice()
	}

	/// Validates and publishes the view.
	///
	/// Order matters: auto columns for nucleotide views, then the
	/// predicate gate (any failure rolls everything back), then metadata
	/// persistence and the rename from the unfinished to the published
	/// name, and finally the permanent `finished` flags on every owned
	/// column, the line selection, and the view itself.
	pub fn finish(mut self) -> Result<()> {
		self.require_writable()?;

		if self.view_type() == VIEW_TYPE_NUC_SEQS {
			if !self.has_column(COUNT_COLUMN) && !self.has_column(MERGED_SAMPLE_COLUMN) {
				self.create_auto_count_column()?;
			}
			if !self.has_column(ID_COLUMN) {
				self.create_auto_id_column(ID_PREFIX)?;
			}
		}

		let predicates = std::mem::take(&mut self.predicates);
		let mut held = Vec::new();
		for predicate in &predicates {
			match predicate.check(&self) {
				Ok(PredicateCheck::Holds(description)) => held.push(description),
				Ok(PredicateCheck::NotApplicable) => {}
				Ok(PredicateCheck::Failed(description)) => {
					warn!(view = %self.name, %description, "predicate failed, rolling back");
					self.rollback_inner()?;
					return Err(Error::PredicateFailed { description });
				}
				Err(err) => {
					warn!(view = %self.name, %err, "predicate evaluation failed, rolling back");
					self.rollback_inner()?;
					return Err(err);
				}
			}
		}

		self.save_selection_ref()?;
		self.refresh_refs()?;
		if !held.is_empty() {
			self.add_comment_json("predicates", serde_json::Value::from(held))?;
		}
		self.add_comment("Date created", &now_seconds().to_string())?;
		self.mapped.flush()?;

		fs::rename(unfinished_path(&self.dms, &self.name), finished_path(&self.dms, &self.name))?;

		for column in &mut self.columns {
			if column.writable() {
				column.set_finished()?;
			}
		}
		if let Some(selection) = &mut self.line_selection {
			if selection.writable() {
				selection.set_finished()?;
			}
		}
		layout::set_finished(self.metadata_mut()?, true);
		self.mapped.flush()?;
		self.read_only = true;
		debug!(name = %self.name, "finished view");
		self.close_inner()
	}

	/// Abandons an unfinished view: deletes every column file the view
	/// itself created (never attached-by-reference columns), the
	/// self-created line selection, and the unfinished metadata file.
	/// On a finished view this is a plain close.
	pub fn rollback(mut self) -> Result<()> {
		if self.read_only {
			return self.close_inner();
		}
		self.rollback_inner()
	}

	fn rollback_inner(&mut self) -> Result<()> {
		self.closed = true;
		let mut first_error = None;
		for column in self.columns.drain(..) {
			let result = if column.writable() { column.delete() } else { column.close() };
			if let Err(err) = result {
				warn!(view = %self.name, %err, "error discarding a column during rollback");
				first_error.get_or_insert(err);
			}
		}
		if let Some(selection) = self.line_selection.take() {
			let result = if selection.writable() { selection.delete() } else { selection.close() };
			if let Err(err) = result {
				warn!(view = %self.name, %err, "error discarding the line selection during rollback");
				first_error.get_or_insert(err);
			}
		}
		self.alias_names.clear();
		self.aliases = HashTable::create(1);
		if let Err(err) = fs::remove_file(unfinished_path(&self.dms, &self.name)) {
			first_error.get_or_insert(Error::Io(err));
		}
		debug!(name = %self.name, "rolled back view");
		match first_error {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	/// Closes every column handle and the metadata mapping without
	/// persisting or validating anything.
	pub fn close(mut self) -> Result<()> {
		self.close_inner()
	}

	fn close_inner(&mut self) -> Result<()> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		let mut first_error = None;
		for column in self.columns.drain(..) {
			if let Err(err) = column.close() {
				first_error.get_or_insert(err);
			}
		}
		if let Some(selection) = self.line_selection.take() {
			if let Err(err) = selection.close() {
				first_error.get_or_insert(err);
			}
		}
		if self.mapped.writable() {
			if let Err(err) = self.mapped.flush() {
				first_error.get_or_insert(err);
			}
		}
		match first_error {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	fn create_auto_count_column(&mut self) -> Result<()> {
		self.create_column(&ColumnSpec::new(COUNT_COLUMN, Type::Int), None)?;
		for line in 0..self.line_count() {
			self.set_int(COUNT_COLUMN, line, 0, 1)?;
		}
		Ok(())
	}

	fn create_auto_id_column(&mut self, prefix: &str) -> Result<()> {
		if self.has_column(ID_COLUMN) {
			self.delete_column(ID_COLUMN, false)?;
		}
		self.create_column(&ColumnSpec::new(ID_COLUMN, Type::Str), None)?;
		for line in 0..self.line_count() {
			self.set_str(ID_COLUMN, line, 0, &format!("{prefix}_{line}"))?;
		}
		Ok(())
	}
}

impl View {
	pub fn set_na<'a>(&mut self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_na(line_nb, elt)
	}

	pub fn set_bool<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: bool,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_bool(line_nb, elt, value)
	}

	pub fn get_bool<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<bool>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_bool(line, elt)
	}

	pub fn set_char<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: char,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_char(line_nb, elt, value)
	}

	pub fn get_char<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<char>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_char(line, elt)
	}

	pub fn set_int<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: i32,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_int(line_nb, elt, value)
	}

	pub fn get_int<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<i32>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_int(line, elt)
	}

	pub fn set_float<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: f64,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_float(line_nb, elt, value)
	}

	pub fn get_float<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<f64>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_float(line, elt)
	}

	pub fn set_index<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: i64,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_index(line_nb, elt, value)
	}

	pub fn get_index<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<i64>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_index(line, elt)
	}

	pub fn set_str<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: &str,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_str(line_nb, elt, value)
	}

	pub fn get_str<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<String>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_str(line, elt)
	}

	pub fn set_seq<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: &str,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_seq(line_nb, elt, value)
	}

	pub fn get_seq<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<String>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_seq(line, elt)
	}

	pub fn set_qual<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: &[u8],
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_qual(line_nb, elt, value)
	}

	pub fn get_qual<'a>(
		&self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
	) -> Result<Option<Vec<u8>>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_qual(line, elt)
	}

	pub fn set_blob<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: &[u8],
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_blob(line_nb, elt, value)
	}

	pub fn get_blob<'a>(
		&self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
	) -> Result<Option<Vec<u8>>> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].get_blob(line, elt)
	}

	pub fn set_value<'a>(
		&mut self,
		alias: &str,
		line_nb: usize,
		elt: impl Into<ElementRef<'a>>,
		value: &Value,
	) -> Result<()> {
		let idx = self.prepare_to_set_value(alias, line_nb)?;
		self.columns[idx].set_value(line_nb, elt, value)
	}

	pub fn value<'a>(&self, alias: &str, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Value> {
		let idx = self.column_index(alias)?;
		let line = self.prepare_to_get_value(line_nb)?;
		self.columns[idx].value(line, elt)
	}
}

impl Drop for View {
	fn drop(&mut self) {
		if let Err(err) = self.close_inner() {
			warn!(name = %self.name, %err, "error closing view");
		}
	}
}

#[cfg(test)]
mod tests {
	use seqdms_store_column::column_file_path;
	use seqdms_testing::temp_dir;

	use super::*;

	fn store(path: &std::path::Path) -> Dms {
		Dms::create(path.join("store")).unwrap()
	}

	#[test]
	fn test_create_and_finish_empty_view() {
		temp_dir(|path| {
			let dms = store(path);
			let view = View::create(&dms, "empty", "").unwrap();
			assert_eq!(view.line_count(), 0);
			assert_eq!(view.column_count(), 0);
			view.finish().unwrap();

			let reopened = View::open(&dms, "empty").unwrap();
			assert!(reopened.finished());
			assert!(reopened.read_only());
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_duplicate_view_name_rejected() {
		temp_dir(|path| {
			let dms = store(path);
			let _first = View::create(&dms, "v", "").unwrap();
			assert!(matches!(View::create(&dms, "v", ""), Err(Error::AlreadyExists { .. })));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_first_column_adopts_line_count() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			view.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			view.set_int("count", 4, 0, 1).unwrap();
			assert_eq!(view.line_count(), 5);
			view.finish().unwrap();

			// A second view attaching that column adopts its line count.
			let mut other = View::create(&dms, "w", "").unwrap();
			other.attach_column("count", -1, None).unwrap();
			assert_eq!(other.line_count(), 5);
			other.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_attach_mismatched_line_count_rejected() {
		temp_dir(|path| {
			let dms = store(path);
			let mut setup = View::create(&dms, "setup", "").unwrap();
			setup.create_column(&ColumnSpec::new("a", Type::Int), None).unwrap();
			setup.set_int("a", 2, 0, 1).unwrap();
			setup.create_column(&ColumnSpec::new("b", Type::Int), None).unwrap();
			setup.finish().unwrap();

			let mut lone = View::create(&dms, "lone", "").unwrap();
			lone.create_column(&ColumnSpec::new("short", Type::Int), None).unwrap();
			lone.set_int("short", 0, 0, 1).unwrap();
			lone.finish().unwrap();

			let mut view = View::create(&dms, "v", "").unwrap();
			view.attach_column("a", -1, None).unwrap();
			assert_eq!(view.line_count(), 3);
			assert!(matches!(
				view.attach_column("short", -1, None),
				Err(Error::Inconsistency(_))
			));
			assert_eq!(view.column_count(), 1);
			view.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_duplicate_alias_rejected() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			view.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			let before = view.column_count();
			assert!(matches!(
				view.create_column(&ColumnSpec::new("other", Type::Int), Some("count")),
				Err(Error::Inconsistency(_))
			));
			assert_eq!(view.column_count(), before);
			view.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_unknown_alias() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			assert!(matches!(view.set_int("ghost", 0, 0, 1), Err(Error::UnknownAlias { .. })));
			view.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_line_selection_routing() {
		temp_dir(|path| {
			let dms = store(path);
			let mut v1 = View::create(&dms, "v1", "").unwrap();
			v1.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			for line in 0..5 {
				v1.set_int("count", line, 0, line as i32 * 10).unwrap();
			}
			v1.finish().unwrap();

			let v1 = View::open(&dms, "v1").unwrap();
			let v2 = View::clone_from(&dms, "v2", &v1, Some(&[3, 1, 4]), "").unwrap();
			assert_eq!(v2.line_count(), 3);
			assert!(!v2.all_lines());
			assert_eq!(v2.get_int("count", 0, 0).unwrap(), Some(30));
			assert_eq!(v2.get_int("count", 1, 0).unwrap(), Some(10));
			assert_eq!(v2.get_int("count", 2, 0).unwrap(), Some(40));
			v2.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_selection_composes_through_source_selection() {
		temp_dir(|path| {
			let dms = store(path);
			let mut v1 = View::create(&dms, "v1", "").unwrap();
			v1.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			for line in 0..5 {
				v1.set_int("count", line, 0, line as i32).unwrap();
			}
			v1.finish().unwrap();

			let v1 = View::open(&dms, "v1").unwrap();
			// v2 sees [3, 1, 4]; v3 selects rows [2, 0] of v2 = [4, 3].
			View::clone_from(&dms, "v2", &v1, Some(&[3, 1, 4]), "").unwrap().finish().unwrap();
			let v2 = View::open(&dms, "v2").unwrap();
			let v3 = View::clone_from(&dms, "v3", &v2, Some(&[2, 0]), "").unwrap();
			assert_eq!(v3.line_count(), 2);
			assert_eq!(v3.get_int("count", 0, 0).unwrap(), Some(4));
			assert_eq!(v3.get_int("count", 1, 0).unwrap(), Some(3));
			v3.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_selection_beyond_source_rejected() {
		temp_dir(|path| {
			let dms = store(path);
			let mut v1 = View::create(&dms, "v1", "").unwrap();
			v1.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			v1.set_int("count", 0, 0, 1).unwrap();
			v1.finish().unwrap();

			let v1 = View::open(&dms, "v1").unwrap();
			assert!(View::clone_from(&dms, "v2", &v1, Some(&[7]), "").is_err());
			Ok(())
		})
		.unwrap();
	}

	// Writing into a cloned view clones the touched column (and, with a
	// selection, every column) without mutating the source version.
	#[test]
	fn test_write_through_clone_is_isolated() {
		temp_dir(|path| {
			let dms = store(path);
			let mut v1 = View::create(&dms, "v1", "").unwrap();
			v1.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			v1.set_int("count", 0, 0, 1).unwrap();
			v1.set_int("count", 1, 0, 2).unwrap();
			v1.finish().unwrap();
			let frozen = std::fs::read(column_file_path(&dms, "count", 0)).unwrap();

			let v1 = View::open(&dms, "v1").unwrap();
			let mut v2 = View::clone_from(&dms, "v2", &v1, None, "").unwrap();
			v2.set_int("count", 0, 0, 99).unwrap();
			assert_eq!(v2.column("count").unwrap().version(), 1);
			assert_eq!(v2.get_int("count", 0, 0).unwrap(), Some(99));
			v2.finish().unwrap();

			assert_eq!(std::fs::read(column_file_path(&dms, "count", 0)).unwrap(), frozen);
			assert_eq!(v1.get_int("count", 0, 0).unwrap(), Some(1));
			Ok(())
		})
		.unwrap();
	}

	// Writing through a selection first materializes it into cloned,
	// permuted columns; the selection is then gone.
	#[test]
	fn test_write_through_selection_materializes() {
		temp_dir(|path| {
			let dms = store(path);
			let mut v1 = View::create(&dms, "v1", "").unwrap();
			v1.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			for line in 0..5 {
				v1.set_int("count", line, 0, line as i32).unwrap();
			}
			v1.finish().unwrap();

			let v1 = View::open(&dms, "v1").unwrap();
			let mut v2 = View::clone_from(&dms, "v2", &v1, Some(&[3, 1]), "").unwrap();
			v2.set_int("count", 0, 0, 30).unwrap();
			assert!(v2.all_lines());
			assert_eq!(v2.line_count(), 2);
			assert_eq!(v2.get_int("count", 0, 0).unwrap(), Some(30));
			assert_eq!(v2.get_int("count", 1, 0).unwrap(), Some(1));
			v2.finish().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_growing_view_grows_every_column() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			view.create_column(&ColumnSpec::new("a", Type::Int), None).unwrap();
			view.create_column(&ColumnSpec::new("b", Type::Str), None).unwrap();
			view.set_int("a", 9, 0, 1).unwrap();
			assert_eq!(view.line_count(), 10);
			assert_eq!(view.column("b").unwrap().lines_used(), 10);
			assert_eq!(view.get_str("b", 9, 0).unwrap(), None);
			view.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_rollback_removes_created_columns_only() {
		temp_dir(|path| {
			let dms = store(path);
			let mut keeper = View::create(&dms, "keeper", "").unwrap();
			keeper.create_column(&ColumnSpec::new("shared", Type::Int), None).unwrap();
			keeper.set_int("shared", 0, 0, 1).unwrap();
			keeper.finish().unwrap();

			let mut view = View::create(&dms, "doomed", "").unwrap();
			view.attach_column("shared", -1, None).unwrap();
			view.create_column(&ColumnSpec::new("own", Type::Int), None).unwrap();
			view.rollback().unwrap();

			assert!(column_file_path(&dms, "shared", 0).is_file());
			assert!(!column_file_path(&dms, "own", 0).exists());
			assert!(!View::exists(&dms, "doomed"));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_failed_predicate_rolls_back() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			view.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			view.set_int("count", 0, 0, 1).unwrap();
			// The view has no identifier column, so this must fail.
			view.add_predicate(Predicate::HasIdColumn);
			let err = view.finish().unwrap_err();
			assert!(matches!(err, Error::PredicateFailed { .. }));

			assert!(!View::exists(&dms, "v"));
			assert!(!column_file_path(&dms, "count", 0).exists());
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_nuc_seqs_view_auto_columns() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create_nuc_seqs(&dms, "reads", false, "").unwrap();
			view.set_seq(NUC_SEQUENCE_COLUMN, 0, 0, "ACGT").unwrap();
			view.set_seq(NUC_SEQUENCE_COLUMN, 1, 0, "TTGA").unwrap();
			// Drop the default id column so finish() has to rebuild it.
			view.delete_column(ID_COLUMN, true).unwrap();
			view.finish().unwrap();

			let reopened = View::open(&dms, "reads").unwrap();
			assert_eq!(reopened.view_type(), VIEW_TYPE_NUC_SEQS);
			assert_eq!(reopened.get_int(COUNT_COLUMN, 0, 0).unwrap(), Some(1));
			assert_eq!(reopened.get_int(COUNT_COLUMN, 1, 0).unwrap(), Some(1));
			assert_eq!(reopened.get_str(ID_COLUMN, 0, 0).unwrap().as_deref(), Some("seq_0"));
			assert_eq!(reopened.get_str(ID_COLUMN, 1, 0).unwrap().as_deref(), Some("seq_1"));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_quality_predicate_rejects_length_mismatch() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create_nuc_seqs(&dms, "reads", true, "").unwrap();
			view.set_seq(NUC_SEQUENCE_COLUMN, 0, 0, "ACGT").unwrap();
			view.set_qual(QUALITY_COLUMN, 0, 0, &[40, 40, 40]).unwrap();
			let err = view.finish().unwrap_err();
			assert!(matches!(err, Error::PredicateFailed { .. }));
			assert!(!View::exists(&dms, "reads"));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_quality_predicate_accepts_matching_lengths() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create_nuc_seqs(&dms, "reads", true, "").unwrap();
			view.set_seq(NUC_SEQUENCE_COLUMN, 0, 0, "ACGT").unwrap();
			view.set_qual(QUALITY_COLUMN, 0, 0, &[40, 40, 38, 37]).unwrap();
			view.finish().unwrap();

			let reopened = View::open(&dms, "reads").unwrap();
			assert_eq!(reopened.get_qual(QUALITY_COLUMN, 0, 0).unwrap(), Some(vec![40, 40, 38, 37]));
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_rename_column_alias() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			view.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			view.set_int("count", 0, 0, 7).unwrap();
			view.rename_column("count", "reads").unwrap();
			assert_eq!(view.get_int("reads", 0, 0).unwrap(), Some(7));
			assert!(!view.has_column("count"));
			view.rollback().unwrap();
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_comments_grow_past_initial_allocation() {
		temp_dir(|path| {
			let dms = store(path);
			let mut view = View::create(&dms, "v", "").unwrap();
			let long = "x".repeat(3 * seqdms_core::page_size());
			view.add_comment("annotation", &long).unwrap();
			view.finish().unwrap();

			let reopened = View::open(&dms, "v").unwrap();
			assert_eq!(
				reopened.comments().unwrap().get("annotation").unwrap().as_str().unwrap(),
				long
			);
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_read_only_view_rejects_mutation() {
		temp_dir(|path| {
			let dms = store(path);
			let mut setup = View::create(&dms, "v", "").unwrap();
			setup.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			setup.set_int("count", 0, 0, 1).unwrap();
			setup.finish().unwrap();

			let mut reopened = View::open(&dms, "v").unwrap();
			assert!(matches!(reopened.set_int("count", 0, 0, 2), Err(Error::ReadOnly { .. })));
			Ok(())
		})
		.unwrap();
	}
}
