// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Typed element accessors.
//!
//! Every element type follows one contract: resolve the element, prepare
//! the column (growth, writability), then read or write the fixed-width
//! stored slot — inserting through the indexer first for indirected
//! types. Getters report undefined slots as `Ok(None)`; errors are kept
//! for real faults.

use seqdms_core::{Error, Result, bytes};
use seqdms_indexer::build_indexer_name;
use seqdms_type::{BOOL_NA, CHAR_NA, FLOAT_NA, INDEX_NA, INT_NA, Type, Value};
use tracing::debug;

use crate::{column::Column, layout};

/// An element addressed by declaration index or by name.
#[derive(Clone, Copy, Debug)]
pub enum ElementRef<'a> {
	Index(usize),
	Name(&'a str),
}

impl From<usize> for ElementRef<'_> {
	fn from(idx: usize) -> Self {
		ElementRef::Index(idx)
	}
}

impl<'a> From<&'a str> for ElementRef<'a> {
	fn from(name: &'a str) -> Self {
		ElementRef::Name(name)
	}
}

impl Column {
	/// Resolves an element reference to its declaration index.
	pub fn element_index(&self, elt: ElementRef<'_>) -> Result<usize> {
		match elt {
			ElementRef::Index(idx) => {
				if idx >= self.nb_elements_per_line() {
					return Err(Error::UnknownElement { name: format!("element index {idx}") });
				}
				Ok(idx)
			}
			ElementRef::Name(name) => self
				.element_names()
				.index_of(name)
				.ok_or_else(|| Error::UnknownElement { name: name.to_string() }),
		}
	}

	fn expect_type(&self, expected: Type) -> Result<()> {
		if self.returned_type() != expected {
			return Err(Error::inconsistency(format!(
				"column '{}' holds {} values, not {}",
				self.name(),
				self.returned_type(),
				expected
			)));
		}
		Ok(())
	}

	fn read_u8(&self, line_nb: usize, elt_idx: usize) -> Result<u8> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		Ok(bytes::get_u8(self.mapped.as_slice(), offset))
	}

	fn read_i32(&self, line_nb: usize, elt_idx: usize) -> Result<i32> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		Ok(bytes::get_i32(self.mapped.as_slice(), offset))
	}

	fn read_i64(&self, line_nb: usize, elt_idx: usize) -> Result<i64> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		Ok(bytes::get_i64(self.mapped.as_slice(), offset))
	}

	fn read_f64(&self, line_nb: usize, elt_idx: usize) -> Result<f64> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		Ok(bytes::get_f64(self.mapped.as_slice(), offset))
	}

	fn write_u8(&mut self, line_nb: usize, elt_idx: usize, value: u8) -> Result<()> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		bytes::put_u8(self.mapped.as_mut_slice()?, offset, value);
		Ok(())
	}

	fn write_i32(&mut self, line_nb: usize, elt_idx: usize, value: i32) -> Result<()> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		bytes::put_i32(self.mapped.as_mut_slice()?, offset, value);
		Ok(())
	}

	fn write_i64(&mut self, line_nb: usize, elt_idx: usize, value: i64) -> Result<()> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		bytes::put_i64(self.mapped.as_mut_slice()?, offset, value);
		Ok(())
	}

	fn write_f64(&mut self, line_nb: usize, elt_idx: usize, value: f64) -> Result<()> {
		let offset = self.slot_offset(line_nb, elt_idx)?;
		bytes::put_f64(self.mapped.as_mut_slice()?, offset, value);
		Ok(())
	}

	/// Stores the NA sentinel, bypassing the indexer for indirected
	/// types.
	pub fn set_na<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<()> {
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_set(line_nb, elt_idx)?;
		match self.stored_type() {
			Type::Bool => self.write_u8(line_nb, elt_idx, BOOL_NA),
			Type::Char => self.write_u8(line_nb, elt_idx, CHAR_NA),
			Type::Int => self.write_i32(line_nb, elt_idx, INT_NA),
			Type::Float => self.write_f64(line_nb, elt_idx, FLOAT_NA),
			_ => self.write_i64(line_nb, elt_idx, INDEX_NA),
		}
	}

	pub fn set_bool<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: bool) -> Result<()> {
		self.expect_type(Type::Bool)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_set(line_nb, elt_idx)?;
		self.write_u8(line_nb, elt_idx, value as u8)
	}

	pub fn get_bool<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<bool>> {
		self.expect_type(Type::Bool)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_get(line_nb)?;
		match self.read_u8(line_nb, elt_idx)? {
			0 => Ok(Some(false)),
			1 => Ok(Some(true)),
			b if b == BOOL_NA => Ok(None),
			other => Err(Error::corrupt(format!("boolean slot holds {other}"))),
		}
	}

	pub fn set_char<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: char) -> Result<()> {
		self.expect_type(Type::Char)?;
		if !value.is_ascii() || value == '\0' {
			return Err(Error::inconsistency(format!("character {value:?} is not a printable ASCII byte")));
		}
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_set(line_nb, elt_idx)?;
		self.write_u8(line_nb, elt_idx, value as u8)
	}

	pub fn get_char<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<char>> {
		self.expect_type(Type::Char)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_get(line_nb)?;
		match self.read_u8(line_nb, elt_idx)? {
			CHAR_NA => Ok(None),
			byte => Ok(Some(byte as char)),
		}
	}

	pub fn set_int<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: i32) -> Result<()> {
		self.expect_type(Type::Int)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_set(line_nb, elt_idx)?;
		self.write_i32(line_nb, elt_idx, value)
	}

	pub fn get_int<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<i32>> {
		self.expect_type(Type::Int)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_get(line_nb)?;
		match self.read_i32(line_nb, elt_idx)? {
			INT_NA => Ok(None),
			value => Ok(Some(value)),
		}
	}

	pub fn set_float<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: f64) -> Result<()> {
		self.expect_type(Type::Float)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_set(line_nb, elt_idx)?;
		self.write_f64(line_nb, elt_idx, value)
	}

	pub fn get_float<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<f64>> {
		self.expect_type(Type::Float)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_get(line_nb)?;
		let value = self.read_f64(line_nb, elt_idx)?;
		if value.is_nan() { Ok(None) } else { Ok(Some(value)) }
	}

	pub fn set_index<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: i64) -> Result<()> {
		self.expect_type(Type::Index)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_set(line_nb, elt_idx)?;
		self.write_i64(line_nb, elt_idx, value)
	}

	pub fn get_index<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<i64>> {
		self.expect_type(Type::Index)?;
		let elt_idx = self.element_index(elt.into())?;
		self.prepare_to_get(line_nb)?;
		match self.read_i64(line_nb, elt_idx)? {
			INDEX_NA => Ok(None),
			value => Ok(Some(value)),
		}
	}

	pub fn set_str<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: &str) -> Result<()> {
		self.expect_type(Type::Str)?;
		self.set_indirect(line_nb, elt.into(), value.as_bytes())
	}

	pub fn get_str<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<String>> {
		self.expect_type(Type::Str)?;
		self.get_indirect_utf8(line_nb, elt.into())
	}

	pub fn set_seq<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: &str) -> Result<()> {
		self.expect_type(Type::Seq)?;
		self.set_indirect(line_nb, elt.into(), value.as_bytes())
	}

	pub fn get_seq<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<String>> {
		self.expect_type(Type::Seq)?;
		self.get_indirect_utf8(line_nb, elt.into())
	}

	pub fn set_qual<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: &[u8]) -> Result<()> {
		self.expect_type(Type::Qual)?;
		self.set_indirect(line_nb, elt.into(), value)
	}

	pub fn get_qual<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<Vec<u8>>> {
		self.expect_type(Type::Qual)?;
		self.get_indirect(line_nb, elt.into())
	}

	pub fn set_blob<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: &[u8]) -> Result<()> {
		if !self.tuples() {
			self.expect_type(Type::Blob)?;
		}
		self.set_indirect(line_nb, elt.into(), value)
	}

	pub fn get_blob<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Option<Vec<u8>>> {
		if !self.tuples() {
			self.expect_type(Type::Blob)?;
		}
		self.get_indirect(line_nb, elt.into())
	}

	fn set_indirect(&mut self, line_nb: usize, elt: ElementRef<'_>, value: &[u8]) -> Result<()> {
		let elt_idx = self.element_index(elt)?;
		self.prepare_to_set(line_nb, elt_idx)?;
		let index = self.insert_indirect(value)?;
		self.write_i64(line_nb, elt_idx, index)
	}

	fn get_indirect(&self, line_nb: usize, elt: ElementRef<'_>) -> Result<Option<Vec<u8>>> {
		let elt_idx = self.element_index(elt)?;
		self.prepare_to_get(line_nb)?;
		match self.read_i64(line_nb, elt_idx)? {
			INDEX_NA => Ok(None),
			index => {
				let indexer = self
					.indexer
					.as_ref()
					.ok_or_else(|| Error::corrupt(format!("column '{}' has no indexer", self.name())))?;
				indexer.get(index).map(Some)
			}
		}
	}

	fn get_indirect_utf8(&self, line_nb: usize, elt: ElementRef<'_>) -> Result<Option<String>> {
		match self.get_indirect(line_nb, elt)? {
			None => Ok(None),
			Some(raw) => String::from_utf8(raw)
				.map(Some)
				.map_err(|_| Error::corrupt(format!("non-UTF-8 bytes in column '{}'", self.name()))),
		}
	}

	/// Inserts bytes through the indexer, cloning it to a writable copy
	/// once if it turns out to be read-only.
	fn insert_indirect(&mut self, value: &[u8]) -> Result<i64> {
		let indexer = self
			.indexer
			.as_mut()
			.ok_or_else(|| Error::corrupt(format!("column '{}' has no indexer", self.name)))?;
		match indexer.insert(value) {
			Ok(index) => Ok(index),
			Err(Error::ReadOnlyIndexer) => {
				self.rescue_indexer()?;
				let indexer = self
					.indexer
					.as_mut()
					.ok_or_else(|| Error::corrupt(format!("column '{}' has no indexer", self.name)))?;
				indexer.insert(value)
			}
			Err(err) => Err(err),
		}
	}

	/// Clones the read-only indexer under a fresh name derived from this
	/// column and repoints the header at the clone.
	fn rescue_indexer(&mut self) -> Result<()> {
		let current = self
			.indexer
			.take()
			.ok_or_else(|| Error::corrupt(format!("column '{}' has no indexer", self.name)))?;
		let mut attempt: i32 = 0;
		let cloned = loop {
			let candidate = build_indexer_name(&self.name, self.version.saturating_add(attempt));
			match current.clone_to(&self.dms, &candidate) {
				Ok(indexer) => break indexer,
				Err(Error::AlreadyExists { .. }) if attempt < 10_000 => attempt += 1,
				Err(err) => {
					self.indexer = Some(current);
					return Err(err);
				}
			}
		};
		debug!(column = %self.name, indexer = cloned.name(), "repointed column at writable indexer");
		let name = cloned.name().to_string();
		layout::set_indexer_name(self.header_mut()?, &name);
		self.indexer = Some(cloned);
		Ok(())
	}

	/// Reads a slot as a [`Value`].
	pub fn value<'a>(&self, line_nb: usize, elt: impl Into<ElementRef<'a>>) -> Result<Value> {
		let elt = elt.into();
		let value = match self.returned_type() {
			Type::Bool => self.get_bool(line_nb, elt)?.map(Value::Bool),
			Type::Char => self.get_char(line_nb, elt)?.map(Value::Char),
			Type::Float => self.get_float(line_nb, elt)?.map(Value::Float),
			Type::Int => self.get_int(line_nb, elt)?.map(Value::Int),
			Type::Index => self.get_index(line_nb, elt)?.map(Value::Index),
			Type::Str => self.get_str(line_nb, elt)?.map(Value::Str),
			Type::Seq => self.get_seq(line_nb, elt)?.map(Value::Seq),
			Type::Qual => self.get_qual(line_nb, elt)?.map(Value::Qual),
			Type::Blob => self.get_blob(line_nb, elt)?.map(Value::Blob),
		};
		Ok(value.unwrap_or(Value::Undefined))
	}

	/// Writes a [`Value`] into a slot; `Undefined` stores NA.
	pub fn set_value<'a>(&mut self, line_nb: usize, elt: impl Into<ElementRef<'a>>, value: &Value) -> Result<()> {
		let elt = elt.into();
		match value {
			Value::Undefined => self.set_na(line_nb, elt),
			Value::Bool(v) => self.set_bool(line_nb, elt, *v),
			Value::Char(v) => self.set_char(line_nb, elt, *v),
			Value::Float(v) => self.set_float(line_nb, elt, *v),
			Value::Int(v) => self.set_int(line_nb, elt, *v),
			Value::Index(v) => self.set_index(line_nb, elt, *v),
			Value::Str(v) => self.set_str(line_nb, elt, v),
			Value::Seq(v) => self.set_seq(line_nb, elt, v),
			Value::Qual(v) => self.set_qual(line_nb, elt, v),
			Value::Blob(v) => self.set_blob(line_nb, elt, v),
		}
	}
}

#[cfg(test)]
mod tests {
	use seqdms_core::Dms;
	use seqdms_testing::temp_dir;

	use super::*;
	use crate::column::ColumnSpec;

	fn with_column<F>(name: &str, ty: Type, f: F)
	where
		F: FnOnce(&Dms, Column),
	{
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			let column = Column::create(&dms, &ColumnSpec::new(name, ty)).unwrap();
			f(&dms, column);
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_bool_round_trip() {
		with_column("flag", Type::Bool, |_, mut column| {
			column.set_bool(0, 0, true).unwrap();
			column.set_bool(1, 0, false).unwrap();
			assert_eq!(column.get_bool(0, 0).unwrap(), Some(true));
			assert_eq!(column.get_bool(1, 0).unwrap(), Some(false));
			assert_eq!(column.get_bool(2, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_char_round_trip() {
		with_column("strand", Type::Char, |_, mut column| {
			column.set_char(0, 0, '+').unwrap();
			assert_eq!(column.get_char(0, 0).unwrap(), Some('+'));
			assert_eq!(column.get_char(1, 0).unwrap(), None);
			assert!(column.set_char(0, 0, 'é').is_err());
		});
	}

	#[test]
	fn test_int_round_trip() {
		with_column("count", Type::Int, |_, mut column| {
			column.set_int(0, 0, -7).unwrap();
			assert_eq!(column.get_int(0, 0).unwrap(), Some(-7));
			assert_eq!(column.get_int(1, 0).unwrap(), None);
			column.set_na(0, 0).unwrap();
			assert_eq!(column.get_int(0, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_float_round_trip() {
		with_column("score", Type::Float, |_, mut column| {
			column.set_float(0, 0, 0.25).unwrap();
			assert_eq!(column.get_float(0, 0).unwrap(), Some(0.25));
			assert_eq!(column.get_float(1, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_index_round_trip() {
		with_column("LINES", Type::Index, |_, mut column| {
			column.set_index(0, 0, 42).unwrap();
			assert_eq!(column.get_index(0, 0).unwrap(), Some(42));
			assert_eq!(column.get_index(1, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_str_round_trip() {
		with_column("id", Type::Str, |_, mut column| {
			column.set_str(0, 0, "seq_0").unwrap();
			column.set_str(1, 0, "").unwrap();
			assert_eq!(column.get_str(0, 0).unwrap().as_deref(), Some("seq_0"));
			assert_eq!(column.get_str(1, 0).unwrap().as_deref(), Some(""));
			assert_eq!(column.get_str(2, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_seq_round_trip() {
		with_column("seq", Type::Seq, |_, mut column| {
			column.set_seq(0, 0, "ACGTacgt").unwrap();
			assert_eq!(column.get_seq(0, 0).unwrap().as_deref(), Some("ACGTacgt"));
			assert_eq!(column.get_seq(1, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_qual_round_trip() {
		with_column("quality", Type::Qual, |_, mut column| {
			column.set_qual(0, 0, &[38, 38, 40]).unwrap();
			assert_eq!(column.get_qual(0, 0).unwrap(), Some(vec![38, 38, 40]));
			assert_eq!(column.get_qual(1, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_blob_round_trip() {
		with_column("payload", Type::Blob, |_, mut column| {
			column.set_blob(0, 0, b"\x00\x01\x02").unwrap();
			assert_eq!(column.get_blob(0, 0).unwrap(), Some(b"\x00\x01\x02".to_vec()));
			assert_eq!(column.get_blob(1, 0).unwrap(), None);
		});
	}

	#[test]
	fn test_value_round_trip() {
		with_column("id", Type::Str, |_, mut column| {
			column.set_value(0, 0, &Value::Str("a".to_string())).unwrap();
			column.set_value(1, 0, &Value::Undefined).unwrap();
			assert_eq!(column.value(0, 0).unwrap(), Value::Str("a".to_string()));
			assert_eq!(column.value(1, 0).unwrap(), Value::Undefined);
		});
	}

	#[test]
	fn test_type_mismatch_is_rejected() {
		with_column("count", Type::Int, |_, mut column| {
			assert!(column.set_str(0, 0, "x").is_err());
			assert!(column.get_bool(0, 0).is_err());
			assert!(matches!(column.set_value(0, 0, &Value::Float(1.0)), Err(Error::Inconsistency(_))));
		});
	}

	#[test]
	fn test_element_names() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			let spec = ColumnSpec::new("merged", Type::Int).with_elements(&["sample_a", "sample_b"]);
			let mut column = Column::create(&dms, &spec).unwrap();
			column.set_int(0, "sample_b", 5).unwrap();
			assert_eq!(column.get_int(0, "sample_b").unwrap(), Some(5));
			assert_eq!(column.get_int(0, "sample_a").unwrap(), None);
			assert_eq!(column.get_int(0, 1).unwrap(), Some(5));
			assert!(matches!(
				column.get_int(0, "sample_c"),
				Err(Error::UnknownElement { .. })
			));
			Ok(())
		})
		.unwrap();
	}

	// A column sharing a finished column's indexer clones it on first
	// insert and repoints itself, leaving the original indexer intact.
	#[test]
	fn test_read_only_indexer_rescue() {
		temp_dir(|path| {
			let dms = Dms::create(path.join("store")).unwrap();
			let mut source = Column::create(&dms, &ColumnSpec::new("id", Type::Str)).unwrap();
			source.set_str(0, 0, "seq_0").unwrap();
			source.close().unwrap();

			let mut clone = Column::clone_column(&dms, None, "id", 0, true).unwrap();
			assert_eq!(clone.indexer_name(), Some("id_0".to_string()));
			clone.set_str(1, 0, "fresh").unwrap();
			// The insert went through a writable clone of the indexer.
			assert_eq!(clone.indexer_name(), Some("id_1".to_string()));
			assert_eq!(clone.get_str(0, 0).unwrap().as_deref(), Some("seq_0"));
			assert_eq!(clone.get_str(1, 0).unwrap().as_deref(), Some("fresh"));
			Ok(())
		})
		.unwrap();
	}
}
