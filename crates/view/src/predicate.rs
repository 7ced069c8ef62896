// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Structural predicates validated by `finish()`.
//!
//! A check yields `Holds` (with a description recorded in the view
//! comments), `Failed` (the finish rolls the view back), or
//! `NotApplicable` (skipped — e.g. the quality/sequence match when no
//! quality column exists). An `Err` from evaluation is a real fault and
//! also rolls back; it is never conflated with "predicate is false".

use seqdms_core::{Error, Result};
use seqdms_store_column::Column;
use seqdms_type::Type;

use crate::{DEFINITION_COLUMN, ID_COLUMN, NUC_SEQUENCE_COLUMN, view::View};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
	HasIdColumn,
	HasDefinitionColumn,
	HasNucSequenceColumn,
	QualityMatchesSequences,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PredicateCheck {
	NotApplicable,
	Holds(String),
	Failed(String),
}

impl Predicate {
	pub fn check(&self, view: &View) -> Result<PredicateCheck> {
		match self {
			Predicate::HasIdColumn => Ok(presence(view, ID_COLUMN, "The view has an identifier column.")),
			Predicate::HasDefinitionColumn => {
				Ok(presence(view, DEFINITION_COLUMN, "The view has a definition column."))
			}
			Predicate::HasNucSequenceColumn => Ok(presence(
				view,
				NUC_SEQUENCE_COLUMN,
				"The view has a nucleotide sequence column.",
			)),
			Predicate::QualityMatchesSequences => quality_matches_sequences(view),
		}
	}
}

fn presence(view: &View, alias: &str, description: &str) -> PredicateCheck {
	if view.has_column(alias) {
		PredicateCheck::Holds(description.to_string())
	} else {
		PredicateCheck::Failed(format!("the view has no '{alias}' column"))
	}
}

/// Every quality column's per-row array length must equal the length of
/// its associated sequence, and both or neither must be NA for a row.
fn quality_matches_sequences(view: &View) -> Result<PredicateCheck> {
	let mut checked_any = false;
	for column in &view.columns {
		if column.returned_type() != Type::Qual {
			continue;
		}
		checked_any = true;
		let (seq_name, seq_version) = column.associated_column().ok_or_else(|| {
			Error::inconsistency(format!(
				"quality column '{}' has no associated sequence column",
				column.name()
			))
		})?;
		// Prefer the live handle when the sequence column is part of the
		// view; otherwise open it from the store.
		let opened;
		let seq_column: &Column = match view
			.columns
			.iter()
			.find(|c| c.name() == seq_name && c.version() == seq_version)
		{
			Some(live) => live,
			None => {
				opened = Column::open(&view.dms, &seq_name, seq_version)?;
				&opened
			}
		};
		if seq_column.nb_elements_per_line() != column.nb_elements_per_line() {
			return Ok(PredicateCheck::Failed(format!(
				"quality column '{}' and sequence column '{}' disagree on elements per line",
				column.name(),
				seq_name
			)));
		}

		for line in 0..view.line_count() {
			let target = view.prepare_to_get_value(line)?;
			for elt in 0..column.nb_elements_per_line() {
				let quality = column.get_qual(target, elt)?;
				let sequence = seq_column.get_seq(target, elt)?;
				match (&quality, &sequence) {
					(Some(quality), Some(sequence)) => {
						if quality.len() != sequence.len() {
							return Ok(PredicateCheck::Failed(format!(
								"line {line}: quality array of {} scores against a sequence of {} bases",
								quality.len(),
								sequence.len()
							)));
						}
					}
					(Some(_), None) | (None, Some(_)) => {
						return Ok(PredicateCheck::Failed(format!(
							"line {line}: sequence and quality are not both defined"
						)));
					}
					(None, None) => {}
				}
			}
		}
	}

	if checked_any {
		Ok(PredicateCheck::Holds("The sequences and sequence quality arrays match.".to_string()))
	} else {
		Ok(PredicateCheck::NotApplicable)
	}
}
