// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use seqdms::{ColumnSpec, Dms, Error, Type, Value, View};
use seqdms_testing::temp_dir;

// Create a STR view, clone it through a selection, finish the clone, and
// read everything back from disk.
#[test]
fn test_clone_with_selection_round_trip() {
	temp_dir(|path| {
		let dms = Dms::create(path.join("store")).unwrap();

		let mut v1 = View::create(&dms, "v1", "").unwrap();
		v1.create_column(&ColumnSpec::new("seq", Type::Str), None).unwrap();
		v1.set_str("seq", 0, 0, "AAA").unwrap();
		v1.set_str("seq", 1, 0, "CCC").unwrap();
		v1.set_str("seq", 2, 0, "GGG").unwrap();
		v1.finish().unwrap();

		let v1 = View::open(&dms, "v1").unwrap();
		let v2 = View::clone_from(&dms, "v2", &v1, Some(&[2, 0]), "").unwrap();
		assert_eq!(v2.line_count(), 2);
		assert_eq!(v2.get_str("seq", 0, 0).unwrap().as_deref(), Some("GGG"));
		assert_eq!(v2.get_str("seq", 1, 0).unwrap().as_deref(), Some("AAA"));
		v2.finish().unwrap();

		let v2 = View::open(&dms, "v2").unwrap();
		assert!(v2.finished());
		assert_eq!(v2.line_count(), 2);
		assert_eq!(v2.get_str("seq", 0, 0).unwrap().as_deref(), Some("GGG"));
		assert_eq!(v2.get_str("seq", 1, 0).unwrap().as_deref(), Some("AAA"));
		Ok(())
	})
	.unwrap();
}

// A full nucleotide workflow: ingest reads with qualities, finish,
// reopen, derive a filtered view, and write through it.
#[test]
fn test_nucleotide_workflow() {
	temp_dir(|path| {
		let dms = Dms::create(path.join("store")).unwrap();

		let mut raw = View::create_nuc_seqs(&dms, "raw", true, r#"{"run":"demo"}"#).unwrap();
		let reads = [("ACGTACGT", 8usize), ("TTGA", 4), ("GGGCCC", 6)];
		for (line, (seq, len)) in reads.iter().enumerate() {
			raw.set_seq(seqdms::NUC_SEQUENCE_COLUMN, line, 0, seq).unwrap();
			raw.set_qual(seqdms::QUALITY_COLUMN, line, 0, &vec![40u8; *len]).unwrap();
			raw.set_str(seqdms::DEFINITION_COLUMN, line, 0, "demo read").unwrap();
		}
		// Drop the untouched default id column so finish() rebuilds it.
		raw.delete_column(seqdms::ID_COLUMN, true).unwrap();
		raw.finish().unwrap();

		let raw = View::open(&dms, "raw").unwrap();
		assert_eq!(raw.view_type(), seqdms::VIEW_TYPE_NUC_SEQS);
		assert_eq!(raw.line_count(), 3);
		// finish() filled id and count automatically.
		assert_eq!(raw.get_str(seqdms::ID_COLUMN, 2, 0).unwrap().as_deref(), Some("seq_2"));
		assert_eq!(raw.get_int(seqdms::COUNT_COLUMN, 1, 0).unwrap(), Some(1));
		assert_eq!(raw.comments().unwrap().get("run").unwrap(), "demo");

		// Keep the long reads only, in reverse order.
		let mut long_reads = View::clone_from(&dms, "long", &raw, Some(&[2, 0]), "").unwrap();
		assert_eq!(long_reads.get_seq(seqdms::NUC_SEQUENCE_COLUMN, 0, 0).unwrap().as_deref(), Some("GGGCCC"));
		// Annotating a row materializes the selection into fresh columns.
		long_reads.set_str(seqdms::DEFINITION_COLUMN, 0, 0, "kept").unwrap();
		long_reads.finish().unwrap();

		let long_reads = View::open(&dms, "long").unwrap();
		assert_eq!(long_reads.line_count(), 2);
		assert_eq!(long_reads.get_seq(seqdms::NUC_SEQUENCE_COLUMN, 1, 0).unwrap().as_deref(), Some("ACGTACGT"));
		assert_eq!(long_reads.get_qual(seqdms::QUALITY_COLUMN, 1, 0).unwrap(), Some(vec![40u8; 8]));
		assert_eq!(long_reads.get_str(seqdms::DEFINITION_COLUMN, 0, 0).unwrap().as_deref(), Some("kept"));
		// The source is untouched.
		assert_eq!(raw.get_str(seqdms::DEFINITION_COLUMN, 2, 0).unwrap().as_deref(), Some("demo read"));
		Ok(())
	})
	.unwrap();
}

#[test]
fn test_value_api_round_trip() {
	temp_dir(|path| {
		let dms = Dms::create(path.join("store")).unwrap();
		let mut view = View::create(&dms, "v", "").unwrap();
		view.create_column(&ColumnSpec::new("flag", Type::Bool), None).unwrap();
		view.create_column(&ColumnSpec::new("score", Type::Float), None).unwrap();

		view.set_value("flag", 0, 0, &Value::Bool(true)).unwrap();
		view.set_value("score", 0, 0, &Value::Float(0.5)).unwrap();
		view.set_value("score", 1, 0, &Value::Undefined).unwrap();
		assert_eq!(view.value("flag", 0, 0).unwrap(), Value::Bool(true));
		assert_eq!(view.value("score", 0, 0).unwrap(), Value::Float(0.5));
		assert_eq!(view.value("score", 1, 0).unwrap(), Value::Undefined);
		assert_eq!(view.value("flag", 1, 0).unwrap(), Value::Undefined);
		view.rollback().unwrap();
		Ok(())
	})
	.unwrap();
}

// Crash simulation: artifacts of an abandoned writer disappear in the
// recovery scan, published data stays.
#[test]
fn test_recovery_scan() {
	temp_dir(|path| {
		let dms = Dms::create(path.join("store")).unwrap();

		let mut published = View::create(&dms, "published", "").unwrap();
		published.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
		published.set_int("count", 0, 0, 7).unwrap();
		published.finish().unwrap();

		// A writer that dies mid-flight: neither finish nor rollback.
		let mut dead = View::create(&dms, "dead", "").unwrap();
		dead.create_column(&ColumnSpec::new("half_written", Type::Str), None).unwrap();
		dead.set_str("half_written", 0, 0, "lost").unwrap();
		dead.close().unwrap();

		assert!(seqdms::has_unfinished_views(&dms).unwrap());
		assert!(seqdms::has_unfinished_columns(&dms).unwrap());
		seqdms::clean_unfinished(&dms).unwrap();
		assert!(!seqdms::has_unfinished_views(&dms).unwrap());
		assert!(!seqdms::has_unfinished_columns(&dms).unwrap());

		assert!(!View::exists(&dms, "dead"));
		let survivor = View::open(&dms, "published").unwrap();
		assert_eq!(survivor.get_int("count", 0, 0).unwrap(), Some(7));
		Ok(())
	})
	.unwrap();
}

#[test]
fn test_reopening_store() {
	temp_dir(|path| {
		{
			let dms = Dms::create(path.join("store")).unwrap();
			let mut view = View::create(&dms, "v", "").unwrap();
			view.create_column(&ColumnSpec::new("count", Type::Int), None).unwrap();
			view.set_int("count", 0, 0, 41).unwrap();
			view.finish().unwrap();
		}
		let dms = Dms::open(path.join("store")).unwrap();
		let view = View::open(&dms, "v").unwrap();
		assert_eq!(view.get_int("count", 0, 0).unwrap(), Some(41));
		assert!(matches!(View::open(&dms, "absent"), Err(Error::NotFound { .. })));
		Ok(())
	})
	.unwrap();
}
