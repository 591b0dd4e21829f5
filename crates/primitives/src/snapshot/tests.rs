use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::Snapshot;
use crate::error::EditError;
use crate::line::LineEnding;
use crate::location::TextLocation;

fn loc(line: usize, index: usize) -> TextLocation {
	TextLocation::new(line, index)
}

fn text(s: &str) -> Snapshot {
	Snapshot::from_text(s, None)
}

fn endings(snapshot: &Snapshot) -> Vec<LineEnding> {
	snapshot.lines().map(|line| line.ending()).collect()
}

#[test]
fn from_text_splits_on_every_marker_kind() {
	let snapshot = text("a\r\nb\rc\nd");
	assert_eq!(snapshot.line_count(), 4);
	assert_eq!(
		endings(&snapshot),
		vec![LineEnding::Crlf, LineEnding::Cr, LineEnding::Lf, LineEnding::EndOfBuffer]
	);
	assert_eq!(snapshot.len_chars(), 8);
	assert_eq!(snapshot.to_string(), "a\r\nb\rc\nd");
}

#[test]
fn empty_text_is_one_end_of_buffer_line() {
	let snapshot = text("");
	assert_eq!(snapshot.line_count(), 1);
	assert_eq!(endings(&snapshot), vec![LineEnding::EndOfBuffer]);
	assert!(snapshot.is_empty());
	assert_eq!(snapshot.end(), TextLocation::ZERO);
}

#[test]
fn trailing_marker_leaves_empty_final_line() {
	let snapshot = text("abc\n");
	assert_eq!(snapshot.line_count(), 2);
	assert_eq!(snapshot.line(1).map(|line| line.text()), Some(""));
	assert_eq!(snapshot.end(), loc(1, 0));
}

#[test]
fn lone_cr_before_lf_pair_is_kept_apart() {
	let snapshot = text("a\r\r\nb");
	assert_eq!(endings(&snapshot), vec![LineEnding::Cr, LineEnding::Crlf, LineEnding::EndOfBuffer]);
}

#[test]
fn normalization_rewrites_markers() {
	let snapshot = Snapshot::from_text("a\r\nb\rc", Some(LineEnding::Lf));
	assert_eq!(snapshot.to_string(), "a\nb\nc");
	assert_eq!(endings(&snapshot).last(), Some(&LineEnding::EndOfBuffer));
}

#[test]
fn active_line_fast_path_shares_line_arrays() {
	let hello = text("hello");
	let edited = hello.apply_edit(loc(0, 5), loc(0, 5), &text("y")).expect("valid edit");
	assert_eq!(edited.to_string(), "helloy");
	assert!(Arc::ptr_eq(hello.before_lines(), edited.before_lines()));
	assert!(Arc::ptr_eq(hello.after_lines(), edited.after_lines()));
	assert!(!Arc::ptr_eq(hello.active_line(), edited.active_line()));
	assert_eq!(edited.version(), hello.version() + 1);
}

#[test]
fn consecutive_edits_on_active_line_stay_on_fast_path() {
	let base = text("one\ntwo\nthree");
	let first = base.apply_edit(loc(1, 3), loc(1, 3), &text("!")).expect("edit");
	assert_eq!(first.active_line_index(), 1);
	let second = first.apply_edit(loc(1, 0), loc(1, 1), &text("T")).expect("edit");
	assert!(Arc::ptr_eq(first.before_lines(), second.before_lines()));
	assert!(Arc::ptr_eq(first.after_lines(), second.after_lines()));
	assert_eq!(second.to_string(), "one\nTwo!\nthree");
}

#[test]
fn edit_on_other_line_rebuilds_but_reuses_untouched_lines() {
	let base = text("zero\none\ntwo\nthree");
	let edited = base.apply_edit(loc(2, 0), loc(2, 3), &text("TWO")).expect("edit");
	assert_eq!(edited.to_string(), "zero\none\nTWO\nthree");
	assert_eq!(edited.active_line_index(), 2);
	for index in [0, 1, 3] {
		assert!(Arc::ptr_eq(
			base.line(index).expect("line"),
			edited.line(index).expect("line")
		));
	}
}

#[test]
fn multi_line_replacement_sets_before_count_and_shares_middle_lines() {
	let base = text("ab\ncd\nef");
	let replacement = text("X\nmid\nY");
	let edited = base.apply_edit(loc(0, 1), loc(1, 1), &replacement).expect("edit");
	assert_eq!(edited.to_string(), "aX\nmid\nYd\nef");
	// before = start.line + replacement lines - 1
	assert_eq!(edited.before_lines().len(), 2);
	assert_eq!(edited.after_lines().len(), edited.line_count() - 2 - 1);
	assert!(Arc::ptr_eq(
		replacement.line(1).expect("middle"),
		edited.line(1).expect("middle")
	));
	assert!(Arc::ptr_eq(base.line(2).expect("ef"), edited.line(3).expect("ef")));
	assert_eq!(edited.len_chars(), edited.to_string().chars().count());
}

#[test]
fn deleting_a_line_break_joins_lines() {
	let base = text("abc\r\ndef");
	let edited = base.apply_edit(loc(0, 3), loc(1, 0), &text("")).expect("edit");
	assert_eq!(edited.to_string(), "abcdef");
	assert_eq!(edited.line_count(), 1);
	assert_eq!(edited.len_chars(), 6);
}

#[test]
fn invalid_coordinates_are_rejected() {
	let base = text("abc\ndef");
	assert_eq!(
		base.apply_edit(loc(2, 0), loc(2, 0), &text("x")).unwrap_err(),
		EditError::InvalidCoordinate {
			location: loc(2, 0),
			line_count: 2
		}
	);
	assert_eq!(
		base.validate(loc(0, 4)).unwrap_err(),
		EditError::InvalidLineIndex {
			location: loc(0, 4),
			line_len: 3
		}
	);
	assert!(matches!(
		base.text(loc(1, 0), loc(0, 1)),
		Err(EditError::InvertedRange { .. })
	));
}

#[test]
fn text_and_subrange_cross_lines() {
	let base = text("abc\r\ndef\nghi");
	assert_eq!(base.text(loc(0, 1), loc(0, 2)).expect("range"), "b");
	assert_eq!(base.text(loc(0, 2), loc(2, 1)).expect("range"), "c\r\ndef\ng");

	let sub = base.subrange(loc(0, 2), loc(2, 1)).expect("range");
	assert_eq!(sub.to_string(), "c\r\ndef\ng");
	assert_eq!(endings(&sub), vec![LineEnding::Crlf, LineEnding::Lf, LineEnding::EndOfBuffer]);
	assert!(Arc::ptr_eq(base.line(1).expect("def"), sub.line(1).expect("def")));
}

#[test]
fn offset_by_character_crosses_lines_and_clamps() {
	let base = text("ab\r\ncd");
	assert_eq!(base.offset_by_character(loc(0, 1), 2).expect("valid"), (loc(1, 0), 2));
	assert_eq!(base.offset_by_character(loc(0, 1), 10).expect("valid"), (loc(1, 2), 4));
	assert_eq!(base.offset_by_character(loc(1, 1), -2).expect("valid"), (loc(0, 2), -2));
	assert_eq!(base.offset_by_character(loc(1, 1), -10).expect("valid"), (loc(0, 0), -4));
	assert_eq!(base.offset_by_character(loc(0, 0), 0).expect("valid"), (loc(0, 0), 0));
}

#[test]
fn offset_by_line_clamps_line_and_index() {
	let base = text("long line\nx\nanother");
	assert_eq!(base.offset_by_line(loc(0, 7), 1).expect("valid"), (loc(1, 1), 1));
	assert_eq!(base.offset_by_line(loc(0, 7), 5).expect("valid"), (loc(2, 7), 2));
	assert_eq!(base.offset_by_line(loc(2, 3), -9).expect("valid"), (loc(0, 3), -2));
	assert!(base.offset_by_line(loc(3, 0), 1).is_err());
}

#[test]
fn empty_snapshot_constant_is_shared() {
	let a = Snapshot::empty();
	let b = Snapshot::default();
	assert!(Arc::ptr_eq(a.active_line(), b.active_line()));
}

fn location_at(snapshot: &Snapshot, offset: usize) -> TextLocation {
	let mut offset = offset;
	for (index, line) in snapshot.lines().enumerate() {
		if offset <= line.char_len() {
			return TextLocation::new(index, offset);
		}
		offset -= line.len_with_ending();
	}
	snapshot.end()
}

proptest! {
	#[test]
	fn prop_edit_then_extract_yields_replacement(
		doc in "[ab\n]{0,30}",
		replacement in "[xy\n]{0,8}",
		a in 0usize..64,
		b in 0usize..64,
	) {
		let base = text(&doc);
		let chars: Vec<char> = doc.chars().collect();
		let (lo, hi) = (a.min(b).min(chars.len()), a.max(b).min(chars.len()));
		let start = location_at(&base, lo);
		let end = location_at(&base, hi);
		let inserted = text(&replacement);

		let edited = base.apply_edit(start, end, &inserted).expect("valid edit");
		let new_end = Snapshot::end_of_insertion(start, &inserted);
		prop_assert_eq!(edited.text(start, new_end).expect("valid range"), replacement.clone());

		let mut expected: String = chars[..lo].iter().collect();
		expected.push_str(&replacement);
		expected.extend(chars[hi..].iter());
		prop_assert_eq!(edited.to_string(), expected.clone());
		prop_assert_eq!(edited.len_chars(), expected.chars().count());
		prop_assert_eq!(edited.before_lines().len(), start.line + inserted.line_count() - 1);
	}
}
