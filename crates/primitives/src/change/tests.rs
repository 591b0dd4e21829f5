use std::sync::Arc;

use proptest::prelude::*;

use super::EditDescriptor;
use crate::location::{RangeTracking, TextLocation, TextRange, Tracking};
use crate::snapshot::Snapshot;

fn loc(line: usize, index: usize) -> TextLocation {
	TextLocation::new(line, index)
}

fn snapshot(text: &str) -> Arc<Snapshot> {
	Arc::new(Snapshot::from_text(text, None))
}

fn edit(old: &Arc<Snapshot>, start: TextLocation, end: TextLocation, replacement: &str) -> Arc<EditDescriptor> {
	EditDescriptor::apply(Arc::clone(old), start, end, snapshot(replacement)).expect("valid edit")
}

#[test]
fn apply_records_spans_and_pre_image() {
	let base = snapshot("abc\ndef");
	let change = edit(&base, loc(0, 1), loc(1, 1), "X\nY");
	assert_eq!(change.new_snapshot().to_string(), "aX\nYef");
	assert_eq!(change.old_end(), loc(1, 1));
	assert_eq!(change.new_end(), loc(1, 1));
	assert_eq!(change.pre_image().to_string(), "bc\nd");
	assert!(!change.is_root());
	assert!(Arc::ptr_eq(change.old_snapshot(), &base));
}

#[test]
fn location_before_edit_is_unchanged() {
	let change = edit(&snapshot("hello world"), loc(0, 6), loc(0, 11), "there");
	assert_eq!(change.remap(loc(0, 2), Tracking::Positive), loc(0, 2));
	assert_eq!(change.remap(loc(0, 2), Tracking::Negative), loc(0, 2));
}

#[test]
fn insertion_point_resolves_by_tracking() {
	let change = edit(&snapshot("ab"), loc(0, 1), loc(0, 1), "XYZ");
	assert_eq!(change.remap(loc(0, 1), Tracking::Negative), loc(0, 1));
	assert_eq!(change.remap(loc(0, 1), Tracking::Positive), loc(0, 4));
}

#[test]
fn location_inside_replaced_span_snaps_to_edges() {
	let change = edit(&snapshot("abcdef"), loc(0, 1), loc(0, 5), "Z");
	assert_eq!(change.remap(loc(0, 3), Tracking::Negative), loc(0, 1));
	assert_eq!(change.remap(loc(0, 3), Tracking::Positive), loc(0, 2));
	assert_eq!(change.remap(loc(0, 5), Tracking::Negative), loc(0, 1));
	assert_eq!(change.remap(loc(0, 5), Tracking::Positive), loc(0, 2));
}

#[test]
fn location_after_edit_on_same_line_shifts_line_and_index() {
	let change = edit(&snapshot("abc\ndef ghi"), loc(0, 1), loc(1, 2), "X\nYY\nZ");
	// old_end (1, 2) -> new_end (2, 1)
	assert_eq!(change.remap(loc(1, 5), Tracking::Negative), loc(2, 4));
}

#[test]
fn location_on_later_line_shifts_line_only() {
	let change = edit(&snapshot("abc\ndef\nghi"), loc(0, 1), loc(1, 2), "");
	assert_eq!(change.remap(loc(2, 2), Tracking::Positive), loc(1, 2));
}

#[test]
fn root_never_moves_anything() {
	let root = EditDescriptor::root(snapshot("abc"));
	assert!(root.is_root());
	assert_eq!(root.remap(loc(0, 2), Tracking::Positive), loc(0, 2));
}

#[test]
#[should_panic(expected = "assigned twice")]
fn next_link_is_assigned_once() {
	let base = snapshot("abc");
	let first = edit(&base, loc(0, 0), loc(0, 0), "x");
	let second = edit(first.new_snapshot(), loc(0, 0), loc(0, 0), "y");
	let other = edit(first.new_snapshot(), loc(0, 0), loc(0, 0), "z");
	first.set_next(second);
	first.set_next(other);
}

#[test]
fn remap_through_chain_matches_stepwise_remap() {
	let root = EditDescriptor::root(snapshot("one two three"));
	let a = edit(root.new_snapshot(), loc(0, 0), loc(0, 3), "1");
	let b = edit(a.new_snapshot(), loc(0, 1), loc(0, 1), "\n");
	let c = edit(b.new_snapshot(), loc(1, 0), loc(1, 4), "");
	root.set_next(Arc::clone(&a));
	a.set_next(Arc::clone(&b));
	b.set_next(Arc::clone(&c));

	let at = loc(0, 8);
	let stepwise = c.remap(b.remap(a.remap(at, Tracking::Positive), Tracking::Positive), Tracking::Positive);
	let (through, consumed) = root.remap_through(at, Tracking::Positive);
	assert_eq!(through, stepwise);
	assert!(Arc::ptr_eq(&consumed, &c));
	assert!(Arc::ptr_eq(&root.latest(), &c));
	assert_eq!(c.new_snapshot().text(through, loc(1, 6)).expect("range"), "three");
}

#[test]
fn range_tracking_controls_edge_growth() {
	let change = edit(&snapshot("abcd"), loc(0, 1), loc(0, 1), "XX");
	let range = TextRange::new(loc(0, 1), loc(0, 3));
	assert_eq!(
		change.remap_range(range, RangeTracking::EDGE_EXCLUSIVE),
		TextRange::new(loc(0, 3), loc(0, 5))
	);
	assert_eq!(
		change.remap_range(range, RangeTracking::EDGE_INCLUSIVE),
		TextRange::new(loc(0, 1), loc(0, 5))
	);

	let point = TextRange::point(loc(0, 1));
	let collapsed = change.remap_range(point, RangeTracking::EDGE_EXCLUSIVE);
	assert!(collapsed.is_empty());
	assert_eq!(collapsed.start, loc(0, 3));
}

#[test]
fn dropping_long_chain_does_not_recurse() {
	let root = EditDescriptor::root(snapshot(""));
	let mut tail = Arc::clone(&root);
	for _ in 0..100_000 {
		let next = edit(tail.new_snapshot(), loc(0, 0), loc(0, 0), "");
		tail.set_next(Arc::clone(&next));
		tail = next;
	}
	drop(tail);
	drop(root);
}

fn arb_edits() -> impl Strategy<Value = Vec<(usize, usize, String)>> {
	prop::collection::vec((0usize..40, 0usize..40, "[pq\n]{0,4}"), 1..8)
}

proptest! {
	#[test]
	fn prop_chain_remap_equals_link_by_link(edits in arb_edits(), probe in 0usize..40, positive in any::<bool>()) {
		let tracking = if positive { Tracking::Positive } else { Tracking::Negative };
		let root = EditDescriptor::root(snapshot("abc\ndefgh\nij\nklmno"));
		let mut tail = Arc::clone(&root);
		let mut links = Vec::new();
		for (a, b, text) in edits {
			let current = Arc::clone(tail.new_snapshot());
			let total = current.len_chars();
			let (lo, _) = current.offset_by_character(TextLocation::ZERO, a.min(total) as isize).expect("valid");
			let (hi, _) = current.offset_by_character(lo, b.min(total) as isize).expect("valid");
			let next = edit(&current, lo, hi, &text);
			tail.set_next(Arc::clone(&next));
			links.push(Arc::clone(&next));
			tail = next;
		}

		let (start, _) = root.new_snapshot().offset_by_character(TextLocation::ZERO, probe as isize).expect("valid");
		let stepwise = links.iter().fold(start, |at, link| link.remap(at, tracking));
		let (through, consumed) = root.remap_through(start, tracking);
		prop_assert_eq!(through, stepwise);
		prop_assert!(Arc::ptr_eq(&consumed, &tail));
		prop_assert!(tail.new_snapshot().validate(through).is_ok());
	}
}
