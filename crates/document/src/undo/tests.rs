use std::sync::Arc;

use weft_primitives::{EditDescriptor, Snapshot, TextLocation, TextRange};

use super::*;

fn loc(line: usize, index: usize) -> TextLocation {
	TextLocation::new(line, index)
}

fn range(a: (usize, usize), b: (usize, usize)) -> TextRange {
	TextRange::new(loc(a.0, a.1), loc(b.0, b.1))
}

fn insert_change(at: usize, text: &str) -> Arc<EditDescriptor> {
	let base = Arc::new(Snapshot::from_text("0123456789", None));
	let replacement = Arc::new(Snapshot::from_text(text, None));
	EditDescriptor::apply(base, loc(0, at), loc(0, at), replacement).expect("valid edit")
}

fn typed(at: usize, text: &str) -> UndoUnit {
	let change = insert_change(at, text);
	let meta = TypingMetadata::insertion(change.new_range());
	UndoUnit::new(vec![change], Some(Box::new(meta)))
}

#[test]
fn contiguous_insertions_merge() {
	let mut first = TypingMetadata::insertion(range((0, 0), (0, 1)));
	assert!(first.try_merge(&TypingMetadata::insertion(range((0, 1), (0, 2)))));
	assert_eq!(first.range, range((0, 0), (0, 2)));
	assert!(!first.try_merge(&TypingMetadata::insertion(range((0, 5), (0, 6)))));
}

#[test]
fn backspace_and_forward_delete_merge() {
	let mut back = TypingMetadata::deletion(range((0, 4), (0, 5)));
	assert!(back.try_merge(&TypingMetadata::deletion(range((0, 3), (0, 4)))));
	assert_eq!(back.range.start, loc(0, 3));

	let mut forward = TypingMetadata::deletion(range((0, 2), (0, 3)));
	assert!(forward.try_merge(&TypingMetadata::deletion(range((0, 2), (0, 3)))));
}

#[test]
fn mixed_kinds_and_foreign_metadata_refuse() {
	#[derive(Debug)]
	struct Other;
	impl UndoMetadata for Other {
		fn try_merge(&mut self, _: &dyn UndoMetadata) -> bool {
			true
		}
		fn as_any(&self) -> &dyn Any {
			self
		}
	}

	let mut insert = TypingMetadata::insertion(range((0, 0), (0, 1)));
	assert!(!insert.try_merge(&TypingMetadata::deletion(range((0, 1), (0, 1)))));
	assert!(!insert.try_merge(&Other));
	let mut replace = TypingMetadata::replacement(range((0, 0), (0, 1)));
	assert!(!replace.try_merge(&TypingMetadata::replacement(range((0, 1), (0, 2)))));
}

#[test]
fn unit_without_metadata_never_merges() {
	let mut plain = UndoUnit::new(vec![insert_change(0, "a")], None);
	let newer = typed(1, "b");
	let refused = plain.try_merge(newer).expect_err("plain unit refuses");
	assert_eq!(refused.len(), 1);
	assert_eq!(plain.len(), 1);
}

#[test]
fn history_merges_only_when_coalescing() {
	let mut history = UndoHistory::new(10);
	assert_eq!(history.record(typed(0, "a"), false), RecordOutcome::Pushed { evicted: 0 });
	assert_eq!(history.record(typed(1, "b"), true), RecordOutcome::Merged);
	assert_eq!(history.record(typed(2, "c"), false), RecordOutcome::Pushed { evicted: 0 });
	assert_eq!(history.undo_len(), 2);
	assert_eq!(history.last_undo().map(UndoUnit::len), Some(1));
}

#[test]
fn recording_clears_redo_and_evicts_oldest() {
	let mut history = UndoHistory::new(2);
	history.record(typed(0, "a"), false);
	history.record(typed(5, "b"), false);
	let undone = history.pop_undo().expect("unit");
	history.push_redo(undone);
	assert!(history.can_redo());

	assert_eq!(history.record(typed(7, "c"), false), RecordOutcome::Pushed { evicted: 0 });
	assert!(!history.can_redo());
	assert_eq!(history.record(typed(9, "d"), false), RecordOutcome::Pushed { evicted: 1 });
	assert_eq!(history.undo_len(), 2);
	assert_eq!(history.last_undo().and_then(UndoUnit::first_location), Some(loc(0, 9)));
}
