//! Undo units and the undo/redo history.
//!
//! Every committed (non-replay) transaction produces one [`UndoUnit`]
//! holding its edit descriptors in commit order. Units carry optional
//! [`UndoMetadata`] that decides whether a unit may be folded into the
//! previous one, which is how consecutive keystrokes become a single undo
//! step.

#[cfg(test)]
mod tests;

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tracing::trace;
use weft_primitives::{EditDescriptor, TextLocation, TextRange};

/// Decides whether two consecutive undo units may coalesce.
pub trait UndoMetadata: fmt::Debug + Send + Sync + 'static {
	/// Attempts to absorb `newer`, the metadata of the unit committed right
	/// after the one owning `self`. Returning false is not an error: the
	/// newer unit simply becomes its own history entry.
	fn try_merge(&mut self, newer: &dyn UndoMetadata) -> bool;

	fn as_any(&self) -> &dyn Any;
}

/// What a typing edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
	Insert,
	Delete,
	Replace,
}

/// Metadata for interactive typing.
///
/// Insertions merge when each one starts where the previous one ended.
/// Deletions merge when they back up into the previous deletion (backspace)
/// or remove text at the same location (forward delete). Replacements never
/// merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingMetadata {
	pub kind: EditKind,
	/// Affected span: inserted text in the new snapshot for insertions, the
	/// removed span in the old snapshot for deletions.
	pub range: TextRange,
}

impl TypingMetadata {
	pub fn insertion(range: TextRange) -> Self {
		Self {
			kind: EditKind::Insert,
			range,
		}
	}

	pub fn deletion(range: TextRange) -> Self {
		Self {
			kind: EditKind::Delete,
			range,
		}
	}

	pub fn replacement(range: TextRange) -> Self {
		Self {
			kind: EditKind::Replace,
			range,
		}
	}
}

impl UndoMetadata for TypingMetadata {
	fn try_merge(&mut self, newer: &dyn UndoMetadata) -> bool {
		let Some(newer) = newer.as_any().downcast_ref::<TypingMetadata>() else {
			return false;
		};
		match (self.kind, newer.kind) {
			(EditKind::Insert, EditKind::Insert) if newer.range.start == self.range.end => {
				self.range.end = newer.range.end;
				true
			}
			(EditKind::Delete, EditKind::Delete) if newer.range.end == self.range.start => {
				self.range.start = newer.range.start;
				true
			}
			(EditKind::Delete, EditKind::Delete) if newer.range.start == self.range.start => true,
			_ => false,
		}
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// One undoable action: edit descriptors in commit order.
#[derive(Debug, Default)]
pub struct UndoUnit {
	changes: Vec<Arc<EditDescriptor>>,
	metadata: Option<Box<dyn UndoMetadata>>,
}

impl UndoUnit {
	pub fn new(changes: Vec<Arc<EditDescriptor>>, metadata: Option<Box<dyn UndoMetadata>>) -> Self {
		Self { changes, metadata }
	}

	pub fn changes(&self) -> &[Arc<EditDescriptor>] {
		&self.changes
	}

	pub fn metadata(&self) -> Option<&dyn UndoMetadata> {
		self.metadata.as_deref()
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	/// Location the first edit started at, in its own old snapshot.
	pub fn first_location(&self) -> Option<TextLocation> {
		self.changes.first().map(|change| change.start())
	}

	/// Folds `newer` into `self` if both carry metadata that agrees.
	///
	/// On refusal `newer` is handed back untouched.
	pub fn try_merge(&mut self, newer: UndoUnit) -> Result<(), UndoUnit> {
		let merged = match (self.metadata.as_mut(), newer.metadata.as_deref()) {
			(Some(mine), Some(theirs)) => mine.try_merge(theirs),
			_ => false,
		};
		if !merged {
			return Err(newer);
		}
		self.changes.extend(newer.changes);
		Ok(())
	}
}

/// Outcome of recording a unit into the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
	/// Folded into the unit on top of the undo stack.
	Merged,
	/// Pushed as a new entry; `evicted` old entries fell off the bottom.
	Pushed { evicted: usize },
}

/// Bounded undo and redo stacks.
#[derive(Debug)]
pub struct UndoHistory {
	undo_stack: VecDeque<UndoUnit>,
	redo_stack: Vec<UndoUnit>,
	max_undo: usize,
}

impl UndoHistory {
	/// Creates an empty history holding at most `max_undo` undo units.
	pub fn new(max_undo: usize) -> Self {
		Self {
			undo_stack: VecDeque::new(),
			redo_stack: Vec::new(),
			max_undo: max_undo.max(1),
		}
	}

	pub fn can_undo(&self) -> bool {
		!self.undo_stack.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.redo_stack.is_empty()
	}

	pub fn undo_len(&self) -> usize {
		self.undo_stack.len()
	}

	pub fn redo_len(&self) -> usize {
		self.redo_stack.len()
	}

	/// Records a freshly committed unit.
	///
	/// With `coalesce` set, the unit is first offered to the top of the undo
	/// stack. Either way the redo stack is cleared: a new edit forks history.
	pub fn record(&mut self, unit: UndoUnit, coalesce: bool) -> RecordOutcome {
		if !self.redo_stack.is_empty() {
			trace!(cleared = self.redo_stack.len(), "redo stack cleared");
			self.redo_stack.clear();
		}

		let unit = match self.undo_stack.back_mut() {
			Some(top) if coalesce => match top.try_merge(unit) {
				Ok(()) => {
					trace!(changes = top.len(), "undo unit merged");
					return RecordOutcome::Merged;
				}
				Err(unit) => unit,
			},
			_ => unit,
		};

		self.undo_stack.push_back(unit);
		let mut evicted = 0;
		while self.undo_stack.len() > self.max_undo {
			self.undo_stack.pop_front();
			evicted += 1;
		}
		trace!(undo_stack = self.undo_stack.len(), evicted, "undo unit pushed");
		RecordOutcome::Pushed { evicted }
	}

	pub fn pop_undo(&mut self) -> Option<UndoUnit> {
		self.undo_stack.pop_back()
	}

	pub fn pop_redo(&mut self) -> Option<UndoUnit> {
		self.redo_stack.pop()
	}

	/// Pushes a unit that was just undone.
	pub fn push_redo(&mut self, unit: UndoUnit) {
		self.redo_stack.push(unit);
	}

	/// Pushes a unit that was just redone, without touching the redo stack.
	pub fn push_undo_replayed(&mut self, unit: UndoUnit) {
		self.undo_stack.push_back(unit);
		while self.undo_stack.len() > self.max_undo {
			self.undo_stack.pop_front();
		}
	}

	/// Drops both stacks.
	pub fn clear(&mut self) {
		self.undo_stack.clear();
		self.redo_stack.clear();
	}

	pub fn last_undo(&self) -> Option<&UndoUnit> {
		self.undo_stack.back()
	}
}
