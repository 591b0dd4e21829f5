//! Transactions: the only way to mutate a [`Document`](crate::Document).
//!
//! A transaction owns the document's write gate from the moment it is
//! opened until it is dropped. Writes are validated against the
//! transaction's in-progress snapshot, so a later write sees the effect of
//! earlier ones. Nothing becomes visible to readers until the transaction
//! finishes, which happens exactly once: on [`commit`](Transaction::commit)
//! or on drop, including unwinding.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::MutexGuard;
use tracing::{debug, trace};
use weft_primitives::{EditDescriptor, Snapshot, TextLocation, TextRange};

use crate::document::{DocumentChange, EditState, HistoryDirection, Shared};
use crate::error::DocumentError;
use crate::undo::{RecordOutcome, UndoMetadata, UndoUnit};

/// An open write session on a document.
pub struct Transaction<'a> {
	shared: &'a Shared,
	state: MutexGuard<'a, EditState>,
	current: Arc<Snapshot>,
	first: Option<Arc<EditDescriptor>>,
	last: Option<Arc<EditDescriptor>>,
	/// Descriptors for the undo unit; stays empty for replays.
	staged: Vec<Arc<EditDescriptor>>,
	metadata: Option<Box<dyn UndoMetadata>>,
	replay: Option<HistoryDirection>,
	finished: bool,
}

impl<'a> Transaction<'a> {
	pub(crate) fn open(shared: &'a Shared, state: MutexGuard<'a, EditState>, replay: Option<HistoryDirection>) -> Self {
		trace!(document = shared.id.0, ?replay, "transaction.open");
		Self {
			current: shared.current.load_full(),
			shared,
			state,
			first: None,
			last: None,
			staged: Vec::new(),
			metadata: None,
			replay,
			finished: false,
		}
	}

	/// Snapshot including every write staged so far.
	pub fn current(&self) -> &Arc<Snapshot> {
		&self.current
	}

	/// True until the first successful write.
	pub fn is_empty(&self) -> bool {
		self.first.is_none()
	}

	/// Replaces `start..end` of the in-progress snapshot with `text`.
	///
	/// Returns the span `text` occupies afterwards. An invalid range fails
	/// this call only: writes staged before it stay staged.
	pub fn write(&mut self, start: TextLocation, end: TextLocation, text: &str) -> Result<TextRange, DocumentError> {
		let replacement = Arc::new(Snapshot::from_text(text, self.shared.config.normalization()));
		self.stage(start, end, replacement)
	}

	pub fn insert(&mut self, at: TextLocation, text: &str) -> Result<TextRange, DocumentError> {
		self.write(at, at, text)
	}

	pub fn delete(&mut self, start: TextLocation, end: TextLocation) -> Result<TextRange, DocumentError> {
		self.write(start, end, "")
	}

	/// Attaches coalescing metadata to this transaction's undo unit.
	pub fn set_metadata(&mut self, metadata: impl UndoMetadata) {
		self.metadata = Some(Box::new(metadata));
	}

	pub(crate) fn stage(&mut self, start: TextLocation, end: TextLocation, replacement: Arc<Snapshot>) -> Result<TextRange, DocumentError> {
		let change = EditDescriptor::apply(Arc::clone(&self.current), start, end, replacement)?;
		if let Some(last) = &self.last {
			last.set_next(Arc::clone(&change));
		}
		if self.first.is_none() {
			self.first = Some(Arc::clone(&change));
		}
		if self.replay.is_none() {
			self.staged.push(Arc::clone(&change));
		}
		self.current = Arc::clone(change.new_snapshot());
		let range = change.new_range();
		trace!(document = self.shared.id.0, %start, %end, new_end = %range.end, "transaction.write");
		self.last = Some(change);
		Ok(range)
	}

	/// Publishes the staged writes and closes the transaction.
	pub fn commit(mut self) {
		self.finish();
	}

	/// Publishes staged writes. Runs once; later calls do nothing.
	pub(crate) fn finish(&mut self) {
		if self.finished {
			return;
		}
		self.finished = true;
		let (Some(first), Some(last)) = (self.first.take(), self.last.take()) else {
			return;
		};

		self.shared.last_change.load().set_next(Arc::clone(&first));
		self.shared.current.store(Arc::clone(last.new_snapshot()));
		self.shared.last_change.store(Arc::clone(&last));

		match self.replay {
			None => {
				let now = Instant::now();
				let window = self.shared.config.merge_window();
				let coalesce = self
					.state
					.last_edit_at
					.is_some_and(|at| now.duration_since(at) < window);
				let unit = UndoUnit::new(std::mem::take(&mut self.staged), self.metadata.take());
				let outcome = self.state.history.record(unit, coalesce);
				self.state.last_edit_at = Some(now);
				if let RecordOutcome::Pushed { evicted: evicted @ 1.. } = outcome {
					debug!(document = self.shared.id.0, evicted, "undo.evicted");
				}
			}
			Some(_) => self.state.last_edit_at = None,
		}
		self.shared.sync_history_counts(&self.state.history);

		debug!(
			document = self.shared.id.0,
			version = last.new_snapshot().version(),
			replay = ?self.replay,
			"transaction.commit"
		);
		let change = DocumentChange::new(first, last, self.replay);
		self.shared.changed.for_each(|observer| observer(&change));
	}

	pub(crate) fn take_history_unit(&mut self, direction: HistoryDirection) -> Option<UndoUnit> {
		let unit = match direction {
			HistoryDirection::Undo => self.state.history.pop_undo(),
			HistoryDirection::Redo => self.state.history.pop_redo(),
		}?;
		self.shared.sync_history_counts(&self.state.history);
		Some(unit)
	}

	/// Files a replayed unit on the opposite stack.
	pub(crate) fn file_replayed(&mut self, direction: HistoryDirection, unit: UndoUnit) {
		match direction {
			HistoryDirection::Undo => self.state.history.push_redo(unit),
			HistoryDirection::Redo => self.state.history.push_undo_replayed(unit),
		}
		self.shared.sync_history_counts(&self.state.history);
	}

	/// Drops the staged writes unpublished and clears the history.
	///
	/// Staged descriptors were never linked into the document's chain, so
	/// readers and tracking ranges never see them.
	pub(crate) fn abandon(mut self) {
		self.finished = true;
		self.first = None;
		self.last = None;
		self.state.history.clear();
		self.state.last_edit_at = None;
		self.shared.sync_history_counts(&self.state.history);
	}
}

impl Drop for Transaction<'_> {
	fn drop(&mut self) {
		self.finish();
	}
}

impl fmt::Debug for Transaction<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Transaction")
			.field("document", &self.shared.id)
			.field("version", &self.current.version())
			.field("writes", &self.first.is_some())
			.field("replay", &self.replay)
			.field("finished", &self.finished)
			.finish()
	}
}
