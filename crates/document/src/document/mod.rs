//! Document - the shared, mutable handle over a chain of immutable snapshots.
//!
//! A [`Document`] publishes its current [`Snapshot`] and the tail of its
//! [`EditDescriptor`] chain through lock-free reads. Writers serialize on a
//! single gate held by a [`Transaction`]; the gate also guards the undo
//! history, so history and chain can never disagree.
//!
//! # Notifications
//!
//! Change observers and history observers run synchronously on the
//! committing thread while the gate is still held, in commit order. An
//! observer must therefore never open a transaction on the document that
//! notified it.


use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, error};
use weft_primitives::{EditDescriptor, Snapshot, TextRange, ViewId};

use crate::config::{ConfigError, DocumentConfig};
use crate::error::DocumentError;
use crate::observers::{Observers, SubscriptionId};
use crate::transaction::Transaction;
use crate::undo::{UndoHistory, UndoUnit};

/// Counter for generating unique document IDs.
static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl DocumentId {
	/// Generates a new unique document ID.
	pub fn next() -> Self {
		Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
	}
}

/// Which way a history replay runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryDirection {
	Undo,
	Redo,
}

/// One committed transaction, as seen by change observers.
///
/// Carries the first and last descriptors the transaction appended; the
/// links in between are reachable through [`changes`](Self::changes).
#[derive(Debug, Clone)]
pub struct DocumentChange {
	first: Arc<EditDescriptor>,
	last: Arc<EditDescriptor>,
	replay: Option<HistoryDirection>,
}

impl DocumentChange {
	pub(crate) fn new(first: Arc<EditDescriptor>, last: Arc<EditDescriptor>, replay: Option<HistoryDirection>) -> Self {
		Self { first, last, replay }
	}

	pub fn first(&self) -> &Arc<EditDescriptor> {
		&self.first
	}

	pub fn last(&self) -> &Arc<EditDescriptor> {
		&self.last
	}

	/// Set when the transaction replayed an undo or redo.
	pub fn replay(&self) -> Option<HistoryDirection> {
		self.replay
	}

	/// Snapshot the document held before the transaction.
	pub fn old_snapshot(&self) -> &Arc<Snapshot> {
		self.first.old_snapshot()
	}

	/// Snapshot the transaction committed.
	pub fn snapshot(&self) -> &Arc<Snapshot> {
		self.last.new_snapshot()
	}

	/// Every descriptor of the transaction, in commit order.
	pub fn changes(&self) -> impl Iterator<Item = Arc<EditDescriptor>> + '_ {
		let mut next = Some(Arc::clone(&self.first));
		std::iter::from_fn(move || {
			let current = next.take()?;
			if !Arc::ptr_eq(&current, &self.last) {
				next = current.next().cloned();
			}
			Some(current)
		})
	}
}

/// Context handed to [`HistoryObserver`]s around an undo or redo.
#[derive(Debug)]
pub struct HistoryEvent<'a> {
	pub unit: &'a UndoUnit,
	/// View that asked for the replay, if any.
	pub instigator: Option<ViewId>,
	pub direction: HistoryDirection,
}

impl HistoryEvent<'_> {
	pub fn is_undo(&self) -> bool {
		self.direction == HistoryDirection::Undo
	}
}

/// Hooks around undo and redo. Both default to doing nothing.
pub trait HistoryObserver: Send + Sync {
	/// Called after the unit is taken off its stack, before any replay write.
	fn before(&self, _event: &HistoryEvent<'_>) {}

	/// Called after the replay committed and change observers ran.
	fn after(&self, _event: &HistoryEvent<'_>) {}
}

pub(crate) type ChangeCallback = dyn Fn(&DocumentChange) + Send + Sync;

/// State only a transaction may touch.
#[derive(Debug)]
pub(crate) struct EditState {
	pub(crate) history: UndoHistory,
	/// Commit time of the last non-replay transaction; `None` right after a
	/// replay so the next edit never merges into replayed history.
	pub(crate) last_edit_at: Option<Instant>,
}

pub(crate) struct Shared {
	pub(crate) id: DocumentId,
	pub(crate) config: DocumentConfig,
	pub(crate) current: ArcSwap<Snapshot>,
	pub(crate) last_change: ArcSwap<EditDescriptor>,
	pub(crate) gate: Mutex<EditState>,
	undo_len: AtomicUsize,
	redo_len: AtomicUsize,
	pub(crate) changed: Observers<ChangeCallback>,
	history_observers: Observers<dyn HistoryObserver>,
}

impl Shared {
	/// Mirrors the history depths for non-blocking reads.
	pub(crate) fn sync_history_counts(&self, history: &UndoHistory) {
		self.undo_len.store(history.undo_len(), Ordering::Release);
		self.redo_len.store(history.redo_len(), Ordering::Release);
	}
}

/// An editable text document.
///
/// Cloning yields another handle to the same document.
#[derive(Clone)]
pub struct Document {
	shared: Arc<Shared>,
}

impl Document {
	/// Creates a document with the default configuration.
	pub fn new(text: &str) -> Self {
		Self::build(text, DocumentConfig::default())
	}

	/// Creates a document with `config`, normalizing `text` if it asks to.
	pub fn with_config(text: &str, config: DocumentConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self::build(text, config))
	}

	fn build(text: &str, config: DocumentConfig) -> Self {
		let snapshot = Arc::new(Snapshot::from_text(text, config.normalization()));
		let root = EditDescriptor::root(Arc::clone(&snapshot));
		let id = DocumentId::next();
		debug!(document = id.0, lines = snapshot.line_count(), chars = snapshot.len_chars(), "document.open");
		Self {
			shared: Arc::new(Shared {
				id,
				gate: Mutex::new(EditState {
					history: UndoHistory::new(config.max_undo),
					last_edit_at: None,
				}),
				config,
				current: ArcSwap::new(snapshot),
				last_change: ArcSwap::new(root),
				undo_len: AtomicUsize::new(0),
				redo_len: AtomicUsize::new(0),
				changed: Observers::new(),
				history_observers: Observers::new(),
			}),
		}
	}

	pub fn id(&self) -> DocumentId {
		self.shared.id
	}

	pub fn config(&self) -> &DocumentConfig {
		&self.shared.config
	}

	/// Current snapshot. Never blocks.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		self.shared.current.load_full()
	}

	/// Tail of the edit chain: the root descriptor until the first commit.
	pub fn last_change(&self) -> Arc<EditDescriptor> {
		self.shared.last_change.load_full()
	}

	/// Current text, with original line endings.
	pub fn text(&self) -> String {
		self.snapshot().to_string()
	}

	/// Opens a transaction, waiting as long as it takes for the gate.
	pub fn transaction(&self) -> Transaction<'_> {
		Transaction::open(&self.shared, self.shared.gate.lock(), None)
	}

	/// Opens a transaction, giving up after `timeout`.
	pub fn try_transaction(&self, timeout: Duration) -> Result<Transaction<'_>, DocumentError> {
		let guard = self
			.shared
			.gate
			.try_lock_for(timeout)
			.ok_or(DocumentError::ConcurrentAccessTimeout(timeout))?;
		Ok(Transaction::open(&self.shared, guard, None))
	}

	pub fn can_undo(&self) -> bool {
		self.undo_len() > 0
	}

	pub fn can_redo(&self) -> bool {
		self.redo_len() > 0
	}

	pub fn undo_len(&self) -> usize {
		self.shared.undo_len.load(Ordering::Acquire)
	}

	pub fn redo_len(&self) -> usize {
		self.shared.redo_len.load(Ordering::Acquire)
	}

	/// Reverts the most recent undo unit.
	///
	/// Returns the restored span of the unit's first edit, or `None` if
	/// there was nothing to undo.
	pub fn undo(&self, instigator: Option<ViewId>) -> Option<TextRange> {
		self.replay(HistoryDirection::Undo, instigator)
	}

	/// Reapplies the most recently undone unit.
	///
	/// Returns the span of the unit's last replacement.
	pub fn redo(&self, instigator: Option<ViewId>) -> Option<TextRange> {
		self.replay(HistoryDirection::Redo, instigator)
	}

	fn replay(&self, direction: HistoryDirection, instigator: Option<ViewId>) -> Option<TextRange> {
		let mut tx = Transaction::open(&self.shared, self.shared.gate.lock(), Some(direction));
		let unit = tx.take_history_unit(direction)?;
		let event = HistoryEvent {
			unit: &unit,
			instigator,
			direction,
		};
		self.shared.history_observers.for_each(|observer| observer.before(&event));

		let mut selection = None;
		let replayed = match direction {
			HistoryDirection::Undo => unit.changes().iter().rev().try_for_each(|change| {
				selection = Some(tx.stage(change.start(), change.new_end(), Arc::clone(change.pre_image()))?);
				Ok::<_, DocumentError>(())
			}),
			HistoryDirection::Redo => unit.changes().iter().try_for_each(|change| {
				selection = Some(tx.stage(change.start(), change.old_end(), Arc::clone(change.replacement()))?);
				Ok::<_, DocumentError>(())
			}),
		};
		if let Err(error) = replayed {
			error!(document = self.shared.id.0, ?direction, %error, "history unit does not match document, history discarded");
			tx.abandon();
			return None;
		}

		tx.finish();
		self.shared.history_observers.for_each(|observer| observer.after(&event));
		debug!(document = self.shared.id.0, ?direction, changes = unit.len(), ?instigator, "document.history_replay");
		tx.file_replayed(direction, unit);
		selection
	}

	/// Subscribes to committed transactions.
	pub fn subscribe(&self, observer: impl Fn(&DocumentChange) + Send + Sync + 'static) -> SubscriptionId {
		self.shared.changed.subscribe(Arc::new(observer))
	}

	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.shared.changed.unsubscribe(id)
	}

	#[cfg(test)]
	pub(crate) fn change_observer_count(&self) -> usize {
		self.shared.changed.len()
	}

	/// Registers undo/redo hooks.
	pub fn add_history_observer(&self, observer: Arc<dyn HistoryObserver>) -> SubscriptionId {
		self.shared.history_observers.subscribe(observer)
	}

	pub fn remove_history_observer(&self, id: SubscriptionId) -> bool {
		self.shared.history_observers.unsubscribe(id)
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document")
			.field("id", &self.shared.id)
			.field("version", &self.shared.current.load().version())
			.field("undo_len", &self.undo_len())
			.field("redo_len", &self.redo_len())
			.finish()
	}
}
