//! Editable documents built on immutable snapshots.
//!
//! A [`Document`] owns the current [`Snapshot`](weft_primitives::Snapshot),
//! the tail of its edit chain and its undo history. All mutation goes
//! through a [`Transaction`], which holds the document's write gate for its
//! whole lifetime and publishes its edits exactly once when dropped.
//! [`TrackingRange`]s follow the edit chain to keep positions valid.

pub mod config;
pub mod document;
pub mod error;
pub mod observers;
pub mod tracking;
pub mod transaction;
pub mod undo;

pub use config::{ConfigError, DocumentConfig};
pub use document::{Document, DocumentChange, DocumentId, HistoryDirection, HistoryEvent, HistoryObserver};
pub use error::DocumentError;
pub use observers::{Observers, SubscriptionId};
pub use tracking::{HighlightRange, HighlightStyle, RangeMoved, TrackingPoint, TrackingRange};
pub use transaction::Transaction;
pub use undo::{EditKind, RecordOutcome, TypingMetadata, UndoHistory, UndoMetadata, UndoUnit};
