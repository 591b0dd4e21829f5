//! Ranges that stay valid while the document changes underneath them.
//!
//! A [`TrackingRange`] remembers the last edit descriptor it has consumed.
//! On every committed transaction it walks each unconsumed link of the
//! chain in order, so a transaction with several writes moves the range
//! exactly as replaying those writes one by one would.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use weft_primitives::{EditDescriptor, RangeTracking, TextLocation, TextRange, Tracking};

use crate::document::Document;
use crate::error::DocumentError;
use crate::observers::{Observers, SubscriptionId};

/// Payload of a tracking range's changed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMoved {
	pub old: TextRange,
	pub new: TextRange,
}

type MovedCallback = dyn Fn(&RangeMoved) + Send + Sync;

#[derive(Debug)]
struct TrackingState {
	range: TextRange,
	tracking: RangeTracking,
	consumed: Arc<EditDescriptor>,
}

impl TrackingState {
	/// Replays every link after `consumed`. Returns the move, if any link
	/// altered the range.
	///
	/// A range moved away and back within one transaction still counts as
	/// moved, with `old == new`.
	fn advance(&mut self) -> Option<RangeMoved> {
		let old = self.range;
		let mut altered = false;
		for link in self.consumed.successors() {
			let next = link.remap_range(self.range, self.tracking);
			altered |= next != self.range;
			self.range = next;
			self.consumed = link;
		}
		altered.then_some(RangeMoved { old, new: self.range })
	}
}

fn advance_and_notify(state: &Mutex<TrackingState>, moved: &Observers<MovedCallback>) {
	let Some(event) = state.lock().advance() else {
		return;
	};
	trace!(old = %event.old, new = %event.new, "tracking.moved");
	moved.for_each(|observer| observer(&event));
}

/// A range bound to a document that follows every edit.
pub struct TrackingRange {
	document: Document,
	state: Arc<Mutex<TrackingState>>,
	moved: Arc<Observers<MovedCallback>>,
	subscription: Option<SubscriptionId>,
}

impl TrackingRange {
	/// Binds `range`, which must be valid in the document's current snapshot.
	pub fn new(document: &Document, range: TextRange, tracking: RangeTracking) -> Result<Self, DocumentError> {
		let consumed = document.last_change();
		consumed.new_snapshot().validate_range(range.start, range.end)?;

		let state = Arc::new(Mutex::new(TrackingState {
			range,
			tracking,
			consumed,
		}));
		let moved: Arc<Observers<MovedCallback>> = Arc::new(Observers::new());
		let subscription = {
			let state = Arc::clone(&state);
			let moved = Arc::clone(&moved);
			document.subscribe(move |_| advance_and_notify(&state, &moved))
		};
		// A commit between reading the tail and subscribing is picked up here.
		state.lock().advance();

		Ok(Self {
			document: document.clone(),
			state,
			moved,
			subscription: Some(subscription),
		})
	}

	/// The range in the latest snapshot.
	pub fn range(&self) -> TextRange {
		self.state.lock().range
	}

	pub fn tracking(&self) -> RangeTracking {
		self.state.lock().tracking
	}

	/// Last descriptor the range has been carried through.
	pub fn as_of(&self) -> Arc<EditDescriptor> {
		Arc::clone(&self.state.lock().consumed)
	}

	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Subscribes to moves of this range.
	pub fn on_moved(&self, observer: impl Fn(&RangeMoved) + Send + Sync + 'static) -> SubscriptionId {
		self.moved.subscribe(Arc::new(observer))
	}

	pub fn remove_moved(&self, id: SubscriptionId) -> bool {
		self.moved.unsubscribe(id)
	}

	pub fn is_disposed(&self) -> bool {
		self.subscription.is_none()
	}

	/// Stops following the document. The range keeps its last value.
	pub fn dispose(&mut self) {
		if let Some(id) = self.subscription.take() {
			self.document.unsubscribe(id);
		}
	}
}

impl Drop for TrackingRange {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for TrackingRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.lock();
		f.debug_struct("TrackingRange")
			.field("document", &self.document.id())
			.field("range", &state.range)
			.field("tracking", &state.tracking)
			.field("disposed", &self.subscription.is_none())
			.finish()
	}
}

/// A zero-width [`TrackingRange`].
#[derive(Debug)]
pub struct TrackingPoint {
	inner: TrackingRange,
}

impl TrackingPoint {
	pub fn new(document: &Document, at: TextLocation, tracking: Tracking) -> Result<Self, DocumentError> {
		let tracking = RangeTracking {
			start: tracking,
			end: tracking,
		};
		Ok(Self {
			inner: TrackingRange::new(document, TextRange::point(at), tracking)?,
		})
	}

	pub fn location(&self) -> TextLocation {
		self.inner.range().start
	}

	pub fn on_moved(&self, observer: impl Fn(&RangeMoved) + Send + Sync + 'static) -> SubscriptionId {
		self.inner.on_moved(observer)
	}

	pub fn dispose(&mut self) {
		self.inner.dispose();
	}
}

/// Presentation hints for a highlight. Opaque to the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighlightStyle {
	/// Style class name, resolved by the renderer.
	pub class: Arc<str>,
	/// Higher priority draws on top.
	pub priority: i32,
}

impl HighlightStyle {
	pub fn new(class: impl Into<Arc<str>>, priority: i32) -> Self {
		Self {
			class: class.into(),
			priority,
		}
	}
}

/// A tracking range with a highlight style.
#[derive(Debug)]
pub struct HighlightRange {
	range: TrackingRange,
	style: HighlightStyle,
}

impl HighlightRange {
	/// Creates an edge-exclusive highlight over `range`.
	pub fn new(document: &Document, range: TextRange, style: HighlightStyle) -> Result<Self, DocumentError> {
		Ok(Self {
			range: TrackingRange::new(document, range, RangeTracking::EDGE_EXCLUSIVE)?,
			style,
		})
	}

	pub fn range(&self) -> TextRange {
		self.range.range()
	}

	pub fn style(&self) -> &HighlightStyle {
		&self.style
	}

	pub fn tracking_range(&self) -> &TrackingRange {
		&self.range
	}

	pub fn dispose(&mut self) {
		self.range.dispose();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	fn loc(line: usize, index: usize) -> TextLocation {
		TextLocation::new(line, index)
	}

	#[test]
	fn range_follows_edits_before_it() {
		let doc = Document::new("alpha beta\ngamma");
		let tracked = TrackingRange::new(&doc, TextRange::new(loc(0, 6), loc(0, 10)), RangeTracking::EDGE_EXCLUSIVE).expect("valid");

		let mut tx = doc.transaction();
		tx.insert(loc(0, 0), "new\n").expect("insert");
		tx.commit();

		let range = tracked.range();
		assert_eq!(range, TextRange::new(loc(1, 6), loc(1, 10)));
		assert_eq!(doc.snapshot().text(range.start, range.end).expect("range"), "beta");
	}

	#[test]
	fn moved_fires_only_when_range_changes() {
		let doc = Document::new("abc def");
		let tracked = TrackingRange::new(&doc, TextRange::new(loc(0, 0), loc(0, 3)), RangeTracking::EDGE_EXCLUSIVE).expect("valid");
		let fired = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&fired);
		tracked.on_moved(move |event| {
			assert_ne!(event.old, event.new);
			counter.fetch_add(1, Ordering::Relaxed);
		});

		doc.transaction().insert(loc(0, 7), "!").expect("after range");
		assert_eq!(fired.load(Ordering::Relaxed), 0);

		doc.transaction().insert(loc(0, 0), ">").expect("before range");
		assert_eq!(fired.load(Ordering::Relaxed), 1);
		assert_eq!(tracked.range(), TextRange::new(loc(0, 1), loc(0, 4)));
	}

	#[test]
	fn moved_fires_when_a_transaction_moves_range_and_back() {
		let doc = Document::new("abc def");
		let original = TextRange::new(loc(0, 0), loc(0, 3));
		let tracked = TrackingRange::new(&doc, original, RangeTracking::EDGE_EXCLUSIVE).expect("valid");
		let events = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&events);
		tracked.on_moved(move |event| sink.lock().push(*event));

		{
			let mut tx = doc.transaction();
			tx.insert(loc(0, 0), ">").expect("insert");
			tx.delete(loc(0, 0), loc(0, 1)).expect("delete");
		}
		assert_eq!(doc.text(), "abc def");
		assert_eq!(tracked.range(), original);
		assert_eq!(*events.lock(), vec![RangeMoved { old: original, new: original }]);
	}

	#[test]
	fn dispose_stops_tracking() {
		let doc = Document::new("abc");
		let mut tracked = TrackingRange::new(&doc, TextRange::point(loc(0, 1)), RangeTracking::POSITIVE).expect("valid");
		tracked.dispose();
		assert!(tracked.is_disposed());
		doc.transaction().insert(loc(0, 0), "xx").expect("insert");
		assert_eq!(tracked.range(), TextRange::point(loc(0, 1)));
	}

	#[test]
	fn dropped_range_unsubscribes() {
		let doc = Document::new("abc");
		let before = doc.change_observer_count();
		let tracked = TrackingRange::new(&doc, TextRange::point(loc(0, 1)), RangeTracking::POSITIVE).expect("valid");
		assert_eq!(doc.change_observer_count(), before + 1);
		drop(tracked);
		assert_eq!(doc.change_observer_count(), before);
	}

	#[test]
	fn invalid_range_is_rejected() {
		let doc = Document::new("abc");
		let err = TrackingRange::new(&doc, TextRange::new(loc(0, 0), loc(3, 0)), RangeTracking::default()).unwrap_err();
		assert!(matches!(err, DocumentError::Edit(_)));
	}

	#[test]
	fn point_tracking_resolves_insertions_by_mode() {
		let doc = Document::new("ab");
		let negative = TrackingPoint::new(&doc, loc(0, 1), Tracking::Negative).expect("valid");
		let positive = TrackingPoint::new(&doc, loc(0, 1), Tracking::Positive).expect("valid");
		doc.transaction().insert(loc(0, 1), "XYZ").expect("insert");
		assert_eq!(negative.location(), loc(0, 1));
		assert_eq!(positive.location(), loc(0, 4));
	}

	#[test]
	fn highlight_keeps_style_and_tracks() {
		let doc = Document::new("let x = 1;");
		let highlight = HighlightRange::new(&doc, TextRange::new(loc(0, 4), loc(0, 5)), HighlightStyle::new("variable", 3)).expect("valid");
		doc.transaction().insert(loc(0, 0), "    ").expect("indent");
		assert_eq!(highlight.range(), TextRange::new(loc(0, 8), loc(0, 9)));
		assert_eq!(&*highlight.style().class, "variable");
	}

	fn arb_edits() -> impl Strategy<Value = Vec<(usize, usize, String)>> {
		prop::collection::vec((0usize..30, 0usize..6, "[uv\n]{0,3}"), 1..8)
	}

	proptest! {
		#[test]
		fn prop_range_across_transactions_equals_manual_remap(
			edits in arb_edits(),
			a in 0usize..20,
			b in 0usize..20,
		) {
			let doc = Document::new("first line\nsecond\nthird one");
			let base = doc.snapshot();
			let (start, _) = base.offset_by_character(TextLocation::ZERO, a.min(b) as isize).expect("valid");
			let (end, _) = base.offset_by_character(TextLocation::ZERO, a.max(b) as isize).expect("valid");
			let original = TextRange::new(start, end);
			let root = doc.last_change();
			let tracked = TrackingRange::new(&doc, original, RangeTracking::EDGE_INCLUSIVE).expect("valid");

			for (at, len, text) in edits {
				let current = doc.snapshot();
				let (lo, _) = current.offset_by_character(TextLocation::ZERO, at as isize).expect("valid");
				let (hi, _) = current.offset_by_character(lo, len as isize).expect("valid");
				doc.transaction().write(lo, hi, &text).expect("write");
			}

			let manual = root
				.successors()
				.fold(original, |range, link| link.remap_range(range, RangeTracking::EDGE_INCLUSIVE));
			prop_assert_eq!(tracked.range(), manual);
		}
	}
}
