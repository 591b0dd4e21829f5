//! Edit descriptors and the change chain.
//!
//! Every committed edit is recorded as an [`EditDescriptor`]: the snapshot
//! before and after, the edited span and the replacement. Descriptors form a
//! singly linked chain through a next link that is assigned exactly once, so
//! anyone holding a stale location together with the descriptor it was
//! valid after can replay every later edit without the document knowing
//! about them.
//!
//! # Remapping
//!
//! A location `L` is carried across a change `C` as follows:
//!
//! 1. `C` starts after `L` (or exactly at `L` for negative tracking): `L`
//!    is unchanged.
//! 2. `L` lies inside the replaced span (`L <= C.old_end`): `L` snaps to
//!    `C.start` (negative) or `C.new_end` (positive).
//! 3. `L` lies after the span: on the span's last line both line and index
//!    shift; on later lines only the line shifts.

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::EditError;
use crate::location::{RangeTracking, TextLocation, TextRange, Tracking};
use crate::snapshot::Snapshot;

/// One replacement, with everything needed to remap positions across it and
/// to undo or redo it.
pub struct EditDescriptor {
	old: Arc<Snapshot>,
	new: Arc<Snapshot>,
	start: TextLocation,
	old_end: TextLocation,
	new_end: TextLocation,
	replacement: Arc<Snapshot>,
	/// Text removed by the edit.
	pre_image: Arc<Snapshot>,
	root: bool,
	next: OnceLock<Arc<EditDescriptor>>,
}

impl EditDescriptor {
	/// Creates the first link of a chain. It records no change.
	pub fn root(snapshot: Arc<Snapshot>) -> Arc<Self> {
		let empty = Arc::new(Snapshot::empty());
		Arc::new(Self {
			old: Arc::clone(&snapshot),
			new: snapshot,
			start: TextLocation::ZERO,
			old_end: TextLocation::ZERO,
			new_end: TextLocation::ZERO,
			replacement: Arc::clone(&empty),
			pre_image: empty,
			root: true,
			next: OnceLock::new(),
		})
	}

	/// Applies `replacement` over `start..end` of `old`.
	///
	/// Fails without side effects if the range is invalid for `old`. The new
	/// descriptor is not linked to anything yet.
	pub fn apply(old: Arc<Snapshot>, start: TextLocation, end: TextLocation, replacement: Arc<Snapshot>) -> Result<Arc<Self>, EditError> {
		let pre_image = old.subrange(start, end)?;
		let new = old.apply_edit(start, end, &replacement)?;
		Ok(Arc::new(Self {
			new_end: Snapshot::end_of_insertion(start, &replacement),
			old,
			new: Arc::new(new),
			start,
			old_end: end,
			replacement,
			pre_image: Arc::new(pre_image),
			root: false,
			next: OnceLock::new(),
		}))
	}

	pub fn old_snapshot(&self) -> &Arc<Snapshot> {
		&self.old
	}

	pub fn new_snapshot(&self) -> &Arc<Snapshot> {
		&self.new
	}

	pub fn start(&self) -> TextLocation {
		self.start
	}

	/// End of the replaced span in the old snapshot.
	pub fn old_end(&self) -> TextLocation {
		self.old_end
	}

	/// End of the replacement in the new snapshot.
	pub fn new_end(&self) -> TextLocation {
		self.new_end
	}

	/// Replaced span in the old snapshot.
	pub fn old_range(&self) -> TextRange {
		TextRange {
			start: self.start,
			end: self.old_end,
		}
	}

	/// Replacement span in the new snapshot.
	pub fn new_range(&self) -> TextRange {
		TextRange {
			start: self.start,
			end: self.new_end,
		}
	}

	pub fn replacement(&self) -> &Arc<Snapshot> {
		&self.replacement
	}

	/// Text the edit removed from the old snapshot.
	pub fn pre_image(&self) -> &Arc<Snapshot> {
		&self.pre_image
	}

	/// Returns true for the chain's first link, which records no change.
	pub fn is_root(&self) -> bool {
		self.root
	}

	/// The edit committed right after this one, if any.
	pub fn next(&self) -> Option<&Arc<EditDescriptor>> {
		self.next.get()
	}

	/// Links the edit that follows this one.
	///
	/// # Panics
	///
	/// Panics if the link was already assigned: the chain is append-only and
	/// a second assignment means two writers believed they owned the tail.
	pub fn set_next(&self, next: Arc<EditDescriptor>) {
		if self.next.set(next).is_err() {
			panic!("edit descriptor next link assigned twice");
		}
	}

	/// Iterates every link after `self`, in commit order.
	pub fn successors(self: &Arc<Self>) -> ChainIter {
		ChainIter {
			next: self.next().cloned(),
		}
	}

	/// Follows the chain to its current tail (`self` if nothing follows).
	pub fn latest(self: &Arc<Self>) -> Arc<Self> {
		self.successors().last().unwrap_or_else(|| Arc::clone(self))
	}

	/// Carries `at`, a location in the old snapshot, into the new snapshot.
	pub fn remap(&self, at: TextLocation, tracking: Tracking) -> TextLocation {
		if self.root {
			return at;
		}
		if self.start > at || (tracking == Tracking::Negative && self.start == at) {
			return at;
		}
		if self.old_end >= at {
			return match tracking {
				Tracking::Negative => self.start,
				Tracking::Positive => self.new_end,
			};
		}
		if at.line == self.old_end.line {
			TextLocation::new(self.new_end.line, self.new_end.index + (at.index - self.old_end.index))
		} else {
			TextLocation::new(at.line - self.old_end.line + self.new_end.line, at.index)
		}
	}

	/// Carries both ends of `range` across this edit.
	///
	/// An end that would cross the start collapses onto it.
	pub fn remap_range(&self, range: TextRange, tracking: RangeTracking) -> TextRange {
		let start = self.remap(range.start, tracking.start);
		let end = self.remap(range.end, tracking.end).max(start);
		TextRange { start, end }
	}

	/// Replays every link after `self` on `at`.
	///
	/// Returns the remapped location and the last link consumed.
	pub fn remap_through(self: &Arc<Self>, at: TextLocation, tracking: Tracking) -> (TextLocation, Arc<Self>) {
		let mut consumed = Arc::clone(self);
		let mut at = at;
		for link in self.successors() {
			at = link.remap(at, tracking);
			consumed = link;
		}
		(at, consumed)
	}

	/// Range counterpart of [`remap_through`](Self::remap_through).
	pub fn remap_range_through(self: &Arc<Self>, range: TextRange, tracking: RangeTracking) -> (TextRange, Arc<Self>) {
		let mut consumed = Arc::clone(self);
		let mut range = range;
		for link in self.successors() {
			range = link.remap_range(range, tracking);
			consumed = link;
		}
		(range, consumed)
	}
}

impl Drop for EditDescriptor {
	fn drop(&mut self) {
		// Unlink iteratively so a long uniquely owned chain does not recurse.
		let mut next = self.next.take();
		while let Some(link) = next {
			match Arc::try_unwrap(link) {
				Ok(mut owned) => next = owned.next.take(),
				Err(_) => break,
			}
		}
	}
}

impl fmt::Debug for EditDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EditDescriptor")
			.field("root", &self.root)
			.field("old_version", &self.old.version())
			.field("new_version", &self.new.version())
			.field("start", &self.start)
			.field("old_end", &self.old_end)
			.field("new_end", &self.new_end)
			.field("linked", &self.next.get().is_some())
			.finish()
	}
}

/// Iterator over the links following a descriptor.
#[derive(Debug)]
pub struct ChainIter {
	next: Option<Arc<EditDescriptor>>,
}

impl Iterator for ChainIter {
	type Item = Arc<EditDescriptor>;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next.take()?;
		self.next = current.next().cloned();
		Some(current)
	}
}
