//! Ordered observer registries.
//!
//! Observers are called in subscription order. The registry lock is only
//! held to snapshot the current list, so a callback may subscribe or
//! unsubscribe (itself included) without deadlocking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A list of observers of type `T` (usually a `dyn Fn` or a trait object).
pub struct Observers<T: ?Sized> {
	next_id: AtomicU64,
	entries: RwLock<IndexMap<SubscriptionId, Arc<T>, FxBuildHasher>>,
}

impl<T: ?Sized> Default for Observers<T> {
	fn default() -> Self {
		Self {
			next_id: AtomicU64::new(1),
			entries: RwLock::new(IndexMap::default()),
		}
	}
}

impl<T: ?Sized> Observers<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an observer at the end of the list.
	pub fn subscribe(&self, observer: Arc<T>) -> SubscriptionId {
		let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.entries.write().insert(id, observer);
		id
	}

	/// Removes an observer. Returns false if it was already gone.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.entries.write().shift_remove(&id).is_some()
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Calls `f` on every observer, in subscription order.
	pub fn for_each(&self, mut f: impl FnMut(&T)) {
		let current: Vec<Arc<T>> = self.entries.read().values().cloned().collect();
		for observer in &current {
			f(observer);
		}
	}
}

impl<T: ?Sized> std::fmt::Debug for Observers<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observers").field("len", &self.len()).finish()
	}
}
