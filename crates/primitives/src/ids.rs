use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique view IDs.
static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of the view (caret owner, pane, tool) that instigated an action.
///
/// Undo and redo observers receive it so that only the originating view
/// restores its selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl ViewId {
	/// Generates a new unique view ID.
	pub fn next() -> Self {
		Self(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
	}
}
