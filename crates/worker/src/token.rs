use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Issues generations for one stream of work where each new piece
/// supersedes the previous one.
///
/// Clones share the counter.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	issued: Arc<AtomicU64>,
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Token for the next generation, strictly newer than every token
	/// issued before it by any clone. The first generation is 1.
	pub fn issue(&self) -> GenerationToken {
		let generation = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
		GenerationToken::new(generation)
	}

	/// Newest generation issued so far, 0 before the first.
	pub fn latest(&self) -> u64 {
		self.issued.load(Ordering::Acquire)
	}
}

/// Cooperative cancel flag tagged with the generation it belongs to.
///
/// Cancelling never interrupts the holder; long-running work polls
/// [`is_cancelled`](Self::is_cancelled) at its own granularity.
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	flag: CancellationToken,
}

impl GenerationToken {
	/// Token for `generation` with its own cancellation root.
	pub fn new(generation: u64) -> Self {
		Self {
			generation,
			flag: CancellationToken::new(),
		}
	}

	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_cancelled(&self) -> bool {
		self.flag.is_cancelled()
	}

	pub fn cancel(&self) {
		self.flag.cancel();
	}

	/// Token in the same generation that is cancelled with this one but
	/// can also be cancelled on its own.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			flag: self.flag.child_token(),
		}
	}
}
