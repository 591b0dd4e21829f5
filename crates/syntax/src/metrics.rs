//! Analyzer episode counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters updated by parse episodes.
#[derive(Debug, Default)]
pub(crate) struct AnalyzerMetrics {
	started: AtomicU64,
	installed: AtomicU64,
	stale: AtomicU64,
	cancelled: AtomicU64,
	last_parse_us: AtomicU64,
}

impl AnalyzerMetrics {
	pub(crate) fn record_started(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_installed(&self, elapsed: Duration) {
		self.installed.fetch_add(1, Ordering::Relaxed);
		self.last_parse_us
			.store(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX), Ordering::Relaxed);
	}

	pub(crate) fn record_stale(&self) {
		self.stale.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cancelled(&self) {
		self.cancelled.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> AnalyzerStats {
		AnalyzerStats {
			started: self.started.load(Ordering::Relaxed),
			installed: self.installed.load(Ordering::Relaxed),
			stale: self.stale.load(Ordering::Relaxed),
			cancelled: self.cancelled.load(Ordering::Relaxed),
			last_parse: Duration::from_micros(self.last_parse_us.load(Ordering::Relaxed)),
		}
	}
}

/// Point-in-time copy of an analyzer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
	/// Episodes started.
	pub started: u64,
	/// Episodes whose result was published.
	pub installed: u64,
	/// Episodes that finished after being superseded; their result was dropped.
	pub stale: u64,
	/// Episodes whose parser stopped early on cancellation.
	pub cancelled: u64,
	/// Duration of the last published parse.
	pub last_parse: Duration,
}
