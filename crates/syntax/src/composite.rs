//! Merges analyzers and highlight ranges into per-line styling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use weft_document::{Document, HighlightRange};
use weft_primitives::TextRange;

use crate::analyzer::IncrementalAnalyzer;

/// Registration handle for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

/// A styled character span within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
	pub start: usize,
	pub end: usize,
	pub class: Arc<str>,
	pub priority: i32,
}

struct AnalyzerEntry {
	analyzer: Arc<IncrementalAnalyzer>,
	priority: i32,
}

/// Styling sources for one document.
pub struct ProviderComposite {
	document: Document,
	next_id: AtomicU64,
	analyzers: RwLock<IndexMap<ProviderId, AnalyzerEntry, FxBuildHasher>>,
	highlights: RwLock<IndexMap<ProviderId, Arc<HighlightRange>, FxBuildHasher>>,
}

impl ProviderComposite {
	pub fn new(document: &Document) -> Self {
		Self {
			document: document.clone(),
			next_id: AtomicU64::new(1),
			analyzers: RwLock::new(IndexMap::default()),
			highlights: RwLock::new(IndexMap::default()),
		}
	}

	fn next_id(&self) -> ProviderId {
		ProviderId(self.next_id.fetch_add(1, Ordering::Relaxed))
	}

	/// Adds an analyzer whose spans are drawn at `priority`.
	pub fn add_analyzer(&self, analyzer: Arc<IncrementalAnalyzer>, priority: i32) -> ProviderId {
		let id = self.next_id();
		self.analyzers.write().insert(id, AnalyzerEntry { analyzer, priority });
		id
	}

	pub fn remove_analyzer(&self, id: ProviderId) -> Option<Arc<IncrementalAnalyzer>> {
		self.analyzers.write().shift_remove(&id).map(|entry| entry.analyzer)
	}

	pub fn add_highlight(&self, highlight: Arc<HighlightRange>) -> ProviderId {
		let id = self.next_id();
		self.highlights.write().insert(id, highlight);
		id
	}

	pub fn remove_highlight(&self, id: ProviderId) -> Option<Arc<HighlightRange>> {
		self.highlights.write().shift_remove(&id)
	}

	/// Styled spans for `line` of the current snapshot, sorted by start
	/// index, then priority.
	///
	/// Analyzer spans are remapped from the snapshot they were computed
	/// against. Until an analyzer catches up after line-count changes, its
	/// spans for a line are looked up by the same line number in its
	/// snapshot and then remapped, so they may briefly be missing.
	pub fn format_line(&self, line: usize) -> Vec<StyledSpan> {
		let latest = self.document.last_change();
		let Some(line_len) = latest.new_snapshot().line(line).map(|text| text.char_len()) else {
			return Vec::new();
		};

		let mut out = Vec::new();
		let analyzers: Vec<(Arc<IncrementalAnalyzer>, i32)> = self
			.analyzers
			.read()
			.values()
			.map(|entry| (Arc::clone(&entry.analyzer), entry.priority))
			.collect();
		for (analyzer, priority) in analyzers {
			let Some(format) = analyzer.get_format_data_for_line(line) else {
				continue;
			};
			for span in format.remap_to(&latest) {
				if let Some((start, end)) = clip(span.range, line, line_len) {
					out.push(StyledSpan {
						start,
						end,
						class: span.class,
						priority,
					});
				}
			}
		}

		for highlight in self.highlights.read().values() {
			if let Some((start, end)) = clip(highlight.range(), line, line_len) {
				let style = highlight.style();
				out.push(StyledSpan {
					start,
					end,
					class: Arc::clone(&style.class),
					priority: style.priority,
				});
			}
		}

		out.sort_by(|a, b| {
			a.start
				.cmp(&b.start)
				.then(a.priority.cmp(&b.priority))
				.then_with(|| a.class.cmp(&b.class))
		});
		out
	}
}

/// Part of `range` on `line`, as character indices. Empty parts are dropped.
fn clip(range: TextRange, line: usize, line_len: usize) -> Option<(usize, usize)> {
	if !range.touches_line(line) {
		return None;
	}
	let start = if range.start.line < line { 0 } else { range.start.index.min(line_len) };
	let end = if range.end.line > line { line_len } else { range.end.index.min(line_len) };
	(start < end).then_some((start, end))
}

impl std::fmt::Debug for ProviderComposite {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProviderComposite")
			.field("document", &self.document.id())
			.field("analyzers", &self.analyzers.read().len())
			.field("highlights", &self.highlights.read().len())
			.finish()
	}
}
