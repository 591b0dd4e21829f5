//! Format annotations and their per-line index.
//!
//! Annotations are produced against one snapshot and published together
//! with the descriptor that produced that snapshot. Readers remap them
//! through later descriptors instead of waiting for a fresh parse.

use std::sync::Arc;

use weft_primitives::{EditDescriptor, RangeTracking, TextRange};

/// One formatted span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatSpan {
	pub range: TextRange,
	pub class: Arc<str>,
}

impl FormatSpan {
	pub fn new(range: TextRange, class: impl Into<Arc<str>>) -> Self {
		Self {
			range,
			class: class.into(),
		}
	}
}

/// Sorts spans into index order: by start, then end.
pub(crate) fn sort_spans(spans: &mut [FormatSpan]) {
	spans.sort_by(|a, b| a.range.start.cmp(&b.range.start).then(a.range.end.cmp(&b.range.end)));
}

/// Spans sorted by start, searchable by line.
///
/// `max_end_line[i]` is the largest end line among `spans[..=i]`. It is
/// non-decreasing, which makes the first span that can reach a line
/// findable by binary search even though spans overlap.
#[derive(Debug, Default)]
struct SpanIndex {
	spans: Vec<FormatSpan>,
	max_end_line: Vec<usize>,
}

impl SpanIndex {
	fn new(mut spans: Vec<FormatSpan>) -> Self {
		sort_spans(&mut spans);
		let max_end_line = spans
			.iter()
			.scan(0, |max, span| {
				*max = (*max).max(span.range.end.line);
				Some(*max)
			})
			.collect();
		Self { spans, max_end_line }
	}

	/// Candidate window for `line`: every span touching it lies inside.
	fn window(&self, line: usize) -> &[FormatSpan] {
		let first_overlapping = self.max_end_line.partition_point(|&end| end < line);
		let first_beyond = self.spans.partition_point(|span| span.range.start.line <= line);
		if first_overlapping >= first_beyond {
			return &[];
		}
		&self.spans[first_overlapping..first_beyond]
	}
}

/// A published parse result.
#[derive(Debug, Clone)]
pub struct FormatData {
	index: Arc<SpanIndex>,
	as_of: Arc<EditDescriptor>,
	generation: u64,
}

impl FormatData {
	pub(crate) fn new(spans: Vec<FormatSpan>, as_of: Arc<EditDescriptor>, generation: u64) -> Self {
		Self {
			index: Arc::new(SpanIndex::new(spans)),
			as_of,
			generation,
		}
	}

	/// Descriptor whose new snapshot the spans were computed against.
	pub fn as_of(&self) -> &Arc<EditDescriptor> {
		&self.as_of
	}

	/// Parse generation that produced this data.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Every span, sorted by start.
	pub fn spans(&self) -> &[FormatSpan] {
		&self.index.spans
	}

	pub fn len(&self) -> usize {
		self.index.spans.len()
	}

	pub fn is_empty(&self) -> bool {
		self.index.spans.is_empty()
	}

	/// Spans touching `line` of the as-of snapshot.
	pub fn for_line(&self, line: usize) -> LineFormat {
		let spans = self
			.index
			.window(line)
			.iter()
			.filter(|span| span.range.touches_line(line))
			.cloned()
			.collect();
		LineFormat {
			line,
			spans,
			as_of: Arc::clone(&self.as_of),
		}
	}
}

/// Spans for one line, valid as of a descriptor.
#[derive(Debug, Clone)]
pub struct LineFormat {
	/// Line in the as-of snapshot.
	pub line: usize,
	pub spans: Vec<FormatSpan>,
	pub as_of: Arc<EditDescriptor>,
}

impl LineFormat {
	/// Carries the spans through every edit committed after the as-of
	/// descriptor.
	pub fn remap_to_latest(&self) -> Vec<FormatSpan> {
		self.remap_until(|_| false)
	}

	/// Carries the spans through the chain up to and including `target`.
	///
	/// If `target` is not a successor of the as-of descriptor the spans are
	/// remapped through the whole chain.
	pub fn remap_to(&self, target: &Arc<EditDescriptor>) -> Vec<FormatSpan> {
		if Arc::ptr_eq(&self.as_of, target) {
			return self.spans.clone();
		}
		self.remap_until(|link| Arc::ptr_eq(link, target))
	}

	fn remap_until(&self, mut is_last: impl FnMut(&Arc<EditDescriptor>) -> bool) -> Vec<FormatSpan> {
		let mut spans = self.spans.clone();
		for link in self.as_of.successors() {
			for span in &mut spans {
				span.range = link.remap_range(span.range, RangeTracking::EDGE_EXCLUSIVE);
			}
			if is_last(&link) {
				break;
			}
		}
		spans.retain(|span| !span.range.is_empty());
		spans
	}
}
