use std::fmt;

/// A coordinate within one specific snapshot.
///
/// `index` counts characters from the start of `line` and may equal the
/// line length (the position just before the end-of-line marker). Locations
/// order by line, then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextLocation {
	pub line: usize,
	pub index: usize,
}

impl TextLocation {
	/// The first location of every snapshot.
	pub const ZERO: TextLocation = TextLocation { line: 0, index: 0 };

	pub const fn new(line: usize, index: usize) -> Self {
		Self { line, index }
	}
}

impl fmt::Display for TextLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.index)
	}
}

impl From<(usize, usize)> for TextLocation {
	fn from((line, index): (usize, usize)) -> Self {
		Self::new(line, index)
	}
}

/// A span between two locations of the same snapshot, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextRange {
	pub start: TextLocation,
	pub end: TextLocation,
}

impl TextRange {
	/// Creates a range, swapping the ends if they are given out of order.
	pub fn new(a: TextLocation, b: TextLocation) -> Self {
		if a <= b { Self { start: a, end: b } } else { Self { start: b, end: a } }
	}

	/// Creates a zero-width range at `at`.
	pub const fn point(at: TextLocation) -> Self {
		Self { start: at, end: at }
	}

	/// Returns true if the range covers no text.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Returns true if `at` lies within `[start, end]`.
	pub fn contains(&self, at: TextLocation) -> bool {
		self.start <= at && at <= self.end
	}

	/// Returns true if any part of the range lies on `line`.
	pub fn touches_line(&self, line: usize) -> bool {
		self.start.line <= line && line <= self.end.line
	}
}

impl fmt::Display for TextRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}..{}", self.start, self.end)
	}
}

/// How a position resolves when an edit lands exactly on it or swallows it.
///
/// A negative position stays anchored before an insertion at its location;
/// a positive one moves after it. When the surrounding text is replaced, a
/// negative position snaps to the start of the replacement and a positive
/// one to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tracking {
	#[default]
	Negative,
	Positive,
}

/// Per-end tracking for a [`TextRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeTracking {
	pub start: Tracking,
	pub end: Tracking,
}

impl RangeTracking {
	/// Insertions at either edge land outside the range.
	pub const EDGE_EXCLUSIVE: Self = Self {
		start: Tracking::Positive,
		end: Tracking::Negative,
	};
	/// Insertions at either edge land inside the range.
	pub const EDGE_INCLUSIVE: Self = Self {
		start: Tracking::Negative,
		end: Tracking::Positive,
	};
	/// Both ends move after insertions at their location.
	pub const POSITIVE: Self = Self {
		start: Tracking::Positive,
		end: Tracking::Positive,
	};
	/// Both ends stay before insertions at their location.
	pub const NEGATIVE: Self = Self {
		start: Tracking::Negative,
		end: Tracking::Negative,
	};
}

impl Default for RangeTracking {
	fn default() -> Self {
		Self::EDGE_EXCLUSIVE
	}
}
