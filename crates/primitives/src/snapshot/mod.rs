//! Immutable document content.
//!
//! A [`Snapshot`] stores its lines in three parts: the lines before the
//! active line, the active line itself and the lines after it. The active
//! line is the most recently edited one; keeping it outside the two arrays
//! lets consecutive edits on that line share both arrays with the previous
//! snapshot instead of rebuilding them.
//!
//! ```text
//! before: Arc<Vec<Arc<Line>>>   lines 0 .. k
//! active: Arc<Line>             line  k
//! after:  Arc<Vec<Arc<Line>>>   lines k+1 .. n
//! ```
//!
//! Edits never touch an existing snapshot. See [`Snapshot::apply_edit`].

mod edit;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::error::EditError;
use crate::line::{Line, LineEnding};
use crate::location::TextLocation;

/// Shared empty snapshot: a single empty end-of-buffer line.
static EMPTY_SNAPSHOT: LazyLock<Snapshot> = LazyLock::new(|| Snapshot::from_lines(vec![Line::empty()], 0));

/// Immutable full document content as ordered lines.
///
/// Cloning is cheap: only reference counts change.
#[derive(Debug, Clone)]
pub struct Snapshot {
	before: Arc<Vec<Arc<Line>>>,
	active: Arc<Line>,
	after: Arc<Vec<Arc<Line>>>,
	len_chars: usize,
	version: u64,
}

impl Snapshot {
	/// Returns the process-wide empty snapshot.
	pub fn empty() -> Snapshot {
		EMPTY_SNAPSHOT.clone()
	}

	/// Splits `text` into lines on `\r\n`, `\r` and `\n` boundaries.
	///
	/// The final (possibly empty) line is always tagged
	/// [`LineEnding::EndOfBuffer`]. With `normalize` set, every other marker is
	/// rewritten to that ending.
	pub fn from_text(text: &str, normalize: Option<LineEnding>) -> Snapshot {
		let normalize = normalize.filter(|ending| !ending.is_end_of_buffer());
		let mut lines = Vec::new();
		let mut rest = text;
		loop {
			match rest.find(['\r', '\n']) {
				None => {
					lines.push(Arc::new(Line::new(rest, LineEnding::EndOfBuffer)));
					break;
				}
				Some(at) => {
					let (ending, width) = if rest[at..].starts_with("\r\n") {
						(LineEnding::Crlf, 2)
					} else if rest.as_bytes()[at] == b'\r' {
						(LineEnding::Cr, 1)
					} else {
						(LineEnding::Lf, 1)
					};
					lines.push(Arc::new(Line::new(&rest[..at], normalize.unwrap_or(ending))));
					rest = &rest[at + width..];
				}
			}
		}
		Self::from_lines(lines, 0)
	}

	/// Builds a snapshot whose active line is the first line.
	///
	/// `lines` must be non-empty.
	pub(crate) fn from_lines(mut lines: Vec<Arc<Line>>, version: u64) -> Snapshot {
		debug_assert!(!lines.is_empty(), "snapshot needs at least one line");
		let len_chars = lines.iter().map(|line| line.len_with_ending()).sum();
		let after = lines.split_off(1.min(lines.len()));
		let active = lines.pop().unwrap_or_else(Line::empty);
		Snapshot {
			before: Arc::new(Vec::new()),
			active,
			after: Arc::new(after),
			len_chars,
			version,
		}
	}

	/// Number of lines, at least 1.
	#[inline]
	pub fn line_count(&self) -> usize {
		self.before.len() + 1 + self.after.len()
	}

	/// Total length in characters, line markers included (`\r\n` counts 2).
	#[inline]
	pub fn len_chars(&self) -> usize {
		self.len_chars
	}

	/// Returns true if the snapshot holds no text at all.
	pub fn is_empty(&self) -> bool {
		self.len_chars == 0
	}

	/// Edit counter: 0 for loaded text, incremented by every applied edit.
	#[inline]
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Index of the active line.
	#[inline]
	pub fn active_line_index(&self) -> usize {
		self.before.len()
	}

	/// Lines before the active line.
	pub fn before_lines(&self) -> &Arc<Vec<Arc<Line>>> {
		&self.before
	}

	/// The most recently edited line.
	pub fn active_line(&self) -> &Arc<Line> {
		&self.active
	}

	/// Lines after the active line.
	pub fn after_lines(&self) -> &Arc<Vec<Arc<Line>>> {
		&self.after
	}

	/// Returns line `index`, if it exists.
	pub fn line(&self, index: usize) -> Option<&Arc<Line>> {
		let split = self.before.len();
		match index.cmp(&split) {
			std::cmp::Ordering::Less => self.before.get(index),
			std::cmp::Ordering::Equal => Some(&self.active),
			std::cmp::Ordering::Greater => self.after.get(index - split - 1),
		}
	}

	/// Line lookup for indices already validated by the caller.
	pub(crate) fn line_at(&self, index: usize) -> &Arc<Line> {
		self.line(index).unwrap_or(&self.active)
	}

	/// Iterates all lines in document order.
	pub fn lines(&self) -> impl DoubleEndedIterator<Item = &Arc<Line>> + '_ {
		self.before.iter().chain(std::iter::once(&self.active)).chain(self.after.iter())
	}

	/// Appends references to lines `from..to` onto `out`.
	pub(crate) fn push_lines(&self, from: usize, to: usize, out: &mut Vec<Arc<Line>>) {
		let split = self.before.len();
		if from >= to {
			return;
		}
		if from < split {
			out.extend(self.before[from..to.min(split)].iter().cloned());
		}
		if from <= split && split < to {
			out.push(Arc::clone(&self.active));
		}
		if to > split + 1 {
			let start = from.max(split + 1) - split - 1;
			out.extend(self.after[start..to - split - 1].iter().cloned());
		}
	}

	/// The location just past the last character.
	pub fn end(&self) -> TextLocation {
		let last = self.line_count() - 1;
		TextLocation::new(last, self.line_at(last).char_len())
	}

	/// Checks that `at` addresses an existing line and an index within it.
	pub fn validate(&self, at: TextLocation) -> Result<(), EditError> {
		let line = self.line(at.line).ok_or(EditError::InvalidCoordinate {
			location: at,
			line_count: self.line_count(),
		})?;
		if at.index > line.char_len() {
			return Err(EditError::InvalidLineIndex {
				location: at,
				line_len: line.char_len(),
			});
		}
		Ok(())
	}

	/// Checks both ends and their order.
	pub fn validate_range(&self, start: TextLocation, end: TextLocation) -> Result<(), EditError> {
		self.validate(start)?;
		self.validate(end)?;
		if start > end {
			return Err(EditError::InvertedRange { start, end });
		}
		Ok(())
	}

	/// Number of characters between two validated, ordered locations,
	/// counting each crossed marker at its full length.
	pub(crate) fn distance(&self, start: TextLocation, end: TextLocation) -> usize {
		if start.line == end.line {
			return end.index - start.index;
		}
		let first = self.line_at(start.line);
		let mut total = first.len_with_ending() - start.index;
		for line in start.line + 1..end.line {
			total += self.line_at(line).len_with_ending();
		}
		total + end.index
	}

	/// Extracts the text between `start` and `end`.
	pub fn text(&self, start: TextLocation, end: TextLocation) -> Result<String, EditError> {
		self.validate_range(start, end)?;
		if start.line == end.line {
			return Ok(self.line_at(start.line).slice(start.index, end.index).to_owned());
		}
		let mut out = String::with_capacity(self.distance(start, end));
		let first = self.line_at(start.line);
		out.push_str(first.suffix(start.index));
		out.push_str(first.ending().as_str());
		for index in start.line + 1..end.line {
			let line = self.line_at(index);
			out.push_str(line.text());
			out.push_str(line.ending().as_str());
		}
		out.push_str(self.line_at(end.line).prefix(end.index));
		Ok(out)
	}

	/// Extracts the text between `start` and `end` as a snapshot.
	///
	/// Lines wholly inside the range are shared with `self`; the last line is
	/// tagged [`LineEnding::EndOfBuffer`].
	pub fn subrange(&self, start: TextLocation, end: TextLocation) -> Result<Snapshot, EditError> {
		self.validate_range(start, end)?;
		let first = self.line_at(start.line);
		if start.line == end.line {
			let text = first.slice(start.index, end.index);
			return Ok(Self::from_lines(vec![Arc::new(Line::new(text, LineEnding::EndOfBuffer))], 0));
		}
		let mut lines = Vec::with_capacity(end.line - start.line + 1);
		lines.push(Arc::new(Line::new(first.suffix(start.index), first.ending())));
		self.push_lines(start.line + 1, end.line, &mut lines);
		let last = self.line_at(end.line);
		lines.push(Arc::new(Line::new(last.prefix(end.index), LineEnding::EndOfBuffer)));
		Ok(Self::from_lines(lines, 0))
	}

	/// Moves `at` by `delta` characters, clamped to the document bounds.
	///
	/// Crossing a line boundary costs one step regardless of the marker kind.
	/// Returns the new location and the delta actually applied, which is
	/// smaller in magnitude than requested when a document edge was reached.
	pub fn offset_by_character(&self, at: TextLocation, delta: isize) -> Result<(TextLocation, isize), EditError> {
		self.validate(at)?;
		let mut cur = at;
		let mut applied = 0usize;
		let mut remaining = delta.unsigned_abs();
		if delta >= 0 {
			loop {
				let len = self.line_at(cur.line).char_len();
				let room = len - cur.index;
				if remaining <= room {
					cur.index += remaining;
					applied += remaining;
					break;
				}
				if cur.line + 1 >= self.line_count() {
					cur.index = len;
					applied += room;
					break;
				}
				applied += room + 1;
				remaining -= room + 1;
				cur = TextLocation::new(cur.line + 1, 0);
			}
			Ok((cur, applied as isize))
		} else {
			loop {
				if remaining <= cur.index {
					cur.index -= remaining;
					applied += remaining;
					break;
				}
				if cur.line == 0 {
					applied += cur.index;
					cur.index = 0;
					break;
				}
				applied += cur.index + 1;
				remaining -= cur.index + 1;
				let line = cur.line - 1;
				cur = TextLocation::new(line, self.line_at(line).char_len());
			}
			Ok((cur, -(applied as isize)))
		}
	}

	/// Moves `at` by `delta` lines, clamped to the document bounds.
	///
	/// The index is clamped to the length of the target line. Returns the new
	/// location and the number of lines actually moved.
	pub fn offset_by_line(&self, at: TextLocation, delta: isize) -> Result<(TextLocation, isize), EditError> {
		self.validate(at)?;
		let last = self.line_count() - 1;
		let target = if delta >= 0 {
			at.line.saturating_add(delta as usize).min(last)
		} else {
			at.line.saturating_sub(delta.unsigned_abs())
		};
		let index = at.index.min(self.line_at(target).char_len());
		Ok((TextLocation::new(target, index), target as isize - at.line as isize))
	}
}

impl fmt::Display for Snapshot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for line in self.lines() {
			f.write_str(line.text())?;
			f.write_str(line.ending().as_str())?;
		}
		Ok(())
	}
}

impl Default for Snapshot {
	fn default() -> Self {
		Self::empty()
	}
}
