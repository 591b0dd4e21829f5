use std::sync::Arc;

use super::Snapshot;
use crate::error::EditError;
use crate::line::Line;
use crate::location::TextLocation;

impl Snapshot {
	/// Replaces the text between `start` and `end` with `replacement`,
	/// returning the resulting snapshot.
	///
	/// A single-line replacement inside the active line only rebuilds that
	/// line; both line arrays are shared with `self`. Any other edit rebuilds
	/// the arrays from references to the untouched lines and constructs new
	/// lines only at the edit boundaries. The line joining the last
	/// replacement line with the remainder of the edited text becomes the new
	/// active line.
	pub fn apply_edit(&self, start: TextLocation, end: TextLocation, replacement: &Snapshot) -> Result<Snapshot, EditError> {
		self.validate_range(start, end)?;

		let removed = self.distance(start, end);
		let len_chars = self.len_chars - removed + replacement.len_chars();
		let version = self.version + 1;

		if replacement.line_count() == 1 && start.line == end.line && start.line == self.active_line_index() {
			let active = &self.active;
			let spliced = Line::joined(
				active.prefix(start.index),
				replacement.line_at(0).text(),
				active.suffix(end.index),
				active.ending(),
			);
			return Ok(Snapshot {
				before: Arc::clone(&self.before),
				active: Arc::new(spliced),
				after: Arc::clone(&self.after),
				len_chars,
				version,
			});
		}

		let first = self.line_at(start.line);
		let last = self.line_at(end.line);
		let prefix = first.prefix(start.index);
		let suffix = last.suffix(end.index);
		let replacement_lines = replacement.line_count();

		let mut before = Vec::with_capacity(start.line + replacement_lines - 1);
		self.push_lines(0, start.line, &mut before);

		let active = if replacement_lines == 1 {
			Line::joined(prefix, replacement.line_at(0).text(), suffix, last.ending())
		} else {
			let head = replacement.line_at(0);
			before.push(Arc::new(Line::joined(prefix, head.text(), "", head.ending())));
			replacement.push_lines(1, replacement_lines - 1, &mut before);
			let tail = replacement.line_at(replacement_lines - 1);
			Line::joined("", tail.text(), suffix, last.ending())
		};

		let mut after = Vec::with_capacity(self.line_count() - end.line - 1);
		self.push_lines(end.line + 1, self.line_count(), &mut after);

		debug_assert_eq!(before.len(), start.line + replacement_lines - 1);
		Ok(Snapshot {
			before: Arc::new(before),
			active: Arc::new(active),
			after: Arc::new(after),
			len_chars,
			version,
		})
	}

	/// Location just past `replacement` once it is written at `start`.
	pub fn end_of_insertion(start: TextLocation, replacement: &Snapshot) -> TextLocation {
		let lines = replacement.line_count();
		let last = replacement.line_at(lines - 1).char_len();
		if lines == 1 {
			TextLocation::new(start.line, start.index + last)
		} else {
			TextLocation::new(start.line + lines - 1, last)
		}
	}
}
