use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

/// End-of-line marker terminating a [`Line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
	/// `\r\n`
	Crlf,
	/// `\r`
	Cr,
	/// `\n`
	#[default]
	Lf,
	/// No marker: the final line of a snapshot.
	#[serde(rename = "eob")]
	EndOfBuffer,
}

impl LineEnding {
	/// Returns the marker text.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Crlf => "\r\n",
			Self::Cr => "\r",
			Self::Lf => "\n",
			Self::EndOfBuffer => "",
		}
	}

	/// Returns the marker length in characters.
	pub const fn len(self) -> usize {
		self.as_str().len()
	}

	/// Returns true for [`LineEnding::EndOfBuffer`].
	pub const fn is_end_of_buffer(self) -> bool {
		matches!(self, Self::EndOfBuffer)
	}
}

/// Shared empty end-of-buffer line.
static EMPTY_LINE: LazyLock<Arc<Line>> = LazyLock::new(|| Arc::new(Line::new("", LineEnding::EndOfBuffer)));

/// One line of a snapshot: text without its marker, plus the marker kind.
///
/// Lines are immutable and shared between snapshots by `Arc`; edits build new
/// lines only where the edit touches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
	text: String,
	char_len: usize,
	ending: LineEnding,
}

impl Line {
	/// Creates a line. `text` must not contain `\r` or `\n`.
	pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
		let text = text.into();
		debug_assert!(!text.contains(['\r', '\n']), "line text must not contain line breaks");
		let char_len = text.chars().count();
		Self { text, char_len, ending }
	}

	/// Returns the process-wide empty end-of-buffer line.
	pub fn empty() -> Arc<Line> {
		Arc::clone(&EMPTY_LINE)
	}

	/// Builds `prefix + middle + suffix` terminated by `ending`.
	pub(crate) fn joined(prefix: &str, middle: &str, suffix: &str, ending: LineEnding) -> Self {
		let mut text = String::with_capacity(prefix.len() + middle.len() + suffix.len());
		text.push_str(prefix);
		text.push_str(middle);
		text.push_str(suffix);
		Self::new(text, ending)
	}

	/// Returns the text without the end-of-line marker.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the text length in characters, excluding the marker.
	#[inline]
	pub fn char_len(&self) -> usize {
		self.char_len
	}

	/// Returns the end-of-line marker.
	#[inline]
	pub fn ending(&self) -> LineEnding {
		self.ending
	}

	/// Returns the length in characters including the marker.
	#[inline]
	pub fn len_with_ending(&self) -> usize {
		self.char_len + self.ending.len()
	}

	/// Converts a character index into a byte offset within the text.
	///
	/// Indices past the end map to the text length.
	pub(crate) fn byte_offset(&self, index: usize) -> usize {
		if index >= self.char_len {
			return self.text.len();
		}
		self.text.char_indices().nth(index).map_or(self.text.len(), |(byte, _)| byte)
	}

	/// Text before character `index`.
	pub(crate) fn prefix(&self, index: usize) -> &str {
		&self.text[..self.byte_offset(index)]
	}

	/// Text from character `index` to the end of the line.
	pub(crate) fn suffix(&self, index: usize) -> &str {
		&self.text[self.byte_offset(index)..]
	}

	/// Text between two character indices.
	pub(crate) fn slice(&self, from: usize, to: usize) -> &str {
		&self.text[self.byte_offset(from)..self.byte_offset(to)]
	}
}
