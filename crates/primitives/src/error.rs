use thiserror::Error;

use crate::location::TextLocation;

/// Errors raised while validating coordinates against a snapshot.
///
/// Validation always happens before any state changes, so a failed call
/// leaves the snapshot (and any surrounding transaction) untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
	#[error("line {} is out of bounds (document has {line_count} lines)", location.line)]
	InvalidCoordinate { location: TextLocation, line_count: usize },
	#[error("index {} is out of bounds on line {} (line length {line_len})", location.index, location.line)]
	InvalidLineIndex { location: TextLocation, line_len: usize },
	#[error("range start {start} is after range end {end}")]
	InvertedRange { start: TextLocation, end: TextLocation },
}
