use std::time::Duration;

use thiserror::Error;
use weft_primitives::EditError;

/// Errors surfaced by document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
	/// A write or query referenced a location outside the snapshot.
	#[error(transparent)]
	Edit(#[from] EditError),
	/// Another transaction held the write gate for the whole timeout.
	#[error("transaction not acquired within {0:?}")]
	ConcurrentAccessTimeout(Duration),
}
