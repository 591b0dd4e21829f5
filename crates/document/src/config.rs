//! Per-document settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weft_primitives::LineEnding;

/// Returns the default undo coalescing window in milliseconds.
fn default_merge_window_ms() -> u64 {
	400
}

/// Returns the default number of undo units kept.
fn default_max_undo() -> usize {
	100
}

/// Configuration for a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
	/// Consecutive edits closer together than this may coalesce into one
	/// undo unit, provided their metadata agrees.
	#[serde(default = "default_merge_window_ms")]
	pub merge_window_ms: u64,
	/// Oldest undo units are evicted past this many entries.
	#[serde(default = "default_max_undo")]
	pub max_undo: usize,
	/// Marker used when line endings are normalized.
	pub default_line_ending: LineEnding,
	/// Rewrite every line marker of loaded and written text to
	/// `default_line_ending`.
	pub normalize_line_endings: bool,
}

impl Default for DocumentConfig {
	fn default() -> Self {
		Self {
			merge_window_ms: default_merge_window_ms(),
			max_undo: default_max_undo(),
			default_line_ending: LineEnding::Lf,
			normalize_line_endings: false,
		}
	}
}

/// Errors from parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid document config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("default_line_ending must be a real line marker, not end-of-buffer")]
	EndOfBufferLineEnding,
	#[error("max_undo must be at least 1")]
	ZeroUndoLimit,
}

impl DocumentConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks value constraints serde cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.default_line_ending.is_end_of_buffer() {
			return Err(ConfigError::EndOfBufferLineEnding);
		}
		if self.max_undo == 0 {
			return Err(ConfigError::ZeroUndoLimit);
		}
		Ok(())
	}

	/// Coalescing window as a duration.
	pub fn merge_window(&self) -> Duration {
		Duration::from_millis(self.merge_window_ms)
	}

	/// Line marker to normalize to, if normalization is on.
	pub fn normalization(&self) -> Option<LineEnding> {
		self.normalize_line_endings.then_some(self.default_line_ending)
	}
}
