//! Analyzer configuration loaded from TOML.
//!
//! ```toml
//! name = "rust-lite"
//!
//! [[rules]]
//! class = "keyword"
//! pattern = "\\b(fn|let|mut)\\b"
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One regex rule: every match is annotated with `class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternRule {
	pub class: String,
	pub pattern: String,
}

/// Settings for a [`PatternParser`](crate::PatternParser).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
	/// Name used in logs.
	pub name: String,
	/// Rules in priority order; earlier rules win ties at the same start.
	pub rules: Vec<PatternRule>,
}

/// Errors from loading analyzer configuration.
#[derive(Debug, Error)]
pub enum SyntaxConfigError {
	#[error("invalid analyzer config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("rule {class:?} has an invalid pattern: {source}")]
	Pattern {
		class: String,
		#[source]
		source: regex::Error,
	},
	#[error("rule {0:?} matches the empty string")]
	EmptyMatch(String),
}

impl AnalyzerConfig {
	pub fn from_toml_str(source: &str) -> Result<Self, SyntaxConfigError> {
		Ok(toml::from_str(source)?)
	}
}
