//! Line parsers run by the incremental analyzer.

use std::sync::Arc;

use regex::Regex;
use tracing::trace;
use weft_primitives::{Snapshot, TextLocation, TextRange};
use weft_worker::GenerationToken;

use crate::annotations::FormatSpan;
use crate::config::{AnalyzerConfig, SyntaxConfigError};

/// Produces format annotations for a whole snapshot.
///
/// Runs on the worker blocking pool. Implementations poll `cancel` at
/// whatever granularity suits them and return `None` once it is set; the
/// result of a cancelled parse would be discarded anyway.
pub trait LineParser: Send + Sync + 'static {
	fn name(&self) -> &str;

	fn parse(&self, snapshot: &Snapshot, cancel: &GenerationToken) -> Option<Vec<FormatSpan>>;
}

#[derive(Debug)]
struct CompiledRule {
	class: Arc<str>,
	regex: Regex,
}

/// Annotates every regex match, line by line.
///
/// Matches never span lines. Cancellation is checked before each line.
#[derive(Debug)]
pub struct PatternParser {
	name: String,
	rules: Vec<CompiledRule>,
}

impl PatternParser {
	pub fn from_config(config: &AnalyzerConfig) -> Result<Self, SyntaxConfigError> {
		let rules = config
			.rules
			.iter()
			.map(|rule| {
				let regex = Regex::new(&rule.pattern).map_err(|source| SyntaxConfigError::Pattern {
					class: rule.class.clone(),
					source,
				})?;
				if regex.is_match("") {
					return Err(SyntaxConfigError::EmptyMatch(rule.class.clone()));
				}
				Ok(CompiledRule {
					class: Arc::from(rule.class.as_str()),
					regex,
				})
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self {
			name: config.name.clone(),
			rules,
		})
	}

	pub fn from_toml_str(source: &str) -> Result<Self, SyntaxConfigError> {
		Self::from_config(&AnalyzerConfig::from_toml_str(source)?)
	}
}

impl LineParser for PatternParser {
	fn name(&self) -> &str {
		&self.name
	}

	fn parse(&self, snapshot: &Snapshot, cancel: &GenerationToken) -> Option<Vec<FormatSpan>> {
		let mut spans = Vec::new();
		for (line_index, line) in snapshot.lines().enumerate() {
			if cancel.is_cancelled() {
				trace!(parser = %self.name, generation = cancel.generation(), line = line_index, "parse.cancelled");
				return None;
			}
			let text = line.text();
			for rule in &self.rules {
				for found in rule.regex.find_iter(text) {
					let start = text[..found.start()].chars().count();
					let len = found.as_str().chars().count();
					spans.push(FormatSpan {
						range: TextRange {
							start: TextLocation::new(line_index, start),
							end: TextLocation::new(line_index, start + len),
						},
						class: Arc::clone(&rule.class),
					});
				}
			}
		}
		Some(spans)
	}
}
