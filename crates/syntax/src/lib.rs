//! Incremental analysis for weft documents.
//!
//! An [`IncrementalAnalyzer`] reparses its document on the worker pool after
//! every commit and publishes [`FormatData`] tagged with the edit descriptor
//! it was computed against. Readers never wait for a parse: they take the
//! best-known data and remap it through later edits. A
//! [`ProviderComposite`] merges several analyzers and highlight ranges into
//! styled spans for one line.

/// Background parse episodes and result installation.
pub mod analyzer;
/// Format spans, per-line lookup and remapping.
pub mod annotations;
/// Provider composition.
pub mod composite;
/// Analyzer configuration.
pub mod config;
mod metrics;
/// Line parser trait and the regex pattern parser.
pub mod parser;

pub use analyzer::IncrementalAnalyzer;
pub use annotations::{FormatData, FormatSpan, LineFormat};
pub use composite::{ProviderComposite, ProviderId, StyledSpan};
pub use config::{AnalyzerConfig, PatternRule, SyntaxConfigError};
pub use metrics::AnalyzerStats;
pub use parser::{LineParser, PatternParser};
