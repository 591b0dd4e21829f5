/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Re-analysis of a document snapshot (syntax highlighting and similar).
	Analysis,
	/// Work that can be delayed or dropped under pressure.
	Background,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Analysis => "analysis",
			Self::Background => "background",
		}
	}
}
