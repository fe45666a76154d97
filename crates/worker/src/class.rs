/// Execution classes used for trace attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work on the editing critical path: session loops and content reconciles.
	Interactive,
	/// Diagnostic or host-initiated work that never gates editing.
	Background,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
		}
	}
}
