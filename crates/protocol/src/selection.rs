use serde::{Deserialize, Serialize};

/// A selection addressed structurally, by child-index paths from the editable root.
///
/// Paths survive a full content replace where node references would not, but
/// they describe the tree as it was at capture time: if the structure changes
/// between capture and restore, the restored selection may land on a
/// different node. Treat it as best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedSelection {
	/// Child indices from the root to the anchor node.
	pub anchor_path: Vec<usize>,
	/// Offset inside the anchor node.
	pub anchor_offset: usize,
	/// Child indices from the root to the focus node.
	pub focus_path: Vec<usize>,
	/// Offset inside the focus node.
	pub focus_offset: usize,
}

impl SerializedSelection {
	/// A collapsed selection (caret) at `offset` inside the node at `path`.
	pub fn caret(path: Vec<usize>, offset: usize) -> Self {
		Self {
			anchor_path: path.clone(),
			anchor_offset: offset,
			focus_path: path,
			focus_offset: offset,
		}
	}

	/// Returns true if anchor and focus coincide.
	pub fn is_collapsed(&self) -> bool {
		self.anchor_path == self.focus_path && self.anchor_offset == self.focus_offset
	}
}
