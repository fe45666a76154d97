//! Document tree with structural addressing.
//!
//! Offsets follow DOM range semantics: inside a text node an offset counts
//! characters, inside an element it counts children.

/// Identity of a node for one surface lifetime.
///
/// Never reused, so a [`Point`] captured before a content replace no longer
/// resolves after it. Only child-index paths survive a replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Monotonic [`NodeId`] source.
#[derive(Debug, Default)]
pub(crate) struct IdAlloc(u64);

impl IdAlloc {
	pub(crate) fn next(&mut self) -> NodeId {
		self.0 += 1;
		NodeId(self.0)
	}
}

/// Payload of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
	/// A tagged container.
	Element {
		/// Lowercased tag name.
		tag: String,
		/// Raw attribute text, including its leading whitespace.
		attrs: String,
		/// Child nodes in document order.
		children: Vec<Node>,
	},
	/// A run of text.
	Text(String),
}

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
	/// Identity of this node.
	pub id: NodeId,
	/// Element or text payload.
	pub content: NodeContent,
}

impl Node {
	/// Creates a text node.
	pub fn text(id: NodeId, text: impl Into<String>) -> Self {
		Self {
			id,
			content: NodeContent::Text(text.into()),
		}
	}

	/// Creates an element node.
	pub fn element(id: NodeId, tag: impl Into<String>, attrs: impl Into<String>, children: Vec<Node>) -> Self {
		Self {
			id,
			content: NodeContent::Element {
				tag: tag.into(),
				attrs: attrs.into(),
				children,
			},
		}
	}

	/// Upper bound for offsets inside this node: characters for text, children for elements.
	pub fn len(&self) -> usize {
		match &self.content {
			NodeContent::Text(text) => text.chars().count(),
			NodeContent::Element { children, .. } => children.len(),
		}
	}

	/// Returns true if no offset other than 0 is valid inside this node.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns true for text nodes.
	pub fn is_text(&self) -> bool {
		matches!(self.content, NodeContent::Text(_))
	}

	/// Child nodes; empty for text.
	pub fn children(&self) -> &[Node] {
		match &self.content {
			NodeContent::Element { children, .. } => children,
			NodeContent::Text(_) => &[],
		}
	}

	/// Number of text characters in this subtree.
	pub fn text_len(&self) -> usize {
		match &self.content {
			NodeContent::Text(text) => text.chars().count(),
			NodeContent::Element { children, .. } => children.iter().map(Node::text_len).sum(),
		}
	}

	fn find(&self, id: NodeId) -> Option<&Node> {
		if self.id == id {
			return Some(self);
		}
		self.children().iter().find_map(|child| child.find(id))
	}

	fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		if self.id == id {
			return Some(self);
		}
		match &mut self.content {
			NodeContent::Element { children, .. } => children.iter_mut().find_map(|child| child.find_mut(id)),
			NodeContent::Text(_) => None,
		}
	}

	fn path_to(&self, id: NodeId, path: &mut Vec<usize>) -> bool {
		if self.id == id {
			return true;
		}
		for (index, child) in self.children().iter().enumerate() {
			path.push(index);
			if child.path_to(id, path) {
				return true;
			}
			path.pop();
		}
		false
	}

	fn collect_text(&self, out: &mut String) {
		match &self.content {
			NodeContent::Text(text) => out.push_str(text),
			NodeContent::Element { children, .. } => children.iter().for_each(|child| child.collect_text(out)),
		}
	}
}

/// A position inside the live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
	/// Node holding the position.
	pub node: NodeId,
	/// Character offset (text) or child offset (element).
	pub offset: usize,
}

/// The editable root and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	root: Node,
}

impl Document {
	/// Tag of the editable root element. The root itself is never rendered.
	pub const ROOT_TAG: &'static str = "root";

	/// Creates a document whose editable root holds `children`.
	pub fn new(root_id: NodeId, children: Vec<Node>) -> Self {
		Self {
			root: Node::element(root_id, Self::ROOT_TAG, "", children),
		}
	}

	/// The editable root.
	pub fn root(&self) -> &Node {
		&self.root
	}

	/// Looks a node up by identity.
	pub fn find(&self, id: NodeId) -> Option<&Node> {
		self.root.find(id)
	}

	/// Child-index path from the root to `id`, or `None` if `id` is not in this tree.
	pub fn path_of(&self, id: NodeId) -> Option<Vec<usize>> {
		let mut path = Vec::new();
		self.root.path_to(id, &mut path).then_some(path)
	}

	/// Walks `path` from the root. Fails if any index is out of range.
	pub fn resolve(&self, path: &[usize]) -> Option<&Node> {
		path.iter()
			.try_fold(&self.root, |node, &index| node.children().get(index))
	}

	/// Resolves `path` and clamps `offset` to the node's current length.
	pub fn clamp(&self, path: &[usize], offset: usize) -> Option<Point> {
		let node = self.resolve(path)?;
		Some(Point {
			node: node.id,
			offset: offset.min(node.len()),
		})
	}

	/// Flattened document text.
	pub fn text(&self) -> String {
		let mut out = String::new();
		self.root.collect_text(&mut out);
		out
	}

	/// Number of characters in the flattened text.
	pub fn text_len(&self) -> usize {
		self.root.text_len()
	}

	/// Character offset of `point` in the flattened text.
	pub fn text_offset_of(&self, point: Point) -> Option<usize> {
		let mut consumed = 0;
		text_offset_in(&self.root, point, &mut consumed)
	}

	/// Point at character `offset` of the flattened text, clamped to the end.
	///
	/// A boundary offset lands at the end of the earlier text node.
	pub fn point_at_text_offset(&self, offset: usize) -> Point {
		let mut consumed = 0;
		let mut last_text = None;
		point_in(&self.root, offset, &mut consumed, &mut last_text)
			.or(last_text)
			.unwrap_or(Point {
				node: self.root.id,
				offset: 0,
			})
	}

	/// Inserts `text` at `at` and returns the caret after the insertion.
	///
	/// Typing into an element extends the preceding text sibling or creates a
	/// new text node with an id from `alloc`.
	pub(crate) fn insert_text(&mut self, at: Point, text: &str, alloc: &mut IdAlloc) -> Option<Point> {
		let node = self.root.find_mut(at.node)?;
		let inserted = text.chars().count();
		match &mut node.content {
			NodeContent::Text(existing) => {
				let offset = at.offset.min(existing.chars().count());
				let byte = existing.char_indices().nth(offset).map_or(existing.len(), |(i, _)| i);
				existing.insert_str(byte, text);
				Some(Point {
					node: at.node,
					offset: offset + inserted,
				})
			}
			NodeContent::Element { children, .. } => {
				let index = at.offset.min(children.len());
				if index > 0 {
					let prev = &mut children[index - 1];
					if let NodeContent::Text(existing) = &mut prev.content {
						existing.push_str(text);
						return Some(Point {
							node: prev.id,
							offset: existing.chars().count(),
						});
					}
				}
				let id = alloc.next();
				children.insert(index, Node::text(id, text));
				Some(Point { node: id, offset: inserted })
			}
		}
	}
}

fn text_offset_in(node: &Node, point: Point, consumed: &mut usize) -> Option<usize> {
	if node.id == point.node {
		return Some(match &node.content {
			NodeContent::Text(_) => *consumed + point.offset.min(node.len()),
			NodeContent::Element { children, .. } => {
				*consumed + children.iter().take(point.offset).map(Node::text_len).sum::<usize>()
			}
		});
	}
	match &node.content {
		NodeContent::Text(text) => {
			*consumed += text.chars().count();
			None
		}
		NodeContent::Element { children, .. } => children
			.iter()
			.find_map(|child| text_offset_in(child, point, consumed)),
	}
}

fn point_in(node: &Node, offset: usize, consumed: &mut usize, last_text: &mut Option<Point>) -> Option<Point> {
	match &node.content {
		NodeContent::Text(text) => {
			let len = text.chars().count();
			if offset <= *consumed + len {
				return Some(Point {
					node: node.id,
					offset: offset - *consumed,
				});
			}
			*consumed += len;
			*last_text = Some(Point { node: node.id, offset: len });
			None
		}
		NodeContent::Element { children, .. } => children
			.iter()
			.find_map(|child| point_in(child, offset, consumed, last_text)),
	}
}
