//! Tolerant markup reader and writer.
//!
//! Only structure matters here: tags nest, text runs become text nodes,
//! attributes are carried verbatim, comments are dropped, unclosed elements are
//! closed at end of input and stray closing tags are ignored. Entities are not
//! decoded. Reading then writing well-formed markup reproduces it exactly.

use crate::document::{Document, IdAlloc, Node, NodeContent, NodeId};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr"];

struct Frame {
	id: NodeId,
	tag: String,
	attrs: String,
	children: Vec<Node>,
}

impl Frame {
	fn into_node(self) -> Node {
		Node::element(self.id, self.tag, self.attrs, self.children)
	}

	fn push_text(&mut self, text: &str, ids: &mut IdAlloc) {
		if text.is_empty() {
			return;
		}
		if let Some(Node {
			content: NodeContent::Text(prev),
			..
		}) = self.children.last_mut()
		{
			prev.push_str(text);
			return;
		}
		self.children.push(Node::text(ids.next(), text));
	}
}

pub(crate) fn parse(html: &str, ids: &mut IdAlloc) -> Document {
	let mut stack = vec![Frame {
		id: ids.next(),
		tag: Document::ROOT_TAG.to_owned(),
		attrs: String::new(),
		children: Vec::new(),
	}];
	let mut rest = html;

	while !rest.is_empty() {
		if let Some(after) = rest.strip_prefix("<!--") {
			rest = after.find("-->").map_or("", |end| &after[end + 3..]);
			continue;
		}

		if rest.starts_with('<')
			&& let Some(end) = rest.find('>')
		{
			let tag_src = &rest[1..end];
			if let Some(name) = tag_src.strip_prefix('/') {
				rest = &rest[end + 1..];
				close(&mut stack, &name.trim().to_ascii_lowercase());
				continue;
			}

			let self_closing = tag_src.ends_with('/');
			let body = tag_src.trim_end_matches('/');
			let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
			let name = body[..name_end].to_ascii_lowercase();
			if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
				rest = &rest[end + 1..];
				let attrs = body[name_end..].trim_end().to_owned();
				let id = ids.next();
				if self_closing || VOID_TAGS.contains(&name.as_str()) {
					top(&mut stack).children.push(Node::element(id, name, attrs, Vec::new()));
				} else {
					stack.push(Frame {
						id,
						tag: name,
						attrs,
						children: Vec::new(),
					});
				}
				continue;
			}
		}

		let end = rest
			.char_indices()
			.skip(1)
			.find(|&(_, c)| c == '<')
			.map_or(rest.len(), |(i, _)| i);
		top(&mut stack).push_text(&rest[..end], ids);
		rest = &rest[end..];
	}

	while stack.len() > 1 {
		pop_into_parent(&mut stack);
	}
	let root = stack.remove(0);
	Document::new(root.id, root.children)
}

pub(crate) fn render(doc: &Document) -> String {
	let mut out = String::new();
	for child in doc.root().children() {
		write_node(child, &mut out);
	}
	out
}

fn write_node(node: &Node, out: &mut String) {
	match &node.content {
		NodeContent::Text(text) => out.push_str(text),
		NodeContent::Element { tag, attrs, children } => {
			out.push('<');
			out.push_str(tag);
			out.push_str(attrs);
			out.push('>');
			if children.is_empty() && VOID_TAGS.contains(&tag.as_str()) {
				return;
			}
			for child in children {
				write_node(child, out);
			}
			out.push_str("</");
			out.push_str(tag);
			out.push('>');
		}
	}
}

fn top(stack: &mut [Frame]) -> &mut Frame {
	let last = stack.len() - 1;
	&mut stack[last]
}

fn pop_into_parent(stack: &mut Vec<Frame>) {
	if stack.len() < 2 {
		return;
	}
	if let Some(frame) = stack.pop() {
		top(stack).children.push(frame.into_node());
	}
}

/// Closes the innermost open element named `name`, and everything opened
/// inside it. The root frame is never closed.
fn close(stack: &mut Vec<Frame>, name: &str) {
	let Some(depth) = stack.iter().skip(1).rposition(|frame| frame.tag == name) else {
		return;
	};
	while stack.len() > depth + 1 {
		pop_into_parent(stack);
	}
}
