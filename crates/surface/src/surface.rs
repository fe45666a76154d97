//! Embedded-side command interpreter.

use scribe_protocol::{
	Command, ContentHtmlResponse, HandshakeAck, PROTOCOL_VERSION, SelectionRestoredResponse,
	SelectionSerializedResponse, SerializedSelection, SurfaceEvent, kind,
};
use scribe_rpc::{Envelope, JsonValue, RequestId};
use serde_json::to_value;
use tracing::trace;

use crate::document::{Document, IdAlloc, Point};
use crate::markup;

/// A selection held by node identity, the way a live DOM range holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSelection {
	/// Where the selection started.
	pub anchor: Point,
	/// Where the selection ends; the caret.
	pub focus: Point,
}

impl LiveSelection {
	fn caret(point: Point) -> Self {
		Self {
			anchor: point,
			focus: point,
		}
	}
}

/// Counters describing what the surface has been asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SurfaceStats {
	pub replaces: usize,
	pub restores: usize,
	pub scrolls: usize,
}

/// State of the embedded editing surface.
#[derive(Debug)]
pub struct Surface {
	ids: IdAlloc,
	doc: Document,
	selection: Option<LiveSelection>,
	focused: bool,
	editable: bool,
	placeholder: String,
	stats: SurfaceStats,
}

impl Default for Surface {
	fn default() -> Self {
		Self::new()
	}
}

impl Surface {
	/// Creates an empty, unfocused, editable surface.
	pub fn new() -> Self {
		let mut ids = IdAlloc::default();
		let doc = markup::parse("", &mut ids);
		Self {
			ids,
			doc,
			selection: None,
			focused: false,
			editable: true,
			placeholder: String::new(),
			stats: SurfaceStats::default(),
		}
	}

	/// The live document.
	pub fn document(&self) -> &Document {
		&self.doc
	}

	/// Current markup.
	pub fn html(&self) -> String {
		markup::render(&self.doc)
	}

	/// Returns true while the editable root has focus.
	pub fn is_focused(&self) -> bool {
		self.focused
	}

	/// Placeholder configured by the host.
	pub fn placeholder(&self) -> &str {
		&self.placeholder
	}

	/// The live selection, if it still points into the current tree.
	pub fn selection(&self) -> Option<LiveSelection> {
		self.selection
			.filter(|sel| self.doc.find(sel.anchor.node).is_some() && self.doc.find(sel.focus.node).is_some())
	}

	pub(crate) fn stats(&self) -> SurfaceStats {
		self.stats
	}

	/// Interprets one host command and returns the envelopes it produces.
	pub fn handle(&mut self, command: Command) -> Vec<Envelope> {
		trace!(command = ?command, "surface.command");
		match command {
			Command::Init {
				content,
				editable,
				placeholder,
			} => {
				self.doc = markup::parse(&content, &mut self.ids);
				self.selection = None;
				self.editable = editable;
				self.placeholder = placeholder;
				Vec::new()
			}
			Command::SetContent { html } => self.replace(&html),
			Command::GetContent { request_id } => {
				vec![response(kind::CONTENT_HTML, request_id, &ContentHtmlResponse { html: self.html() })]
			}
			Command::SerializeSelection { request_id } => {
				let selection = self.serialize_selection();
				vec![response(
					kind::SELECTION_SERIALIZED,
					request_id,
					&SelectionSerializedResponse { selection },
				)]
			}
			Command::RestoreSelection { request_id, selection } => {
				let restored = self.restore_selection(&selection);
				vec![response(
					kind::SELECTION_RESTORED,
					request_id,
					&SelectionRestoredResponse { restored },
				)]
			}
			Command::Focus => self.focus(),
			Command::Blur => self.blur(),
			Command::SetCursor { position } => {
				let point = self.doc.point_at_text_offset(position);
				self.selection = Some(LiveSelection::caret(point));
				self.cursor_event().into_iter().collect()
			}
			Command::Handshake { request_id } => vec![response(
				kind::HANDSHAKE_ACK,
				request_id,
				&HandshakeAck {
					version: PROTOCOL_VERSION,
				},
			)],
		}
	}

	/// Structural address of the live selection.
	///
	/// `None` when unfocused, when nothing is selected, or when the selected
	/// nodes were discarded by a content replace.
	pub fn serialize_selection(&self) -> Option<SerializedSelection> {
		if !self.focused {
			return None;
		}
		let sel = self.selection()?;
		Some(SerializedSelection {
			anchor_path: self.doc.path_of(sel.anchor.node)?,
			anchor_offset: sel.anchor.offset,
			focus_path: self.doc.path_of(sel.focus.node)?,
			focus_offset: sel.focus.offset,
		})
	}

	/// Walks both paths from the current root, clamps offsets and selects the range.
	///
	/// Returns false, leaving the selection untouched, if either path no longer resolves.
	pub fn restore_selection(&mut self, selection: &SerializedSelection) -> bool {
		let anchor = self.doc.clamp(&selection.anchor_path, selection.anchor_offset);
		let focus = self.doc.clamp(&selection.focus_path, selection.focus_offset);
		let (Some(anchor), Some(focus)) = (anchor, focus) else {
			return false;
		};
		self.selection = Some(LiveSelection { anchor, focus });
		self.stats.restores += 1;
		// No viewport to move; counted so callers can observe the request.
		self.stats.scrolls += 1;
		true
	}

	/// Simulates the user typing `text` at the caret.
	///
	/// Ignored unless focused and editable. Emits `contentChange` then `cursorPosition`.
	pub fn type_text(&mut self, text: &str) -> Vec<Envelope> {
		if !self.focused || !self.editable || text.is_empty() {
			return Vec::new();
		}
		let at = match self.selection() {
			Some(sel) => sel.focus,
			None => self.doc.point_at_text_offset(self.doc.text_len()),
		};
		let Some(caret) = self.doc.insert_text(at, text, &mut self.ids) else {
			return Vec::new();
		};
		self.selection = Some(LiveSelection::caret(caret));
		let mut out = vec![self.content_event()];
		out.extend(self.cursor_event());
		out
	}

	/// Simulates the user gesturing focus into the editable root.
	pub fn focus(&mut self) -> Vec<Envelope> {
		if self.focused {
			return Vec::new();
		}
		self.focused = true;
		if self.selection().is_none() {
			self.selection = Some(LiveSelection::caret(self.doc.point_at_text_offset(0)));
		}
		vec![SurfaceEvent::Focus.into_envelope()]
	}

	/// Simulates focus leaving the editable root.
	pub fn blur(&mut self) -> Vec<Envelope> {
		if !self.focused {
			return Vec::new();
		}
		self.focused = false;
		vec![SurfaceEvent::Blur.into_envelope()]
	}

	/// Replaces the document. Every old node id becomes unresolvable; a focused
	/// surface falls back to a caret at the start, as a real editing host would.
	fn replace(&mut self, html: &str) -> Vec<Envelope> {
		self.doc = markup::parse(html, &mut self.ids);
		self.stats.replaces += 1;
		self.selection = self
			.focused
			.then(|| LiveSelection::caret(self.doc.point_at_text_offset(0)));
		vec![self.content_event()]
	}

	fn content_event(&self) -> Envelope {
		SurfaceEvent::ContentChange { html: self.html() }.into_envelope()
	}

	fn cursor_event(&self) -> Option<Envelope> {
		let sel = self.selection()?;
		let position = self.doc.text_offset_of(sel.focus)?;
		Some(SurfaceEvent::CursorPosition { position }.into_envelope())
	}
}

fn response<T: serde::Serialize>(kind: &str, request_id: RequestId, body: &T) -> Envelope {
	Envelope::response(kind, request_id, to_value(body).unwrap_or(JsonValue::Null))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn mounted(html: &str) -> Surface {
		let mut surface = Surface::new();
		surface.handle(Command::Init {
			content: html.into(),
			editable: true,
			placeholder: "Write here".into(),
		});
		surface
	}

	#[test]
	fn replace_emits_synthetic_content_change() {
		let mut surface = mounted("Hello");
		let out = surface.handle(Command::SetContent { html: "<p>Bye</p>".into() });
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].kind, kind::CONTENT_CHANGE);
		assert_eq!(surface.html(), "<p>Bye</p>");
		assert_eq!(surface.stats().replaces, 1);
	}

	#[test]
	fn serialize_then_restore_on_unchanged_structure_is_identity() {
		let mut surface = mounted("<p>One <b>two</b></p><p>three</p>");
		surface.focus();
		let wanted = SerializedSelection {
			anchor_path: vec![0, 0],
			anchor_offset: 1,
			focus_path: vec![1, 0],
			focus_offset: 4,
		};
		assert!(surface.restore_selection(&wanted));

		let captured = surface.serialize_selection().unwrap();
		assert!(surface.restore_selection(&captured));
		assert_eq!(surface.serialize_selection().unwrap(), captured);
		assert_eq!(captured, wanted);
	}

	#[test]
	fn replace_invalidates_node_references_but_not_paths() {
		let mut surface = mounted("<p>Hello</p>");
		surface.focus();
		surface.handle(Command::SetCursor { position: 3 });
		let captured = surface.serialize_selection().unwrap();

		surface.handle(Command::SetContent { html: "<p>Hello world</p>".into() });
		assert_eq!(surface.serialize_selection().unwrap(), SerializedSelection::caret(vec![0, 0], 0));

		assert!(surface.restore_selection(&captured));
		assert_eq!(surface.serialize_selection().unwrap(), captured);
	}

	#[test]
	fn restore_clamps_into_shrunken_document() {
		let mut surface = mounted("<p>Hi</p>");
		surface.focus();
		assert!(surface.restore_selection(&SerializedSelection::caret(vec![0, 0], 10)));
		assert_eq!(surface.serialize_selection().unwrap().focus_offset, 2);
		assert!(!surface.restore_selection(&SerializedSelection::caret(vec![4], 0)));
	}

	#[test]
	fn unfocused_surface_serializes_nothing() {
		let surface = mounted("<p>Hi</p>");
		assert_eq!(surface.serialize_selection(), None);
	}

	#[test]
	fn typing_requires_focus_and_reports_cursor() {
		let mut surface = mounted("");
		assert!(surface.type_text("x").is_empty());

		surface.focus();
		let out = surface.type_text("Hi");
		assert_eq!(surface.html(), "Hi");
		let kinds: Vec<_> = out.iter().map(|e| e.kind.as_str()).collect();
		assert_eq!(kinds, [kind::CONTENT_CHANGE, kind::CURSOR_POSITION]);
		assert_eq!(out[1].payload["position"], 2);
	}

	#[test]
	fn read_only_surface_ignores_typing() {
		let mut surface = Surface::new();
		surface.handle(Command::Init {
			content: "fixed".into(),
			editable: false,
			placeholder: String::new(),
		});
		surface.focus();
		assert!(surface.type_text("x").is_empty());
		assert_eq!(surface.html(), "fixed");
	}

	#[test]
	fn requests_echo_their_id() {
		let mut surface = mounted("Hi");
		let out = surface.handle(Command::Handshake {
			request_id: RequestId::from("h-0"),
		});
		assert_eq!(out[0].kind, kind::HANDSHAKE_ACK);
		assert_eq!(out[0].request_id, Some(RequestId::from("h-0")));
	}
}
