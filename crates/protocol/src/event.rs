use scribe_rpc::{Envelope, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{SerializedSelection, kind};

/// Spontaneous messages posted by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
	/// The document changed; `html` is the full new markup.
	ContentChange {
		/// Full document markup after the change.
		html: String,
	},
	/// The caret moved to a character offset.
	CursorPosition {
		/// Character offset in the document text.
		position: usize,
	},
	/// The editable root gained focus.
	Focus,
	/// The editable root lost focus.
	Blur,
}

#[derive(Deserialize)]
struct ContentChangePayload {
	html: String,
}

#[derive(Deserialize)]
struct CursorPayload {
	position: usize,
}

impl SurfaceEvent {
	/// Interprets an inbound event envelope.
	///
	/// Returns `None` for types that are not surface events and
	/// `Some(Err(_))` for a known type with a malformed payload.
	pub fn from_envelope(envelope: &Envelope) -> Option<scribe_rpc::Result<Self>> {
		let event = match envelope.kind.as_str() {
			kind::CONTENT_CHANGE => envelope
				.payload_as::<ContentChangePayload>()
				.map(|p| Self::ContentChange { html: p.html }),
			kind::CURSOR_POSITION => envelope
				.payload_as::<CursorPayload>()
				.map(|p| Self::CursorPosition { position: p.position }),
			kind::FOCUS => Ok(Self::Focus),
			kind::BLUR => Ok(Self::Blur),
			_ => return None,
		};
		Some(event)
	}

	/// Wraps the event in an envelope.
	pub fn into_envelope(self) -> Envelope {
		match self {
			Self::ContentChange { html } => Envelope::event(kind::CONTENT_CHANGE, json!({ "html": html })),
			Self::CursorPosition { position } => Envelope::event(kind::CURSOR_POSITION, json!({ "position": position })),
			Self::Focus => Envelope::event(kind::FOCUS, JsonValue::Null),
			Self::Blur => Envelope::event(kind::BLUR, JsonValue::Null),
		}
	}
}

/// Payload of `handshakeAck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeAck {
	/// Protocol revision spoken by the surface.
	pub version: u32,
}

/// Payload of `selectionSerialized`; `None` when nothing is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSerializedResponse {
	/// The serialized selection.
	pub selection: Option<SerializedSelection>,
}

/// Payload of `selectionRestored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRestoredResponse {
	/// Whether both paths resolved and the selection was applied.
	pub restored: bool,
}

/// Payload of `contentHtml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHtmlResponse {
	/// Current document markup.
	pub html: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn content_change_survives_the_wire() {
		let raw = SurfaceEvent::ContentChange { html: "<p>Hi</p>".into() }
			.into_envelope()
			.encode()
			.unwrap();
		let envelope = Envelope::decode(&raw).unwrap();
		assert_eq!(
			SurfaceEvent::from_envelope(&envelope).unwrap().unwrap(),
			SurfaceEvent::ContentChange { html: "<p>Hi</p>".into() }
		);
	}

	#[test]
	fn malformed_payload_is_an_error_not_a_panic() {
		let envelope = Envelope::event(kind::CURSOR_POSITION, json!({ "position": "three" }));
		assert!(SurfaceEvent::from_envelope(&envelope).unwrap().is_err());
	}

	#[test]
	fn responses_are_not_surface_events() {
		let envelope = Envelope::event(kind::HANDSHAKE_ACK, json!({ "version": 1 }));
		assert!(SurfaceEvent::from_envelope(&envelope).is_none());
	}
}
