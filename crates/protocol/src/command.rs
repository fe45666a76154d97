use scribe_rpc::RequestId;
use serde::{Deserialize, Serialize};

use crate::SerializedSelection;

/// A command injected into the embedded surface.
///
/// Encoded as JSON text, `{"command": "<name>", ...}`. Commands that expect an
/// answer carry the `requestId` the surface must echo in its response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
	/// Mount the document. Sent once when the session starts.
	Init {
		/// Initial document markup.
		content: String,
		/// Whether the user may edit.
		editable: bool,
		/// Text shown while the document is empty.
		placeholder: String,
	},
	/// Replace the whole document.
	SetContent {
		/// New document markup.
		html: String,
	},
	/// Read the current document markup.
	GetContent {
		/// Echoed in the `contentHtml` response.
		request_id: RequestId,
	},
	/// Compute the structural address of the live selection.
	SerializeSelection {
		/// Echoed in the `selectionSerialized` response.
		request_id: RequestId,
	},
	/// Walk the paths of `selection`, clamp offsets, select and scroll into view.
	RestoreSelection {
		/// Echoed in the `selectionRestored` response.
		request_id: RequestId,
		/// Selection to restore.
		selection: SerializedSelection,
	},
	/// Give the editable root focus.
	Focus,
	/// Remove focus from the editable root.
	Blur,
	/// Place the caret at a character offset in the document text.
	SetCursor {
		/// Character offset.
		position: usize,
	},
	/// Diagnostic probe answered with `handshakeAck`.
	Handshake {
		/// Echoed in the `handshakeAck` response.
		request_id: RequestId,
	},
}

impl Command {
	/// Encodes the command as injectable text.
	///
	/// # Errors
	///
	/// Returns [`scribe_rpc::Error::Malformed`] if serialization fails.
	pub fn encode(&self) -> scribe_rpc::Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Decodes command text.
	///
	/// # Errors
	///
	/// Returns [`scribe_rpc::Error::Malformed`] for unknown or malformed commands.
	pub fn decode(text: &str) -> scribe_rpc::Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	/// Request id embedded in the command, if it expects a response.
	pub fn request_id(&self) -> Option<&RequestId> {
		match self {
			Self::GetContent { request_id }
			| Self::SerializeSelection { request_id }
			| Self::RestoreSelection { request_id, .. }
			| Self::Handshake { request_id } => Some(request_id),
			Self::Init { .. } | Self::SetContent { .. } | Self::Focus | Self::Blur | Self::SetCursor { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn request_id_is_embedded_literally() {
		let text = Command::SerializeSelection {
			request_id: RequestId::from("ab12-4"),
		}
		.encode()
		.unwrap();
		assert_eq!(text, r#"{"command":"serializeSelection","requestId":"ab12-4"}"#);
	}

	#[test]
	fn restore_carries_camel_case_selection() {
		let cmd = Command::RestoreSelection {
			request_id: RequestId::from("x-1"),
			selection: SerializedSelection::caret(vec![0, 1], 3),
		};
		let text = cmd.encode().unwrap();
		assert!(text.contains(r#""anchorPath":[0,1]"#));
		assert!(text.contains(r#""focusOffset":3"#));
		assert_eq!(Command::decode(&text).unwrap(), cmd);
	}

	#[test]
	fn unit_commands_have_no_request_id() {
		let cmd = Command::decode(r#"{"command":"blur"}"#).unwrap();
		assert_eq!(cmd, Command::Blur);
		assert_eq!(cmd.request_id(), None);
	}

	#[test]
	fn unknown_command_is_rejected() {
		assert!(Command::decode(r#"{"command":"format","bold":true}"#).is_err());
	}
}
