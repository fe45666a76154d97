//! Inbound envelope `type` values.

/// Response to [`crate::Command::Handshake`].
pub const HANDSHAKE_ACK: &str = "handshakeAck";
/// Response to [`crate::Command::SerializeSelection`].
pub const SELECTION_SERIALIZED: &str = "selectionSerialized";
/// Response to [`crate::Command::RestoreSelection`].
pub const SELECTION_RESTORED: &str = "selectionRestored";
/// Response to [`crate::Command::GetContent`].
pub const CONTENT_HTML: &str = "contentHtml";

/// The document changed inside the surface.
pub const CONTENT_CHANGE: &str = "contentChange";
/// The caret moved.
pub const CURSOR_POSITION: &str = "cursorPosition";
/// The editable root gained focus.
pub const FOCUS: &str = "focus";
/// The editable root lost focus.
pub const BLUR: &str = "blur";
