//! Inbound wire envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{RequestId, Result};

/// A message posted by the embedded context: `{type, requestId?, payload}`.
///
/// Responses carry the `requestId` of the command they answer; spontaneous
/// events (content changes, focus) carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	/// Message type discriminator.
	#[serde(rename = "type")]
	pub kind: String,
	/// Identifier of the command this message answers, if any.
	#[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<RequestId>,
	/// Type-specific body.
	#[serde(default)]
	pub payload: JsonValue,
}

impl Envelope {
	/// Creates a spontaneous event envelope.
	pub fn event(kind: impl Into<String>, payload: JsonValue) -> Self {
		Self {
			kind: kind.into(),
			request_id: None,
			payload,
		}
	}

	/// Creates a response envelope answering `request_id`.
	pub fn response(kind: impl Into<String>, request_id: RequestId, payload: JsonValue) -> Self {
		Self {
			kind: kind.into(),
			request_id: Some(request_id),
			payload,
		}
	}

	/// Parses raw message text.
	///
	/// # Errors
	///
	/// Returns [`crate::Error::Malformed`] when the text is not a JSON envelope.
	pub fn decode(raw: &str) -> Result<Self> {
		Ok(serde_json::from_str(raw)?)
	}

	/// Serializes the envelope to message text.
	///
	/// # Errors
	///
	/// Returns [`crate::Error::Malformed`] if the payload cannot be serialized.
	pub fn encode(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Deserializes the payload into a typed body.
	///
	/// # Errors
	///
	/// Returns [`crate::Error::Malformed`] when the payload has the wrong shape.
	pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
		Ok(T::deserialize(&self.payload)?)
	}
}
