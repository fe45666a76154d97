//! Start-of-session bridge probe.

use std::time::Duration;

use scribe_protocol::{Command, HandshakeAck, kind};
use scribe_rpc::Correlator;
use tracing::{debug, warn};

/// Whether the embedded surface has proven it can answer requests.
///
/// Diagnostic only: an unverified bridge is still used normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
	/// The probe has not resolved yet.
	Pending,
	/// The surface acknowledged the probe.
	Verified {
		/// Protocol revision the surface reported.
		version: u32,
	},
	/// The probe timed out, was cancelled, or got a malformed answer.
	Unverified,
}

/// Sends a `handshake` command and waits for its acknowledgement.
pub async fn probe(correlator: &Correlator, timeout: Duration) -> BridgeStatus {
	let reply = correlator
		.request(kind::HANDSHAKE_ACK, timeout, |id| {
			Command::Handshake { request_id: id.clone() }.encode()
		})
		.await
		.and_then(|envelope| envelope.payload_as::<HandshakeAck>());

	match reply {
		Ok(HandshakeAck { version }) => {
			if version != scribe_protocol::PROTOCOL_VERSION {
				warn!(version, expected = scribe_protocol::PROTOCOL_VERSION, "bridge.handshake.version_mismatch");
			}
			debug!(version, "bridge.handshake.verified");
			BridgeStatus::Verified { version }
		}
		Err(err) => {
			warn!(error = %err, "bridge.handshake.unverified");
			BridgeStatus::Unverified
		}
	}
}
