#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Editing session engine for an embedded rich-document surface.
//!
//! Keeps the user's in-progress edits inside the surface consistent with
//! externally supplied document snapshots, without losing keystrokes, without
//! moving the cursor, and without the two event loops echoing changes back and
//! forth.
//!
//! # Main Types
//!
//! - [`EditCoordinator`] - Decides whether remote content applies now, waits, or is ignored
//! - [`SelectionSerializer`] - Captures and restores the selection as child-index paths
//! - [`Reconciler`] - Capture selection, replace content, restore selection
//! - [`SessionHandle`] - What the hosting screen holds
//!
//! # Architecture
//!
//! ```text
//! SessionHandle ──► session task ──► EditCoordinator
//!                        │
//!                        ├─► Reconciler ──► SelectionSerializer ──► Correlator ──► CommandSink
//!                        └─◄ inbound envelopes ◄──────────────────────────────────── surface
//! ```

pub mod config;
mod error;
/// Start-of-session bridge probe.
pub mod handshake;
pub mod reconcile;
pub mod selection;
pub mod session;
pub mod state;
mod text;

pub use config::{EditorOptions, SessionConfig};
pub use error::{Error, Result};
pub use handshake::BridgeStatus;
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use selection::SelectionSerializer;
pub use session::{
	NoOpEventHandler, SessionEventHandler, SessionHandle, SessionSnapshot, SharedEventHandler, spawn_session,
};
pub use state::{ApplyDecision, EditCoordinator, EditPhase, LocalChange};
pub use text::TextExtractor;
