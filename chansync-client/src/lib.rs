//! # chansync-client
//!
//! Client-side synchronization engine for an 8-slot radio channel
//! configuration, reconciled against a constrained device over a lossy,
//! high-latency command transport.
//!
//! ## Architecture
//!
//! The engine uses pure decision logic (from chansync-core) and performs
//! the actual I/O via the [`CommandTransport`] trait.
//!
//! ```text
//! Application → ChannelSyncEngine → CommandTransport → radio
//!                      ↓
//!               chansync-core (pure classify / rounds / merge)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use chansync_client::{ChannelSyncEngine, MockTransport};
//! use chansync_types::TargetId;
//!
//! let mut engine = ChannelSyncEngine::new(MockTransport::new());
//! engine.on_progress(|message| eprintln!("{message}"));
//!
//! let slots = engine.synchronize(&TargetId::Node(0x42ab)).await?;
//! assert_eq!(slots.len(), 8);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod transport;

pub use engine::{ChannelSyncEngine, SyncError};
pub use transport::{CommandTransport, MockAnswer, MockTransport};

// Re-exported so callers can tune the engine without naming chansync-core.
pub use chansync_core::RetryPolicy;
