//! Command transport abstraction for chansync.
//!
//! The engine never talks to the radio directly; it issues commands
//! through this trait and reacts to their outcomes. How commands are
//! framed and carried (HTTP, serial, BLE) and how the passkey is used by
//! the device are the transport implementation's business.
//!
//! # Design
//!
//! Both operations are request/response and resolve exactly once:
//! - `acquire_session_passkey()` primes the device session before
//!   concurrent reads
//! - `fetch_channel()` reads one slot; `Ok(None)` is the legitimate
//!   "nothing configured at this index" answer, not an error
//!
//! The transport owns its own timeouts: a peer that never answers must
//! surface as an `Err` with a transient [`CommandError`], which is what
//! the retry classifier keys on.

mod mock;

pub use mock::{MockAnswer, MockTransport};

use async_trait::async_trait;
use chansync_types::{CommandError, RawChannelPayload, SlotIndex, TargetId};

/// Transport trait for issuing device commands.
///
/// Implementations handle the underlying command mechanism; the mock
/// implementation scripts outcomes for tests and demos.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Acquire a session passkey for the target.
    ///
    /// Called once per synchronization run, before any slot fetches, for
    /// non-local targets only. Must be safe to call when a passkey
    /// already exists.
    async fn acquire_session_passkey(&self, target: &TargetId) -> Result<(), CommandError>;

    /// Fetch the channel configured at one slot index.
    ///
    /// `Ok(None)` means "no channel configured here" and is a valid,
    /// final answer for the slot.
    async fn fetch_channel(
        &self,
        target: &TargetId,
        slot: SlotIndex,
    ) -> Result<Option<RawChannelPayload>, CommandError>;
}
