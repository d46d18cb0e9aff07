//! Mock command transport for testing.
//!
//! Allows scripting per-slot answers and capturing issued commands for
//! verification. Each fetch against a slot consumes the next scripted
//! answer for that slot; a slot whose script runs dry answers Empty, the
//! device's "nothing configured here".

use super::CommandTransport;
use async_trait::async_trait;
use chansync_types::{CommandError, RawChannelPayload, SlotIndex, TargetId, SLOT_COUNT};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer for a single fetch attempt.
#[derive(Debug, Clone)]
pub enum MockAnswer {
    /// A channel payload.
    Payload(RawChannelPayload),
    /// The legitimate empty answer.
    Empty,
    /// A failed attempt.
    Fail(CommandError),
}

/// Mock command transport for testing.
///
/// Clones share state, so a test can keep a handle for assertions while
/// the engine owns the other.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    scripts: [VecDeque<MockAnswer>; SLOT_COUNT],
    delays: [Option<Duration>; SLOT_COUNT],
    passkey_error: Option<CommandError>,
    passkey_calls: Vec<TargetId>,
    fetch_calls: Vec<(TargetId, SlotIndex)>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next answer for a slot. Attempts consume answers in
    /// scripting order.
    pub fn script(&self, slot: SlotIndex, answer: MockAnswer) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripts[slot.as_usize()].push_back(answer);
    }

    /// Queue a payload answer for a slot.
    pub fn script_channel(&self, slot: SlotIndex, payload: RawChannelPayload) {
        self.script(slot, MockAnswer::Payload(payload));
    }

    /// Queue the empty answer for a slot.
    pub fn script_empty(&self, slot: SlotIndex) {
        self.script(slot, MockAnswer::Empty);
    }

    /// Queue a failed attempt for a slot.
    pub fn script_failure(&self, slot: SlotIndex, error: CommandError) {
        self.script(slot, MockAnswer::Fail(error));
    }

    /// Delay every answer for a slot by the given duration, to simulate
    /// out-of-order settlement across slots.
    pub fn delay(&self, slot: SlotIndex, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delays[slot.as_usize()] = Some(delay);
    }

    /// Cause passkey acquisition to fail with the given error.
    pub fn fail_passkey(&self, error: CommandError) {
        let mut inner = self.inner.lock().unwrap();
        inner.passkey_error = Some(error);
    }

    /// Targets that passkey acquisition was called for.
    pub fn passkey_calls(&self) -> Vec<TargetId> {
        let inner = self.inner.lock().unwrap();
        inner.passkey_calls.clone()
    }

    /// Every fetch issued, in issue order.
    pub fn fetch_calls(&self) -> Vec<(TargetId, SlotIndex)> {
        let inner = self.inner.lock().unwrap();
        inner.fetch_calls.clone()
    }

    /// How many fetches were issued for one slot.
    pub fn fetch_count_for(&self, slot: SlotIndex) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.fetch_calls.iter().filter(|(_, s)| *s == slot).count()
    }

    /// Clear all state (scripts, delays, captured calls).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl CommandTransport for MockTransport {
    async fn acquire_session_passkey(&self, target: &TargetId) -> Result<(), CommandError> {
        let mut inner = self.inner.lock().unwrap();
        inner.passkey_calls.push(*target);

        match inner.passkey_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn fetch_channel(
        &self,
        target: &TargetId,
        slot: SlotIndex,
    ) -> Result<Option<RawChannelPayload>, CommandError> {
        // Take the answer under the lock, then sleep outside it so slots
        // settle independently.
        let (answer, delay) = {
            let mut inner = self.inner.lock().unwrap();
            inner.fetch_calls.push((*target, slot));
            let answer = inner.scripts[slot.as_usize()].pop_front();
            (answer, inner.delays[slot.as_usize()])
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match answer {
            Some(MockAnswer::Payload(payload)) => Ok(Some(payload)),
            Some(MockAnswer::Empty) | None => Ok(None),
            Some(MockAnswer::Fail(error)) => Err(error),
        }
    }
}
