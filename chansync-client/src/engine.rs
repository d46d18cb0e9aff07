//! ChannelSyncEngine - the synchronization entry point.
//!
//! One call to [`ChannelSyncEngine::synchronize`] runs the whole
//! reconciliation: session gate, parallel per-slot fan-out,
//! classification, bounded retry rounds with backoff, and the final
//! merge into exactly eight ordered slots.
//!
//! The engine is deliberately thin: every decision (retry eligibility,
//! round budget, backoff length, merge precedence) is made by
//! chansync-core's pure logic; this module only executes the I/O those
//! decisions call for.

use crate::transport::CommandTransport;
use chansync_core::{classify, Progress, RetryPolicy, RoundAction, RoundState, SlotDecision, SlotTable};
use chansync_types::{
    ChannelSlot, CommandError, FieldDefaults, RawChannelPayload, SlotIndex, TargetId, SLOT_COUNT,
};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a synchronization run.
///
/// Per-slot failures never surface here; they resolve into the returned
/// slot array. Only the session gate is fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The session passkey could not be acquired for a remote target.
    /// No slot requests were issued.
    #[error("session passkey acquisition failed: {0}")]
    PasskeyAcquisition(#[source] CommandError),
}

type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// The channel synchronization engine.
///
/// Owns a [`CommandTransport`] and reconciles the device's 8 channel
/// slots into one ordered array per run.
pub struct ChannelSyncEngine<T: CommandTransport> {
    transport: T,
    policy: RetryPolicy,
    defaults: FieldDefaults,
    progress: Option<ProgressCallback>,
}

impl<T: CommandTransport> ChannelSyncEngine<T> {
    /// Create an engine with the default retry policy.
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    /// Create an engine with an explicit retry policy.
    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            defaults: FieldDefaults::default(),
            progress: None,
        }
    }

    /// Register a progress observer, fired at phase transitions.
    pub fn on_progress(&mut self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.progress = Some(Arc::new(callback));
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Synchronize the target's full channel configuration.
    ///
    /// Resolves to exactly [`SLOT_COUNT`] slots ordered by index, with no
    /// duplicates and no gaps; any slot without a successful answer is
    /// default-filled. Rejects only when the session gate fails against a
    /// non-local target - in that case no slot requests were issued.
    pub async fn synchronize(
        &self,
        target: &TargetId,
    ) -> Result<[ChannelSlot; SLOT_COUNT], SyncError> {
        info!(%target, "starting channel synchronization");

        // The gate: exactly one passkey acquisition, serialized before the
        // fan-out. Eight concurrent reads without a shared session context
        // is what garbles sessions on the device.
        if !target.is_local() {
            self.emit(&Progress::AcquiringPasskey);
            self.transport
                .acquire_session_passkey(target)
                .await
                .map_err(|error| {
                    warn!(%target, %error, "session passkey acquisition failed");
                    SyncError::PasskeyAcquisition(error)
                })?;
        }

        self.emit(&Progress::FetchingAll);

        let mut table = SlotTable::new();
        let mut state = RoundState::initial();

        while let Some(pending) = state.pending().map(<[SlotIndex]>::to_vec) {
            let outcomes = self.dispatch_round(target, &pending).await;

            let mut candidates = Vec::new();
            for (index, outcome) in outcomes {
                match classify(index, outcome, self.defaults) {
                    SlotDecision::Accepted(slot) => table.record(slot),
                    SlotDecision::Failed(slot) => {
                        warn!(%index, "slot failed permanently, default-filling");
                        table.record(slot);
                    }
                    SlotDecision::Retry(index) => {
                        debug!(%index, "transient slot failure, retry candidate");
                        candidates.push(index);
                    }
                }
            }

            let (next_state, actions) = state.complete(candidates, &self.policy);
            state = next_state;

            for action in actions {
                match action {
                    RoundAction::Wait(delay) => tokio::time::sleep(delay).await,
                    RoundAction::EmitProgress(progress) => self.emit(&progress),
                    RoundAction::Abandon(indices) => {
                        warn!(?indices, "retry budget exhausted, default-filling");
                    }
                }
            }
        }

        let slots = table.into_slots(now_ms());
        info!(%target, "channel synchronization complete");
        Ok(slots)
    }

    /// Dispatch one round: one fetch per requested index, concurrently,
    /// all settled before returning. Outcomes carry their originating
    /// index explicitly - retry rounds request sparse subsets and
    /// responses arrive in any order, so nothing is ever attributed
    /// positionally.
    async fn dispatch_round(
        &self,
        target: &TargetId,
        pending: &[SlotIndex],
    ) -> Vec<(SlotIndex, Result<Option<RawChannelPayload>, CommandError>)> {
        let fetches = pending.iter().map(|&index| async move {
            let outcome = self.transport.fetch_channel(target, index).await;
            (index, outcome)
        });
        join_all(fetches).await
    }

    fn emit(&self, progress: &Progress) {
        if let Some(callback) = &self.progress {
            callback(&progress.message());
        }
    }
}

/// Local wall-clock in Unix epoch milliseconds, for observation stamps.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use chansync_types::{ChannelRole, RoleField};
    use std::sync::Mutex;
    use std::time::Duration;

    fn slot(value: u8) -> SlotIndex {
        SlotIndex::new(value).unwrap()
    }

    fn named_payload(name: &str, role: i64) -> RawChannelPayload {
        RawChannelPayload {
            name: Some(name.to_string()),
            role: Some(RoleField::Number(role)),
            ..RawChannelPayload::default()
        }
    }

    /// Millisecond-scale policy so retry tests finish instantly.
    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    /// Strip the local observation stamps for value comparisons.
    fn unstamped(slots: &[ChannelSlot; SLOT_COUNT]) -> Vec<ChannelSlot> {
        slots
            .iter()
            .cloned()
            .map(|mut s| {
                s.created_at = 0;
                s.updated_at = 0;
                s
            })
            .collect()
    }

    // ===========================================
    // Shape Invariants
    // ===========================================

    #[tokio::test]
    async fn resolves_to_eight_ordered_slots() {
        let transport = MockTransport::new();
        transport.script_channel(slot(0), named_payload("LongFast", 1));
        transport.script_channel(slot(2), named_payload("Ops", 2));

        let engine = ChannelSyncEngine::with_policy(transport, fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(slots.len(), SLOT_COUNT);
        for (position, s) in slots.iter().enumerate() {
            assert_eq!(s.index.as_usize(), position);
        }
        assert_eq!(slots[0].name, "LongFast");
        assert_eq!(slots[2].name, "Ops");
        assert!(slots[5].name.is_empty());
    }

    #[tokio::test]
    async fn merge_stamps_observation_time() {
        let engine = ChannelSyncEngine::with_policy(MockTransport::new(), fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        for s in &slots {
            assert!(s.created_at > 0);
            assert_eq!(s.created_at, s.updated_at);
        }
    }

    #[tokio::test]
    async fn identical_answers_yield_identical_arrays() {
        let transport = MockTransport::new();
        // Script two identical runs' worth of answers.
        for _ in 0..2 {
            transport.script_channel(slot(0), named_payload("LongFast", 1));
            transport.script_channel(slot(3), named_payload("Rescue", 2));
        }

        let engine = ChannelSyncEngine::with_policy(transport, fast_policy());
        let first = engine.synchronize(&TargetId::Local).await.unwrap();
        let second = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(unstamped(&first), unstamped(&second));
    }

    // ===========================================
    // Session Gate
    // ===========================================

    #[tokio::test]
    async fn gate_failure_short_circuits_with_zero_fetches() {
        let transport = MockTransport::new();
        transport.fail_passkey(CommandError::PasskeyDenied("session table full".into()));

        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let result = engine.synchronize(&TargetId::Node(0x42ab)).await;

        assert!(matches!(result, Err(SyncError::PasskeyAcquisition(_))));
        assert_eq!(transport.fetch_calls().len(), 0);
    }

    #[tokio::test]
    async fn local_target_never_requests_passkey() {
        let transport = MockTransport::new();
        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());

        engine.synchronize(&TargetId::Local).await.unwrap();

        assert!(transport.passkey_calls().is_empty());
    }

    #[tokio::test]
    async fn remote_target_requests_passkey_once() {
        let transport = MockTransport::new();
        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let target = TargetId::Node(99);

        engine.synchronize(&target).await.unwrap();

        assert_eq!(transport.passkey_calls(), vec![target]);
    }

    // ===========================================
    // Retry Behavior
    // ===========================================

    #[tokio::test]
    async fn always_failing_slot_gets_three_attempts_then_default_fills() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.script_failure(slot(3), CommandError::Timeout);
        }

        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(transport.fetch_count_for(slot(3)), 3);
        assert_eq!(slots[3].role, ChannelRole::Disabled);
        assert!(slots[3].name.is_empty());
    }

    #[tokio::test]
    async fn retry_round_refetches_only_failed_slots() {
        let transport = MockTransport::new();
        transport.script_failure(slot(1), CommandError::NotReceived);
        transport.script_channel(slot(1), named_payload("Recovered", 2));
        transport.script_channel(slot(4), named_payload("Stable", 2));

        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        // Slot 1 needed the retry; every other slot settled in round 0.
        assert_eq!(transport.fetch_count_for(slot(1)), 2);
        assert_eq!(transport.fetch_count_for(slot(4)), 1);
        assert_eq!(transport.fetch_calls().len(), SLOT_COUNT + 1);
        assert_eq!(slots[1].name, "Recovered");
        assert_eq!(slots[4].name, "Stable");
    }

    #[tokio::test]
    async fn later_round_supersedes_earlier_failure() {
        // A permanent failure default-fills in round 0 only if it is not
        // transient; a transient failure that later succeeds must land
        // the successful value.
        let transport = MockTransport::new();
        transport.script_failure(slot(2), CommandError::Timeout);
        transport.script_failure(slot(2), CommandError::Timeout);
        transport.script_channel(slot(2), named_payload("ThirdTry", 2));

        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(transport.fetch_count_for(slot(2)), 3);
        assert_eq!(slots[2].name, "ThirdTry");
        assert_eq!(slots[2].role, ChannelRole::Secondary);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let transport = MockTransport::new();
        transport.script_failure(slot(6), CommandError::Other("malformed admin frame".into()));

        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(transport.fetch_count_for(slot(6)), 1);
        assert_eq!(slots[6].role, ChannelRole::Disabled);
    }

    #[tokio::test]
    async fn empty_answer_is_final_not_retried() {
        let transport = MockTransport::new();
        transport.script_empty(slot(5));

        let engine = ChannelSyncEngine::with_policy(transport.clone(), fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(transport.fetch_count_for(slot(5)), 1);
        assert_eq!(slots[5].role, ChannelRole::Disabled);
    }

    // ===========================================
    // Default-Fill Rules
    // ===========================================

    #[tokio::test]
    async fn unanswered_slot_zero_defaults_to_primary() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.script_failure(slot(0), CommandError::Timeout);
            transport.script_failure(slot(5), CommandError::Timeout);
        }

        let engine = ChannelSyncEngine::with_policy(transport, fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(slots[0].role, ChannelRole::Primary);
        assert_eq!(slots[5].role, ChannelRole::Disabled);
    }

    #[tokio::test]
    async fn role_correction_applies_through_the_engine() {
        let transport = MockTransport::new();
        transport.script_channel(
            slot(2),
            RawChannelPayload {
                name: Some("Ops".into()),
                psk: Some(String::new()),
                role: Some(RoleField::Number(0)),
                ..RawChannelPayload::default()
            },
        );

        let engine = ChannelSyncEngine::with_policy(transport, fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        assert_eq!(slots[2].role, ChannelRole::Secondary);
    }

    // ===========================================
    // Out-of-Order Settlement
    // ===========================================

    #[tokio::test]
    async fn reverse_arrival_order_still_indexes_correctly() {
        let transport = MockTransport::new();
        for value in 0..8u8 {
            transport.script_channel(slot(value), named_payload(&format!("ch{value}"), 2));
            // Lower indices answer last.
            transport.delay(slot(value), Duration::from_millis(u64::from(40 - 5 * value)));
        }

        let engine = ChannelSyncEngine::with_policy(transport, fast_policy());
        let slots = engine.synchronize(&TargetId::Local).await.unwrap();

        for (position, s) in slots.iter().enumerate() {
            assert_eq!(s.name, format!("ch{position}"));
        }
    }

    // ===========================================
    // Progress Reporting
    // ===========================================

    #[tokio::test]
    async fn progress_fires_at_phase_transitions() {
        let transport = MockTransport::new();
        transport.script_failure(slot(3), CommandError::Timeout);
        transport.script_failure(slot(7), CommandError::NotReceived);

        let mut engine = ChannelSyncEngine::with_policy(transport, fast_policy());
        let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        engine.on_progress(move |message| sink.lock().unwrap().push(message.to_string()));

        engine.synchronize(&TargetId::Node(12)).await.unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages[0], "Requesting session passkey…");
        assert_eq!(messages[1], "Requesting all channels…");
        assert_eq!(messages[2], "Retrying 2 failed channel(s) (attempt 1/2)…");
    }

    #[tokio::test]
    async fn no_progress_callback_is_fine() {
        let engine = ChannelSyncEngine::with_policy(MockTransport::new(), fast_policy());
        engine.synchronize(&TargetId::Local).await.unwrap();
    }
}
