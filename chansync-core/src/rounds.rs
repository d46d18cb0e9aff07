//! The retry round state machine - NO I/O, just state transitions.
//!
//! A synchronization run dispatches all eight slots, collects the
//! retry-candidates, and re-dispatches only those, up to a bounded number
//! of rounds with a growing delay between them. The state machine here
//! decides *what happens next*; the actual waiting and dispatching is
//! performed by chansync-client, which interprets the returned
//! [`RoundAction`]s.
//!
//! The delay grows linearly and the round count is capped on purpose: the
//! peer is a constrained radio, and unconditional immediate retries would
//! amplify exactly the congestion that produced the original timeouts.

use crate::progress::Progress;
use chansync_types::SlotIndex;
use std::time::Duration;

/// Default delay multiplied per retry round (first retry waits 1x,
/// second 2x).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry policy for a synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry rounds after the initial dispatch. The default of 2 gives
    /// each slot at most 3 total attempts.
    pub max_retries: u32,
    /// Base backoff delay; round N of retries waits N times this.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

/// Where a synchronization run stands in its dispatch/retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundState {
    /// A round of fetches is in flight (or about to be dispatched).
    Dispatching {
        /// 0 for the initial full dispatch, 1.. for retry rounds.
        round: u32,
        /// The slot indices this round asks for.
        pending: Vec<SlotIndex>,
    },
    /// No retry candidates remain, or the budget ran out.
    Done,
}

/// Instructions produced by completing a round, interpreted by the engine.
///
/// The indices for the next dispatch travel in the returned
/// [`RoundState`] itself; actions cover everything else the engine must
/// do before that dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundAction {
    /// Sleep this long before the next dispatch.
    Wait(Duration),
    /// Report a phase transition to the progress observer.
    EmitProgress(Progress),
    /// Budget exhausted: these indices stay unanswered and will
    /// default-fill at merge time.
    Abandon(Vec<SlotIndex>),
}

impl RoundState {
    /// The initial round: every slot index, round 0.
    pub fn initial() -> Self {
        Self::Dispatching {
            round: 0,
            pending: SlotIndex::all().collect(),
        }
    }

    /// Complete the in-flight round with the retry candidates it produced.
    ///
    /// Pure transition: returns the next state plus the actions the engine
    /// must execute, in order. Candidates are deduplicated; an index's
    /// eligibility never depends on how many duplicate failures reported
    /// it.
    pub fn complete(self, retry_candidates: Vec<SlotIndex>, policy: &RetryPolicy) -> (Self, Vec<RoundAction>) {
        let round = match self {
            Self::Done => return (Self::Done, vec![]),
            Self::Dispatching { round, .. } => round,
        };

        let pending = dedup(retry_candidates);
        if pending.is_empty() {
            return (Self::Done, vec![]);
        }

        if round >= policy.max_retries {
            return (Self::Done, vec![RoundAction::Abandon(pending)]);
        }

        // 1-indexed multiply: the first retry waits base * 1, the second
        // base * 2.
        let next_round = round + 1;
        let delay = policy.base_delay * next_round;
        let actions = vec![
            RoundAction::Wait(delay),
            RoundAction::EmitProgress(Progress::Retrying {
                attempt: next_round,
                max_retries: policy.max_retries,
                count: pending.len(),
            }),
        ];

        (
            Self::Dispatching {
                round: next_round,
                pending,
            },
            actions,
        )
    }

    /// The indices the current round asks for, or None once done.
    pub fn pending(&self) -> Option<&[SlotIndex]> {
        match self {
            Self::Dispatching { pending, .. } => Some(pending),
            Self::Done => None,
        }
    }

    /// Whether the run still has a round to dispatch.
    pub fn is_dispatching(&self) -> bool {
        matches!(self, Self::Dispatching { .. })
    }
}

/// Deduplicate candidates, preserving first-seen order.
fn dedup(candidates: Vec<SlotIndex>) -> Vec<SlotIndex> {
    let mut seen = Vec::with_capacity(candidates.len());
    for index in candidates {
        if !seen.contains(&index) {
            seen.push(index);
        }
    }
    seen
}
