//! Progress phases reported to the UI collaborator.
//!
//! The engine emits these at phase transitions; rendering to a status line
//! is pure so the UI layer can also match on the variant directly.

use std::fmt;

/// A phase transition in a synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Waiting on the session passkey before any fan-out.
    AcquiringPasskey,
    /// Initial dispatch of all channel slots.
    FetchingAll,
    /// A retry round is starting.
    Retrying {
        /// 1-indexed retry round.
        attempt: u32,
        /// The policy's retry budget.
        max_retries: u32,
        /// How many slots this round re-asks for.
        count: usize,
    },
}

impl Progress {
    /// The human-readable status line for this phase.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquiringPasskey => write!(f, "Requesting session passkey…"),
            Self::FetchingAll => write!(f, "Requesting all channels…"),
            Self::Retrying {
                attempt,
                max_retries,
                count,
            } => write!(
                f,
                "Retrying {count} failed channel(s) (attempt {attempt}/{max_retries})…"
            ),
        }
    }
}
