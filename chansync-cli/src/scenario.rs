//! Scripted device scenarios for the mock transport.
//!
//! A scenario file is JSON: per-slot lists of answers, consumed one per
//! fetch attempt, plus an optional passkey denial. Slots without a script
//! answer Empty, like an unconfigured device.
//!
//! ```json
//! {
//!   "deny_passkey": false,
//!   "slots": {
//!     "0": [{ "kind": "payload", "channel": { "name": "LongFast", "role": 1 } }],
//!     "3": [{ "kind": "timeout" }, { "kind": "payload", "channel": { "name": "Rescue", "role": 2 } }]
//!   }
//! }
//! ```

use anyhow::{bail, Context, Result};
use chansync_client::{MockAnswer, MockTransport};
use chansync_types::{CommandError, RawChannelPayload, SlotIndex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A scripted device for a demo or test run.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Per-slot attempt scripts, keyed by slot index.
    pub slots: BTreeMap<u8, Vec<ScriptedAnswer>>,
    /// Deny the session passkey (fails the whole run for remote targets).
    pub deny_passkey: bool,
}

/// One scripted answer for one fetch attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedAnswer {
    /// A channel payload.
    Payload {
        /// The raw channel record the device reports.
        channel: RawChannelPayload,
    },
    /// The legitimate "nothing configured here" answer.
    Empty,
    /// The transport's deadline elapsed.
    Timeout,
    /// The response packet never arrived.
    NotReceived,
    /// No route to the node.
    NotFound,
    /// Any other failure, verbatim.
    Fail {
        /// The error message.
        message: String,
    },
}

impl ScriptedAnswer {
    fn into_mock(self) -> MockAnswer {
        match self {
            Self::Payload { channel } => MockAnswer::Payload(channel),
            Self::Empty => MockAnswer::Empty,
            Self::Timeout => MockAnswer::Fail(CommandError::Timeout),
            Self::NotReceived => MockAnswer::Fail(CommandError::NotReceived),
            Self::NotFound => MockAnswer::Fail(CommandError::NotFound),
            Self::Fail { message } => MockAnswer::Fail(CommandError::Other(message)),
        }
    }
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// The built-in demo: two configured channels, one slot that recovers
    /// on its first retry, one that never answers.
    pub fn demo() -> Self {
        let json = r#"{
            "slots": {
                "0": [{ "kind": "payload", "channel": { "name": "LongFast", "role": 1 } }],
                "1": [{ "kind": "payload", "channel": { "name": "Ops", "role": 2, "psk": "AQIDBA==", "uplinkEnabled": 1 } }],
                "3": [{ "kind": "timeout" },
                      { "kind": "payload", "channel": { "name": "Rescue", "role": 2, "positionPrecision": 16 } }],
                "6": [{ "kind": "timeout" }, { "kind": "timeout" }, { "kind": "timeout" }]
            }
        }"#;
        serde_json::from_str(json).expect("built-in demo scenario is valid")
    }

    /// Build the scripted mock transport, validating slot keys.
    pub fn into_transport(self) -> Result<MockTransport> {
        let transport = MockTransport::new();

        for (key, answers) in self.slots {
            let Some(slot) = SlotIndex::new(key) else {
                bail!("scenario slot {key} is out of range (device has 8 slots)");
            };
            for answer in answers {
                transport.script(slot, answer.into_mock());
            }
        }

        if self.deny_passkey {
            transport.fail_passkey(CommandError::PasskeyDenied("scripted denial".into()));
        }

        Ok(transport)
    }
}
