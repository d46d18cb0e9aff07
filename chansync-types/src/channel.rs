//! The channel slot model and its normalization rules.
//!
//! A [`ChannelSlot`] is ephemeral per synchronization run: built fresh from
//! a device payload or from the default-fill rule, never mutated after
//! creation. Normalization is total — any payload the transport hands over
//! resolves to a usable slot record.

use crate::ids::SlotIndex;
use crate::payload::RawChannelPayload;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum device-visible channel name length, in characters.
pub const MAX_NAME_LEN: usize = 11;

/// Full position precision (all 32 bits shared).
pub const FULL_POSITION_PRECISION: u8 = 32;

/// The participation role of a channel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelRole {
    /// Slot is not in use.
    Disabled = 0,
    /// The device's main channel; normally exactly one per configuration.
    Primary = 1,
    /// An additional active channel.
    Secondary = 2,
}

impl ChannelRole {
    /// Resolve a numeric wire discriminant.
    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Primary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Resolve a string wire enum, case-insensitively.
    pub fn from_text(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("DISABLED") {
            Some(Self::Disabled)
        } else if value.eq_ignore_ascii_case("PRIMARY") {
            Some(Self::Primary)
        } else if value.eq_ignore_ascii_case("SECONDARY") {
            Some(Self::Secondary)
        } else {
            None
        }
    }

    /// The default role for a slot with no parseable role: Primary for
    /// slot 0, Disabled for every other slot.
    pub fn default_for(index: SlotIndex) -> Self {
        if index.is_first() {
            Self::Primary
        } else {
            Self::Disabled
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disabled => "disabled",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        };
        write!(f, "{text}")
    }
}

/// Caller-supplied defaults for boolean fields absent from a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefaults {
    /// Default for `uplink_enabled` when the payload omits it.
    pub uplink: bool,
    /// Default for `downlink_enabled` when the payload omits it.
    pub downlink: bool,
}

impl Default for FieldDefaults {
    /// Bridging a channel is opt-in.
    fn default() -> Self {
        Self {
            uplink: false,
            downlink: false,
        }
    }
}

/// One channel configuration slot in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSlot {
    /// Physical channel index; also the array position after merge.
    pub index: SlotIndex,
    /// Channel name; empty means unnamed.
    pub name: String,
    /// Base64-encoded pre-shared key; empty means unencrypted.
    pub psk: String,
    /// Participation role.
    pub role: ChannelRole,
    /// MQTT-style uplink bridging.
    pub uplink_enabled: bool,
    /// MQTT-style downlink bridging.
    pub downlink_enabled: bool,
    /// Bits of position precision shared on this channel (0..=32).
    pub position_precision: u8,
    /// When this client first observed this slot, Unix epoch ms.
    pub created_at: u64,
    /// When this client last observed this slot, Unix epoch ms.
    pub updated_at: u64,
}

impl ChannelSlot {
    /// The default-fill record for an index with no successful response.
    pub fn default_for(index: SlotIndex) -> Self {
        Self {
            index,
            name: String::new(),
            psk: String::new(),
            role: ChannelRole::default_for(index),
            uplink_enabled: false,
            downlink_enabled: false,
            position_precision: FULL_POSITION_PRECISION,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Normalize a raw device payload into a slot record.
    ///
    /// Applies every normalization rule uniformly: name truncation, psk
    /// validation, role resolution with the populated-but-disabled
    /// correction, boolean coercion with caller defaults, and precision
    /// clamping. Timestamps are left at zero; the merger stamps them.
    pub fn from_raw(index: SlotIndex, raw: &RawChannelPayload, defaults: FieldDefaults) -> Self {
        let name = normalize_name(raw.name.as_deref());
        let psk = normalize_psk(raw.psk.as_deref());
        let role = resolve_role(index, raw, &name, &psk);
        let uplink_enabled = raw
            .uplink_enabled
            .as_ref()
            .and_then(|f| f.resolve())
            .unwrap_or(defaults.uplink);
        let downlink_enabled = raw
            .downlink_enabled
            .as_ref()
            .and_then(|f| f.resolve())
            .unwrap_or(defaults.downlink);
        let position_precision = raw
            .position_precision
            .map(|bits| bits.min(u32::from(FULL_POSITION_PRECISION)) as u8)
            .unwrap_or(FULL_POSITION_PRECISION);

        Self {
            index,
            name,
            psk,
            role,
            uplink_enabled,
            downlink_enabled,
            position_precision,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Stamp the local observation time. Called by the merger, once, when
    /// the final configuration is assembled.
    pub fn stamped(mut self, now_ms: u64) -> Self {
        self.created_at = now_ms;
        self.updated_at = now_ms;
        self
    }

    /// Whether this slot carries any operator-visible configuration.
    pub fn is_configured(&self) -> bool {
        !self.name.is_empty() || !self.psk.is_empty()
    }
}

/// Resolve the role, then apply the populated-but-disabled correction:
/// a Disabled slot still carrying a name or psk is a role-inference miss
/// upstream, not an intentional state, and would hide a configured channel
/// from the operator.
fn resolve_role(index: SlotIndex, raw: &RawChannelPayload, name: &str, psk: &str) -> ChannelRole {
    let role = raw
        .role
        .as_ref()
        .and_then(|field| field.resolve())
        .unwrap_or_else(|| ChannelRole::default_for(index));

    if role == ChannelRole::Disabled && (!name.is_empty() || !psk.is_empty()) {
        if index.is_first() {
            ChannelRole::Primary
        } else {
            ChannelRole::Secondary
        }
    } else {
        role
    }
}

/// Truncate to the device's 11-character name limit, on a char boundary.
fn normalize_name(raw: Option<&str>) -> String {
    raw.map(|s| s.chars().take(MAX_NAME_LEN).collect())
        .unwrap_or_default()
}

/// Keep a psk only if it actually decodes as base64; garbage coerces to
/// empty (unencrypted) rather than travelling into the merged state.
fn normalize_psk(raw: Option<&str>) -> String {
    match raw {
        None => String::new(),
        Some(s) if s.is_empty() => String::new(),
        Some(s) => {
            if STANDARD.decode(s).is_ok() {
                s.to_string()
            } else {
                String::new()
            }
        }
    }
}
