//! Loosely-typed channel payloads as the command transport delivers them.
//!
//! Device firmware revisions disagree on field spelling and on whether
//! enums travel as numbers or strings, so every field here is optional and
//! absorbs all observed representations. Resolution into a strict
//! [`ChannelSlot`](crate::ChannelSlot) happens in one place,
//! [`ChannelSlot::from_raw`](crate::ChannelSlot::from_raw).

use crate::channel::ChannelRole;
use serde::{Deserialize, Serialize};

/// A channel record as the device reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawChannelPayload {
    /// Channel name; device limit is 11 characters.
    pub name: Option<String>,
    /// Base64-encoded pre-shared key; empty or absent means unencrypted.
    pub psk: Option<String>,
    /// Channel role; numeric or string enum depending on firmware.
    pub role: Option<RoleField>,
    /// MQTT-style uplink bridging flag.
    #[serde(alias = "uplinkEnabled")]
    pub uplink_enabled: Option<BoolField>,
    /// MQTT-style downlink bridging flag.
    #[serde(alias = "downlinkEnabled")]
    pub downlink_enabled: Option<BoolField>,
    /// Bits of position precision shared on this channel.
    #[serde(alias = "positionPrecision")]
    pub position_precision: Option<u32>,
}

/// A role value as it may arrive on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleField {
    /// Numeric discriminant (0, 1, 2).
    Number(i64),
    /// String enum (`"DISABLED"`, `"PRIMARY"`, `"SECONDARY"`).
    Text(String),
}

impl RoleField {
    /// Resolve to a [`ChannelRole`], or None when unparseable.
    pub fn resolve(&self) -> Option<ChannelRole> {
        match self {
            Self::Number(n) => ChannelRole::from_number(*n),
            Self::Text(s) => ChannelRole::from_text(s),
        }
    }
}

/// A boolean value as it may arrive on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoolField {
    /// A genuine boolean.
    Flag(bool),
    /// Numeric 0/1.
    Number(i64),
    /// String `"true"`/`"false"`/`"1"`/`"0"`.
    Text(String),
}

impl BoolField {
    /// Resolve to a bool, or None when unparseable.
    pub fn resolve(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Number(0) => Some(false),
            Self::Number(1) => Some(true),
            Self::Number(_) => None,
            Self::Text(s) => match s.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        }
    }
}
