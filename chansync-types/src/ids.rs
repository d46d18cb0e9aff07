//! Slot and target identity types for chansync.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of physical channel slots on the device.
pub const SLOT_COUNT: usize = 8;

/// A physical channel slot index on the device.
///
/// Valid range is `0..8`. The index doubles as the array position of the
/// slot in a merged configuration, so it is checked at construction and
/// never synthesized from response order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Create a SlotIndex, returning None if the value is out of range.
    pub fn new(value: u8) -> Option<Self> {
        if (value as usize) < SLOT_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the numeric value of this index.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Get this index as an array position.
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Whether this is slot 0, which carries the Primary default role.
    pub fn is_first(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over all slot indices in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..SLOT_COUNT as u8).map(Self)
    }
}

impl Serialize for SlotIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

// Range-checked on the way in, so a stored configuration with a corrupt
// index fails loudly instead of producing an out-of-bounds arena write.
impl<'de> Deserialize<'de> for SlotIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::new(value).ok_or_else(|| {
            serde::de::Error::custom(format!("slot index {value} out of range 0..{SLOT_COUNT}"))
        })
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotIndex({})", self.0)
    }
}

/// The device a synchronization run addresses.
///
/// Reads against the locally connected node need no session passkey;
/// remote nodes require one before any parallel slot requests go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetId {
    /// The locally connected node.
    Local,
    /// A remote node reached over the mesh, by node number.
    Node(u32),
}

impl TargetId {
    /// Whether this target is the locally connected node.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Node(num) => write!(f, "node {num}"),
        }
    }
}

/// Error parsing a [`TargetId`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target {0:?}: expected \"local\" or a node number")]
pub struct ParseTargetError(pub String);

impl FromStr for TargetId {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        s.parse::<u32>()
            .map(Self::Node)
            .map_err(|_| ParseTargetError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_index_accepts_full_range() {
        for value in 0..8 {
            assert!(SlotIndex::new(value).is_some());
        }
    }

    #[test]
    fn slot_index_rejects_out_of_range() {
        assert!(SlotIndex::new(8).is_none());
        assert!(SlotIndex::new(255).is_none());
    }

    #[test]
    fn slot_index_all_is_ascending_and_complete() {
        let values: Vec<u8> = SlotIndex::all().map(|i| i.value()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn only_slot_zero_is_first() {
        assert!(SlotIndex::new(0).unwrap().is_first());
        assert!(!SlotIndex::new(1).unwrap().is_first());
        assert!(!SlotIndex::new(7).unwrap().is_first());
    }

    #[test]
    fn target_local_needs_no_passkey() {
        assert!(TargetId::Local.is_local());
        assert!(!TargetId::Node(0x42ab).is_local());
    }

    #[test]
    fn target_parses_local_case_insensitive() {
        assert_eq!("local".parse::<TargetId>().unwrap(), TargetId::Local);
        assert_eq!("LOCAL".parse::<TargetId>().unwrap(), TargetId::Local);
    }

    #[test]
    fn target_parses_node_number() {
        assert_eq!("12345".parse::<TargetId>().unwrap(), TargetId::Node(12345));
    }

    #[test]
    fn target_rejects_garbage() {
        assert!("nearby".parse::<TargetId>().is_err());
        assert!("-3".parse::<TargetId>().is_err());
    }

    #[test]
    fn slot_index_deserialization_is_range_checked() {
        let index: SlotIndex = serde_json::from_str("7").unwrap();
        assert_eq!(index.value(), 7);

        assert!(serde_json::from_str::<SlotIndex>("8").is_err());
    }

    #[test]
    fn slot_index_serde_round_trip() {
        let index = SlotIndex::new(3).unwrap();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, "3");
        assert_eq!(serde_json::from_str::<SlotIndex>(&json).unwrap(), index);
    }
}
