//! # chansync-types
//!
//! Foundational types for the chansync channel synchronization engine:
//! - [`SlotIndex`], [`TargetId`] - Slot and target identity types
//! - [`ChannelSlot`], [`ChannelRole`] - The normalized channel slot model
//! - [`RawChannelPayload`] - Loosely-typed payloads as the device reports them
//! - [`CommandError`] - Transport outcome taxonomy shared with the classifier

#![warn(missing_docs)]
#![warn(clippy::all)]

mod channel;
mod error;
mod ids;
mod payload;

pub use channel::{
    ChannelRole, ChannelSlot, FieldDefaults, FULL_POSITION_PRECISION, MAX_NAME_LEN,
};
pub use error::CommandError;
pub use ids::{ParseTargetError, SlotIndex, TargetId, SLOT_COUNT};
pub use payload::{BoolField, RawChannelPayload, RoleField};
