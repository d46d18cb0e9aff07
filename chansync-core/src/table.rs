//! The slot table: a fixed-size merge arena keyed by slot index.
//!
//! Outcomes from every dispatch round fold into this table. Writes are
//! keyed by the slot's own index and overwrite whatever an earlier round
//! recorded for it - "last successful write per index wins" is the
//! concurrency-safety invariant of the whole engine, so the table needs no
//! locking even if fetches were to run truly in parallel.

use chansync_types::{ChannelSlot, SlotIndex, SLOT_COUNT};

/// Accumulates per-slot outcomes across dispatch rounds.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    entries: [Option<ChannelSlot>; SLOT_COUNT],
}

impl SlotTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a settled slot value. A later write for the same index
    /// supersedes an earlier one.
    pub fn record(&mut self, slot: ChannelSlot) {
        let idx = slot.index.as_usize();
        self.entries[idx] = Some(slot);
    }

    /// The value currently recorded for an index, if any.
    pub fn get(&self, index: SlotIndex) -> Option<&ChannelSlot> {
        self.entries[index.as_usize()].as_ref()
    }

    /// How many indices have a recorded value.
    pub fn recorded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Indices that never received a settled value.
    pub fn unanswered(&self) -> Vec<SlotIndex> {
        SlotIndex::all()
            .filter(|i| self.entries[i.as_usize()].is_none())
            .collect()
    }

    /// Finish the merge: exactly [`SLOT_COUNT`] slots ordered by index,
    /// no duplicates, no gaps. Unanswered indices default-fill, and every
    /// slot is stamped with the local observation time.
    pub fn into_slots(mut self, now_ms: u64) -> [ChannelSlot; SLOT_COUNT] {
        std::array::from_fn(|position| {
            let index = SlotIndex::new(position as u8).expect("position within SLOT_COUNT");
            self.entries[position]
                .take()
                .unwrap_or_else(|| ChannelSlot::default_for(index))
                .stamped(now_ms)
        })
    }
}
