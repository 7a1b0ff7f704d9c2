//! Sync Bridge - diff local thing state against the replicated store.
//!
//! Outgoing: each thing carries a `sent` flag. A full resync sends every
//! thing unconditionally. An incremental resync sends a thing only if its
//! flag is clear *and* its fresh description differs from the store's copy;
//! the flag alone is not enough because redundant notifications clear it
//! without changing anything.
//!
//! Incoming: remote entries are resolved first, then every affected thing is
//! detached from its slot, and only then re-attached. Swaps and chain moves
//! arriving in one batch therefore never pass through a state where two
//! things share a slot.
//!
//! A remote entry always wins its slot. A local occupant it lands on, left
//! there by a concurrent drop, is bumped back to the slot it came from (or
//! the first free slot of its kind), loses any claim and is re-sent, so all
//! replicas settle on the same layout.

use crate::error::Result;
use crate::info::ThingInfo;
use crate::store::ReplicatedStore;
use tabletop_core::{Board, Seat, SlotId, ThingIndex, Vec3};
use tracing::{debug, warn};

/// Outcome of ingesting a batch of remote entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    /// Things whose state was replaced, in batch order.
    pub applied: Vec<ThingIndex>,
    /// Deletion entries, which are ignored.
    pub deleted: usize,
    /// Entries naming an unknown thing, slot or seat.
    pub skipped: usize,
    /// Local things pushed out of a slot a remote entry claimed.
    pub bumped: Vec<ThingIndex>,
}

/// A remote entry with every name resolved against the local board.
struct Resolved {
    thing: ThingIndex,
    slot: SlotId,
    rotation: usize,
    claimed_by: Option<Seat>,
    held_rotation: Vec3,
    shift_slot: Option<SlotId>,
}

/// Counters kept across resyncs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub full_syncs: u64,
    pub incremental_syncs: u64,
    pub entries_sent: u64,
    pub entries_received: u64,
}

/// Keeps a board and a replicated store eventually consistent.
#[derive(Clone, Debug, Default)]
pub struct SyncBridge {
    stats: SyncStats,
}

impl SyncBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Describe a thing as it should appear in the store.
    pub fn describe(board: &Board, index: ThingIndex) -> ThingInfo {
        let thing = board.thing(index);
        ThingInfo {
            slot_name: board.slot(thing.slot()).name().to_string(),
            rotation_index: thing.rotation_index(),
            claimed_by: thing.claimed_by(),
            held_rotation: thing.held_rotation(),
            shift_slot_name: thing.shift_slot().map(|s| board.slot(s).name().to_string()),
        }
    }

    /// Entries that need transmitting. Marks every considered thing as sent.
    pub fn collect<S: ReplicatedStore>(
        &self,
        board: &mut Board,
        store: &S,
        full: bool,
    ) -> Vec<(ThingIndex, ThingInfo)> {
        let mut entries = Vec::new();
        for i in 0..board.things().len() {
            let index = ThingIndex(i);
            if full {
                entries.push((index, Self::describe(board, index)));
                board.mark_sent(index, true);
            } else if !board.thing(index).is_sent() {
                let desc = Self::describe(board, index);
                if store.thing(index).as_ref() != Some(&desc) {
                    entries.push((index, desc));
                }
                board.mark_sent(index, true);
            }
        }
        entries
    }

    /// Collect and transmit changed things. Returns how many were sent.
    pub fn send_update<S: ReplicatedStore>(
        &mut self,
        board: &mut Board,
        store: &S,
        full: bool,
    ) -> Result<usize> {
        let entries = self.collect(board, store, full);
        self.record_sent(entries.len(), full);
        let count = entries.len();
        if count > 0 {
            store.update_things(entries)?;
        }
        Ok(count)
    }

    /// Account for entries that were sent as part of a larger batch.
    pub fn record_sent(&mut self, count: usize, full: bool) {
        if full {
            self.stats.full_syncs += 1;
        } else {
            self.stats.incremental_syncs += 1;
        }
        self.stats.entries_sent += count as u64;
    }

    /// Apply remote entries to the board.
    pub fn ingest(
        &mut self,
        board: &mut Board,
        entries: &[(ThingIndex, Option<ThingInfo>)],
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let mut resolved = Vec::with_capacity(entries.len());

        for (index, info) in entries {
            let Some(info) = info else {
                report.deleted += 1;
                continue;
            };
            match Self::resolve(board, *index, info) {
                Some(entry) => resolved.push(entry),
                None => {
                    warn!(
                        thing = %index,
                        slot = %info.slot_name,
                        "skipping unresolvable remote entry"
                    );
                    report.skipped += 1;
                }
            }
        }

        for entry in &resolved {
            board.prepare_move(entry.thing);
        }
        for entry in &resolved {
            if let Some(occupant) = board.slot(entry.slot).thing().filter(|&t| t != entry.thing) {
                debug!(
                    thing = %entry.thing,
                    occupant = %occupant,
                    slot = board.slot(entry.slot).name(),
                    "remote entry bumps local occupant"
                );
                board.prepare_move(occupant);
                report.bumped.push(occupant);
            }
            board.move_to(entry.thing, entry.slot, entry.rotation);
            board.apply_remote_claim(
                entry.thing,
                entry.claimed_by,
                entry.held_rotation,
                entry.shift_slot,
            );
            board.mark_sent(entry.thing, true);
            report.applied.push(entry.thing);
        }

        for &thing in &report.bumped {
            Self::rehome(board, thing);
        }

        self.stats.entries_received += report.applied.len() as u64;
        report
    }

    /// Put a bumped thing back where it came from, or in the first free slot
    /// of its kind. The thing is released and left unsent.
    fn rehome(board: &mut Board, index: ThingIndex) {
        let thing = board.thing(index);
        let kind = thing.kind();
        let previous = thing.previous_slot();
        let rotation = thing.rotation_index();
        let home = if board.slot(previous).is_empty() {
            Some(previous)
        } else {
            board
                .slots()
                .iter()
                .find(|s| s.kind() == kind && s.is_empty())
                .map(|s| s.id())
        };
        let home = home.unwrap_or_else(|| {
            warn!(thing = %index, "no free slot for bumped thing");
            previous
        });
        board.move_to(index, home, rotation);
        board.release(index);
        board.mark_sent(index, false);
    }

    fn resolve(board: &Board, index: ThingIndex, info: &ThingInfo) -> Option<Resolved> {
        board.get_thing(index)?;
        let slot = board.slot_by_name(&info.slot_name)?;
        let shift_slot = match &info.shift_slot_name {
            Some(name) => Some(board.slot_by_name(name)?),
            None => None,
        };
        if let Some(seat) = info.claimed_by {
            if !seat.is_valid() {
                return None;
            }
        }
        Some(Resolved {
            thing: index,
            slot,
            rotation: info.rotation_index,
            claimed_by: info.claimed_by,
            held_rotation: info.held_rotation,
            shift_slot,
        })
    }
}
