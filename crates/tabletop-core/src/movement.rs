//! Movement Planner - the transient thing-to-slot mapping of one drag.
//!
//! A movement is built incrementally while the pointer moves, extended with
//! shift chains that push resting occupants out of the way, and only touches
//! the board when it is applied on a successful drop. `ChainShift` is the
//! default planner; any other strategy can be plugged in behind `Movement`.

use crate::ids::{Seat, SlotId, ThingIndex};
use crate::topology::{Board, Link};
use std::collections::HashSet;

/// Contract of a movement planner.
pub trait Movement: Default {
    /// Map a held thing to its target slot.
    fn move_thing(&mut self, thing: ThingIndex, slot: SlotId);

    /// Whether `slot` is already the target of a held thing.
    fn has_slot(&self, slot: SlotId) -> bool;

    /// Make room at occupied targets by displacing occupants along the given
    /// link chains, trying the links in order. Only things in `candidates`
    /// may be displaced.
    fn find_shift(&mut self, board: &Board, candidates: &[ThingIndex], links: &[Link]) -> bool;

    /// Orient every held thing the way it will rest at its target.
    fn rotate_held(&self, board: &mut Board);

    /// Claim displaced things for `seat` and route them through their new slot.
    fn apply_shift(&self, board: &mut Board, seat: Seat);

    /// Whether `seat` can commit the mapping. Every moved or displaced
    /// thing must still be claimed by `seat`.
    fn valid(&self, board: &Board, seat: Seat) -> bool;

    /// Commit every assignment at once.
    fn apply(&self, board: &mut Board);

    /// Held things, in the order they were mapped.
    fn things(&self) -> Vec<ThingIndex>;

    /// Target slots of held things.
    fn slots(&self) -> Vec<SlotId>;

    fn get(&self, thing: ThingIndex) -> Option<SlotId>;
}

/// Planner that displaces occupants one slot at a time along shift links.
#[derive(Clone, Debug, Default)]
pub struct ChainShift {
    targets: Vec<(ThingIndex, SlotId)>,
    shifts: Vec<(ThingIndex, SlotId)>,
}

impl ChainShift {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displaced things and the slots they are routed to.
    pub fn shifts(&self) -> &[(ThingIndex, SlotId)] {
        &self.shifts
    }

    fn is_moving(&self, thing: ThingIndex) -> bool {
        self.targets.iter().any(|&(t, _)| t == thing)
    }

    fn is_shifted(&self, thing: ThingIndex) -> bool {
        self.shifts.iter().any(|&(t, _)| t == thing)
    }

    fn is_shift_target(&self, slot: SlotId) -> bool {
        self.shifts.iter().any(|&(_, s)| s == slot)
    }

    /// Walk from the occupied `start` along `link` until a free slot turns up.
    /// Returns the displacements, or `None` if the chain is blocked.
    fn walk_chain(
        &self,
        board: &Board,
        start: SlotId,
        link: Link,
        candidates: &[ThingIndex],
    ) -> Option<Vec<(ThingIndex, SlotId)>> {
        let mut chain: Vec<(ThingIndex, SlotId)> = Vec::new();
        let mut current = start;

        for _ in 0..board.slots().len() {
            let occupant = board.slot(current).thing()?;
            let thing = board.thing(occupant);
            if !candidates.contains(&occupant) || thing.claimed_by().is_some() {
                return None;
            }

            let next = board.slot(current).link(link)?;
            let next_slot = board.slot(next);
            if next_slot.kind() != thing.kind()
                || self.has_slot(next)
                || self.is_shift_target(next)
                || chain.iter().any(|&(_, s)| s == next)
            {
                return None;
            }
            chain.push((occupant, next));

            match next_slot.thing() {
                None => return Some(chain),
                Some(other) if self.is_moving(other) => return Some(chain),
                Some(other) if self.is_shifted(other) => return None,
                Some(_) => current = next,
            }
        }
        None
    }

    fn is_free_after_apply(&self, board: &Board, slot: SlotId) -> bool {
        match board.slot(slot).thing() {
            None => true,
            Some(occupant) => self.is_moving(occupant) || self.is_shifted(occupant),
        }
    }
}

impl Movement for ChainShift {
    fn move_thing(&mut self, thing: ThingIndex, slot: SlotId) {
        self.targets.retain(|&(t, _)| t != thing);
        self.targets.push((thing, slot));
    }

    fn has_slot(&self, slot: SlotId) -> bool {
        self.targets.iter().any(|&(_, s)| s == slot)
    }

    fn find_shift(&mut self, board: &Board, candidates: &[ThingIndex], links: &[Link]) -> bool {
        self.shifts.clear();

        for i in 0..self.targets.len() {
            let target = self.targets[i].1;
            let Some(occupant) = board.slot(target).thing() else {
                continue;
            };
            if self.is_moving(occupant) || self.is_shifted(occupant) {
                continue;
            }

            let chain = links
                .iter()
                .find_map(|&link| self.walk_chain(board, target, link, candidates));
            match chain {
                Some(chain) => self.shifts.extend(chain),
                None => {
                    self.shifts.clear();
                    return false;
                }
            }
        }
        true
    }

    fn rotate_held(&self, board: &mut Board) {
        for &(thing, slot) in &self.targets {
            let rotation = board.thing(thing).rotation_index();
            let held = board.slot(slot).base_place(rotation).rotation;
            board.set_held_rotation(thing, held);
        }
    }

    fn apply_shift(&self, board: &mut Board, seat: Seat) {
        for &(thing, slot) in &self.shifts {
            board.hold_routed(thing, seat, slot);
        }
    }

    fn valid(&self, board: &Board, seat: Seat) -> bool {
        if self.targets.is_empty() {
            return false;
        }
        let mut seen = HashSet::new();
        for &(thing, slot) in self.targets.iter().chain(self.shifts.iter()) {
            if board.thing(thing).claimed_by() != Some(seat) {
                return false;
            }
            if !seen.insert(slot) || !self.is_free_after_apply(board, slot) {
                return false;
            }
        }
        true
    }

    fn apply(&self, board: &mut Board) {
        let moves: Vec<_> = self
            .targets
            .iter()
            .chain(self.shifts.iter())
            .copied()
            .collect();
        tracing::debug!(
            held = self.targets.len(),
            shifted = self.shifts.len(),
            "applying movement"
        );
        board.move_things(&moves);
    }

    fn things(&self) -> Vec<ThingIndex> {
        self.targets.iter().map(|&(t, _)| t).collect()
    }

    fn slots(&self) -> Vec<SlotId> {
        self.targets.iter().map(|&(_, s)| s).collect()
    }

    fn get(&self, thing: ThingIndex) -> Option<SlotId> {
        self.targets
            .iter()
            .find(|&&(t, _)| t == thing)
            .map(|&(_, s)| s)
    }
}
