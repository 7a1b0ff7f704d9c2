//! Claim Manager - seat-scoped exclusive holds on things.
//!
//! A claim is the only mutual-exclusion primitive between seats. It is
//! cooperative: the first applied claim wins and a losing seat learns about
//! it when the winner's update is ingested. `claimed_by` and `shift_slot` are
//! written nowhere else in the crate.

use crate::geometry::Vec3;
use crate::ids::{Seat, SlotId, ThingIndex};
use crate::topology::Board;

impl Board {
    /// Claim a thing for `seat`. Fails if anyone already holds it.
    pub fn hold(&mut self, index: ThingIndex, seat: Seat) -> bool {
        let thing = self.thing_mut(index);
        if thing.claimed_by.is_some() {
            return false;
        }
        thing.claimed_by = Some(seat);
        thing.sent = false;
        true
    }

    /// Claim a thing that is being displaced by a shift and route it through
    /// `via` until the movement is committed or abandoned.
    pub fn hold_routed(&mut self, index: ThingIndex, seat: Seat, via: SlotId) -> bool {
        if !self.hold(index, seat) {
            return false;
        }
        self.thing_mut(index).shift_slot = Some(via);
        true
    }

    /// Drop the claim and any shift routing. Idempotent.
    pub fn release(&mut self, index: ThingIndex) {
        let thing = self.thing_mut(index);
        if thing.claimed_by.is_some() || thing.shift_slot.is_some() {
            thing.claimed_by = None;
            thing.shift_slot = None;
            thing.sent = false;
        }
    }

    /// Release every thing held by `seat`.
    pub fn release_seat(&mut self, seat: Seat) {
        for index in self.held_by(seat) {
            self.release(index);
        }
    }

    /// Release things `seat` only holds because a shift displaced them.
    pub fn release_routed(&mut self, seat: Seat) {
        let routed: Vec<_> = self
            .things
            .iter()
            .filter(|t| t.claimed_by == Some(seat) && t.shift_slot.is_some())
            .map(|t| t.index())
            .collect();
        for index in routed {
            self.release(index);
        }
    }

    pub fn release_all(&mut self) {
        for i in 0..self.things.len() {
            self.release(ThingIndex(i));
        }
    }

    /// True iff any thing is claimed by `seat`.
    pub fn is_holding(&self, seat: Seat) -> bool {
        self.things.iter().any(|t| t.claimed_by == Some(seat))
    }

    /// Things claimed by `seat`, in index order.
    pub fn held_by(&self, seat: Seat) -> Vec<ThingIndex> {
        self.things
            .iter()
            .filter(|t| t.claimed_by == Some(seat))
            .map(|t| t.index())
            .collect()
    }

    /// Overwrite claim state with what a remote replica reported.
    pub fn apply_remote_claim(
        &mut self,
        index: ThingIndex,
        claimed_by: Option<Seat>,
        held_rotation: Vec3,
        shift_slot: Option<SlotId>,
    ) {
        let thing = self.thing_mut(index);
        thing.claimed_by = claimed_by;
        thing.held_rotation = held_rotation;
        thing.shift_slot = shift_slot;
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::{Place, Vec3};
    use crate::ids::{Seat, ThingIndex};
    use crate::topology::{Board, SlotSpec, ThingKind};

    fn board() -> Board {
        let place = Place::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(6.0, 9.0, 4.0));
        Board::builder()
            .slot(SlotSpec::new("a", ThingKind::Tile, Vec3::ZERO).place(place))
            .slot(SlotSpec::new("b", ThingKind::Tile, Vec3::ZERO).place(place))
            .thing(ThingKind::Tile, 0, "a", 0)
            .thing(ThingKind::Tile, 1, "b", 0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_hold_is_exclusive() {
        let mut board = board();
        assert!(board.hold(ThingIndex(0), Seat(0)));
        assert!(!board.hold(ThingIndex(0), Seat(1)));
        assert_eq!(board.thing(ThingIndex(0)).claimed_by(), Some(Seat(0)));
        assert!(board.is_holding(Seat(0)));
        assert!(!board.is_holding(Seat(1)));
    }

    #[test]
    fn test_release_is_idempotent_and_clears_routing() {
        let mut board = board();
        let b = board.slot_by_name("b").unwrap();
        assert!(board.hold_routed(ThingIndex(0), Seat(2), b));
        assert!(board.thing(ThingIndex(0)).is_routed());

        board.release(ThingIndex(0));
        board.release(ThingIndex(0));

        let thing = board.thing(ThingIndex(0));
        assert_eq!(thing.claimed_by(), None);
        assert_eq!(thing.shift_slot(), None);
        assert!(board.check_invariants().is_ok());
    }

    #[test]
    fn test_release_routed_keeps_dragged_things() {
        let mut board = board();
        let a = board.slot_by_name("a").unwrap();
        board.hold(ThingIndex(0), Seat(1));
        board.hold_routed(ThingIndex(1), Seat(1), a);

        board.release_routed(Seat(1));

        assert_eq!(board.held_by(Seat(1)), vec![ThingIndex(0)]);
    }

    #[test]
    fn test_release_seat_only_touches_that_seat() {
        let mut board = board();
        board.hold(ThingIndex(0), Seat(0));
        board.hold(ThingIndex(1), Seat(1));

        board.release_seat(Seat(0));

        assert!(!board.is_holding(Seat(0)));
        assert!(board.is_holding(Seat(1)));
    }
}
