//! Slot Resolver - best-fit destination for a dragged footprint.
//!
//! Every slot of the requested kind is scored by how much the dragged box
//! overlaps the slot's box, plus half of the overlap of both boxes dilated by
//! half a piece width. The highest score above the threshold wins; ties keep
//! the slot declared first.

use crate::geometry::{rectangle_overlap, Rect};
use crate::ids::{Seat, SlotId};
use crate::topology::{Board, Slot, ThingKind};

/// Tunables for placement resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolverConfig {
    /// Width of a single piece; half of it is the dilation margin.
    pub piece_width: f32,
    /// Scores at or below this value count as "no target".
    pub min_score: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            piece_width: 6.0,
            min_score: 1.0,
        }
    }
}

impl ResolverConfig {
    pub fn margin(&self) -> f32 {
        self.piece_width / 2.0
    }
}

/// Overlap score of a dragged box against a slot box.
pub fn overlap_score(dragged: Rect, slot: Rect, margin: f32) -> f32 {
    let direct = rectangle_overlap(dragged, slot);
    let dilated = rectangle_overlap(dragged.dilate(margin), slot.dilate(margin));
    direct + dilated * 0.5
}

/// Whether `slot` may receive a thing dragged by `seat`.
///
/// `taken` reports slots already claimed by the in-progress movement.
pub fn is_eligible(board: &Board, slot: &Slot, seat: Seat, taken: impl Fn(SlotId) -> bool) -> bool {
    if let Some(occupant) = slot.thing() {
        // Occupied, but shiftable slots may still make room.
        if board.thing(occupant).claimed_by() != Some(seat) && !slot.links().is_shiftable() {
            return false;
        }
    }
    if taken(slot.id()) {
        return false;
    }
    if let Some(required) = slot.links().requires {
        if board.slot(required).is_empty() {
            return false;
        }
    }
    true
}

/// Find the best slot of `kind` for a thing dragged by `seat` to `dragged`.
pub fn find_slot(
    board: &Board,
    dragged: Rect,
    kind: ThingKind,
    seat: Seat,
    taken: impl Fn(SlotId) -> bool,
    config: &ResolverConfig,
) -> Option<SlotId> {
    let margin = config.margin();
    let mut best_score = config.min_score;
    let mut best = None;

    for slot in board.slots() {
        if slot.kind() != kind || !is_eligible(board, slot, seat, &taken) {
            continue;
        }
        let footprint = slot.place_with_offset(0).footprint();
        let score = overlap_score(dragged, footprint, margin);
        if score > best_score {
            best_score = score;
            best = Some(slot.id());
        }
    }

    if let Some(id) = best {
        tracing::trace!(slot = board.slot(id).name(), score = best_score, "resolved drop target");
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Place, Vec3};
    use crate::ids::ThingIndex;
    use crate::topology::{Link, SlotSpec};

    const SIZE: Vec3 = Vec3::new(6.0, 9.0, 4.0);

    fn spec(name: &str, x: f32) -> SlotSpec {
        SlotSpec::new(name, ThingKind::Tile, Vec3::new(x, 0.0, 0.0))
            .place(Place::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO, SIZE))
    }

    fn at(x: f32) -> Rect {
        Rect::new(x, 0.0, SIZE.x, SIZE.y)
    }

    #[test]
    fn test_exact_overlap_beats_partial() {
        let board = Board::builder()
            .slot(spec("a", 0.0))
            .slot(spec("b", 6.0))
            .build()
            .unwrap();
        let config = ResolverConfig::default();

        let found = find_slot(&board, at(6.0), ThingKind::Tile, Seat(0), |_| false, &config);
        assert_eq!(found, board.slot_by_name("b"));

        let found = find_slot(&board, at(2.0), ThingKind::Tile, Seat(0), |_| false, &config);
        assert_eq!(found, board.slot_by_name("a"));
    }

    #[test]
    fn test_coincident_score_is_full_areas() {
        let margin = 3.0;
        let score = overlap_score(at(0.0), at(0.0), margin);
        assert_eq!(score, 54.0 + 0.5 * (9.0 * 12.0));
    }

    #[test]
    fn test_far_away_is_no_target() {
        let board = Board::builder().slot(spec("a", 0.0)).build().unwrap();
        let found = find_slot(
            &board,
            at(100.0),
            ThingKind::Tile,
            Seat(0),
            |_| false,
            &ResolverConfig::default(),
        );
        assert_eq!(found, None);
    }

    #[test]
    fn test_margin_only_overlap_below_threshold_is_rejected() {
        let board = Board::builder().slot(spec("a", 0.0)).build().unwrap();
        // Boxes are disjoint; dilated boxes overlap by 0.2 x 12 = 2.4, scoring 1.2.
        let config = ResolverConfig {
            min_score: 1.5,
            ..Default::default()
        };
        let found = find_slot(&board, at(8.8), ThingKind::Tile, Seat(0), |_| false, &config);
        assert_eq!(found, None);
    }

    #[test]
    fn test_ties_keep_first_declared() {
        let board = Board::builder()
            .slot(spec("a", 0.0))
            .slot(spec("b", 6.0))
            .build()
            .unwrap();
        let found = find_slot(
            &board,
            at(3.0),
            ThingKind::Tile,
            Seat(0),
            |_| false,
            &ResolverConfig::default(),
        );
        assert_eq!(found, board.slot_by_name("a"));
    }

    #[test]
    fn test_eligibility_rules() {
        let mut board = Board::builder()
            .slot(spec("occupied", 0.0))
            .slot(spec("shiftable", 10.0).link(Link::ShiftRight, "gate"))
            .slot(spec("gated", 20.0).link(Link::Requires, "gate"))
            .slot(spec("gate", 30.0))
            .thing(ThingKind::Tile, 0, "occupied", 0)
            .thing(ThingKind::Tile, 1, "shiftable", 0)
            .build()
            .unwrap();
        let config = ResolverConfig::default();
        let find = |board: &Board, x: f32| {
            find_slot(board, at(x), ThingKind::Tile, Seat(0), |_| false, &config)
        };

        assert_eq!(find(&board, 0.0), None);
        assert_eq!(find(&board, 10.0), board.slot_by_name("shiftable"));
        assert_eq!(find(&board, 20.0), None);

        // A thing held by the dragging seat does not block its own slot.
        board.hold(ThingIndex(0), Seat(0));
        assert_eq!(find(&board, 0.0), board.slot_by_name("occupied"));

        let occupied = board.slot_by_name("occupied").unwrap();
        let taken = find_slot(
            &board,
            at(0.0),
            ThingKind::Tile,
            Seat(0),
            |slot| slot == occupied,
            &config,
        );
        assert_eq!(taken, None);
    }

    #[test]
    fn test_kind_must_match() {
        let board = Board::builder().slot(spec("a", 0.0)).build().unwrap();
        let found = find_slot(
            &board,
            at(0.0),
            ThingKind::Stick,
            Seat(0),
            |_| false,
            &ResolverConfig::default(),
        );
        assert_eq!(found, None);
    }
}
