//! Board topology providers.
//!
//! A provider builds the slot graph once, deals things into it and re-skins
//! things when the tile set changes. `MahjongSetup` lays out a four-seat
//! mahjong table.

use crate::error::Result;
use crate::view::Scores;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use tabletop_core::{
    Board, BoardBuilder, Link, Place, Seat, SlotId, SlotSpec, ThingIndex, ThingKind, Vec3,
};
use tabletop_sync::TileSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealKind {
    /// Everything back to the wall and the stick trays.
    Initial,
    /// Tiles dealt into hands; sticks stay where they are.
    Hands,
}

pub trait TopologyProvider {
    /// Build the board with every thing in its starting slot.
    fn build(&mut self, tile_set: TileSet) -> Result<Board>;

    /// Rearrange things for a new round dealt by `seat`.
    fn deal(&mut self, board: &mut Board, seat: Seat, kind: DealKind);

    /// Re-skin things for another tile set.
    fn update_tiles(&mut self, board: &mut Board, tile_set: TileSet);

    fn scores(&self, board: &Board) -> Scores;
}

/// Distinct tile faces.
pub const FACES: usize = 34;
const COPIES: usize = 4;
const HAND_SIZE: usize = 14;
const WALL_COLUMNS: usize = 17;
const DISCARD_ROWS: usize = 3;
const DISCARD_WIDTH: usize = 6;
/// Value and count of each stick denomination held by every seat.
const STICKS: [(i64, usize); 4] = [(100, 10), (1000, 4), (5000, 2), (10000, 1)];
const STICK_SIZE: Vec3 = Vec3::new(20.0, 2.0, 1.0);
const MARKER_SIZE: Vec3 = Vec3::new(8.0, 8.0, 2.0);
const TABLE_WIDTH: f32 = 174.0;

/// Tile faces in setup order, wrapped into the back color of `tile_set`.
fn tile_type(face: usize, tile_set: TileSet) -> usize {
    face % FACES + FACES * tile_set.back as usize
}

/// Four-seat mahjong layout: hands with shift chains, discard rows with push
/// rules, riichi stick slots, a two-level wall and stick trays.
#[derive(Clone, Debug)]
pub struct MahjongSetup {
    tile_size: Vec3,
    seed: u64,
    deals: u64,
    hands: Vec<Vec<SlotId>>,
    wall: Vec<SlotId>,
    trays: Vec<Vec<SlotId>>,
    markers: Vec<SlotId>,
}

impl MahjongSetup {
    pub fn new(tile_size: Vec3, seed: u64) -> Self {
        Self {
            tile_size,
            seed,
            deals: 0,
            hands: Vec::new(),
            wall: Vec::new(),
            trays: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Map a point laid out for seat 0 (bottom edge) to `seat`'s side.
    fn transform(seat: Seat, local: Vec3) -> Vec3 {
        let half = TABLE_WIDTH / 2.0;
        let (x, y) = match seat.0 % Seat::COUNT {
            0 => (local.x, local.y),
            1 => (-local.y, local.x),
            2 => (-local.x, -local.y),
            _ => (local.y, -local.x),
        };
        Vec3::new(x + half, y + half, local.z)
    }

    /// A place for `seat`, given seat-0 coordinates, size and tilt.
    fn place(seat: Seat, local: Vec3, size: Vec3, tilt: f32) -> Place {
        let size = if seat.0 % 2 == 1 {
            Vec3::new(size.y, size.x, size.z)
        } else {
            size
        };
        let rotation = Vec3::new(tilt, 0.0, seat.0 as f32 * FRAC_PI_2);
        Place::new(Self::transform(seat, local), rotation, size)
    }

    fn add_hands(builder: &mut BoardBuilder, seat: Seat, t: Vec3) {
        let standing = Vec3::new(t.x, t.z, t.y);
        for i in 0..HAND_SIZE {
            let local = Vec3::new((i as f32 - 7.0) * t.x + t.x / 2.0, -80.0, 0.0);
            let origin = Self::transform(seat, local);
            let mut spec = SlotSpec::new(hand_name(seat, i), ThingKind::Tile, origin)
                .group(format!("hand.{}", seat.0))
                .side(seat)
                .place(Self::place(seat, local, standing, FRAC_PI_2))
                .place(Self::place(seat, local, t, 0.0))
                .place(Self::place(seat, local, t, PI))
                .can_flip_multiple(true)
                .shadow(0);
            if i > 0 {
                spec = spec.link(Link::ShiftLeft, hand_name(seat, i - 1));
            }
            if i + 1 < HAND_SIZE {
                spec = spec.link(Link::ShiftRight, hand_name(seat, i + 1));
            }
            builder.add_slot(spec);
        }
    }

    fn add_discards(builder: &mut BoardBuilder, seat: Seat, tile: Vec3) {
        let sideways = Vec3::new(tile.y, tile.x, tile.z);
        for row in 0..DISCARD_ROWS {
            for i in 0..DISCARD_WIDTH {
                let local = Vec3::new(
                    (i as f32 - 3.0) * tile.x + tile.x / 2.0,
                    -25.0 - row as f32 * tile.y,
                    0.0,
                );
                let mut sideways_place = Self::place(seat, local, sideways, 0.0);
                sideways_place.rotation.z += FRAC_PI_2;
                // A sideways tile widens the rest of its row.
                let push = Self::transform(seat, Vec3::new(tile.y - tile.x, 0.0, 0.0))
                    - Self::transform(seat, Vec3::ZERO);
                let origin = Self::transform(seat, local);
                builder.add_slot(
                    SlotSpec::new(discard_name(seat, row, i), ThingKind::Tile, origin)
                        .group(format!("discard.{}", seat.0))
                        .side(seat)
                        .place(Self::place(seat, local, tile, 0.0))
                        .place(sideways_place)
                        .shadow(0)
                        .push_deltas(vec![Vec3::ZERO, push]),
                );
                if i > 0 {
                    builder.add_push(discard_name(seat, row, i - 1), discard_name(seat, row, i));
                }
            }
        }
    }

    fn add_riichi(builder: &mut BoardBuilder, seat: Seat) {
        let local = Vec3::new(0.0, -16.0, 0.0);
        let origin = Self::transform(seat, local);
        builder.add_slot(
            SlotSpec::new(format!("riichi.{}", seat.0), ThingKind::Stick, origin)
                .group(format!("riichi.{}", seat.0))
                .side(seat)
                .place(Self::place(seat, local, STICK_SIZE, 0.0))
                .link(Link::Requires, hand_name(seat, 0))
                .shadow(0),
        );
    }

    fn add_wall(builder: &mut BoardBuilder, seat: Seat, tile: Vec3) {
        for col in 0..WALL_COLUMNS {
            for level in 0..2 {
                let local = Vec3::new(
                    (col as f32 - 8.5) * tile.x + tile.x / 2.0,
                    -60.0,
                    level as f32 * tile.z,
                );
                let origin = Self::transform(seat, local);
                let mut spec = SlotSpec::new(wall_name(seat, col, level), ThingKind::Tile, origin)
                    .group(format!("wall.{}", seat.0))
                    .side(seat)
                    .place(Self::place(seat, local, tile, PI))
                    .place(Self::place(seat, local, tile, 0.0))
                    .can_flip_multiple(true);
                spec = if level == 0 {
                    spec.link(Link::Up, wall_name(seat, col, 1))
                } else {
                    spec.link(Link::Down, wall_name(seat, col, 0))
                };
                builder.add_slot(spec);
            }
        }
    }

    fn add_tray(builder: &mut BoardBuilder, seat: Seat) {
        for (kind, &(_, count)) in STICKS.iter().enumerate() {
            for i in 0..count {
                let local = Vec3::new(60.0, -70.0 - kind as f32 * 3.0, i as f32 * STICK_SIZE.z);
                let origin = Self::transform(seat, local);
                builder.add_slot(
                    SlotSpec::new(tray_name(seat, kind, i), ThingKind::Stick, origin)
                        .group(format!("tray.{}", seat.0))
                        .side(seat)
                        .place(Self::place(seat, local, STICK_SIZE, 0.0)),
                );
            }
        }
    }

    fn add_marker(builder: &mut BoardBuilder, seat: Seat) {
        let local = Vec3::new(-60.0, -70.0, 0.0);
        builder.add_slot(
            SlotSpec::new(marker_name(seat), ThingKind::Marker, Self::transform(seat, local))
                .group("marker")
                .side(seat)
                .place(Self::place(seat, local, MARKER_SIZE, 0.0))
                .place(Self::place(seat, local, MARKER_SIZE, PI)),
        );
    }

    fn resolve_ids(&mut self, board: &Board) {
        let lookup = |name: String| board.slot_by_name(&name);
        self.hands = Seat::all()
            .map(|seat| (0..HAND_SIZE).filter_map(|i| lookup(hand_name(seat, i))).collect())
            .collect();
        self.wall = Seat::all().flat_map(wall_names).filter_map(lookup).collect();
        self.trays = Seat::all()
            .map(|seat| {
                STICKS
                    .iter()
                    .enumerate()
                    .flat_map(|(kind, &(_, count))| {
                        (0..count).map(move |i| tray_name(seat, kind, i))
                    })
                    .filter_map(lookup)
                    .collect()
            })
            .collect();
        self.markers = Seat::all().filter_map(|seat| lookup(marker_name(seat))).collect();
    }

    fn things_of(board: &Board, kind: ThingKind) -> Vec<ThingIndex> {
        board
            .things()
            .iter()
            .filter(|t| t.kind() == kind)
            .map(|t| t.index())
            .collect()
    }
}

impl Default for MahjongSetup {
    fn default() -> Self {
        Self::new(Vec3::new(6.0, 9.0, 4.0), 0)
    }
}

impl TopologyProvider for MahjongSetup {
    fn build(&mut self, tile_set: TileSet) -> Result<Board> {
        let mut builder = Board::builder();
        for seat in Seat::all() {
            Self::add_hands(&mut builder, seat, self.tile_size);
            Self::add_discards(&mut builder, seat, self.tile_size);
            Self::add_riichi(&mut builder, seat);
            Self::add_wall(&mut builder, seat, self.tile_size);
            Self::add_tray(&mut builder, seat);
            Self::add_marker(&mut builder, seat);
        }

        let mut wall = Seat::all().flat_map(wall_names);
        for i in 0..FACES * COPIES {
            if let Some(slot) = wall.next() {
                builder.add_thing(ThingKind::Tile, tile_type(i / COPIES, tile_set), slot, 0);
            }
        }
        for seat in Seat::all() {
            for (kind, &(_, count)) in STICKS.iter().enumerate() {
                for i in 0..count {
                    builder.add_thing(ThingKind::Stick, kind, tray_name(seat, kind, i), 0);
                }
            }
        }
        builder.add_thing(ThingKind::Marker, 0, marker_name(Seat(0)), 0);

        let board = builder.build()?;
        self.resolve_ids(&board);
        tracing::debug!(
            slots = board.slots().len(),
            things = board.things().len(),
            "built mahjong table"
        );
        Ok(board)
    }

    fn deal(&mut self, board: &mut Board, seat: Seat, kind: DealKind) {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.deals));
        self.deals += 1;

        let mut tiles = Self::things_of(board, ThingKind::Tile);
        tiles.shuffle(&mut rng);

        let mut targets: Vec<SlotId> = Vec::with_capacity(tiles.len());
        if kind == DealKind::Hands {
            // Everyone gets 13; the dealer also draws the 14th.
            for s in Seat::all() {
                let hand = self.hands.get(s.index()).map(Vec::as_slice).unwrap_or(&[]);
                let dealt = if s == seat { HAND_SIZE } else { HAND_SIZE - 1 };
                targets.extend(hand.iter().take(dealt));
            }
        }
        let hand_count = targets.len();
        targets.extend(self.wall.iter().take(tiles.len().saturating_sub(hand_count)));

        let mut placements: Vec<_> = tiles
            .iter()
            .zip(targets)
            .map(|(&thing, slot)| (thing, slot, 0))
            .collect();

        if kind == DealKind::Initial {
            let sticks = Self::things_of(board, ThingKind::Stick);
            let trays = self.trays.iter().flatten().copied();
            placements.extend(sticks.into_iter().zip(trays).map(|(thing, slot)| (thing, slot, 0)));
        }
        for marker in Self::things_of(board, ThingKind::Marker) {
            if let Some(&slot) = self.markers.get(seat.index()) {
                placements.push((marker, slot, 0));
            }
        }

        board.arrange(&placements);
        tracing::debug!(%seat, ?kind, moved = placements.len(), "dealt");
    }

    fn update_tiles(&mut self, board: &mut Board, tile_set: TileSet) {
        for thing in Self::things_of(board, ThingKind::Tile) {
            let face = board.thing(thing).type_index() % FACES;
            board.set_type_index(thing, tile_type(face, tile_set));
        }
    }

    fn scores(&self, board: &Board) -> Scores {
        let mut scores = [0; Seat::COUNT as usize];
        for thing in board.things().iter().filter(|t| t.kind() == ThingKind::Stick) {
            let slot = board.slot(thing.slot());
            if slot.group().starts_with("tray") {
                let value = STICKS.get(thing.type_index()).map_or(0, |&(v, _)| v);
                scores[slot.side().index()] += value;
            }
        }
        scores
    }
}

fn hand_name(seat: Seat, i: usize) -> String {
    format!("hand.{}.{}", seat.0, i)
}

fn discard_name(seat: Seat, row: usize, i: usize) -> String {
    format!("discard.{}.{}.{}", seat.0, row, i)
}

fn wall_name(seat: Seat, col: usize, level: usize) -> String {
    format!("wall.{}.{}.{}", seat.0, col, level)
}

/// Wall slot names of one seat, column by column, bottom level first.
fn wall_names(seat: Seat) -> impl Iterator<Item = String> {
    (0..WALL_COLUMNS).flat_map(move |col| (0..2).map(move |level| wall_name(seat, col, level)))
}

fn tray_name(seat: Seat, kind: usize, i: usize) -> String {
    format!("tray.{}.{}.{}", seat.0, kind, i)
}

fn marker_name(seat: Seat) -> String {
    format!("marker.{}", seat.0)
}
