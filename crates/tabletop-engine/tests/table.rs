//! Scenario tests for the table
//!
//! These tests drive one or two seats through hover, drag, drop, flip and
//! deal gestures against a shared in-memory hub.

use std::sync::Arc;

use parking_lot::Mutex;
use tabletop_core::{Board, Link, Movement, Place, Seat, SlotSpec, ThingIndex, ThingKind, Vec3};
use tabletop_engine::{
    run_flip, DealKind, EngineConfig, FlipStep, RecordingSounds, RecordingView, Result, Scores,
    SoundKind, Table, TopologyProvider,
};
use tabletop_sync::{create_table, MatchInfo, MemoryStore, ReplicatedStore, StoreEvent, TileSet};

const SIZE: Vec3 = Vec3::new(6.0, 9.0, 4.0);

/// A small board: a shiftable hand row, a two-slot discard row, a two-level
/// pile, a spare slot and a riichi stick slot.
#[derive(Default)]
struct RowSetup {
    deals: usize,
}

fn tile_slot(name: &str, group: &str, at: Vec3) -> SlotSpec {
    SlotSpec::new(name, ThingKind::Tile, at)
        .group(group)
        .place(Place::new(at, Vec3::ZERO, SIZE))
        .place(Place::new(at, Vec3::new(3.0, 0.0, 0.0), SIZE))
}

const INITIAL: [&str; 4] = ["hand.0", "hand.1", "pile.lo", "pile.hi"];

impl TopologyProvider for RowSetup {
    fn build(&mut self, _tile_set: TileSet) -> Result<Board> {
        let mut builder = Board::builder();
        for i in 0..4 {
            let at = Vec3::new(i as f32 * 6.0, 0.0, 0.0);
            let mut spec = tile_slot(&format!("hand.{}", i), "hand", at).can_flip_multiple(true);
            if i > 0 {
                spec = spec.link(Link::ShiftLeft, format!("hand.{}", i - 1));
            }
            if i < 3 {
                spec = spec.link(Link::ShiftRight, format!("hand.{}", i + 1));
            }
            builder.add_slot(spec);
        }
        for (i, x) in [0.0, 6.0].into_iter().enumerate() {
            let at = Vec3::new(x, 30.0, 0.0);
            builder.add_slot(tile_slot(&format!("discard.{}", i), "discard.1", at).side(Seat(1)));
        }
        builder.add_push("discard.0", "discard.1");
        let (lo, hi) = (Vec3::new(60.0, 0.0, 0.0), Vec3::new(60.0, 0.0, 4.0));
        builder.add_slot(tile_slot("pile.lo", "pile", lo).link(Link::Up, "pile.hi"));
        builder.add_slot(tile_slot("pile.hi", "pile", hi).link(Link::Down, "pile.lo"));
        builder.add_slot(tile_slot("spare", "spare", Vec3::new(100.0, 100.0, 0.0)));
        let stick = Vec3::new(20.0, 2.0, 1.0);
        builder.add_slot(
            SlotSpec::new("riichi", ThingKind::Stick, Vec3::new(0.0, 60.0, 0.0))
                .group("riichi")
                .side(Seat(2))
                .place(Place::new(Vec3::new(0.0, 60.0, 0.0), Vec3::ZERO, stick))
                .link(Link::Requires, "hand.0"),
        );
        builder.add_slot(
            SlotSpec::new("tray", ThingKind::Stick, Vec3::new(0.0, 80.0, 0.0))
                .group("tray")
                .place(Place::new(Vec3::new(0.0, 80.0, 0.0), Vec3::ZERO, stick)),
        );

        for (i, slot) in INITIAL.iter().enumerate() {
            builder.add_thing(ThingKind::Tile, i, *slot, 0);
        }
        builder.add_thing(ThingKind::Stick, 0, "tray", 0);
        Ok(builder.build()?)
    }

    fn deal(&mut self, board: &mut Board, _seat: Seat, _kind: DealKind) {
        self.deals += 1;
        let placements: Vec<_> = INITIAL
            .iter()
            .enumerate()
            .filter_map(|(i, name)| board.slot_by_name(name).map(|slot| (ThingIndex(i), slot, 0)))
            .collect();
        board.arrange(&placements);
    }

    fn update_tiles(&mut self, _board: &mut Board, _tile_set: TileSet) {}

    fn scores(&self, _board: &Board) -> Scores {
        [0; 4]
    }
}

type TestTable = Table<MemoryStore, RecordingView, RecordingSounds, RowSetup>;

fn tables(count: usize) -> Vec<TestTable> {
    let (_hub, stores) = create_table(count);
    let mut tables: Vec<TestTable> = stores
        .into_iter()
        .map(|store| {
            Table::new(
                EngineConfig::default(),
                RowSetup::default(),
                store,
                RecordingView::default(),
                RecordingSounds::default(),
            )
            .unwrap()
        })
        .collect();
    for table in tables.iter_mut() {
        table.pump().unwrap();
    }
    tables
}

fn slot_name(table: &TestTable, thing: usize) -> String {
    table.board().slot_of(ThingIndex(thing)).name().to_string()
}

/// Pick up `thing` at `from` and move the pointer to `to`.
fn drag(table: &mut TestTable, thing: usize, from: Vec3, to: Vec3) {
    table.on_move(Some(from)).unwrap();
    table.on_hover(Some(ThingIndex(thing)));
    assert!(table.on_drag_start().unwrap());
    table.on_move(Some(to)).unwrap();
}

fn things_events(store: &MemoryStore) -> Vec<usize> {
    store
        .poll()
        .into_iter()
        .filter_map(|event| match event {
            StoreEvent::Things(entries) => Some(entries.len()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_drag_commit_sends_one_entry() {
    let mut tables = tables(2);
    drag(&mut tables[0], 0, Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
    assert!(tables[0].can_drop());
    tables[1].pump().unwrap();

    tables[0].on_drag_end().unwrap();

    assert_eq!(slot_name(&tables[0], 0), "discard.0");
    assert_eq!(tables[0].board().thing(ThingIndex(0)).claimed_by(), None);
    assert!(!tables[0].is_holding());
    assert_eq!(things_events(tables[1].store()), vec![1]);
    assert_eq!(tables[0].sounds().played, vec![(SoundKind::Discard, Seat(1))]);
}

#[test]
fn test_stick_lands_in_riichi_with_sound() {
    let mut tables = tables(2);
    drag(&mut tables[0], 4, Vec3::new(0.0, 80.0, 0.0), Vec3::new(0.0, 60.0, 0.0));
    assert!(tables[0].can_drop());

    tables[0].on_drag_end().unwrap();
    tables[1].pump().unwrap();

    for table in &tables {
        assert_eq!(slot_name(table, 4), "riichi");
        assert!(table.board().check_invariants().is_ok());
    }
    assert_eq!(tables[0].sounds().played, vec![(SoundKind::Stick, Seat(0))]);
}

#[test]
fn test_riichi_needs_a_tile_in_hand() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    drag(table, 0, Vec3::ZERO, Vec3::new(100.0, 100.0, 0.0));
    table.on_drag_end().unwrap();
    assert_eq!(slot_name(table, 0), "spare");

    drag(table, 4, Vec3::new(0.0, 80.0, 0.0), Vec3::new(0.0, 60.0, 0.0));
    assert!(!table.can_drop());
    table.on_drag_end().unwrap();

    assert_eq!(slot_name(table, 4), "tray");
    assert!(table.sounds().played.is_empty());
}

#[test]
fn test_tile_never_lands_in_riichi() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    let riichi = table.board().slot_by_name("riichi").unwrap();
    drag(table, 1, Vec3::new(6.0, 0.0, 0.0), Vec3::new(0.0, 60.0, 0.0));
    assert!(!table.can_drop());
    table.on_drag_end().unwrap();

    assert_eq!(slot_name(table, 1), "hand.1");
    assert!(table.board().slot(riichi).is_empty());
    assert!(table.sounds().played.is_empty());
}

#[test]
fn test_drop_without_moving_releases_in_place() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.on_select(&[ThingIndex(1)]);
    table.on_move(Some(Vec3::new(6.0, 0.0, 0.0))).unwrap();
    table.on_hover(Some(ThingIndex(1)));
    assert!(table.on_drag_start().unwrap());
    assert!(table.is_holding());

    table.on_drag_end().unwrap();

    assert_eq!(slot_name(table, 1), "hand.1");
    assert_eq!(table.board().thing(ThingIndex(1)).claimed_by(), None);
    assert!(table.selected().is_empty());
    assert!(table.sounds().played.is_empty());
}

#[test]
fn test_two_things_cannot_share_a_target() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.on_select(&[ThingIndex(0), ThingIndex(1)]);
    assert_eq!(table.selected().len(), 2);

    drag(table, 0, Vec3::ZERO, Vec3::new(100.0, 100.0, 0.0));

    assert!(table.movement().is_none());
    assert!(!table.can_drop());
    table.on_drag_end().unwrap();
    assert_eq!(slot_name(table, 0), "hand.0");
    assert_eq!(slot_name(table, 1), "hand.1");
    assert!(table.board().check_invariants().is_ok());
}

#[test]
fn test_both_things_land_side_by_side() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.on_select(&[ThingIndex(0), ThingIndex(1)]);
    drag(table, 0, Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
    table.on_drag_end().unwrap();

    assert_eq!(slot_name(table, 0), "discard.0");
    assert_eq!(slot_name(table, 1), "discard.1");
    assert!(table.board().check_invariants().is_ok());
}

#[test]
fn test_drop_onto_hand_shifts_occupants() {
    let mut tables = tables(2);
    drag(&mut tables[0], 3, Vec3::new(60.0, 0.0, 0.0), Vec3::ZERO);
    assert!(tables[0].board().thing(ThingIndex(0)).is_routed());

    tables[0].on_drag_end().unwrap();
    tables[1].pump().unwrap();

    for table in &tables {
        assert_eq!(slot_name(table, 3), "hand.0");
        assert_eq!(slot_name(table, 0), "hand.1");
        assert_eq!(slot_name(table, 1), "hand.2");
        assert!(table.board().things().iter().all(|t| t.claimed_by().is_none()));
        assert!(table.board().check_invariants().is_ok());
    }
}

#[test]
fn test_stacked_thing_cannot_be_hovered() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.on_hover(Some(ThingIndex(2)));
    assert_eq!(table.hovered(), None);
    table.on_hover(Some(ThingIndex(3)));
    assert_eq!(table.hovered(), Some(ThingIndex(3)));
    table.on_hover(Some(ThingIndex(99)));
    assert_eq!(table.hovered(), None);
}

#[test]
fn test_remote_claim_blocks_pickup() {
    let mut tables = tables(2);
    drag(&mut tables[0], 0, Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
    tables[1].pump().unwrap();

    let other = &mut tables[1];
    other.on_move(Some(Vec3::ZERO)).unwrap();
    other.on_hover(Some(ThingIndex(0)));
    assert!(other.on_drag_start().unwrap());
    assert!(!other.is_holding());
    assert_eq!(other.board().thing(ThingIndex(0)).claimed_by(), Some(Seat(0)));
}

#[test]
fn test_claim_taken_mid_drag_leaves_thing_behind() {
    let mut tables = tables(2);
    tables[0].on_select(&[ThingIndex(0), ThingIndex(1)]);
    drag(&mut tables[0], 0, Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
    assert_eq!(tables[0].movement().unwrap().things().len(), 2);

    // Seat 1 grabs thing 1 before hearing of seat 0's claim.
    let other = &mut tables[1];
    other.on_move(Some(Vec3::new(6.0, 0.0, 0.0))).unwrap();
    other.on_hover(Some(ThingIndex(1)));
    assert!(other.on_drag_start().unwrap());
    assert!(other.is_holding());

    tables[0].pump().unwrap();
    let owner = tables[0].board().thing(ThingIndex(1)).claimed_by();
    assert_eq!(owner, Some(Seat(1)));
    assert_eq!(tables[0].movement().unwrap().things(), vec![ThingIndex(0)]);
    assert!(tables[0].can_drop());
    tables[0].on_drag_end().unwrap();

    tables[1].pump().unwrap();
    assert_eq!(tables[1].board().thing(ThingIndex(1)).claimed_by(), Some(Seat(1)));
    tables[1].on_drag_end().unwrap();
    tables[0].pump().unwrap();

    for table in &tables {
        assert_eq!(slot_name(table, 0), "discard.0");
        assert_eq!(slot_name(table, 1), "hand.1");
        assert!(table.board().things().iter().all(|t| t.claimed_by().is_none()));
        assert!(table.board().check_invariants().is_ok());
    }
}

#[test]
fn test_gesture_abandoned_when_every_claim_is_lost() {
    let mut tables = tables(2);
    drag(&mut tables[0], 1, Vec3::new(6.0, 0.0, 0.0), Vec3::new(0.0, 30.0, 0.0));

    let other = &mut tables[1];
    other.on_move(Some(Vec3::new(6.0, 0.0, 0.0))).unwrap();
    other.on_hover(Some(ThingIndex(1)));
    assert!(other.on_drag_start().unwrap());

    tables[0].pump().unwrap();
    assert!(!tables[0].is_holding());
    assert!(tables[0].movement().is_none());
    assert!(!tables[0].can_drop());
    tables[0].on_drag_end().unwrap();
    assert_eq!(slot_name(&tables[0], 1), "hand.1");
}

#[test]
fn test_remote_update_drops_selection() {
    let mut tables = tables(2);
    tables[1].on_select(&[ThingIndex(0), ThingIndex(1)]);
    drag(&mut tables[0], 0, Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
    tables[0].on_drag_end().unwrap();

    tables[1].pump().unwrap();
    assert_eq!(tables[1].selected(), &[ThingIndex(1)]);
}

#[test]
fn test_flip_selection_at_once() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.on_select(&[ThingIndex(0), ThingIndex(1)]);
    assert!(table.on_flip(1, false).unwrap().is_none());

    assert_eq!(table.board().thing(ThingIndex(0)).rotation_index(), 1);
    assert_eq!(table.board().thing(ThingIndex(1)).rotation_index(), 1);
    assert!(table.selected().is_empty());

    table.on_hover(Some(ThingIndex(0)));
    table.on_flip(-1, false).unwrap();
    assert_eq!(table.board().thing(ThingIndex(0)).rotation_index(), 0);
}

#[test]
fn test_flip_sequence_cancelled_when_deselected() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.on_select(&[ThingIndex(1), ThingIndex(0)]);
    let mut sequence = table.on_flip(1, true).unwrap().unwrap();
    assert_eq!(sequence.things(), &[ThingIndex(0), ThingIndex(1)]);

    assert!(matches!(sequence.step(table).unwrap(), FlipStep::Continue(_)));
    table.on_select(&[]);
    assert_eq!(sequence.step(table).unwrap(), FlipStep::Cancelled);

    assert_eq!(table.board().thing(ThingIndex(0)).rotation_index(), 1);
    assert_eq!(table.board().thing(ThingIndex(1)).rotation_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_flip_flips_every_thing() {
    let mut tables = tables(1);
    let mut table = tables.remove(0);
    table.on_select(&[ThingIndex(0), ThingIndex(1)]);
    let sequence = table.on_flip(1, true).unwrap().unwrap();

    let table = Arc::new(Mutex::new(table));
    let outcome = run_flip(table.clone(), sequence).await.unwrap();

    assert_eq!(outcome, FlipStep::Done);
    let table = table.lock();
    assert_eq!(table.board().thing(ThingIndex(0)).rotation_index(), 1);
    assert_eq!(table.board().thing(ThingIndex(1)).rotation_index(), 1);
    assert!(table.selected().is_empty());
}

#[test]
fn test_deal_toggles_back_and_counts_honba() {
    let mut tables = tables(2);
    let back = tables[0].tile_set().back;

    tables[0].deal(DealKind::Hands).unwrap();
    let info = tables[0].store().match_info().unwrap();
    assert_eq!(info.dealer, Seat(0));
    assert_eq!(info.honba, 0);
    assert_eq!(info.tile_set.back, 1 - back);
    assert_eq!(tables[0].tile_set(), info.tile_set);

    for expected in [1, 2, 3, 4, 5, 6, 7, 0] {
        tables[0].deal(DealKind::Hands).unwrap();
        assert_eq!(tables[0].store().match_info().unwrap().honba, expected);
    }
    tables[0].deal(DealKind::Hands).unwrap();
    tables[0].deal(DealKind::Initial).unwrap();
    assert_eq!(tables[0].store().match_info().unwrap().honba, 1);

    tables[1].pump().unwrap();
    assert_eq!(tables[1].tile_set(), tables[0].tile_set());
    tables[1].deal(DealKind::Hands).unwrap();
    let info = tables[1].store().match_info().unwrap();
    assert_eq!(info.dealer, Seat(1));
    assert_eq!(info.honba, 0);
    assert_ne!(info.tile_set, tables[0].tile_set());
}

#[test]
fn test_deal_sends_things_and_match_together() {
    let mut tables = tables(2);
    tables[1].store().poll();
    tables[0].deal(DealKind::Initial).unwrap();

    let events = tables[1].store().poll();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], StoreEvent::Things(entries) if entries.len() == 5));
    assert!(matches!(events[1], StoreEvent::Match(_)));
}

#[test]
fn test_toggle_dealer_and_honba() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    table.toggle_dealer().unwrap();
    assert_eq!(table.store().match_info().unwrap().dealer, Seat(0));
    table.toggle_dealer().unwrap();
    assert_eq!(table.store().match_info().unwrap().dealer, Seat(1));
    table.toggle_honba().unwrap();
    assert_eq!(table.store().match_info().unwrap().honba, 1);
}

#[test]
fn test_honba_at_limit_does_not_overflow() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    let maxed = MatchInfo {
        dealer: Seat(0),
        honba: u8::MAX,
        ..MatchInfo::default()
    };

    table.store().set_match(maxed).unwrap();
    table.toggle_honba().unwrap();
    assert_eq!(table.store().match_info().unwrap().honba, u8::MAX % 8);

    table.store().set_match(maxed).unwrap();
    table.deal(DealKind::Hands).unwrap();
    assert_eq!(table.store().match_info().unwrap().honba, u8::MAX % 8);
}

#[test]
fn test_view_marks_held_and_drop_shadows() {
    let mut tables = tables(1);
    let table = &mut tables[0];
    drag(table, 0, Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
    table.update_view_at(0);

    let render = &table.view().renders[0];
    assert!(render.held);
    assert!(!render.temporary);
    assert_eq!(render.place.position, Vec3::new(0.0, 30.0, 0.0));
    assert_eq!(table.view().drop_shadows.len(), 1);
    assert!(table.to_select().is_empty());

    let pile_bottom = &table.view().renders[2];
    assert!(!pile_bottom.bottom);
}

#[test]
fn test_spectator_cannot_drag() {
    let mut tables = tables(5);
    let spectator = &mut tables[4];
    assert_eq!(spectator.seat(), None);
    spectator.on_hover(Some(ThingIndex(0)));
    assert!(!spectator.on_drag_start().unwrap());
    assert!(spectator.to_select().is_empty());
}
