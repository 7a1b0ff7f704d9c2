//! The table - one seat's view of a shared board.
//!
//! All input (hover, select, pointer moves, drags, flips, deals) and all
//! remote events are handled here, one at a time. Gameplay paths never fail:
//! a gesture that cannot complete is silently abandoned. Errors only come
//! from talking to the store.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::flip::{natural_cmp, FlipSequence};
use crate::setup::{DealKind, TopologyProvider};
use crate::view::{Appearance, Render, SoundKind, SoundPlayer, TableView};
use tabletop_core::{
    can_select, compare_zyx, filter_selection, find_slot, most_common, Board, ChainShift, Link,
    Movement, Place, Rect, ResolverConfig, Seat, ThingIndex, Vec3,
};
use tabletop_sync::{
    now_millis, Batch, CursorTracker, IngestReport, MatchInfo, ReplicatedStore, StoreEvent,
    SyncBridge, SyncStats, ThingInfo, TileSet,
};

/// A seat's table: board, local interaction state and the store it syncs with.
pub struct Table<S, V, A, T, M = ChainShift> {
    config: EngineConfig,
    resolver: ResolverConfig,
    setup: T,
    board: Board,
    store: S,
    view: V,
    sounds: A,
    bridge: SyncBridge,
    cursors: CursorTracker,
    seat: Option<Seat>,
    tile_set: TileSet,
    hovered: Option<ThingIndex>,
    selected: Vec<ThingIndex>,
    mouse: Option<Vec3>,
    held_mouse: Option<Vec3>,
    movement: Option<M>,
}

impl<S, V, A, T> Table<S, V, A, T, ChainShift>
where
    S: ReplicatedStore,
    V: TableView,
    A: SoundPlayer,
    T: TopologyProvider,
{
    /// Create a table using the default chain-shift planner.
    pub fn new(config: EngineConfig, setup: T, store: S, view: V, sounds: A) -> Result<Self> {
        Self::with_movement(config, setup, store, view, sounds)
    }
}

impl<S, V, A, T, M> Table<S, V, A, T, M>
where
    S: ReplicatedStore,
    V: TableView,
    A: SoundPlayer,
    T: TopologyProvider,
    M: Movement,
{
    /// Create a table with a custom movement planner.
    ///
    /// Pending store events are applied first, so a late joiner adopts the
    /// shared state instead of overwriting it with a fresh layout.
    pub fn with_movement(
        config: EngineConfig,
        mut setup: T,
        store: S,
        view: V,
        sounds: A,
    ) -> Result<Self> {
        let tile_set = TileSet::initial();
        let board = setup.build(tile_set)?;
        let mut table = Self {
            resolver: config.resolver(),
            cursors: CursorTracker::new(config.cursor_interval_ms),
            config,
            setup,
            board,
            seat: store.seat(),
            store,
            view,
            sounds,
            bridge: SyncBridge::new(),
            tile_set,
            hovered: None,
            selected: Vec::new(),
            mouse: None,
            held_mouse: None,
            movement: None,
        };
        table.setup_view();
        table.pump()?;
        table.send_update(false)?;
        Ok(table)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn seat(&self) -> Option<Seat> {
        self.seat
    }

    pub fn hovered(&self) -> Option<ThingIndex> {
        self.hovered
    }

    pub fn selected(&self) -> &[ThingIndex] {
        &self.selected
    }

    pub fn movement(&self) -> Option<&M> {
        self.movement.as_ref()
    }

    pub fn tile_set(&self) -> TileSet {
        self.tile_set
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn sounds(&self) -> &A {
        &self.sounds
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sync_stats(&self) -> &SyncStats {
        self.bridge.stats()
    }

    /// Whether this seat holds anything.
    pub fn is_holding(&self) -> bool {
        self.seat.is_some_and(|seat| self.board.is_holding(seat))
    }

    // ------------------------------------------------------------------
    // Remote events
    // ------------------------------------------------------------------

    /// Apply every event the store delivered since the last pump, in order.
    pub fn pump(&mut self) -> Result<usize> {
        let events = self.store.poll();
        let count = events.len();
        for event in events {
            match event {
                StoreEvent::Seat(seat) => self.on_seat(seat),
                StoreEvent::Things(entries) => {
                    self.on_things(&entries)?;
                }
                StoreEvent::Match(info) => self.on_match(info),
                StoreEvent::Mouse(seat, info) => self.cursors.update(seat, info),
            }
        }
        Ok(count)
    }

    pub fn on_seat(&mut self, seat: Option<Seat>) {
        tracing::debug!(?seat, "seat assigned");
        self.seat = seat;
    }

    /// Ingest remote thing records.
    ///
    /// A drag in progress is planned again against the new state. If every
    /// held thing was claimed elsewhere the gesture is abandoned.
    pub fn on_things(
        &mut self,
        entries: &[(ThingIndex, Option<ThingInfo>)],
    ) -> Result<IngestReport> {
        for (index, info) in entries {
            if info.is_some() {
                self.selected.retain(|t| t != index);
            }
        }
        let report = self.bridge.ingest(&mut self.board, entries);
        self.board.check_pushes();
        if self.held_mouse.is_some() {
            self.drag();
            if !self.is_holding() {
                tracing::debug!(seat = ?self.seat, "held things taken, drag abandoned");
                self.movement = None;
                self.held_mouse = None;
            }
        }
        self.send_update(false)?;
        Ok(report)
    }

    pub fn on_match(&mut self, info: MatchInfo) {
        if info.tile_set != self.tile_set {
            self.update_tile_set(info.tile_set);
        }
    }

    pub fn update_tile_set(&mut self, tile_set: TileSet) {
        self.tile_set = tile_set;
        self.setup.update_tiles(&mut self.board, tile_set);
        let appearances = self.appearances();
        self.view.replace_things(&appearances);
    }

    // ------------------------------------------------------------------
    // Local input
    // ------------------------------------------------------------------

    pub fn on_hover(&mut self, thing: Option<ThingIndex>) {
        if self.is_holding() {
            return;
        }
        self.hovered = thing
            .filter(|&t| self.board.get_thing(t).is_some() && can_select(&self.board, t, &[]));
    }

    pub fn on_select(&mut self, things: &[ThingIndex]) {
        let requested: Vec<_> = things
            .iter()
            .copied()
            .filter(|&t| self.board.get_thing(t).is_some())
            .collect();
        self.selected = filter_selection(&self.board, &requested);
    }

    /// Track the pointer. Recomputes the drag while holding.
    pub fn on_move(&mut self, mouse: Option<Vec3>) -> Result<()> {
        if self.mouse == mouse {
            return Ok(());
        }
        self.mouse = mouse;
        self.send_mouse()?;
        self.drag();
        self.send_update(false)?;
        Ok(())
    }

    /// Pick up the hovered thing, or the whole selection if it contains the
    /// hovered thing. Returns whether a drag started.
    pub fn on_drag_start(&mut self) -> Result<bool> {
        let (Some(seat), Some(hovered)) = (self.seat, self.hovered) else {
            return Ok(false);
        };
        if self.is_holding() {
            return Ok(false);
        }

        let to_hold = if self.selected.contains(&hovered) {
            self.selected.clone()
        } else {
            self.selected.clear();
            vec![hovered]
        };
        for thing in to_hold {
            // Things claimed elsewhere are left out of the gesture.
            self.board.hold(thing, seat);
        }
        self.hovered = None;
        self.held_mouse = self.mouse;

        self.drag();
        self.send_mouse()?;
        self.send_update(false)?;
        Ok(true)
    }

    pub fn on_drag_end(&mut self) -> Result<()> {
        if !self.is_holding() {
            return Ok(());
        }
        let unmoved =
            self.held_mouse.is_some() && self.mouse.is_some() && self.held_mouse == self.mouse;
        if unmoved {
            self.selected.clear();
            self.drop_in_place()
        } else if self.can_drop() {
            self.drop()
        } else {
            self.drop_in_place()
        }
    }

    /// Flip the selection (or the hovered thing) by `direction` rotations.
    ///
    /// An animated flip of several things returns the sequence to run.
    pub fn on_flip(&mut self, direction: isize, animated: bool) -> Result<Option<FlipSequence>> {
        if self.is_holding() {
            return Ok(None);
        }

        if !self.selected.is_empty() {
            let board = &self.board;
            let rotation =
                most_common(&self.selected, |&t| board.thing(t).rotation_index()).unwrap_or(0);
            let target = rotation as isize + direction;
            let single = self.selected.len() == 1;
            let mut to_flip: Vec<_> = self
                .selected
                .iter()
                .copied()
                .filter(|&t| single || board.slot_of(t).can_flip_multiple())
                .collect();

            if to_flip.len() > 1 && animated {
                to_flip.sort_by(|&a, &b| {
                    natural_cmp(board.slot_of(a).name(), board.slot_of(b).name())
                });
                let delay = self.config.flip_delay();
                return Ok(Some(FlipSequence::new(to_flip, target, delay)));
            }
            for thing in to_flip {
                self.flip_thing(thing, target);
            }
            self.selected.clear();
        } else if let Some(hovered) = self.hovered {
            let target = self.board.thing(hovered).rotation_index() as isize + direction;
            self.flip_thing(hovered, target);
        }
        self.send_update(false)?;
        Ok(None)
    }

    /// Flip one thing to `rotation`, wrapped to what its slot offers.
    pub(crate) fn flip_thing(&mut self, thing: ThingIndex, rotation: isize) {
        let count = self.board.slot_of(thing).rotation_count() as isize;
        self.board.flip(thing, rotation.rem_euclid(count) as usize);
        self.board.check_pushes();
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Rebuild the provisional movement for the current pointer position.
    fn drag(&mut self) {
        let (Some(seat), Some(mouse), Some(held_mouse)) = (self.seat, self.mouse, self.held_mouse)
        else {
            return;
        };
        self.movement = None;

        // Things displaced by the previous frame's shift go back to rest.
        self.board.release_routed(seat);
        let mut held = self.board.held_by(seat);
        held.sort_by(|&a, &b| {
            compare_zyx(&self.board.slot_of(a).origin(), &self.board.slot_of(b).origin())
        });
        let Some(&first) = held.first() else {
            return;
        };

        let mut movement = M::default();
        for &thing in &held {
            let place = self.board.place_of(thing);
            let dragged = Rect::new(
                place.position.x + mouse.x - held_mouse.x,
                place.position.y + mouse.y - held_mouse.y,
                place.size.x,
                place.size.y,
            );
            let kind = self.board.thing(thing).kind();
            let target = find_slot(
                &self.board,
                dragged,
                kind,
                seat,
                |slot| movement.has_slot(slot),
                &self.resolver,
            );
            match target {
                Some(slot) => movement.move_thing(thing, slot),
                None => {
                    tracing::trace!(%thing, "no drop target");
                    return;
                }
            }
        }

        let kind = self.board.thing(first).kind();
        let candidates: Vec<_> = self
            .board
            .things()
            .iter()
            .filter(|t| t.kind() == kind)
            .map(|t| t.index())
            .collect();
        if !movement.find_shift(&self.board, &candidates, &[Link::ShiftLeft, Link::ShiftRight]) {
            tracing::trace!("shift chain blocked");
            return;
        }
        movement.rotate_held(&mut self.board);
        movement.apply_shift(&mut self.board, seat);
        self.movement = Some(movement);
    }

    /// Whether the current movement can be committed. Every thing it moves
    /// must still be claimed by this seat.
    pub fn can_drop(&self) -> bool {
        let (Some(seat), Some(movement)) = (self.seat, self.movement.as_ref()) else {
            return false;
        };
        movement.valid(&self.board, seat)
    }

    fn drop(&mut self) -> Result<()> {
        let Some(movement) = self.movement.take() else {
            return Ok(());
        };

        let mut discard_side = None;
        let mut riichi = false;
        for thing in movement.things() {
            let Some(target) = movement.get(thing) else {
                continue;
            };
            let slot = self.board.slot(target);
            if slot.group().starts_with("discard") {
                discard_side = Some(slot.side());
            } else if slot.group().starts_with("riichi") {
                riichi = true;
            }
        }

        movement.apply(&mut self.board);
        self.board.check_pushes();
        tracing::debug!(seat = ?self.seat, things = movement.things().len(), "movement committed");
        self.finish_drop()?;

        if let Some(side) = discard_side {
            self.sounds.play(SoundKind::Discard, side);
        }
        // The stick sound always plays from the first seat's side.
        if riichi {
            self.sounds.play(SoundKind::Stick, Seat(0));
        }
        Ok(())
    }

    fn drop_in_place(&mut self) -> Result<()> {
        self.finish_drop()
    }

    fn finish_drop(&mut self) -> Result<()> {
        if let Some(seat) = self.seat {
            self.board.release_seat(seat);
        }
        self.selected.clear();
        self.held_mouse = None;
        self.movement = None;

        self.send_update(false)?;
        self.send_mouse()
    }

    // ------------------------------------------------------------------
    // Match
    // ------------------------------------------------------------------

    /// Deal a new round as this seat.
    ///
    /// The full resync and the new match record go out in one batch.
    pub fn deal(&mut self, kind: DealKind) -> Result<()> {
        let Some(seat) = self.seat else {
            return Ok(());
        };

        self.board.release_all();
        self.movement = None;
        self.held_mouse = None;
        self.setup.deal(&mut self.board, seat, kind);
        self.board.check_pushes();

        let tile_set = self.tile_set.toggled();
        let honba = match self.store.match_info() {
            Some(current) if current.dealer == seat => match kind {
                DealKind::Hands => {
                    current.honba.saturating_add(1) % self.config.honba_modulus.max(1)
                }
                DealKind::Initial => current.honba,
            },
            _ => 0,
        };
        self.update_tile_set(tile_set);
        let info = MatchInfo {
            dealer: seat,
            honba,
            tile_set,
        };

        let entries = self.bridge.collect(&mut self.board, &self.store, true);
        self.bridge.record_sent(entries.len(), true);
        tracing::debug!(%seat, ?kind, honba, entries = entries.len(), "deal committed");
        self.store.commit(Batch::things(entries).with_match(info))?;
        Ok(())
    }

    pub fn toggle_dealer(&mut self) -> Result<()> {
        let mut info = self.store.match_info().unwrap_or(MatchInfo {
            dealer: Seat(Seat::COUNT - 1),
            ..MatchInfo::default()
        });
        info.dealer = info.dealer.next();
        self.store.set_match(info)?;
        Ok(())
    }

    pub fn toggle_honba(&mut self) -> Result<()> {
        let mut info = self.store.match_info().unwrap_or_default();
        info.honba = info.honba.saturating_add(1) % self.config.honba_modulus.max(1);
        self.store.set_match(info)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Transmit changed things. Returns how many entries were sent.
    pub fn send_update(&mut self, full: bool) -> Result<usize> {
        Ok(self.bridge.send_update(&mut self.board, &self.store, full)?)
    }

    fn send_mouse(&mut self) -> Result<()> {
        if self.seat.is_some() {
            let sample = CursorTracker::sample(self.mouse, self.held_mouse, now_millis());
            self.store.send_mouse(sample)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    fn appearances(&self) -> Vec<Appearance> {
        self.board
            .things()
            .iter()
            .map(|t| Appearance {
                kind: t.kind(),
                type_index: t.type_index(),
            })
            .collect()
    }

    /// Hand the renderer the things and the slot shadows.
    pub fn setup_view(&mut self) {
        let appearances = self.appearances();
        self.view.replace_things(&appearances);
        let shadows: Vec<Place> = self
            .board
            .slots()
            .iter()
            .filter(|s| s.draw_shadow())
            .map(|s| s.shadow_place())
            .collect();
        self.view.add_shadows(&shadows);
    }

    /// Push the current frame to the renderer.
    pub fn update_view(&mut self) {
        self.update_view_at(now_millis());
    }

    /// Like `update_view`, drawing remote pointers as of `now`.
    pub fn update_view_at(&mut self, now: u64) {
        let renders = self.renders(now);
        self.view.update_things(renders);

        let drop_shadows = match &self.movement {
            Some(movement) if self.can_drop() => movement
                .slots()
                .into_iter()
                .map(|slot| self.board.slot(slot).place_with_offset(0))
                .collect(),
            _ => Vec::new(),
        };
        self.view.update_drop_shadows(drop_shadows);
        self.view.update_scores(self.setup.scores(&self.board));
    }

    fn renders(&self, now: u64) -> Vec<Render> {
        let can_drop = self.can_drop();
        let hovered_in_selection = self.hovered.is_some_and(|h| self.selected.contains(&h));

        self.board
            .things()
            .iter()
            .map(|thing| {
                let index = thing.index();
                let mut place = self.board.place_of(index);

                if let Some(claimer) = thing.claimed_by() {
                    match thing.shift_slot() {
                        Some(shift) => {
                            place = self.board.slot(shift).base_place(thing.rotation_index());
                        }
                        None => {
                            let (mouse, held) = if Some(claimer) == self.seat {
                                (self.mouse, self.held_mouse)
                            } else {
                                (self.cursors.mouse(claimer, now), self.cursors.held(claimer))
                            };
                            if let (Some(mouse), Some(held)) = (mouse, held) {
                                place.rotation = thing.held_rotation();
                                place.position.x += mouse.x - held.x;
                                place.position.y += mouse.y - held.y;
                            }
                        }
                    }
                }

                let held = thing.claimed_by().is_some() && thing.shift_slot().is_none();
                let selected = self.selected.contains(&index);
                let bottom = !held
                    && self.board.slot(thing.slot()).link(Link::Up).is_some_and(|up| {
                        match self.board.slot(up).thing() {
                            None => true,
                            Some(above) => self.board.thing(above).claimed_by().is_some(),
                        }
                    });

                Render {
                    place,
                    thing: index,
                    selected,
                    hovered: self.hovered == Some(index) || (selected && hovered_in_selection),
                    held,
                    temporary: held && thing.claimed_by() == self.seat && !can_drop,
                    bottom,
                }
            })
            .collect()
    }

    /// Things this seat may currently pick, with where they are drawn.
    pub fn to_select(&self) -> Vec<(ThingIndex, Place)> {
        if self.seat.is_none() || self.is_holding() {
            return Vec::new();
        }
        self.board
            .things()
            .iter()
            .filter(|t| t.claimed_by().is_none())
            .map(|t| (t.index(), self.board.place_of(t.index())))
            .collect()
    }
}
