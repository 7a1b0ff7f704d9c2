//! Board topology - slots, things and push rules.
//!
//! The board is the single owned aggregate every other component works on.
//! Slots and push rules are fixed once the board is built; only occupancy,
//! rotation, claims and push offsets change afterwards.
//!
//! Occupancy is kept in both directions (`Slot::thing` and `Thing::slot`) and
//! every mutation goes through `Board` so the two views never disagree after
//! an operation completes.

use crate::error::{InvariantViolation, Result, TopologyError};
use crate::geometry::{Place, Vec3};
use crate::ids::{Seat, SlotId, ThingIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category of a thing; a slot only accepts things of its own kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThingKind {
    Tile,
    Stick,
    Marker,
}

impl std::fmt::Display for ThingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThingKind::Tile => write!(f, "tile"),
            ThingKind::Stick => write!(f, "stick"),
            ThingKind::Marker => write!(f, "marker"),
        }
    }
}

/// Directed links between slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Link {
    /// The slot stacked directly on top.
    Up,
    /// The slot directly underneath.
    Down,
    ShiftLeft,
    ShiftRight,
    /// This slot only accepts a thing while the linked slot is occupied.
    Requires,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Links {
    pub up: Option<SlotId>,
    pub down: Option<SlotId>,
    pub shift_left: Option<SlotId>,
    pub shift_right: Option<SlotId>,
    pub requires: Option<SlotId>,
}

impl Links {
    pub fn get(&self, link: Link) -> Option<SlotId> {
        match link {
            Link::Up => self.up,
            Link::Down => self.down,
            Link::ShiftLeft => self.shift_left,
            Link::ShiftRight => self.shift_right,
            Link::Requires => self.requires,
        }
    }

    fn set(&mut self, link: Link, slot: SlotId) {
        match link {
            Link::Up => self.up = Some(slot),
            Link::Down => self.down = Some(slot),
            Link::ShiftLeft => self.shift_left = Some(slot),
            Link::ShiftRight => self.shift_right = Some(slot),
            Link::Requires => self.requires = Some(slot),
        }
    }

    pub fn is_shiftable(&self) -> bool {
        self.shift_left.is_some() || self.shift_right.is_some()
    }
}

/// Build-time description of a slot. Links refer to other slots by name.
#[derive(Clone, Debug)]
pub struct SlotSpec {
    name: String,
    kind: ThingKind,
    origin: Vec3,
    group: String,
    side: Seat,
    places: Vec<Place>,
    links: Vec<(Link, String)>,
    can_flip_multiple: bool,
    draw_shadow: bool,
    shadow_rotation: usize,
    push_deltas: Vec<Vec3>,
}

impl SlotSpec {
    pub fn new(name: impl Into<String>, kind: ThingKind, origin: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            origin,
            group: String::new(),
            side: Seat(0),
            places: Vec::new(),
            links: Vec::new(),
            can_flip_multiple: false,
            draw_shadow: false,
            shadow_rotation: 0,
            push_deltas: Vec::new(),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn side(mut self, side: Seat) -> Self {
        self.side = side;
        self
    }

    /// Add the place used for the next rotation index.
    pub fn place(mut self, place: Place) -> Self {
        self.places.push(place);
        self
    }

    pub fn link(mut self, link: Link, target: impl Into<String>) -> Self {
        self.links.push((link, target.into()));
        self
    }

    pub fn can_flip_multiple(mut self, enabled: bool) -> Self {
        self.can_flip_multiple = enabled;
        self
    }

    pub fn shadow(mut self, rotation: usize) -> Self {
        self.draw_shadow = true;
        self.shadow_rotation = rotation;
        self
    }

    /// Offset this slot imposes on the targets of its push rules, indexed by
    /// the rotation of its occupant.
    pub fn push_deltas(mut self, deltas: Vec<Vec3>) -> Self {
        self.push_deltas = deltas;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named location that holds at most one thing.
#[derive(Clone, Debug)]
pub struct Slot {
    id: SlotId,
    name: String,
    kind: ThingKind,
    origin: Vec3,
    group: String,
    side: Seat,
    places: Vec<Place>,
    pub(crate) links: Links,
    can_flip_multiple: bool,
    draw_shadow: bool,
    shadow_rotation: usize,
    push_deltas: Vec<Vec3>,
    pub(crate) offset: Vec3,
    pub(crate) thing: Option<ThingIndex>,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ThingKind {
        self.kind
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// The seat whose side of the table this slot is on.
    pub fn side(&self) -> Seat {
        self.side
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn link(&self, link: Link) -> Option<SlotId> {
        self.links.get(link)
    }

    pub fn thing(&self) -> Option<ThingIndex> {
        self.thing
    }

    pub fn is_empty(&self) -> bool {
        self.thing.is_none()
    }

    pub fn can_flip_multiple(&self) -> bool {
        self.can_flip_multiple
    }

    pub fn draw_shadow(&self) -> bool {
        self.draw_shadow
    }

    pub fn shadow_place(&self) -> Place {
        self.places[self.shadow_rotation % self.places.len()]
    }

    pub fn rotation_count(&self) -> usize {
        self.places.len()
    }

    pub fn push_delta(&self, rotation: usize) -> Vec3 {
        self.push_deltas.get(rotation).copied().unwrap_or(Vec3::ZERO)
    }

    /// Current push offset, derived from this slot's push sources.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Placement geometry at `rotation`, shifted by the current push offset.
    pub fn place_with_offset(&self, rotation: usize) -> Place {
        self.base_place(rotation).translated(self.offset)
    }

    /// Placement geometry at `rotation` ignoring push offsets.
    pub fn base_place(&self, rotation: usize) -> Place {
        self.places[rotation % self.places.len()]
    }
}

/// A discrete piece. Always occupies exactly one slot.
#[derive(Clone, Debug)]
pub struct Thing {
    index: ThingIndex,
    kind: ThingKind,
    type_index: usize,
    pub(crate) slot: SlotId,
    pub(crate) previous_slot: SlotId,
    pub(crate) rotation_index: usize,
    pub(crate) claimed_by: Option<Seat>,
    pub(crate) held_rotation: Vec3,
    pub(crate) shift_slot: Option<SlotId>,
    pub(crate) sent: bool,
}

impl Thing {
    pub fn index(&self) -> ThingIndex {
        self.index
    }

    pub fn kind(&self) -> ThingKind {
        self.kind
    }

    /// Face or variant index, meaningful to the renderer.
    pub fn type_index(&self) -> usize {
        self.type_index
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// The slot this thing occupied before its last move.
    pub fn previous_slot(&self) -> SlotId {
        self.previous_slot
    }

    pub fn rotation_index(&self) -> usize {
        self.rotation_index
    }

    pub fn claimed_by(&self) -> Option<Seat> {
        self.claimed_by
    }

    pub fn held_rotation(&self) -> Vec3 {
        self.held_rotation
    }

    /// Slot this thing is visually routed through while displaced by a shift.
    pub fn shift_slot(&self) -> Option<SlotId> {
        self.shift_slot
    }

    /// Whether the current state has been handed to the replicated store.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Claimed and routed through a shift slot rather than freely dragged.
    pub fn is_routed(&self) -> bool {
        self.claimed_by.is_some() && self.shift_slot.is_some()
    }
}

/// Declares that `target` reacts to the occupancy of `source`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushRule {
    pub source: SlotId,
    pub target: SlotId,
}

/// The slot/thing graph.
#[derive(Clone, Debug)]
pub struct Board {
    slots: Vec<Slot>,
    slot_names: HashMap<String, SlotId>,
    pub(crate) things: Vec<Thing>,
    pub(crate) pushes: Vec<PushRule>,
}

impl Board {
    pub fn builder() -> BoardBuilder {
        BoardBuilder::default()
    }

    /// All slots, in declaration order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn things(&self) -> &[Thing] {
        &self.things
    }

    pub fn pushes(&self) -> &[PushRule] {
        &self.pushes
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.0]
    }

    pub fn thing(&self, index: ThingIndex) -> &Thing {
        &self.things[index.0]
    }

    pub fn get_thing(&self, index: ThingIndex) -> Option<&Thing> {
        self.things.get(index.0)
    }

    pub fn slot_by_name(&self, name: &str) -> Option<SlotId> {
        self.slot_names.get(name).copied()
    }

    /// The slot a thing currently occupies.
    pub fn slot_of(&self, index: ThingIndex) -> &Slot {
        self.slot(self.thing(index).slot)
    }

    /// Where a thing is drawn when resting in its slot.
    pub fn place_of(&self, index: ThingIndex) -> Place {
        let thing = self.thing(index);
        self.slot(thing.slot).place_with_offset(thing.rotation_index)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    pub(crate) fn thing_mut(&mut self, index: ThingIndex) -> &mut Thing {
        &mut self.things[index.0]
    }

    /// Move several things at once, keeping their rotations.
    ///
    /// All things are detached before any is attached, so swaps and chains
    /// never trample each other.
    pub fn move_things(&mut self, moves: &[(ThingIndex, SlotId)]) {
        let placements: Vec<_> = moves
            .iter()
            .map(|&(thing, slot)| (thing, slot, self.thing(thing).rotation_index))
            .collect();
        self.arrange(&placements);
    }

    /// Place several things with explicit rotations, two-phase.
    pub fn arrange(&mut self, placements: &[(ThingIndex, SlotId, usize)]) {
        for &(thing, _, _) in placements {
            self.prepare_move(thing);
        }
        for &(thing, slot, rotation) in placements {
            self.move_to(thing, slot, rotation);
        }
    }

    /// Detach a thing from its slot ahead of a `move_to`.
    pub fn prepare_move(&mut self, index: ThingIndex) {
        let slot = self.thing(index).slot;
        if self.slot(slot).thing == Some(index) {
            self.slot_mut(slot).thing = None;
        }
    }

    /// Attach a thing to `slot`. The thing should have been prepared first.
    pub fn move_to(&mut self, index: ThingIndex, slot: SlotId, rotation: usize) {
        let rotation = rotation % self.slot(slot).rotation_count();
        if let Some(previous) = self.slot(slot).thing {
            if previous != index {
                tracing::warn!(
                    thing = %index,
                    displaced = %previous,
                    slot = self.slot(slot).name(),
                    "slot taken over while still occupied"
                );
            }
        }
        self.slot_mut(slot).thing = Some(index);
        let thing = self.thing_mut(index);
        if thing.slot != slot {
            thing.previous_slot = thing.slot;
            thing.sent = false;
        }
        if thing.rotation_index != rotation {
            thing.sent = false;
        }
        thing.slot = slot;
        thing.rotation_index = rotation;
    }

    /// Turn a thing to `rotation`, wrapped to the rotations its slot offers.
    pub fn flip(&mut self, index: ThingIndex, rotation: usize) {
        let count = self.slot_of(index).rotation_count();
        let thing = self.thing_mut(index);
        let rotation = rotation % count;
        if thing.rotation_index != rotation {
            thing.rotation_index = rotation;
            thing.sent = false;
        }
    }

    pub fn set_held_rotation(&mut self, index: ThingIndex, rotation: Vec3) {
        let thing = self.thing_mut(index);
        if thing.held_rotation != rotation {
            thing.held_rotation = rotation;
            thing.sent = false;
        }
    }

    pub fn set_type_index(&mut self, index: ThingIndex, type_index: usize) {
        self.thing_mut(index).type_index = type_index;
    }

    pub fn mark_sent(&mut self, index: ThingIndex, sent: bool) {
        self.thing_mut(index).sent = sent;
    }

    /// Verify the occupancy and claim invariants.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        for thing in &self.things {
            let slot = self.slot(thing.slot);
            if slot.thing != Some(thing.index) {
                return Err(InvariantViolation::DanglingThing {
                    thing: thing.index.0,
                    slot: slot.name.clone(),
                    held: slot.thing.map(|t| t.0),
                });
            }
            if let Some(seat) = thing.claimed_by {
                if !seat.is_valid() {
                    return Err(InvariantViolation::InvalidClaim {
                        thing: thing.index.0,
                        seat: seat.0,
                    });
                }
            }
            if let (None, Some(route)) = (thing.claimed_by, thing.shift_slot) {
                return Err(InvariantViolation::UnclaimedRoute {
                    thing: thing.index.0,
                    slot: self.slot(route).name.clone(),
                });
            }
        }
        for slot in &self.slots {
            if let Some(index) = slot.thing {
                if self.thing(index).slot != slot.id {
                    return Err(InvariantViolation::DanglingSlot {
                        slot: slot.name.clone(),
                        thing: index.0,
                    });
                }
            }
        }
        Ok(())
    }
}

struct ThingSpec {
    kind: ThingKind,
    type_index: usize,
    slot: String,
    rotation: usize,
}

/// Collects slot, thing and push declarations and resolves them into a board.
#[derive(Default)]
pub struct BoardBuilder {
    slots: Vec<SlotSpec>,
    things: Vec<ThingSpec>,
    pushes: Vec<(String, String)>,
}

impl BoardBuilder {
    pub fn slot(mut self, spec: SlotSpec) -> Self {
        self.slots.push(spec);
        self
    }

    pub fn add_slot(&mut self, spec: SlotSpec) {
        self.slots.push(spec);
    }

    /// Declare a thing; its index is the declaration order.
    pub fn thing(
        mut self,
        kind: ThingKind,
        type_index: usize,
        slot: impl Into<String>,
        rotation: usize,
    ) -> Self {
        self.add_thing(kind, type_index, slot, rotation);
        self
    }

    pub fn add_thing(
        &mut self,
        kind: ThingKind,
        type_index: usize,
        slot: impl Into<String>,
        rotation: usize,
    ) {
        self.things.push(ThingSpec {
            kind,
            type_index,
            slot: slot.into(),
            rotation,
        });
    }

    pub fn push(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.add_push(source, target);
        self
    }

    pub fn add_push(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.pushes.push((source.into(), target.into()));
    }

    pub fn build(self) -> Result<Board> {
        let mut slot_names = HashMap::with_capacity(self.slots.len());
        for (i, spec) in self.slots.iter().enumerate() {
            if spec.places.is_empty() {
                return Err(TopologyError::NoPlaces(spec.name.clone()));
            }
            if slot_names.insert(spec.name.clone(), SlotId(i)).is_some() {
                return Err(TopologyError::DuplicateSlot(spec.name.clone()));
            }
        }

        let resolve = |name: &str| {
            slot_names
                .get(name)
                .copied()
                .ok_or_else(|| TopologyError::UnknownSlot(name.to_string()))
        };

        let mut slots = Vec::with_capacity(self.slots.len());
        for (i, spec) in self.slots.into_iter().enumerate() {
            let mut links = Links::default();
            for (link, target) in &spec.links {
                links.set(*link, resolve(target)?);
            }
            slots.push(Slot {
                id: SlotId(i),
                name: spec.name,
                kind: spec.kind,
                origin: spec.origin,
                group: spec.group,
                side: spec.side,
                places: spec.places,
                links,
                can_flip_multiple: spec.can_flip_multiple,
                draw_shadow: spec.draw_shadow,
                shadow_rotation: spec.shadow_rotation,
                push_deltas: spec.push_deltas,
                offset: Vec3::ZERO,
                thing: None,
            });
        }

        let mut things = Vec::with_capacity(self.things.len());
        for (i, spec) in self.things.into_iter().enumerate() {
            let slot_id = resolve(&spec.slot)?;
            let slot = &mut slots[slot_id.0];
            if let Some(other) = slot.thing {
                return Err(TopologyError::SlotOccupied {
                    slot: spec.slot,
                    thing: other.0,
                });
            }
            if slot.kind != spec.kind {
                return Err(TopologyError::KindMismatch {
                    thing: i,
                    thing_kind: spec.kind.to_string(),
                    slot: spec.slot,
                    slot_kind: slot.kind.to_string(),
                });
            }
            slot.thing = Some(ThingIndex(i));
            things.push(Thing {
                index: ThingIndex(i),
                kind: spec.kind,
                type_index: spec.type_index,
                slot: slot_id,
                previous_slot: slot_id,
                rotation_index: spec.rotation % slot.places.len(),
                claimed_by: None,
                held_rotation: Vec3::ZERO,
                shift_slot: None,
                sent: false,
            });
        }

        let pushes = self
            .pushes
            .iter()
            .map(|(source, target)| {
                Ok(PushRule {
                    source: resolve(source)?,
                    target: resolve(target)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Board {
            slots,
            slot_names,
            things,
            pushes,
        })
    }
}
