//! Error types for board construction and invariant checks.

use thiserror::Error;

/// Errors raised while building a board from slot and thing descriptions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("Duplicate slot name: {0}")]
    DuplicateSlot(String),

    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("Slot {slot} is already occupied by thing {thing}")]
    SlotOccupied { slot: String, thing: usize },

    #[error("Thing {thing} of kind {thing_kind} cannot occupy {slot_kind} slot {slot}")]
    KindMismatch {
        thing: usize,
        thing_kind: String,
        slot: String,
        slot_kind: String,
    },

    #[error("Slot {0} has no places")]
    NoPlaces(String),
}

/// A violated board invariant, as reported by `Board::check_invariants`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Thing {thing} points at slot {slot} but the slot holds {held:?}")]
    DanglingThing {
        thing: usize,
        slot: String,
        held: Option<usize>,
    },

    #[error("Slot {slot} holds thing {thing} which lives elsewhere")]
    DanglingSlot { slot: String, thing: usize },

    #[error("Thing {thing} is claimed by invalid seat {seat}")]
    InvalidClaim { thing: usize, seat: u8 },

    #[error("Thing {thing} is routed through {slot} without being claimed")]
    UnclaimedRoute { thing: usize, slot: String },
}

pub type Result<T> = std::result::Result<T, TopologyError>;
