//! Strongly typed identifiers for seats, things and slots.

use serde::{Deserialize, Serialize};

/// A participant's concurrency and authority identity.
///
/// Everything a seat claims is exclusively theirs until released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seat(pub u8);

impl Seat {
    /// Number of seats around the table.
    pub const COUNT: u8 = 4;

    pub fn new(seat: u8) -> Option<Self> {
        (seat < Self::COUNT).then_some(Self(seat))
    }

    /// The seat to the right, wrapping around the table.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % Self::COUNT)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self.0 < Self::COUNT
    }

    /// All seats in table order.
    pub fn all() -> impl Iterator<Item = Seat> {
        (0..Self::COUNT).map(Seat)
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seat-{}", self.0)
    }
}

/// Stable index of a thing, assigned once at setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThingIndex(pub usize);

impl std::fmt::Display for ThingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a slot in the board's slot table.
///
/// Slot ids are only handed out by the board that owns the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub usize);
