//! Rendering and audio collaborators.
//!
//! The table only notifies these; nothing they return is consumed.

use tabletop_core::{Place, Seat, ThingIndex, ThingKind};

/// What a thing looks like, independent of where it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Appearance {
    pub kind: ThingKind,
    pub type_index: usize,
}

/// How one thing should be drawn this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Render {
    pub place: Place,
    pub thing: ThingIndex,
    pub selected: bool,
    pub hovered: bool,
    /// Dragged by some seat rather than resting in its slot.
    pub held: bool,
    /// Held by this seat without a valid drop target.
    pub temporary: bool,
    /// Lowest piece of a stack whose top is empty or lifted.
    pub bottom: bool,
}

/// Scores per seat, in table order.
pub type Scores = [i64; Seat::COUNT as usize];

pub trait TableView {
    fn replace_things(&mut self, things: &[Appearance]);

    fn add_shadows(&mut self, places: &[Place]);

    fn update_things(&mut self, renders: Vec<Render>);

    fn update_drop_shadows(&mut self, places: Vec<Place>);

    fn update_scores(&mut self, scores: Scores);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundKind {
    /// A tile landed in a discard row.
    Discard,
    /// A stick was placed for riichi.
    Stick,
}

pub trait SoundPlayer {
    fn play(&mut self, kind: SoundKind, side: Seat);
}

/// A view that keeps the last notification of each kind.
#[derive(Clone, Debug, Default)]
pub struct RecordingView {
    pub things: Vec<Appearance>,
    pub shadows: Vec<Place>,
    pub renders: Vec<Render>,
    pub drop_shadows: Vec<Place>,
    pub scores: Scores,
    pub replaced: usize,
}

impl TableView for RecordingView {
    fn replace_things(&mut self, things: &[Appearance]) {
        self.things = things.to_vec();
        self.replaced += 1;
    }

    fn add_shadows(&mut self, places: &[Place]) {
        self.shadows.extend_from_slice(places);
    }

    fn update_things(&mut self, renders: Vec<Render>) {
        self.renders = renders;
    }

    fn update_drop_shadows(&mut self, places: Vec<Place>) {
        self.drop_shadows = places;
    }

    fn update_scores(&mut self, scores: Scores) {
        self.scores = scores;
    }
}

/// A sound player that remembers what it was asked to play.
#[derive(Clone, Debug, Default)]
pub struct RecordingSounds {
    pub played: Vec<(SoundKind, Seat)>,
}

impl SoundPlayer for RecordingSounds {
    fn play(&mut self, kind: SoundKind, side: Seat) {
        tracing::trace!(?kind, %side, "sound");
        self.played.push((kind, side));
    }
}
