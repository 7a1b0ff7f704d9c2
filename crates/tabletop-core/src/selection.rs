//! Selection Engine - which things may be hovered or selected together.

use crate::ids::ThingIndex;
use crate::majority::filter_most_common;
use crate::topology::{Board, Link};

/// A thing is selectable unless something sits on top of it that is not
/// itself part of `already_selected`. Stacks are picked top-down.
pub fn can_select(board: &Board, thing: ThingIndex, already_selected: &[ThingIndex]) -> bool {
    match board.slot_of(thing).link(Link::Up) {
        Some(up) => match board.slot(up).thing() {
            Some(above) => already_selected.contains(&above),
            None => true,
        },
        None => true,
    }
}

/// Narrow a multi-select request: drop blocked things, then keep only the
/// majority slot group among the survivors.
pub fn filter_selection(board: &Board, requested: &[ThingIndex]) -> Vec<ThingIndex> {
    let selectable: Vec<ThingIndex> = requested
        .iter()
        .copied()
        .filter(|&thing| can_select(board, thing, requested))
        .collect();
    if selectable.is_empty() {
        return selectable;
    }
    filter_most_common(&selectable, |&thing| board.slot_of(thing).group().to_string())
}
