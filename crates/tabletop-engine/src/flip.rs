//! Animated multi-flips.
//!
//! Flipping several selected things one after another is the only suspended
//! workflow on a table. It is an explicit finite sequence: every step flips
//! one thing, and a step finding its thing no longer selected cancels the
//! rest.

use crate::error::Result;
use crate::setup::TopologyProvider;
use crate::table::Table;
use crate::view::{SoundPlayer, TableView};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tabletop_core::{Movement, ThingIndex};
use tabletop_sync::ReplicatedStore;

/// Outcome of one flip step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipStep {
    /// Run the next step after this delay.
    Continue(Duration),
    Done,
    /// The next thing left the selection.
    Cancelled,
}

/// Things still to be flipped, in order.
#[derive(Clone, Debug)]
pub struct FlipSequence {
    things: Vec<ThingIndex>,
    next: usize,
    rotation: isize,
    delay: Duration,
}

impl FlipSequence {
    pub fn new(things: Vec<ThingIndex>, rotation: isize, delay: Duration) -> Self {
        Self {
            things,
            next: 0,
            rotation,
            delay,
        }
    }

    pub fn things(&self) -> &[ThingIndex] {
        &self.things
    }

    pub fn remaining(&self) -> usize {
        self.things.len() - self.next
    }

    /// Flip the next thing.
    pub fn step<S, V, A, T, M>(&mut self, table: &mut Table<S, V, A, T, M>) -> Result<FlipStep>
    where
        S: ReplicatedStore,
        V: TableView,
        A: SoundPlayer,
        T: TopologyProvider,
        M: Movement,
    {
        let Some(&thing) = self.things.get(self.next) else {
            return Ok(FlipStep::Done);
        };
        if !table.selected().contains(&thing) {
            tracing::debug!(%thing, "flip cancelled");
            table.clear_selection();
            self.next = self.things.len();
            return Ok(FlipStep::Cancelled);
        }

        table.flip_thing(thing, self.rotation);
        table.send_update(false)?;
        self.next += 1;

        if self.next < self.things.len() {
            Ok(FlipStep::Continue(self.delay))
        } else {
            table.clear_selection();
            Ok(FlipStep::Done)
        }
    }
}

/// Drive a flip sequence to completion, sleeping between steps.
///
/// The table lock is only held while a step runs.
pub async fn run_flip<S, V, A, T, M>(
    table: Arc<Mutex<Table<S, V, A, T, M>>>,
    mut sequence: FlipSequence,
) -> Result<FlipStep>
where
    S: ReplicatedStore,
    V: TableView,
    A: SoundPlayer,
    T: TopologyProvider,
    M: Movement,
{
    loop {
        let step = {
            let mut table = table.lock();
            sequence.step(&mut table)?
        };
        match step {
            FlipStep::Continue(delay) => tokio::time::sleep(delay).await,
            done => return Ok(done),
        }
    }
}

/// Compare names the way people read them: digit runs compare by value,
/// so `hand.0.2` sorts before `hand.0.10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let ord = left
                    .trim_start_matches('0')
                    .len()
                    .cmp(&right.trim_start_matches('0').len())
                    .then_with(|| left.trim_start_matches('0').cmp(right.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_order() {
        let mut names = vec!["hand.0.10", "hand.0.2", "hand.0.1", "discard.1.0.0"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["discard.1.0.0", "hand.0.1", "hand.0.2", "hand.0.10"]);
    }

    #[test]
    fn test_leading_zeros_compare_by_value() {
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("a9", "a010"), Ordering::Less);
    }
}
