//! Push Propagator - derived slot offsets driven by declared push rules.
//!
//! After every commit each rule's target recomputes its offset from its
//! source: the source's own offset plus the push delta its occupant imposes
//! (for example a sideways tile widening the rest of a discard row). Rules run
//! in declaration order, so chains cascade when declared front to back.

use crate::geometry::Vec3;
use crate::ids::SlotId;
use crate::topology::{Board, PushRule};

impl Board {
    /// Run every push rule once, in declaration order.
    pub fn check_pushes(&mut self) {
        for i in 0..self.pushes.len() {
            let PushRule { source, target } = self.pushes[i];
            let offset = self.pushed_offset(source);
            self.slot_mut(target).offset = offset;
        }
    }

    /// Offset a target of `source` should take given the source's state.
    fn pushed_offset(&self, source: SlotId) -> Vec3 {
        let slot = self.slot(source);
        match slot.thing() {
            Some(occupant) => {
                slot.offset() + slot.push_delta(self.thing(occupant).rotation_index())
            }
            None => slot.offset(),
        }
    }
}
