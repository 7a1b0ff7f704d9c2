//! The replicated store contract.
//!
//! The store provides last-writer-wins semantics per key and one authoritative
//! order of updates. Writes are grouped into batches; a batch is delivered to
//! observers as a unit, so a full resync and the match record written by the
//! same deal are never seen apart.

use crate::error::Result;
use crate::info::{MatchInfo, MouseInfo, ThingInfo};
use tabletop_core::{Seat, ThingIndex};

/// Changes delivered by the store, in the store's order.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// This replica's seat was assigned or revoked.
    Seat(Option<Seat>),
    /// Thing records changed; `None` marks a deleted record.
    Things(Vec<(ThingIndex, Option<ThingInfo>)>),
    /// The match record changed.
    Match(MatchInfo),
    /// Another seat's pointer moved.
    Mouse(Seat, MouseInfo),
}

/// One atomic write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    pub things: Vec<(ThingIndex, ThingInfo)>,
    pub match_info: Option<MatchInfo>,
}

impl Batch {
    pub fn things(entries: Vec<(ThingIndex, ThingInfo)>) -> Self {
        Self {
            things: entries,
            match_info: None,
        }
    }

    pub fn with_match(mut self, info: MatchInfo) -> Self {
        self.match_info = Some(info);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty() && self.match_info.is_none()
    }
}

/// Key-value channels shared by all replicas of a table.
pub trait ReplicatedStore {
    /// The seat this replica plays, if any.
    fn seat(&self) -> Option<Seat>;

    /// Last acknowledged description of a thing.
    fn thing(&self, index: ThingIndex) -> Option<ThingInfo>;

    fn match_info(&self) -> Option<MatchInfo>;

    /// Apply a batch atomically.
    fn commit(&self, batch: Batch) -> Result<()>;

    /// Publish this replica's pointer.
    fn send_mouse(&self, info: MouseInfo) -> Result<()>;

    /// Drain events delivered since the last poll.
    ///
    /// A delivered write older than this replica's own latest write to the
    /// same key is dropped.
    fn poll(&self) -> Vec<StoreEvent>;

    fn update_things(&self, entries: Vec<(ThingIndex, ThingInfo)>) -> Result<()> {
        self.commit(Batch::things(entries))
    }

    fn set_match(&self, info: MatchInfo) -> Result<()> {
        self.commit(Batch::default().with_match(info))
    }
}
