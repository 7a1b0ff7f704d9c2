//! In-memory replicated store for tests and simulation.
//!
//! A `MemoryHub` plays the role of the authoritative server: it serializes
//! every commit under one lock, stamps each key with a version (last writer
//! wins) and fans the batch out to every other connected replica.
//!
//! Deliveries carry the version of the commit that produced them. A replica
//! drops delivered entries older than its own latest write to the same key,
//! so every replica settles on the hub's winner for every key.

use crate::error::{Result, SyncError};
use crate::info::{MatchInfo, MouseInfo, ThingInfo};
use crate::store::{Batch, ReplicatedStore, StoreEvent};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tabletop_core::{Seat, ThingIndex};
use tokio::sync::mpsc;

/// Unique identifier for a connected replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReplicaId(pub u64);

/// A stored record with the version of the write that produced it.
#[derive(Clone, Debug)]
struct Versioned {
    encoded: String,
    version: u64,
    writer: ReplicaId,
}

/// An event tagged with the hub version it was produced at.
type Delivery = (u64, StoreEvent);

struct Connection {
    id: ReplicaId,
    seat: Option<Seat>,
    tx: mpsc::UnboundedSender<Delivery>,
}

/// Versions of this replica's own latest writes.
#[derive(Default)]
struct OwnWrites {
    things: HashMap<ThingIndex, u64>,
    match_info: u64,
}

impl OwnWrites {
    /// Whether a delivered write to `index` at `version` still matters.
    fn is_fresh(&self, index: ThingIndex, version: u64) -> bool {
        self.things.get(&index).map_or(true, |&own| own < version)
    }
}

#[derive(Default)]
struct HubState {
    things: BTreeMap<ThingIndex, Versioned>,
    match_info: Option<Versioned>,
    connections: Vec<Connection>,
    version: u64,
    next_replica: u64,
}

impl HubState {
    fn broadcast(&self, from: ReplicaId, event: &StoreEvent) {
        for conn in self.connections.iter().filter(|c| c.id != from) {
            // A closed receiver just means the replica went away.
            let _ = conn.tx.send((self.version, event.clone()));
        }
    }

    fn free_seat(&self) -> Option<Seat> {
        Seat::all().find(|seat| self.connections.iter().all(|c| c.seat != Some(*seat)))
    }
}

type SharedHub = Arc<RwLock<HubState>>;

/// The authoritative side of an in-memory table.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: SharedHub,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a new replica. Seats are handed out in join order; late
    /// joiners beyond the last seat spectate.
    pub fn connect(&self) -> MemoryStore {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.write();
        let id = ReplicaId(state.next_replica);
        state.next_replica += 1;
        let seat = state.free_seat();
        // Late joiners catch up on the current records. The receiver is alive,
        // so these sends cannot fail.
        let version = state.version;
        let _ = tx.send((version, StoreEvent::Seat(seat)));
        let things: Vec<_> = state
            .things
            .iter()
            .map(|(index, record)| (*index, decode(&record.encoded)))
            .collect();
        if !things.is_empty() {
            let _ = tx.send((version, StoreEvent::Things(things)));
        }
        if let Some(info) = state.match_info.as_ref().and_then(|r| decode(&r.encoded)) {
            let _ = tx.send((version, StoreEvent::Match(info)));
        }
        state.connections.push(Connection { id, seat, tx });
        tracing::debug!(replica = id.0, ?seat, "replica connected");

        MemoryStore {
            id,
            seat,
            hub: self.state.clone(),
            rx: Mutex::new(rx),
            written: Mutex::new(OwnWrites::default()),
        }
    }

    /// Current thing records, decoded.
    pub fn snapshot(&self) -> BTreeMap<ThingIndex, ThingInfo> {
        let state = self.state.read();
        state
            .things
            .iter()
            .filter_map(|(index, record)| decode(&record.encoded).map(|info| (*index, info)))
            .collect()
    }

    /// Version of the last accepted write.
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Which replica last wrote a thing record, and at which version.
    pub fn last_write(&self, index: ThingIndex) -> Option<(ReplicaId, u64)> {
        self.state
            .read()
            .things
            .get(&index)
            .map(|r| (r.writer, r.version))
    }

    pub fn connected(&self) -> usize {
        self.state.read().connections.len()
    }
}

/// Create a hub with `count` connected replicas.
pub fn create_table(count: usize) -> (MemoryHub, Vec<MemoryStore>) {
    let hub = MemoryHub::new();
    let stores = (0..count).map(|_| hub.connect()).collect();
    (hub, stores)
}

/// A replica's handle onto a `MemoryHub`.
pub struct MemoryStore {
    id: ReplicaId,
    seat: Option<Seat>,
    hub: SharedHub,
    rx: Mutex<mpsc::UnboundedReceiver<Delivery>>,
    written: Mutex<OwnWrites>,
}

impl MemoryStore {
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    fn ensure_connected(&self, state: &HubState) -> Result<()> {
        if state.connections.iter().any(|c| c.id == self.id) {
            Ok(())
        } else {
            Err(SyncError::Disconnected)
        }
    }
}

impl ReplicatedStore for MemoryStore {
    fn seat(&self) -> Option<Seat> {
        self.seat
    }

    fn thing(&self, index: ThingIndex) -> Option<ThingInfo> {
        let state = self.hub.read();
        state.things.get(&index).and_then(|r| decode(&r.encoded))
    }

    fn match_info(&self) -> Option<MatchInfo> {
        let state = self.hub.read();
        state.match_info.as_ref().and_then(|r| decode(&r.encoded))
    }

    fn commit(&self, batch: Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // Encode before taking the lock so a bad record rejects the whole batch.
        let things = batch
            .things
            .iter()
            .map(|(index, info)| Ok((*index, encode(info)?)))
            .collect::<Result<Vec<_>>>()?;
        let match_record = batch.match_info.as_ref().map(encode).transpose()?;

        let mut state = self.hub.write();
        self.ensure_connected(&state)?;
        state.version += 1;
        let version = state.version;

        let mut written = self.written.lock();
        for (index, _) in &things {
            written.things.insert(*index, version);
        }
        if match_record.is_some() {
            written.match_info = version;
        }
        drop(written);

        for (index, encoded) in things {
            state.things.insert(
                index,
                Versioned {
                    encoded,
                    version,
                    writer: self.id,
                },
            );
        }
        if let Some(encoded) = match_record {
            state.match_info = Some(Versioned {
                encoded,
                version,
                writer: self.id,
            });
        }

        if !batch.things.is_empty() {
            let entries = batch
                .things
                .into_iter()
                .map(|(index, info)| (index, Some(info)))
                .collect();
            state.broadcast(self.id, &StoreEvent::Things(entries));
        }
        if let Some(info) = batch.match_info {
            state.broadcast(self.id, &StoreEvent::Match(info));
        }
        tracing::trace!(replica = self.id.0, version, "batch committed");
        Ok(())
    }

    fn send_mouse(&self, info: MouseInfo) -> Result<()> {
        let seat = self.seat.ok_or(SyncError::NoSeat)?;
        let state = self.hub.read();
        self.ensure_connected(&state)?;
        state.broadcast(self.id, &StoreEvent::Mouse(seat, info));
        Ok(())
    }

    fn poll(&self) -> Vec<StoreEvent> {
        let mut rx = self.rx.lock();
        let written = self.written.lock();
        let mut events = Vec::new();
        while let Ok((version, event)) = rx.try_recv() {
            match event {
                StoreEvent::Things(entries) => {
                    let total = entries.len();
                    let fresh: Vec<_> = entries
                        .into_iter()
                        .filter(|(index, _)| written.is_fresh(*index, version))
                        .collect();
                    if fresh.len() < total {
                        tracing::trace!(
                            replica = self.id.0,
                            version,
                            stale = total - fresh.len(),
                            "dropping entries older than own writes"
                        );
                    }
                    if !fresh.is_empty() {
                        events.push(StoreEvent::Things(fresh));
                    }
                }
                StoreEvent::Match(_) if written.match_info > version => {}
                event => events.push(event),
            }
        }
        events
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        let mut state = self.hub.write();
        state.connections.retain(|c| c.id != self.id);
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(encoded: &str) -> Option<T> {
    match serde_json::from_str(encoded) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(%err, "dropping undecodable record");
            None
        }
    }
}
