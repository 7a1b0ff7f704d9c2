//! # tabletop-sync
//!
//! Keeps a local board eventually consistent with a replicated store while
//! transmitting only the things that actually changed.
//!
//! # Quick Start
//!
//! ```rust
//! use tabletop_core::{Board, Place, SlotSpec, ThingKind, Vec3};
//! use tabletop_sync::{create_table, ReplicatedStore, SyncBridge};
//!
//! let place = Place::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(6.0, 9.0, 4.0));
//! let mut board = Board::builder()
//!     .slot(SlotSpec::new("hand.0", ThingKind::Tile, Vec3::ZERO).place(place))
//!     .thing(ThingKind::Tile, 0, "hand.0", 0)
//!     .build()
//!     .unwrap();
//!
//! let (hub, stores) = create_table(2);
//! let mut bridge = SyncBridge::new();
//! bridge.send_update(&mut board, &stores[0], true).unwrap();
//!
//! assert_eq!(hub.snapshot().len(), 1);
//! assert_eq!(stores[1].poll().len(), 2);
//! ```
//!
//! # Architecture
//!
//! - [`info`] - Records exchanged through the store
//! - [`store`] - The replicated store contract
//! - [`memory`] - In-memory last-writer-wins hub
//! - [`bridge`] - Outgoing diffs and incoming ingestion
//! - [`cursor`] - Remote pointer interpolation
//! - [`error`] - Error types

pub mod bridge;
pub mod cursor;
pub mod error;
pub mod info;
pub mod memory;
pub mod store;

pub use bridge::{IngestReport, SyncBridge, SyncStats};
pub use cursor::{now_millis, CursorTracker};
pub use error::{Result, SyncError};
pub use info::{MatchInfo, MouseInfo, ThingInfo, TileSet};
pub use memory::{create_table, MemoryHub, MemoryStore, ReplicaId};
pub use store::{Batch, ReplicatedStore, StoreEvent};
