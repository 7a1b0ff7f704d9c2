//! # tabletop-core
//!
//! The slot/thing graph of a shared tabletop and the rules for changing it.
//!
//! This crate provides:
//! - Board topology: slots, things, links and push rules
//! - Claim Manager: seat-scoped exclusive holds
//! - Selection Engine: stacking and majority-group rules
//! - Slot Resolver: best-fit placement of a dragged footprint
//! - Movement Planner: the per-drag mapping with shift chains
//! - Push Propagator: derived offsets after each commit
//!
//! ## Example
//!
//! ```rust
//! use tabletop_core::{Board, Place, Seat, SlotSpec, ThingIndex, ThingKind, Vec3};
//!
//! let place = Place::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(6.0, 9.0, 4.0));
//! let mut board = Board::builder()
//!     .slot(SlotSpec::new("hand.0", ThingKind::Tile, Vec3::ZERO).place(place))
//!     .thing(ThingKind::Tile, 0, "hand.0", 0)
//!     .build()
//!     .unwrap();
//!
//! assert!(board.hold(ThingIndex(0), Seat(0)));
//! assert!(!board.hold(ThingIndex(0), Seat(1)));
//! ```

pub mod claims;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod majority;
pub mod movement;
pub mod push;
pub mod resolver;
pub mod selection;
pub mod topology;

pub use error::{InvariantViolation, Result, TopologyError};
pub use geometry::{compare_zyx, rectangle_overlap, Place, Rect, Vec3};
pub use ids::{Seat, SlotId, ThingIndex};
pub use majority::{filter_most_common, most_common};
pub use movement::{ChainShift, Movement};
pub use resolver::{find_slot, overlap_score, ResolverConfig};
pub use selection::{can_select, filter_selection};
pub use topology::{Board, BoardBuilder, Link, Links, PushRule, Slot, SlotSpec, Thing, ThingKind};
