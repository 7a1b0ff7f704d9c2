//! # tabletop-engine
//!
//! Drag, drop, flip and deal orchestration for one seat of a shared table.
//!
//! # Quick Start
//!
//! ```rust
//! use tabletop_engine::{
//!     DealKind, EngineConfig, MahjongSetup, RecordingSounds, RecordingView, Table,
//! };
//! use tabletop_sync::create_table;
//!
//! let (_hub, mut stores) = create_table(1);
//! let store = stores.remove(0);
//! let config = EngineConfig::default();
//! let setup = MahjongSetup::new(config.tile_size, config.seed);
//!
//! let (view, sounds) = (RecordingView::default(), RecordingSounds::default());
//! let mut table = Table::new(config, setup, store, view, sounds).unwrap();
//! table.deal(DealKind::Hands).unwrap();
//! table.update_view();
//!
//! assert!(table.board().check_invariants().is_ok());
//! ```
//!
//! # Architecture
//!
//! - [`table`] - Input handling, drag orchestration and remote ingestion
//! - [`flip`] - Animated multi-flip sequences and their async runner
//! - [`setup`] - Topology providers and the mahjong layout
//! - [`view`] - Rendering and audio collaborators
//! - [`config`] - Engine configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod flip;
pub mod setup;
pub mod table;
pub mod view;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{EngineError, Result};
pub use flip::{natural_cmp, run_flip, FlipSequence, FlipStep};
pub use setup::{DealKind, MahjongSetup, TopologyProvider};
pub use table::Table;
pub use view::{
    Appearance, RecordingSounds, RecordingView, Render, Scores, SoundKind, SoundPlayer, TableView,
};
