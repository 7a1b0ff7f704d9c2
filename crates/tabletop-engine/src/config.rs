//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabletop_core::{ResolverConfig, Vec3};

/// Tunables for a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounding size of one tile (width, height, depth).
    pub tile_size: Vec3,
    /// Overlap scores at or below this value do not count as a drop target.
    pub min_score: f32,
    /// Delay between two steps of an animated multi-flip (in milliseconds).
    pub flip_delay_ms: u64,
    /// Honba wraps around at this value.
    pub honba_modulus: u8,
    /// How far behind remote pointers are drawn (in milliseconds).
    pub cursor_interval_ms: u64,
    /// Seed for deal shuffles.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: Vec3::new(6.0, 9.0, 4.0),
            min_score: 1.0,
            flip_delay_ms: 100,
            honba_modulus: 8,
            cursor_interval_ms: 100,
            seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Placement settings derived from the tile size.
    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            piece_width: self.tile_size.x,
            min_score: self.min_score,
        }
    }

    pub fn flip_delay(&self) -> Duration {
        Duration::from_millis(self.flip_delay_ms)
    }
}

/// Builder for engine configuration.
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn tile_size(mut self, size: Vec3) -> Self {
        self.config.tile_size = size;
        self
    }

    pub fn min_score(mut self, score: f32) -> Self {
        self.config.min_score = score;
        self
    }

    pub fn flip_delay(mut self, ms: u64) -> Self {
        self.config.flip_delay_ms = ms;
        self
    }

    pub fn honba_modulus(mut self, modulus: u8) -> Self {
        self.config.honba_modulus = modulus.max(1);
        self
    }

    pub fn cursor_interval(mut self, ms: u64) -> Self {
        self.config.cursor_interval_ms = ms;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
