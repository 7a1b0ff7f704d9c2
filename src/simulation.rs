//! Randomized multi-seat sessions against an in-memory hub.
//!
//! Every seat runs its own [`Table`] on a shared [`MemoryHub`]. Seats take
//! turns dragging random things to random points, flipping their hands and
//! dealing. After every gesture all tables drain their events, and at the
//! end each replica must agree with the hub on every thing.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tabletop_core::{InvariantViolation, ThingIndex, Vec3};
use tabletop_engine::{
    run_flip, DealKind, EngineConfig, EngineError, FlipStep, MahjongSetup, RecordingSounds,
    RecordingView, Table,
};
use tabletop_sync::{create_table, MemoryHub, MemoryStore, SyncBridge};
use thiserror::Error;

type SimTable = Table<MemoryStore, RecordingView, RecordingSounds, MahjongSetup>;

/// Edge of the area random drags aim at.
const REACH: f32 = 180.0;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("table {table}: {violation}")]
    Invariant { table: usize, violation: InvariantViolation },

    #[error("table {table} disagrees with the hub on thing {thing}")]
    Diverged { table: usize, thing: ThingIndex },

    #[error("table {table} still holds things after its gesture")]
    StuckClaim { table: usize },
}

/// Parameters of one simulated session.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub seats: usize,
    pub rounds: usize,
    pub seed: u64,
    pub flip_delay_ms: u64,
}

/// Statistics collected during a session.
#[derive(Clone, Debug, Default)]
pub struct SimulationStats {
    pub tables: usize,
    pub gestures: usize,
    pub drops: usize,
    pub flips: usize,
    pub cancelled_flips: usize,
    pub deals: usize,
    pub entries_sent: u64,
    pub entries_received: u64,
    pub hub_version: u64,
    pub total_time: Duration,
}

impl SimulationStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Simulation Statistics                         ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Tables:                    {:>30} ║", self.tables);
        println!("║  Gestures:                  {:>30} ║", self.gestures);
        println!("║  Drops:                     {:>30} ║", self.drops);
        let flips = format!("{} ({})", self.flips, self.cancelled_flips);
        let seconds = format!("{:.3}", self.total_time.as_secs_f64());
        println!("║  Flips (cancelled):         {:>30} ║", flips);
        println!("║  Deals:                     {:>30} ║", self.deals);
        println!("║  Entries sent:              {:>30} ║", self.entries_sent);
        println!("║  Entries received:          {:>30} ║", self.entries_received);
        println!("║  Hub version:               {:>30} ║", self.hub_version);
        println!("║  Total time:                {:>29}s ║", seconds);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

enum Gesture {
    Drag,
    Flip,
    Deal,
}

pub async fn run(config: SimulationConfig) -> Result<SimulationStats, SimulationError> {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (hub, stores) = create_table(config.seats);

    let mut tables = Vec::with_capacity(stores.len());
    for store in stores {
        let engine = EngineConfig::builder()
            .seed(config.seed)
            .flip_delay(config.flip_delay_ms)
            .build();
        let setup = MahjongSetup::new(engine.tile_size, engine.seed);
        let (view, sounds) = (RecordingView::default(), RecordingSounds::default());
        let table = Table::new(engine, setup, store, view, sounds)?;
        tables.push(Arc::new(Mutex::new(table)));
    }
    pump_all(&tables)?;

    let mut stats = SimulationStats {
        tables: tables.len(),
        ..Default::default()
    };
    // Spectators cannot act.
    let actors = config.seats.min(4);

    for round in 0..config.rounds {
        if actors == 0 {
            break;
        }
        let actor = rng.gen_range(0..actors);
        let gesture = match rng.gen_range(0..20) {
            0 => Gesture::Deal,
            1 | 2 => Gesture::Flip,
            _ => Gesture::Drag,
        };

        match gesture {
            Gesture::Drag => {
                let mut table = tables[actor].lock();
                let things = table.board().things().len();
                let thing = ThingIndex(rng.gen_range(0..things));
                let to = Vec3::new(rng.gen_range(-REACH..REACH), rng.gen_range(-REACH..REACH), 0.0);
                if drag(&mut table, thing, to)? {
                    stats.drops += 1;
                }
                stats.gestures += 1;
            }
            Gesture::Flip => {
                let sequence = {
                    let mut table = tables[actor].lock();
                    let hand = own_hand(&table);
                    table.on_select(&hand);
                    table.on_flip(1, true)?
                };
                if let Some(sequence) = sequence {
                    // Another seat's update may land between steps.
                    let other = tables[(actor + 1) % tables.len()].lock().pump()?;
                    tracing::trace!(round, actor, other, "flip started");
                    match run_flip(Arc::clone(&tables[actor]), sequence).await? {
                        FlipStep::Cancelled => stats.cancelled_flips += 1,
                        _ => stats.flips += 1,
                    }
                }
                stats.gestures += 1;
            }
            Gesture::Deal => {
                tables[actor].lock().deal(DealKind::Hands)?;
                stats.deals += 1;
                tracing::debug!(round, actor, "dealt");
            }
        }

        pump_all(&tables)?;
        for (i, table) in tables.iter().enumerate() {
            let table = table.lock();
            table
                .board()
                .check_invariants()
                .map_err(|violation| SimulationError::Invariant { table: i, violation })?;
            if table.is_holding() {
                return Err(SimulationError::StuckClaim { table: i });
            }
        }
    }

    check_convergence(&hub, &tables)?;

    for table in &tables {
        let table = table.lock();
        let sync = table.sync_stats();
        stats.entries_sent += sync.entries_sent;
        stats.entries_received += sync.entries_received;
    }
    stats.hub_version = hub.version();
    stats.total_time = start.elapsed();
    Ok(stats)
}

/// Pick up `thing` where it lies and release it at `to`.
///
/// Returns whether the gesture ended in a drop.
fn drag(table: &mut SimTable, thing: ThingIndex, to: Vec3) -> Result<bool, SimulationError> {
    let from = table.board().place_of(thing).position;
    table.on_move(Some(from))?;
    table.on_hover(Some(thing));
    if !table.on_drag_start()? {
        return Ok(false);
    }
    table.on_move(Some(to))?;
    let dropped = table.can_drop();
    table.on_drag_end()?;
    Ok(dropped)
}

fn own_hand(table: &SimTable) -> Vec<ThingIndex> {
    let Some(seat) = table.seat() else {
        return Vec::new();
    };
    let prefix = format!("hand.{}.", seat.0);
    let board = table.board();
    (0..board.things().len())
        .map(ThingIndex)
        .filter(|&t| board.slot_of(t).name().starts_with(&prefix))
        .collect()
}

fn pump_all(tables: &[Arc<Mutex<SimTable>>]) -> Result<usize, SimulationError> {
    let mut total = 0;
    for table in tables {
        total += table.lock().pump()?;
    }
    Ok(total)
}

fn check_convergence(
    hub: &MemoryHub,
    tables: &[Arc<Mutex<SimTable>>],
) -> Result<(), SimulationError> {
    let snapshot = hub.snapshot();
    for (i, table) in tables.iter().enumerate() {
        let table = table.lock();
        for (&thing, info) in &snapshot {
            if SyncBridge::describe(table.board(), thing) != *info {
                return Err(SimulationError::Diverged { table: i, thing });
            }
        }
    }
    tracing::info!(things = snapshot.len(), tables = tables.len(), "replicas converged");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_short_session_converges() {
        let stats = run(SimulationConfig {
            seats: 3,
            rounds: 60,
            seed: 5,
            flip_delay_ms: 10,
        })
        .await
        .unwrap();

        assert_eq!(stats.tables, 3);
        assert!(stats.hub_version > 0);
        assert!(stats.entries_sent > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spectators_only_watch() {
        let stats = run(SimulationConfig {
            seats: 6,
            rounds: 20,
            seed: 9,
            flip_delay_ms: 10,
        })
        .await
        .unwrap();

        assert_eq!(stats.tables, 6);
    }
}
