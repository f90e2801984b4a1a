#![warn(missing_docs)]

//! dicebox — physically simulated polyhedral dice.
//!
//! Validated die geometry, Rapier-backed rigid-body rolls with a
//! poll-driven settlement state machine, expression-based roll
//! processing with virtualization for huge rolls, and per-room canvas
//! state with event fan-out.
//!
//! The component crates are re-exported here; [`DiceTable`] wires the
//! common ones together for embedders that just want to roll dice.
//!
//! # Example
//!
//! ```rust,no_run
//! use dicebox::{DiceTable, DieKind, BatchStatus};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut table = DiceTable::new(Default::default(), Default::default()).unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! table.spawn(DieKind::D6).unwrap();
//! table.spawn(DieKind::D20).unwrap();
//! table.roll_all(20.0, &mut rng).unwrap();
//!
//! let outcomes = loop {
//!     match table.tick(1.0 / 60.0).unwrap() {
//!         BatchStatus::Settled(outcomes) => break outcomes,
//!         BatchStatus::TimedOut => panic!("dice never settled"),
//!         _ => {}
//!     }
//! };
//! assert_eq!(outcomes.len(), 2);
//! ```

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

pub use dicebox_canvas::{
    CanvasDiceState, CanvasEvent, CanvasEventType, CanvasStateManager, DiceLifecycle,
    SubscriptionId,
};
pub use dicebox_geometry::{
    DieGeometry, DieKind, FaceReadingConvention, GeometryCatalog, GeometryError,
};
pub use dicebox_physics::{
    DieBody, DieBodyOptions, PhysicsError, PhysicsWorld, StabilityConfig, WorldConfig,
};
pub use dicebox_roll::{
    parse_expression, BatchStatus, CanvasData, DiceRollDescriptor, DieRollOutcome, RollConfig,
    RollConfigUpdate, RollError, RollOrchestrator, RollProcessor, RollRequest, RollResult,
    VirtualStrategy,
};

/// Wire-level vector type used by descriptors and canvas state.
pub use dicebox_roll::Vec3;

/// Errors surfaced by the [`DiceTable`] convenience wiring.
#[derive(Debug, Error)]
pub enum TableError {
    /// A geometry table failed validation at startup.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// A physics operation failed.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    /// A roll operation failed.
    #[error(transparent)]
    Roll(#[from] RollError),
}

/// A ready-to-use dice table: validated catalog, initialized world,
/// processor, and orchestrator in one handle.
///
/// The table owns its dice. Spawned dice stay on the table between
/// rolls until [`clear`](Self::clear) disposes them. Stepping is still
/// caller-driven: call [`tick`](Self::tick) from your own loop until the
/// batch reaches a terminal [`BatchStatus`].
pub struct DiceTable {
    catalog: GeometryCatalog,
    world: PhysicsWorld,
    processor: RollProcessor,
    orchestrator: RollOrchestrator,
    dice: Vec<DieBody>,
}

impl DiceTable {
    /// Validate all six geometry tables and initialize the physics
    /// world. Fails fast on a malformed table.
    pub fn new(roll_config: RollConfig, world_config: WorldConfig) -> Result<Self, TableError> {
        let catalog = GeometryCatalog::new()?;
        let mut world = PhysicsWorld::new();
        world.init(world_config)?;
        Ok(DiceTable {
            catalog,
            world,
            processor: RollProcessor::new(roll_config),
            orchestrator: RollOrchestrator::new(),
            dice: Vec::new(),
        })
    }

    /// Add a die of `kind` at the default spawn pose. Returns its index
    /// on the table.
    pub fn spawn(&mut self, kind: DieKind) -> Result<usize, TableError> {
        self.spawn_at(kind, DieBodyOptions::default())
    }

    /// Add a die of `kind` with an explicit spawn pose.
    pub fn spawn_at(
        &mut self,
        kind: DieKind,
        options: DieBodyOptions,
    ) -> Result<usize, TableError> {
        let geometry = Arc::new(self.catalog.get(kind).clone());
        let die = DieBody::create(&mut self.world, geometry, options)?;
        self.dice.push(die);
        Ok(self.dice.len() - 1)
    }

    /// Throw every die on the table and start watching for settlement.
    pub fn roll_all<R: Rng + ?Sized>(
        &mut self,
        timeout: f32,
        rng: &mut R,
    ) -> Result<(), TableError> {
        self.orchestrator
            .roll_random(&mut self.world, &mut self.dice, timeout, rng)?;
        Ok(())
    }

    /// Advance the simulation one step and poll the batch.
    pub fn tick(&mut self, dt: f32) -> Result<BatchStatus, TableError> {
        self.world.step(dt)?;
        Ok(self.orchestrator.advance(&self.world, &mut self.dice, dt))
    }

    /// Step at a fixed `dt` until the active batch reaches a terminal
    /// state. For headless use; interactive embedders drive
    /// [`tick`](Self::tick) from their own loop instead.
    pub fn run_until_settled(&mut self, dt: f32) -> Result<Vec<DieRollOutcome>, TableError> {
        let mut elapsed = 0.0f32;
        loop {
            elapsed += dt;
            match self.tick(dt)? {
                BatchStatus::Settled(outcomes) => return Ok(outcomes),
                BatchStatus::Idle => return Ok(Vec::new()),
                BatchStatus::TimedOut => {
                    return Err(RollError::TimedOut {
                        elapsed_seconds: elapsed,
                    }
                    .into())
                }
                BatchStatus::Failed => return Err(PhysicsError::BodyNotFound.into()),
                BatchStatus::Throwing | BatchStatus::Settling => {}
            }
        }
    }

    /// Resolve a dice expression without touching the table's physical
    /// dice: parse, draw outcomes, classify, and lay out descriptors.
    pub fn process_roll(&self, expression: &str) -> RollResult {
        self.processor.process_roll(expression)
    }

    /// The dice currently on the table.
    pub fn dice(&self) -> &[DieBody] {
        &self.dice
    }

    /// Shared access to the physics world, for pose reads.
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// The validated geometry catalog.
    pub fn catalog(&self) -> &GeometryCatalog {
        &self.catalog
    }

    /// The roll processor, for config reads.
    pub fn processor(&self) -> &RollProcessor {
        &self.processor
    }

    /// Apply a partial configuration update to the roll processor.
    pub fn update_config(&mut self, patch: RollConfigUpdate) {
        self.processor.update_config(patch);
    }

    /// Dispose every die on the table. The world itself stays
    /// initialized and can take new spawns immediately.
    pub fn clear(&mut self) {
        for die in &mut self.dice {
            die.dispose(&mut self.world);
        }
        self.dice.clear();
        log::debug!("table cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawn_roll_settle_round_trip() {
        let mut table = DiceTable::new(Default::default(), Default::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        // Spread the spawn points so the bodies start contact-free.
        for (i, kind) in [DieKind::D6, DieKind::D8, DieKind::D20].into_iter().enumerate() {
            let options = DieBodyOptions {
                position: nalgebra::Point3::new(i as f32 * 1.5 - 1.5, 0.0, 2.0),
                ..Default::default()
            };
            table.spawn_at(kind, options).unwrap();
        }
        assert_eq!(table.world().body_count(), 3);

        table.roll_all(60.0, &mut rng).unwrap();
        let outcomes = table
            .run_until_settled(1.0 / 60.0)
            .expect("dice settled before the timeout");
        assert_eq!(outcomes.len(), 3);
        for (outcome, max) in outcomes.iter().zip([6u32, 8, 20]) {
            assert!((1..=max).contains(&outcome.value));
        }
        // Settled dice sit inside the arena near the floor.
        for outcome in &outcomes {
            assert!(outcome.final_position.x.abs() < 4.5);
            assert!(outcome.final_position.y.abs() < 4.5);
            assert!(outcome.final_position.z > 0.0);
            assert!(outcome.final_position.z < 2.0);
        }
    }

    #[test]
    fn clear_disposes_and_table_remains_usable() {
        let mut table = DiceTable::new(Default::default(), Default::default()).unwrap();
        table.spawn(DieKind::D12).unwrap();
        table.clear();
        assert_eq!(table.world().body_count(), 0);
        assert!(table.dice().is_empty());
        table.spawn(DieKind::D4).unwrap();
        assert_eq!(table.world().body_count(), 1);
    }

    #[test]
    fn process_roll_leaves_physical_dice_alone() {
        let mut table = DiceTable::new(Default::default(), Default::default()).unwrap();
        table.spawn(DieKind::D6).unwrap();
        let result = table.process_roll("2d6");
        assert_eq!(result.rolls.len(), 2);
        assert_eq!(table.world().body_count(), 1);
    }
}
