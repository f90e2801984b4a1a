//! Roll batch orchestration: throw, watch for settlement, time out.
//!
//! The orchestrator is an explicit state machine driven by the caller's
//! own simulation loop: after each `PhysicsWorld::step` the caller calls
//! [`RollOrchestrator::advance`] with the same dice and the step's `dt`.
//! Time is whatever the caller feeds in, so settlement and timeout are
//! deterministically testable with synthetic steps.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::Rng;

use dicebox_physics::{DieBody, PhysicsWorld};

use crate::error::RollError;

/// Observable state of the current (or most recent) roll batch.
#[derive(Debug, Clone)]
pub enum BatchStatus {
    /// No batch in flight.
    Idle,
    /// Batch started; dice have just been released.
    Throwing,
    /// Dice are in motion; waiting for every die to settle.
    Settling,
    /// Every die settled. Carries the per-die outcomes.
    Settled(Vec<DieRollOutcome>),
    /// The timeout elapsed before all dice settled. No result is
    /// invented; the dice are simply still in motion.
    TimedOut,
    /// A die's body disappeared or the dice slice changed under the
    /// batch.
    Failed,
}

/// Result record for one settled die.
#[derive(Debug, Clone)]
pub struct DieRollOutcome {
    /// Index of the die within the batch slice.
    pub die_index: usize,
    /// The value physics landed on — never the advisory target.
    pub value: u32,
    /// Simulated seconds from batch start until this die settled.
    pub settle_duration_seconds: f32,
    /// Position at settlement.
    pub final_position: Point3<f32>,
    /// Orientation at settlement.
    pub final_rotation: UnitQuaternion<f32>,
}

struct ActiveBatch {
    die_count: usize,
    timeout: f32,
    elapsed: f32,
    /// Simulated time at which each die first settled.
    settled_at: Vec<Option<f32>>,
    /// Velocity snapshot taken at batch start, for collaborators that
    /// replay a throw.
    start_vectors: Vec<(Vector3<f32>, Vector3<f32>)>,
}

/// Drives one batch of dice from thrown to settled.
///
/// Single-flight: at most one batch may be `Throwing`/`Settling` at a
/// time; a second `begin` fails with [`RollError::ConcurrentThrow`]
/// before touching any world or die state. Every exit path — settled,
/// timed out, failed — clears `simulation_running` on all dice in the
/// batch.
pub struct RollOrchestrator {
    batch: Option<ActiveBatch>,
}

impl RollOrchestrator {
    /// A new, idle orchestrator.
    pub fn new() -> Self {
        RollOrchestrator { batch: None }
    }

    /// Whether a batch is currently in flight.
    pub fn is_active(&self) -> bool {
        self.batch.is_some()
    }

    /// Velocity snapshot taken when the active batch started.
    pub fn start_vectors(&self) -> Option<&[(Vector3<f32>, Vector3<f32>)]> {
        self.batch.as_ref().map(|b| b.start_vectors.as_slice())
    }

    /// Start watching `dice` for settlement.
    ///
    /// Marks every die `simulation_running`, snapshots its vectors, and
    /// zeroes its stable-step counter. The dice themselves must already
    /// have been thrown (see [`roll_random`](Self::roll_random)).
    pub fn begin(
        &mut self,
        world: &PhysicsWorld,
        dice: &mut [DieBody],
        timeout: f32,
    ) -> Result<(), RollError> {
        if self.batch.is_some() {
            return Err(RollError::ConcurrentThrow);
        }

        let mut start_vectors = Vec::with_capacity(dice.len());
        for die in dice.iter() {
            start_vectors.push(die.vectors(world)?);
        }
        for die in dice.iter_mut() {
            die.set_simulation_running(true);
        }

        self.batch = Some(ActiveBatch {
            die_count: dice.len(),
            timeout,
            elapsed: 0.0,
            settled_at: vec![None; dice.len()],
            start_vectors,
        });
        log::debug!("roll batch started: {} dice, timeout {timeout}s", dice.len());
        Ok(())
    }

    /// Run the per-step stability check after a simulation step.
    ///
    /// All dice in the batch were advanced by the same step before this
    /// is called, so the aggregate settlement decision sees a consistent
    /// world. The batch settles only when *every* die has held the
    /// stability condition long enough; one lively die holds up the
    /// whole batch.
    pub fn advance(
        &mut self,
        world: &PhysicsWorld,
        dice: &mut [DieBody],
        dt: f32,
    ) -> BatchStatus {
        let die_count = match self.batch.as_ref() {
            Some(batch) => batch.die_count,
            None => return BatchStatus::Idle,
        };
        if dice.len() != die_count {
            log::warn!(
                "roll batch saw {} dice but was started with {die_count}",
                dice.len()
            );
            self.release(dice);
            return BatchStatus::Failed;
        }

        let stability = world.stability();
        let mut all_settled = true;
        let mut lost = false;
        let mut elapsed = 0.0;
        let mut timeout = 0.0;
        if let Some(batch) = self.batch.as_mut() {
            batch.elapsed += dt;
            elapsed = batch.elapsed;
            timeout = batch.timeout;
            for (i, die) in dice.iter_mut().enumerate() {
                match die.observe_step(world, &stability) {
                    Ok(true) => {
                        batch.settled_at[i].get_or_insert(elapsed);
                    }
                    Ok(false) => all_settled = false,
                    Err(e) => {
                        log::warn!("roll batch lost die {i}: {e}");
                        lost = true;
                        break;
                    }
                }
            }
        }

        if lost {
            self.release(dice);
            return BatchStatus::Failed;
        }

        if all_settled {
            return match self.collect_outcomes(world, dice) {
                Ok(outcomes) => BatchStatus::Settled(outcomes),
                Err(e) => {
                    log::warn!("roll batch could not read outcomes: {e}");
                    self.release(dice);
                    BatchStatus::Failed
                }
            };
        }

        if elapsed >= timeout {
            log::debug!("roll batch timed out after {elapsed}s");
            self.release(dice);
            return BatchStatus::TimedOut;
        }

        if elapsed <= dt {
            BatchStatus::Throwing
        } else {
            BatchStatus::Settling
        }
    }

    /// Throw a single die toward an advisory target value, then begin a
    /// one-die batch. The target only steers logging and future
    /// presentation; the physical outcome is whatever the die lands on.
    pub fn roll_single<R: Rng + ?Sized>(
        &mut self,
        world: &mut PhysicsWorld,
        die: &mut DieBody,
        target: u32,
        timeout: f32,
        rng: &mut R,
    ) -> Result<(), RollError> {
        if self.batch.is_some() {
            return Err(RollError::ConcurrentThrow);
        }
        log::debug!("rolling one {} with advisory target {target}", die.kind());
        let force = default_throw_force(rng);
        die.throw(world, rng, force, None)?;
        self.begin(world, std::slice::from_mut(die), timeout)
    }

    /// Throw every die with a uniformly random advisory target, then
    /// begin the batch.
    pub fn roll_random<R: Rng + ?Sized>(
        &mut self,
        world: &mut PhysicsWorld,
        dice: &mut [DieBody],
        timeout: f32,
        rng: &mut R,
    ) -> Result<(), RollError> {
        if self.batch.is_some() {
            return Err(RollError::ConcurrentThrow);
        }
        for die in dice.iter_mut() {
            let target = rng.gen_range(1..=die.value_count());
            log::debug!("rolling {} with advisory target {target}", die.kind());
            let force = default_throw_force(rng);
            die.throw(world, rng, force, None)?;
        }
        self.begin(world, dice, timeout)
    }

    /// Read final values and poses, then release the batch.
    fn collect_outcomes(
        &mut self,
        world: &PhysicsWorld,
        dice: &mut [DieBody],
    ) -> Result<Vec<DieRollOutcome>, RollError> {
        let settled_at: Vec<f32> = match self.batch.take() {
            Some(batch) => {
                let fallback = batch.elapsed;
                batch
                    .settled_at
                    .iter()
                    .map(|t| t.unwrap_or(fallback))
                    .collect()
            }
            None => vec![0.0; dice.len()],
        };

        let mut outcomes = Vec::with_capacity(dice.len());
        for (i, die) in dice.iter().enumerate() {
            outcomes.push(DieRollOutcome {
                die_index: i,
                value: die.upper_value(world)?,
                settle_duration_seconds: settled_at[i],
                final_position: die.position(world)?,
                final_rotation: die.rotation(world)?,
            });
        }
        self.release(dice);
        Ok(outcomes)
    }

    /// Clear `simulation_running` on every die and drop the batch. Runs
    /// on every exit path.
    fn release(&mut self, dice: &mut [DieBody]) {
        for die in dice.iter_mut() {
            die.set_simulation_running(false);
        }
        self.batch = None;
    }
}

impl Default for RollOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Randomized throw strength for the convenience wrappers.
fn default_throw_force<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(2.0..4.0)
}
