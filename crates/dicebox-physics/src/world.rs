//! Physics world management using Rapier3d.

use nalgebra::Vector3;
use rapier3d::dynamics::{
    CCDSolver, CoefficientCombineRule, ImpulseJointSet, IntegrationParameters, IslandManager,
    MultibodyJointSet, RigidBodyHandle, RigidBodySet,
};
use rapier3d::geometry::{BroadPhaseMultiSap, ColliderBuilder, ColliderHandle, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};

use crate::error::PhysicsError;
use crate::materials;

/// Per-step stability thresholds used for settle detection.
///
/// A die is momentarily stable when every linear and angular velocity
/// component is below `velocity_threshold`; it is settled only after
/// `required_stable_steps` consecutive stable steps, since a simulated
/// bounce can stall for a single frame.
#[derive(Debug, Clone, Copy)]
pub struct StabilityConfig {
    /// Per-axis velocity magnitude below which a die counts as at rest.
    pub velocity_threshold: f32,
    /// Consecutive stable steps required before a die is settled.
    pub required_stable_steps: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        StabilityConfig {
            velocity_threshold: 0.01,
            required_stable_steps: 10,
        }
    }
}

/// Configuration for world initialization.
///
/// The world is z-up: gravity pulls toward negative z and the floor lies
/// in the z = 0 plane, matching the orientation of the geometry tables.
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    /// Gravity vector.
    pub gravity: Vector3<f32>,
    /// Half-extent of the square playing surface.
    pub arena_half_extent: f32,
    /// Height of the barrier walls around the playing surface.
    pub barrier_height: f32,
    /// Settle-detection thresholds.
    pub stability: StabilityConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            gravity: Vector3::new(0.0, 0.0, -9.82),
            arena_half_extent: 4.0,
            barrier_height: 1.5,
            stability: StabilityConfig::default(),
        }
    }
}

/// Rigid-body world for dice simulation.
///
/// Owns the Rapier component bundle, the arena colliders, and the
/// contact-material constants. Constructed unconfigured; every body
/// operation fails with [`PhysicsError::UninitializedWorld`] until
/// [`init`](PhysicsWorld::init) runs. The caller owns the lifecycle:
/// there is no ambient global world.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    gravity: Vector3<f32>,
    config: Option<WorldConfig>,
    arena: Vec<ColliderHandle>,
}

impl PhysicsWorld {
    /// Create an unconfigured world. Call [`init`](Self::init) before
    /// adding bodies or stepping.
    pub fn new() -> Self {
        PhysicsWorld {
            pipeline: PhysicsPipeline::new(),
            integration_params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            gravity: Vector3::zeros(),
            config: None,
            arena: Vec::new(),
        }
    }

    /// Configure gravity and build the arena. Fails with
    /// [`PhysicsError::AlreadyInitialized`] on a live world; use
    /// [`reset`](Self::reset) to reconfigure.
    pub fn init(&mut self, config: WorldConfig) -> Result<(), PhysicsError> {
        if self.config.is_some() {
            return Err(PhysicsError::AlreadyInitialized);
        }
        self.gravity = config.gravity;
        self.build_arena(&config);
        self.config = Some(config);
        log::debug!(
            "physics world initialized (arena half-extent {})",
            config.arena_half_extent
        );
        Ok(())
    }

    /// Drop every body, collider, and contact, then re-initialize with
    /// `config`.
    pub fn reset(&mut self, config: WorldConfig) -> Result<(), PhysicsError> {
        *self = PhysicsWorld::new();
        self.init(config)
    }

    /// Advance the simulation by one fixed step of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        self.ensure_initialized()?;
        self.integration_params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        Ok(())
    }

    /// Settle-detection thresholds this world was initialized with.
    pub fn stability(&self) -> StabilityConfig {
        self.config.map(|c| c.stability).unwrap_or_default()
    }

    /// Number of rigid bodies currently registered (dice only; the arena
    /// is built from parentless colliders).
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), PhysicsError> {
        if self.config.is_some() {
            Ok(())
        } else {
            Err(PhysicsError::UninitializedWorld)
        }
    }

    pub(crate) fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Floor plane plus four barrier walls, all static parentless
    /// colliders carrying their pair's contact material.
    fn build_arena(&mut self, config: &WorldConfig) {
        let half = config.arena_half_extent;
        let wall_h = config.barrier_height;
        let thickness = 0.1;

        let floor = ColliderBuilder::cuboid(half + thickness, half + thickness, thickness)
            .translation(Vector3::new(0.0, 0.0, -thickness))
            .friction(materials::FLOOR_FRICTION)
            .restitution(materials::FLOOR_RESTITUTION)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .build();
        self.arena.push(self.colliders.insert(floor));

        // Walls sit on the arena edge along +-x and +-y.
        let walls = [
            (Vector3::new(half, 0.0, wall_h / 2.0), (thickness, half, wall_h / 2.0)),
            (Vector3::new(-half, 0.0, wall_h / 2.0), (thickness, half, wall_h / 2.0)),
            (Vector3::new(0.0, half, wall_h / 2.0), (half, thickness, wall_h / 2.0)),
            (Vector3::new(0.0, -half, wall_h / 2.0), (half, thickness, wall_h / 2.0)),
        ];
        for (translation, (hx, hy, hz)) in walls {
            let wall = ColliderBuilder::cuboid(hx, hy, hz)
                .translation(translation)
                .friction(materials::BARRIER_FRICTION)
                .restitution(materials::BARRIER_RESTITUTION)
                .friction_combine_rule(CoefficientCombineRule::Max)
                .restitution_combine_rule(CoefficientCombineRule::Max)
                .build();
            self.arena.push(self.colliders.insert(wall));
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_requires_init() {
        let mut world = PhysicsWorld::new();
        assert!(matches!(
            world.step(1.0 / 60.0),
            Err(PhysicsError::UninitializedWorld)
        ));
    }

    #[test]
    fn double_init_is_rejected() {
        let mut world = PhysicsWorld::new();
        world.init(WorldConfig::default()).unwrap();
        assert!(matches!(
            world.init(WorldConfig::default()),
            Err(PhysicsError::AlreadyInitialized)
        ));
    }

    #[test]
    fn reset_reinitializes() {
        let mut world = PhysicsWorld::new();
        world.init(WorldConfig::default()).unwrap();
        world.reset(WorldConfig::default()).unwrap();
        assert!(world.step(1.0 / 60.0).is_ok());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn arena_has_floor_and_four_walls() {
        let mut world = PhysicsWorld::new();
        world.init(WorldConfig::default()).unwrap();
        assert_eq!(world.arena.len(), 5);
        assert_eq!(world.colliders.len(), 5);
    }
}
