//! A single simulated die: collision shape, pose, value reading.

use std::sync::Arc;

use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};
use rand::Rng;
use rapier3d::dynamics::{CoefficientCombineRule, RigidBodyBuilder, RigidBodyHandle};
use rapier3d::geometry::{ColliderBuilder, ColliderHandle, SharedShape};

use dicebox_geometry::{DieGeometry, DieKind, FaceReadingConvention};

use crate::error::PhysicsError;
use crate::materials;
use crate::world::{PhysicsWorld, StabilityConfig};

/// Geometry-table masses are listed in grams.
const GRAMS_TO_KG: f32 = 1.0e-3;

/// Spawn options for a die body.
#[derive(Debug, Clone, Copy)]
pub struct DieBodyOptions {
    /// Initial position of the die's center.
    pub position: Point3<f32>,
    /// Initial orientation.
    pub rotation: UnitQuaternion<f32>,
}

impl Default for DieBodyOptions {
    fn default() -> Self {
        DieBodyOptions {
            position: Point3::new(0.0, 0.0, 2.0),
            rotation: UnitQuaternion::identity(),
        }
    }
}

/// One simulated die.
///
/// The rigid body and collider live in the [`PhysicsWorld`]; the die
/// keeps handles plus the per-roll bookkeeping (running flag, consecutive
/// stable-step counter). A die is owned exclusively by the roll that
/// created it until disposed.
pub struct DieBody {
    geometry: Arc<DieGeometry>,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    simulation_running: bool,
    stable_steps: u32,
    disposed: bool,
}

impl DieBody {
    /// Build the physical shape for `geometry` and register it with the
    /// world: a box for the six-sided die, otherwise a convex polyhedron
    /// from the scaled vertex list. If hull construction fails the die
    /// falls back to a bounding-sphere approximation; the simulation
    /// continues in a degraded but functional state.
    pub fn create(
        world: &mut PhysicsWorld,
        geometry: Arc<DieGeometry>,
        options: DieBodyOptions,
    ) -> Result<DieBody, PhysicsError> {
        world.ensure_initialized()?;

        let shape = build_shape(&geometry)?;
        let body = RigidBodyBuilder::dynamic()
            .position(Isometry3::from_parts(
                Translation3::from(options.position.coords),
                options.rotation,
            ))
            .ccd_enabled(true)
            .build();
        let body = world.bodies.insert(body);

        let collider = ColliderBuilder::new(shape)
            .mass(geometry.mass * GRAMS_TO_KG)
            .friction(materials::DIE_FRICTION)
            .restitution(materials::DIE_RESTITUTION)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .build();
        let collider = world.colliders.insert_with_parent(collider, body, &mut world.bodies);

        Ok(DieBody {
            geometry,
            body,
            collider,
            simulation_running: false,
            stable_steps: 0,
            disposed: false,
        })
    }

    /// The kind of die this body simulates.
    pub fn kind(&self) -> DieKind {
        self.geometry.kind
    }

    /// Number of values this die can show.
    pub fn value_count(&self) -> u32 {
        self.geometry.kind.value_count()
    }

    /// The shared geometry table.
    pub fn geometry(&self) -> &DieGeometry {
        &self.geometry
    }

    /// Collider handle, for collaborators that attach render state.
    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    /// Whether this die is part of an in-flight roll batch.
    pub fn simulation_running(&self) -> bool {
        self.simulation_running
    }

    /// Mark or clear batch membership. Owned by the roll orchestration
    /// layer.
    pub fn set_simulation_running(&mut self, running: bool) {
        self.simulation_running = running;
        if running {
            self.stable_steps = 0;
        }
    }

    /// Current center position.
    pub fn position(&self, world: &PhysicsWorld) -> Result<Point3<f32>, PhysicsError> {
        let body = world.bodies.get(self.body).ok_or(PhysicsError::BodyNotFound)?;
        Ok(Point3::from(body.position().translation.vector))
    }

    /// Current orientation.
    pub fn rotation(&self, world: &PhysicsWorld) -> Result<UnitQuaternion<f32>, PhysicsError> {
        let body = world.bodies.get(self.body).ok_or(PhysicsError::BodyNotFound)?;
        Ok(body.position().rotation)
    }

    /// Move the die and wake it so it re-enters the simulation.
    pub fn set_position(
        &self,
        world: &mut PhysicsWorld,
        position: Point3<f32>,
    ) -> Result<(), PhysicsError> {
        world.ensure_initialized()?;
        let body = world
            .bodies
            .get_mut(self.body)
            .ok_or(PhysicsError::BodyNotFound)?;
        let mut iso = *body.position();
        iso.translation = Translation3::from(position.coords);
        body.set_position(iso, true);
        Ok(())
    }

    /// Reorient the die and wake it.
    pub fn set_rotation(
        &self,
        world: &mut PhysicsWorld,
        rotation: UnitQuaternion<f32>,
    ) -> Result<(), PhysicsError> {
        world.ensure_initialized()?;
        let body = world
            .bodies
            .get_mut(self.body)
            .ok_or(PhysicsError::BodyNotFound)?;
        let mut iso = *body.position();
        iso.rotation = rotation;
        body.set_position(iso, true);
        Ok(())
    }

    /// Set linear and angular velocity and wake the die.
    pub fn set_vectors(
        &self,
        world: &mut PhysicsWorld,
        linvel: Vector3<f32>,
        angvel: Vector3<f32>,
    ) -> Result<(), PhysicsError> {
        world.ensure_initialized()?;
        let body = world
            .bodies
            .get_mut(self.body)
            .ok_or(PhysicsError::BodyNotFound)?;
        body.set_linvel(linvel, true);
        body.set_angvel(angvel, true);
        Ok(())
    }

    /// Current linear and angular velocity.
    pub fn vectors(
        &self,
        world: &PhysicsWorld,
    ) -> Result<(Vector3<f32>, Vector3<f32>), PhysicsError> {
        let body = world.bodies.get(self.body).ok_or(PhysicsError::BodyNotFound)?;
        Ok((*body.linvel(), *body.angvel()))
    }

    /// Read the value the die currently shows.
    ///
    /// The world "up" direction — "down" for the d4, which is read from
    /// the face against the floor — is transformed into the die's local
    /// frame through the inverse of its orientation; the shown value is
    /// the valued face whose normal aligns best with it. Ties break to
    /// the first face in table order, so identical orientations always
    /// read identically.
    pub fn upper_value(&self, world: &PhysicsWorld) -> Result<u32, PhysicsError> {
        let rotation = self.rotation(world)?;
        let local_reference = rotation.inverse_transform_vector(&self.reading_direction());

        let mut best_value = 0u32;
        let mut best_dot = f32::NEG_INFINITY;
        for (normal, &value) in self
            .geometry
            .face_normals
            .iter()
            .zip(&self.geometry.face_values)
        {
            if value == 0 {
                continue;
            }
            let dot = normal.dot(&local_reference);
            if dot > best_dot {
                best_dot = dot;
                best_value = value;
            }
        }
        Ok(best_value)
    }

    /// Rotate the die so the face showing `target` points along the
    /// reading direction, then zero its velocities.
    pub fn shift_upper_value(
        &mut self,
        world: &mut PhysicsWorld,
        target: u32,
    ) -> Result<(), PhysicsError> {
        let max = self.value_count();
        if target < 1 || target > max {
            return Err(PhysicsError::InvalidValue { value: target, max });
        }

        let face = self.geometry.value_to_face[target as usize - 1];
        let rotation = self.rotation(world)?;
        let world_normal = rotation * self.geometry.face_normals[face].into_inner();
        let desired = self.reading_direction();

        let correction = UnitQuaternion::rotation_between(&world_normal, &desired)
            .unwrap_or_else(|| {
                // Anti-parallel: rotate half a turn about any axis
                // perpendicular to the face normal.
                let axis = perpendicular_axis(&world_normal);
                UnitQuaternion::from_axis_angle(&axis, std::f32::consts::PI)
            });

        self.set_rotation(world, correction * rotation)?;
        self.set_vectors(world, Vector3::zeros(), Vector3::zeros())?;
        self.stable_steps = 0;
        Ok(())
    }

    /// Throw the die: a randomized linear and angular impulse scaled by
    /// `force` and the kind's throw tuning. The d4 is thrown gently
    /// because of its sharp vertices; the d20 tolerates stronger throws.
    pub fn throw<R: Rng + ?Sized>(
        &mut self,
        world: &mut PhysicsWorld,
        rng: &mut R,
        force: f32,
        start_position: Option<Point3<f32>>,
    ) -> Result<(), PhysicsError> {
        if let Some(position) = start_position {
            self.set_position(world, position)?;
        }

        let boost = throw_multiplier(self.kind());
        let position = self.position(world)?;
        // Aim loosely at the arena center so throws from the spawn grid
        // converge on the playing surface.
        let linvel = Vector3::new(
            (rng.gen_range(-1.5..1.5) - position.x * 0.4) * force * boost,
            (rng.gen_range(-1.5..1.5) - position.y * 0.4) * force * boost,
            rng.gen_range(-0.5..0.0) * force,
        );
        let angvel = Vector3::new(
            rng.gen_range(-8.0..8.0) * boost,
            rng.gen_range(-8.0..8.0) * boost,
            rng.gen_range(-8.0..8.0) * boost,
        );
        self.set_vectors(world, linvel, angvel)?;
        self.stable_steps = 0;
        Ok(())
    }

    /// Whether the die is momentarily at rest this step.
    pub fn is_stable(
        &self,
        world: &PhysicsWorld,
        stability: &StabilityConfig,
    ) -> Result<bool, PhysicsError> {
        let (linvel, angvel) = self.vectors(world)?;
        let threshold = stability.velocity_threshold;
        Ok(linvel.iter().chain(angvel.iter()).all(|v| v.abs() < threshold))
    }

    /// Update the consecutive-stable-step counter after a simulation
    /// step. Returns true once the die has settled. Any lively step
    /// resets the counter to zero.
    pub fn observe_step(
        &mut self,
        world: &PhysicsWorld,
        stability: &StabilityConfig,
    ) -> Result<bool, PhysicsError> {
        if self.is_stable(world, stability)? {
            self.stable_steps += 1;
        } else {
            self.stable_steps = 0;
        }
        Ok(self.is_finished(stability))
    }

    /// Whether the stability condition has held long enough.
    pub fn is_finished(&self, stability: &StabilityConfig) -> bool {
        self.stable_steps >= stability.required_stable_steps
    }

    /// Consecutive stable steps observed so far.
    pub fn stable_steps(&self) -> u32 {
        self.stable_steps
    }

    /// Remove the die's body and collider from the world. Idempotent.
    pub fn dispose(&mut self, world: &mut PhysicsWorld) {
        if self.disposed {
            return;
        }
        world.remove_body(self.body);
        self.simulation_running = false;
        self.disposed = true;
    }

    /// World-frame direction a settled die is read along.
    fn reading_direction(&self) -> Vector3<f32> {
        match self.geometry.kind.reading_convention() {
            FaceReadingConvention::Upward => Vector3::z(),
            FaceReadingConvention::Downward => -Vector3::z(),
        }
    }
}

/// Box for the cube, convex hull otherwise, bounding sphere as the
/// logged fallback for degenerate hull input. Errors only when even the
/// fallback sphere would have no extent.
fn build_shape(geometry: &DieGeometry) -> Result<SharedShape, PhysicsError> {
    if geometry.kind == DieKind::D6 {
        let half = geometry.scale_factor;
        return Ok(SharedShape::cuboid(half, half, half));
    }

    let points = geometry.scaled_vertices();
    match SharedShape::convex_hull(&points) {
        Some(hull) => Ok(hull),
        None => {
            let radius = points
                .iter()
                .map(|p| p.coords.norm())
                .fold(0.0f32, f32::max)
                .max(geometry.scale_factor);
            if radius <= 0.0 || !radius.is_finite() {
                return Err(PhysicsError::ShapeConstruction {
                    kind: geometry.kind,
                    reason: "no usable vertex extent for a fallback sphere".to_string(),
                });
            }
            log::warn!(
                "convex hull construction failed for {}; falling back to a sphere of radius {}",
                geometry.kind,
                radius
            );
            Ok(SharedShape::ball(radius))
        }
    }
}

/// Per-kind throw scaling.
fn throw_multiplier(kind: DieKind) -> f32 {
    match kind {
        DieKind::D4 => 0.6,
        DieKind::D20 => 1.2,
        _ => 1.0,
    }
}

/// Any unit vector perpendicular to `v`.
fn perpendicular_axis(v: &Vector3<f32>) -> Unit<Vector3<f32>> {
    let candidate = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldConfig;
    use dicebox_geometry::GeometryCatalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.init(WorldConfig::default()).unwrap();
        world
    }

    fn spawn(world: &mut PhysicsWorld, kind: DieKind) -> DieBody {
        let catalog = GeometryCatalog::new().unwrap();
        DieBody::create(
            world,
            Arc::new(catalog.get(kind).clone()),
            DieBodyOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn create_requires_initialized_world() {
        let catalog = GeometryCatalog::new().unwrap();
        let mut world = PhysicsWorld::new();
        let result = DieBody::create(
            &mut world,
            Arc::new(catalog.get(DieKind::D6).clone()),
            DieBodyOptions::default(),
        );
        assert!(matches!(result, Err(PhysicsError::UninitializedWorld)));
    }

    #[test]
    fn upper_value_is_pure_in_orientation() {
        let mut world = world();
        let die = spawn(&mut world, DieKind::D20);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let q = UnitQuaternion::from_euler_angles(
                rng.gen_range(-3.14..3.14),
                rng.gen_range(-3.14..3.14),
                rng.gen_range(-3.14..3.14),
            );
            die.set_rotation(&mut world, q).unwrap();
            let first = die.upper_value(&world).unwrap();
            let second = die.upper_value(&world).unwrap();
            assert_eq!(first, second);
            assert!((1..=20).contains(&first));
        }
    }

    #[test]
    fn shift_then_read_round_trips_every_value() {
        let mut world = world();
        for kind in DieKind::ALL {
            let mut die = spawn(&mut world, kind);
            for target in 1..=kind.value_count() {
                die.shift_upper_value(&mut world, target).unwrap();
                assert_eq!(die.upper_value(&world).unwrap(), target, "{kind}");
                let (linvel, angvel) = die.vectors(&world).unwrap();
                assert_eq!(linvel, Vector3::zeros());
                assert_eq!(angvel, Vector3::zeros());
            }
            die.dispose(&mut world);
        }
    }

    #[test]
    fn shift_handles_antiparallel_start() {
        let mut world = world();
        let mut die = spawn(&mut world, DieKind::D6);
        // Point face 4's normal straight down first, so the correction
        // is a half turn.
        die.shift_upper_value(&mut world, 4).unwrap();
        let flipped =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
                * die.rotation(&world).unwrap();
        die.set_rotation(&mut world, flipped).unwrap();
        die.shift_upper_value(&mut world, 4).unwrap();
        assert_eq!(die.upper_value(&world).unwrap(), 4);
    }

    #[test]
    fn shift_rejects_out_of_range_values() {
        let mut world = world();
        let mut die = spawn(&mut world, DieKind::D6);
        for target in [0, 7, 100] {
            assert!(matches!(
                die.shift_upper_value(&mut world, target),
                Err(PhysicsError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn stability_counter_resets_on_lively_step() {
        let mut world = world();
        let mut die = spawn(&mut world, DieKind::D6);
        let stability = StabilityConfig::default();

        // Nine stable observations are not enough.
        for _ in 0..9 {
            assert!(!die.observe_step(&world, &stability).unwrap());
        }
        assert_eq!(die.stable_steps(), 9);

        // One lively frame throws the count away.
        die.set_vectors(&mut world, Vector3::new(0.5, 0.0, 0.0), Vector3::zeros())
            .unwrap();
        assert!(!die.observe_step(&world, &stability).unwrap());
        assert_eq!(die.stable_steps(), 0);

        die.set_vectors(&mut world, Vector3::zeros(), Vector3::zeros())
            .unwrap();
        for _ in 0..10 {
            die.observe_step(&world, &stability).unwrap();
        }
        assert!(die.is_finished(&stability));
    }

    #[test]
    fn degenerate_hull_falls_back_to_sphere() {
        let mut world = world();
        let catalog = GeometryCatalog::new().unwrap();
        // Flatten every vertex onto a line so no convex hull exists.
        let mut geometry = catalog.get(DieKind::D8).clone();
        for (i, vertex) in geometry.vertices.iter_mut().enumerate() {
            *vertex = Point3::new(i as f32 * 0.1, 0.0, 0.0);
        }

        let die = DieBody::create(&mut world, Arc::new(geometry), DieBodyOptions::default())
            .expect("fallback keeps the simulation running");
        assert_eq!(world.body_count(), 1);
        let collider = world.colliders.get(die.collider()).unwrap();
        assert!(collider.shape().as_ball().is_some());
    }

    #[test]
    fn shape_with_no_extent_is_an_error() {
        let mut world = world();
        let catalog = GeometryCatalog::new().unwrap();
        // Collapse everything to the origin and zero the scale so no
        // fallback sphere radius remains.
        let mut geometry = catalog.get(DieKind::D8).clone();
        for vertex in geometry.vertices.iter_mut() {
            *vertex = Point3::origin();
        }
        geometry.scale_factor = 0.0;

        let result = DieBody::create(&mut world, Arc::new(geometry), DieBodyOptions::default());
        assert!(matches!(
            result,
            Err(PhysicsError::ShapeConstruction { kind: DieKind::D8, .. })
        ));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut world = world();
        let mut die = spawn(&mut world, DieKind::D12);
        assert_eq!(world.body_count(), 1);
        die.dispose(&mut world);
        die.dispose(&mut world);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn d4_reads_from_the_bottom_face() {
        let mut world = world();
        let mut die = spawn(&mut world, DieKind::D4);
        for target in 1..=4 {
            die.shift_upper_value(&mut world, target).unwrap();
            let rotation = die.rotation(&world).unwrap();
            let face = die.geometry().value_to_face[target as usize - 1];
            let world_normal = rotation * die.geometry().face_normals[face].into_inner();
            // The valued face points toward the floor.
            assert!(world_normal.z < -0.99);
        }
    }
}
