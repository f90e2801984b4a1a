//! Contact-material constants for the three collision pairs.
//!
//! The simulation distinguishes die–floor, die–barrier, and die–die
//! contacts. Rapier combines per-collider coefficients rather than
//! holding per-pair material tables, so the pairs are realized with the
//! `Max` combine rule on both coefficients:
//!
//! | pair        | friction | restitution |
//! |-------------|----------|-------------|
//! | die–floor   | 0.01     | 0.5         |
//! | die–barrier | 0.0      | 1.0         |
//! | die–die     | 0.0      | 0.5         |
//!
//! `max(DIE_FRICTION, FLOOR_FRICTION) = 0.01`, `max(DIE_RESTITUTION,
//! BARRIER_RESTITUTION) = 1.0`, and so on for every pair, so the table
//! above falls out exactly. These are fixed physical constants of the
//! simulation, not tunables.

/// Friction contributed by a die collider.
pub const DIE_FRICTION: f32 = 0.0;
/// Restitution contributed by a die collider.
pub const DIE_RESTITUTION: f32 = 0.5;

/// Friction contributed by the floor.
pub const FLOOR_FRICTION: f32 = 0.01;
/// Restitution contributed by the floor.
pub const FLOOR_RESTITUTION: f32 = 0.5;

/// Friction contributed by a barrier wall.
pub const BARRIER_FRICTION: f32 = 0.0;
/// Restitution contributed by a barrier wall. Dice bounce hard off the
/// tray walls so they return toward the playing surface.
pub const BARRIER_RESTITUTION: f32 = 1.0;
