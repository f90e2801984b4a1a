#![warn(missing_docs)]

//! Rigid-body dice simulation for dicebox, built on Rapier3d.
//!
//! This crate owns the physical half of a roll: the [`PhysicsWorld`]
//! (gravity, arena, contact materials, fixed-step advance), the
//! [`DieBody`] (collision shape, pose, throw impulses, face-value
//! reading), and the stability test that decides when a die has settled.
//!
//! The world is an explicit handle owned by the caller; stepping is
//! driven by the caller's own loop. Nothing here schedules itself.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dicebox_geometry::{DieKind, GeometryCatalog};
//! use dicebox_physics::{DieBody, DieBodyOptions, PhysicsWorld, WorldConfig};
//!
//! let catalog = GeometryCatalog::new().unwrap();
//! let mut world = PhysicsWorld::new();
//! world.init(WorldConfig::default()).unwrap();
//!
//! let mut die = DieBody::create(
//!     &mut world,
//!     Arc::new(catalog.get(DieKind::D6).clone()),
//!     DieBodyOptions::default(),
//! )
//! .unwrap();
//!
//! die.shift_upper_value(&mut world, 4).unwrap();
//! assert_eq!(die.upper_value(&world).unwrap(), 4);
//! ```

mod die;
mod error;
pub mod materials;
mod world;

pub use die::{DieBody, DieBodyOptions};
pub use error::PhysicsError;
pub use world::{PhysicsWorld, StabilityConfig, WorldConfig};
