#![warn(missing_docs)]

//! Multi-user canvas state for dicebox.
//!
//! The [`CanvasStateManager`] is the consumer-facing boundary: it tracks
//! each room's active dice through their lifecycle (spawn, throw, settle,
//! highlight, remove) and broadcasts every transition as a
//! [`CanvasEvent`] to registered subscribers. Ownership misses and stale
//! ids are routine multi-user races and come back as `None`, never as
//! errors.
//!
//! # Example
//!
//! ```
//! use dicebox_canvas::CanvasStateManager;
//! use dicebox_roll::{DiceRollDescriptor, Vec3};
//!
//! let mut canvas = CanvasStateManager::new();
//! let descriptor = DiceRollDescriptor {
//!     canvas_id: "die-1".to_string(),
//!     dice_type: "d6".to_string(),
//!     position: Vec3::new(0.0, 0.0, 1.5),
//!     is_virtual: false,
//!     virtual_rolls: None,
//!     result: 0,
//! };
//! let id = canvas.spawn_dice("room", "alice", &descriptor);
//! canvas.throw_dice("room", &id, "alice", Vec3::new(2.0, 0.0, -1.0));
//! canvas.settle_dice("room", &id, "alice", Vec3::new(1.0, 1.0, 0.0), 4);
//! assert_eq!(canvas.events_for_room("room").len(), 3);
//! ```

mod event;
mod manager;
mod state;

pub use event::{CanvasEvent, CanvasEventType};
pub use manager::{CanvasStateManager, SubscriptionId};
pub use state::{CanvasDiceState, DiceLifecycle};
