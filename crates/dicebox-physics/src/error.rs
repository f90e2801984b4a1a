//! Error types for the dice physics layer.

use thiserror::Error;

use dicebox_geometry::DieKind;

/// Errors that can occur while simulating dice.
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// A physics operation was attempted before `PhysicsWorld::init`.
    ///
    /// This is a programming error in the embedding code, not a
    /// user-recoverable condition.
    #[error("physics world is not initialized")]
    UninitializedWorld,

    /// `init` called on a world that is already initialized. Use `reset`
    /// to reconfigure a live world.
    #[error("physics world is already initialized")]
    AlreadyInitialized,

    /// A face value outside the die's `[1, N]` range was requested.
    #[error("value {value} is out of range for a die with {max} faces")]
    InvalidValue {
        /// The requested value.
        value: u32,
        /// Highest value the die can show.
        max: u32,
    },

    /// Convex-hull construction failed for a die's vertex set.
    ///
    /// Callers recover by falling back to a sphere approximation; this
    /// variant only crosses the API when even the fallback is impossible.
    #[error("could not build a collision shape for {kind}: {reason}")]
    ShapeConstruction {
        /// The die kind whose shape failed.
        kind: DieKind,
        /// What went wrong.
        reason: String,
    },

    /// The die's rigid body is no longer present in the world, usually
    /// because the world was reset underneath it.
    #[error("die body not found in the physics world")]
    BodyNotFound,
}
