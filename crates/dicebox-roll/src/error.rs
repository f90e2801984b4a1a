//! Error types for roll orchestration and processing.

use thiserror::Error;

use dicebox_physics::PhysicsError;

/// Errors that can occur while orchestrating or processing rolls.
#[derive(Error, Debug)]
pub enum RollError {
    /// A roll was requested while another batch is in flight. The caller
    /// may retry once the active batch reaches a terminal state.
    #[error("a roll batch is already in flight")]
    ConcurrentThrow,

    /// The batch failed to settle within its timeout. No result is
    /// invented; the dice are reported as still in motion.
    #[error("roll batch timed out after {elapsed_seconds:.1} s")]
    TimedOut {
        /// Seconds elapsed when the batch was abandoned.
        elapsed_seconds: f32,
    },

    /// Malformed dice expression text. `process_roll` recovers from this
    /// internally with a zero-result placeholder; the variant surfaces
    /// only from the strict parse entry point.
    #[error("invalid dice expression: {0:?}")]
    InvalidExpression(String),

    /// An underlying physics operation failed.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
