#![warn(missing_docs)]

//! Roll orchestration for dicebox: expressions in, outcomes out.
//!
//! This crate sits between the caller and the physics layer. It parses
//! dice expressions (`"3d6"`, `"d20"`), decides whether a request is
//! simulated physically or resolved virtually, lays out spawn positions
//! and proxy dice for large rolls, and drives a batch of thrown dice
//! through the settle-or-timeout state machine.
//!
//! # Example
//!
//! ```
//! use dicebox_roll::{parse_expression, RollConfig, RollProcessor};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let config = RollConfig::default();
//! let request = parse_expression("3d6", config.max_total_dice).unwrap();
//! assert_eq!(request.interpreted_expression, "3d6");
//!
//! let processor = RollProcessor::new(config);
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = processor.process_roll_with(&mut rng, "3d6");
//! assert_eq!(result.rolls.len(), 3);
//! ```

mod config;
mod descriptor;
mod error;
mod expression;
mod orchestrator;
mod processor;

pub use config::{RollConfig, RollConfigUpdate};
pub use descriptor::{CanvasData, DiceRollDescriptor, RollResult, Vec3};
pub use error::RollError;
pub use expression::{parse_expression, RollRequest};
pub use orchestrator::{BatchStatus, DieRollOutcome, RollOrchestrator};
pub use processor::{RollProcessor, VirtualStrategy};
