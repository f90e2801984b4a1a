//! Expression-to-roll processing and the virtualization policy.

use rand::Rng;
use uuid::Uuid;

use crate::config::{RollConfig, RollConfigUpdate};
use crate::descriptor::{CanvasData, DiceRollDescriptor, RollResult, Vec3};
use crate::expression::parse_expression;

/// How a virtual roll is represented on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualStrategy {
    /// One proxy carrying every aggregated sub-roll.
    Single,
    /// Several proxies, each carrying a contiguous chunk of the
    /// sub-rolls.
    Cluster,
}

/// Grid spacing between spawned dice.
const GRID_SPACING: f32 = 0.6;
/// Per-axis random jitter applied to each grid cell.
const GRID_JITTER: f32 = 0.2;
/// Spawn height above the playing surface.
const SPAWN_HEIGHT: f32 = 1.5;

/// Turns dice expressions into outcomes and canvas payloads.
///
/// Decides, from configured thresholds alone, whether a roll is
/// represented by real physics bodies, a single virtual proxy, or a
/// cluster of proxies.
#[derive(Debug, Clone)]
pub struct RollProcessor {
    config: RollConfig,
}

impl RollProcessor {
    /// Processor with the given thresholds.
    pub fn new(config: RollConfig) -> Self {
        RollProcessor { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &RollConfig {
        &self.config
    }

    /// Merge a partial configuration update.
    pub fn update_config(&mut self, patch: RollConfigUpdate) {
        self.config.update(patch);
    }

    /// Process an expression with a caller-provided random source.
    ///
    /// Never fails: malformed expressions become the zero-result
    /// placeholder so chat/command surfaces can answer with a message
    /// instead of crashing.
    pub fn process_roll_with<R: Rng + ?Sized>(&self, rng: &mut R, expression: &str) -> RollResult {
        let request = match parse_expression(expression, self.config.max_total_dice) {
            Ok(request) => request,
            Err(_) => {
                log::debug!("rejecting malformed dice expression {:?}", expression);
                return RollResult::invalid();
            }
        };

        let count = request.num_dice;
        let sides = request.die_type;
        let rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=sides)).collect();
        let total: u32 = rolls.iter().sum();

        let dice_rolls = if self.should_use_virtual(count, sides) {
            match self.virtual_strategy(count, sides) {
                VirtualStrategy::Single => self.layout_single_proxy(rng, sides, &rolls),
                VirtualStrategy::Cluster => self.layout_cluster(rng, sides, &rolls),
            }
        } else {
            self.layout_physical(rng, sides, &rolls)
        };

        RollResult {
            rolls,
            result: total,
            interpreted_expression: request.interpreted_expression,
            canvas_data: CanvasData { dice_rolls },
        }
    }

    /// [`process_roll_with`](Self::process_roll_with) using thread-local
    /// randomness.
    pub fn process_roll(&self, expression: &str) -> RollResult {
        self.process_roll_with(&mut rand::thread_rng(), expression)
    }

    /// Whether a roll of `count` dice with `sides` sides must be
    /// represented virtually.
    pub fn should_use_virtual(&self, count: u32, sides: u32) -> bool {
        let config = &self.config;
        let complexity = count.saturating_mul(sides);
        count >= config.massive_roll_threshold
            || sides > config.non_standard_dice_threshold
            || !config.supports(&format!("d{}", sides))
            || count > config.max_physical_dice
            || complexity > config.complexity_threshold
            || complexity > config.virtual_dice_threshold
    }

    /// Which proxy representation a virtual roll uses.
    pub fn virtual_strategy(&self, count: u32, sides: u32) -> VirtualStrategy {
        let config = &self.config;
        let non_standard = sides > config.non_standard_dice_threshold
            || !config.supports(&format!("d{}", sides));
        if non_standard || count >= config.massive_roll_threshold {
            return VirtualStrategy::Single;
        }
        if config.enable_smart_clustering && count > config.max_physical_dice_per_type {
            return VirtualStrategy::Cluster;
        }
        VirtualStrategy::Single
    }

    /// One descriptor per die, each with its own grid position.
    fn layout_physical<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        sides: u32,
        rolls: &[u32],
    ) -> Vec<DiceRollDescriptor> {
        let positions = spawn_grid(rng, rolls.len());
        rolls
            .iter()
            .zip(positions)
            .map(|(&roll, position)| DiceRollDescriptor {
                canvas_id: Uuid::new_v4().to_string(),
                dice_type: format!("d{}", sides),
                position,
                is_virtual: false,
                virtual_rolls: None,
                result: roll,
            })
            .collect()
    }

    /// A single proxy carrying the whole roll.
    fn layout_single_proxy<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        sides: u32,
        rolls: &[u32],
    ) -> Vec<DiceRollDescriptor> {
        let positions = spawn_grid(rng, 1);
        vec![DiceRollDescriptor {
            canvas_id: Uuid::new_v4().to_string(),
            dice_type: format!("d{}", sides),
            position: positions[0],
            is_virtual: true,
            virtual_rolls: Some(rolls.to_vec()),
            result: rolls.iter().sum(),
        }]
    }

    /// `physical_dice_count` proxies, each holding a contiguous chunk of
    /// `ceil(count / physical_dice_count)` sub-rolls. Counts that divide
    /// unevenly leave the trailing chunks smaller (possibly empty); the
    /// chunking formula is kept as-is rather than rebalanced.
    fn layout_cluster<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        sides: u32,
        rolls: &[u32],
    ) -> Vec<DiceRollDescriptor> {
        let count = rolls.len() as u32;
        let physical_dice_count = self.config.max_physical_dice_per_type.min(count).max(1);
        let chunk_size = count.div_ceil(physical_dice_count) as usize;
        let positions = spawn_grid(rng, physical_dice_count as usize);

        (0..physical_dice_count as usize)
            .zip(positions)
            .map(|(i, position)| {
                let start = (i * chunk_size).min(rolls.len());
                let end = ((i + 1) * chunk_size).min(rolls.len());
                let chunk = &rolls[start..end];
                DiceRollDescriptor {
                    canvas_id: Uuid::new_v4().to_string(),
                    dice_type: format!("d{}", sides),
                    position,
                    is_virtual: true,
                    virtual_rolls: Some(chunk.to_vec()),
                    result: chunk.iter().sum(),
                }
            })
            .collect()
    }
}

impl Default for RollProcessor {
    fn default() -> Self {
        RollProcessor::new(RollConfig::default())
    }
}

/// Centered square grid of spawn positions with per-axis jitter, at a
/// fixed height above the playing surface.
fn spawn_grid<R: Rng + ?Sized>(rng: &mut R, total: usize) -> Vec<Vec3> {
    if total == 0 {
        return Vec::new();
    }
    let columns = (total as f32).sqrt().ceil() as usize;
    let offset = (columns.saturating_sub(1)) as f32 * GRID_SPACING / 2.0;

    (0..total)
        .map(|i| {
            let row = i / columns;
            let column = i % columns;
            Vec3::new(
                column as f32 * GRID_SPACING - offset + rng.gen_range(-GRID_JITTER..GRID_JITTER),
                row as f32 * GRID_SPACING - offset + rng.gen_range(-GRID_JITTER..GRID_JITTER),
                SPAWN_HEIGHT,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn small_standard_roll_stays_physical() {
        let processor = RollProcessor::default();
        let result = processor.process_roll_with(&mut rng(), "2d6");

        assert_eq!(result.rolls.len(), 2);
        assert!(result.rolls.iter().all(|&r| (1..=6).contains(&r)));
        assert_eq!(result.result, result.rolls.iter().sum::<u32>());
        assert_eq!(result.interpreted_expression, "2d6");
        assert_eq!(result.canvas_data.dice_rolls.len(), 2);
        assert!(result.canvas_data.dice_rolls.iter().all(|d| !d.is_virtual));
    }

    #[test]
    fn malformed_expression_yields_placeholder() {
        let processor = RollProcessor::default();
        let result = processor.process_roll_with(&mut rng(), "abc");
        assert_eq!(result.interpreted_expression, "invalid");
        assert_eq!(result.result, 0);
        assert!(result.canvas_data.dice_rolls.is_empty());
    }

    #[test]
    fn massive_roll_collapses_to_one_proxy() {
        let processor = RollProcessor::default();
        let result = processor.process_roll_with(&mut rng(), "1000d20");

        assert_eq!(result.rolls.len(), 1000);
        assert_eq!(result.canvas_data.dice_rolls.len(), 1);
        let proxy = &result.canvas_data.dice_rolls[0];
        assert!(proxy.is_virtual);
        let virtual_rolls = proxy.virtual_rolls.as_ref().unwrap();
        assert_eq!(virtual_rolls.len(), 1000);
        assert_eq!(proxy.result, virtual_rolls.iter().sum::<u32>());
        assert_eq!(result.result, proxy.result);
    }

    #[test]
    fn non_standard_die_goes_virtual_single() {
        let processor = RollProcessor::default();
        assert!(processor.should_use_virtual(2, 37));
        assert_eq!(processor.virtual_strategy(2, 37), VirtualStrategy::Single);

        let result = processor.process_roll_with(&mut rng(), "2d37");
        assert_eq!(result.canvas_data.dice_rolls.len(), 1);
        assert!(result.canvas_data.dice_rolls[0].is_virtual);
        assert_eq!(result.canvas_data.dice_rolls[0].dice_type, "d37");
    }

    #[test]
    fn cluster_chunks_cover_all_rolls_exactly_once() {
        let processor = RollProcessor::default();
        // 12 exceeds the per-type limit of 5 but is far from massive.
        assert!(processor.should_use_virtual(12, 6));
        assert_eq!(processor.virtual_strategy(12, 6), VirtualStrategy::Cluster);

        let result = processor.process_roll_with(&mut rng(), "12d6");
        let proxies = &result.canvas_data.dice_rolls;
        assert_eq!(proxies.len(), 5);
        assert!(proxies.iter().all(|p| p.is_virtual));

        let recombined: Vec<u32> = proxies
            .iter()
            .flat_map(|p| p.virtual_rolls.clone().unwrap())
            .collect();
        assert_eq!(recombined, result.rolls);
        let proxy_sum: u32 = proxies.iter().map(|p| p.result).sum();
        assert_eq!(proxy_sum, result.result);

        // ceil(12 / 5) = 3 covers the roll in four chunks, so the fifth
        // proxy carries no sub-rolls: an empty list with a zero result,
        // not a missing field.
        let trailing = proxies.last().unwrap();
        assert_eq!(trailing.virtual_rolls.as_deref(), Some(&[][..]));
        assert_eq!(trailing.result, 0);
        let json = serde_json::to_value(trailing).unwrap();
        assert_eq!(json["virtualRolls"], serde_json::json!([]));
    }

    #[test]
    fn classification_uses_config_not_constants() {
        let mut processor = RollProcessor::default();
        assert!(!processor.should_use_virtual(2, 6));

        processor.update_config(RollConfigUpdate {
            max_physical_dice: Some(1),
            ..Default::default()
        });
        assert!(processor.should_use_virtual(2, 6));
    }

    #[test]
    fn clustering_can_be_disabled() {
        let mut processor = RollProcessor::default();
        processor.update_config(RollConfigUpdate {
            enable_smart_clustering: Some(false),
            ..Default::default()
        });
        assert_eq!(processor.virtual_strategy(12, 6), VirtualStrategy::Single);
    }

    #[test]
    fn spawn_positions_form_a_centered_grid() {
        let positions = spawn_grid(&mut rng(), 9);
        assert_eq!(positions.len(), 9);
        let mean_x: f32 = positions.iter().map(|p| p.x).sum::<f32>() / 9.0;
        let mean_y: f32 = positions.iter().map(|p| p.y).sum::<f32>() / 9.0;
        // Jitter is bounded, so the grid stays roughly centered.
        assert!(mean_x.abs() < GRID_JITTER);
        assert!(mean_y.abs() < GRID_JITTER);
        assert!(positions.iter().all(|p| p.z == SPAWN_HEIGHT));
    }
}
