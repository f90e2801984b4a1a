//! Dice expression parsing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::RollError;

lazy_static! {
    /// `"2d6"`, `"d20"`, `"10D8"` — an optional count, a `d`, a side
    /// count.
    static ref DICE_EXPRESSION: Regex =
        Regex::new(r"(?i)^(\d+)?d(\d+)$").expect("dice expression pattern is valid");
}

/// A parsed, canonicalized roll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRequest {
    /// How many dice to roll, after clamping.
    pub num_dice: u32,
    /// Side count of the requested die type, after clamping.
    pub die_type: u32,
    /// Canonical form of the request, e.g. `"2d6"`.
    pub interpreted_expression: String,
}

/// Parse a textual dice expression.
///
/// Whitespace is stripped and case ignored. An omitted count defaults to
/// 1; a count of 0 is corrected to 1 and counts above `max_total_dice`
/// are clamped down to it; a side count of 0 is corrected to 1. Numbers
/// too large for `u32` are treated as malformed.
pub fn parse_expression(raw: &str, max_total_dice: u32) -> Result<RollRequest, RollError> {
    let cleaned: String = raw.split_whitespace().collect();
    let captures = DICE_EXPRESSION
        .captures(&cleaned)
        .ok_or_else(|| RollError::InvalidExpression(raw.to_string()))?;

    let num_dice: u32 = match captures.get(1) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| RollError::InvalidExpression(raw.to_string()))?,
        None => 1,
    };
    let die_type: u32 = captures[2]
        .parse()
        .map_err(|_| RollError::InvalidExpression(raw.to_string()))?;

    // Cap first, then floor, so the count-of-at-least-one rule holds
    // even under a degenerate zero cap.
    let num_dice = num_dice.min(max_total_dice).max(1);
    let die_type = die_type.max(1);

    Ok(RollRequest {
        num_dice,
        die_type,
        interpreted_expression: format!("{}d{}", num_dice, die_type),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 10_000;

    #[test]
    fn parses_count_and_sides() {
        let request = parse_expression("2d6", MAX).unwrap();
        assert_eq!(request.num_dice, 2);
        assert_eq!(request.die_type, 6);
        assert_eq!(request.interpreted_expression, "2d6");
    }

    #[test]
    fn omitted_count_defaults_to_one() {
        let request = parse_expression("d20", MAX).unwrap();
        assert_eq!(request.num_dice, 1);
        assert_eq!(request.die_type, 20);
        assert_eq!(request.interpreted_expression, "1d20");
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        let request = parse_expression("  3 D 8 ", MAX).unwrap();
        assert_eq!(request.num_dice, 3);
        assert_eq!(request.die_type, 8);
        assert_eq!(request.interpreted_expression, "3d8");
    }

    #[test]
    fn malformed_text_is_rejected() {
        for raw in ["abc", "", "2x6", "d", "2d", "2d6d8", "-1d6", "2.5d6"] {
            assert!(
                matches!(parse_expression(raw, MAX), Err(RollError::InvalidExpression(_))),
                "{raw:?} should be invalid"
            );
        }
    }

    #[test]
    fn degenerate_numbers_are_corrected() {
        let request = parse_expression("0d0", MAX).unwrap();
        assert_eq!(request.num_dice, 1);
        assert_eq!(request.die_type, 1);

        let clamped = parse_expression("99999d6", MAX).unwrap();
        assert_eq!(clamped.num_dice, MAX);
    }

    #[test]
    fn zero_cap_still_rolls_one_die() {
        let request = parse_expression("5d6", 0).unwrap();
        assert_eq!(request.num_dice, 1);
        assert_eq!(request.interpreted_expression, "1d6");
    }
}
