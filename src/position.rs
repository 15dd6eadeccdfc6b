//! Position effect: how much a slot is worth relative to the best slot.
//!
//! The last slot is used as the baseline, so the weights run from 1.0 for the
//! top slot down to 0.0 for the bottom slot.

use crate::error::{AuctionError, AuctionResult};

/// Normalize per-slot click counts into position weights in [0, 1]
///
/// Fails when the click vector is empty or when the first and last slot receive the same number of clicks.
pub fn pos_effect(clicks: &[f64]) -> AuctionResult<Vec<f64>> {
    let (first, last) = match (clicks.first(), clicks.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(AuctionError::PreconditionViolation("position effect of an empty click vector".to_string())),
    };

    let span = first - last;
    if span == 0.0 {
        return Err(AuctionError::ArithmeticDegeneracy(format!(
            "position effect undefined: first and last slot both receive {} clicks",
            first
        )));
    }

    Ok(clicks.iter().map(|&c| (c - last) / span).collect())
}
