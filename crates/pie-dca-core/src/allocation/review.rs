use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::numeric::percent_of;
use crate::tree::Pie;
use crate::types::Money;

/// Before/after comparison of one child of an adjusted pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub name: String,
    pub current_value: Money,
    /// Whole-percent share of the original pie.
    pub current_weight: u32,
    pub capital_allocated: Money,
    pub target_value: Money,
    pub target_weight: u32,
}

/// Compare every child of `adjusted` with its counterpart in `original`.
///
/// Children that only exist in `adjusted` (newly injected positions) start
/// from a current value of zero. Children missing a target weight report 0.
pub fn review_allocation(original: &Pie, adjusted: &Pie) -> Vec<ReviewRow> {
    let total_original = original.children_total();

    adjusted
        .children
        .iter()
        .map(|child| {
            let current_value = original
                .children
                .get(child.name())
                .map(|c| c.value())
                .unwrap_or(Decimal::ZERO);
            let target_value = child.value();
            let current_weight = percent_of(current_value, total_original)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u32()
                .unwrap_or(0);

            ReviewRow {
                name: child.name().to_string(),
                current_value,
                current_weight,
                capital_allocated: target_value - current_value,
                target_value,
                target_weight: child.target_weight().unwrap_or(0),
            }
        })
        .collect()
}
