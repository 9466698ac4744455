use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PieError;
use crate::numeric::{largest_remainder, percent_of};
use crate::tree::Pie;
use crate::types::Percent;
use crate::PieResult;

/// Whole-percent target for one child of a pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWeight {
    pub name: String,
    /// Unrounded `value / total * 100`.
    pub raw_percent: Percent,
    pub target_weight: u32,
}

/// Integer percentage targets for the immediate children of `pie`.
///
/// Uses the largest-remainder method: every raw percentage is floored, then
/// the points still missing from 100 go to the children with the largest
/// fractional parts, earlier children first on ties. The targets always sum
/// to exactly 100 and each is within one point of its raw percentage.
pub fn compute_target_weights(pie: &Pie) -> PieResult<Vec<TargetWeight>> {
    if pie.children.is_empty() {
        return Err(PieError::InvalidInput {
            field: "children".into(),
            reason: format!("Pie '{}' has no children to weight", pie.name),
        });
    }

    let values: Vec<Decimal> = pie.children.iter().map(|c| c.value()).collect();
    let total: Decimal = values.iter().copied().sum();
    if total <= Decimal::ZERO {
        return Err(PieError::DivisionByZero {
            context: format!("target weights for pie '{}' with zero total", pie.name),
        });
    }

    let points = largest_remainder(&values, 100)?;

    let weights: Vec<TargetWeight> = pie
        .children
        .iter()
        .zip(points)
        .map(|(child, p)| TargetWeight {
            name: child.name().to_string(),
            raw_percent: percent_of(child.value(), total),
            target_weight: p as u32,
        })
        .collect();

    debug!(pie = %pie.name, ?weights, "computed target weights");
    Ok(weights)
}

/// Compute target weights and attach them to the children of `pie`.
pub fn apply_target_weights(pie: &mut Pie) -> PieResult<Vec<TargetWeight>> {
    let weights = compute_target_weights(pie)?;
    for (child, tw) in pie.children.iter_mut().zip(&weights) {
        child.set_target_weight(tw.target_weight);
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Ticker;
    use rust_decimal_macros::dec;

    fn pie_of(values: &[(&str, Decimal)]) -> Pie {
        values
            .iter()
            .fold(Pie::new("p"), |p, (n, v)| p.with_child(Ticker::new(*n, *v)))
    }

    #[test]
    fn test_weights_are_integers_summing_to_100() {
        let pie = pie_of(&[("A", dec!(150)), ("B", dec!(100)), ("C", dec!(50))]);
        let w = compute_target_weights(&pie).unwrap();
        let sum: u32 = w.iter().map(|t| t.target_weight).sum();
        assert_eq!(sum, 100);
        assert!(w[0].target_weight > w[1].target_weight);
        assert!(w[1].target_weight > w[2].target_weight);
    }

    #[test]
    fn test_naive_rounding_would_overshoot() {
        // six equal shares: rounding each 16.67 gives 17 * 6 = 102
        let pie = pie_of(&[
            ("A", dec!(1)),
            ("B", dec!(1)),
            ("C", dec!(1)),
            ("D", dec!(1)),
            ("E", dec!(1)),
            ("F", dec!(1)),
        ]);
        let w = compute_target_weights(&pie).unwrap();
        let pts: Vec<u32> = w.iter().map(|t| t.target_weight).collect();
        // 16.67 each, four spare points go to the first four
        assert_eq!(pts, vec![17, 17, 17, 17, 16, 16]);
    }

    #[test]
    fn test_each_within_one_point_of_raw() {
        let pie = pie_of(&[
            ("A", dec!(155)),
            ("B", dec!(103.33)),
            ("C", dec!(51.67)),
            ("D", dec!(20)),
            ("E", dec!(20)),
        ]);
        for t in compute_target_weights(&pie).unwrap() {
            let diff = (Decimal::from(t.target_weight) - t.raw_percent).abs();
            assert!(diff < Decimal::ONE, "{} off by {}", t.name, diff);
        }
    }

    #[test]
    fn test_single_child_gets_everything() {
        let pie = pie_of(&[("ONLY", dec!(0.01))]);
        let w = compute_target_weights(&pie).unwrap();
        assert_eq!(w[0].target_weight, 100);
    }

    #[test]
    fn test_apply_attaches_to_children() {
        let mut pie = pie_of(&[("A", dec!(3)), ("B", dec!(1))]);
        apply_target_weights(&mut pie).unwrap();
        assert_eq!(pie.children.get("A").unwrap().target_weight(), Some(75));
        assert_eq!(pie.children.get("B").unwrap().target_weight(), Some(25));
    }

    #[test]
    fn test_empty_or_zero_pie_errors() {
        assert!(compute_target_weights(&Pie::new("e")).is_err());
        let zero = pie_of(&[("A", dec!(0))]);
        assert!(matches!(
            compute_target_weights(&zero),
            Err(PieError::DivisionByZero { .. })
        ));
    }
}
