//! Dollar-cost-averaging distribution.
//!
//! A leaf receives `amount * w_1 * w_2 * ... * w_k` where `w_i` are the
//! weights along its path from the root. Weights must already be set by
//! [`crate::tree::normalize`].

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::error::PieError;
use crate::numeric::{largest_remainder, round_cents};
use crate::tree::{Children, Node, Pie};
use crate::types::Money;
use crate::PieResult;

/// Label recorded for a leaf that has no name.
pub const UNNAMED_LEAF: &str = "UNNAMED";

/// Leaf name to allocated capital.
pub type Allocations = BTreeMap<String, Money>;

/// Distribute `amount` across every leaf of a normalized tree.
///
/// Leaves are keyed by name. Two leaves with the same name in different
/// branches collide and the one visited last wins, so callers wanting a
/// full breakdown need globally unique leaf names.
pub fn allocate(root: &Pie, amount: Money) -> PieResult<Allocations> {
    if amount < Decimal::ZERO {
        return Err(PieError::InvalidInput {
            field: "amount".into(),
            reason: "Amount to allocate must be non-negative".into(),
        });
    }
    info!(pie = %root.name, %amount, "allocating capital");

    let mut allocations = Allocations::new();
    walk(&root.children, Decimal::ONE, amount, &mut allocations)?;
    Ok(allocations)
}

/// Like [`allocate`], but in whole cents that sum exactly to `amount`
/// rounded to cents. Leftover cents go to the largest fractional shares.
pub fn allocate_cents(root: &Pie, amount: Money) -> PieResult<Allocations> {
    let exact = allocate(root, amount)?;
    if exact.values().all(|v| v.is_zero()) {
        return Ok(exact);
    }

    let target = round_cents(amount);
    let units = (target * dec!(100))
        .trunc()
        .to_u64()
        .ok_or_else(|| PieError::InvalidInput {
            field: "amount".into(),
            reason: format!("{amount} is too large to split into cents"),
        })?;

    let shares: Vec<Decimal> = exact.values().copied().collect();
    let split = largest_remainder(&shares, units)?;

    Ok(exact
        .into_keys()
        .zip(split)
        .map(|(name, c)| (name, Decimal::from(c) / dec!(100)))
        .collect())
}

fn walk(
    children: &Children,
    factor: Decimal,
    amount: Money,
    allocations: &mut Allocations,
) -> PieResult<()> {
    for child in children {
        let weight = child.weight().ok_or_else(|| PieError::InvalidInput {
            field: "weight".into(),
            reason: format!(
                "'{}' has no weight; normalize the tree before allocating",
                child.name()
            ),
        })?;
        let path_factor = factor * weight;

        match child {
            Node::Pie(p) => walk(&p.children, path_factor, amount, allocations)?,
            Node::Ticker(t) => {
                let name = if t.name.is_empty() {
                    UNNAMED_LEAF.to_string()
                } else {
                    t.name.clone()
                };
                if allocations.contains_key(&name) {
                    warn!(leaf = %name, "duplicate leaf name, earlier allocation overwritten");
                }
                allocations.insert(name, amount * path_factor);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Ticker;
    use rust_decimal_macros::dec;

    fn weighted(name: &str, value: Money, weight: Decimal) -> Node {
        let mut n = Node::ticker(name, value);
        n.set_weight(weight);
        n
    }

    #[test]
    fn test_allocate_flat_weights() {
        let root = Pie::new("main")
            .with_child(weighted("A", dec!(50), dec!(0.5)))
            .with_child(weighted("B", dec!(30), dec!(0.3)))
            .with_child(weighted("C", dec!(20), dec!(0.2)));
        let out = allocate(&root, dec!(100.00)).unwrap();
        assert_eq!(out["A"], dec!(50.00));
        assert_eq!(out["B"], dec!(30.00));
        assert_eq!(out["C"], dec!(20.00));
    }

    #[test]
    fn test_allocate_multiplies_along_path() {
        let mut root = Pie::new("root")
            .with_child(
                Pie::new("growth")
                    .with_child(Ticker::new("TSLA", dec!(75)))
                    .with_child(Ticker::new("NVDA", dec!(25))),
            )
            .with_child(Ticker::new("VTI", dec!(100)));
        root.normalize();
        let out = allocate(&root, dec!(200)).unwrap();
        assert_eq!(out["TSLA"], dec!(75));
        assert_eq!(out["NVDA"], dec!(25));
        assert_eq!(out["VTI"], dec!(100));
    }

    #[test]
    fn test_allocate_requires_weights() {
        let root = Pie::new("raw").with_child(Ticker::new("A", dec!(1)));
        assert!(allocate(&root, dec!(10)).is_err());
    }

    #[test]
    fn test_allocate_rejects_negative_amount() {
        let mut root = Pie::new("r").with_child(Ticker::new("A", dec!(1)));
        root.normalize();
        assert!(allocate(&root, dec!(-1)).is_err());
    }

    #[test]
    fn test_unnamed_leaf_uses_sentinel() {
        let mut root = Pie::new("r").with_child(Ticker::new("", dec!(1)));
        root.normalize();
        let out = allocate(&root, dec!(10)).unwrap();
        assert_eq!(out[UNNAMED_LEAF], dec!(10));
    }

    #[test]
    fn test_duplicate_leaf_names_overwrite() {
        let mut root = Pie::new("r")
            .with_child(Pie::new("p1").with_child(Ticker::new("SAME", dec!(10))))
            .with_child(Pie::new("p2").with_child(Ticker::new("SAME", dec!(30))));
        root.normalize();
        let out = allocate(&root, dec!(100)).unwrap();
        assert_eq!(out.len(), 1);
        // p2 is visited last
        assert_eq!(out["SAME"], dec!(75));
    }

    #[test]
    fn test_allocate_cents_sums_exactly() {
        let mut root = Pie::new("thirds")
            .with_child(Ticker::new("A", dec!(1)))
            .with_child(Ticker::new("B", dec!(1)))
            .with_child(Ticker::new("C", dec!(1)));
        root.normalize();
        let out = allocate_cents(&root, dec!(100)).unwrap();
        let total: Decimal = out.values().copied().sum();
        assert_eq!(total, dec!(100));
        assert_eq!(out["A"], dec!(33.34));
        assert_eq!(out["B"], dec!(33.33));
        assert_eq!(out["C"], dec!(33.33));
    }

    #[test]
    fn test_allocate_cents_large_amount() {
        let mut root = Pie::new("big")
            .with_child(Ticker::new("A", dec!(1)))
            .with_child(Ticker::new("B", dec!(2)));
        root.normalize();
        let out = allocate_cents(&root, dec!(100000000000000)).unwrap();
        assert_eq!(out.values().copied().sum::<Decimal>(), dec!(100000000000000));
        assert_eq!(out["A"], dec!(33333333333333.33));
        assert_eq!(out["B"], dec!(66666666666666.67));
    }
}
