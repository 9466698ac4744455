use rust_decimal::Decimal;
use tracing::debug;

use super::{is_positive, Node, Pie};

/// Normalize a node in place and hand it back.
///
/// Tickers are returned unchanged. Pies are normalized as in
/// [`normalize_pie`].
pub fn normalize(node: &mut Node) -> &mut Node {
    if let Node::Pie(pie) = node {
        normalize_pie(pie);
    }
    node
}

/// Recompute container values and child weights for the whole subtree.
///
/// Children are normalized first so a nested pie's value is current before
/// it is summed into its parent. A pie with children takes the sum of their
/// values; a pie without children keeps whatever value it already has.
/// Each child's weight is `child.value / total`, or 0 when the total is not
/// positive. Normalizing twice gives the same tree.
pub fn normalize_pie(pie: &mut Pie) -> &mut Pie {
    for child in pie.children.iter_mut() {
        normalize(child);
    }

    if pie.children.is_empty() {
        return pie;
    }

    let total = pie.children.total_value();
    pie.value = total;

    for child in pie.children.iter_mut() {
        let weight = if is_positive(total) {
            child.value() / total
        } else {
            Decimal::ZERO
        };
        child.set_weight(weight);
    }

    debug!(pie = %pie.name, %total, children = pie.children.len(), "normalized pie");
    pie
}

/// True when every container value equals its children's sum and every
/// child carries a weight.
pub fn is_normalized(pie: &Pie) -> bool {
    if !pie.children.is_empty() && pie.value != pie.children.total_value() {
        return false;
    }
    pie.children.iter().all(|child| {
        child.weight().is_some()
            && match child {
                Node::Pie(p) => is_normalized(p),
                Node::Ticker(_) => true,
            }
    })
}
