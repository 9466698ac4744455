use serde::{Deserialize, Serialize};

use crate::numeric::percent_of;
use crate::tree::{Node, NodeKind, Pie};
use crate::types::{Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One node of a flattened tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Names from the root's first-level child down to this node, inclusive.
    pub path: Vec<String>,
    pub name: String,
    pub value: Money,
    /// Share of the immediate parent's total, 0-100.
    pub weight_percent: Percent,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl Row {
    /// Zero for first-level children.
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub name: String,
    pub value: Money,
    pub weight_percent: Percent,
}

// ---------------------------------------------------------------------------
// Flatten
// ---------------------------------------------------------------------------

/// Depth-first pre-order rows for every node below `root`.
///
/// The root itself gets no row. A row's weight is computed from the values
/// of its siblings at traversal time, so it matches the stored weight of a
/// normalized tree and never reflects a stale one.
pub fn flatten(root: &Pie) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut path = Vec::new();
    visit(root, &mut path, &mut rows);
    rows
}

fn visit(pie: &Pie, path: &mut Vec<String>, rows: &mut Vec<Row>) {
    let total = pie.children_total();
    for child in pie.children.iter() {
        path.push(child.name().to_string());
        rows.push(Row {
            path: path.clone(),
            name: child.name().to_string(),
            value: child.value(),
            weight_percent: percent_of(child.value(), total),
            kind: child.kind(),
        });
        if let Node::Pie(p) = child {
            visit(p, path, rows);
        }
        path.pop();
    }
}

/// Root-level children with their stored weight as a percentage.
///
/// Children without a weight fall back to their share of the current total.
pub fn summarize_children(pie: &Pie) -> Vec<ChildSummary> {
    let total = pie.children_total();
    pie.children
        .iter()
        .map(|child| ChildSummary {
            name: child.name().to_string(),
            value: child.value(),
            weight_percent: child
                .weight()
                .map(|w| w * Percent::ONE_HUNDRED)
                .unwrap_or_else(|| percent_of(child.value(), total)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Ticker;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn nested() -> Pie {
        let mut root = Pie::new("root")
            .with_child(
                Pie::new("growth")
                    .with_child(Ticker::new("TSLA", dec!(30)))
                    .with_child(Ticker::new("NVDA", dec!(10))),
            )
            .with_child(Ticker::new("VTI", dec!(60)));
        root.normalize();
        root
    }

    #[test]
    fn test_pre_order_with_paths() {
        let rows = flatten(&nested());
        let paths: Vec<Vec<String>> = rows.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                vec!["growth".to_string()],
                vec!["growth".to_string(), "TSLA".to_string()],
                vec!["growth".to_string(), "NVDA".to_string()],
                vec!["VTI".to_string()],
            ]
        );
        assert_eq!(rows[0].kind, NodeKind::Pie);
        assert_eq!(rows[1].depth(), 1);
    }

    #[test]
    fn test_weights_relative_to_parent() {
        let rows = flatten(&nested());
        assert_eq!(rows[0].weight_percent, dec!(40));
        assert_eq!(rows[1].weight_percent, dec!(75));
        assert_eq!(rows[2].weight_percent, dec!(25));
        assert_eq!(rows[3].weight_percent, dec!(60));
    }

    #[test]
    fn test_empty_pie_has_no_rows() {
        assert!(flatten(&Pie::new("empty")).is_empty());
    }

    #[test]
    fn test_summarize_children() {
        let summary = summarize_children(&nested());
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "growth");
        assert_eq!(summary[0].value, dec!(40));
        assert_eq!(summary[0].weight_percent, dec!(40));
        assert_eq!(summary[1].weight_percent, dec!(60));
    }

    #[test]
    fn test_summarize_unweighted_children() {
        let pie = Pie::new("p")
            .with_child(Ticker::new("A", dec!(1)))
            .with_child(Ticker::new("B", dec!(3)));
        let summary = summarize_children(&pie);
        assert_eq!(summary[1].weight_percent, dec!(75));
    }
}
