use serde::{Deserialize, Serialize};

use crate::tree::{Node, Pie};
use crate::types::Money;

/// A parent to child edge, weighted by the child's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub value: Money,
}

/// Every parent to child edge in the tree, starting at `root`, pre-order.
pub fn structure_links(root: &Pie) -> Vec<Link> {
    let mut links = Vec::new();
    collect(root, &mut links);
    links
}

fn collect(pie: &Pie, links: &mut Vec<Link>) {
    for child in pie.children.iter() {
        links.push(Link {
            source: pie.name.clone(),
            target: child.name().to_string(),
            value: child.value(),
        });
        if let Node::Pie(p) = child {
            collect(p, links);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Ticker;
    use rust_decimal_macros::dec;

    #[test]
    fn test_links_cover_every_edge() {
        let root = Pie::new("main")
            .with_child(Pie::new("bonds").with_child(Ticker::new("BND", dec!(20))))
            .with_child(Ticker::new("VTI", dec!(80)));
        let links = structure_links(&root);
        let edges: Vec<(&str, &str)> = links
            .iter()
            .map(|l| (l.source.as_str(), l.target.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![("main", "bonds"), ("bonds", "BND"), ("main", "VTI")]
        );
        assert_eq!(links[2].value, dec!(80));
    }

    #[test]
    fn test_leaf_only_root() {
        assert!(structure_links(&Pie::new("empty")).is_empty());
    }
}
