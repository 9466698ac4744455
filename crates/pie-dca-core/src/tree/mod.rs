//! Pie tree model.
//!
//! A portfolio is a tree of `Pie` containers and `Ticker` leaves. Container
//! values are derived from their children by [`normalize`]; leaf values are
//! authoritative. Weights and target weights are transient annotations that
//! are recomputed whenever a sibling value changes.
//!
//! On the wire a node is `{name, type: "pie"|"ticker", value, children?}`
//! with decimal fields written as JSON floats. That float conversion is the
//! only place the tree loses precision.

mod children;
mod normalize;

pub use children::Children;
pub use normalize::{is_normalized, normalize, normalize_pie};

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PieError;
use crate::types::{Money, Weight};
use crate::PieResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two node variants, as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Pie,
    Ticker,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Pie => f.write_str("pie"),
            NodeKind::Ticker => f.write_str("ticker"),
        }
    }
}

impl FromStr for NodeKind {
    type Err = PieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pie" => Ok(NodeKind::Pie),
            "ticker" => Ok(NodeKind::Ticker),
            other => Err(PieError::InvalidInput {
                field: "type".into(),
                reason: format!("Unknown node type '{other}', expected 'pie' or 'ticker'"),
            }),
        }
    }
}

/// A container whose value is the sum of its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pie {
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub value: Money,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub weight: Option<Weight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<u32>,
    #[serde(default)]
    pub children: Children,
}

/// A terminal position with an authoritative value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(default)]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Money,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub weight: Option<Weight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Pie(Pie),
    Ticker(Ticker),
}

/// Borrowed root form so a bare `Pie` serializes with its `type` tag.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TaggedPie<'a> {
    Pie(&'a Pie),
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

impl Pie {
    /// An empty container with value 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set a placeholder value. Kept by normalization while the pie has no
    /// children.
    pub fn with_value(mut self, value: Money) -> Self {
        self.value = value;
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.insert(child.into());
        self
    }

    /// Recompute values and weights of the whole subtree in place.
    pub fn normalize(&mut self) -> &mut Self {
        normalize_pie(self)
    }

    /// Parse a pie from its JSON wire form and validate it.
    pub fn from_json(json: &str) -> PieResult<Self> {
        let pie: Pie = serde_json::from_str(json)?;
        pie.validate()?;
        Ok(pie)
    }

    /// Build a pie from an already parsed JSON value and validate it.
    pub fn from_value(value: serde_json::Value) -> PieResult<Self> {
        let pie: Pie = serde_json::from_value(value)?;
        pie.validate()?;
        Ok(pie)
    }

    /// Serialize in the canonical wire form, `type` tag included.
    pub fn to_json_pretty(&self) -> PieResult<String> {
        Ok(serde_json::to_string_pretty(&TaggedPie::Pie(self))?)
    }

    /// Check that every value in the subtree is non-negative.
    pub fn validate(&self) -> PieResult<()> {
        if self.value.is_sign_negative() && !self.value.is_zero() {
            return Err(PieError::InvalidInput {
                field: "value".into(),
                reason: format!("Negative value {} for pie '{}'", self.value, self.name),
            });
        }
        for child in self.children.iter() {
            match child {
                Node::Pie(p) => p.validate()?,
                Node::Ticker(t) => {
                    if t.value.is_sign_negative() && !t.value.is_zero() {
                        return Err(PieError::InvalidInput {
                            field: "value".into(),
                            reason: format!("Negative value {} for ticker '{}'", t.value, t.name),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Sum of the immediate children's values.
    pub fn children_total(&self) -> Money {
        self.children.total_value()
    }
}

impl Ticker {
    pub fn new(name: impl Into<String>, value: Money) -> Self {
        Self {
            name: name.into(),
            value,
            weight: None,
            target_weight: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

impl Node {
    pub fn pie(name: impl Into<String>) -> Self {
        Node::Pie(Pie::new(name))
    }

    pub fn ticker(name: impl Into<String>, value: Money) -> Self {
        Node::Ticker(Ticker::new(name, value))
    }

    /// A node of the given kind with no children and no annotations.
    pub fn of_kind(kind: NodeKind, name: impl Into<String>, value: Money) -> Self {
        match kind {
            NodeKind::Pie => Node::Pie(Pie::new(name).with_value(value)),
            NodeKind::Ticker => Node::ticker(name, value),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Pie(_) => NodeKind::Pie,
            Node::Ticker(_) => NodeKind::Ticker,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Pie(p) => &p.name,
            Node::Ticker(t) => &t.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Node::Pie(p) => p.name = name.into(),
            Node::Ticker(t) => t.name = name.into(),
        }
    }

    pub fn value(&self) -> Money {
        match self {
            Node::Pie(p) => p.value,
            Node::Ticker(t) => t.value,
        }
    }

    /// Replace the value and drop the now stale weight.
    pub fn set_value(&mut self, value: Money) {
        match self {
            Node::Pie(p) => p.value = value,
            Node::Ticker(t) => t.value = value,
        }
        self.clear_weight();
    }

    pub fn weight(&self) -> Option<Weight> {
        match self {
            Node::Pie(p) => p.weight,
            Node::Ticker(t) => t.weight,
        }
    }

    pub fn set_weight(&mut self, weight: Weight) {
        match self {
            Node::Pie(p) => p.weight = Some(weight),
            Node::Ticker(t) => t.weight = Some(weight),
        }
    }

    pub fn clear_weight(&mut self) {
        match self {
            Node::Pie(p) => p.weight = None,
            Node::Ticker(t) => t.weight = None,
        }
    }

    pub fn target_weight(&self) -> Option<u32> {
        match self {
            Node::Pie(p) => p.target_weight,
            Node::Ticker(t) => t.target_weight,
        }
    }

    pub fn set_target_weight(&mut self, target: u32) {
        match self {
            Node::Pie(p) => p.target_weight = Some(target),
            Node::Ticker(t) => t.target_weight = Some(target),
        }
    }

    pub fn as_pie(&self) -> Option<&Pie> {
        match self {
            Node::Pie(p) => Some(p),
            Node::Ticker(_) => None,
        }
    }

    pub fn as_pie_mut(&mut self) -> Option<&mut Pie> {
        match self {
            Node::Pie(p) => Some(p),
            Node::Ticker(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Ticker(_))
    }
}

impl From<Pie> for Node {
    fn from(p: Pie) -> Self {
        Node::Pie(p)
    }
}

impl From<Ticker> for Node {
    fn from(t: Ticker) -> Self {
        Node::Ticker(t)
    }
}

/// True when `value` is strictly positive.
pub(crate) fn is_positive(value: Decimal) -> bool {
    value > Decimal::ZERO
}
