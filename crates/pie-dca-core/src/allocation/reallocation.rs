//! What-if reallocation of a flat pie.
//!
//! Covers:
//! 1. **Scale existing** -- `(100 - p)%` of the new funds grows every current
//!    position by the same factor
//! 2. **Inject mock targets** -- `p%` of the new funds is split evenly across
//!    `n` new positions with collision-free sequential names
//! 3. **Target weights** -- whole-percent targets summing to 100
//!
//! Every step returns a new pie; the input is never mutated. Monetary
//! results are rounded to cents half-up.

use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::review::{review_allocation, ReviewRow};
use super::target_weights::{apply_target_weights, TargetWeight};
use crate::error::PieError;
use crate::numeric::round_cents;
use crate::tree::{normalize_pie, Children, Node, Pie, Ticker};
use crate::types::*;
use crate::PieResult;

/// Prefix for injected placeholder positions: `NEW_1`, `NEW_2`, ...
pub const DEFAULT_MOCK_PREFIX: &str = "NEW_";

/// Upper bound on placeholder positions injected by one reallocation.
pub const MAX_NEW_TICKERS: u32 = 1000;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Parameters of a what-if reallocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReallocationInput {
    /// Capital being added.
    pub new_funds: Money,
    /// Number of new placeholder positions to create.
    pub new_ticker_count: u32,
    /// Share of `new_funds` going to the new positions, 0-100.
    pub percent_to_new: Percent,
    #[serde(default = "default_mock_prefix")]
    pub mock_prefix: String,
}

fn default_mock_prefix() -> String {
    DEFAULT_MOCK_PREFIX.to_string()
}

impl Default for ReallocationInput {
    fn default() -> Self {
        Self {
            new_funds: dec!(50),
            new_ticker_count: 2,
            percent_to_new: dec!(80),
            mock_prefix: default_mock_prefix(),
        }
    }
}

/// A proposed reallocation. `adjusted` is independent of the source pie and
/// only becomes authoritative if the caller commits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReallocationPlan {
    pub adjusted: Pie,
    pub funds_to_existing: Money,
    pub funds_to_new: Money,
    pub scale_factor: Decimal,
    pub per_new_ticker: Money,
    pub new_tickers: Vec<String>,
    pub target_weights: Vec<TargetWeight>,
    pub review: Vec<ReviewRow>,
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Grow every existing position by the share of `new_funds` that does not
/// go to new positions.
///
/// `scale_factor = (total + funds_to_existing) / total`. Each child value is
/// multiplied and rounded to cents; nested pies scale their leaves and take
/// the sum. Errors when the pie's children total zero.
pub fn scale_existing_positions(
    pie: &Pie,
    new_funds: Money,
    percent_to_new: Percent,
) -> PieResult<Pie> {
    validate_funds(new_funds, percent_to_new)?;

    let total_existing = pie.children_total();
    if total_existing <= Decimal::ZERO {
        return Err(PieError::DivisionByZero {
            context: format!("cannot scale an empty pie '{}'", pie.name),
        });
    }

    let funds_to_existing = funds_to_existing(new_funds, percent_to_new);
    let factor = (total_existing + funds_to_existing) / total_existing;

    let children: Children = pie.children.iter().map(|c| scale_node(c, factor)).collect();
    let scaled = Pie {
        value: children.total_value(),
        children,
        ..pie.clone()
    };
    debug!(pie = %pie.name, %factor, value = %scaled.value, "scaled existing positions");
    Ok(scaled)
}

/// Add `new_ticker_count` equal positions sharing `new_fund_allocation`.
///
/// Names are `{prefix}{ordinal}` starting at 1; ordinals already taken by a
/// sibling are skipped so nothing is overwritten. Existing weights are
/// cleared because every sibling share changes.
pub fn add_mock_targets(
    pie: &Pie,
    new_ticker_count: u32,
    new_fund_allocation: Money,
    prefix: &str,
) -> PieResult<Pie> {
    if new_fund_allocation < Decimal::ZERO {
        return Err(PieError::InvalidInput {
            field: "new_fund_allocation".into(),
            reason: "Must be non-negative".into(),
        });
    }
    if new_ticker_count == 0 {
        if new_fund_allocation > Decimal::ZERO {
            return Err(PieError::InvalidInput {
                field: "new_ticker_count".into(),
                reason: format!("{new_fund_allocation} assigned to new positions but none requested"),
            });
        }
        return Ok(pie.clone());
    }
    if new_ticker_count > MAX_NEW_TICKERS {
        return Err(PieError::InvalidInput {
            field: "new_ticker_count".into(),
            reason: format!("{new_ticker_count} exceeds the limit of {MAX_NEW_TICKERS}"),
        });
    }

    let per_ticker = round_cents(new_fund_allocation / Decimal::from(new_ticker_count));
    let names = mock_names(&pie.children, new_ticker_count, prefix);

    let mut children = pie.children.clone();
    for child in children.iter_mut() {
        child.clear_weight();
    }
    for name in &names {
        if children.insert(Node::ticker(name.as_str(), per_ticker)).is_some() {
            return Err(PieError::NameCollision { name: name.clone() });
        }
    }

    debug!(pie = %pie.name, ?names, %per_ticker, "added mock targets");
    Ok(Pie {
        value: children.total_value(),
        children,
        ..pie.clone()
    })
}

/// Scale, inject and weight in one pass.
///
/// The source pie is copied and normalized first; the result is normalized
/// again and carries a `target_weight` on every child.
pub fn recalculate_pie_allocation(pie: &Pie, input: &ReallocationInput) -> PieResult<Pie> {
    Ok(build_plan(pie, input)?.adjusted)
}

/// [`recalculate_pie_allocation`] plus the figures and review rows a caller
/// needs before deciding to commit.
pub fn plan_reallocation(
    pie: &Pie,
    input: &ReallocationInput,
) -> PieResult<ComputationOutput<ReallocationPlan>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan = build_plan(pie, input)?;

    let expected = round_cents(plan.review.iter().map(|r| r.current_value).sum::<Money>())
        + input.new_funds;
    let drift = plan.adjusted.value - expected;
    if !drift.is_zero() {
        warnings.push(format!(
            "Cent rounding moved the adjusted total by {drift} from {expected}"
        ));
    }
    if input.new_ticker_count > 0 && plan.per_new_ticker.is_zero() {
        warnings.push("New positions receive no capital".into());
    }
    if input.percent_to_new == dec!(100) {
        warnings.push("Existing positions receive no new capital".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Proportional scale-up with equal-weight injection and largest-remainder targets",
        &serde_json::json!({
            "new_funds": input.new_funds.to_string(),
            "new_ticker_count": input.new_ticker_count,
            "percent_to_new": input.percent_to_new.to_string(),
            "rounding": "cents, half-up",
        }),
        warnings,
        elapsed,
        plan,
    ))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn build_plan(pie: &Pie, input: &ReallocationInput) -> PieResult<ReallocationPlan> {
    validate_funds(input.new_funds, input.percent_to_new)?;
    info!(
        pie = %pie.name,
        new_funds = %input.new_funds,
        percent_to_new = %input.percent_to_new,
        new_tickers = input.new_ticker_count,
        "recalculating pie allocation"
    );

    let mut base = pie.clone();
    normalize_pie(&mut base);
    let total_existing = base.children_total();

    let scaled = scale_existing_positions(&base, input.new_funds, input.percent_to_new)?;

    let funds_to_new = input.new_funds * input.percent_to_new / dec!(100);
    let mut adjusted =
        add_mock_targets(&scaled, input.new_ticker_count, funds_to_new, &input.mock_prefix)?;
    normalize_pie(&mut adjusted);
    let target_weights = apply_target_weights(&mut adjusted)?;

    let new_tickers: Vec<String> = adjusted
        .children
        .iter()
        .filter(|c| !base.children.contains(c.name()))
        .map(|c| c.name().to_string())
        .collect();
    let per_new_ticker = if input.new_ticker_count == 0 {
        Decimal::ZERO
    } else {
        round_cents(funds_to_new / Decimal::from(input.new_ticker_count))
    };
    let funds_to_existing = funds_to_existing(input.new_funds, input.percent_to_new);

    let review = review_allocation(&base, &adjusted);
    info!(pie = %pie.name, value = %adjusted.value, "recalculation complete");

    Ok(ReallocationPlan {
        adjusted,
        funds_to_existing,
        funds_to_new,
        scale_factor: (total_existing + funds_to_existing) / total_existing,
        per_new_ticker,
        new_tickers,
        target_weights,
        review,
    })
}

fn funds_to_existing(new_funds: Money, percent_to_new: Percent) -> Money {
    new_funds * (dec!(100) - percent_to_new) / dec!(100)
}

fn validate_funds(new_funds: Money, percent_to_new: Percent) -> PieResult<()> {
    if new_funds < Decimal::ZERO {
        return Err(PieError::InvalidInput {
            field: "new_funds".into(),
            reason: "Must be non-negative".into(),
        });
    }
    if percent_to_new < Decimal::ZERO || percent_to_new > dec!(100) {
        return Err(PieError::InvalidInput {
            field: "percent_to_new".into(),
            reason: format!("{percent_to_new} must be between 0 and 100"),
        });
    }
    Ok(())
}

fn scale_node(node: &Node, factor: Decimal) -> Node {
    match node {
        Node::Ticker(t) => Node::Ticker(Ticker {
            value: round_cents(t.value * factor),
            weight: None,
            target_weight: None,
            ..t.clone()
        }),
        Node::Pie(p) if p.children.is_empty() => Node::Pie(Pie {
            value: round_cents(p.value * factor),
            weight: None,
            target_weight: None,
            ..p.clone()
        }),
        Node::Pie(p) => {
            let children: Children = p.children.iter().map(|c| scale_node(c, factor)).collect();
            Node::Pie(Pie {
                name: p.name.clone(),
                value: children.total_value(),
                weight: None,
                target_weight: None,
                children,
            })
        }
    }
}

fn mock_names(existing: &Children, count: u32, prefix: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut ordinal: u64 = 1;
    while names.len() < count as usize {
        let candidate = format!("{prefix}{ordinal}");
        if existing.contains(&candidate) {
            debug!(name = %candidate, "mock name taken, trying next ordinal");
        } else {
            names.push(candidate);
        }
        ordinal += 1;
    }
    names
}
