use std::time::Instant;

use clap::Args;
use pie_dca_core::allocation::{allocate, allocate_cents};
use pie_dca_core::with_metadata;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::{load_pie, Context, PieSource};

/// Arguments for DCA allocation
#[derive(Args)]
pub struct AllocateArgs {
    #[command(flatten)]
    pub source: PieSource,

    /// Capital to distribute across every leaf
    #[arg(long)]
    pub amount: Decimal,

    /// Round to whole cents that still sum exactly to the amount
    #[arg(long)]
    pub cents: bool,
}

pub fn run_allocate(ctx: &Context, args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut pie = load_pie(ctx, &args.source)?;
    pie.normalize();

    let allocations = if args.cents {
        allocate_cents(&pie, args.amount)?
    } else {
        allocate(&pie, args.amount)?
    };

    let mut warnings = Vec::new();
    if allocations.is_empty() {
        warnings.push(format!("Pie '{}' has no leaves to allocate to", pie.name));
    }
    if pie.value.is_zero() && !allocations.is_empty() {
        warnings.push("Pie has zero value, every leaf receives nothing".to_string());
    }

    let rounding = if args.cents {
        "cents, largest remainder"
    } else {
        "none"
    };
    let output = with_metadata(
        "Dollar-cost averaging by product of weights along each path",
        &json!({ "amount": args.amount.to_string(), "rounding": rounding }),
        warnings,
        start.elapsed().as_micros() as u64,
        allocations,
    );
    Ok(serde_json::to_value(output)?)
}
